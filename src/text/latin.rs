//! Latin letters → spelled-out Bopomofo pronunciation.

/// Approximate English letter names written in Bopomofo.
fn letter_name(letter: char) -> Option<&'static str> {
    let name = match letter {
        'a' => "ㄟˉ",
        'b' => "ㄅㄧˋ",
        'c' => "ㄙㄧˉ",
        'd' => "ㄉㄧˋ",
        'e' => "ㄧˋ",
        'f' => "ㄝˊㄈㄨˋ",
        'g' => "ㄐㄧˋ",
        'h' => "ㄝˇㄑㄩˋ",
        'i' => "ㄞˋ",
        'j' => "ㄐㄟˋ",
        'k' => "ㄎㄟˋ",
        'l' => "ㄝˊㄛˋ",
        'm' => "ㄝˊㄇㄨˋ",
        'n' => "ㄣˉ",
        'o' => "ㄡˉ",
        'p' => "ㄆㄧˉ",
        'q' => "ㄎㄧㄡˉ",
        'r' => "ㄚˋ",
        's' => "ㄝˊㄙˋ",
        't' => "ㄊㄧˋ",
        'u' => "ㄧㄡˉ",
        'v' => "ㄨㄧˉ",
        'w' => "ㄉㄚˋㄅㄨˋㄌㄧㄡˋ",
        'x' => "ㄝˉㄎㄨˋㄙˋ",
        'y' => "ㄨㄞˋ",
        'z' => "ㄗㄟˋ",
        _ => return None,
    };
    Some(name)
}

/// Replace each ASCII letter with its spelled-out name, case-folded.
pub fn latin_to_bopomofo(text: &str) -> String {
    let mut spelled = String::with_capacity(text.len() * 3);
    for ch in text.chars() {
        match letter_name(ch.to_ascii_lowercase()) {
            Some(name) => spelled.push_str(name),
            None => spelled.push(ch),
        }
    }
    spelled
}
