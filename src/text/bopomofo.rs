//! Tone-numbered pinyin syllable → Bopomofo (zhuyin) glyphs.
//!
//! Rewriting happens in two passes. An ordered list of pattern rules first
//! folds initials and finals into single-letter placeholder codes, then a
//! character table maps every placeholder, consonant, vowel and tone digit
//! to its glyph.

use once_cell::sync::Lazy;
use regex::Regex;

/// Tone mark appended to syllables that end without an explicit tone.
pub const FIRST_TONE_MARK: char = 'ˉ';

/// `(pattern, replacement)` pairs, applied in order to the whole syllable.
///
/// Later rules match placeholders produced by earlier ones, so the order is
/// significant: `iu` must become `iou` before `y` folds into `i`, and the
/// `zh`/`ch`/`sh` initials must collapse before the bare `[zcsr]i` rule.
pub const REWRITE_RULES: &[(&str, &str)] = &[
    (r"^m([0-9])$", "mu${1}"),
    (r"^n([0-9])$", "N${1}"),
    (r"^r5$", "er5"),
    (r"iu", "iou"),
    (r"ui", "uei"),
    (r"ong", "ung"),
    (r"^yi?", "i"),
    (r"^wu?", "u"),
    (r"iu", "v"),
    (r"^([jqx])u", "${1}v"),
    (r"([iuv])n", "${1}en"),
    (r"^zhi?", "Z"),
    (r"^chi?", "C"),
    (r"^shi?", "S"),
    (r"^([zcsr])i", "${1}"),
    (r"ai", "A"),
    (r"ei", "I"),
    (r"ao", "O"),
    (r"ou", "U"),
    (r"ang", "K"),
    (r"eng", "G"),
    (r"an", "M"),
    (r"en", "N"),
    (r"er", "R"),
    (r"eh", "E"),
    (r"([iv])e", "${1}E"),
    (r"1$", ""),
];

static COMPILED_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    REWRITE_RULES
        .iter()
        .map(|&(pattern, replacement)| {
            (
                Regex::new(pattern).expect("valid bopomofo rewrite rule"),
                replacement,
            )
        })
        .collect()
});

/// Placeholder/letter → glyph. Characters without an entry pass through.
fn glyph(ch: char) -> Option<char> {
    let glyph = match ch {
        'b' => 'ㄅ',
        'p' => 'ㄆ',
        'm' => 'ㄇ',
        'f' => 'ㄈ',
        'd' => 'ㄉ',
        't' => 'ㄊ',
        'n' => 'ㄋ',
        'l' => 'ㄌ',
        'g' => 'ㄍ',
        'k' => 'ㄎ',
        'h' => 'ㄏ',
        'j' => 'ㄐ',
        'q' => 'ㄑ',
        'x' => 'ㄒ',
        'Z' => 'ㄓ',
        'C' => 'ㄔ',
        'S' => 'ㄕ',
        'r' => 'ㄖ',
        'z' => 'ㄗ',
        'c' => 'ㄘ',
        's' => 'ㄙ',
        'i' => 'ㄧ',
        'u' => 'ㄨ',
        'v' => 'ㄩ',
        'a' => 'ㄚ',
        'o' => 'ㄛ',
        'e' => 'ㄜ',
        'E' | 'ê' => 'ㄝ',
        'A' => 'ㄞ',
        'I' => 'ㄟ',
        'O' => 'ㄠ',
        'U' => 'ㄡ',
        'M' => 'ㄢ',
        'N' => 'ㄣ',
        'K' => 'ㄤ',
        'G' => 'ㄥ',
        'R' => 'ㄦ',
        '2' => 'ˊ',
        '3' => 'ˇ',
        '4' => 'ˋ',
        '0' | '5' => '˙',
        _ => return None,
    };
    Some(glyph)
}

/// Apply `rules` in order, each one to the output of the previous.
pub fn apply_rules(rules: &[(Regex, &str)], input: &str) -> String {
    let mut text = input.to_string();
    for (pattern, replacement) in rules {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    text
}

/// Convert a single tone-numbered pinyin syllable (`"hao3"`) to Bopomofo.
pub fn pinyin_to_bopomofo(syllable: &str) -> String {
    let syllable = syllable.replace('1', "");
    apply_rules(&COMPILED_RULES, &syllable)
        .chars()
        .map(|ch| glyph(ch).unwrap_or(ch))
        .collect()
}

/// True for Bopomofo letters (U+3105 ㄅ through U+3129 ㄩ).
pub fn is_bopomofo_letter(ch: char) -> bool {
    ('\u{3105}'..='\u{3129}').contains(&ch)
}

/// Convert a syllable and make an implicit first tone explicit.
pub fn syllable_to_bopomofo(syllable: &str) -> String {
    let mut glyphs = pinyin_to_bopomofo(syllable);
    if glyphs.chars().next_back().is_some_and(is_bopomofo_letter) {
        glyphs.push(FIRST_TONE_MARK);
    }
    glyphs
}
