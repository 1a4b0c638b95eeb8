//! Chinese text → Bopomofo via word segmentation and tone-numbered pinyin.

use super::bopomofo::syllable_to_bopomofo;

/// Segmentation and romanization capability used by the Mandarin cleaner.
pub trait Romanizer: Send + Sync {
    /// Split text into word-like tokens. Concatenating them must give back
    /// the input.
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;

    /// Romanize a run of logograms: one tone-numbered syllable per
    /// character (`"hao3"`), neutral tone as `5`, `ü` written `v`.
    fn romanize(&self, han: &str) -> Vec<String>;
}

/// CJK Unified Ideographs block.
pub fn is_han(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&ch)
}

/// Fold the enumeration comma, semicolon and colon into `，`.
pub fn normalize_list_punctuation(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '、' | '；' | '：' => '，',
            _ => ch,
        })
        .collect()
}

/// Convert every logographic run in `text` to Bopomofo.
///
/// Tokens without logograms are copied verbatim, so digits, Latin letters
/// and punctuation survive for later stages.
pub fn chinese_to_bopomofo(text: &str, romanizer: &dyn Romanizer) -> String {
    let text = normalize_list_punctuation(text);
    let mut converted = String::with_capacity(text.len() * 2);

    for word in romanizer.segment(&text) {
        if !word.chars().any(is_han) {
            converted.push_str(word);
            continue;
        }
        for (han, run) in script_runs(word) {
            if !han {
                converted.push_str(run);
                continue;
            }
            for syllable in romanizer.romanize(run) {
                converted.push_str(&syllable_to_bopomofo(&syllable));
            }
        }
    }

    converted
}

/// Split `word` into maximal runs of logographic / other characters.
fn script_runs(word: &str) -> Vec<(bool, &str)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for (idx, ch) in word.char_indices() {
        let han = is_han(ch);
        match current {
            Some(kind) if kind != han => {
                runs.push((kind, &word[start..idx]));
                start = idx;
                current = Some(han);
            }
            None => current = Some(han),
            _ => {}
        }
    }
    if let Some(kind) = current {
        runs.push((kind, &word[start..]));
    }
    runs
}

/// Bring a raw tone-numbered reading into the form the rewriter expects.
pub fn normalize_syllable(raw: &str) -> String {
    let mut syllable: String = raw
        .chars()
        .map(|ch| if ch == 'ü' { 'v' } else { ch })
        .collect();
    if !syllable.ends_with(|ch: char| ch.is_ascii_digit()) {
        syllable.push('5');
    }
    syllable
}

/// Words whose reading differs from the default reading of each character.
const WORD_READINGS: &[(&str, &[&str])] = &[
    ("银行", &["yin2", "hang2"]),
    ("行业", &["hang2", "ye4"]),
    ("行长", &["hang2", "zhang3"]),
    ("长大", &["zhang3", "da4"]),
    ("成长", &["cheng2", "zhang3"]),
    ("音乐", &["yin1", "yue4"]),
    ("重要", &["zhong4", "yao4"]),
    ("重新", &["chong2", "xin1"]),
    ("还是", &["hai2", "shi4"]),
    ("还有", &["hai2", "you3"]),
    ("睡觉", &["shui4", "jiao4"]),
    ("觉得", &["jue2", "de5"]),
    ("什么", &["shen2", "me5"]),
    ("怎么", &["zen3", "me5"]),
    ("朋友", &["peng2", "you5"]),
    ("东西", &["dong1", "xi5"]),
    ("地方", &["di4", "fang5"]),
    ("为了", &["wei4", "le5"]),
    ("因为", &["yin1", "wei4"]),
    ("了解", &["liao3", "jie3"]),
];

const NUMERAL_CHARS: &str = "零〇一二两三四五六七八九十百千万亿点第";

/// Reading of a whole word from the override table.
pub fn word_reading(word: &str) -> Option<Vec<String>> {
    WORD_READINGS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, readings)| readings.iter().map(|r| r.to_string()).collect())
}

/// Tone changes of 一 and 不 before another syllable of the same word.
///
/// 不 takes tone 2 before tone 4. 一 takes tone 2 before tone 4 and tone 4
/// before tones 1 to 3, except inside numbers and ordinals.
pub fn apply_tone_sandhi(han: &str, syllables: &mut [String]) {
    let chars: Vec<char> = han.chars().collect();
    if chars.len() != syllables.len() {
        return;
    }
    for i in 0..chars.len().saturating_sub(1) {
        let next_tone = syllables[i + 1].chars().last();
        match chars[i] {
            '不' if next_tone == Some('4') => syllables[i] = "bu2".to_string(),
            '一' => {
                let in_number = (i > 0 && NUMERAL_CHARS.contains(chars[i - 1]))
                    || "零〇一二三四五六七八九".contains(chars[i + 1]);
                if in_number {
                    continue;
                }
                match next_tone {
                    Some('4') => syllables[i] = "yi2".to_string(),
                    Some('1' | '2' | '3') => syllables[i] = "yi4".to_string(),
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

/// jieba-rs segmentation with readings from the `pinyin` crate.
///
/// `pinyin` reads each character on its own. Words in a small override
/// table get their word reading and 一/不 tone sandhi is applied inside a
/// word; other polyphonic characters keep their most common reading.
#[cfg(feature = "mandarin")]
pub struct JiebaPinyin {
    jieba: jieba_rs::Jieba,
}

#[cfg(feature = "mandarin")]
impl Default for JiebaPinyin {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "mandarin")]
impl JiebaPinyin {
    /// Load the bundled jieba dictionary.
    pub fn new() -> Self {
        log::debug!("Loading jieba dictionary");
        Self {
            jieba: jieba_rs::Jieba::new(),
        }
    }
}

#[cfg(feature = "mandarin")]
impl Romanizer for JiebaPinyin {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.jieba.cut(text, false)
    }

    fn romanize(&self, han: &str) -> Vec<String> {
        use pinyin::ToPinyin;

        if let Some(readings) = word_reading(han) {
            return readings;
        }
        let mut syllables: Vec<String> = han
            .to_pinyin()
            .zip(han.chars())
            .map(|(reading, ch)| match reading {
                Some(reading) => normalize_syllable(reading.with_tone_num_end()),
                None => ch.to_string(),
            })
            .collect();
        apply_tone_sandhi(han, &mut syllables);
        syllables
    }
}
