//! Text normalization ("text cleaners").
//!
//! The model config names the cleaners to run, in order. Each cleaner turns
//! raw input into the glyph alphabet of the model's symbol table:
//!
//! | Name | Stages |
//! |---|---|
//! | `chinese_cleaners` | numerals → jieba + pinyin → Bopomofo → Latin spell-out |
//!
//! Unknown cleaner names leave the text untouched.

pub mod bopomofo;
pub mod latin;
pub mod mandarin;
pub mod numerals;

pub use mandarin::Romanizer;
#[cfg(feature = "mandarin")]
pub use mandarin::JiebaPinyin;

/// A known normalization stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleaner {
    Chinese,
}

impl Cleaner {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "chinese_cleaners" => Some(Self::Chinese),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Chinese => "chinese_cleaners",
        }
    }
}

/// Runs the configured cleaners over input text.
pub struct TextNormalizer {
    cleaners: Vec<Cleaner>,
    romanizer: Box<dyn Romanizer>,
}

impl TextNormalizer {
    /// Resolve cleaner names. Unknown names are skipped with a warning.
    pub fn new(cleaner_names: &[String], romanizer: Box<dyn Romanizer>) -> Self {
        let cleaners = cleaner_names
            .iter()
            .filter_map(|name| {
                let cleaner = Cleaner::from_name(name);
                if cleaner.is_none() {
                    log::warn!("Unknown text cleaner '{name}', skipping");
                }
                cleaner
            })
            .collect();
        Self {
            cleaners,
            romanizer,
        }
    }

    pub fn cleaners(&self) -> &[Cleaner] {
        &self.cleaners
    }

    pub fn normalize(&self, text: &str) -> String {
        self.cleaners
            .iter()
            .fold(text.to_string(), |text, &cleaner| self.apply(cleaner, &text))
    }

    fn apply(&self, cleaner: Cleaner, text: &str) -> String {
        match cleaner {
            Cleaner::Chinese => chinese_cleaners(text, self.romanizer.as_ref()),
        }
    }
}

/// Numerals, then logograms, then any remaining Latin letters.
pub fn chinese_cleaners(text: &str, romanizer: &dyn Romanizer) -> String {
    let text = numerals::expand_numbers(text);
    let text = mandarin::chinese_to_bopomofo(&text, romanizer);
    let text = latin::latin_to_bopomofo(&text);
    log::debug!("Cleaned text: {text}");
    text
}
