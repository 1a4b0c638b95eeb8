//! Arabic numerals → Mandarin number words.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Digit run, optional decimal part, optional trailing 年.
static NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+(?:\.?[0-9]+)?年?").expect("valid number pattern"));

const YEAR_MARKER: char = '年';
const DIGITS: [char; 10] = ['零', '一', '二', '三', '四', '五', '六', '七', '八', '九'];
const SECTION_UNITS: [&str; 4] = ["", "十", "百", "千"];
const GROUP_UNITS: [&str; 4] = ["", "万", "亿", "万亿"];

/// Rewrite every numeral span in `text` as Mandarin number words.
///
/// A trailing 年 is consumed along with the digits and not written back.
pub fn expand_numbers(text: &str) -> Cow<'_, str> {
    NUMBER_PATTERN.replace_all(text, |caps: &Captures| {
        let matched = &caps[0];
        let number = matched.strip_suffix(YEAR_MARKER).unwrap_or(matched);
        number_to_chinese(number)
    })
}

/// Read a decimal number string (`"2023"`, `"3.14"`) in Mandarin.
pub fn number_to_chinese(number: &str) -> String {
    let (integer, fraction) = match number.split_once('.') {
        Some((integer, fraction)) => (integer, fraction.trim_end_matches('0')),
        None => (number, ""),
    };

    let mut words = integer_to_chinese(integer);
    if !fraction.is_empty() {
        words.push('点');
        words.extend(fraction.chars().filter_map(digit_word));
    }
    words
}

fn digit_word(ch: char) -> Option<char> {
    ch.to_digit(10).map(|d| DIGITS[d as usize])
}

fn integer_to_chinese(digits: &str) -> String {
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return DIGITS[0].to_string();
    }
    if digits.len() > 16 {
        return digits.chars().filter_map(digit_word).collect();
    }

    let bytes = digits.as_bytes();
    let group_count = bytes.len().div_ceil(4);
    let first_len = bytes.len() - (group_count - 1) * 4;

    let mut words = String::new();
    let mut pending_zero = false;
    let mut start = 0;
    for group in 0..group_count {
        let end = if group == 0 { first_len } else { start + 4 };
        let value = bytes[start..end]
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
        start = end;

        if value == 0 {
            pending_zero = true;
            continue;
        }
        if !words.is_empty() && (pending_zero || value < 1000) {
            words.push(DIGITS[0]);
        }
        section_to_chinese(value, &mut words);
        words.push_str(GROUP_UNITS[group_count - 1 - group]);
        pending_zero = false;
    }

    match words.strip_prefix("一十") {
        Some(rest) => format!("十{rest}"),
        None => words,
    }
}

/// Append the reading of `value` (1..=9999) to `out`.
fn section_to_chinese(value: u32, out: &mut String) {
    let mut emitted = false;
    let mut zero = false;
    for position in (0..4).rev() {
        let digit = (value / 10u32.pow(position as u32)) % 10;
        if digit == 0 {
            zero = emitted;
            continue;
        }
        if zero {
            out.push(DIGITS[0]);
            zero = false;
        }
        out.push(DIGITS[digit as usize]);
        out.push_str(SECTION_UNITS[position]);
        emitted = true;
    }
}
