//! Text normalization applied before synthesis.
//!
//! Converts written forms the engine reads poorly — digits, ordinals,
//! percentages, currency amounts — into spoken words, and strips the
//! cosmetic `*` emphasis markup some chat frontends emit. Unlike a full
//! phonemization frontend this deliberately keeps case and punctuation:
//! sentence and clause delimiters must survive for the segment splitter.

use fancy_regex::{Captures, Regex};
use once_cell::sync::Lazy;

// ─────────────────────────────────────────────────────────────────────────────
// Number → words
// ─────────────────────────────────────────────────────────────────────────────

const ONES: &[&str] = &[
    "", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
    "ten", "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen",
    "seventeen", "eighteen", "nineteen",
];
const TENS: &[&str] =
    &["", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety"];
const SCALES: &[&str] = &["", "thousand", "million", "billion", "trillion"];

fn under_hundred(n: u64) -> String {
    if n < 20 {
        ONES[n as usize].to_string()
    } else if n % 10 == 0 {
        TENS[(n / 10) as usize].to_string()
    } else {
        format!("{}-{}", TENS[(n / 10) as usize], ONES[(n % 10) as usize])
    }
}

fn under_thousand(n: u64) -> String {
    let mut parts = Vec::new();
    if n >= 100 {
        parts.push(format!("{} hundred", ONES[(n / 100) as usize]));
    }
    if n % 100 != 0 {
        parts.push(under_hundred(n % 100));
    }
    parts.join(" ")
}

/// Convert an integer to English words.
pub fn number_to_words(n: i64) -> String {
    if n < 0 {
        return format!("negative {}", number_to_words(-n));
    }
    if n == 0 {
        return "zero".to_string();
    }
    let mut groups = Vec::new();
    let mut remaining = n as u64;
    for scale in SCALES {
        let group = remaining % 1000;
        if group > 0 {
            let words = under_thousand(group);
            groups.push(if scale.is_empty() { words } else { format!("{words} {scale}") });
        }
        remaining /= 1000;
        if remaining == 0 {
            break;
        }
    }
    groups.reverse();
    groups.join(" ")
}

/// Convert a decimal string to words, reading fractional digits one by one.
pub fn float_to_words(value: &str) -> String {
    let (negative, value) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let words = match value.split_once('.') {
        Some((int_part, dec_part)) => {
            let int_words = if int_part.is_empty() {
                "zero".to_string()
            } else {
                number_to_words(int_part.parse::<i64>().unwrap_or(0))
            };
            let digits: Vec<&str> = dec_part
                .chars()
                .filter_map(|c| c.to_digit(10).map(|d| ONES_DIGITS[d as usize]))
                .collect();
            format!("{} point {}", int_words, digits.join(" "))
        }
        None => number_to_words(value.parse::<i64>().unwrap_or(0)),
    };

    if negative {
        format!("negative {words}")
    } else {
        words
    }
}

const ONES_DIGITS: &[&str] =
    &["zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine"];

fn ordinal_words(n: i64) -> String {
    const EXCEPTIONS: &[(&str, &str)] = &[
        ("one", "first"),
        ("two", "second"),
        ("three", "third"),
        ("five", "fifth"),
        ("eight", "eighth"),
        ("nine", "ninth"),
        ("twelve", "twelfth"),
    ];

    let cardinal = number_to_words(n);
    // Only the final word changes: "twenty-one" → "twenty-first".
    let cut = cardinal.rfind(['-', ' ']).map(|i| i + 1).unwrap_or(0);
    let (prefix, last) = cardinal.split_at(cut);

    let last_ordinal = EXCEPTIONS
        .iter()
        .find(|(base, _)| *base == last)
        .map(|(_, ordinal)| (*ordinal).to_string())
        .unwrap_or_else(|| {
            if let Some(stem) = last.strip_suffix('y') {
                format!("{stem}ieth")
            } else if last.ends_with('t') {
                format!("{last}h")
            } else {
                format!("{last}th")
            }
        });

    format!("{prefix}{last_ordinal}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Compiled regexes (lazily initialised once)
// ─────────────────────────────────────────────────────────────────────────────

static RE_ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d+)(st|nd|rd|th)\b").unwrap());
static RE_PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(-?[\d,]+(?:\.\d+)?)\s*%").unwrap());
static RE_CURRENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([$€£¥])\s*([\d,]+(?:\.\d+)?)(?![\d])").unwrap());
static RE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?<![a-zA-Z])-?[\d,]+(?:\.\d+)?").unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ─────────────────────────────────────────────────────────────────────────────
// Expansion passes
// ─────────────────────────────────────────────────────────────────────────────

fn currency_name(symbol: &str) -> &'static str {
    match symbol {
        "$" => "dollar",
        "€" => "euro",
        "£" => "pound",
        "¥" => "yen",
        _ => "",
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}

pub fn expand_ordinals(text: &str) -> String {
    RE_ORDINAL
        .replace_all(text, |caps: &Captures| ordinal_words(caps[1].parse().unwrap_or(0)))
        .into_owned()
}

pub fn expand_percentages(text: &str) -> String {
    RE_PERCENT
        .replace_all(text, |caps: &Captures| {
            let raw = caps[1].replace(',', "");
            let words = if raw.contains('.') {
                float_to_words(&raw)
            } else {
                number_to_words(raw.parse().unwrap_or(0))
            };
            format!("{words} percent")
        })
        .into_owned()
}

pub fn expand_currency(text: &str) -> String {
    RE_CURRENCY
        .replace_all(text, |caps: &Captures| {
            let unit = currency_name(&caps[1]);
            let raw = caps[2].replace(',', "");
            match raw.split_once('.') {
                Some((whole, cents)) => {
                    let whole: i64 = whole.parse().unwrap_or(0);
                    let cents: i64 = cents
                        .chars()
                        .take(2)
                        .chain(std::iter::repeat('0'))
                        .take(2)
                        .collect::<String>()
                        .parse()
                        .unwrap_or(0);
                    let mut words =
                        format!("{} {}{}", number_to_words(whole), unit, plural(whole));
                    if cents > 0 {
                        words.push_str(&format!(
                            " and {} cent{}",
                            number_to_words(cents),
                            plural(cents)
                        ));
                    }
                    words
                }
                None => {
                    let n: i64 = raw.parse().unwrap_or(0);
                    format!("{} {}{}", number_to_words(n), unit, plural(n))
                }
            }
        })
        .into_owned()
}

pub fn replace_numbers(text: &str) -> String {
    RE_NUMBER
        .replace_all(text, |caps: &Captures| {
            let raw = caps[0].replace(',', "");
            if raw.contains('.') {
                float_to_words(&raw)
            } else if let Ok(n) = raw.parse::<i64>() {
                number_to_words(n)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Strip the literal `*` emphasis markers the engine cannot render.
pub fn strip_emphasis(text: &str) -> String {
    text.replace('*', "")
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Full normalization pass for plain (non-SSML) English text.
///
/// Currency and percentages run before the bare-number pass so their digits
/// are consumed with their unit; whitespace is collapsed last.
pub fn normalize(text: &str) -> String {
    let text = expand_currency(text);
    let text = expand_percentages(&text);
    let text = expand_ordinals(&text);
    let text = replace_numbers(&text);
    RE_SPACES.replace_all(text.trim(), " ").into_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
