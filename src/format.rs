use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::engine::round_to_precision;

/// Thousands and decimal separators for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum NumberLocale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "de-DE")]
    DeDe,
}

impl NumberLocale {
    fn separators(&self) -> (char, char) {
        match self {
            NumberLocale::EnUs => (',', '.'),
            NumberLocale::DeDe => ('.', ','),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NumberLocale::EnUs => "en-US",
            NumberLocale::DeDe => "de-DE",
        }
    }
}

impl fmt::Display for NumberLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NumberLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "en-us" | "en" => Ok(NumberLocale::EnUs),
            "de-de" | "de" => Ok(NumberLocale::DeDe),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyOptions {
    pub precision: usize,
    pub show_cents: bool,
    pub locale: NumberLocale,
}

impl Default for CurrencyOptions {
    fn default() -> Self {
        Self {
            precision: 2,
            show_cents: true,
            locale: NumberLocale::EnUs,
        }
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped
}

/// Fixed-decimal number with locale separators, e.g. `1,234,567.89`.
pub fn format_number(value: f64, decimals: usize, locale: NumberLocale) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let (group, decimal) = locale.separators();
    let rounded = round_to_precision(value.abs(), decimals as u32);
    let fixed = format!("{:.*}", decimals, rounded);
    let body = match fixed.split_once('.') {
        Some((whole, fraction)) => format!("{}{}{}", group_digits(whole, group), decimal, fraction),
        None => group_digits(&fixed, group),
    };
    if value < 0.0 && rounded != 0.0 {
        format!("-{body}")
    } else {
        body
    }
}

/// Dollar amount; the sign goes in front of the symbol (`-$1.23`).
///
/// Non-finite input renders as `$0.00`. Without cents the amount is rounded
/// to whole dollars.
pub fn format_currency(value: f64, options: &CurrencyOptions) -> String {
    if !value.is_finite() {
        return "$0.00".to_string();
    }
    let decimals = if options.show_cents {
        options.precision
    } else {
        0
    };
    let body = format_number(value.abs(), decimals, options.locale);
    let rounded = round_to_precision(value.abs(), decimals as u32);
    if value < 0.0 && rounded != 0.0 {
        format!("-${body}")
    } else {
        format!("${body}")
    }
}

fn trim_fraction(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

const MAGNITUDES: [(f64, &str); 4] = [(1.0, ""), (1e3, "K"), (1e6, "M"), (1e9, "B")];

/// Compact magnitude: `1.5M`, `12K`, `2.5B`. Trailing zeros are dropped.
///
/// The unit is picked again after rounding, so `999_950` reads `1M` rather than `1000K`.
pub fn format_large_number(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let magnitude = value.abs();
    let mut unit = MAGNITUDES
        .iter()
        .rposition(|(size, _)| magnitude >= *size)
        .unwrap_or(0);
    let mut rounded = round_to_precision(magnitude / MAGNITUDES[unit].0, precision as u32);
    if rounded >= 1000.0 && unit + 1 < MAGNITUDES.len() {
        unit += 1;
        rounded = round_to_precision(magnitude / MAGNITUDES[unit].0, precision as u32);
    }
    let body = trim_fraction(format!("{:.*}", precision, rounded));
    let sign = if value < 0.0 && rounded != 0.0 { "-" } else { "" };
    format!("{sign}{body}{}", MAGNITUDES[unit].1)
}

pub fn format_percentage(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }
    let rounded = round_to_precision(value, precision as u32);
    format!("{:.*}%", precision, rounded)
}
