use serde::{Deserialize, Serialize};

use crate::result::{FieldValue, LotData};

pub const TYPE_FIELD: &str = "tipologia_immobile";
pub const VALUE_FIELD: &str = "valore_immobiliare";
pub const MISSING_DETAILS: &str = "Dettagli non disponibili";

/// Human label for a payload key: `valore_immobiliare` -> `Valore Immobiliare`.
pub fn label_for(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut label: String = first.to_uppercase().collect();
                    label.push_str(&chars.as_str().to_lowercase());
                    label
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub group_separator: char,
    pub decimal_separator: char,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "€".to_string(),
            group_separator: ',',
            decimal_separator: '.',
        }
    }
}

impl CurrencyFormat {
    /// Symbol followed by the grouped amount, at most three fraction digits.
    pub fn format(&self, amount: f64) -> Option<String> {
        if !amount.is_finite() {
            return None;
        }
        let fixed = format!("{:.3}", amount.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let frac_part = frac_part.trim_end_matches('0');

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (idx, digit) in int_part.chars().enumerate() {
            if idx > 0 && (int_part.len() - idx) % 3 == 0 {
                grouped.push(self.group_separator);
            }
            grouped.push(digit);
        }
        if !frac_part.is_empty() {
            grouped.push(self.decimal_separator);
            grouped.push_str(frac_part);
        }

        let sign = if amount < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
            "-"
        } else {
            ""
        };
        Some(format!("{}{sign}{grouped}", self.symbol))
    }
}

/// Parses the leading decimal number of `text`, ignoring anything after it.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut mantissa_digits = end - digits_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    trimmed[..end].parse().ok()
}

/// Card summary of a lot for the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotSummary {
    pub type_label: String,
    pub formatted_value: Option<String>,
}

pub fn summary_of(lot: &LotData, currency: &CurrencyFormat) -> LotSummary {
    let type_label = lot
        .field(TYPE_FIELD)
        .and_then(|field| field.present_value())
        .map(ToString::to_string)
        .unwrap_or_else(|| MISSING_DETAILS.to_string());

    let formatted_value = lot
        .field(VALUE_FIELD)
        .and_then(|field| field.present_value())
        .and_then(|value| match value {
            FieldValue::Number(number) => number.as_f64(),
            FieldValue::Text(text) => parse_leading_number(text),
            FieldValue::Other(_) => None,
        })
        .and_then(|amount| currency.format(amount));

    LotSummary {
        type_label,
        formatted_value,
    }
}
