// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use serde_json::Value;

pub const PLACEHOLDER: &str = "—";

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;

/// Leading integer of a string or number, the way the catalog's own web
/// client reads `"1080p"` as 1080.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int_str(s),
        _ => None,
    }
}

pub fn parse_int_str(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Whether a JSON value counts as "present" for first-of-several lookups.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Human readable size: `500 B`, `2.0 KB`, `4.77 MB`, `1.50 GB`.
pub fn bytes_to(size: Option<&Value>) -> String {
    let Some(size) = size.filter(|v| is_truthy(v)) else {
        return PLACEHOLDER.to_string();
    };
    let Some(bytes) = parse_int(size) else {
        return PLACEHOLDER.to_string();
    };

    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.2} MB", b / MB)
    } else {
        format!("{:.2} GB", b / GB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_each_unit() {
        assert_eq!(bytes_to(Some(&json!(500))), "500 B");
        assert_eq!(bytes_to(Some(&json!(2048))), "2.0 KB");
        assert_eq!(bytes_to(Some(&json!(5_000_000))), "4.77 MB");
        assert_eq!(bytes_to(Some(&json!(3_221_225_472u64))), "3.00 GB");
    }

    #[test]
    fn string_sizes_parse_their_leading_digits() {
        assert_eq!(bytes_to(Some(&json!("2048"))), "2.0 KB");
        assert_eq!(bytes_to(Some(&json!("1023 bytes"))), "1023 B");
    }

    #[test]
    fn missing_or_useless_sizes_render_placeholder() {
        assert_eq!(bytes_to(None), PLACEHOLDER);
        assert_eq!(bytes_to(Some(&json!(0))), PLACEHOLDER);
        assert_eq!(bytes_to(Some(&json!(""))), PLACEHOLDER);
        assert_eq!(bytes_to(Some(&Value::Null)), PLACEHOLDER);
        assert_eq!(bytes_to(Some(&json!("big"))), PLACEHOLDER);
    }

    #[test]
    fn parse_int_takes_leading_integer() {
        assert_eq!(parse_int(&json!("1080p")), Some(1080));
        assert_eq!(parse_int(&json!("  720")), Some(720));
        assert_eq!(parse_int(&json!("-3x")), Some(-3));
        assert_eq!(parse_int(&json!(480)), Some(480));
        assert_eq!(parse_int(&json!(12.9)), Some(12));
        assert_eq!(parse_int(&json!("HD")), None);
        assert_eq!(parse_int(&json!(true)), None);
    }
}
