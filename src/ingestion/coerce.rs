//! Type inference for raw field text.
//!
//! The cascade is fixed: boolean literal, then integer (only when the text has no decimal
//! point), then float, then the text itself. Empty text is [`Value::Null`].

use std::num::IntErrorKind;

use crate::types::Value;

/// Coerce one (already trimmed, if trimming is enabled) field into a [`Value`].
///
/// - `"true"`/`"false"` in any case become [`Value::Bool`], before any numeric form.
/// - Text without `.` is tried as `i64` first so integers never pass through `f64`.
/// - Integer literals that overflow `i64` are kept verbatim as strings.
/// - Floats must contain at least one digit, so `inf`/`NaN` stay strings.
/// - Numbers are locale-invariant: `.` decimal point, no grouping separators.
pub fn coerce(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    if !text.contains('.') {
        match text.parse::<i64>() {
            Ok(i) => return Value::Int64(i),
            Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                return Value::Utf8(text.to_owned());
            }
            Err(_) => {}
        }
    }

    if text.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float64(f);
        }
    }

    Value::Utf8(text.to_owned())
}
