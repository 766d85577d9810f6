//! Type coercion for request values
//!
//! Path parameters, query strings and headers only ever carry strings, so a
//! schema asking for an integer must accept `"5"`. Each function returns the
//! converted value, or the message suffix describing the mismatch.

use serde_json::{Number, Value};

/// Coerce to an integer (accepts integral numbers and numeric strings)
pub fn integer(value: &Value) -> Result<Value, &'static str> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::Number(n) => from_float(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::from(i));
            }
            if let Ok(u) = trimmed.parse::<u64>() {
                return Ok(Value::from(u));
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => from_float(f),
                _ => Err("must be a number"),
            }
        }
        _ => Err("must be a number"),
    }
}

// i64 bounds as f64; the upper bound is exclusive since i64::MAX rounds up to 2^63.
const I64_MIN_F: f64 = -9_223_372_036_854_775_808.0;
const I64_END_F: f64 = 9_223_372_036_854_775_808.0;

fn from_float(f: f64) -> Result<Value, &'static str> {
    if !f.is_finite() {
        Err("must be a number")
    } else if f.fract() != 0.0 {
        Err("must be an integer")
    } else if !(I64_MIN_F..I64_END_F).contains(&f) {
        Err("must be a safe number")
    } else {
        Ok(Value::from(f as i64))
    }
}

/// Coerce to a number (accepts numbers and numeric strings)
pub fn number(value: &Value) -> Result<Value, &'static str> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::from(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or("must be a number")
        }
        _ => Err("must be a number"),
    }
}

/// Coerce to a boolean (accepts `true`/`false` in any case)
pub fn boolean(value: &Value) -> Result<Value, &'static str> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        _ => Err("must be a boolean"),
    }
}

/// Strings are never coerced from other types
pub fn string(value: &Value) -> Result<Value, &'static str> {
    match value {
        Value::String(_) => Ok(value.clone()),
        _ => Err("must be a string"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === integer() ===

    #[test]
    fn test_integer_accepts_number() {
        assert_eq!(integer(&json!(42)), Ok(json!(42)));
    }

    #[test]
    fn test_integer_accepts_numeric_string() {
        assert_eq!(integer(&json!("5")), Ok(json!(5)));
        assert_eq!(integer(&json!(" -3 ")), Ok(json!(-3)));
    }

    #[test]
    fn test_integer_accepts_integral_float() {
        assert_eq!(integer(&json!(4.0)), Ok(json!(4)));
        assert_eq!(integer(&json!("7.0")), Ok(json!(7)));
    }

    #[test]
    fn test_integer_rejects_fraction() {
        assert_eq!(integer(&json!(4.5)), Err("must be an integer"));
        assert_eq!(integer(&json!("4.5")), Err("must be an integer"));
    }

    #[test]
    fn test_integer_rejects_non_numeric() {
        assert_eq!(integer(&json!("abc")), Err("must be a number"));
        assert_eq!(integer(&json!("")), Err("must be a number"));
        assert_eq!(integer(&json!(null)), Err("must be a number"));
        assert_eq!(integer(&json!(true)), Err("must be a number"));
    }

    #[test]
    fn test_integer_keeps_large_unsigned_exact() {
        assert_eq!(integer(&json!("18446744073709551615")), Ok(json!(u64::MAX)));
    }

    #[test]
    fn test_integer_rejects_out_of_range() {
        assert_eq!(integer(&json!("1e30")), Err("must be a safe number"));
        assert_eq!(integer(&json!("1180591620717411303424")), Err("must be a safe number"));
        assert_eq!(integer(&json!(1e20)), Err("must be a safe number"));
        assert_eq!(integer(&json!(-1e20)), Err("must be a safe number"));
    }

    // === number() ===

    #[test]
    fn test_number_accepts_float_string() {
        assert_eq!(number(&json!("2.5")), Ok(json!(2.5)));
    }

    #[test]
    fn test_number_keeps_integers_integral() {
        assert_eq!(number(&json!("10")), Ok(json!(10)));
    }

    #[test]
    fn test_number_rejects_nan_and_text() {
        assert_eq!(number(&json!("NaN")), Err("must be a number"));
        assert_eq!(number(&json!("ten")), Err("must be a number"));
        assert_eq!(number(&json!([1])), Err("must be a number"));
    }

    // === boolean() ===

    #[test]
    fn test_boolean_accepts_strings() {
        assert_eq!(boolean(&json!("true")), Ok(json!(true)));
        assert_eq!(boolean(&json!("FALSE")), Ok(json!(false)));
    }

    #[test]
    fn test_boolean_rejects_other_values() {
        assert_eq!(boolean(&json!("yes")), Err("must be a boolean"));
        assert_eq!(boolean(&json!(1)), Err("must be a boolean"));
    }

    // === string() ===

    #[test]
    fn test_string_does_not_stringify_numbers() {
        assert_eq!(string(&json!(5)), Err("must be a string"));
        assert_eq!(string(&json!("5")), Ok(json!("5")));
    }
}
