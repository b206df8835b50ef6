use std::sync::LazyLock;

use regex::Regex;

use crate::field::{Field, Value};

pub const AGE_ERROR: &str = "Age must be a number";
pub const EMAIL_ERROR: &str = "Invalid email address";

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Returns the error message for `value` in `field`, or None when it is acceptable.
pub fn validate(field: Field, value: &Value) -> Option<&'static str> {
    match field {
        Field::Age => value.parse_finite().is_none().then_some(AGE_ERROR),
        Field::Email => match value {
            Value::Text(s) if EMAIL_PATTERN.is_match(s) => None,
            _ => Some(EMAIL_ERROR),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_must_be_a_finite_number() {
        assert_eq!(validate(Field::Age, &Value::text("42")), None);
        assert_eq!(validate(Field::Age, &Value::text(" 4.5 ")), None);
        assert_eq!(validate(Field::Age, &Value::text("-3")), None);
        assert_eq!(validate(Field::Age, &Value::Number(30.0)), None);
        assert_eq!(validate(Field::Age, &Value::text("")), Some(AGE_ERROR));
        assert_eq!(validate(Field::Age, &Value::text("   ")), Some(AGE_ERROR));
        assert_eq!(validate(Field::Age, &Value::text("abc")), Some(AGE_ERROR));
        assert_eq!(validate(Field::Age, &Value::text("NaN")), Some(AGE_ERROR));
        assert_eq!(validate(Field::Age, &Value::text("inf")), Some(AGE_ERROR));
        assert_eq!(validate(Field::Age, &Value::Number(f64::NAN)), Some(AGE_ERROR));
    }

    #[test]
    fn email_needs_local_at_domain_dot_tld() {
        assert_eq!(validate(Field::Email, &Value::text("john@example.com")), None);
        assert_eq!(validate(Field::Email, &Value::text("a.b@c.d.e")), None);
        assert_eq!(validate(Field::Email, &Value::text("john@example")), Some(EMAIL_ERROR));
        assert_eq!(validate(Field::Email, &Value::text("john example@x.io")), Some(EMAIL_ERROR));
        assert_eq!(validate(Field::Email, &Value::text("a@@b.io")), Some(EMAIL_ERROR));
        assert_eq!(validate(Field::Email, &Value::text("@b.io")), Some(EMAIL_ERROR));
        assert_eq!(validate(Field::Email, &Value::text("")), Some(EMAIL_ERROR));
        assert_eq!(validate(Field::Email, &Value::Number(1.0)), Some(EMAIL_ERROR));
    }

    #[test]
    fn other_fields_are_always_valid() {
        for field in [Field::Id, Field::Name, Field::Role, Field::Department, Field::Location] {
            assert_eq!(validate(field, &Value::text("")), None);
            assert_eq!(validate(field, &Value::Number(f64::NAN)), None);
        }
    }
}
