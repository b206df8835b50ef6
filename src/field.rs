use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Known row fields. Custom columns are plain strings and never map to a Field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Id,
    Name,
    Email,
    Age,
    Role,
    Department,
    Location,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Id,
        Field::Name,
        Field::Email,
        Field::Age,
        Field::Role,
        Field::Department,
        Field::Location,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::Email => "email",
            Field::Age => "age",
            Field::Role => "role",
            Field::Department => "department",
            Field::Location => "location",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Field::Age)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown field \"{s}\""))
    }
}

/// Loosely typed cell value. Age is normally a number, everything else text,
/// but a draft may hold whatever the user typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(#[serde(with = "nan_as_null")] f64),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn as_cell(&self) -> Cell<'_> {
        match self {
            Value::Number(n) => Cell::Number(*n),
            Value::Text(s) => Cell::Text(s),
        }
    }

    /// Number coercion used by CSV import: blank is 0, garbage is NaN.
    pub fn coerce_number(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Number(0.0);
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Number(f64::NAN),
        }
    }

    /// Parses text as a finite number, if it is one.
    pub fn parse_finite(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.is_finite().then_some(*n),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_cell().fmt(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

/// Borrowed view of a row cell, used for searching, sorting and export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

impl Cell<'_> {
    /// Ordering used when sorting rows. Numbers compare numerically, anything
    /// else falls back to string collation.
    pub fn compare(&self, other: &Cell<'_>) -> Ordering {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (a, b) => collate(&a.to_string(), &b.to_string()),
        }
    }
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) if n.is_nan() => f.write_str("NaN"),
            Cell::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Case-insensitive primary order, lowercase before uppercase on ties.
///
/// Comparison is by code point after lowercasing, with no locale rules:
/// accented letters do not fold to their base letter, so "Émile" sorts after "Zoe".
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

// serde_json cannot carry NaN, so non-finite numbers are stored as null.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>(), Ok(field));
        }
        assert!("salary".parse::<Field>().is_err());
        assert!("Name".parse::<Field>().is_err());
    }

    #[test]
    fn numbers_display_like_plain_integers() {
        assert_eq!(Value::Number(28.0).to_string(), "28");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::text("Mumbai").to_string(), "Mumbai");
    }

    #[test]
    fn coerce_number_follows_import_rules() {
        assert_eq!(Value::coerce_number("42"), Value::Number(42.0));
        assert_eq!(Value::coerce_number(" 7 "), Value::Number(7.0));
        assert_eq!(Value::coerce_number(""), Value::Number(0.0));
        match Value::coerce_number("forty") {
            Value::Number(n) => assert!(n.is_nan()),
            other => panic!("expected NaN, got {other:?}"),
        }
        match Value::coerce_number("inf") {
            Value::Number(n) => assert!(n.is_nan()),
            other => panic!("expected NaN, got {other:?}"),
        }
    }

    #[test]
    fn cells_compare_numerically_or_by_collation() {
        assert_eq!(Cell::Number(9.0).compare(&Cell::Number(10.0)), Ordering::Less);
        assert_eq!(Cell::Text("9").compare(&Cell::Text("10")), Ordering::Greater);
        assert_eq!(Cell::Text("apple").compare(&Cell::Text("Banana")), Ordering::Less);
        assert_eq!(Cell::Text("a").compare(&Cell::Text("A")), Ordering::Less);
        assert_eq!(
            Cell::Number(f64::NAN).compare(&Cell::Number(1.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn collation_is_by_code_point_without_accent_folding() {
        assert_eq!(collate("émile", "Emma"), Ordering::Greater);
        assert_eq!(collate("Émile", "Zoe"), Ordering::Greater);
        assert_eq!(collate("Émile", "émile"), Ordering::Greater);
    }

    #[test]
    fn values_survive_json_including_nan() {
        let values = vec![Value::Number(3.0), Value::text("x"), Value::Number(f64::NAN)];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, "[3.0,\"x\",null]");
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0], Value::Number(3.0));
        assert_eq!(back[1], Value::text("x"));
        assert!(matches!(back[2], Value::Number(n) if n.is_nan()));
    }
}
