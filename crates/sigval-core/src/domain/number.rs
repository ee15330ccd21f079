use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// A typed numeric input.
///
/// Containers store `f64`, but whether an input was written as an integer or
/// a float decides the element domain of a new container and whether an
/// insertion is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }

    pub fn domain(self) -> ValueDomain {
        match self {
            Self::Int(_) => ValueDomain::Integer,
            Self::Float(_) => ValueDomain::Float,
        }
    }

    /// Whether the number is an integer or a float with no fractional part.
    pub fn is_integral(self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::Float(value) => value.is_finite() && value.fract() == 0.0,
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Number {
    fn from(value: bool) -> Self {
        Self::Int(i64::from(value))
    }
}

/// Element type of a container, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDomain {
    Integer,
    Float,
}

impl ValueDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
        }
    }

    /// Resolves the domain of a list of inputs: any float promotes the list.
    pub fn promoted<'a>(values: impl IntoIterator<Item = &'a Number>) -> Option<Self> {
        let mut domain = None;
        for value in values {
            match value.domain() {
                Self::Float => return Some(Self::Float),
                Self::Integer => domain = Some(Self::Integer),
            }
        }
        domain
    }

    /// Combined domain of a binary operation's result.
    pub fn combine(self, other: Self) -> Self {
        if self == Self::Integer && other == Self::Integer {
            Self::Integer
        } else {
            Self::Float
        }
    }

    /// Whether `value` can be stored without data loss.
    pub fn accepts(self, value: Number) -> bool {
        match self {
            Self::Float => true,
            Self::Integer => value.is_integral(),
        }
    }

    /// Whether a stored `f64` is a legal element of this domain.
    pub fn admits(self, value: f64) -> bool {
        match self {
            Self::Float => true,
            Self::Integer => value.is_nan() || value.fract() == 0.0,
        }
    }

    /// Largest representable magnitude, substituted for unbounded ranges.
    pub fn max_magnitude(self) -> f64 {
        match self {
            Self::Integer => i64::MAX as f64,
            Self::Float => f64::MAX,
        }
    }

    pub fn from_values(values: &[f64]) -> Self {
        if values.iter().all(|value| Self::Integer.admits(*value)) {
            Self::Integer
        } else {
            Self::Float
        }
    }
}

impl Display for ValueDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_json_numbers_by_lexical_type() {
        let parsed: Vec<Number> = serde_json::from_str("[1, 2.5, 3.0]").expect("must parse");
        assert_eq!(
            parsed,
            vec![Number::Int(1), Number::Float(2.5), Number::Float(3.0)]
        );
    }

    #[test]
    fn promotes_mixed_lists_to_float() {
        let values = [Number::Int(1), Number::Float(3.1)];
        assert_eq!(ValueDomain::promoted(&values), Some(ValueDomain::Float));
        assert_eq!(ValueDomain::promoted(&[]), None);
    }

    #[test]
    fn integer_domain_rejects_lossy_floats() {
        assert!(ValueDomain::Integer.accepts(Number::Float(2.0)));
        assert!(!ValueDomain::Integer.accepts(Number::Float(2.5)));
        assert!(ValueDomain::Float.accepts(Number::Int(7)));
    }
}
