use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::pack::{Pack, Packed, ResultKind};
use crate::{Number, Unit};

/// A single named, unit-tagged value that may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarValue {
    pub name: String,
    pub unit: Unit,
    pub value: Option<f64>,
}

impl ScalarValue {
    pub fn new(name: impl Into<String>, unit: Unit, value: Option<f64>) -> Self {
        Self {
            name: name.into(),
            unit,
            value,
        }
    }

    pub fn from_number(name: impl Into<String>, unit: Unit, value: impl Into<Number>) -> Self {
        Self::new(name, unit, Some(value.into().as_f64()))
    }

    /// Parses `text` as a number; text that does not parse yields an absent
    /// value.
    pub fn from_text(name: impl Into<String>, unit: Unit, text: &str) -> Self {
        Self::new(name, unit, text.trim().parse::<f64>().ok())
    }

    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    /// Restores the value from a pack. An empty pack or a NaN reads back as
    /// absent.
    pub fn unpack(&mut self, packed: &Packed) {
        self.value = packed.values.first().copied().filter(|value| !value.is_nan());
    }
}

impl Pack for ScalarValue {
    fn pack(&self) -> Packed {
        Packed::values_only(vec![self.value.unwrap_or(f64::NAN)])
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Scalar
    }
}

impl std::ops::Neg for &ScalarValue {
    type Output = ScalarValue;

    fn neg(self) -> ScalarValue {
        ScalarValue::new(
            format!("-{}", self.name),
            self.unit.clone(),
            self.value.map(|value| -value),
        )
    }
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.value {
            Some(value) => write!(f, "{} = {} {}", self.name, value, self.unit),
            None => write!(f, "{} = <absent> {}", self.name, self.unit),
        }
    }
}
