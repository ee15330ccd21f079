use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{UnitCatalog, UnitKey};
use crate::UnitError;

/// Atomic units known without a catalog, as `(name, label)`.
pub const KNOWN_UNITS: &[(&str, &str)] = &[
    ("millimeter", "mm"),
    ("meter", "m"),
    ("kilometer", "km"),
    ("microsecond", "us"),
    ("millisecond", "ms"),
    ("second", "s"),
    ("hour", "h"),
    ("meters_per_second", "m/s"),
    ("kilometers_per_hour", "km/h"),
    ("degree", "deg"),
    ("radian", "rad"),
    ("meters_per_second_squared", "m/s**2"),
    ("degrees_per_second", "deg/s"),
    ("radians_per_second", "rad/s"),
    ("curve", "1/m"),
    ("none", "none"),
    ("binary", "0-1"),
    ("percentage", "%"),
    ("kilogram", "kg"),
    ("decibel", "db"),
    ("per_hour", "1/h"),
    ("per_kilometer", "1/km"),
    ("per_100_kilometer", "1/100km"),
];

/// Label of a dimensionless quantity.
const DIMENSIONLESS: &str = "none";

/// Physical unit attached to values and series.
///
/// The label is an algebraic expression over atomic symbols (`m/s**2`).
/// Composition concatenates labels without cancelling terms, so both
/// operands stay readable in the result; [`Unit::dimension`] gives the
/// canonical exponent map used for consistency checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl Unit {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: None,
            id: None,
        }
    }

    /// Resolves a known unit name; unknown names label themselves.
    pub fn from_name(name: &str) -> Self {
        let label = known_label(name).unwrap_or(name);
        Self::new(name, label)
    }

    pub fn none() -> Self {
        Self::from_name("none")
    }

    pub fn binary() -> Self {
        Self::from_name("binary")
    }

    pub fn percentage() -> Self {
        Self::from_name("percentage")
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn compose_multiply(&self, other: &Unit) -> Unit {
        Unit::new(
            format!("{}_x_{}", self.name, other.name),
            format!("{}*{}", wrap(&self.label), wrap(&other.label)),
        )
    }

    pub fn compose_divide(&self, other: &Unit) -> Unit {
        Unit::new(
            format!("{}_/_{}", self.name, other.name),
            format!("{}/{}", wrap(&self.label), wrap(&other.label)),
        )
    }

    pub fn compose_power(&self, exponent: f64) -> Result<Unit, UnitError> {
        if !exponent.is_finite() {
            return Err(UnitError::NonFiniteExponent { exponent });
        }

        Ok(Unit::new(
            format!("{}_^_{}", self.name, exponent),
            format!("{}**{}", wrap(&self.label), exponent),
        ))
    }

    /// Canonical exponent map of the label. Dimensionless units map to an
    /// empty set.
    pub fn dimension(&self) -> Result<BTreeMap<String, f64>, UnitError> {
        LabelParser::new(&self.label).parse()
    }

    /// Whether both units describe the same physical dimension. Labels that
    /// do not parse are compared verbatim.
    pub fn same_dimension(&self, other: &Unit) -> bool {
        match (self.dimension(), other.dimension()) {
            (Ok(left), Ok(right)) => left == right,
            _ => self.label == other.label,
        }
    }

    /// Populates this unit from a catalog record. Returns `false` when the
    /// catalog has no such unit or cannot be read.
    pub fn load(&mut self, catalog: &dyn UnitCatalog, key: &UnitKey) -> bool {
        let lookup = match key {
            UnitKey::Name(name) => catalog.unit_by_name(name),
            UnitKey::Id(id) => catalog.unit_by_id(*id),
        };

        match lookup {
            Ok(Some(record)) => {
                self.name = record.name;
                self.label = record.label;
                self.kind = record.kind;
                self.id = Some(record.id);
                true
            }
            Ok(None) => false,
            Err(error) => {
                warn!(unit = ?key, error = %error, "unit catalog lookup failed");
                false
            }
        }
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self::none()
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.label)
    }
}

impl std::ops::Mul for &Unit {
    type Output = Unit;

    fn mul(self, rhs: &Unit) -> Unit {
        self.compose_multiply(rhs)
    }
}

impl std::ops::Div for &Unit {
    type Output = Unit;

    fn div(self, rhs: &Unit) -> Unit {
        self.compose_divide(rhs)
    }
}

pub fn known_label(name: &str) -> Option<&'static str> {
    KNOWN_UNITS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, label)| *label)
}

fn wrap(label: &str) -> String {
    if label.contains(['*', '/']) {
        format!("({label})")
    } else {
        label.to_owned()
    }
}

/// Recursive-descent parser for unit labels.
///
/// ```text
/// expr   := term (('*' | '/') term)*
/// term   := factor ('**' number)?
/// factor := '(' expr ')' | symbol
/// ```
struct LabelParser<'a> {
    label: &'a str,
    rest: &'a str,
}

impl<'a> LabelParser<'a> {
    fn new(label: &'a str) -> Self {
        Self { label, rest: label }
    }

    fn parse(mut self) -> Result<BTreeMap<String, f64>, UnitError> {
        let dimension = self.expr()?;
        self.skip_ws();
        if !self.rest.is_empty() {
            return Err(self.fail(format!("unexpected trailing input '{}'", self.rest)));
        }
        Ok(dimension)
    }

    fn expr(&mut self) -> Result<BTreeMap<String, f64>, UnitError> {
        let mut acc = self.term()?;
        loop {
            self.skip_ws();
            if self.rest.starts_with("**") {
                return Err(self.fail(String::from("exponent without base")));
            }
            let sign = if let Some(rest) = self.rest.strip_prefix('*') {
                self.rest = rest;
                1.0
            } else if let Some(rest) = self.rest.strip_prefix('/') {
                self.rest = rest;
                -1.0
            } else {
                return Ok(acc);
            };
            let rhs = self.term()?;
            merge(&mut acc, &rhs, sign);
        }
    }

    fn term(&mut self) -> Result<BTreeMap<String, f64>, UnitError> {
        let base = self.factor()?;
        self.skip_ws();
        let Some(rest) = self.rest.strip_prefix("**") else {
            return Ok(base);
        };
        self.rest = rest.trim_start();

        let end = self
            .rest
            .find(|ch: char| !(ch.is_ascii_digit() || ch == '.' || ch == '-'))
            .unwrap_or(self.rest.len());
        let exponent: f64 = self.rest[..end]
            .parse()
            .map_err(|_| self.fail(format!("invalid exponent '{}'", &self.rest[..end])))?;
        self.rest = &self.rest[end..];

        let mut powered = BTreeMap::new();
        merge(&mut powered, &base, exponent);
        Ok(powered)
    }

    fn factor(&mut self) -> Result<BTreeMap<String, f64>, UnitError> {
        self.skip_ws();
        if let Some(rest) = self.rest.strip_prefix('(') {
            self.rest = rest;
            let inner = self.expr()?;
            self.skip_ws();
            let Some(rest) = self.rest.strip_prefix(')') else {
                return Err(self.fail(String::from("missing ')'")));
            };
            self.rest = rest;
            return Ok(inner);
        }

        let end = self
            .rest
            .find(|ch: char| matches!(ch, '*' | '/' | '(' | ')') || ch.is_whitespace())
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(self.fail(String::from("expected a unit symbol")));
        }
        let symbol = &self.rest[..end];
        self.rest = &self.rest[end..];

        let mut dimension = BTreeMap::new();
        if symbol != "1" && symbol != DIMENSIONLESS {
            dimension.insert(symbol.to_owned(), 1.0);
        }
        Ok(dimension)
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn fail(&self, reason: String) -> UnitError {
        UnitError::InvalidLabel {
            label: self.label.to_owned(),
            reason,
        }
    }
}

fn merge(acc: &mut BTreeMap<String, f64>, other: &BTreeMap<String, f64>, factor: f64) {
    for (symbol, exponent) in other {
        let entry = acc.entry(symbol.clone()).or_insert(0.0);
        *entry += exponent * factor;
        if *entry == 0.0 {
            acc.remove(symbol);
        }
    }
}
