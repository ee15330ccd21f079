//! Flat persistence contract shared by every container.
//!
//! A container packs to an ordered list of numbers plus an ordered list of
//! strings. Series timestamps are not part of a pack; they travel in a
//! separate channel and are handed back on unpack.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Packed form of a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Packed {
    pub values: Vec<f64>,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl Packed {
    pub fn new(values: Vec<f64>, messages: Vec<String>) -> Self {
        Self { values, messages }
    }

    pub fn values_only(values: Vec<f64>) -> Self {
        Self {
            values,
            messages: Vec::new(),
        }
    }
}

/// Containers that can be flattened for storage.
pub trait Pack {
    fn pack(&self) -> Packed;

    fn kind(&self) -> ResultKind;
}

/// Stored container flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Scalar,
    Vector,
    Series,
    BooleanSeries,
    PercentageSeries,
    Histogram,
}

impl ResultKind {
    pub const ALL: [ResultKind; 6] = [
        Self::Scalar,
        Self::Vector,
        Self::Series,
        Self::BooleanSeries,
        Self::PercentageSeries,
        Self::Histogram,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Vector => "vector",
            Self::Series => "series",
            Self::BooleanSeries => "boolean_series",
            Self::PercentageSeries => "percentage_series",
            Self::Histogram => "histogram",
        }
    }

    /// Whether the kind carries a parallel timestamp channel.
    pub fn is_time_indexed(self) -> bool {
        matches!(
            self,
            Self::Series | Self::BooleanSeries | Self::PercentageSeries
        )
    }
}

impl Display for ResultKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| format!("unknown result kind '{value}'"))
    }
}
