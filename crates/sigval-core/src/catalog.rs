//! Unit catalog seam and the name-to-id cache used by persistence layers.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::unit::KNOWN_UNITS;

/// Persisted unit definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: i64,
    pub name: String,
    pub label: String,
    pub kind: Option<String>,
}

/// Lookup key for a catalog unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKey {
    Name(String),
    Id(i64),
}

impl Display for UnitKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Id(id) => write!(f, "#{id}"),
        }
    }
}

/// Failure of the backing catalog store (not a lookup miss).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unit catalog unavailable: {0}")]
pub struct CatalogError(pub String);

/// A source of persisted unit definitions.
pub trait UnitCatalog {
    fn unit_by_name(&self, name: &str) -> Result<Option<UnitRecord>, CatalogError>;

    fn unit_by_id(&self, id: i64) -> Result<Option<UnitRecord>, CatalogError>;

    /// Registers a unit and returns its id. An existing unit with the same
    /// name keeps its id.
    fn register(
        &self,
        name: &str,
        label: &str,
        kind: Option<&str>,
    ) -> Result<i64, CatalogError>;
}

#[derive(Debug, Default)]
struct CatalogInner {
    records: Vec<UnitRecord>,
}

/// In-memory catalog seeded with the known atomic units.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUnitCatalog {
    inner: Arc<RwLock<CatalogInner>>,
}

impl InMemoryUnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known_units() -> Self {
        let records = KNOWN_UNITS
            .iter()
            .zip(1_i64..)
            .map(|((name, label), id)| UnitRecord {
                id,
                name: (*name).to_owned(),
                label: (*label).to_owned(),
                kind: None,
            })
            .collect();

        Self {
            inner: Arc::new(RwLock::new(CatalogInner { records })),
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UnitCatalog for InMemoryUnitCatalog {
    fn unit_by_name(&self, name: &str) -> Result<Option<UnitRecord>, CatalogError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .records
            .iter()
            .find(|record| record.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn unit_by_id(&self, id: i64) -> Result<Option<UnitRecord>, CatalogError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.records.iter().find(|record| record.id == id).cloned())
    }

    fn register(
        &self,
        name: &str,
        label: &str,
        kind: Option<&str>,
    ) -> Result<i64, CatalogError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = inner
            .records
            .iter()
            .find(|record| record.name.eq_ignore_ascii_case(name))
        {
            return Ok(existing.id);
        }

        let id = inner.records.iter().map(|record| record.id).max().unwrap_or(0) + 1;
        inner.records.push(UnitRecord {
            id,
            name: name.to_owned(),
            label: label.to_owned(),
            kind: kind.map(str::to_owned),
        });
        Ok(id)
    }
}

/// Case-insensitive unit name to id cache.
///
/// Read-mostly and populated once per key: concurrent readers share the read
/// lock, and the first writer for a key wins.
#[derive(Debug, Clone, Default)]
pub struct UnitIdCache {
    inner: Arc<RwLock<HashMap<String, i64>>>,
}

impl UnitIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&name.to_lowercase()).copied()
    }

    /// Returns the cached id, or resolves it once with `resolve` and caches
    /// the result. Misses are not cached.
    pub fn get_or_resolve<E>(
        &self,
        name: &str,
        resolve: impl FnOnce(&str) -> Result<Option<i64>, E>,
    ) -> Result<Option<i64>, E> {
        if let Some(id) = self.get(name) {
            return Ok(Some(id));
        }

        let Some(id) = resolve(name)? else {
            return Ok(None);
        };

        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Some(*map.entry(name.to_lowercase()).or_insert(id)))
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
