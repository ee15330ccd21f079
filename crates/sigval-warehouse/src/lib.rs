//! # Sigval Warehouse
//!
//! DuckDB-backed result store and unit catalog for sigval.
//!
//! Every container is persisted through its pack: the flat number list and
//! message list go to child tables keyed by result id and position, and
//! time-indexed kinds add a parallel timestamp channel. Loading reverses the
//! path and unpacks into a fresh container of the stored kind.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sigval_core::{TimeSeries, Unit};
//! use sigval_warehouse::Warehouse;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_default()?;
//!
//!     let speed = TimeSeries::new(
//!         "speed",
//!         Unit::from_name("meters_per_second"),
//!         vec![1.0, 2.0, 3.0],
//!         vec![0.0, 1e6, 2e6],
//!         0.0,
//!         50.0,
//!         None,
//!     )?;
//!     let id = warehouse.store_series(&speed)?;
//!     let loaded = warehouse.load_series(id)?;
//!     assert_eq!(loaded.values(), speed.values());
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `gbl_units` | Unit catalog, seeded with the known atomic units |
//! | `val_results` | One row per stored container |
//! | `val_result_values` | Packed numbers by position |
//! | `val_result_messages` | Packed strings by position |
//! | `val_result_timestamps` | Timestamp channel of time-indexed kinds |

pub mod duckdb;
pub mod error;
pub mod migrations;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::{params, Connection};
use serde::Serialize;
use sigval_core::{
    BooleanTimeSeries, BoundedVector, CatalogError, HistogramSummary, Pack, Packed,
    PercentageTimeSeries, ResultKind, ScalarValue, TimeSeries, Timestamp, Unit, UnitCatalog,
    UnitIdCache, UnitRecord, UtcDateTime,
};
use tracing::debug;

pub use duckdb::{AccessMode, DuckDbConnectionManager, PooledConnection};
pub use error::WarehouseError;

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for sigval data.
    pub sigval_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let sigval_home = resolve_sigval_home();
        let db_path = sigval_home.join("cache").join("warehouse.duckdb");
        Self {
            sigval_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

impl WarehouseConfig {
    /// Default configuration with the database at `db_path`.
    pub fn with_db_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }
}

/// A stored container in its packed form.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    pub id: i64,
    pub name: String,
    pub kind: ResultKind,
    pub unit: Unit,
    pub created_at: UtcDateTime,
    pub packed: Packed,
    /// Empty for kinds without a timestamp channel.
    pub timestamps: Vec<Timestamp>,
}

/// Listing row for a stored container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub id: i64,
    pub name: String,
    pub kind: ResultKind,
    pub unit: String,
    pub value_count: usize,
    pub created_at: UtcDateTime,
}

/// The result store and unit catalog.
#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    manager: DuckDbConnectionManager,
    unit_ids: UnitIdCache,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = DuckDbConnectionManager::new(config.db_path.clone(), config.max_pool_size);
        let warehouse = Self {
            config,
            manager,
            unit_ids: UnitIdCache::new(),
        };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Initialize the database schema.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadWrite)?;
        migrations::apply_migrations(&connection)?;
        debug!(path = %self.db_path().display(), "warehouse schema ready");
        Ok(())
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    pub fn store_scalar(&self, scalar: &ScalarValue) -> Result<i64, WarehouseError> {
        self.store_packed(&scalar.name, &scalar.unit, scalar, None)
    }

    pub fn store_vector(&self, vector: &BoundedVector) -> Result<i64, WarehouseError> {
        self.store_packed(vector.name(), vector.unit(), vector, None)
    }

    pub fn store_series(&self, series: &TimeSeries) -> Result<i64, WarehouseError> {
        self.store_packed(series.name(), series.unit(), series, Some(series.timestamps()))
    }

    pub fn store_boolean_series(&self, series: &BooleanTimeSeries) -> Result<i64, WarehouseError> {
        self.store_packed(series.name(), series.unit(), series, Some(series.timestamps()))
    }

    pub fn store_percentage_series(
        &self,
        series: &PercentageTimeSeries,
    ) -> Result<i64, WarehouseError> {
        let inner = series.as_series();
        self.store_packed(inner.name(), inner.unit(), series, Some(inner.timestamps()))
    }

    pub fn store_histogram(&self, histogram: &HistogramSummary) -> Result<i64, WarehouseError> {
        self.store_packed(histogram.name(), histogram.unit(), histogram, None)
    }

    /// Writes one container and its channels in a single transaction and
    /// returns the new result id.
    fn store_packed(
        &self,
        name: &str,
        unit: &Unit,
        container: &dyn Pack,
        timestamps: Option<&[Timestamp]>,
    ) -> Result<i64, WarehouseError> {
        let unit_id = self.unit_id(unit)?;
        let kind = container.kind();
        let packed = container.pack();
        let created_at = UtcDateTime::now().unix_timestamp();

        let connection = self.manager.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<i64, WarehouseError> {
            let id: i64 =
                connection.query_row("SELECT nextval('seq_val_results')", [], |row| row.get(0))?;
            connection.execute(
                "INSERT INTO val_results (id, name, kind, unit_id, created_at) \
                 VALUES (?, ?, ?, ?, ?)",
                params![id, name, kind.as_str(), unit_id, created_at],
            )?;

            let mut insert_value = connection.prepare(
                "INSERT INTO val_result_values (result_id, position, value) VALUES (?, ?, ?)",
            )?;
            for (position, value) in (0_i64..).zip(&packed.values) {
                // NaN marks an absent value and is stored as NULL.
                let value = (!value.is_nan()).then_some(*value);
                insert_value.execute(params![id, position, value])?;
            }

            let mut insert_message = connection.prepare(
                "INSERT INTO val_result_messages (result_id, position, message) VALUES (?, ?, ?)",
            )?;
            for (position, message) in (0_i64..).zip(&packed.messages) {
                insert_message.execute(params![id, position, message])?;
            }

            if let Some(timestamps) = timestamps {
                let mut insert_timestamp = connection.prepare(
                    "INSERT INTO val_result_timestamps (result_id, position, ts) VALUES (?, ?, ?)",
                )?;
                for (position, ts) in (0_i64..).zip(timestamps) {
                    insert_timestamp.execute(params![id, position, ts])?;
                }
            }

            Ok(id)
        })();

        let id = finalize_transaction(&connection, result)?;
        debug!(id, name, %kind, values = packed.values.len(), "stored result");
        Ok(id)
    }

    /// Reads a stored container in its packed form.
    pub fn load_result(&self, id: i64) -> Result<StoredResult, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadOnly)?;

        let (name, kind_text, unit_id, created_at) = {
            let mut statement = connection.prepare(
                "SELECT name, kind, unit_id, created_at FROM val_results WHERE id = ?",
            )?;
            let mut rows = statement.query(params![id])?;
            let Some(row) = rows.next()? else {
                return Err(WarehouseError::NotFound { id });
            };
            (
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            )
        };

        let kind = kind_text
            .parse::<ResultKind>()
            .map_err(|reason| WarehouseError::Corrupt { id, reason })?;
        let record = query_unit(&connection, "id = ?", &unit_id)?.ok_or_else(|| {
            WarehouseError::Corrupt {
                id,
                reason: format!("unit #{unit_id} is not in the catalog"),
            }
        })?;

        let values = query_column::<Option<f64>>(
            &connection,
            "SELECT value FROM val_result_values WHERE result_id = ? ORDER BY position",
            id,
        )?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect();
        let messages = query_column::<String>(
            &connection,
            "SELECT message FROM val_result_messages WHERE result_id = ? ORDER BY position",
            id,
        )?;
        let timestamps = query_column::<f64>(
            &connection,
            "SELECT ts FROM val_result_timestamps WHERE result_id = ? ORDER BY position",
            id,
        )?;

        Ok(StoredResult {
            id,
            name,
            kind,
            unit: unit_from_record(record),
            created_at: UtcDateTime::from_unix_timestamp(created_at)?,
            packed: Packed::new(values, messages),
            timestamps,
        })
    }

    pub fn load_scalar(&self, id: i64) -> Result<ScalarValue, WarehouseError> {
        let stored = self.load_kind(id, ResultKind::Scalar)?;
        let mut scalar = ScalarValue::new(stored.name, stored.unit, None);
        scalar.unpack(&stored.packed);
        Ok(scalar)
    }

    pub fn load_vector(&self, id: i64) -> Result<BoundedVector, WarehouseError> {
        let stored = self.load_kind(id, ResultKind::Vector)?;
        let mut vector = BoundedVector::builder(stored.name)
            .unit(stored.unit)
            .range(0.0, 0.0)
            .build()?;
        vector.unpack(&stored.packed)?;
        Ok(vector)
    }

    pub fn load_series(&self, id: i64) -> Result<TimeSeries, WarehouseError> {
        let stored = self.load_kind(id, ResultKind::Series)?;
        let mut series = TimeSeries::builder(stored.name)
            .unit(stored.unit)
            .range(0.0, 0.0)
            .build()?;
        series.unpack(&stored.packed, stored.timestamps)?;
        Ok(series)
    }

    pub fn load_boolean_series(&self, id: i64) -> Result<BooleanTimeSeries, WarehouseError> {
        let stored = self.load_kind(id, ResultKind::BooleanSeries)?;
        let mut series = BooleanTimeSeries::from_bools(stored.name, &[], Vec::new())?;
        series.unpack(&stored.packed, stored.timestamps)?;
        Ok(series)
    }

    pub fn load_percentage_series(&self, id: i64) -> Result<PercentageTimeSeries, WarehouseError> {
        let stored = self.load_kind(id, ResultKind::PercentageSeries)?;
        let mut series = PercentageTimeSeries::new(stored.name, Vec::<f64>::new(), Vec::new(), None)?;
        series.unpack(&stored.packed, stored.timestamps)?;
        Ok(series)
    }

    pub fn load_histogram(&self, id: i64) -> Result<HistogramSummary, WarehouseError> {
        let stored = self.load_kind(id, ResultKind::Histogram)?;
        let mut histogram = HistogramSummary::empty(stored.name, stored.unit);
        histogram.unpack(&stored.packed)?;
        Ok(histogram)
    }

    fn load_kind(&self, id: i64, expected: ResultKind) -> Result<StoredResult, WarehouseError> {
        let stored = self.load_result(id)?;
        if stored.kind != expected {
            return Err(WarehouseError::KindMismatch {
                id,
                expected,
                found: stored.kind,
            });
        }
        Ok(stored)
    }

    /// All stored results, oldest first.
    pub fn list_results(&self) -> Result<Vec<ResultSummary>, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadOnly)?;
        let mut statement = connection.prepare(
            "SELECT r.id, r.name, r.kind, u.label, r.created_at, \
                    (SELECT COUNT(*) FROM val_result_values v WHERE v.result_id = r.id) \
             FROM val_results r \
             LEFT JOIN gbl_units u ON u.id = r.unit_id \
             ORDER BY r.id",
        )?;
        let rows = statement.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, name, kind, unit, created_at, value_count) = row?;
            let kind = kind
                .parse::<ResultKind>()
                .map_err(|reason| WarehouseError::Corrupt { id, reason })?;
            summaries.push(ResultSummary {
                id,
                name,
                kind,
                unit: unit.unwrap_or_default(),
                value_count: usize::try_from(value_count).unwrap_or_default(),
                created_at: UtcDateTime::from_unix_timestamp(created_at)?,
            });
        }
        Ok(summaries)
    }

    /// Removes a stored result. Returns `false` when no such result exists.
    pub fn delete_result(&self, id: i64) -> Result<bool, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<bool, WarehouseError> {
            for table in [
                "val_result_values",
                "val_result_messages",
                "val_result_timestamps",
            ] {
                let sql = format!("DELETE FROM {table} WHERE result_id = ?");
                connection.execute(sql.as_str(), params![id])?;
            }
            let removed = connection.execute("DELETE FROM val_results WHERE id = ?", params![id])?;
            Ok(removed > 0)
        })();
        finalize_transaction(&connection, result)
    }

    /// All catalog units, by id.
    pub fn units(&self) -> Result<Vec<UnitRecord>, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadOnly)?;
        let mut statement =
            connection.prepare("SELECT id, name, label, kind FROM gbl_units ORDER BY id")?;
        let rows = statement.query_map([], read_unit)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(WarehouseError::from)
    }

    /// Catalog id of `unit`, registering it first when unknown.
    fn unit_id(&self, unit: &Unit) -> Result<i64, WarehouseError> {
        let cached = self
            .unit_ids
            .get_or_resolve(&unit.name, |name| -> Result<Option<i64>, WarehouseError> {
                let connection = self.manager.acquire(AccessMode::ReadOnly)?;
                let record = query_unit(&connection, "lower(name) = lower(?)", &name)?;
                Ok(record.map(|record| record.id))
            })?;
        if let Some(id) = cached {
            return Ok(id);
        }

        let id = self.insert_unit(&unit.name, &unit.label, unit.kind.as_deref())?;
        self.unit_ids
            .get_or_resolve(&unit.name, |_| Ok::<_, WarehouseError>(Some(id)))
            .map(|cached| cached.unwrap_or(id))
    }

    fn insert_unit(
        &self,
        name: &str,
        label: &str,
        kind: Option<&str>,
    ) -> Result<i64, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadWrite)?;
        if let Some(existing) = query_unit(&connection, "lower(name) = lower(?)", &name)? {
            return Ok(existing.id);
        }

        let id: i64 =
            connection.query_row("SELECT nextval('seq_gbl_units')", [], |row| row.get(0))?;
        connection.execute(
            "INSERT INTO gbl_units (id, name, label, kind) VALUES (?, ?, ?, ?)",
            params![id, name, label, kind],
        )?;
        debug!(id, name, label, "registered unit");
        Ok(id)
    }
}

impl UnitCatalog for Warehouse {
    fn unit_by_name(&self, name: &str) -> Result<Option<UnitRecord>, CatalogError> {
        let connection = self
            .manager
            .acquire(AccessMode::ReadOnly)
            .map_err(WarehouseError::from)?;
        Ok(query_unit(&connection, "lower(name) = lower(?)", &name)?)
    }

    fn unit_by_id(&self, id: i64) -> Result<Option<UnitRecord>, CatalogError> {
        let connection = self
            .manager
            .acquire(AccessMode::ReadOnly)
            .map_err(WarehouseError::from)?;
        Ok(query_unit(&connection, "id = ?", &id)?)
    }

    fn register(
        &self,
        name: &str,
        label: &str,
        kind: Option<&str>,
    ) -> Result<i64, CatalogError> {
        Ok(self.insert_unit(name, label, kind)?)
    }
}

/// Finalize a transaction by committing on success or rolling back on error.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// First unit matching `predicate`, a fixed SQL condition with one
/// placeholder.
fn query_unit(
    connection: &Connection,
    predicate: &str,
    key: &dyn ::duckdb::ToSql,
) -> Result<Option<UnitRecord>, WarehouseError> {
    let sql = format!("SELECT id, name, label, kind FROM gbl_units WHERE {predicate} LIMIT 1");
    let mut statement = connection.prepare(sql.as_str())?;
    let params: [&dyn ::duckdb::ToSql; 1] = [key];
    let mut rows = statement.query(params.as_slice())?;
    match rows.next()? {
        Some(row) => Ok(Some(read_unit(row)?)),
        None => Ok(None),
    }
}

fn read_unit(row: &::duckdb::Row<'_>) -> Result<UnitRecord, ::duckdb::Error> {
    Ok(UnitRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        label: row.get(2)?,
        kind: row.get(3)?,
    })
}

fn query_column<T: ::duckdb::types::FromSql>(
    connection: &Connection,
    sql: &str,
    id: i64,
) -> Result<Vec<T>, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    let rows = statement.query_map(params![id], |row| row.get::<_, T>(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(WarehouseError::from)
}

fn unit_from_record(record: UnitRecord) -> Unit {
    let mut unit = Unit::new(record.name, record.label).with_id(record.id);
    unit.kind = record.kind;
    unit
}

/// Resolve the sigval home directory from environment or defaults.
fn resolve_sigval_home() -> PathBuf {
    if let Some(path) = env::var_os("SIGVAL_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".sigval");
    }

    PathBuf::from(".sigval")
}
