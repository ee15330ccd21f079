use ::duckdb::{params, Connection};
use sigval_core::KNOWN_UNITS;

struct Migration {
    version: &'static str,
    sql: &'static str,
    seed: Option<fn(&Connection) -> Result<(), ::duckdb::Error>>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_unit_catalog",
        sql: r#"
CREATE SEQUENCE IF NOT EXISTS seq_gbl_units START 1;

CREATE TABLE IF NOT EXISTS gbl_units (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_gbl_units'),
    name TEXT NOT NULL UNIQUE,
    label TEXT NOT NULL,
    kind TEXT
);
"#,
        seed: Some(seed_known_units),
    },
    Migration {
        version: "0002_result_tables",
        sql: r#"
CREATE SEQUENCE IF NOT EXISTS seq_val_results START 1;

CREATE TABLE IF NOT EXISTS val_results (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_val_results'),
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    unit_id BIGINT NOT NULL,
    created_at BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS val_result_values (
    result_id BIGINT NOT NULL,
    position INTEGER NOT NULL,
    value DOUBLE,
    PRIMARY KEY (result_id, position)
);

CREATE TABLE IF NOT EXISTS val_result_messages (
    result_id BIGINT NOT NULL,
    position INTEGER NOT NULL,
    message TEXT NOT NULL,
    PRIMARY KEY (result_id, position)
);

CREATE TABLE IF NOT EXISTS val_result_timestamps (
    result_id BIGINT NOT NULL,
    position INTEGER NOT NULL,
    ts DOUBLE NOT NULL,
    PRIMARY KEY (result_id, position)
);
"#,
        seed: None,
    },
    Migration {
        version: "0003_result_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_val_results_name ON val_results(name);
CREATE INDEX IF NOT EXISTS idx_val_results_kind ON val_results(kind);
"#,
        seed: None,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            params![migration.version],
            |row| row.get(0),
        )?;
        if applied_count > 0 {
            continue;
        }

        connection.execute_batch(migration.sql)?;
        if let Some(seed) = migration.seed {
            seed(connection)?;
        }
        connection.execute(
            "INSERT INTO schema_migrations (version) VALUES (?)",
            params![migration.version],
        )?;
    }

    Ok(())
}

/// Versions recorded as applied, oldest first.
pub fn applied_versions(connection: &Connection) -> Result<Vec<String>, ::duckdb::Error> {
    let mut statement =
        connection.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let rows = statement.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect()
}

fn seed_known_units(connection: &Connection) -> Result<(), ::duckdb::Error> {
    for (name, label) in KNOWN_UNITS {
        connection.execute(
            "INSERT OR IGNORE INTO gbl_units (name, label) VALUES (?, ?)",
            params![*name, *label],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent_and_seed_units() {
        let connection = Connection::open_in_memory().expect("in-memory db");

        apply_migrations(&connection).expect("first run");
        apply_migrations(&connection).expect("second run");

        let versions = applied_versions(&connection).expect("versions");
        assert_eq!(
            versions,
            vec!["0001_unit_catalog", "0002_result_tables", "0003_result_indexes"]
        );

        let units: i64 = connection
            .query_row("SELECT COUNT(*) FROM gbl_units", [], |row| row.get(0))
            .expect("count");
        assert_eq!(units, KNOWN_UNITS.len() as i64);
    }
}
