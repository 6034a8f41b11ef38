//! Schema migrations for the embedded SQLite backend.

use rusqlite::{Connection, Result as SqlResult};

/// A single forward-only migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: engrams, synapses, chronicles, nexuses",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Indexes for owner-scoped lookups and content-hash dedup",
        up: MIGRATION_V2_UP,
    },
];

const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS engrams (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    content TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    strand TEXT NOT NULL DEFAULT 'general',
    tags TEXT NOT NULL DEFAULT '[]',
    metadata TEXT NOT NULL DEFAULT '{}',
    embedding BLOB NOT NULL,
    signal REAL NOT NULL DEFAULT 0.5,
    pulse_rate REAL NOT NULL DEFAULT 0.1,
    access_count INTEGER NOT NULL DEFAULT 0,
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_accessed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS synapses (
    owner_id TEXT NOT NULL,
    source_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    weight REAL NOT NULL,
    formed_at TEXT NOT NULL,
    reinforced_at TEXT NOT NULL,
    PRIMARY KEY (owner_id, source_id, target_id)
);

CREATE TABLE IF NOT EXISTS chronicles (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    entity TEXT NOT NULL,
    attribute TEXT NOT NULL,
    value TEXT NOT NULL,
    certainty REAL NOT NULL DEFAULT 1.0,
    effective_from TEXT NOT NULL,
    effective_until TEXT,
    recorded_at TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS nexuses (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    origin_id TEXT NOT NULL,
    linked_id TEXT NOT NULL,
    bond_type TEXT NOT NULL,
    strength REAL NOT NULL DEFAULT 1.0,
    effective_from TEXT NOT NULL,
    effective_until TEXT,
    metadata TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

const MIGRATION_V2_UP: &str = r#"
CREATE INDEX IF NOT EXISTS idx_engrams_owner ON engrams(owner_id);
CREATE INDEX IF NOT EXISTS idx_engrams_owner_hash ON engrams(owner_id, content_hash);
CREATE INDEX IF NOT EXISTS idx_engrams_owner_strand ON engrams(owner_id, strand);
CREATE INDEX IF NOT EXISTS idx_synapses_owner_source ON synapses(owner_id, source_id);
CREATE INDEX IF NOT EXISTS idx_chronicles_owner_entity_attr ON chronicles(owner_id, entity, attribute);
CREATE INDEX IF NOT EXISTS idx_nexuses_owner_origin ON nexuses(owner_id, origin_id);
CREATE INDEX IF NOT EXISTS idx_nexuses_owner_linked ON nexuses(owner_id, linked_id);
"#;

/// Applies every migration newer than the schema's current version, in order.
pub fn apply_migrations(conn: &Connection) -> SqlResult<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let current: u32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        conn.execute_batch(migration.up)?;
        tracing::debug!(version = migration.version, description = migration.description, "applied migration");
    }

    if let Some(latest) = MIGRATIONS.last() {
        conn.execute("DELETE FROM schema_version", [])?;
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [latest.version])?;
    }

    Ok(())
}
