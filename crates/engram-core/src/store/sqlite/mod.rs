//! Embedded-file persistence driver backed by `rusqlite`.
//!
//! A writer connection and a reader connection, each behind their own
//! mutex, WAL journal mode, and a forward-only migration table. Every
//! `Store` method hands its SQL work to `spawn_blocking` so the async
//! engine never blocks its executor thread on `rusqlite`, which has no
//! async API of its own.
//!
//! `vector_search` is a sequential scan: ANN index construction is
//! delegated to the persistence driver rather than built here, and
//! sequential scan is a conforming (if not maximally scalable)
//! implementation of the `vectorSearch` contract.

mod migrations;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::mathkernel::cosine_to_unit_score;
use crate::model::{Chronicle, Engram, Nexus, Strand, Synapse};

use super::{ChronicleFilter, EngineStats, Result, Store, VectorHit};

fn backend_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn blob_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}

fn row_to_engram(row: &rusqlite::Row) -> rusqlite::Result<Engram> {
    let tags_json: String = row.get("tags")?;
    let metadata_json: String = row.get("metadata")?;
    let embedding_blob: Vec<u8> = row.get("embedding")?;
    let strand: String = row.get("strand")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let last_accessed_at: String = row.get("last_accessed_at")?;

    Ok(Engram {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        content: row.get("content")?,
        content_hash: row.get("content_hash")?,
        strand: Strand::parse_name(&strand),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
        embedding: blob_to_embedding(&embedding_blob),
        signal: row.get("signal")?,
        pulse_rate: row.get("pulse_rate")?,
        access_count: row.get("access_count")?,
        version: row.get("version")?,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
        last_accessed_at: parse_ts(&last_accessed_at),
    })
}

fn row_to_synapse(row: &rusqlite::Row) -> rusqlite::Result<Synapse> {
    let formed_at: String = row.get("formed_at")?;
    let reinforced_at: String = row.get("reinforced_at")?;
    Ok(Synapse {
        owner_id: row.get("owner_id")?,
        source_id: row.get("source_id")?,
        target_id: row.get("target_id")?,
        weight: row.get("weight")?,
        formed_at: parse_ts(&formed_at),
        reinforced_at: parse_ts(&reinforced_at),
    })
}

fn row_to_chronicle(row: &rusqlite::Row) -> rusqlite::Result<Chronicle> {
    let effective_from: String = row.get("effective_from")?;
    let effective_until: Option<String> = row.get("effective_until")?;
    let recorded_at: String = row.get("recorded_at")?;
    let metadata_json: String = row.get("metadata")?;
    Ok(Chronicle {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        entity: row.get("entity")?,
        attribute: row.get("attribute")?,
        value: row.get("value")?,
        certainty: row.get("certainty")?,
        effective_from: parse_ts(&effective_from),
        effective_until: effective_until.map(|s| parse_ts(&s)),
        recorded_at: parse_ts(&recorded_at),
        metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
    })
}

/// Single-file embedded `Store` backend.
pub struct SqliteStore {
    writer: Arc<Mutex<Connection>>,
    reader: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (creating if absent) the database at `path`, applying WAL mode
    /// and migrations on the writer connection.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(backend_err)?;
        }

        let writer_conn = Connection::open(&path).map_err(backend_err)?;
        Self::configure(&writer_conn)?;
        migrations::apply_migrations(&writer_conn).map_err(backend_err)?;

        let reader_conn = Connection::open(&path).map_err(backend_err)?;
        Self::configure(&reader_conn)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600));
        }

        Ok(Self {
            writer: Arc::new(Mutex::new(writer_conn)),
            reader: Arc::new(Mutex::new(reader_conn)),
        })
    }

    /// Opens a private, in-memory database — handy for tests that want real
    /// SQL semantics without a file on disk.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(backend_err)?;
        Self::configure(&conn)?;
        migrations::apply_migrations(&conn).map_err(backend_err)?;
        let shared = Arc::new(Mutex::new(conn));
        Ok(Self {
            writer: shared.clone(),
            reader: shared,
        })
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(backend_err)?;
        Ok(())
    }
}

macro_rules! blocking {
    ($conn:expr, $body:expr) => {{
        let conn = $conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| backend_err("connection mutex poisoned"))?;
            $body(&conn)
        })
        .await
        .map_err(backend_err)?
    }};
}

#[async_trait]
impl Store for SqliteStore {
    async fn health_check(&self) -> Result<()> {
        blocking!(self.reader, |conn: &Connection| -> Result<()> {
            conn.query_row("SELECT 1", [], |_| Ok(())).map_err(backend_err)?;
            Ok(())
        })
    }

    async fn create_engram(&self, engram: Engram) -> Result<Engram> {
        blocking!(self.writer, move |conn: &Connection| -> Result<Engram> {
            conn.execute(
                "INSERT INTO engrams (id, owner_id, content, content_hash, strand, tags, metadata,
                    embedding, signal, pulse_rate, access_count, version, created_at, updated_at, last_accessed_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
                params![
                    engram.id,
                    engram.owner_id,
                    engram.content,
                    engram.content_hash,
                    engram.strand.as_str(),
                    serde_json::to_string(&engram.tags).unwrap_or_default(),
                    serde_json::to_string(&engram.metadata).unwrap_or_default(),
                    embedding_to_blob(&engram.embedding),
                    engram.signal,
                    engram.pulse_rate,
                    engram.access_count,
                    engram.version,
                    engram.created_at.to_rfc3339(),
                    engram.updated_at.to_rfc3339(),
                    engram.last_accessed_at.to_rfc3339(),
                ],
            )
            .map_err(backend_err)?;
            Ok(engram)
        })
    }

    async fn get_engram(&self, owner_id: &str, id: &str) -> Result<Option<Engram>> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();
        blocking!(self.reader, move |conn: &Connection| -> Result<Option<Engram>> {
            conn.query_row(
                "SELECT * FROM engrams WHERE owner_id = ?1 AND id = ?2",
                params![owner_id, id],
                row_to_engram,
            )
            .optional()
            .map_err(backend_err)
        })
    }

    async fn update_engram(&self, engram: Engram) -> Result<Engram> {
        blocking!(self.writer, move |conn: &Connection| -> Result<Engram> {
            let affected = conn
                .execute(
                    "UPDATE engrams SET content = ?1, content_hash = ?2, strand = ?3, tags = ?4, metadata = ?5,
                        embedding = ?6, signal = ?7, pulse_rate = ?8, access_count = ?9, version = ?10,
                        updated_at = ?11, last_accessed_at = ?12
                     WHERE owner_id = ?13 AND id = ?14",
                    params![
                        engram.content,
                        engram.content_hash,
                        engram.strand.as_str(),
                        serde_json::to_string(&engram.tags).unwrap_or_default(),
                        serde_json::to_string(&engram.metadata).unwrap_or_default(),
                        embedding_to_blob(&engram.embedding),
                        engram.signal,
                        engram.pulse_rate,
                        engram.access_count,
                        engram.version,
                        engram.updated_at.to_rfc3339(),
                        engram.last_accessed_at.to_rfc3339(),
                        engram.owner_id,
                        engram.id,
                    ],
                )
                .map_err(backend_err)?;
            if affected == 0 {
                return Err(StoreError::NotFound(engram.id.clone()));
            }
            Ok(engram)
        })
    }

    async fn delete_engram(&self, owner_id: &str, id: &str) -> Result<()> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();
        blocking!(self.writer, move |conn: &Connection| -> Result<()> {
            conn.execute("DELETE FROM engrams WHERE owner_id = ?1 AND id = ?2", params![owner_id, id])
                .map_err(backend_err)?;
            conn.execute(
                "DELETE FROM synapses WHERE owner_id = ?1 AND (source_id = ?2 OR target_id = ?2)",
                params![owner_id, id],
            )
            .map_err(backend_err)?;
            Ok(())
        })
    }

    async fn list_engrams(
        &self,
        owner_id: &str,
        limit: usize,
        offset: usize,
        strand: Option<Strand>,
    ) -> Result<Vec<Engram>> {
        let owner_id = owner_id.to_string();
        blocking!(self.reader, move |conn: &Connection| -> Result<Vec<Engram>> {
            let sql = match &strand {
                Some(_) => "SELECT * FROM engrams WHERE owner_id = ?1 AND strand = ?2 ORDER BY created_at DESC LIMIT ?3 OFFSET ?4",
                None => "SELECT * FROM engrams WHERE owner_id = ?1 ORDER BY created_at DESC LIMIT ?3 OFFSET ?4",
            };
            let mut stmt = conn.prepare(sql).map_err(backend_err)?;
            let rows = if let Some(s) = &strand {
                stmt.query_map(params![owner_id, s.as_str(), limit as i64, offset as i64], row_to_engram)
            } else {
                stmt.query_map(params![owner_id, "", limit as i64, offset as i64], row_to_engram)
            }
            .map_err(backend_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(backend_err)
        })
    }

    async fn find_by_content_hash(&self, owner_id: &str, content_hash: &str) -> Result<Option<Engram>> {
        let owner_id = owner_id.to_string();
        let content_hash = content_hash.to_string();
        blocking!(self.reader, move |conn: &Connection| -> Result<Option<Engram>> {
            conn.query_row(
                "SELECT * FROM engrams WHERE owner_id = ?1 AND content_hash = ?2",
                params![owner_id, content_hash],
                row_to_engram,
            )
            .optional()
            .map_err(backend_err)
        })
    }

    async fn vector_search(
        &self,
        owner_id: &str,
        embedding: &[f32],
        limit: usize,
        strand: Option<Strand>,
    ) -> Result<Vec<VectorHit>> {
        let owner_id = owner_id.to_string();
        let embedding = embedding.to_vec();
        blocking!(self.reader, move |conn: &Connection| -> Result<Vec<VectorHit>> {
            let sql = match &strand {
                Some(_) => "SELECT * FROM engrams WHERE owner_id = ?1 AND strand = ?2",
                None => "SELECT * FROM engrams WHERE owner_id = ?1",
            };
            let mut stmt = conn.prepare(sql).map_err(backend_err)?;
            let rows: Vec<Engram> = if let Some(s) = &strand {
                stmt.query_map(params![owner_id, s.as_str()], row_to_engram)
            } else {
                stmt.query_map(params![owner_id, ""], row_to_engram)
            }
            .map_err(backend_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(backend_err)?;

            let mut hits: Vec<VectorHit> = rows
                .into_iter()
                .map(|engram| {
                    let cosine = crate::mathkernel::cosine_similarity(&engram.embedding, &embedding);
                    VectorHit { engram, score: cosine_to_unit_score(cosine) }
                })
                .collect();
            hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
            hits.truncate(limit);
            Ok(hits)
        })
    }

    async fn reinforce_engram(&self, owner_id: &str, id: &str, boost: f32) -> Result<Option<Engram>> {
        let Some(mut engram) = self.get_engram(owner_id, id).await? else {
            return Ok(None);
        };
        engram.set_signal((engram.signal + boost).min(1.0));
        Ok(Some(self.update_engram(engram).await?))
    }

    async fn decay_engrams(&self, owner_id: &str, strand: Strand, rate: f32, min_signal: f32) -> Result<usize> {
        let owner_id = owner_id.to_string();
        blocking!(self.writer, move |conn: &Connection| -> Result<usize> {
            let mut stmt = conn
                .prepare("SELECT * FROM engrams WHERE owner_id = ?1 AND strand = ?2 AND signal > ?3")
                .map_err(backend_err)?;
            let rows: Vec<Engram> = stmt
                .query_map(params![owner_id, strand.as_str(), min_signal], row_to_engram)
                .map_err(backend_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend_err)?;

            let mut affected = 0;
            for e in rows {
                let new_signal = (e.signal * rate).max(min_signal);
                if new_signal != e.signal {
                    conn.execute(
                        "UPDATE engrams SET signal = ?1 WHERE owner_id = ?2 AND id = ?3",
                        params![new_signal, e.owner_id, e.id],
                    )
                    .map_err(backend_err)?;
                    affected += 1;
                }
            }
            Ok(affected)
        })
    }

    async fn record_access(&self, owner_id: &str, id: &str) -> Result<()> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();
        blocking!(self.writer, move |conn: &Connection| -> Result<()> {
            conn.execute(
                "UPDATE engrams SET access_count = access_count + 1, last_accessed_at = ?1 WHERE owner_id = ?2 AND id = ?3",
                params![Utc::now().to_rfc3339(), owner_id, id],
            )
            .map_err(backend_err)?;
            Ok(())
        })
    }

    async fn create_synapse(&self, owner_id: &str, source_id: &str, target_id: &str, weight: f32) -> Result<Synapse> {
        let owner_id = owner_id.to_string();
        let source_id = source_id.to_string();
        let target_id = target_id.to_string();
        blocking!(self.writer, move |conn: &Connection| -> Result<Synapse> {
            let existing = conn
                .query_row(
                    "SELECT * FROM synapses WHERE owner_id = ?1 AND source_id = ?2 AND target_id = ?3",
                    params![owner_id, source_id, target_id],
                    row_to_synapse,
                )
                .optional()
                .map_err(backend_err)?;

            let now = Utc::now();
            if let Some(mut synapse) = existing {
                synapse.weight = (synapse.weight + weight).min(1.0);
                synapse.reinforced_at = now;
                conn.execute(
                    "UPDATE synapses SET weight = ?1, reinforced_at = ?2 WHERE owner_id = ?3 AND source_id = ?4 AND target_id = ?5",
                    params![synapse.weight, now.to_rfc3339(), owner_id, source_id, target_id],
                )
                .map_err(backend_err)?;
                return Ok(synapse);
            }

            let synapse = Synapse::new(owner_id.clone(), source_id.clone(), target_id.clone(), weight);
            conn.execute(
                "INSERT INTO synapses (owner_id, source_id, target_id, weight, formed_at, reinforced_at)
                 VALUES (?1,?2,?3,?4,?5,?6)",
                params![
                    synapse.owner_id,
                    synapse.source_id,
                    synapse.target_id,
                    synapse.weight,
                    synapse.formed_at.to_rfc3339(),
                    synapse.reinforced_at.to_rfc3339(),
                ],
            )
            .map_err(backend_err)?;
            Ok(synapse)
        })
    }

    async fn get_synapses_from(&self, owner_id: &str, source_id: &str) -> Result<Vec<Synapse>> {
        let owner_id = owner_id.to_string();
        let source_id = source_id.to_string();
        blocking!(self.reader, move |conn: &Connection| -> Result<Vec<Synapse>> {
            let mut stmt = conn
                .prepare("SELECT * FROM synapses WHERE owner_id = ?1 AND source_id = ?2")
                .map_err(backend_err)?;
            stmt.query_map(params![owner_id, source_id], row_to_synapse)
                .map_err(backend_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend_err)
        })
    }

    async fn reinforce_synapse(&self, owner_id: &str, source_id: &str, target_id: &str, boost: f32) -> Result<Option<Synapse>> {
        let owner_id = owner_id.to_string();
        let source_id = source_id.to_string();
        let target_id = target_id.to_string();
        blocking!(self.writer, move |conn: &Connection| -> Result<Option<Synapse>> {
            let existing = conn
                .query_row(
                    "SELECT * FROM synapses WHERE owner_id = ?1 AND source_id = ?2 AND target_id = ?3",
                    params![owner_id, source_id, target_id],
                    row_to_synapse,
                )
                .optional()
                .map_err(backend_err)?;
            let Some(mut synapse) = existing else { return Ok(None) };
            synapse.reinforce(boost);
            conn.execute(
                "UPDATE synapses SET weight = ?1, reinforced_at = ?2 WHERE owner_id = ?3 AND source_id = ?4 AND target_id = ?5",
                params![synapse.weight, synapse.reinforced_at.to_rfc3339(), owner_id, source_id, target_id],
            )
            .map_err(backend_err)?;
            Ok(Some(synapse))
        })
    }

    async fn get_synapses_between(&self, owner_id: &str, a: &str, b: &str) -> Result<Vec<Synapse>> {
        let owner_id = owner_id.to_string();
        let a = a.to_string();
        let b = b.to_string();
        blocking!(self.reader, move |conn: &Connection| -> Result<Vec<Synapse>> {
            let mut stmt = conn
                .prepare(
                    "SELECT * FROM synapses WHERE owner_id = ?1 AND
                        ((source_id = ?2 AND target_id = ?3) OR (source_id = ?3 AND target_id = ?2))",
                )
                .map_err(backend_err)?;
            stmt.query_map(params![owner_id, a, b], row_to_synapse)
                .map_err(backend_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend_err)
        })
    }

    async fn create_chronicle(&self, chronicle: Chronicle) -> Result<Chronicle> {
        blocking!(self.writer, move |conn: &Connection| -> Result<Chronicle> {
            conn.execute(
                "INSERT INTO chronicles (id, owner_id, entity, attribute, value, certainty,
                    effective_from, effective_until, recorded_at, metadata)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
                params![
                    chronicle.id,
                    chronicle.owner_id,
                    chronicle.entity,
                    chronicle.attribute,
                    chronicle.value,
                    chronicle.certainty,
                    chronicle.effective_from.to_rfc3339(),
                    chronicle.effective_until.map(|t| t.to_rfc3339()),
                    chronicle.recorded_at.to_rfc3339(),
                    serde_json::to_string(&chronicle.metadata).unwrap_or_default(),
                ],
            )
            .map_err(backend_err)?;
            Ok(chronicle)
        })
    }

    async fn get_chronicle(&self, owner_id: &str, id: &str) -> Result<Option<Chronicle>> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();
        blocking!(self.reader, move |conn: &Connection| -> Result<Option<Chronicle>> {
            conn.query_row(
                "SELECT * FROM chronicles WHERE owner_id = ?1 AND id = ?2",
                params![owner_id, id],
                row_to_chronicle,
            )
            .optional()
            .map_err(backend_err)
        })
    }

    async fn update_chronicle(&self, chronicle: Chronicle) -> Result<Chronicle> {
        blocking!(self.writer, move |conn: &Connection| -> Result<Chronicle> {
            let affected = conn
                .execute(
                    "UPDATE chronicles SET value = ?1, certainty = ?2, effective_from = ?3, effective_until = ?4, metadata = ?5
                     WHERE owner_id = ?6 AND id = ?7",
                    params![
                        chronicle.value,
                        chronicle.certainty,
                        chronicle.effective_from.to_rfc3339(),
                        chronicle.effective_until.map(|t| t.to_rfc3339()),
                        serde_json::to_string(&chronicle.metadata).unwrap_or_default(),
                        chronicle.owner_id,
                        chronicle.id,
                    ],
                )
                .map_err(backend_err)?;
            if affected == 0 {
                return Err(StoreError::NotFound(chronicle.id.clone()));
            }
            Ok(chronicle)
        })
    }

    async fn delete_chronicle(&self, owner_id: &str, id: &str) -> Result<()> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();
        blocking!(self.writer, move |conn: &Connection| -> Result<()> {
            conn.execute(
                "UPDATE chronicles SET effective_until = ?1 WHERE owner_id = ?2 AND id = ?3 AND effective_until IS NULL",
                params![Utc::now().to_rfc3339(), owner_id, id],
            )
            .map_err(backend_err)?;
            Ok(())
        })
    }

    async fn query_chronicles(&self, owner_id: &str, filter: ChronicleFilter) -> Result<Vec<Chronicle>> {
        let owner_id = owner_id.to_string();
        blocking!(self.reader, move |conn: &Connection| -> Result<Vec<Chronicle>> {
            let mut stmt = conn
                .prepare("SELECT * FROM chronicles WHERE owner_id = ?1")
                .map_err(backend_err)?;
            let rows: Vec<Chronicle> = stmt
                .query_map(params![owner_id], row_to_chronicle)
                .map_err(backend_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend_err)?;

            let mut matches: Vec<Chronicle> = rows
                .into_iter()
                .filter(|c| filter.entity.as_deref().is_none_or(|e| c.entity == e))
                .filter(|c| filter.attribute.as_deref().is_none_or(|a| c.attribute == a))
                .filter(|c| filter.at.is_none_or(|t| c.matches_at(t)))
                .filter(|c| filter.from.is_none_or(|from| c.effective_from >= from))
                .filter(|c| filter.to.is_none_or(|to| c.effective_from < to))
                .collect();
            matches.sort_by(|a, b| b.effective_from.cmp(&a.effective_from));
            Ok(matches)
        })
    }

    async fn get_current_chronicle(&self, owner_id: &str, entity: &str, attribute: &str) -> Result<Option<Chronicle>> {
        let owner_id = owner_id.to_string();
        let entity = entity.to_string();
        let attribute = attribute.to_string();
        blocking!(self.reader, move |conn: &Connection| -> Result<Option<Chronicle>> {
            conn.query_row(
                "SELECT * FROM chronicles WHERE owner_id = ?1 AND entity = ?2 AND attribute = ?3 AND effective_until IS NULL",
                params![owner_id, entity, attribute],
                row_to_chronicle,
            )
            .optional()
            .map_err(backend_err)
        })
    }

    async fn get_current_chronicles(&self, owner_id: &str, entity: Option<&str>) -> Result<Vec<Chronicle>> {
        let owner_id = owner_id.to_string();
        let entity = entity.map(|s| s.to_string());
        blocking!(self.reader, move |conn: &Connection| -> Result<Vec<Chronicle>> {
            let sql = match &entity {
                Some(_) => "SELECT * FROM chronicles WHERE owner_id = ?1 AND entity = ?2 AND effective_until IS NULL",
                None => "SELECT * FROM chronicles WHERE owner_id = ?1 AND effective_until IS NULL",
            };
            let mut stmt = conn.prepare(sql).map_err(backend_err)?;
            let rows = if let Some(e) = &entity {
                stmt.query_map(params![owner_id, e], row_to_chronicle)
            } else {
                stmt.query_map(params![owner_id, ""], row_to_chronicle)
            }
            .map_err(backend_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(backend_err)
        })
    }

    async fn get_timeline(&self, owner_id: &str, entity: &str) -> Result<Vec<Chronicle>> {
        let owner_id = owner_id.to_string();
        let entity = entity.to_string();
        blocking!(self.reader, move |conn: &Connection| -> Result<Vec<Chronicle>> {
            let mut stmt = conn
                .prepare("SELECT * FROM chronicles WHERE owner_id = ?1 AND entity = ?2 ORDER BY effective_from ASC")
                .map_err(backend_err)?;
            stmt.query_map(params![owner_id, entity], row_to_chronicle)
                .map_err(backend_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend_err)
        })
    }

    async fn create_nexus(&self, nexus: Nexus) -> Result<Nexus> {
        blocking!(self.writer, move |conn: &Connection| -> Result<Nexus> {
            conn.execute(
                "INSERT INTO nexuses (id, owner_id, origin_id, linked_id, bond_type, strength,
                    effective_from, effective_until, metadata)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
                params![
                    nexus.id,
                    nexus.owner_id,
                    nexus.origin_id,
                    nexus.linked_id,
                    nexus.bond_type,
                    nexus.strength,
                    nexus.effective_from.to_rfc3339(),
                    nexus.effective_until.map(|t| t.to_rfc3339()),
                    serde_json::to_string(&nexus.metadata).unwrap_or_default(),
                ],
            )
            .map_err(backend_err)?;
            Ok(nexus)
        })
    }

    async fn get_related_chronicles(&self, owner_id: &str, chronicle_id: &str) -> Result<Vec<Chronicle>> {
        let owner_id = owner_id.to_string();
        let chronicle_id = chronicle_id.to_string();
        blocking!(self.reader, move |conn: &Connection| -> Result<Vec<Chronicle>> {
            let mut stmt = conn
                .prepare(
                    "SELECT c.* FROM chronicles c
                     JOIN nexuses n ON (n.origin_id = c.id OR n.linked_id = c.id)
                     WHERE n.owner_id = ?1 AND (n.origin_id = ?2 OR n.linked_id = ?2) AND c.id != ?2",
                )
                .map_err(backend_err)?;
            stmt.query_map(params![owner_id, chronicle_id], row_to_chronicle)
                .map_err(backend_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend_err)
        })
    }

    async fn get_stats(&self, owner_id: &str) -> Result<EngineStats> {
        let owner_id = owner_id.to_string();
        blocking!(self.reader, move |conn: &Connection| -> Result<EngineStats> {
            let count = |table: &str| -> Result<i64> {
                conn.query_row(
                    &format!("SELECT COUNT(*) FROM {table} WHERE owner_id = ?1"),
                    params![owner_id],
                    |row| row.get(0),
                )
                .map_err(backend_err)
            };
            Ok(EngineStats {
                engram_count: count("engrams")?,
                synapse_count: count("synapses")?,
                chronicle_count: count("chronicles")?,
                nexus_count: count("nexuses")?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn new_engram(owner: &str, content: &str) -> Engram {
        Engram::new(owner, content, content, Strand::General, vec![], HashMap::new(), vec![1.0, 0.0, 0.0], 0.5, 0.1)
    }

    #[tokio::test]
    async fn create_and_fetch_engram() {
        let store = SqliteStore::open_in_memory().unwrap();
        let e = new_engram("owner", "hello world");
        let created = store.create_engram(e.clone()).await.unwrap();
        let fetched = store.get_engram("owner", &created.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "hello world");
        assert_eq!(fetched.embedding, vec![1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn content_hash_lookup() {
        let store = SqliteStore::open_in_memory().unwrap();
        let e = new_engram("owner", "unique content");
        store.create_engram(e.clone()).await.unwrap();
        let found = store.find_by_content_hash("owner", "unique content").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn vector_search_orders_by_similarity() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut a = new_engram("owner", "a");
        a.embedding = vec![1.0, 0.0, 0.0];
        let mut b = new_engram("owner", "b");
        b.embedding = vec![0.0, 1.0, 0.0];
        store.create_engram(a).await.unwrap();
        store.create_engram(b).await.unwrap();
        let hits = store.vector_search("owner", &[1.0, 0.0, 0.0], 10, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn delete_chronicle_is_soft_and_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let c = Chronicle::new("owner", "speaker", "phone", "Samsung", 1.0, Utc::now(), HashMap::new());
        let created = store.create_chronicle(c).await.unwrap();
        store.delete_chronicle("owner", &created.id).await.unwrap();
        let fetched = store.get_chronicle("owner", &created.id).await.unwrap().unwrap();
        assert!(fetched.effective_until.is_some());
        let until_first = fetched.effective_until;
        store.delete_chronicle("owner", &created.id).await.unwrap();
        let fetched_again = store.get_chronicle("owner", &created.id).await.unwrap().unwrap();
        assert_eq!(fetched_again.effective_until, until_first);
    }
}
