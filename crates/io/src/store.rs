// Per-contract artifact persistence using SQLite

use std::path::Path;

use rusqlite::{params, Connection};

use crate::columnar::SCHEDULE_FORMAT_VERSION;
use crate::error::IoError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS artifacts (
    contract_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    body BLOB NOT NULL,
    PRIMARY KEY (contract_id, kind)
);

CREATE TABLE IF NOT EXISTS errors (
    contract_id TEXT PRIMARY KEY,
    message TEXT NOT NULL,
    trace TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    FullWorkbook,
    ShiftedWorkbook,
    CanonicalSchedule,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::FullWorkbook,
        ArtifactKind::ShiftedWorkbook,
        ArtifactKind::CanonicalSchedule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullWorkbook => "full_workbook",
            Self::ShiftedWorkbook => "shifted_workbook",
            Self::CanonicalSchedule => "canonical_schedule",
        }
    }

    pub fn from_str(kind: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == kind)
    }
}

/// SQLite-backed store for reconciliation artifacts and error records.
/// Writes are per-contract transactions, so concurrent batch drivers can
/// share one store file without interleaving a contract's artifacts.
pub struct ArtifactStore {
    conn: Connection,
}

impl ArtifactStore {
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, IoError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, IoError> {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('schedule_format_version', ?1)",
            params![SCHEDULE_FORMAT_VERSION.to_string()],
        )?;
        Ok(Self { conn })
    }

    /// Persist the winning variant's three artifacts in one transaction,
    /// clearing any stale error record for the contract.
    pub fn put_artifacts(
        &mut self,
        contract_id: &str,
        full_workbook: &[u8],
        shifted_workbook: &[u8],
        canonical_schedule: &[u8],
    ) -> Result<(), IoError> {
        let tx = self.conn.transaction()?;
        for (kind, body) in [
            (ArtifactKind::FullWorkbook, full_workbook),
            (ArtifactKind::ShiftedWorkbook, shifted_workbook),
            (ArtifactKind::CanonicalSchedule, canonical_schedule),
        ] {
            tx.execute(
                "INSERT OR REPLACE INTO artifacts (contract_id, kind, body) VALUES (?1, ?2, ?3)",
                params![contract_id, kind.as_str(), body],
            )?;
        }
        tx.execute("DELETE FROM errors WHERE contract_id = ?1", params![contract_id])?;
        tx.commit()?;
        Ok(())
    }

    /// Record a per-contract failure: human-readable message plus the raw
    /// diagnostic trace. Existing artifacts (best-effort persists) stay.
    pub fn put_error(&mut self, contract_id: &str, message: &str, trace: &str) -> Result<(), IoError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO errors (contract_id, message, trace) VALUES (?1, ?2, ?3)",
            params![contract_id, message, trace],
        )?;
        Ok(())
    }

    pub fn get_artifact(
        &self,
        contract_id: &str,
        kind: ArtifactKind,
    ) -> Result<Option<Vec<u8>>, IoError> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM artifacts WHERE contract_id = ?1 AND kind = ?2")?;
        let mut rows = stmt.query(params![contract_id, kind.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn artifact_count(&self, contract_id: &str) -> Result<usize, IoError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM artifacts WHERE contract_id = ?1",
            params![contract_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn get_error(&self, contract_id: &str) -> Result<Option<(String, String)>, IoError> {
        let mut stmt = self
            .conn
            .prepare("SELECT message, trace FROM errors WHERE contract_id = ?1")?;
        let mut rows = stmt.query(params![contract_id])?;
        match rows.next()? {
            Some(row) => Ok(Some((row.get(0)?, row.get(1)?))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifacts_round_trip_and_clear_errors() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        store.put_error("c-1", "boom", "trace").unwrap();
        store.put_artifacts("c-1", b"full", b"shifted", b"canonical").unwrap();

        assert_eq!(
            store.get_artifact("c-1", ArtifactKind::CanonicalSchedule).unwrap(),
            Some(b"canonical".to_vec())
        );
        assert_eq!(store.artifact_count("c-1").unwrap(), 3);
        assert_eq!(store.get_error("c-1").unwrap(), None);
    }

    #[test]
    fn failed_contract_has_error_and_no_artifacts() {
        let mut store = ArtifactStore::open_in_memory().unwrap();
        store.put_error("c-2", "bank not supported: 'Неизвестный Банк'", "trace").unwrap();

        assert_eq!(store.artifact_count("c-2").unwrap(), 0);
        let (message, _) = store.get_error("c-2").unwrap().unwrap();
        assert!(message.contains("Неизвестный Банк"));
    }
}
