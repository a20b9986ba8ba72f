//! crates/matcher_core/src/durability.rs
//!
//! The local durability layer: the persisted snapshot format and the
//! read/merge/write helpers the matching context uses to stay in step with
//! other copies of the store sharing the same storage.
//!
//! Only the session catalog and the local identity are persisted. The active
//! session, role, ledgers and match set are never written.

use crate::domain::{ParticipantId, Session, SessionCode};
use crate::error::{MatchError, MatchResult};
use crate::ports::SnapshotStorage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Key the snapshot blob is stored under.
pub const SNAPSHOT_KEY: &str = "restaurant-matcher-storage";

/// Schema tag written with every snapshot. Never interpreted on read.
pub const SCHEMA_VERSION: u32 = 1;

pub type SessionCatalog = BTreeMap<SessionCode, Session>;

/// The persisted part of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub sessions: SessionCatalog,
    pub identity: Option<ParticipantId>,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    state: Snapshot,
    #[serde(default)]
    version: serde_json::Value,
}

/// Reads and writes the snapshot through a `SnapshotStorage` port.
#[derive(Clone)]
pub struct Durability {
    storage: Arc<dyn SnapshotStorage>,
}

impl Durability {
    pub fn new(storage: Arc<dyn SnapshotStorage>) -> Self {
        Self { storage }
    }

    /// Loads the persisted snapshot.
    ///
    /// `Ok(None)` means there is no usable snapshot: nothing was ever written,
    /// or the stored blob is unparseable and may be overwritten. A failed read
    /// is `MatchError::Persistence`; the stored value is then unknown and must
    /// not be written over.
    pub async fn load(&self) -> MatchResult<Option<Snapshot>> {
        let blob = self
            .storage
            .read(SNAPSHOT_KEY)
            .await
            .map_err(MatchError::persistence)?;
        let Some(blob) = blob else {
            debug!("No stored snapshot found");
            return Ok(None);
        };
        match serde_json::from_str::<Envelope>(&blob) {
            Ok(envelope) => Ok(Some(envelope.state)),
            Err(e) => {
                warn!("Stored snapshot is corrupt and will be replaced: {}", e);
                Ok(None)
            }
        }
    }

    /// Writes `snapshot` as the whole stored value.
    pub async fn save(&self, snapshot: &Snapshot) -> MatchResult<()> {
        let envelope = Envelope {
            state: snapshot.clone(),
            version: SCHEMA_VERSION.into(),
        };
        let blob = serde_json::to_string(&envelope)
            .map_err(|e| MatchError::Persistence(e.to_string()))?;
        self.storage
            .write(SNAPSHOT_KEY, &blob)
            .await
            .map_err(MatchError::persistence)
    }
}

/// Copies persisted sessions that memory lacks into memory.
///
/// Entries already in memory are never overwritten. Returns how many
/// sessions were added.
pub fn merge_missing(memory: &mut SessionCatalog, persisted: &SessionCatalog) -> usize {
    let mut added = 0;
    for (code, session) in persisted {
        if !memory.contains_key(code) {
            memory.insert(code.clone(), session.clone());
            added += 1;
        }
    }
    added
}

/// True if two records under one code describe the same session rather than
/// two sessions that drew the same code.
fn same_session(a: &Session, b: &Session) -> bool {
    a.initiator_id == b.initiator_id && a.created_at == b.created_at
}

/// Builds the catalog to write back: memory's sessions, plus sessions only
/// storage knows about, with joiner lists of shared sessions unioned so a
/// join recorded by another copy of the store is not lost.
///
/// A stored record that is a different session under a colliding code is
/// replaced by memory's copy as is.
pub fn merge_for_write(memory: &SessionCatalog, persisted: &SessionCatalog) -> SessionCatalog {
    let mut merged = persisted.clone();
    for (code, session) in memory {
        let mut session = session.clone();
        if let Some(stored) = persisted.get(code).filter(|s| same_session(s, &session)) {
            for joiner in &stored.joiner_ids {
                session.add_joiner(*joiner);
            }
            if session.candidates.is_empty() && !stored.candidates.is_empty() {
                session.candidates = stored.candidates.clone();
            }
        }
        merged.insert(code.clone(), session);
    }
    merged
}
