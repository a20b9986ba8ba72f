//! crates/matcher_core/src/context.rs
//!
//! `MatchingContext` is the session store: it owns every session record, the
//! local participant identity and the active session's ledgers, and exposes
//! the lifecycle, swipe and durability operations over them.
//!
//! Each method is one discrete operation. Callers that share a context
//! between tasks serialize access (the API service holds it behind a mutex).

use crate::domain::{
    Candidate, CandidateId, Location, ParticipantId, Role, Session, SessionCode, SessionRequest,
};
use crate::durability::{merge_for_write, merge_missing, Durability, SessionCatalog, Snapshot};
use crate::error::{MatchError, MatchResult};
use crate::ledger::{reconcile, SwipeLedger};
use crate::ports::{CandidateProvider, SnapshotStorage};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// State that only exists while a session is active. Never persisted.
#[derive(Debug, Default)]
struct ActiveSession {
    code: Option<SessionCode>,
    role: Option<Role>,
    local: SwipeLedger,
    counterpart: SwipeLedger,
    matches: Vec<CandidateId>,
}

impl ActiveSession {
    fn activate(code: SessionCode, role: Option<Role>) -> Self {
        Self {
            code: Some(code),
            role,
            ..Self::default()
        }
    }
}

/// A validated request together with the candidates found for it, ready to
/// become a session.
///
/// Built by [`search_candidates`] without touching any context, so callers
/// sharing a context can run the search before taking their lock.
#[derive(Debug, Clone)]
pub struct SessionDraft {
    location: Location,
    radius: f64,
    candidates: Vec<Candidate>,
}

impl SessionDraft {
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }
}

/// Validates `request` and searches for its candidates.
///
/// A provider failure or an empty result is a `MatchError::Provider`. The
/// search is not retried.
pub async fn search_candidates(
    request: SessionRequest,
    provider: &dyn CandidateProvider,
    limit: usize,
) -> MatchResult<SessionDraft> {
    let (location, radius) = request.validate()?;
    let listings = provider
        .search(location, radius, limit)
        .await
        .map_err(MatchError::provider)?;
    if listings.is_empty() {
        return Err(MatchError::Provider(
            "No restaurants found in this area. Try a different location or larger radius."
                .to_string(),
        ));
    }
    Ok(SessionDraft {
        location,
        radius,
        candidates: listings.into_iter().map(Candidate::from_listing).collect(),
    })
}

pub struct MatchingContext {
    durability: Durability,
    /// False once the opening read failed: the stored identity and catalog
    /// are unknown, so nothing is written for the rest of this context's life.
    durable: bool,
    identity: ParticipantId,
    sessions: SessionCatalog,
    active: ActiveSession,
}

impl MatchingContext {
    //=====================================================================================
    // Construction
    //=====================================================================================

    /// Opens a context over `storage`.
    ///
    /// The persisted identity is adopted if one exists; otherwise a new one is
    /// generated and written. Unreadable storage degrades to an in-memory
    /// context with a temporary identity that is never written.
    pub async fn open(storage: Arc<dyn SnapshotStorage>) -> Self {
        let durability = Durability::new(storage);
        let (snapshot, durable) = match durability.load().await {
            Ok(snapshot) => (snapshot, true),
            Err(e) => {
                warn!("Storage unreadable, running in memory only: {}", e);
                (None, false)
            }
        };

        let (sessions, identity) = match snapshot {
            Some(Snapshot {
                sessions,
                identity: Some(identity),
            }) => (sessions, identity),
            Some(Snapshot { sessions, .. }) => (sessions, ParticipantId::new()),
            None => (SessionCatalog::new(), ParticipantId::new()),
        };

        let mut context = Self {
            durability,
            durable,
            identity,
            sessions,
            active: ActiveSession::default(),
        };
        info!(
            "Matching context opened for participant {} with {} stored session(s)",
            context.identity,
            context.sessions.len()
        );
        context.persist().await;
        context
    }

    //=====================================================================================
    // Session Lifecycle
    //=====================================================================================

    /// Creates an empty session owned by the local identity and activates it
    /// as initiator. The code is not checked for collisions.
    pub async fn create_session(&mut self, request: SessionRequest) -> MatchResult<SessionCode> {
        let (location, radius) = request.validate()?;
        Ok(self.insert_new_session(location, radius).await)
    }

    /// The complete creation flow: validate, search, then create and populate.
    ///
    /// No session is created if the search fails or finds nothing.
    pub async fn start_session(
        &mut self,
        request: SessionRequest,
        provider: &dyn CandidateProvider,
        limit: usize,
    ) -> MatchResult<SessionCode> {
        let draft = search_candidates(request, provider, limit).await?;
        Ok(self.create_from_draft(draft).await)
    }

    /// Creates, activates and populates a session from a finished search.
    pub async fn create_from_draft(&mut self, draft: SessionDraft) -> SessionCode {
        let code = self.insert_new_session(draft.location, draft.radius).await;
        self.populate_candidates(&code, draft.candidates).await;
        code
    }

    async fn insert_new_session(&mut self, location: Location, radius: f64) -> SessionCode {
        let code = SessionCode::generate();
        let session = Session::new(code.clone(), location, radius, self.identity);
        if self.sessions.insert(code.clone(), session).is_some() {
            warn!("Session code {} was already in use and has been replaced", code);
        }
        self.active = ActiveSession::activate(code.clone(), Some(Role::Initiator));
        info!("Created session {} ({} m radius)", code, radius);
        self.persist().await;
        code
    }

    /// Replaces a session's candidate list wholesale.
    ///
    /// Returns `false` without doing anything if the session is unknown.
    /// Callers must only populate a session once.
    pub async fn populate_candidates(
        &mut self,
        code: &SessionCode,
        candidates: Vec<Candidate>,
    ) -> bool {
        let Some(session) = self.sessions.get_mut(code) else {
            debug!("Cannot populate unknown session {}", code);
            return false;
        };
        if !session.candidates.is_empty() {
            warn!("Session {} already had candidates; replacing them", code);
        }
        info!("Session {} populated with {} candidate(s)", code, candidates.len());
        session.candidates = candidates;
        self.persist().await;
        true
    }

    /// Joins the session with `code`, consulting durable storage if it is not
    /// in memory. Returns `false` when no such session can be found.
    ///
    /// Joining is idempotent per identity. The initiator re-entering their own
    /// session keeps the initiator role.
    pub async fn join_session(&mut self, code: &SessionCode) -> bool {
        if !self.ensure_loaded(code).await {
            info!("Join failed: session {} not found", code);
            return false;
        }
        let identity = self.identity;
        let Some(session) = self.sessions.get_mut(code) else {
            return false;
        };
        let role = if session.initiator_id == identity {
            Role::Initiator
        } else {
            if !session.add_joiner(identity) {
                debug!("Participant {} had already joined session {}", identity, code);
            }
            Role::Joiner
        };
        self.active = ActiveSession::activate(code.clone(), Some(role));
        info!("Joined session {} as {:?}", code, role);
        self.persist().await;
        true
    }

    /// Boundary form of [`join_session`](Self::join_session) for raw user input.
    pub async fn join_by_code(&mut self, raw: &str) -> MatchResult<SessionCode> {
        let code = SessionCode::parse(raw)?;
        if self.join_session(&code).await {
            Ok(code)
        } else {
            Err(MatchError::NotFound(code.to_string()))
        }
    }

    /// Makes an existing session active without changing its membership.
    ///
    /// The role is re-derived from the local identity and the ledgers start
    /// empty. An unresolvable code leaves the current active session alone.
    pub async fn select_active_session(&mut self, code: &SessionCode) -> MatchResult<Option<Role>> {
        if !self.ensure_loaded(code).await {
            return Err(MatchError::NotFound(code.to_string()));
        }
        let role = self
            .sessions
            .get(code)
            .and_then(|session| session.role_of(self.identity));
        self.active = ActiveSession::activate(code.clone(), role);
        debug!("Session {} is now active with role {:?}", code, role);
        Ok(role)
    }

    /// Unsets the active session, role, both ledgers and the match set.
    pub fn clear_active_session(&mut self) {
        if let Some(code) = &self.active.code {
            debug!("Clearing active session {}", code);
        }
        self.active = ActiveSession::default();
    }

    //=====================================================================================
    // Swipes and Reconciliation
    //=====================================================================================

    /// Upserts a local decision and recomputes the match set.
    ///
    /// With no active session this is a logged no-op returning no matches.
    pub fn record_swipe(&mut self, candidate: CandidateId, liked: bool) -> Vec<CandidateId> {
        if self.active.code.is_none() {
            warn!("Swipe on {} ignored: no active session", candidate);
            return Vec::new();
        }
        self.active.local.record(candidate, liked);
        self.reconcile()
    }

    /// Replaces the counterpart ledger and recomputes the match set.
    ///
    /// With no active session this is a logged no-op returning no matches.
    pub fn apply_counterpart_swipes<I>(&mut self, ledger: I) -> Vec<CandidateId>
    where
        I: IntoIterator<Item = (CandidateId, bool)>,
    {
        if self.active.code.is_none() {
            warn!("Counterpart swipes ignored: no active session");
            return Vec::new();
        }
        self.active.counterpart = ledger.into_iter().collect();
        self.reconcile()
    }

    /// Recomputes the match set from both ledgers and stores it.
    pub fn reconcile(&mut self) -> Vec<CandidateId> {
        let matches = reconcile(&self.active.local, &self.active.counterpart);
        if matches.len() != self.active.matches.len() {
            debug!("Match set now has {} candidate(s)", matches.len());
        }
        self.active.matches = matches.clone();
        matches
    }

    //=====================================================================================
    // Local Durability
    //=====================================================================================

    /// Merges every stored session missing from memory into memory.
    /// Returns how many were added; storage errors count as nothing stored.
    pub async fn load_all(&mut self) -> usize {
        match self.durability.load().await {
            Ok(Some(snapshot)) => {
                let added = merge_missing(&mut self.sessions, &snapshot.sessions);
                if added > 0 {
                    info!("Merged {} stored session(s) into memory", added);
                }
                added
            }
            Ok(None) => 0,
            Err(e) => {
                warn!("Could not load stored sessions: {}", e);
                0
            }
        }
    }

    /// True if the session is in memory, or could be pulled in from storage.
    pub async fn ensure_loaded(&mut self, code: &SessionCode) -> bool {
        if self.sessions.contains_key(code) {
            return true;
        }
        let stored = match self.durability.load().await {
            Ok(Some(mut snapshot)) => snapshot.sessions.remove(code),
            Ok(None) => None,
            Err(e) => {
                warn!("Could not load session {} from storage: {}", code, e);
                None
            }
        };
        match stored {
            Some(session) => {
                debug!("Loaded session {} from storage", code);
                self.sessions.insert(code.clone(), session);
                true
            }
            None => false,
        }
    }

    /// Writes the catalog and identity, merging per session with whatever
    /// another copy of the store wrote in the meantime. Failures are logged and
    /// the context carries on in memory.
    ///
    /// Nothing is written when the stored value cannot be read, since it would
    /// be replaced without being merged.
    async fn persist(&mut self) {
        if !self.durable {
            return;
        }
        let stored = match self.durability.load().await {
            Ok(Some(snapshot)) => snapshot.sessions,
            Ok(None) => SessionCatalog::new(),
            Err(e) => {
                warn!("Skipping write, stored snapshot could not be read: {}", e);
                return;
            }
        };
        merge_missing(&mut self.sessions, &stored);
        let snapshot = Snapshot {
            sessions: merge_for_write(&self.sessions, &stored),
            identity: Some(self.identity),
        };
        if let Err(e) = self.durability.save(&snapshot).await {
            warn!("Continuing without durable storage: {}", e);
        }
    }

    //=====================================================================================
    // Accessors
    //=====================================================================================

    pub fn identity(&self) -> ParticipantId {
        self.identity
    }

    pub fn session(&self, code: &SessionCode) -> Option<&Session> {
        self.sessions.get(code)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn active_code(&self) -> Option<&SessionCode> {
        self.active.code.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.active.role
    }

    pub fn local_swipes(&self) -> &SwipeLedger {
        &self.active.local
    }

    pub fn counterpart_swipes(&self) -> &SwipeLedger {
        &self.active.counterpart
    }

    pub fn matches(&self) -> &[CandidateId] {
        &self.active.matches
    }

    /// Candidates of the active session, or an empty slice if none is active.
    pub fn active_candidates(&self) -> &[Candidate] {
        self.active_session()
            .map(|session| session.candidates.as_slice())
            .unwrap_or(&[])
    }

    /// Candidate records for the current match set, in match order.
    pub fn matched_candidates(&self) -> Vec<&Candidate> {
        let Some(session) = self.active_session() else {
            return Vec::new();
        };
        self.active
            .matches
            .iter()
            .filter_map(|id| session.candidate(*id))
            .collect()
    }

    fn active_session(&self) -> Option<&Session> {
        self.active.code.as_ref().and_then(|code| self.sessions.get(code))
    }
}
