pub mod code;
pub mod context;
pub mod domain;
pub mod durability;
pub mod error;
pub mod ledger;
pub mod ports;

pub use context::{search_candidates, MatchingContext, SessionDraft};
pub use domain::{
    Candidate, CandidateId, CandidateListing, Location, ParticipantId, Role, Session, SessionCode,
    SessionRequest,
};
pub use error::{MatchError, MatchResult};
pub use ledger::{reconcile, SwipeLedger};
pub use ports::{CandidateProvider, MemoryStorage, PortError, PortResult, SnapshotStorage};
