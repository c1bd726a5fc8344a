// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{MatchThresholds, OfferProfile, ScoredTrial, StudyLocation, StudyRecord, TrialMatch, UsSite};
pub use requests::{RunMatchingRequest, ScorePairRequest};
pub use responses::{ErrorResponse, HealthResponse, MatchListResponse, RunAllResponse, RunMatchingResponse, ScorePairResponse};
