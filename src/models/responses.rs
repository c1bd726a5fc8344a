use serde::{Deserialize, Serialize};

use crate::models::domain::{ScoredTrial, TrialMatch};

/// Response for the ad-hoc scoring endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePairResponse {
    pub score: i32,
    pub reason: String,
    pub would_persist: bool,
    pub would_alert: bool,
}

/// Summary of a matching run for one offer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMatchingResponse {
    pub offer_id: String,
    pub studies_evaluated: usize,
    pub matches_persisted: usize,
    pub alerts_raised: usize,
    pub matches: Vec<ScoredTrial>,
}

/// Summary of a matching run over all active offers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAllResponse {
    pub offers_processed: usize,
    pub offers_failed: usize,
    pub matches_persisted: usize,
    pub alerts_raised: usize,
}

/// Response for listing persisted matches of an offer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchListResponse {
    pub offer_id: String,
    pub matches: Vec<TrialMatch>,
    pub total: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
