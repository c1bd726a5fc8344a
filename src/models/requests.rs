use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{OfferProfile, StudyRecord};

/// Request to run matching for a single offer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunMatchingRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "offer_id", rename = "offerId")]
    pub offer_id: String,
}

/// Request to score an ad-hoc offer/study pair without persisting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePairRequest {
    pub offer: OfferProfile,
    pub study: StudyRecord,
}
