use serde::{Deserialize, Serialize};

/// Eligibility profile extracted from an affiliate offer
///
/// Every field besides the id may be absent; scoring degrades to
/// zero-point contributions instead of failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfferProfile {
    pub id: String,
    pub condition_name: Option<String>,
    pub condition_keywords: Vec<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    /// One of "All", "Male", "Female" when present
    pub gender: Option<String>,
    pub qualifications: Option<String>,
    pub exclusions: Vec<String>,
}

/// Projection of a ClinicalTrials.gov study's protocolSection
///
/// Partially populated by design: the upstream registry omits fields
/// freely, so everything here is optional or defaulted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyRecord {
    pub nct_id: Option<String>,
    pub conditions: Vec<String>,
    pub brief_title: Option<String>,
    pub official_title: Option<String>,
    pub eligibility_criteria: Option<String>,
    /// Free text such as "18 Years"
    pub minimum_age: Option<String>,
    pub maximum_age: Option<String>,
    /// "ALL" | "MALE" | "FEMALE" | ""
    pub sex: Option<String>,
    /// "Yes" when the study explicitly accepts healthy volunteers
    pub healthy_volunteers: Option<String>,
    pub lead_sponsor_name: Option<String>,
    pub lead_sponsor_class: Option<String>,
    /// e.g. "PHASE2", "PHASE3"
    pub phases: Vec<String>,
    pub locations: Vec<StudyLocation>,
}

impl StudyRecord {
    /// Helper to get the NCT id, defaulting to an empty string
    pub fn nct(&self) -> &str {
        self.nct_id.as_deref().unwrap_or("")
    }
}

/// A single trial site as listed by the registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyLocation {
    pub facility: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub status: Option<String>,
}

/// A US trial site projected for persistence alongside a match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsSite {
    pub facility: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub status: Option<String>,
}

/// Scored offer/study pair produced by the matcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredTrial {
    pub nct_id: String,
    pub title: Option<String>,
    pub score: i32,
    pub reason: String,
    pub us_sites: Vec<UsSite>,
    /// Distinct US states across the sites, first-seen order
    pub states: Vec<String>,
    /// Score crossed the alert threshold; the pipeline only raises the
    /// alert when the match row is newly created
    pub alert: bool,
}

/// Persisted match row, keyed by (offer_id, nct_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialMatch {
    pub id: uuid::Uuid,
    pub offer_id: String,
    pub nct_id: String,
    pub score: i32,
    pub reason: String,
    pub location_count: i32,
    pub states: Vec<String>,
    pub is_verified: bool,
    pub match_type: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Score thresholds governing persistence and alerting
#[derive(Debug, Clone, Copy)]
pub struct MatchThresholds {
    /// Scores below this are not persisted at all
    pub persist: i32,
    /// Newly created matches at or above this raise an alert
    pub alert: i32,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            persist: 40,
            alert: 70,
        }
    }
}
