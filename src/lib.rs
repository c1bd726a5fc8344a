//! TrialMatch - clinical trial matching service for affiliate recruitment offers
//!
//! This library scores ClinicalTrials.gov studies against an offer's
//! extracted eligibility profile (condition keywords, age range, gender,
//! geography, study phase) and drives persistence and alerting off the
//! resulting 0-100 relevance score.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{build_match_reason, calculate_match_score, parse_age_years, us_sites, Matcher};
pub use crate::models::{MatchThresholds, OfferProfile, ScoredTrial, StudyLocation, StudyRecord, TrialMatch, UsSite};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // An entirely empty pair still scores the default awards
        let score = calculate_match_score(&OfferProfile::default(), &StudyRecord::default());
        assert_eq!(score, 15);
    }
}
