use crate::core::extract::{us_sites, us_states};
use crate::core::scoring::{build_match_reason, calculate_match_score};
use crate::models::{MatchThresholds, OfferProfile, ScoredTrial, StudyRecord};

/// Result of evaluating one offer against a batch of studies
#[derive(Debug)]
pub struct MatchOutcome {
    /// Candidates at or above the persist threshold, best score first
    pub candidates: Vec<ScoredTrial>,
    pub total_studies: usize,
}

/// Matching orchestrator
///
/// Scores each study against the offer, drops pairs below the persist
/// threshold, and flags candidates that cross the alert threshold. Whether
/// an alert is actually raised depends on the caller observing a newly
/// created match row; re-scored matches never re-alert.
#[derive(Debug, Clone)]
pub struct Matcher {
    thresholds: MatchThresholds,
}

impl Matcher {
    pub fn new(thresholds: MatchThresholds) -> Self {
        Self { thresholds }
    }

    pub fn with_default_thresholds() -> Self {
        Self {
            thresholds: MatchThresholds::default(),
        }
    }

    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }

    /// Evaluate an offer against a batch of studies (at most one search
    /// page, ~20 records)
    pub fn evaluate(&self, offer: &OfferProfile, studies: &[StudyRecord]) -> MatchOutcome {
        let total_studies = studies.len();

        let mut candidates: Vec<ScoredTrial> = studies
            .iter()
            .filter_map(|study| {
                let score = calculate_match_score(offer, study);
                if score < self.thresholds.persist {
                    return None;
                }

                let sites = us_sites(study);
                let states = us_states(&sites);

                Some(ScoredTrial {
                    nct_id: study.nct().to_string(),
                    title: study.brief_title.clone(),
                    score,
                    reason: build_match_reason(offer, study),
                    us_sites: sites,
                    states,
                    alert: score >= self.thresholds.alert,
                })
            })
            .collect();

        // Best score first, NCT id as a stable tiebreak
        candidates.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.nct_id.cmp(&b.nct_id))
        });

        MatchOutcome {
            candidates,
            total_studies,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_thresholds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudyLocation;

    fn offer() -> OfferProfile {
        OfferProfile {
            id: "offer-1".to_string(),
            condition_name: Some("Asthma".to_string()),
            condition_keywords: vec!["asthma".to_string()],
            min_age: Some(18),
            max_age: Some(65),
            gender: Some("All".to_string()),
            ..Default::default()
        }
    }

    fn study(nct: &str, conditions: Vec<&str>, site_count: usize) -> StudyRecord {
        StudyRecord {
            nct_id: Some(nct.to_string()),
            conditions: conditions.into_iter().map(|c| c.to_string()).collect(),
            minimum_age: Some("18 Years".to_string()),
            maximum_age: Some("70 Years".to_string()),
            sex: Some("ALL".to_string()),
            healthy_volunteers: Some("No".to_string()),
            locations: (0..site_count)
                .map(|i| StudyLocation {
                    facility: Some(format!("Site {}", i)),
                    country: Some("United States".to_string()),
                    state: Some("TX".to_string()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_below_persist_threshold_dropped() {
        let matcher = Matcher::with_default_thresholds();
        // No condition overlap at all: 25 eligibility points only
        let unrelated = study("NCT001", vec!["Melanoma"], 0);

        let outcome = matcher.evaluate(&offer(), &[unrelated]);
        assert_eq!(outcome.total_studies, 1);
        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn test_candidates_sorted_by_score() {
        let matcher = Matcher::with_default_thresholds();
        let studies = vec![
            study("NCT002", vec!["Asthma Exacerbation"], 1), // keyword match
            study("NCT001", vec!["Asthma"], 12),             // exact match, more sites
        ];

        let outcome = matcher.evaluate(&offer(), &studies);
        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.candidates[0].nct_id, "NCT001");
        assert!(outcome.candidates[0].score > outcome.candidates[1].score);
    }

    #[test]
    fn test_alert_flag_at_threshold() {
        let matcher = Matcher::with_default_thresholds();
        // Exact match (40) + eligibility (25) + 1 US site (10) = 75
        let high = study("NCT003", vec!["Asthma"], 1);
        // Keyword match (25) + eligibility (25) = 50
        let low = study("NCT004", vec!["Severe Asthma"], 0);

        let outcome = matcher.evaluate(&offer(), &[high, low]);
        assert_eq!(outcome.candidates.len(), 2);
        assert!(outcome.candidates[0].alert);
        assert!(!outcome.candidates[1].alert);
    }

    #[test]
    fn test_states_carried_on_candidates() {
        let matcher = Matcher::with_default_thresholds();
        let outcome = matcher.evaluate(&offer(), &[study("NCT005", vec!["Asthma"], 3)]);

        assert_eq!(outcome.candidates[0].us_sites.len(), 3);
        assert_eq!(outcome.candidates[0].states, vec!["TX".to_string()]);
    }
}
