// Integration tests for the TrialMatch matcher pipeline

use trial_match::core::Matcher;
use trial_match::models::{MatchThresholds, OfferProfile, StudyLocation, StudyRecord};

fn create_offer() -> OfferProfile {
    OfferProfile {
        id: "offer-copd".to_string(),
        condition_name: Some("COPD".to_string()),
        condition_keywords: vec!["copd".to_string(), "chronic obstructive".to_string()],
        min_age: Some(40),
        max_age: Some(80),
        gender: Some("All".to_string()),
        ..Default::default()
    }
}

fn create_study(
    nct: &str,
    conditions: Vec<&str>,
    phases: Vec<&str>,
    us_site_states: Vec<&str>,
) -> StudyRecord {
    StudyRecord {
        nct_id: Some(nct.to_string()),
        conditions: conditions.into_iter().map(|c| c.to_string()).collect(),
        brief_title: Some(format!("Study {}", nct)),
        minimum_age: Some("40 Years".to_string()),
        maximum_age: Some("85 Years".to_string()),
        sex: Some("ALL".to_string()),
        healthy_volunteers: Some("No".to_string()),
        phases: phases.into_iter().map(|p| p.to_string()).collect(),
        lead_sponsor_class: Some("OTHER".to_string()),
        locations: us_site_states
            .into_iter()
            .map(|state| StudyLocation {
                facility: Some("Pulmonary Clinic".to_string()),
                city: Some("Some City".to_string()),
                state: Some(state.to_string()),
                zip: None,
                country: Some("United States".to_string()),
                status: Some("RECRUITING".to_string()),
            })
            .collect(),
        ..Default::default()
    }
}

#[test]
fn test_end_to_end_evaluation() {
    let matcher = Matcher::with_default_thresholds();
    let offer = create_offer();

    let studies = vec![
        // Exact condition, phase 3, 2 US sites: 40 + 25 + 10 + 10 = 85
        create_study("NCT100", vec!["COPD"], vec!["PHASE3"], vec!["TX", "CA"]),
        // Keyword in conditions, no phases, no sites: 25 + 25 = 50
        create_study("NCT101", vec!["Chronic Obstructive Pulmonary Disease"], vec![], vec![]),
        // No condition overlap at all: 25 eligibility only, below threshold
        create_study("NCT102", vec!["Migraine"], vec![], vec![]),
    ];

    let outcome = matcher.evaluate(&offer, &studies);

    assert_eq!(outcome.total_studies, 3);
    assert_eq!(outcome.candidates.len(), 2);

    // Sorted best first
    assert_eq!(outcome.candidates[0].nct_id, "NCT100");
    assert_eq!(outcome.candidates[0].score, 85);
    assert_eq!(outcome.candidates[1].nct_id, "NCT101");
    assert_eq!(outcome.candidates[1].score, 50);

    // Only the high scorer crosses the alert threshold
    assert!(outcome.candidates[0].alert);
    assert!(!outcome.candidates[1].alert);

    // Location summary travels with the candidate
    assert_eq!(outcome.candidates[0].us_sites.len(), 2);
    assert_eq!(outcome.candidates[0].states, vec!["TX".to_string(), "CA".to_string()]);
    assert!(outcome.candidates[1].us_sites.is_empty());
}

#[test]
fn test_scores_stay_in_range() {
    let matcher = Matcher::with_default_thresholds();
    let offer = create_offer();

    let studies: Vec<StudyRecord> = (0..20)
        .map(|i| {
            create_study(
                &format!("NCT2{:02}", i),
                vec!["COPD"],
                vec!["PHASE2", "PHASE3"],
                (0..i).map(|_| "TX").collect(),
            )
        })
        .collect();

    let outcome = matcher.evaluate(&offer, &studies);

    for candidate in &outcome.candidates {
        assert!(
            candidate.score >= 0 && candidate.score <= 100,
            "Score {} is out of range [0, 100]",
            candidate.score
        );
    }
}

#[test]
fn test_custom_thresholds() {
    let strict = Matcher::new(MatchThresholds {
        persist: 60,
        alert: 90,
    });
    let offer = create_offer();

    let studies = vec![
        create_study("NCT300", vec!["COPD"], vec!["PHASE3"], vec!["TX"]), // 85
        create_study("NCT301", vec!["Chronic Obstructive Pulmonary Disease"], vec![], vec![]), // 50
    ];

    let outcome = strict.evaluate(&offer, &studies);

    // The 50-point candidate no longer persists, and 85 < 90 means no alert
    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.candidates[0].nct_id, "NCT300");
    assert!(!outcome.candidates[0].alert);
}

#[test]
fn test_equal_scores_ordered_by_nct_id() {
    let matcher = Matcher::with_default_thresholds();
    let offer = create_offer();

    let studies = vec![
        create_study("NCT402", vec!["COPD"], vec![], vec![]),
        create_study("NCT401", vec!["COPD"], vec![], vec![]),
    ];

    let outcome = matcher.evaluate(&offer, &studies);

    assert_eq!(outcome.candidates.len(), 2);
    assert_eq!(outcome.candidates[0].score, outcome.candidates[1].score);
    assert_eq!(outcome.candidates[0].nct_id, "NCT401");
    assert_eq!(outcome.candidates[1].nct_id, "NCT402");
}

#[test]
fn test_reason_strings_on_candidates() {
    let matcher = Matcher::with_default_thresholds();
    let offer = create_offer();

    let outcome = matcher.evaluate(
        &offer,
        &[create_study("NCT500", vec!["COPD"], vec!["PHASE2", "PHASE3"], vec!["TX"])],
    );

    assert_eq!(
        outcome.candidates[0].reason,
        "Exact condition match | Phase: 2, 3 | 1 US sites"
    );
}
