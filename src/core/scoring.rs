use crate::core::extract::{parse_age_years, us_sites};
use crate::models::{OfferProfile, StudyRecord};

/// Calculate a match score (0-100) for a study against an offer's
/// eligibility profile
///
/// Scoring buckets (additive, summed then clamped to 100):
///     condition match     0-40   first matching rule wins
///     eligibility overlap 0-25   age + sex + healthy-volunteers + flat
///     geographic reach    0-20   tiered by US site count
///     study quality       0-15   phase + sponsor class
///
/// Pure and total: every field may be missing or malformed and the
/// function still returns an in-range score.
pub fn calculate_match_score(offer: &OfferProfile, study: &StudyRecord) -> i32 {
    let total = condition_score(offer, study)
        + eligibility_score(offer, study)
        + geography_score(study)
        + quality_score(study);

    total.min(100)
}

/// Build the human-readable justification for a scored pair
///
/// Fragments in fixed order, joined by " | ": condition-match phrase,
/// phase summary (when the study lists phases), US site count (when > 0).
/// The non-exact phrase is deliberately coarse: it covers keyword hits in
/// conditions, titles and eligibility text alike.
pub fn build_match_reason(offer: &OfferProfile, study: &StudyRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    if has_exact_condition_match(offer, study) {
        parts.push("Exact condition match".to_string());
    } else {
        parts.push("Keyword overlap in conditions/title".to_string());
    }

    if !study.phases.is_empty() {
        let phases = study
            .phases
            .iter()
            .map(|p| p.replace("PHASE", ""))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("Phase: {}", phases));
    }

    let site_count = us_sites(study).len();
    if site_count > 0 {
        parts.push(format!("{} US sites", site_count));
    }

    parts.join(" | ")
}

/// Condition bucket (0-40): exact name match beats keyword matches, which
/// cascade from conditions to titles to eligibility text
#[inline]
fn condition_score(offer: &OfferProfile, study: &StudyRecord) -> i32 {
    if has_exact_condition_match(offer, study) {
        return 40;
    }

    let keywords: Vec<String> = offer
        .condition_keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect();
    if keywords.is_empty() {
        return 0;
    }

    let conditions: Vec<String> = study.conditions.iter().map(|c| c.to_lowercase()).collect();
    if keywords
        .iter()
        .any(|kw| conditions.iter().any(|c| c.contains(kw)))
    {
        return 25;
    }

    let title = format!(
        "{} {}",
        study.brief_title.as_deref().unwrap_or(""),
        study.official_title.as_deref().unwrap_or("")
    )
    .to_lowercase();
    if keywords.iter().any(|kw| title.contains(kw)) {
        return 15;
    }

    let criteria = study
        .eligibility_criteria
        .as_deref()
        .unwrap_or("")
        .to_lowercase();
    if !criteria.is_empty() && keywords.iter().any(|kw| criteria.contains(kw)) {
        return 10;
    }

    0
}

/// Eligibility bucket (0-25): independent additive sub-checks
#[inline]
fn eligibility_score(offer: &OfferProfile, study: &StudyRecord) -> i32 {
    let mut points = 0;

    // Age: full credit for an inclusive range overlap, partial credit when
    // the study publishes any parseable age bound at all
    let study_min = parse_age_years(study.minimum_age.as_deref());
    let study_max = parse_age_years(study.maximum_age.as_deref());
    let full_overlap = match (offer.min_age, offer.max_age, study_min, study_max) {
        (Some(offer_min), Some(offer_max), Some(smin), Some(smax)) => {
            offer_min.max(smin) <= offer_max.min(smax)
        }
        _ => false,
    };
    if full_overlap {
        points += 10;
    } else if study_min.is_some() || study_max.is_some() {
        points += 5;
    }

    if sex_compatible(offer, study) {
        points += 5;
    }

    // Trials recruiting actual patients fit the funnel better than
    // healthy-volunteer studies
    if study.healthy_volunteers.as_deref() != Some("Yes") {
        points += 5;
    }

    // TODO: check offer.exclusions against the eligibility text instead of
    // a flat award
    points += 5;

    points
}

/// Geography bucket (0-20): tiered by US site count, high tier wins
#[inline]
fn geography_score(study: &StudyRecord) -> i32 {
    let site_count = us_sites(study).len();

    if site_count >= 10 {
        20
    } else if site_count >= 5 {
        15
    } else if site_count > 0 {
        10
    } else {
        0
    }
}

/// Quality bucket (0-15): phase sub-score (no stacking) plus industry
/// sponsor bonus
#[inline]
fn quality_score(study: &StudyRecord) -> i32 {
    let mut points = 0;

    if study
        .phases
        .iter()
        .any(|p| p.contains("PHASE2") || p.contains("PHASE3"))
    {
        points += 10;
    } else if study.phases.iter().any(|p| p.contains("PHASE1")) {
        points += 5;
    }

    if study.lead_sponsor_class.as_deref() == Some("INDUSTRY") {
        points += 5;
    }

    points
}

#[inline]
fn has_exact_condition_match(offer: &OfferProfile, study: &StudyRecord) -> bool {
    match &offer.condition_name {
        Some(name) => {
            let name = name.to_lowercase();
            study.conditions.iter().any(|c| c.to_lowercase() == name)
        }
        None => false,
    }
}

#[inline]
fn sex_compatible(offer: &OfferProfile, study: &StudyRecord) -> bool {
    let study_sex = study.sex.as_deref().unwrap_or("");
    if study_sex.eq_ignore_ascii_case("all") {
        return true;
    }

    match offer.gender.as_deref() {
        None => true,
        Some(gender) if gender.eq_ignore_ascii_case("all") => true,
        Some(gender) => study_sex.eq_ignore_ascii_case(gender),
    }
}
