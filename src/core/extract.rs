use crate::models::{StudyRecord, UsSite};

/// Parse an eligibility age string such as "18 Years" into whole years
///
/// Takes the first contiguous run of decimal digits found anywhere in the
/// string. Returns None when the string is absent or holds no digits, which
/// downstream scoring treats as "no information available".
pub fn parse_age_years(raw: Option<&str>) -> Option<i32> {
    let text = raw?;
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse().ok()
}

/// Extract the study's US sites
///
/// Only locations whose country field case-insensitively equals
/// "united states" count as US sites anywhere downstream. Missing site
/// fields stay None in the projection.
pub fn us_sites(study: &StudyRecord) -> Vec<UsSite> {
    study
        .locations
        .iter()
        .filter(|loc| {
            loc.country
                .as_deref()
                .map_or(false, |c| c.eq_ignore_ascii_case("united states"))
        })
        .map(|loc| UsSite {
            facility: loc.facility.clone(),
            city: loc.city.clone(),
            state: loc.state.clone(),
            zip: loc.zip.clone(),
            status: loc.status.clone(),
        })
        .collect()
}

/// Distinct US states across the study's US sites, first-seen order
pub fn us_states(sites: &[UsSite]) -> Vec<String> {
    let mut states: Vec<String> = Vec::new();
    for site in sites {
        if let Some(state) = &site.state {
            if !states.contains(state) {
                states.push(state.clone());
            }
        }
    }
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudyLocation;

    fn location(country: &str, state: Option<&str>) -> StudyLocation {
        StudyLocation {
            facility: Some("Site".to_string()),
            city: Some("City".to_string()),
            state: state.map(|s| s.to_string()),
            zip: None,
            country: Some(country.to_string()),
            status: Some("RECRUITING".to_string()),
        }
    }

    #[test]
    fn test_parse_age_years() {
        assert_eq!(parse_age_years(Some("18 Years")), Some(18));
        assert_eq!(parse_age_years(Some("6 Months")), Some(6));
        assert_eq!(parse_age_years(Some("N/A")), None);
        assert_eq!(parse_age_years(Some("")), None);
        assert_eq!(parse_age_years(None), None);
    }

    #[test]
    fn test_parse_age_first_digit_run() {
        // Only the first run of digits is taken
        assert_eq!(parse_age_years(Some("18 to 65 Years")), Some(18));
        assert_eq!(parse_age_years(Some("age: 21")), Some(21));
    }

    #[test]
    fn test_us_sites_country_case_insensitive() {
        let study = StudyRecord {
            locations: vec![
                location("United States", Some("CA")),
                location("UNITED STATES", Some("NY")),
                location("united states", Some("CA")),
                location("Canada", Some("ON")),
            ],
            ..Default::default()
        };

        let sites = us_sites(&study);
        assert_eq!(sites.len(), 3);
    }

    #[test]
    fn test_us_states_dedup() {
        let study = StudyRecord {
            locations: vec![
                location("United States", Some("CA")),
                location("United States", Some("NY")),
                location("United States", Some("CA")),
                location("United States", None),
            ],
            ..Default::default()
        };

        let sites = us_sites(&study);
        let states = us_states(&sites);
        assert_eq!(states, vec!["CA".to_string(), "NY".to_string()]);
    }

    #[test]
    fn test_missing_country_is_not_us() {
        let study = StudyRecord {
            locations: vec![StudyLocation::default()],
            ..Default::default()
        };

        assert!(us_sites(&study).is_empty());
    }
}
