use crate::models::{StudyLocation, StudyRecord};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the ClinicalTrials.gov v2 API
#[derive(Debug, Error)]
pub enum CtGovError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// ClinicalTrials.gov v2 search client
///
/// Issues recruiting-study searches built from an offer's condition
/// keywords and maps the registry's protocolSection documents into the
/// StudyRecord projection the scorer consumes.
pub struct CtGovClient {
    base_url: String,
    client: Client,
    keyword_limit: usize,
}

impl CtGovClient {
    /// Create a new client against the given API base URL
    pub fn new(base_url: String, timeout_secs: u64, keyword_limit: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            client,
            keyword_limit,
        }
    }

    /// Build the condition query expression: up to the configured number
    /// of terms joined by " OR "
    pub fn query_expression(&self, terms: &[String]) -> String {
        terms
            .iter()
            .take(self.keyword_limit)
            .cloned()
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    /// Search recruiting studies for the given condition terms
    ///
    /// Returns at most one page of results; the upstream page size is
    /// capped by the caller's configuration (20 by default).
    pub async fn search_studies(
        &self,
        terms: &[String],
        page_size: u32,
    ) -> Result<Vec<StudyRecord>, CtGovError> {
        let expression = self.query_expression(terms);

        let url = format!(
            "{}/studies?query.cond={}&filter.overallStatus=RECRUITING&pageSize={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&expression),
            page_size
        );

        tracing::debug!("Searching studies: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(CtGovError::ApiError(format!(
                "Study search failed: {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CtGovError::InvalidResponse(format!("Failed to parse search body: {}", e)))?;

        let studies: Vec<StudyRecord> = body
            .studies
            .into_iter()
            .filter_map(|envelope| envelope.protocol_section)
            .map(ProtocolSection::into_study_record)
            .collect();

        tracing::debug!("Search '{}' returned {} studies", expression, studies.len());

        Ok(studies)
    }
}

// --- wire format ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    studies: Vec<StudyEnvelope>,
}

#[derive(Debug, Deserialize)]
struct StudyEnvelope {
    #[serde(rename = "protocolSection")]
    protocol_section: Option<ProtocolSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProtocolSection {
    identification_module: IdentificationModule,
    conditions_module: ConditionsModule,
    eligibility_module: EligibilityModule,
    sponsor_collaborators_module: SponsorCollaboratorsModule,
    design_module: DesignModule,
    contacts_locations_module: ContactsLocationsModule,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IdentificationModule {
    nct_id: Option<String>,
    brief_title: Option<String>,
    official_title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConditionsModule {
    conditions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct EligibilityModule {
    eligibility_criteria: Option<String>,
    sex: Option<String>,
    minimum_age: Option<String>,
    maximum_age: Option<String>,
    #[serde(deserialize_with = "de_yes_no")]
    healthy_volunteers: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SponsorCollaboratorsModule {
    lead_sponsor: LeadSponsor,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LeadSponsor {
    name: Option<String>,
    class: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DesignModule {
    phases: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContactsLocationsModule {
    locations: Vec<WireLocation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireLocation {
    facility: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
    country: Option<String>,
    status: Option<String>,
}

/// The v2 API serves healthyVolunteers as a boolean; older payloads carry
/// a Yes/No string. Normalize both to the string form the scorer compares
/// against.
fn de_yes_no<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(true)) => Some("Yes".to_string()),
        Some(Value::Bool(false)) => Some("No".to_string()),
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

impl ProtocolSection {
    fn into_study_record(self) -> StudyRecord {
        StudyRecord {
            nct_id: self.identification_module.nct_id,
            conditions: self.conditions_module.conditions,
            brief_title: self.identification_module.brief_title,
            official_title: self.identification_module.official_title,
            eligibility_criteria: self.eligibility_module.eligibility_criteria,
            minimum_age: self.eligibility_module.minimum_age,
            maximum_age: self.eligibility_module.maximum_age,
            sex: self.eligibility_module.sex,
            healthy_volunteers: self.eligibility_module.healthy_volunteers,
            lead_sponsor_name: self.sponsor_collaborators_module.lead_sponsor.name,
            lead_sponsor_class: self.sponsor_collaborators_module.lead_sponsor.class,
            phases: self.design_module.phases,
            locations: self
                .contacts_locations_module
                .locations
                .into_iter()
                .map(|loc| StudyLocation {
                    facility: loc.facility,
                    city: loc.city,
                    state: loc.state,
                    zip: loc.zip,
                    country: loc.country,
                    status: loc.status,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_expression_caps_terms() {
        let client = CtGovClient::new("https://clinicaltrials.gov/api/v2".to_string(), 30, 5);
        let terms: Vec<String> = (0..8).map(|i| format!("term{}", i)).collect();

        let expr = client.query_expression(&terms);
        assert_eq!(expr, "term0 OR term1 OR term2 OR term3 OR term4");
    }

    #[test]
    fn test_protocol_section_parsing() {
        let json = serde_json::json!({
            "protocolSection": {
                "identificationModule": {
                    "nctId": "NCT01234567",
                    "briefTitle": "A Diabetes Study"
                },
                "conditionsModule": { "conditions": ["Type 2 Diabetes Mellitus"] },
                "eligibilityModule": {
                    "sex": "ALL",
                    "minimumAge": "18 Years",
                    "maximumAge": "80 Years",
                    "healthyVolunteers": false
                },
                "sponsorCollaboratorsModule": {
                    "leadSponsor": { "name": "Acme Pharma", "class": "INDUSTRY" }
                },
                "designModule": { "phases": ["PHASE3"] },
                "contactsLocationsModule": {
                    "locations": [
                        { "facility": "Site A", "city": "Boston", "state": "MA",
                          "zip": "02115", "country": "United States", "status": "RECRUITING" }
                    ]
                }
            }
        });

        let envelope: StudyEnvelope = serde_json::from_value(json).unwrap();
        let study = envelope.protocol_section.unwrap().into_study_record();

        assert_eq!(study.nct_id.as_deref(), Some("NCT01234567"));
        assert_eq!(study.conditions, vec!["Type 2 Diabetes Mellitus"]);
        assert_eq!(study.healthy_volunteers.as_deref(), Some("No"));
        assert_eq!(study.lead_sponsor_class.as_deref(), Some("INDUSTRY"));
        assert_eq!(study.locations.len(), 1);
        assert_eq!(study.locations[0].state.as_deref(), Some("MA"));
    }

    #[test]
    fn test_missing_modules_default() {
        let envelope: StudyEnvelope =
            serde_json::from_value(serde_json::json!({ "protocolSection": {} })).unwrap();
        let study = envelope.protocol_section.unwrap().into_study_record();

        assert!(study.nct_id.is_none());
        assert!(study.conditions.is_empty());
        assert!(study.locations.is_empty());
    }

    #[tokio::test]
    async fn test_search_studies_against_mock() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/studies\?.*".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "studies": [
                        { "protocolSection": {
                            "identificationModule": { "nctId": "NCT00000001" },
                            "conditionsModule": { "conditions": ["Asthma"] }
                        }}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = CtGovClient::new(server.url(), 30, 5);
        let studies = client
            .search_studies(&["asthma".to_string()], 20)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(studies.len(), 1);
        assert_eq!(studies[0].nct(), "NCT00000001");
    }

    #[tokio::test]
    async fn test_search_studies_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Regex(r"^/studies\?.*".to_string()))
            .with_status(500)
            .create_async()
            .await;

        let client = CtGovClient::new(server.url(), 30, 5);
        let result = client.search_studies(&["asthma".to_string()], 20).await;

        assert!(matches!(result, Err(CtGovError::ApiError(_))));
    }
}
