use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

use crate::config::MatchingSettings;
use crate::core::scoring::{build_match_reason, calculate_match_score};
use crate::core::Matcher;
use crate::models::{
    ErrorResponse, HealthResponse, MatchListResponse, OfferProfile, RunAllResponse,
    RunMatchingRequest, RunMatchingResponse, ScorePairRequest, ScorePairResponse, StudyRecord,
    TrialMatch,
};
use crate::services::{CacheKey, CacheManager, CtGovClient, CtGovError, PostgresClient, PostgresError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub ctgov: Arc<CtGovClient>,
    pub cache: Arc<CacheManager>,
    pub matcher: Matcher,
    pub matching: MatchingSettings,
}

/// Failures inside the per-offer matching pipeline
#[derive(Debug, Error)]
enum PipelineError {
    #[error(transparent)]
    CtGov(#[from] CtGovError),

    #[error(transparent)]
    Postgres(#[from] PostgresError),
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/score", web::post().to(score_pair))
        .route("/matches/run", web::post().to(run_matching))
        .route("/matches/run-all", web::post().to(run_all_matching))
        .route("/matches", web::get().to(list_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Score an ad-hoc offer/study pair without persisting anything
///
/// POST /api/v1/matches/score
async fn score_pair(
    state: web::Data<AppState>,
    req: web::Json<ScorePairRequest>,
) -> impl Responder {
    let score = calculate_match_score(&req.offer, &req.study);
    let reason = build_match_reason(&req.offer, &req.study);
    let thresholds = state.matcher.thresholds();

    HttpResponse::Ok().json(ScorePairResponse {
        score,
        reason,
        would_persist: score >= thresholds.persist,
        would_alert: score >= thresholds.alert,
    })
}

/// Run the matching pipeline for a single offer
///
/// POST /api/v1/matches/run
///
/// Request body:
/// ```json
/// { "offerId": "string" }
/// ```
async fn run_matching(
    state: web::Data<AppState>,
    req: web::Json<RunMatchingRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let offer = match state.postgres.get_offer(&req.offer_id).await {
        Ok(offer) => offer,
        Err(PostgresError::NotFound(message)) => {
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "Offer not found".to_string(),
                message,
                status_code: 404,
            });
        }
        Err(e) => {
            tracing::error!("Failed to fetch offer {}: {}", req.offer_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch offer".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    match match_offer(&state, &offer).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => {
            tracing::error!("Matching run failed for offer {}: {}", offer.id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Matching run failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Run the matching pipeline over every active offer
///
/// POST /api/v1/matches/run-all
///
/// Offers are processed sequentially with a fixed pacing delay between
/// them; per-offer failures are logged and skipped.
async fn run_all_matching(state: web::Data<AppState>) -> impl Responder {
    let offers = match state.postgres.list_active_offers().await {
        Ok(offers) => offers,
        Err(e) => {
            tracing::error!("Failed to list active offers: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to list offers".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    tracing::info!("Running matching for {} active offers", offers.len());

    let pacing = std::time::Duration::from_millis(state.matching.pacing_ms);
    let mut response = RunAllResponse {
        offers_processed: 0,
        offers_failed: 0,
        matches_persisted: 0,
        alerts_raised: 0,
    };

    for (index, offer) in offers.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(pacing).await;
        }

        match match_offer(&state, offer).await {
            Ok(summary) => {
                response.offers_processed += 1;
                response.matches_persisted += summary.matches_persisted;
                response.alerts_raised += summary.alerts_raised;
            }
            Err(e) => {
                tracing::warn!("Skipping offer {} after failure: {}", offer.id, e);
                response.offers_failed += 1;
            }
        }
    }

    HttpResponse::Ok().json(response)
}

/// List persisted matches for an offer
///
/// GET /api/v1/matches?offerId={offerId}
async fn list_matches(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let offer_id = match query.get("offerId") {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Missing offerId parameter".to_string(),
                message: "offerId query parameter is required".to_string(),
                status_code: 400,
            });
        }
    };

    let cache_key = CacheKey::matches(offer_id);
    if let Ok(matches) = state.cache.get::<Vec<TrialMatch>>(&cache_key).await {
        let total = matches.len();
        return HttpResponse::Ok().json(MatchListResponse {
            offer_id: offer_id.clone(),
            matches,
            total,
        });
    }

    match state.postgres.matches_for_offer(offer_id).await {
        Ok(matches) => {
            if let Err(e) = state.cache.set(&cache_key, &matches).await {
                tracing::warn!("Failed to cache match list for {}: {}", offer_id, e);
            }

            let total = matches.len();
            HttpResponse::Ok().json(MatchListResponse {
                offer_id: offer_id.clone(),
                matches,
                total,
            })
        }
        Err(e) => {
            tracing::error!("Failed to fetch matches for {}: {}", offer_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch matches".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// The per-offer pipeline: search, score, persist, alert
async fn match_offer(
    state: &AppState,
    offer: &OfferProfile,
) -> Result<RunMatchingResponse, PipelineError> {
    let mut summary = RunMatchingResponse {
        offer_id: offer.id.clone(),
        studies_evaluated: 0,
        matches_persisted: 0,
        alerts_raised: 0,
        matches: vec![],
    };

    let terms = search_terms(offer);
    if terms.is_empty() {
        tracing::warn!("Offer {} has no condition keywords or name, skipping", offer.id);
        return Ok(summary);
    }

    let studies = fetch_studies(state, &terms).await?;
    summary.studies_evaluated = studies.len();

    let outcome = state.matcher.evaluate(offer, &studies);

    tracing::debug!(
        "Offer {}: {} of {} studies at or above persist threshold",
        offer.id,
        outcome.candidates.len(),
        outcome.total_studies
    );

    for candidate in &outcome.candidates {
        let upserted = state
            .postgres
            .upsert_match(
                &offer.id,
                &candidate.nct_id,
                candidate.score,
                &candidate.reason,
                candidate.us_sites.len() as i32,
                &candidate.states,
            )
            .await?;

        state
            .postgres
            .replace_locations(upserted.id, &candidate.us_sites)
            .await?;

        summary.matches_persisted += 1;

        // Alert only the first time a pair crosses the threshold
        if candidate.alert && upserted.inserted {
            state
                .postgres
                .record_alert(&offer.id, &candidate.nct_id, candidate.score)
                .await?;
            summary.alerts_raised += 1;
        }
    }

    if let Err(e) = state.cache.delete(&CacheKey::matches(&offer.id)).await {
        tracing::warn!("Failed to invalidate match cache for {}: {}", offer.id, e);
    }

    tracing::info!(
        "Offer {}: evaluated {} studies, persisted {} matches, raised {} alerts",
        offer.id,
        summary.studies_evaluated,
        summary.matches_persisted,
        summary.alerts_raised
    );

    summary.matches = outcome.candidates;
    Ok(summary)
}

/// Condition search terms for an offer, falling back to the condition name
/// when no keywords were extracted
fn search_terms(offer: &OfferProfile) -> Vec<String> {
    if !offer.condition_keywords.is_empty() {
        return offer.condition_keywords.clone();
    }

    offer
        .condition_name
        .as_ref()
        .map(|name| vec![name.clone()])
        .unwrap_or_default()
}

/// Cache-first study search
async fn fetch_studies(
    state: &AppState,
    terms: &[String],
) -> Result<Vec<StudyRecord>, PipelineError> {
    let expression = state.ctgov.query_expression(terms);
    let cache_key = CacheKey::study_search(&expression);

    if let Ok(studies) = state.cache.get::<Vec<StudyRecord>>(&cache_key).await {
        tracing::debug!("Study search served from cache: {}", expression);
        return Ok(studies);
    }

    let studies = state
        .ctgov
        .search_studies(terms, state.matching.page_size)
        .await?;

    if let Err(e) = state.cache.set(&cache_key, &studies).await {
        tracing::warn!("Failed to cache study search '{}': {}", expression, e);
    }

    Ok(studies)
}
