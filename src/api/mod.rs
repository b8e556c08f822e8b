use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{error, warn};

use crate::config::HealthGuardConfig;
use crate::history::{BriefingHistory, BriefingRecord, HistoryStats};
use crate::workflow::{HealthGuardian, RunState};
use crate::{HealthGuardError, VERSION};

const DEFAULT_HISTORY_DAYS: u32 = 7;

/// Shared dashboard state; every request gets its own run
#[derive(Clone)]
pub struct AppState {
    pub guardian: Arc<HealthGuardian>,
    pub history: Arc<BriefingHistory>,
    pub config: Arc<HealthGuardConfig>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub days: u32,
    pub stats: HistoryStats,
    pub briefings: Vec<BriefingRecord>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub location: String,
    pub coordinates: String,
    pub api_keys: BTreeMap<&'static str, bool>,
}

pub struct ApiError(HealthGuardError);

impl From<HealthGuardError> for ApiError {
    fn from(err: HealthGuardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            HealthGuardError::Source { .. } | HealthGuardError::Narrative { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("Request failed: {}", self.0);
        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/briefing", post(create_briefing))
        .route("/history", get(get_history))
        .route("/status", get(get_status))
        .with_state(state)
}

async fn create_briefing(State(state): State<AppState>) -> Result<Json<RunState>, ApiError> {
    let mut run = state.guardian.run().await?;

    let history = state.history.clone();
    let snapshot = run.clone();
    let saved = tokio::task::spawn_blocking(move || history.save(&snapshot))
        .await
        .map_err(|e| HealthGuardError::history(e.to_string()))?;
    if let Err(e) = saved {
        warn!("Briefing {} was not saved: {}", run.run_id, e);
        run.errors.push(e.to_string());
    }

    Ok(Json(run))
}

async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    let history = state.history.clone();
    let briefings = tokio::task::spawn_blocking(move || history.get_recent(days))
        .await
        .map_err(|e| HealthGuardError::history(e.to_string()))??;

    Ok(Json(HistoryResponse {
        days,
        stats: HistoryStats::from_records(&briefings),
        briefings,
    }))
}

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let location = state.guardian.location();
    Json(StatusResponse {
        version: VERSION,
        location: location.name.clone(),
        coordinates: location.format_coordinates(),
        api_keys: state.config.validate_keys(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AirQualityObservation, Location, WeatherObservation};
    use crate::narrative::TemplateDrafter;
    use crate::sources::{AirQualitySource, SourceError, WeatherSource};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::Utc;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct NoWeather;

    #[async_trait]
    impl WeatherSource for NoWeather {
        async fn get_current_weather(
            &self,
            _location: &Location,
        ) -> Result<Option<WeatherObservation>, SourceError> {
            Err(SourceError::Status {
                provider: "OpenWeatherMap",
                status: 401,
            })
        }
    }

    struct ModerateAir;

    #[async_trait]
    impl AirQualitySource for ModerateAir {
        async fn get_current_aqi(
            &self,
            _location: &Location,
        ) -> Result<Option<AirQualityObservation>, SourceError> {
            Ok(Some(AirQualityObservation {
                timestamp: Utc::now(),
                aqi: 75,
                pollutant: "O3".to_string(),
                category: "Moderate".to_string(),
                reporting_area: "Boston".to_string(),
            }))
        }
    }

    fn app(dir: &TempDir) -> Router {
        let guardian = HealthGuardian::new(
            Location::new(42.3601, -71.0589, "Boston, MA"),
            Arc::new(NoWeather),
            Arc::new(ModerateAir),
            Arc::new(TemplateDrafter::new()),
        );
        router(AppState {
            guardian: Arc::new(guardian),
            history: Arc::new(BriefingHistory::new(dir.path())),
            config: Arc::new(HealthGuardConfig::default()),
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_briefing_then_history() {
        let dir = TempDir::new().unwrap();

        let response = app(&dir)
            .oneshot(
                Request::post("/briefing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let run = body_json(response).await;
        assert_eq!(run["phase"], "complete");
        assert_eq!(run["risk_level"], "moderate");
        assert_eq!(run["errors"][0], "Weather error: OpenWeatherMap returned HTTP 401");

        let response = app(&dir)
            .oneshot(Request::get("/history?days=1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let history = body_json(response).await;
        assert_eq!(history["days"], 1);
        assert_eq!(history["stats"]["count"], 1);
        assert_eq!(history["briefings"][0]["run_id"], run["run_id"]);
    }

    #[tokio::test]
    async fn test_history_accepts_largest_window() {
        let dir = TempDir::new().unwrap();
        let response = app(&dir)
            .oneshot(
                Request::get(format!("/history?days={}", u32::MAX))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let history = body_json(response).await;
        assert_eq!(history["stats"]["count"], 0);
    }

    #[tokio::test]
    async fn test_status_reports_keys() {
        let dir = TempDir::new().unwrap();
        let response = app(&dir)
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = body_json(response).await;
        assert_eq!(status["location"], "Boston, MA");
        assert_eq!(status["coordinates"], "42.3601, -71.0589");
        assert_eq!(status["api_keys"]["openai"], false);
    }
}
