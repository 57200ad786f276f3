use std::sync::Arc;
use std::time::Instant;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{TraceRequest, TraceResult, TraceStep};
use crate::pipeline::Orchestrator;

#[derive(Debug, Deserialize)]
pub struct CreateTraceBody {
    pub vehicle_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl CreateTraceBody {
    pub fn into_request(self) -> AppResult<TraceRequest> {
        let vehicle_id = self.vehicle_id.trim().to_uppercase();
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();

        if vehicle_id.is_empty() {
            return Err(AppError::Validation("vehicle_id must not be empty".into()));
        }
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AppError::Validation(
                "first_name and last_name must not be empty".into(),
            ));
        }

        Ok(TraceRequest::new(vehicle_id, first_name, last_name))
    }
}

#[derive(Debug, Serialize)]
pub struct TraceResponse {
    pub run_id: Uuid,
    pub duration_ms: u64,
    pub steps: Vec<TraceStep>,
    pub result: TraceResult,
}

pub async fn create_trace(
    State(state): State<AppState>,
    Json(body): Json<CreateTraceBody>,
) -> AppResult<Json<TraceResponse>> {
    let request = body.into_request()?;
    let run_id = Uuid::new_v4();

    let mut orchestrator =
        Orchestrator::new(Arc::clone(&state.source)).with_analysis_pause(state.analysis_pause);

    let mut observer = |steps: Vec<TraceStep>| {
        if let Some(step) = steps.last() {
            tracing::debug!(
                sequence = step.sequence,
                stage = %step.source,
                status = ?step.status,
                "Trace progress"
            );
        }
    };

    let start = Instant::now();
    let result = orchestrator
        .run(&request, &mut observer)
        .instrument(tracing::info_span!("trace request", trace.run_id = %run_id))
        .await?;

    Ok(Json(TraceResponse {
        run_id,
        duration_ms: start.elapsed().as_millis() as u64,
        steps: orchestrator.steps(),
        result,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(vehicle_id: &str, first_name: &str, last_name: &str) -> CreateTraceBody {
        CreateTraceBody {
            vehicle_id: vehicle_id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }

    #[test]
    fn test_create_trace_body_deserialize() {
        let body: CreateTraceBody = serde_json::from_str(
            r#"{"vehicle_id": "1HGBH41JXMN109186", "first_name": "John", "last_name": "Smith"}"#,
        )
        .unwrap();
        assert_eq!(body.vehicle_id, "1HGBH41JXMN109186");
        assert_eq!(body.first_name, "John");
    }

    #[test]
    fn test_into_request_normalizes_fields() {
        let request = body("  1hgbh41jxmn109186 ", " John ", "Smith ")
            .into_request()
            .unwrap();
        assert_eq!(request, TraceRequest::new("1HGBH41JXMN109186", "John", "Smith"));
    }

    #[test]
    fn test_into_request_rejects_blank_fields() {
        assert!(matches!(
            body("   ", "John", "Smith").into_request(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            body("1HGBH41JXMN109186", "", "Smith").into_request(),
            Err(AppError::Validation(_))
        ));
    }
}
