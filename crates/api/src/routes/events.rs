use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::warn;

use fellowpet_services::events::ChangeEnvelope;
use fellowpet_services::handlers::{self, EventStatus};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub events: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct EventResult {
    pub kind: Option<String>,
    pub status: EventStatus,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub results: Vec<EventResult>,
}

// ---- POST /api/events ----------------------------------------------------

/// Ingests a batch of change envelopes. Each event is handled and reported
/// independently; a malformed or failing event is recorded as rejected and
/// never turns the whole request into an error.
pub async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<IngestRequest>,
) -> Json<IngestResponse> {
    let mut results = Vec::with_capacity(body.events.len());

    for raw in body.events {
        match serde_json::from_value::<ChangeEnvelope>(raw) {
            Ok(envelope) => {
                let status = handlers::handle_event(&state.notify, &envelope).await;
                results.push(EventResult {
                    kind: Some(envelope.kind.as_str().to_string()),
                    status,
                });
            }
            Err(e) => {
                warn!(error = %e, "Unparseable change envelope");
                results.push(EventResult {
                    kind: None,
                    status: EventStatus::Rejected,
                });
            }
        }
    }

    Json(IngestResponse { results })
}
