//! REST API and SSE routes

use crate::manager;
use crate::session::SessionSnapshot;
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post, put},
    Json, Router,
};
use futures::stream::{Stream, StreamExt as FuturesStreamExt};
use hrc_core::model::TraceInfo;
use hrc_core::persona::{Persona, PersonaId};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/trace",
            post(upload_trace)
                .get(trace_info)
                .layer(DefaultBodyLimit::max(64 * 1024 * 1024)),
        )
        .route("/api/playback", post(playback_control))
        .route("/api/persona", put(set_persona))
        .route("/api/personas", get(list_personas))
        .route("/api/audio", put(set_audio))
        .route("/api/state", get(session_state))
        .route("/api/stream", get(advisory_stream))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// === Trace Endpoints ===

/// Ingest raw CSV text and make it the active trace
async fn upload_trace(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<TraceInfo>, (StatusCode, String)> {
    let trace = hrc_adapters::parse_trace(&body).map_err(|e| {
        tracing::warn!("Rejected trace upload: {}", e);
        (StatusCode::BAD_REQUEST, format!("Failed to parse trace: {}", e))
    })?;

    Ok(Json(manager::load_trace(&state, trace).await))
}

async fn trace_info(
    State(state): State<AppState>,
) -> Result<Json<TraceInfo>, (StatusCode, String)> {
    let session = state.session.lock().await;
    session
        .trace()
        .map(|t| Json(t.info()))
        .ok_or((StatusCode::NOT_FOUND, "No trace loaded".to_string()))
}

// === Playback Endpoints ===

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum PlaybackAction {
    Play,
    Pause,
    Toggle,
}

#[derive(Deserialize)]
struct PlaybackRequest {
    action: PlaybackAction,
}

async fn playback_control(
    State(state): State<AppState>,
    Json(request): Json<PlaybackRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let conflict = |e: crate::session::PlaybackError| (StatusCode::CONFLICT, e.to_string());

    let playing = match request.action {
        PlaybackAction::Play => {
            manager::play(&state).await.map_err(conflict)?;
            true
        }
        PlaybackAction::Pause => {
            manager::pause(&state).await;
            false
        }
        PlaybackAction::Toggle => manager::toggle(&state).await.map_err(conflict)?,
    };

    let status = if playing { "playing" } else { "paused" };
    Ok(Json(serde_json::json!({ "status": status })))
}

// === Persona Endpoints ===

#[derive(Serialize)]
struct PersonaInfo {
    id: PersonaId,
    display_name: &'static str,
    active: bool,
}

async fn list_personas(State(state): State<AppState>) -> Json<Vec<PersonaInfo>> {
    let active = state.session.lock().await.persona();
    let personas = Persona::all()
        .map(|p| PersonaInfo {
            id: p.id,
            display_name: p.display_name,
            active: p.id == active,
        })
        .collect();
    Json(personas)
}

#[derive(Deserialize)]
struct PersonaRequest {
    persona: String,
}

async fn set_persona(
    State(state): State<AppState>,
    Json(request): Json<PersonaRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let persona: PersonaId = request
        .persona
        .parse()
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("{}", e)))?;

    state.session.lock().await.set_persona(persona);
    tracing::info!("Persona switched to {}", persona);

    Ok(Json(serde_json::json!({ "persona": persona })))
}

// === Audio Endpoint ===

#[derive(Deserialize)]
struct AudioRequest {
    enabled: bool,
}

async fn set_audio(
    State(state): State<AppState>,
    Json(request): Json<AudioRequest>,
) -> Json<serde_json::Value> {
    state
        .session
        .lock()
        .await
        .arbitrator_mut()
        .set_audio(request.enabled);
    Json(serde_json::json!({ "enabled": request.enabled }))
}

// === State & Stream Endpoints ===

async fn session_state(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.snapshot().await)
}

async fn advisory_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().event(event.name()).data(json))),
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Broadcast stream error: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
