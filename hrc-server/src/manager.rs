//! Playback lifecycle manager
//!
//! This module handles:
//! - Probing the on-device backend once at startup
//! - Loading traces into the session
//! - Running the periodic playback task
//! - Dispatching each tick to the hot and cold engines without waiting on them

use crate::hot_path::BackendKind;
use crate::replay::{Tick, TICK_INTERVAL};
use crate::session::{PlaybackError, TickContext};
use crate::state::AppState;
use hrc_core::backend::OnDeviceModel;
use hrc_core::model::{RaceTrace, TelemetrySample, TraceInfo};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Decide the hot backend and move the session out of its loading state
pub async fn initialize_backends(
    state: &AppState,
    model: &dyn OnDeviceModel,
    timeout: Duration,
) -> BackendKind {
    let kind = state.hot.probe(model, timeout).await;
    info!("Hot path backend: {:?}", kind);

    let mut session = state.session.lock().await;
    session.backend_ready(kind == BackendKind::OnDevice);
    kind
}

pub async fn load_trace(state: &AppState, trace: RaceTrace) -> TraceInfo {
    let info = trace.info();
    state.session.lock().await.load(Arc::new(trace));
    info!(
        "Loaded trace {} ({} samples, gps={})",
        info.trace_id, info.total_samples, info.has_gps
    );
    info
}

/// Start advancing. A no-op when already playing.
pub async fn play(state: &AppState) -> Result<(), PlaybackError> {
    let started = state.session.lock().await.play()?;
    if started {
        start_playback_task(state.clone()).await;
    }
    Ok(())
}

pub async fn pause(state: &AppState) {
    state.session.lock().await.pause();
    stop_playback_task(state).await;
}

/// Returns whether playback is running afterwards
pub async fn toggle(state: &AppState) -> Result<bool, PlaybackError> {
    let playing = state.session.lock().await.playback().is_playing();
    if playing {
        pause(state).await;
        Ok(false)
    } else {
        play(state).await?;
        Ok(true)
    }
}

async fn stop_playback_task(state: &AppState) {
    let mut cancel = state.playback_cancel.write().await;
    if let Some(token) = cancel.take() {
        token.cancel();
    }
}

/// Start the periodic task that advances playback every tick interval
pub async fn start_playback_task(state: AppState) {
    let cancel_token = CancellationToken::new();
    {
        let mut cancel = state.playback_cancel.write().await;
        if let Some(previous) = cancel.replace(cancel_token.clone()) {
            previous.cancel();
        }
    }

    tokio::spawn(async move {
        info!("Playback task started");

        let mut interval = tokio::time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = interval.tick() => {}
            }
            tick(&state).await;
        }

        info!("Playback task ended");
    });
}

/// Work spawned for one tick
pub struct Dispatched {
    pub tick: Tick,
    pub hot: Option<JoinHandle<()>>,
    pub cold: Option<JoinHandle<()>>,
}

/// Advance playback by one step and dispatch the engines.
///
/// Returns `None` when paused or when no trace is loaded.
pub async fn tick(state: &AppState) -> Option<Dispatched> {
    let ctx = state.session.lock().await.advance()?;
    debug!("Tick {} (#{})", ctx.tick.index, ctx.tick.ordinal);
    Some(dispatch(state, ctx))
}

pub fn dispatch(state: &AppState, ctx: TickContext) -> Dispatched {
    let hot = (ctx.tick.is_hot() && state.hot.kind() != BackendKind::Probing)
        .then(|| spawn_hot(state.clone(), ctx.sample));

    let cold = if ctx.tick.is_cold() {
        match state.cold.try_begin() {
            Some(guard) => Some(tokio::spawn({
                let state = state.clone();
                async move {
                    let _guard = guard;
                    let advisory = state.cold.evaluate(&ctx.sample, ctx.persona).await;
                    state.session.lock().await.apply_cold(advisory, ctx.persona);
                }
            })),
            None => {
                debug!("Cold request still in flight, skipping tick {}", ctx.tick.ordinal);
                None
            }
        }
    } else {
        None
    };

    Dispatched {
        tick: ctx.tick,
        hot,
        cold,
    }
}

fn spawn_hot(state: AppState, sample: TelemetrySample) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(advisory) = state.hot.evaluate(&sample).await {
            state.session.lock().await.apply_hot(advisory, sample.speed);
        }
    })
}
