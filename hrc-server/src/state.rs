//! Application state management

use crate::arbitrator::{Arbitrator, CoachEvent};
use crate::cold_path::ColdEngine;
use crate::hot_path::HotEngine;
use crate::session::{Session, SessionSnapshot};
use hrc_core::backend::{CloudModel, VoiceOutput};
use hrc_core::persona::PersonaId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Trace, playback, persona, advisories and side-effect arbitration
    pub session: Arc<Mutex<Session>>,

    /// Broadcast channel for advisory events
    /// Multiple consumers can subscribe to receive events
    pub events: broadcast::Sender<CoachEvent>,

    pub hot: Arc<HotEngine>,

    pub cold: Arc<ColdEngine>,

    /// Cancellation token for the playback task
    pub playback_cancel: Arc<RwLock<Option<CancellationToken>>>,
}

impl AppState {
    pub fn new(
        cloud: Arc<dyn CloudModel>,
        voice: Arc<dyn VoiceOutput>,
        heuristic_delay: Duration,
        persona: PersonaId,
    ) -> Self {
        // Create broadcast channel with capacity for 100 events
        let (events, _) = broadcast::channel(100);
        let arbitrator = Arbitrator::new(voice, events.clone());

        Self {
            session: Arc::new(Mutex::new(Session::new(arbitrator, persona))),
            events,
            hot: Arc::new(HotEngine::new(heuristic_delay)),
            cold: Arc::new(ColdEngine::new(cloud)),
            playback_cancel: Arc::new(RwLock::new(None)),
        }
    }

    /// Subscribe to advisory events
    pub fn subscribe(&self) -> broadcast::Receiver<CoachEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock().await;
        session.snapshot(self.hot.kind(), self.cold.is_in_flight())
    }
}
