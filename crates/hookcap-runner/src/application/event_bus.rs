//! Per-capability event bus.
//!
//! One `EventBus` instance exists per capability pipeline run and is passed
//! explicitly to every collaborator — there is no global publish point, so
//! events can never leak across runs or tests.
//!
//! The bus does two jobs:
//!
//! 1. Forward every [`CapturedEvent`] to all subscribers, preserving
//!    arrival order, behind the same explicit listener ceiling the process
//!    streams use.
//! 2. Answer the one-shot question "did this capture produce anything?":
//!    [`EventBus::first_event`] resolves with the first `Data` payload, or
//!    fails with the first pipeline-stage error — whichever the pipeline
//!    reaches first, from build start through the first data event.

use std::sync::Mutex;

use hookcap_core::{CapturedEvent, EventPayload};
use tokio::sync::{broadcast, Notify};

use crate::application::pipeline::PipelineError;
use crate::infrastructure::process::SubscribeError;

/// Resolution state of the first-event accessor.
enum FirstSlot {
    Pending,
    Ready(EventPayload),
    Failed(PipelineError),
}

/// Ordered fan-out of captured events plus the first-event accessor.
pub struct EventBus {
    events_tx: broadcast::Sender<CapturedEvent>,
    max_listeners: usize,
    first: Mutex<FirstSlot>,
    first_notify: Notify,
}

impl EventBus {
    pub fn new(max_listeners: usize, channel_capacity: usize) -> Self {
        let (events_tx, _) = broadcast::channel(channel_capacity);
        Self {
            events_tx,
            max_listeners,
            first: Mutex::new(FirstSlot::Pending),
            first_notify: Notify::new(),
        }
    }

    /// Attaches an external subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`SubscribeError::CeilingReached`] when the configured
    /// listener ceiling is already fully occupied.
    pub fn subscribe(&self) -> Result<broadcast::Receiver<CapturedEvent>, SubscribeError> {
        let active = self.events_tx.receiver_count();
        if active >= self.max_listeners {
            return Err(SubscribeError::CeilingReached {
                active,
                ceiling: self.max_listeners,
            });
        }
        Ok(self.events_tx.subscribe())
    }

    /// Forwards one event to all subscribers.
    ///
    /// The first `Data` event also resolves [`EventBus::first_event`];
    /// later events never change that resolution.
    pub fn publish(&self, event: CapturedEvent) {
        if let CapturedEvent::Data { payload, .. } = &event {
            self.resolve_first(FirstSlot::Ready(payload.clone()));
        }
        // No subscribers is fine; the event is simply unobserved.
        let _ = self.events_tx.send(event);
    }

    /// Records a pipeline-stage failure, failing [`EventBus::first_event`]
    /// if no data arrived first.
    pub fn report_failure(&self, error: PipelineError) {
        self.resolve_first(FirstSlot::Failed(error));
    }

    /// Resolves with the first `Data` payload, or fails with the first
    /// reported pipeline error — whichever was recorded first.
    ///
    /// Any number of callers may await this; they all observe the same
    /// resolution.
    ///
    /// # Errors
    ///
    /// Returns the first [`PipelineError`] the pipeline reported when no
    /// data event preceded it.
    pub async fn first_event(&self) -> Result<EventPayload, PipelineError> {
        loop {
            // Arm the notification before checking, so a resolution landing
            // between check and await cannot be missed.
            let notified = self.first_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                match &*self.first.lock().expect("lock poisoned") {
                    FirstSlot::Ready(payload) => return Ok(payload.clone()),
                    FirstSlot::Failed(error) => return Err(error.clone()),
                    FirstSlot::Pending => {}
                }
            }
            notified.await;
        }
    }

    fn resolve_first(&self, resolution: FirstSlot) {
        let mut slot = self.first.lock().expect("lock poisoned");
        if matches!(*slot, FirstSlot::Pending) {
            *slot = resolution;
            drop(slot);
            self.first_notify.notify_waiters();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
