//! Status projector
//!
//! Fuses server signals and the manual toggle into the `{visible, status}`
//! pair the renderer reads. Both writers run on the dispatch loop.
//!
//! Server signals always win once they arrive: the toggle only picks
//! visibility and a starting status, it never mutes the server.

use crate::event::{EventSender, KeyPress, OverlayEvent};
use crate::protocol::StatusSignal;
use crate::state::{OverlayStatus, SharedOverlayState};
use crate::timer::PendingTimer;
use chrono::Utc;
use std::time::Duration;
use tracing::debug;

/// Owns the deferred hide and the toggle key filter
pub struct StatusProjector {
    state: SharedOverlayState,
    hide_delay: Duration,
    toggle_key: String,
    events: EventSender,
    pending_hide: Option<PendingTimer>,
    next_ticket: u64,
}

impl StatusProjector {
    pub fn new(
        state: SharedOverlayState,
        hide_delay: Duration,
        toggle_key: impl Into<String>,
        events: EventSender,
    ) -> Self {
        Self {
            state,
            hide_delay,
            toggle_key: toggle_key.into(),
            events,
            pending_hide: None,
            next_ticket: 0,
        }
    }

    /// Apply a recognized server signal
    pub fn apply_signal(&mut self, signal: StatusSignal) {
        match signal {
            StatusSignal::Active(status) => {
                // A newer active status supersedes any pending hide
                self.cancel_pending_hide();
                let mut state = self.state.write();
                state.activate(status);
                state.last_signal_at = Some(Utc::now());
            }
            StatusSignal::Idle => {
                self.schedule_hide();
                self.state.write().last_signal_at = Some(Utc::now());
            }
        }
    }

    pub fn on_hide_elapsed(&mut self, ticket: u64) {
        let pending = self.pending_hide.as_ref().map(PendingTimer::ticket);
        if pending != Some(ticket) {
            debug!("Stale hide timer {}, ignoring", ticket);
            return;
        }

        self.pending_hide = None;
        self.state.write().hide();
        debug!("Overlay hidden after idle");
    }

    /// Filter a key press and toggle if it qualifies
    ///
    /// Returns whether the overlay was toggled.
    pub fn handle_key(&mut self, key: &KeyPress) -> bool {
        if !key.key.eq_ignore_ascii_case(&self.toggle_key) {
            return false;
        }
        if key.repeat {
            debug!("Ignoring auto-repeat of {}", key.key);
            return false;
        }
        if key.text_entry_focused {
            debug!("Ignoring {} inside text entry", key.key);
            return false;
        }

        self.handle_manual_toggle();
        true
    }

    /// Flip visibility; turning on starts in `Listening`
    pub fn handle_manual_toggle(&mut self) {
        // An explicit choice of visibility outranks an earlier idle
        self.cancel_pending_hide();
        let visible = self.state.write().toggle();
        debug!(
            "Manual toggle: {}",
            if visible { "shown (listening)" } else { "hidden" }
        );
    }

    /// Cancel the pending hide, if any
    pub fn teardown(&mut self) {
        self.cancel_pending_hide();
    }

    pub fn has_pending_hide(&self) -> bool {
        self.pending_hide.is_some()
    }

    pub fn current_status(&self) -> OverlayStatus {
        self.state.status()
    }

    fn schedule_hide(&mut self) {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.pending_hide = Some(PendingTimer::schedule(
            ticket,
            self.hide_delay,
            self.events.clone(),
            OverlayEvent::HideElapsed { ticket },
        ));
        debug!("Hiding in {:?}", self.hide_delay);
    }

    fn cancel_pending_hide(&mut self) {
        if self.pending_hide.take().is_some() {
            debug!("Cancelled pending hide");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn projector() -> (StatusProjector, SharedOverlayState, mpsc::Receiver<OverlayEvent>) {
        let state = SharedOverlayState::new();
        let (tx, rx) = mpsc::channel(16);
        let projector = StatusProjector::new(state.clone(), Duration::from_millis(1000), "Space", tx);
        (projector, state, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_signal_shows_immediately() {
        let (mut projector, state, _rx) = projector();

        projector.apply_signal(StatusSignal::Active(OverlayStatus::Processing));

        assert!(state.is_visible());
        assert_eq!(state.status(), OverlayStatus::Processing);
        assert!(state.snapshot().last_signal_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_schedules_hide() {
        let (mut projector, state, mut rx) = projector();
        projector.apply_signal(StatusSignal::Active(OverlayStatus::Speaking));
        projector.apply_signal(StatusSignal::Idle);

        assert!(state.is_visible());
        assert!(projector.has_pending_hide());

        let ticket = match rx.recv().await {
            Some(OverlayEvent::HideElapsed { ticket }) => ticket,
            other => panic!("expected hide, got {other:?}"),
        };
        projector.on_hide_elapsed(ticket);

        assert!(!state.is_visible());
        assert_eq!(state.status(), OverlayStatus::Speaking);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_hide_is_ignored() {
        let (mut projector, state, _rx) = projector();
        projector.apply_signal(StatusSignal::Idle);
        projector.apply_signal(StatusSignal::Active(OverlayStatus::Listening));

        // Ticket 1 was the idle's hide, already superseded
        projector.on_hide_elapsed(1);

        assert!(state.is_visible());
        assert!(!projector.has_pending_hide());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_idle_replaces_hide() {
        let (mut projector, state, _rx) = projector();
        projector.apply_signal(StatusSignal::Active(OverlayStatus::Listening));
        projector.apply_signal(StatusSignal::Idle);
        projector.apply_signal(StatusSignal::Idle);

        projector.on_hide_elapsed(1);
        assert!(state.is_visible());

        projector.on_hide_elapsed(2);
        assert!(!state.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_filtering() {
        let (mut projector, state, _rx) = projector();

        assert!(!projector.handle_key(&KeyPress::new("Enter")));
        assert!(!projector.handle_key(&KeyPress::new("Space").repeated()));
        assert!(!projector.handle_key(&KeyPress::new("Space").in_text_entry()));
        assert!(!state.is_visible());

        assert!(projector.handle_key(&KeyPress::new("space")));
        assert!(state.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_cancels_pending_hide() {
        let (mut projector, state, _rx) = projector();
        projector.apply_signal(StatusSignal::Active(OverlayStatus::Speaking));
        projector.apply_signal(StatusSignal::Idle);

        // Off then on again before the hide fires
        projector.handle_manual_toggle();
        projector.handle_manual_toggle();
        projector.on_hide_elapsed(1);

        assert!(state.is_visible());
        assert_eq!(state.status(), OverlayStatus::Listening);
    }
}
