//! One-shot timers that post an event back to the dispatch loop

use crate::event::{EventSender, OverlayEvent};
use std::time::Duration;
use tokio::task::JoinHandle;

/// A scheduled one-shot event
///
/// Dropping the timer aborts it. An expiry that already fired may still be
/// queued, so owners compare the event's ticket with `ticket()` before acting.
pub(crate) struct PendingTimer {
    ticket: u64,
    handle: JoinHandle<()>,
}

impl PendingTimer {
    /// Post `event` to `events` after `delay`
    pub(crate) fn schedule(
        ticket: u64,
        delay: Duration,
        events: EventSender,
        event: OverlayEvent,
    ) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the overlay was torn down
            let _ = events.send(event).await;
        });
        Self { ticket, handle }
    }

    pub(crate) fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl Drop for PendingTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::channel(4);
        let _timer = PendingTimer::schedule(
            7,
            Duration::from_millis(1000),
            tx,
            OverlayEvent::HideElapsed { ticket: 7 },
        );

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(matches!(
            rx.try_recv(),
            Ok(OverlayEvent::HideElapsed { ticket: 7 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_timer_never_fires() {
        let (tx, mut rx) = mpsc::channel(4);
        let timer = PendingTimer::schedule(
            1,
            Duration::from_millis(100),
            tx,
            OverlayEvent::ReconnectElapsed { ticket: 1 },
        );
        drop(timer);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }
}
