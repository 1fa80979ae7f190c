//! Per-request progress channel
//!
//! The sending half ([`ProgressChannel`]) is handed to the service and, as a
//! [`ProgressSink`], to every scoring task. The receiving half
//! ([`ProgressStream`]) yields any number of `MESSAGE` events followed by
//! exactly one terminal event, then ends.

use futures::stream::{self, BoxStream, Stream, StreamExt};
use report_core::{ProgressEvent, ProgressSink, Report};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Terminal error when the sender goes away without completing
pub const CLOSED_EARLY: &str = "progress channel closed before completion";

/// Open a channel whose stream gives up after `idle_timeout` without events
pub fn channel(idle_timeout: Duration) -> (ProgressChannel, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sender = ProgressChannel {
        inner: Arc::new(Inner {
            tx,
            terminated: AtomicBool::new(false),
        }),
    };
    (sender, ProgressStream::new(rx, idle_timeout))
}

struct Inner {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    terminated: AtomicBool,
}

/// Sending half; cheap to clone
#[derive(Clone)]
pub struct ProgressChannel {
    inner: Arc<Inner>,
}

impl ProgressChannel {
    /// Deliver the terminal `COMPLETED` event; `false` if already terminated
    pub fn complete(&self, report: Report) -> bool {
        self.terminate(ProgressEvent::Completed(Box::new(report)))
    }

    /// Deliver the terminal `ERROR` event; `false` if already terminated
    pub fn fail(&self, text: impl Into<String>) -> bool {
        self.terminate(ProgressEvent::Error(text.into()))
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::Acquire)
    }

    fn terminate(&self, event: ProgressEvent) -> bool {
        if self.inner.terminated.swap(true, Ordering::AcqRel) {
            debug!("Dropping {} after terminal event", event.event_name());
            return false;
        }
        self.send(event);
        true
    }

    fn send(&self, event: ProgressEvent) {
        if let Err(e) = self.inner.tx.send(event) {
            warn!("Progress receiver gone, dropping {}", e.0.event_name());
        }
    }
}

impl ProgressSink for ProgressChannel {
    fn message(&self, text: &str) {
        if self.is_terminated() {
            debug!("Dropping message after terminal event: {text}");
            return;
        }
        self.send(ProgressEvent::Message(text.to_string()));
    }
}

/// Receiving half
pub struct ProgressStream {
    inner: BoxStream<'static, ProgressEvent>,
}

impl ProgressStream {
    fn new(rx: mpsc::UnboundedReceiver<ProgressEvent>, idle_timeout: Duration) -> Self {
        let inner = stream::unfold(Some(rx), move |state| async move {
            let mut rx = state?;
            match tokio::time::timeout(idle_timeout, rx.recv()).await {
                Ok(Some(event)) => {
                    let next = (!event.is_terminal()).then_some(rx);
                    Some((event, next))
                }
                Ok(None) => Some((ProgressEvent::Error(CLOSED_EARLY.to_string()), None)),
                Err(_) => {
                    warn!("Progress stream idle for {idle_timeout:?}, closing");
                    let text = format!(
                        "no progress within {}s, giving up",
                        idle_timeout.as_secs()
                    );
                    Some((ProgressEvent::Error(text), None))
                }
            }
        });
        Self {
            inner: inner.boxed(),
        }
    }

    /// Drain the stream
    pub async fn collect_events(self) -> Vec<ProgressEvent> {
        self.collect().await
    }
}

impl fmt::Debug for ProgressStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStream").finish_non_exhaustive()
    }
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use report_core::{EntityId, ReportKind};

    fn report() -> Report {
        Report::new(
            EntityId::parse("ACME").unwrap(),
            ReportKind::Fundamental,
            Vec::new(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_messages_then_single_terminal() {
        let (tx, rx) = channel(Duration::from_secs(5));
        tx.message("one");
        tx.message("two");
        assert!(tx.complete(report()));
        assert!(!tx.fail("late"));
        tx.message("after");

        let events = rx.collect_events().await;
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ProgressEvent::Message("one".into()));
        assert!(matches!(events[2], ProgressEvent::Completed(_)));
    }

    #[tokio::test]
    async fn test_sender_dropped_without_terminal() {
        let (tx, rx) = channel(Duration::from_secs(5));
        tx.message("working");
        drop(tx);

        let events = rx.collect_events().await;
        assert_eq!(
            events,
            vec![
                ProgressEvent::Message("working".into()),
                ProgressEvent::Error(CLOSED_EARLY.into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_ends_stream() {
        let (tx, rx) = channel(Duration::from_secs(30));
        let events = rx.collect_events().await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ProgressEvent::Error(text) if text.contains("30s")));
        // Sending after the receiver is gone is swallowed
        tx.message("too late");
        assert!(tx.complete(report()));
    }

    #[test]
    fn test_stream_debug() {
        let (_tx, rx) = channel(Duration::from_secs(5));
        assert_eq!(format!("{rx:?}"), "ProgressStream { .. }");
    }
}
