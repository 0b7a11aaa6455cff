//! In-memory connection halves for exercising the manager without sockets.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::mpsc;

use super::connection::{MessageSink, MessageSource};
use crate::domain::Message;
use crate::error::ConnectionError;

/// Something a [`FakeSink`] observed, tagged with the sink's label.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SinkEvent {
    Wrote(Message),
    WriteFailed,
    Closed,
}

pub(crate) type EventLog = mpsc::UnboundedReceiver<(usize, SinkEvent)>;

/// Switches shared between a test and the sink it handed to the manager.
#[derive(Debug, Default)]
pub(crate) struct SinkControls {
    pub(crate) fail_writes: AtomicBool,
    pub(crate) stall_writes: AtomicBool,
    pub(crate) fail_close: AtomicBool,
    pub(crate) stall_close: AtomicBool,
    in_write: AtomicBool,
    overlapping_writes: AtomicUsize,
}

impl SinkControls {
    pub(crate) fn overlapping_writes(&self) -> usize {
        self.overlapping_writes.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub(crate) struct FakeSink {
    label: usize,
    events: mpsc::UnboundedSender<(usize, SinkEvent)>,
    controls: Arc<SinkControls>,
}

impl FakeSink {
    pub(crate) fn new(
        label: usize,
        events: mpsc::UnboundedSender<(usize, SinkEvent)>,
    ) -> (Self, Arc<SinkControls>) {
        let controls = Arc::new(SinkControls::default());
        let sink = Self {
            label,
            events,
            controls: Arc::clone(&controls),
        };
        (sink, controls)
    }

    fn record(&self, event: SinkEvent) {
        let _ = self.events.send((self.label, event));
    }
}

impl MessageSink for FakeSink {
    async fn write(&mut self, message: &Message) -> Result<(), ConnectionError> {
        // Non-reentrant guard: a second writer entering before the first
        // leaves is counted.
        if self.controls.in_write.swap(true, Ordering::SeqCst) {
            self.controls.overlapping_writes.fetch_add(1, Ordering::SeqCst);
        }
        tokio::task::yield_now().await;
        if self.controls.stall_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.controls.in_write.store(false, Ordering::SeqCst);

        if self.controls.fail_writes.load(Ordering::SeqCst) {
            self.record(SinkEvent::WriteFailed);
            return Err(ConnectionError::transport("broken pipe"));
        }
        self.record(SinkEvent::Wrote(message.clone()));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.record(SinkEvent::Closed);
        if self.controls.stall_close.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.controls.fail_close.load(Ordering::SeqCst) {
            return Err(ConnectionError::transport("close frame rejected"));
        }
        Ok(())
    }
}

/// Read half fed by the test through an unbounded channel. Reading after
/// the feeding side is dropped reports [`ConnectionError::Closed`].
#[derive(Debug)]
pub(crate) struct FakeSource {
    inbound: mpsc::UnboundedReceiver<Result<Message, ConnectionError>>,
}

pub(crate) fn fake_source() -> (
    FakeSource,
    mpsc::UnboundedSender<Result<Message, ConnectionError>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FakeSource { inbound: rx }, tx)
}

impl MessageSource for FakeSource {
    async fn read(&mut self) -> Result<Message, ConnectionError> {
        self.inbound
            .recv()
            .await
            .unwrap_or(Err(ConnectionError::Closed))
    }
}

/// Everything recorded so far, without waiting.
pub(crate) fn drain(log: &mut EventLog) -> Vec<(usize, SinkEvent)> {
    let mut events = Vec::new();
    while let Ok(event) = log.try_recv() {
        events.push(event);
    }
    events
}

/// Events recorded by the sink labelled `label`, in order.
pub(crate) fn events_for(events: &[(usize, SinkEvent)], label: usize) -> Vec<SinkEvent> {
    events
        .iter()
        .filter(|(l, _)| *l == label)
        .map(|(_, e)| e.clone())
        .collect()
}
