// Communication channels
// Notifications travel over a lock-free ring; the producer side is shared behind a mutex

use crate::messaging::notification::{Notification, NotificationCategory, NotificationLevel};
use crate::sequencer::machine::Voice;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use std::sync::{Arc, Mutex};

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Cloneable handle used by the playback thread and the bypass channel to
/// report problems
///
/// Every report is also logged. When the ring is full the notification is
/// dropped; the log line remains.
#[derive(Clone)]
pub struct Reporter {
    tx: Arc<Mutex<NotificationProducer>>,
}

impl Reporter {
    pub fn new(tx: NotificationProducer) -> Self {
        Self {
            tx: Arc::new(Mutex::new(tx)),
        }
    }

    /// Reporter with its own channel, for callers that only want the log output
    pub fn detached(capacity: usize) -> (Self, NotificationConsumer) {
        let (tx, rx) = create_notification_channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    pub fn report(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => log::info!(target: "Report", "{}", notification),
            NotificationLevel::Warning => log::warn!(target: "Report", "{}", notification),
            NotificationLevel::Error => log::error!(target: "Report", "{}", notification),
        }

        if let Ok(mut tx) = self.tx.lock() {
            let _ = tx.try_push(notification);
        }
    }

    pub fn info(&self, category: NotificationCategory, message: String) {
        self.report(Notification::new(NotificationLevel::Info, category, message));
    }

    pub fn warning(&self, category: NotificationCategory, message: String) {
        self.report(Notification::new(NotificationLevel::Warning, category, message));
    }

    /// Transport failure on one voice
    pub fn transport_error(&self, voice: Voice, message: String) {
        self.report(
            Notification::new(NotificationLevel::Error, NotificationCategory::Transport, message)
                .on_voice(voice),
        );
    }
}

/// Pop everything currently queued
pub fn drain(rx: &mut NotificationConsumer) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Some(n) = rx.try_pop() {
        out.push(n);
    }
    out
}
