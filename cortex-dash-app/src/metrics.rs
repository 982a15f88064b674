//! Session counters, mirrored to the `metrics` facade.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct Metrics {
    frames_received: AtomicU64,
    decode_failures: AtomicU64,
    unknown_frames: AtomicU64,
    reconnect_attempts: AtomicU64,
    rejected_sends: AtomicU64,
    discarded_sends: AtomicU64,
    messages_sent: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_frames_received(&self, kind: &str) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("cortex_dash_frames_received", 1, "kind" => kind.to_string());
    }

    pub fn inc_decode_failures(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("cortex_dash_decode_failures", 1);
    }

    pub fn inc_unknown_frames(&self) {
        self.unknown_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reconnect_attempts(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("cortex_dash_reconnect_attempts", 1);
    }

    pub fn inc_rejected_sends(&self) {
        self.rejected_sends.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("cortex_dash_rejected_sends", 1);
    }

    pub fn inc_discarded_sends(&self, count: usize) {
        self.discarded_sends.fetch_add(count as u64, Ordering::Relaxed);
        metrics::counter!("cortex_dash_discarded_sends", count as u64);
    }

    pub fn inc_messages_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            unknown_frames: self.unknown_frames.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            rejected_sends: self.rejected_sends.load(Ordering::Relaxed),
            discarded_sends: self.discarded_sends.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            unknown_frames: AtomicU64::new(0),
            reconnect_attempts: AtomicU64::new(0),
            rejected_sends: AtomicU64::new(0),
            discarded_sends: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub decode_failures: u64,
    pub unknown_frames: u64,
    pub reconnect_attempts: u64,
    pub rejected_sends: u64,
    pub discarded_sends: u64,
    pub messages_sent: u64,
}
