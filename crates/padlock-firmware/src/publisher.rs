//! Change-only status notifications.
//!
//! The [`StatusPublisher`] holds the latest composed [`DeviceStatus`] and
//! pushes it to a [`StatusTransport`] when it differs from the last value
//! delivered, but only while the peer has notifications enabled through the
//! shared [`NotifyGate`].

#![allow(async_fn_in_trait)]

use crate::error::{FirmwareError, Result};
use padlock_core::DeviceStatus;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU32, Ordering},
};
use tokio::sync::mpsc;

/// Outbound link for status notifications.
pub trait StatusTransport: Send {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns `FirmwareError::Transport` when the link refused it.
    async fn notify(&mut self, status: DeviceStatus) -> Result<()>;
}

/// Whether the connected peer asked for notifications.
///
/// Cloned into the link layer, which flips it on subscribe and unsubscribe.
#[derive(Debug, Clone, Default)]
pub struct NotifyGate(Arc<AtomicBool>);

impl NotifyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Read side of the status characteristic.
///
/// Always holds the most recently computed status, whether or not it was
/// notified.
#[derive(Debug, Clone, Default)]
pub struct StatusReader(Arc<AtomicU32>);

impl StatusReader {
    pub fn get(&self) -> DeviceStatus {
        DeviceStatus::from_u32(self.0.load(Ordering::Acquire))
    }

    fn set(&self, status: DeviceStatus) {
        self.0.store(status.as_u32(), Ordering::Release);
    }
}

/// Publishes device status on change.
#[derive(Debug)]
pub struct StatusPublisher<T> {
    transport: T,
    gate: NotifyGate,
    latest: StatusReader,
    last_sent: Option<DeviceStatus>,
}

impl<T: StatusTransport> StatusPublisher<T> {
    pub fn new(transport: T, gate: NotifyGate) -> Self {
        Self {
            transport,
            gate,
            latest: StatusReader::default(),
            last_sent: None,
        }
    }

    /// Record `status` and notify if it is new to the peer.
    ///
    /// Returns `true` when a notification was delivered. A refused
    /// notification leaves the last delivered value untouched, so the same
    /// status is retried on the next update.
    ///
    /// # Errors
    ///
    /// Returns the transport error.
    pub async fn update(&mut self, status: DeviceStatus) -> Result<bool> {
        self.latest.set(status);

        if !self.gate.is_enabled() || self.last_sent == Some(status) {
            return Ok(false);
        }

        self.transport.notify(status).await?;
        self.last_sent = Some(status);
        Ok(true)
    }

    /// The value a peer read returns.
    pub fn latest(&self) -> DeviceStatus {
        self.latest.get()
    }

    /// Shared handle a link layer uses to serve peer reads.
    pub fn reader(&self) -> StatusReader {
        self.latest.clone()
    }

    pub fn last_sent(&self) -> Option<DeviceStatus> {
        self.last_sent
    }

    pub fn gate(&self) -> &NotifyGate {
        &self.gate
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// Transport handing notifications to a link task over a bounded channel.
///
/// Never waits: a full or closed channel is reported as a refused
/// notification.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<DeviceStatus>,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DeviceStatus>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl StatusTransport for ChannelTransport {
    async fn notify(&mut self, status: DeviceStatus) -> Result<()> {
        self.tx.try_send(status).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => FirmwareError::transport("notification queue full"),
            mpsc::error::TrySendError::Closed(_) => FirmwareError::transport("link closed"),
        })
    }
}

#[derive(Debug, Default)]
struct SentLog {
    sent: Vec<DeviceStatus>,
    fail: bool,
}

/// Recording transport with fault injection.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    log: Arc<Mutex<SentLog>>,
}

impl MockTransport {
    /// Create a transport and the handle that inspects it.
    pub fn new() -> (Self, MockTransportHandle) {
        let transport = Self::default();
        let handle = MockTransportHandle {
            log: Arc::clone(&transport.log),
        };
        (transport, handle)
    }
}

impl StatusTransport for MockTransport {
    async fn notify(&mut self, status: DeviceStatus) -> Result<()> {
        let mut log = lock(&self.log);
        if log.fail {
            return Err(FirmwareError::transport("injected notify failure"));
        }
        log.sent.push(status);
        Ok(())
    }
}

/// Handle for inspecting a [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    log: Arc<Mutex<SentLog>>,
}

impl MockTransportHandle {
    pub fn sent(&self) -> Vec<DeviceStatus> {
        lock(&self.log).sent.clone()
    }

    pub fn last(&self) -> Option<DeviceStatus> {
        lock(&self.log).sent.last().copied()
    }

    pub fn fail_notify(&self, fail: bool) {
        lock(&self.log).fail = fail;
    }
}

fn lock(log: &Mutex<SentLog>) -> std::sync::MutexGuard<'_, SentLog> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
