use crate::utils::error::{PlayerError, Result};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// The listener agreed to hear music.
    EnableAudio,
    /// Someone needs silence, e.g. a project video is opening.
    RequestSuppress,
    /// The need for silence has ended.
    RequestResume,
    /// Any generic click on the page.
    Interaction,
}

impl Signal {
    pub const ALL: [Signal; 4] = [
        Signal::EnableAudio,
        Signal::RequestSuppress,
        Signal::RequestResume,
        Signal::Interaction,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Signal::EnableAudio => "enable-audio",
            Signal::RequestSuppress => "request-suppress",
            Signal::RequestResume => "request-resume",
            Signal::Interaction => "interaction",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Signal {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self> {
        Signal::ALL
            .into_iter()
            .find(|signal| signal.name() == s)
            .ok_or_else(|| PlayerError::InvalidConfigValueError {
                field: "signal".to_string(),
                value: s.to_string(),
                reason: "Unknown signal name".to_string(),
            })
    }
}

pub type Handler = Arc<dyn Fn(Signal) -> Result<()> + Send + Sync>;

struct Entry {
    id: u64,
    signal: Signal,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Outcome of one `publish`, for diagnostics only. Publishing itself never
/// fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

/// In-process publish/subscribe for [`Signal`]s.
///
/// Clones share one registry. Delivery is synchronous, in registration order,
/// to the handlers registered when `publish` was called.
#[derive(Clone, Default)]
pub struct BroadcastBus {
    registry: Arc<Mutex<Registry>>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, signal: Signal, handler: F) -> Subscription
    where
        F: Fn(Signal) -> Result<()> + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            signal,
            handler: Arc::new(handler),
        });
        tracing::trace!("subscribed #{} to {}", id, signal);

        Subscription {
            id,
            signal,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn publish(&self, signal: Signal) -> Delivery {
        // Snapshot first: handlers may subscribe, unsubscribe or publish
        // re-entrantly without deadlocking on the registry.
        let handlers: Vec<Handler> = self
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.signal == signal)
            .map(|entry| Arc::clone(&entry.handler))
            .collect();

        tracing::debug!("publishing {} to {} subscriber(s)", signal, handlers.len());

        let mut delivery = Delivery::default();
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(signal))) {
                Ok(Ok(())) => delivery.delivered += 1,
                Ok(Err(e)) => {
                    let err = PlayerError::Handler {
                        signal: signal.to_string(),
                        message: e.to_string(),
                    };
                    tracing::warn!("{}", err);
                    delivery.failed += 1;
                }
                Err(payload) => {
                    let err = PlayerError::Handler {
                        signal: signal.to_string(),
                        message: panic_message(payload.as_ref()),
                    };
                    tracing::warn!("{} (panicked)", err);
                    delivery.failed += 1;
                }
            }
        }
        delivery
    }

    pub fn subscriber_count(&self, signal: Signal) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|entry| entry.signal == signal)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // Handlers never run under the lock, so a poisoned registry is still
        // consistent.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for BroadcastBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastBus")
            .field("subscribers", &self.lock().entries.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Registration guard. Dropping it removes the handler from the bus.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    signal: Signal,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.entries.retain(|entry| entry.id != self.id);
            tracing::trace!("unsubscribed #{} from {}", self.id, self.signal);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("signal", &self.signal)
            .finish()
    }
}
