use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::tile::Tile;

/// Direction of a resident-set change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileEventKind {
    Load,
    Unload,
}

impl std::fmt::Display for TileEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Unload => "unload",
        })
    }
}

/// One batched notification: every tile that entered or left the resident
/// set during a single update.
#[derive(Debug, Clone)]
pub struct TileEvent {
    pub kind: TileEventKind,
    pub tiles: Vec<Arc<Tile>>,
}

/// Failure reported by a listener. Logged by the manager, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ListenerError(String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

pub type ListenerResult = Result<(), ListenerError>;

/// Token identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription(u64);

type Listener = Box<dyn FnMut(&TileEvent) -> ListenerResult>;

/// Outcome of delivering one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Ordered listener registry.
#[derive(Default)]
pub(crate) struct ListenerSet {
    next_id: u64,
    listeners: Vec<(Subscription, Listener)>,
}

impl ListenerSet {
    pub(crate) fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&TileEvent) -> ListenerResult + 'static,
    {
        let sub = Subscription(self.next_id);
        self.next_id += 1;
        self.listeners.push((sub, Box::new(listener)));
        sub
    }

    pub(crate) fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != sub);
        self.listeners.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Invoke every listener in registration order.
    ///
    /// A listener that returns an error or panics is logged and skipped; the
    /// rest still run.
    pub(crate) fn dispatch(&mut self, event: &TileEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        for (sub, listener) in &mut self.listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    tracing::warn!(
                        subscription = ?sub,
                        kind = %event.kind,
                        %err,
                        "tile listener failed"
                    );
                }
                Err(payload) => {
                    report.failed += 1;
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".into());
                    tracing::error!(
                        subscription = ?sub,
                        kind = %event.kind,
                        %message,
                        "tile listener panicked"
                    );
                }
            }
        }
        report
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("next_id", &self.next_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn event() -> TileEvent {
        TileEvent {
            kind: TileEventKind::Load,
            tiles: Vec::new(),
        }
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut set = ListenerSet::default();
        for name in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            set.subscribe(move |_| {
                log.borrow_mut().push(name);
                Ok(())
            });
        }
        let report = set.dispatch(&event());
        assert_eq!(report.delivered, 3);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let mut set = ListenerSet::default();
        let a = set.subscribe(|_| Ok(()));
        let b = set.subscribe(|_| Ok(()));
        assert!(set.unsubscribe(a));
        assert!(!set.unsubscribe(a));
        assert_eq!(set.len(), 1);
        assert!(set.unsubscribe(b));
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn failing_listener_does_not_stop_others() {
        let hits = Rc::new(RefCell::new(0));
        let mut set = ListenerSet::default();
        set.subscribe(|_| Err("boom".into()));
        set.subscribe(|_| panic!("listener panic"));
        let counter = Rc::clone(&hits);
        set.subscribe(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        let report = set.dispatch(&event());
        assert_eq!(report, DispatchReport { delivered: 1, failed: 2 });
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn event_kind_display() {
        assert_eq!(TileEventKind::Load.to_string(), "load");
        assert_eq!(TileEventKind::Unload.to_string(), "unload");
        assert_eq!(ListenerError::from("x").to_string(), "x");
    }
}
