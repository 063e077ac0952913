//! Consumer-facing view of a single address.
//!
//! A consumer calls [`GeoCoordinator::watch`] and gets a [`GeoWatch`]: a
//! synchronous `loading`/`data` snapshot plus notification when it changes.
//! Any number of watches may exist for the same address. Dropping one never
//! affects the others or the lookup itself.

use std::sync::Arc;

use tokio::sync::watch;

use crate::coordinator::GeoCoordinator;
use crate::error_handling::CacheEvent;
use crate::geo::GeoRecord;

/// Current state of a watched address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoState {
    /// A lookup for the address is still running
    pub loading: bool,
    /// Resolved record, `None` while loading or after a failure
    pub data: Option<Arc<GeoRecord>>,
}

/// Handle held by one consumer of one address.
pub struct GeoWatch {
    key: String,
    rx: watch::Receiver<GeoState>,
}

impl GeoWatch {
    /// Address this handle watches.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Synchronous snapshot of the current state.
    pub fn state(&self) -> GeoState {
        self.rx.borrow().clone()
    }

    /// Whether a lookup is still running.
    pub fn is_loading(&self) -> bool {
        self.rx.borrow().loading
    }

    /// Current record, if any.
    pub fn data(&self) -> Option<Arc<GeoRecord>> {
        self.rx.borrow().data.clone()
    }

    /// Waits for the next state change.
    ///
    /// Returns `false` once no further change can happen.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits until loading has finished and returns the final data.
    pub async fn resolved(&mut self) -> Option<Arc<GeoRecord>> {
        loop {
            {
                let state = self.rx.borrow_and_update();
                if !state.loading {
                    return state.data.clone();
                }
            }
            if self.rx.changed().await.is_err() {
                return self.rx.borrow().data.clone();
            }
        }
    }
}

impl GeoCoordinator {
    /// Declares interest in `key`.
    ///
    /// A hot cache hit is returned with `loading == false` and no task is
    /// spawned. Once the coordinator is hydrated (see [`GeoCoordinator::open`])
    /// the hot cache holds every durable entry too, so a stored address never
    /// shows as loading. An empty key never loads. Anything else starts out
    /// loading and is updated once [`GeoCoordinator::request`] finishes.
    pub fn watch(&self, key: &str) -> GeoWatch {
        if key.is_empty() {
            let (_tx, rx) = watch::channel(GeoState::default());
            return GeoWatch {
                key: String::new(),
                rx,
            };
        }

        if let Some(record) = self.cached(key) {
            self.stats().increment(CacheEvent::HotHit);
            let (_tx, rx) = watch::channel(GeoState {
                loading: false,
                data: Some(record),
            });
            return GeoWatch {
                key: key.to_string(),
                rx,
            };
        }

        let (tx, rx) = watch::channel(GeoState {
            loading: true,
            data: None,
        });
        let coordinator = self.clone();
        let owned_key = key.to_string();
        tokio::spawn(async move {
            let data = coordinator.request(&owned_key).await;
            // The consumer may have detached; the record is cached either way.
            let _ = tx.send(GeoState {
                loading: false,
                data,
            });
        });

        GeoWatch {
            key: key.to_string(),
            rx,
        }
    }
}
