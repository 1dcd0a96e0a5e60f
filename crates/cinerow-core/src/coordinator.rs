//! Single authority over which title is the active preview.
//!
//! A hover schedules a title; after the hover delay the caller's trailer
//! fetch runs and its result is committed, unless a newer request arrived
//! in the meantime. Every request bumps a generation counter and every
//! completion checks the generation it captured before touching state.

use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::Title;

pub const DEFAULT_HOVER_DELAY: Duration = Duration::from_millis(250);

/// Where the coordinator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// A hover is pending or its trailer is being resolved.
    Scheduled,
    Active,
}

/// The shared active preview slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivePreview {
    pub title: Option<Title>,
    pub trailer_url: Option<String>,
    pub is_playing: bool,
}

struct Slot {
    generation: u64,
    phase: Phase,
    /// Timer task not yet fired. Cleared by the task itself once it fires.
    pending: Option<JoinHandle<()>>,
}

struct Inner {
    delay: Duration,
    slot: Mutex<Slot>,
    tx: watch::Sender<ActivePreview>,
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Called by a timer task when its delay elapses. Returns whether the
    /// request is still current and may go on to fetch.
    fn fire(&self, generation: u64) -> bool {
        let mut slot = self.slot();
        if slot.generation != generation {
            return false;
        }
        slot.pending = None;
        true
    }

    fn commit(&self, generation: u64, title: Title, trailer_url: Option<String>) {
        let mut slot = self.slot();
        if slot.generation != generation {
            tracing::debug!(
                key = %title.key(),
                generation,
                current = slot.generation,
                "discarding stale preview"
            );
            return;
        }

        tracing::debug!(key = %title.key(), has_trailer = trailer_url.is_some(), "preview active");
        slot.phase = Phase::Active;
        let is_playing = trailer_url.is_some();
        self.tx.send_replace(ActivePreview {
            title: Some(title),
            trailer_url,
            is_playing,
        });
    }
}

impl Slot {
    /// Invalidate outstanding work and stop the pending timer.
    fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation
    }
}

/// Hover-intent scheduler owning the [`ActivePreview`] slot.
///
/// Clones share the same slot. Scheduling requires a tokio runtime.
#[derive(Clone)]
pub struct ActiveMediaCoordinator {
    inner: Arc<Inner>,
}

impl Default for ActiveMediaCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_HOVER_DELAY)
    }
}

impl ActiveMediaCoordinator {
    pub fn new(delay: Duration) -> Self {
        let (tx, _) = watch::channel(ActivePreview::default());
        Self {
            inner: Arc::new(Inner {
                delay,
                slot: Mutex::new(Slot {
                    generation: 0,
                    phase: Phase::Idle,
                    pending: None,
                }),
                tx,
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Schedule `title` to become active after the hover delay.
    ///
    /// When the delay elapses `fetch` resolves the trailer. A failed fetch
    /// still commits the title, without a trailer and not playing. Any
    /// earlier request still pending or resolving is superseded.
    pub fn schedule<F, Fut, E>(&self, title: Title, fetch: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<String>, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let mut slot = self.inner.slot();
        let generation = slot.invalidate();
        slot.phase = Phase::Scheduled;
        tracing::debug!(key = %title.key(), generation, "preview scheduled");

        let inner = self.inner.clone();
        slot.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            if !inner.fire(generation) {
                return;
            }

            let key = title.key();
            let trailer = match fetch().await {
                Ok(trailer) => trailer,
                Err(e) => {
                    tracing::warn!(%key, error = %e, "trailer lookup failed");
                    None
                }
            };
            inner.commit(generation, title, trailer);
        }));
    }

    /// Drop a pending hover and return to the last committed state.
    /// No fetch is issued if the delay has not elapsed. Idempotent.
    pub fn cancel_schedule(&self) {
        let mut slot = self.inner.slot();
        if slot.phase != Phase::Scheduled {
            return;
        }
        slot.invalidate();
        slot.phase = if self.inner.tx.borrow().title.is_some() {
            Phase::Active
        } else {
            Phase::Idle
        };
        tracing::debug!(phase = ?slot.phase, "preview schedule cancelled");
    }

    /// Activate a title right away, or go idle when `title` is `None`.
    pub fn set_active(&self, title: Option<Title>, trailer_url: Option<String>) {
        let mut slot = self.inner.slot();
        slot.invalidate();

        let preview = match title {
            Some(title) => {
                slot.phase = Phase::Active;
                let is_playing = trailer_url.is_some();
                ActivePreview {
                    title: Some(title),
                    trailer_url,
                    is_playing,
                }
            }
            None => {
                slot.phase = Phase::Idle;
                ActivePreview::default()
            }
        };
        self.inner.tx.send_replace(preview);
    }

    /// Reset to idle, discarding anything pending or in flight.
    pub fn clear(&self) {
        let mut slot = self.inner.slot();
        slot.invalidate();
        slot.phase = Phase::Idle;
        self.inner.tx.send_replace(ActivePreview::default());
    }

    /// Set the playing flag of the committed preview. No effect when idle.
    pub fn set_playing(&self, playing: bool) {
        let _slot = self.inner.slot();
        self.inner.tx.send_if_modified(|preview| {
            if preview.title.is_none() || preview.is_playing == playing {
                return false;
            }
            preview.is_playing = playing;
            true
        });
    }

    pub fn snapshot(&self) -> ActivePreview {
        self.inner.tx.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.slot().phase
    }

    /// Observe every committed change to the slot.
    pub fn subscribe(&self) -> watch::Receiver<ActivePreview> {
        self.inner.tx.subscribe()
    }
}
