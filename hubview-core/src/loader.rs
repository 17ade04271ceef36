// SPDX-License-Identifier: GPL-3.0-only

//! Dependent collection loader
//!
//! Each selection starts a new *fetch cycle*: the attempts (and retry delays)
//! made for that one parent. Cycles are numbered by a generation counter kept
//! next to the state under a single lock. A cycle may only write the state
//! while its generation is still the current one, and every new selection
//! cancels the token of the previous cycle so its pending fetch or delay is
//! dropped instead of running to completion.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::{Stream, StreamExt};
use hubview_contracts::{CollectionProvider, FetchMode};
use hubview_types::{LoadState, Selection};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::RetryPolicy;

/// Keeps the child list of the currently selected parent.
///
/// Must be used from within a tokio runtime: selecting a parent spawns the
/// fetch cycle as a task.
pub struct DependentCollectionLoader<P, T> {
    shared: Arc<Shared<P, T>>,
}

struct Shared<P, T> {
    name: &'static str,
    provider: Arc<dyn CollectionProvider<P, T>>,
    retry: RetryPolicy,
    control: Mutex<Control>,
    state: watch::Sender<LoadState<P, T>>,
    closed: CancellationToken,
}

/// Current cycle bookkeeping; guarded together with every state write.
struct Control {
    generation: u64,
    cycle: Option<CancellationToken>,
}

impl Control {
    /// Retire the running cycle (if any) and return the next generation.
    fn advance(&mut self) -> u64 {
        if let Some(cycle) = self.cycle.take() {
            cycle.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}

impl<P, T> DependentCollectionLoader<P, T>
where
    P: Clone + fmt::Debug + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    /// `name` only labels log entries (e.g. "devices").
    pub fn new(
        name: &'static str,
        provider: Arc<dyn CollectionProvider<P, T>>,
        retry: RetryPolicy,
    ) -> Self {
        let (state, _) = watch::channel(LoadState::idle());
        Self {
            shared: Arc::new(Shared {
                name,
                provider,
                retry,
                control: Mutex::new(Control {
                    generation: 0,
                    cycle: None,
                }),
                state,
                closed: CancellationToken::new(),
            }),
        }
    }

    /// Push one selection.
    ///
    /// A parent clears the list and marks it loading before this returns;
    /// `None` resets the state without calling the provider.
    pub fn select(&self, selection: impl Into<Selection<P>>) {
        self.shared.select(selection.into());
    }

    /// Feed every selection of `selections` into the loader until the stream
    /// ends or the loader shuts down.
    pub fn observe_selection<S>(&self, selections: S) -> JoinHandle<()>
    where
        S: Stream<Item = Selection<P>> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            futures_util::pin_mut!(selections);
            loop {
                let next = tokio::select! {
                    _ = shared.closed.cancelled() => break,
                    next = selections.next() => next,
                };
                match next {
                    Some(selection) => shared.select(selection),
                    None => break,
                }
            }
            tracing::debug!(loader = shared.name, "selection stream finished");
        })
    }

    /// Fetch the current parent again, bypassing provider caches.
    ///
    /// The items on display stay visible until the new result arrives.
    /// Returns `false` when nothing is selected.
    pub fn reload(&self) -> bool {
        self.shared.reload()
    }

    pub fn state(&self) -> LoadState<P, T>
    where
        P: Clone,
        T: Clone,
    {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<P, T>> {
        self.shared.state.subscribe()
    }

    /// Wait until the current cycle settles and return the state at that point.
    pub async fn settled(&self) -> LoadState<P, T>
    where
        T: Clone,
    {
        let mut rx = self.subscribe();
        match rx.wait_for(LoadState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Cancel the outstanding cycle and stop observing selections.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }
}

impl<P, T> Drop for DependentCollectionLoader<P, T> {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl<P, T> Shared<P, T> {
    fn lock_control(&self) -> MutexGuard<'_, Control> {
        // State writes never panic while holding the lock, so a poisoned
        // guard still holds consistent data.
        self.control
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn shutdown(&self) {
        if self.closed.is_cancelled() {
            return;
        }
        self.closed.cancel();
        let mut control = self.lock_control();
        control.advance();
        self.state.send_if_modified(|state| {
            let was_loading = state.is_loading;
            state.is_loading = false;
            was_loading
        });
        tracing::debug!(loader = self.name, "loader shut down");
    }

    /// Apply `update` only if `generation` is still the current cycle.
    fn apply(&self, generation: u64, update: impl FnOnce(&mut LoadState<P, T>)) -> bool {
        let control = self.lock_control();
        if control.generation != generation || self.closed.is_cancelled() {
            tracing::trace!(
                loader = self.name,
                generation,
                current = control.generation,
                "discarding result of superseded fetch cycle"
            );
            return false;
        }
        self.state.send_modify(update);
        true
    }
}

impl<P, T> Shared<P, T>
where
    P: Clone + fmt::Debug + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    fn select(self: &Arc<Self>, selection: Selection<P>) {
        // `shutdown` cancels before it locks; check under the lock.
        let mut control = self.lock_control();
        if self.closed.is_cancelled() {
            return;
        }
        let generation = control.advance();

        match selection {
            Selection::None => {
                self.state.send_replace(LoadState::idle());
                tracing::debug!(loader = self.name, generation, "selection cleared");
            }
            Selection::Some(parent) => {
                self.state.send_replace(LoadState {
                    is_loading: true,
                    items: Vec::new(),
                    parent: Selection::Some(parent.clone()),
                });
                let cycle = self.closed.child_token();
                control.cycle = Some(cycle.clone());
                drop(control);

                tracing::debug!(loader = self.name, generation, ?parent, "selection changed");
                self.spawn_cycle(generation, parent, FetchMode::Cached, cycle);
            }
        }
    }

    fn reload(self: &Arc<Self>) -> bool {
        let mut control = self.lock_control();
        if self.closed.is_cancelled() {
            return false;
        }
        let Some(parent) = self.state.borrow().parent.as_option().cloned() else {
            return false;
        };
        let generation = control.advance();
        self.state.send_modify(|state| state.is_loading = true);
        let cycle = self.closed.child_token();
        control.cycle = Some(cycle.clone());
        drop(control);

        tracing::debug!(loader = self.name, generation, ?parent, "reload requested");
        self.spawn_cycle(generation, parent, FetchMode::Refresh, cycle);
        true
    }

    fn spawn_cycle(
        self: &Arc<Self>,
        generation: u64,
        parent: P,
        mode: FetchMode,
        cancel: CancellationToken,
    ) {
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            shared.run_cycle(generation, parent, mode, cancel).await;
        });
    }

    async fn run_cycle(&self, generation: u64, parent: P, mode: FetchMode, cancel: CancellationToken) {
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::trace!(loader = self.name, generation, ?parent, "fetch cancelled");
                    return;
                }
                result = self.provider.fetch(&parent, mode) => result,
            };

            let error = match result {
                Ok(items) => {
                    let count = items.len();
                    if self.apply(generation, |state| {
                        state.items = items;
                        state.is_loading = false;
                    }) {
                        tracing::debug!(loader = self.name, ?parent, attempt, count, "collection loaded");
                    }
                    return;
                }
                Err(error) => error,
            };

            if !self.retry.allows_retry_after(attempt) {
                tracing::error!(
                    loader = self.name,
                    ?parent,
                    attempt,
                    error = %error,
                    "failed to fetch {}, giving up",
                    self.name
                );
                self.apply(generation, |state| state.is_loading = false);
                return;
            }

            tracing::warn!(
                loader = self.name,
                ?parent,
                attempt,
                error = %error,
                "failed to fetch {}, retrying in {:?}",
                self.name,
                self.retry.delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::trace!(loader = self.name, generation, ?parent, "retry cancelled");
                    return;
                }
                _ = tokio::time::sleep(self.retry.delay) => {}
            }
        }
    }
}
