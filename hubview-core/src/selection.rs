// SPDX-License-Identifier: GPL-3.0-only

use futures_util::Stream;
use hubview_types::Selection;
use tokio::sync::watch;

/// Holds the selected item of one list (hub, device, ...).
///
/// Observers always see the latest value; selections made faster than an
/// observer polls are coalesced.
#[derive(Debug)]
pub struct SelectionService<T> {
    sender: watch::Sender<Option<T>>,
}

impl<T> SelectionService<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    pub fn select(&self, value: Option<T>) {
        self.sender.send_replace(value);
    }

    pub fn clear(&self) {
        self.select(None);
    }

    pub fn selected(&self) -> Option<T> {
        self.sender.borrow().clone()
    }

    pub fn is_selected(&self) -> bool {
        self.sender.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.sender.subscribe()
    }

    /// Stream of selections, starting with the current one.
    pub fn changes(&self) -> impl Stream<Item = Selection<T>> + Send + 'static {
        let mut rx = self.sender.subscribe();
        rx.mark_changed();
        futures_util::stream::unfold(rx, |mut rx| async move {
            rx.changed().await.ok()?;
            let selection = Selection::from(rx.borrow_and_update().clone());
            Some((selection, rx))
        })
    }
}

impl<T> Default for SelectionService<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
