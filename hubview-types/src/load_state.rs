// SPDX-License-Identifier: GPL-3.0-only

use crate::Selection;

/// Observable state of a dependent list.
///
/// `items` always belongs to `parent`: it is emptied when the parent changes
/// and only refilled by a fetch issued for that same parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadState<P, T> {
    pub is_loading: bool,
    pub items: Vec<T>,
    pub parent: Selection<P>,
}

impl<P, T> LoadState<P, T> {
    pub fn idle() -> Self {
        Self {
            is_loading: false,
            items: Vec::new(),
            parent: Selection::None,
        }
    }

    /// True once a fetch for the current parent has settled.
    pub fn is_settled(&self) -> bool {
        !self.is_loading
    }
}

impl<P, T> Default for LoadState<P, T> {
    fn default() -> Self {
        Self::idle()
    }
}
