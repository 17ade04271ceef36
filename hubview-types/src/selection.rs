// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// The currently chosen parent of a dependent list, or nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selection<P> {
    #[default]
    None,
    Some(P),
}

impl<P> Selection<P> {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn as_option(&self) -> Option<&P> {
        match self {
            Self::None => None,
            Self::Some(parent) => Some(parent),
        }
    }

    pub fn into_option(self) -> Option<P> {
        match self {
            Self::None => None,
            Self::Some(parent) => Some(parent),
        }
    }
}

impl<P> From<Option<P>> for Selection<P> {
    fn from(value: Option<P>) -> Self {
        match value {
            Some(parent) => Self::Some(parent),
            None => Self::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_from_option() {
        assert_eq!(Selection::from(Some("Hub1")), Selection::Some("Hub1"));
        assert!(Selection::<&str>::from(None).is_none());
        assert_eq!(Selection::Some(3).into_option(), Some(3));
    }
}
