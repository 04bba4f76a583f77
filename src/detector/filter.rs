//! Filters gating which matched transactions reach the callback

use crate::codec::parse_payload;
use crate::types::ChainTransaction;
use std::fmt;
use std::sync::Arc;

/// Predicate over a matched transaction and its decoded payload
pub type Predicate = Arc<dyn Fn(&ChainTransaction, &str) -> bool + Send + Sync>;

/// A single registered filter
#[derive(Clone)]
pub enum Filter {
    /// Arbitrary caller predicate
    Predicate(Predicate),
    /// Parsed payload must contain this key (parsed with the detector's data keys)
    HasKey(String),
}

impl Filter {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&ChainTransaction, &str) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Arc::new(f))
    }

    fn accepts(&self, tx: &ChainTransaction, payload: &str, data_keys: &[String]) -> bool {
        match self {
            Filter::Predicate(f) => f(tx, payload),
            Filter::HasKey(key) => parse_payload(payload, data_keys).contains_key(key),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Predicate(_) => write!(f, "Predicate(..)"),
            Filter::HasKey(key) => write!(f, "HasKey({:?})", key),
        }
    }
}

/// Insertion-ordered filter list with short-circuit AND semantics
#[derive(Clone, Debug, Default)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// True when every filter accepts; stops at the first rejection
    pub fn accepts(&self, tx: &ChainTransaction, payload: &str, data_keys: &[String]) -> bool {
        self.filters
            .iter()
            .all(|filter| filter.accepts(tx, payload, data_keys))
    }
}
