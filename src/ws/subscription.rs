//! Per-connection subscription manager.
//!
//! Tracks which product IDs a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::ProductId;

/// Manages the set of product subscriptions for a single WebSocket
/// connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed product IDs. Ignored while `subscribe_all` is set.
    product_ids: HashSet<ProductId>,
    /// Whether the client subscribes to all products (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds product IDs to the subscription set, optionally enabling the
    /// wildcard.
    pub fn subscribe(&mut self, ids: &[ProductId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.product_ids.extend(ids.iter().copied());
    }

    /// Removes product IDs from the subscription set. `wildcard` clears
    /// the wildcard too.
    pub fn unsubscribe(&mut self, ids: &[ProductId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.product_ids.remove(id);
        }
    }

    /// Returns `true` if an event about `product_id` should be forwarded.
    ///
    /// Events that concern no single product (activity entries) reach
    /// every connection with at least one subscription.
    #[must_use]
    pub fn matches(&self, product_id: Option<ProductId>) -> bool {
        match product_id {
            Some(id) => self.subscribe_all || self.product_ids.contains(&id),
            None => self.is_active(),
        }
    }

    /// Returns `true` if the client subscribed to anything.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.subscribe_all || !self.product_ids.is_empty()
    }

    /// Returns the number of explicitly subscribed product IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.product_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
