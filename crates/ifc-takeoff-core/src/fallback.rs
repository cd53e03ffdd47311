// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Try-in-order combinator

/// Ordered strategies, the first one producing a value wins
pub struct FallbackChain<'a, T> {
    label: &'static str,
    strategies: Vec<(&'static str, Box<dyn Fn() -> Option<T> + 'a>)>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            strategies: Vec::new(),
        }
    }

    /// Append a named strategy
    pub fn then(mut self, name: &'static str, strategy: impl Fn() -> Option<T> + 'a) -> Self {
        self.strategies.push((name, Box::new(strategy)));
        self
    }

    /// Run strategies in order until one answers
    ///
    /// Later strategies are never evaluated once a value is found.
    pub fn resolve(&self) -> Option<T> {
        self.strategies.iter().find_map(|(name, strategy)| {
            let value = strategy();
            if value.is_some() {
                log::debug!("[Aggregate] {} resolved by {}", self.label, name);
            }
            value
        })
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
