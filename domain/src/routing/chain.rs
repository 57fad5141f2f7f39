//! Fallback chain - the ordered strategies remaining to try.

use crate::evidence::chunk::StrategyKind;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ordered list of retrieval strategies remaining to try in one logical
/// pass of the routing state machine.
///
/// Only the routing decision step pops from the chain. Construction
/// de-duplicates, so a strategy already attempted in the pass can never
/// reappear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FallbackChain {
    remaining: VecDeque<StrategyKind>,
    attempted: Vec<StrategyKind>,
}

impl FallbackChain {
    /// Build a chain for a pass starting with `initial`. The backups are
    /// filtered against the initial strategy and de-duplicated in order.
    pub fn new(initial: StrategyKind, backups: &[StrategyKind]) -> Self {
        let mut remaining = VecDeque::new();
        for &kind in backups {
            if kind != initial && !remaining.contains(&kind) {
                remaining.push_back(kind);
            }
        }
        Self {
            remaining,
            attempted: vec![initial],
        }
    }

    /// Pop the next strategy to try, recording it as attempted.
    pub fn pop_next(&mut self) -> Option<StrategyKind> {
        let next = self.remaining.pop_front()?;
        self.attempted.push(next);
        Some(next)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn remaining(&self) -> impl Iterator<Item = StrategyKind> + '_ {
        self.remaining.iter().copied()
    }

    /// Strategies attempted so far in this pass, in order.
    pub fn attempted(&self) -> &[StrategyKind] {
        &self.attempted
    }

    pub fn has_attempted(&self, kind: StrategyKind) -> bool {
        self.attempted.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_order_is_construction_order() {
        let mut chain = FallbackChain::new(
            StrategyKind::Structured,
            &[StrategyKind::Hybrid, StrategyKind::Semantic],
        );
        assert_eq!(chain.pop_next(), Some(StrategyKind::Hybrid));
        assert_eq!(chain.pop_next(), Some(StrategyKind::Semantic));
        assert_eq!(chain.pop_next(), None);
        assert!(chain.is_exhausted());
    }

    #[test]
    fn test_never_contains_initial_strategy() {
        let chain = FallbackChain::new(
            StrategyKind::Semantic,
            &[StrategyKind::Semantic, StrategyKind::Hybrid],
        );
        assert_eq!(chain.remaining().count(), 1);
        assert!(chain.has_attempted(StrategyKind::Semantic));
    }

    #[test]
    fn test_duplicates_dropped() {
        let chain = FallbackChain::new(
            StrategyKind::Structured,
            &[
                StrategyKind::Hybrid,
                StrategyKind::Hybrid,
                StrategyKind::Semantic,
            ],
        );
        assert_eq!(chain.remaining().count(), 2);
    }

    #[test]
    fn test_attempted_grows_with_pops() {
        let mut chain = FallbackChain::new(StrategyKind::Hybrid, &[StrategyKind::Semantic]);
        assert_eq!(chain.attempted(), &[StrategyKind::Hybrid]);
        chain.pop_next();
        assert_eq!(
            chain.attempted(),
            &[StrategyKind::Hybrid, StrategyKind::Semantic]
        );
    }
}
