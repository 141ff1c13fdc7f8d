//! Move choice for the automated opponent.

use crate::engine::LegalMove;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Picks one move out of the legal set; `None` only for an empty set.
pub trait MoveSelector {
    fn select(&mut self, legal: &[LegalMove]) -> Option<LegalMove>;
}

impl<T: MoveSelector + ?Sized> MoveSelector for Box<T> {
    fn select(&mut self, legal: &[LegalMove]) -> Option<LegalMove> {
        (**self).select(legal)
    }
}

/// Uniformly random choice.
#[derive(Debug, Clone)]
pub struct RandomSelector {
    rng: StdRng,
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSelector {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible choices, for tests and `--seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl MoveSelector for RandomSelector {
    fn select(&mut self, legal: &[LegalMove]) -> Option<LegalMove> {
        legal.choose(&mut self.rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RulesEngine, StandardRules};

    #[test]
    fn test_empty_set_yields_none() {
        assert_eq!(RandomSelector::seeded(1).select(&[]), None);
    }

    #[test]
    fn test_choice_is_member_of_set() {
        let rules = StandardRules::new();
        let legal = rules.legal_moves(&rules.initial_position(), None);
        let mut selector = RandomSelector::seeded(7);
        for _ in 0..50 {
            let mv = selector.select(&legal).unwrap();
            assert!(legal.contains(&mv));
        }
    }

    #[test]
    fn test_same_seed_same_choices() {
        let rules = StandardRules::new();
        let legal = rules.legal_moves(&rules.initial_position(), None);
        let mut a = RandomSelector::seeded(42);
        let mut b = RandomSelector::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.select(&legal), b.select(&legal));
        }
    }

    #[test]
    fn test_boxed_selector() {
        let mut boxed: Box<dyn MoveSelector> = Box::new(RandomSelector::seeded(3));
        assert_eq!(boxed.select(&[]), None);
    }
}
