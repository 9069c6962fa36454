//! Per-file effect selection over the enabled subset of the catalog.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::effect::EffectKind;
use crate::error::{CoreError, EnumerationError};

/// How an effect is picked for each input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Uniform random, seeded from the OS.
    #[default]
    Random,
    /// Uniform random from a fixed seed; reproducible across runs.
    Seeded(u64),
    /// Cycle through the enabled effects in order.
    RoundRobin,
}

impl SelectionPolicy {
    /// Parse a policy name. `seed` turns `random` into [`Self::Seeded`].
    pub fn parse(name: &str, seed: Option<u64>) -> Result<Self, CoreError> {
        match (name.trim().to_ascii_lowercase().as_str(), seed) {
            ("random", None) => Ok(Self::Random),
            ("random", Some(seed)) => Ok(Self::Seeded(seed)),
            ("round_robin", _) => Ok(Self::RoundRobin),
            (other, _) => Err(CoreError::Validation(format!(
                "Invalid effect selection '{other}'. Must be one of: random, round_robin"
            ))),
        }
    }
}

/// Stateful chooser built from a policy and the enabled effects.
#[derive(Debug)]
pub struct EffectSelector {
    enabled: Vec<EffectKind>,
    state: SelectorState,
}

#[derive(Debug)]
enum SelectorState {
    Random(StdRng),
    RoundRobin { next: usize },
}

impl EffectSelector {
    /// Build a selector. Fails if `enabled` is empty.
    pub fn new(policy: SelectionPolicy, enabled: Vec<EffectKind>) -> Result<Self, EnumerationError> {
        if enabled.is_empty() {
            return Err(EnumerationError::NoEffectsEnabled);
        }
        let state = match policy {
            SelectionPolicy::Random => SelectorState::Random(StdRng::from_os_rng()),
            SelectionPolicy::Seeded(seed) => SelectorState::Random(StdRng::seed_from_u64(seed)),
            SelectionPolicy::RoundRobin => SelectorState::RoundRobin { next: 0 },
        };
        Ok(Self { enabled, state })
    }

    pub fn enabled(&self) -> &[EffectKind] {
        &self.enabled
    }

    /// Pick the effect for the next file.
    pub fn next_effect(&mut self) -> EffectKind {
        match &mut self.state {
            SelectorState::Random(rng) => self.enabled[rng.random_range(0..self.enabled.len())],
            SelectorState::RoundRobin { next } => {
                let kind = self.enabled[*next % self.enabled.len()];
                *next += 1;
                kind
            }
        }
    }
}
