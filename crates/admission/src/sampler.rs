//! Probabilistic sampling of low-value categories

use beacon_config::SamplingConfig;
use beacon_types::{Category, Level};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Keeps events of configured categories with a fixed probability.
///
/// Each decision is an independent draw; earlier decisions never influence
/// later ones. Urgent levels are always kept.
#[derive(Debug)]
pub struct Sampler {
    rates: HashMap<String, f64>,
    rng: StdRng,
}

impl Sampler {
    #[must_use]
    pub fn new(config: &SamplingConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rates: config
                .rates
                .iter()
                .map(|(category, rate)| (category.clone(), sanitize_rate(*rate)))
                .collect(),
            rng,
        }
    }

    /// Keep probability for a category; unlisted categories are kept.
    #[must_use]
    pub fn rate_for(&self, category: &Category) -> f64 {
        self.rates.get(category.as_str()).copied().unwrap_or(1.0)
    }

    /// Decide whether to keep an event.
    pub fn keep(&mut self, category: &Category, level: Level) -> bool {
        if level.is_urgent() {
            return true;
        }
        let rate = self.rate_for(category);
        if rate >= 1.0 {
            true
        } else if rate <= 0.0 {
            false
        } else {
            self.rng.random_bool(rate)
        }
    }
}

/// Clamp into `[0, 1]`. Non-finite rates disable sampling for the category.
fn sanitize_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        tracing::warn!(rate, "ignoring non-finite sample rate");
        1.0
    }
}
