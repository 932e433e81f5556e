//! Placeholder data sources for charts and scores that have no analytics
//! pipeline behind them yet. All randomness flows through [`MockDataSource`]
//! so that scoring stays pure and tests can pin every draw.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Yields uniformly distributed samples in `[0, 1)`.
pub trait MockDataSource {
    fn sample(&mut self) -> f64;
}

impl MockDataSource for StdRng {
    fn sample(&mut self) -> f64 {
        rand::Rng::gen::<f64>(self)
    }
}

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn from_entropy() -> StdRng {
    StdRng::from_entropy()
}

/// Picks a seeded source when a seed is configured, otherwise an unseeded one.
pub fn source_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => seeded(seed),
        None => from_entropy(),
    }
}

/// Draw used as the retention input of the health score.
pub fn retention_sample(source: &mut impl MockDataSource) -> f64 {
    source.sample()
}

/// Replays a fixed list of samples, cycling when exhausted.
#[cfg(test)]
pub struct Scripted {
    values: Vec<f64>,
    next: usize,
}

#[cfg(test)]
impl Scripted {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, next: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

#[cfg(test)]
impl MockDataSource for Scripted {
    fn sample(&mut self) -> f64 {
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value
    }
}
