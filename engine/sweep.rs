use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Order in which sources are visited, reshuffled once per iteration.
///
/// Owns its generator so concurrent optimizations never share random state.
pub struct SweepOrder {
    rng: StdRng,
    order: Vec<usize>,
}

impl SweepOrder {
    /// Seeded generators reproduce the same sequence of orders; `None` draws
    /// a seed from the operating system.
    pub fn new(n_sources: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            order: (0..n_sources).collect(),
        }
    }

    /// Shuffles and returns the order for the next iteration.
    pub fn next_order(&mut self) -> &[usize] {
        self.order.shuffle(&mut self.rng);
        &self.order
    }
}
