use rand::Rng;

use crate::agent::Direction;
use crate::sensor::{Observation, OBSERVATION_LEN};

/// Number of direction scores a policy produces.
pub const ACTION_COUNT: usize = 4;

/// Direction per score slot, in tie-break order.
pub const ACTION_DIRECTIONS: [Direction; ACTION_COUNT] = [
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::Left,
];

/// The decision capability supplied per agent by the external optimizer.
///
/// Takes a 10-element observation, returns one score per direction in the
/// order up, right, down, left. `&mut self` admits stateful policies; the
/// core places no constraints on internal structure.
pub trait Policy: Send {
    fn decide(&mut self, observation: &Observation) -> [f64; ACTION_COUNT];
}

impl<F> Policy for F
where
    F: FnMut(&Observation) -> [f64; ACTION_COUNT] + Send,
{
    fn decide(&mut self, observation: &Observation) -> [f64; ACTION_COUNT] {
        self(observation)
    }
}

/// Picks the direction of the maximum score; ties go to the first index in
/// enumeration order (up, right, down, left).
pub fn select_direction(scores: &[f64; ACTION_COUNT]) -> Direction {
    let mut best = 0;
    for idx in 1..ACTION_COUNT {
        if scores[idx] > scores[best] {
            best = idx;
        }
    }
    ACTION_DIRECTIONS[best]
}

/// Single-layer policy with tanh activation, randomly initialized.
///
/// Stands in for optimizer-evolved networks in the demo binary and tests;
/// the evaluation core never depends on its structure.
#[derive(Debug, Clone)]
pub struct LinearPolicy {
    pub weights: [[f64; OBSERVATION_LEN]; ACTION_COUNT],
}

impl LinearPolicy {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut weights = [[0.0; OBSERVATION_LEN]; ACTION_COUNT];
        for row in weights.iter_mut() {
            for w in row.iter_mut() {
                *w = rng.gen_range(-1.0..1.0);
            }
        }
        Self { weights }
    }
}

impl Policy for LinearPolicy {
    fn decide(&mut self, observation: &Observation) -> [f64; ACTION_COUNT] {
        let mut scores = [0.0; ACTION_COUNT];
        for (score, row) in scores.iter_mut().zip(self.weights.iter()) {
            let sum: f64 = row
                .iter()
                .zip(observation.iter())
                .map(|(w, x)| w * x)
                .sum();
            *score = sum.tanh();
        }
        scores
    }
}
