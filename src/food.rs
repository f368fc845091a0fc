use rand::Rng;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::SimError;
use crate::grid::{Grid, Position};

/// A single food item owned by one agent.
///
/// Created alongside the agent and replaced immediately after every
/// consumption; there is never more than one per agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Food {
    pub position: Position,
}

impl Food {
    /// Places food on a uniformly random cell not contained in `occupied`.
    ///
    /// Rejection sampling terminates almost surely as long as at least one
    /// cell is free; a fully occupied grid is reported as
    /// [`SimError::GridExhausted`] instead of looping forever.
    pub fn spawn<R: Rng>(
        grid: &Grid,
        occupied: &FxHashSet<Position>,
        rng: &mut R,
    ) -> Result<Self, SimError> {
        if occupied.len() >= grid.cell_count() {
            return Err(SimError::GridExhausted {
                height: grid.height,
                width: grid.width,
            });
        }

        loop {
            let position = Position::new(
                rng.gen_range(0..grid.height),
                rng.gen_range(0..grid.width),
            );
            if !occupied.contains(&position) {
                return Ok(Self { position });
            }
        }
    }
}
