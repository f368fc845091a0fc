use crate::agent::SnakeAgent;
use crate::grid::{Grid, Position};

/// Length of the observation vector handed to policies.
pub const OBSERVATION_LEN: usize = 10;

/// Fixed-size sensory reading: signed food displacement plus the eight
/// cells around the head.
pub type Observation = [f64; OBSERVATION_LEN];

/// Neighborhood probe order around the head, row-major, center excluded.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), // up-left
    (-1, 0),  // up
    (-1, 1),  // up-right
    (0, -1),  // mid-left
    (0, 1),   // mid-right
    (1, -1),  // down-left
    (1, 0),   // down
    (1, 1),   // down-right
];

/// Encodes an agent's local surroundings into a fixed 10-element vector.
///
/// Elements 0 and 1 are the signed row/column displacement from head to
/// food. Elements 2..=9 rate each neighbor cell by fixed precedence: own
/// body reads -1, else food reads +1, else a wall reads -1, else 0. Body
/// dominates food, so a segment sitting on the food cell still reads -1.
pub fn encode(agent: &SnakeAgent, grid: &Grid) -> Observation {
    let head = agent.head();
    let food = agent.food.position;

    let mut observation = [0.0; OBSERVATION_LEN];
    observation[0] = f64::from(food.row - head.row);
    observation[1] = f64::from(food.col - head.col);

    for (slot, &(dr, dc)) in NEIGHBOR_OFFSETS.iter().enumerate() {
        let cell = Position::new(head.row + dr, head.col + dc);
        observation[2 + slot] = if agent.body_contains(cell) {
            -1.0
        } else if cell == food {
            1.0
        } else if !grid.contains(cell) {
            -1.0
        } else {
            0.0
        };
    }

    observation
}
