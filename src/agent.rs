use std::collections::VecDeque;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::SimError;
use crate::food::Food;
use crate::grid::{Grid, Position};

/// Facing of a snake. `Idle` is the state before the first policy decision;
/// an idle snake does not move but stays alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
    Idle,
}

impl Direction {
    /// Row/column delta of one step, `None` for `Idle`.
    pub fn delta(self) -> Option<(i32, i32)> {
        match self {
            Direction::Up => Some((-1, 0)),
            Direction::Right => Some((0, 1)),
            Direction::Down => Some((1, 0)),
            Direction::Left => Some((0, -1)),
            Direction::Idle => None,
        }
    }

    /// True iff `self` and `other` are exact opposites. `Idle` opposes nothing.
    pub fn is_reverse_of(self, other: Direction) -> bool {
        matches!(
            (self, other),
            (Direction::Up, Direction::Down)
                | (Direction::Down, Direction::Up)
                | (Direction::Left, Direction::Right)
                | (Direction::Right, Direction::Left)
        )
    }
}

/// One simulated snake with its own body, food and fitness accumulator.
///
/// Agents never observe one another; each lives on a logically independent
/// grid instance, which is what makes per-agent parallel evaluation sound.
#[derive(Debug, Clone)]
pub struct SnakeAgent {
    /// Body segments, head first. Index 0 is the head, the back is the tail.
    pub body: VecDeque<Position>,
    pub direction: Direction,
    pub alive: bool,
    /// Food items consumed this generation.
    pub score: u32,
    /// Reward accumulator adjusted by the evaluation loop. The loop only
    /// ever adds deltas; resetting is the caller's job at generation start.
    pub fitness: f64,
    pub food: Food,
    rng: Xoshiro256PlusPlus,
}

impl SnakeAgent {
    /// Creates an idle three-segment snake at the grid center, with food
    /// already placed off the body.
    pub fn new(grid: &Grid, seed: u64) -> Result<Self, SimError> {
        let row = grid.height / 2;
        let col = grid.width / 2;
        let body = vec![
            Position::new(row, col),
            Position::new(row, col - 1),
            Position::new(row, col - 2),
        ];
        Self::with_body(grid, body, Direction::Idle, seed)
    }

    /// Creates a snake with an explicit starting body and facing.
    ///
    /// The body must be head-first, at least three segments, and free of
    /// duplicate positions.
    pub fn with_body(
        grid: &Grid,
        body: Vec<Position>,
        direction: Direction,
        seed: u64,
    ) -> Result<Self, SimError> {
        assert!(body.len() >= 3, "snake body must start with >= 3 segments");
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let occupied: FxHashSet<Position> = body.iter().copied().collect();
        let food = Food::spawn(grid, &occupied, &mut rng)?;
        Ok(Self {
            body: body.into(),
            direction,
            alive: true,
            score: 0,
            fitness: 0.0,
            food,
            rng,
        })
    }

    #[inline]
    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn body_contains(&self, pos: Position) -> bool {
        self.body.iter().any(|&segment| segment == pos)
    }

    fn occupied_cells(&self) -> FxHashSet<Position> {
        self.body.iter().copied().collect()
    }

    /// Applies a direction request, silently ignoring an exact reversal of
    /// the current facing (an instant self-collision otherwise).
    pub fn change_direction(&mut self, requested: Direction) {
        if !requested.is_reverse_of(self.direction) {
            self.direction = requested;
        }
    }

    /// Advances the snake one cell in its current direction.
    ///
    /// The candidate head is validated against grid bounds and the full
    /// pre-shift body. The tail cell counts as occupied even though it is
    /// about to vacate; a snake cannot step into its own tail on the same
    /// tick. An invalid candidate is the terminal transition: the agent
    /// dies and the body stays untouched.
    pub fn advance(&mut self, grid: &Grid) {
        if !self.alive {
            return;
        }
        let Some((dr, dc)) = self.direction.delta() else {
            return; // idle snakes hold position
        };
        let head = self.head();
        let candidate = Position::new(head.row + dr, head.col + dc);
        if !grid.contains(candidate) || self.body_contains(candidate) {
            self.alive = false;
            return;
        }
        self.body.push_front(candidate);
        self.body.pop_back();
    }

    /// True iff the head sits on this agent's food.
    pub fn eats_food(&self) -> bool {
        self.head() == self.food.position
    }

    /// Inserts a segment immediately before the tail, growing the body by
    /// one without moving the head or the tail this tick.
    pub fn grow(&mut self, position: Position) {
        let before_tail = self.body.len() - 1;
        self.body.insert(before_tail, position);
    }

    /// Books one food consumption: bumps the score, grows the body at the
    /// food cell and respawns food on a free cell.
    pub fn consume_food(&mut self, grid: &Grid) -> Result<(), SimError> {
        self.score += 1;
        let eaten = self.food.position;
        self.grow(eaten);
        let occupied = self.occupied_cells();
        self.food = Food::spawn(grid, &occupied, &mut self.rng)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(cells: &[(i32, i32)]) -> Vec<Position> {
        cells.iter().map(|&(r, c)| Position::new(r, c)).collect()
    }

    fn agent(cells: &[(i32, i32)], direction: Direction) -> SnakeAgent {
        SnakeAgent::with_body(&Grid::default(), positions(cells), direction, 42).unwrap()
    }

    #[test]
    fn advance_shifts_body_head_first() {
        let mut snake = agent(&[(5, 4), (5, 3), (5, 2)], Direction::Right);
        snake.advance(&Grid::default());
        assert!(snake.alive);
        assert_eq!(
            snake.body.iter().copied().collect::<Vec<_>>(),
            positions(&[(5, 5), (5, 4), (5, 3)])
        );
    }

    #[test]
    fn wall_hit_kills_without_touching_body() {
        let mut snake = agent(&[(0, 4), (0, 3), (0, 2)], Direction::Up);
        let before = snake.body.clone();
        snake.advance(&Grid::default());
        assert!(!snake.alive);
        assert_eq!(snake.body, before);
    }

    #[test]
    fn self_collision_kills_without_touching_body() {
        // Moving left runs the head straight into the neck segment.
        let mut snake = agent(&[(5, 5), (5, 4), (6, 4)], Direction::Left);
        let before = snake.body.clone();
        snake.advance(&Grid::default());
        assert!(!snake.alive);
        assert_eq!(snake.body, before);
    }

    #[test]
    fn tail_cell_counts_as_occupied() {
        // The tail at (6,5) is about to vacate, but stepping onto it on the
        // same tick is still fatal.
        let mut snake = agent(&[(5, 5), (5, 4), (6, 4), (6, 5)], Direction::Down);
        snake.advance(&Grid::default());
        assert!(!snake.alive);
    }

    #[test]
    fn reversal_request_is_ignored() {
        let mut snake = agent(&[(5, 4), (5, 3), (5, 2)], Direction::Right);
        snake.change_direction(Direction::Left);
        assert_eq!(snake.direction, Direction::Right);
        snake.change_direction(Direction::Up);
        assert_eq!(snake.direction, Direction::Up);
    }

    #[test]
    fn any_direction_is_accepted_from_idle() {
        let mut snake = agent(&[(5, 4), (5, 3), (5, 2)], Direction::Idle);
        snake.change_direction(Direction::Left);
        assert_eq!(snake.direction, Direction::Left);
    }

    #[test]
    fn idle_advance_is_a_no_op() {
        let mut snake = agent(&[(5, 4), (5, 3), (5, 2)], Direction::Idle);
        let before = snake.body.clone();
        snake.advance(&Grid::default());
        assert!(snake.alive);
        assert_eq!(snake.body, before);
    }

    #[test]
    fn grow_inserts_before_tail() {
        let mut snake = agent(&[(5, 5), (5, 4), (5, 3)], Direction::Right);
        snake.grow(Position::new(5, 5));
        assert_eq!(
            snake.body.iter().copied().collect::<Vec<_>>(),
            positions(&[(5, 5), (5, 4), (5, 5), (5, 3)])
        );
    }

    #[test]
    fn consume_food_respawns_off_the_body() {
        let grid = Grid::default();
        let mut snake = agent(&[(5, 5), (5, 4), (5, 3)], Direction::Right);
        snake.food.position = Position::new(5, 5);
        assert!(snake.eats_food());

        snake.consume_food(&grid).unwrap();
        assert_eq!(snake.score, 1);
        assert_eq!(snake.body.len(), 4);
        assert!(!snake.body_contains(snake.food.position));
    }
}
