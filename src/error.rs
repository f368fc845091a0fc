use thiserror::Error;

/// Failure modes of the simulation core.
///
/// Agent death, stagnation and the score cap are ordinary data-driven
/// branches, not errors; the only genuine failure is a grid with no free
/// cell left for food placement.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Food placement could not find an unoccupied cell.
    #[error("grid exhausted: no free cell for food placement on {height}x{width} grid")]
    GridExhausted { height: i32, width: i32 },
}
