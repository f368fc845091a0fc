//! Per-generation evaluation engine for snake agents driven by pluggable
//! decision functions.
//!
//! The crate simulates many independent snakes in lockstep on same-shape
//! grids, scoring each one's survival and food gathering into a scalar
//! fitness. An external evolutionary optimizer supplies one [`Policy`] per
//! agent, runs a [`Generation`], and reads the fitness accumulators back.

pub mod agent;
pub mod csv_export;
pub mod error;
pub mod evaluate;
pub mod food;
pub mod grid;
pub mod policy;
pub mod sensor;

pub use agent::{Direction, SnakeAgent};
pub use error::SimError;
pub use evaluate::{
    CancelToken, Candidate, Generation, GenerationConfig, GenerationOutcome, GenerationStats,
    RenderSink, TerminationReason, TickSnapshot,
};
pub use food::Food;
pub use grid::{Grid, Position};
pub use policy::{LinearPolicy, Policy};
pub use sensor::{encode, Observation, OBSERVATION_LEN};
