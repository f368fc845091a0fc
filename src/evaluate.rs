use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bitvec::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::agent::SnakeAgent;
use crate::error::SimError;
use crate::grid::{Grid, Position};
use crate::policy::{select_direction, Policy};
use crate::sensor;

/// Reward added per tick survived.
pub const SURVIVAL_REWARD: f64 = 0.1;
/// Reward added per food item consumed.
pub const FOOD_REWARD: f64 = 1.0;
/// Penalty applied when an agent dies by collision.
pub const DEATH_PENALTY: f64 = 1.0;
/// Penalty applied to every survivor when a generation stagnates out.
pub const STAGNATION_PENALTY: f64 = 1.0;

/// Resolved evaluation parameters for one generation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerationConfig {
    /// Consecutive ticks without any agent eating before the generation
    /// is cut off.
    pub stagnation_limit: u32,
    /// Advisory score threshold; reaching it is reported to the caller but
    /// removes no agent from the active set.
    pub score_cap: u32,
    /// Optional hard bound on ticks per generation. No penalty on expiry.
    pub tick_limit: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            stagnation_limit: 100,
            score_cap: 50,
            tick_limit: None,
        }
    }
}

/// Best-score bookkeeping across generations. Plain state passed by the
/// caller so independent evaluations never share counters.
#[derive(Debug, Default, Clone, Serialize)]
pub struct GenerationStats {
    pub generation_index: u32,
    pub best_score_this_generation: u32,
    pub best_score_ever: u32,
}

impl GenerationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to the next generation, resetting the per-generation best.
    pub fn begin_generation(&mut self) {
        self.generation_index += 1;
        self.best_score_this_generation = 0;
    }

    pub fn observe_score(&mut self, score: u32) {
        if score > self.best_score_this_generation {
            self.best_score_this_generation = score;
        }
        if score > self.best_score_ever {
            self.best_score_ever = score;
        }
    }
}

/// Cooperative cancellation flag, checked at tick granularity.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminationReason {
    /// No active agents remain.
    Extinct,
    /// Nobody ate for `stagnation_limit` consecutive ticks.
    Stagnation,
    /// The optional tick limit expired.
    TickLimit,
    /// A cancellation request arrived.
    Cancelled,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::Extinct => "extinct",
            TerminationReason::Stagnation => "stagnation",
            TerminationReason::TickLimit => "tick_limit",
            TerminationReason::Cancelled => "cancelled",
        }
    }
}

/// Summary of one finished generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub ticks: u64,
    pub reason: TerminationReason,
    /// True once any agent reached the advisory score cap.
    pub score_cap_reached: bool,
    /// Agents whose food placement ran out of free cells; their episodes
    /// ended early with fitness intact.
    pub exhausted_agents: Vec<u64>,
}

/// Read-only view of one agent for the renderer boundary.
#[derive(Debug, Clone, Serialize)]
pub struct AgentView {
    pub id: u64,
    pub body: Vec<Position>,
    pub food: Position,
    pub score: u32,
}

/// Read-only frame handed to an attached renderer after each tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub agents: Vec<AgentView>,
    pub best_score: u32,
}

/// Optional drawing component fed one snapshot per tick. The loop behaves
/// identically with no sink attached.
pub trait RenderSink {
    fn on_tick(&mut self, frame: &TickSnapshot);
}

/// One evaluated agent: an optimizer-supplied identifier and policy plus
/// the snake it controls. Fitness lives on the agent and is only ever
/// adjusted, never reset, while the generation runs.
pub struct Candidate<P> {
    pub id: u64,
    pub policy: P,
    pub agent: SnakeAgent,
}

/// Per-agent outcome of one tick, combined after the parallel fan-out.
struct TickEffect {
    idx: usize,
    ate: bool,
    died: bool,
    exhausted: bool,
}

/// One bounded evaluation episode over the full population.
///
/// Agents advance in lockstep; within a tick they are evaluated in
/// parallel, which is sound because agents share no state. Population-wide
/// flags (anyone ate, score cap) are combined after the whole tick, and
/// removals from the active set are applied post-tick so iteration never
/// skips an agent.
pub struct Generation<P> {
    pub grid: Grid,
    pub config: GenerationConfig,
    pub candidates: Vec<Candidate<P>>,
    pub active: BitVec,
    pub stagnation: u32,
    pub tick: u64,
    pub score_cap_reached: bool,
    exhausted: Vec<u64>,
}

impl<P: Policy> Generation<P> {
    /// Builds a generation from optimizer-supplied `(identifier, policy)`
    /// pairs, creating a fresh centered snake per pair. Each agent's RNG is
    /// derived from `seed` so runs are reproducible.
    pub fn new(
        members: Vec<(u64, P)>,
        grid: Grid,
        config: GenerationConfig,
        seed: u64,
    ) -> Result<Self, SimError> {
        let candidates = members
            .into_iter()
            .enumerate()
            .map(|(index, (id, policy))| {
                let agent_seed = seed.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
                Ok(Candidate {
                    id,
                    policy,
                    agent: SnakeAgent::new(&grid, agent_seed)?,
                })
            })
            .collect::<Result<Vec<_>, SimError>>()?;
        Ok(Self::with_candidates(candidates, grid, config))
    }

    /// Builds a generation from pre-constructed candidates, e.g. with
    /// custom starting bodies.
    pub fn with_candidates(
        candidates: Vec<Candidate<P>>,
        grid: Grid,
        config: GenerationConfig,
    ) -> Self {
        let active = bitvec![1; candidates.len()];
        Self {
            grid,
            config,
            candidates,
            active,
            stagnation: 0,
            tick: 0,
            score_cap_reached: false,
            exhausted: Vec::new(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.count_ones()
    }

    /// Per-agent fitness accumulators, for the optimizer boundary.
    pub fn fitness_report(&self) -> Vec<(u64, f64)> {
        self.candidates
            .iter()
            .map(|c| (c.id, c.agent.fitness))
            .collect()
    }

    /// Advances every active agent by one tick: encode, decide, steer,
    /// move, then apply the reward rule. Returns nothing; population flags
    /// and the active set are updated in place after the parallel section.
    pub fn step_tick(&mut self, stats: &mut GenerationStats) {
        let grid = self.grid;
        let active = &self.active;

        let effects: Vec<TickEffect> = self
            .candidates
            .par_iter_mut()
            .enumerate()
            .filter(|(idx, _)| active[*idx])
            .map(|(idx, candidate)| {
                let observation = sensor::encode(&candidate.agent, &grid);
                let scores = candidate.policy.decide(&observation);
                candidate.agent.change_direction(select_direction(&scores));
                candidate.agent.advance(&grid);

                if !candidate.agent.alive {
                    candidate.agent.fitness -= DEATH_PENALTY;
                    return TickEffect {
                        idx,
                        ate: false,
                        died: true,
                        exhausted: false,
                    };
                }

                candidate.agent.fitness += SURVIVAL_REWARD;
                let mut ate = false;
                let mut exhausted = false;
                if candidate.agent.eats_food() {
                    candidate.agent.fitness += FOOD_REWARD;
                    ate = true;
                    exhausted = candidate.agent.consume_food(&grid).is_err();
                }
                TickEffect {
                    idx,
                    ate,
                    died: false,
                    exhausted,
                }
            })
            .collect();

        // Reduction: removals and population flags are applied only after
        // every agent finished the tick, so results never depend on
        // iteration order.
        let mut anyone_ate = false;
        for effect in &effects {
            if effect.died {
                self.active.set(effect.idx, false);
            }
            if effect.exhausted {
                self.active.set(effect.idx, false);
                let id = self.candidates[effect.idx].id;
                warn!(agent = id, "grid exhausted during food respawn; finalizing agent");
                self.exhausted.push(id);
            }
            if effect.ate {
                anyone_ate = true;
            }
            let candidate = &self.candidates[effect.idx];
            stats.observe_score(candidate.agent.score);
            if candidate.agent.score >= self.config.score_cap {
                self.score_cap_reached = true;
            }
        }

        if anyone_ate {
            self.stagnation = 0;
        } else {
            self.stagnation += 1;
        }
        self.tick += 1;
    }

    /// Runs the generation to completion, leaving every candidate's
    /// fitness accumulator updated in place.
    pub fn run(
        &mut self,
        stats: &mut GenerationStats,
        mut sink: Option<&mut dyn RenderSink>,
        cancel: Option<&CancelToken>,
    ) -> GenerationOutcome {
        let reason = loop {
            if cancel.map_or(false, CancelToken::is_cancelled) {
                self.zero_active_fitness();
                break TerminationReason::Cancelled;
            }
            if !self.active.any() {
                break TerminationReason::Extinct;
            }
            if let Some(limit) = self.config.tick_limit {
                if self.tick >= limit {
                    break TerminationReason::TickLimit;
                }
            }

            self.step_tick(stats);

            if let Some(sink) = sink.as_mut() {
                let frame = self.snapshot(stats);
                sink.on_tick(&frame);
            }

            if !self.active.any() {
                break TerminationReason::Extinct;
            }
            if self.stagnation >= self.config.stagnation_limit {
                self.penalize_active(STAGNATION_PENALTY);
                break TerminationReason::Stagnation;
            }
        };

        debug!(
            generation = stats.generation_index,
            ticks = self.tick,
            reason = reason.as_str(),
            survivors = self.active_count(),
            best = stats.best_score_this_generation,
            "generation finished"
        );

        GenerationOutcome {
            ticks: self.tick,
            reason,
            score_cap_reached: self.score_cap_reached,
            exhausted_agents: self.exhausted.clone(),
        }
    }

    /// Read-only frame of all still-active agents.
    pub fn snapshot(&self, stats: &GenerationStats) -> TickSnapshot {
        let agents = self
            .active
            .iter_ones()
            .map(|idx| {
                let candidate = &self.candidates[idx];
                AgentView {
                    id: candidate.id,
                    body: candidate.agent.body.iter().copied().collect(),
                    food: candidate.agent.food.position,
                    score: candidate.agent.score,
                }
            })
            .collect();
        TickSnapshot {
            tick: self.tick,
            agents,
            best_score: stats.best_score_this_generation,
        }
    }

    fn penalize_active(&mut self, amount: f64) {
        let active = &self.active;
        for idx in active.iter_ones() {
            self.candidates[idx].agent.fitness -= amount;
        }
    }

    /// Cancellation finalizer: active agents leave with zero fitness,
    /// already-finished agents keep theirs.
    fn zero_active_fitness(&mut self) {
        let active = &self.active;
        for idx in active.iter_ones() {
            self.candidates[idx].agent.fitness = 0.0;
        }
    }
}
