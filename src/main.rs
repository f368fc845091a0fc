use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

use snake_evaluator::csv_export::{BufferedCsvExporter, GenerationRecord};
use snake_evaluator::{
    CancelToken, Generation, GenerationConfig, GenerationStats, Grid, LinearPolicy,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Grid height in cells
    #[arg(long, default_value_t = 15)]
    grid_height: i32,

    /// Grid width in cells
    #[arg(long, default_value_t = 15)]
    grid_width: i32,

    /// Number of agents per generation
    #[arg(short = 'p', long, default_value_t = 200)]
    population: usize,

    /// Number of generations to evaluate
    #[arg(short = 'g', long, default_value_t = 100)]
    generations: u32,

    /// Consecutive no-food ticks before a generation is cut off
    #[arg(long, default_value_t = 100)]
    stagnation_limit: u32,

    /// Advisory score cap reported to the caller
    #[arg(long, default_value_t = 50)]
    score_cap: u32,

    /// Optional hard tick limit per generation
    #[arg(long)]
    tick_limit: Option<u64>,

    /// Master RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of threads (0 = auto)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Output CSV file path
    #[arg(short = 's', long, default_value = "generations.csv")]
    output_csv: PathBuf,

    /// Optional JSON run summary path
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    generations: u32,
    population: usize,
    best_score_ever: u32,
    total_ticks: u64,
    wall_seconds: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    // Set thread pool size
    let threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()?;

    info!("Snake policy evaluator");
    info!(
        "Grid: {}x{} | population: {} | generations: {} | threads: {}",
        args.grid_height, args.grid_width, args.population, args.generations, threads
    );

    let grid = Grid::new(args.grid_height, args.grid_width);
    let config = GenerationConfig {
        stagnation_limit: args.stagnation_limit,
        score_cap: args.score_cap,
        tick_limit: args.tick_limit,
    };

    let mut stats = GenerationStats::new();
    let mut csv_exporter = BufferedCsvExporter::new(&args.output_csv, 50);
    let cancel = CancelToken::new();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(args.seed);

    // Progress bar
    let progress = ProgressBar::new(args.generations as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let mut total_ticks: u64 = 0;
    let mut total_sim_time = Duration::ZERO;
    let run_start = Instant::now();

    for gen_index in 0..args.generations {
        stats.begin_generation();

        // Stand-in for the external optimizer: a fresh random policy per
        // agent each generation. A real optimizer would evolve these.
        let members: Vec<(u64, LinearPolicy)> = (0..args.population as u64)
            .map(|id| (id, LinearPolicy::random(&mut rng)))
            .collect();

        let generation_seed = args.seed.wrapping_add(u64::from(gen_index) << 32);
        let mut generation = Generation::new(members, grid, config, generation_seed)?;

        let sim_start = Instant::now();
        let outcome = generation.run(&mut stats, None, Some(&cancel));
        total_sim_time += sim_start.elapsed();
        total_ticks += outcome.ticks;

        let report = generation.fitness_report();
        let max_fitness = report
            .iter()
            .map(|&(_, f)| f)
            .fold(f64::NEG_INFINITY, f64::max);
        let mean_fitness = if report.is_empty() {
            0.0
        } else {
            report.iter().map(|&(_, f)| f).sum::<f64>() / report.len() as f64
        };

        csv_exporter.add_record(GenerationRecord {
            generation: stats.generation_index,
            ticks: outcome.ticks,
            reason: outcome.reason.as_str(),
            best_score: stats.best_score_this_generation,
            best_score_ever: stats.best_score_ever,
            mean_fitness,
            max_fitness,
            survivors: generation.active_count(),
        })?;

        progress.set_position(u64::from(gen_index) + 1);
        progress.set_message(format!(
            "Best: {} | Ever: {} | Ticks: {}",
            stats.best_score_this_generation, stats.best_score_ever, outcome.ticks
        ));

        if gen_index % 10 == 0 && gen_index > 0 {
            info!(
                "Generation {} | best: {} | best ever: {} | mean fitness: {:.3} | {} ticks",
                stats.generation_index,
                stats.best_score_this_generation,
                stats.best_score_ever,
                mean_fitness,
                outcome.ticks
            );
        }
    }

    progress.finish_with_message("Evaluation complete");
    csv_exporter.finish()?;

    let wall = run_start.elapsed();
    if let Some(path) = &args.summary {
        let summary = RunSummary {
            generations: args.generations,
            population: args.population,
            best_score_ever: stats.best_score_ever,
            total_ticks,
            wall_seconds: wall.as_secs_f64(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        info!("Wrote run summary to {}", path.display());
    }

    println!("\n=== Run Summary ===");
    println!("Generations: {}", args.generations);
    println!("Total ticks: {}", total_ticks);
    println!("Best score ever: {}", stats.best_score_ever);
    println!("Simulation time: {:.2}s", total_sim_time.as_secs_f64());
    println!("Wall time: {:.2}s", wall.as_secs_f64());
    println!(
        "Ticks/second: {:.0}",
        total_ticks as f64 / total_sim_time.as_secs_f64().max(f64::EPSILON)
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_population_runs_to_completion() {
        let grid = Grid::default();
        let config = GenerationConfig {
            stagnation_limit: 20,
            ..GenerationConfig::default()
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let members: Vec<(u64, LinearPolicy)> =
            (0..8).map(|id| (id, LinearPolicy::random(&mut rng))).collect();

        let mut stats = GenerationStats::new();
        stats.begin_generation();
        let mut generation = Generation::new(members, grid, config, 1).unwrap();
        let outcome = generation.run(&mut stats, None, None);

        assert!(outcome.ticks > 0);
        assert_eq!(generation.fitness_report().len(), 8);
    }
}
