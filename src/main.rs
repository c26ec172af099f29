use anyhow::Result;
use log::{debug, info, trace};
use std::time::Instant;

use particle_life::config::{BoundaryMode, SimulationConfig};
use particle_life::universe::Universe;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Particle Life (CPU parallel)...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;
    let scenario = config.resolve_scenario()?;

    info!("Using {} Rayon threads.", rayon::current_num_threads());

    // --- Initialize Universe ---
    info!(
        "Initializing universe: {} species, {} particles, {}x{} world ({:?} boundary).",
        scenario.species,
        scenario.particles,
        config.universe.width,
        config.universe.height,
        config.universe.boundary
    );
    let mut universe = match config.run.seed {
        Some(seed) => Universe::with_seed(
            scenario.species,
            scenario.particles,
            config.universe.width,
            config.universe.height,
            seed,
        )?,
        None => Universe::new(
            scenario.species,
            scenario.particles,
            config.universe.width,
            config.universe.height,
        )?,
    };
    if config.universe.boundary == BoundaryMode::Bounce {
        universe.toggle_wrap();
    }
    universe.re_seed(&scenario.params)?;
    debug!("Scenario parameters: {:#?}", scenario.params);
    universe.log_params();

    // --- Simulation Loop ---
    let total_steps = config.run.steps;
    info!("Starting simulation loop for {} steps...", total_steps);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    for step in 0..total_steps {
        let step_start_time = Instant::now();
        universe.step();
        let step_duration = step_start_time.elapsed();

        // Print status periodically
        let current_time = Instant::now();
        let should_print_status = current_time
            .duration_since(previous_print_time)
            .as_secs_f64()
            >= config.run.status_interval_secs;
        let is_last_step = step + 1 == total_steps;

        if should_print_status || is_last_step {
            info!(
                "Step [{}/{}] | Particles: {} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                step + 1,
                total_steps,
                universe.particle_count(),
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = current_time;
        } else {
            trace!(
                "Step [{}/{}] completed in {:.2} ms",
                step + 1,
                total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds ({:.3} ms/step).",
        total_duration.as_secs_f64(),
        total_duration.as_secs_f64() * 1000.0 / total_steps.max(1) as f64
    );

    Ok(())
}
