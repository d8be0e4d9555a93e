//! Level streaming scenario runner
//!
//! Loads a scenario file, builds the streaming stack on top of an in-memory
//! loader and walks the scenario route, logging every trail.
//!
//! Run with: cargo run --bin level-sim -- crates/void_level_sim/scenarios/valley.toml
//!
//! `VOID_LEVELS_STRATEGY` and `VOID_LEVELS_DEPTH` override the scenario's
//! `[streaming]` section.

mod scenario;
mod sim;

use scenario::{Scenario, ScenarioError, ScenarioResult};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(path) = std::env::args().skip(1).find(|arg| !arg.starts_with("--")) else {
        eprintln!("usage: level-sim <scenario.toml>");
        std::process::exit(2);
    };

    match run_file(&path) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log::error!("Scenario {} failed: {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Run a scenario file. Returns whether every route step succeeded.
fn run_file(path: &str) -> ScenarioResult<bool> {
    let scenario = Scenario::load_from_file(path)?;
    log::info!("Strategy: {}", scenario.config.strategy());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ScenarioError::Runtime(e.to_string()))?;
    let summary = runtime.block_on(sim::run(&scenario))?;

    for trail in &summary.trails {
        match serde_json::to_string(trail) {
            Ok(json) => println!("{}", json),
            Err(e) => log::warn!("Could not encode trail for {}: {}", trail.level_id, e),
        }
    }

    let resident: Vec<&str> = summary.resident.iter().map(|id| id.as_str()).collect();
    log::info!("Resident at end of route: [{}]", resident.join(", "));
    log::info!(
        "{} of {} steps completed",
        summary.trails.len(),
        scenario.route.len()
    );

    Ok(summary.is_clean())
}
