//! Generate a scenario, run both filters and print the performance report
//!
//! ```text
//! cargo run -p trackfuse-sim --example fusion_report -- [config.json] [sensor_data.json]
//! ```
//!
//! The optional first argument is an experiment configuration; the optional
//! second is where to save the generated sensor log.

use std::env;

use trackfuse_sim::{generate, report, ExperimentConfig, SimResult};

fn main() -> SimResult<()> {
    let mut args = env::args().skip(1);

    let config = match args.next() {
        Some(path) => ExperimentConfig::from_json_file(path)?,
        None => ExperimentConfig::default(),
    };

    let data = generate(&config.scenario)?;
    if let Some(path) = args.next() {
        data.save(&path)?;
        println!("Sensor log written to {path}");
    }

    let outcome = trackfuse_sim::evaluate(&config, data)?;
    println!("{}", report::render(&outcome));

    if let Some(maneuver) = &outcome.maneuver {
        let verdict = if maneuver.adaptive_no_worse() {
            "adaptive tracked the maneuver at least as well"
        } else {
            "standard tracked the maneuver better"
        };
        println!("Maneuver verdict: {verdict}");
    }
    Ok(())
}
