//! Nodal - bias point solver for a divider-biased transistor stage.
//!
//! The stage is a voltage divider (`r1` to ground, `r2` to the supply)
//! driving the base, a collector resistor `rc` to the supply and an emitter
//! resistor `re` to ground.
//!
//! # Usage
//!
//! ```bash
//! nodal --supply 9 --polarity npn
//! RUST_LOG=debug nodal --supply 0 --sweep-to 9 --steps 18
//! ```

use clap::{Parser, ValueEnum};
use nodal_core::{
    circuit::{Circuit, Pin},
    components::Component,
    error::Result,
    SolverConfig,
};

/// Transistor polarity
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Polarity {
    Npn,
    Pnp,
}

/// Bias point solver for a divider-biased transistor stage
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Supply voltage in volts (negated for PNP)
    #[arg(short, long, default_value_t = 5.0)]
    supply: f64,

    /// Base to ground resistor in ohms
    #[arg(long, default_value_t = 1470.0)]
    r1: f64,

    /// Supply to base resistor in ohms
    #[arg(long, default_value_t = 16670.0)]
    r2: f64,

    /// Collector resistor in ohms
    #[arg(long, default_value_t = 1000.0)]
    rc: f64,

    /// Emitter resistor in ohms
    #[arg(long, default_value_t = 100.0)]
    re: f64,

    /// Transistor polarity
    #[arg(short, long, value_enum, default_value_t = Polarity::Npn)]
    polarity: Polarity,

    /// Newton-Raphson convergence tolerance
    #[arg(long, default_value_t = nodal_core::solver::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Maximum Newton-Raphson iterations per solve
    #[arg(long, default_value_t = nodal_core::solver::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Ramp the supply over this many increments when computing the first bias point
    #[arg(long, default_value_t = nodal_core::solver::DEFAULT_WARMUP_STEPS)]
    warmup_steps: usize,

    /// Sweep the supply from `--supply` to this voltage
    #[arg(long, value_name = "VOLTS")]
    sweep_to: Option<f64>,

    /// Number of sweep steps
    #[arg(long, default_value_t = 10)]
    steps: usize,
}

fn build_stage(args: &Args) -> Result<Circuit> {
    let config = SolverConfig::new()
        .with_tolerance(args.tolerance)
        .with_max_iterations(args.max_iterations)
        .with_warmup_steps(args.warmup_steps);

    let mut circuit = Circuit::with_config(3, 2, 0, config)?;
    circuit.set_static_node_names(vec!["gnd".into(), "vcc".into()])?;
    circuit.set_dynamic_node_names(vec!["base".into(), "collector".into(), "emitter".into()])?;

    let transistor = match args.polarity {
        Polarity::Npn => Component::npn(),
        Polarity::Pnp => Component::pnp(),
    };

    circuit.add_component(Component::resistor(args.r1)?, &[Pin::Static(0), Pin::Dynamic(0)])?;
    circuit.add_component(Component::resistor(args.r2)?, &[Pin::Dynamic(0), Pin::Static(1)])?;
    circuit.add_component(Component::resistor(args.rc)?, &[Pin::Static(1), Pin::Dynamic(1)])?;
    circuit.add_component(Component::resistor(args.re)?, &[Pin::Static(0), Pin::Dynamic(2)])?;
    circuit.add_component(transistor, &[Pin::Dynamic(0), Pin::Dynamic(1), Pin::Dynamic(2)])?;

    Ok(circuit)
}

fn supply_rail(args: &Args, volts: f64) -> [f64; 2] {
    match args.polarity {
        Polarity::Npn => [0.0, volts],
        Polarity::Pnp => [0.0, -volts],
    }
}

fn print_state(supply: f64, circuit: &Circuit, iterations: usize) {
    let state = circuit.dynamic_state();
    println!(
        "{:>10.4} {:>14.8} {:>14.8} {:>14.8} {:>6}",
        supply, state[0], state[1], state[2], iterations
    );
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut circuit = build_stage(&args)?;
    log::debug!("{}", circuit);

    circuit.set_static_state(&supply_rail(&args, args.supply))?;
    let report = circuit.setup()?;

    println!(
        "{:>10} {:>14} {:>14} {:>14} {:>6}",
        "supply", "base", "collector", "emitter", "iters"
    );
    print_state(args.supply, &circuit, report.iterations);

    // Stepped regime: each point starts from the previous solution
    if let Some(end) = args.sweep_to {
        let steps = args.steps.max(1);
        for k in 1..=steps {
            let supply = args.supply + (end - args.supply) * k as f64 / steps as f64;
            circuit.set_static_state(&supply_rail(&args, supply))?;
            let report = circuit.solve()?;
            print_state(supply, &circuit, report.iterations);
        }
    }

    Ok(())
}
