// Singleton Pattern: four construction guards side by side.
//
// Each strategy gets its own registry, then N callers ask for the instance at
// the same moment. The correct strategies print "Count: 1" on every line;
// the unsynchronized one usually does not.
//
// Run with: cargo run --bin singleton_demo [-- config.toml]

use colored::Colorize;
use singleton_catalog::{
    logger, resource, run_concurrent_with, CancelHandle, ConstructionDelay, DemoConfig,
    OutputFormat, Registry, Resource, RunReport, SingletonError, Strategy,
};
use std::path::Path;
use std::process;
use tracing::info;

fn load_config() -> Result<DemoConfig, singleton_catalog::ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => DemoConfig::from_file(Path::new(&path)),
        None => Ok(DemoConfig::default()),
    }
}

fn run_strategy(strategy: Strategy, config: &DemoConfig) -> Result<RunReport, SingletonError> {
    let cancel = CancelHandle::new();
    let delay = ConstructionDelay::new(config.delay(), cancel.token());

    // Composition root: the registry (and, for eager, the instance) exists
    // before any caller thread does.
    let registry = Registry::builder()
        .register::<Resource>(strategy, resource::constructor(strategy, delay))?
        .build();
    let provider = registry.provider::<Resource>()?;

    // Without a timer the handle must stay alive until the run is over,
    // dropping it would cancel the delay straight away.
    let (timer, _idle_handle) = match config.cancel_after() {
        Some(after) => (Some(cancel.cancel_after(after)), None),
        None => (None, Some(cancel)),
    };

    let quiet = config.output == OutputFormat::Json;
    let report = run_concurrent_with(&provider, config.callers, |observation, instance| {
        if !quiet {
            println!("  {}", instance.greeting(observation.creation_count));
        }
    });

    if let Some(timer) = timer {
        if timer.disarm() {
            info!("{} run was cancelled", strategy);
        }
    }

    Ok(report)
}

fn print_summary(report: &RunReport) {
    for observation in &report.observations {
        if let Some(err) = &observation.error {
            println!("  caller {}: {}", observation.caller, err.as_str().red());
        }
    }

    let verdict = if report.is_single_instance() {
        "single instance".green().bold()
    } else if report.strategy.is_thread_safe() {
        "UNEXPECTED".red().bold()
    } else {
        "race observed".yellow().bold()
    };

    println!(
        "  creation count: {}, distinct instances: {}, state: {}, wall time: {:.0}ms -> {}",
        report.creation_count,
        report.distinct_instances,
        report.final_state,
        report.total_elapsed_ms,
        verdict
    );
}

fn main() {
    if let Err(err) = logger::init() {
        eprintln!("failed to install logger: {}", err);
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            process::exit(2);
        }
    };

    let mut reports = Vec::with_capacity(config.strategies.len());

    for &strategy in &config.strategies {
        if config.output == OutputFormat::Text {
            println!("=== {} Singleton ({}) ===", strategy.label(), strategy);
        }

        match run_strategy(strategy, &config) {
            Ok(report) => {
                if config.output == OutputFormat::Text {
                    print_summary(&report);
                    println!();
                }
                reports.push(report);
            }
            Err(err) => {
                eprintln!("{} {}: {}", "error:".red().bold(), strategy, err);
                process::exit(1);
            }
        }
    }

    match config.output {
        OutputFormat::Json => match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("{} {}", "error:".red().bold(), err);
                process::exit(1);
            }
        },
        OutputFormat::Text => {
            println!("=== Key Points ===");
            println!("1. Unsynchronized check-then-create lets several callers construct");
            println!("2. A mutex around the whole accessor is correct but serializes every call");
            println!("3. Double-checked locking needs Acquire/Release publication of the instance");
            println!("4. Eager construction in main avoids the race entirely");
        }
    }
}
