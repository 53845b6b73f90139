use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use stepper_state::config::HostConfig;
use stepper_state::{
    ConfirmationRequest, ConfirmationResponder, JsonFileStore, NavigationOutcome, StepMetadata,
    Stepper, StepperState,
};

const LOG_TARGET_STARTUP: &str = "stepper_console::startup";

/// Initialize tracing with file rotation
///
/// Logs are written to `<config dir>/stepper-state/logs/`, rotated daily.
/// Debug builds also log to stderr so the prompt stays readable on stdout.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("stepper-state").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "stepper-console.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!(target: LOG_TARGET_STARTUP, "Log directory: {}", log_dir.display());
}

fn read_line() -> Result<Option<String>> {
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok((read > 0).then(|| line.trim().to_string()))
}

/// Ask on the terminal; anything but an explicit yes rejects
fn terminal_confirm(request: ConfirmationRequest, responder: ConfirmationResponder) {
    println!();
    println!("== {} ==", request.header.as_deref().unwrap_or("Confirmation"));
    println!("{}", request.message.as_deref().unwrap_or("Continue?"));
    print!(
        "[{} / {}] > ",
        request.accept_label.as_deref().unwrap_or("Yes"),
        request.reject_label.as_deref().unwrap_or("No")
    );
    if let Err(e) = io::stdout().flush() {
        tracing::warn!("Failed to flush confirmation prompt: {}", e);
    }

    match read_line() {
        Ok(Some(answer)) if matches!(answer.to_lowercase().as_str(), "y" | "yes") => {
            responder.accept()
        }
        Ok(_) => responder.reject(),
        Err(e) => {
            tracing::warn!("Confirmation prompt failed: {:#}", e);
            responder.reject();
        }
    }
}

fn build_stepper(config: &HostConfig) -> Result<Stepper> {
    let seed = StepperState {
        flows: config.flows.clone(),
        current_flow_key: Some(config.initial_flow.clone()),
        ..StepperState::default()
    };

    let store = JsonFileStore::in_config_dir().context("No config directory for stepper state")?;
    tracing::info!(target: LOG_TARGET_STARTUP, "State directory: {}", store.dir().display());

    let mut stepper = Stepper::builder(config.stepper_id.clone())
        .initial_state(seed)
        .global_config(config.global.clone())
        .store(store)
        .confirmation(terminal_confirm)
        .build()
        .context("Failed to create stepper")?;

    // The config file is authoritative for flow definitions
    if stepper.get_flows() != &config.flows {
        stepper.set_flows(config.flows.clone());
    }
    if stepper.current_flow().is_err() {
        stepper.set_current_flow(&config.initial_flow);
    }

    let flow = stepper.current_flow()?.to_vec();
    for (index, component) in flow.iter().enumerate() {
        if stepper.get_step_metadata(Some(index)).is_none() {
            let title = config.step_titles.get(index).unwrap_or(component);
            stepper.register_step(
                StepMetadata::new(title.clone()).with_component(component.clone()),
                Some(index),
            );
        }
    }

    Ok(stepper)
}

fn print_step(stepper: &Stepper) -> Result<()> {
    let flow = stepper.current_flow()?;
    let index = stepper.current_step_index();
    let title = stepper
        .get_step_metadata(None)
        .map(|step| step.title.as_str())
        .unwrap_or("");

    println!();
    println!(
        "Step {}/{}: {} [{}]{}",
        index + 1,
        flow.len(),
        title,
        stepper.current_step_component().unwrap_or("-"),
        if stepper.is_step_valid() { " ✓" } else { "" }
    );
    if let Some(data) = stepper.get_step_data(None) {
        println!("  data: {}", serde_json::Value::Object(data.clone()));
    }
    Ok(())
}

fn parse_assignment(input: &str) -> Option<(String, serde_json::Value)> {
    let (key, value) = input.split_once('=')?;
    let value = serde_json::from_str(value.trim())
        .unwrap_or_else(|_| serde_json::Value::String(value.trim().to_string()));
    Some((key.trim().to_string(), value))
}

fn run(stepper: &mut Stepper) -> Result<()> {
    println!("Commands: n(ext) p(rev) set key=value v(alidate) g(o) <n> r(eset) q(uit)");

    loop {
        print_step(stepper)?;
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = read_line()? else {
            return Ok(());
        };
        let (command, rest) = line.split_once(' ').unwrap_or((line.as_str(), ""));

        match command {
            "n" | "next" => {
                if !stepper.validate_step_data(None) {
                    println!("Step is incomplete, add data with `set key=value` first");
                    continue;
                }
                if stepper.go_to_next_step() == NavigationOutcome::Blocked {
                    let done = stepper.is_last_step()?
                        && stepper.all_steps_before_are_valid(stepper.current_flow()?.len());
                    println!("{}", if done { "All steps complete" } else { "Already at the last step" });
                }
            }
            "p" | "prev" => {
                if stepper.go_to_previous_step() == NavigationOutcome::Blocked {
                    println!("Already at the first step");
                }
            }
            "set" => match parse_assignment(rest) {
                Some((key, value)) => {
                    let mut data = stepper_state::StepData::new();
                    data.insert(key, value);
                    stepper.merge_step_data(data);
                }
                None => println!("Usage: set key=value"),
            },
            "v" | "validate" => {
                let valid = stepper.validate_step_data(None);
                println!("Step is {}", if valid { "valid" } else { "invalid" });
            }
            "g" | "go" => match rest.trim().parse::<usize>() {
                Ok(number) if number > 0 && stepper.all_steps_before_are_valid(number - 1) => {
                    if !stepper.set_current_step_index(number - 1)? {
                        println!("No step {}", number);
                    }
                }
                Ok(_) => println!("Complete the earlier steps first"),
                Err(_) => println!("Usage: g <step number>"),
            },
            "r" | "reset" => stepper.reset(),
            "q" | "quit" => return Ok(()),
            "" => {}
            other => println!("Unknown command: {}", other),
        }
    }
}

fn main() -> Result<()> {
    initialize_tracing();
    tracing::info!(target: LOG_TARGET_STARTUP, "Starting stepper-console v{}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("Usage: stepper-console <stepper.json>")?;

    let config = HostConfig::load(&path)?;
    let mut stepper = build_stepper(&config)?;

    run(&mut stepper)?;

    stepper.flush().context("Failed to save stepper state")?;
    tracing::info!("Stepper state saved under {}", stepper.storage_key());
    Ok(())
}
