//! Demo session: drive the quality controller against a synthetic
//! frame load and print journal events as JSON lines.
//!
//! Usage: quality_session [--config FILE] [--ticks N] [--realtime]

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use flowbox_quality::ControllerConfig;
use flowbox_runtime::{Session, SyntheticLoad};

struct Args {
    config_path: Option<String>,
    ticks: u64,
    realtime: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config_path: None,
        ticks: 30,
        realtime: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                args.config_path = Some(
                    iter.next()
                        .ok_or_else(|| "--config requires a file path".to_string())?,
                );
            }
            "--ticks" => {
                let raw = iter
                    .next()
                    .ok_or_else(|| "--ticks requires a number".to_string())?;
                args.ticks = raw
                    .parse()
                    .map_err(|err| format!("invalid tick count {}: {}", raw, err))?;
            }
            "--realtime" => args.realtime = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(args)
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("quality_session: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let config = match &args.config_path {
        Some(path) => ControllerConfig::from_config_file(Path::new(path)),
        None => ControllerConfig::from_default_sources(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("quality_session: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let interval_ms = config.sample_interval_ms;
    let mut session = match Session::new(config, SyntheticLoad::spike_then_recover()) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("quality_session: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if args.realtime {
        session.run_for(Duration::from_millis(args.ticks * interval_ms));
    } else {
        session.run_ticks(args.ticks);
    }

    for event in session.drain_events() {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{}", line),
            Err(err) => eprintln!("quality_session: failed to encode event: {}", err),
        }
    }
    match serde_json::to_string(&session.metrics()) {
        Ok(line) => println!("{}", line),
        Err(err) => {
            eprintln!("quality_session: failed to encode metrics: {}", err);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
