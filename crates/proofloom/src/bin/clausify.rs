//! Command-line clausifier: reads a TPTP problem and prints one
//! TPTP-serialized clause per line.

use std::process::ExitCode;
use std::time::Duration;

use proofloom::{clausify, serialize_unit, ProofloomError, Session, SessionConfig};

fn usage(program: &str) {
    eprintln!("Usage: {} --mode clausify [options] <tptp_file>", program);
    eprintln!("\nOptions:");
    eprintln!("  --mode clausify        Required; only the clausify mode is supported");
    eprintln!("  --memory-limit <MB>    Abort when process memory exceeds the limit");
    eprintln!("  --random-seed <N>      Seed recorded for reproducibility (default 123456)");
    eprintln!("  --time-limit <secs>    Wall-clock budget");
}

fn parse_args(args: &[String]) -> Result<(SessionConfig, String), ProofloomError> {
    let mut config = SessionConfig::default();
    let mut mode: Option<String> = None;
    let mut input: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" => {
                i += 1;
                mode = args.get(i).cloned();
            }
            "--memory-limit" => {
                i += 1;
                let value = args
                    .get(i)
                    .and_then(|v| v.parse::<usize>().ok())
                    .ok_or_else(|| {
                        ProofloomError::User("--memory-limit expects a number of MB".to_string())
                    })?;
                config.memory_limit_mb = Some(value);
            }
            "--random-seed" => {
                i += 1;
                let value = args
                    .get(i)
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or_else(|| {
                        ProofloomError::User("--random-seed expects a number".to_string())
                    })?;
                config.random_seed = value;
            }
            "--time-limit" => {
                i += 1;
                let value = args
                    .get(i)
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or_else(|| {
                        ProofloomError::User("--time-limit expects a number of seconds".to_string())
                    })?;
                config.time_limit = Some(Duration::from_secs(value));
            }
            arg if arg.starts_with("--") => {
                return Err(ProofloomError::User(format!("unknown option: {}", arg)));
            }
            arg => {
                if input.is_some() {
                    return Err(ProofloomError::User(
                        "more than one input file given".to_string(),
                    ));
                }
                input = Some(arg.to_string());
            }
        }
        i += 1;
    }

    match mode.as_deref() {
        Some("clausify") => {}
        Some(other) => {
            return Err(ProofloomError::User(format!(
                "only the \"clausify\" mode is supported, got \"{}\"",
                other
            )))
        }
        None => {
            return Err(ProofloomError::User(
                "--mode clausify is required".to_string(),
            ))
        }
    }

    let input = input.ok_or_else(|| ProofloomError::User("no input file given".to_string()))?;
    Ok((config, input))
}

fn run(config: SessionConfig, input: &str) -> Result<(), ProofloomError> {
    let source = std::fs::read_to_string(input)?;
    let mut session = Session::new(config);
    let budget = session.budget();

    let result = match clausify(&mut session, &source, &budget) {
        Ok(result) => result,
        Err(err) => {
            // Domain and resource errors still report the statistics block
            session.snapshot_stats();
            eprintln!("{}", session.stats);
            return Err(err);
        }
    };
    for &unit in &result.units {
        println!(
            "{}",
            serialize_unit(&session.terms, &session.interner, &session.units, unit)
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args
        .first()
        .map(String::as_str)
        .unwrap_or("clausify")
        .to_string();

    let (config, input) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{}", err);
            usage(&program);
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    match run(config, &input) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.is_bug() {
                // A violated invariant is a programmer bug; mark it so
                // batch harnesses can tell it from bad input.
                eprintln!("spider fail: {}", err);
            } else {
                eprintln!("{}", err);
            }
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
