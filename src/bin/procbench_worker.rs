//! procbench-worker: trains once per repeat and prints one JSON result line
//!
//! Usage: procbench-worker '<config json>'

use procbench::core::models::WorkloadConfig;
use procbench::workload;
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(raw) = std::env::args().nth(1) else {
        eprintln!("Missing config JSON in argv");
        return ExitCode::from(1);
    };

    let config: WorkloadConfig = match serde_json::from_str(&raw) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Bad JSON config: {}", err);
            return ExitCode::from(2);
        }
    };

    let result = workload::run(&config);
    match serde_json::to_string(&result) {
        Ok(line) => {
            println!("{}", line);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Failed to encode result: {}", err);
            ExitCode::from(3)
        }
    }
}
