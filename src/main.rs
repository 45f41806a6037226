use anyhow::Context;
use procbench::commands::{run_comparison, Cli};
use procbench::error::BenchError;
use procbench::report::platform_description;
use procbench::supervisor::WorkloadLauncher;
use procbench::utils::logger::init_logger;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(err) = init_logger(cli.log_level.as_deref(), cli.log_file.clone()) {
        eprintln!("Failed to initialize logging: {:#}", err);
        return ExitCode::from(1);
    }

    match main_impl(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<BenchError>() {
                Some(bench) => eprintln!(
                    "{} error: {}",
                    bench.category().display_name(),
                    bench.user_message()
                ),
                None => eprintln!("{:#}", err),
            }
            ExitCode::from(1)
        }
    }
}

async fn main_impl(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;
    let launcher = WorkloadLauncher::from_settings(cli.worker.as_deref(), &config.worker)?;

    println!("=== ORCHESTRATOR (subprocess + OS monitoring) ===");
    println!("Parent PID: {}", std::process::id());
    println!("Running on: {}", platform_description());
    println!("Worker: {}", launcher.program().display());

    let run = run_comparison(&config, launcher, &cli.output_dir, true)
        .await
        .context("comparison run failed")?;

    let saved: Vec<String> = run
        .artifacts
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    println!();
    println!("=== DONE ===");
    println!(
        "Parallel: {:?} sec | Sequential: {:?} sec | Speedup: {:?}x",
        run.concurrent.total_wall_time_sec, run.serial.total_wall_time_sec, run.report.speedup
    );
    println!("Saved: {}", saved.join(", "));
    Ok(())
}
