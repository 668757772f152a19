mod cli;
mod controls;
mod runner;
mod settings;

use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::mpsc;

use clap::Parser;
use mirror_core::RunResultKind;
use mirror_logging::mirror_error;

use cli::Cli;
use runner::{RunOutcome, Runner};
use settings::{load_settings, save_settings, MirrorSettings};

const LOG_FILE: &str = "./mirror.log";

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            mirror_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => MirrorSettings::default(),
    };
    cli.apply_to(&mut settings);
    mirror_logging::initialize(settings.log.into(), cli.log_level(), Path::new(LOG_FILE));

    if let Some(path) = &cli.save_settings {
        save_settings(path, &settings)?;
    }
    let config = settings.to_config()?;

    let (msg_tx, msg_rx) = mpsc::channel();
    controls::spawn_ctrl_c(msg_tx.clone());
    controls::spawn_console(msg_tx);

    let outcome = Runner::new(config, io::stdout()).run(&msg_rx);
    Ok(report(&outcome))
}

fn report(outcome: &RunOutcome) -> ExitCode {
    match &outcome.result {
        RunResultKind::Completed(summary) => {
            println!(
                "Mirrored {} pages and {} resources ({} failed, {} errors)",
                summary.pages_written,
                summary.resources_downloaded,
                summary.resources_failed,
                summary.errors
            );
            if let Some(dir) = &outcome.output_dir {
                println!("Open {}", dir.join("index.html").display());
            }
            ExitCode::SUCCESS
        }
        RunResultKind::Cancelled => {
            println!("Cancelled; partial output removed");
            ExitCode::from(130)
        }
        RunResultKind::Failed(message) => {
            eprintln!("Mirror failed: {message}");
            ExitCode::FAILURE
        }
    }
}
