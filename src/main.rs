//! Entry point for the `foldrun` batch CLI.

use std::process::ExitCode;

use foldrun::archive::mirror_for;
use foldrun::cli::{self, CliArgs, CliCommand};
use foldrun::config::{self, PipelineConfig};
use foldrun::logging;
use foldrun::pipeline::{Pipeline, write_report};
use foldrun::tools::{PredictCommand, SearchCommand, check_environment};
use foldrun::{app_dirs, work_unit};

const USAGE_STATUS: u8 = 2;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let exe = args.first().map(String::as_str).unwrap_or("foldrun");
    let cli_args = match cli::parse_args(args.get(1..).unwrap_or(&[])) {
        Ok(CliCommand::Run(cli_args)) => cli_args,
        Ok(CliCommand::Help) => {
            println!("{}", cli::help_text(exe));
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("error: {message}\n\n{}", cli::help_text(exe));
            return ExitCode::from(USAGE_STATUS);
        }
    };
    match try_main(&cli_args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every unit finished without failure.
fn try_main(cli_args: &CliArgs) -> Result<bool, String> {
    let settings = match &cli_args.config {
        Some(path) => config::load_required_settings_from(path),
        None => match app_dirs::default_config_path() {
            Some(path) => config::load_settings_from(&path),
            None => Ok(config::FileSettings::default()),
        },
    }
    .map_err(|err| err.to_string())?;
    let config = PipelineConfig::resolve(cli_args, settings).map_err(|err| err.to_string())?;

    if let Err(err) = logging::init(config.log_dir.as_deref()) {
        eprintln!("Logging to file disabled: {err}");
    }

    let problems = check_environment(&config);
    for problem in &problems {
        if config.dry_run {
            tracing::warn!("{problem}");
        } else {
            tracing::error!("{problem}");
        }
    }
    if !problems.is_empty() && !config.dry_run {
        return Err(format!(
            "{} environment problem(s); nothing was run",
            problems.len()
        ));
    }

    let mut units = work_unit::discover_units(&config.input).map_err(|err| err.to_string())?;
    tracing::info!(
        "Discovered {} unit(s) under {}; archive {}, scratch {}",
        units.len(),
        config.input.display(),
        config.archive_root.display(),
        config.scratch_root.display()
    );

    let search = SearchCommand::from_config(&config);
    let predict = PredictCommand::from_config(&config);
    let mirror = mirror_for(config.mirror);
    tracing::info!("Directories are archived with the {} mirror", config.mirror.as_str());
    let pipeline = Pipeline::new(&config, &search, &predict, mirror.as_ref());
    let report = pipeline.run(&mut units);

    for failed in report.failed_units() {
        eprintln!(
            "failed: {} ({})",
            failed.unit_id,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }
    if let Some(path) = &config.report_path {
        match write_report(&report, path) {
            Ok(()) => tracing::info!("Report written to {}", path.display()),
            Err(err) => tracing::error!("{err}"),
        }
    }
    Ok(report.is_success())
}
