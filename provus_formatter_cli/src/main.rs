//! # provus_formatter_cli
//!
//! Part of the provus_formatter crate family.
//!
//! Command line application which turns TEM, PEM, and MCG survey files into the Provus
//! waveform and channel sampling descriptors.
//!
//! ## Use
//!
//! Make a template configuration and fill it out
//!
//! ```bash
//! provus_formatter_cli -p config.yml new
//! ```
//!
//! then run the batch with
//!
//! ```bash
//! provus_formatter_cli -p config.yml
//! ```
//!
//! Detailed library logs are written to `./provus_formatter.log`.
use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use libprovus_formatter::batch_status::BatchStatus;
use libprovus_formatter::config::Config;
use libprovus_formatter::process::{process, BatchReport};

const LOG_FILE: &str = "./provus_formatter.log";
const PROGRESS_STEPS: u64 = 100;

fn make_template_config(path: &Path) {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config).unwrap();
    let mut file = File::create(path).expect("Could create template config file!");
    file.write_all(yaml_str.as_bytes())
        .expect("Failed to write yaml data to file!");
}

/// Send the library logs to a file so they don't fight with the progress bar
fn init_library_logging() {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(PathBuf::from(LOG_FILE))
            .formatter(Box::new(spdlog::formatter::PatternFormatter::new(
                spdlog::formatter::pattern!(
                    "[{date_short} {time_short}] - [thread: {tid}] - [{^{level}}] - {payload}{eol}"
                ),
            )))
            .truncate(true)
            .build()
            .expect("Could not create log file!"),
    );
    let logger = Arc::new(
        spdlog::Logger::builder()
            .flush_level_filter(spdlog::LevelFilter::All)
            .sink(file_sink)
            .build()
            .expect("Could not create library logger!"),
    );
    spdlog::set_default_logger(logger);
}

fn summarize(report: &BatchReport) {
    for (path, result) in report.files.iter() {
        match result {
            Ok(outcome) => {
                let waveform = outcome.waveform.as_ref().map_or("N/A", |w| &w.name);
                let sampling = outcome.sampling.as_ref().map_or("N/A", |s| &s.name);
                log::info!(
                    "{}: waveform {waveform}, sampling {sampling}",
                    path.to_string_lossy()
                );
                for warning in outcome.warnings.iter() {
                    log::warn!("{}: {warning}", path.to_string_lossy());
                }
            }
            Err(e) => log::error!("{}: {e}", path.to_string_lossy()),
        }
    }
    for (path, e) in report.header_failures.iter() {
        log::error!("Header of {} was not tagged: {e}", path.to_string_lossy());
    }
    match &report.project_file {
        Some(Ok(path)) => log::info!("Project file written to {}", path.to_string_lossy()),
        Some(Err(e)) => log::error!("Project file was not written: {e}"),
        None => (),
    }
    log::info!(
        "{} files succeeded, {} failed.",
        report.n_succeeded(),
        report.n_failed()
    );
}

fn main() {
    // Create a cli
    let matches = Command::new("provus_formatter_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Path to the file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");
    init_library_logging();

    // Parse the cli
    let config_path = PathBuf::from(matches.get_one::<String>("path").expect("We require args"));

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        make_template_config(&config_path);
        log::info!("Done.");
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Root Path: {}", config.root_path.to_string_lossy());
    if let Some(data_path) = &config.data_path {
        log::info!("Data Path: {}", data_path.to_string_lossy());
    }
    log::info!(
        "Explicit Files: {} MCG Files: {}",
        config.files.len(),
        config.mcg_files.len()
    );
    log::info!(
        "Update Headers: {} Update Project File: {}",
        config.update_headers,
        config.update_project_file
    );

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(PROGRESS_STEPS));
    let (tx, rx) = channel::<BatchStatus>();
    // Spawn the task!
    let handle = std::thread::spawn(|| process(config, tx));

    loop {
        match rx.recv_timeout(Duration::from_millis(250)) {
            Ok(status) => {
                pb.set_message(format!("{:?}", status.stage));
                pb.set_position((status.progress * PROGRESS_STEPS as f32) as u64);
            }
            Err(RecvTimeoutError::Timeout) => (),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    pb.finish();

    match handle.join() {
        Ok(result) => match result {
            Ok(report) => summarize(&report),
            Err(e) => log::error!("Formatting failed with error: {e}"),
        },
        Err(_) => log::error!("Failed to join formatting task!"),
    }

    log::info!("Done.");
}
