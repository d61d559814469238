use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use rhea_idmap::app::{App, BuildRequest, LogSink};
use rhea_idmap::config::ConfigLoader;
use rhea_idmap::domain::EmissionMode;
use rhea_idmap::error::IdmapError;
use rhea_idmap::fetch::RheaHttpClient;
use rhea_idmap::output::{JsonOutput, OutputMode, print_summary};

#[derive(Parser)]
#[command(name = "rhea-idmap")]
#[command(about = "Build an interaction identifier-mapping database from Rhea cross-references")]
#[command(version, author)]
struct Cli {
    /// Path of the database to create (replaced if it exists)
    database: Utf8PathBuf,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    source_url: Option<String>,

    #[arg(long)]
    staging: Option<Utf8PathBuf>,

    /// Skip the download and load the file already staged
    #[arg(long)]
    offline: bool,

    #[arg(long, value_enum)]
    emit: Option<EmissionMode>,

    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        println!("Interaction database creation failed!");
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<IdmapError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &IdmapError) -> u8 {
    match error {
        IdmapError::ConfigRead(_)
        | IdmapError::ConfigParse(_)
        | IdmapError::InvalidEmissionMode(_)
        | IdmapError::UnsupportedUrl { .. }
        | IdmapError::StagedFileMissing(_)
        | IdmapError::MalformedLine { .. } => 2,
        IdmapError::SourceHttp(_) | IdmapError::SourceStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Summary
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(url) = cli.source_url {
        config.source_url = url;
    }
    if let Some(staging) = cli.staging {
        config.staging_path = staging;
    }
    if let Some(mode) = cli.emit {
        config.emission = mode;
    }

    let source = RheaHttpClient::new(&config.source_url)?;
    let app = App::new(source);
    let request = BuildRequest {
        database: cli.database,
        config,
        offline: cli.offline,
    };

    let result = app.build(&request, &LogSink)?;
    match output_mode {
        OutputMode::Json => JsonOutput::print_build(&result).into_diagnostic()?,
        OutputMode::Summary => print_summary(&result),
    }
    Ok(())
}
