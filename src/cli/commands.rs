//! Command dispatch

use std::io::{self, Write};
use std::path::PathBuf;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::{AnnotationRequest, Outcome};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Config { command }) => execute_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => execute_annotate(cli),
    }
}

/// Build the request for an annotation run from the flags.
pub fn annotation_request(cli: &Cli) -> CliResult<AnnotationRequest> {
    let action = cli.action.ok_or_else(|| {
        CliError::Usage(
            "please specify action as one of 'post', 'update', or 'delete' (--action)".into(),
        )
    })?;
    let source = cli
        .source
        .clone()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| CliError::Usage("please specify --source (object id or csv file)".into()))?;

    Ok(AnnotationRequest {
        action,
        source,
        group_ids: cli.group_ids.clone(),
        origin: cli.origin.clone(),
        key: cli.key.clone(),
        value: cli.value.clone(),
    })
}

/// Effective settings: config layers, then CLI overrides.
pub fn resolve_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config_file.as_deref())?;
    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(token) = &cli.token {
        settings.token = Some(token.clone());
    }
    Ok(settings)
}

#[instrument(skip(cli))]
fn execute_annotate(cli: &Cli) -> CliResult<()> {
    let request = annotation_request(cli)?;
    let settings = resolve_settings(cli)?;
    let token = settings
        .token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            CliError::Usage("please specify --token (or set FRITZ_ANNOTATE_TOKEN)".into())
        })?;
    debug!("base_url={} request={:?}", settings.base_url, request);

    let container = ServiceContainer::new(settings, &token);
    let report = container
        .annotation_service()
        .run_with(&request, print_outcome)?;

    if report.failed() > 0 && !report.is_rejected() {
        output::warning(&format!(
            "{} of {} annotation call(s) failed",
            report.failed(),
            report.outcomes.len()
        ));
    }
    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    let stdout = io::stdout();
    if let Err(e) = write_outcome(&mut stdout.lock(), outcome) {
        debug!("cannot write outcome: {}", e);
    }
}

/// One line per outcome; diagnostics included, all on the report stream.
pub fn write_outcome(out: &mut impl Write, outcome: &Outcome) -> io::Result<()> {
    match outcome {
        Outcome::Rejected { .. } => output::write_error_line(out, outcome),
        Outcome::NoMatch { .. } => writeln!(out, "{}", outcome),
        o if o.is_success() => output::write_success(out, o),
        o => output::write_failure(out, o),
    }
}

fn execute_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = resolve_settings(cli)?;
            output::info(&settings.redacted().to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let path = config_target(cli)?;
            let state = if path.exists() { "" } else { " (not found)" };
            output::info(&format!("{}{}", path.display(), state));
            Ok(())
        }
        ConfigCommands::Init => init_config(&RealFileSystem, &config_target(cli)?),
    }
}

fn config_target(cli: &Cli) -> CliResult<PathBuf> {
    cli.config_file
        .clone()
        .or_else(global_config_path)
        .ok_or_else(|| {
            CliError::Usage("cannot determine config directory; use --config-file".into())
        })
}

/// Write the settings template to `path`, refusing to overwrite.
pub fn init_config(fs: &dyn FileSystem, path: &std::path::Path) -> CliResult<()> {
    if fs.exists(path) {
        return Err(CliError::Usage(format!(
            "config already exists: {}",
            path.display()
        )));
    }
    fs.ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create directory for {}", path.display()), e))?;
    fs.write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    output::action("Created", &path.display());
    Ok(())
}
