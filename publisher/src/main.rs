//! Javadoc publisher CLI entrypoint.
//!
//! This binary publishes the Javadoc of a Maven group into a working copy of
//! a static-hosting branch and pushes the result.

use camino::Utf8PathBuf;
use clap::Parser;
use javadoc_publisher::cli::Cli;
use javadoc_publisher::config::{LoadedConfig, PublisherConfig, SystemConfigDirs};
use javadoc_publisher::decision::PublishDecision;
use javadoc_publisher::error::{PublishError, Result};
use javadoc_publisher::extraction::ZipExtractor;
use javadoc_publisher::git::RepositorySync;
use javadoc_publisher::output::{init_logging, report_summary, write_stderr_line};
use javadoc_publisher::pipeline::PublishPipeline;
use javadoc_publisher::process::SystemCommandExecutor;
use javadoc_publisher::registry::MavenCentral;
use log::{info, warn};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity, cli.quiet);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let remote_url = cli.remote_url()?;
    let LoadedConfig { config, source } =
        PublisherConfig::resolve(cli.config.as_deref(), &SystemConfigDirs)?;
    info!("Using configuration from {source}");
    report_config_overrides(cli, &config);

    let working_copy = absolute_directory(cli)?;
    let executor = SystemCommandExecutor::new(config.process.timeouts());
    let registry = MavenCentral::new(config.registry.settings());
    let sync = RepositorySync::new(&executor, working_copy, config.sync_settings(cli.dry_run));
    let decision = PublishDecision::new(cli.force || config.force);
    let pipeline = PublishPipeline::new(&registry, &ZipExtractor, &sync, decision);

    let summary = pipeline.publish_target(&remote_url, &cli.group_id, &cli.target())?;
    if !cli.quiet {
        report_summary(stderr, &summary, &cli.group_id, &remote_url);
    }
    Ok(())
}

/// Logs settings the configuration file switches on without a flag.
fn report_config_overrides(cli: &Cli, config: &PublisherConfig) {
    if config.force && !cli.force {
        warn!("force = true in configuration: up-to-date artifacts will be re-published");
    }
    if config.dry_run && !cli.dry_run {
        warn!("dry_run = true in configuration: nothing will be committed or pushed");
    }
}

/// Resolves the working copy against the current directory.
fn absolute_directory(cli: &Cli) -> Result<Utf8PathBuf> {
    let absolute = std::path::absolute(cli.directory.as_std_path()).map_err(|e| {
        PublishError::Usage {
            reason: format!("cannot resolve directory {}: {e}", cli.directory),
        }
    })?;
    Utf8PathBuf::try_from(absolute).map_err(|e| PublishError::Usage {
        reason: format!("directory is not valid UTF-8: {e}"),
    })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
