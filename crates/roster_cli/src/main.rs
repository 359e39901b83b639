//! `roster`: walk the roster index, fetch every detail page and write the table.
mod cli;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use harvest_logging::{harvest_error, harvest_info, LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;
use roster_engine::{
    read_identifiers, FetchSettings, IdentifierSource, MalformedPolicy, Pipeline,
    PipelineSettings, ReqwestFetcher,
};

use crate::cli::Cli;
use crate::config::FileConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    // Fetches are awaited one at a time on a single thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building async runtime")?;

    runtime.block_on(run(cli)).inspect_err(|err| {
        harvest_error!("run aborted: {:#}", err);
    })
}

async fn run(cli: Cli) -> Result<()> {
    let (settings, fetch) = settings_from(&cli)?;
    let source = match &cli.ids {
        Some(path) => IdentifierSource::Provided(
            read_identifiers(path).with_context(|| format!("loading identifiers from {}", path.display()))?,
        ),
        None => IdentifierSource::Collect,
    };

    harvest_info!("Started");
    let fetcher = ReqwestFetcher::new(fetch);
    let summary = Pipeline::new(&fetcher, settings).run(source).await?;

    harvest_info!(
        "Done: {} identifiers, {} records, {} skipped -> {}",
        summary.identifiers,
        summary.records,
        summary.skipped.len(),
        summary.records_path.display()
    );
    Ok(())
}

fn settings_from(cli: &Cli) -> Result<(PipelineSettings, FetchSettings)> {
    let mut settings = PipelineSettings::default();
    let mut fetch = FetchSettings::default();
    if let Some(path) = &cli.config {
        FileConfig::load(path)?.apply(&mut settings, &mut fetch);
    }
    // Flags win over the config file.
    if let Some(pages) = cli.pages {
        settings.index.page_count_override = Some(pages);
    }
    if let Some(dir) = &cli.output_dir {
        settings.output.output_dir = dir.clone();
    }
    if cli.skip_malformed {
        settings.detail.malformed_policy = MalformedPolicy::SkipAndLog;
    }
    Ok((settings, fetch))
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = if cli.log_file {
        LogDestination::Both(PathBuf::from(DEFAULT_LOG_FILE))
    } else {
        LogDestination::Terminal
    };
    harvest_logging::initialize(destination, level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("roster.ron");
        std::fs::write(&config, r#"(output_dir: Some("from-config"), records_per_page: Some(10))"#)
            .unwrap();

        let cli = Cli::parse_from([
            "roster",
            "--config",
            config.to_str().unwrap(),
            "--output-dir",
            "from-flag",
            "--pages",
            "4",
        ]);
        let (settings, _) = settings_from(&cli).unwrap();
        assert_eq!(settings.output.output_dir, PathBuf::from("from-flag"));
        assert_eq!(settings.index.records_per_page, 10);
        assert_eq!(settings.index.page_count_override, Some(4));
        assert_eq!(settings.detail.malformed_policy, MalformedPolicy::FailFast);
    }
}
