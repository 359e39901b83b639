use std::path::PathBuf;

use harvest_logging::{harvest_info, StageTimer};

use crate::detail::{DetailError, DetailSettings, RecordExtractor};
use crate::export::{
    write_identifiers, write_records, ExportError, DEFAULT_IDS_FILENAME, DEFAULT_RECORDS_FILENAME,
};
use crate::fetch::Fetcher;
use crate::index::{IdentifierCollector, IndexError, IndexSettings};
use crate::persist::AtomicFileWriter;
use crate::Identifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub output_dir: PathBuf,
    pub ids_filename: String,
    pub records_filename: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            ids_filename: DEFAULT_IDS_FILENAME.to_string(),
            records_filename: DEFAULT_RECORDS_FILENAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSettings {
    pub index: IndexSettings,
    pub detail: DetailSettings,
    pub output: OutputSettings,
}

/// Where the run gets its identifiers from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierSource {
    /// Walk the index and persist what it yields.
    Collect,
    /// Use a previously collected list as-is.
    Provided(Vec<Identifier>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub identifiers: usize,
    pub records: usize,
    pub skipped: Vec<Identifier>,
    /// `None` when identifiers were provided rather than collected.
    pub ids_path: Option<PathBuf>,
    pub records_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("identifier collection failed: {0}")]
    Index(#[from] IndexError),
    #[error("record extraction failed: {0}")]
    Detail(#[from] DetailError),
    #[error("writing output failed: {0}")]
    Export(#[from] ExportError),
}

/// Collect identifiers, extract one record each, then write the table.
///
/// Stages run one after another; the first error ends the run and no file is
/// written for the stage that failed.
pub struct Pipeline<'a> {
    fetcher: &'a dyn Fetcher,
    settings: PipelineSettings,
}

impl<'a> Pipeline<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, settings: PipelineSettings) -> Self {
        Self { fetcher, settings }
    }

    pub async fn run(self, source: IdentifierSource) -> Result<PipelineSummary, HarvestError> {
        let writer = AtomicFileWriter::new(self.settings.output.output_dir.clone());

        let (identifiers, ids_path) = match source {
            IdentifierSource::Collect => {
                let _timer = StageTimer::start("collect identifiers");
                let collector =
                    IdentifierCollector::initialize(self.fetcher, self.settings.index.clone())
                        .await?;
                let identifiers = collector.collect().await?;
                let path =
                    write_identifiers(&writer, &self.settings.output.ids_filename, &identifiers)?;
                harvest_info!("saved {} identifiers to {:?}", identifiers.len(), path);
                (identifiers, Some(path))
            }
            IdentifierSource::Provided(identifiers) => {
                harvest_info!("using {} provided identifiers", identifiers.len());
                (identifiers, None)
            }
        };

        let extracted = {
            let _timer = StageTimer::start("extract records");
            RecordExtractor::new(self.fetcher, self.settings.detail.clone())
                .collect(&identifiers)
                .await?
        };

        let records_path = {
            let _timer = StageTimer::start("save records");
            write_records(
                &writer,
                &self.settings.output.records_filename,
                &extracted.records,
            )?
        };
        harvest_info!(
            "saved {} records to {:?}",
            extracted.records.len(),
            records_path
        );

        Ok(PipelineSummary {
            identifiers: identifiers.len(),
            records: extracted.records.len(),
            skipped: extracted.skipped,
            ids_path,
            records_path,
        })
    }
}
