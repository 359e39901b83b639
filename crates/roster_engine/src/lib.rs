//! Roster engine: index walk, detail-page record reconstruction and output.
mod date;
mod decode;
mod detail;
mod document;
mod export;
mod fetch;
mod index;
mod persist;
mod pipeline;
mod record;
mod types;

pub use date::is_date;
pub use decode::decode_page;
pub use detail::{
    clean_rows, pair_tokens, DetailError, DetailSettings, ExtractedRecords, MalformedDetailPage,
    MalformedPolicy, RecordExtractor, DEFAULT_DETAIL_URL, DEFAULT_ID_PARAM,
};
pub use document::{fetch_document, Document, DocumentError, QueryError};
pub use export::{
    read_identifiers, render_records_csv, table_columns, write_identifiers, write_records,
    ExportError, DEFAULT_IDS_FILENAME, DEFAULT_RECORDS_FILENAME, MISSING_FIELD,
};
pub use fetch::{build_url, FetchSettings, Fetcher, ReqwestFetcher};
pub use index::{
    identifier_from_href, page_count_for, pages_walked, parse_record_counter, IdentifierCollector,
    IndexError, IndexFormatError, IndexSettings, DEFAULT_INDEX_TEMPLATE, DEFAULT_RECORDS_PER_PAGE,
    IDENTIFIER_LEN, OFFSET_PLACEHOLDER,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use pipeline::{
    HarvestError, IdentifierSource, OutputSettings, Pipeline, PipelineSettings, PipelineSummary,
};
pub use record::Record;
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, Identifier};
