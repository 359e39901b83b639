//! Paginated roster index: record counter and identifier walk.

use harvest_logging::{harvest_debug, harvest_info};

use crate::document::{fetch_document, Document, DocumentError, QueryError};
use crate::fetch::Fetcher;
use crate::Identifier;

pub const OFFSET_PLACEHOLDER: &str = "{offset}";
pub const DEFAULT_INDEX_TEMPLATE: &str = "https://appext20.dos.ny.gov/lcns_public/roster_cursor?p_record_id=11000080984&p_display_start={offset}&";
pub const DEFAULT_RECORDS_PER_PAGE: usize = 25;
pub const IDENTIFIER_LEN: usize = 9;

const COUNTER_SELECTOR: &str = "font.large_bold";
// `headers` is a space-separated list of header ids.
const IDENTIFIER_CELL_SELECTOR: &str = r#"[headers~="id"]"#;
const LINK_SELECTOR: &str = "a";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    /// Index page URL with `{offset}` standing for the 0-based page offset.
    pub url_template: String,
    pub records_per_page: usize,
    /// Skips the derived page count when set.
    pub page_count_override: Option<usize>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_INDEX_TEMPLATE.to_string(),
            records_per_page: DEFAULT_RECORDS_PER_PAGE,
            page_count_override: None,
        }
    }
}

impl IndexSettings {
    pub fn page_url(&self, offset: usize) -> String {
        self.url_template
            .replace(OFFSET_PLACEHOLDER, &offset.to_string())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IndexFormatError {
    #[error("index URL template `{template}` has no {{offset}} placeholder")]
    MissingOffsetPlaceholder { template: String },
    #[error("record counter element missing from {url}")]
    MissingCounter { url: String },
    #[error("record counter `{text}` does not hold a record count")]
    UnparsableCounter { text: String },
    #[error("records per page must be positive")]
    ZeroRecordsPerPage,
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Format(#[from] IndexFormatError),
}

/// Walks the roster index once its size is known.
pub struct IdentifierCollector<'a> {
    fetcher: &'a dyn Fetcher,
    settings: IndexSettings,
    total_records: usize,
    page_count: usize,
}

impl<'a> IdentifierCollector<'a> {
    /// Reads the record counter from page 0 and derives the page count unless
    /// one was supplied.
    pub async fn initialize(
        fetcher: &'a dyn Fetcher,
        settings: IndexSettings,
    ) -> Result<Self, IndexError> {
        if !settings.url_template.contains(OFFSET_PLACEHOLDER) {
            return Err(IndexFormatError::MissingOffsetPlaceholder {
                template: settings.url_template,
            }
            .into());
        }
        if settings.records_per_page == 0 {
            return Err(IndexFormatError::ZeroRecordsPerPage.into());
        }
        let first_page = fetch_document(fetcher, &settings.page_url(0), &[]).await?;
        let total_records = read_record_counter(&first_page)?;
        let page_count = settings
            .page_count_override
            .unwrap_or_else(|| page_count_for(total_records, settings.records_per_page));
        harvest_info!(
            "index reports {} records; walking {} pages of {}",
            total_records,
            pages_walked(page_count),
            settings.records_per_page
        );
        Ok(Self {
            fetcher,
            settings,
            total_records,
            page_count,
        })
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Identifiers from offsets `0..=page_count`, in page then element order.
    ///
    /// The walk deliberately visits one page past the derived count. Nothing is
    /// deduplicated.
    pub async fn collect(&self) -> Result<Vec<Identifier>, IndexError> {
        let mut identifiers = Vec::new();
        for offset in 0..=self.page_count {
            let page = fetch_document(self.fetcher, &self.settings.page_url(offset), &[]).await?;
            let found = page_identifiers(&page)?;
            harvest_debug!("index page {} yielded {} identifiers", offset, found.len());
            identifiers.extend(found);
        }
        harvest_info!("collected {} identifiers", identifiers.len());
        Ok(identifiers)
    }
}

/// `ceil(total_records / records_per_page)`.
pub fn page_count_for(total_records: usize, records_per_page: usize) -> usize {
    total_records.div_ceil(records_per_page)
}

/// Index pages visited by [`IdentifierCollector::collect`] for `page_count`.
pub fn pages_walked(page_count: usize) -> usize {
    page_count.saturating_add(1)
}

/// Parses counter text shaped like `<label> <number> <label>`: the number is
/// the second-to-last word.
pub fn parse_record_counter(text: &str) -> Result<usize, IndexFormatError> {
    text.split_whitespace()
        .nth_back(1)
        .and_then(|word| word.parse().ok())
        .ok_or_else(|| IndexFormatError::UnparsableCounter {
            text: text.trim().to_string(),
        })
}

fn read_record_counter(page: &Document) -> Result<usize, IndexError> {
    let counter = page
        .query_text(COUNTER_SELECTOR)?
        .into_iter()
        .next()
        .ok_or_else(|| IndexFormatError::MissingCounter {
            url: page.url().to_string(),
        })?;
    Ok(parse_record_counter(&counter)?)
}

fn page_identifiers(page: &Document) -> Result<Vec<Identifier>, QueryError> {
    Ok(page
        .query_attr(IDENTIFIER_CELL_SELECTOR, LINK_SELECTOR, "href")?
        .iter()
        .map(|href| identifier_from_href(href))
        .collect())
}

/// Last [`IDENTIFIER_LEN`] characters of `href`, or all of it when shorter.
pub fn identifier_from_href(href: &str) -> Identifier {
    let skip = href.chars().count().saturating_sub(IDENTIFIER_LEN);
    href.chars().skip(skip).collect()
}
