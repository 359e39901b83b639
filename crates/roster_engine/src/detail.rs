//! Detail pages: row cleaning and label/value pairing.

use harvest_logging::{harvest_debug, harvest_info, harvest_warn};

use crate::date::is_date;
use crate::document::{fetch_document, DocumentError, QueryError};
use crate::fetch::Fetcher;
use crate::{Identifier, Record};

pub const DEFAULT_DETAIL_URL: &str = "https://appext20.dos.ny.gov/lcns_public/bus_name_inq_frm";
pub const DEFAULT_ID_PARAM: &str = "p_record_id";

const ROW_SELECTOR: &str = "tr";
const TERMINATOR_MARKER: &str = "Services";
const EXCLUSION_MARKER: &str = "NOT";
const SECONDARY_SUFFIX: &str = "2";
/// Characters that end a line inside a row's text, Unicode line boundaries included.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSettings {
    pub detail_url: String,
    /// Query parameter carrying the identifier.
    pub id_param: String,
    pub malformed_policy: MalformedPolicy,
}

impl Default for DetailSettings {
    fn default() -> Self {
        Self {
            detail_url: DEFAULT_DETAIL_URL.to_string(),
            id_param: DEFAULT_ID_PARAM.to_string(),
            malformed_policy: MalformedPolicy::default(),
        }
    }
}

/// What to do with a detail page that yields no fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    #[default]
    FailFast,
    SkipAndLog,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("detail page for identifier {identifier} has no label/value pairs")]
pub struct MalformedDetailPage {
    pub identifier: Identifier,
}

#[derive(Debug, thiserror::Error)]
pub enum DetailError {
    #[error("identifier {identifier}: {source}")]
    Document {
        identifier: Identifier,
        #[source]
        source: DocumentError,
    },
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Malformed(#[from] MalformedDetailPage),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRecords {
    pub records: Vec<Record>,
    /// Identifiers dropped under [`MalformedPolicy::SkipAndLog`].
    pub skipped: Vec<Identifier>,
}

pub struct RecordExtractor<'a> {
    fetcher: &'a dyn Fetcher,
    settings: DetailSettings,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, settings: DetailSettings) -> Self {
        Self { fetcher, settings }
    }

    /// One record per identifier, in input order. Any fetch failure aborts the
    /// whole run and discards the records gathered so far.
    pub async fn collect(&self, identifiers: &[Identifier]) -> Result<ExtractedRecords, DetailError> {
        let mut extracted = ExtractedRecords::default();
        for (position, identifier) in identifiers.iter().enumerate() {
            harvest_debug!(
                "detail {}/{}: identifier {}",
                position + 1,
                identifiers.len(),
                identifier
            );
            match self.extract(identifier).await {
                Ok(record) => extracted.records.push(record),
                Err(DetailError::Malformed(err))
                    if self.settings.malformed_policy == MalformedPolicy::SkipAndLog =>
                {
                    harvest_warn!("skipping: {}", err);
                    extracted.skipped.push(err.identifier);
                }
                Err(err) => return Err(err),
            }
        }
        harvest_info!(
            "extracted {} records ({} skipped)",
            extracted.records.len(),
            extracted.skipped.len()
        );
        Ok(extracted)
    }

    async fn extract(&self, identifier: &Identifier) -> Result<Record, DetailError> {
        let query = [(self.settings.id_param.as_str(), identifier.as_str())];
        let page = fetch_document(self.fetcher, &self.settings.detail_url, &query)
            .await
            .map_err(|source| DetailError::Document {
                identifier: identifier.clone(),
                source,
            })?;
        let rows = page.query_text(ROW_SELECTOR)?;
        let record = pair_tokens(clean_rows(rows.as_slice()).as_slice());
        if record.is_empty() {
            return Err(MalformedDetailPage {
                identifier: identifier.clone(),
            }
            .into());
        }
        Ok(record)
    }
}

/// Reduces table-row texts to the ordered token sequence the pairing runs on.
///
/// A row mentioning `Services` ends the scan; rows mentioning `NOT` are
/// dropped. Remaining rows are split into trimmed, non-empty lines.
pub fn clean_rows<S: AsRef<str>>(rows: &[S]) -> Vec<String> {
    let mut tokens = Vec::new();
    for row in rows {
        let text = row.as_ref();
        if text.contains(TERMINATOR_MARKER) {
            break;
        }
        if text.is_empty() || text.contains(EXCLUSION_MARKER) {
            continue;
        }
        tokens.extend(
            text.split(LINE_BREAKS)
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
    tokens
}

/// Folds tokens into a record by reading them as label/value pairs.
///
/// A date directly after a pair is a second value for that pair's label and
/// is stored under the label suffixed with `2`. A trailing unpaired token is
/// dropped.
pub fn pair_tokens<S: AsRef<str>>(tokens: &[S]) -> Record {
    let mut record = Record::new();
    let mut i = 0;
    while i + 1 < tokens.len() {
        let label = tokens[i].as_ref();
        record.insert(label, tokens[i + 1].as_ref());
        i += 2;
        if i < tokens.len() && is_date(tokens[i].as_ref()) {
            record.insert(format!("{label}{SECONDARY_SUFFIX}"), tokens[i].as_ref());
            i += 1;
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().copied().collect()
    }

    #[test]
    fn pairs_labels_with_values_and_secondary_dates() {
        let data = ["Name", "Alice", "Issued", "01/01/2020", "02/02/2021", "City", "NYC"];
        assert_eq!(
            pair_tokens(&data),
            record(&[
                ("Name", "Alice"),
                ("Issued", "01/01/2020"),
                ("Issued2", "02/02/2021"),
                ("City", "NYC"),
            ])
        );
    }

    #[test]
    fn trailing_token_is_dropped() {
        assert_eq!(pair_tokens(&["A", "1", "B"]), record(&[("A", "1")]));
    }

    #[test]
    fn short_inputs_yield_empty_records() {
        assert!(pair_tokens::<&str>(&[]).is_empty());
        assert!(pair_tokens(&["Lonely"]).is_empty());
    }

    #[test]
    fn date_shaped_label_is_taken_as_secondary_value() {
        // Known mis-pairing: the date is consumed and the pair shifts.
        let data = ["Issued", "x", "03/04/2019", "City", "NYC"];
        assert_eq!(
            pair_tokens(&data),
            record(&[("Issued", "x"), ("Issued2", "03/04/2019"), ("City", "NYC")])
        );
    }

    #[test]
    fn only_one_secondary_value_is_taken() {
        let data = ["Exp", "01/01/2020", "02/02/2021", "03/03/2022", "Z"];
        assert_eq!(
            pair_tokens(&data),
            record(&[("Exp", "01/01/2020"), ("Exp2", "02/02/2021"), ("03/03/2022", "Z")])
        );
    }

    #[test]
    fn repeated_label_overwrites_value() {
        let data = ["Name", "A", "Name", "B"];
        assert_eq!(pair_tokens(&data), record(&[("Name", "B")]));
    }

    #[test]
    fn cleaning_stops_at_services_row() {
        let rows = ["X: 1", "Services: none", "Y: 2"];
        assert_eq!(clean_rows(&rows), vec!["X: 1"]);
    }

    #[test]
    fn cleaning_skips_negated_and_blank_rows() {
        let rows = ["\n Name \n  Alice\n", "", "License NOT active", "  \n\t\n", "City\nNYC"];
        assert_eq!(clean_rows(&rows), vec!["Name", "Alice", "City", "NYC"]);
    }

    #[test]
    fn cleaning_handles_crlf_rows() {
        let rows = ["Issued\r\n01/01/2020\r\n"];
        assert_eq!(clean_rows(&rows), vec!["Issued", "01/01/2020"]);
    }

    #[test]
    fn cleaning_splits_on_every_line_boundary() {
        let rows = ["Name\x0bAlice\u{2028}City\x0cNYC", "County\u{85}Kings\x1eZip\u{2029}10001"];
        assert_eq!(
            clean_rows(&rows),
            vec!["Name", "Alice", "City", "NYC", "County", "Kings", "Zip", "10001"]
        );
    }
}
