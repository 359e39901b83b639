use scraper::{ElementRef, Html, Selector};

use crate::decode::decode_page;
use crate::fetch::Fetcher;
use crate::FetchError;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Decoded HTML/XML markup of one fetched page.
///
/// The markup is parsed per query so the document stays `Send` and can be
/// held across await points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    url: String,
    markup: String,
}

impl Document {
    pub fn new(url: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markup: markup.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Full descendant text of every element matching `selector`, in document order.
    pub fn query_text(&self, selector: &str) -> Result<Vec<String>, QueryError> {
        let selector = parse_selector(selector)?;
        let html = Html::parse_document(&self.markup);
        Ok(html.select(&selector).map(element_text).collect())
    }

    /// For each element matching `selector`, the `attr` value of every descendant
    /// matching `inner`. Descendants without the attribute are skipped.
    pub fn query_attr(
        &self,
        selector: &str,
        inner: &str,
        attr: &str,
    ) -> Result<Vec<String>, QueryError> {
        let outer = parse_selector(selector)?;
        let inner = parse_selector(inner)?;
        let html = Html::parse_document(&self.markup);
        let values = html
            .select(&outer)
            .flat_map(|element| element.select(&inner))
            .filter_map(|node| node.value().attr(attr))
            .map(str::to_string)
            .collect();
        Ok(values)
    }
}

/// Fetch `url` with `query` and decode the body into a [`Document`].
pub async fn fetch_document(
    fetcher: &dyn Fetcher,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Document, DocumentError> {
    let output = fetcher.fetch(url, query).await?;
    let markup = decode_page(&output);
    Ok(Document::new(output.metadata.final_url, markup))
}

fn parse_selector(selector: &str) -> Result<Selector, QueryError> {
    Selector::parse(selector).map_err(|err| QueryError::InvalidSelector {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

fn element_text(element: ElementRef) -> String {
    element.text().collect()
}
