use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Mapping of identifier scheme name to value, unique per scheme.
pub type Identifiers = HashMap<String, String>;

/// Identifier scheme under which the Douban subject id is stored.
pub const DOUBAN_SCHEME: &str = "douban";

/// Identifier scheme under which the canonical ISBN is stored.
pub const ISBN_SCHEME: &str = "isbn";

/// Author placeholder for entries where the source reports none.
pub(crate) const UNKNOWN_AUTHOR: &str = "Unknown";

/// A normalized book metadata record.
///
/// Records are built once from a single API response entry and handed to
/// the caller; nothing in this crate mutates them afterward. A record is
/// only ever produced with a title and a `douban` identifier — entries
/// missing either are discarded during normalization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Book title.
    pub title: String,
    /// Ordered author names; never empty, defaults to a single
    /// `"Unknown"` placeholder when the source reports no author.
    pub authors: Vec<String>,
    /// Publisher name, when reported.
    pub publisher: Option<String>,
    /// Publish date; day defaults to the 15th when the source gives only
    /// year or year-month precision.
    pub pubdate: Option<NaiveDate>,
    /// Free-text book introduction.
    pub description: Option<String>,
    /// Rating on a 0–5 scale, halved from the source's 0–10 scale.
    pub rating: Option<f32>,
    /// Identifier scheme to value mapping; always carries
    /// [`DOUBAN_SCHEME`], and [`ISBN_SCHEME`] when a candidate validated.
    pub identifiers: Identifiers,
    /// Every ISBN candidate that passed check-digit validation.
    pub isbns: Vec<String>,
    /// Cover-image URL, absent when the source reports placeholder
    /// artwork.
    pub cover_url: Option<String>,
}

impl Metadata {
    /// Creates a record with the given title and authors and no other
    /// fields populated.
    ///
    /// An empty author list is replaced by the `"Unknown"` placeholder so
    /// the record always names at least one author.
    #[must_use]
    pub fn new(title: String, authors: Vec<String>) -> Self {
        let authors = if authors.is_empty() {
            vec![UNKNOWN_AUTHOR.to_owned()]
        } else {
            authors
        };
        Self {
            title,
            authors,
            publisher: None,
            pubdate: None,
            description: None,
            rating: None,
            identifiers: Identifiers::new(),
            isbns: Vec::new(),
            cover_url: None,
        }
    }

    /// Returns the Douban subject id of this record.
    #[must_use]
    pub fn douban_id(&self) -> Option<&str> {
        self.identifiers.get(DOUBAN_SCHEME).map(String::as_str)
    }

    /// Returns the canonical ISBN of this record, the longest candidate
    /// that passed validation.
    #[must_use]
    pub fn isbn(&self) -> Option<&str> {
        self.identifiers.get(ISBN_SCHEME).map(String::as_str)
    }
}

/// Parses a publish-date string into a date.
///
/// Source dates arrive with mixed precision and punctuation ("2015",
/// "2015-8", "2015-08-01", "2015年8月"). Numeric components are taken in
/// order as year, month and day; a missing day defaults to the 15th and
/// a missing month to January. Returns `None` when no usable components
/// are found or the components don't form a real date.
pub(crate) fn parse_pubdate(raw: &str) -> Option<NaiveDate> {
    let mut components = raw
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty());

    let year: i32 = components.next()?.parse().ok()?;
    let month: u32 = components.next().and_then(|part| part.parse().ok()).unwrap_or(1);
    let day: u32 = components.next().and_then(|part| part.parse().ok()).unwrap_or(15);

    NaiveDate::from_ymd_opt(year, month, day)
}
