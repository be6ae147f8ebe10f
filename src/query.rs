use log::{debug, warn};

use crate::{
    isbn,
    metadata::{Identifiers, DOUBAN_SCHEME, ISBN_SCHEME},
};

const ISBN_URL: &str = "https://api.feelyou.top/isbn/";
const DOUBAN_BOOK_URL: &str = "https://book.douban.com/subject/";

/// A metadata lookup request: free-text title/author context plus any
/// identifiers already known for the book.
#[derive(Clone, Debug, Default)]
pub struct Lookup {
    /// Book title, when known.
    pub title: Option<String>,
    /// Ordered author names, when known.
    pub authors: Vec<String>,
    /// Known identifiers, e.g. an `isbn` or `douban` entry.
    pub identifiers: Identifiers,
}

impl Lookup {
    /// Creates a lookup keyed by a single ISBN.
    #[must_use]
    pub fn by_isbn(isbn: &str) -> Self {
        let mut identifiers = Identifiers::new();
        identifiers.insert(ISBN_SCHEME.to_owned(), isbn.to_owned());
        Self {
            identifiers,
            ..Self::default()
        }
    }

    /// Creates a lookup from title and author context.
    #[must_use]
    pub fn by_title<S: Into<String>>(title: S, authors: Vec<String>) -> Self {
        Self {
            title: Some(title.into()),
            authors,
            identifiers: Identifiers::new(),
        }
    }
}

/// Builds the outbound query URL for a lookup.
///
/// A valid ISBN among the identifiers wins and maps to the ISBN
/// endpoint. The remaining free-text path normalizes title and
/// first-author tokens into a search term, but no search endpoint is
/// wired for it, so it logs the dropped term and yields no query. `None`
/// therefore means "nothing to fetch" and is reported by the caller.
pub(crate) fn create_query(lookup: &Lookup) -> Option<String> {
    if let Some(isbn) = lookup
        .identifiers
        .get(ISBN_SCHEME)
        .and_then(|candidate| isbn::check_isbn(candidate))
    {
        let mut url = ISBN_URL.to_owned();
        url.push_str(&isbn);
        return Some(url);
    }
    debug!("no valid isbn among identifiers");

    let mut term = String::new();
    let title_tokens = lookup.title.as_deref().into_iter().flat_map(text_tokens);
    let author_tokens = lookup
        .authors
        .first()
        .map(String::as_str)
        .into_iter()
        .flat_map(text_tokens);
    for token in title_tokens.chain(author_tokens) {
        if !term.is_empty() {
            term.push(' ');
        }
        term.push_str(token);
    }

    if term.is_empty() {
        return None;
    }
    warn!("free-text search is not supported, dropping term {term:?}");
    None
}

/// Returns the public Douban detail-page URL for a set of identifiers.
#[must_use]
pub fn book_url(identifiers: &Identifiers) -> Option<String> {
    identifiers
        .get(DOUBAN_SCHEME)
        .map(|id| format!("{DOUBAN_BOOK_URL}{id}/"))
}

/// Splits free text into search tokens: whitespace and list punctuation
/// separate tokens, surrounding punctuation is trimmed, empties dropped.
fn text_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '/'))
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
}
