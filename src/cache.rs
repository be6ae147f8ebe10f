use std::collections::HashMap;

/// Host-provided cache linking ISBNs to Douban ids and Douban ids to
/// cover URLs.
///
/// [`identify`](crate::identify) primes the cache with every mapping it
/// discovers; [`download_cover`](crate::download_cover) reads it back to
/// avoid a second metadata query. Hosts with a persistent cache
/// implement this trait over it; everyone else can use [`MemoryCache`].
pub trait CoverCache {
    /// Records that `isbn` belongs to the book with `douban_id`.
    fn cache_isbn_to_identifier(&mut self, isbn: &str, douban_id: &str);

    /// Looks up the Douban id previously recorded for `isbn`.
    fn identifier_for_isbn(&self, isbn: &str) -> Option<String>;

    /// Records the cover URL discovered for `douban_id`.
    fn cache_identifier_to_cover_url(&mut self, douban_id: &str, url: &str);

    /// Looks up the cover URL previously recorded for `douban_id`.
    fn cover_url_for_identifier(&self, douban_id: &str) -> Option<String>;
}

/// In-process [`CoverCache`] backed by hash maps.
#[derive(Debug, Default)]
pub struct MemoryCache {
    isbn_to_id: HashMap<String, String>,
    id_to_cover: HashMap<String, String>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CoverCache for MemoryCache {
    fn cache_isbn_to_identifier(&mut self, isbn: &str, douban_id: &str) {
        self.isbn_to_id
            .insert(isbn.to_owned(), douban_id.to_owned());
    }

    fn identifier_for_isbn(&self, isbn: &str) -> Option<String> {
        self.isbn_to_id.get(isbn).cloned()
    }

    fn cache_identifier_to_cover_url(&mut self, douban_id: &str, url: &str) {
        self.id_to_cover.insert(douban_id.to_owned(), url.to_owned());
    }

    fn cover_url_for_identifier(&self, douban_id: &str) -> Option<String> {
        self.id_to_cover.get(douban_id).cloned()
    }
}
