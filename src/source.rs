use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Sender},
    },
    time::Duration,
};

use log::{error, info, trace, warn};

use crate::{
    api::{
        feelyou::{self, ApiResponse, BookEntry},
        Client,
    },
    cache::CoverCache,
    config::SourceConfig,
    metadata::{Identifiers, Metadata, DOUBAN_SCHEME, ISBN_SCHEME},
    query::{self, Lookup},
};

/// Runs one identify pass: build a query, fetch, normalize, publish.
///
/// Every failure degrades to a logged no-op; the caller observes at most
/// "no records arrived".
pub(crate) fn identify<C: Client>(
    config: &SourceConfig,
    cache: &mut dyn CoverCache,
    lookup: &Lookup,
    abort: &AtomicBool,
    results: &Sender<Metadata>,
    timeout: Duration,
) {
    run_identify::<C>(config, cache, lookup, abort, results, timeout, true);
}

fn run_identify<C: Client>(
    config: &SourceConfig,
    cache: &mut dyn CoverCache,
    lookup: &Lookup,
    abort: &AtomicBool,
    results: &Sender<Metadata>,
    timeout: Duration,
    allow_retry: bool,
) {
    if config.apikey.is_empty() {
        return;
    }

    let Some(url) = query::create_query(lookup) else {
        error!("insufficient metadata to construct query");
        return;
    };
    trace!("identify query is {url}");

    let client = C::default();
    let headers = [("apikey", config.apikey.as_str())];
    let response: ApiResponse = match client.get_json(&url, &headers, timeout) {
        Ok(response) => response,
        Err(e) => {
            error!("identify query {url} failed: {e}");
            return;
        }
    };

    let entries = response.into_entries();
    if entries.is_empty() {
        // One fallback on an empty result, with identifiers dropped so
        // the query is rebuilt from title/author context.
        if allow_retry
            && !lookup.identifiers.is_empty()
            && lookup.title.is_some()
            && !lookup.authors.is_empty()
            && !abort.load(Ordering::Relaxed)
        {
            let fallback = Lookup {
                identifiers: Identifiers::new(),
                ..lookup.clone()
            };
            run_identify::<C>(config, cache, &fallback, abort, results, timeout, false);
        }
        return;
    }

    // The upstream throttles concurrent clients with 403 responses, so
    // entries are processed strictly in sequence.
    for entry in entries {
        publish(cache, entry, results);
    }
}

/// Normalizes one entry, primes the cover cache with what it reveals and
/// sends the record on.
fn publish(cache: &mut dyn CoverCache, entry: BookEntry, results: &Sender<Metadata>) {
    let Some(record) = feelyou::to_metadata(entry) else {
        return;
    };
    if let Some(douban_id) = record.douban_id().map(str::to_owned) {
        for isbn in &record.isbns {
            cache.cache_isbn_to_identifier(isbn, &douban_id);
        }
        if let Some(cover) = record.cover_url.as_deref() {
            cache.cache_identifier_to_cover_url(&douban_id, cover);
        }
    }
    if results.send(record).is_err() {
        warn!("result receiver dropped, discarding record");
    }
}

/// Downloads the cover image for a lookup, sending the raw bytes to
/// `out`.
///
/// The cover URL comes from the cache when a previous identify pass saw
/// this book; otherwise a nested identify runs first to discover it.
pub(crate) fn download_cover<C: Client>(
    config: &SourceConfig,
    cache: &mut dyn CoverCache,
    lookup: &Lookup,
    abort: &AtomicBool,
    out: &Sender<Vec<u8>>,
    timeout: Duration,
) {
    let mut cached = cached_cover_url(cache, &lookup.identifiers);
    if cached.is_none() {
        info!("no cached cover found, running identify");
        let (sender, receiver) = mpsc::channel();
        run_identify::<C>(config, cache, lookup, abort, &sender, timeout, true);
        drop(sender);
        if abort.load(Ordering::Relaxed) {
            return;
        }
        for record in receiver.iter() {
            cached = cached_cover_url(cache, &record.identifiers);
            if cached.is_some() {
                break;
            }
        }
    }

    let Some(url) = cached else {
        info!("no cover found");
        return;
    };
    if abort.load(Ordering::Relaxed) {
        return;
    }

    info!("downloading cover from {url}");
    match C::default().get_bytes(&url, timeout) {
        Ok(data) => {
            if out.send(data).is_err() {
                warn!("cover receiver dropped, discarding payload");
            }
        }
        Err(e) => error!("failed to download cover from {url}: {e}"),
    }
}

/// Resolves a cover URL from the cache: a direct `douban` id wins, then
/// an `isbn` that a previous identify pass mapped to one.
fn cached_cover_url(cache: &dyn CoverCache, identifiers: &Identifiers) -> Option<String> {
    let douban_id = identifiers.get(DOUBAN_SCHEME).cloned().or_else(|| {
        identifiers
            .get(ISBN_SCHEME)
            .and_then(|isbn| cache.identifier_for_isbn(isbn))
    });
    douban_id.and_then(|id| cache.cover_url_for_identifier(&id))
}
