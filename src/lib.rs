#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![warn(missing_docs, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]
#![doc = include_str!("../README.md")]

mod api;
mod cache;
mod config;
mod error;
mod isbn;
mod metadata;
mod query;
mod source;

use std::{
    sync::{atomic::AtomicBool, mpsc::Sender},
    time::Duration,
};

pub use cache::{CoverCache, MemoryCache};
pub use config::SourceConfig;
pub use error::{Error, ErrorKind};
pub use isbn::check_isbn;
pub use metadata::{Identifiers, Metadata, DOUBAN_SCHEME, ISBN_SCHEME};
pub use query::{book_url, Lookup};

use log::trace;

type Client = reqwest::blocking::Client;

/// Looks up book metadata for `lookup` and sends every record found to
/// `results`.
///
/// An ISBN among the lookup identifiers maps to a single authenticated
/// request against the ISBN endpoint; each response entry that normalizes
/// into a [`Metadata`] record is published in response order. The pass
/// also primes `cache` with the ISBN → Douban id and id → cover URL
/// mappings it discovers so a later [`download_cover`] call can skip the
/// metadata query.
///
/// Nothing here errors out to the caller: a missing API key returns
/// silently, and an unusable lookup, a transport failure or an
/// undecodable body each log and return without publishing (the caller
/// observes "no metadata found"). `abort` is honored between the query
/// and the one empty-result fallback.
#[inline]
pub fn identify(
    config: &SourceConfig,
    cache: &mut dyn CoverCache,
    lookup: &Lookup,
    abort: &AtomicBool,
    results: &Sender<Metadata>,
    timeout: Duration,
) {
    trace!("identify book for lookup {lookup:?}");
    source::identify::<Client>(config, cache, lookup, abort, results, timeout);
}

/// Downloads the cover image for `lookup` and sends the raw bytes to
/// `out`.
///
/// The cover URL is resolved from `cache` when a previous [`identify`]
/// pass saw this book; on a miss a nested identify runs first to discover
/// it. A book without a real cover (or with only placeholder artwork) is
/// a logged no-op, as is any download failure. `abort` is checked after
/// the nested identify and again before the download starts.
#[inline]
pub fn download_cover(
    config: &SourceConfig,
    cache: &mut dyn CoverCache,
    lookup: &Lookup,
    abort: &AtomicBool,
    out: &Sender<Vec<u8>>,
    timeout: Duration,
) {
    trace!("download cover for lookup {lookup:?}");
    source::download_cover::<Client>(config, cache, lookup, abort, out, timeout);
}
