use serde::{Deserialize, Serialize};

/// Configuration for the metadata source, passed explicitly to every
/// operation rather than read from ambient state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// API key sent as the `apikey` header on every metadata request.
    ///
    /// An empty key turns [`identify`](crate::identify) into a silent
    /// no-op, since the endpoint rejects unauthenticated requests.
    pub apikey: String,
    /// Whether to append the subtitle to the book title.
    ///
    /// Accepted for host compatibility; no logic consults it yet.
    pub include_subtitle_in_title: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            apikey: String::new(),
            include_subtitle_in_title: true,
        }
    }
}

impl SourceConfig {
    /// Creates a configuration with the given API key and default options.
    pub fn with_apikey<S: Into<String>>(apikey: S) -> Self {
        Self {
            apikey: apikey.into(),
            ..Self::default()
        }
    }
}
