use std::time::Duration;

use serde::de::DeserializeOwned;

pub(crate) mod feelyou;

/// Blocking HTTP client used for metadata and cover requests.
///
/// Every network-touching function in this crate is generic over a
/// `Client` so tests can swap in the `MockClient` below. Timeouts apply
/// per request; the upstream is hostile to concurrent clients, so
/// callers issue one request at a time.
pub trait Client
where
    Self: Default,
{
    /// Performs a GET for `url` with the given headers and decodes the
    /// JSON response body.
    ///
    /// # Errors
    ///
    /// An `Err` of kind `IO` is returned when the request fails or times
    /// out, and of kind `Deserialize` when the body is not the expected
    /// JSON shape.
    fn get_json<T>(&self, url: &str, headers: &[(&str, &str)], timeout: Duration) -> Result<T, Error>
    where
        T: DeserializeOwned;

    /// Performs a GET for `url` and returns the raw response bytes.
    ///
    /// # Errors
    ///
    /// An `Err` of kind `IO` is returned when the request fails or times
    /// out, and of kind `NoValue` when the response body is empty.
    fn get_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, Error>;
}

impl Client for reqwest::blocking::Client {
    fn get_json<T>(&self, url: &str, headers: &[(&str, &str)], timeout: Duration) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let mut request = self.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        request
            .send()
            .map_err(|e| Error::wrap(ErrorKind::IO, e))
            .and_then(|r| r.json().map_err(|e| Error::wrap(ErrorKind::Deserialize, e)))
    }

    fn get_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, Error> {
        let bytes = self
            .get(url)
            .timeout(timeout)
            .send()
            .and_then(reqwest::blocking::Response::bytes)
            .map_err(|e| Error::wrap(ErrorKind::IO, e))?;

        if bytes.is_empty() {
            Err(Error::new(ErrorKind::NoValue, "Response body is empty"))
        } else {
            Ok(bytes.to_vec())
        }
    }
}

#[cfg(test)]
pub(crate) use test::{
    assert_header, assert_url, impl_text_producer, MockClient, NetworkErrorProducer, Producer,
    HEADER_SINK, URL_SINK,
};

use crate::{Error, ErrorKind};
