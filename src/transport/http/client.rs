//! The client half of the reference HTTP peer transport: issues the GET a
//! [`super::server::router`] answers and decodes the protobuf-framed body.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use prost::Message as _;

use crate::error::CacheError;
use crate::peer::PeerGetter;
use crate::transport::proto;

/// A [`PeerGetter`] that reaches one specific remote peer over HTTP.
pub struct HttpPeerGetter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPeerGetter {
    /// `base_url` is the peer's full address including the transport base
    /// path, e.g. `"http://10.0.0.2:8080/_groupcache/"`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { client, base_url }
    }
}

#[async_trait::async_trait]
impl PeerGetter for HttpPeerGetter {
    async fn get(&self, group: &str, key: &str) -> Result<bytes::Bytes, CacheError> {
        let url = format!(
            "{}{}/{}",
            self.base_url,
            utf8_percent_encode(group, NON_ALPHANUMERIC),
            utf8_percent_encode(key, NON_ALPHANUMERIC),
        );

        let response = self.client.get(&url).send().await.map_err(CacheError::peer)?;
        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::peer_msg(format!("peer returned status {status}")));
        }

        let body = response.bytes().await.map_err(CacheError::peer)?;
        let decoded = proto::Response::decode_length_delimited(body).map_err(CacheError::peer)?;
        Ok(decoded.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_a_trailing_slash() {
        let getter = HttpPeerGetter::new(reqwest::Client::new(), "http://peer:8080/_groupcache");
        assert_eq!(getter.base_url, "http://peer:8080/_groupcache/");
    }
}
