//! Request plumbing shared by the backend and hosted repository clients.

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ClientError;

/// Parse a configured base URL so that relative segments extend its path.
pub(crate) fn parse_base(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw.trim()).map_err(|err| ClientError::InvalidUrl {
        base: raw.to_string(),
        message: err.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl {
            base: raw.to_string(),
            message: "url cannot carry a path".to_string(),
        });
    }
    Ok(url)
}

/// `base` with `segments` appended, each one percent-encoded.
pub(crate) fn join(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ClientError::InvalidUrl {
            base: base.to_string(),
            message: "url cannot carry a path".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// GET `url` and decode a JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: Url,
    purpose: &'static str,
) -> Result<T, ClientError> {
    debug!(%url, "GET");
    let response = http
        .get(url.clone())
        .send()
        .await
        .map_err(|source| ClientError::Network {
            url: url.to_string(),
            purpose,
            source: Box::new(source),
        })?;

    let status = response.status();
    if !status.is_success() {
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        debug!(%url, %status, "request rejected");
        return Err(ClientError::Http {
            url: url.to_string(),
            purpose,
            status,
            headers,
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| ClientError::Network {
            url: url.to_string(),
            purpose,
            source: Box::new(source),
        })?;
    serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        purpose,
        source,
    })
}
