//! Plain HTTP probes against the host and the package repository.

use std::time::Duration;

use anyhow::{Context, Error};
use log::{debug, error};
use reqwest::{blocking::Client, StatusCode};
use url::Url;

/// Timeout of a single probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

pub trait WebProbe {
    /// Status code of a GET on `url`.
    fn status_of(&self, url: &Url) -> Result<u16, Error>;

    /// Body of a GET on `url`, failing on any status but 200.
    fn fetch_text(&self, url: &Url) -> Result<String, Error>;
}

pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new() -> Result<Self, Error> {
        // The cockpit console and the repository use self-signed certificates.
        let client = reqwest::blocking::ClientBuilder::new()
            .timeout(PROBE_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl WebProbe for HttpProbe {
    fn status_of(&self, url: &Url) -> Result<u16, Error> {
        debug!("Probing {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("Failed to GET {url}"))?;
        Ok(response.status().as_u16())
    }

    fn fetch_text(&self, url: &Url) -> Result<String, Error> {
        debug!("Fetching {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("Failed to GET {url}"))?;

        let status = response.status();
        let body = response.text().context("Failed to read response body")?;
        if status != StatusCode::OK {
            error!("GET {url} returned {status}: {body}");
            anyhow::bail!("GET {url} returned {status}");
        }
        Ok(body)
    }
}
