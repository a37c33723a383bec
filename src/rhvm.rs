//! Client for the RHV-M management API.

use std::time::Duration;

use anyhow::{Context, Error};
use log::{debug, trace};
use reqwest::{blocking::Client, header::ACCEPT, StatusCode};
use serde::{Deserialize, Deserializer};
use url::Url;

use upcheck_api::config::RhvmConnection;

/// Timeout of a single management API request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Host as known to the management API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostRecord {
    pub name: String,

    /// e.g. `up`, `maintenance`, `non_responsive`.
    #[serde(default)]
    pub status: String,

    /// Whether the engine offers an update for this host.
    #[serde(default, deserialize_with = "flexible_bool")]
    pub update_available: bool,
}

/// Operations the check points need from the management API.
pub trait ManagementApi {
    /// The host registered as `name`, if any.
    fn list_host(&self, name: &str) -> Result<Option<HostRecord>, Error>;

    /// Whether the engine reports an available update for host `name`.
    fn check_update_available(&self, name: &str) -> Result<bool, Error> {
        Ok(self
            .list_host(name)?
            .with_context(|| format!("Host '{name}' is not registered"))?
            .update_available)
    }
}

/// The engine serializes booleans as strings.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flexible {
        Bool(bool),
        Str(String),
    }

    match Flexible::deserialize(deserializer)? {
        Flexible::Bool(b) => Ok(b),
        Flexible::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Default, Deserialize)]
struct HostList {
    #[serde(default)]
    host: Vec<HostRecord>,
}

/// Reads the hosts of a `/ovirt-engine/api/hosts` JSON response.
pub fn parse_hosts(body: &str) -> Result<Vec<HostRecord>, Error> {
    Ok(serde_json::from_str::<HostList>(body)
        .context("Failed to parse host list")?
        .host)
}

/// Blocking client for `https://{fqdn}/ovirt-engine/api`.
pub struct RhvmClient {
    client: Client,
    base: Url,
    user: String,
    password: String,
}

impl RhvmClient {
    pub fn new(connection: &RhvmConnection) -> Result<Self, Error> {
        let base = Url::parse(&format!("https://{}/ovirt-engine/api/", connection.fqdn))
            .with_context(|| format!("Invalid engine address '{}'", connection.fqdn))?;
        let client = reqwest::blocking::ClientBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(connection.insecure)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base,
            user: format!("{}@{}", connection.user, connection.domain),
            password: connection.password.clone(),
        })
    }

    fn hosts_url(&self, name: &str) -> Result<Url, Error> {
        let mut url = self.base.join("hosts").context("Failed to build hosts URL")?;
        url.query_pairs_mut().append_pair("search", &format!("name={name}"));
        Ok(url)
    }
}

impl ManagementApi for RhvmClient {
    fn list_host(&self, name: &str) -> Result<Option<HostRecord>, Error> {
        let url = self.hosts_url(name)?;
        debug!("Querying host '{name}' at {url}");

        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.user, Some(&self.password))
            .header(ACCEPT, "application/json")
            .send()
            .with_context(|| format!("Failed to GET {url}"))?;

        let status = response.status();
        let body = response.text().context("Failed to read response body")?;
        if status != StatusCode::OK {
            anyhow::bail!("GET {url} returned {status}: {body}");
        }
        trace!("Host list: {body}");

        Ok(parse_hosts(&body)?.into_iter().find(|h| h.name == name))
    }
}
