use std::{thread, time::Duration};

use log::{error, info, warn};
use url::Url;

use upcheck_api::{
    constants::{COCKPIT_PORT, HOST_STATUS_UP},
    report::CheckVerdict,
};

use crate::{rhvm::ManagementApi, web::WebProbe};

pub const HOST_STATUS: &str = "host_status";
pub const COCKPIT_CONNECTION: &str = "cockpit_connection";
pub const UPDATE_AGAIN_UNAVAILABLE: &str = "update_again_unavailable";

/// The host as registered on the management API.
#[derive(Clone, Copy)]
pub struct RegisteredHost<'a> {
    pub api: &'a dyn ManagementApi,
    pub name: &'a str,
}

/// How often, and how many times, the host status is polled.
#[derive(Debug, Clone, Copy)]
pub struct Polling {
    pub interval: Duration,
    pub max_count: u32,
}

/// The management API reports the host as up within `polling`. Passes
/// trivially when no host is registered.
pub fn host_status(host: Option<RegisteredHost>, polling: Polling) -> CheckVerdict {
    let Some(RegisteredHost { api, name }) = host else {
        return CheckVerdict::pass(HOST_STATUS, "no management API configured");
    };

    info!("Check host status on rhvm");
    let mut last_status = String::from("unknown");
    for _ in 0..polling.max_count {
        match api.list_host(name) {
            Ok(Some(record)) if record.status == HOST_STATUS_UP => {
                info!("Host is up on rhvm");
                return CheckVerdict::pass(HOST_STATUS, format!("host '{name}' is up"));
            }
            Ok(Some(record)) => last_status = record.status,
            Ok(None) => last_status = String::from("not registered"),
            Err(e) => warn!("Failed to query host '{name}': {e:?}"),
        }
        thread::sleep(polling.interval);
    }

    error!("Host is not up on rhvm");
    CheckVerdict::mismatch(
        HOST_STATUS,
        format!(
            "host '{name}' is not up after {} queries",
            polling.max_count
        ),
    )
    .with_evidence("last status", last_status)
}

/// The cockpit console on `address` answers with 200.
pub fn cockpit_connection(probe: &dyn WebProbe, address: &str) -> CheckVerdict {
    info!("Check cockpit connection");
    let url = match Url::parse(&format!("http://{address}:{COCKPIT_PORT}")) {
        Ok(url) => url,
        Err(e) => {
            return CheckVerdict::malformed(
                COCKPIT_CONNECTION,
                format!("invalid host address '{address}': {e}"),
            )
        }
    };

    match probe.status_of(&url) {
        Ok(200) => CheckVerdict::pass(COCKPIT_CONNECTION, format!("{url} is reachable")),
        Ok(status) => {
            error!("Cockpit cannot be connected");
            CheckVerdict::mismatch(COCKPIT_CONNECTION, format!("{url} returned {status}"))
        }
        Err(e) => {
            error!("Cockpit cannot be connected: {e:?}");
            CheckVerdict::command_failed(COCKPIT_CONNECTION, format!("{url} is unreachable"))
                .with_evidence("error", format!("{e:#}"))
        }
    }
}

/// The engine no longer offers an update for the host.
pub fn update_again_unavailable(host: Option<RegisteredHost>) -> CheckVerdict {
    info!("Start to check update again unavailable");
    let Some(RegisteredHost { api, name }) = host else {
        return CheckVerdict::not_applicable(
            UPDATE_AGAIN_UNAVAILABLE,
            "no management API configured",
        );
    };

    match api.check_update_available(name) {
        Ok(false) => CheckVerdict::pass(
            UPDATE_AGAIN_UNAVAILABLE,
            "no update is offered after the upgrade",
        ),
        Ok(true) => {
            error!("Can update again, should be not");
            CheckVerdict::mismatch(
                UPDATE_AGAIN_UNAVAILABLE,
                "an update is still offered after the upgrade",
            )
        }
        Err(e) => CheckVerdict::command_failed(
            UPDATE_AGAIN_UNAVAILABLE,
            "update availability query failed",
        )
        .with_evidence("error", format!("{e:#}")),
    }
}
