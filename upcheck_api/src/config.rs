use std::{collections::BTreeMap, path::Path, path::PathBuf, time::Duration};

use maplit::btreemap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    constants::*,
    error::{InvalidInputError, ReportError, UpcheckError},
    primitives::build::{BuildName, BuildStamp},
};

/// Everything one upgrade test run needs to know. Loaded once and never
/// modified afterwards.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunConfig {
    /// Build installed before the upgrade.
    pub source_build: BuildName,

    /// Build the host is upgraded to.
    pub target_build: BuildName,

    /// How to reach the host under test.
    pub host: HostConnection,

    /// Management API the host is registered on. Host status checks pass
    /// trivially when this is not set.
    #[serde(default)]
    pub rhvm: Option<RhvmConnection>,

    /// Kernel space rpm installed before the upgrade, e.g.
    /// `kmod-foo-1.0-1.el7.x86_64.rpm`.
    #[serde(default)]
    pub kernel_space_rpm: Option<String>,

    /// Directory listing the update rpms are published in.
    #[serde(default)]
    pub update_rpm_url: Option<Url>,

    /// Local directory holding the repo files uploaded to the host.
    #[serde(default = "default_repo_dir")]
    pub repo_dir: PathBuf,

    #[serde(default)]
    pub timeouts: Timeouts,

    #[serde(default)]
    pub new_volumes: NewVolumeLayout,

    #[serde(default)]
    pub test_files: TestFiles,

    /// Number of lines `findmnt -D` reports for the separate volumes.
    #[serde(default = "default_separate_volume_count")]
    pub separate_volume_count: usize,
}

fn default_repo_dir() -> PathBuf {
    PathBuf::from(LOCAL_REPO_DIR_DEFAULT)
}

fn default_separate_volume_count() -> usize {
    SEPARATE_VOLUME_COUNT_DEFAULT
}

fn default_user() -> String {
    "root".into()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct HostConnection {
    /// Address or hostname used for SSH and the cockpit console.
    pub address: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub port: Option<u16>,

    /// Private key passed to ssh and scp.
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RhvmConnection {
    pub fqdn: String,

    /// Name the host is registered with.
    pub host_name: String,

    #[serde(default = "default_rhvm_user")]
    pub user: String,

    pub password: String,

    #[serde(default = "default_rhvm_domain")]
    pub domain: String,

    /// Accept the engine's self-signed certificate.
    #[serde(default)]
    pub insecure: bool,
}

fn default_rhvm_user() -> String {
    "admin".into()
}

fn default_rhvm_domain() -> String {
    "internal".into()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Timeouts {
    pub command_secs: u64,
    pub host_status_interval_secs: u64,
    pub host_status_max_count: u32,
    pub enter_system_interval_secs: u64,
    pub enter_system_max_count: u32,
    pub enter_system_timeout_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_secs: COMMAND_TIMEOUT_SECS_DEFAULT,
            host_status_interval_secs: HOST_STATUS_INTERVAL_SECS_DEFAULT,
            host_status_max_count: HOST_STATUS_MAX_COUNT_DEFAULT,
            enter_system_interval_secs: ENTER_SYSTEM_INTERVAL_SECS_DEFAULT,
            enter_system_max_count: ENTER_SYSTEM_MAX_COUNT_DEFAULT,
            enter_system_timeout_secs: ENTER_SYSTEM_TIMEOUT_SECS_DEFAULT,
        }
    }
}

impl Timeouts {
    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    pub fn host_status_interval(&self) -> Duration {
        Duration::from_secs(self.host_status_interval_secs)
    }

    pub fn enter_system_interval(&self) -> Duration {
        Duration::from_secs(self.enter_system_interval_secs)
    }

    pub fn enter_system(&self) -> Duration {
        Duration::from_secs(self.enter_system_timeout_secs)
    }
}

/// The one-time volume layout change: builds up to `cutoff` lack the
/// separate volumes, later builds create them on upgrade.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct NewVolumeLayout {
    pub cutoff: BuildStamp,

    /// Volume name to its expected `lvs` size, e.g. `home: 1024.00m`.
    pub volumes: BTreeMap<String, String>,

    pub mount_points: Vec<String>,
}

impl Default for NewVolumeLayout {
    fn default() -> Self {
        Self {
            cutoff: NEW_VOLUME_CUTOFF_DEFAULT
                .parse()
                .unwrap_or_else(|_| unreachable!("default cutoff is a valid stamp")),
            volumes: btreemap! {
                "home".into() => "1024.00m".into(),
                "tmp".into() => "1024.00m".into(),
                "var_log".into() => "8192.00m".into(),
                "var_log_audit".into() => "2048.00m".into(),
            },
            mount_points: NEW_MOUNT_POINTS_DEFAULT
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

/// Files written on the host before the upgrade and checked afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct TestFiles {
    pub add_file: PathBuf,
    pub update_file: PathBuf,
    pub add_var_file: PathBuf,
    pub update_var_log_file: PathBuf,
    pub add_content: String,
    pub update_content: String,
}

impl Default for TestFiles {
    fn default() -> Self {
        Self {
            add_file: ADD_FILE_PATH_DEFAULT.into(),
            update_file: UPDATE_FILE_PATH_DEFAULT.into(),
            add_var_file: ADD_VAR_FILE_PATH_DEFAULT.into(),
            update_var_log_file: UPDATE_VAR_LOG_FILE_PATH_DEFAULT.into(),
            add_content: ADD_FILE_CONTENT_DEFAULT.into(),
            update_content: UPDATE_FILE_CONTENT_DEFAULT.into(),
        }
    }
}

impl RunConfig {
    /// Reads and parses a run configuration YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, UpcheckError> {
        let contents = std::fs::read_to_string(path.as_ref()).structured(
            InvalidInputError::LoadRunConfig {
                path: path.as_ref().display().to_string(),
            },
        )?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, UpcheckError> {
        serde_yaml::from_str(contents).structured(InvalidInputError::ParseRunConfig)
    }

    /// Name the host is registered with on the management API, if any.
    pub fn host_name(&self) -> Option<&str> {
        self.rhvm.as_ref().map(|r| r.host_name.as_str())
    }
}
