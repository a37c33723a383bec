use const_format::formatcp;

// Timing defaults

/// Default timeout for a single remote command, in seconds.
pub const COMMAND_TIMEOUT_SECS_DEFAULT: u64 = 600;

/// Seconds between two host status queries on the management API.
pub const HOST_STATUS_INTERVAL_SECS_DEFAULT: u64 = 10;

/// Number of host status queries before giving up.
pub const HOST_STATUS_MAX_COUNT_DEFAULT: u32 = 30;

/// Seconds between two attempts to log back into the host after a reboot.
pub const ENTER_SYSTEM_INTERVAL_SECS_DEFAULT: u64 = 10;

/// Number of attempts to log back into the host after a reboot.
pub const ENTER_SYSTEM_MAX_COUNT_DEFAULT: u32 = 60;

/// Timeout of each attempt to log back into the host, in seconds.
pub const ENTER_SYSTEM_TIMEOUT_SECS_DEFAULT: u64 = 5;

/// Timeout of the command that triggers a reboot, in seconds.
pub const REBOOT_TIMEOUT_SECS: u64 = 10;

// New logical volume layout

/// Last build date before the separate /home, /tmp, /var/log and
/// /var/log/audit volumes were introduced.
pub const NEW_VOLUME_CUTOFF_DEFAULT: &str = "20170616";

/// Size below which the pool metadata volume is grown on upgrade, in MiB.
pub const POOL_TMETA_MIN_SIZE_MIB: u64 = 1024;

/// Mount points expected to appear with the new volume layout.
pub const NEW_MOUNT_POINTS_DEFAULT: [&str; 4] = ["/home", "/tmp", "/var/log", "/var/log/audit"];

/// Number of separate volumes reported by `findmnt -D` for /var, /var/log,
/// /var/log/audit, /home and /tmp.
pub const SEPARATE_VOLUME_COUNT_DEFAULT: usize = 6;

// Snapshot markers

/// Marker carried by the update package of a freshly installed host.
pub const UPDATE_PLACEHOLDER_MARKER: &str = "placeholder";

/// Marker of noise lines printed by `lvs` before the upgrade.
pub const LVS_WARNING_MARKER: &str = "WARNING";

// Remote paths

/// File created on the host before the upgrade.
pub const ADD_FILE_PATH_DEFAULT: &str = "/etc/upgrade_test";

/// File modified on the host before the upgrade.
pub const UPDATE_FILE_PATH_DEFAULT: &str = "/etc/my.cnf";

/// File created under /var before the upgrade.
pub const ADD_VAR_FILE_PATH_DEFAULT: &str = "/var/upgrade_test_var";

/// Log file modified before the upgrade.
pub const UPDATE_VAR_LOG_FILE_PATH_DEFAULT: &str = "/var/log/maillog";

/// Content written to added files.
pub const ADD_FILE_CONTENT_DEFAULT: &str = "test";

/// Content appended to modified files.
pub const UPDATE_FILE_CONTENT_DEFAULT: &str = "# test";

/// Directory imgbased keeps persisted rpms in.
pub const PERSISTED_RPMS_PATH: &str = "/var/imgbased/persisted-rpms";

/// Directory persisted rpms are moved to while testing reinstallation.
pub const PERSISTED_RPMS_BACKUP_PATH: &str = "/var/rpms-bak";

/// Directory repo files are uploaded to.
pub const REMOTE_REPO_DIR: &str = "/etc/yum.repos.d/";

/// Directory downloaded update rpms are stored in.
pub const REMOTE_RPM_DIR: &str = "/root/";

/// Repo file used to reinstall user space rpms.
pub const REINSTALL_REPO_FILE: &str = "rhel73.repo";

/// Local directory holding repo files.
pub const LOCAL_REPO_DIR_DEFAULT: &str = "/etc/upcheck/repos";

// User space rpm persistence

/// Package installed to test user space rpm persistence.
pub const USER_SPACE_RPM: &str = "httpd";

/// Query listing the user space rpm.
pub const USER_SPACE_RPM_QUERY: &str = formatcp!("rpm -qa | grep {USER_SPACE_RPM}");

/// Log of the user space rpm installation on the host.
pub const USER_SPACE_INSTALL_LOG: &str = formatcp!("/root/{USER_SPACE_RPM}.log");

// Services

/// Port of the cockpit web console.
pub const COCKPIT_PORT: u16 = 9090;

/// Line printed by `systemctl status` for a running unit.
pub const SYSTEMD_ACTIVE_MARKER: &str = "Active: active";

/// Host status reported by the management API for a running host.
pub const HOST_STATUS_UP: &str = "up";
