//! The check point groups of an upgrade test, and the session they run in.

use std::cell::RefCell;

use log::{info, warn};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use osutils::remote::RemoteExecutor;
use upcheck_api::{
    config::RunConfig,
    constants::{
        PERSISTED_RPMS_BACKUP_PATH, PERSISTED_RPMS_PATH, REINSTALL_REPO_FILE, USER_SPACE_RPM,
    },
    error::UpcheckError,
    report::{CheckPointReport, CheckVerdict, RunReport},
    snapshot::{Phase, PhaseSnapshot},
};

use crate::{
    checks::{
        files,
        host::{self, Polling, RegisteredHost},
        logs,
        packages::{self, UserSpaceBaseline},
        services, Remote,
    },
    group::CheckGroup,
    rhvm::ManagementApi,
    rules::{gate, layout, mounts, versions, volumes, SnapshotPair},
    snapshot::{self, SnapshotStore},
    steps,
    web::WebProbe,
};

const ROLLBACK: &str = "rollback";
const REINSTALL_RPM: &str = "reinstall_rpm";
const ROLLBACK_CMD: &str = "imgbase rollback";

/// Check point groups, in the order they are listed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum CheckPointId {
    BasicUpgradeCheck,
    PackagesCheck,
    SettingsCheck,
    RollBackCheck,
    CannotUpdateCheck,
    CannotInstallCheck,
    CmdsCheck,
    SignedCheck,
    KnlSpaceRpmCheck,
    UsrSpaceRpmCheck,
    AvcDeniedCheck,
    IptablesStatusCheck,
    NtpdStatusCheck,
    SysstatCheck,
    OvirtImageioDaemonCheck,
    BootDmesgLogCheck,
    SeparateVolumesCheck,
    EtcVarFileUpdateCheck,
    ReinstallRpmCheck,
    UpdateAgainUnavailableCheck,
    NoSpaceUpdateCheck,
}

impl CheckPointId {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Groups that do not apply to upgrades from a 4.0 build.
    pub fn skips_legacy_source(&self) -> bool {
        matches!(
            self,
            Self::KnlSpaceRpmCheck
                | Self::UsrSpaceRpmCheck
                | Self::ReinstallRpmCheck
                | Self::UpdateAgainUnavailableCheck
                | Self::NoSpaceUpdateCheck
        )
    }

    /// Groups comparing the two snapshots.
    pub fn needs_snapshot_pair(&self) -> bool {
        matches!(
            self,
            Self::BasicUpgradeCheck | Self::PackagesCheck | Self::CmdsCheck
        )
    }
}

/// Groups that only read snapshots, evaluated without the host.
pub fn compare_snapshots(config: &RunConfig, pair: SnapshotPair) -> Vec<CheckPointReport> {
    vec![
        snapshot_basic_group(pair).evaluate(),
        packages_group(config, pair).evaluate(),
        cmds_group(config, pair).evaluate(),
    ]
}

fn snapshot_basic_group<'a>(pair: SnapshotPair<'a>) -> CheckGroup<'a> {
    CheckGroup::run_all(CheckPointId::BasicUpgradeCheck.name())
        .member(move || layout::imgbase_w(&pair))
        .member(move || layout::imgbase_layout(&pair))
        .member(move || layout::initiatorname_iscsi(&pair))
}

fn packages_group<'a>(config: &'a RunConfig, pair: SnapshotPair<'a>) -> CheckGroup<'a> {
    CheckGroup::run_all(CheckPointId::PackagesCheck.name())
        .member(move || versions::imgbased_ver(&pair))
        .member(move || versions::update_ver(&pair, &config.target_build))
}

fn cmds_group<'a>(config: &'a RunConfig, pair: SnapshotPair<'a>) -> CheckGroup<'a> {
    let gated = gate::needs_new_lv_check(
        &config.source_build,
        &config.target_build,
        config.new_volumes.cutoff,
    );
    info!("New volume layout applies: {gated}");

    CheckGroup::run_all(CheckPointId::CmdsCheck.name())
        .member(move || volumes::lvs(&pair, gated.then_some(&config.new_volumes.volumes)))
        .member(move || {
            mounts::findmnt(
                &pair,
                gated.then_some(config.new_volumes.mount_points.as_slice()),
            )
        })
}

/// Converts the result of a helper step into a verdict.
fn step_verdict<T>(rule: &str, result: Result<T, UpcheckError>) -> CheckVerdict {
    match result {
        Ok(_) => CheckVerdict::pass(rule, "done"),
        Err(e) => CheckVerdict::command_failed(rule, "helper step failed")
            .with_evidence("error", format!("{e:?}")),
    }
}

/// One upgrade test run against one host.
pub struct CheckPoints {
    config: RunConfig,
    executor: Box<dyn RemoteExecutor>,
    rhvm: Option<Box<dyn ManagementApi>>,
    probe: Box<dyn WebProbe>,
    snapshots: SnapshotStore,
    user_space_baseline: RefCell<UserSpaceBaseline>,
}

impl CheckPoints {
    pub fn new(
        config: RunConfig,
        executor: Box<dyn RemoteExecutor>,
        probe: Box<dyn WebProbe>,
    ) -> Self {
        Self {
            config,
            executor,
            rhvm: None,
            probe,
            snapshots: SnapshotStore::new(),
            user_space_baseline: RefCell::new(None),
        }
    }

    pub fn with_management_api(mut self, rhvm: Box<dyn ManagementApi>) -> Self {
        self.rhvm = Some(rhvm);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Collects the facts of `phase` from the host and stores them.
    pub fn collect(&mut self, phase: Phase) -> Result<&PhaseSnapshot, UpcheckError> {
        let snapshot = snapshot::collect(
            self.executor.as_ref(),
            phase,
            self.config.timeouts.command(),
        )?;
        self.add_snapshot(snapshot)?;
        self.snapshots.require(phase)
    }

    /// Stores a snapshot collected earlier.
    pub fn add_snapshot(&mut self, snapshot: PhaseSnapshot) -> Result<(), UpcheckError> {
        self.snapshots.insert(snapshot)
    }

    /// Evaluates `ids` in order.
    pub fn run(&mut self, ids: &[CheckPointId]) -> Result<RunReport, UpcheckError> {
        let mut check_points = Vec::with_capacity(ids.len());
        for id in ids {
            check_points.push(self.evaluate(*id)?);
        }
        self.snapshots.mark_evaluated();

        Ok(RunReport {
            source_build: self.config.source_build.as_str().to_string(),
            target_build: self.config.target_build.as_str().to_string(),
            check_points,
        })
    }

    /// Evaluates one check point group. Fails only when a snapshot the
    /// group reads has not been collected.
    pub fn evaluate(&self, id: CheckPointId) -> Result<CheckPointReport, UpcheckError> {
        let config = &self.config;
        let name = id.name();

        if id.skips_legacy_source() && config.source_build.is_legacy_release() {
            warn!("The source build is 4.0, no need to run {name}");
            return Ok(CheckGroup::single(
                name,
                CheckVerdict::not_applicable(
                    name,
                    format!("source build {} is a 4.0 build", config.source_build.as_str()),
                ),
            ));
        }

        let remote = Remote::new(self.executor.as_ref(), config.timeouts.command());
        let registered = self.registered_host();
        let polling = Polling {
            interval: config.timeouts.host_status_interval(),
            max_count: config.timeouts.host_status_max_count,
        };
        let baseline = &self.user_space_baseline;

        let report = match id {
            CheckPointId::BasicUpgradeCheck => {
                let pair = self.snapshots.pair()?;
                snapshot_basic_group(pair)
                    .member(|| host::cockpit_connection(self.probe.as_ref(), &config.host.address))
                    .member(move || host::host_status(registered, polling))
                    .evaluate()
            }
            CheckPointId::PackagesCheck => packages_group(config, self.snapshots.pair()?).evaluate(),
            CheckPointId::CmdsCheck => cmds_group(config, self.snapshots.pair()?).evaluate(),
            CheckPointId::SettingsCheck => self.files_group(name, remote, false).evaluate(),
            CheckPointId::EtcVarFileUpdateCheck => self.files_group(name, remote, true).evaluate(),
            CheckPointId::RollBackCheck => {
                let old = self.snapshots.require(Phase::Old)?;
                self.rollback_group(old, remote, registered, polling).evaluate()
            }
            CheckPointId::CannotUpdateCheck => {
                CheckGroup::single(name, packages::cannot_update(remote))
            }
            CheckPointId::CannotInstallCheck => {
                let package = config.update_rpm_url.as_ref().and_then(|listing| {
                    steps::update_rpm_name(self.probe.as_ref(), listing, &config.target_build)
                });
                CheckGroup::single(name, packages::cannot_install(remote, package.as_deref()))
            }
            CheckPointId::SignedCheck => {
                CheckGroup::single(name, packages::signed(remote, &config.target_build))
            }
            CheckPointId::KnlSpaceRpmCheck => CheckGroup::single(
                name,
                packages::kernel_space_rpm(remote, config.kernel_space_rpm.as_deref()),
            ),
            CheckPointId::UsrSpaceRpmCheck => CheckGroup::single(
                name,
                packages::user_space_rpm(remote, &mut baseline.borrow_mut()),
            ),
            CheckPointId::AvcDeniedCheck => CheckGroup::single(name, logs::avc_denied(remote)),
            CheckPointId::IptablesStatusCheck => CheckGroup::run_all(name)
                .member(|| services::iptables_status(remote))
                .member(|| services::firewalld_status(remote))
                .evaluate(),
            CheckPointId::NtpdStatusCheck => {
                CheckGroup::single(name, services::ntpd_status(remote))
            }
            CheckPointId::SysstatCheck => CheckGroup::single(name, logs::sysstat(remote)),
            CheckPointId::OvirtImageioDaemonCheck => {
                CheckGroup::single(name, services::ovirt_imageio_daemon(remote))
            }
            CheckPointId::BootDmesgLogCheck => {
                CheckGroup::single(name, logs::boot_dmesg_log(remote))
            }
            CheckPointId::SeparateVolumesCheck => CheckGroup::single(
                name,
                logs::separate_volumes(remote, config.separate_volume_count),
            ),
            CheckPointId::ReinstallRpmCheck => self.reinstall_group(remote).evaluate(),
            CheckPointId::UpdateAgainUnavailableCheck => {
                CheckGroup::single(name, host::update_again_unavailable(registered))
            }
            CheckPointId::NoSpaceUpdateCheck => {
                CheckGroup::single(name, packages::no_space_update(remote))
            }
        };

        Ok(report)
    }

    fn registered_host(&self) -> Option<RegisteredHost<'_>> {
        Some(RegisteredHost {
            api: self.rhvm.as_deref()?,
            name: self.config.host_name()?,
        })
    }

    /// Files written before the upgrade are still there. With `var`, the
    /// files under /var are checked too.
    fn files_group<'a>(&'a self, name: &'static str, remote: Remote<'a>, var: bool) -> CheckGroup<'a> {
        let files = &self.config.test_files;
        let mut expected = vec![
            (&files.add_file, &files.add_content),
            (&files.update_file, &files.update_content),
        ];
        if var {
            expected.push((&files.add_var_file, &files.add_content));
            expected.push((&files.update_var_log_file, &files.update_content));
        }

        expected
            .into_iter()
            .fold(CheckGroup::run_all(name), |group, (path, content)| {
                group.member(move || files::file_contains(remote, path, content))
            })
    }

    /// Rolls back to the old layer, reboots into it and checks that the
    /// host is back to its state before the upgrade.
    fn rollback_group<'a>(
        &'a self,
        old: &'a PhaseSnapshot,
        remote: Remote<'a>,
        registered: Option<RegisteredHost<'a>>,
        polling: Polling,
    ) -> CheckGroup<'a> {
        let mut group = CheckGroup::sequential(CheckPointId::RollBackCheck.name())
            .member(move || {
                info!("Roll back");
                let result = remote.run(ROLLBACK_CMD);
                if result.success {
                    CheckVerdict::pass(ROLLBACK, "imgbase rollback succeeded")
                } else {
                    CheckVerdict::command_failed(ROLLBACK, "imgbase rollback failed")
                        .with_evidence(ROLLBACK_CMD, result.output)
                }
            })
            .member(move || {
                match steps::enter_system(remote.executor, &self.config.timeouts, true) {
                    Ok(layer) if layer.trim() == old.imgbase_w().trim() => CheckVerdict::pass(
                        ROLLBACK,
                        format!("host is back on '{}'", layer.trim()),
                    ),
                    Ok(layer) => CheckVerdict::mismatch(ROLLBACK, "host is not on the old layer")
                        .with_evidence("old", old.imgbase_w())
                        .with_evidence("current", layer),
                    Err(e) => step_verdict(ROLLBACK, Err::<(), _>(e)),
                }
            })
            .member(move || host::host_status(registered, polling));

        if !self.config.source_build.is_legacy_release() {
            let baseline = &self.user_space_baseline;
            group = group.member(move || packages::user_space_rpm(remote, &mut baseline.borrow_mut()));
        }
        group
    }

    /// With the persisted rpms moved away the user space rpm is gone; it is
    /// reinstalled from the reinstall repo and must then match the baseline.
    fn reinstall_group<'a>(&'a self, remote: Remote<'a>) -> CheckGroup<'a> {
        info!("Start to check reinstall rpms...");
        let baseline = &self.user_space_baseline;

        CheckGroup::sequential(CheckPointId::ReinstallRpmCheck.name())
            .member(move || {
                let before = packages::user_space_rpm(remote, &mut baseline.borrow_mut());
                if before.is_pass() {
                    CheckVerdict::mismatch(
                        REINSTALL_RPM,
                        format!("{USER_SPACE_RPM} is installed before reinstallation"),
                    )
                } else {
                    CheckVerdict::pass(REINSTALL_RPM, format!("{USER_SPACE_RPM} is not installed"))
                }
            })
            .member(move || {
                step_verdict(
                    REINSTALL_RPM,
                    steps::put_repo_to_host(remote.executor, &self.config.repo_dir, REINSTALL_REPO_FILE),
                )
            })
            .member(move || {
                step_verdict(
                    REINSTALL_RPM,
                    steps::move_rpm_packages(remote, PERSISTED_RPMS_BACKUP_PATH, PERSISTED_RPMS_PATH),
                )
            })
            .member(move || step_verdict(REINSTALL_RPM, steps::install_user_space_rpm(remote)))
            .member(move || packages::user_space_rpm(remote, &mut baseline.borrow_mut()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{path::PathBuf, str::FromStr};

    use anyhow::Error;
    use strum::IntoEnumIterator;

    use osutils::testutils::MockExecutor;
    use upcheck_api::{
        constants::USER_SPACE_RPM_QUERY,
        error::{ErrorKind, SessionError},
        report::{FailureKind, GroupOutcome},
    };

    use crate::{
        rhvm::HostRecord,
        snapshot::tests::{new_facts, old_facts, snapshot},
        steps::tests::StaticListing,
    };

    const HTTPD: &str = "httpd-2.4.6-67.el7.x86_64\nhttpd-tools-2.4.6-67.el7.x86_64";

    fn config(source: &str) -> RunConfig {
        RunConfig::from_yaml(&format!(
            "source-build: redhat-virtualization-host-{source}\n\
             target-build: redhat-virtualization-host-4.1-20170706.0\n\
             host:\n  address: 10.66.148.9\n\
             rhvm:\n  fqdn: rhvm.example.com\n  host-name: upgrade_host\n  password: secret\n\
             update-rpm-url: http://repo.example.com/rhvh/updates/\n\
             timeouts:\n  host-status-interval-secs: 0\n  host-status-max-count: 2\n  \
             enter-system-interval-secs: 0\n  enter-system-max-count: 2\n"
        ))
        .unwrap()
    }

    /// Registered and up, without further updates.
    struct HostUp;

    impl ManagementApi for HostUp {
        fn list_host(&self, name: &str) -> Result<Option<HostRecord>, Error> {
            Ok(Some(HostRecord {
                name: name.into(),
                status: "up".into(),
                update_available: false,
            }))
        }
    }

    fn session(source: &str, executor: MockExecutor) -> CheckPoints {
        CheckPoints::new(config(source), Box::new(executor), Box::new(StaticListing))
            .with_management_api(Box::new(HostUp))
    }

    fn with_snapshots(mut check_points: CheckPoints) -> CheckPoints {
        check_points
            .add_snapshot(snapshot(Phase::Old, old_facts()))
            .unwrap();
        check_points
            .add_snapshot(snapshot(Phase::New, new_facts()))
            .unwrap();
        check_points
    }

    #[test]
    fn test_check_point_names() {
        assert_eq!(CheckPointId::iter().count(), 21);
        assert_eq!(
            CheckPointId::OvirtImageioDaemonCheck.name(),
            "ovirt_imageio_daemon_check"
        );
        assert_eq!(
            CheckPointId::from_str("knl_space_rpm_check").unwrap(),
            CheckPointId::KnlSpaceRpmCheck
        );
        assert_eq!(
            CheckPointId::iter().filter(CheckPointId::skips_legacy_source).count(),
            5
        );
    }

    #[test]
    fn test_compare_snapshots() {
        let config = config("4.1-20170522.0");
        let (old, new) = (
            snapshot(Phase::Old, old_facts()),
            snapshot(Phase::New, new_facts()),
        );
        let reports = compare_snapshots(&config, SnapshotPair { old: &old, new: &new });

        let names: Vec<_> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["basic_upgrade_check", "packages_check", "cmds_check"]);
        for report in &reports {
            assert!(report.passed(), "{report:?}");
        }
    }

    #[test]
    fn test_basic_upgrade_check() {
        let check_points = with_snapshots(session("4.1-20170522.0", MockExecutor::new()));
        let report = check_points
            .evaluate(CheckPointId::BasicUpgradeCheck)
            .unwrap();
        assert!(report.passed(), "{report:?}");
        assert_eq!(report.verdicts.len(), 5);
    }

    #[test]
    fn test_snapshot_groups_need_both_phases() {
        let mut check_points = session("4.1-20170522.0", MockExecutor::new());
        check_points
            .add_snapshot(snapshot(Phase::Old, old_facts()))
            .unwrap();

        let err = check_points.evaluate(CheckPointId::CmdsCheck).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::Session(SessionError::PhaseNotCollected { phase: Phase::New })
        );
    }

    #[test]
    fn test_legacy_source_skips_gated_groups() {
        let executor = MockExecutor::new();
        let check_points = session("4.0-20170307.0", executor);
        for id in CheckPointId::iter().filter(CheckPointId::skips_legacy_source) {
            let report = check_points.evaluate(id).unwrap();
            assert_eq!(report.outcome, GroupOutcome::NotApplicable, "{id}");
        }
    }

    #[test]
    fn test_run_reports_every_group() {
        let executor = MockExecutor::new()
            .with_output("cat '/etc/upgrade_test'", true, "test")
            .with_output("cat '/etc/my.cnf'", true, "# test")
            .with_output("yum update", false, "No packages marked for update");
        let mut check_points = with_snapshots(session("4.1-20170522.0", executor));

        let report = check_points
            .run(&[
                CheckPointId::PackagesCheck,
                CheckPointId::SettingsCheck,
                CheckPointId::CannotUpdateCheck,
                CheckPointId::SysstatCheck,
            ])
            .unwrap();

        assert_eq!(report.source_build, "redhat-virtualization-host-4.1-20170522.0");
        assert_eq!(report.check_points.len(), 4);
        assert!(report.check_points[..3].iter().all(CheckPointReport::passed));
        // Nothing scripted for sysstat.
        assert!(report.check_points[3].failed());
        assert!(!report.succeeded());
        assert_eq!(
            check_points.snapshots().state(),
            crate::snapshot::RunState::RulesEvaluated
        );
    }

    #[test]
    fn test_etc_var_file_update_check() {
        let executor = MockExecutor::new()
            .with_output("cat '/etc/upgrade_test'", true, "test")
            .with_output("cat '/etc/my.cnf'", true, "# test")
            .with_output("cat '/var/upgrade_test_var'", true, "test");
        let check_points = session("4.1-20170522.0", executor);

        let report = check_points
            .evaluate(CheckPointId::EtcVarFileUpdateCheck)
            .unwrap();
        // All four files are checked even though the last one is missing.
        assert_eq!(report.verdicts.len(), 4);
        assert_eq!(report.outcome, GroupOutcome::Fail);
        assert_eq!(
            report.verdicts[3].rule,
            "file_contains:/var/log/maillog"
        );
    }

    #[test]
    fn test_cannot_install_check() {
        let executor = MockExecutor::new().with_output(
            "yum install /root/redhat-virtualization-host-image-update-4.1-20170706.0.el7_3.noarch.rpm",
            false,
            "Error: Nothing to do",
        );
        let check_points = session("4.1-20170522.0", executor);
        let report = check_points.evaluate(CheckPointId::CannotInstallCheck).unwrap();
        assert!(report.passed(), "{report:?}");
    }

    #[test]
    fn test_roll_back_check() {
        let old_layer = old_facts()[&upcheck_api::snapshot::Fact::ImgbaseW].clone();
        let executor = MockExecutor::new()
            .with_output(ROLLBACK_CMD, true, "")
            .with_output("imgbase w", true, &old_layer)
            .with_output(USER_SPACE_RPM_QUERY, true, HTTPD);
        let mut check_points = session("4.1-20170522.0", executor);
        check_points
            .add_snapshot(snapshot(Phase::Old, old_facts()))
            .unwrap();

        let report = check_points.evaluate(CheckPointId::RollBackCheck).unwrap();
        assert!(report.passed(), "{report:?}");
        assert_eq!(report.verdicts.len(), 4);
    }

    #[test]
    fn test_roll_back_check_stops_at_failure() {
        let executor = MockExecutor::new().with_output(ROLLBACK_CMD, false, "No base layer");
        let mut check_points = session("4.1-20170522.0", executor);
        check_points
            .add_snapshot(snapshot(Phase::Old, old_facts()))
            .unwrap();

        let report = check_points.evaluate(CheckPointId::RollBackCheck).unwrap();
        assert!(report.failed());
        assert_eq!(report.verdicts.len(), 1);
        assert_eq!(
            report.verdicts[0].failure_kind(),
            Some(FailureKind::CommandFailed)
        );
    }

    #[test]
    fn test_reinstall_rpm_check() {
        let executor = MockExecutor::new()
            // Baseline before the upgrade, gone after it, back after reinstalling.
            .with_output(USER_SPACE_RPM_QUERY, true, HTTPD)
            .with_output(USER_SPACE_RPM_QUERY, false, "")
            .with_output(USER_SPACE_RPM_QUERY, true, HTTPD)
            .with_output(
                "mv /var/rpms-bak/* /var/imgbased/persisted-rpms",
                true,
                "",
            )
            .with_output("yum install -y httpd > /root/httpd.log", true, "");
        let check_points = session("4.1-20170522.0", executor);

        assert!(check_points
            .evaluate(CheckPointId::UsrSpaceRpmCheck)
            .unwrap()
            .passed());
        let report = check_points.evaluate(CheckPointId::ReinstallRpmCheck).unwrap();
        assert!(report.passed(), "{report:?}");
        assert_eq!(report.verdicts.len(), 5);
    }

    #[test]
    fn test_reinstall_rpm_check_upload_failure() {
        let executor = MockExecutor::new().with_failing_uploads();
        let mut config = config("4.1-20170522.0");
        config.repo_dir = PathBuf::from("/srv/repos");
        let check_points = CheckPoints::new(config, Box::new(executor), Box::new(StaticListing));

        let report = check_points.evaluate(CheckPointId::ReinstallRpmCheck).unwrap();
        assert!(report.failed());
        assert_eq!(report.verdicts.len(), 2);
        assert!(report.verdicts[1].evidence[0].value.contains("/srv/repos/rhel73.repo"));
    }

    #[test]
    fn test_update_again_unavailable_without_api() {
        let check_points = CheckPoints::new(
            config("4.1-20170522.0"),
            Box::new(MockExecutor::new()),
            Box::new(StaticListing),
        );
        let report = check_points
            .evaluate(CheckPointId::UpdateAgainUnavailableCheck)
            .unwrap();
        assert_eq!(report.outcome, GroupOutcome::NotApplicable);

        let report = session("4.1-20170522.0", MockExecutor::new())
            .evaluate(CheckPointId::UpdateAgainUnavailableCheck)
            .unwrap();
        assert!(report.passed());
    }
}
