use std::path::Path;

use log::error;

use upcheck_api::report::CheckVerdict;

use super::Remote;

/// `path` on the host still contains `content`. The rule is named after the
/// file so that several of these can sit in one group.
pub fn file_contains(remote: Remote, path: &Path, content: &str) -> CheckVerdict {
    let rule = format!("file_contains:{}", path.display());
    let path = path.to_string_lossy();

    if remote.check_strs_in_file(&path, &[content]) {
        CheckVerdict::pass(rule, format!("'{path}' contains '{content}'"))
    } else {
        error!("'{path}' does not contain '{content}'");
        CheckVerdict::mismatch(rule, format!("'{path}' does not contain '{content}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use osutils::testutils::MockExecutor;

    #[test]
    fn test_file_contains() {
        let executor = MockExecutor::new()
            .with_output("cat '/etc/upgrade_test'", true, "test")
            .with_output("cat '/etc/my.cnf'", true, "[mysqld]\ndatadir=/var/lib/mysql");
        let remote = Remote::new(&executor, Duration::from_secs(5));

        let verdict = file_contains(remote, Path::new("/etc/upgrade_test"), "test");
        assert!(verdict.is_pass());
        assert_eq!(verdict.rule, "file_contains:/etc/upgrade_test");

        assert!(file_contains(remote, Path::new("/etc/my.cnf"), "# test").is_fail());
        // The file is missing.
        assert!(file_contains(remote, Path::new("/var/upgrade_test_var"), "test").is_fail());
    }
}
