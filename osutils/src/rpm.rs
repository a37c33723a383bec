//! Helpers for rpm package names and `rpm -qa` output.

use std::collections::BTreeSet;

use crate::lines;

/// `index`-th `-`-separated field of a package file name.
///
/// `kmod-8021q-1.0-1.el7.x86_64.rpm`, 1 -> `8021q`
pub fn name_field(package: &str, index: usize) -> Option<&str> {
    package.split('-').nth(index)
}

/// Version field of the first package listed in `raw`.
///
/// `imgbased-0.9.30-0.1.el7ev.noarch` -> `0.9.30`
pub fn version_field(raw: &str) -> Option<&str> {
    lines::first_line(raw).and_then(|line| name_field(line, 1))
}

/// Set of packages listed by an `rpm -qa` query.
pub fn package_set(raw: &str) -> BTreeSet<String> {
    lines::line_set(raw)
}

/// Name of the first package linked from an HTML directory listing whose
/// line mentions `version`.
///
/// `<a href="redhat-virtualization-host-image-update-4.1-20170706.0.el7_3.noarch.rpm">`
/// -> `redhat-virtualization-host-image-update-4.1-20170706.0.el7_3.noarch.rpm`
pub fn find_package_link<'a>(listing: &'a str, version: &str) -> Option<&'a str> {
    listing
        .lines()
        .filter(|line| line.contains(version))
        .find_map(|line| line.split('"').nth(1))
        .map(str::trim)
        .filter(|link| !link.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;
    use maplit::btreeset;

    #[test]
    fn test_name_field() {
        assert_eq!(name_field("kmod-8021q-1.0-1.el7.x86_64.rpm", 1), Some("8021q"));
        assert_eq!(name_field("kmod", 1), None);
    }

    #[test]
    fn test_version_field() {
        assert_eq!(
            version_field("imgbased-0.9.30-0.1.el7ev.noarch\r\n"),
            Some("0.9.30")
        );
        assert_eq!(
            version_field("\nimgbased-0.9.31-0.1.el7ev.noarch\nimgbased-0.9.30-0.1.el7ev.noarch"),
            Some("0.9.31")
        );
        assert_eq!(version_field("imgbased"), None);
        assert_eq!(version_field(""), None);
    }

    #[test]
    fn test_package_set() {
        assert_eq!(
            package_set("httpd-2.4.6-45.el7.x86_64\r\nhttpd-tools-2.4.6-45.el7.x86_64\r\n"),
            btreeset! {
                "httpd-2.4.6-45.el7.x86_64".to_string(),
                "httpd-tools-2.4.6-45.el7.x86_64".to_string(),
            }
        );
    }

    #[test]
    fn test_find_package_link() {
        let listing = indoc! {r#"
            <html><body><h1>Index of /rhvh/update</h1>
            <a href="redhat-virtualization-host-image-update-4.1-20170531.0.el7_3.noarch.rpm">x</a>
            <a href="redhat-virtualization-host-image-update-4.1-20170706.0.el7_3.noarch.rpm">y</a>
            </body></html>
        "#};
        assert_eq!(
            find_package_link(listing, "4.1-20170706.0"),
            Some("redhat-virtualization-host-image-update-4.1-20170706.0.el7_3.noarch.rpm")
        );
        assert_eq!(find_package_link(listing, "4.2-20180101.0"), None);
    }
}
