//! Reading `/etc/iscsi/initiatorname.iscsi`.

/// Host specific part of the initiator name: the text after the last `:`.
///
/// `InitiatorName=iqn.1994-05.com.redhat:2f4ab7e1c2` -> `2f4ab7e1c2`
pub fn iqn_suffix(raw: &str) -> &str {
    raw.rsplit(':').next().unwrap_or(raw).trim()
}
