use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{CollectionError, UpcheckError};

/// Point in the verification timeline a snapshot was taken at.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Before the upgrade.
    Old,
    /// After the upgrade.
    New,
}

/// A fact captured from the host. Declaration order is collection order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Fact {
    ImgbasedVer,
    UpdateVer,
    ImgbaseW,
    ImgbaseLayout,
    InitiatornameIscsi,
    Lvs,
    Findmnt,
}

impl Fact {
    /// Shell command that produces this fact on the host.
    pub fn command(&self) -> &'static str {
        match self {
            Fact::ImgbasedVer => "rpm -qa |grep --color=never imgbased",
            Fact::UpdateVer => "rpm -qa |grep --color=never update",
            Fact::ImgbaseW => "imgbase w",
            Fact::ImgbaseLayout => "imgbase layout",
            Fact::InitiatornameIscsi => "cat /etc/iscsi/initiatorname.iscsi",
            Fact::Lvs => "lvs -a -o lv_name,lv_size, --unit=m --noheadings --separator ' '",
            Fact::Findmnt => "findmnt -r -n",
        }
    }
}

/// Raw, on-disk shape of a snapshot. Only used to validate into
/// `PhaseSnapshot`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSnapshot {
    phase: Phase,
    facts: BTreeMap<Fact, String>,
}

/// Every fact captured for one phase, stored verbatim.
///
/// A snapshot always holds all facts: construction, including
/// deserialization, fails when any fact is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSnapshot")]
pub struct PhaseSnapshot {
    phase: Phase,
    facts: BTreeMap<Fact, String>,
}

impl PhaseSnapshot {
    /// Builds a snapshot, checking that every fact is present.
    pub fn new(phase: Phase, facts: BTreeMap<Fact, String>) -> Result<Self, UpcheckError> {
        if let Some(fact) = Fact::iter().find(|f| !facts.contains_key(f)) {
            return Err(UpcheckError::new(CollectionError::MissingFact { phase, fact }));
        }

        Ok(Self { phase, facts })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Raw text captured for `fact`.
    pub fn get(&self, fact: Fact) -> &str {
        // Presence of every fact is checked in `new`.
        self.facts.get(&fact).map(String::as_str).unwrap_or_default()
    }

    pub fn imgbased_ver(&self) -> &str {
        self.get(Fact::ImgbasedVer)
    }

    pub fn update_ver(&self) -> &str {
        self.get(Fact::UpdateVer)
    }

    pub fn imgbase_w(&self) -> &str {
        self.get(Fact::ImgbaseW)
    }

    pub fn imgbase_layout(&self) -> &str {
        self.get(Fact::ImgbaseLayout)
    }

    pub fn initiatorname_iscsi(&self) -> &str {
        self.get(Fact::InitiatornameIscsi)
    }

    pub fn lvs(&self) -> &str {
        self.get(Fact::Lvs)
    }

    pub fn findmnt(&self) -> &str {
        self.get(Fact::Findmnt)
    }
}

impl TryFrom<RawSnapshot> for PhaseSnapshot {
    type Error = String;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        PhaseSnapshot::new(raw.phase, raw.facts).map_err(|e| e.kind().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;

    fn full_facts() -> BTreeMap<Fact, String> {
        Fact::iter()
            .map(|f| (f, format!("output of {}", f.command())))
            .collect()
    }

    #[test]
    fn test_fact_order() {
        let order: Vec<&'static str> = Fact::iter().map(|f| f.into()).collect();
        assert_eq!(
            order,
            vec![
                "imgbased_ver",
                "update_ver",
                "imgbase_w",
                "imgbase_layout",
                "initiatorname_iscsi",
                "lvs",
                "findmnt"
            ]
        );
    }

    #[test]
    fn test_new_requires_every_fact() {
        let snapshot = PhaseSnapshot::new(Phase::Old, full_facts()).unwrap();
        assert_eq!(snapshot.phase(), Phase::Old);
        assert_eq!(snapshot.imgbase_w(), "output of imgbase w");

        let mut facts = full_facts();
        facts.remove(&Fact::Lvs);
        let err = PhaseSnapshot::new(Phase::New, facts).unwrap_err();
        assert_eq!(
            err.kind().to_string(),
            "Snapshot for phase 'new' is missing fact 'lvs'"
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let yaml = indoc! {r#"
            phase: old
            facts:
              imgbased_ver: imgbased-0.9.30-0.1.el7ev.noarch
              update_ver: redhat-virtualization-host-image-update-placeholder-4.1-3.0.el7.noarch
              imgbase_w: "You are on rhvh-4.1-0.20170522.0+1"
              imgbase_layout: "rhvh-4.1-0.20170522.0\n +- rhvh-4.1-0.20170522.0+1"
              initiatorname_iscsi: InitiatorName=iqn.1994-05.com.redhat:2f4ab7e1c2
              lvs: "root 10240.00m"
              findmnt: "/ /dev/mapper/rhvh-rhvh--4.1--0.20170522.0+1 ext4 rw"
        "#};
        let snapshot: PhaseSnapshot = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(snapshot.lvs(), "root 10240.00m");

        let missing = indoc! {r#"
            phase: new
            facts:
              imgbase_w: "You are on rhvh-4.1-0.20170522.0+1"
        "#};
        let err = serde_yaml::from_str::<PhaseSnapshot>(missing).unwrap_err();
        assert!(err.to_string().contains("missing fact 'imgbased_ver'"));

        let unknown = indoc! {r#"
            phase: new
            facts:
              os_release: "NAME=RHVH"
        "#};
        serde_yaml::from_str::<PhaseSnapshot>(unknown).unwrap_err();
    }

    #[test]
    fn test_round_trip_through_yaml() {
        let snapshot = PhaseSnapshot::new(Phase::New, full_facts()).unwrap();
        let yaml = serde_yaml::to_string(&snapshot).unwrap();
        let parsed: PhaseSnapshot = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(snapshot, parsed);
    }
}
