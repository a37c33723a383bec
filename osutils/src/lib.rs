pub mod exe;
pub mod findmnt;
pub mod imgbase;
pub mod iscsi;
pub mod lines;
pub mod lvs;
pub mod remote;
pub mod rpm;

#[cfg(any(test, feature = "test-utilities"))]
pub mod testutils;

pub(crate) mod crate_private {
    pub trait Sealed {}
}
