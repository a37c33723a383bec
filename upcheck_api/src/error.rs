use std::fmt::{Debug, Write};
use std::{borrow::Cow, panic::Location};

use serde::{ser::SerializeStruct, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::snapshot::{Fact, Phase};

/// A snapshot could not be captured from the host.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionError {
    #[error("Failed to collect fact '{fact}' for phase '{phase}' with '{command}'")]
    CommandFailed {
        phase: Phase,
        fact: Fact,
        command: String,
    },
    #[error("Snapshot for phase '{phase}' is missing fact '{fact}'")]
    MissingFact { phase: Phase, fact: Fact },
}

/// User provided input was invalid.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidInputError {
    #[error("Failed to load run configuration from '{path}'")]
    LoadRunConfig { path: String },
    #[error("Failed to parse run configuration")]
    ParseRunConfig,
    #[error("Failed to load snapshot from '{path}'")]
    LoadSnapshot { path: String },
    #[error("Failed to parse snapshot")]
    ParseSnapshot,
    #[error("Failed to write '{path}'")]
    WriteOutput { path: String },
    #[error("Snapshot file holds phase '{found}', expected '{expected}'")]
    UnexpectedPhase { expected: Phase, found: Phase },
}

/// The snapshot store was used out of order.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum SessionError {
    #[error("Snapshot for phase '{phase}' was already collected")]
    PhaseAlreadyCollected { phase: Phase },
    #[error("Snapshot for phase '{phase}' has not been collected")]
    PhaseNotCollected { phase: Phase },
}

/// A remote step outside of a check rule failed.
#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteError {
    #[error("Failed to copy '{path}' to the host")]
    PutFile { path: String },
    #[error("Failed to run '{command}' on the host")]
    RunCommand { command: String },
    #[error("Failed to re-enter the system after reboot")]
    EnterSystem,
    #[error("Failed to set up the client for '{endpoint}'")]
    Client { endpoint: String },
}

#[derive(Debug, Eq, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum InternalError {
    #[error("Internal error: {0}")]
    Internal(&'static str),
    #[error("Upcheck panicked: {0}")]
    Panic(String),
}

/// Each variant of `ErrorKind` corresponds to a different category of error.
/// Check rules never produce these: a failing rule is a verdict, not an error.
#[derive(Debug, Eq, thiserror::Error, IntoStaticStr, PartialEq)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// A snapshot could not be collected, so comparison cannot proceed.
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// Configuration or input files were invalid.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    /// Snapshots were written twice or read before being collected.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A helper step talking to the host or management API failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A bug in upcheck.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug)]
struct UpcheckErrorInner {
    kind: ErrorKind,
    location: &'static Location<'static>,
    source: Option<anyhow::Error>,
    context: Vec<(Cow<'static, str>, &'static Location<'static>)>,
}

pub struct UpcheckError(Box<UpcheckErrorInner>);
impl UpcheckError {
    #[track_caller]
    pub fn new(kind: impl Into<ErrorKind>) -> Self {
        UpcheckError(Box::new(UpcheckErrorInner {
            kind: kind.into(),
            location: Location::caller(),
            source: None,
            context: Vec::new(),
        }))
    }

    #[track_caller]
    pub fn with_source(kind: impl Into<ErrorKind>, source: anyhow::Error) -> Self {
        UpcheckError(Box::new(UpcheckErrorInner {
            kind: kind.into(),
            location: Location::caller(),
            source: Some(source),
            context: Vec::new(),
        }))
    }

    #[track_caller]
    pub fn internal(msg: &'static str) -> Self {
        Self::new(InternalError::Internal(msg))
    }

    pub fn unstructured(self, context: impl Into<Cow<'static, str>>) -> anyhow::Error {
        match self.0.source {
            Some(source) => source.context(self.0.kind).context(context.into()),
            None => anyhow::Error::from(self.0.kind).context(context.into()),
        }
    }

    /// Returns a reference to the inner ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }
}

pub trait ReportError<T, K> {
    /// Convert this error into a structured UpcheckError.
    fn structured(self, kind: K) -> Result<T, UpcheckError>;
}

impl<T, K> ReportError<T, K> for Option<T>
where
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, UpcheckError> {
        match self {
            Some(t) => Ok(t),
            None => Err(UpcheckError::new(kind)),
        }
    }
}

impl<T, E, K> ReportError<T, K> for Result<T, E>
where
    E: Into<anyhow::Error>,
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, UpcheckError> {
        match self {
            Ok(o) => Ok(o),
            Err(e) => Err(UpcheckError::with_source(kind, e.into())),
        }
    }
}

pub trait UpcheckResultExt<T> {
    /// Attach a context message to the error.
    fn message(self, context: impl Into<Cow<'static, str>>) -> Result<T, UpcheckError>;

    /// Convert the error into an unstructured error.
    fn unstructured(self, context: impl Into<Cow<'static, str>>) -> Result<T, anyhow::Error>;
}
impl<T> UpcheckResultExt<T> for Result<T, UpcheckError> {
    #[track_caller]
    fn message(mut self, context: impl Into<Cow<'static, str>>) -> Result<T, UpcheckError> {
        if let Err(ref mut e) = self {
            e.0.context.push((context.into(), Location::caller()));
        }
        self
    }

    fn unstructured(self, context: impl Into<Cow<'static, str>>) -> Result<T, anyhow::Error> {
        self.map_err(|e| e.unstructured(context))
    }
}

impl Serialize for UpcheckError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("upcheck-error", 5)?;
        state.serialize_field("message", &self.0.kind.to_string())?;
        match self.0.kind {
            ErrorKind::Collection(ref e) => state.serialize_field("error", e)?,
            ErrorKind::InvalidInput(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Session(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Remote(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Internal(ref e) => state.serialize_field("error", e)?,
        }
        state.serialize_field("category", <&str>::from(&self.0.kind))?;
        state.serialize_field(
            "location",
            &format!("{}:{}", self.0.location.file(), self.0.location.line()),
        )?;
        match self.0.source {
            Some(ref e) => state.serialize_field("cause", &Some(format!("{:?}", e)))?,
            None => state.serialize_field("cause", &None::<String>)?,
        }
        state.end()
    }
}

impl Debug for UpcheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.0.kind,
            self.0.location.file(),
            self.0.location.line()
        )?;

        if !self.0.context.is_empty() {
            writeln!(f, "\n\nContext:")?;
            for (i, (context, location)) in self.0.context.iter().enumerate() {
                for (j, line) in context.split('\n').enumerate() {
                    if j == 0 {
                        write!(f, "{: >5}: ", i)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                writeln!(f, " at {}:{}", location.file(), location.line())?;
            }
        }

        if let Some(ref source) = self.0.source {
            writeln!(f, "\n\nCaused by:")?;
            let mut index = 0;
            let mut source: Option<&dyn std::error::Error> = Some(source.as_ref());
            while let Some(e) = source {
                for (i, line) in e.to_string().split('\n').enumerate() {
                    if i == 0 {
                        write!(f, "{: >5}: ", index)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                f.write_char('\n')?;
                source = e.source();
                index += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use serde_yaml::Value;

    use super::*;

    #[test]
    fn test_error_serialize() {
        let e = UpcheckError(Box::new(UpcheckErrorInner {
            kind: ErrorKind::Collection(CollectionError::CommandFailed {
                phase: Phase::Old,
                fact: Fact::Lvs,
                command: "lvs".into(),
            }),
            location: Location::caller(),
            source: Some(
                std::fs::read("/non-existant-file")
                    .context("failed to read file")
                    .unwrap_err(),
            ),
            context: Vec::new(),
        }));
        match serde_yaml::to_value(e).unwrap() {
            Value::Mapping(m) => {
                assert_eq!(m.len(), 5);
                match m["error"] {
                    Value::Mapping(ref inner) => {
                        assert!(inner.contains_key("command-failed"));
                    }
                    _ => panic!("error isn't mapping"),
                }
                assert_eq!(m["category"], Value::String("collection".into()));
                assert!(matches!(m["cause"], Value::String(_)));
                assert_eq!(
                    m["message"],
                    Value::String("Failed to collect fact 'lvs' for phase 'old' with 'lvs'".into())
                );
                match m["location"] {
                    Value::String(ref s) => assert!(s.contains("error.rs:")),
                    _ => panic!("location isn't string"),
                }
            }
            _ => panic!("value isn't mapping"),
        }
    }

    #[test]
    fn test_error_debug() {
        let error = Err::<(), _>(anyhow::anyhow!("z"))
            .context("x\ny")
            .structured(InternalError::Internal("w"))
            .unwrap_err();
        assert_eq!(
            format!("{:?}", error),
            format!(
                "Internal error: w at {}:{}\n\nCaused by:\n    0: x\n       y\n    1: z\n",
                error.0.location.file(),
                error.0.location.line(),
            ),
        );
    }

    #[test]
    fn test_error_message_context() {
        let error = Err::<(), _>(UpcheckError::new(SessionError::PhaseNotCollected {
            phase: Phase::New,
        }))
        .message("Cannot compare snapshots")
        .unwrap_err();

        assert!(matches!(
            error.kind(),
            ErrorKind::Session(SessionError::PhaseNotCollected { phase: Phase::New })
        ));
        let rendered = format!("{error:?}");
        assert!(rendered.contains("Snapshot for phase 'new' has not been collected"));
        assert!(rendered.contains("Context:"));
        assert!(rendered.contains("Cannot compare snapshots"));
    }
}
