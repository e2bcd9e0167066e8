//! Error type shared by the grammar walker and the execution runtime.
//!
//! Every failure surfaces as an [`EngineError`]: a message, a phase
//! discriminator, and the source coordinates of the offending element when
//! they are known. The display form is the message alone so callers can match
//! on it directly.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::SourceInformation;

/// Result alias used throughout the workspace.
pub type EngineResult<T> = Result<T, EngineError>;

/// Phase in which an [`EngineError`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineErrorKind {
    Parser,
    Compilation,
    Execution,
}

impl EngineErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineErrorKind::Parser => "PARSER",
            EngineErrorKind::Compilation => "COMPILATION",
            EngineErrorKind::Execution => "EXECUTION",
        }
    }
}

/// Structured failure raised while parsing, building, or executing.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
    #[serde(rename = "sourceInformation", skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

impl EngineError {
    pub fn new(
        kind: EngineErrorKind,
        message: impl Into<String>,
        source_information: Option<SourceInformation>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source_information,
        }
    }

    /// Parse-phase error at a known location.
    pub fn parser(message: impl Into<String>, source_information: SourceInformation) -> Self {
        Self::new(EngineErrorKind::Parser, message, Some(source_information))
    }

    /// Compilation-phase error.
    pub fn compilation(message: impl Into<String>, source_information: SourceInformation) -> Self {
        Self::new(
            EngineErrorKind::Compilation,
            message,
            Some(source_information),
        )
    }

    /// Execution-phase error; these typically have no source coordinates.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Execution, message, None)
    }

    pub fn with_source_information(mut self, source_information: SourceInformation) -> Self {
        self.source_information = Some(source_information);
        self
    }
}
