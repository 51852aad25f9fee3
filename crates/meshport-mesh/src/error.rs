use std::path::PathBuf;

/// Errors raised while turning a source object into a [`MeshModel`](crate::MeshModel).
///
/// Missing geometry and undecodable compressed payloads are not errors; they
/// are reported through [`GeometrySource`](crate::GeometrySource) on the model.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("mesh '{mesh}': submesh {submesh} is malformed: {reason}")]
    MalformedSubmesh {
        mesh: String,
        submesh: usize,
        reason: String,
    },

    #[error("mesh '{mesh}': required field '{field}' is missing")]
    MissingField { mesh: String, field: String },

    #[error("mesh '{mesh}': field '{field}' is invalid, expected {expected}")]
    InvalidField {
        mesh: String,
        field: String,
        expected: String,
    },

    #[error("mesh '{mesh}': {attribute} count {found} does not match vertex count {expected}")]
    AttributeCountMismatch {
        mesh: String,
        attribute: &'static str,
        expected: usize,
        found: usize,
    },
}

impl MeshError {
    /// Short name of the failure kind, used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            MeshError::MalformedSubmesh { .. } => "malformed submesh",
            MeshError::MissingField { .. } => "missing field",
            MeshError::InvalidField { .. } => "invalid field",
            MeshError::AttributeCountMismatch { .. } => "attribute count mismatch",
        }
    }

    pub(crate) fn invalid(mesh: &str, field: impl Into<String>, expected: &str) -> Self {
        MeshError::InvalidField {
            mesh: mesh.to_string(),
            field: field.into(),
            expected: expected.to_string(),
        }
    }

    pub(crate) fn malformed(mesh: &str, submesh: usize, reason: impl Into<String>) -> Self {
        MeshError::MalformedSubmesh {
            mesh: mesh.to_string(),
            submesh,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while writing a mesh to its destination.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to create '{0}': {1}")]
    Create(PathBuf, #[source] std::io::Error),

    #[error("failed to write mesh data: {0}")]
    Write(#[from] std::io::Error),

    #[error("mesh '{0}' carries compressed vertex data that cannot be decoded")]
    UnsupportedCompression(String),
}

impl ExportError {
    /// Short name of the failure kind, used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::Create(..) | ExportError::Write(_) => "i/o",
            ExportError::UnsupportedCompression(_) => "unsupported compression",
        }
    }
}
