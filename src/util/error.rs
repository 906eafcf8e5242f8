//! Error types for the renderer.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scene, BVH and GPU operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Compute kernel failed to compile or validate
    #[error("Kernel build failed:\n{log}")]
    KernelBuild { log: String },

    /// Display program (vertex + fragment) failed to compile or validate
    #[error("Display program build failed:\n{log}")]
    ProgramBuild { log: String },

    /// Device image or buffer could not be created
    #[error("Failed to create {resource}: {reason}")]
    ResourceCreation { resource: String, reason: String },

    /// No compatible GPU adapter
    #[error("No compatible GPU adapter found: {0}")]
    NoAdapter(String),

    /// Adapter refused to create a device
    #[error("Failed to request GPU device: {0}")]
    RequestDevice(String),

    /// Backend used before `create_window` / `build_kernel`
    #[error("Backend not initialized: {0}")]
    NotInitialized(&'static str),

    /// Shared image acquired while compute already holds it
    #[error("Shared image is already held by compute")]
    ImageBusy,

    /// Compute-only operation attempted while display owns the image
    #[error("Shared image is not acquired for compute")]
    ImageNotAcquired,

    /// Kernel argument missing at dispatch time
    #[error("Kernel argument '{0}' is not bound")]
    UnboundKernelArg(&'static str),

    /// Value bound to a kernel argument of another kind
    #[error("Kernel argument '{arg}' expects {expected}, got {actual}")]
    KernelArgMismatch {
        arg: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// BVH leaf holds more primitives than the GPU node can address
    #[error("BVH leaf with {count} primitives exceeds GPU limit of {max}")]
    LeafTooLarge { count: usize, max: usize },

    /// Unknown program handle passed to the program service
    #[error("Unknown program handle: {0}")]
    UnknownProgram(u32),

    /// Unknown scene preset name
    #[error("Unknown scene: {0}")]
    UnknownScene(String),

    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Source file could not be read
    #[error("Failed to read {path}: {source}")]
    SourceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding error
    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a resource creation error.
    pub fn resource(resource: impl Into<String>, reason: impl ToString) -> Self {
        Self::ResourceCreation {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for renderer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::KernelBuild { log: "line 3: unknown identifier".into() };
        assert!(e.to_string().contains("unknown identifier"));

        let e = Error::LeafTooLarge { count: 70000, max: 65535 };
        assert!(e.to_string().contains("70000"));
        assert!(e.to_string().contains("65535"));

        let e = Error::UnboundKernelArg("camera");
        assert!(e.to_string().contains("camera"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_resource_helper() {
        let e = Error::resource("output image", "out of memory");
        assert!(matches!(e, Error::ResourceCreation { .. }));
        assert!(e.to_string().contains("output image"));
    }
}
