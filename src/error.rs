//! Overlay error types.

use thiserror::Error;

use crate::pipeline::PipelineVariant;

/// Error returned by a layout callback.
pub type LayoutError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Overlay error type
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("An overlay instance already exists in this registry")]
    AlreadyExists,
    #[error("Cannot initialize overlay without a camera")]
    MissingCamera,
    #[error("Render pipeline {0} requires a registered overlay feature")]
    MissingRenderFeature(PipelineVariant),
    #[error("Host reports several render pipelines active at once: {0:?}")]
    AmbiguousPipeline(Vec<PipelineVariant>),
    #[error("Failed to initialize platform adapter: {0}")]
    Platform(String),
    #[error("Failed to initialize renderer: {0}")]
    Renderer(String),
    #[error("Layout callback failed: {0}")]
    Layout(#[source] LayoutError),
    #[error("Overlay is not initialized")]
    NotInitialized,
    #[error("Operation requires the {expected} pipeline, but {active} is active")]
    WrongPipeline {
        expected: PipelineVariant,
        active: PipelineVariant,
    },
}

impl OverlayError {
    /// Configuration errors that abort initialization and are never retried
    /// until the host reloads or re-enables the overlay.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingCamera
                | Self::MissingRenderFeature(_)
                | Self::AmbiguousPipeline(_)
                | Self::Platform(_)
                | Self::Renderer(_)
        )
    }
}

pub type OverlayResult<T> = Result<T, OverlayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OverlayError::MissingCamera;
        assert_eq!(err.to_string(), "Cannot initialize overlay without a camera");

        let err = OverlayError::MissingRenderFeature(PipelineVariant::RendererFeature);
        assert_eq!(
            err.to_string(),
            "Render pipeline renderer-feature requires a registered overlay feature"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(OverlayError::MissingCamera.is_fatal());
        assert!(OverlayError::MissingRenderFeature(PipelineVariant::RendererFeature).is_fatal());
        assert!(!OverlayError::NotInitialized.is_fatal());
        assert!(!OverlayError::Layout("boom".into()).is_fatal());
    }

    #[test]
    fn test_layout_error_source() {
        use std::error::Error as _;

        let err = OverlayError::Layout("widget exploded".into());
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("widget exploded"));
    }
}
