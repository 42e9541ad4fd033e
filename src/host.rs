//! Host engine abstraction.
//!
//! The overlay never owns cameras or render pipelines. The host engine exposes
//! them through these traits, and the overlay binds its command channel to
//! whatever the host reports at initialization time.

use std::sync::Arc;

use crate::channel::SharedChannel;
use crate::pipeline::OverlayFeature;

/// Stable identifier of a host camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraId(pub u64);

/// Insertion point of a command channel in a camera's render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraEvent {
    /// After every other pass, so the overlay draws on top of the frame.
    AfterEverything,
}

/// A host camera that command channels can be attached to.
pub trait Camera: Send + Sync {
    /// Stable identifier.
    fn id(&self) -> CameraId;

    /// Viewport rectangle in physical pixels.
    fn pixel_rect(&self) -> egui::Rect;

    /// Attach a channel to be executed at `event` every time the camera renders.
    fn add_command_channel(&self, event: CameraEvent, channel: SharedChannel);

    /// Detach a previously attached channel. Unknown channels are ignored.
    fn remove_command_channel(&self, event: CameraEvent, channel: &SharedChannel);
}

/// Shared handle to a host camera.
pub type CameraHandle = Arc<dyn Camera>;

/// Queries the host's active render pipeline.
///
/// The three queries are expected to be mutually exclusive. A host that
/// reports none of them active is treated as running the legacy pipeline.
pub trait RenderHost: Send + Sync {
    /// The legacy pipeline renders cameras directly.
    fn is_legacy_pipeline_active(&self) -> bool;

    /// A scriptable pipeline that injects renderer features.
    fn is_renderer_feature_pipeline_active(&self) -> bool;

    /// A scriptable pipeline that drives custom passes itself.
    fn is_custom_pass_pipeline_active(&self) -> bool;

    /// The overlay feature registered with the renderer-feature pipeline.
    fn overlay_feature(&self) -> Option<Arc<OverlayFeature>> {
        None
    }
}
