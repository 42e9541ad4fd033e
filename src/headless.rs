//! Headless host for testing and development.
//!
//! These types stand in for a real engine: cameras just remember which
//! channels are attached to them, and the host reports whichever pipeline
//! variant it was constructed with. `execute` replays attached channels the
//! way an engine would at the end of a camera's render pass.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::channel::{DrawCommand, SharedChannel};
use crate::host::{Camera, CameraEvent, CameraId, RenderHost};
use crate::pipeline::{OverlayFeature, PipelineVariant};

/// Headless camera.
pub struct HeadlessCamera {
    id: CameraId,
    rect: RwLock<egui::Rect>,
    channels: Mutex<Vec<(CameraEvent, SharedChannel)>>,
}

impl HeadlessCamera {
    /// Create a camera with a viewport of `width` x `height` pixels.
    pub fn new(id: u64, width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            id: CameraId(id),
            rect: RwLock::new(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(width as f32, height as f32),
            )),
            channels: Mutex::new(Vec::new()),
        })
    }

    /// Resize the viewport.
    pub fn set_pixel_rect(&self, rect: egui::Rect) {
        *self.rect.write() = rect;
    }

    /// Number of attached channels.
    pub fn attached_channel_count(&self) -> usize {
        self.channels.lock().len()
    }

    /// Whether `channel` is attached.
    pub fn has_channel(&self, channel: &SharedChannel) -> bool {
        self.channels
            .lock()
            .iter()
            .any(|(_, attached)| Arc::ptr_eq(attached, channel))
    }

    /// Replay every attached channel, returning the executed commands.
    pub fn execute(&self) -> Vec<DrawCommand> {
        log::trace!("HeadlessCamera {:?}: executing attached channels", self.id);
        self.channels
            .lock()
            .iter()
            .flat_map(|(_, channel)| channel.lock().commands().to_vec())
            .collect()
    }
}

impl Camera for HeadlessCamera {
    fn id(&self) -> CameraId {
        self.id
    }

    fn pixel_rect(&self) -> egui::Rect {
        *self.rect.read()
    }

    fn add_command_channel(&self, event: CameraEvent, channel: SharedChannel) {
        self.channels.lock().push((event, channel));
    }

    fn remove_command_channel(&self, event: CameraEvent, channel: &SharedChannel) {
        self.channels
            .lock()
            .retain(|(e, attached)| !(*e == event && Arc::ptr_eq(attached, channel)));
    }
}

/// Headless render host reporting a fixed pipeline variant.
pub struct HeadlessHost {
    variant: RwLock<Option<PipelineVariant>>,
    feature: RwLock<Option<Arc<OverlayFeature>>>,
}

impl HeadlessHost {
    /// Host running the legacy pipeline.
    pub fn legacy() -> Self {
        Self::with_variant(Some(PipelineVariant::Legacy), None)
    }

    /// Host running the renderer-feature pipeline, optionally with the
    /// overlay feature registered.
    pub fn renderer_feature(feature: Option<Arc<OverlayFeature>>) -> Self {
        Self::with_variant(Some(PipelineVariant::RendererFeature), feature)
    }

    /// Host running the custom-pass pipeline.
    pub fn custom_pass() -> Self {
        Self::with_variant(Some(PipelineVariant::CustomPass), None)
    }

    /// Host that reports no pipeline at all.
    pub fn none_active() -> Self {
        Self::with_variant(None, None)
    }

    fn with_variant(variant: Option<PipelineVariant>, feature: Option<Arc<OverlayFeature>>) -> Self {
        Self {
            variant: RwLock::new(variant),
            feature: RwLock::new(feature),
        }
    }

    /// Switch pipelines, as a host does between scenes.
    pub fn set_variant(&self, variant: PipelineVariant) {
        *self.variant.write() = Some(variant);
    }

    /// Register or clear the overlay feature.
    pub fn set_feature(&self, feature: Option<Arc<OverlayFeature>>) {
        *self.feature.write() = feature;
    }

    fn is(&self, variant: PipelineVariant) -> bool {
        *self.variant.read() == Some(variant)
    }
}

impl RenderHost for HeadlessHost {
    fn is_legacy_pipeline_active(&self) -> bool {
        self.is(PipelineVariant::Legacy)
    }

    fn is_renderer_feature_pipeline_active(&self) -> bool {
        self.is(PipelineVariant::RendererFeature)
    }

    fn is_custom_pass_pipeline_active(&self) -> bool {
        self.is(PipelineVariant::CustomPass)
    }

    fn overlay_feature(&self) -> Option<Arc<OverlayFeature>> {
        self.feature.read().clone()
    }
}
