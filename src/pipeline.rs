//! Render pipeline detection and command channel attachment.
//!
//! Each pipeline variant has its own way of getting the overlay's command
//! channel executed:
//! - [`PipelineVariant::Legacy`] - the channel is attached to the camera directly
//! - [`PipelineVariant::RendererFeature`] - the channel is handed to a
//!   pre-registered [`OverlayFeature`] that the pipeline executes
//! - [`PipelineVariant::CustomPass`] - nothing is attached; the host's custom
//!   pass asks the overlay to record a frame into its own channel
//!
//! The variant is detected again on every initialization and never cached
//! across initialize/deinitialize cycles.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::channel::SharedChannel;
use crate::error::{OverlayError, OverlayResult};
use crate::host::{CameraEvent, CameraHandle, CameraId, RenderHost};

/// Mutually exclusive render pipeline variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineVariant {
    /// Cameras render directly and accept attached command channels.
    Legacy,
    /// Scriptable pipeline with injectable renderer features.
    RendererFeature,
    /// Scriptable pipeline that drives custom passes.
    CustomPass,
}

impl PipelineVariant {
    /// Detect the active variant from the host.
    pub fn detect(host: &dyn RenderHost) -> OverlayResult<Self> {
        let active: Vec<Self> = [
            (Self::Legacy, host.is_legacy_pipeline_active()),
            (Self::RendererFeature, host.is_renderer_feature_pipeline_active()),
            (Self::CustomPass, host.is_custom_pass_pipeline_active()),
        ]
        .into_iter()
        .filter_map(|(variant, is_active)| is_active.then_some(variant))
        .collect();

        match active.as_slice() {
            [] => {
                log::debug!("No scriptable pipeline reported active, assuming legacy");
                Ok(Self::Legacy)
            }
            [variant] => Ok(*variant),
            _ => Err(OverlayError::AmbiguousPipeline(active)),
        }
    }

    /// Whether the overlay records its frame from `update`.
    ///
    /// The custom-pass pipeline records frames from inside its own pass.
    pub fn submits_on_update(self) -> bool {
        !matches!(self, Self::CustomPass)
    }
}

impl fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::RendererFeature => write!(f, "renderer-feature"),
            Self::CustomPass => write!(f, "custom-pass"),
        }
    }
}

struct FeatureBinding {
    channel: SharedChannel,
    camera: CameraHandle,
}

/// Renderer feature registered with a feature-injection pipeline.
///
/// The pipeline executes [`OverlayFeature::channel_for`] while rendering each
/// camera; the overlay binds and unbinds the channel and camera.
#[derive(Default)]
pub struct OverlayFeature {
    binding: Mutex<Option<FeatureBinding>>,
}

impl OverlayFeature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a channel is currently bound.
    pub fn is_bound(&self) -> bool {
        self.binding.lock().is_some()
    }

    /// The camera the bound channel targets.
    pub fn bound_camera(&self) -> Option<CameraId> {
        self.binding.lock().as_ref().map(|b| b.camera.id())
    }

    /// Channel to execute while rendering `camera`, if it is the bound one.
    pub fn channel_for(&self, camera: CameraId) -> Option<SharedChannel> {
        self.binding
            .lock()
            .as_ref()
            .filter(|b| b.camera.id() == camera)
            .map(|b| b.channel.clone())
    }

    fn bind(&self, channel: SharedChannel, camera: CameraHandle) {
        let mut binding = self.binding.lock();
        if binding.is_some() {
            log::warn!("Overlay feature was still bound, replacing previous binding");
        }
        *binding = Some(FeatureBinding { channel, camera });
    }

    fn unbind(&self) {
        self.binding.lock().take();
    }
}

impl fmt::Debug for OverlayFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayFeature")
            .field("bound_camera", &self.bound_camera())
            .finish()
    }
}

/// Attachment strategy for one pipeline variant.
pub trait RenderAttachment {
    /// The variant this attachment serves.
    fn variant(&self) -> PipelineVariant;

    /// Make `channel` execute when `camera` renders.
    fn attach(&mut self, channel: &SharedChannel, camera: &CameraHandle);

    /// Undo [`RenderAttachment::attach`]. Does nothing when not attached.
    fn detach(&mut self);
}

/// Legacy pipeline: attach the channel to the camera itself.
#[derive(Default)]
pub struct CameraAttachment {
    attached: Option<(CameraHandle, SharedChannel)>,
}

impl RenderAttachment for CameraAttachment {
    fn variant(&self) -> PipelineVariant {
        PipelineVariant::Legacy
    }

    fn attach(&mut self, channel: &SharedChannel, camera: &CameraHandle) {
        self.detach();
        log::debug!("Attaching overlay channel to camera {:?}", camera.id());
        camera.add_command_channel(CameraEvent::AfterEverything, channel.clone());
        self.attached = Some((camera.clone(), channel.clone()));
    }

    fn detach(&mut self) {
        if let Some((camera, channel)) = self.attached.take() {
            log::debug!("Detaching overlay channel from camera {:?}", camera.id());
            camera.remove_command_channel(CameraEvent::AfterEverything, &channel);
        }
    }
}

/// Renderer-feature pipeline: hand the channel and camera to the feature.
pub struct FeatureAttachment {
    feature: Arc<OverlayFeature>,
    attached: bool,
}

impl FeatureAttachment {
    pub fn new(feature: Arc<OverlayFeature>) -> Self {
        Self {
            feature,
            attached: false,
        }
    }
}

impl RenderAttachment for FeatureAttachment {
    fn variant(&self) -> PipelineVariant {
        PipelineVariant::RendererFeature
    }

    fn attach(&mut self, channel: &SharedChannel, camera: &CameraHandle) {
        log::debug!("Binding overlay channel to renderer feature for camera {:?}", camera.id());
        self.feature.bind(channel.clone(), camera.clone());
        self.attached = true;
    }

    fn detach(&mut self) {
        if self.attached {
            log::debug!("Unbinding overlay channel from renderer feature");
            self.feature.unbind();
            self.attached = false;
        }
    }
}

/// Custom-pass pipeline: the host pass pulls frames, nothing to attach.
#[derive(Default)]
pub struct CustomPassAttachment;

impl RenderAttachment for CustomPassAttachment {
    fn variant(&self) -> PipelineVariant {
        PipelineVariant::CustomPass
    }

    fn attach(&mut self, _channel: &SharedChannel, _camera: &CameraHandle) {}

    fn detach(&mut self) {}
}

/// Detect the host's pipeline and build the matching attachment.
///
/// Fails when the renderer-feature pipeline is active but no overlay feature
/// is registered with the host.
pub fn select_attachment(host: &dyn RenderHost) -> OverlayResult<Box<dyn RenderAttachment>> {
    let variant = PipelineVariant::detect(host)?;
    Ok(match variant {
        PipelineVariant::Legacy => Box::new(CameraAttachment::default()),
        PipelineVariant::RendererFeature => {
            let feature = host
                .overlay_feature()
                .ok_or(OverlayError::MissingRenderFeature(variant))?;
            Box::new(FeatureAttachment::new(feature))
        }
        PipelineVariant::CustomPass => Box::new(CustomPassAttachment),
    })
}
