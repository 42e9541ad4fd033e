//! Common utilities for overlay integration tests.
//!
//! The harness wires an [`OverlayManager`] to recording collaborators that
//! append to a shared journal, so tests can assert on the exact order of
//! acquisitions and releases.

use std::sync::Arc;

use gui_overlay::egui;
use gui_overlay::headless::{HeadlessCamera, HeadlessHost};
use gui_overlay::{
    Camera, CameraEvent, CameraHandle, CameraId, CommandChannel, DrawCommand, DrawData,
    DrawRenderer, HeadlessPlatform, MeshRenderer, OverlayConfig, OverlayError, OverlayFeature,
    OverlayManager, OverlayResult, PipelineVariant, PlatformAdapter, SharedChannel,
};
use parking_lot::Mutex;

/// Ordered log of collaborator calls.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Take everything recorded so far.
pub fn drain(journal: &Journal) -> Vec<String> {
    std::mem::take(&mut *journal.lock())
}

/// Number of entries equal to `entry`.
#[allow(dead_code)]
pub fn count(entries: &[String], entry: &str) -> usize {
    entries.iter().filter(|e| *e == entry).count()
}

// ============================================================================
// Recording collaborators
// ============================================================================

/// Camera that journals channel attachment.
pub struct RecordingCamera {
    inner: Arc<HeadlessCamera>,
    journal: Journal,
}

impl RecordingCamera {
    pub fn new(id: u64, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            inner: HeadlessCamera::new(id, 640, 480),
            journal: journal.clone(),
        })
    }

    /// Resize the camera viewport, keeping its origin.
    #[allow(dead_code)]
    pub fn set_size(&self, width: u32, height: u32) {
        let origin = self.inner.pixel_rect().min;
        self.inner.set_pixel_rect(egui::Rect::from_min_size(
            origin,
            egui::vec2(width as f32, height as f32),
        ));
    }

    #[allow(dead_code)]
    pub fn attached_channel_count(&self) -> usize {
        self.inner.attached_channel_count()
    }

    /// Commands the camera would execute this frame.
    pub fn execute(&self) -> Vec<DrawCommand> {
        self.inner.execute()
    }
}

impl Camera for RecordingCamera {
    fn id(&self) -> CameraId {
        self.inner.id()
    }

    fn pixel_rect(&self) -> egui::Rect {
        self.inner.pixel_rect()
    }

    fn add_command_channel(&self, event: CameraEvent, channel: SharedChannel) {
        self.journal
            .lock()
            .push(format!("camera{}:attach", self.id().0));
        self.inner.add_command_channel(event, channel);
    }

    fn remove_command_channel(&self, event: CameraEvent, channel: &SharedChannel) {
        self.journal
            .lock()
            .push(format!("camera{}:detach", self.id().0));
        self.inner.remove_command_channel(event, channel);
    }
}

/// Headless platform adapter that journals its lifecycle.
pub struct RecordingPlatform {
    inner: HeadlessPlatform,
    journal: Journal,
}

impl PlatformAdapter for RecordingPlatform {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn initialize(
        &mut self,
        ctx: &egui::Context,
        config: &OverlayConfig,
        label: &str,
    ) -> OverlayResult<()> {
        self.journal.lock().push("platform:init".to_string());
        self.inner.initialize(ctx, config, label)
    }

    fn prepare_frame(&mut self, ctx: &egui::Context, viewport: egui::Rect) -> egui::RawInput {
        self.inner.prepare_frame(ctx, viewport)
    }

    fn handle_output(&mut self, ctx: &egui::Context, output: &egui::PlatformOutput) {
        self.inner.handle_output(ctx, output);
    }

    fn queue_event(&mut self, event: egui::Event) {
        self.inner.queue_event(event);
    }

    fn shutdown(&mut self, ctx: &egui::Context) {
        self.journal.lock().push("platform:shutdown".to_string());
        self.inner.shutdown(ctx);
    }
}

/// Mesh renderer that journals its lifecycle.
pub struct RecordingRenderer {
    inner: MeshRenderer,
    journal: Journal,
    fail_init: bool,
}

impl DrawRenderer for RecordingRenderer {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn initialize(&mut self, ctx: &egui::Context) -> OverlayResult<()> {
        self.journal.lock().push("renderer:init".to_string());
        if self.fail_init {
            return Err(OverlayError::Renderer("device lost".to_string()));
        }
        self.inner.initialize(ctx)
    }

    fn render_draw_lists(&mut self, channel: &mut CommandChannel, draw_data: &DrawData) {
        self.inner.render_draw_lists(channel, draw_data);
    }

    fn shutdown(&mut self, ctx: &egui::Context) {
        self.journal.lock().push("renderer:shutdown".to_string());
        self.inner.shutdown(ctx);
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Manager wired to recording collaborators on a headless host. The font
/// atlas hooks journal `font_atlas:build` and `font_atlas:destroy`.
pub struct Harness {
    pub manager: OverlayManager,
    pub journal: Journal,
    #[allow(dead_code)]
    pub host: Arc<HeadlessHost>,
    pub feature: Option<Arc<OverlayFeature>>,
}

#[derive(Default)]
pub struct HarnessOptions {
    /// Leave the renderer feature unregistered on the feature pipeline.
    pub without_feature: bool,
    /// Make every renderer initialization fail.
    pub failing_renderer: bool,
}

impl Harness {
    pub fn new(variant: PipelineVariant) -> Self {
        Self::with_options(variant, HarnessOptions::default())
    }

    pub fn with_options(variant: PipelineVariant, options: HarnessOptions) -> Self {
        init_logging();

        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let feature = (variant == PipelineVariant::RendererFeature && !options.without_feature)
            .then(|| Arc::new(OverlayFeature::new()));
        let host = Arc::new(match variant {
            PipelineVariant::Legacy => HeadlessHost::legacy(),
            PipelineVariant::RendererFeature => HeadlessHost::renderer_feature(feature.clone()),
            PipelineVariant::CustomPass => HeadlessHost::custom_pass(),
        });

        let platform_journal = journal.clone();
        let renderer_journal = journal.clone();
        let atlas_journal = journal.clone();
        let release_journal = journal.clone();
        let failing_renderer = options.failing_renderer;

        let mut manager = OverlayManager::builder(host.clone())
            .with_config(OverlayConfig::default().with_label("test-overlay"))
            .with_platform_factory(move || -> Box<dyn PlatformAdapter> {
                Box::new(RecordingPlatform {
                    inner: HeadlessPlatform::new(),
                    journal: platform_journal.clone(),
                })
            })
            .with_renderer_factory(move || -> Box<dyn DrawRenderer> {
                Box::new(RecordingRenderer {
                    inner: MeshRenderer::new(),
                    journal: renderer_journal.clone(),
                    fail_init: failing_renderer,
                })
            })
            .with_font_initializer(move |_| {
                atlas_journal.lock().push("font_atlas:build".to_string())
            })
            .with_font_finalizer(move |_| {
                release_journal.lock().push("font_atlas:destroy".to_string())
            })
            .build();

        let init_journal = journal.clone();
        manager.on_initialize(move |_| init_journal.lock().push("on_initialize".to_string()));
        let deinit_journal = journal.clone();
        manager.on_deinitialize(move |_| deinit_journal.lock().push("on_deinitialize".to_string()));

        Self {
            manager,
            journal,
            host,
            feature,
        }
    }

    pub fn camera(&self, id: u64) -> Arc<RecordingCamera> {
        RecordingCamera::new(id, &self.journal)
    }

    /// Add a layout listener drawing a labelled panel.
    #[allow(dead_code)]
    pub fn add_panel(&mut self) {
        self.manager.add_layout(|ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.label("overlay");
            });
            Ok(())
        });
    }

    /// Commands the host would execute while rendering `camera` this frame.
    #[allow(dead_code)]
    pub fn rendered_for(&self, camera: &RecordingCamera) -> Vec<DrawCommand> {
        match &self.feature {
            Some(feature) => feature
                .channel_for(camera.id())
                .map(|channel| channel.lock().commands().to_vec())
                .unwrap_or_default(),
            None => camera.execute(),
        }
    }

    #[allow(dead_code)]
    pub fn drain(&self) -> Vec<String> {
        drain(&self.journal)
    }
}

/// Upcast a recording camera to the handle the manager takes.
pub fn handle(camera: &Arc<RecordingCamera>) -> Option<CameraHandle> {
    let camera: CameraHandle = camera.clone();
    Some(camera)
}
