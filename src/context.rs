//! Per-overlay GUI context and frame scope.
//!
//! [`OverlayContext`] owns the egui context, the font atlas state and the
//! [`TextureRegistry`]. Frames are driven through [`FrameScope`], which closes
//! the egui frame exactly once on every exit path, including an early error
//! return or a panic in layout code.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

use egui::{ClippedPrimitive, RawInput, TexturesDelta};

use crate::config::{FontAtlasConfig, FontFinalizer, FontInitializer};
use crate::texture::TextureRegistry;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static CURRENT: RefCell<Option<(u64, egui::Context)>> = const { RefCell::new(None) };
}

/// The egui context bound by the overlay that most recently started a frame
/// on this thread.
pub fn current_context() -> Option<egui::Context> {
    CURRENT.with(|current| current.borrow().as_ref().map(|(_, ctx)| ctx.clone()))
}

/// A finalized frame, ready for a draw renderer.
pub struct DrawData {
    pub primitives: Vec<ClippedPrimitive>,
    /// Texture uploads and frees the renderer must apply around its draws.
    pub textures_delta: TexturesDelta,
    pub pixels_per_point: f32,
    /// Camera viewport in physical pixels.
    pub viewport: egui::Rect,
}

impl DrawData {
    /// Viewport size in points, the space egui vertices are expressed in.
    pub fn screen_size_points(&self) -> egui::Vec2 {
        self.viewport.size() / self.pixels_per_point
    }

    /// Viewport size in whole physical pixels.
    pub fn framebuffer_size(&self) -> [u32; 2] {
        [
            self.viewport.width().max(0.0) as u32,
            self.viewport.height().max(0.0) as u32,
        ]
    }
}

/// Everything a closed frame produced.
pub struct FrameOutput {
    pub draw_data: DrawData,
    pub platform_output: egui::PlatformOutput,
}

/// Owns the egui context and texture state of one overlay.
pub struct OverlayContext {
    id: u64,
    ctx: egui::Context,
    textures: TextureRegistry,
    font_atlas_built: bool,
    frame_in_progress: bool,
    frames_finalized: u64,
}

impl Default for OverlayContext {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayContext {
    pub fn new() -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            ctx: egui::Context::default(),
            textures: TextureRegistry::new(),
            font_atlas_built: false,
            frame_in_progress: false,
            frames_finalized: 0,
        }
    }

    /// The underlying egui context.
    pub fn egui(&self) -> &egui::Context {
        &self.ctx
    }

    /// Bind this context as the current one for this thread.
    pub fn make_current(&self) {
        CURRENT.with(|current| *current.borrow_mut() = Some((self.id, self.ctx.clone())));
    }

    /// Whether this context is the current one for this thread.
    pub fn is_current(&self) -> bool {
        CURRENT.with(|current| matches!(*current.borrow(), Some((id, _)) if id == self.id))
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureRegistry {
        &mut self.textures
    }

    /// Load the atlas fonts into egui, letting `initializer` edit the
    /// definitions last.
    pub fn build_font_atlas(
        &mut self,
        atlas: &FontAtlasConfig,
        initializer: Option<&mut FontInitializer>,
    ) {
        let mut definitions = atlas.font_definitions();
        if let Some(initializer) = initializer {
            initializer(&mut definitions);
        }
        log::debug!(
            "Building font atlas with {} fonts",
            definitions.font_data.len()
        );
        self.ctx.set_fonts(definitions);
        self.font_atlas_built = true;
    }

    /// Release the atlas. `finalizer` only runs when an atlas was built.
    pub fn destroy_font_atlas(&mut self, finalizer: Option<&mut FontFinalizer>) {
        if !self.font_atlas_built {
            return;
        }
        if let Some(finalizer) = finalizer {
            finalizer(&self.ctx);
        }
        log::debug!("Font atlas released");
        self.font_atlas_built = false;
    }

    pub fn has_font_atlas(&self) -> bool {
        self.font_atlas_built
    }

    /// Start serving a fresh renderer.
    pub fn initialize(&mut self) {
        self.textures.initialize();
    }

    /// Per-frame texture bookkeeping, run before the frame starts.
    pub fn prepare_frame(&mut self) {
        self.textures.prepare_frame();
    }

    /// Stop serving the renderer.
    pub fn shutdown(&mut self) {
        self.textures.shutdown();
    }

    /// Start an egui frame for a camera viewport given in physical pixels.
    pub fn begin_frame(&mut self, raw_input: RawInput, viewport: egui::Rect) -> FrameScope<'_> {
        log::trace!("Beginning overlay frame for viewport {:?}", viewport);
        self.ctx.begin_pass(raw_input);
        self.frame_in_progress = true;
        FrameScope {
            context: self,
            viewport,
            finished: false,
        }
    }

    /// Whether a frame was started and not yet closed.
    pub fn frame_in_progress(&self) -> bool {
        self.frame_in_progress
    }

    /// Number of frames closed so far.
    pub fn frames_finalized(&self) -> u64 {
        self.frames_finalized
    }

    /// Keep the uploads of a frame that was closed but not rendered.
    pub(crate) fn defer_textures(&mut self, delta: TexturesDelta) {
        self.textures.defer(delta);
    }
}

impl Drop for OverlayContext {
    fn drop(&mut self) {
        if self.is_current() {
            CURRENT.with(|current| current.borrow_mut().take());
        }
    }
}

/// An open egui frame. Dropping it without [`FrameScope::finish`] still
/// closes the frame; the frame's texture uploads are then carried over to
/// the next frame.
pub struct FrameScope<'a> {
    context: &'a mut OverlayContext,
    viewport: egui::Rect,
    finished: bool,
}

impl FrameScope<'_> {
    /// The context to build UI with.
    pub fn ctx(&self) -> &egui::Context {
        &self.context.ctx
    }

    /// Close the frame and produce its draw data.
    pub fn finish(mut self) -> FrameOutput {
        self.close()
    }

    fn close(&mut self) -> FrameOutput {
        let output = self.context.ctx.end_pass();
        self.finished = true;
        self.context.frame_in_progress = false;
        self.context.frames_finalized += 1;

        let pixels_per_point = output.pixels_per_point;
        let primitives = self.context.ctx.tessellate(output.shapes, pixels_per_point);
        let textures_delta = self.context.textures.take_frame_delta(output.textures_delta);

        FrameOutput {
            draw_data: DrawData {
                primitives,
                textures_delta,
                pixels_per_point,
                viewport: self.viewport,
            },
            platform_output: output.platform_output,
        }
    }
}

impl Drop for FrameScope<'_> {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!("Overlay frame closed without being rendered");
            let output = self.close();
            self.context.defer_textures(output.draw_data.textures_delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_input(width: f32, height: f32) -> RawInput {
        RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(width, height),
            )),
            ..Default::default()
        }
    }

    fn viewport(width: f32, height: f32) -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(width, height))
    }

    #[test]
    fn test_finish_produces_draw_data() {
        let mut context = OverlayContext::new();
        context.build_font_atlas(&FontAtlasConfig::default(), None);
        context.initialize();

        let frame = context.begin_frame(raw_input(320.0, 240.0), viewport(320.0, 240.0));
        egui::CentralPanel::default().show(frame.ctx(), |ui| {
            ui.label("fps: 60");
        });
        let output = frame.finish();

        assert!(!output.draw_data.primitives.is_empty());
        assert!(!output.draw_data.textures_delta.set.is_empty());
        assert_eq!(output.draw_data.framebuffer_size(), [320, 240]);
        assert!(!context.frame_in_progress());
        assert_eq!(context.frames_finalized(), 1);
    }

    #[test]
    fn test_font_finalizer_runs_once_per_built_atlas() {
        let released = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut finalizer: FontFinalizer = {
            let released = released.clone();
            Box::new(move |_| released.set(released.get() + 1))
        };
        let mut context = OverlayContext::new();

        context.destroy_font_atlas(Some(&mut finalizer));
        assert_eq!(released.get(), 0);

        context.build_font_atlas(&FontAtlasConfig::default(), None);
        context.destroy_font_atlas(Some(&mut finalizer));
        context.destroy_font_atlas(Some(&mut finalizer));
        assert_eq!(released.get(), 1);
        assert!(!context.has_font_atlas());
    }

    #[test]
    fn test_dropped_scope_closes_frame_and_defers_textures() {
        let mut context = OverlayContext::new();
        context.initialize();

        {
            let frame = context.begin_frame(raw_input(100.0, 100.0), viewport(100.0, 100.0));
            egui::Area::new(egui::Id::new("area")).show(frame.ctx(), |ui| {
                ui.label("dropped");
            });
        }
        assert!(!context.frame_in_progress());
        assert_eq!(context.frames_finalized(), 1);

        // The font upload of the dropped frame arrives with the next one.
        let output = context
            .begin_frame(raw_input(100.0, 100.0), viewport(100.0, 100.0))
            .finish();
        assert!(
            output
                .draw_data
                .textures_delta
                .set
                .iter()
                .any(|(id, _)| *id == egui::TextureId::default())
        );
    }

    #[test]
    fn test_panicking_layout_still_closes_frame() {
        let mut context = OverlayContext::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let frame = context.begin_frame(raw_input(64.0, 64.0), viewport(64.0, 64.0));
            if frame.ctx().pixels_per_point() > 0.0 {
                panic!("layout panicked");
            }
        }));

        assert!(result.is_err());
        assert!(!context.frame_in_progress());
        assert_eq!(context.frames_finalized(), 1);
    }

    #[test]
    fn test_current_context_tracking() {
        let first = OverlayContext::new();
        let second = OverlayContext::new();

        first.make_current();
        assert!(first.is_current());
        assert!(!second.is_current());

        second.make_current();
        assert!(second.is_current());
        assert!(current_context().is_some());

        drop(second);
        assert!(current_context().is_none());
    }
}
