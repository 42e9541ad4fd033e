//! Platform adapters translate host input into egui input.
//!
//! - [`WinitPlatform`] - translates winit window events
//! - [`HeadlessPlatform`] - only injected events, for tests and servers
//!
//! A fresh adapter is constructed on every overlay initialization.

mod headless;
mod winit_input;

pub use headless::HeadlessPlatform;
pub use winit_input::WinitPlatform;

use egui::{Pos2, RawInput, Rect};
use winit::event::WindowEvent;

use crate::config::{InputBackendKind, OverlayConfig};
use crate::error::OverlayResult;

/// Translates host input and window state into egui input each frame.
pub trait PlatformAdapter {
    /// Adapter name for logging.
    fn name(&self) -> &'static str;

    /// Prepare the adapter for `ctx`.
    fn initialize(
        &mut self,
        ctx: &egui::Context,
        config: &OverlayConfig,
        label: &str,
    ) -> OverlayResult<()>;

    /// Produce the frame's input for a camera viewport in physical pixels.
    fn prepare_frame(&mut self, ctx: &egui::Context, viewport: Rect) -> RawInput;

    /// React to a closed frame's platform output (clipboard, cursor).
    fn handle_output(&mut self, ctx: &egui::Context, output: &egui::PlatformOutput);

    /// Inject a synthetic event into the next frame.
    fn queue_event(&mut self, event: egui::Event);

    /// Translate a host window event. Returns `true` if it became GUI input.
    fn handle_window_event(&mut self, _event: &WindowEvent) -> bool {
        false
    }

    /// Cursor the overlay wants the host window to show.
    fn requested_cursor(&self) -> Option<egui::CursorIcon> {
        None
    }

    /// Release everything acquired in [`PlatformAdapter::initialize`].
    fn shutdown(&mut self, ctx: &egui::Context);
}

/// Construct the adapter for `kind`.
pub fn create_platform(kind: InputBackendKind) -> Box<dyn PlatformAdapter> {
    match kind {
        InputBackendKind::Winit => Box::new(WinitPlatform::new()),
        InputBackendKind::Headless => Box::new(HeadlessPlatform::new()),
    }
}

/// Input gathered by an adapter for one frame.
pub(crate) struct FrameInput {
    pub viewport: Rect,
    pub pixels_per_point: f32,
    pub time: f64,
    pub max_texture_side: usize,
    pub modifiers: egui::Modifiers,
    pub events: Vec<egui::Event>,
    pub hovered_files: Vec<egui::HoveredFile>,
    pub dropped_files: Vec<egui::DroppedFile>,
    pub focused: bool,
}

impl FrameInput {
    /// Build egui's raw input. The screen rect is the viewport size in
    /// points, anchored at the origin; pointer positions are already
    /// relative to the viewport.
    pub fn into_raw_input(self) -> RawInput {
        let mut viewports = egui::viewport::ViewportIdMap::default();
        viewports.insert(
            egui::ViewportId::ROOT,
            egui::ViewportInfo {
                native_pixels_per_point: Some(self.pixels_per_point),
                focused: Some(self.focused),
                ..Default::default()
            },
        );

        RawInput {
            viewport_id: egui::ViewportId::ROOT,
            viewports,
            screen_rect: Some(Rect::from_min_size(
                Pos2::ZERO,
                self.viewport.size() / self.pixels_per_point,
            )),
            max_texture_side: Some(self.max_texture_side),
            time: Some(self.time),
            predicted_dt: 1.0 / 60.0,
            modifiers: self.modifiers,
            events: self.events,
            hovered_files: self.hovered_files,
            dropped_files: self.dropped_files,
            focused: self.focused,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_rect_in_points() {
        let input = FrameInput {
            viewport: Rect::from_min_size(Pos2::new(100.0, 50.0), egui::vec2(800.0, 600.0)),
            pixels_per_point: 2.0,
            time: 1.5,
            max_texture_side: 4096,
            modifiers: egui::Modifiers::default(),
            events: vec![egui::Event::PointerGone],
            hovered_files: Vec::new(),
            dropped_files: Vec::new(),
            focused: true,
        };
        let raw = input.into_raw_input();

        assert_eq!(
            raw.screen_rect,
            Some(Rect::from_min_size(Pos2::ZERO, egui::vec2(400.0, 300.0)))
        );
        assert_eq!(raw.time, Some(1.5));
        assert_eq!(raw.max_texture_side, Some(4096));
        assert_eq!(raw.events.len(), 1);
        assert_eq!(
            raw.viewports
                .get(&egui::ViewportId::ROOT)
                .and_then(|v| v.native_pixels_per_point),
            Some(2.0)
        );
    }

    #[test]
    fn test_factory_matches_kind() {
        assert_eq!(create_platform(InputBackendKind::Winit).name(), "winit");
        assert_eq!(create_platform(InputBackendKind::Headless).name(), "headless");
    }
}
