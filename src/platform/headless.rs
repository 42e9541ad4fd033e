//! Headless platform adapter.
//!
//! Produces input only from injected events and advances time by a fixed
//! step per frame, which keeps frames reproducible in tests.

use egui::{RawInput, Rect};

use super::{FrameInput, PlatformAdapter};
use crate::config::OverlayConfig;
use crate::error::OverlayResult;

const FRAME_STEP: f64 = 1.0 / 60.0;

/// Platform adapter without a window system.
#[derive(Default)]
pub struct HeadlessPlatform {
    events: Vec<egui::Event>,
    pixels_per_point: f32,
    max_texture_side: usize,
    frame_index: u64,
    initialized: bool,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            pixels_per_point: 1.0,
            max_texture_side: OverlayConfig::default().max_texture_side,
            ..Default::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Frames prepared since initialization.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl PlatformAdapter for HeadlessPlatform {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn initialize(
        &mut self,
        _ctx: &egui::Context,
        config: &OverlayConfig,
        label: &str,
    ) -> OverlayResult<()> {
        self.pixels_per_point = config.pixels_per_point.unwrap_or(1.0);
        self.max_texture_side = config.max_texture_side;
        self.frame_index = 0;
        self.initialized = true;
        log::debug!("Headless platform initialized for {}", label);
        Ok(())
    }

    fn prepare_frame(&mut self, _ctx: &egui::Context, viewport: Rect) -> RawInput {
        let time = self.frame_index as f64 * FRAME_STEP;
        self.frame_index += 1;
        FrameInput {
            viewport,
            pixels_per_point: self.pixels_per_point,
            time,
            max_texture_side: self.max_texture_side,
            modifiers: egui::Modifiers::default(),
            events: std::mem::take(&mut self.events),
            hovered_files: Vec::new(),
            dropped_files: Vec::new(),
            focused: true,
        }
        .into_raw_input()
    }

    fn handle_output(&mut self, _ctx: &egui::Context, _output: &egui::PlatformOutput) {}

    fn queue_event(&mut self, event: egui::Event) {
        self.events.push(event);
    }

    fn shutdown(&mut self, _ctx: &egui::Context) {
        self.events.clear();
        self.initialized = false;
    }
}
