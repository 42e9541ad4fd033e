//! winit platform adapter.
//!
//! Translates winit window events into egui events. Pointer positions are
//! made relative to the camera viewport, so an overlay on a camera that only
//! covers part of the window still receives correct coordinates.

use std::path::PathBuf;
use std::time::Instant;

use egui::{Key, Modifiers, PointerButton, Pos2, RawInput, Rect, Vec2};
use winit::event::{MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

use super::{FrameInput, PlatformAdapter};
use crate::config::{CursorMode, NavigationFlags, OverlayConfig};
use crate::error::OverlayResult;

struct HeldKey {
    key: Key,
    next_repeat: f64,
}

/// Platform adapter for winit windows.
pub struct WinitPlatform {
    label: String,
    navigation: NavigationFlags,
    cursor_mode: CursorMode,
    key_repeat_delay: f64,
    key_repeat_interval: f64,
    scroll_line_height: f32,
    max_texture_side: usize,
    pixels_per_point_override: Option<f32>,
    /// Scale factor reported by the window.
    native_pixels_per_point: f32,
    /// Viewport of the last prepared frame, in physical pixels.
    viewport: Rect,
    /// Current mouse position in points, relative to the viewport.
    mouse_pos: Pos2,
    modifiers: Modifiers,
    focused: bool,
    events: Vec<egui::Event>,
    held_keys: Vec<HeldKey>,
    hovered_files: Vec<egui::HoveredFile>,
    dropped_files: Vec<egui::DroppedFile>,
    requested_cursor: Option<egui::CursorIcon>,
    start: Instant,
    /// System clipboard for copy/paste (desktop only).
    #[cfg(not(target_arch = "wasm32"))]
    clipboard: Option<arboard::Clipboard>,
}

impl Default for WinitPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl WinitPlatform {
    pub fn new() -> Self {
        let defaults = OverlayConfig::default();
        Self {
            label: String::new(),
            navigation: defaults.navigation,
            cursor_mode: defaults.cursor,
            key_repeat_delay: defaults.key_repeat_delay,
            key_repeat_interval: defaults.key_repeat_interval,
            scroll_line_height: defaults.scroll_line_height,
            max_texture_side: defaults.max_texture_side,
            pixels_per_point_override: defaults.pixels_per_point,
            native_pixels_per_point: 1.0,
            viewport: Rect::NOTHING,
            mouse_pos: Pos2::ZERO,
            modifiers: Modifiers::default(),
            focused: true,
            events: Vec::new(),
            held_keys: Vec::new(),
            hovered_files: Vec::new(),
            dropped_files: Vec::new(),
            requested_cursor: None,
            start: Instant::now(),
            #[cfg(not(target_arch = "wasm32"))]
            clipboard: None,
        }
    }

    /// Effective pixels per point.
    pub fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point_override
            .unwrap_or(self.native_pixels_per_point)
    }

    /// Handle scale factor (DPI) change.
    pub fn on_scale_factor_changed(&mut self, scale_factor: f64) {
        self.native_pixels_per_point = scale_factor as f32;
    }

    /// Handle window focus change.
    pub fn on_focus_changed(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.held_keys.clear();
        }
        self.events.push(egui::Event::WindowFocused(focused));
    }

    /// Handle mouse move event, in window pixels.
    pub fn on_mouse_move(&mut self, x: f64, y: f64) {
        if self.navigation.contains(NavigationFlags::NO_MOUSE) {
            return;
        }
        let origin = if self.viewport.is_positive() {
            self.viewport.min
        } else {
            Pos2::ZERO
        };
        let ppp = self.pixels_per_point();
        let pos = Pos2::new(
            (x as f32 - origin.x) / ppp,
            (y as f32 - origin.y) / ppp,
        );
        self.mouse_pos = pos;
        self.events.push(egui::Event::PointerMoved(pos));
    }

    /// Handle the cursor leaving the window.
    pub fn on_mouse_left(&mut self) {
        self.events.push(egui::Event::PointerGone);
    }

    /// Queue a press or release of a mouse button egui knows about.
    /// Dropped when the configuration disables mouse input.
    pub fn on_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if self.navigation.contains(NavigationFlags::NO_MOUSE) {
            return;
        }
        let egui_button = match button {
            MouseButton::Left => Some(PointerButton::Primary),
            MouseButton::Right => Some(PointerButton::Secondary),
            MouseButton::Middle => Some(PointerButton::Middle),
            MouseButton::Back => Some(PointerButton::Extra1),
            MouseButton::Forward => Some(PointerButton::Extra2),
            MouseButton::Other(_) => None,
        };

        if let Some(button) = egui_button {
            self.events.push(egui::Event::PointerButton {
                pos: self.mouse_pos,
                button,
                pressed,
                modifiers: self.modifiers,
            });
        }
    }

    /// Queue a wheel event in points. Line deltas use the configured
    /// scroll line height.
    pub fn on_mouse_scroll(&mut self, delta: MouseScrollDelta) {
        if self.navigation.contains(NavigationFlags::NO_MOUSE) {
            return;
        }
        let delta = match delta {
            MouseScrollDelta::LineDelta(x, y) => {
                Vec2::new(x * self.scroll_line_height, y * self.scroll_line_height)
            }
            MouseScrollDelta::PixelDelta(pos) => {
                let ppp = self.pixels_per_point();
                Vec2::new(pos.x as f32 / ppp, pos.y as f32 / ppp)
            }
        };

        self.events.push(egui::Event::MouseWheel {
            unit: egui::MouseWheelUnit::Point,
            delta,
            modifiers: self.modifiers,
        });
    }

    /// Track modifiers; `command` maps to super on macOS and ctrl elsewhere.
    pub fn on_modifiers_changed(&mut self, state: ModifiersState) {
        self.modifiers = Modifiers {
            alt: state.alt_key(),
            ctrl: state.control_key(),
            shift: state.shift_key(),
            mac_cmd: cfg!(target_os = "macos") && state.super_key(),
            command: if cfg!(target_os = "macos") {
                state.super_key()
            } else {
                state.control_key()
            },
        };
    }

    /// Handle key event. Operating system repeats are ignored; repeats are
    /// synthesized from the configured delay and interval.
    pub fn on_key(&mut self, physical_key: PhysicalKey, pressed: bool, os_repeat: bool) {
        if os_repeat {
            return;
        }
        let now = self.now();
        self.on_key_at(physical_key, pressed, now);
    }

    fn on_key_at(&mut self, physical_key: PhysicalKey, pressed: bool, time: f64) {
        let PhysicalKey::Code(keycode) = physical_key else {
            return;
        };
        let Some(key) = translate_keycode(keycode) else {
            return;
        };
        if is_navigation_key(key) && !self.navigation.contains(NavigationFlags::KEYBOARD) {
            return;
        }

        self.events.push(egui::Event::Key {
            key,
            physical_key: Some(key),
            pressed,
            repeat: false,
            modifiers: self.modifiers,
        });

        if pressed {
            self.held_keys.retain(|held| held.key != key);
            self.held_keys.push(HeldKey {
                key,
                next_repeat: time + self.key_repeat_delay,
            });
            self.on_shortcut(key);
        } else {
            self.held_keys.retain(|held| held.key != key);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn on_shortcut(&mut self, key: Key) {
        if !self.modifiers.command {
            return;
        }
        match key {
            Key::V => {
                if let Some(text) = self
                    .clipboard
                    .as_mut()
                    .and_then(|clipboard| clipboard.get_text().ok())
                    .filter(|text| !text.is_empty())
                {
                    self.events.push(egui::Event::Paste(text));
                }
            }
            Key::C => self.events.push(egui::Event::Copy),
            Key::X => self.events.push(egui::Event::Cut),
            _ => {}
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn on_shortcut(&mut self, _key: Key) {}

    /// Queue committed text for the focused widget. Control characters
    /// other than newline and tab are stripped; nothing is queued if no
    /// text remains.
    pub fn on_text_input(&mut self, text: &str) {
        let mut committed = text.to_owned();
        committed.retain(|c| matches!(c, '\n' | '\t') || !c.is_control());
        if committed.is_empty() {
            return;
        }
        self.events.push(egui::Event::Text(committed));
    }

    /// A file is dragged over the window. Reported with every frame until
    /// the drag leaves or drops.
    pub fn on_file_hovered(&mut self, path: PathBuf) {
        let file = egui::HoveredFile {
            path: Some(path),
            ..Default::default()
        };
        self.hovered_files.push(file);
    }

    /// The drag left the window without dropping.
    pub fn on_file_hover_cancelled(&mut self) {
        self.hovered_files.clear();
    }

    /// A file was dropped. It ends any hover and is delivered with the next
    /// frame only.
    pub fn on_file_dropped(&mut self, path: PathBuf) {
        self.hovered_files.clear();
        let file = egui::DroppedFile {
            path: Some(path),
            ..Default::default()
        };
        self.dropped_files.push(file);
    }

    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn prepare_frame_at(&mut self, viewport: Rect, time: f64) -> RawInput {
        self.viewport = viewport;

        for held in &mut self.held_keys {
            if time >= held.next_repeat {
                self.events.push(egui::Event::Key {
                    key: held.key,
                    physical_key: Some(held.key),
                    pressed: true,
                    repeat: true,
                    modifiers: self.modifiers,
                });
                held.next_repeat = time + self.key_repeat_interval;
            }
        }

        FrameInput {
            viewport,
            pixels_per_point: self.pixels_per_point(),
            time,
            max_texture_side: self.max_texture_side,
            modifiers: self.modifiers,
            events: std::mem::take(&mut self.events),
            hovered_files: self.hovered_files.clone(),
            dropped_files: std::mem::take(&mut self.dropped_files),
            focused: self.focused,
        }
        .into_raw_input()
    }
}

impl PlatformAdapter for WinitPlatform {
    fn name(&self) -> &'static str {
        "winit"
    }

    fn initialize(
        &mut self,
        _ctx: &egui::Context,
        config: &OverlayConfig,
        label: &str,
    ) -> OverlayResult<()> {
        self.label = label.to_string();
        self.navigation = config.navigation;
        self.cursor_mode = config.cursor;
        self.key_repeat_delay = config.key_repeat_delay;
        self.key_repeat_interval = config.key_repeat_interval;
        self.scroll_line_height = config.scroll_line_height;
        self.max_texture_side = config.max_texture_side;
        self.pixels_per_point_override = config.pixels_per_point;
        self.start = Instant::now();

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.clipboard = match arboard::Clipboard::new() {
                Ok(clipboard) => Some(clipboard),
                Err(e) => {
                    log::warn!("Clipboard unavailable for {}: {}", self.label, e);
                    None
                }
            };
        }

        log::debug!("Winit platform initialized for {}", self.label);
        Ok(())
    }

    fn prepare_frame(&mut self, _ctx: &egui::Context, viewport: Rect) -> RawInput {
        let now = self.now();
        self.prepare_frame_at(viewport, now)
    }

    fn handle_output(&mut self, _ctx: &egui::Context, output: &egui::PlatformOutput) {
        self.requested_cursor = match self.cursor_mode {
            CursorMode::Host => Some(output.cursor_icon),
            CursorMode::Hidden => Some(egui::CursorIcon::None),
            CursorMode::Ignore => None,
        };

        for command in &output.commands {
            if let egui::OutputCommand::CopyText(text) = command {
                #[cfg(not(target_arch = "wasm32"))]
                if let Some(clipboard) = &mut self.clipboard
                    && let Err(e) = clipboard.set_text(text)
                {
                    log::warn!("Failed to copy to clipboard: {}", e);
                }
            }
        }
    }

    fn queue_event(&mut self, event: egui::Event) {
        self.events.push(event);
    }

    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.on_mouse_move(position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => self.on_mouse_left(),
            WindowEvent::MouseInput { state, button, .. } => {
                self.on_mouse_button(*button, state.is_pressed());
            }
            WindowEvent::MouseWheel { delta, .. } => self.on_mouse_scroll(*delta),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.on_modifiers_changed(modifiers.state());
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.on_key(event.physical_key, event.state.is_pressed(), event.repeat);
                if event.state.is_pressed()
                    && let Some(text) = &event.text
                {
                    self.on_text_input(text.as_str());
                }
            }
            WindowEvent::Focused(focused) => self.on_focus_changed(*focused),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.on_scale_factor_changed(*scale_factor);
            }
            WindowEvent::HoveredFile(path) => self.on_file_hovered(path.clone()),
            WindowEvent::HoveredFileCancelled => self.on_file_hover_cancelled(),
            WindowEvent::DroppedFile(path) => self.on_file_dropped(path.clone()),
            _ => return false,
        }
        true
    }

    fn requested_cursor(&self) -> Option<egui::CursorIcon> {
        self.requested_cursor
    }

    fn shutdown(&mut self, _ctx: &egui::Context) {
        self.events.clear();
        self.held_keys.clear();
        self.hovered_files.clear();
        self.dropped_files.clear();
        self.requested_cursor = None;
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.clipboard = None;
        }
        log::debug!("Winit platform shut down for {}", self.label);
    }
}

fn is_navigation_key(key: Key) -> bool {
    matches!(
        key,
        Key::Tab | Key::ArrowLeft | Key::ArrowRight | Key::ArrowUp | Key::ArrowDown
    )
}

/// Logical egui key for a physical winit key, or `None` for keys the
/// overlay does not forward.
fn translate_keycode(keycode: KeyCode) -> Option<Key> {
    Some(match keycode {
        KeyCode::Escape => Key::Escape,
        KeyCode::Insert => Key::Insert,
        KeyCode::Home => Key::Home,
        KeyCode::Delete => Key::Delete,
        KeyCode::End => Key::End,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowRight => Key::ArrowRight,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Space => Key::Space,

        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,

        KeyCode::Digit0 | KeyCode::Numpad0 => Key::Num0,
        KeyCode::Digit1 | KeyCode::Numpad1 => Key::Num1,
        KeyCode::Digit2 | KeyCode::Numpad2 => Key::Num2,
        KeyCode::Digit3 | KeyCode::Numpad3 => Key::Num3,
        KeyCode::Digit4 | KeyCode::Numpad4 => Key::Num4,
        KeyCode::Digit5 | KeyCode::Numpad5 => Key::Num5,
        KeyCode::Digit6 | KeyCode::Numpad6 => Key::Num6,
        KeyCode::Digit7 | KeyCode::Numpad7 => Key::Num7,
        KeyCode::Digit8 | KeyCode::Numpad8 => Key::Num8,
        KeyCode::Digit9 | KeyCode::Numpad9 => Key::Num9,

        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,

        KeyCode::Minus | KeyCode::NumpadSubtract => Key::Minus,
        KeyCode::Equal | KeyCode::NumpadAdd => Key::Equals,

        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::new(100.0, 40.0), egui::vec2(640.0, 480.0))
    }

    fn key_events(raw: &RawInput) -> Vec<(Key, bool, bool)> {
        raw.events
            .iter()
            .filter_map(|e| match e {
                egui::Event::Key {
                    key,
                    pressed,
                    repeat,
                    ..
                } => Some((*key, *pressed, *repeat)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_pointer_is_relative_to_viewport() {
        let mut platform = WinitPlatform::new();
        platform.prepare_frame_at(viewport(), 0.0);

        platform.on_mouse_move(150.0, 60.0);
        let raw = platform.prepare_frame_at(viewport(), 0.1);

        assert!(
            raw.events
                .contains(&egui::Event::PointerMoved(Pos2::new(50.0, 20.0)))
        );
        assert_eq!(
            raw.screen_rect,
            Some(Rect::from_min_size(Pos2::ZERO, egui::vec2(640.0, 480.0)))
        );
    }

    #[test]
    fn test_key_repeat_synthesized_after_delay() {
        let mut platform = WinitPlatform::new();
        platform.on_key_at(PhysicalKey::Code(KeyCode::KeyA), true, 0.0);

        let first = platform.prepare_frame_at(viewport(), 0.1);
        assert_eq!(key_events(&first), vec![(Key::A, true, false)]);

        let second = platform.prepare_frame_at(viewport(), 0.3);
        assert_eq!(key_events(&second), vec![(Key::A, true, true)]);

        let third = platform.prepare_frame_at(viewport(), 0.32);
        assert!(key_events(&third).is_empty());

        platform.on_key_at(PhysicalKey::Code(KeyCode::KeyA), false, 0.4);
        let fourth = platform.prepare_frame_at(viewport(), 1.0);
        assert_eq!(key_events(&fourth), vec![(Key::A, false, false)]);
    }

    #[test]
    fn test_os_repeats_are_ignored() {
        let mut platform = WinitPlatform::new();
        platform.on_key(PhysicalKey::Code(KeyCode::KeyB), true, true);
        assert!(key_events(&platform.prepare_frame_at(viewport(), 0.0)).is_empty());
    }

    #[test]
    fn test_navigation_keys_need_keyboard_navigation() {
        let mut platform = WinitPlatform::new();
        let config = OverlayConfig::default().with_navigation(NavigationFlags::empty());
        platform
            .initialize(&egui::Context::default(), &config, "test")
            .expect("initialize");

        platform.on_key_at(PhysicalKey::Code(KeyCode::Tab), true, 0.0);
        platform.on_key_at(PhysicalKey::Code(KeyCode::KeyQ), true, 0.0);
        let raw = platform.prepare_frame_at(viewport(), 0.0);

        assert_eq!(key_events(&raw), vec![(Key::Q, true, false)]);
    }

    #[test]
    fn test_no_mouse_drops_pointer_events() {
        let mut platform = WinitPlatform::new();
        let config = OverlayConfig::default()
            .with_navigation(NavigationFlags::KEYBOARD | NavigationFlags::NO_MOUSE);
        platform
            .initialize(&egui::Context::default(), &config, "test")
            .expect("initialize");

        platform.on_mouse_move(10.0, 10.0);
        platform.on_mouse_button(MouseButton::Left, true);
        platform.on_mouse_scroll(MouseScrollDelta::LineDelta(0.0, 1.0));
        assert!(platform.prepare_frame_at(viewport(), 0.0).events.is_empty());
    }

    #[test]
    fn test_scroll_lines_use_configured_height() {
        let mut platform = WinitPlatform::new();
        platform.on_mouse_scroll(MouseScrollDelta::LineDelta(0.0, 2.0));
        let raw = platform.prepare_frame_at(viewport(), 0.0);

        assert!(raw.events.iter().any(|e| matches!(
            e,
            egui::Event::MouseWheel { delta, .. } if *delta == Vec2::new(0.0, 48.0)
        )));
    }

    #[test]
    fn test_cursor_request_follows_mode() {
        let ctx = egui::Context::default();
        let output = egui::PlatformOutput {
            cursor_icon: egui::CursorIcon::Text,
            ..Default::default()
        };

        let mut platform = WinitPlatform::new();
        platform.handle_output(&ctx, &output);
        assert_eq!(platform.requested_cursor(), Some(egui::CursorIcon::Text));

        platform.cursor_mode = CursorMode::Hidden;
        platform.handle_output(&ctx, &output);
        assert_eq!(platform.requested_cursor(), Some(egui::CursorIcon::None));

        platform.cursor_mode = CursorMode::Ignore;
        platform.handle_output(&ctx, &output);
        assert_eq!(platform.requested_cursor(), None);
    }

    #[test]
    fn test_text_input_filters_control_characters() {
        let mut platform = WinitPlatform::new();
        platform.on_text_input("a\u{8}b");
        platform.on_text_input("\u{1b}");
        let raw = platform.prepare_frame_at(viewport(), 0.0);

        assert_eq!(raw.events, vec![egui::Event::Text("ab".to_string())]);
    }

    #[test]
    fn test_drop_ends_hover_and_is_delivered_once() {
        let mut platform = WinitPlatform::new();
        platform.on_file_hovered(PathBuf::from("scene.gltf"));
        let raw = platform.prepare_frame_at(viewport(), 0.0);
        assert_eq!(raw.hovered_files.len(), 1);
        assert!(raw.dropped_files.is_empty());

        platform.on_file_dropped(PathBuf::from("scene.gltf"));
        let raw = platform.prepare_frame_at(viewport(), 0.1);
        assert!(raw.hovered_files.is_empty());
        assert_eq!(
            raw.dropped_files[0].path.as_deref(),
            Some(std::path::Path::new("scene.gltf"))
        );

        let raw = platform.prepare_frame_at(viewport(), 0.2);
        assert!(raw.dropped_files.is_empty());
    }
}
