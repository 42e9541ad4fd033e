//! Overlay configuration.
//!
//! [`OverlayConfig`] is applied to the egui context when the overlay
//! initializes and is not mutated afterwards, except for the user data which
//! is re-applied immediately by `OverlayManager::set_user_data`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

/// Which platform adapter the overlay constructs on initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputBackendKind {
    /// Translate winit window events.
    #[default]
    Winit,
    /// Only injected events, no window system.
    Headless,
}

/// Which draw renderer the overlay constructs on initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderBackendKind {
    /// Batch egui meshes into indexed draws.
    #[default]
    Mesh,
}

bitflags! {
    /// Input routing flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NavigationFlags: u32 {
        /// Forward Tab and arrow keys so widgets can be navigated by keyboard.
        const KEYBOARD = 1 << 0;
        /// Ignore mouse input entirely.
        const NO_MOUSE = 1 << 1;
        /// Never report keyboard capture to the host.
        const NO_CAPTURE_KEYBOARD = 1 << 2;
    }
}

/// How the overlay's requested mouse cursor is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorMode {
    /// Forward egui's cursor icon to the host window.
    #[default]
    Host,
    /// Ask the host to hide the cursor while the overlay is active.
    Hidden,
    /// Leave the host cursor alone.
    Ignore,
}

/// Opaque user data exposed to layout code through the egui context.
#[derive(Clone)]
pub struct UserData(pub Arc<dyn Any + Send + Sync>);

impl UserData {
    const ID: &'static str = "gui_overlay::user_data";

    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Read the user data currently applied to `ctx`.
    pub fn get(ctx: &egui::Context) -> Option<Self> {
        ctx.data(|d| d.get_temp::<Self>(egui::Id::new(Self::ID)))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    fn apply(value: Option<&Self>, ctx: &egui::Context) {
        let id = egui::Id::new(Self::ID);
        ctx.data_mut(|d| match value {
            Some(data) => d.insert_temp(id, data.clone()),
            None => d.remove::<Self>(id),
        });
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserData").finish_non_exhaustive()
    }
}

/// A font added to the atlas.
#[derive(Debug, Clone)]
pub struct FontSource {
    pub name: String,
    /// TTF/OTF bytes.
    pub bytes: Arc<Vec<u8>>,
    pub family: egui::FontFamily,
    /// Put the font in front of the family's fallback list.
    pub primary: bool,
}

/// Font atlas contents.
#[derive(Debug, Clone)]
pub struct FontAtlasConfig {
    /// Start from egui's built-in fonts instead of an empty atlas.
    pub include_defaults: bool,
    pub fonts: Vec<FontSource>,
}

impl Default for FontAtlasConfig {
    fn default() -> Self {
        Self {
            include_defaults: true,
            fonts: Vec::new(),
        }
    }
}

impl FontAtlasConfig {
    /// Build egui font definitions for this atlas.
    pub fn font_definitions(&self) -> egui::FontDefinitions {
        let mut definitions = if self.include_defaults {
            egui::FontDefinitions::default()
        } else {
            egui::FontDefinitions::empty()
        };

        for font in &self.fonts {
            definitions.font_data.insert(
                font.name.clone(),
                Arc::new(egui::FontData::from_owned(font.bytes.to_vec())),
            );
            let family = definitions.families.entry(font.family.clone()).or_default();
            if font.primary {
                family.insert(0, font.name.clone());
            } else {
                family.push(font.name.clone());
            }
        }

        definitions
    }
}

/// Hook that edits font definitions after the atlas config is applied.
pub type FontInitializer = Box<dyn FnMut(&mut egui::FontDefinitions)>;

/// Hook run when a built font atlas is released.
pub type FontFinalizer = Box<dyn FnMut(&egui::Context)>;

/// Configuration for the overlay.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Label passed to the platform adapter and used for the command channel.
    pub label: String,
    pub navigation: NavigationFlags,
    /// Maximum delay between the clicks of a double click, in seconds.
    pub double_click_time: f64,
    /// Maximum press duration still counted as a click, in seconds.
    pub click_max_duration: f64,
    /// Pointer travel in points before a press becomes a drag.
    pub drag_threshold: f32,
    /// Seconds a key is held before it starts repeating.
    pub key_repeat_delay: f64,
    /// Seconds between key repeats.
    pub key_repeat_interval: f64,
    /// Global UI scale.
    pub font_scale: f32,
    pub cursor: CursorMode,
    pub text_cursor_blink: bool,
    /// Allow resizing windows by grabbing their edges.
    pub resize_from_edges: bool,
    /// Seconds the pointer rests before a tooltip shows.
    pub tooltip_delay: f32,
    pub selectable_labels: bool,
    /// Duration of UI animations, in seconds.
    pub animation_time: f32,
    /// Points scrolled per wheel line.
    pub scroll_line_height: f32,
    pub max_texture_side: usize,
    /// Override of the camera's native pixels per point.
    pub pixels_per_point: Option<f32>,
    pub theme: egui::ThemePreference,
    pub user_data: Option<UserData>,
    pub font_atlas: FontAtlasConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            label: "gui-overlay".to_string(),
            navigation: NavigationFlags::KEYBOARD,
            double_click_time: 0.3,
            click_max_duration: 0.8,
            drag_threshold: 6.0,
            key_repeat_delay: 0.275,
            key_repeat_interval: 0.05,
            font_scale: 1.0,
            cursor: CursorMode::Host,
            text_cursor_blink: true,
            resize_from_edges: true,
            tooltip_delay: 0.5,
            selectable_labels: true,
            animation_time: 1.0 / 12.0,
            scroll_line_height: 24.0,
            max_texture_side: 8192,
            pixels_per_point: None,
            theme: egui::ThemePreference::Dark,
            user_data: None,
            font_atlas: FontAtlasConfig::default(),
        }
    }
}

impl OverlayConfig {
    /// Radius of the edge grab area when edge resizing is enabled.
    const RESIZE_GRAB_RADIUS: f32 = 5.0;

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_navigation(mut self, navigation: NavigationFlags) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn with_font_scale(mut self, scale: f32) -> Self {
        self.font_scale = scale;
        self
    }

    pub fn with_cursor(mut self, cursor: CursorMode) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_theme(mut self, theme: egui::ThemePreference) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_user_data(mut self, user_data: UserData) -> Self {
        self.user_data = Some(user_data);
        self
    }

    pub fn with_font_atlas(mut self, font_atlas: FontAtlasConfig) -> Self {
        self.font_atlas = font_atlas;
        self
    }

    /// Apply the configuration to a live egui context.
    pub fn apply(&self, ctx: &egui::Context) {
        ctx.options_mut(|options| {
            options.input_options.max_double_click_delay = self.double_click_time;
            options.input_options.max_click_duration = self.click_max_duration;
            options.input_options.max_click_dist = self.drag_threshold;
        });
        ctx.set_theme(self.theme);
        ctx.set_zoom_factor(self.font_scale);
        ctx.all_styles_mut(|style| {
            style.animation_time = self.animation_time;
            style.interaction.tooltip_delay = self.tooltip_delay;
            style.interaction.selectable_labels = self.selectable_labels;
            style.interaction.resize_grab_radius_side = if self.resize_from_edges {
                Self::RESIZE_GRAB_RADIUS
            } else {
                0.0
            };
            style.visuals.text_cursor.blink = self.text_cursor_blink;
        });
        UserData::apply(self.user_data.as_ref(), ctx);
    }
}
