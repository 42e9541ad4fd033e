//! # GUI Overlay
//!
//! Attaches an egui overlay to a host renderer built around per-camera
//! rendering and one of several render pipeline variants.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`OverlayManager`] - Lifecycle controller: camera binding, deferred
//!   reloads, per-frame submission and listener lists
//! - [`OverlayRegistry`] - Owner of the single overlay instance
//! - [`RenderAttachment`] - One attachment strategy per [`PipelineVariant`]
//! - [`PlatformAdapter`] and [`DrawRenderer`] - Swappable input and draw
//!   backends
//! - [`headless`] - In-memory host and camera for tests and tools
//!
//! ## Example
//!
//! ```ignore
//! use gui_overlay::{OverlayManager, OverlayRegistry};
//!
//! let mut registry = OverlayRegistry::new();
//! let overlay = registry.create(OverlayManager::builder(host))?;
//! overlay.add_layout(|ctx| {
//!     egui::Window::new("Stats").show(ctx, |ui| ui.label("Hello"));
//!     Ok(())
//! });
//! overlay.set_camera(Some(camera));
//!
//! // Every host frame:
//! overlay.update()?;
//! ```

pub mod callbacks;
pub mod channel;
pub mod config;
pub mod context;
pub mod error;
pub mod headless;
pub mod host;
pub mod manager;
pub mod pipeline;
pub mod platform;
pub mod registry;
pub mod renderer;
pub mod texture;

// Re-export main types for convenience
pub use callbacks::{ListenerKind, ListenerToken};
pub use channel::{CommandChannel, DrawCommand, OverlayVertex, ScissorRect, SharedChannel};
pub use config::{
    CursorMode, FontAtlasConfig, FontSource, InputBackendKind, NavigationFlags, OverlayConfig,
    RenderBackendKind, UserData,
};
pub use context::{DrawData, FrameOutput, FrameScope, OverlayContext, current_context};
pub use error::{LayoutError, OverlayError, OverlayResult};
pub use host::{Camera, CameraEvent, CameraHandle, CameraId, RenderHost};
pub use manager::{LifecycleState, OverlayBuilder, OverlayManager};
pub use pipeline::{OverlayFeature, PipelineVariant, RenderAttachment};
pub use platform::{HeadlessPlatform, PlatformAdapter, WinitPlatform};
pub use registry::OverlayRegistry;
pub use renderer::{DrawRenderer, MeshRenderer};
pub use texture::{TextureBinding, TextureRegistry};

pub use egui;

/// Overlay library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the overlay library.
pub fn init() {
    log::info!("GUI Overlay v{} initialized", VERSION);
}
