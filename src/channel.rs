//! GPU command channel.
//!
//! The channel is the recording buffer the overlay renderer writes into and
//! the host executes as part of a camera's render pass. Commands are plain
//! data so any backend (wgpu, Vulkan, or a test recorder) can replay them.

use std::sync::Arc;

use egui::TextureId;
use parking_lot::Mutex;

/// A channel shared between the overlay and the host that executes it.
pub type SharedChannel = Arc<Mutex<CommandChannel>>;

/// Overlay vertex layout: position in points, texture coordinates and a
/// normalized linear color.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OverlayVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl From<&egui::epaint::Vertex> for OverlayVertex {
    fn from(v: &egui::epaint::Vertex) -> Self {
        Self {
            pos: [v.pos.x, v.pos.y],
            uv: [v.uv.x, v.uv.y],
            color: [
                v.color.r() as f32 / 255.0,
                v.color.g() as f32 / 255.0,
                v.color.b() as f32 / 255.0,
                v.color.a() as f32 / 255.0,
            ],
        }
    }
}

/// Scissor rectangle in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A single recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Create or update a texture. `pos` is set for partial updates.
    SetTexture {
        id: TextureId,
        pos: Option<[usize; 2]>,
        size: [usize; 2],
        /// RGBA8 pixels, premultiplied alpha.
        pixels: Vec<u8>,
    },
    /// Release a texture.
    FreeTexture(TextureId),
    /// Set the viewport in physical pixels.
    SetViewport {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// Screen size in points, for the vertex shader's projection.
    SetScreenSize { width: f32, height: f32 },
    /// Upload the frame's combined vertex and index buffers.
    UploadGeometry {
        vertices: Vec<OverlayVertex>,
        indices: Vec<u32>,
    },
    /// Draw a range of the uploaded index buffer.
    DrawIndexed {
        texture: TextureId,
        scissor: ScissorRect,
        first_index: u32,
        index_count: u32,
        base_vertex: i32,
    },
}

impl DrawCommand {
    /// Whether the command creates, updates or frees a texture.
    pub fn is_texture_command(&self) -> bool {
        matches!(self, Self::SetTexture { .. } | Self::FreeTexture(_))
    }

    /// Raw vertex bytes for an `UploadGeometry` command.
    pub fn vertex_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::UploadGeometry { vertices, .. } => Some(bytemuck::cast_slice(vertices)),
            _ => None,
        }
    }

    /// Raw index bytes for an `UploadGeometry` command.
    pub fn index_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::UploadGeometry { indices, .. } => Some(bytemuck::cast_slice(indices)),
            _ => None,
        }
    }
}

/// Recording buffer of draw commands.
#[derive(Debug, Default)]
pub struct CommandChannel {
    label: String,
    commands: Vec<DrawCommand>,
}

impl CommandChannel {
    /// Create an empty channel.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
        }
    }

    /// Create an empty channel wrapped for sharing with the host.
    pub fn shared(label: impl Into<String>) -> SharedChannel {
        Arc::new(Mutex::new(Self::new(label)))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Remove all recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Drop texture uploads and frees, keeping the geometry and draws.
    ///
    /// Used when a frame could not be recorded: the host replays the last
    /// frame's draws, and texture changes it already applied must not run
    /// twice.
    pub fn retain_draws(&mut self) {
        self.commands.retain(|c| !c.is_texture_command());
    }

    /// Append a command.
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of indexed draw calls recorded.
    pub fn draw_call_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawIndexed { .. }))
            .count()
    }

    /// Textures created or updated by the recorded commands.
    pub fn texture_uploads(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::SetTexture { id, .. } => Some(*id),
            _ => None,
        })
    }
}
