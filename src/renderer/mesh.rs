//! Mesh-based draw renderer.
//!
//! All meshes of a frame are batched into a single geometry upload. Each
//! mesh then becomes one indexed draw with its own texture and scissor.
//! Texture uploads are recorded before the draws and frees after them.

use egui::epaint::{ImageData, Primitive};
use egui::{ClippedPrimitive, Rect};

use super::DrawRenderer;
use crate::channel::{CommandChannel, DrawCommand, OverlayVertex, ScissorRect};
use crate::context::DrawData;
use crate::error::{OverlayError, OverlayResult};

/// Renderer recording batched indexed draws.
#[derive(Default)]
pub struct MeshRenderer {
    initialized: bool,
    warned_about_callbacks: bool,
    last_draw_calls: usize,
}

impl MeshRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Draw calls recorded by the last frame.
    pub fn last_draw_calls(&self) -> usize {
        self.last_draw_calls
    }

    fn record_texture_sets(channel: &mut CommandChannel, draw_data: &DrawData) {
        for (id, delta) in &draw_data.textures_delta.set {
            let ImageData::Color(image) = &delta.image;
            channel.push(DrawCommand::SetTexture {
                id: *id,
                pos: delta.pos,
                size: image.size,
                pixels: image.pixels.iter().flat_map(|c| c.to_array()).collect(),
            });
        }
    }

    fn record_geometry(&mut self, channel: &mut CommandChannel, draw_data: &DrawData) {
        let mut vertices: Vec<OverlayVertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        let mut draws = Vec::new();

        for ClippedPrimitive {
            clip_rect,
            primitive,
        } in &draw_data.primitives
        {
            match primitive {
                Primitive::Mesh(mesh) => {
                    if mesh.vertices.is_empty() || mesh.indices.is_empty() {
                        continue;
                    }

                    let Some(scissor) = scissor_rect(*clip_rect, draw_data) else {
                        continue;
                    };

                    let base_vertex = vertices.len() as i32;
                    let first_index = indices.len() as u32;
                    vertices.extend(mesh.vertices.iter().map(OverlayVertex::from));
                    indices.extend_from_slice(&mesh.indices);

                    draws.push(DrawCommand::DrawIndexed {
                        texture: mesh.texture_id,
                        scissor,
                        first_index,
                        index_count: mesh.indices.len() as u32,
                        base_vertex,
                    });
                }
                Primitive::Callback(_) => {
                    if !self.warned_about_callbacks {
                        log::warn!("Egui paint callbacks are not supported by the mesh renderer");
                        self.warned_about_callbacks = true;
                    }
                }
            }
        }

        self.last_draw_calls = draws.len();
        if draws.is_empty() {
            return;
        }

        channel.push(DrawCommand::UploadGeometry { vertices, indices });
        for draw in draws {
            channel.push(draw);
        }
    }
}

/// Scissor rect in physical pixels for a clip rect in points, clamped to the
/// viewport. `None` when nothing would be visible.
fn scissor_rect(clip_rect: Rect, draw_data: &DrawData) -> Option<ScissorRect> {
    let ppp = draw_data.pixels_per_point;
    let [screen_width, screen_height] = draw_data.framebuffer_size();

    let clip_min_x = (clip_rect.min.x * ppp).round() as i32;
    let clip_min_y = (clip_rect.min.y * ppp).round() as i32;
    let clip_max_x = (clip_rect.max.x * ppp).round() as i32;
    let clip_max_y = (clip_rect.max.y * ppp).round() as i32;

    let scissor_x = clip_min_x.max(0);
    let scissor_y = clip_min_y.max(0);
    let scissor_width = (clip_max_x - scissor_x).max(0) as u32;
    let scissor_height = (clip_max_y - scissor_y).max(0) as u32;

    // Clamp to viewport bounds
    let scissor_width = scissor_width.min(screen_width.saturating_sub(scissor_x as u32));
    let scissor_height = scissor_height.min(screen_height.saturating_sub(scissor_y as u32));

    if scissor_width == 0 || scissor_height == 0 {
        return None;
    }

    Some(ScissorRect {
        x: scissor_x + draw_data.viewport.min.x.round() as i32,
        y: scissor_y + draw_data.viewport.min.y.round() as i32,
        width: scissor_width,
        height: scissor_height,
    })
}

impl DrawRenderer for MeshRenderer {
    fn name(&self) -> &'static str {
        "mesh"
    }

    fn initialize(&mut self, _ctx: &egui::Context) -> OverlayResult<()> {
        if self.initialized {
            return Err(OverlayError::Renderer(
                "mesh renderer is already initialized".to_string(),
            ));
        }
        self.initialized = true;
        log::debug!("Mesh renderer initialized");
        Ok(())
    }

    fn render_draw_lists(&mut self, channel: &mut CommandChannel, draw_data: &DrawData) {
        if !self.initialized {
            log::warn!("Mesh renderer asked to render before initialization");
            return;
        }

        Self::record_texture_sets(channel, draw_data);

        let viewport = draw_data.viewport;
        channel.push(DrawCommand::SetViewport {
            x: viewport.min.x,
            y: viewport.min.y,
            width: viewport.width(),
            height: viewport.height(),
        });
        let screen = draw_data.screen_size_points();
        channel.push(DrawCommand::SetScreenSize {
            width: screen.x,
            height: screen.y,
        });

        self.record_geometry(channel, draw_data);

        for id in &draw_data.textures_delta.free {
            channel.push(DrawCommand::FreeTexture(*id));
        }
    }

    fn shutdown(&mut self, _ctx: &egui::Context) {
        if self.initialized {
            log::debug!("Mesh renderer shut down");
        }
        self.initialized = false;
        self.last_draw_calls = 0;
    }
}
