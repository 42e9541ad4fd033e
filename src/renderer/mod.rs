//! Draw renderers turn a finalized frame into command channel contents.

mod mesh;

pub use mesh::MeshRenderer;

use crate::channel::CommandChannel;
use crate::config::RenderBackendKind;
use crate::context::DrawData;
use crate::error::OverlayResult;

/// Translates egui draw data into recorded GPU commands.
pub trait DrawRenderer {
    /// Renderer name for logging.
    fn name(&self) -> &'static str;

    /// Prepare the renderer for `ctx`.
    fn initialize(&mut self, ctx: &egui::Context) -> OverlayResult<()>;

    /// Append the commands for one frame to `channel`.
    fn render_draw_lists(&mut self, channel: &mut CommandChannel, draw_data: &DrawData);

    /// Release everything acquired in [`DrawRenderer::initialize`].
    fn shutdown(&mut self, ctx: &egui::Context);
}

/// Construct the renderer for `kind`.
pub fn create_renderer(kind: RenderBackendKind) -> Box<dyn DrawRenderer> {
    match kind {
        RenderBackendKind::Mesh => Box::new(MeshRenderer::new()),
    }
}
