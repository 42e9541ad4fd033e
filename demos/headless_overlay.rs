//! # Headless Overlay Demo
//!
//! Demonstrates:
//! - Creating the overlay through the registry
//! - Driving it from a simulated host frame loop
//! - A deferred camera swap and a reload mid-run
//! - Reading back the commands the host would execute per camera
//!
//! ```bash
//! cargo run --example headless_overlay -- --pipeline renderer-feature --frames 120
//! ```

use std::sync::Arc;

use clap::Parser;
use gui_overlay::egui;
use gui_overlay::headless::{HeadlessCamera, HeadlessHost};
use gui_overlay::{
    Camera, CameraHandle, CommandChannel, DrawCommand, InputBackendKind, OverlayConfig,
    OverlayFeature, OverlayManager, OverlayRegistry, OverlayResult, PipelineVariant,
};

/// Pipeline the simulated host runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum CliPipeline {
    /// Channel attached directly to the camera.
    #[default]
    Legacy,
    /// Channel handed to a registered renderer feature.
    RendererFeature,
    /// Host pass pulls frames from the overlay.
    CustomPass,
}

impl From<CliPipeline> for PipelineVariant {
    fn from(cli: CliPipeline) -> Self {
        match cli {
            CliPipeline::Legacy => PipelineVariant::Legacy,
            CliPipeline::RendererFeature => PipelineVariant::RendererFeature,
            CliPipeline::CustomPass => PipelineVariant::CustomPass,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "headless_overlay",
    about = "Drive a GUI overlay through a simulated host frame loop",
    version
)]
struct Args {
    /// Render pipeline reported by the host.
    #[arg(long, default_value = "legacy", value_enum)]
    pipeline: CliPipeline,

    /// Number of host frames to simulate.
    #[arg(long, default_value = "90")]
    frames: u64,

    /// Frame at which the overlay switches to the second camera.
    #[arg(long, default_value = "30")]
    swap_at: u64,

    /// Frame at which the overlay reloads.
    #[arg(long, default_value = "60")]
    reload_at: u64,
}

struct Demo {
    variant: PipelineVariant,
    feature: Option<Arc<OverlayFeature>>,
    cameras: [Arc<HeadlessCamera>; 2],
    pass: CommandChannel,
}

impl Demo {
    /// Commands the host would execute for `camera` this frame.
    fn executed(
        &mut self,
        overlay: &mut OverlayManager,
        camera: usize,
    ) -> OverlayResult<Vec<DrawCommand>> {
        let camera = &self.cameras[camera];
        Ok(match self.variant {
            PipelineVariant::Legacy => camera.execute(),
            PipelineVariant::RendererFeature => self
                .feature
                .as_ref()
                .and_then(|feature| feature.channel_for(camera.id()))
                .map(|channel| channel.lock().commands().to_vec())
                .unwrap_or_default(),
            PipelineVariant::CustomPass => {
                if !overlay.is_initialized() {
                    return Ok(Vec::new());
                }
                overlay.execute_custom_pass(&mut self.pass)?;
                self.pass.commands().to_vec()
            }
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    gui_overlay::init();

    let args = Args::parse();
    let variant = PipelineVariant::from(args.pipeline);

    let feature =
        (variant == PipelineVariant::RendererFeature).then(|| Arc::new(OverlayFeature::new()));
    let host = Arc::new(match variant {
        PipelineVariant::Legacy => HeadlessHost::legacy(),
        PipelineVariant::RendererFeature => HeadlessHost::renderer_feature(feature.clone()),
        PipelineVariant::CustomPass => HeadlessHost::custom_pass(),
    });

    let mut demo = Demo {
        variant,
        feature,
        cameras: [
            HeadlessCamera::new(1, 1280, 720),
            HeadlessCamera::new(2, 800, 600),
        ],
        pass: CommandChannel::new("custom-pass"),
    };

    let mut registry = OverlayRegistry::new();
    let first_camera: CameraHandle = demo.cameras[0].clone();
    let overlay = match registry.create(
        OverlayManager::builder(host)
            .with_config(OverlayConfig::default().with_label("demo-overlay"))
            .with_input_backend(InputBackendKind::Headless)
            .with_camera(first_camera),
    ) {
        Ok(overlay) => overlay,
        Err(err) => {
            log::error!("Failed to create overlay: {}", err);
            return;
        }
    };

    let mut frame = 0_u64;
    overlay.add_layout(move |ctx| {
        frame += 1;
        egui::Window::new("Host stats").show(ctx, |ui| {
            ui.label(format!("Overlay frame {}", frame));
            ui.label(format!("Viewport {:?}", ctx.content_rect().size()));
        });
        Ok(())
    });
    overlay.on_initialize(|_| log::info!("Overlay listener: initialized"));
    overlay.on_deinitialize(|_| log::info!("Overlay listener: deinitializing"));

    let mut active_camera = 0;
    for host_frame in 0..args.frames {
        if host_frame == args.swap_at {
            let second: CameraHandle = demo.cameras[1].clone();
            overlay.set_camera(Some(second));
        }
        if host_frame == args.reload_at {
            overlay.perform_reload();
        }

        if let Err(err) = overlay.update() {
            log::error!("Overlay update failed: {}", err);
            if err.is_fatal() {
                break;
            }
        }
        if let Some(camera) = overlay.camera() {
            active_camera = if camera.id().0 == 2 { 1 } else { 0 };
        }

        match demo.executed(overlay, active_camera) {
            Ok(commands) => {
                let draws = commands
                    .iter()
                    .filter(|c| matches!(c, DrawCommand::DrawIndexed { .. }))
                    .count();
                log::debug!(
                    "Host frame {}: camera {} executed {} commands, {} draws",
                    host_frame,
                    active_camera + 1,
                    commands.len(),
                    draws
                );
            }
            Err(err) => log::error!("Custom pass failed: {}", err),
        }
    }

    log::info!(
        "Finished {} frames, overlay {:?} on camera {:?}",
        args.frames,
        overlay.state(),
        overlay.camera().map(|c| c.id())
    );
    registry.destroy();
}
