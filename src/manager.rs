//! Overlay lifecycle controller.
//!
//! [`OverlayManager`] owns one overlay: its egui context, the command channel
//! and render attachment, and the platform adapter and draw renderer that are
//! rebuilt on every initialization.
//!
//! Camera swaps, reloads and configuration changes are staged as a pending
//! transition and applied by the next [`OverlayManager::update`], after
//! that update's frame has been submitted against the old binding.
//!
//! Resources are acquired in the order channel, attachment, font atlas and
//! textures, platform adapter, draw renderer. [`OverlayManager::deinitialize`]
//! releases them in exactly the reverse order.

use std::sync::Arc;

use egui::TextureId;
use winit::event::WindowEvent;

use crate::callbacks::{CallbackList, LayoutCallback, LifecycleCallback, ListenerKind, ListenerToken};
use crate::channel::{CommandChannel, SharedChannel};
use crate::config::{
    FontFinalizer, FontInitializer, InputBackendKind, NavigationFlags, OverlayConfig,
    RenderBackendKind, UserData,
};
use crate::context::{DrawData, OverlayContext};
use crate::error::{LayoutError, OverlayError, OverlayResult};
use crate::host::{CameraHandle, RenderHost};
use crate::pipeline::{PipelineVariant, RenderAttachment, select_attachment};
use crate::platform::{PlatformAdapter, create_platform};
use crate::renderer::{DrawRenderer, create_renderer};
use crate::texture::TextureBinding;

/// Builds a platform adapter for each initialization.
pub type PlatformFactory = Box<dyn FnMut() -> Box<dyn PlatformAdapter>>;

/// Builds a draw renderer for each initialization.
pub type RendererFactory = Box<dyn FnMut() -> Box<dyn DrawRenderer>>;

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No resources are held.
    Disabled,
    /// Attached and rendering.
    Initialized,
    /// Initialized with a camera swap, reload or new configuration staged
    /// for the next update.
    Reinitializing,
}

/// Camera change carried by a pending reinitialization.
enum CameraSwap {
    Keep,
    Replace(Option<CameraHandle>),
}

/// Mutation staged for the next frame boundary.
enum Transition {
    Idle,
    Reinitialize {
        camera: CameraSwap,
        config: Option<OverlayConfig>,
    },
}

/// Configures and constructs an [`OverlayManager`].
pub struct OverlayBuilder {
    host: Arc<dyn RenderHost>,
    config: OverlayConfig,
    camera: Option<CameraHandle>,
    input_kind: InputBackendKind,
    render_kind: RenderBackendKind,
    platform_factory: Option<PlatformFactory>,
    renderer_factory: Option<RendererFactory>,
    font_initializer: Option<FontInitializer>,
    font_finalizer: Option<FontFinalizer>,
}

impl OverlayBuilder {
    pub fn with_config(mut self, config: OverlayConfig) -> Self {
        self.config = config;
        self
    }

    /// Camera used by the first initialization.
    pub fn with_camera(mut self, camera: CameraHandle) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_input_backend(mut self, kind: InputBackendKind) -> Self {
        self.input_kind = kind;
        self
    }

    pub fn with_render_backend(mut self, kind: RenderBackendKind) -> Self {
        self.render_kind = kind;
        self
    }

    /// Replace the built-in platform adapter selection.
    pub fn with_platform_factory(
        mut self,
        factory: impl FnMut() -> Box<dyn PlatformAdapter> + 'static,
    ) -> Self {
        self.platform_factory = Some(Box::new(factory));
        self
    }

    /// Replace the built-in draw renderer selection.
    pub fn with_renderer_factory(
        mut self,
        factory: impl FnMut() -> Box<dyn DrawRenderer> + 'static,
    ) -> Self {
        self.renderer_factory = Some(Box::new(factory));
        self
    }

    /// Edit font definitions each time the font atlas is built.
    pub fn with_font_initializer(
        mut self,
        initializer: impl FnMut(&mut egui::FontDefinitions) + 'static,
    ) -> Self {
        self.font_initializer = Some(Box::new(initializer));
        self
    }

    /// Run `finalizer` each time a built font atlas is released.
    pub fn with_font_finalizer(
        mut self,
        finalizer: impl FnMut(&egui::Context) + 'static,
    ) -> Self {
        self.font_finalizer = Some(Box::new(finalizer));
        self
    }

    /// Construct the manager. Nothing is initialized until the first
    /// [`OverlayManager::update`].
    pub fn build(self) -> OverlayManager {
        OverlayManager {
            host: self.host,
            config: self.config,
            input_kind: self.input_kind,
            render_kind: self.render_kind,
            platform_factory: self.platform_factory,
            renderer_factory: self.renderer_factory,
            font_initializer: self.font_initializer,
            font_finalizer: self.font_finalizer,
            context: OverlayContext::new(),
            camera: self.camera,
            transition: Transition::Idle,
            platform: None,
            renderer: None,
            attachment: None,
            channel: None,
            initialized: false,
            enabled: true,
            init_blocked: false,
            on_initialize: CallbackList::new(ListenerKind::Initialize),
            on_deinitialize: CallbackList::new(ListenerKind::Deinitialize),
            layout: CallbackList::new(ListenerKind::Layout),
        }
    }
}

/// Lifecycle controller of one GUI overlay.
pub struct OverlayManager {
    host: Arc<dyn RenderHost>,
    config: OverlayConfig,
    input_kind: InputBackendKind,
    render_kind: RenderBackendKind,
    platform_factory: Option<PlatformFactory>,
    renderer_factory: Option<RendererFactory>,
    font_initializer: Option<FontInitializer>,
    font_finalizer: Option<FontFinalizer>,

    context: OverlayContext,
    camera: Option<CameraHandle>,
    transition: Transition,

    platform: Option<Box<dyn PlatformAdapter>>,
    renderer: Option<Box<dyn DrawRenderer>>,
    attachment: Option<Box<dyn RenderAttachment>>,
    channel: Option<SharedChannel>,
    initialized: bool,

    enabled: bool,
    /// Set by a failed initialization; cleared by reload, camera swap or
    /// re-enabling.
    init_blocked: bool,

    on_initialize: CallbackList<dyn FnMut(&egui::Context)>,
    on_deinitialize: CallbackList<dyn FnMut(&egui::Context)>,
    layout: CallbackList<dyn FnMut(&egui::Context) -> Result<(), LayoutError>>,
}

impl OverlayManager {
    pub fn builder(host: Arc<dyn RenderHost>) -> OverlayBuilder {
        OverlayBuilder {
            host,
            config: OverlayConfig::default(),
            camera: None,
            input_kind: InputBackendKind::default(),
            render_kind: RenderBackendKind::default(),
            platform_factory: None,
            renderer_factory: None,
            font_initializer: None,
            font_finalizer: None,
        }
    }

    // ---- lifecycle ----

    pub fn state(&self) -> LifecycleState {
        match (self.initialized, &self.transition) {
            (false, _) => LifecycleState::Disabled,
            (true, Transition::Idle) => LifecycleState::Initialized,
            (true, Transition::Reinitialize { .. }) => LifecycleState::Reinitializing,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Allow initialization again after [`OverlayManager::disable`] or a
    /// failed initialization.
    pub fn enable(&mut self) {
        if !self.enabled {
            log::info!("Overlay '{}' enabled", self.config.label);
        }
        self.enabled = true;
        self.init_blocked = false;
    }

    /// Tear everything down and stop updating until re-enabled.
    pub fn disable(&mut self) {
        self.deinitialize();
        if self.enabled {
            log::info!("Overlay '{}' disabled", self.config.label);
        }
        self.enabled = false;
    }

    /// Stage a camera swap for the next update. `None` tears the overlay
    /// down and leaves it camera-less.
    pub fn set_camera(&mut self, camera: Option<CameraHandle>) {
        log::debug!(
            "Staging camera swap to {:?}",
            camera.as_ref().map(|c| c.id())
        );
        self.stage(CameraSwap::Replace(camera), None);
    }

    /// Stage a full rebuild with the current camera for the next update.
    pub fn perform_reload(&mut self) {
        log::debug!("Staging overlay reload");
        self.stage(CameraSwap::Keep, None);
    }

    /// Stage a new configuration. It takes effect through a rebuild on the
    /// next update.
    pub fn set_configuration(&mut self, config: OverlayConfig) {
        log::debug!("Staging new configuration '{}'", config.label);
        self.stage(CameraSwap::Keep, Some(config));
    }

    /// Replace the user data and re-apply the configuration immediately.
    pub fn set_user_data(&mut self, user_data: Option<UserData>) {
        if let Transition::Reinitialize {
            config: Some(staged),
            ..
        } = &mut self.transition
        {
            staged.user_data = user_data.clone();
        }
        self.config.user_data = user_data;
        self.config.apply(self.context.egui());
    }

    fn stage(&mut self, camera: CameraSwap, config: Option<OverlayConfig>) {
        self.init_blocked = false;
        match &mut self.transition {
            Transition::Idle => {
                self.transition = Transition::Reinitialize { camera, config };
            }
            Transition::Reinitialize {
                camera: staged_camera,
                config: staged_config,
            } => {
                if let CameraSwap::Replace(_) = camera {
                    *staged_camera = camera;
                }
                if config.is_some() {
                    *staged_config = config;
                }
            }
        }
    }

    /// Drive one host frame: submit the overlay frame if the pipeline expects
    /// it here, then apply any staged transition.
    ///
    /// When both steps fail, the transition error is returned and the frame
    /// error is logged.
    pub fn update(&mut self) -> OverlayResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let frame = if self.initialized && self.submits_on_update() {
            self.submit_frame()
        } else {
            Ok(())
        };

        match (frame, self.apply_transition()) {
            (Err(frame_err), Err(transition_err)) => {
                log::error!("Overlay frame failed: {}", frame_err);
                Err(transition_err)
            }
            (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn submits_on_update(&self) -> bool {
        self.pipeline_variant()
            .is_some_and(PipelineVariant::submits_on_update)
    }

    fn apply_transition(&mut self) -> OverlayResult<()> {
        match std::mem::replace(&mut self.transition, Transition::Idle) {
            Transition::Reinitialize { camera, config } => {
                self.deinitialize();

                if let CameraSwap::Replace(camera) = camera {
                    log::info!(
                        "Overlay camera changed from {:?} to {:?}",
                        self.camera.as_ref().map(|c| c.id()),
                        camera.as_ref().map(|c| c.id())
                    );
                    self.camera = camera;
                }
                if let Some(config) = config {
                    self.config = config;
                }

                if self.camera.is_some() {
                    self.initialize()
                } else {
                    log::info!("Overlay '{}' has no camera, staying torn down", self.config.label);
                    Ok(())
                }
            }
            Transition::Idle => {
                if !self.initialized && !self.init_blocked && self.camera.is_some() {
                    self.initialize()
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Acquire every resource and attach to the current camera.
    ///
    /// On failure everything acquired so far is released and initialization
    /// is not retried until the overlay is reloaded, given a camera or
    /// re-enabled.
    pub fn initialize(&mut self) -> OverlayResult<()> {
        if self.initialized {
            log::warn!("Overlay '{}' is already initialized", self.config.label);
            return Ok(());
        }

        let result = self.try_initialize();
        if let Err(err) = &result {
            log::error!("Failed to initialize overlay '{}': {}", self.config.label, err);
            self.deinitialize();
            self.init_blocked = true;
        }
        result
    }

    fn try_initialize(&mut self) -> OverlayResult<()> {
        let Some(camera) = self.camera.clone() else {
            return Err(OverlayError::MissingCamera);
        };
        let mut attachment = select_attachment(self.host.as_ref())?;

        log::info!(
            "Initializing overlay '{}' on camera {:?} ({} pipeline)",
            self.config.label,
            camera.id(),
            attachment.variant()
        );

        let channel = CommandChannel::shared(self.config.label.clone());
        attachment.attach(&channel, &camera);
        self.channel = Some(channel);
        self.attachment = Some(attachment);

        self.context
            .build_font_atlas(&self.config.font_atlas, self.font_initializer.as_mut());
        self.context.initialize();
        self.config.apply(self.context.egui());

        let platform = match self.platform_factory.as_mut() {
            Some(factory) => factory(),
            None => create_platform(self.input_kind),
        };
        self.set_platform(Some(platform))?;

        let renderer = match self.renderer_factory.as_mut() {
            Some(factory) => factory(),
            None => create_renderer(self.render_kind),
        };
        self.set_renderer(Some(renderer))?;

        self.initialized = true;
        self.on_initialize.invoke(self.context.egui());
        Ok(())
    }

    /// Release everything in reverse acquisition order. Safe to call in any
    /// state, any number of times.
    pub fn deinitialize(&mut self) {
        if self.initialized {
            log::info!("Deinitializing overlay '{}'", self.config.label);
            self.on_deinitialize.invoke(self.context.egui());
            self.initialized = false;
        }

        self.shutdown_renderer();
        self.shutdown_platform();

        if self.context.textures().is_initialized() || self.context.has_font_atlas() {
            self.context.shutdown();
            self.context.destroy_font_atlas(self.font_finalizer.as_mut());
        }

        if let Some(mut attachment) = self.attachment.take() {
            attachment.detach();
        }
        if let Some(channel) = self.channel.take() {
            channel.lock().clear();
        }
    }

    /// Swap the platform adapter: the old one is shut down before the new
    /// one is initialized. `None` only shuts down.
    pub(crate) fn set_platform(&mut self, platform: Option<Box<dyn PlatformAdapter>>) -> OverlayResult<()> {
        self.shutdown_platform();
        if let Some(mut platform) = platform {
            platform.initialize(self.context.egui(), &self.config, &self.config.label)?;
            log::debug!("Platform adapter '{}' installed", platform.name());
            self.platform = Some(platform);
        }
        Ok(())
    }

    /// Swap the draw renderer with the same contract as
    /// [`OverlayManager::set_platform`].
    pub(crate) fn set_renderer(&mut self, renderer: Option<Box<dyn DrawRenderer>>) -> OverlayResult<()> {
        self.shutdown_renderer();
        if let Some(mut renderer) = renderer {
            renderer.initialize(self.context.egui())?;
            log::debug!("Draw renderer '{}' installed", renderer.name());
            self.renderer = Some(renderer);
        }
        Ok(())
    }

    fn shutdown_platform(&mut self) {
        if let Some(mut platform) = self.platform.take() {
            log::debug!("Shutting down platform adapter '{}'", platform.name());
            platform.shutdown(self.context.egui());
        }
    }

    fn shutdown_renderer(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            log::debug!("Shutting down draw renderer '{}'", renderer.name());
            renderer.shutdown(self.context.egui());
        }
    }

    // ---- frames ----

    /// Run layout and close the frame. The frame is closed even when a
    /// layout listener fails; its texture updates then carry over to the
    /// next frame.
    fn build_frame(&mut self) -> OverlayResult<DrawData> {
        let (Some(camera), Some(platform)) = (self.camera.as_ref(), self.platform.as_mut()) else {
            return Err(OverlayError::NotInitialized);
        };

        self.context.make_current();
        self.context.prepare_frame();

        let viewport = camera.pixel_rect();
        let raw_input = platform.prepare_frame(self.context.egui(), viewport);

        let frame = self.context.begin_frame(raw_input, viewport);
        if let Err(err) = self.layout.try_invoke(frame.ctx()) {
            drop(frame);
            return Err(OverlayError::Layout(err));
        }
        let output = frame.finish();

        platform.handle_output(self.context.egui(), &output.platform_output);
        log::trace!(
            "Overlay frame closed with {} primitives",
            output.draw_data.primitives.len()
        );
        Ok(output.draw_data)
    }

    fn submit_frame(&mut self) -> OverlayResult<()> {
        let draw_data = match self.build_frame() {
            Ok(draw_data) => draw_data,
            Err(err) => {
                if let Some(channel) = self.channel.as_ref() {
                    channel.lock().retain_draws();
                }
                return Err(err);
            }
        };
        let (Some(channel), Some(renderer)) = (self.channel.as_ref(), self.renderer.as_mut()) else {
            return Err(OverlayError::NotInitialized);
        };

        let mut channel = channel.lock();
        channel.clear();
        renderer.render_draw_lists(&mut channel, &draw_data);
        Ok(())
    }

    /// Record a frame into the host's custom pass channel. Only valid when
    /// the custom-pass pipeline is active; `channel` is cleared first. If the
    /// layout fails, `channel` keeps only its previous draws.
    pub fn execute_custom_pass(&mut self, channel: &mut CommandChannel) -> OverlayResult<()> {
        let Some(active) = self.pipeline_variant().filter(|_| self.initialized) else {
            return Err(OverlayError::NotInitialized);
        };
        if active != PipelineVariant::CustomPass {
            return Err(OverlayError::WrongPipeline {
                expected: PipelineVariant::CustomPass,
                active,
            });
        }

        let draw_data = match self.build_frame() {
            Ok(draw_data) => draw_data,
            Err(err) => {
                channel.retain_draws();
                return Err(err);
            }
        };
        let Some(renderer) = self.renderer.as_mut() else {
            return Err(OverlayError::NotInitialized);
        };
        channel.clear();
        renderer.render_draw_lists(channel, &draw_data);
        Ok(())
    }

    // ---- accessors ----

    pub fn camera(&self) -> Option<&CameraHandle> {
        self.camera.as_ref()
    }

    /// Camera staged by [`OverlayManager::set_camera`], if a swap is pending.
    pub fn pending_camera(&self) -> Option<Option<&CameraHandle>> {
        match &self.transition {
            Transition::Reinitialize {
                camera: CameraSwap::Replace(camera),
                ..
            } => Some(camera.as_ref()),
            _ => None,
        }
    }

    /// Pipeline variant of the active attachment.
    pub fn pipeline_variant(&self) -> Option<PipelineVariant> {
        self.attachment.as_ref().map(|attachment| attachment.variant())
    }

    pub fn channel(&self) -> Option<&SharedChannel> {
        self.channel.as_ref()
    }

    pub fn has_platform(&self) -> bool {
        self.platform.is_some()
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn configuration(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn context(&self) -> &OverlayContext {
        &self.context
    }

    // ---- input ----

    /// Forward a host window event. Returns `true` if it became GUI input.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.platform
            .as_mut()
            .is_some_and(|platform| platform.handle_window_event(event))
    }

    /// Inject a synthetic event into the next frame. Dropped when no
    /// platform adapter is installed.
    pub fn queue_input_event(&mut self, event: egui::Event) -> bool {
        match self.platform.as_mut() {
            Some(platform) => {
                platform.queue_event(event);
                true
            }
            None => {
                log::trace!("Dropping input event, overlay is not initialized");
                false
            }
        }
    }

    pub fn requested_cursor(&self) -> Option<egui::CursorIcon> {
        self.platform.as_ref().and_then(|platform| platform.requested_cursor())
    }

    /// Whether the overlay wants pointer input instead of the host.
    pub fn wants_pointer_input(&self) -> bool {
        self.initialized && self.context.egui().wants_pointer_input()
    }

    /// Whether the overlay wants keyboard input instead of the host.
    pub fn wants_keyboard_input(&self) -> bool {
        self.initialized
            && !self
                .config
                .navigation
                .contains(NavigationFlags::NO_CAPTURE_KEYBOARD)
            && self.context.egui().wants_keyboard_input()
    }

    // ---- textures ----

    pub fn register_user_texture(&mut self, binding: TextureBinding) -> TextureId {
        self.context.textures_mut().register_user_texture(binding)
    }

    pub fn update_user_texture(&mut self, id: TextureId, binding: TextureBinding) -> bool {
        self.context.textures_mut().update_user_texture(id, binding)
    }

    pub fn unregister_user_texture(&mut self, id: TextureId) -> bool {
        self.context.textures_mut().unregister_user_texture(id)
    }

    pub fn texture_binding(&self, id: TextureId) -> Option<TextureBinding> {
        self.context.textures().binding(id)
    }

    // ---- listeners ----

    /// Run `callback` after every successful initialization.
    pub fn on_initialize(&mut self, callback: impl FnMut(&egui::Context) + 'static) -> ListenerToken {
        let callback: LifecycleCallback = Box::new(callback);
        self.on_initialize.register(callback)
    }

    /// Run `callback` at the start of every deinitialization, before
    /// resources are released.
    pub fn on_deinitialize(
        &mut self,
        callback: impl FnMut(&egui::Context) + 'static,
    ) -> ListenerToken {
        let callback: LifecycleCallback = Box::new(callback);
        self.on_deinitialize.register(callback)
    }

    /// Run `callback` once per frame to build the UI.
    pub fn add_layout(
        &mut self,
        callback: impl FnMut(&egui::Context) -> Result<(), LayoutError> + 'static,
    ) -> ListenerToken {
        let callback: LayoutCallback = Box::new(callback);
        self.layout.register(callback)
    }

    pub fn remove_listener(&mut self, token: ListenerToken) -> bool {
        match token.kind() {
            ListenerKind::Initialize => self.on_initialize.unregister(token),
            ListenerKind::Deinitialize => self.on_deinitialize.unregister(token),
            ListenerKind::Layout => self.layout.unregister(token),
        }
    }
}

impl Drop for OverlayManager {
    fn drop(&mut self) {
        self.deinitialize();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::headless::{HeadlessCamera, HeadlessHost};

    fn manager() -> OverlayManager {
        OverlayManager::builder(Arc::new(HeadlessHost::legacy()))
            .with_input_backend(InputBackendKind::Headless)
            .build()
    }

    #[test]
    fn test_stage_keeps_camera_across_reload() {
        let mut manager = manager();
        let camera: CameraHandle = HeadlessCamera::new(7, 64, 64);

        manager.set_camera(Some(camera));
        manager.perform_reload();

        assert_eq!(
            manager.pending_camera().flatten().map(|c| c.id().0),
            Some(7)
        );
    }

    #[test]
    fn test_state_reports_pending_transition() {
        let mut manager = manager();
        manager.set_camera(Some(HeadlessCamera::new(1, 64, 64)));
        assert_eq!(manager.state(), LifecycleState::Disabled);

        manager.update().expect("update");
        assert_eq!(manager.state(), LifecycleState::Initialized);

        manager.perform_reload();
        assert_eq!(manager.state(), LifecycleState::Reinitializing);
    }

    #[test]
    fn test_disabled_manager_ignores_updates() {
        let mut manager = manager();
        manager.set_camera(Some(HeadlessCamera::new(1, 64, 64)));
        manager.disable();

        manager.update().expect("update");
        assert!(!manager.is_initialized());

        manager.enable();
        manager.update().expect("update");
        assert!(manager.is_initialized());
    }

    #[test]
    fn test_removed_listener_not_invoked() {
        let mut manager = manager();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let token = manager.on_initialize(move |_| counter.set(counter.get() + 1));
        assert!(manager.remove_listener(token));

        manager.set_camera(Some(HeadlessCamera::new(1, 64, 64)));
        manager.update().expect("update");
        assert_eq!(calls.get(), 0);
    }

    struct NamedPlatform {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        inner: crate::platform::HeadlessPlatform,
    }

    impl PlatformAdapter for NamedPlatform {
        fn name(&self) -> &'static str {
            self.name
        }

        fn initialize(
            &mut self,
            ctx: &egui::Context,
            config: &OverlayConfig,
            label: &str,
        ) -> OverlayResult<()> {
            self.log.borrow_mut().push(format!("{}:init", self.name));
            self.inner.initialize(ctx, config, label)
        }

        fn prepare_frame(&mut self, ctx: &egui::Context, viewport: egui::Rect) -> egui::RawInput {
            self.inner.prepare_frame(ctx, viewport)
        }

        fn handle_output(&mut self, _ctx: &egui::Context, _output: &egui::PlatformOutput) {}

        fn queue_event(&mut self, event: egui::Event) {
            self.inner.queue_event(event);
        }

        fn shutdown(&mut self, _ctx: &egui::Context) {
            self.log.borrow_mut().push(format!("{}:shutdown", self.name));
        }
    }

    #[test]
    fn test_platform_swap_shuts_down_old_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = manager();
        manager.set_camera(Some(HeadlessCamera::new(1, 64, 64)));
        manager.update().expect("update");

        for name in ["old", "new"] {
            let platform = NamedPlatform {
                name,
                log: log.clone(),
                inner: crate::platform::HeadlessPlatform::new(),
            };
            manager.set_platform(Some(Box::new(platform))).expect("swap");
        }

        assert_eq!(*log.borrow(), vec!["old:init", "old:shutdown", "new:init"]);
        assert!(manager.has_platform());

        manager.deinitialize();
        assert_eq!(log.borrow().last().map(String::as_str), Some("new:shutdown"));
    }

    #[test]
    fn test_renderer_swap_with_none_only_shuts_down() {
        let mut manager = manager();
        manager.set_camera(Some(HeadlessCamera::new(1, 64, 64)));
        manager.update().expect("update");
        assert!(manager.has_renderer());

        manager.set_renderer(None).expect("teardown");
        assert!(!manager.has_renderer());

        manager
            .set_renderer(Some(create_renderer(RenderBackendKind::Mesh)))
            .expect("install");
        assert!(manager.has_renderer());
    }

    #[test]
    fn test_user_data_applied_immediately() {
        let mut manager = manager();
        manager.set_user_data(Some(UserData::new("hello")));

        let data = UserData::get(manager.context().egui()).expect("user data");
        assert_eq!(data.downcast_ref::<&str>(), Some(&"hello"));
    }
}
