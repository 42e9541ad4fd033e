//! Texture bookkeeping for the overlay.
//!
//! egui only sends a texture once, so the registry keeps a CPU-side copy of
//! every managed texture (font atlas included). When the overlay is
//! reinitialized with a fresh renderer and channel, the copies are queued
//! again as full uploads.
//!
//! User textures are host GPU textures shown through `ui.image`. Changes to
//! them are queued and only become visible at the next frame's
//! `prepare_frame`, so a frame never sees a half-applied change.

use std::collections::HashMap;
use std::sync::Arc;

use egui::epaint::{ImageDelta, ImageData};
use egui::{ColorImage, TextureId, TextureOptions, TexturesDelta};

/// Opaque handle of a host GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureBinding(pub u64);

struct ManagedTexture {
    image: Arc<ColorImage>,
    options: TextureOptions,
}

enum UserTextureOp {
    Set(TextureId, TextureBinding),
    Remove(TextureId),
}

/// Tracks managed and user textures across frames and reinitializations.
#[derive(Default)]
pub struct TextureRegistry {
    managed: HashMap<TextureId, ManagedTexture>,
    user: HashMap<TextureId, TextureBinding>,
    queued: Vec<UserTextureOp>,
    pending: TexturesDelta,
    next_user_texture_id: u64,
    live: bool,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start serving a fresh renderer: every known managed texture is queued
    /// for a full upload.
    pub fn initialize(&mut self) {
        self.live = true;
        self.pending = TexturesDelta::default();
        for (id, texture) in &self.managed {
            self.pending.set.push((
                *id,
                ImageDelta {
                    image: ImageData::Color(texture.image.clone()),
                    options: texture.options,
                    pos: None,
                },
            ));
        }
        log::debug!(
            "Texture registry initialized, {} managed textures queued for upload",
            self.pending.set.len()
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.live
    }

    /// Apply queued user texture changes.
    pub fn prepare_frame(&mut self) {
        for op in self.queued.drain(..) {
            match op {
                UserTextureOp::Set(id, binding) => {
                    self.user.insert(id, binding);
                }
                UserTextureOp::Remove(id) => {
                    self.user.remove(&id);
                }
            }
        }
    }

    /// Stop serving the renderer. Pending uploads are dropped; the CPU
    /// copies survive for the next initialization.
    pub fn shutdown(&mut self) {
        if self.live {
            log::debug!("Texture registry shut down");
        }
        self.live = false;
        self.pending = TexturesDelta::default();
    }

    /// Register a host texture for use in the UI.
    ///
    /// The returned id is usable right away; the binding resolves from the
    /// next frame on.
    pub fn register_user_texture(&mut self, binding: TextureBinding) -> TextureId {
        let id = TextureId::User(self.next_user_texture_id);
        self.next_user_texture_id += 1;
        self.queued.push(UserTextureOp::Set(id, binding));
        id
    }

    /// Replace the binding of a registered user texture.
    pub fn update_user_texture(&mut self, id: TextureId, binding: TextureBinding) -> bool {
        if !self.is_user_texture(id) {
            log::warn!("Attempted to update unknown user texture {:?}", id);
            return false;
        }
        self.queued.push(UserTextureOp::Set(id, binding));
        true
    }

    /// Remove a registered user texture.
    pub fn unregister_user_texture(&mut self, id: TextureId) -> bool {
        if !self.is_user_texture(id) {
            log::warn!("Attempted to unregister unknown user texture {:?}", id);
            return false;
        }
        self.queued.push(UserTextureOp::Remove(id));
        true
    }

    /// Host binding of a user texture.
    pub fn binding(&self, id: TextureId) -> Option<TextureBinding> {
        self.user.get(&id).copied()
    }

    /// Size of a managed texture's CPU copy.
    pub fn managed_size(&self, id: TextureId) -> Option<[usize; 2]> {
        self.managed.get(&id).map(|t| t.image.size)
    }

    pub fn managed_count(&self) -> usize {
        self.managed.len()
    }

    /// Record a frame's texture changes and return everything the renderer
    /// must upload this frame.
    pub(crate) fn take_frame_delta(&mut self, frame: TexturesDelta) -> TexturesDelta {
        for (id, delta) in &frame.set {
            self.record_set(*id, delta);
        }
        for id in &frame.free {
            self.managed.remove(id);
        }

        let mut delta = std::mem::take(&mut self.pending);
        delta.append(frame);
        delta
    }

    /// Keep uploads of a frame that was never rendered for the next one.
    pub(crate) fn defer(&mut self, mut delta: TexturesDelta) {
        delta.append(std::mem::take(&mut self.pending));
        self.pending = delta;
    }

    fn is_user_texture(&self, id: TextureId) -> bool {
        self.user.contains_key(&id)
            || self
                .queued
                .iter()
                .any(|op| matches!(op, UserTextureOp::Set(queued, _) if *queued == id))
    }

    fn record_set(&mut self, id: TextureId, delta: &ImageDelta) {
        let ImageData::Color(image) = &delta.image;

        let Some(pos) = delta.pos else {
            self.managed.insert(
                id,
                ManagedTexture {
                    image: image.clone(),
                    options: delta.options,
                },
            );
            return;
        };

        let Some(texture) = self.managed.get_mut(&id) else {
            log::warn!("Partial texture update for unknown texture {:?}", id);
            return;
        };

        let target = Arc::make_mut(&mut texture.image);
        let [target_width, target_height] = target.size;
        let [region_width, region_height] = image.size;
        for y in 0..region_height {
            let dst_y = pos[1] + y;
            if dst_y >= target_height {
                break;
            }
            for x in 0..region_width {
                let dst_x = pos[0] + x;
                if dst_x >= target_width {
                    break;
                }
                target.pixels[dst_y * target_width + dst_x] = image.pixels[y * region_width + x];
            }
        }
    }
}
