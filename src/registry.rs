//! Owner of the single overlay instance.

use crate::error::{OverlayError, OverlayResult};
use crate::manager::{OverlayBuilder, OverlayManager};

/// Holds at most one [`OverlayManager`].
///
/// The host keeps the registry and passes the manager explicitly to the code
/// that drives it.
#[derive(Default)]
pub struct OverlayRegistry {
    instance: Option<OverlayManager>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the overlay. Fails without touching the existing instance if
    /// one is already registered.
    pub fn create(&mut self, builder: OverlayBuilder) -> OverlayResult<&mut OverlayManager> {
        if self.instance.is_some() {
            log::error!("An overlay instance already exists, refusing to create another");
            return Err(OverlayError::AlreadyExists);
        }
        log::debug!("Overlay instance created");
        Ok(self.instance.insert(builder.build()))
    }

    pub fn get(&self) -> Option<&OverlayManager> {
        self.instance.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut OverlayManager> {
        self.instance.as_mut()
    }

    /// Disable and drop the instance. Returns `false` if there was none.
    pub fn destroy(&mut self) -> bool {
        match self.instance.take() {
            Some(mut manager) => {
                manager.disable();
                log::debug!("Overlay instance destroyed");
                true
            }
            None => false,
        }
    }
}
