//! Fullscreen handling for the player container

use crate::{Error, Result};
use tracing::debug;

/// A container that can enter and leave fullscreen
pub trait FullscreenSurface: Send {
    fn is_fullscreen(&self) -> bool;

    fn request_fullscreen(&mut self) -> Result<()>;

    fn exit_fullscreen(&mut self) -> Result<()>;
}

/// Opens the surface fullscreen if it is windowed, else leaves fullscreen.
///
/// Returns the fullscreen state the surface reports afterwards.
pub fn handle_fullscreen(surface: &mut dyn FullscreenSurface) -> Result<bool> {
    if surface.is_fullscreen() {
        surface.exit_fullscreen()?;
    } else {
        surface.request_fullscreen()?;
    }

    let fullscreen = surface.is_fullscreen();
    debug!(fullscreen, "Fullscreen toggled");
    Ok(fullscreen)
}

/// In-memory surface for headless hosts
#[derive(Debug, Default, Clone)]
pub struct HeadlessSurface {
    fullscreen: bool,
    deny_requests: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose fullscreen requests are always refused
    pub fn denying() -> Self {
        Self {
            fullscreen: false,
            deny_requests: true,
        }
    }
}

impl FullscreenSurface for HeadlessSurface {
    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn request_fullscreen(&mut self) -> Result<()> {
        if self.deny_requests {
            return Err(Error::Fullscreen("request not allowed".into()));
        }
        self.fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<()> {
        self.fullscreen = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_round_trip() {
        let mut surface = HeadlessSurface::new();
        assert!(handle_fullscreen(&mut surface).unwrap());
        assert!(surface.is_fullscreen());
        assert!(!handle_fullscreen(&mut surface).unwrap());
        assert!(!surface.is_fullscreen());
    }

    #[test]
    fn test_denied_request() {
        let mut surface = HeadlessSurface::denying();
        let err = handle_fullscreen(&mut surface).unwrap_err();
        assert_eq!(err.error_code(), "FULLSCREEN");
        assert!(!surface.is_fullscreen());
    }
}
