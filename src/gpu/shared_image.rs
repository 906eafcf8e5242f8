//! Ownership state of the image shared by the compute and display sides.

use crate::util::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOwner {
    Display,
    Compute,
}

/// Shared framebuffer bookkeeping.
///
/// The image starts owned by display. Compute must acquire it before a
/// dispatch and release it before display may draw from it or resize it.
#[derive(Debug, Clone)]
pub struct SharedImage {
    width: u32,
    height: u32,
    owner: ImageOwner,
    /// Completed compute -> display handoffs.
    handoffs: u64,
}

impl SharedImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, owner: ImageOwner::Display, handoffs: 0 }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn owner(&self) -> ImageOwner {
        self.owner
    }

    pub fn handoffs(&self) -> u64 {
        self.handoffs
    }

    pub fn acquire_for_compute(&mut self) -> Result<()> {
        match self.owner {
            ImageOwner::Display => {
                self.owner = ImageOwner::Compute;
                Ok(())
            }
            ImageOwner::Compute => Err(Error::ImageBusy),
        }
    }

    pub fn release_to_display(&mut self) -> Result<()> {
        match self.owner {
            ImageOwner::Compute => {
                self.owner = ImageOwner::Display;
                self.handoffs += 1;
                Ok(())
            }
            ImageOwner::Display => Err(Error::ImageNotAcquired),
        }
    }

    /// Fails unless compute holds the image.
    pub fn ensure_compute(&self) -> Result<()> {
        match self.owner {
            ImageOwner::Compute => Ok(()),
            ImageOwner::Display => Err(Error::ImageNotAcquired),
        }
    }

    /// Fails while compute holds the image.
    pub fn ensure_display(&self) -> Result<()> {
        match self.owner {
            ImageOwner::Display => Ok(()),
            ImageOwner::Compute => Err(Error::ImageBusy),
        }
    }

    /// Change size; only allowed while display owns the image.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.ensure_display()?;
        self.width = width;
        self.height = height;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handoff_cycle() {
        let mut img = SharedImage::new(4, 4);
        assert_eq!(img.owner(), ImageOwner::Display);
        assert!(matches!(img.ensure_compute(), Err(Error::ImageNotAcquired)));

        img.acquire_for_compute().unwrap();
        assert!(img.ensure_compute().is_ok());
        assert!(matches!(img.ensure_display(), Err(Error::ImageBusy)));
        assert!(matches!(img.acquire_for_compute(), Err(Error::ImageBusy)));
        assert!(matches!(img.resize(8, 8), Err(Error::ImageBusy)));

        img.release_to_display().unwrap();
        assert_eq!(img.handoffs(), 1);
        assert!(matches!(img.release_to_display(), Err(Error::ImageNotAcquired)));
        img.resize(8, 8).unwrap();
        assert_eq!(img.size(), (8, 8));
    }
}
