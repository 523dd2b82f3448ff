use crate::constants::DEFAULT_MAX_IMAGE_BYTES;
use crate::verify::LandmarkVerifier;

#[derive(Debug, Clone)]
pub struct HandlerState {
    pub verifier: LandmarkVerifier,

    /// Upper bound on an uploaded image body.
    pub max_image_bytes: usize,
}

impl HandlerState {
    pub fn new(verifier: LandmarkVerifier) -> Self {
        Self {
            verifier,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }
}
