//! Application Configuration
//!
//! Configuration for the Content application layer.

/// Content application configuration
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Largest accepted image upload (10 MiB)
    pub image_max_bytes: usize,
    /// Largest accepted video upload (100 MiB)
    pub video_max_bytes: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            image_max_bytes: 10 * 1024 * 1024,
            video_max_bytes: 100 * 1024 * 1024,
        }
    }
}

impl ContentConfig {
    pub fn development() -> Self {
        Self::default()
    }
}
