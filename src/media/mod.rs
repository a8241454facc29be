// Media processing layer
//
// Everything that touches ffmpeg/ffprobe goes through here:
// - Commands: argument builders for each pipeline step
// - Processor: runs those commands and parses what the probes print

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::background::{BottomShadow, CropRect};
use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Duration of an audio file in seconds
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Pixel size of an image or the first video stream
    async fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32)>;

    /// Join audio files end to end into one track
    async fn concat_audio(&self, inputs: &[&Path], work_dir: &Path, output_path: &Path) -> Result<()>;

    /// Crop, scale and shade the background into a still image
    async fn render_background(
        &self,
        image_path: &Path,
        crop: &CropRect,
        shadow: &BottomShadow,
        width: u32,
        height: u32,
        output_path: &Path,
    ) -> Result<()>;

    /// Encode the final video
    async fn render_video(&self, spec: &RenderSpec) -> Result<()>;

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
