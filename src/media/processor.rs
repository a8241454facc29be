use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::background::{BottomShadow, CropRect};
use crate::config::MediaConfig;
use crate::error::Result;
use super::{MediaCommandBuilder, MediaProcessorTrait, RenderSpec, concat_list, parse_dimensions, parse_duration, version_line};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.ffmpeg_path, &config.ffprobe_path);

        Self { command_builder }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let stdout = self.command_builder.probe_duration(path).execute_with_output().await?;
        let duration = parse_duration(&stdout)?;
        debug!("{} lasts {:.3}s", path.display(), duration);
        Ok(duration)
    }

    async fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        let stdout = self.command_builder.probe_dimensions(path).execute_with_output().await?;
        parse_dimensions(&stdout)
    }

    async fn concat_audio(&self, inputs: &[&Path], work_dir: &Path, output_path: &Path) -> Result<()> {
        info!("Concatenating {} audio clips into {}", inputs.len(), output_path.display());

        let list_path = work_dir.join("audio_list.txt");
        fs::write(&list_path, concat_list(inputs)?).await?;

        self.command_builder
            .concat_audio(list_path.as_path(), output_path)
            .execute()
            .await?;

        info!("Audio concatenation completed");
        Ok(())
    }

    async fn render_background(
        &self,
        image_path: &Path,
        crop: &CropRect,
        shadow: &BottomShadow,
        width: u32,
        height: u32,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Conforming background {} to {}x{}",
            image_path.display(),
            width,
            height
        );

        self.command_builder
            .render_background(image_path, crop, shadow, width, height, output_path)
            .execute()
            .await?;

        info!("Background rendered to {}", output_path.display());
        Ok(())
    }

    async fn render_video(&self, spec: &RenderSpec) -> Result<()> {
        info!(
            "Rendering {:.1}s video at {} fps to {}",
            spec.duration,
            spec.fps,
            spec.output.display()
        );

        self.command_builder.render_video(spec).execute().await?;

        info!("Video rendering completed successfully");
        Ok(())
    }

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()> {
        let stdout = self.command_builder.version_check().run_blocking()?;
        info!("Media processor is available: {}", version_line(&stdout));
        Ok(())
    }
}
