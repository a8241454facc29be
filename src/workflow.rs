use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::align::AlignedContent;
use crate::background::{BottomShadow, center_crop};
use crate::config::Config;
use crate::error::{Result, TilawaError};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait, RenderSpec};
use crate::overlay::{OverlayLayout, verse_overlays, write_ass};
use crate::timeline::Timeline;

/// Summary of a finished render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub output: PathBuf,
    pub verses: usize,
    pub duration: f64,
}

/// Turns aligned verses into one narrated video
pub struct Workflow {
    config: Config,
    media: Box<dyn MediaProcessorTrait>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let media = MediaProcessorFactory::create_processor(config.media.clone());

        // Check dependencies
        media.check_availability()?;

        Ok(Self::with_processor(config, media))
    }

    /// Build around an existing media processor without probing for ffmpeg
    pub fn with_processor(config: Config, media: Box<dyn MediaProcessorTrait>) -> Self {
        Self { config, media }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render `content` over `background` into `output_path`
    pub async fn create_video<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        content: &AlignedContent,
        background: P,
        output_path: Q,
    ) -> Result<RenderReport> {
        let background = background.as_ref();
        let output_path = output_path.as_ref();
        let video = &self.config.video;

        if content.is_empty() {
            return Err(TilawaError::Media("Nothing to render: no verses".to_string()));
        }
        if !background.exists() {
            return Err(TilawaError::FileNotFound(format!(
                "Background image does not exist: {}",
                background.display()
            )));
        }
        for font in [&video.script_font, &video.translation_font] {
            if !font.file.exists() {
                return Err(TilawaError::FileNotFound(format!(
                    "Font does not exist: {}",
                    font.file.display()
                )));
            }
        }

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let work_dir = tempfile::tempdir()?;
        let work = work_dir.path();
        debug!("Working directory: {}", work.display());

        // Step 1: Measure every verse
        let timeline = self.build_timeline(content).await?;
        info!(
            "Timeline covers {} verses, {:.2}s in total",
            timeline.len(),
            timeline.total()
        );

        // Step 2: One continuous recitation track
        let audio_path = work.join("recitation.wav");
        let inputs: Vec<&Path> = content.audio_files.iter().map(PathBuf::as_path).collect();
        self.media.concat_audio(&inputs, work, &audio_path).await?;

        // Step 3: Background conformed to the frame, with the bottom shadow
        let (src_width, src_height) = self.media.probe_dimensions(background).await?;
        let crop = center_crop(src_width, src_height, video.width, video.height);
        let shadow = BottomShadow::new(video.height, video.shadow_darkness, video.shadow_height);
        debug!("Background {}x{} cropped to {:?}", src_width, src_height, crop);

        let background_path = work.join("background.png");
        self.media
            .render_background(background, &crop, &shadow, video.width, video.height, &background_path)
            .await?;

        // Step 4: Timed text overlays
        let layout = OverlayLayout::from_config(video);
        let overlays = verse_overlays(content, &timeline)?;
        let overlay_path = work.join("overlay.ass");
        write_ass(&overlays, &layout, video, &overlay_path).await?;

        let fonts_dir = work.join("fonts");
        stage_fonts(&fonts_dir, &[&video.script_font.file, &video.translation_font.file]).await?;

        // Step 5: Composite and encode
        let spec = RenderSpec {
            background: background_path,
            audio: audio_path,
            overlay: overlay_path,
            fonts_dir,
            output: output_path.to_path_buf(),
            fps: video.fps,
            duration: timeline.total(),
            video_codec: self.config.media.video_codec.clone(),
            audio_codec: self.config.media.audio_codec.clone(),
            pixel_format: self.config.media.pixel_format.clone(),
            extra_options: self.config.media.extra_options.clone(),
        };
        self.media.render_video(&spec).await?;

        info!("Video written to {}", output_path.display());
        Ok(RenderReport {
            output: output_path.to_path_buf(),
            verses: content.len(),
            duration: timeline.total(),
        })
    }

    async fn build_timeline(&self, content: &AlignedContent) -> Result<Timeline> {
        let mut durations = Vec::with_capacity(content.len());
        for (id, audio) in content.ids.iter().zip(&content.audio_files) {
            let duration = self.media.probe_duration(audio).await?;
            debug!("Verse {} lasts {:.3}s", id, duration);
            durations.push(duration);
        }
        Ok(Timeline::from_durations(durations))
    }
}

/// Copy font files into one directory for libass
async fn stage_fonts(fonts_dir: &Path, fonts: &[&PathBuf]) -> Result<()> {
    fs::create_dir_all(fonts_dir).await?;
    for font in fonts {
        let name = font
            .file_name()
            .ok_or_else(|| TilawaError::Config(format!("Invalid font path: {}", font.display())))?;
        fs::copy(font, fonts_dir.join(name)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::CropRect;
    use crate::catalog::VerseId;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Records every call instead of running ffmpeg
    #[derive(Clone, Default)]
    struct RecordingProcessor {
        calls: Arc<Mutex<Vec<String>>>,
        rendered: Arc<Mutex<Option<RenderSpec>>>,
    }

    #[async_trait]
    impl MediaProcessorTrait for RecordingProcessor {
        async fn probe_duration(&self, path: &Path) -> Result<f64> {
            self.calls.lock().unwrap().push(format!("duration {}", path.display()));
            let stem = path.file_stem().unwrap().to_str().unwrap();
            let id = VerseId::parse_stem(stem)?;
            Ok(f64::from(id.ayah) * 1.5)
        }

        async fn probe_dimensions(&self, _path: &Path) -> Result<(u32, u32)> {
            self.calls.lock().unwrap().push("dimensions".to_string());
            Ok((4000, 3000))
        }

        async fn concat_audio(&self, inputs: &[&Path], _work_dir: &Path, _output_path: &Path) -> Result<()> {
            self.calls.lock().unwrap().push(format!("concat {}", inputs.len()));
            Ok(())
        }

        async fn render_background(
            &self,
            _image_path: &Path,
            crop: &CropRect,
            _shadow: &BottomShadow,
            width: u32,
            height: u32,
            _output_path: &Path,
        ) -> Result<()> {
            assert!((crop.aspect_ratio() - f64::from(width) / f64::from(height)).abs() < 1e-9);
            self.calls.lock().unwrap().push(format!("background {}x{}", width, height));
            Ok(())
        }

        async fn render_video(&self, spec: &RenderSpec) -> Result<()> {
            let overlay = std::fs::read_to_string(&spec.overlay)?;
            assert_eq!(overlay.lines().filter(|l| l.starts_with("Dialogue:")).count(), 3);
            assert!(spec.fonts_dir.join("script.ttf").exists());
            self.calls.lock().unwrap().push("render".to_string());
            *self.rendered.lock().unwrap() = Some(spec.clone());
            Ok(())
        }

        fn check_availability(&self) -> Result<()> {
            Ok(())
        }
    }

    fn fixture(dir: &Path) -> (Config, AlignedContent) {
        let fonts = dir.join("fonts");
        std::fs::create_dir_all(&fonts).unwrap();
        std::fs::write(fonts.join("script.ttf"), b"font").unwrap();
        std::fs::write(fonts.join("translation.ttf"), b"font").unwrap();
        std::fs::write(dir.join("bg.jpg"), b"jpeg").unwrap();

        let mut config = Config::default();
        config.video.width = 1080;
        config.video.height = 1920;
        config.video.script_font.file = fonts.join("script.ttf");
        config.video.translation_font.file = fonts.join("translation.ttf");

        let ids: Vec<VerseId> = (1..=3).map(|ayah| VerseId::new(1, ayah)).collect();
        let content = AlignedContent {
            audio_files: ids.iter().map(|id| dir.join(format!("{}.mp3", id.file_stem()))).collect(),
            script: ids.iter().map(|id| format!("script {}", id)).collect(),
            translations: ids.iter().map(|id| format!("translation {}", id)).collect(),
            ids,
        };
        (config, content)
    }

    #[tokio::test]
    async fn test_pipeline_runs_steps_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (config, content) = fixture(dir.path());
        let processor = RecordingProcessor::default();
        let workflow = Workflow::with_processor(config, Box::new(processor.clone()));

        let output = dir.path().join("out").join("video.mp4");
        let report = workflow
            .create_video(&content, dir.path().join("bg.jpg"), &output)
            .await
            .unwrap();

        assert_eq!(report.verses, 3);
        assert!((report.duration - 9.0).abs() < 1e-9);
        assert!(output.parent().unwrap().is_dir());

        let calls = processor.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 7);
        assert!(calls[0].starts_with("duration"));
        assert!(calls[2].ends_with("001003.mp3"));
        assert_eq!(calls[3..], ["concat 3", "dimensions", "background 1080x1920", "render"]);

        let spec = processor.rendered.lock().unwrap().clone().unwrap();
        assert_eq!(spec.output, output);
        assert_eq!(spec.fps, 24);
        assert_eq!(spec.video_codec, "libx264");
        assert_eq!(spec.audio_codec, "aac");
    }

    #[tokio::test]
    async fn test_missing_background_aborts_before_media_work() {
        let dir = tempfile::tempdir().unwrap();
        let (config, content) = fixture(dir.path());
        let processor = RecordingProcessor::default();
        let workflow = Workflow::with_processor(config, Box::new(processor.clone()));

        let result = workflow
            .create_video(&content, dir.path().join("absent.jpg"), dir.path().join("v.mp4"))
            .await;

        assert!(matches!(result, Err(TilawaError::FileNotFound(_))));
        assert!(processor.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = fixture(dir.path());
        let workflow = Workflow::with_processor(config, Box::new(RecordingProcessor::default()));

        let result = workflow
            .create_video(&AlignedContent::default(), dir.path().join("bg.jpg"), dir.path().join("v.mp4"))
            .await;

        assert!(matches!(result, Err(TilawaError::Media(_))));
    }
}
