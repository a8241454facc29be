use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, TilawaError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub archive: ArchiveConfig,
    pub content: ContentConfig,
    pub video: VideoConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON file with `ayahCount` and `recitation` tables
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Base URL of the recitation archive, without trailing slash
    pub base_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Directory under which reciter subfolders are created
    pub download_root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Quran script text keyed by "surah:ayah"
    pub script_path: PathBuf,
    /// Translation text keyed by "surah:ayah"
    pub translation_path: PathBuf,
    /// Folder of per-verse audio files to render
    pub audio_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Background image, cropped and scaled to the frame
    pub background: PathBuf,
    /// Rendered video path
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Fraction of the frame height kept free below the text block
    pub bottom_margin: f64,
    /// Fraction of the frame width text may occupy before wrapping
    pub text_box_width: f64,
    /// Approximate pixels between script text and translation text
    pub vertical_gap: u32,
    /// Shadow opacity at the very bottom of the frame (0.0 to 1.0)
    pub shadow_darkness: f64,
    /// Fraction of the frame height covered by the shadow (0.0 to 1.0)
    pub shadow_height: f64,
    pub script_font: FontConfig,
    pub translation_font: FontConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    /// Font file; its directory is handed to libass as the fonts dir
    pub file: PathBuf,
    /// Family name libass matches inside the fonts dir
    pub family: String,
    pub size: u32,
    /// Text color as RRGGBB
    #[serde(default = "default_font_color")]
    pub color: String,
}

fn default_font_color() -> String {
    "FFFFFF".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub pixel_format: String,
    /// Additional encoding options for the final render
    /// Common options: ["-preset", "medium", "-crf", "23"]
    pub extra_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory receiving execution_log.txt
    pub log_dir: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("recitation_info.json"),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://everyayah.com/data".to_string(),
            user_agent: format!("tilawa/{}", env!("CARGO_PKG_VERSION")),
            download_root: PathBuf::from("."),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            script_path: PathBuf::from("indopak_script/indopak-nastaleeq.json"),
            translation_path: PathBuf::from("quran_translations/bn-taisirul-quran-simple.json"),
            audio_dir: PathBuf::from("Abdul_Basit_Murattal_192kbps"),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            background: PathBuf::from("default_background_images/preparation-ramadan-tradition.jpg"),
            output: PathBuf::from("output_quran_recitation.mp4"),
            width: 1920,
            height: 1080,
            fps: 24,
            bottom_margin: 0.1,
            text_box_width: 0.9,
            vertical_gap: 40,
            shadow_darkness: 0.8,
            shadow_height: 0.6,
            script_font: FontConfig {
                file: PathBuf::from("indopak_script/Indopak Nastaleeq font.ttf"),
                family: "Indopak Nastaleeq".to_string(),
                size: 55,
                color: default_font_color(),
            },
            translation_font: FontConfig {
                file: PathBuf::from("fonts/Li Alinur Nakkhatra Unicode.ttf"),
                family: "Li Alinur Nakkhatra Unicode".to_string(),
                size: 40,
                color: default_font_color(),
            },
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            pixel_format: "yuv420p".to_string(),
            extra_options: vec![
                // "-preset".to_string(), "medium".to_string(),
                // "-crf".to_string(), "23".to_string(),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("."),
        }
    }
}

impl LoggingConfig {
    pub const LOG_FILE: &'static str = "execution_log.txt";

    /// Create the execution log for this run, truncating any previous one
    pub fn create_log_file(&self) -> Result<std::fs::File> {
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(std::fs::File::create(self.log_path())?)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(Self::LOG_FILE)
    }
}

/// Frame presets selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Orientation::Horizontal => (1920, 1080),
            Orientation::Vertical => (1080, 1920),
        }
    }
}

impl std::str::FromStr for Orientation {
    type Err = TilawaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "horizontal" | "landscape" => Ok(Orientation::Horizontal),
            "vertical" | "portrait" => Ok(Orientation::Vertical),
            _ => Err(TilawaError::Config(format!(
                "Invalid orientation '{}'. Valid values: horizontal, vertical",
                s
            ))),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TilawaError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| TilawaError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TilawaError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TilawaError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let video = &self.video;
        let fractions = [
            ("bottom_margin", video.bottom_margin),
            ("text_box_width", video.text_box_width),
            ("shadow_darkness", video.shadow_darkness),
            ("shadow_height", video.shadow_height),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(TilawaError::Config(format!(
                    "video.{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }

        if video.width == 0 || video.height == 0 {
            return Err(TilawaError::Config(format!(
                "video dimensions must be non-zero, got {}x{}",
                video.width, video.height
            )));
        }

        if video.fps == 0 {
            return Err(TilawaError::Config("video.fps must be non-zero".to_string()));
        }

        Ok(())
    }
}
