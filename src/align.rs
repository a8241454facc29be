use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::catalog::VerseId;
use crate::error::{Result, TilawaError};

const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "wav", "m4a"];

/// One entry of a script or translation file. Script files carry `text`,
/// translation files carry `t`.
#[derive(Debug, Clone, Deserialize)]
struct VerseText {
    #[serde(alias = "t")]
    text: String,
}

/// Verse text keyed by `surah:ayah`
#[derive(Debug, Clone)]
pub struct TextSource {
    name: String,
    entries: HashMap<String, VerseText>,
}

impl TextSource {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_json(path.display().to_string(), &content)
    }

    pub fn from_json(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            entries: serde_json::from_str(content)?,
        })
    }

    pub fn lookup(&self, id: VerseId) -> Result<&str> {
        let key = id.text_key();
        self.entries
            .get(&key)
            .map(|entry| entry.text.as_str())
            .ok_or_else(|| TilawaError::MissingVerseText {
                key,
                source_name: self.name.clone(),
            })
    }
}

/// Audio, script and translation in verse order. All vectors share one index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedContent {
    pub ids: Vec<VerseId>,
    pub audio_files: Vec<PathBuf>,
    pub script: Vec<String>,
    pub translations: Vec<String>,
}

impl AlignedContent {
    pub fn len(&self) -> usize {
        self.audio_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio_files.is_empty()
    }

    fn push(&mut self, id: VerseId, audio: PathBuf, script: &str, translation: &str) {
        self.ids.push(id);
        self.audio_files.push(audio);
        self.script.push(script.to_string());
        self.translations.push(translation.to_string());
    }
}

/// Paths the aligner reads from
#[derive(Debug, Clone)]
pub struct ContentPaths<'a> {
    pub audio_dir: &'a Path,
    pub script: &'a Path,
    pub translation: &'a Path,
}

/// Sorted audio files directly inside `audio_dir`
pub fn list_audio_files(audio_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(audio_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .map(|e| e.into_path())
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

/// Load both text files and pair them with the audio folder's verses
pub fn load_content(paths: &ContentPaths<'_>, surah: Option<u16>) -> Result<AlignedContent> {
    for (label, path) in [
        ("Audio path", paths.audio_dir),
        ("Translation path", paths.translation),
        ("Script path", paths.script),
    ] {
        if !path.exists() {
            return Err(TilawaError::FileNotFound(format!(
                "{} does not exist: {}",
                label,
                path.display()
            )));
        }
    }

    let script = TextSource::from_file(paths.script)?;
    let translation = TextSource::from_file(paths.translation)?;
    let audio_files = list_audio_files(paths.audio_dir);

    let content = align(audio_files, &script, &translation, surah)?;
    if content.is_empty() {
        return Err(TilawaError::EmptyAudioFolder(paths.audio_dir.display().to_string()));
    }

    info!("Successfully loaded {} ayahs.", content.len());
    Ok(content)
}

/// Pair each audio file with its script and translation text. `audio_files`
/// must already be in the desired order.
pub fn align(
    audio_files: Vec<PathBuf>,
    script: &TextSource,
    translation: &TextSource,
    surah: Option<u16>,
) -> Result<AlignedContent> {
    let mut content = AlignedContent::default();

    for audio in audio_files {
        let stem = audio
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| TilawaError::InvalidVerseId(audio.display().to_string()))?;
        let id = VerseId::parse_stem(stem)?;

        if surah.is_some_and(|s| s != id.surah) {
            debug!("Ignoring {} outside requested surah", audio.display());
            continue;
        }

        let script_text = script.lookup(id)?;
        let translation_text = translation.lookup(id)?;
        content.push(id, audio, script_text, translation_text);
    }

    Ok(content)
}
