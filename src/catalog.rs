use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{Result, TilawaError};

/// A verse position, serialized as the six-digit stem `SSSTTT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerseId {
    pub surah: u16,
    pub ayah: u16,
}

impl VerseId {
    pub fn new(surah: u16, ayah: u16) -> Self {
        Self { surah, ayah }
    }

    /// Zero-padded file stem, e.g. `002255`
    pub fn file_stem(&self) -> String {
        format!("{:03}{:03}", self.surah, self.ayah)
    }

    /// Key used by the script and translation files, e.g. `2:255`
    pub fn text_key(&self) -> String {
        format!("{}:{}", self.surah, self.ayah)
    }

    /// Parse a six-digit stem back into a verse id
    pub fn parse_stem(stem: &str) -> Result<Self> {
        if stem.len() != 6 || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TilawaError::InvalidVerseId(stem.to_string()));
        }

        let surah = stem[0..3]
            .parse::<u16>()
            .map_err(|_| TilawaError::InvalidVerseId(stem.to_string()))?;
        let ayah = stem[3..6]
            .parse::<u16>()
            .map_err(|_| TilawaError::InvalidVerseId(stem.to_string()))?;

        if surah == 0 || ayah == 0 {
            return Err(TilawaError::InvalidVerseId(stem.to_string()));
        }

        Ok(Self { surah, ayah })
    }
}

impl fmt::Display for VerseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reciter {
    /// Archive folder holding this reciter's files
    pub subfolder: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bitrate: Option<String>,
}

/// Static verse counts and reciter folders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "ayahCount")]
    ayah_count: Vec<u16>,
    #[serde(rename = "recitation")]
    reciters: BTreeMap<String, Reciter>,
}

impl Catalog {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TilawaError::FileNotFound(format!(
                "catalog {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn surah_count(&self) -> usize {
        self.ayah_count.len()
    }

    pub fn verse_count(&self, surah: u16) -> Result<u16> {
        if surah == 0 {
            return Err(TilawaError::UnknownSurah { surah, max: self.surah_count() });
        }

        self.ayah_count
            .get(usize::from(surah) - 1)
            .copied()
            .ok_or(TilawaError::UnknownSurah { surah, max: self.surah_count() })
    }

    pub fn reciter(&self, id: &str) -> Result<&Reciter> {
        self.reciters
            .get(id)
            .ok_or_else(|| TilawaError::UnknownReciter(id.to_string()))
    }

    /// Reciters ordered by id
    pub fn reciters(&self) -> impl Iterator<Item = (&String, &Reciter)> {
        self.reciters.iter()
    }
}
