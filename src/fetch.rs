use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::catalog::{Catalog, VerseId};
use crate::config::ArchiveConfig;
use crate::error::{Result, TilawaError};

/// Where verse audio bytes come from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Recitation archive reached over HTTP
pub struct HttpArchive {
    client: Client,
}

impl HttpArchive {
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(TilawaError::Http)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl AudioSource for HttpArchive {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(TilawaError::Download {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// What to download
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub surah: u16,
    pub reciter_id: String,
    /// Number of leading verses to fetch; `None` or `Some(0)` means the whole surah
    pub limit: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub folder: PathBuf,
    pub downloaded: usize,
    pub skipped: usize,
    /// The whole range was already on disk and nothing was checked per verse
    pub cached: bool,
}

pub struct Fetcher<'a, S: AudioSource + ?Sized> {
    catalog: &'a Catalog,
    source: &'a S,
    base_url: String,
    download_root: PathBuf,
    show_progress: bool,
}

impl<'a, S: AudioSource + ?Sized> Fetcher<'a, S> {
    pub fn new(catalog: &'a Catalog, source: &'a S, config: &ArchiveConfig) -> Self {
        Self {
            catalog,
            source,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            download_root: config.download_root.clone(),
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Remote URL of one verse file
    pub fn verse_url(&self, subfolder: &str, id: VerseId) -> String {
        format!("{}/{}/{}.mp3", self.base_url, subfolder, id.file_stem())
    }

    /// Number of verses a request covers after clamping the limit
    pub fn verse_range(&self, request: &FetchRequest) -> Result<u16> {
        let total = self.catalog.verse_count(request.surah)?;
        Ok(match request.limit {
            Some(limit) if limit > 0 => limit.min(total),
            _ => total,
        })
    }

    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchReport> {
        let reciter = self.catalog.reciter(&request.reciter_id)?;
        let verse_total = self.verse_range(request)?;
        let folder = self.download_root.join(&reciter.subfolder);

        info!(
            "Fetching surah {} ({} verses) for reciter {} into {}",
            request.surah,
            verse_total,
            request.reciter_id,
            folder.display()
        );

        if folder.is_dir() {
            info!("Folder already exists: {}", folder.display());
            let present = count_requested_files(&folder, request.surah, verse_total).await?;
            if present == usize::from(verse_total) {
                info!("All recitation already downloaded");
                return Ok(FetchReport {
                    folder,
                    downloaded: 0,
                    skipped: usize::from(verse_total),
                    cached: true,
                });
            }
            debug!("{} of {} verse files present", present, verse_total);
        } else {
            async_fs::create_dir_all(&folder).await?;
        }

        let pb = if self.show_progress {
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .map_err(|e| TilawaError::Config(format!("Invalid progress template: {}", e)))?
                .progress_chars("#>-");
            ProgressBar::new(u64::from(verse_total)).with_style(style)
        } else {
            ProgressBar::hidden()
        };

        let mut downloaded = 0;
        let mut skipped = 0;

        for ayah in 1..=verse_total {
            let id = VerseId::new(request.surah, ayah);
            let url = self.verse_url(&reciter.subfolder, id);
            let local_path = folder.join(format!("{}.mp3", id.file_stem()));
            pb.set_message(id.file_stem());

            if local_path.exists() {
                info!("Skipped as already downloaded : {}", url);
                skipped += 1;
                pb.inc(1);
                continue;
            }

            info!("Downloading : {}", url);
            let bytes = self.source.fetch(&url).await?;
            write_atomically(&local_path, &bytes).await?;
            downloaded += 1;
            pb.inc(1);
        }

        pb.finish_with_message(format!("surah {} done", request.surah));
        info!(
            "Surah {}: {} downloaded, {} already present",
            request.surah, downloaded, skipped
        );

        Ok(FetchReport {
            folder,
            downloaded,
            skipped,
            cached: false,
        })
    }
}

/// Count `.mp3` files in `folder` for verses `1..=verse_total` of `surah`
async fn count_requested_files(folder: &Path, surah: u16, verse_total: u16) -> Result<usize> {
    let mut entries = async_fs::read_dir(folder).await?;
    let mut count = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("mp3") {
            continue;
        }
        let belongs = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| VerseId::parse_stem(s).ok())
            .is_some_and(|id| id.surah == surah && id.ayah <= verse_total);
        if belongs {
            count += 1;
        }
    }

    Ok(count)
}

/// Write to a `.part` sibling and rename, so an interrupted run never leaves a
/// truncated file that looks cached
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("mp3.part");
    let mut file = async_fs::File::create(&temp_path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    async_fs::rename(&temp_path, path).await?;
    Ok(())
}
