use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Input;
use std::path::PathBuf;

use crate::fetch::FetchRequest;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a surah's verse recitations; asks for anything not given
    Fetch {
        /// Surah number (1-114)
        #[arg(short, long)]
        surah: Option<u16>,

        /// Reciter id from the catalog
        #[arg(short, long)]
        reciter: Option<String>,

        /// Only fetch the first N verses (0 = all)
        #[arg(short, long)]
        limit: Option<u16>,
    },

    /// Render downloaded recitations into a narrated video
    Render {
        /// Folder of SSSTTT audio files
        #[arg(short, long)]
        audio_dir: Option<PathBuf>,

        /// Only render verses of this surah
        #[arg(short, long)]
        surah: Option<u16>,

        /// Script text JSON keyed by "surah:ayah"
        #[arg(long)]
        script: Option<PathBuf>,

        /// Translation text JSON keyed by "surah:ayah"
        #[arg(short, long)]
        translation: Option<PathBuf>,

        /// Background image
        #[arg(short, long)]
        background: Option<PathBuf>,

        /// Output video file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frame preset: horizontal (1920x1080) or vertical (1080x1920)
        #[arg(long)]
        orientation: Option<String>,

        /// Frame width in pixels, overrides the preset
        #[arg(long)]
        width: Option<u32>,

        /// Frame height in pixels, overrides the preset
        #[arg(long)]
        height: Option<u32>,
    },

    /// List reciters known to the catalog
    Reciters,
}

/// Fill in whatever the command line left out by asking on the terminal
pub fn prompt_fetch_request(
    surah: Option<u16>,
    reciter: Option<String>,
    limit: Option<u16>,
) -> Result<FetchRequest> {
    let surah = match surah {
        Some(surah) => surah,
        None => Input::<u16>::new()
            .with_prompt("Enter the surah number")
            .interact_text()
            .context("Failed to read surah number")?,
    };

    let reciter_id = match reciter {
        Some(reciter) => reciter,
        None => Input::<String>::new()
            .with_prompt("Enter the reciter id")
            .interact_text()
            .context("Failed to read reciter id")?,
    };

    let limit = match limit {
        Some(limit) => Some(limit),
        None => {
            let answer = Input::<String>::new()
                .with_prompt("Verse limit (empty for all)")
                .allow_empty(true)
                .interact_text()
                .context("Failed to read verse limit")?;
            parse_limit(&answer)?
        }
    };

    Ok(FetchRequest {
        surah,
        reciter_id: reciter_id.trim().to_string(),
        limit,
    })
}

/// Empty answer means no limit
fn parse_limit(answer: &str) -> Result<Option<u16>> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(None);
    }
    let limit = answer
        .parse::<u16>()
        .with_context(|| format!("Invalid verse limit '{}'", answer))?;
    Ok(Some(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit("").unwrap(), None);
        assert_eq!(parse_limit("  ").unwrap(), None);
        assert_eq!(parse_limit("5").unwrap(), Some(5));
        assert_eq!(parse_limit("0").unwrap(), Some(0));
        assert!(parse_limit("five").is_err());
    }

    #[test]
    fn test_flags_skip_prompts() {
        let request = prompt_fetch_request(Some(36), Some("7".to_string()), Some(10)).unwrap();
        assert_eq!(request.surah, 36);
        assert_eq!(request.reciter_id, "7");
        assert_eq!(request.limit, Some(10));
    }

    #[test]
    fn test_parse_render_arguments() {
        let args = Args::try_parse_from([
            "tilawa", "-v", "render", "--surah", "1", "--orientation", "vertical", "-o", "out.mp4",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Commands::Render { surah, orientation, output, width, .. } => {
                assert_eq!(surah, Some(1));
                assert_eq!(orientation.as_deref(), Some("vertical"));
                assert_eq!(output, Some(PathBuf::from("out.mp4")));
                assert_eq!(width, None);
            }
            _ => panic!("expected render command"),
        }
    }
}
