use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::align::AlignedContent;
use crate::config::{FontConfig, VideoConfig};
use crate::error::{Result, TilawaError};
use crate::timeline::Timeline;

const SCRIPT_STYLE: &str = "Script";
const TRANSLATION_STYLE: &str = "Translation";

/// Pixel placement of the verse text block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Y coordinate the translation's bottom edge rests on
    pub bottom_limit_y: f64,
    /// Free space left and right of the wrapped text box
    pub side_margin: u32,
    /// Free space below the text block
    pub bottom_margin: u32,
    pub vertical_gap: u32,
}

impl OverlayLayout {
    pub fn from_config(video: &VideoConfig) -> Self {
        let bottom_limit_y = f64::from(video.height) * (1.0 - video.bottom_margin);
        let text_box = f64::from(video.width) * video.text_box_width;
        let side_margin = ((f64::from(video.width) - text_box) / 2.0).round() as u32;

        Self {
            frame_width: video.width,
            frame_height: video.height,
            bottom_limit_y,
            side_margin,
            bottom_margin: (f64::from(video.height) - bottom_limit_y).round() as u32,
            vertical_gap: video.vertical_gap,
        }
    }

    pub fn text_box_width(&self) -> u32 {
        self.frame_width - 2 * self.side_margin
    }
}

/// A styled, timed pair of script and translation lines
#[derive(Debug, Clone, PartialEq)]
pub struct VerseOverlay {
    pub start: f64,
    pub end: f64,
    pub script: String,
    pub translation: String,
}

/// Timed overlays for every verse; starts follow the timeline
pub fn verse_overlays(content: &AlignedContent, timeline: &Timeline) -> Result<Vec<VerseOverlay>> {
    if content.len() != timeline.len() {
        return Err(TilawaError::Media(format!(
            "{} verses but {} audio durations",
            content.len(),
            timeline.len()
        )));
    }

    Ok(timeline
        .slots()
        .iter()
        .zip(content.script.iter().zip(&content.translations))
        .map(|(slot, (script, translation))| VerseOverlay {
            start: slot.start,
            end: slot.end(),
            script: script.clone(),
            translation: translation.clone(),
        })
        .collect())
}

/// Render the overlays as an ASS document sized to the frame
pub fn render_ass(overlays: &[VerseOverlay], layout: &OverlayLayout, video: &VideoConfig) -> Result<String> {
    let mut doc = String::new();

    doc.push_str("[Script Info]\n");
    doc.push_str("ScriptType: v4.00+\n");
    let _ = writeln!(doc, "PlayResX: {}", layout.frame_width);
    let _ = writeln!(doc, "PlayResY: {}", layout.frame_height);
    doc.push_str("WrapStyle: 0\n");
    doc.push_str("ScaledBorderAndShadow: yes\n\n");

    doc.push_str("[V4+ Styles]\n");
    doc.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, \
         Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, \
         Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    doc.push_str(&style_line(SCRIPT_STYLE, &video.script_font, layout)?);
    doc.push_str(&style_line(TRANSLATION_STYLE, &video.translation_font, layout)?);
    doc.push('\n');

    doc.push_str("[Events]\n");
    doc.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");
    for overlay in overlays {
        let _ = writeln!(
            doc,
            "Dialogue: 0,{},{},{},,0,0,0,,{}",
            format_ass_time(overlay.start),
            format_ass_time(overlay.end),
            TRANSLATION_STYLE,
            event_text(overlay, layout.vertical_gap)
        );
    }

    Ok(doc)
}

/// Write the overlay document to `output_path`
pub async fn write_ass<P: AsRef<Path>>(
    overlays: &[VerseOverlay],
    layout: &OverlayLayout,
    video: &VideoConfig,
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating overlay file: {}", output_path.display());

    let doc = render_ass(overlays, layout, video)?;
    fs::write(output_path, doc).await?;

    info!("Overlay file with {} verses generated", overlays.len());
    Ok(())
}

fn style_line(name: &str, font: &FontConfig, layout: &OverlayLayout) -> Result<String> {
    let colour = ass_colour(&font.color)?;
    // Bottom-center alignment (2); libass stacks the block upwards from MarginV
    Ok(format!(
        "Style: {},{},{},{},{},&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,0,0,2,{},{},{},1\n",
        name,
        font.family,
        font.size,
        colour,
        colour,
        layout.side_margin,
        layout.side_margin,
        layout.bottom_margin
    ))
}

/// Script on top, translation at the bottom, separated by a blank spacer line
/// at font size `gap`. libass sizes that line from the font's ascent and
/// descent, so the rendered gap tracks `gap` approximately rather than to
/// the pixel.
fn event_text(overlay: &VerseOverlay, gap: u32) -> String {
    let spacer = if gap == 0 {
        String::new()
    } else {
        format!("{{\\fs{}}}\\h\\N", gap)
    };
    format!(
        "{{\\r{}}}{}\\N{}{{\\r{}}}{}",
        SCRIPT_STYLE,
        escape_ass_text(&overlay.script),
        spacer,
        TRANSLATION_STYLE,
        escape_ass_text(&overlay.translation)
    )
}

/// Neutralize characters libass would read as markup
fn escape_ass_text(text: &str) -> String {
    text.trim()
        .replace('\\', "\u{FF3C}")
        .replace('{', "(")
        .replace('}', ")")
        .replace("\r\n", "\\N")
        .replace('\n', "\\N")
}

/// `RRGGBB` to ASS `&HAABBGGRR`
fn ass_colour(rgb: &str) -> Result<String> {
    let hex = rgb.trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TilawaError::Config(format!("Invalid font color '{}', expected RRGGBB", rgb)));
    }

    let hex = hex.to_ascii_uppercase();
    Ok(format!("&H00{}{}{}", &hex[4..6], &hex[2..4], &hex[0..2]))
}

/// Format seconds as ASS time (H:MM:SS.cc)
fn format_ass_time(seconds: f64) -> String {
    let total_centis = (seconds * 100.0).round() as u64;
    let hours = total_centis / 360_000;
    let minutes = (total_centis % 360_000) / 6_000;
    let secs = (total_centis % 6_000) / 100;
    let centis = total_centis % 100;

    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, centis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VerseId;
    use std::path::PathBuf;

    fn content() -> AlignedContent {
        AlignedContent {
            ids: vec![VerseId::new(1, 1), VerseId::new(1, 2)],
            audio_files: vec![PathBuf::from("001001.mp3"), PathBuf::from("001002.mp3")],
            script: vec!["بِسْمِ ٱللَّهِ".to_string(), "ٱلْحَمْدُ لِلَّهِ".to_string()],
            translations: vec!["In the name of Allah".to_string(), "All praise {1}\nis due".to_string()],
        }
    }

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(65.123), "0:01:05.12");
        assert_eq!(format_ass_time(3661.5), "1:01:01.50");
    }

    #[test]
    fn test_layout_from_defaults() {
        let layout = OverlayLayout::from_config(&VideoConfig::default());
        assert!((layout.bottom_limit_y - 972.0).abs() < 1e-9);
        assert_eq!(layout.bottom_margin, 108);
        assert_eq!(layout.side_margin, 96);
        assert_eq!(layout.text_box_width(), 1728);
    }

    #[test]
    fn test_layout_vertical_frame() {
        let video = VideoConfig { width: 1080, height: 1920, ..VideoConfig::default() };
        let layout = OverlayLayout::from_config(&video);
        assert_eq!(layout.bottom_margin, 192);
        assert_eq!(layout.side_margin, 54);
    }

    #[test]
    fn test_overlays_follow_timeline() {
        let timeline = Timeline::from_durations([4.5, 2.25]);
        let overlays = verse_overlays(&content(), &timeline).unwrap();

        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].start, 0.0);
        assert_eq!(overlays[0].end, 4.5);
        assert_eq!(overlays[1].start, 4.5);
        assert_eq!(overlays[1].end, 6.75);
        assert_eq!(overlays[1].translation, "All praise {1}\nis due");
    }

    #[test]
    fn test_overlay_count_mismatch() {
        let timeline = Timeline::from_durations([4.5]);
        assert!(matches!(verse_overlays(&content(), &timeline), Err(TilawaError::Media(_))));
    }

    #[test]
    fn test_render_ass_document() {
        let video = VideoConfig::default();
        let layout = OverlayLayout::from_config(&video);
        let timeline = Timeline::from_durations([4.5, 2.25]);
        let overlays = verse_overlays(&content(), &timeline).unwrap();

        let doc = render_ass(&overlays, &layout, &video).unwrap();

        assert!(doc.contains("PlayResX: 1920\nPlayResY: 1080\n"));
        assert!(doc.contains("Style: Script,Indopak Nastaleeq,55,&H00FFFFFF,"));
        assert!(doc.contains(",2,96,96,108,1\n"));

        let events: Vec<&str> = doc.lines().filter(|l| l.starts_with("Dialogue:")).collect();
        assert_eq!(events.len(), 2);
        assert!(events[0].starts_with("Dialogue: 0,0:00:00.00,0:00:04.50,Translation,"));
        assert!(events[1].starts_with("Dialogue: 0,0:00:04.50,0:00:06.75,Translation,"));
        assert!(events[0].contains("{\\rScript}بِسْمِ ٱللَّهِ\\N{\\fs40}\\h\\N{\\rTranslation}In the name of Allah"));
        assert!(events[1].ends_with("All praise (1)\\Nis due"));
    }

    #[test]
    fn test_spacer_line_follows_vertical_gap() {
        let overlay = VerseOverlay {
            start: 0.0,
            end: 1.0,
            script: "script".to_string(),
            translation: "translation".to_string(),
        };

        assert_eq!(
            event_text(&overlay, 12),
            "{\\rScript}script\\N{\\fs12}\\h\\N{\\rTranslation}translation"
        );
        assert_eq!(
            event_text(&overlay, 0),
            "{\\rScript}script\\N{\\rTranslation}translation"
        );
    }

    #[test]
    fn test_colour_conversion() {
        assert_eq!(ass_colour("FFFFFF").unwrap(), "&H00FFFFFF");
        assert_eq!(ass_colour("#ff8800").unwrap(), "&H000088FF");
        assert!(matches!(ass_colour("white"), Err(TilawaError::Config(_))));
    }

    #[tokio::test]
    async fn test_write_ass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.ass");
        let video = VideoConfig::default();
        let layout = OverlayLayout::from_config(&video);

        write_ass(&[], &layout, &video, &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("[Script Info]\n"));
        assert!(written.trim_end().ends_with("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"));
    }
}
