use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::background::{BottomShadow, CropRect, conform_filter};
use crate::error::{Result, TilawaError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Only report errors on stderr
    pub fn quiet(self) -> Self {
        self.arg("-hide_banner").arg("-loglevel").arg("error")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Add a complex filter graph
    pub fn filter_complex<S: Into<String>>(self, graph: S) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    /// Select a stream or filter pad for the output
    pub fn map<S: Into<String>>(self, stream: S) -> Self {
        self.arg("-map").arg(stream)
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        self.run_blocking().map(|_| ())
    }

    /// Execute the command and return its trimmed stdout
    pub async fn execute_with_output(&self) -> Result<String> {
        self.run_blocking()
    }

    /// Run to completion on the current thread, returning trimmed stdout
    pub fn run_blocking(&self) -> Result<String> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args);

        let output = cmd.output()
            .map_err(|e| TilawaError::Media(format!("Failed to execute {}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TilawaError::Media(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Parameters of the final encode
#[derive(Debug, Clone)]
pub struct RenderSpec {
    pub background: PathBuf,
    pub audio: PathBuf,
    pub overlay: PathBuf,
    pub fonts_dir: PathBuf,
    pub output: PathBuf,
    pub fps: u32,
    pub duration: f64,
    pub video_codec: String,
    pub audio_codec: String,
    pub pixel_format: String,
    pub extra_options: Vec<String>,
}

/// Builder for the ffmpeg/ffprobe invocations of the pipeline
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(ffmpeg_path: S1, ffprobe_path: S2) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Build container duration probe; prints seconds on stdout
    pub fn probe_duration<P: AsRef<Path>>(&self, path: P) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Duration probe")
            .args(["-v", "error"])
            .args(["-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .output(path)
    }

    /// Build first video stream size probe; prints `WxH` on stdout
    pub fn probe_dimensions<P: AsRef<Path>>(&self, path: P) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Dimension probe")
            .args(["-v", "error"])
            .args(["-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height"])
            .args(["-of", "csv=s=x:p=0"])
            .output(path)
    }

    /// Build audio concatenation command reading a concat demuxer list
    pub fn concat_audio<P: AsRef<Path>>(&self, list_file: P, output_path: P) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Audio concatenation")
            .overwrite()
            .quiet()
            .args(["-f", "concat", "-safe", "0"])
            .input(list_file)
            .no_video()
            .audio_codec("pcm_s16le")
            .output(output_path)
    }

    /// Build the still background: crop, scale and darken the bottom
    pub fn render_background<P: AsRef<Path>>(
        &self,
        image_path: P,
        crop: &CropRect,
        shadow: &BottomShadow,
        width: u32,
        height: u32,
        output_path: P,
    ) -> MediaCommand {
        let graph = format!(
            "[0:v]{},format=rgba[bg];{}[shade];[bg][shade]overlay=0:0:format=auto[out]",
            conform_filter(crop, width, height),
            shadow.source_filter(width)
        );

        MediaCommand::new(&self.ffmpeg_path, "Background rendering")
            .overwrite()
            .quiet()
            .input(image_path)
            .filter_complex(graph)
            .map("[out]")
            .args(["-frames:v", "1"])
            .output(output_path)
    }

    /// Build the final encode of looped background, overlays and recitation
    pub fn render_video(&self, spec: &RenderSpec) -> MediaCommand {
        let filter = format!(
            "subtitles=filename={}:fontsdir={},format={}",
            escape_filter_value(&spec.overlay.to_string_lossy()),
            escape_filter_value(&spec.fonts_dir.to_string_lossy()),
            spec.pixel_format
        );

        let mut cmd = MediaCommand::new(&self.ffmpeg_path, "Video rendering")
            .overwrite()
            .quiet()
            .args(["-loop", "1"])
            .arg("-framerate")
            .arg(spec.fps.to_string())
            .input(&spec.background)
            .input(&spec.audio)
            .video_filter(filter)
            .map("0:v")
            .map("1:a")
            .video_codec(spec.video_codec.clone())
            .arg("-pix_fmt")
            .arg(spec.pixel_format.clone())
            .arg("-r")
            .arg(spec.fps.to_string())
            .audio_codec(spec.audio_codec.clone())
            .arg("-t")
            .arg(format!("{:.3}", spec.duration))
            .arg("-shortest");

        // Add user-specified additional options
        for option in &spec.extra_options {
            cmd = cmd.arg(option.clone());
        }

        cmd.output(&spec.output)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Version check")
            .arg("-version")
    }
}

/// Concat demuxer list naming each file in order
pub fn concat_list<P: AsRef<Path>>(files: &[P]) -> Result<String> {
    let mut list = String::new();
    for file in files {
        // The demuxer resolves relative entries against the list's own directory
        let absolute = std::path::absolute(file.as_ref())?;
        let path = absolute.to_string_lossy().replace('\'', "'\\''");
        list.push_str(&format!("file '{}'\n", path));
    }
    Ok(list)
}

/// First line of `ffmpeg -version`, which names the build
pub fn version_line(stdout: &str) -> &str {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown version")
}

/// Escape a value for a filter option inside a filter graph: first the
/// option level (`\ ' :`), then the graph level (`\ ' [ ] , ;`)
pub fn escape_filter_value(value: &str) -> String {
    let option_level = escape_chars(value, &['\\', '\'', ':']);
    escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if special.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Parse `WxH` as printed by the dimension probe
pub fn parse_dimensions(text: &str) -> Result<(u32, u32)> {
    let invalid = || TilawaError::Media(format!("Invalid dimensions from probe: '{}'", text));

    let line = text.lines().next().ok_or_else(invalid)?;
    let (w, h) = line.trim().split_once('x').ok_or_else(invalid)?;
    let w = w.parse::<u32>().map_err(|_| invalid())?;
    let h = h.parse::<u32>().map_err(|_| invalid())?;

    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}

/// Parse seconds as printed by the duration probe
pub fn parse_duration(text: &str) -> Result<f64> {
    let duration = text
        .trim()
        .parse::<f64>()
        .map_err(|_| TilawaError::Media(format!("Invalid duration from probe: '{}'", text)))?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(TilawaError::Media(format!("Invalid duration from probe: '{}'", text)));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::center_crop;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg", "ffprobe")
    }

    #[test]
    fn test_probe_commands() {
        let duration = builder().probe_duration("audio/001001.mp3");
        assert_eq!(duration.binary_path, "ffprobe");
        assert_eq!(duration.args.last().unwrap(), "audio/001001.mp3");
        assert!(duration.args.contains(&"format=duration".to_string()));

        let dims = builder().probe_dimensions("bg.jpg");
        assert!(dims.args.windows(2).any(|w| w[0] == "-of" && w[1] == "csv=s=x:p=0"));
    }

    #[test]
    fn test_concat_audio_command() {
        let cmd = builder().concat_audio("list.txt", "recitation.wav");
        assert_eq!(cmd.binary_path, "ffmpeg");
        assert_eq!(
            cmd.args,
            [
                "-y", "-hide_banner", "-loglevel", "error", "-f", "concat", "-safe", "0",
                "-i", "list.txt", "-vn", "-c:a", "pcm_s16le", "recitation.wav"
            ]
        );
    }

    #[test]
    fn test_background_graph() {
        let crop = center_crop(4000, 3000, 1080, 1920);
        let shadow = BottomShadow::new(1920, 0.8, 0.6);
        let cmd = builder().render_background("bg.jpg", &crop, &shadow, 1080, 1920, "bg.png");

        let graph_pos = cmd.args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &cmd.args[graph_pos + 1];
        assert!(graph.starts_with("[0:v]crop="));
        assert!(graph.contains("scale=1080:1920"));
        assert!(graph.contains("color=c=black:s=1080x1920"));
        assert!(graph.ends_with("overlay=0:0:format=auto[out]"));
        assert!(cmd.args.windows(2).any(|w| w[0] == "-frames:v" && w[1] == "1"));
        assert_eq!(cmd.args.last().unwrap(), "bg.png");
    }

    #[test]
    fn test_render_video_command() {
        let spec = RenderSpec {
            background: PathBuf::from("/work/background.png"),
            audio: PathBuf::from("/work/recitation.wav"),
            overlay: PathBuf::from("/work/overlay.ass"),
            fonts_dir: PathBuf::from("/work/fonts"),
            output: PathBuf::from("out.mp4"),
            fps: 24,
            duration: 12.5,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            pixel_format: "yuv420p".to_string(),
            extra_options: vec!["-crf".to_string(), "23".to_string()],
        };

        let cmd = builder().render_video(&spec);
        let args = &cmd.args;
        assert!(args.windows(2).any(|w| w[0] == "-framerate" && w[1] == "24"));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "aac"));
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "12.500"));
        assert!(args.windows(2).any(|w| w[0] == "-vf"
            && w[1] == "subtitles=filename=/work/overlay.ass:fontsdir=/work/fonts,format=yuv420p"));
        assert_eq!(&args[args.len() - 3..], ["-crf", "23", "out.mp4"]);
    }

    #[test]
    fn test_escape_filter_value() {
        assert_eq!(escape_filter_value("/tmp/plain/overlay.ass"), "/tmp/plain/overlay.ass");
        assert_eq!(escape_filter_value("C:/x"), "C\\\\:/x");
        assert_eq!(escape_filter_value("it's"), "it\\\\\\'s");
        assert_eq!(escape_filter_value("a,b"), "a\\,b");
    }

    #[test]
    fn test_concat_list_quotes_paths() {
        let list = concat_list(&["/a/001001.mp3", "/it's/001002.mp3"]).unwrap();
        assert_eq!(list, "file '/a/001001.mp3'\nfile '/it'\\''s/001002.mp3'\n");
    }

    #[test]
    fn test_concat_list_makes_relative_paths_absolute() {
        let list = concat_list(&[Path::new("recitations/001001.mp3")]).unwrap();
        let expected = std::env::current_dir().unwrap().join("recitations/001001.mp3");

        assert_eq!(list, format!("file '{}'\n", expected.display()));
        let entry = list.trim_end().trim_start_matches("file '").trim_end_matches('\'');
        assert!(Path::new(entry).is_absolute());
    }

    #[test]
    fn test_version_line() {
        let stdout = "ffmpeg version 6.1.1 Copyright (c) 2000-2023\nbuilt with gcc 13\n";
        assert_eq!(version_line(stdout), "ffmpeg version 6.1.1 Copyright (c) 2000-2023");
        assert_eq!(version_line("\n  \n"), "unknown version");
    }

    #[test]
    fn test_parse_probe_output() {
        assert_eq!(parse_dimensions("1920x1080\n").unwrap(), (1920, 1080));
        assert!(parse_dimensions("0x1080").is_err());
        assert!(parse_dimensions("").is_err());

        assert_eq!(parse_duration("4.128000\n").unwrap(), 4.128);
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("0.000000").is_err());
    }
}
