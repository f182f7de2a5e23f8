//! Per-file classification and cheap metadata probing.
//!
//! The analyzer classifies a file by extension, reads pixel dimensions for
//! images from the header, distinguishes animated from static WebP, and
//! asks ffprobe (when one is on PATH) for video/animation duration and
//! dimensions. Every probe is best-effort: a failure leaves the field
//! empty and never aborts processing of the file.

use std::io::Read;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tracing::debug;

use galleon_storage::FileKind;

use crate::config::ExtensionSets;

/// Cheap metadata gathered for one file.
#[derive(Debug, Clone, Default)]
pub struct FileDetails {
    pub kind: FileKind,
    /// Formatted duration (`mm:ss` or `h:mm:ss`) for video/animation.
    pub duration: Option<String>,
    /// Formatted `WxH` display string.
    pub dimensions: Option<String>,
    /// Raw pixel size, fed to extraction as the dimension fallback.
    pub pixel_size: Option<(u32, u32)>,
}

/// Classifies a file and probes its cheap metadata.
pub fn analyze(path: &Path, extensions: &ExtensionSets) -> FileDetails {
    let ext = dotted_extension(path);
    let mut kind = extensions.classify(&ext);

    // WebP can be static or animated; the extension alone cannot tell.
    if kind == FileKind::AnimatedImage && ext == ".webp" && !is_animated_webp(path) {
        kind = FileKind::Image;
    }

    let mut details = FileDetails {
        kind,
        ..FileDetails::default()
    };

    match kind {
        FileKind::Image | FileKind::AnimatedImage => {
            if let Ok((width, height)) = image::image_dimensions(path) {
                details.pixel_size = Some((width, height));
                details.dimensions = Some(format!("{width}x{height}"));
            } else {
                debug!(path = %path.display(), "could not read image dimensions");
            }
            if kind == FileKind::AnimatedImage {
                if let Some(probe) = ffprobe(path) {
                    details.duration = probe.duration.map(format_duration);
                }
            }
        }
        FileKind::Video => {
            if let Some(probe) = ffprobe(path) {
                details.duration = probe.duration.map(format_duration);
                if let (Some(w), Some(h)) = (probe.width, probe.height) {
                    details.dimensions = Some(format!("{w}x{h}"));
                }
            }
        }
        FileKind::Audio | FileKind::Unknown => {}
    }

    details
}

/// Lowercase extension with the leading dot, or empty string.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Formats whole seconds as `mm:ss`, or `h:mm:ss` past an hour.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, rem) = (total / 3600, total % 3600);
    let (minutes, secs) = (rem / 60, rem % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Checks the RIFF container for an `ANIM` chunk.
fn is_animated_webp(path: &Path) -> bool {
    let Ok(mut file) = std::fs::File::open(path) else {
        return false;
    };
    let mut head = [0u8; 4096];
    let Ok(read) = file.read(&mut head) else {
        return false;
    };
    let head = &head[..read];
    head.starts_with(b"RIFF") && head.windows(4).any(|w| w == b"ANIM")
}

struct ProbeResult {
    duration: Option<f64>,
    width: Option<i64>,
    height: Option<i64>,
}

/// Invokes ffprobe for container-level duration and stream dimensions.
///
/// Returns None when ffprobe is unavailable or the file cannot be probed.
fn ffprobe(path: &Path) -> Option<ProbeResult> {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let data: Value = serde_json::from_slice(&output.stdout).ok()?;

    let duration = data
        .pointer("/format/duration")
        .and_then(Value::as_str)
        .and_then(|d| d.parse::<f64>().ok());

    let video_stream = data
        .get("streams")
        .and_then(Value::as_array)
        .and_then(|streams| {
            streams.iter().find(|s| {
                s.get("codec_type").and_then(Value::as_str) == Some("video")
            })
        });
    let width = video_stream
        .and_then(|s| s.get("width"))
        .and_then(Value::as_i64);
    let height = video_stream
        .and_then(|s| s.get("height"))
        .and_then(Value::as_i64);

    Some(ProbeResult {
        duration,
        width,
        height,
    })
}
