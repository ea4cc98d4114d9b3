//! Screenshot capture with round watch-face masking
//!
//! Compound operation reused by two tools: wake the device, pull the raw
//! framebuffer PNG, apply a circular alpha mask (emulating a round watch
//! face), write the result to a timestamped file, and validate the artifact.
//! Filenames are millisecond-timestamped; two captures within the same
//! millisecond collide, which is accepted for a manually-driven dev tool.

use std::path::{Path, PathBuf};

use chrono::Utc;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::{
    adb::AdbClient,
    error::{BridgeError, BridgeResult},
};

/// Returns a fresh timestamped PNG path under `dir`
pub fn screenshot_path(dir: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S%3f");
    dir.join(format!("wear-screenshot-{}.png", stamp))
}

/// Applies a circular alpha mask to PNG bytes
///
/// Pixels outside the inscribed circle (centered, radius half the smaller
/// dimension) become fully transparent. Dimensions are preserved.
pub fn apply_round_mask(png: &[u8]) -> BridgeResult<Vec<u8>> {
    let decoded =
        image::load_from_memory(png).map_err(|e| BridgeError::Image(e.to_string()))?;
    let mut rgba = decoded.to_rgba8();

    let (width, height) = rgba.dimensions();
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let radius = width.min(height) as f32 / 2.0;
    let radius_sq = radius * radius;

    for (x, y, pixel) in rgba.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        if dx * dx + dy * dy > radius_sq {
            pixel.0[3] = 0;
        }
    }

    let mut out = Vec::new();
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| BridgeError::Image(e.to_string()))?;
    Ok(out)
}

/// Captures the device display into a round-masked PNG at `target`
///
/// Fails with a command-shaped error when waking or capturing fails, an
/// `Image` error when the capture is not decodable, and `ArtifactMissing`
/// (naming the capture command) when the written file does not validate.
pub async fn capture_screenshot(adb: &AdbClient, target: &Path) -> BridgeResult<()> {
    adb.wake().await?;
    let raw = adb.screencap_png().await?;
    let masked = apply_round_mask(&raw)?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(target, &masked).await?;

    if tokio::fs::metadata(target).await.is_err() {
        return Err(BridgeError::ArtifactMissing {
            command: adb.screencap_command().to_string(),
            stdout:  String::new(),
            path:    target.to_path_buf(),
        });
    }

    debug!(path = %target.display(), bytes = masked.len(), "screenshot written");
    Ok(())
}
