//! End-to-end tool invocations against a scripted device
//!
//! Drives the server's tools through their public entry points with a
//! `MockRunner` standing in for adb, asserting the response envelopes a
//! calling agent actually sees.

use std::{path::Path, sync::Arc};

use rmcp::{handler::server::wrapper::Parameters, model::CallToolResult};
use wear_tile_mcp::{
    exec::MockRunner,
    mcp::{AddTileParams, ListTilesParams, TileBridgeServer},
    model::BridgeConfig,
};

fn test_config(dir: &Path) -> BridgeConfig {
    BridgeConfig {
        adb_program:    "adb".to_string(),
        project_dir:    dir.to_path_buf(),
        apk_path:       dir.join("app/build/outputs/apk/debug/app-debug.apk"),
        package_name:   "com.example.wear.tiles".to_string(),
        screenshot_dir: dir.join("screenshots"),
    }
}

fn part_text(result: &CallToolResult, index: usize) -> String {
    result.content[index].as_text().unwrap().text.clone()
}

// Scenario A: list-tiles sorts the matching service lines of the simulated
// device and drops foreign packages.
#[tokio::test]
async fn list_tiles_returns_sorted_components() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(MockRunner::new());
    runner.push_ok(
        "com.example.wear.tiles/com.example.wear.tiles.PreviewTileService\n\
         com.example.wear.tiles/com.example.wear.tiles.CounterTileService\n",
    );
    let server = TileBridgeServer::new(runner, test_config(dir.path()));

    let result = server
        .list_tiles(Parameters(ListTilesParams {
            package_name: "com.example.wear.tiles".to_string(),
        }))
        .await
        .unwrap();

    assert!(!result.is_error.unwrap_or(false));
    assert_eq!(result.content.len(), 1);
    assert_eq!(
        part_text(&result, 0),
        "com.example.wear.tiles/com.example.wear.tiles.CounterTileService\n\
         com.example.wear.tiles/com.example.wear.tiles.PreviewTileService"
    );
}

// Scenario B: add-tile surfaces the device's broadcast output verbatim as the
// sole text part.
#[tokio::test]
async fn add_tile_returns_raw_broadcast_output() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(MockRunner::new());
    runner.push_ok("Broadcast completed: result=1, data=\"Index=[0]\"");
    let server = TileBridgeServer::new(Arc::<MockRunner>::clone(&runner), test_config(dir.path()));

    let result = server
        .add_tile(Parameters(AddTileParams {
            component_name: "com.example.wear.tiles/com.example.wear.tiles.PreviewTileService"
                .to_string(),
        }))
        .await
        .unwrap();

    assert!(!result.is_error.unwrap_or(false));
    assert_eq!(result.content.len(), 1);
    assert_eq!(part_text(&result, 0), "Broadcast completed: result=1, data=\"Index=[0]\"");

    // The component name travels as a discrete argument, never shell text.
    let calls = runner.calls();
    assert!(calls[0].ends_with("com.example.wear.tiles/com.example.wear.tiles.PreviewTileService"));
}

// Scenario C: a failing capture renders the full diagnostic envelope, naming
// the capture command in the second part.
#[tokio::test]
async fn failed_screenshot_names_capture_command() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(MockRunner::new());
    runner.push_ok(""); // wake succeeds
    runner.push_output(Some(1), b"", b"error: device offline");
    let server = TileBridgeServer::new(runner, test_config(dir.path()));

    let result = server.screenshot_to_stdout().await.unwrap();

    assert_eq!(result.is_error, Some(true));
    assert_eq!(result.content.len(), 3);
    assert!(part_text(&result, 0).starts_with("Error: "));
    assert!(part_text(&result, 1).contains("exec-out screencap -p"));
    assert!(part_text(&result, 2).contains("device offline"));
}

// Scenario D: build exits zero but leaves no APK; the error carries the build
// stdout and an empty stderr half in the output part.
#[tokio::test]
async fn build_without_artifact_reports_missing_apk() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(MockRunner::new());
    runner.push_ok("BUILD SUCCESSFUL in 12s");
    let server = TileBridgeServer::new(runner, test_config(dir.path()));

    let result = server.build_apk().await.unwrap();

    assert_eq!(result.is_error, Some(true));
    assert_eq!(result.content.len(), 3);
    assert!(part_text(&result, 0).contains("missing"));
    assert!(part_text(&result, 1).starts_with("Command: ./gradlew assembleDebug"));
    // stdout preserved, stderr empty after the separating newline
    assert_eq!(part_text(&result, 2), "Output: BUILD SUCCESSFUL in 12s\n");
}

#[tokio::test]
async fn screenshot_to_stdout_returns_inline_png() {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    let png = {
        let img = RgbaImage::from_pixel(32, 32, Rgba([0, 128, 255, 255]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    };

    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(MockRunner::new());
    runner.push_ok(""); // wake
    runner.push_output(Some(0), &png, b""); // screencap
    let server = TileBridgeServer::new(runner, test_config(dir.path()));

    let result = server.screenshot_to_stdout().await.unwrap();

    assert!(!result.is_error.unwrap_or(false));
    let img_content = result.content[0].as_image().unwrap();
    assert_eq!(img_content.mime_type, "image/png");

    // Round-trips as a valid PNG with the mask applied
    let decoded = STANDARD.decode(&img_content.data).unwrap();
    let rgba = image::load_from_memory(&decoded).unwrap().to_rgba8();
    assert_eq!(rgba.dimensions(), (32, 32));
    assert_eq!(rgba.get_pixel(0, 0).0[3], 0);
}

#[tokio::test]
async fn screenshot_to_file_leaves_artifact_on_disk() {
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    let png = {
        let img = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    };

    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(MockRunner::new());
    runner.push_ok("");
    runner.push_output(Some(0), &png, b"");
    let server = TileBridgeServer::new(runner, test_config(dir.path()));

    let result = server.screenshot_to_file().await.unwrap();

    assert!(!result.is_error.unwrap_or(false));
    let path = part_text(&result, 0);
    assert!(path.ends_with(".png"));
    assert!(std::path::Path::new(&path).exists(), "artifact should stay on disk");
    assert!(path.contains("screenshots"), "should land under the configured dir");
}
