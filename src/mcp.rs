//! MCP service implementation with tool routing
//!
//! Exposes the adb bridge as MCP tools. Tool logic returns `BridgeResult`
//! and a single rendering point converts failures into the error envelope:
//! command-shaped errors produce three ordered text parts (message, command,
//! combined output) so the calling agent can reproduce the invocation;
//! anything else produces the message alone. Tool logic never builds error
//! envelopes itself.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use rmcp::{
    ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ErrorData as McpError, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    adb::AdbClient,
    error::{BridgeError, BridgeResult},
    exec::{CommandRunner, Exec},
    model::BridgeConfig,
    screenshot::{capture_screenshot, screenshot_path},
};

/// Parameters for the add-tile tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddTileParams {
    /// Tile provider component, `<package>/<class>`
    pub component_name: String,
}

/// Parameters for the remove-tile tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveTileParams {
    /// Tile provider component, `<package>/<class>`
    pub component_name: String,
}

/// Parameters for the show-tile tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShowTileParams {
    /// Carousel slot to display (0-based)
    pub tile_index: u32,
}

/// Parameters for the list-tiles tool
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTilesParams {
    /// Package to enumerate tile providers for
    pub package_name: String,
}

/// Renders a bridge error as an error envelope
///
/// Part order is a debugging contract: the message first, then the exact
/// command for reproducibility, then the combined captured output.
pub fn error_response(err: BridgeError) -> CallToolResult {
    let mut content = vec![Content::text(format!("Error: {}", err))];
    if let Some(diag) = err.command_diagnostics() {
        content.push(Content::text(format!("Command: {}", diag.command)));
        content.push(Content::text(format!("Output: {}\n{}", diag.stdout, diag.stderr)));
    }
    CallToolResult::error(content)
}

fn render(result: BridgeResult<CallToolResult>) -> CallToolResult {
    result.unwrap_or_else(error_response)
}

fn text_success(text: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text)])
}

/// Wear tile bridge MCP server
///
/// # Tools
///
/// - `build-apk` / `install-apk`: build and deploy the sample tile app
/// - `add-tile` / `show-tile` / `remove-tile`: manipulate the tile carousel
/// - `list-tiles`: enumerate tile providers for a package
/// - `get-package-name`: report the configured package
/// - `screenshot-to-stdout` / `screenshot-to-file`: round-masked captures
#[derive(Clone)]
pub struct TileBridgeServer {
    /// Tool router for dispatching tool calls
    tool_router: ToolRouter<Self>,
    adb:         Arc<AdbClient>,
}

#[tool_router]
impl TileBridgeServer {
    /// Creates a server over the given command runner and configuration
    ///
    /// The tool set is fixed here at construction; there is no registration
    /// after startup.
    pub fn new(runner: Arc<dyn CommandRunner>, config: BridgeConfig) -> Self {
        Self {
            tool_router: Self::tool_router(),
            adb:         Arc::new(AdbClient::new(Exec::new(runner), config)),
        }
    }

    /// Creates a server driving real processes, configured from the environment
    pub fn from_env() -> Self {
        Self::new(Arc::new(crate::exec::SystemRunner), BridgeConfig::from_env())
    }

    #[tool(
        name = "build-apk",
        description = "Build the debug APK of the sample tile app. Runs `./gradlew \
                       assembleDebug` in the project directory and returns the absolute path \
                       to the built artifact."
    )]
    pub async fn build_apk(&self) -> Result<CallToolResult, McpError> {
        Ok(render(self.adb.build_apk().await.map(text_success)))
    }

    #[tool(
        name = "install-apk",
        description = "Install the most recent debug build onto the attached device. Runs \
                       `adb install -r <apk>` and returns the raw install output."
    )]
    pub async fn install_apk(&self) -> Result<CallToolResult, McpError> {
        Ok(render(self.adb.install_apk().await.map(text_success)))
    }

    #[tool(
        name = "add-tile",
        description = "Add a tile for a component to the carousel. Runs `adb shell am \
                       broadcast -a com.google.android.wearable.app.DEBUG_SURFACE --es \
                       operation add-tile --ecn component <componentName>`. Re-adding an \
                       existing component reinserts it at its slot; a full carousel evicts \
                       the oldest entry."
    )]
    pub async fn add_tile(
        &self,
        Parameters(params): Parameters<AddTileParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(
            self.adb.add_tile(&params.component_name).await.map(text_success),
        ))
    }

    #[tool(
        name = "show-tile",
        description = "Display the tile at a carousel slot. Runs `adb shell am broadcast -a \
                       com.google.android.wearable.app.DEBUG_SYSUI --es operation show-tile \
                       --ei index <tileIndex>`."
    )]
    pub async fn show_tile(
        &self,
        Parameters(params): Parameters<ShowTileParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(self.adb.show_tile(params.tile_index).await.map(text_success)))
    }

    #[tool(
        name = "remove-tile",
        description = "Remove all carousel entries for a component. Runs `adb shell am \
                       broadcast -a com.google.android.wearable.app.DEBUG_SURFACE --es \
                       operation remove-tile --ecn component <componentName>`."
    )]
    pub async fn remove_tile(
        &self,
        Parameters(params): Parameters<RemoveTileParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(
            self.adb.remove_tile(&params.component_name).await.map(text_success),
        ))
    }

    #[tool(
        name = "list-tiles",
        description = "List tile provider components for a package, sorted. Runs `adb shell \
                       cmd package query-services --brief -a \
                       androidx.wear.tiles.action.BIND_TILE_PROVIDER` and filters to the \
                       package."
    )]
    pub async fn list_tiles(
        &self,
        Parameters(params): Parameters<ListTilesParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(render(
            self.adb.list_tiles(&params.package_name).await.map(text_success),
        ))
    }

    #[tool(
        name = "get-package-name",
        description = "Return the package name of the sample tile app."
    )]
    pub async fn get_package_name(&self) -> Result<CallToolResult, McpError> {
        Ok(text_success(self.adb.config().package_name.clone()))
    }

    #[tool(
        name = "screenshot-to-stdout",
        description = "Capture the device display as a round-masked PNG and return it \
                       inline as base64 image content. Wakes the device, runs `adb exec-out \
                       screencap -p` and applies a circular alpha mask."
    )]
    pub async fn screenshot_to_stdout(&self) -> Result<CallToolResult, McpError> {
        Ok(render(self.capture_inline().await))
    }

    #[tool(
        name = "screenshot-to-file",
        description = "Capture the device display as a round-masked PNG and return the file \
                       path, leaving the artifact on disk. Wakes the device, runs `adb \
                       exec-out screencap -p` and applies a circular alpha mask."
    )]
    pub async fn screenshot_to_file(&self) -> Result<CallToolResult, McpError> {
        Ok(render(self.capture_to_file().await))
    }
}

impl TileBridgeServer {
    async fn capture_inline(&self) -> BridgeResult<CallToolResult> {
        let path = screenshot_path(&self.adb.config().screenshot_dir);
        capture_screenshot(&self.adb, &path).await?;

        let bytes = tokio::fs::read(&path).await?;
        Ok(CallToolResult::success(vec![Content::image(
            STANDARD.encode(bytes),
            "image/png",
        )]))
    }

    async fn capture_to_file(&self) -> BridgeResult<CallToolResult> {
        let path = screenshot_path(&self.adb.config().screenshot_dir);
        capture_screenshot(&self.adb, &path).await?;
        Ok(text_success(path.display().to_string()))
    }
}

#[tool_handler]
impl ServerHandler for TileBridgeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Drives a connected Wear OS device over adb: build and install the sample \
                 tile app, manage the tile carousel, and capture round-masked screenshots."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::MockRunner;

    fn test_config(dir: &std::path::Path) -> BridgeConfig {
        BridgeConfig {
            adb_program:    "adb".to_string(),
            project_dir:    dir.to_path_buf(),
            apk_path:       dir.join("app/build/outputs/apk/debug/app-debug.apk"),
            package_name:   "com.example.wear.tiles".to_string(),
            screenshot_dir: dir.join("screenshots"),
        }
    }

    fn server(runner: Arc<MockRunner>, dir: &std::path::Path) -> TileBridgeServer {
        TileBridgeServer::new(runner, test_config(dir))
    }

    fn part_text(result: &CallToolResult, index: usize) -> String {
        result.content[index].as_text().unwrap().text.clone()
    }

    #[tokio::test]
    async fn test_command_failure_renders_three_ordered_parts() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner.push_output(Some(1), b"out text", b"err text");
        let server = server(runner, dir.path());

        let result = server.install_apk().await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content.len(), 3);
        assert!(part_text(&result, 0).starts_with("Error: "));
        assert!(part_text(&result, 1).starts_with("Command: adb install -r "));
        assert_eq!(part_text(&result, 2), "Output: out text\nerr text");
    }

    #[tokio::test]
    async fn test_non_command_failure_renders_single_part() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        // wake ok, screencap "succeeds" with garbage bytes -> image decode error
        runner.push_ok("");
        runner.push_output(Some(0), b"not a png", b"");
        let server = server(runner, dir.path());

        let result = server.screenshot_to_file().await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content.len(), 1);
        assert!(part_text(&result, 0).starts_with("Error: image processing failed"));
    }

    #[tokio::test]
    async fn test_success_is_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner.push_ok("Success\n");
        let server = server(runner, dir.path());

        let result = server.install_apk().await.unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(result.content.len(), 1);
        assert_eq!(part_text(&result, 0), "Success\n");
    }

    #[tokio::test]
    async fn test_get_package_name_is_constant() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(Arc::new(MockRunner::new()), dir.path());

        for _ in 0..3 {
            let result = server.get_package_name().await.unwrap();
            assert!(!result.is_error.unwrap_or(false));
            assert_eq!(part_text(&result, 0), "com.example.wear.tiles");
        }
    }

    #[tokio::test]
    async fn test_build_apk_success_returns_artifact_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(config.apk_path.parent().unwrap()).unwrap();
        std::fs::write(&config.apk_path, b"apk").unwrap();

        let runner = Arc::new(MockRunner::new());
        runner.push_ok("BUILD SUCCESSFUL in 10s");
        let server = TileBridgeServer::new(runner, config.clone());

        let result = server.build_apk().await.unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(part_text(&result, 0), config.apk_path.display().to_string());
    }

    #[test]
    fn test_param_schemas_use_camel_case() {
        let schema = serde_json::to_value(schemars::schema_for!(AddTileParams)).unwrap();
        assert!(schema["properties"].get("componentName").is_some());

        let schema = serde_json::to_value(schemars::schema_for!(ShowTileParams)).unwrap();
        assert!(schema["properties"].get("tileIndex").is_some());

        let schema = serde_json::to_value(schemars::schema_for!(ListTilesParams)).unwrap();
        assert!(schema["properties"].get("packageName").is_some());
    }

    #[tokio::test]
    async fn test_error_response_part_order_helper() {
        let err = BridgeError::CommandFailed {
            command: "adb shell am broadcast".to_string(),
            status:  Some(255),
            stdout:  "so".to_string(),
            stderr:  "se".to_string(),
        };

        let result = error_response(err);
        assert_eq!(result.is_error, Some(true));
        let texts: Vec<String> = (0..3).map(|i| part_text(&result, i)).collect();
        assert!(texts[0].starts_with("Error: command exited with status 255"));
        assert_eq!(texts[1], "Command: adb shell am broadcast");
        assert_eq!(texts[2], "Output: so\nse");
    }
}
