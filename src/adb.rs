//! Device operations over adb
//!
//! One method per external operation class the tools expose. Every command is
//! an explicit argument vector; tool inputs (component names, package names,
//! tile indices) are passed as discrete arguments and never reach a shell.
//!
//! Tile carousel manipulation uses the wearable debug broadcast surface:
//! re-adding an existing component reinserts it at its slot, and a full
//! carousel evicts the oldest entry. Both behaviors live on the watch; the
//! bridge only dispatches the broadcast and reports its raw output.

use tracing::debug;

use crate::{
    error::BridgeResult,
    exec::{CommandLine, Exec},
    model::BridgeConfig,
};

/// Broadcast action handled by the wearable debug surface (add/remove)
const DEBUG_SURFACE_ACTION: &str = "com.google.android.wearable.app.DEBUG_SURFACE";

/// Broadcast action handled by the system UI (show-tile)
const DEBUG_SYSUI_ACTION: &str = "com.google.android.wearable.app.DEBUG_SYSUI";

/// Intent action implemented by every tile provider service
const TILE_PROVIDER_ACTION: &str = "androidx.wear.tiles.action.BIND_TILE_PROVIDER";

/// adb-backed device client
///
/// Cheap to share behind an `Arc`; holds no per-call state. Concurrent calls
/// spawn concurrent adb processes with no ordering discipline, matching the
/// device's own broadcast-handling semantics.
pub struct AdbClient {
    exec:   Exec,
    config: BridgeConfig,
}

impl AdbClient {
    /// Creates a client over the given executor and configuration
    pub fn new(exec: Exec, config: BridgeConfig) -> Self {
        Self { exec, config }
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn adb(&self) -> CommandLine {
        CommandLine::new(&self.config.adb_program)
    }

    /// Builds the debug APK and returns its absolute path
    ///
    /// Runs `./gradlew assembleDebug` in the project directory and validates
    /// that the expected APK exists afterwards; a zero-exit build that leaves
    /// no APK is still a failure.
    pub async fn build_apk(&self) -> BridgeResult<String> {
        let cmd = CommandLine::new("./gradlew")
            .arg("assembleDebug")
            .current_dir(&self.config.project_dir);
        self.exec.run_validating(&cmd, &self.config.apk_path).await?;

        let path = self.config.apk_path.display().to_string();
        debug!(apk = %path, "debug build complete");
        Ok(path)
    }

    /// Installs the most recent debug build onto the attached device
    ///
    /// `adb install -r <apk>`; returns the raw install-tool output.
    pub async fn install_apk(&self) -> BridgeResult<String> {
        let cmd = self
            .adb()
            .arg("install")
            .arg("-r")
            .arg(self.config.apk_path.display().to_string());
        self.exec.run(&cmd).await
    }

    /// Adds a tile for the named component to the carousel
    ///
    /// `adb shell am broadcast -a ...DEBUG_SURFACE --es operation add-tile
    /// --ecn component <name>`; returns the raw broadcast output.
    pub async fn add_tile(&self, component_name: &str) -> BridgeResult<String> {
        let cmd = self
            .adb()
            .args(["shell", "am", "broadcast", "-a", DEBUG_SURFACE_ACTION])
            .args(["--es", "operation", "add-tile"])
            .args(["--ecn", "component"])
            .arg(component_name);
        self.exec.run(&cmd).await
    }

    /// Removes every carousel entry for the named component
    pub async fn remove_tile(&self, component_name: &str) -> BridgeResult<String> {
        let cmd = self
            .adb()
            .args(["shell", "am", "broadcast", "-a", DEBUG_SURFACE_ACTION])
            .args(["--es", "operation", "remove-tile"])
            .args(["--ecn", "component"])
            .arg(component_name);
        self.exec.run(&cmd).await
    }

    /// Brings the tile at the given carousel slot to the foreground
    pub async fn show_tile(&self, tile_index: u32) -> BridgeResult<String> {
        let cmd = self
            .adb()
            .args(["shell", "am", "broadcast", "-a", DEBUG_SYSUI_ACTION])
            .args(["--es", "operation", "show-tile"])
            .args(["--ei", "index"])
            .arg(tile_index.to_string());
        self.exec.run(&cmd).await
    }

    /// Enumerates tile-provider components for a package, sorted
    ///
    /// Queries services handling the tile bind action and keeps the lines
    /// belonging to `package_name`, trimmed, lexicographically sorted and
    /// newline-joined.
    pub async fn list_tiles(&self, package_name: &str) -> BridgeResult<String> {
        let cmd = self
            .adb()
            .args(["shell", "cmd", "package", "query-services"])
            .args(["--brief", "-a", TILE_PROVIDER_ACTION]);
        let output = self.exec.run(&cmd).await?;

        let prefix = format!("{}/", package_name);
        let mut components: Vec<&str> = output
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with(&prefix))
            .collect();
        components.sort_unstable();

        Ok(components.join("\n"))
    }

    /// Wakes the device display
    pub async fn wake(&self) -> BridgeResult<String> {
        let cmd = self.adb().args(["shell", "input", "keyevent", "KEYCODE_WAKEUP"]);
        self.exec.run(&cmd).await
    }

    /// The command line used to capture the framebuffer as PNG
    ///
    /// Exposed so capture failures downstream of the command (missing output
    /// file) can still name the command in their diagnostics.
    pub fn screencap_command(&self) -> CommandLine {
        self.adb().args(["exec-out", "screencap", "-p"])
    }

    /// Captures the framebuffer, returning raw PNG bytes
    pub async fn screencap_png(&self) -> BridgeResult<Vec<u8>> {
        self.exec.run_raw(&self.screencap_command()).await
    }
}
