//! Bridge configuration
//!
//! Fixed identity of the driven sample app (project location, derived APK
//! path, package name) plus where screenshots land. Values are configuration,
//! not dynamic state: resolved once at startup, with environment overrides
//! for non-default setups.

use std::path::PathBuf;

/// Package name of the sample tile app
pub const DEFAULT_PACKAGE_NAME: &str = "com.example.wear.tiles";

/// Default project location, relative to the home directory
const DEFAULT_PROJECT_DIR: &str = "wear-os-samples/WearTilesKotlin";

/// Debug APK output, relative to the project directory
const APK_RELATIVE_PATH: &str = "app/build/outputs/apk/debug/app-debug.apk";

const ADB_ENV: &str = "WEAR_BRIDGE_ADB";
const PROJECT_DIR_ENV: &str = "WEAR_BRIDGE_PROJECT_DIR";
const PACKAGE_ENV: &str = "WEAR_BRIDGE_PACKAGE";

/// Resolved configuration for one server process
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// adb program to invoke (name or absolute path)
    pub adb_program:    String,
    /// Root of the sample app's gradle project
    pub project_dir:    PathBuf,
    /// Expected debug APK, derived from `project_dir`
    pub apk_path:       PathBuf,
    /// Package name reported by `get-package-name` and used for queries
    pub package_name:   String,
    /// Directory screenshots are written to (never cleaned up by the bridge)
    pub screenshot_dir: PathBuf,
}

impl BridgeConfig {
    /// Builds the configuration from defaults and environment overrides
    pub fn from_env() -> Self {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let project_dir = std::env::var_os(PROJECT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(DEFAULT_PROJECT_DIR));

        Self {
            adb_program:    std::env::var(ADB_ENV).unwrap_or_else(|_| "adb".to_string()),
            apk_path:       project_dir.join(APK_RELATIVE_PATH),
            project_dir,
            package_name:   std::env::var(PACKAGE_ENV)
                .unwrap_or_else(|_| DEFAULT_PACKAGE_NAME.to_string()),
            screenshot_dir: std::env::temp_dir().join("wear-tile-mcp"),
        }
    }
}
