// SPDX-License-Identifier: MPL-2.0
//! Config directory resolution.
//!
//! An explicit directory (CLI `--config-dir`) wins, then a non-empty
//! `VIEWER_CORE_CONFIG_DIR`, then `ViewerCore/` under the platform config
//! directory from the `dirs` crate.

use std::path::PathBuf;

/// Directory name under the platform config directory.
pub const APP_NAME: &str = "ViewerCore";

/// Environment variable naming the config directory.
pub const ENV_CONFIG_DIR: &str = "VIEWER_CORE_CONFIG_DIR";

/// Directory holding `settings.toml`, or `None` when no candidate exists.
#[must_use]
pub fn config_dir(explicit: Option<PathBuf>) -> Option<PathBuf> {
    choose_config_dir(
        explicit,
        std::env::var_os(ENV_CONFIG_DIR).map(PathBuf::from),
        dirs::config_dir(),
    )
}

fn choose_config_dir(
    explicit: Option<PathBuf>,
    from_env: Option<PathBuf>,
    platform: Option<PathBuf>,
) -> Option<PathBuf> {
    explicit
        .or_else(|| from_env.filter(|path| !path.as_os_str().is_empty()))
        .or_else(|| platform.map(|path| path.join(APP_NAME)))
}
