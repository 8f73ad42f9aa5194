// SPDX-FileCopyrightText: 2026 Ragline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./ragline.toml` > `~/.config/ragline/ragline.toml` >
//! `/etc/ragline/ragline.toml`, with `RAGLINE_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RaglineConfig;

/// Local config file name.
pub const LOCAL_CONFIG: &str = "ragline.toml";

/// System-wide config file path.
pub const SYSTEM_CONFIG: &str = "/etc/ragline/ragline.toml";

/// Sections recognised in `RAGLINE_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "agent",
    "openai",
    "documents",
    "retrieval",
    "session",
    "gateway",
];

/// Path of the per-user config file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ragline").join(LOCAL_CONFIG))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ragline/ragline.toml`
/// 3. `~/.config/ragline/ragline.toml`
/// 4. `./ragline.toml`
/// 5. `RAGLINE_*` environment variables
pub fn load_config() -> Result<RaglineConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no environment).
pub fn load_config_from_str(toml_content: &str) -> Result<RaglineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RaglineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RaglineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RaglineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RaglineConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider mapping `RAGLINE_OPENAI_API_KEY` to `openai.api_key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that themselves contain underscores stay intact.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("RAGLINE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section)
            && let Some(field) = rest.strip_prefix('_')
        {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}
