//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use media_transfer::transfer::{EngineConfig, MAX_UPLOAD_CHUNK_SIZE};

/// File configuration for CLI defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Default backend API base URL.
    pub backend_url: Option<String>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Wait for the transport to acknowledge a cancel, in milliseconds.
    pub abort_grace_ms: Option<u64>,
    /// Upload slice size in KiB.
    pub upload_chunk_kib: Option<u64>,
    /// Multipart field name for uploads.
    pub upload_field: Option<String>,
}

impl FileConfig {
    /// Validates config values against engine constraints.
    pub fn validate(&self) -> Result<()> {
        validate_range("connect_timeout_secs", self.connect_timeout_secs, 1, 3600)?;
        validate_range("abort_grace_ms", self.abort_grace_ms, 0, 60_000)?;
        let max_kib = (MAX_UPLOAD_CHUNK_SIZE / 1024) as u64;
        validate_range("upload_chunk_kib", self.upload_chunk_kib, 1, max_kib)?;
        if let Some(field) = &self.upload_field
            && field.trim().is_empty()
        {
            bail!("Invalid config value for `upload_field`: must not be empty");
        }
        Ok(())
    }

    /// Applies file values over engine defaults.
    pub fn apply_to(&self, config: &mut EngineConfig) {
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.abort_grace_ms {
            config.abort_grace = Duration::from_millis(ms);
        }
        if let Some(kib) = self.upload_chunk_kib {
            config.upload_chunk_size = usize::try_from(kib.saturating_mul(1024))
                .unwrap_or(MAX_UPLOAD_CHUNK_SIZE);
        }
        if let Some(field) = &self.upload_field {
            config.upload_field_name.clone_from(field);
        }
    }
}

fn validate_range(field: &str, value: Option<u64>, min: u64, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/media-transfer/config.toml`
/// 2. `$HOME/.config/media-transfer/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("media-transfer")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("media-transfer")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {}", line_index + 1);

        match key {
            "backend_url" => {
                cfg.backend_url = Some(parse_string_literal(value).with_context(context)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "abort_grace_ms" => {
                cfg.abort_grace_ms = Some(parse_integer_u64(value).with_context(context)?);
            }
            "upload_chunk_kib" => {
                cfg.upload_chunk_kib = Some(parse_integer_u64(value).with_context(context)?);
            }
            "upload_field" => {
                cfg.upload_field = Some(parse_string_literal(value).with_context(context)?);
            }
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
