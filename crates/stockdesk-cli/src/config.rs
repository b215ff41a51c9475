// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stockdesk_app::DEFAULT_PAGE_SIZE;
use stockdesk_compat::DEFAULT_HOST_MARKERS;

pub const APP_NAME: &str = "stockdesk";
pub const CONFIG_PATH_ENV: &str = "STOCKDESK_CONFIG_PATH";
pub const SESSION_ENV: &str = "STOCKDESK_SESSION";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_FILE_NAME: &str = "stockdesk.log";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub compat: Compat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: Server::default(),
            ui: Ui::default(),
            log: Log::default(),
            compat: Compat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    /// `Cookie` header value, e.g. `sessionid=...; csrftoken=...`.
    pub session_cookie: Option<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
            session_cookie: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub page_size: Option<i64>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            page_size: Some(i64::from(DEFAULT_PAGE_SIZE)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Compat {
    pub host_markers: Option<Vec<String>>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` and put values under \
                     [server], [ui], [log] and [compat]",
                    path.display()
                )
            })?;
        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.server.base_url {
            let trimmed = base_url.trim();
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                bail!(
                    "server.base_url in {} must be an http(s) URL, got {base_url:?}",
                    path.display()
                );
            }
        }

        if let Some(timeout) = &self.server.timeout {
            let parsed = parse_duration(timeout)
                .with_context(|| format!("server.timeout in {}", path.display()))?;
            if parsed <= Duration::ZERO {
                bail!(
                    "server.timeout in {} must be positive, got {timeout}",
                    path.display()
                );
            }
        }

        if let Some(page_size) = self.ui.page_size
            && !(1..=i64::from(u32::MAX)).contains(&page_size)
        {
            bail!(
                "ui.page_size in {} must be positive, got {page_size}",
                path.display()
            );
        }

        if let Some(level) = &self.log.level
            && level.trim().is_empty()
        {
            bail!("log.level in {} must not be empty", path.display());
        }

        if let Some(markers) = &self.compat.host_markers
            && markers.iter().all(|marker| marker.trim().is_empty())
        {
            bail!(
                "compat.host_markers in {} must name at least one marker",
                path.display()
            );
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.server
            .base_url
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.server.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    /// The configured cookie wins over `STOCKDESK_SESSION`.
    pub fn session_cookie(&self) -> Option<String> {
        self.server
            .session_cookie
            .clone()
            .or_else(|| env::var(SESSION_ENV).ok())
            .filter(|cookie| !cookie.trim().is_empty())
    }

    pub fn page_size(&self) -> u32 {
        self.ui
            .page_size
            .and_then(|size| u32::try_from(size).ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let data_root = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("cannot resolve data directory; set [log].file"))?;
        Ok(data_root.join(APP_NAME).join(LOG_FILE_NAME))
    }

    pub fn host_markers(&self) -> Vec<String> {
        match &self.compat.host_markers {
            Some(markers) => markers.clone(),
            None => DEFAULT_HOST_MARKERS
                .iter()
                .map(|marker| (*marker).to_owned())
                .collect(),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# stockdesk config\n# Place this file at: {}\n\nversion = 1\n\n[server]\n\
             base_url = \"{DEFAULT_BASE_URL}\"\ntimeout = \"{DEFAULT_TIMEOUT}\"\n\
             # Copy the Cookie header of a logged-in browser session, or set {SESSION_ENV}.\n\
             # session_cookie = \"sessionid=...; csrftoken=...\"\n\n[ui]\npage_size = {}\n\n\
             [log]\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n\
             # file = \"/absolute/path/to/{LOG_FILE_NAME}\"\n\n\
             [compat]\nhost_markers = [{}]\n",
            path.display(),
            DEFAULT_PAGE_SIZE,
            DEFAULT_HOST_MARKERS
                .iter()
                .map(|marker| format!("\"{marker}\""))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.find(|ch: char| !ch.is_ascii_digit()) {
        Some(split) => raw.split_at(split),
        None => (raw, ""),
    };
    let amount: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration {raw:?}"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount * 60)),
        _ => bail!("invalid duration {raw:?}; use <N>ms, <N>s or <N>m (for example 500ms or 5s)"),
    }
}
