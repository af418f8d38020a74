use crate::autocomplete::SuggestionMode;
use page::{PageSkeleton, PlotTypeField};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_HIDE_DELAY_MS: u64 = 200;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{path}': {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub page: String,
    pub fetch_observations: String,
    pub plot_data: String,
    pub plot_gti: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            page: "/plots/interactive_plot/".to_string(),
            fetch_observations: "/plots/fetch_observations".to_string(),
            plot_data: "/plots/plot_data".to_string(),
            plot_gti: "/plots/plot_gti".to_string(),
        }
    }
}

/// Bounds of the minimum-counts slider on every GTI form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinCounts {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl Default for MinCounts {
    fn default() -> Self {
        Self {
            min: 1,
            max: 200,
            default: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotTypeSetting {
    pub label: String,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub base_url: String,
    pub endpoints: Endpoints,
    pub page_title: String,
    pub suggestion_mode: SuggestionMode,
    /// Query parameter for suggestion lookups; the mode decides when unset.
    pub suggestion_param: Option<String>,
    /// Maximum suggestions shown, 0 for no limit.
    pub suggestion_limit: usize,
    pub dropdown_hide_delay_ms: u64,
    pub request_timeout_ms: u64,
    pub min_counts: MinCounts,
    pub prevalidate_gti: bool,
    pub quality_levels: Vec<String>,
    pub plot_types: Vec<PlotTypeSetting>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoints: Endpoints::default(),
            page_title: "NICER Interactive Plots".to_string(),
            suggestion_mode: SuggestionMode::Replace,
            suggestion_param: None,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            dropdown_hide_delay_ms: DEFAULT_HIDE_DELAY_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            min_counts: MinCounts::default(),
            prevalidate_gti: false,
            quality_levels: vec!["Good".to_string(), "Bad".to_string()],
            plot_types: vec![
                PlotTypeSetting {
                    label: "Energy Spectrum".to_string(),
                    name: "spectrum".to_string(),
                    value: ".jsgrp".to_string(),
                },
                PlotTypeSetting {
                    label: "Light Curve".to_string(),
                    name: "light_curve".to_string(),
                    value: ".lc.gz".to_string(),
                },
            ],
        }
    }
}

impl ClientSettings {
    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.dropdown_hide_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn suggestion_param(&self) -> &str {
        self.suggestion_param
            .as_deref()
            .unwrap_or_else(|| self.suggestion_mode.default_param())
    }

    pub fn skeleton(&self, csrf_token: &str) -> PageSkeleton {
        PageSkeleton {
            title: self.page_title.clone(),
            csrf_token: csrf_token.to_string(),
            quality_levels: self.quality_levels.clone(),
            plot_types: self
                .plot_types
                .iter()
                .map(|p| PlotTypeField {
                    label: p.label.clone(),
                    name: p.name.clone(),
                    value: p.value.clone(),
                })
                .collect(),
        }
    }
}

pub fn normalize_settings(mut settings: ClientSettings) -> Result<ClientSettings, SettingsError> {
    let base_url = settings.base_url.trim().trim_end_matches('/').to_string();
    if base_url.is_empty() {
        return Err(SettingsError::Invalid("base_url must not be empty".to_string()));
    }
    settings.base_url = base_url;

    let endpoints = [
        ("page", &settings.endpoints.page),
        ("fetch_observations", &settings.endpoints.fetch_observations),
        ("plot_data", &settings.endpoints.plot_data),
        ("plot_gti", &settings.endpoints.plot_gti),
    ];
    if let Some((name, _)) = endpoints.iter().find(|(_, path)| path.trim().is_empty()) {
        return Err(SettingsError::Invalid(format!(
            "endpoint '{name}' must not be empty"
        )));
    }

    let counts = settings.min_counts;
    if counts.min < 1 || counts.min > counts.max {
        return Err(SettingsError::Invalid(format!(
            "min_counts bounds must satisfy 1 <= min <= max (got {}..{})",
            counts.min, counts.max
        )));
    }
    settings.min_counts.default = counts.default.clamp(counts.min, counts.max);

    if let Some(param) = &settings.suggestion_param {
        if param.trim().is_empty() {
            settings.suggestion_param = None;
        }
    }
    Ok(settings)
}

pub fn load_settings_file(path: &Path) -> Result<ClientSettings, SettingsError> {
    let data = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: ClientSettings = toml::from_str(&data).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    normalize_settings(settings)
}
