use serde::Deserialize;
use std::collections::BTreeMap;

use crate::config::defaults;

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "defaults::default_base_url")]
    pub base_url: String,
    #[serde(default = "defaults::default_toc_path")]
    pub toc_path: String,
    #[serde(default = "defaults::default_chapter_path")]
    pub chapter_path: String,
    #[serde(default = "defaults::default_client_version")]
    pub client_version: String,
    #[serde(default = "defaults::default_content_type")]
    pub content_type: String,
    #[serde(default = "defaults::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub sign_secret: Option<String>,
    #[serde(default = "defaults::default_public_params")]
    pub public_params: BTreeMap<String, String>,
    #[serde(default = "defaults::default_viewport_width")]
    pub viewport_width: f32,
    #[serde(default = "defaults::default_viewport_height")]
    pub viewport_height: f32,
    #[serde(default = "defaults::default_page_height")]
    pub page_height: f32,
    #[serde(default = "defaults::default_font_size")]
    pub font_size: f32,
    #[serde(default = "defaults::default_line_spacing")]
    pub line_spacing: f32,
    #[serde(default = "defaults::default_paragraph_spacing")]
    pub paragraph_spacing: f32,
    #[serde(default)]
    pub justification: Justification,
    #[serde(default = "defaults::default_total_virtual_sections")]
    pub total_virtual_sections: usize,
    #[serde(default = "defaults::default_initial_batch")]
    pub initial_batch: usize,
    #[serde(default = "defaults::default_download_threads")]
    pub download_threads: usize,
    #[serde(default = "defaults::default_strip_markup")]
    pub strip_markup: bool,
    #[serde(default = "defaults::default_collapse_blank_lines")]
    pub collapse_blank_lines: bool,
    #[serde(default = "defaults::default_unicode_nfc")]
    pub unicode_nfc: bool,
    #[serde(default = "defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            base_url: defaults::default_base_url(),
            toc_path: defaults::default_toc_path(),
            chapter_path: defaults::default_chapter_path(),
            client_version: defaults::default_client_version(),
            content_type: defaults::default_content_type(),
            request_timeout_secs: defaults::default_request_timeout_secs(),
            sign_secret: None,
            public_params: defaults::default_public_params(),
            viewport_width: defaults::default_viewport_width(),
            viewport_height: defaults::default_viewport_height(),
            page_height: defaults::default_page_height(),
            font_size: defaults::default_font_size(),
            line_spacing: defaults::default_line_spacing(),
            paragraph_spacing: defaults::default_paragraph_spacing(),
            justification: Justification::default(),
            total_virtual_sections: defaults::default_total_virtual_sections(),
            initial_batch: defaults::default_initial_batch(),
            download_threads: defaults::default_download_threads(),
            strip_markup: defaults::default_strip_markup(),
            collapse_blank_lines: defaults::default_collapse_blank_lines(),
            unicode_nfc: defaults::default_unicode_nfc(),
            log_level: defaults::default_log_level(),
        }
    }
}

/// Paragraph alignment used when laying out chapter text.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Justification {
    Left,
    Center,
    Right,
    #[default]
    Justified,
}

impl std::fmt::Display for Justification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Justification::Left => "Left",
            Justification::Center => "Center",
            Justification::Right => "Right",
            Justification::Justified => "Justified",
        };
        write!(f, "{}", label)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
