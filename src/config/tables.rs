use super::defaults;
use super::models::{AppConfig, Justification, LogLevel};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize, serde::Serialize, Default)]
pub(super) struct ConfigTables {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    layout: LayoutConfig,
    #[serde(default)]
    reader: ReaderConfig,
    #[serde(default)]
    normalizer: NormalizerConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            base_url: tables.server.base_url,
            toc_path: tables.server.toc_path,
            chapter_path: tables.server.chapter_path,
            client_version: tables.server.client_version,
            content_type: tables.server.content_type,
            request_timeout_secs: tables.server.request_timeout_secs,
            sign_secret: tables.server.sign_secret,
            public_params: tables.server.public_params,
            viewport_width: tables.layout.viewport_width,
            viewport_height: tables.layout.viewport_height,
            page_height: tables.layout.page_height,
            font_size: tables.layout.font_size,
            line_spacing: tables.layout.line_spacing,
            paragraph_spacing: tables.layout.paragraph_spacing,
            justification: tables.layout.justification,
            total_virtual_sections: tables.reader.total_virtual_sections,
            initial_batch: tables.reader.initial_batch,
            download_threads: tables.reader.download_threads,
            strip_markup: tables.normalizer.strip_markup,
            collapse_blank_lines: tables.normalizer.collapse_blank_lines,
            unicode_nfc: tables.normalizer.unicode_nfc,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            server: ServerConfig {
                base_url: config.base_url.clone(),
                toc_path: config.toc_path.clone(),
                chapter_path: config.chapter_path.clone(),
                client_version: config.client_version.clone(),
                content_type: config.content_type.clone(),
                request_timeout_secs: config.request_timeout_secs,
                sign_secret: config.sign_secret.clone(),
                public_params: config.public_params.clone(),
            },
            layout: LayoutConfig {
                viewport_width: config.viewport_width,
                viewport_height: config.viewport_height,
                page_height: config.page_height,
                font_size: config.font_size,
                line_spacing: config.line_spacing,
                paragraph_spacing: config.paragraph_spacing,
                justification: config.justification,
            },
            reader: ReaderConfig {
                total_virtual_sections: config.total_virtual_sections,
                initial_batch: config.initial_batch,
                download_threads: config.download_threads,
            },
            normalizer: NormalizerConfig {
                strip_markup: config.strip_markup,
                collapse_blank_lines: config.collapse_blank_lines,
                unicode_nfc: config.unicode_nfc,
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ServerConfig {
    #[serde(default = "defaults::default_base_url")]
    base_url: String,
    #[serde(default = "defaults::default_toc_path")]
    toc_path: String,
    #[serde(default = "defaults::default_chapter_path")]
    chapter_path: String,
    #[serde(default = "defaults::default_client_version")]
    client_version: String,
    #[serde(default = "defaults::default_content_type")]
    content_type: String,
    #[serde(default = "defaults::default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sign_secret: Option<String>,
    // Tables must come after plain values when serialized.
    #[serde(default = "defaults::default_public_params")]
    public_params: BTreeMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            base_url: defaults::default_base_url(),
            toc_path: defaults::default_toc_path(),
            chapter_path: defaults::default_chapter_path(),
            client_version: defaults::default_client_version(),
            content_type: defaults::default_content_type(),
            request_timeout_secs: defaults::default_request_timeout_secs(),
            sign_secret: None,
            public_params: defaults::default_public_params(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LayoutConfig {
    #[serde(default = "defaults::default_viewport_width")]
    viewport_width: f32,
    #[serde(default = "defaults::default_viewport_height")]
    viewport_height: f32,
    #[serde(default = "defaults::default_page_height")]
    page_height: f32,
    #[serde(default = "defaults::default_font_size")]
    font_size: f32,
    #[serde(default = "defaults::default_line_spacing")]
    line_spacing: f32,
    #[serde(default = "defaults::default_paragraph_spacing")]
    paragraph_spacing: f32,
    #[serde(default)]
    justification: Justification,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            viewport_width: defaults::default_viewport_width(),
            viewport_height: defaults::default_viewport_height(),
            page_height: defaults::default_page_height(),
            font_size: defaults::default_font_size(),
            line_spacing: defaults::default_line_spacing(),
            paragraph_spacing: defaults::default_paragraph_spacing(),
            justification: Justification::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ReaderConfig {
    #[serde(default = "defaults::default_total_virtual_sections")]
    total_virtual_sections: usize,
    #[serde(default = "defaults::default_initial_batch")]
    initial_batch: usize,
    #[serde(default = "defaults::default_download_threads")]
    download_threads: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            total_virtual_sections: defaults::default_total_virtual_sections(),
            initial_batch: defaults::default_initial_batch(),
            download_threads: defaults::default_download_threads(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct NormalizerConfig {
    #[serde(default = "defaults::default_strip_markup")]
    strip_markup: bool,
    #[serde(default = "defaults::default_collapse_blank_lines")]
    collapse_blank_lines: bool,
    #[serde(default = "defaults::default_unicode_nfc")]
    unicode_nfc: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            strip_markup: defaults::default_strip_markup(),
            collapse_blank_lines: defaults::default_collapse_blank_lines(),
            unicode_nfc: defaults::default_unicode_nfc(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
