use std::collections::BTreeMap;

pub(crate) fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

pub(crate) fn default_toc_path() -> String {
    "/book/chapterList".to_string()
}

pub(crate) fn default_chapter_path() -> String {
    "/book/chapterDownload".to_string()
}

pub(crate) fn default_client_version() -> String {
    "4.6.1".to_string()
}

pub(crate) fn default_content_type() -> String {
    "0".to_string()
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    15
}

pub(crate) fn default_public_params() -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("channelType".to_string(), "AppStore".to_string());
    params.insert("channelId".to_string(), "0".to_string());
    params.insert("os".to_string(), "ios".to_string());
    params.insert("clientVersion".to_string(), "4.0.0".to_string());
    params.insert("appId".to_string(), "ZHKXS".to_string());
    params
}

// 375x667 screen minus the reader's 20pt side insets and 40pt top/bottom bars.
pub(crate) fn default_viewport_width() -> f32 {
    335.0
}

pub(crate) fn default_viewport_height() -> f32 {
    587.0
}

// Height of one list item; a page scrolls by exactly this much.
pub(crate) fn default_page_height() -> f32 {
    667.0
}

pub(crate) fn default_font_size() -> f32 {
    15.0
}

pub(crate) fn default_line_spacing() -> f32 {
    10.0
}

pub(crate) fn default_paragraph_spacing() -> f32 {
    15.0
}

pub(crate) fn default_total_virtual_sections() -> usize {
    21
}

pub(crate) fn default_initial_batch() -> usize {
    3
}

pub(crate) fn default_download_threads() -> usize {
    4
}

pub(crate) fn default_strip_markup() -> bool {
    true
}

pub(crate) fn default_collapse_blank_lines() -> bool {
    true
}

pub(crate) fn default_unicode_nfc() -> bool {
    true
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}
