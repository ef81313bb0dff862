//! Cleanup applied to downloaded chapter bodies before pagination.
//!
//! The content endpoint returns lightly marked-up text (`<p>…</p>`, `<br/>`).
//! Markup is reduced to plain text, line endings are unified and runs of
//! blank lines collapse to single paragraph breaks.

use crate::config::AppConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;
use unicode_normalization::UnicodeNormalization;

static RE_MARKUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(?:p|br|div|span|b|i|em|strong|font)\b[^>]*>").unwrap());
static RE_CARRIAGE_RETURN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n?").unwrap());
static RE_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n(?:[ \t\u{00A0}]*\n)+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentNormalizer {
    strip_markup: bool,
    collapse_blank_lines: bool,
    unicode_nfc: bool,
}

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self {
            strip_markup: true,
            collapse_blank_lines: true,
            unicode_nfc: true,
        }
    }
}

impl ContentNormalizer {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            strip_markup: config.strip_markup,
            collapse_blank_lines: config.collapse_blank_lines,
            unicode_nfc: config.unicode_nfc,
        }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let mut text = if self.strip_markup && RE_MARKUP_TAG.is_match(raw) {
            strip_markup(raw)
        } else {
            raw.to_string()
        };

        if self.collapse_blank_lines {
            text = RE_CARRIAGE_RETURN.replace_all(&text, "\n").into_owned();
            text = RE_BLANK_LINES.replace_all(&text, "\n").into_owned();
            text = text.trim_matches('\n').to_string();
        }

        if self.unicode_nfc {
            text = text.nfc().collect();
        }
        text
    }
}

fn strip_markup(raw: &str) -> String {
    // A very wide line keeps html2text from baking in hard wraps.
    match html2text::from_read(raw.as_bytes(), 10_000) {
        Ok(clean) => clean,
        Err(err) => {
            warn!("html2text failed, falling back to tag removal: {err}");
            RE_MARKUP_TAG.replace_all(raw, "\n").into_owned()
        }
    }
}
