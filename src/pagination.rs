//! Pagination utilities.
//!
//! A page is the longest run of text, starting where the previous page ended,
//! that the layout engine reports as fully visible inside the viewport.
//! Pages are byte ranges over the source text, so concatenating them in order
//! always reproduces the input.

use crate::config::{AppConfig, Justification};
use std::ops::Range;
use tracing::{debug, warn};
use unicode_width::UnicodeWidthChar;

/// Size of the text area, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        let clean = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            width: clean(width),
            height: clean(height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub line_spacing: f32,
    pub paragraph_spacing: f32,
    pub justification: Justification,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 15.0,
            line_spacing: 10.0,
            paragraph_spacing: 15.0,
            justification: Justification::Justified,
        }
    }
}

/// One viewport-sized slice of a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based position among the chapter's pages.
    pub number: usize,
    /// Byte range into the chapter text.
    pub range: Range<usize>,
    pub text: String,
}

/// A text engine that knows how much of a string fits in a viewport.
pub trait TextLayout {
    /// Byte length of the longest prefix of `text` that is fully visible when
    /// laid out from the top of `viewport`. Must land on a char boundary.
    fn fit(&self, text: &str, viewport: Viewport, style: &TextStyle) -> usize;
}

/// Character-grid layout: every glyph advances by its terminal cell width
/// times half the font size, so CJK ideographs take a full em and ASCII half.
/// Lines may break between any two characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellLayout;

impl CellLayout {
    fn advance(ch: char, style: &TextStyle) -> f32 {
        let cells = if ch == '\t' { 4 } else { ch.width().unwrap_or(0) };
        cells as f32 * style.font_size / 2.0
    }
}

impl TextLayout for CellLayout {
    fn fit(&self, text: &str, viewport: Viewport, style: &TextStyle) -> usize {
        let line_height = style.font_size.max(0.0);
        // Bottom edge of the line currently being filled.
        let mut line_bottom = line_height;
        if line_bottom > viewport.height {
            return 0;
        }
        let mut x = 0.0f32;
        let mut line_has_glyphs = false;

        for (idx, ch) in text.char_indices() {
            if ch == '\n' {
                line_bottom += style.line_spacing + style.paragraph_spacing + line_height;
                x = 0.0;
                line_has_glyphs = false;
                if line_bottom > viewport.height {
                    // The break itself still belongs to this page.
                    return idx + ch.len_utf8();
                }
                continue;
            }

            let advance = Self::advance(ch, style);
            if line_has_glyphs && x + advance > viewport.width {
                line_bottom += style.line_spacing + line_height;
                x = 0.0;
                if line_bottom > viewport.height {
                    return idx;
                }
            }
            x += advance;
            line_has_glyphs = true;
        }

        text.len()
    }
}

/// Split `text` into pages that each fit `viewport` under `style`.
///
/// Empty text yields no pages. If the engine reports that not even one
/// character fits, a single character is forced onto the page so the loop
/// always terminates.
pub fn paginate(
    text: &str,
    viewport: Viewport,
    style: &TextStyle,
    layout: &dyn TextLayout,
) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut start = 0usize;
    let mut forced = 0usize;

    while start < text.len() {
        let rest = &text[start..];
        let fitted = layout.fit(rest, viewport, style).min(rest.len());
        let len = if fitted == 0 || !rest.is_char_boundary(fitted) {
            forced += 1;
            rest.chars().next().map(char::len_utf8).unwrap_or(rest.len())
        } else {
            fitted
        };
        let end = start + len;
        pages.push(Page {
            number: pages.len() + 1,
            range: start..end,
            text: text[start..end].to_string(),
        });
        start = end;
    }

    if forced > 0 {
        warn!(
            forced,
            width = viewport.width,
            height = viewport.height,
            "Viewport too small for a single line; forced one character per page"
        );
    }
    debug!(
        chars = text.chars().count(),
        pages = pages.len(),
        "Paginated text"
    );
    pages
}

/// Layout engine plus the viewport and style it paginates for.
pub struct Paginator {
    layout: Box<dyn TextLayout + Send>,
    viewport: Viewport,
    style: TextStyle,
}

impl Paginator {
    pub fn new(layout: Box<dyn TextLayout + Send>, viewport: Viewport, style: TextStyle) -> Self {
        Self {
            layout,
            viewport,
            style,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Box::new(CellLayout),
            Viewport::new(config.viewport_width, config.viewport_height),
            TextStyle {
                font_size: config.font_size,
                line_spacing: config.line_spacing,
                paragraph_spacing: config.paragraph_spacing,
                justification: config.justification,
            },
        )
    }

    pub fn paginate(&self, text: &str) -> Vec<Page> {
        paginate(text, self.viewport, &self.style, self.layout.as_ref())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Returns true if anything changed and existing pages are stale.
    pub fn reconfigure(&mut self, viewport: Viewport, style: TextStyle) -> bool {
        let changed = viewport != self.viewport || style != self.style;
        self.viewport = viewport;
        self.style = style;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> TextStyle {
        TextStyle {
            font_size: 10.0,
            line_spacing: 2.0,
            paragraph_spacing: 4.0,
            justification: Justification::Justified,
        }
    }

    fn joined(pages: &[Page]) -> String {
        pages.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn empty_text_has_no_pages() {
        let pages = paginate("", Viewport::new(100.0, 100.0), &style(), &CellLayout);
        assert!(pages.is_empty());
    }

    #[test]
    fn text_that_fits_is_a_single_page() {
        let text = "hello world";
        let pages = paginate(text, Viewport::new(1000.0, 1000.0), &style(), &CellLayout);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, text);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[0].range, 0..text.len());
    }

    #[test]
    fn long_cjk_text_round_trips() {
        let text = "九月，咱们能疯狂一次么！\n".repeat(80);
        // 10 ideographs per line, 5 lines per page.
        let viewport = Viewport::new(100.0, 58.0);
        let pages = paginate(&text, viewport, &style(), &CellLayout);

        assert!(pages.len() > 1);
        assert_eq!(joined(&pages), text);
        for (idx, page) in pages.iter().enumerate() {
            assert_eq!(page.number, idx + 1);
            assert!(!page.text.is_empty());
        }
        for pair in pages.windows(2) {
            assert_eq!(pair[0].range.end, pair[1].range.start);
        }
    }

    #[test]
    fn wrapping_fills_lines_before_breaking_pages() {
        // 20 ASCII chars per 100pt line, 2 lines per page.
        let viewport = Viewport::new(100.0, 22.0);
        let text = "a".repeat(100);
        let pages = paginate(&text, viewport, &style(), &CellLayout);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].text.len(), 40);
        assert_eq!(pages[2].text.len(), 20);
    }

    #[test]
    fn pagination_is_deterministic() {
        let text = "第一章 风起\n少年站在山巅，望着远方的云海。\n".repeat(30);
        let viewport = Viewport::new(120.0, 80.0);
        let first = paginate(&text, viewport, &style(), &CellLayout);
        let second = paginate(&text, viewport, &style(), &CellLayout);
        assert_eq!(first, second);
    }

    #[test]
    fn degenerate_viewport_still_terminates() {
        let text = "abc";
        let pages = paginate(text, Viewport::new(0.0, 0.0), &style(), &CellLayout);
        assert_eq!(pages.len(), 3);
        assert_eq!(joined(&pages), text);
    }

    #[test]
    fn smaller_viewport_never_means_fewer_pages() {
        let text = "文字".repeat(500);
        let big = paginate(&text, Viewport::new(200.0, 300.0), &style(), &CellLayout);
        let small = paginate(&text, Viewport::new(100.0, 150.0), &style(), &CellLayout);
        assert!(small.len() > big.len());
    }

    #[test]
    fn reconfigure_reports_changes() {
        let mut paginator = Paginator::new(Box::new(CellLayout), Viewport::new(10.0, 10.0), style());
        assert!(!paginator.reconfigure(Viewport::new(10.0, 10.0), style()));
        assert!(paginator.reconfigure(Viewport::new(20.0, 10.0), style()));
        assert_eq!(paginator.viewport().width, 20.0);
    }
}
