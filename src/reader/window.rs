//! Virtual infinite scroll over a long chapter list.
//!
//! Only `total_virtual_sections` chapters are materialized as list sections
//! at a time, starting at `chapter_offset`. When a section at either boundary
//! is about to become visible the window re-centers on that chapter and the
//! scroll position is recomputed so the same page stays on screen.

use tracing::{debug, warn};

/// Smallest window that still moves forward when re-centering: the
/// re-centered chapter must land strictly inside both boundaries.
pub const MIN_VIRTUAL_SECTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderWindowState {
    pub chapter_offset: usize,
    pub total_virtual_sections: usize,
    pub min_boundary: usize,
    pub max_boundary: usize,
}

impl Default for ReaderWindowState {
    fn default() -> Self {
        Self::new(21)
    }
}

impl ReaderWindowState {
    pub fn new(total_virtual_sections: usize) -> Self {
        let total = if total_virtual_sections < MIN_VIRTUAL_SECTIONS {
            warn!(
                requested = total_virtual_sections,
                used = MIN_VIRTUAL_SECTIONS,
                "Reader window too small to scroll; raising section count"
            );
            MIN_VIRTUAL_SECTIONS
        } else {
            total_virtual_sections
        };
        Self {
            chapter_offset: 0,
            total_virtual_sections: total,
            min_boundary: 0,
            max_boundary: total - 1,
        }
    }

    /// Distance from a re-centered chapter to the window start.
    pub fn recenter_distance(&self) -> usize {
        self.total_virtual_sections / 2 + 1
    }

    /// Sections actually materialized for a book of `chapter_count` chapters.
    pub fn section_count(&self, chapter_count: usize) -> usize {
        self.total_virtual_sections
            .min(chapter_count.saturating_sub(self.chapter_offset))
    }

    pub fn chapter_index(&self, section: usize) -> usize {
        self.chapter_offset + section
    }

    /// Section showing `chapter_index`, if it is inside the window.
    pub fn section_of(&self, chapter_index: usize, chapter_count: usize) -> Option<usize> {
        let section = chapter_index.checked_sub(self.chapter_offset)?;
        (section < self.section_count(chapter_count)).then_some(section)
    }

    /// Largest offset that still fills every section.
    pub fn max_offset(&self, chapter_count: usize) -> usize {
        chapter_count.saturating_sub(self.total_virtual_sections)
    }

    pub fn with_offset(self, offset: usize, chapter_count: usize) -> Self {
        Self {
            chapter_offset: offset.min(self.max_offset(chapter_count)),
            ..self
        }
    }
}

/// The item about to be displayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisiblePosition {
    pub chapter_index: usize,
    pub section_index: usize,
    /// Page row inside the chapter's section.
    pub row: usize,
    /// Pixels already scrolled past the top of that item.
    pub intra_offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTarget {
    /// Flat item index from the top of the new window.
    pub item: usize,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Steady(ReaderWindowState),
    Rebased {
        state: ReaderWindowState,
        scroll: ScrollTarget,
    },
}

impl Transition {
    pub fn state(&self) -> ReaderWindowState {
        match self {
            Transition::Steady(state) | Transition::Rebased { state, .. } => *state,
        }
    }
}

/// Decide whether displaying `visible` moves the window.
///
/// `item_counts[i]` is the number of list items chapter `i` occupies; its
/// length is the chapter count. `page_height` converts items to pixels.
pub fn rebase(
    state: ReaderWindowState,
    visible: VisiblePosition,
    item_counts: &[usize],
    page_height: f32,
) -> Transition {
    let chapter_count = item_counts.len();
    if visible.chapter_index >= chapter_count {
        return Transition::Steady(state);
    }
    let distance = state.recenter_distance();

    let target = if visible.section_index >= state.max_boundary {
        Some(visible.chapter_index.saturating_sub(distance))
    } else if visible.section_index <= state.min_boundary {
        if visible.chapter_index <= distance {
            Some(0)
        } else {
            Some(visible.chapter_index - distance)
        }
    } else {
        None
    };

    let Some(target) = target else {
        return Transition::Steady(state);
    };
    let next = state.with_offset(target, chapter_count);
    if next.chapter_offset == state.chapter_offset {
        return Transition::Steady(state);
    }

    let scroll = scroll_target(next, visible, item_counts, page_height);
    debug!(
        from = state.chapter_offset,
        to = next.chapter_offset,
        chapter = visible.chapter_index,
        section = visible.section_index,
        item = scroll.item,
        "Rebased reader window"
    );
    Transition::Rebased {
        state: next,
        scroll,
    }
}

/// Page accounting: items of every chapter between the window start and the
/// visible chapter, plus the row inside it.
pub fn scroll_target(
    state: ReaderWindowState,
    visible: VisiblePosition,
    item_counts: &[usize],
    page_height: f32,
) -> ScrollTarget {
    let start = state.chapter_offset.min(item_counts.len());
    let end = visible.chapter_index.clamp(start, item_counts.len());
    let before: usize = item_counts[start..end].iter().map(|c| (*c).max(1)).sum();
    let item = before + visible.row;
    let intra = if visible.intra_offset.is_finite() {
        visible.intra_offset.max(0.0)
    } else {
        0.0
    };
    ScrollTarget {
        item,
        y: item as f32 * page_height + intra,
    }
}

/// Inverse of [`scroll_target`]: which chapter and row a flat item index
/// lands on inside the window.
pub fn locate_item(
    state: ReaderWindowState,
    item: usize,
    item_counts: &[usize],
) -> Option<(usize, usize)> {
    let mut remaining = item;
    let end = (state.chapter_offset + state.section_count(item_counts.len())).min(item_counts.len());
    for (chapter_index, count) in item_counts
        .iter()
        .enumerate()
        .take(end)
        .skip(state.chapter_offset)
    {
        let count = (*count).max(1);
        if remaining < count {
            return Some((chapter_index, remaining));
        }
        remaining -= count;
    }
    None
}
