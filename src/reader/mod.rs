//! Reader session: the chapter store plus the virtual window, driven by
//! messages and answering with effects for the runtime to perform.

mod runtime;
mod window;

pub use runtime::{Runtime, Surface};
pub use window::{
    ReaderWindowState, ScrollTarget, Transition, VisiblePosition, locate_item, rebase,
    scroll_target,
};

use crate::chapter_store::ChapterStore;
use crate::models::{Chapter, ChapterDetail};
use crate::net::FetchError;
use crate::pagination::{TextStyle, Viewport};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Inputs to [`ReaderSession::reduce`].
#[derive(Debug, Clone)]
pub enum Message {
    TableOfContentsLoaded {
        book_id: String,
        result: Result<Vec<Chapter>, FetchError>,
    },
    ItemWillDisplay {
        section: usize,
        row: usize,
        intra_offset: f32,
    },
    ChaptersDownloaded {
        book_id: String,
        chapter_ids: Vec<String>,
        result: Result<Vec<ChapterDetail>, FetchError>,
    },
    JumpToChapter(usize),
    ViewportChanged {
        viewport: Viewport,
        style: TextStyle,
        page_height: f32,
    },
}

/// Work that must be performed outside the pure reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadTableOfContents {
        book_id: String,
    },
    DownloadChapters {
        book_id: String,
        chapter_ids: Vec<String>,
    },
    ReloadAll {
        scroll: Option<ScrollTarget>,
    },
    ReloadSection(usize),
}

/// What one list item shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<'a> {
    pub chapter_index: usize,
    pub title: String,
    /// `None` while the chapter is still a placeholder.
    pub body: Option<&'a str>,
}

pub struct ReaderSession {
    store: ChapterStore,
    window: ReaderWindowState,
    page_height: f32,
    initial_batch: usize,
    in_flight: HashSet<String>,
}

impl ReaderSession {
    pub fn new(
        store: ChapterStore,
        window: ReaderWindowState,
        page_height: f32,
        initial_batch: usize,
    ) -> Self {
        Self {
            store,
            window,
            page_height: sanitize_page_height(page_height),
            initial_batch,
            in_flight: HashSet::new(),
        }
    }

    pub fn store(&self) -> &ChapterStore {
        &self.store
    }

    pub fn window(&self) -> ReaderWindowState {
        self.window
    }

    pub fn page_height(&self) -> f32 {
        self.page_height
    }

    pub fn is_in_flight(&self, chapter_id: &str) -> bool {
        self.in_flight.contains(chapter_id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// First effects of a session: fetch the table of contents.
    pub fn open(&self) -> Vec<Effect> {
        vec![Effect::LoadTableOfContents {
            book_id: self.store.book_id().to_string(),
        }]
    }

    pub fn reduce(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = Vec::new();

        match message {
            Message::TableOfContentsLoaded { book_id, result } => {
                self.handle_toc_loaded(book_id, result, &mut effects)
            }
            Message::ItemWillDisplay {
                section,
                row,
                intra_offset,
            } => self.handle_item_will_display(section, row, intra_offset, &mut effects),
            Message::ChaptersDownloaded {
                book_id,
                chapter_ids,
                result,
            } => self.handle_chapters_downloaded(book_id, chapter_ids, result, &mut effects),
            Message::JumpToChapter(index) => self.handle_jump_to_chapter(index, &mut effects),
            Message::ViewportChanged {
                viewport,
                style,
                page_height,
            } => self.handle_viewport_changed(viewport, style, page_height, &mut effects),
        }

        effects
    }

    /// Number of list sections currently materialized.
    pub fn section_count(&self) -> usize {
        self.window.section_count(self.store.len())
    }

    pub fn item_count(&self, section: usize) -> usize {
        self.chapter_for_section(section)
            .map(Chapter::item_count)
            .unwrap_or(0)
    }

    /// Items in every materialized section, in list order.
    pub fn total_items(&self) -> usize {
        (0..self.section_count()).map(|s| self.item_count(s)).sum()
    }

    pub fn item(&self, section: usize, row: usize) -> Option<PageView<'_>> {
        let chapter = self.chapter_for_section(section)?;
        let chapter_index = self.window.chapter_index(section);
        if !chapter.is_downloaded() {
            return (row == 0).then(|| PageView {
                chapter_index,
                title: chapter.name.clone(),
                body: None,
            });
        }
        let pages = chapter.pages();
        let page = pages.get(row)?;
        Some(PageView {
            chapter_index,
            title: format!("{} - {}/{}", chapter.name, page.number, pages.len()),
            body: Some(page.text.as_str()),
        })
    }

    /// Section and row a flat item index (counted from the top of the
    /// window) falls on.
    pub fn locate(&self, item: usize) -> Option<(usize, usize)> {
        let (chapter_index, row) = locate_item(self.window, item, &self.store.item_counts())?;
        Some((chapter_index - self.window.chapter_offset, row))
    }

    /// Flat item index of `row` in `section`; the row is clamped to the
    /// section's last item.
    pub fn item_index(&self, section: usize, row: usize) -> Option<usize> {
        let count = self.item_count(section);
        if count == 0 {
            return None;
        }
        let before: usize = (0..section).map(|s| self.item_count(s)).sum();
        Some(before + row.min(count - 1))
    }

    fn chapter_for_section(&self, section: usize) -> Option<&Chapter> {
        if section >= self.section_count() {
            return None;
        }
        self.store.chapter(self.window.chapter_index(section))
    }

    fn handle_toc_loaded(
        &mut self,
        book_id: String,
        result: Result<Vec<Chapter>, FetchError>,
        effects: &mut Vec<Effect>,
    ) {
        if book_id != self.store.book_id() {
            debug!(book_id, "Ignoring table of contents for another book");
            return;
        }
        let chapters = match result {
            Ok(chapters) => chapters,
            Err(err) => {
                warn!(book_id, "Failed to load table of contents: {err}");
                return;
            }
        };

        info!(book_id, chapters = chapters.len(), "Table of contents ready");
        self.store.set_chapters(chapters);
        self.in_flight.clear();
        self.window = ReaderWindowState::new(self.window.total_virtual_sections);

        let batch: Vec<String> = self
            .store
            .chapters()
            .iter()
            .take(self.initial_batch)
            .map(|c| c.chapter_id.clone())
            .collect();
        self.request(batch, effects);
        effects.push(Effect::ReloadAll { scroll: None });
    }

    fn handle_item_will_display(
        &mut self,
        section: usize,
        row: usize,
        intra_offset: f32,
        effects: &mut Vec<Effect>,
    ) {
        if section >= self.section_count() {
            return;
        }
        let chapter_index = self.window.chapter_index(section);
        let visible = VisiblePosition {
            chapter_index,
            section_index: section,
            row,
            intra_offset,
        };

        if let Transition::Rebased { state, scroll } = rebase(
            self.window,
            visible,
            &self.store.item_counts(),
            self.page_height,
        ) {
            self.window = state;
            effects.push(Effect::ReloadAll {
                scroll: Some(scroll),
            });
        }

        let Some(chapter) = self.store.chapter(chapter_index) else {
            return;
        };
        if !chapter.is_downloaded() {
            let chapter_id = chapter.chapter_id.clone();
            self.request(vec![chapter_id], effects);
        }
    }

    fn handle_chapters_downloaded(
        &mut self,
        book_id: String,
        chapter_ids: Vec<String>,
        result: Result<Vec<ChapterDetail>, FetchError>,
        effects: &mut Vec<Effect>,
    ) {
        if book_id != self.store.book_id() {
            debug!(book_id, "Ignoring chapter batch for another book");
            return;
        }
        for chapter_id in &chapter_ids {
            self.in_flight.remove(chapter_id);
        }

        let details = match result {
            Ok(details) => details,
            Err(err) => {
                warn!(
                    book_id,
                    chapters = %chapter_ids.join(","),
                    "Chapter download failed: {err}"
                );
                return;
            }
        };

        self.store.apply_chapter_details(&details);

        let chapter_count = self.store.len();
        let mut sections: Vec<usize> = details
            .iter()
            .filter_map(|d| self.store.index_of(&d.chapter_id))
            .filter_map(|index| self.window.section_of(index, chapter_count))
            .collect();
        sections.sort_unstable();
        sections.dedup();
        effects.extend(sections.into_iter().map(Effect::ReloadSection));
    }

    fn handle_jump_to_chapter(&mut self, index: usize, effects: &mut Vec<Effect>) {
        let chapter_count = self.store.len();
        if index >= chapter_count {
            warn!(index, chapter_count, "Jump target outside the book");
            return;
        }
        let target = index.saturating_sub(self.window.recenter_distance());
        self.window = self.window.with_offset(target, chapter_count);
        let visible = VisiblePosition {
            chapter_index: index,
            section_index: index - self.window.chapter_offset,
            row: 0,
            intra_offset: 0.0,
        };
        let scroll = scroll_target(
            self.window,
            visible,
            &self.store.item_counts(),
            self.page_height,
        );
        info!(
            index,
            offset = self.window.chapter_offset,
            "Jumped to chapter"
        );
        effects.push(Effect::ReloadAll {
            scroll: Some(scroll),
        });

        let Some(chapter) = self.store.chapter(index) else {
            return;
        };
        if !chapter.is_downloaded() {
            let chapter_id = chapter.chapter_id.clone();
            self.request(vec![chapter_id], effects);
        }
    }

    fn handle_viewport_changed(
        &mut self,
        viewport: Viewport,
        style: TextStyle,
        page_height: f32,
        effects: &mut Vec<Effect>,
    ) {
        let page_height = sanitize_page_height(page_height);
        let height_changed = page_height != self.page_height;
        self.page_height = page_height;
        if self.store.repaginate(viewport, style) || height_changed {
            effects.push(Effect::ReloadAll { scroll: None });
        }
    }

    /// Queue a download for the chapters that are neither downloaded nor
    /// already requested.
    fn request(&mut self, chapter_ids: Vec<String>, effects: &mut Vec<Effect>) {
        let pending: Vec<String> = chapter_ids
            .into_iter()
            .filter(|id| !self.in_flight.contains(id))
            .collect();
        if pending.is_empty() {
            return;
        }
        for id in &pending {
            self.in_flight.insert(id.clone());
        }
        debug!(chapters = %pending.join(","), "Requesting chapters");
        effects.push(Effect::DownloadChapters {
            book_id: self.store.book_id().to_string(),
            chapter_ids: pending,
        });
    }
}

fn sanitize_page_height(page_height: f32) -> f32 {
    if page_height.is_finite() && page_height > 0.0 {
        page_height
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapter_store::tests::{CONTENT, TOC, content_body, store_with, toc_body};
    use crate::chapter_store::{fetch_chapter_details, parse_table_of_contents};
    use crate::config::AppConfig;
    use crate::net::ApiClient;
    use crate::net::testing::MockTransport;
    use std::sync::Arc;

    fn session(transport: Arc<MockTransport>) -> ReaderSession {
        ReaderSession::new(
            store_with(transport),
            ReaderWindowState::default(),
            600.0,
            3,
        )
    }

    fn chapters(count: usize) -> Vec<Chapter> {
        let transport = MockTransport::default();
        transport.respond(TOC, toc_body(count));
        let client = ApiClient::new(Arc::new(transport), &AppConfig::default());
        let result = client.table_of_contents("1").expect("toc");
        parse_table_of_contents(&result, "1").expect("parse")
    }

    fn loaded(session: &mut ReaderSession, count: usize) -> Vec<Effect> {
        session.reduce(Message::TableOfContentsLoaded {
            book_id: "1".to_string(),
            result: Ok(chapters(count)),
        })
    }

    fn downloaded(id: &str, content: &str) -> Message {
        let transport = Arc::new(MockTransport::default());
        transport.respond(CONTENT, content_body(&[(id, content)]));
        let client = ApiClient::new(transport, &AppConfig::default());
        let details = fetch_chapter_details(&client, "1", &[id.to_string()]).expect("details");
        Message::ChaptersDownloaded {
            book_id: "1".to_string(),
            chapter_ids: vec![id.to_string()],
            result: Ok(details),
        }
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn open_requests_the_table_of_contents() {
        let session = session(Arc::new(MockTransport::default()));
        assert_eq!(
            session.open(),
            vec![Effect::LoadTableOfContents {
                book_id: "1".to_string()
            }]
        );
    }

    #[test]
    fn table_of_contents_prefetches_first_chapters() {
        let mut session = session(Arc::new(MockTransport::default()));
        let effects = loaded(&mut session, 30);

        assert_eq!(
            effects,
            vec![
                Effect::DownloadChapters {
                    book_id: "1".to_string(),
                    chapter_ids: ids(&["1", "2", "3"]),
                },
                Effect::ReloadAll { scroll: None },
            ]
        );
        assert_eq!(session.section_count(), 21);
        assert!(session.is_in_flight("2"));
    }

    #[test]
    fn failed_table_of_contents_leaves_book_empty() {
        let mut session = session(Arc::new(MockTransport::default()));
        let effects = session.reduce(Message::TableOfContentsLoaded {
            book_id: "1".to_string(),
            result: Err(FetchError::Network("offline".to_string())),
        });
        assert!(effects.is_empty());
        assert_eq!(session.section_count(), 0);
    }

    #[test]
    fn placeholder_items_show_chapter_name() {
        let mut session = session(Arc::new(MockTransport::default()));
        loaded(&mut session, 5);

        assert_eq!(session.item_count(0), 1);
        let view = session.item(0, 0).expect("placeholder item");
        assert_eq!(view.title, "C1");
        assert_eq!(view.body, None);
        assert!(session.item(0, 1).is_none());
        assert!(session.item(5, 0).is_none());
    }

    #[test]
    fn download_completion_reloads_its_section() {
        let mut session = session(Arc::new(MockTransport::default()));
        loaded(&mut session, 5);

        let effects = session.reduce(downloaded("2", "hello world"));

        assert_eq!(effects, vec![Effect::ReloadSection(1)]);
        assert!(!session.is_in_flight("2"));
        let view = session.item(1, 0).expect("page item");
        assert_eq!(view.title, "C2 - 1/1");
        assert_eq!(view.body, Some("hello world"));
    }

    #[test]
    fn completion_outside_window_updates_chapter_without_reload() {
        let mut session = session(Arc::new(MockTransport::default()));
        loaded(&mut session, 60);
        session.reduce(Message::JumpToChapter(40));
        assert_eq!(session.window().chapter_offset, 29);

        let effects = session.reduce(downloaded("2", "early chapter"));

        assert!(effects.is_empty());
        let chapter = session.store().chapter(1).expect("chapter");
        assert!(chapter.is_downloaded());
    }

    #[test]
    fn displaying_a_placeholder_requests_it_once() {
        let mut session = session(Arc::new(MockTransport::default()));
        loaded(&mut session, 10);

        let first = session.reduce(Message::ItemWillDisplay {
            section: 5,
            row: 0,
            intra_offset: 0.0,
        });
        let second = session.reduce(Message::ItemWillDisplay {
            section: 5,
            row: 0,
            intra_offset: 0.0,
        });

        assert_eq!(
            first,
            vec![Effect::DownloadChapters {
                book_id: "1".to_string(),
                chapter_ids: ids(&["6"]),
            }]
        );
        assert!(second.is_empty());
    }

    #[test]
    fn initial_batch_is_not_requested_twice() {
        let mut session = session(Arc::new(MockTransport::default()));
        loaded(&mut session, 10);

        let effects = session.reduce(Message::ItemWillDisplay {
            section: 0,
            row: 0,
            intra_offset: 0.0,
        });
        assert!(effects.is_empty());
    }

    #[test]
    fn failed_download_can_be_requested_again() {
        let mut session = session(Arc::new(MockTransport::default()));
        loaded(&mut session, 10);

        let effects = session.reduce(Message::ChaptersDownloaded {
            book_id: "1".to_string(),
            chapter_ids: ids(&["1", "2", "3"]),
            result: Err(FetchError::Protocol {
                code: "500".to_string(),
                message: "busy".to_string(),
            }),
        });
        assert!(effects.is_empty());
        assert_eq!(session.in_flight_count(), 0);

        let retry = session.reduce(Message::ItemWillDisplay {
            section: 0,
            row: 0,
            intra_offset: 0.0,
        });
        assert_eq!(
            retry,
            vec![Effect::DownloadChapters {
                book_id: "1".to_string(),
                chapter_ids: ids(&["1"]),
            }]
        );
    }

    #[test]
    fn reaching_the_last_section_rebases_and_scrolls() {
        let mut session = session(Arc::new(MockTransport::default()));
        loaded(&mut session, 100);

        let effects = session.reduce(Message::ItemWillDisplay {
            section: 20,
            row: 0,
            intra_offset: 0.0,
        });

        assert_eq!(session.window().chapter_offset, 9);
        let Some(Effect::ReloadAll {
            scroll: Some(scroll),
        }) = effects.first()
        else {
            panic!("expected a reload with scroll target, got {effects:?}");
        };
        assert_eq!(session.locate(scroll.item), Some((11, 0)));
        assert_eq!(session.item(11, 0).expect("item").chapter_index, 20);
        assert!(effects.contains(&Effect::DownloadChapters {
            book_id: "1".to_string(),
            chapter_ids: ids(&["21"]),
        }));
    }

    #[test]
    fn batch_for_another_book_keeps_current_requests_in_flight() {
        let mut session = session(Arc::new(MockTransport::default()));
        loaded(&mut session, 3);

        let effects = session.reduce(Message::ChaptersDownloaded {
            book_id: "other".to_string(),
            chapter_ids: ids(&["1"]),
            result: Ok(Vec::new()),
        });
        assert!(effects.is_empty());
        assert!(session.is_in_flight("1"));

        let redisplay = session.reduce(Message::ItemWillDisplay {
            section: 0,
            row: 0,
            intra_offset: 0.0,
        });
        assert!(redisplay.is_empty());
    }

    #[test]
    fn item_index_inverts_locate() {
        let mut session = session(Arc::new(MockTransport::default()));
        loaded(&mut session, 4);
        session.reduce(downloaded("2", &"长".repeat(120)));
        let pages = session.item_count(1);
        assert!(pages > 1);

        assert_eq!(session.item_index(0, 0), Some(0));
        assert_eq!(session.item_index(1, pages - 1), Some(pages));
        assert_eq!(session.item_index(1, 99), Some(pages));
        assert_eq!(session.item_index(2, 0), Some(pages + 1));
        assert_eq!(session.locate(pages + 1), Some((2, 0)));
        assert_eq!(session.item_index(4, 0), None);
    }

    #[test]
    fn jump_centers_the_target_chapter() {
        let mut session = session(Arc::new(MockTransport::default()));
        loaded(&mut session, 100);

        let effects = session.reduce(Message::JumpToChapter(50));

        assert_eq!(session.window().chapter_offset, 39);
        assert_eq!(session.window().section_of(50, 100), Some(11));
        let Some(Effect::ReloadAll {
            scroll: Some(scroll),
        }) = effects.first()
        else {
            panic!("expected a reload with scroll target");
        };
        assert_eq!(session.locate(scroll.item), Some((11, 0)));
        assert!(session.reduce(Message::JumpToChapter(100)).is_empty());
    }

    #[test]
    fn viewport_change_repaginates_downloaded_chapters() {
        let mut session = session(Arc::new(MockTransport::default()));
        loaded(&mut session, 2);
        let long = "长".repeat(120);
        session.reduce(downloaded("1", &long));
        assert!(session.item_count(0) > 1);

        let effects = session.reduce(Message::ViewportChanged {
            viewport: Viewport::new(1000.0, 1000.0),
            style: TextStyle::default(),
            page_height: 600.0,
        });

        assert_eq!(effects, vec![Effect::ReloadAll { scroll: None }]);
        assert_eq!(session.item_count(0), 1);
    }
}
