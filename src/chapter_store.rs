//! Ordered chapter list of one book plus download-on-demand.
//!
//! Fetching (`fetch_chapter_details`) only touches the network and can run on
//! a worker; applying (`apply_chapter_details`) mutates chapters and must run
//! on the thread that owns the store.

use crate::models::{Chapter, ChapterDetail};
use crate::net::{ApiClient, FetchError};
use crate::normalizer::ContentNormalizer;
use crate::pagination::{Paginator, TextStyle, Viewport};
use serde_json::Value;
use tracing::{debug, info, warn};

pub struct ChapterStore {
    client: ApiClient,
    paginator: Paginator,
    normalizer: ContentNormalizer,
    book_id: String,
    chapters: Vec<Chapter>,
}

impl ChapterStore {
    pub fn new(
        client: ApiClient,
        paginator: Paginator,
        normalizer: ContentNormalizer,
        book_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            paginator,
            normalizer,
            book_id: book_id.into(),
            chapters: Vec::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn index_of(&self, chapter_id: &str) -> Option<usize> {
        self.chapters.iter().position(|c| c.chapter_id == chapter_id)
    }

    /// Item counts per chapter (pages, or 1 for a placeholder).
    pub fn item_counts(&self) -> Vec<usize> {
        self.chapters.iter().map(Chapter::item_count).collect()
    }

    /// Fetch and parse the book's table of contents, replacing the current
    /// chapter list. Returns the freshly loaded chapters.
    pub fn load_table_of_contents(&mut self, book_id: &str) -> Result<Vec<Chapter>, FetchError> {
        let result = self.client.table_of_contents(book_id)?;
        let chapters = parse_table_of_contents(&result, book_id)?;
        info!(book_id, chapters = chapters.len(), "Loaded table of contents");
        self.book_id = book_id.to_string();
        self.chapters = chapters.clone();
        Ok(chapters)
    }

    /// Adopt a chapter list parsed elsewhere (e.g. on a worker thread).
    pub fn set_chapters(&mut self, chapters: Vec<Chapter>) {
        self.chapters = chapters;
    }

    /// Download one batch and apply it. Returns how many chapters changed.
    pub fn download_chapters(
        &mut self,
        book_id: &str,
        chapter_ids: &[String],
    ) -> Result<usize, FetchError> {
        let details = fetch_chapter_details(&self.client, book_id, chapter_ids)?;
        Ok(self.apply_chapter_details(&details))
    }

    /// Paginate downloaded records into their chapters, matched by id.
    pub fn apply_chapter_details(&mut self, details: &[ChapterDetail]) -> usize {
        let mut updated = 0usize;
        for detail in details {
            let Some(index) = self.index_of(&detail.chapter_id) else {
                warn!(
                    chapter_id = %detail.chapter_id,
                    "Content returned for a chapter that is not in the table of contents"
                );
                continue;
            };
            let content = self
                .normalizer
                .normalize(detail.content.as_deref().unwrap_or_default());
            let pages = self.paginator.paginate(&content);
            let chapter = &mut self.chapters[index];
            debug!(
                chapter_id = %chapter.chapter_id,
                index,
                pages = pages.len(),
                "Applied chapter content"
            );
            chapter.set_content(content, detail.key.clone(), pages);
            updated += 1;
        }
        updated
    }

    /// Re-run pagination for every downloaded chapter. Returns false when the
    /// viewport and style were unchanged and nothing was recomputed.
    pub fn repaginate(&mut self, viewport: Viewport, style: TextStyle) -> bool {
        if !self.paginator.reconfigure(viewport, style) {
            return false;
        }
        let mut touched = 0usize;
        for chapter in &mut self.chapters {
            let Some(content) = chapter.content.as_deref() else {
                continue;
            };
            let pages = self.paginator.paginate(content);
            chapter.replace_pages(pages);
            touched += 1;
        }
        info!(
            width = viewport.width,
            height = viewport.height,
            chapters = touched,
            "Repaginated downloaded chapters"
        );
        true
    }
}

/// Parse the `result` object of the table-of-contents endpoint.
pub fn parse_table_of_contents(result: &Value, book_id: &str) -> Result<Vec<Chapter>, FetchError> {
    let list = result
        .get("chapterList")
        .ok_or_else(|| FetchError::Parse("result has no chapterList".to_string()))?
        .as_array()
        .ok_or_else(|| FetchError::Parse("chapterList is not an array".to_string()))?;

    let mut chapters = Vec::with_capacity(list.len());
    for (position, row) in list.iter().enumerate() {
        match Chapter::from_toc_entry(row, book_id) {
            Some(chapter) => chapters.push(chapter),
            None => warn!(book_id, position, "Skipping chapter entry without chapterId"),
        }
    }
    Ok(chapters)
}

/// Request content for one batch of chapters. The whole batch fails if the
/// server does not answer with a success code.
pub fn fetch_chapter_details(
    client: &ApiClient,
    book_id: &str,
    chapter_ids: &[String],
) -> Result<Vec<ChapterDetail>, FetchError> {
    if book_id.trim().is_empty() {
        return Err(FetchError::InvalidRequest("book id is empty"));
    }
    if chapter_ids.is_empty() {
        return Err(FetchError::InvalidRequest("no chapters requested"));
    }
    let result = client.chapter_contents(book_id, chapter_ids)?;
    let details = ChapterDetail::list_from_result(&result)?;
    debug!(
        book_id,
        requested = chapter_ids.len(),
        received = details.len(),
        "Fetched chapter batch"
    );
    Ok(details)
}
