//! Book data carried through the reader: chapters from the table of contents
//! and the content records returned by the download endpoint.

use crate::net::{
    FetchError, parse_bool_field, parse_f64_field, parse_string_field, parse_u64_field,
};
use crate::pagination::Page;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub book_id: String,
    pub chapter_id: String,
    pub name: String,
    pub word_count: u64,
    pub actual_price: Option<f64>,
    pub is_vip: bool,
    /// Whether the reader owns the chapter; free chapters report true.
    pub purchased: bool,
    pub create_time: Option<f64>,
    pub(crate) content: Option<String>,
    pub(crate) key: Option<String>,
    pub(crate) pages: Vec<Page>,
}

impl Chapter {
    pub fn new(book_id: impl Into<String>, chapter_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            chapter_id: chapter_id.into(),
            name: name.into(),
            word_count: 0,
            actual_price: None,
            is_vip: false,
            purchased: true,
            create_time: None,
            content: None,
            key: None,
            pages: Vec::new(),
        }
    }

    /// Parse one `chapterList` entry. Entries without a `chapterId` yield
    /// `None`; a missing `bookId` falls back to the requested book.
    pub fn from_toc_entry(row: &Value, book_id: &str) -> Option<Self> {
        let chapter_id = parse_string_field(row, "chapterId")?;
        let name = parse_string_field(row, "name")
            .or_else(|| parse_string_field(row, "chapterName"))
            .unwrap_or_default();
        let mut chapter = Chapter::new(
            parse_string_field(row, "bookId").unwrap_or_else(|| book_id.to_string()),
            chapter_id,
            name,
        );
        chapter.word_count = parse_u64_field(row, "wordCount").unwrap_or(0);
        chapter.actual_price = parse_f64_field(row, "actualPrice");
        chapter.is_vip = parse_bool_field(row, "isVip").unwrap_or(false);
        chapter.purchased = parse_bool_field(row, "status").unwrap_or(true);
        chapter.create_time = parse_f64_field(row, "createTime");
        Some(chapter)
    }

    pub fn is_downloaded(&self) -> bool {
        self.content.is_some() && !self.pages.is_empty()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of list items the chapter occupies: its pages once downloaded,
    /// otherwise a single placeholder.
    pub fn item_count(&self) -> usize {
        self.pages.len().max(1)
    }

    pub(crate) fn set_content(&mut self, content: String, key: Option<String>, pages: Vec<Page>) {
        self.content = Some(content);
        self.key = key;
        self.pages = pages;
    }

    pub(crate) fn replace_pages(&mut self, pages: Vec<Page>) {
        self.pages = pages;
    }
}

impl std::fmt::Display for Chapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.chapter_id, self.name, self.word_count)
    }
}

/// One record of the chapter-content endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterDetail {
    pub book_id: String,
    pub chapter_id: String,
    pub chapter_name: Option<String>,
    pub content: Option<String>,
    pub key: Option<String>,
    pub status: i64,
}

impl ChapterDetail {
    pub fn from_value(row: &Value) -> Option<Self> {
        Some(Self {
            book_id: parse_string_field(row, "bookId").unwrap_or_default(),
            chapter_id: parse_string_field(row, "chapterId")?,
            chapter_name: parse_string_field(row, "chapterName"),
            content: row.get("content").and_then(Value::as_str).map(str::to_string),
            key: parse_string_field(row, "key").filter(|k| k != "<null>"),
            status: row.get("status").and_then(Value::as_i64).unwrap_or(0),
        })
    }

    /// Parse the `result` array of a content response.
    pub fn list_from_result(result: &Value) -> Result<Vec<Self>, FetchError> {
        let rows = result
            .as_array()
            .ok_or_else(|| FetchError::Parse("chapter content result is not an array".to_string()))?;
        rows.iter()
            .map(|row| {
                Self::from_value(row).ok_or_else(|| {
                    FetchError::Parse("chapter content record has no chapterId".to_string())
                })
            })
            .collect()
    }
}
