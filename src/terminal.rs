//! Line-oriented front end: prints the current page and reads navigation
//! commands from stdin.

use crate::bridge::{NavigationIntent, NavigationRouter, dispatch_bridge_message};
use crate::chapter_store::ChapterStore;
use crate::pagination::Viewport;
use crate::reader::{Message, ReaderSession, Runtime, ScrollTarget, Surface};
use anyhow::{Context, Result, anyhow};
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    Previous,
    /// 1-based chapter number.
    Goto(usize),
    /// New text area size in points.
    Resize { width: f32, height: f32 },
    /// Raw JSON posted by an embedded web page.
    WebMessage(String),
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let command = match head {
            "n" | "next" => Command::Next,
            "p" | "prev" => Command::Previous,
            "q" | "quit" => Command::Quit,
            "g" | "goto" => Command::Goto(rest.parse().ok().filter(|n| *n > 0)?),
            "r" | "resize" => {
                let mut dims = rest.split_whitespace().map(str::parse::<f32>);
                let width = dims.next()?.ok().filter(|w| *w > 0.0)?;
                let height = dims.next()?.ok().filter(|h| *h > 0.0)?;
                Command::Resize { width, height }
            }
            "w" | "web" if !rest.is_empty() => Command::WebMessage(rest.to_string()),
            _ => return None,
        };
        Some(command)
    }
}

/// Where the cursor sits, by chapter rather than flat item index, so it
/// survives item counts changing around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    chapter_index: usize,
    /// Counted from the chapter's last item when `from_end` is set.
    row: usize,
    from_end: bool,
}

/// Keeps a cursor on one list item and prints it whenever it may have
/// changed.
pub struct TerminalSurface<W: Write> {
    out: W,
    item: usize,
    anchor: Option<Anchor>,
    frames: u64,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            item: 0,
            anchor: None,
            frames: 0,
        }
    }

    pub fn item(&self) -> usize {
        self.item
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn set_anchor(&mut self, session: &ReaderSession, from_end: bool) {
        let Some((section, row)) = session.locate(self.item) else {
            self.anchor = None;
            return;
        };
        let count = session.item_count(section);
        self.anchor = Some(Anchor {
            chapter_index: session.window().chapter_index(section),
            row: if from_end { count.saturating_sub(row + 1) } else { row },
            from_end,
        });
    }

    /// Move `item` back onto the anchored chapter page after item counts
    /// changed.
    fn reanchor(&mut self, session: &ReaderSession) {
        let Some(anchor) = self.anchor else {
            return;
        };
        let Some(section) = session
            .window()
            .section_of(anchor.chapter_index, session.store().len())
        else {
            return;
        };
        let count = session.item_count(section);
        let row = if anchor.from_end {
            count.saturating_sub(anchor.row + 1)
        } else {
            anchor.row
        };
        if let Some(item) = session.item_index(section, row) {
            if item != self.item {
                debug!(from = self.item, to = item, "Re-anchored cursor");
            }
            self.item = item;
        }
    }

    fn render(&mut self, session: &ReaderSession) {
        self.frames += 1;
        let total = session.total_items();
        if total == 0 {
            self.write_frame("(empty book)", None);
            return;
        }
        self.item = self.item.min(total - 1);
        let view = session
            .locate(self.item)
            .and_then(|(section, row)| session.item(section, row));
        match view {
            Some(view) => {
                let title = view.title.clone();
                self.write_frame(&title, Some(view.body.unwrap_or("(loading…)")));
            }
            None => self.write_frame("(no page)", None),
        }
    }

    fn write_frame(&mut self, title: &str, body: Option<&str>) {
        let result = (|| -> std::io::Result<()> {
            writeln!(self.out, "== {title} ==")?;
            if let Some(body) = body {
                writeln!(self.out, "{body}")?;
            }
            writeln!(self.out)?;
            self.out.flush()
        })();
        if let Err(err) = result {
            warn!("Failed to write page: {err}");
        }
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn reload_all(&mut self, session: &ReaderSession, scroll: Option<ScrollTarget>) {
        match scroll {
            Some(scroll) => {
                self.item = scroll.item;
                let from_end = self.anchor.is_some_and(|a| a.from_end);
                self.set_anchor(session, from_end);
            }
            None => self.reanchor(session),
        }
        self.render(session);
    }

    fn reload_section(&mut self, session: &ReaderSession, section: usize) {
        self.reanchor(session);
        match session.locate(self.item) {
            Some((current, _)) if current == section => self.render(session),
            _ => debug!(section, "Reloaded section is off screen"),
        }
    }
}

/// Prints where an embedded page asked to go; the terminal has no web view.
#[derive(Debug, Default)]
pub struct LogRouter {
    pub intents: Vec<NavigationIntent>,
}

impl NavigationRouter for LogRouter {
    fn navigate(&mut self, intent: NavigationIntent) {
        info!(?intent, "Navigation requested by web page");
        self.intents.push(intent);
    }
}

/// Move the cursor and tell the session which item is about to show.
pub fn step<W: Write>(runtime: &mut Runtime<TerminalSurface<W>>, forward: bool) {
    let total = runtime.session().total_items();
    if total == 0 {
        return;
    }
    let current = runtime.surface().item;
    let next = if forward {
        (current + 1).min(total - 1)
    } else {
        current.saturating_sub(1)
    };

    let before = runtime.session().locate(current).map(|(section, _)| section);
    let located = runtime.session().locate(next);
    // Stepping back into another chapter lands on its last page, even if
    // that chapter is still loading.
    let from_end = !forward && located.map(|(section, _)| section) != before;
    {
        let (session, surface) = runtime.parts_mut();
        surface.item = next;
        surface.set_anchor(session, from_end);
    }

    let frames = runtime.surface().frames();
    if let Some((section, row)) = located {
        runtime.dispatch(Message::ItemWillDisplay {
            section,
            row,
            intra_offset: 0.0,
        });
    }
    if runtime.surface().frames() == frames {
        redraw(runtime);
    }
}

/// Re-paginate for a new text area; the list height follows the height.
pub fn resize<W: Write>(runtime: &mut Runtime<TerminalSurface<W>>, width: f32, height: f32) {
    let session = runtime.session();
    let style = *session.store().paginator().style();
    let current = session.store().paginator().viewport();
    let page_height = session.page_height() + (height - current.height);
    runtime.dispatch(Message::ViewportChanged {
        viewport: Viewport::new(width, height),
        style,
        page_height,
    });
}

fn redraw<W: Write>(runtime: &mut Runtime<TerminalSurface<W>>) {
    let (session, surface) = runtime.parts_mut();
    surface.render(session);
}

/// Interactive loop until `q` or end of input.
pub fn run_interactive<W: Write, R: BufRead>(
    runtime: &mut Runtime<TerminalSurface<W>>,
    input: R,
    wait: Duration,
) -> Result<()> {
    let mut router = LogRouter::default();
    for line in input.lines() {
        let line = line.context("Reading command")?;
        runtime.pump();
        let Some(command) = Command::parse(&line) else {
            if !line.trim().is_empty() {
                warn!(%line, "Unknown command; use n, p, g <chapter>, r <w> <h>, w <json> or q");
            }
            continue;
        };
        match command {
            Command::Next => step(runtime, true),
            Command::Previous => step(runtime, false),
            Command::Goto(chapter) => runtime.dispatch(Message::JumpToChapter(chapter - 1)),
            Command::Resize { width, height } => resize(runtime, width, height),
            Command::WebMessage(body) => {
                dispatch_bridge_message(&mut router, &body);
            }
            Command::Quit => break,
        }
        runtime.run_until_idle(wait);
    }
    info!("Leaving reader");
    Ok(())
}

/// Download one chapter synchronously and print all of its pages.
pub fn dump_chapter<W: Write>(store: &mut ChapterStore, index: usize, out: &mut W) -> Result<()> {
    let book_id = store.book_id().to_string();
    store
        .load_table_of_contents(&book_id)
        .with_context(|| format!("Loading table of contents for book {book_id}"))?;
    let chapter_id = store
        .chapter(index)
        .map(|c| c.chapter_id.clone())
        .ok_or_else(|| anyhow!("Book {book_id} has {} chapters", store.len()))?;
    store
        .download_chapters(&book_id, &[chapter_id.clone()])
        .with_context(|| format!("Downloading chapter {chapter_id}"))?;

    let chapter = store
        .chapter(index)
        .ok_or_else(|| anyhow!("Chapter {index} disappeared"))?;
    if !chapter.is_downloaded() {
        return Err(anyhow!("Chapter {chapter_id} has no content"));
    }
    let total = chapter.pages().len();
    for page in chapter.pages() {
        writeln!(out, "== {} - {}/{} ==", chapter.name, page.number, total)?;
        writeln!(out, "{}", page.text)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapter_store::tests::{CONTENT, TOC, content_body, store_with, toc_body};
    use crate::net::testing::MockTransport;
    use crate::reader::ReaderWindowState;
    use std::sync::Arc;

    const WAIT: Duration = Duration::from_secs(5);

    fn runtime(transport: Arc<MockTransport>) -> Runtime<TerminalSurface<Vec<u8>>> {
        let session = ReaderSession::new(
            store_with(transport),
            ReaderWindowState::default(),
            600.0,
            3,
        );
        Runtime::new(session, TerminalSurface::new(Vec::new()), 2)
    }

    fn output(runtime: Runtime<TerminalSurface<Vec<u8>>>) -> String {
        String::from_utf8(runtime.into_surface().into_inner()).expect("utf8")
    }

    #[test]
    fn commands_parse() {
        assert_eq!(Command::parse("n"), Some(Command::Next));
        assert_eq!(Command::parse(" prev "), Some(Command::Previous));
        assert_eq!(Command::parse("g 12"), Some(Command::Goto(12)));
        assert_eq!(Command::parse("g 0"), None);
        assert_eq!(Command::parse("g"), None);
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("jump"), None);
        assert_eq!(
            Command::parse("r 200 300"),
            Some(Command::Resize {
                width: 200.0,
                height: 300.0
            })
        );
        assert_eq!(Command::parse("r 200"), None);
        assert_eq!(Command::parse("r -1 300"), None);
        assert_eq!(
            Command::parse(r#"w {"method":"closeWebView"}"#),
            Some(Command::WebMessage(r#"{"method":"closeWebView"}"#.to_string()))
        );
        assert_eq!(Command::parse("w"), None);
    }

    #[test]
    fn stepping_back_into_a_loading_chapter_lands_on_its_last_page() {
        let long = "长".repeat(120);
        let transport = Arc::new(MockTransport::default());
        transport.respond(TOC, toc_body(4));
        transport.respond(CONTENT, content_body(&[("1", "first"), ("3", "third")]));
        transport.fail(CONTENT, crate::net::FetchError::Network("offline".to_string()));
        transport.respond(CONTENT, content_body(&[("2", long.as_str())]));
        let mut runtime = runtime(transport);
        runtime.start();
        assert!(runtime.run_until_idle(WAIT));

        // Into chapter 2 (download fails), on to chapter 3, then back.
        let input = "n\nn\np\n".as_bytes();
        run_interactive(&mut runtime, input, WAIT).expect("loop runs");

        let pages = runtime.session().item_count(1);
        assert!(pages > 1);
        assert_eq!(runtime.surface().item(), pages);
        assert_eq!(runtime.session().locate(runtime.surface().item()), Some((1, pages - 1)));
        let text = output(runtime);
        assert!(text.contains(&format!("== C2 - {pages}/{pages} ==")));
    }

    #[test]
    fn cursor_follows_its_page_when_an_earlier_chapter_grows() {
        let long = "长".repeat(120);
        let transport = Arc::new(MockTransport::default());
        transport.respond(TOC, toc_body(3));
        transport.respond(CONTENT, content_body(&[("2", "second"), ("3", "third")]));
        transport.respond(CONTENT, content_body(&[("1", long.as_str())]));
        let mut runtime = runtime(transport);
        runtime.start();
        assert!(runtime.run_until_idle(WAIT));

        step(&mut runtime, true);
        assert_eq!(runtime.session().locate(runtime.surface().item()), Some((1, 0)));

        // Chapter 1 lands while the cursor sits on chapter 2.
        runtime.dispatch(Message::ItemWillDisplay {
            section: 0,
            row: 0,
            intra_offset: 0.0,
        });
        assert!(runtime.run_until_idle(WAIT));

        let before = runtime.session().item_count(0);
        assert!(before > 1);
        assert_eq!(runtime.surface().item(), before);
        assert_eq!(runtime.session().locate(runtime.surface().item()), Some((1, 0)));
    }

    #[test]
    fn resize_repaginates_and_redraws() {
        let long = "长".repeat(120);
        let transport = Arc::new(MockTransport::default());
        transport.respond(TOC, toc_body(1));
        transport.respond(CONTENT, content_body(&[("1", long.as_str())]));
        let mut runtime = runtime(transport);
        runtime.start();
        assert!(runtime.run_until_idle(WAIT));
        assert!(runtime.session().item_count(0) > 1);

        run_interactive(&mut runtime, "r 1000 1000\n".as_bytes(), WAIT).expect("loop runs");

        assert_eq!(runtime.session().item_count(0), 1);
        assert_eq!(runtime.session().store().paginator().viewport().width, 1000.0);
        assert!(output(runtime).contains("== C1 - 1/1 =="));
    }

    #[test]
    fn web_messages_are_routed() {
        let mut router = LogRouter::default();
        assert!(dispatch_bridge_message(
            &mut router,
            r#"{"method":"openWithBookCover","params":{"bookId":"8"}}"#
        ));
        assert_eq!(
            router.intents,
            vec![NavigationIntent::OpenBookCover {
                book_id: "8".to_string()
            }]
        );

        let transport = Arc::new(MockTransport::default());
        transport.respond(TOC, toc_body(1));
        let mut runtime = runtime(transport);
        let input = "w {\"method\":\"openWithForum\",\"params\":{\"forumId\":\"2\"}}\nw nope\n";
        run_interactive(&mut runtime, input.as_bytes(), WAIT).expect("bad messages are skipped");
    }

    #[test]
    fn paging_walks_into_the_next_chapter() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(TOC, toc_body(4));
        transport.respond(
            CONTENT,
            content_body(&[("1", "first"), ("2", "second"), ("3", "third")]),
        );
        let mut runtime = runtime(transport);
        runtime.start();
        assert!(runtime.run_until_idle(WAIT));

        let input = "n\nn\nq\nn\n".as_bytes();
        run_interactive(&mut runtime, input, WAIT).expect("loop runs");

        assert_eq!(runtime.surface().item(), 2);
        let text = output(runtime);
        assert!(text.contains("== C2 - 1/1 ==\nsecond"));
        assert!(text.contains("== C3 - 1/1 ==\nthird"));
        assert!(!text.contains("C4"));
    }

    #[test]
    fn placeholder_is_printed_while_loading() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(TOC, toc_body(2));
        transport.fail(CONTENT, crate::net::FetchError::Network("offline".to_string()));
        let mut runtime = runtime(transport);
        runtime.start();
        assert!(runtime.run_until_idle(WAIT));

        let text = output(runtime);
        assert!(text.contains("== C1 ==\n(loading…)"));
    }

    #[test]
    fn dump_prints_every_page() {
        let long = "长".repeat(120);
        let transport = Arc::new(MockTransport::default());
        transport.respond(TOC, toc_body(2));
        transport.respond(CONTENT, content_body(&[("2", long.as_str())]));
        let mut store = store_with(transport);
        let mut out = Vec::new();

        dump_chapter(&mut store, 1, &mut out).expect("dump succeeds");

        let text = String::from_utf8(out).expect("utf8");
        let pages = store.chapter(1).expect("chapter").pages().len();
        assert!(pages > 1);
        assert!(text.starts_with(&format!("== C2 - 1/{pages} ==")));
        assert!(text.contains(&format!("== C2 - {pages}/{pages} ==")));
    }

    #[test]
    fn dump_rejects_missing_chapter() {
        let transport = Arc::new(MockTransport::default());
        transport.respond(TOC, toc_body(1));
        let mut store = store_with(transport);
        assert!(dump_chapter(&mut store, 5, &mut Vec::new()).is_err());
    }
}
