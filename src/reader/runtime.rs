use super::{Effect, Message, ReaderSession, ScrollTarget};
use crate::chapter_store::{fetch_chapter_details, parse_table_of_contents};
use crate::net::ApiClient;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use threadpool::ThreadPool;
use tracing::{debug, warn};

/// Whatever draws the list. Called on the thread that owns the runtime.
pub trait Surface {
    fn reload_all(&mut self, session: &ReaderSession, scroll: Option<ScrollTarget>);
    fn reload_section(&mut self, session: &ReaderSession, section: usize);
}

/// Performs session effects: network work goes to a worker pool, completions
/// come back over a channel and are applied one at a time by `pump`/`wait`.
pub struct Runtime<S: Surface> {
    session: ReaderSession,
    surface: S,
    client: ApiClient,
    pool: ThreadPool,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    pending: usize,
}

impl<S: Surface> Runtime<S> {
    pub fn new(session: ReaderSession, surface: S, threads: usize) -> Self {
        let client = session.store().client().clone();
        let (tx, rx) = mpsc::channel();
        Self {
            session,
            surface,
            client,
            pool: ThreadPool::with_name("chapter-download".to_string(), threads.max(1)),
            tx,
            rx,
            pending: 0,
        }
    }

    pub fn session(&self) -> &ReaderSession {
        &self.session
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn parts_mut(&mut self) -> (&ReaderSession, &mut S) {
        (&self.session, &mut self.surface)
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Requests still running on the pool.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn start(&mut self) {
        let effects = self.session.open();
        self.run_effects(effects);
    }

    pub fn dispatch(&mut self, message: Message) {
        let effects = self.session.reduce(message);
        self.run_effects(effects);
    }

    /// Apply every completion that has already arrived. Returns how many.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0usize;
        while let Ok(message) = self.rx.try_recv() {
            self.complete(message);
            applied += 1;
        }
        applied
    }

    /// Block for the next completion. Returns false on timeout.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => {
                self.complete(message);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Download channel closed");
                false
            }
        }
    }

    /// Keep applying completions until no request is outstanding, giving up
    /// when a single wait exceeds `timeout`.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        while self.pending > 0 {
            if !self.wait(timeout) {
                warn!(pending = self.pending, "Timed out waiting for downloads");
                return false;
            }
        }
        true
    }

    fn complete(&mut self, message: Message) {
        self.pending = self.pending.saturating_sub(1);
        self.dispatch(message);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::LoadTableOfContents { book_id } => {
                let client = self.client.clone();
                let tx = self.tx.clone();
                self.pending += 1;
                self.pool.execute(move || {
                    let result = client
                        .table_of_contents(&book_id)
                        .and_then(|value| parse_table_of_contents(&value, &book_id));
                    if tx
                        .send(Message::TableOfContentsLoaded { book_id, result })
                        .is_err()
                    {
                        debug!("Reader closed before table of contents arrived");
                    }
                });
            }
            Effect::DownloadChapters {
                book_id,
                chapter_ids,
            } => {
                let client = self.client.clone();
                let tx = self.tx.clone();
                self.pending += 1;
                self.pool.execute(move || {
                    let result = fetch_chapter_details(&client, &book_id, &chapter_ids);
                    let message = Message::ChaptersDownloaded {
                        book_id,
                        chapter_ids,
                        result,
                    };
                    if tx.send(message).is_err() {
                        debug!("Reader closed before chapter batch arrived");
                    }
                });
            }
            Effect::ReloadAll { scroll } => self.surface.reload_all(&self.session, scroll),
            Effect::ReloadSection(section) => self.surface.reload_section(&self.session, section),
        }
    }
}
