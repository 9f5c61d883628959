//! Background owner of the search index.
//!
//! Index loads and rebuilds run on a detached task so request handling never
//! waits on the filesystem walk. Handlers enqueue commands and read the
//! current index; progress is published on a `watch` channel.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{error, info, warn};

use super::index::{SearchIndex, SearchResults};
use crate::data::FileLister;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IndexState {
    Idle,
    Loading,
    Building,
    Ready { documents: usize, terms: usize },
    Failed { message: String },
}

impl IndexState {
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            IndexState::Idle | IndexState::Ready { .. } | IndexState::Failed { .. }
        )
    }
}

#[derive(Debug)]
enum IndexCommand {
    Load { build: bool },
    Build,
}

#[derive(Clone)]
pub struct IndexWorker {
    index: Arc<RwLock<SearchIndex>>,
    commands: mpsc::UnboundedSender<IndexCommand>,
    state: watch::Receiver<IndexState>,
    /// Commands queued or running; the state is only final once this is zero.
    pending: Arc<AtomicUsize>,
}

impl IndexWorker {
    /// Start the worker task. Must be called inside a tokio runtime.
    pub fn spawn(files: FileLister, local_md_dir: &Path) -> Self {
        let index = Arc::new(RwLock::new(SearchIndex::default()));
        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(IndexState::Idle);

        let pending = Arc::new(AtomicUsize::new(0));

        let path = SearchIndex::index_path(local_md_dir);
        tokio::spawn(run(
            rx,
            index.clone(),
            state_tx,
            pending.clone(),
            files,
            path,
        ));

        Self {
            index,
            commands,
            state,
            pending,
        }
    }

    /// Load the persisted index, building it when missing and `build` is set.
    pub fn load_index(&self, build: bool) {
        self.send(IndexCommand::Load { build });
    }

    /// Queue a full rebuild.
    pub fn build_index(&self) {
        self.send(IndexCommand::Build);
    }

    pub async fn lookup(&self, term: &str) -> SearchResults {
        self.index.read().await.lookup(term)
    }

    pub fn state(&self) -> IndexState {
        self.state.borrow().clone()
    }

    /// Wait until no load or build is queued or in flight.
    pub async fn settled(&self) -> IndexState {
        let mut rx = self.state.clone();
        let pending = self.pending.clone();
        let result = rx
            .wait_for(|s| s.is_settled() && pending.load(Ordering::SeqCst) == 0)
            .await
            .map(|state| state.clone());
        result.unwrap_or_else(|_| self.state())
    }

    fn send(&self, command: IndexCommand) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.commands.send(command) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!("Search index worker is not running: {:?}", e.0);
        }
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<IndexCommand>,
    index: Arc<RwLock<SearchIndex>>,
    state: watch::Sender<IndexState>,
    pending: Arc<AtomicUsize>,
    files: FileLister,
    path: PathBuf,
) {
    while let Some(command) = rx.recv().await {
        let files = files.clone();
        let task_path = path.clone();

        let result = match command {
            IndexCommand::Load { build } => {
                state.send_replace(IndexState::Loading);
                tokio::task::spawn_blocking(move || load_or_build(&files, &task_path, build)).await
            }
            IndexCommand::Build => {
                state.send_replace(IndexState::Building);
                tokio::task::spawn_blocking(move || build_and_save(&files, &task_path).map(Some))
                    .await
            }
        };

        let next = match result {
            Ok(Ok(Some(new_index))) => {
                let ready = IndexState::Ready {
                    documents: new_index.documents(),
                    terms: new_index.term_count(),
                };
                *index.write().await = new_index;
                ready
            }
            Ok(Ok(None)) => IndexState::Idle,
            Ok(Err(e)) => {
                error!("Search index failed: {:#}", e);
                IndexState::Failed {
                    message: e.to_string(),
                }
            }
            Err(e) => {
                error!("Search index task panicked: {}", e);
                IndexState::Failed {
                    message: e.to_string(),
                }
            }
        };
        pending.fetch_sub(1, Ordering::SeqCst);
        state.send_replace(next);
    }
}

fn load_or_build(files: &FileLister, path: &Path, build: bool) -> Result<Option<SearchIndex>> {
    match SearchIndex::load(path) {
        Ok(Some(index)) => {
            info!("Loaded search index from {}", path.display());
            return Ok(Some(index));
        }
        Ok(None) => {}
        Err(e) => warn!("Discarding search index: {:#}", e),
    }

    if !build {
        return Ok(None);
    }
    build_and_save(files, path).map(Some)
}

fn build_and_save(files: &FileLister, path: &Path) -> Result<SearchIndex> {
    info!("Building search index for {}", files.root().display());
    let index = SearchIndex::build(files);
    index.save(path)?;
    Ok(index)
}
