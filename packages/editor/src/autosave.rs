//! # Autosave Coordinator
//!
//! Decouples edit frequency from save frequency. A tokio task owns the
//! debounce timer and the in-flight save; callers talk to it through a
//! cloneable [`AutosaveHandle`].
//!
//! ```text
//!   AutosaveHandle (Clone)      mpsc       AutosaveActor (tokio task)
//!   ┌─────────────────────┐  ────────▶  ┌──────────────────────────────┐
//!   │ .document_changed() │             │ debounce deadline            │
//!   │ .save_now()         │  ◀────────  │ in-flight save + follow-up   │
//!   │ .close()            │   oneshot   │ LessonStore                  │
//!   └─────────────────────┘             └──────────────────────────────┘
//!              ▲                                       │
//!              └──────────── watch<SaveStatus> ────────┘
//! ```
//!
//! Rules:
//! - every change resets the debounce timer
//! - at most one save is in flight; a trigger during a save queues a single
//!   follow-up that persists the newest snapshot
//! - a failed save keeps the unsaved flag and is not retried on its own

use crate::document::DocumentSnapshot;
use crate::ids::LessonId;
use crate::persistence::{LessonStore, StoredDocument};
use crate::session::ChangeObserver;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutosaveError {
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Autosave coordinator has shut down")]
    Closed,
}

/// Observable save state for UI indicators
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveStatus {
    pub is_saving: bool,
    pub has_unsaved_changes: bool,
    /// Newest version known to be persisted
    pub saved_version: u64,
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Reason of the most recent failed save, cleared by the next success
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { version: u64 },
    /// Nothing newer than the last save
    UpToDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMode {
    /// Persist pending changes before stopping
    Flush,
    /// Stop without saving; the caller accepted the data loss
    DiscardUnsaved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Flushed(SaveOutcome),
    /// `dropped_version` is the newest unsaved version, if any
    Discarded { dropped_version: Option<u64> },
}

type SaveReply = oneshot::Sender<Result<SaveOutcome, AutosaveError>>;
type CloseReply = oneshot::Sender<Result<CloseOutcome, AutosaveError>>;

enum Command {
    Changed(DocumentSnapshot),
    SaveNow { reply: SaveReply },
    Close { mode: CloseMode, reply: CloseReply },
}

// ============================================================================
// Handle
// ============================================================================

/// Handle to a running autosave coordinator
#[derive(Clone)]
pub struct AutosaveHandle {
    lesson_id: LessonId,
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
}

impl AutosaveHandle {
    pub fn lesson_id(&self) -> &LessonId {
        &self.lesson_id
    }

    /// Report a committed change; restarts the debounce timer
    pub fn notify_changed(&self, snapshot: DocumentSnapshot) {
        if self.tx.send(Command::Changed(snapshot)).is_err() {
            tracing::warn!(lesson = %self.lesson_id, "Change reported after autosave shut down");
        }
    }

    /// Save immediately, bypassing the debounce.
    ///
    /// Resolves once every change reported before the call is persisted, or
    /// with the failure of the save that tried.
    pub async fn save_now(&self) -> Result<SaveOutcome, AutosaveError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::SaveNow { reply })
            .map_err(|_| AutosaveError::Closed)?;
        rx.await.map_err(|_| AutosaveError::Closed)?
    }

    /// Stop the coordinator.
    ///
    /// With [`CloseMode::Flush`] a failed final save is returned as an error
    /// and the coordinator keeps running.
    pub async fn close(&self, mode: CloseMode) -> Result<CloseOutcome, AutosaveError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Close { mode, reply })
            .map_err(|_| AutosaveError::Closed)?;
        rx.await.map_err(|_| AutosaveError::Closed)?
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    pub fn is_saving(&self) -> bool {
        self.status.borrow().is_saving
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.status.borrow().has_unsaved_changes
    }

    /// Watch status changes
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl ChangeObserver for AutosaveHandle {
    fn document_changed(&self, snapshot: &DocumentSnapshot) {
        self.notify_changed(snapshot.clone());
    }
}

/// Start a coordinator for one lesson. `saved_version` is the version that
/// is already persisted (the loaded document's version).
pub fn spawn(
    store: Arc<dyn LessonStore>,
    lesson_id: LessonId,
    debounce: Duration,
    saved_version: u64,
) -> AutosaveHandle {
    let (tx, commands) = mpsc::unbounded_channel();
    let (done_tx, done) = mpsc::unbounded_channel();
    let (status_tx, status) = watch::channel(SaveStatus {
        saved_version,
        ..SaveStatus::default()
    });

    let actor = AutosaveActor {
        store,
        lesson_id: lesson_id.clone(),
        debounce,
        latest: None,
        saved_version,
        deadline: None,
        in_flight: None,
        follow_up: false,
        waiters: Vec::new(),
        stopped: false,
        done_tx,
        status: status_tx,
    };

    tracing::debug!(lesson = %lesson_id, ?debounce, "Autosave started");
    tokio::spawn(actor.run(commands, done));

    AutosaveHandle {
        lesson_id,
        tx,
        status,
    }
}

// ============================================================================
// Actor
// ============================================================================

struct SaveDone {
    version: u64,
    result: Result<(), AutosaveError>,
}

enum Reply {
    Save(SaveReply),
    Close(CloseReply),
}

/// Caller waiting for `target` to be persisted
struct Waiter {
    target: u64,
    reply: Reply,
}

struct AutosaveActor {
    store: Arc<dyn LessonStore>,
    lesson_id: LessonId,
    debounce: Duration,

    /// Newest snapshot reported
    latest: Option<DocumentSnapshot>,
    saved_version: u64,

    deadline: Option<Instant>,
    in_flight: Option<u64>,
    follow_up: bool,

    waiters: Vec<Waiter>,
    stopped: bool,

    done_tx: mpsc::UnboundedSender<SaveDone>,
    status: watch::Sender<SaveStatus>,
}

impl AutosaveActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut done: mpsc::UnboundedReceiver<SaveDone>,
    ) {
        loop {
            let deadline = self.deadline;
            let timer = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        self.shutdown(&mut done).await;
                        break;
                    }
                },
                Some(finished) = done.recv() => self.finish_save(finished),
                _ = timer => self.timer_fired(),
            }

            if self.stopped {
                break;
            }
        }

        tracing::debug!(lesson = %self.lesson_id, "Autosave stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Changed(snapshot) => self.changed(snapshot),

            Command::SaveNow { reply } => {
                self.deadline = None;
                self.request_save(Reply::Save(reply));
            }

            Command::Close {
                mode: CloseMode::Flush,
                reply,
            } => {
                self.deadline = None;
                self.request_save(Reply::Close(reply));
            }

            Command::Close {
                mode: CloseMode::DiscardUnsaved,
                reply,
            } => {
                let dropped_version = self.is_dirty().then(|| self.latest_version());
                if let Some(version) = dropped_version {
                    tracing::warn!(
                        lesson = %self.lesson_id,
                        dropped_version = version,
                        saved_version = self.saved_version,
                        "Discarding unsaved lesson changes"
                    );
                }

                let _ = reply.send(Ok(CloseOutcome::Discarded { dropped_version }));
                self.stopped = true;
            }
        }
    }

    fn changed(&mut self, snapshot: DocumentSnapshot) {
        if snapshot.version <= self.latest_version() {
            return;
        }

        self.latest = Some(snapshot);
        self.deadline = Some(Instant::now() + self.debounce);
        self.publish();
    }

    fn timer_fired(&mut self) {
        self.deadline = None;

        if self.in_flight.is_some() {
            tracing::debug!(lesson = %self.lesson_id, "Save in flight, queueing follow-up");
            self.follow_up = true;
        } else {
            self.start_save();
        }
    }

    fn request_save(&mut self, reply: Reply) {
        let target = self.latest_version();

        if target <= self.saved_version && self.in_flight.is_none() {
            self.reply(reply, Ok(SaveOutcome::UpToDate));
            return;
        }

        self.waiters.push(Waiter { target, reply });

        match self.in_flight {
            Some(version) if version >= target => {}
            Some(_) => self.follow_up = true,
            None => self.start_save(),
        }
    }

    fn start_save(&mut self) {
        let pending = self
            .latest
            .as_ref()
            .filter(|snapshot| snapshot.version > self.saved_version)
            .map(|snapshot| (snapshot.version, StoredDocument::from(snapshot)));

        let Some((version, document)) = pending else {
            self.settle(u64::MAX, Ok(SaveOutcome::UpToDate));
            return;
        };

        self.in_flight = Some(version);
        self.publish();

        let store = self.store.clone();
        let lesson_id = self.lesson_id.clone();
        let done = self.done_tx.clone();

        tokio::spawn(async move {
            let result = store
                .save_document(&lesson_id, &document)
                .await
                .map_err(|e| AutosaveError::PersistenceFailure(e.to_string()));
            let _ = done.send(SaveDone { version, result });
        });
    }

    fn finish_save(&mut self, finished: SaveDone) {
        self.in_flight = None;
        let version = finished.version;

        match &finished.result {
            Ok(()) => {
                self.saved_version = self.saved_version.max(version);
                self.status.send_modify(|status| {
                    status.last_saved_at = Some(Utc::now());
                    status.last_error = None;
                });
                tracing::info!(lesson = %self.lesson_id, version, "Lesson saved");
            }
            Err(e) => {
                let reason = e.to_string();
                self.status.send_modify(|status| status.last_error = Some(reason));
                tracing::error!(
                    lesson = %self.lesson_id,
                    version,
                    error = %e,
                    "Lesson save failed"
                );
            }
        }

        let outcome = finished.result.map(|()| SaveOutcome::Saved { version });
        self.settle(version, outcome);

        if std::mem::take(&mut self.follow_up) || !self.waiters.is_empty() {
            self.start_save();
        }
        self.publish();
    }

    /// Final attempt once every handle is gone
    async fn shutdown(&mut self, done: &mut mpsc::UnboundedReceiver<SaveDone>) {
        while self.in_flight.is_some() {
            match done.recv().await {
                Some(finished) => self.finish_save(finished),
                None => break,
            }
        }

        if !self.is_dirty() {
            return;
        }

        if let Some(snapshot) = &self.latest {
            let version = snapshot.version;
            match self
                .store
                .save_document(&self.lesson_id, &StoredDocument::from(snapshot))
                .await
            {
                Ok(()) => {
                    tracing::info!(lesson = %self.lesson_id, version, "Lesson saved on shutdown")
                }
                Err(e) => tracing::error!(
                    lesson = %self.lesson_id,
                    version,
                    error = %e,
                    "Unsaved lesson changes lost on shutdown"
                ),
            }
        }
    }

    /// Answer every waiter whose target is covered by `version`
    fn settle(&mut self, version: u64, result: Result<SaveOutcome, AutosaveError>) {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.waiters)
            .into_iter()
            .partition(|waiter| waiter.target <= version);
        self.waiters = waiting;

        for waiter in ready {
            self.reply(waiter.reply, result.clone());
        }
    }

    fn reply(&mut self, reply: Reply, result: Result<SaveOutcome, AutosaveError>) {
        match reply {
            Reply::Save(reply) => {
                let _ = reply.send(result);
            }
            Reply::Close(reply) => {
                if result.is_ok() {
                    self.stopped = true;
                }
                let _ = reply.send(result.map(CloseOutcome::Flushed));
            }
        }
    }

    fn latest_version(&self) -> u64 {
        self.latest
            .as_ref()
            .map_or(self.saved_version, |snapshot| snapshot.version)
    }

    fn is_dirty(&self) -> bool {
        self.latest_version() > self.saved_version
    }

    fn publish(&self) {
        let is_saving = self.in_flight.is_some();
        let has_unsaved_changes = self.is_dirty();
        let saved_version = self.saved_version;

        self.status.send_if_modified(|status| {
            let changed = status.is_saving != is_saving
                || status.has_unsaved_changes != has_unsaved_changes
                || status.saved_version != saved_version;
            status.is_saving = is_saving;
            status.has_unsaved_changes = has_unsaved_changes;
            status.saved_version = saved_version;
            changed
        });
    }
}
