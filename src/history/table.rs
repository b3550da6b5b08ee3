//! One peer's replica of a table and the transactional action wrapper.
//!
//! ## Operation
//!
//! Every mutation goes through `Table::operate`. It runs the mutator on a
//! clone of the board (O(1) with `im`), re-indexes, turns the staged log
//! entries into `LogRecord`s, updates the undo/redo stacks according to
//! the operation's `UndoMode`, and forwards the new board plus appended
//! log lines to the attached channel. A mutator error discards the
//! clone, so nothing is committed.
//!
//! ## History
//!
//! `past` holds the boards before each undoable action (bounded by
//! `BoardConfig::history_limit`), `future` the boards undone since the
//! last new action. History is local to the peer and never synchronized.

use std::collections::VecDeque;

use im::Vector;
use tracing::{debug, info, instrument, warn};

use crate::core::{
    Board, BoardConfig, BoardError, BoardHistoryItem, GameRng, HistoryDirection, LogEntry, LogRecord,
    LogVisibility, PlayerSide, Result, SheetSide,
};
use crate::sync::{SyncChannel, SyncMessage, TableId};
use crate::zones::reindex;

/// Log line appended when an action is undone.
pub const UNDO_LOG: &str = "Undid the previous action";

/// How an operation interacts with the undo history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UndoMode {
    /// Recorded; can be undone.
    #[default]
    Undoable,
    /// Reveals information: clears both stacks.
    Irreversible,
    /// Bookkeeping outside the history (player names).
    Untracked,
}

/// Describes an action before it runs: undo mode and initial log lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Operation {
    pub undo_mode: UndoMode,
    pub logs: Vec<LogEntry>,
}

impl Operation {
    #[must_use]
    pub fn undoable() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn irreversible() -> Self {
        Self {
            undo_mode: UndoMode::Irreversible,
            logs: Vec::new(),
        }
    }

    #[must_use]
    pub fn untracked() -> Self {
        Self {
            undo_mode: UndoMode::Untracked,
            logs: Vec::new(),
        }
    }

    /// Add a log line shown to everyone.
    #[must_use]
    pub fn log(mut self, entry: impl Into<LogEntry>) -> Self {
        self.logs.push(entry.into());
        self
    }

    #[must_use]
    pub fn log_with(mut self, text: impl Into<String>, visibility: LogVisibility) -> Self {
        self.logs.push(LogEntry::new(text, visibility));
        self
    }
}

/// What a mutator sees while an operation runs.
pub struct ActionContext<'a> {
    pub board: &'a mut Board,
    pub rng: &'a mut GameRng,
    pub config: &'a BoardConfig,
    side: SheetSide,
    logs: &'a mut Vec<LogEntry>,
}

impl ActionContext<'_> {
    /// Seat of the peer running the action.
    #[must_use]
    pub fn side(&self) -> SheetSide {
        self.side
    }

    /// The acting player.
    ///
    /// # Errors
    ///
    /// [`BoardError::ForbiddenOperation`] for watchers.
    pub fn acting_side(&self) -> Result<PlayerSide> {
        self.side
            .player()
            .ok_or_else(|| BoardError::forbidden("Forbidden operation for watcher"))
    }

    /// Append a log line shown to everyone.
    pub fn log(&mut self, entry: impl Into<LogEntry>) {
        self.logs.push(entry.into());
    }

    /// Append a log line only the acting side can read.
    pub fn log_owner_only(&mut self, text: impl Into<String>) {
        self.logs.push(LogEntry::new(text, LogVisibility::OwnerOnly));
    }
}

/// A peer's local replica of one table.
pub struct Table {
    table_id: TableId,
    side: SheetSide,
    board: Board,
    action_log: Vector<LogRecord>,
    past: VecDeque<BoardHistoryItem>,
    future: Vec<BoardHistoryItem>,
    config: BoardConfig,
    rng: GameRng,
    channel: Option<Box<dyn SyncChannel + Send>>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("table_id", &self.table_id)
            .field("side", &self.side)
            .field("objects", &self.board.objects.len())
            .field("log_len", &self.action_log.len())
            .field("past", &self.past.len())
            .field("future", &self.future.len())
            .field("connected", &self.channel.is_some())
            .finish()
    }
}

impl Table {
    /// Create a replica with an empty board and an entropy-seeded RNG.
    #[must_use]
    pub fn new(table_id: TableId, side: SheetSide, config: BoardConfig) -> Self {
        Self {
            table_id,
            side,
            board: Board::new(),
            action_log: Vector::new(),
            past: VecDeque::new(),
            future: Vec::new(),
            config,
            rng: GameRng::from_entropy(),
            channel: None,
        }
    }

    /// Use a seeded RNG (tests, replays).
    #[must_use]
    pub fn with_rng(mut self, rng: GameRng) -> Self {
        self.rng = rng;
        self
    }

    /// Start from an existing board, e.g. the snapshot returned on join.
    #[must_use]
    pub fn with_board(mut self, board: Board) -> Self {
        self.board = board;
        reindex(&mut self.board);
        self
    }

    /// Forward every committed action to `channel`.
    #[must_use]
    pub fn with_channel(mut self, channel: impl SyncChannel + Send + 'static) -> Self {
        self.channel = Some(Box::new(channel));
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    #[must_use]
    pub fn side(&self) -> SheetSide {
        self.side
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[must_use]
    pub fn action_log(&self) -> &Vector<LogRecord> {
        &self.action_log
    }

    /// Log lines this peer's seat may read.
    pub fn visible_log(&self) -> impl Iterator<Item = &LogRecord> {
        let reader = self.side;
        self.action_log.iter().filter(move |r| r.visible_to(reader))
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    // === Actions ===

    /// Run `mutator` as one atomic action.
    ///
    /// # Errors
    ///
    /// - [`BoardError::ForbiddenOperation`] for watchers, whatever the undo mode.
    /// - Any error returned by `mutator`; the table is left unchanged.
    #[instrument(skip(self, operation, mutator), fields(side = %self.side, mode = ?operation.undo_mode))]
    pub fn operate<T, F>(&mut self, operation: Operation, mutator: F) -> Result<T>
    where
        F: FnOnce(&mut ActionContext<'_>) -> Result<T>,
    {
        let Operation { undo_mode, mut logs } = operation;
        if self.side.is_watcher() {
            return Err(BoardError::forbidden("Forbidden operation for watcher"));
        }

        let mut board = self.board.clone();
        let mut rng = self.rng.clone();
        let value = {
            let mut ctx = ActionContext {
                board: &mut board,
                rng: &mut rng,
                config: &self.config,
                side: self.side,
                logs: &mut logs,
            };
            mutator(&mut ctx).inspect_err(|err| debug!(error = %err, "Action rejected"))?
        };
        reindex(&mut board);

        let appended: Vector<LogRecord> = logs.into_iter().map(|entry| self.record(entry)).collect();

        match undo_mode {
            UndoMode::Undoable => {
                let prior = std::mem::replace(&mut self.board, board);
                self.push_past(BoardHistoryItem {
                    board: prior,
                    appended_logs: appended.clone(),
                });
                self.future.clear();
            }
            UndoMode::Irreversible => {
                self.board = board;
                self.past.clear();
                self.future.clear();
            }
            UndoMode::Untracked => {
                self.board = board;
            }
        }
        self.rng = rng;
        self.action_log.append(appended.clone());

        debug!(logs = appended.len(), "Action committed");
        self.broadcast(appended);
        Ok(value)
    }

    /// Restore the board before the last undoable action.
    ///
    /// # Errors
    ///
    /// - [`BoardError::ForbiddenOperation`] for watchers.
    /// - [`BoardError::EmptyHistory`] if there is nothing to undo.
    #[instrument(skip(self), fields(side = %self.side))]
    pub fn undo(&mut self) -> Result<()> {
        if self.side.is_watcher() {
            return Err(BoardError::forbidden("Forbidden operation for watcher"));
        }
        let item = self.past.pop_back().ok_or(BoardError::EmptyHistory {
            direction: HistoryDirection::Undo,
        })?;

        let current = std::mem::replace(&mut self.board, item.board);
        self.future.push(BoardHistoryItem {
            board: current,
            appended_logs: item.appended_logs,
        });

        let record = self.record(LogEntry::from(UNDO_LOG));
        self.action_log.push_back(record.clone());
        info!("Undid action");
        self.broadcast(Vector::unit(record));
        Ok(())
    }

    /// Re-apply the last undone action.
    ///
    /// # Errors
    ///
    /// - [`BoardError::ForbiddenOperation`] for watchers.
    /// - [`BoardError::EmptyHistory`] if there is nothing to redo.
    #[instrument(skip(self), fields(side = %self.side))]
    pub fn redo(&mut self) -> Result<()> {
        if self.side.is_watcher() {
            return Err(BoardError::forbidden("Forbidden operation for watcher"));
        }
        let item = self.future.pop().ok_or(BoardError::EmptyHistory {
            direction: HistoryDirection::Redo,
        })?;

        let current = std::mem::replace(&mut self.board, item.board);
        self.push_past(BoardHistoryItem {
            board: current,
            appended_logs: item.appended_logs.clone(),
        });

        let replayed: Vector<LogRecord> = item
            .appended_logs
            .iter()
            .map(|r| self.record(LogEntry::new(r.body.clone(), r.visibility)))
            .collect();
        self.action_log.append(replayed.clone());
        info!(logs = replayed.len(), "Redid action");
        self.broadcast(replayed);
        Ok(())
    }

    /// Apply a board update received from another peer.
    ///
    /// Replaces the board and appends the sender's log lines. Local
    /// undo/redo stacks are left as they are.
    ///
    /// # Errors
    ///
    /// [`BoardError::UnknownTable`] if the message belongs to another table.
    #[instrument(skip(self, message), fields(from = %message.side))]
    pub fn receive(&mut self, message: SyncMessage) -> Result<()> {
        if message.table_id != self.table_id {
            warn!(got = %message.table_id, "Ignoring update for another table");
            return Err(BoardError::UnknownTable {
                table_id: message.table_id.to_string(),
            });
        }

        self.board = message.board;
        reindex(&mut self.board);
        self.action_log.append(message.appended_action_logs);
        debug!("Applied peer update");
        Ok(())
    }

    fn record(&self, entry: LogEntry) -> LogRecord {
        LogRecord::new(entry.text, Some(self.side), entry.visibility)
    }

    fn push_past(&mut self, item: BoardHistoryItem) {
        self.past.push_back(item);
        while self.past.len() > self.config.history_limit {
            self.past.pop_front();
        }
    }

    fn broadcast(&mut self, appended: Vector<LogRecord>) {
        if let Some(channel) = self.channel.as_mut() {
            channel.send(SyncMessage {
                table_id: self.table_id.clone(),
                side: self.side,
                board: self.board.clone(),
                appended_action_logs: appended,
            });
        }
    }
}
