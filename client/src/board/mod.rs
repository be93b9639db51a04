pub mod columns;
pub mod poller;
pub mod summary;

pub use columns::{BoardColumns, InvalidMove, Move};
pub use poller::PollingScheduler;
pub use summary::BoardSummary;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use shared::types::{Board, Detail, SyncConfig};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::gateway::RequestGateway;

// ---------------------------------------------------------------------------
// Published state
// ---------------------------------------------------------------------------

/// What the kanban view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    pub board: Option<i64>,
    pub columns: BoardColumns,
    /// Generation of the selected board when this snapshot was taken.
    pub generation: u64,
    pub loading: bool,
    pub last_error: Option<String>,
}

/// What happened to a fetched item set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Became the current projection.
    Applied,
    /// A newer load or move was dispatched meanwhile; dropped.
    Stale,
    /// The board is no longer selected; dropped.
    Detached,
}

#[derive(Debug, Default)]
struct BoardTrack {
    generation: u64,
    loads_in_flight: usize,
    moves_in_flight: usize,
    resync_pending: bool,
}

#[derive(Debug, Default)]
struct EngineState {
    selected: Option<i64>,
    columns: BoardColumns,
    last_error: Option<String>,
    tracks: HashMap<i64, BoardTrack>,
}

impl EngineState {
    fn track(&mut self, board: i64) -> &mut BoardTrack {
        self.tracks.entry(board).or_default()
    }

    fn is_selected(&self, board: i64) -> bool {
        self.selected == Some(board)
    }

    fn snapshot(&self) -> BoardSnapshot {
        let track = self.selected.and_then(|board| self.tracks.get(&board));
        BoardSnapshot {
            board: self.selected,
            columns: self.columns.clone(),
            generation: track.map_or(0, |t| t.generation),
            loading: track.is_some_and(|t| t.loads_in_flight > 0),
            last_error: self.last_error.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// BoardSyncEngine
// ---------------------------------------------------------------------------

/// Kanban state for the selected board.
///
/// Moves are applied locally before the request is sent; a failed move is
/// compensated by reloading the board. Every load dispatch and every
/// optimistic move takes a new per-board generation, and a load result is
/// only applied if no newer generation was taken while it was in flight.
#[derive(Clone)]
pub struct BoardSyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    gateway: RequestGateway,
    poll_interval: Duration,
    state: Mutex<EngineState>,
    snapshots: watch::Sender<BoardSnapshot>,
    poller: Mutex<Option<PollingScheduler>>,
}

impl BoardSyncEngine {
    pub fn new(gateway: RequestGateway, poll_interval: Duration) -> Self {
        let (snapshots, _) = watch::channel(BoardSnapshot::default());
        Self {
            inner: Arc::new(EngineInner {
                gateway,
                poll_interval,
                state: Mutex::new(EngineState::default()),
                snapshots,
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn from_config(gateway: RequestGateway, config: &SyncConfig) -> Self {
        Self::new(gateway, config.poll_interval())
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.inner.gateway
    }

    pub fn selected(&self) -> Option<i64> {
        self.state().selected
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.state().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn summary(&self) -> BoardSummary {
        BoardSummary::from_items(self.state().columns.items())
    }

    pub fn is_polling(&self) -> bool {
        self.poller().as_ref().is_some_and(PollingScheduler::is_running)
    }

    /// The first board the caller can see, which the views open by default.
    pub async fn first_board(&self) -> ClientResult<Option<Board>> {
        Ok(self.inner.gateway.list_boards().await?.into_iter().next())
    }

    // -----------------------------------------------------------------------
    // View lifecycle
    // -----------------------------------------------------------------------

    /// Select `board`, load it, and poll it when the principal cannot move
    /// items (elevated principals see their own moves immediately).
    pub async fn activate(&self, board: i64) -> ClientResult<LoadOutcome> {
        self.select(board);

        if self.inner.gateway.session().is_elevated() {
            self.stop_polling();
        } else {
            self.start_polling(board);
        }

        self.fetch(board).await
    }

    /// Stop polling and forget the selection; late responses are dropped.
    pub fn deactivate(&self) {
        self.stop_polling();
        let mut state = self.state();
        if let Some(board) = state.selected.take() {
            info!("Board {} deactivated", board);
        }
        state.columns = BoardColumns::default();
        state.last_error = None;
        self.publish(&state);
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Select `board` and replace the projection with the server's items.
    pub async fn load(&self, board: i64) -> ClientResult<LoadOutcome> {
        self.select(board);
        self.fetch(board).await
    }

    /// Apply `mv` locally, then ask the server to change the item's status.
    ///
    /// On failure the board is reloaded (once no other move on it is still
    /// in flight) and `SyncConflict` is returned. A load that came back while
    /// moves were in flight is also redone once the last one settles.
    pub async fn move_item(&self, mv: Move) -> ClientResult<()> {
        if mv.is_noop() {
            debug!("Move of item {} is a no-op", mv.item_id);
            return Ok(());
        }
        let session = self.inner.gateway.session();
        if !session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        if !session.is_elevated() {
            warn!("Move of item {} refused: not an administrator", mv.item_id);
            return Err(ClientError::Forbidden(
                "only administrators can move feedback".into(),
            ));
        }

        let board = {
            let mut state = self.state();
            let board = state.selected.ok_or(InvalidMove::NoBoardSelected)?;
            state.columns.apply_move(&mv)?;
            let track = state.track(board);
            track.generation += 1;
            track.moves_in_flight += 1;
            self.publish(&state);
            board
        };
        info!(
            "Item {} moved to {} at {} (pending)",
            mv.item_id,
            mv.to.as_str(),
            mv.to_index
        );

        let result = self.inner.gateway.move_feedback(mv.item_id, mv.to).await;

        let resync_now = {
            let mut state = self.state();
            let track = state.track(board);
            track.moves_in_flight = track.moves_in_flight.saturating_sub(1);
            if result.is_err() {
                track.resync_pending = true;
            }
            let due = track.resync_pending && track.moves_in_flight == 0;
            if due {
                track.resync_pending = false;
            } else if track.resync_pending {
                debug!(
                    "Resync of board {} deferred; {} moves in flight",
                    board, track.moves_in_flight
                );
            }
            due
        };

        if resync_now {
            info!("Resyncing board {} after its moves settled", board);
            if let Err(e) = self.fetch(board).await {
                warn!("Resync of board {} failed: {}", board, e);
            }
        }

        match result {
            Ok(response) => {
                debug!("Move of item {} confirmed: {}", mv.item_id, response.detail);
                Ok(())
            }
            Err(e) if e.is_auth() => Err(e),
            Err(e) => {
                warn!("Move of item {} failed: {}", mv.item_id, e);
                Err(ClientError::SyncConflict {
                    board,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Toggle the caller's upvote on `item`, then reload the selected board.
    pub async fn upvote(&self, item: i64) -> ClientResult<Detail> {
        let detail = self.inner.gateway.upvote(item).await?;
        if let Some(board) = self.selected() {
            if let Err(e) = self.fetch(board).await {
                warn!("Reload after upvote failed: {}", e);
            }
        }
        Ok(detail)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn select(&self, board: i64) {
        let mut state = self.state();
        if !state.is_selected(board) {
            info!("Board {} selected", board);
            state.selected = Some(board);
            state.columns = BoardColumns::default();
            state.last_error = None;
            self.publish(&state);
        }
    }

    async fn fetch(&self, board: i64) -> ClientResult<LoadOutcome> {
        let generation = {
            let mut state = self.state();
            if !state.is_selected(board) {
                return Ok(LoadOutcome::Detached);
            }
            let track = state.track(board);
            track.generation += 1;
            track.loads_in_flight += 1;
            let generation = track.generation;
            self.publish(&state);
            generation
        };

        let result = self.inner.gateway.board_feedback(board).await;

        let mut state = self.state();
        let selected = state.is_selected(board);
        let track = state.track(board);
        track.loads_in_flight = track.loads_in_flight.saturating_sub(1);
        let current = track.generation == generation;
        let moves_in_flight = track.moves_in_flight;
        if selected && moves_in_flight > 0 {
            // Server data predating a pending move; reload once it settles.
            track.resync_pending = true;
        }

        let outcome = if !selected {
            debug!("Dropping items for board {}: no longer selected", board);
            Ok(LoadOutcome::Detached)
        } else if moves_in_flight > 0 {
            debug!(
                "Dropping load of board {}: {} moves in flight",
                board, moves_in_flight
            );
            Ok(LoadOutcome::Stale)
        } else if !current {
            debug!(
                "Dropping stale load of board {} (generation {})",
                board, generation
            );
            Ok(LoadOutcome::Stale)
        } else {
            match result {
                Ok(items) => {
                    debug!("Board {} loaded: {} items", board, items.len());
                    state.columns = BoardColumns::partition(items);
                    state.last_error = None;
                    Ok(LoadOutcome::Applied)
                }
                Err(e) => {
                    state.last_error = Some(e.to_string());
                    Err(e)
                }
            }
        };

        self.publish(&state);
        outcome
    }

    fn start_polling(&self, board: i64) {
        let weak = Arc::downgrade(&self.inner);
        let scheduler = PollingScheduler::start(self.inner.poll_interval, move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    BoardSyncEngine { inner }.poll(board).await;
                }
            }
        });
        info!(
            "Polling board {} every {:?}",
            board, self.inner.poll_interval
        );
        *self.poller() = Some(scheduler);
    }

    fn stop_polling(&self) {
        if let Some(scheduler) = self.poller().take() {
            scheduler.stop();
            debug!("Polling stopped");
        }
    }

    async fn poll(&self, board: i64) {
        match self.fetch(board).await {
            Ok(outcome) => debug!("Poll of board {}: {:?}", board, outcome),
            Err(e) if e.is_auth() => {
                warn!("Polling stopped: {}", e);
                self.stop_polling();
            }
            Err(e) => warn!("Poll of board {} failed: {}", board, e),
        }
    }

    fn publish(&self, state: &EngineState) {
        self.inner.snapshots.send_replace(state.snapshot());
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn poller(&self) -> MutexGuard<'_, Option<PollingScheduler>> {
        self.inner
            .poller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
