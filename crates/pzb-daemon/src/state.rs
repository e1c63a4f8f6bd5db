//! Shared runtime state for pzb-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The order book (ledger
//! plus the id of the current order cycle) sits behind one async RwLock:
//! mutating commands hold the write lock for the whole upsert/reset; queries
//! hold the read lock only long enough to clone a snapshot and price it
//! unlocked.

use std::sync::Arc;
use std::time::Duration;

use pzb_config::Settings;
use pzb_engine::{
    apply, evaluate, Allocator, Command, EngineError, Ledger, LedgerSnapshot, Outcome, Vocabulary,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BusMsg — SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat {
        ts_millis: i64,
    },
    /// Emitted after every successful mutation.
    LedgerChanged {
        cycle_id: Uuid,
        snapshot: LedgerSnapshot,
    },
    LogLine {
        level: String,
        msg: String,
    },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health / status responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// OrderBook
// ---------------------------------------------------------------------------

/// The one pooled order this process serves.
#[derive(Clone, Debug)]
pub struct OrderBook {
    pub ledger: Ledger,
    /// Fresh on every reset so clients can tell cycles apart.
    pub cycle_id: Uuid,
}

impl OrderBook {
    fn new() -> Self {
        Self {
            ledger: Ledger::new(),
            cycle_id: Uuid::new_v4(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    /// Policy + package size, fixed at boot.
    pub allocator: Allocator,
    pub vocabulary: Vocabulary,
    /// Hash of the effective config (empty when built without one).
    pub config_hash: String,
    pub book: Arc<RwLock<OrderBook>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Allocator::default(), Vocabulary::default(), String::new())
    }
}

impl AppState {
    pub fn new(allocator: Allocator, vocabulary: Vocabulary, config_hash: String) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        Self {
            bus,
            build: BuildInfo {
                service: "pzb-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            allocator,
            vocabulary,
            config_hash,
            book: Arc::new(RwLock::new(OrderBook::new())),
        }
    }

    pub fn from_settings(settings: &Settings, config_hash: String) -> Self {
        Self::new(settings.allocator(), settings.vocabulary(), config_hash)
    }

    /// Run one command with the locking discipline described above.
    pub async fn execute(&self, requester: &str, command: &Command) -> Result<Outcome, EngineError> {
        if !command.is_mutation() {
            let snapshot = self.book.read().await.ledger.snapshot();
            return evaluate(&snapshot, &self.allocator, command);
        }

        let mut book = self.book.write().await;
        let outcome = apply(&mut book.ledger, &self.allocator, requester, command)?;
        if matches!(outcome, Outcome::Reset { .. }) {
            book.cycle_id = Uuid::new_v4();
        }
        let event = BusMsg::LedgerChanged {
            cycle_id: book.cycle_id,
            snapshot: book.ledger.snapshot(),
        };
        drop(book);

        let _ = self.bus.send(event);
        Ok(outcome)
    }

    /// Consistent `(cycle_id, snapshot)` pair.
    pub async fn snapshot(&self) -> (Uuid, LedgerSnapshot) {
        let book = self.book.read().await;
        (book.cycle_id, book.ledger.snapshot())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}
