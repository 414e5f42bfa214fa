use std::time::Duration;

use tracing::info;

/// What a stat event broadcasts to watchers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnapshotMode {
    /// Every layer of the statline
    #[default]
    Full,
    /// Only the stats depending on the changed primitive
    Affected,
}

/// Timing and sizing knobs shared by every hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// How long a keeper may stay silent before its read times out
    pub pong_wait: Duration,
    pub ping_period: Duration,
    pub write_wait: Duration,
    /// Largest inbound frame a keeper may send, in bytes
    pub max_message_size: usize,
    pub watcher_queue: usize,
    pub event_capacity: usize,
    pub clock_tick: Duration,
    pub db_timeout: Duration,
    pub snapshot_mode: SnapshotMode,
}

impl Default for HubConfig {
    fn default() -> Self {
        let pong_wait = Duration::from_secs(60);
        Self {
            pong_wait,
            ping_period: pong_wait * 9 / 10,
            write_wait: Duration::from_secs(10),
            max_message_size: 512,
            watcher_queue: 256,
            event_capacity: 64,
            clock_tick: Duration::from_secs(1),
            db_timeout: Duration::from_secs(3),
            snapshot_mode: SnapshotMode::Full,
        }
    }
}

impl HubConfig {
    /// Sets the pong wait and derives the ping period from it.
    pub fn with_pong_wait(mut self, pong_wait: Duration) -> Self {
        self.pong_wait = pong_wait;
        self.ping_period = pong_wait * 9 / 10;
        self
    }

    pub fn with_watcher_queue(mut self, capacity: usize) -> Self {
        self.watcher_queue = capacity;
        self
    }

    pub fn with_snapshot_mode(mut self, mode: SnapshotMode) -> Self {
        self.snapshot_mode = mode;
        self
    }

    pub fn with_db_timeout(mut self, timeout: Duration) -> Self {
        self.db_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub hub: HubConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        info!(
            bind_addr = %bind_addr,
            database = database_url.is_some(),
            "Loaded server configuration"
        );

        Self {
            bind_addr,
            database_url,
            hub: HubConfig::default(),
        }
    }
}
