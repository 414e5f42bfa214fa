use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::{ClockControl, ClockEvent, GameClock};
use crate::config::{HubConfig, SnapshotMode};
use crate::stats::{GameStatline, StatlineSnapshot};

use super::errors::HubError;
use super::events::{ClockCommand, GameEvent, StatEvent};
use super::keeper::{Keeper, KeeperHandle, KeeperOutlets};
use super::models::{LiveGame, UserId};
use super::socket::{FrameSink, FrameStream};
use super::watcher::{Watcher, WatcherHandle};

const MEMBERSHIP_CAPACITY: usize = 16;
const ERROR_CAPACITY: usize = 16;
const BROADCAST_CAPACITY: usize = 16;

/// Membership changes and queries, handled only by the hub's main loop.
#[derive(Debug)]
pub(crate) enum Membership {
    JoinWatcher(WatcherHandle),
    LeaveWatcher(Uuid),
    JoinKeeper(KeeperHandle),
    LeaveKeeper(Uuid),
    Inspect(oneshot::Sender<MembershipView>),
}

/// Who is connected to a hub right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipView {
    pub watchers: usize,
    /// User ids of connected keepers, sorted
    pub keepers: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HubSummary {
    pub pin: String,
    pub owner_id: UserId,
    pub timed: bool,
    pub started_at: DateTime<Utc>,
}

/// Handle to a running game hub. Cloning shares the same hub.
#[derive(Debug, Clone)]
pub struct Hub {
    id: Uuid,
    pin: String,
    owner_id: UserId,
    timed: bool,
    started_at: DateTime<Utc>,
    allowed_keepers: Arc<HashSet<UserId>>,
    config: HubConfig,
    events: mpsc::Sender<GameEvent>,
    errors: mpsc::Sender<HubError>,
    membership: mpsc::Sender<Membership>,
    terminated: watch::Receiver<Option<String>>,
}

impl Hub {
    /// Builds the statline and clock for `game` and starts the main loop.
    pub fn start(game: LiveGame, config: HubConfig) -> Result<Hub, HubError> {
        let statline = GameStatline::new(
            &game.home_player_pins,
            &game.away_player_pins,
            game.blueprint,
        )?;

        let (clock, clock_events) = if game.is_timed() {
            let settings = game.clock_settings().with_tick(config.clock_tick);
            let (clock, events) = GameClock::spawn(settings);
            (Some(clock), Some(events))
        } else {
            (None, None)
        };

        let (events_tx, events_rx) = mpsc::channel(config.event_capacity.max(1));
        let (errors_tx, errors_rx) = mpsc::channel(ERROR_CAPACITY);
        let (membership_tx, membership_rx) = mpsc::channel(MEMBERSHIP_CAPACITY);
        let (broadcasts_tx, broadcasts_rx) = mpsc::channel(BROADCAST_CAPACITY);
        let (terminated_tx, terminated_rx) = watch::channel(None);

        let allowed_keepers = Arc::new(game.allowed_keepers.clone());
        let timed = game.is_timed();

        let main_loop = HubLoop {
            pin: game.pin.clone(),
            allowed_keepers: allowed_keepers.clone(),
            statline,
            clock,
            snapshot_mode: config.snapshot_mode,
            watchers: HashMap::new(),
            keepers: HashMap::new(),
        };
        tokio::spawn(main_loop.run(HubChannels {
            events: events_rx,
            errors: errors_rx,
            membership: membership_rx,
            broadcasts: broadcasts_rx,
            terminated: terminated_tx,
        }));

        if let Some(clock_events) = clock_events {
            tokio::spawn(pump_clock(
                game.pin.clone(),
                clock_events,
                broadcasts_tx,
                terminated_rx.clone(),
            ));
        }

        info!(
            game_pin = %game.pin,
            owner_id = game.owner_id,
            blueprint = %game.blueprint,
            timed,
            "Hub started"
        );

        Ok(Hub {
            id: Uuid::new_v4(),
            pin: game.pin,
            owner_id: game.owner_id,
            timed,
            started_at: Utc::now(),
            allowed_keepers,
            config,
            events: events_tx,
            errors: errors_tx,
            membership: membership_tx,
            terminated: terminated_rx,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn is_authorized(&self, user_id: UserId) -> bool {
        self.allowed_keepers.contains(&user_id)
    }

    pub fn summary(&self) -> HubSummary {
        HubSummary {
            pin: self.pin.clone(),
            owner_id: self.owner_id,
            timed: self.timed,
            started_at: self.started_at,
        }
    }

    /// Registers a watcher and starts writing to `sink`.
    pub async fn join_watcher<S>(&self, sink: S) -> Result<Uuid, HubError>
    where
        S: FrameSink + 'static,
    {
        let (handle, watcher) = Watcher::new(&self.pin, &self.config);
        let id = handle.id;

        self.membership
            .send(Membership::JoinWatcher(handle))
            .await
            .map_err(|_| HubError::HubClosed)?;
        tokio::spawn(watcher.run(sink, self.membership.clone()));

        info!(game_pin = %self.pin, watcher_id = %id, "Watcher joined");
        Ok(id)
    }

    /// Registers a keeper for `user_id` and starts its read and write workers.
    pub async fn join_keeper<S, R>(&self, user_id: UserId, sink: S, stream: R) -> Result<Uuid, HubError>
    where
        S: FrameSink + 'static,
        R: FrameStream + 'static,
    {
        if !self.is_authorized(user_id) {
            warn!(game_pin = %self.pin, user_id, "Keeper not authorized");
            return Err(HubError::KeeperNotAuthorized(user_id));
        }

        let (handle, keeper) = Keeper::new(&self.pin, user_id, &self.config);
        let id = handle.id;

        self.membership
            .send(Membership::JoinKeeper(handle))
            .await
            .map_err(|_| HubError::HubClosed)?;
        keeper.spawn(
            sink,
            stream,
            KeeperOutlets {
                events: self.events.clone(),
                errors: self.errors.clone(),
                membership: self.membership.clone(),
            },
        );

        info!(game_pin = %self.pin, keeper_id = %id, user_id, "Keeper joined");
        Ok(id)
    }

    /// Closes every connection with a normal "game ended" reason.
    pub async fn end(&self) -> Result<(), HubError> {
        self.errors
            .send(HubError::Ended)
            .await
            .map_err(|_| HubError::HubClosed)
    }

    pub async fn membership(&self) -> Result<MembershipView, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.membership
            .send(Membership::Inspect(reply_tx))
            .await
            .map_err(|_| HubError::HubClosed)?;
        reply_rx.await.map_err(|_| HubError::HubClosed)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.borrow().is_some()
    }

    /// Waits for the hub to shut down and returns the reason it gave its members.
    pub async fn terminated(&self) -> String {
        let mut terminated = self.terminated.clone();
        let reason = match terminated.wait_for(Option::is_some).await {
            Ok(reason) => reason.clone(),
            Err(_) => None,
        };
        reason.unwrap_or_else(|| HubError::HubClosed.to_string())
    }

    #[cfg(test)]
    pub(crate) async fn send_membership(&self, change: Membership) -> Result<(), HubError> {
        self.membership
            .send(change)
            .await
            .map_err(|_| HubError::HubClosed)
    }
}

struct HubChannels {
    events: mpsc::Receiver<GameEvent>,
    errors: mpsc::Receiver<HubError>,
    membership: mpsc::Receiver<Membership>,
    broadcasts: mpsc::Receiver<String>,
    terminated: watch::Sender<Option<String>>,
}

/// State owned by the main loop. Nothing else touches the member sets.
struct HubLoop {
    pin: String,
    allowed_keepers: Arc<HashSet<UserId>>,
    statline: GameStatline,
    clock: Option<GameClock>,
    snapshot_mode: SnapshotMode,
    watchers: HashMap<Uuid, WatcherHandle>,
    keepers: HashMap<Uuid, KeeperHandle>,
}

impl HubLoop {
    async fn run(mut self, mut channels: HubChannels) {
        let reason = loop {
            tokio::select! {
                Some(change) = channels.membership.recv() => self.on_membership(change),

                Some(err) = channels.errors.recv() => {
                    if err.is_fatal() {
                        break err.to_string();
                    }
                    debug!(game_pin = %self.pin, error = %err, "Keeper event dropped");
                }

                event = channels.events.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => break HubError::HubClosed.to_string(),
                },

                Some(message) = channels.broadcasts.recv() => self.to_all_watchers(message),
            }
        };

        self.shutdown(&reason);
        channels.terminated.send_replace(Some(reason));
    }

    fn on_membership(&mut self, change: Membership) {
        match change {
            Membership::JoinWatcher(watcher) => {
                let id = watcher.id;
                self.watchers.insert(id, watcher);
                // New watchers start from the full picture
                if let Some(message) = self.encode(&self.statline.snapshot()) {
                    self.send_to_watcher(id, message);
                }
                debug!(game_pin = %self.pin, watcher_id = %id, watchers = self.watchers.len(), "Watcher added");
            }
            Membership::LeaveWatcher(id) => {
                if self.watchers.remove(&id).is_some() {
                    debug!(game_pin = %self.pin, watcher_id = %id, "Watcher removed");
                }
            }
            Membership::JoinKeeper(keeper) => {
                if !self.allowed_keepers.contains(&keeper.user_id) {
                    warn!(game_pin = %self.pin, user_id = keeper.user_id, "Refused unauthorized keeper");
                    return;
                }
                debug!(game_pin = %self.pin, keeper_id = %keeper.id, user_id = keeper.user_id, "Keeper added");
                self.keepers.insert(keeper.id, keeper);
            }
            Membership::LeaveKeeper(id) => {
                if self.keepers.remove(&id).is_some() {
                    debug!(game_pin = %self.pin, keeper_id = %id, "Keeper removed");
                }
            }
            Membership::Inspect(reply) => {
                let mut keepers: Vec<UserId> = self.keepers.values().map(|k| k.user_id).collect();
                keepers.sort_unstable();
                let _ = reply.send(MembershipView {
                    watchers: self.watchers.len(),
                    keepers,
                });
            }
        }
    }

    fn on_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Stat(stat) => self.apply_stat(stat),
            GameEvent::Clock(command) => self.apply_clock(command),
        }
    }

    fn apply_stat(&mut self, event: StatEvent) {
        let value = self
            .statline
            .add(&event.player_pin, event.stat, event.action.delta());
        debug!(
            game_pin = %self.pin,
            player_pin = %event.player_pin,
            stat = %event.stat,
            value,
            "Stat applied"
        );

        let snapshot = match self.snapshot_mode {
            SnapshotMode::Full => self.statline.snapshot(),
            SnapshotMode::Affected => self
                .statline
                .snapshot_affected_by(&event.player_pin, event.stat),
        };
        if let Some(message) = self.encode(&snapshot) {
            self.to_all_watchers(message);
        }
    }

    fn apply_clock(&mut self, command: ClockCommand) {
        let Some(clock) = &self.clock else {
            debug!(game_pin = %self.pin, action = %command.action, "Clock event for an untimed game");
            return;
        };
        // The clock loop is never allowed to stall this one
        if let Err(e) = clock.try_send(command.control()) {
            warn!(game_pin = %self.pin, action = %command.action, error = %e, "Clock control dropped");
        }
    }

    /// Queues `message` for every watcher, evicting those that cannot keep up.
    fn to_all_watchers(&mut self, message: String) {
        let mut evicted = Vec::new();
        for (id, watcher) in &self.watchers {
            match watcher.queue.try_send(message.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(game_pin = %self.pin, watcher_id = %id, "Evicting slow watcher");
                    evicted.push(*id);
                }
                Err(TrySendError::Closed(_)) => evicted.push(*id),
            }
        }
        for id in evicted {
            self.watchers.remove(&id);
        }
    }

    fn send_to_watcher(&mut self, id: Uuid, message: String) {
        let delivered = self
            .watchers
            .get(&id)
            .map(|watcher| watcher.queue.try_send(message).is_ok());
        if delivered == Some(false) {
            self.watchers.remove(&id);
        }
    }

    fn encode(&self, snapshot: &StatlineSnapshot) -> Option<String> {
        match serde_json::to_string(snapshot) {
            Ok(message) => Some(message),
            Err(e) => {
                error!(game_pin = %self.pin, error = %e, "Failed to encode snapshot");
                None
            }
        }
    }

    /// Hands `reason` to every member, then lets go of them and the clock.
    fn shutdown(&mut self, reason: &str) {
        for (_, keeper) in self.keepers.drain() {
            let _ = keeper.close.send(reason.to_string());
        }
        for (_, watcher) in self.watchers.drain() {
            let _ = watcher.close.send(reason.to_string());
        }
        if let Some(clock) = self.clock.take() {
            let _ = clock.try_send(ClockControl::Pause);
            let _ = clock.try_send(ClockControl::Close);
        }
        info!(game_pin = %self.pin, reason = %reason, "Hub terminated");
    }
}

/// Forwards clock event values to the watchers until the hub is gone.
async fn pump_clock(
    game_pin: String,
    mut events: mpsc::Receiver<ClockEvent>,
    broadcasts: mpsc::Sender<String>,
    mut terminated: watch::Receiver<Option<String>>,
) {
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                debug!(game_pin = %game_pin, kind = %event.kind, value = %event.value, "Clock event");
                if broadcasts.send(event.value).await.is_err() {
                    break;
                }
            }
            _ = terminated.changed() => break,
        }
    }
    debug!(game_pin = %game_pin, "Clock pump stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::models::test_records::record;
    use crate::hub::socket::{Frame, TransportError};
    use async_trait::async_trait;
    use std::time::Duration;

    struct ChannelSink(mpsc::UnboundedSender<Frame>);

    #[async_trait]
    impl FrameSink for ChannelSink {
        async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
            self.0
                .send(frame)
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        }
    }

    fn start(owner: UserId) -> Hub {
        Hub::start(record("abc123", owner).into_live_game().unwrap(), HubConfig::default())
            .unwrap()
    }

    async fn next_text(frames: &mut mpsc::UnboundedReceiver<Frame>) -> String {
        loop {
            match tokio::time::timeout(Duration::from_secs(1), frames.recv()).await {
                Ok(Some(Frame::Text(text))) => return text,
                Ok(Some(Frame::Ping)) => continue,
                other => panic!("expected text frame, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn unauthorized_keeper_never_enters_the_set() {
        let hub = start(7);
        let (handle, _keeper) = Keeper::new("abc123", 8, &HubConfig::default());

        // Skip the pre-check to exercise the loop's own check
        hub.send_membership(Membership::JoinKeeper(handle))
            .await
            .unwrap();

        assert!(hub.membership().await.unwrap().keepers.is_empty());
    }

    #[tokio::test]
    async fn new_watcher_receives_full_snapshot_first() {
        let hub = start(7);
        let (frames_tx, mut frames) = mpsc::unbounded_channel();
        hub.join_watcher(ChannelSink(frames_tx)).await.unwrap();

        let snapshot: StatlineSnapshot = serde_json::from_str(&next_text(&mut frames).await).unwrap();
        assert_eq!(snapshot.game_stats["Pts"].as_count(), 0);
        assert!(snapshot.teams.home.is_some());
        assert!(snapshot.teams.away.is_some());
    }

    #[tokio::test]
    async fn slow_watcher_is_evicted_and_others_still_receive() {
        let hub = start(7);

        // Room for the initial snapshot only, never drained
        let (stuck_tx, _stuck_rx) = mpsc::channel(1);
        let (close_tx, _close_rx) = oneshot::channel();
        hub.send_membership(Membership::JoinWatcher(WatcherHandle {
            id: Uuid::new_v4(),
            queue: stuck_tx,
            close: close_tx,
        }))
        .await
        .unwrap();

        let (frames_tx, mut frames) = mpsc::unbounded_channel();
        hub.join_watcher(ChannelSink(frames_tx)).await.unwrap();
        next_text(&mut frames).await;
        assert_eq!(hub.membership().await.unwrap().watchers, 2);

        hub.events
            .send(GameEvent::parse(r#"{"type":0,"player_pin":"A","stat":"PtsSimple","action":0}"#).unwrap())
            .await
            .unwrap();

        let snapshot: StatlineSnapshot = serde_json::from_str(&next_text(&mut frames).await).unwrap();
        assert_eq!(snapshot.game_stats["Pts"].as_count(), 1);
        assert_eq!(hub.membership().await.unwrap().watchers, 1);
    }

    #[tokio::test]
    async fn end_closes_members_with_reason() {
        let hub = start(7);
        let (frames_tx, mut frames) = mpsc::unbounded_channel();
        hub.join_watcher(ChannelSink(frames_tx)).await.unwrap();
        next_text(&mut frames).await;

        hub.end().await.unwrap();
        assert_eq!(hub.terminated().await, "Game ended");
        assert!(hub.is_terminated());

        let close = tokio::time::timeout(Duration::from_secs(1), frames.recv())
            .await
            .unwrap();
        assert_eq!(close, Some(Frame::Close(Some("Game ended".to_string()))));
        assert!(hub.membership().await.is_err());
    }

    #[tokio::test]
    async fn rejected_events_do_not_stop_the_hub() {
        let hub = start(7);
        hub.errors
            .send(HubError::EventParseFailed("bad".to_string()))
            .await
            .unwrap();
        assert!(hub.membership().await.is_ok());
        assert!(!hub.is_terminated());
    }

    #[tokio::test]
    async fn affected_mode_broadcasts_partial_snapshots() {
        let game = record("abc123", 7).into_live_game().unwrap();
        let hub = Hub::start(
            game,
            HubConfig::default().with_snapshot_mode(SnapshotMode::Affected),
        )
        .unwrap();
        let (frames_tx, mut frames) = mpsc::unbounded_channel();
        hub.join_watcher(ChannelSink(frames_tx)).await.unwrap();
        next_text(&mut frames).await;

        hub.events
            .send(GameEvent::parse(r#"{"type":0,"player_pin":"C","stat":"PtsSimple","action":0}"#).unwrap())
            .await
            .unwrap();

        let snapshot: StatlineSnapshot = serde_json::from_str(&next_text(&mut frames).await).unwrap();
        assert!(snapshot.teams.home.is_none());
        let away = snapshot.teams.away.unwrap();
        assert_eq!(away.player_stats.len(), 1);
        assert_eq!(away.player_stats["C"]["Pts"].as_count(), 1);
    }
}
