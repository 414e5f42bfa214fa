use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, timeout, Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::HubConfig;

use super::game_hub::Membership;
use super::socket::{Frame, FrameSink, TransportError};

/// The hub's side of a watcher: its outbound queue and close signal.
#[derive(Debug)]
pub(crate) struct WatcherHandle {
    pub id: Uuid,
    pub queue: mpsc::Sender<String>,
    pub close: oneshot::Sender<String>,
}

/// The connection's side of a watcher, run as a single worker.
pub(crate) struct Watcher {
    id: Uuid,
    game_pin: String,
    queue: mpsc::Receiver<String>,
    close: oneshot::Receiver<String>,
    ping_period: Duration,
    write_wait: Duration,
}

impl Watcher {
    pub fn new(game_pin: &str, config: &HubConfig) -> (WatcherHandle, Watcher) {
        let id = Uuid::new_v4();
        let (queue_tx, queue_rx) = mpsc::channel(config.watcher_queue.max(1));
        let (close_tx, close_rx) = oneshot::channel();

        (
            WatcherHandle {
                id,
                queue: queue_tx,
                close: close_tx,
            },
            Watcher {
                id,
                game_pin: game_pin.to_string(),
                queue: queue_rx,
                close: close_rx,
                ping_period: config.ping_period,
                write_wait: config.write_wait,
            },
        )
    }

    /// Writes queued messages until the hub lets go of this watcher or the peer fails.
    pub async fn run<S: FrameSink>(mut self, mut sink: S, membership: mpsc::Sender<Membership>) {
        let mut ping = interval_at(Instant::now() + self.ping_period, self.ping_period);

        loop {
            // Queued messages go out before any close
            tokio::select! {
                biased;

                message = self.queue.recv() => {
                    let Some(first) = message else {
                        // Evicted, removed, or the hub shut down
                        let reason = self.close.try_recv().ok();
                        let _ = self.write(&mut sink, Frame::Close(reason)).await;
                        break;
                    };
                    let payload = self.coalesce(first);
                    if let Err(e) = self.write(&mut sink, Frame::Text(payload)).await {
                        debug!(game_pin = %self.game_pin, watcher_id = %self.id, error = %e, "Watcher write failed");
                        break;
                    }
                }

                reason = &mut self.close => {
                    let _ = self.write(&mut sink, Frame::Close(reason.ok())).await;
                    break;
                }

                _ = ping.tick() => {
                    if let Err(e) = self.write(&mut sink, Frame::Ping).await {
                        debug!(game_pin = %self.game_pin, watcher_id = %self.id, error = %e, "Watcher ping failed");
                        break;
                    }
                }
            }
        }

        let _ = membership.send(Membership::LeaveWatcher(self.id)).await;
        info!(game_pin = %self.game_pin, watcher_id = %self.id, "Watcher disconnected");
    }

    /// Folds whatever else is already queued into one newline-separated write.
    fn coalesce(&mut self, first: String) -> String {
        let mut payload = first;
        while let Ok(next) = self.queue.try_recv() {
            payload.push('\n');
            payload.push_str(&next);
        }
        payload
    }

    async fn write<S: FrameSink>(&self, sink: &mut S, frame: Frame) -> Result<(), TransportError> {
        timeout(self.write_wait, sink.send_frame(frame))
            .await
            .map_err(|_| TransportError::WriteTimeout)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct ChannelSink(mpsc::UnboundedSender<Frame>);

    #[async_trait]
    impl FrameSink for ChannelSink {
        async fn send_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
            self.0
                .send(frame)
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        }
    }

    fn watcher() -> (WatcherHandle, Watcher) {
        Watcher::new("abc123", &HubConfig::default())
    }

    #[tokio::test]
    async fn queued_messages_are_coalesced_into_one_write() {
        let (handle, watcher) = watcher();
        let (frames_tx, mut frames) = mpsc::unbounded_channel();
        let (membership_tx, mut membership) = mpsc::channel(4);

        handle.queue.send("one".to_string()).await.unwrap();
        handle.queue.send("two".to_string()).await.unwrap();
        handle.queue.send("three".to_string()).await.unwrap();
        drop(handle);

        watcher.run(ChannelSink(frames_tx), membership_tx).await;

        assert_eq!(
            frames.recv().await,
            Some(Frame::Text("one\ntwo\nthree".to_string()))
        );
        assert_eq!(frames.recv().await, Some(Frame::Close(None)));
        assert!(matches!(
            membership.recv().await,
            Some(Membership::LeaveWatcher(_))
        ));
    }

    #[tokio::test]
    async fn close_signal_carries_reason() {
        let (handle, watcher) = watcher();
        let (frames_tx, mut frames) = mpsc::unbounded_channel();
        let (membership_tx, _membership) = mpsc::channel(4);

        let WatcherHandle { queue, close, .. } = handle;
        close.send("Game ended".to_string()).unwrap();

        watcher.run(ChannelSink(frames_tx), membership_tx).await;
        drop(queue);

        assert_eq!(
            frames.recv().await,
            Some(Frame::Close(Some("Game ended".to_string())))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pings_on_the_ping_period() {
        let (handle, watcher) = watcher();
        let (frames_tx, mut frames) = mpsc::unbounded_channel();
        let (membership_tx, _membership) = mpsc::channel(4);

        let worker = tokio::spawn(watcher.run(ChannelSink(frames_tx), membership_tx));
        tokio::time::sleep(Duration::from_secs(55)).await;

        assert_eq!(frames.recv().await, Some(Frame::Ping));
        drop(handle);
        worker.await.unwrap();
    }
}
