use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, timeout, timeout_at, Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::HubConfig;

use super::game_hub::Membership;
use super::errors::HubError;
use super::events::GameEvent;
use super::models::UserId;
use super::socket::{Frame, FrameSink, FrameStream, TransportError};

#[derive(Debug)]
pub(crate) struct KeeperHandle {
    pub id: Uuid,
    pub user_id: UserId,
    pub close: oneshot::Sender<String>,
}

/// Where a keeper's read worker delivers what it decodes.
#[derive(Clone)]
pub(crate) struct KeeperOutlets {
    pub events: mpsc::Sender<GameEvent>,
    pub errors: mpsc::Sender<HubError>,
    pub membership: mpsc::Sender<Membership>,
}

pub(crate) struct Keeper {
    id: Uuid,
    user_id: UserId,
    game_pin: String,
    close: oneshot::Receiver<String>,
    config: HubConfig,
}

impl Keeper {
    pub fn new(game_pin: &str, user_id: UserId, config: &HubConfig) -> (KeeperHandle, Keeper) {
        let id = Uuid::new_v4();
        let (close_tx, close_rx) = oneshot::channel();

        (
            KeeperHandle {
                id,
                user_id,
                close: close_tx,
            },
            Keeper {
                id,
                user_id,
                game_pin: game_pin.to_string(),
                close: close_rx,
                config: config.clone(),
            },
        )
    }

    /// Spawns the read and write workers. Either one exiting stops the other.
    pub fn spawn<S, R>(self, sink: S, stream: R, outlets: KeeperOutlets)
    where
        S: FrameSink + 'static,
        R: FrameStream + 'static,
    {
        let (reader_alive, reader_gone) = oneshot::channel::<()>();
        let (writer_alive, writer_gone) = oneshot::channel::<()>();

        let reader = ReadWorker {
            id: self.id,
            user_id: self.user_id,
            game_pin: self.game_pin.clone(),
            pong_wait: self.config.pong_wait,
            max_message_size: self.config.max_message_size,
        };
        let close = self.close;
        let writer = WriteWorker {
            id: self.id,
            game_pin: self.game_pin,
            ping_period: self.config.ping_period,
            write_wait: self.config.write_wait,
        };

        tokio::spawn(async move {
            reader.run(stream, outlets, writer_gone).await;
            drop(reader_alive);
        });
        tokio::spawn(async move {
            writer.run(sink, close, reader_gone).await;
            drop(writer_alive);
        });
    }
}

struct ReadWorker {
    id: Uuid,
    user_id: UserId,
    game_pin: String,
    pong_wait: Duration,
    max_message_size: usize,
}

impl ReadWorker {
    async fn run<R: FrameStream>(
        self,
        mut stream: R,
        outlets: KeeperOutlets,
        mut writer_gone: oneshot::Receiver<()>,
    ) {
        let mut deadline = Instant::now() + self.pong_wait;

        loop {
            let read = tokio::select! {
                _ = &mut writer_gone => break,
                read = timeout_at(deadline, stream.next_frame()) => read,
            };

            let frame = match read {
                Err(_) => {
                    self.report(&outlets, TransportError::ReadTimeout.into()).await;
                    break;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    self.report(&outlets, e.into()).await;
                    break;
                }
                Ok(Some(Ok(frame))) => frame,
            };

            match frame {
                Frame::Close(_) => break,
                Frame::Pong => deadline = Instant::now() + self.pong_wait,
                Frame::Ping => {}
                Frame::Text(text) if text.len() > self.max_message_size => {
                    self.report(&outlets, TransportError::MessageTooLarge(text.len()).into())
                        .await;
                    break;
                }
                Frame::Text(text) => match GameEvent::parse(&text) {
                    Ok(event) => {
                        debug!(game_pin = %self.game_pin, keeper_id = %self.id, event = ?event, "Keeper event received");
                        if outlets.events.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(game_pin = %self.game_pin, keeper_id = %self.id, error = %e, "Rejected keeper frame");
                        self.report(&outlets, e).await;
                    }
                },
            }
        }

        let _ = outlets.membership.send(Membership::LeaveKeeper(self.id)).await;
        info!(game_pin = %self.game_pin, keeper_id = %self.id, user_id = self.user_id, "Keeper disconnected");
    }

    async fn report(&self, outlets: &KeeperOutlets, error: HubError) {
        let _ = outlets.errors.send(error).await;
    }
}

struct WriteWorker {
    id: Uuid,
    game_pin: String,
    ping_period: Duration,
    write_wait: Duration,
}

impl WriteWorker {
    async fn run<S: FrameSink>(
        self,
        mut sink: S,
        mut close: oneshot::Receiver<String>,
        mut reader_gone: oneshot::Receiver<()>,
    ) {
        let mut ping = interval_at(Instant::now() + self.ping_period, self.ping_period);

        loop {
            tokio::select! {
                reason = &mut close => {
                    let _ = self.write(&mut sink, Frame::Close(reason.ok())).await;
                    break;
                }
                _ = &mut reader_gone => break,
                _ = ping.tick() => {
                    if let Err(e) = self.write(&mut sink, Frame::Ping).await {
                        debug!(game_pin = %self.game_pin, keeper_id = %self.id, error = %e, "Keeper ping failed");
                        break;
                    }
                }
            }
        }
    }

    async fn write<S: FrameSink>(&self, sink: &mut S, frame: Frame) -> Result<(), TransportError> {
        timeout(self.write_wait, sink.send_frame(frame))
            .await
            .map_err(|_| TransportError::WriteTimeout)?
    }
}
