//! Adapter runtime integration.
//!
//! Bridges the synchronous game loop with the async TCP server: the server
//! runs on its own tokio runtime, commands arrive over a bounded channel and
//! replies leave over an unbounded one.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};

use crate::core::{Game, GameSnapshot};
use crate::protocol::create_ack;
use crate::server::{build_observation, is_disabled, run_server, LinkStatus, ServerConfig};
use crate::types::Command;

/// Command delivered to the game loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone)]
pub enum InboundPayload {
    Command(Command),
    /// A streaming client just said hello and wants the current state.
    SnapshotRequest,
}

/// Outbound line to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClient { client_id: usize, line: String },
    /// Sent to every client that asked for observations.
    Broadcast { line: String },
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    status: Arc<LinkStatus>,
    local_addr: SocketAddr,
    obs_seq: u64,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns `Ok(None)` if `SUMTILES_AI_DISABLED` is set.
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        if is_disabled() {
            log::info!("adapter disabled via SUMTILES_AI_DISABLED");
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()).map(Some)
    }

    /// Start the server and wait until it is listening.
    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let (ready_tx, ready_rx) = oneshot::channel();
        let status = Arc::new(LinkStatus::default());

        let rt = Runtime::new().context("failed to create tokio runtime")?;
        let server_status = Arc::clone(&status);
        let server = rt.spawn(async move {
            run_server(config, cmd_tx, out_rx, server_status, Some(ready_tx)).await
        });

        let local_addr = match rt.block_on(ready_rx) {
            Ok(addr) => addr,
            // The sender was dropped before binding: surface the server error.
            Err(_) => {
                let err = rt
                    .block_on(server)
                    .context("adapter task panicked")?
                    .err()
                    .unwrap_or_else(|| anyhow::anyhow!("adapter stopped before listening"));
                return Err(err.context("adapter failed to start"));
            }
        };

        Ok(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
            status,
            local_addr,
            obs_seq: 0,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn client_count(&self) -> usize {
        self.status.client_count()
    }

    pub fn controller_id(&self) -> Option<usize> {
        self.status.controller_id()
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    /// Apply every queued command to `game`, acking each one.
    ///
    /// Returns true if any command changed the game, in which case the caller
    /// should broadcast a fresh observation.
    pub fn pump(&mut self, game: &mut Game, now: Instant) -> bool {
        let mut changed = false;
        while let Some(inbound) = self.try_recv() {
            match inbound.payload {
                InboundPayload::Command(command) => {
                    changed |= game.apply(command, now);
                    if let Ok(line) = serde_json::to_string(&create_ack(inbound.seq)) {
                        self.send(OutboundMessage::ToClient {
                            client_id: inbound.client_id,
                            line,
                        });
                    }
                }
                InboundPayload::SnapshotRequest => {
                    let snap = game.snapshot(now);
                    if let Some(line) = self.observation_line(&snap) {
                        self.send(OutboundMessage::ToClient {
                            client_id: inbound.client_id,
                            line,
                        });
                    }
                }
            }
        }
        changed
    }

    /// Send an observation to every streaming client.
    pub fn broadcast(&mut self, snap: &GameSnapshot) {
        if let Some(line) = self.observation_line(snap) {
            self.send(OutboundMessage::Broadcast { line });
        }
    }

    fn observation_line(&mut self, snap: &GameSnapshot) -> Option<String> {
        self.obs_seq += 1;
        match serde_json::to_string(&build_observation(snap, self.obs_seq)) {
            Ok(line) => Some(line),
            Err(e) => {
                log::error!("failed to encode observation: {}", e);
                None
            }
        }
    }
}
