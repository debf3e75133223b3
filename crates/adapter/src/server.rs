//! TCP server: connection handling, handshake, controller assignment and
//! command validation. Game state never lives here; validated commands go to
//! the game loop over a bounded channel and replies come back as lines.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::core::GameSnapshot;
use crate::protocol::*;
use crate::runtime::{InboundCommand, InboundPayload, OutboundMessage};
use crate::types::{Command, Coord, Mode, GRID_HEIGHT, GRID_WIDTH};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            protocol_version: "1.0.0".to_string(),
            max_pending_commands: 10,
        }
    }
}

impl ServerConfig {
    /// Read `SUMTILES_AI_HOST`, `SUMTILES_AI_PORT` and `SUMTILES_AI_MAX_PENDING`.
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("SUMTILES_AI_HOST").unwrap_or(defaults.host);
        let port = env::var("SUMTILES_AI_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_commands = env::var("SUMTILES_AI_MAX_PENDING")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        Self {
            host,
            port,
            max_pending_commands,
            ..defaults
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    /// Major version clients must match, e.g. `"1."`.
    fn major_prefix(&self) -> String {
        let major = self.protocol_version.split('.').next().unwrap_or("1");
        format!("{}.", major)
    }
}

/// Check if the adapter is disabled via environment
pub fn is_disabled() -> bool {
    std::env::var("SUMTILES_AI_DISABLED")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Connection counts shared with the UI. Controller id 0 means none.
#[derive(Debug, Default)]
pub struct LinkStatus {
    clients: AtomicUsize,
    controller: AtomicUsize,
}

impl LinkStatus {
    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }

    pub fn controller_id(&self) -> Option<usize> {
        match self.controller.load(Ordering::Relaxed) {
            0 => None,
            id => Some(id),
        }
    }
}

/// Handle to a connected client
struct ClientHandle {
    id: usize,
    handshaken: bool,
    stream_observations: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<String>,
}

/// Shared server state
struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<usize>>,
    status: Arc<LinkStatus>,
}

impl ServerState {
    async fn publish_status(&self) {
        let clients = self.clients.read().await.len();
        let controller = self.controller.read().await.unwrap_or(0);
        self.status.clients.store(clients, Ordering::Relaxed);
        self.status.controller.store(controller, Ordering::Relaxed);
    }

    async fn is_handshaken(&self, client_id: usize) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    /// Record `seq` if it is greater than the last one seen from this client.
    async fn check_and_update_seq(&self, client_id: usize, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };
        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }
}

fn to_line<T: serde::Serialize>(msg: &T) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(line) => Some(line),
        Err(e) => {
            log::error!("failed to encode message: {}", e);
            None
        }
    }
}

fn send_error(tx: &mpsc::UnboundedSender<String>, seq: u64, code: ErrorCode, message: &str) {
    if let Some(line) = to_line(&create_error(seq, code, message)) {
        let _ = tx.send(line);
    }
}

/// Start the TCP server.
///
/// `ready_tx` receives the bound address once the listener is up, which lets
/// callers bind port 0.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    status: Arc<LinkStatus>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.socket_addr()?).await?;
    let bound = listener.local_addr()?;
    log::info!("adapter listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState {
        config,
        clients: RwLock::new(Vec::new()),
        controller: RwLock::new(None),
        status,
    });

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let clients = state.clients.read().await;
                match msg {
                    OutboundMessage::ToClient { client_id, line } => {
                        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
                            let _ = c.tx.send(line);
                        }
                    }
                    OutboundMessage::Broadcast { line } => {
                        for c in clients.iter().filter(|c| c.stream_observations) {
                            let _ = c.tx.send(line.clone());
                        }
                    }
                }
            }
        });
    }

    let mut client_id_counter = 0usize;
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;
        log::info!("client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, client_id, state, command_tx).await {
                log::warn!("client {} error: {}", client_id, e);
            }
            log::info!("client {} disconnected", client_id);
        });
    }
}

/// Remove a client; if it was the controller, promote the lowest remaining id.
async fn drop_client(state: &ServerState, client_id: usize) {
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);

        if *controller == Some(client_id) {
            *controller = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
            match *controller {
                Some(new_id) => log::info!("client {} promoted to controller", new_id),
                None => log::info!("controller {} released", client_id),
            }
        }
    }
    state.publish_status().await;
}

async fn handle_client(
    socket: TcpStream,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    state.clients.write().await.push(ClientHandle {
        id: client_id,
        handshaken: false,
        stream_observations: false,
        last_seq: None,
        tx: tx.clone(),
    });
    state.publish_status().await;

    let write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
                || writer.flush().await.is_err()
            {
                break;
            }
        }
    });

    let result = read_loop(BufReader::new(reader), client_id, &state, &tx, &command_tx).await;

    // Dropping every sender lets the writer flush what is queued and exit.
    drop_client(&state, client_id).await;
    drop(tx);
    let _ = write_task.await;
    result
}

async fn read_loop<R: tokio::io::AsyncRead + Unpin>(
    mut reader: BufReader<R>,
    client_id: usize,
    state: &ServerState,
    tx: &mpsc::UnboundedSender<String>,
    command_tx: &mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        log::trace!("client {} <- {}", client_id, trimmed);

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if !handle_hello(state, client_id, tx, command_tx, hello).await {
                    return Ok(());
                }
            }
            Ok(ParsedMessage::Command(cmd)) => {
                handle_command(state, client_id, tx, command_tx, cmd).await;
            }
            Ok(ParsedMessage::Unknown(u)) => {
                send_error(tx, u.seq, ErrorCode::InvalidCommand, "Unknown message type");
            }
            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                send_error(
                    tx,
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                );
            }
        }
    }
}

/// Returns false when the connection must be closed.
async fn handle_hello(
    state: &ServerState,
    client_id: usize,
    tx: &mpsc::UnboundedSender<String>,
    command_tx: &mpsc::Sender<InboundCommand>,
    hello: HelloMessage,
) -> bool {
    if state.is_handshaken(client_id).await && !state.check_and_update_seq(client_id, hello.seq).await {
        send_error(tx, hello.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
        return true;
    }

    if !hello.protocol_version.starts_with(&state.config.major_prefix()) {
        send_error(
            tx,
            hello.seq,
            ErrorCode::ProtocolMismatch,
            &format!("Protocol version {} not supported", hello.protocol_version),
        );
        return false;
    }

    let role = {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;
        if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
            client.handshaken = true;
            client.last_seq = Some(hello.seq);
            client.stream_observations = hello.requested.stream_observations;
        }
        if controller.is_none() {
            *controller = Some(client_id);
            log::info!("client {} ({}) is now controller", client_id, hello.client.name);
        }
        if *controller == Some(client_id) {
            AssignedRole::Controller
        } else {
            AssignedRole::Observer
        }
    };
    state.publish_status().await;

    let controller_id = state.controller.read().await.map(|id| id as u64);
    let welcome = create_welcome(
        hello.seq,
        &state.config.protocol_version,
        client_id as u64,
        role,
        controller_id,
    );
    if let Some(line) = to_line(&welcome) {
        let _ = tx.send(line);
    }

    if hello.requested.stream_observations {
        let _ = command_tx.try_send(InboundCommand {
            client_id,
            seq: hello.seq,
            payload: InboundPayload::SnapshotRequest,
        });
    }
    true
}

async fn handle_command(
    state: &ServerState,
    client_id: usize,
    tx: &mpsc::UnboundedSender<String>,
    command_tx: &mpsc::Sender<InboundCommand>,
    cmd: CommandMessage,
) {
    if !state.is_handshaken(client_id).await {
        send_error(tx, cmd.seq, ErrorCode::HandshakeRequired, "Send hello before command");
        return;
    }
    if !state.check_and_update_seq(client_id, cmd.seq).await {
        send_error(tx, cmd.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
        return;
    }
    if *state.controller.read().await != Some(client_id) {
        send_error(tx, cmd.seq, ErrorCode::NotController, "Only controller may send commands");
        return;
    }

    let command = match map_command(&cmd) {
        Ok(c) => c,
        Err((code, message)) => {
            send_error(tx, cmd.seq, code, &message);
            return;
        }
    };

    // Ack is sent by the game loop once the command is applied.
    let inbound = InboundCommand {
        client_id,
        seq: cmd.seq,
        payload: InboundPayload::Command(command),
    };
    if command_tx.try_send(inbound).is_err() {
        send_error(tx, cmd.seq, ErrorCode::Backpressure, "Command queue is full");
    }
}

/// Map a protocol command into an engine command.
pub fn map_command(cmd: &CommandMessage) -> Result<Command, (ErrorCode, String)> {
    match cmd.action {
        ActionName::StartGame => {
            let mode = cmd.mode.map(|m| m.0).unwrap_or(Mode::Classic);
            Ok(Command::StartGame(mode))
        }
        ActionName::ToggleCell => {
            let (Some(row), Some(col)) = (cmd.row, cmd.col) else {
                return Err((ErrorCode::InvalidCommand, "toggleCell needs row and col".to_string()));
            };
            Coord::checked(row, col)
                .map(Command::ToggleCell)
                .ok_or_else(|| {
                    (
                        ErrorCode::InvalidCommand,
                        format!(
                            "cell ({}, {}) outside {}x{} grid",
                            row, col, GRID_HEIGHT, GRID_WIDTH
                        ),
                    )
                })
        }
        ActionName::TogglePause => Ok(Command::TogglePause),
        ActionName::Restart => Ok(Command::Restart),
        ActionName::ExitToMenu => Ok(Command::ExitToMenu),
    }
}

/// Build an observation message from a snapshot.
pub fn build_observation(snap: &GameSnapshot, seq: u64) -> ObservationMessage {
    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        status: StatusLower::from(snap.status),
        mode: snap.mode.map(ModeLower),
        playable: snap.playable(),
        episode_id: snap.episode_id,
        seed: snap.seed,
        grid: GridSnapshot {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            cells: snap.grid,
            ids: snap.tile_ids,
        },
        selection: snap
            .selected_coords()
            .map(|c| CellRef {
                row: c.row,
                col: c.col,
            })
            .collect(),
        selection_sum: snap.selection_sum,
        rejecting: snap.rejecting,
        target: snap.target,
        score: snap.score,
        high_score: snap.high_score,
        time_remaining_ms: snap.time_remaining_ms,
        last_event: snap.last_event.map(LastEvent::from),
        state_hash: StateHash(snap.state_hash()),
    }
}
