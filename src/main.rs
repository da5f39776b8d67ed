//! `vtt-replay` — drive a session from a script and print its events.
//!
//! Reads a map descriptor, an optional state seed and a JSON-lines script
//! of steps, runs every step through a [`SessionHandle`], and writes each
//! emitted event to stdout as one JSON line. Rejected steps are logged and
//! skipped unless `--strict` is set.


use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use vtt_session::actor::{SessionHandle, spawn_session};
use vtt_session::config::SessionConfig;
use vtt_session::error::{ErrorCode, SessionError};
use vtt_session::events::SessionEvent;
use vtt_session::model::{
    DrawingId, DrawingLayer, FogId, FogRegion, GridMap, ParticipantId, PingId, SessionMapState, Token, TokenId,
    TokenPatch,
};
use vtt_session::session::VttSession;

#[derive(Debug, thiserror::Error)]
enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid JSON in {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("failed to read script: {0}")]
    Script(io::Error),
    #[error("script line {line}: {source}")]
    Step { line: usize, source: serde_json::Error },
    #[error("script line {line} rejected: {source}")]
    Rejected { line: usize, source: SessionError },
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    #[error("event printer stopped unexpectedly")]
    PrinterJoin(#[from] tokio::task::JoinError),
}

#[derive(Parser, Debug)]
#[command(name = "vtt-replay", about = "Replay a scripted tabletop session and print its events")]
struct Cli {
    /// Map descriptor (JSON).
    #[arg(long, env = "VTT_MAP")]
    map: PathBuf,

    /// Initial session state (JSON). Empty state when omitted.
    #[arg(long, env = "VTT_STATE")]
    state: Option<PathBuf>,

    /// Script of steps, one JSON object per line. Reads stdin when omitted.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Participant holding Seer rights.
    #[arg(long, env = "VTT_SEER", default_value = "seer")]
    seer: String,

    /// Participant driving this replay; their drawings feed undo.
    #[arg(long, env = "VTT_LOCAL", default_value = "seer")]
    local: String,

    /// Stop at the first rejected step.
    #[arg(long)]
    strict: bool,

    /// Print the final state as the last output line.
    #[arg(long)]
    final_state: bool,
}

/// One scripted step.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    MoveToken { actor: ParticipantId, token_id: TokenId, x: f64, y: f64 },
    AddToken { actor: ParticipantId, token: Token },
    RemoveToken { actor: ParticipantId, token_id: TokenId },
    UpdateToken { actor: ParticipantId, token_id: TokenId, patch: TokenPatch },
    RevealFog { actor: ParticipantId, region: FogRegion },
    HideFog {
        actor: ParticipantId,
        #[serde(default)]
        region_ids: Option<Vec<FogId>>,
    },
    ResetFog { actor: ParticipantId },
    AddDrawing { actor: ParticipantId, layer: DrawingLayer, shape: serde_json::Value },
    RemoveDrawing { actor: ParticipantId, drawing_id: DrawingId },
    ClearDrawings { actor: ParticipantId, layer: DrawingLayer },
    UndoDrawing,
    SendPing {
        actor: ParticipantId,
        x: f64,
        y: f64,
        #[serde(default)]
        color: Option<String>,
    },
    RemovePing { actor: ParticipantId, ping_id: PingId },
    /// Apply an event as if broadcast by another participant.
    Remote { event: SessionEvent },
    /// Let wall-clock time pass so pings can expire.
    Sleep { ms: u64 },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ReplayError> {
    let map: GridMap = read_json(&cli.map).await?;
    let seed: SessionMapState = match &cli.state {
        Some(path) => read_json(path).await?,
        None => SessionMapState::new(),
    };

    let config = SessionConfig::from_env();
    let handle = spawn_session(VttSession::new(cli.seer.as_str(), cli.local.as_str(), config));
    handle.load_map(map).await?;
    handle.load_session_state(seed).await?;

    let mut events = handle.events().await?;
    let printer = tokio::spawn(async move {
        let mut out = tokio::io::stdout();
        let mut printed = 0_usize;
        while let Some(event) = events.recv().await {
            let mut line = serde_json::to_vec(&event).map_err(io::Error::other)?;
            line.push(b'\n');
            out.write_all(&line).await?;
            printed += 1;
        }
        out.flush().await?;
        Ok::<usize, io::Error>(printed)
    });

    let summary = match &cli.script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| ReplayError::Io { path: path.clone(), source })?;
            replay(&handle, BufReader::new(file), cli.strict).await?
        }
        None => replay(&handle, BufReader::new(tokio::io::stdin()), cli.strict).await?,
    };

    let final_state = if cli.final_state { Some(handle.snapshot().await?) } else { None };
    drop(handle);
    let printed = printer.await??;

    if let Some(state) = final_state {
        let mut line = serde_json::to_vec(&state).map_err(io::Error::other)?;
        line.push(b'\n');
        let mut out = tokio::io::stdout();
        out.write_all(&line).await?;
        out.flush().await?;
    }
    info!(applied = summary.applied, rejected = summary.rejected, events = printed, "replay finished");
    Ok(())
}

/// Steps applied and rejected by one script run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ReplaySummary {
    applied: usize,
    rejected: usize,
}

/// Run every step of `script` against `handle`. Blank lines and `#`
/// comments are skipped.
async fn replay<R>(handle: &SessionHandle, script: R, strict: bool) -> Result<ReplaySummary, ReplayError>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = ReplaySummary::default();
    let mut lines = script.lines();
    let mut line_no = 0_usize;
    while let Some(text) = lines.next_line().await.map_err(ReplayError::Script)? {
        line_no += 1;
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let step: Step = serde_json::from_str(text).map_err(|source| ReplayError::Step { line: line_no, source })?;
        match apply(handle, step).await {
            Ok(()) => summary.applied += 1,
            Err(SessionError::ActorClosed) => return Err(SessionError::ActorClosed.into()),
            Err(source) if strict => return Err(ReplayError::Rejected { line: line_no, source }),
            Err(source) => {
                summary.rejected += 1;
                warn!(line = line_no, code = source.error_code(), error = %source, "step rejected");
            }
        }
    }
    Ok(summary)
}

async fn apply(handle: &SessionHandle, step: Step) -> Result<(), SessionError> {
    match step {
        Step::MoveToken { actor, token_id, x, y } => handle.move_token(actor, token_id, x, y).await,
        Step::AddToken { actor, token } => handle.add_token(actor, token).await.map(drop),
        Step::RemoveToken { actor, token_id } => handle.remove_token(actor, token_id).await,
        Step::UpdateToken { actor, token_id, patch } => handle.update_token(actor, token_id, patch).await,
        Step::RevealFog { actor, region } => handle.reveal_fog(actor, region).await.map(drop),
        Step::HideFog { actor, region_ids } => handle.hide_fog(actor, region_ids).await,
        Step::ResetFog { actor } => handle.reset_fog(actor).await,
        Step::AddDrawing { actor, layer, shape } => handle.add_drawing(actor, layer, shape).await.map(drop),
        Step::RemoveDrawing { actor, drawing_id } => handle.remove_drawing(actor, drawing_id).await,
        Step::ClearDrawings { actor, layer } => handle.clear_drawings(actor, layer).await,
        Step::UndoDrawing => handle.undo_drawing().await.map(drop),
        Step::SendPing { actor, x, y, color } => handle.send_ping(actor, x, y, color).await.map(drop),
        Step::RemovePing { actor, ping_id } => handle.remove_ping(actor, ping_id).await,
        Step::Remote { event } => handle.apply_remote(event).await,
        Step::Sleep { ms } => {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(())
        }
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ReplayError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ReplayError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&bytes).map_err(|source| ReplayError::Json { path: path.to_path_buf(), source })
}
