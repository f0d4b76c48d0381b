use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::handle::{EngineHandle, EngineName};
use crate::line::EngineLine;

/// A running engine subprocess with its input writer and output reader tasks.
pub struct EngineProcess {
    handle: EngineHandle,
    child: Child,
    writer: JoinHandle<Result<(), EngineError>>,
    reader: JoinHandle<Result<(), EngineError>>,
}

impl EngineProcess {
    /// Spawn the engine and queue the UCI handshake plus init lines.
    ///
    /// Returns the process and the receiver of broadcastable output lines.
    pub fn spawn(
        config: &EngineConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<String>), EngineError> {
        let (program, args) = config.program_and_args().ok_or(EngineError::EmptyCommand)?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: program.to_string(),
                source,
            })?;

        tracing::info!(program = program, pid = ?child.id(), "Engine spawned");
        Self::attach(child, config)
    }

    /// Wire up the pipes of an already-spawned child and queue startup lines.
    pub fn attach(
        mut child: Child,
        config: &EngineConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<String>), EngineError> {
        let stdin = child.stdin.take().ok_or(EngineError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(EngineError::MissingPipe("stdout"))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(stderr));
        }

        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let name = Arc::new(EngineName::new());
        let handle = EngineHandle::new(input_tx, Arc::clone(&name));

        let writer = tokio::spawn(run_input_writer(input_rx, stdin));
        let reader = tokio::spawn(run_output_reader(BufReader::new(stdout), name, output_tx));

        for line in config.startup_lines() {
            handle.send(line)?;
        }

        Ok((
            Self {
                handle,
                child,
                writer,
                reader,
            },
            output_rx,
        ))
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Resolve when either I/O task stops. Any error here is fatal.
    pub async fn wait(mut self) -> Result<(), EngineError> {
        let outcome = tokio::select! {
            res = &mut self.writer => res,
            res = &mut self.reader => res,
        };
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(error = %e, "Engine already gone");
        }
        outcome.map_err(|e| EngineError::Task(e.to_string()))?
    }
}

/// Drain the input queue into the engine, one newline-terminated line each.
///
/// Returns `Ok` once every sender is dropped.
pub async fn run_input_writer<W>(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut writer: W,
) -> Result<(), EngineError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        tracing::debug!(line = %line, "engine <");
        writer.write_all(line.as_bytes()).await.map_err(EngineError::Write)?;
        writer.write_all(b"\n").await.map_err(EngineError::Write)?;
        writer.flush().await.map_err(EngineError::Write)?;
    }
    Ok(())
}

/// Read engine stdout, record the name, and forward search output.
///
/// Only returns with an error: end of stream means the engine exited.
pub async fn run_output_reader<R>(
    mut reader: R,
    name: Arc<EngineName>,
    tx: mpsc::UnboundedSender<String>,
) -> Result<(), EngineError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    while let Some(line) = read_lossy_line(&mut reader, &mut buf)
        .await
        .map_err(EngineError::Read)?
    {
        tracing::debug!(line = %line, "engine >");
        match EngineLine::classify(&line) {
            EngineLine::Name(engine_name) => {
                if name.set(engine_name) {
                    tracing::info!(name = engine_name, "Engine identified");
                } else {
                    tracing::debug!(name = engine_name, "Ignoring repeated engine name");
                }
            }
            EngineLine::Broadcast => {
                if tx.send(line).is_err() {
                    tracing::debug!("No broadcaster attached, dropping engine output");
                }
            }
            EngineLine::Ignored => {}
        }
    }
    Err(EngineError::Exited)
}

/// Read one line, dropping the `\n` / `\r\n` terminator. Invalid UTF-8 is
/// replaced rather than rejected. `None` at end of stream.
async fn read_lossy_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Keep the stderr pipe empty for as long as the engine writes to it.
async fn drain_stderr<R>(stderr: R)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    loop {
        match read_lossy_line(&mut reader, &mut buf).await {
            Ok(Some(line)) => tracing::debug!(line = %line, "engine stderr"),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "engine stderr closed");
                break;
            }
        }
    }
}
