use std::sync::Arc;

use axum::extract::ws::Message as WsMessage;
use chesshook_core::{Command, Reply, SessionId};
use chesshook_engine::EngineHandle;
use futures::{Stream, StreamExt};

use crate::auth::AuthGate;
use crate::lock::LockArbiter;
use crate::registry::{SessionEntry, SessionRegistry};

/// Process-wide state every session reaches through.
pub struct SharedState {
    pub auth: AuthGate,
    pub locks: LockArbiter,
    pub registry: Arc<SessionRegistry>,
    pub engine: EngineHandle,
}

/// Per-connection protocol state. Owned by the connection task.
pub struct Session {
    entry: Arc<SessionEntry>,
    state: Arc<SharedState>,
    authenticated: bool,
    has_lock: bool,
    incorrect_attempts: u32,
}

impl Session {
    pub fn new(entry: Arc<SessionEntry>, state: Arc<SharedState>) -> Self {
        let authenticated = state.auth.admits_peer(&entry.peer);
        Self {
            entry,
            state,
            authenticated,
            has_lock: false,
            incorrect_attempts: 0,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.entry.id
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_subscribed(&self) -> bool {
        self.entry.is_subscribed()
    }

    pub fn has_lock(&self) -> bool {
        self.has_lock
    }

    pub fn incorrect_attempts(&self) -> u32 {
        self.incorrect_attempts
    }

    /// Apply one inbound line. Raw engine commands produce no reply.
    pub fn handle_line(&mut self, line: &str) -> Option<Reply> {
        let command = Command::parse(line);
        if !self.state.auth.permits(command.gate(), self.authenticated) {
            return Some(Reply::AuthErr);
        }

        let reply = match command {
            Command::WhoAreYou => Reply::Iam,
            Command::WhatEngine => Reply::Engine(self.state.engine.name().to_string()),
            Command::Auth(key) => self.authenticate(key),
            Command::Sub => {
                if self.entry.subscribe() {
                    Reply::SubOk
                } else {
                    Reply::SubErr
                }
            }
            Command::Unsub => {
                if self.entry.unsubscribe() {
                    Reply::UnsubOk
                } else {
                    Reply::UnsubErr
                }
            }
            Command::Lock => {
                if !self.has_lock && self.state.locks.try_acquire(&self.entry.id) {
                    self.has_lock = true;
                    Reply::LockOk
                } else {
                    Reply::LockErr
                }
            }
            Command::Unlock => {
                if self.has_lock && self.state.locks.release(&self.entry.id) {
                    self.has_lock = false;
                    Reply::UnlockOk
                } else {
                    Reply::UnlockErr
                }
            }
            Command::Engine(raw) => {
                let raw = raw.trim_end_matches(['\r', '\n']);
                if raw.contains(['\r', '\n']) {
                    tracing::warn!(session_id = %self.entry.id, "Dropping multi-line engine command");
                    return None;
                }
                if let Err(e) = self.state.engine.send(raw) {
                    tracing::error!(session_id = %self.entry.id, error = %e, "Engine input unavailable");
                }
                return None;
            }
        };
        Some(reply)
    }

    fn authenticate(&mut self, key: Option<&str>) -> Reply {
        if key.is_none() {
            tracing::debug!(session_id = %self.entry.id, "auth without key");
        }
        if self.state.auth.attempt(key, &mut self.incorrect_attempts) {
            self.authenticated = true;
            Reply::AuthOk
        } else {
            tracing::debug!(
                session_id = %self.entry.id,
                incorrect_attempts = self.incorrect_attempts,
                "auth rejected"
            );
            Reply::AuthErr
        }
    }

    /// Read frames until the peer goes away, a write fails, or the session is
    /// closed from outside. Tears the session down on exit.
    pub async fn run<S>(mut self, mut inbound: S)
    where
        S: Stream<Item = Result<WsMessage, axum::Error>> + Unpin,
    {
        loop {
            let frame = tokio::select! {
                _ = self.entry.closed() => {
                    tracing::debug!(session_id = %self.entry.id, "Session closed by server");
                    break;
                }
                frame = inbound.next() => frame,
            };

            let line = match frame {
                Some(Ok(WsMessage::Text(text))) => text.as_str().to_owned(),
                Some(Ok(WsMessage::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => text.to_owned(),
                    Err(_) => {
                        tracing::warn!(session_id = %self.entry.id, "Ignoring non-UTF-8 binary frame");
                        continue;
                    }
                },
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::debug!(session_id = %self.entry.id, error = %e, "read");
                    break;
                }
            };

            tracing::debug!(session_id = %self.entry.id, line = %line, "recv");
            if let Some(reply) = self.handle_line(&line) {
                if let Err(e) = self.entry.send(&reply.to_string()).await {
                    tracing::debug!(session_id = %self.entry.id, error = %e, "write");
                    break;
                }
            }
        }

        self.teardown().await;
    }

    async fn teardown(self) {
        let id = &self.entry.id;
        if self.state.locks.release(id) {
            tracing::info!(session_id = %id, "Released engine lock on disconnect");
        }
        self.state.registry.unregister(id);
        self.entry.close();
        self.entry.shutdown_transport().await;
    }
}
