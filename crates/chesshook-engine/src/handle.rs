use std::sync::{Arc, OnceLock};

use tokio::sync::mpsc;

use crate::error::EngineError;

/// Engine name from its `id name` line. Set at most once.
#[derive(Debug, Default)]
pub struct EngineName(OnceLock<String>);

impl EngineName {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a name was already recorded.
    pub fn set(&self, name: &str) -> bool {
        self.0.set(name.to_string()).is_ok()
    }

    pub fn get(&self) -> Option<&str> {
        self.0.get().map(String::as_str)
    }
}

/// Cloneable handle for submitting lines to the engine and reading its name.
///
/// The input queue is unbounded: there is no backpressure and no cap on
/// pending commands.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    input: mpsc::UnboundedSender<String>,
    name: Arc<EngineName>,
}

impl EngineHandle {
    pub fn new(input: mpsc::UnboundedSender<String>, name: Arc<EngineName>) -> Self {
        Self { input, name }
    }

    /// A handle not attached to any process; the receiver sees every line
    /// submitted through it.
    pub fn detached() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx, Arc::new(EngineName::new())), rx)
    }

    pub fn send(&self, line: impl Into<String>) -> Result<(), EngineError> {
        self.input
            .send(line.into())
            .map_err(|_| EngineError::InputClosed)
    }

    /// Engine name, or an empty string until the engine has identified itself.
    pub fn name(&self) -> &str {
        self.name.get().unwrap_or("")
    }

    pub fn name_cell(&self) -> &Arc<EngineName> {
        &self.name
    }
}
