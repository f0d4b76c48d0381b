/// Engine I/O failures. Every variant except `InputClosed` is fatal to the
/// server: the engine has no restart path.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine command is empty")]
    EmptyCommand,

    #[error("failed to spawn engine `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine {0} pipe unavailable")]
    MissingPipe(&'static str),

    #[error("failed to write to engine: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to read from engine: {0}")]
    Read(#[source] std::io::Error),

    #[error("engine exited")]
    Exited,

    #[error("engine input queue closed")]
    InputClosed,

    #[error("engine task failed: {0}")]
    Task(String),
}
