pub mod auth;
pub mod broadcaster;
pub mod error;
pub mod lock;
pub mod outbound;
pub mod registry;
pub mod server;
pub mod session;

pub use auth::{AuthGate, AuthPolicy, MAX_AUTH_ATTEMPTS};
pub use broadcaster::Broadcaster;
pub use error::ServerError;
pub use lock::LockArbiter;
pub use registry::{SessionEntry, SessionRegistry};
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
pub use session::{Session, SharedState};
