pub mod errors;
pub mod ids;
pub mod protocol;
pub mod secret;

pub use errors::TransportError;
pub use ids::SessionId;
pub use protocol::{Command, Gate, Reply};
pub use secret::SharedSecret;
