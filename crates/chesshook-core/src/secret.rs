use rand::distributions::Alphanumeric;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};

const PASSKEY_LEN: usize = 10;

/// Process-wide passkey clients echo back with `auth <key>`.
///
/// Generated once at startup and never sent over the wire by the server.
#[derive(Clone)]
pub struct SharedSecret(SecretString);

impl SharedSecret {
    /// Random `[a-zA-Z0-9]{10}` passkey.
    pub fn generate() -> Self {
        let key: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(PASSKEY_LEN)
            .map(char::from)
            .collect();
        Self(SecretString::from(key))
    }

    pub fn from_string(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    pub fn matches(&self, candidate: &str) -> bool {
        constant_time_eq(self.0.expose_secret().as_bytes(), candidate.as_bytes())
    }

    /// The raw passkey, for the operator startup banner.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
