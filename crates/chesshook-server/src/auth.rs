use std::net::SocketAddr;

use chesshook_core::{Gate, SharedSecret};

/// Failed `auth` attempts after which a session can never authenticate.
pub const MAX_AUTH_ATTEMPTS: u32 = 3;

/// Which command classes require authentication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthPolicy {
    /// Gate `whatengine`, `sub` and `unsub`.
    pub read: bool,
    /// Gate `lock`, `unlock` and raw engine commands.
    pub write: bool,
    /// Loopback peers start authenticated.
    pub localhost_bypass: bool,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            read: false,
            write: true,
            localhost_bypass: true,
        }
    }
}

/// Validates the shared passkey and applies the per-class gates.
#[derive(Debug)]
pub struct AuthGate {
    secret: SharedSecret,
    policy: AuthPolicy,
}

impl AuthGate {
    pub fn new(secret: SharedSecret, policy: AuthPolicy) -> Self {
        Self { secret, policy }
    }

    pub fn policy(&self) -> AuthPolicy {
        self.policy
    }

    /// Whether a new connection from `peer` starts authenticated.
    pub fn admits_peer(&self, peer: &SocketAddr) -> bool {
        self.policy.localhost_bypass && peer.ip().to_canonical().is_loopback()
    }

    /// Check an `auth` attempt. A failure bumps `incorrect_attempts`; once it
    /// reaches [`MAX_AUTH_ATTEMPTS`] even the correct key is refused.
    pub fn attempt(&self, key: Option<&str>, incorrect_attempts: &mut u32) -> bool {
        let accepted = *incorrect_attempts < MAX_AUTH_ATTEMPTS
            && key.is_some_and(|k| self.secret.matches(k));
        if !accepted {
            *incorrect_attempts += 1;
        }
        accepted
    }

    pub fn permits(&self, gate: Gate, authenticated: bool) -> bool {
        match gate {
            Gate::Open => true,
            Gate::Read => authenticated || !self.policy.read,
            Gate::Write => authenticated || !self.policy.write,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(policy: AuthPolicy) -> AuthGate {
        AuthGate::new(SharedSecret::from_string("passkey123"), policy)
    }

    #[test]
    fn correct_key_authenticates() {
        let gate = gate(AuthPolicy::default());
        let mut attempts = 0;
        assert!(gate.attempt(Some("passkey123"), &mut attempts));
        assert_eq!(attempts, 0);
    }

    #[test]
    fn failures_increment_by_one() {
        let gate = gate(AuthPolicy::default());
        let mut attempts = 0;
        assert!(!gate.attempt(Some("nope"), &mut attempts));
        assert_eq!(attempts, 1);
        assert!(!gate.attempt(None, &mut attempts));
        assert_eq!(attempts, 2);
        assert!(gate.attempt(Some("passkey123"), &mut attempts));
        assert_eq!(attempts, 2);
    }

    #[test]
    fn lockout_after_three_failures_is_permanent() {
        let gate = gate(AuthPolicy::default());
        let mut attempts = 0;
        for _ in 0..3 {
            assert!(!gate.attempt(Some("wrong"), &mut attempts));
        }
        assert_eq!(attempts, 3);
        for expected in 4..8 {
            assert!(!gate.attempt(Some("passkey123"), &mut attempts));
            assert_eq!(attempts, expected);
        }
    }

    #[test]
    fn loopback_bypass() {
        let gate_on = gate(AuthPolicy::default());
        let gate_off = gate(AuthPolicy {
            localhost_bypass: false,
            ..AuthPolicy::default()
        });

        let v4: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let v6: SocketAddr = "[::1]:50000".parse().unwrap();
        let mapped: SocketAddr = "[::ffff:127.0.0.1]:50000".parse().unwrap();
        let remote: SocketAddr = "203.0.113.9:50000".parse().unwrap();

        assert!(gate_on.admits_peer(&v4));
        assert!(gate_on.admits_peer(&v6));
        assert!(gate_on.admits_peer(&mapped));
        assert!(!gate_on.admits_peer(&remote));
        assert!(!gate_off.admits_peer(&v4));
    }

    #[test]
    fn gates_are_independent() {
        let read_only = gate(AuthPolicy {
            read: true,
            write: false,
            localhost_bypass: false,
        });
        assert!(!read_only.permits(Gate::Read, false));
        assert!(read_only.permits(Gate::Write, false));
        assert!(read_only.permits(Gate::Open, false));

        let write_only = gate(AuthPolicy {
            read: false,
            write: true,
            localhost_bypass: false,
        });
        assert!(write_only.permits(Gate::Read, false));
        assert!(!write_only.permits(Gate::Write, false));
        assert!(write_only.permits(Gate::Write, true));
    }
}
