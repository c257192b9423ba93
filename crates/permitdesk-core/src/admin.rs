//! Administrator gate
//!
//! A single shared static passphrase gates administrative actions
//! (approve/reject/delete) and bypassing the minimum safety-training
//! watch time. This is an intentionally simple mechanism; the hosted
//! backend performs no additional authorization.

use crate::config::AdminConfig;

/// Verifies the shared administrator passphrase
///
/// Constructed from [`AdminConfig`]; when no passphrase is configured,
/// every verification fails and admin actions are unavailable.
#[derive(Debug, Clone)]
pub struct AdminGate {
    passphrase: Option<String>,
    min_training_watch_secs: u32,
}

impl AdminGate {
    /// Build a gate from the admin configuration section
    pub fn from_config(config: &AdminConfig) -> Self {
        Self {
            passphrase: config.passphrase.clone(),
            min_training_watch_secs: config.min_training_watch_secs,
        }
    }

    /// Check a passphrase attempt against the configured value
    pub fn verify(&self, attempt: &str) -> bool {
        match &self.passphrase {
            Some(expected) => !expected.is_empty() && constant_time_eq(expected, attempt),
            None => false,
        }
    }

    /// Minimum required watch time for the safety-training video
    pub fn min_training_watch_secs(&self) -> u32 {
        self.min_training_watch_secs
    }

    /// Whether a passphrase attempt authorizes skipping the minimum
    /// training watch time
    pub fn may_bypass_training(&self, attempt: &str) -> bool {
        self.verify(attempt)
    }
}

/// Byte-wise comparison that does not short-circuit on the first mismatch.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(passphrase: Option<&str>) -> AdminGate {
        AdminGate::from_config(&AdminConfig {
            passphrase: passphrase.map(String::from),
            min_training_watch_secs: 300,
        })
    }

    #[test]
    fn test_verify_correct_passphrase() {
        let gate = gate(Some("site-1234"));
        assert!(gate.verify("site-1234"));
        assert!(!gate.verify("site-0000"));
        assert!(!gate.verify(""));
    }

    #[test]
    fn test_no_passphrase_disables_admin() {
        let gate = gate(None);
        assert!(!gate.verify("anything"));
        assert!(!gate.verify(""));
    }

    #[test]
    fn test_empty_passphrase_disables_admin() {
        let gate = gate(Some(""));
        assert!(!gate.verify(""));
    }

    #[test]
    fn test_training_bypass_follows_verify() {
        let gate = gate(Some("site-1234"));
        assert!(gate.may_bypass_training("site-1234"));
        assert!(!gate.may_bypass_training("nope"));
        assert_eq!(gate.min_training_watch_secs(), 300);
    }
}
