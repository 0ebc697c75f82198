//! Liveness probing
//!
//! Used to wait for a rebooting node to come back before trying SSH.

use std::time::Duration;

use tracing::Level;

use super::Host;
use super::local::LocalHost;

/// Cheap reachability check against an address
pub trait LivenessProbe {
    fn is_alive(&self, address: &str) -> bool;
}

/// Single ICMP echo from the control machine, bounded by `timeout`
#[derive(Debug, Clone)]
pub struct PingProbe {
    pub timeout: Duration,
}

impl Default for PingProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
        }
    }
}

impl PingProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn command(&self, address: &str) -> String {
        let secs = self.timeout.as_secs().max(1);
        format!("timeout {secs} ping -4 -c 1 {address}")
    }
}

impl LivenessProbe for PingProbe {
    fn is_alive(&self, address: &str) -> bool {
        match LocalHost::new().run_logged(&self.command(address), Level::DEBUG) {
            Ok(result) => result.success(),
            Err(e) => {
                tracing::debug!("ping {} failed to run: {}", address, e);
                false
            }
        }
    }
}
