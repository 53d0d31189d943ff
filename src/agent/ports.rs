//! Reservable pool of agent communication endpoints
//!
//! Launched agents listen on localhost ports drawn from a fixed range.
//! Reservations are guards: dropping one returns the port to the pool, so
//! an aborted launch can never leak endpoints.

use crate::error::ArenaError;
use std::sync::{Arc, Mutex};

/// Shared pool of reservable localhost ports.
#[derive(Debug)]
pub struct PortPool {
    free: Mutex<Vec<u16>>,
}

impl PortPool {
    /// Create a pool covering `start..=end`.
    pub fn new(start: u16, end: u16) -> Self {
        Self {
            free: Mutex::new((start..=end).collect()),
        }
    }

    /// Reserve one port; released when the returned guard drops.
    pub fn reserve(self: &Arc<Self>) -> crate::error::Result<ReservedPort> {
        let mut free = self.free.lock().map_err(|_| ArenaError::Internal {
            message: "Failed to acquire port pool lock".to_string(),
        })?;

        let port = free.pop().ok_or(ArenaError::PortsExhausted)?;
        Ok(ReservedPort {
            port,
            pool: Arc::clone(self),
        })
    }

    /// Number of ports currently available.
    pub fn available(&self) -> usize {
        self.free.lock().map(|free| free.len()).unwrap_or(0)
    }

    fn release(&self, port: u16) {
        if let Ok(mut free) = self.free.lock() {
            free.push(port);
        }
    }
}

/// Guard holding one reserved port.
#[derive(Debug)]
pub struct ReservedPort {
    port: u16,
    pool: Arc<PortPool>,
}

impl ReservedPort {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Local address an agent should listen on.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

impl Drop for ReservedPort {
    fn drop(&mut self) {
        self.pool.release(self.port);
    }
}
