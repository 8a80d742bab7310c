//! Mock wireless link.

use std::net::{IpAddr, Ipv4Addr};

use doorcam_core::NetworkCredentials;
use tracing::debug;

use crate::{HardwareError, Result, traits::NetworkLink};

/// Link that reports association after a fixed number of status polls.
#[derive(Debug)]
pub struct MockLink {
    polls_until_associated: u32,
    polls: u32,
    started: bool,
    address: IpAddr,
}

impl MockLink {
    /// Link that associates on the first poll, with a loopback address.
    pub fn new() -> Self {
        Self::with_delay(0)
    }

    /// Link that needs `polls` unsuccessful status checks first.
    pub fn with_delay(polls: u32) -> Self {
        Self {
            polls_until_associated: polls,
            polls: 0,
            started: false,
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        }
    }

    /// Status polls seen so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    fn associated(&self) -> bool {
        self.started && self.polls > self.polls_until_associated
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkLink for MockLink {
    async fn associate(&mut self, credentials: &NetworkCredentials) -> Result<()> {
        if credentials.ssid.is_empty() {
            return Err(HardwareError::association("SSID is empty"));
        }
        debug!(ssid = %credentials.ssid, "Mock link associating");
        self.started = true;
        Ok(())
    }

    async fn is_associated(&mut self) -> bool {
        if self.started {
            self.polls = self.polls.saturating_add(1);
        }
        self.associated()
    }

    fn local_ip(&self) -> Option<IpAddr> {
        self.associated().then_some(self.address)
    }
}
