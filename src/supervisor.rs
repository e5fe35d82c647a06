//! Connectivity supervisor.
//!
//! Runs on its own interval.  When the link port reports the link down,
//! it starts a reconnect and waits for it on the reactor timer, polling
//! the port every `poll` step up to the timeout.  The wait suspends only
//! the supervisor task; sensing and auto-control keep running.  On
//! success the tick reports [`LinkOutcome::Restored`].  Failure is
//! logged and retried on the next tick, with no escalation.
//!
//! The supervisor also publishes the last observed link state through
//! [`LinkState`], which the uplink and command-poll cycles consult to
//! skip network calls while the link is known to be down.

use core::cell::Cell;
use core::time::Duration;
use std::rc::Rc;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::LinkPort;
use crate::error::LinkFault;

// ───────────────────────────────────────────────────────────────
// Shared link state
// ───────────────────────────────────────────────────────────────

/// Last link state observed by the supervisor.
///
/// Cheap to clone; every clone shares the same cell.  Starts "up" so
/// the first network call is attempted before the supervisor has run.
#[derive(Debug, Clone)]
pub struct LinkState(Rc<Cell<bool>>);

impl LinkState {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_up(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, up: bool) {
        self.0.set(up);
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

/// What one supervisor tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The link was already up.
    Up,
    /// The link was down and came back.
    Restored,
    /// The link is down and the reconnect attempt failed.
    Down(LinkFault),
}

pub struct ConnectivitySupervisor {
    state: LinkState,
    reconnect_timeout: Duration,
    poll: Duration,
    attempts: u32,
}

impl ConnectivitySupervisor {
    pub fn new(state: LinkState, reconnect_timeout: Duration, poll: Duration) -> Self {
        Self {
            state,
            reconnect_timeout,
            poll,
            attempts: 0,
        }
    }

    /// Bounded first connect at boot.  Publishes the result without
    /// emitting loss/restore events.
    pub async fn boot_connect(&mut self, link: &mut impl LinkPort) -> Result<(), LinkFault> {
        if link.is_connected() {
            self.state.set(true);
            return Ok(());
        }
        let res = self.reconnect(link).await;
        self.state.set(res.is_ok());
        match res {
            Ok(()) => info!("LINK: up at boot"),
            Err(e) => warn!("LINK: boot connect failed ({}), supervisor will retry", e),
        }
        res
    }

    /// One supervisor pass.  Events go out through `emit`, which is
    /// only called between waits.
    pub async fn tick(
        &mut self,
        link: &mut impl LinkPort,
        mut emit: impl FnMut(&AppEvent),
    ) -> LinkOutcome {
        if link.is_connected() {
            self.state.set(true);
            return LinkOutcome::Up;
        }

        if self.state.is_up() {
            warn!("LINK: connection lost");
            self.state.set(false);
            emit(&AppEvent::LinkLost);
        }

        match self.reconnect(link).await {
            Ok(()) => {
                self.state.set(true);
                info!("LINK: restored");
                emit(&AppEvent::LinkRestored);
                LinkOutcome::Restored
            }
            Err(e) => {
                warn!("LINK: reconnect failed ({}), retrying next tick", e);
                LinkOutcome::Down(e)
            }
        }
    }

    /// Start one attempt, then poll until up or `reconnect_timeout`.
    async fn reconnect(&mut self, link: &mut impl LinkPort) -> Result<(), LinkFault> {
        self.attempts = self.attempts.wrapping_add(1);
        info!(
            "LINK: reconnecting (attempt {}, timeout {}s)",
            self.attempts,
            self.reconnect_timeout.as_secs()
        );
        link.begin_reconnect()?;

        let mut waited = Duration::ZERO;
        loop {
            if link.is_connected() {
                return Ok(());
            }
            if waited >= self.reconnect_timeout {
                return Err(LinkFault::Timeout);
            }
            let step = self.poll.min(self.reconnect_timeout - waited);
            async_io_mini::Timer::after(step).await;
            waited += step;
        }
    }

    pub fn link_state(&self) -> &LinkState {
        &self.state
    }

    /// Reconnect attempts since boot.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
