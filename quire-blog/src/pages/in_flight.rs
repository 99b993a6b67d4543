use std::collections::HashSet;

use anyhow::Result;
use parking_lot::Mutex;
use quire_core::errors::QuireError;

/// Actions currently running on a page. A second submission of a running
/// action is rejected instead of queued.
#[derive(Debug, Default)]
pub struct InFlight {
    active: Mutex<HashSet<&'static str>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, action: &'static str) -> Result<InFlightGuard<'_>> {
        if !self.active.lock().insert(action) {
            return Err(QuireError::too_many_requests(format!("{action} is already in progress."))
                .into_anyhow());
        }
        Ok(InFlightGuard {
            flights: self,
            action,
        })
    }

    pub fn is_active(&self, action: &str) -> bool {
        self.active.lock().contains(action)
    }
}

/// Clears the flag when dropped, including on early return.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    flights: &'a InFlight,
    action: &'static str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flights.active.lock().remove(self.action);
    }
}
