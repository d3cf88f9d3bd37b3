//! Rotation over a fixed set of relays with per-relay usage caps.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::RelayCredential;

#[derive(Debug)]
struct PooledRelay {
    credential: Arc<RelayCredential>,
    /// 0 means unlimited.
    cap: u32,
    used: u32,
}

impl PooledRelay {
    fn is_eligible(&self) -> bool {
        self.credential.enabled && (self.cap == 0 || self.used < self.cap)
    }
}

#[derive(Debug)]
struct PoolState {
    relays: Vec<PooledRelay>,
    cursor: usize,
}

/// A relay handed out by [`RelayPool::acquire_next`].
#[derive(Debug, Clone)]
pub struct AcquiredRelay {
    /// Position of the relay in the configured list.
    pub index: usize,
    pub credential: Arc<RelayCredential>,
}

/// Usage of one pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotUsage {
    pub used: u32,
    pub cap: u32,
}

/// Per-run pool of relays.
///
/// Selection and the usage increment happen under one lock, so concurrent
/// callers can never push a relay past its cap.
#[derive(Debug)]
pub struct RelayPool {
    state: Mutex<PoolState>,
}

impl RelayPool {
    /// Builds a pool with one cap per credential. Missing caps are unlimited
    /// and surplus caps are ignored.
    pub fn new(credentials: Vec<RelayCredential>, caps: &[u32]) -> Self {
        let relays = credentials
            .into_iter()
            .enumerate()
            .map(|(index, credential)| PooledRelay {
                credential: Arc::new(credential),
                cap: caps.get(index).copied().unwrap_or(0),
                used: 0,
            })
            .collect();

        Self {
            state: Mutex::new(PoolState { relays, cursor: 0 }),
        }
    }

    /// Hands out the next eligible relay in circular order starting at the
    /// cursor, charging it one use. Returns `None` when every relay is
    /// disabled or at its cap; the cursor does not move in that case.
    pub fn acquire_next(&self) -> Option<AcquiredRelay> {
        let mut state = self.state.lock();
        let len = state.relays.len();

        let index = (0..len)
            .map(|offset| (state.cursor + offset) % len)
            .find(|&index| state.relays[index].is_eligible())?;

        let relay = &mut state.relays[index];
        relay.used += 1;
        let credential = Arc::clone(&relay.credential);
        state.cursor = (index + 1) % len;

        Some(AcquiredRelay { index, credential })
    }

    /// Zeroes every usage counter. The cursor and credentials are untouched.
    pub fn reset_counters(&self) {
        self.state
            .lock()
            .relays
            .iter_mut()
            .for_each(|relay| relay.used = 0);
    }

    pub fn len(&self) -> usize {
        self.state.lock().relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().relays.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.state.lock().cursor
    }

    pub fn usage(&self) -> Vec<SlotUsage> {
        self.state
            .lock()
            .relays
            .iter()
            .map(|relay| SlotUsage {
                used: relay.used,
                cap: relay.cap,
            })
            .collect()
    }
}
