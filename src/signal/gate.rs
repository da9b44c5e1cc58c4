use serde::Serialize;

use crate::signal::navigation::NavSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Scheduled { navigation: Option<NavSource> },
}

/// One coalesced "DOM settled, re-evaluate" signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settle {
    /// Set when at least one of the coalesced triggers was a navigation.
    pub navigation: Option<NavSource>,
    /// Raw notifications folded into this settle.
    pub coalesced: u32,
}

/// Coalesces bursts of mutation and navigation notifications.
///
/// Idle → Scheduled on the first notification; later notifications are folded
/// in until the scheduled evaluation has run and `complete` is called. A
/// navigation that arrives while a mutation-only settle is pending upgrades it
/// rather than being dropped.
#[derive(Debug)]
pub struct MutationGate {
    state: GateState,
    coalesced: u32,
    dropped: u64,
}

impl Default for MutationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationGate {
    pub fn new() -> Self {
        Self {
            state: GateState::Idle,
            coalesced: 0,
            dropped: 0,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self.state, GateState::Scheduled { .. })
    }

    /// Total notifications absorbed by an already-scheduled evaluation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Returns true when this notification armed a new evaluation.
    pub fn on_mutations(&mut self, count: u32) -> bool {
        let count = count.max(1);
        match self.state {
            GateState::Idle => {
                self.state = GateState::Scheduled { navigation: None };
                self.coalesced = count;
                self.dropped += u64::from(count - 1);
                true
            }
            GateState::Scheduled { .. } => {
                self.coalesced = self.coalesced.saturating_add(count);
                self.dropped += u64::from(count);
                false
            }
        }
    }

    pub fn on_navigation(&mut self, source: NavSource) -> bool {
        match self.state {
            GateState::Idle => {
                self.state = GateState::Scheduled {
                    navigation: Some(source),
                };
                self.coalesced = 1;
                true
            }
            GateState::Scheduled { navigation } => {
                self.state = GateState::Scheduled {
                    navigation: navigation.or(Some(source)),
                };
                self.coalesced = self.coalesced.saturating_add(1);
                self.dropped += 1;
                false
            }
        }
    }

    /// The pending settle, if any. The gate stays scheduled until `complete`.
    pub fn pending(&self) -> Option<Settle> {
        match self.state {
            GateState::Idle => None,
            GateState::Scheduled { navigation } => Some(Settle {
                navigation,
                coalesced: self.coalesced,
            }),
        }
    }

    /// Re-arm after the deferred evaluation has run.
    pub fn complete(&mut self) {
        self.state = GateState::Idle;
        self.coalesced = 0;
    }
}
