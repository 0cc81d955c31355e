//! Single-flight gate and generation tokens for explore runs.
//!
//! A [`SessionGate`] holds the generation counter and the running flag. A
//! run acquires a [`RunToken`] through [`SessionGate::try_begin`]; the token
//! remembers the generation it started under. [`SessionGate::invalidate`]
//! bumps the generation and clears the flag, after which every outstanding
//! token fails its next [`RunToken::checkpoint`]. Dropping a token clears
//! the flag only if no newer generation has started.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The run was superseded by a newer generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled {
    pub run_generation: u64,
    pub current_generation: u64,
}

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "run from generation {} superseded by generation {}",
            self.run_generation, self.current_generation
        )
    }
}

impl std::error::Error for Cancelled {}

#[derive(Debug, Default)]
struct GateState {
    generation: u64,
    running: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    state: Arc<Mutex<GateState>>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    // The critical sections never panic, so a poisoned lock still holds
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Claim the running flag, or `None` if a run already holds it.
    pub fn try_begin(&self) -> Option<RunToken> {
        let mut state = self.lock();
        if state.running {
            return None;
        }
        state.running = true;
        Some(RunToken {
            gate: self.clone(),
            generation: state.generation,
        })
    }

    /// Supersede any in-flight run. Returns the new generation.
    pub fn invalidate(&self) -> u64 {
        let mut state = self.lock();
        state.generation += 1;
        state.running = false;
        state.generation
    }
}

/// Proof that a run holds the gate, tagged with its starting generation.
#[derive(Debug)]
pub struct RunToken {
    gate: SessionGate,
    generation: u64,
}

impl RunToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.gate.generation() == self.generation
    }

    /// `Err(Cancelled)` once the session has moved past this run.
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        let current_generation = self.gate.generation();
        if current_generation == self.generation {
            Ok(())
        } else {
            Err(Cancelled {
                run_generation: self.generation,
                current_generation,
            })
        }
    }
}

impl Drop for RunToken {
    fn drop(&mut self) {
        let mut state = self.gate.lock();
        if state.generation == self.generation {
            state.running = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight() {
        let gate = SessionGate::new();
        let token = gate.try_begin().unwrap();
        assert!(gate.is_running());
        assert!(gate.try_begin().is_none());

        drop(token);
        assert!(!gate.is_running());
        assert!(gate.try_begin().is_some());
    }

    #[test]
    fn test_invalidate_cancels_token() {
        let gate = SessionGate::new();
        let token = gate.try_begin().unwrap();
        assert!(token.checkpoint().is_ok());

        assert_eq!(gate.invalidate(), 1);
        assert!(!gate.is_running());
        assert_eq!(
            token.checkpoint(),
            Err(Cancelled {
                run_generation: 0,
                current_generation: 1
            })
        );
        assert!(!token.is_current());
    }

    #[test]
    fn test_stale_token_does_not_clear_newer_run() {
        let gate = SessionGate::new();
        let stale = gate.try_begin().unwrap();
        gate.invalidate();

        let fresh = gate.try_begin().unwrap();
        assert_eq!(fresh.generation(), 1);

        drop(stale);
        assert!(gate.is_running());
        assert!(fresh.checkpoint().is_ok());

        drop(fresh);
        assert!(!gate.is_running());
    }

    #[test]
    fn test_token_released_on_panic_unwind() {
        let gate = SessionGate::new();
        let inner = gate.clone();
        let result = std::panic::catch_unwind(move || {
            let _token = inner.try_begin().unwrap();
            panic!("commit failed");
        });

        assert!(result.is_err());
        assert!(!gate.is_running());
    }
}
