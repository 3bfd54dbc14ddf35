//! Single-instance guard for the engine.
//!
//! Only one [`crate::engine::Engine`] may be alive per process because it owns
//! the one window and the platform event loop. The guard is a token that cannot
//! be cloned: holding it is the proof that no other engine exists. Dropping it
//! (or calling [`EngineToken::release`]) frees the slot.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{EngineError, Result};

static ENGINE_ALIVE: AtomicBool = AtomicBool::new(false);

#[derive(Debug)]
pub struct EngineToken {
    released: bool,
}

impl EngineToken {
    /// Claims the process-wide slot or fails with [`EngineError::AlreadyExists`].
    pub fn acquire() -> Result<Self> {
        ENGINE_ALIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::AlreadyExists)?;
        log::debug!("engine token acquired");
        Ok(Self { released: false })
    }

    /// Frees the slot. Fails with [`EngineError::NotCreated`] if nothing held it.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        release_slot()
    }

    pub fn is_held() -> bool {
        ENGINE_ALIVE.load(Ordering::Acquire)
    }
}

impl Drop for EngineToken {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = release_slot() {
                log::error!("{}", e);
            }
        }
    }
}

fn release_slot() -> Result<()> {
    ENGINE_ALIVE
        .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
        .map(|_| log::debug!("engine token released"))
        .map_err(|_| EngineError::NotCreated)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The slot is process-wide, so every assertion lives in one test to keep
    // parallel test threads from racing on it.
    #[test]
    fn token_enforces_a_single_live_instance() {
        let first = EngineToken::acquire().expect("first acquire");
        assert!(EngineToken::is_held());
        assert!(matches!(
            EngineToken::acquire(),
            Err(EngineError::AlreadyExists)
        ));

        first.release().expect("release held token");
        assert!(!EngineToken::is_held());
        assert!(matches!(release_slot(), Err(EngineError::NotCreated)));

        let again = EngineToken::acquire().expect("acquire after release");
        drop(again);
        assert!(!EngineToken::is_held());

        let dropped = EngineToken::acquire().expect("acquire after drop");
        drop(dropped);
    }
}
