//! Generation-tagged slots for cancelable lookups.
//!
//! Each lookup kind (suggestions, destinations) owns one [`LookupSlot`]. Issuing
//! a new lookup bumps the slot's generation and aborts the previous task; a
//! task may only publish results while its generation is still current. The
//! check and the publish happen under the slot lock, so an aborted task that
//! is already past its last `.await` still cannot overwrite newer state.

use tokio::task::JoinHandle;

/// The two kinds of cancelable lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Suggestions,
    Destinations,
}

impl LookupKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Suggestions => "suggestions",
            Self::Destinations => "destinations",
        }
    }
}

/// The current lookup of one kind.
#[derive(Debug, Default)]
pub struct LookupSlot {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl LookupSlot {
    /// Invalidates the current lookup and returns the next generation.
    pub fn cancel(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.generation
    }

    /// True if `generation` is the most recently issued one.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Records the task running `generation`.
    ///
    /// A task for a generation that is no longer current is aborted right away.
    pub fn install(&mut self, generation: u64, task: JoinHandle<()>) {
        if self.is_current(generation) {
            self.task = Some(task);
        } else {
            task.abort();
        }
    }
}

impl Drop for LookupSlot {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_aborts_and_advances_generation() {
        let mut slot = LookupSlot::default();
        let first = slot.cancel();
        slot.install(first, tokio::spawn(std::future::pending::<()>()));

        let second = slot.cancel();
        assert!(second > first);
        assert!(!slot.is_current(first));
        assert!(slot.is_current(second));
        assert!(slot.task.is_none());
    }

    #[tokio::test]
    async fn test_install_for_stale_generation_aborts_task() {
        let mut slot = LookupSlot::default();
        let stale = slot.cancel();
        slot.cancel();

        let task = tokio::spawn(std::future::pending::<()>());
        let abort = task.abort_handle();
        slot.install(stale, task);

        assert!(slot.task.is_none());
        for _ in 0..10 {
            if abort.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(abort.is_finished());
    }
}
