use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Lock the catalog slot, recovering the guard if a previous holder panicked.
///
/// The slot only ever holds whole values (empty, a pending load, or a published
/// snapshot), so a poisoned guard still contains a consistent state.
pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = target,
                lock_kind = "mutex.lock",
                result = "poisoned_recovered",
                "Recovered from poisoned catalog lock"
            );
            poisoned.into_inner()
        }
    }
}
