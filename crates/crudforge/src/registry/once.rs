use crate::error::OrmResult;
use std::sync::{Mutex, OnceLock};

/// A write-once cell whose initializer may fail.
///
/// Concurrent callers block on the first initializer; a failed attempt leaves the cell
/// empty so a later call tries again.
pub(crate) struct OnceSlot<T> {
    value: OnceLock<T>,
    init: Mutex<()>,
}

impl<T> OnceSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    pub(crate) fn get_or_try_init(&self, f: impl FnOnce() -> OrmResult<T>) -> OrmResult<&T> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }
        // A panicking initializer never stored anything, so the poisoned guard is still usable.
        let _guard = self.init.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(value) = self.value.get() {
            return Ok(value);
        }
        let value = f()?;
        Ok(self.value.get_or_init(|| value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrmError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn failed_init_is_retried() {
        let slot = OnceSlot::<u32>::new();
        let err = slot
            .get_or_try_init(|| Err(OrmError::configuration("T", "bad")))
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(*slot.get_or_try_init(|| Ok(7)).unwrap(), 7);
        assert_eq!(*slot.get_or_try_init(|| Ok(8)).unwrap(), 7);
    }

    #[test]
    fn initializer_runs_once_under_contention() {
        let slot = Arc::new(OnceSlot::<usize>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let slot = slot.clone();
                let calls = calls.clone();
                std::thread::spawn(move || {
                    *slot
                        .get_or_try_init(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(std::time::Duration::from_millis(5));
                            Ok(42)
                        })
                        .unwrap()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
