use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Slot for a lazily computed value that is read without the owner's lock.
///
/// Loads are wait-free: a reader takes a counted reference to whatever was
/// last stored and never blocks on a writer. Writers are expected to hold the
/// owner's lock, so a value is stored at most once per change.
pub struct Published<T> {
    slot: ArcSwapOption<T>,
}

impl<T> Default for Published<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Published<T> {
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    pub fn is_published(&self) -> bool {
        self.slot.load().is_some()
    }

    pub fn load(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    pub fn store(&self, value: Arc<T>) {
        self.slot.store(Some(value));
    }
}
