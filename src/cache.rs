use std::mem;
use std::sync::Arc;
use parking_lot::RwLock;

/// Lookup table replaced wholesale on refresh. Readers take a cheap
/// `Arc` clone and never observe a partially built value.
#[derive(Debug, Default)]
pub struct Cache<T> {
    value: RwLock<Arc<T>>,
}

impl<T> Cache<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(Arc::new(value)),
        }
    }

    pub fn load(&self) -> Arc<T> {
        self.value.read().clone()
    }

    pub fn store(&self, value: T) -> Arc<T> {
        let mut guard = self.value.write();
        mem::replace(&mut *guard, Arc::new(value))
    }
}
