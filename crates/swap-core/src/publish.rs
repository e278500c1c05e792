//! Single-writer publish points
//!
//! A [`Published`] value mirrors the latest known state. Readers either poll
//! it with [`Published::get`] or subscribe; a fresh subscriber immediately
//! observes the current value.

use std::fmt;

use tokio::sync::watch;

pub struct Published<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Published<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Overwrite the value and notify subscribers
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Latest value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for Published<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Published<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Published").field(&*self.tx.borrow()).finish()
    }
}
