//! Observable current-value streams.

use std::sync::Arc;
use tokio::sync::watch;

/// Holds a current value and notifies subscribers on every change.
pub struct StateFlow<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for StateFlow<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> StateFlow<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn value(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn set_value(&self, value: T) {
        self.sender.send_replace(value);
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    pub fn same_flow(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.sender, &other.sender)
    }

    /// Read-only view that applies `transform` to every value of this flow.
    pub fn map<R, F>(&self, transform: F) -> MappedStateFlow<T, R>
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: 'static,
    {
        MappedStateFlow {
            source: self.clone(),
            transform: Arc::new(transform),
        }
    }
}

type Transform<T, R> = Arc<dyn Fn(&T) -> R + Send + Sync>;

pub struct MappedStateFlow<T, R> {
    source: StateFlow<T>,
    transform: Transform<T, R>,
}

impl<T, R> Clone for MappedStateFlow<T, R> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            transform: Arc::clone(&self.transform),
        }
    }
}

impl<T: Clone + Send + Sync + 'static, R> MappedStateFlow<T, R> {
    pub fn value(&self) -> R {
        (self.transform)(&*self.source.sender.borrow())
    }

    pub fn subscribe(&self) -> MappedSubscription<T, R> {
        MappedSubscription {
            receiver: self.source.subscribe(),
            transform: Arc::clone(&self.transform),
        }
    }
}

pub struct MappedSubscription<T, R> {
    receiver: watch::Receiver<T>,
    transform: Transform<T, R>,
}

impl<T, R> MappedSubscription<T, R> {
    pub fn current(&self) -> R {
        (self.transform)(&*self.receiver.borrow())
    }

    /// Waits for the next change and returns its transformed value, or
    /// `None` once every handle to the source flow is gone.
    pub async fn changed(&mut self) -> Option<R> {
        self.receiver.changed().await.ok()?;
        Some((self.transform)(&*self.receiver.borrow_and_update()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_view_tracks_source() {
        let flow = StateFlow::new(2);
        let doubled = flow.map(|v| v * 2);
        assert_eq!(doubled.value(), 4);

        flow.set_value(5);
        assert_eq!(doubled.value(), 10);
        assert_eq!(flow.value(), 5);
    }

    #[tokio::test]
    async fn subscription_sees_changes() {
        let flow = StateFlow::new("light".to_string());
        let mut lengths = flow.map(|theme: &String| theme.len()).subscribe();
        assert_eq!(lengths.current(), 5);

        let writer = flow.clone();
        tokio::spawn(async move {
            writer.set_value("dark".to_string());
        });

        assert_eq!(lengths.changed().await, Some(4));
    }
}
