use log::{debug, info};
use tokio::task::JoinHandle;

/// Live push channel opened by the SDK.
pub trait Connection: Send {
    fn close(&mut self);
}

/// Handler registered on a [`Connection`].
pub trait Listener: Send {
    fn unsubscribe(&mut self);
}

/// Listener backed by a spawned task draining the feed.
pub struct TaskListener {
    handle: JoinHandle<()>,
}

impl TaskListener {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }
}

impl Listener for TaskListener {
    fn unsubscribe(&mut self) {
        self.handle.abort();
    }
}

/// Holds at most one `(connection, listener)` pair.
pub struct Subscription {
    name: String,
    handle: Option<(Box<dyn Connection>, Box<dyn Listener>)>,
}

impl Subscription {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            handle: None,
        }
    }

    /// Store a new handle pair, closing any existing one first.
    pub fn replace(&mut self, connection: Box<dyn Connection>, listener: Box<dyn Listener>) {
        self.unsubscribe();
        self.handle = Some((connection, listener));
        info!("{}: subscribed", self.name);
    }

    /// Stop the listener and close the connection. Returns false if there
    /// was no subscription.
    pub fn unsubscribe(&mut self) -> bool {
        match self.handle.take() {
            Some((mut connection, mut listener)) => {
                listener.unsubscribe();
                connection.close();
                info!("{}: unsubscribed", self.name);
                true
            }
            None => {
                debug!("{}: no active subscription", self.name);
                false
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
