pub mod hub;
pub mod watcher;

/// Fan-out seam between the change watcher and the push transport.
///
/// Delivery is fire-and-forget: implementations send to whoever is connected
/// right now and swallow transport errors.
pub trait Broadcast: Send + Sync {
    fn broadcast(&self, message: &str);
}
