//! Process-wide session store with an observer contract.
//!
//! The original application let every screen hold its own copy of "current
//! user", loosely synced by a shared auth event stream. Here a single store
//! owns that state: readers take a snapshot through [`SessionStore::current`],
//! and interested parties subscribe to sign-in/out events over a broadcast
//! channel. Dropping the receiver is the unsubscribe; subscriptions must not
//! outlive the scope that took them.

use std::sync::RwLock;

use tokio::sync::broadcast;

use crate::models::AuthUser;

/// Auth state transitions broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthUser),
    SignedOut,
}

/// Single owner of the client-visible auth state.
pub struct SessionStore {
    current: RwLock<Option<AuthUser>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionStore {
    /// Create a store whose event channel buffers `capacity` events per
    /// subscriber before lagging.
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            current: RwLock::new(None),
            events,
        }
    }

    /// Snapshot of the signed-in user, if any.
    pub fn current(&self) -> Option<AuthUser> {
        self.current.read().expect("session lock poisoned").clone()
    }

    /// Record a sign-in and notify subscribers.
    pub fn signed_in(&self, user: AuthUser) {
        *self.current.write().expect("session lock poisoned") = Some(user.clone());
        // Nobody listening is fine.
        let _ = self.events.send(AuthEvent::SignedIn(user));
    }

    /// Record a sign-out and notify subscribers.
    pub fn signed_out(&self) {
        *self.current.write().expect("session lock poisoned") = None;
        let _ = self.events.send(AuthEvent::SignedOut);
    }

    /// Subscribe to auth events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(email: &str) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_current_reflects_last_event() {
        let store = SessionStore::default();
        assert!(store.current().is_none());

        let u = user("nurse@example.com");
        store.signed_in(u.clone());
        assert_eq!(store.current(), Some(u));

        store.signed_out();
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_each_receive_events() {
        let store = SessionStore::default();
        let mut a = store.subscribe();
        let mut b = store.subscribe();

        let u = user("nurse@example.com");
        store.signed_in(u.clone());

        assert_eq!(a.recv().await.unwrap(), AuthEvent::SignedIn(u.clone()));
        assert_eq!(b.recv().await.unwrap(), AuthEvent::SignedIn(u));
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let store = SessionStore::default();
        let rx = store.subscribe();
        assert_eq!(store.subscriber_count(), 1);
        drop(rx);
        assert_eq!(store.subscriber_count(), 0);

        // Emitting with no subscribers must not error or panic.
        store.signed_out();
    }

    #[tokio::test]
    async fn test_events_are_ordered() {
        let store = SessionStore::default();
        let mut rx = store.subscribe();

        let u = user("a@example.com");
        store.signed_in(u.clone());
        store.signed_out();

        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedIn(u));
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedOut);
    }
}
