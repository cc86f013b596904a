use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::Mutex;
use log::info;
use uuid::Uuid;

use super::Session;

/// Shared access to one parked session. Hold the lock for the whole of a
/// `submit_step` so overlapping requests for the same respondent run one
/// after the other.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

/// Sessions of every respondent a host is currently serving, keyed by id.
///
/// Cloning shares the same map. Sessions never see each other; the registry
/// only parks them between requests.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Uuid {
        let session = Session::new();
        let id = session.id;
        self.sessions
            .lock()
            .insert(id, Arc::new(tokio::sync::Mutex::new(session)));
        info!("🆕 Session {} created", id);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.lock().get(id).cloned()
    }

    /// Copy of the session as it stands once any in-flight request is done.
    pub async fn snapshot(&self, id: &Uuid) -> Option<Session> {
        let handle = self.get(id)?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Forgets the session. Requests already holding its handle can finish.
    pub fn remove(&self, id: &Uuid) -> Option<SessionHandle> {
        let removed = self.sessions.lock().remove(id);
        if removed.is_some() {
            info!("🗑️ Session {} removed", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handles_share_one_session() {
        let registry = SessionRegistry::new();
        let id = registry.create();
        assert_eq!(registry.len(), 1);

        let first = registry.get(&id).unwrap();
        let second = registry.get(&id).unwrap();
        first.lock().await.current_step = 2;

        assert_eq!(second.lock().await.current_step(), 2);
        assert_eq!(registry.snapshot(&id).await.unwrap().current_step(), 2);

        registry.remove(&id);
        assert!(registry.get(&id).is_none());
        assert!(registry.snapshot(&id).await.is_none());
        assert!(registry.is_empty());
    }
}
