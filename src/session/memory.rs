//! In-process ensemble
//!
//! Each member is registered under its `host:port` address with a connect
//! behavior and a [`MemoryStore`]. Members can share a store (a healthy
//! ensemble) or hold different ones (diverged or corrupt replicas). The
//! ensemble records every endpoint a session was opened for and counts
//! sessions that were opened but not yet closed.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{Session, SessionError, SessionFactory};
use crate::locator::Endpoint;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Hierarchical node map. The root node `/` always exists.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` at `path`, creating missing parents with empty data
    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        let mut nodes = lock(&self.nodes);
        Self::create_parents(&mut nodes, path);
        nodes.insert(path.to_string(), data.into());
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.nodes).get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        path == "/" || lock(&self.nodes).contains_key(path)
    }

    /// All node paths, sorted
    pub fn paths(&self) -> Vec<String> {
        lock(&self.nodes).keys().cloned().collect()
    }

    fn create_parents(nodes: &mut BTreeMap<String, Vec<u8>>, path: &str) {
        let mut prefix = String::with_capacity(path.len());
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        for segment in segments.iter().take(segments.len().saturating_sub(1)) {
            prefix.push('/');
            prefix.push_str(segment);
            nodes.entry(prefix.clone()).or_default();
        }
    }

    fn create_recursive(&self, path: &str) {
        let mut nodes = lock(&self.nodes);
        Self::create_parents(&mut nodes, path);
        nodes.entry(path.to_string()).or_default();
    }

    fn set(&self, path: &str, data: &[u8]) -> Result<(), SessionError> {
        let mut nodes = lock(&self.nodes);
        match nodes.get_mut(path) {
            Some(slot) => {
                *slot = data.to_vec();
                Ok(())
            }
            None => Err(SessionError::NoNode(path.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connect {
    Up,
    /// Never signals "connected"
    Unreachable,
    /// Fails the connect immediately
    Refusing,
    /// Sets the connected flag, but the connect wait never resolves
    Unsignalled,
}

/// Behavior of one ensemble member
#[derive(Debug, Clone)]
pub struct Member {
    connect: Connect,
    store: MemoryStore,
    connect_delay: Duration,
    operation_delay: Duration,
    failing_operations: bool,
}

impl Member {
    /// A reachable member serving `store`
    pub fn up(store: MemoryStore) -> Self {
        Self {
            connect: Connect::Up,
            store,
            connect_delay: Duration::ZERO,
            operation_delay: Duration::ZERO,
            failing_operations: false,
        }
    }

    /// A member that never reaches "connected"
    pub fn unreachable() -> Self {
        Self {
            connect: Connect::Unreachable,
            ..Self::up(MemoryStore::new())
        }
    }

    /// A member that rejects connections outright
    pub fn refusing() -> Self {
        Self {
            connect: Connect::Refusing,
            ..Self::up(MemoryStore::new())
        }
    }

    /// A member whose session reports connected through its flag only
    ///
    /// Models the connected event landing in the same tick as the deadline.
    pub fn unsignalled(store: MemoryStore) -> Self {
        Self {
            connect: Connect::Unsignalled,
            ..Self::up(store)
        }
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Delay every data operation (exists, create, get, set)
    pub fn with_operation_delay(mut self, delay: Duration) -> Self {
        self.operation_delay = delay;
        self
    }

    /// Connect normally but fail every data operation with a connection loss
    pub fn with_failing_operations(mut self) -> Self {
        self.failing_operations = true;
        self
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

#[derive(Debug, Default)]
struct EnsembleState {
    members: Mutex<HashMap<Endpoint, Member>>,
    attempts: Mutex<Vec<Endpoint>>,
    open_sessions: AtomicUsize,
}

/// In-process [`SessionFactory`]
///
/// Unknown endpoints behave like unreachable members.
#[derive(Debug, Clone, Default)]
pub struct MemoryEnsemble {
    state: Arc<EnsembleState>,
}

impl MemoryEnsemble {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(self, endpoint: &str, member: Member) -> Self {
        self.set_member(endpoint, member);
        self
    }

    /// Replace a member's behavior
    pub fn set_member(&self, endpoint: &str, member: Member) {
        lock(&self.state.members).insert(Endpoint::from(endpoint), member);
    }

    /// Endpoints sessions were opened for, in order
    pub fn attempts(&self) -> Vec<Endpoint> {
        lock(&self.state.attempts).clone()
    }

    /// Sessions opened but not yet closed
    pub fn open_sessions(&self) -> usize {
        self.state.open_sessions.load(Ordering::SeqCst)
    }
}

impl SessionFactory for MemoryEnsemble {
    type Session = MemorySession;

    fn open(&self, endpoint: &Endpoint) -> Result<Self::Session, SessionError> {
        let member = lock(&self.state.members)
            .get(endpoint)
            .cloned()
            .unwrap_or_else(Member::unreachable);

        lock(&self.state.attempts).push(endpoint.clone());
        self.state.open_sessions.fetch_add(1, Ordering::SeqCst);
        debug!(endpoint = %endpoint, "Opened in-memory session");

        Ok(MemorySession {
            endpoint: endpoint.clone(),
            member,
            state: Arc::clone(&self.state),
            connected: AtomicBool::new(false),
            closed: false,
        })
    }
}

/// Session against one [`MemoryEnsemble`] member
#[derive(Debug)]
pub struct MemorySession {
    endpoint: Endpoint,
    member: Member,
    state: Arc<EnsembleState>,
    connected: AtomicBool,
    closed: bool,
}

impl MemorySession {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn ready(&self) -> Result<&MemoryStore, SessionError> {
        if self.closed || !self.is_connected() {
            return Err(SessionError::Closed);
        }
        if !self.member.operation_delay.is_zero() {
            tokio::time::sleep(self.member.operation_delay).await;
        }
        if self.member.failing_operations {
            return Err(SessionError::ConnectionLoss(format!(
                "{} dropped the request",
                self.endpoint
            )));
        }
        Ok(&self.member.store)
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn wait_connected(&mut self) -> Result<(), SessionError> {
        match self.member.connect {
            Connect::Up => {
                if !self.member.connect_delay.is_zero() {
                    tokio::time::sleep(self.member.connect_delay).await;
                }
                self.connected.store(true, Ordering::SeqCst);
                Ok(())
            }
            Connect::Unreachable => {
                std::future::pending::<()>().await;
                Err(SessionError::Closed)
            }
            Connect::Refusing => Err(SessionError::Refused(self.endpoint.to_string())),
            Connect::Unsignalled => {
                self.connected.store(true, Ordering::SeqCst);
                std::future::pending::<()>().await;
                Err(SessionError::Closed)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn exists(&self, path: &str) -> Result<bool, SessionError> {
        Ok(self.ready().await?.contains(path))
    }

    async fn create_recursive(&self, path: &str) -> Result<(), SessionError> {
        self.ready().await?.create_recursive(path);
        Ok(())
    }

    async fn get_data(&self, path: &str) -> Result<Vec<u8>, SessionError> {
        self.ready()
            .await?
            .get(path)
            .ok_or_else(|| SessionError::NoNode(path.to_string()))
    }

    async fn set_data(&self, path: &str, data: &[u8]) -> Result<(), SessionError> {
        self.ready().await?.set(path, data)
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.connected.store(false, Ordering::SeqCst);
            self.state.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
