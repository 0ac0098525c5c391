//! Signed-in sessions and their dashboards.
//!
//! Each session owns one `DashboardState` and a background task that folds
//! every pushed snapshot into it. Signing out, or staying idle past the
//! configured timeout, stops the task and drops the state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

use crate::dashboard::filter::CapacityBuckets;
use crate::dashboard::{Command, DashboardState};
use crate::models::{Identity, SessionInfo, Snapshot};
use crate::store::RecordStore;

/// How often idle sessions are swept.
const EXPIRY_INTERVAL: Duration = Duration::from_secs(60);

struct Session {
    identity: watch::Sender<Option<Identity>>,
    dashboard: Arc<Mutex<DashboardState>>,
    last_seen: std::sync::Mutex<Instant>,
}

impl Session {
    fn touch(&self) {
        if let Ok(mut last_seen) = self.last_seen.lock() {
            *last_seen = Instant::now();
        }
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .map(|last_seen| last_seen.elapsed())
            .unwrap_or_default()
    }

    /// Tell the follower task to stop.
    fn close(self) {
        self.identity.send_replace(None);
    }
}

/// Registry of active sessions keyed by bearer token.
pub struct SessionGate {
    sessions: RwLock<HashMap<String, Session>>,
    buckets: CapacityBuckets,
}

impl SessionGate {
    pub fn new(buckets: CapacityBuckets) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            buckets,
        }
    }

    /// Open a session for `identity` and start following the store.
    pub async fn sign_in(&self, identity: Identity, store: &RecordStore) -> SessionInfo {
        let token = Uuid::new_v4().simple().to_string();

        let mut state = DashboardState::new(self.buckets.clone());
        apply_snapshot(&mut state, store.current());
        let dashboard = Arc::new(Mutex::new(state));

        let (identity_tx, identity_rx) = watch::channel(Some(identity.clone()));
        tokio::spawn(follow_snapshots(
            store.subscribe(),
            identity_rx,
            dashboard.clone(),
        ));

        self.sessions.write().await.insert(
            token.clone(),
            Session {
                identity: identity_tx,
                dashboard,
                last_seen: std::sync::Mutex::new(Instant::now()),
            },
        );
        tracing::info!("Session opened for {}", identity.display_name);

        SessionInfo::new(token, identity)
    }

    /// Close a session. Returns false when the token was unknown.
    pub async fn sign_out(&self, token: &str) -> bool {
        let Some(session) = self.sessions.write().await.remove(token) else {
            return false;
        };
        session.close();
        tracing::info!("Session closed");
        true
    }

    /// Mark a session as active. Returns false when the token is unknown.
    pub async fn touch(&self, token: &str) -> bool {
        match self.sessions.read().await.get(token) {
            Some(session) => {
                session.touch();
                true
            }
            None => false,
        }
    }

    /// Close every session idle for at least `max_idle`; returns how many.
    pub async fn expire_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| session.idle_for() >= max_idle)
            .map(|(token, _)| token.clone())
            .collect();

        for token in &expired {
            if let Some(session) = sessions.remove(token) {
                session.close();
            }
        }
        expired.len()
    }

    /// The identity signed in under `token`, if any.
    pub async fn identity(&self, token: &str) -> Option<Identity> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(token)?;
        let identity = session.identity.borrow().clone();
        identity
    }

    /// Watch identity changes for a session; the value turns `None` on sign-out.
    pub async fn subscribe(&self, token: &str) -> Option<watch::Receiver<Option<Identity>>> {
        let sessions = self.sessions.read().await;
        sessions.get(token).map(|s| s.identity.subscribe())
    }

    pub async fn dashboard(&self, token: &str) -> Option<Arc<Mutex<DashboardState>>> {
        let sessions = self.sessions.read().await;
        sessions.get(token).map(|s| s.dashboard.clone())
    }
}

/// Run the idle-session sweep until the process exits.
pub async fn run_expiry(gate: Arc<SessionGate>, max_idle: Duration) {
    tracing::info!(
        max_idle_secs = max_idle.as_secs(),
        interval_secs = EXPIRY_INTERVAL.as_secs(),
        "Session expiry job started"
    );

    let mut interval = tokio::time::interval(EXPIRY_INTERVAL);
    loop {
        interval.tick().await;
        let expired = gate.expire_idle(max_idle).await;
        if expired > 0 {
            tracing::info!(expired, "Session expiry: closed idle sessions");
        } else {
            tracing::debug!("Session expiry: no idle sessions");
        }
    }
}

fn apply_snapshot(state: &mut DashboardState, snapshot: Arc<Snapshot>) {
    // Snapshot commands never touch the store and cannot fail.
    let _ = state.update(Command::SnapshotReceived(snapshot));
}

async fn follow_snapshots(
    mut feed: watch::Receiver<Arc<Snapshot>>,
    mut identity: watch::Receiver<Option<Identity>>,
    dashboard: Arc<Mutex<DashboardState>>,
) {
    loop {
        tokio::select! {
            changed = feed.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = feed.borrow_and_update().clone();
                apply_snapshot(&mut *dashboard.lock().await, snapshot);
            }
            changed = identity.changed() => {
                if changed.is_err() || identity.borrow_and_update().is_none() {
                    break;
                }
            }
        }
    }
    tracing::debug!("Snapshot follower stopped");
}
