//! Relay lifecycle manager.
//!
//! Owns the at-most-one relay listener for the whole process and
//! exposes start / stop / status to the control plane.
//!
//! # State machine
//!
//! ```text
//!            start()                bind ok
//! Stopped ───────────► Starting ───────────► Running
//!    ▲                    │                     │
//!    │   bind failed /    │                     │ stop() or the
//!    │   start cancelled  │                     │ accept loop exits
//!    └────────────────────┴─────────────────────┘
//! ```
//!
//! `Starting` counts as "running" for the purposes of a second `start`, so two
//! racing starts cannot both bind.  The state lives behind a
//! `std::sync::Mutex` that is never held across an `.await`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::{RelayConfig, RelayStatus};
use crate::infrastructure::error::RelayError;
use crate::infrastructure::relay_listener::run_listener;

/// A listener that is bound and accepting.
struct RunningRelay {
    config: Arc<RelayConfig>,
    bound_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

enum ListenerState {
    Stopped,
    /// A start is binding.  `generation` tells a start whether a stop has
    /// happened underneath it.
    Starting {
        generation: u64,
    },
    Running(RunningRelay),
}

struct Inner {
    state: ListenerState,
    generation: u64,
}

/// Process-wide relay lifecycle manager.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct RelayManager {
    inner: Mutex<Inner>,
}

impl Default for RelayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ListenerState::Stopped,
                generation: 0,
            }),
        }
    }

    /// Binds the relay listener and starts its accept loop.
    ///
    /// Returns the actually bound address, which differs from the configured
    /// one when port 0 is requested.
    ///
    /// # Errors
    ///
    /// - [`RelayError::AlreadyRunning`] if a relay is starting or running.
    /// - [`RelayError::Bind`] if the address cannot be bound.
    /// - [`RelayError::StartAborted`] if [`stop`](Self::stop) ran while binding.
    pub async fn start(&self, config: RelayConfig) -> Result<SocketAddr, RelayError> {
        let generation = {
            let mut inner = self.lock();
            if !matches!(inner.state, ListenerState::Stopped) {
                return Err(RelayError::AlreadyRunning);
            }
            inner.generation += 1;
            let generation = inner.generation;
            inner.state = ListenerState::Starting { generation };
            generation
        };
        // Resets `Starting` if the bind fails or this future is dropped.
        let mut guard = StartGuard {
            manager: self,
            generation,
            armed: true,
        };

        let bind_addr = config.bind_addr();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| RelayError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;
        let bound_addr = listener.local_addr().map_err(|source| RelayError::Bind {
            addr: bind_addr.clone(),
            source,
        })?;

        let mut inner = self.lock();
        match inner.state {
            ListenerState::Starting { generation: g } if g == generation => {}
            // A stop cleared the slot while we were binding; the listener is
            // dropped here and never accepts.
            _ => {
                guard.armed = false;
                return Err(RelayError::StartAborted);
            }
        }

        let config = Arc::new(config);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_listener(listener, Arc::clone(&config), shutdown_rx));

        info!(
            "relay listening on ws://{bound_addr} → {}",
            config.backend_address
        );
        inner.state = ListenerState::Running(RunningRelay {
            config,
            bound_addr,
            shutdown: shutdown_tx,
            task,
        });
        guard.armed = false;
        Ok(bound_addr)
    }

    /// Stops the relay if one is active.  Idempotent.
    ///
    /// Returns once the accept loop has exited, the listening socket is
    /// closed, and every in-flight session has been torn down.
    pub async fn stop(&self) {
        let running = {
            let mut inner = self.lock();
            match std::mem::replace(&mut inner.state, ListenerState::Stopped) {
                ListenerState::Running(running) => Some(running),
                // Clearing `Starting` makes the in-progress start abort.
                ListenerState::Starting { .. } | ListenerState::Stopped => None,
            }
        };

        let Some(running) = running else {
            return;
        };

        // The receiver may already be gone if the accept loop exited on its own.
        let _ = running.shutdown.send(());
        if let Err(e) = running.task.await {
            warn!("relay listener task ended abnormally: {e}");
        }
        info!(
            "relay on {} → {} stopped",
            running.bound_addr, running.config.backend_address
        );
    }

    /// Snapshot of the relay state.
    ///
    /// A listener whose accept loop has exited on its own is reported (and
    /// recorded) as stopped.
    pub fn status(&self) -> RelayStatus {
        let mut inner = self.lock();
        let (bound_addr, exited) = match &inner.state {
            ListenerState::Running(running) => (running.bound_addr, running.task.is_finished()),
            ListenerState::Starting { .. } | ListenerState::Stopped => {
                return RelayStatus::stopped()
            }
        };

        if exited {
            warn!("relay listener on {bound_addr} exited unexpectedly");
            inner.state = ListenerState::Stopped;
            return RelayStatus::stopped();
        }
        RelayStatus::running(bound_addr)
    }

    /// Backend address of the running relay, if any.
    pub fn backend_address(&self) -> Option<String> {
        match &self.lock().state {
            ListenerState::Running(running) => Some(running.config.backend_address.clone()),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The state is a plain enum; a panic elsewhere cannot leave it torn.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the manager to `Stopped` when a start does not complete.
struct StartGuard<'a> {
    manager: &'a RelayManager,
    generation: u64,
    armed: bool,
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.manager.lock();
        if matches!(inner.state, ListenerState::Starting { generation } if generation == self.generation)
        {
            inner.state = ListenerState::Stopped;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
