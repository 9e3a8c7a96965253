//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sonar_core::{
    ArbiterConfig, ArbiterHandle, ArbiterRuntime, Collaborators, MemoryLifecycle,
    MemoryOnboarding, MemoryPermissions, MemoryRadio, MemoryRegistration, MemorySink,
};
use uuid::Uuid;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// State type used by the routers.
pub type SharedState = AppState;

struct AppStateInner {
    config: ArbiterConfig,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    arbiter: ArbiterHandle,
    permissions: Arc<MemoryPermissions>,
    radio: Arc<MemoryRadio>,
    registration: Arc<MemoryRegistration>,
    onboarding: Arc<MemoryOnboarding>,
    sink: Arc<MemorySink>,
}

impl AppState {
    /// Build the in-memory device and start the arbiter for it.
    ///
    /// The returned runtime must be shut down by the caller when serving ends.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn new(config: ArbiterConfig) -> (Self, ArbiterRuntime) {
        let permissions = Arc::new(MemoryPermissions::default());
        let radio = Arc::new(MemoryRadio::default());
        let registration = Arc::new(MemoryRegistration::default());
        let onboarding = Arc::new(MemoryOnboarding::new(config.server.onboarding_required));
        // Foreground events arrive over HTTP and go straight to the arbiter
        // handle, so nothing emits on this signal.
        let lifecycle = Arc::new(MemoryLifecycle::new());
        let sink = Arc::new(MemorySink::new());

        let runtime = ArbiterRuntime::spawn(
            Collaborators {
                permissions: permissions.clone(),
                radio: radio.clone(),
                registration: registration.clone(),
                onboarding: onboarding.clone(),
                lifecycle,
                sink: sink.clone(),
            },
            &config,
        );

        let state = Self {
            inner: Arc::new(AppStateInner {
                config,
                session_id: Uuid::now_v7(),
                started_at: Utc::now(),
                arbiter: runtime.handle(),
                permissions,
                radio,
                registration,
                onboarding,
                sink,
            }),
        };
        (state, runtime)
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &ArbiterConfig {
        &self.inner.config
    }

    /// Identifier of this app session.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    /// Seconds since the state was built.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        let elapsed = Utc::now() - self.inner.started_at;
        u64::try_from(elapsed.num_seconds()).unwrap_or(0)
    }

    /// Trigger handle of the running arbiter.
    #[must_use]
    pub fn arbiter(&self) -> &ArbiterHandle {
        &self.inner.arbiter
    }

    /// Permission source.
    #[must_use]
    pub fn permissions(&self) -> &MemoryPermissions {
        &self.inner.permissions
    }

    /// Radio power observer.
    #[must_use]
    pub fn radio(&self) -> &MemoryRadio {
        &self.inner.radio
    }

    /// Registration store.
    #[must_use]
    pub fn registration(&self) -> &MemoryRegistration {
        &self.inner.registration
    }

    /// Onboarding gate.
    #[must_use]
    pub fn onboarding(&self) -> &MemoryOnboarding {
        &self.inner.onboarding
    }

    /// Presentation sink.
    #[must_use]
    pub fn sink(&self) -> &MemorySink {
        &self.inner.sink
    }
}
