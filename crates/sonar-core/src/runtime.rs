//! Serial event loop around the [`PresentationArbiter`].
//!
//! Every trigger, whatever its source, is queued on one bounded mpsc channel
//! and handled by a single task, so the arbiter's state is never touched
//! concurrently. Permission queries run in their own tasks and post their
//! result back onto the same queue, tagged with the token of the run that
//! issued them.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::arbiter::{Decision, PresentationArbiter};
use crate::collaborators::{
    LifecycleEvent, LifecycleSignal, OnboardingGate, PermissionStatusSource, PresentationSink,
    RadioPowerObserver, RegistrationStore,
};
use crate::config::ArbiterConfig;
use crate::error::{Result, SonarError};
use crate::navigation::Screen;
use crate::types::{DecisionToken, PermissionSnapshot, RadioPower, RemediationKind, RootContent};

/// Everything the arbiter consumes, injected by the host.
#[derive(Clone)]
pub struct Collaborators {
    /// OS permission state.
    pub permissions: Arc<dyn PermissionStatusSource>,
    /// Radio power state.
    pub radio: Arc<dyn RadioPowerObserver>,
    /// Registration records.
    pub registration: Arc<dyn RegistrationStore>,
    /// Onboarding requirement and completion.
    pub onboarding: Arc<dyn OnboardingGate>,
    /// Foreground events.
    pub lifecycle: Arc<dyn LifecycleSignal>,
    /// View layer.
    pub sink: Arc<dyn PresentationSink>,
}

/// Arbiter state reported once the loop is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbiterStatus {
    /// Mounted root.
    pub root: RootContent,
    /// Overlay on screen.
    pub remediation: RemediationKind,
    /// Most recent decision run.
    pub latest_token: DecisionToken,
}

enum Trigger {
    BecameActive,
    OnboardingCompleted,
    RadioPowerChanged(RadioPower),
    Show {
        screen: Screen,
        reply: oneshot::Sender<bool>,
    },
    PermissionsResolved {
        token: DecisionToken,
        snapshot: PermissionSnapshot,
    },
    Quiesce(oneshot::Sender<ArbiterStatus>),
    Shutdown,
}

/// Cloneable sender of triggers into a running arbiter.
#[derive(Debug, Clone)]
pub struct ArbiterHandle {
    tx: mpsc::Sender<Trigger>,
}

impl ArbiterHandle {
    /// Deliver a became-active trigger.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeStopped` if the event loop has exited.
    pub async fn became_active(&self) -> Result<()> {
        self.send(Trigger::BecameActive).await
    }

    /// Deliver the onboarding completion trigger.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeStopped` if the event loop has exited.
    pub async fn onboarding_completed(&self) -> Result<()> {
        self.send(Trigger::OnboardingCompleted).await
    }

    /// Deliver a radio power change.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeStopped` if the event loop has exited.
    pub async fn radio_power_changed(&self, power: RadioPower) -> Result<()> {
        self.send(Trigger::RadioPowerChanged(power)).await
    }

    /// Mount `screen` in the main flow. Resolves to `false` during onboarding.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeStopped` if the event loop has exited.
    pub async fn show(&self, screen: Screen) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Trigger::Show { screen, reply }).await?;
        rx.await.map_err(|_| SonarError::ReplyDropped("show"))
    }

    /// Wait until every trigger queued before this call has been handled and
    /// no permission query is outstanding, then report the arbiter state.
    ///
    /// A query held by an unanswered OS prompt keeps this pending.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeStopped` if the event loop has exited.
    pub async fn quiesce(&self) -> Result<ArbiterStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(Trigger::Quiesce(reply)).await?;
        rx.await.map_err(|_| SonarError::ReplyDropped("quiesce"))
    }

    async fn send(&self, trigger: Trigger) -> Result<()> {
        self.tx
            .send(trigger)
            .await
            .map_err(|_| SonarError::RuntimeStopped)
    }
}

/// A spawned arbiter event loop plus the tasks feeding it.
#[derive(Debug)]
pub struct ArbiterRuntime {
    handle: ArbiterHandle,
    task: JoinHandle<()>,
}

impl ArbiterRuntime {
    /// Construct the arbiter and start its event loop on the current tokio
    /// runtime.
    ///
    /// Subscribes to lifecycle events, radio power changes, and (while
    /// onboarding) the onboarding completion signal.
    ///
    /// A `trigger_queue_capacity` of zero, which [`ArbiterConfig::validate`]
    /// rejects, is raised to one here.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(collaborators: Collaborators, config: &ArbiterConfig) -> Self {
        let capacity = config.runtime.trigger_queue_capacity.max(1);
        if capacity != config.runtime.trigger_queue_capacity {
            warn!(capacity, "Trigger queue capacity must be positive, clamping");
        }
        let (tx, rx) = mpsc::channel(capacity);

        let arbiter = PresentationArbiter::new(
            collaborators.onboarding.is_required(),
            config.remediation,
            collaborators.registration.clone(),
            collaborators.radio.clone(),
            collaborators.sink.clone(),
        );

        let mut feeders = vec![
            tokio::spawn(forward_lifecycle(
                collaborators.lifecycle.subscribe(),
                tx.clone(),
            )),
            tokio::spawn(forward_radio(collaborators.radio.subscribe(), tx.clone())),
        ];
        if arbiter.root_content() == RootContent::Onboarding {
            feeders.push(tokio::spawn(forward_onboarding(
                collaborators.onboarding.completion(),
                tx.clone(),
            )));
        }

        let event_loop = EventLoop {
            arbiter,
            permissions: collaborators.permissions,
            loopback: tx.downgrade(),
            rx,
            pending_queries: 0,
            waiters: Vec::new(),
            feeders,
        };
        let task = tokio::spawn(event_loop.run());

        Self {
            handle: ArbiterHandle { tx },
            task,
        }
    }

    /// A handle for delivering triggers.
    #[must_use]
    pub fn handle(&self) -> ArbiterHandle {
        self.handle.clone()
    }

    /// Stop the event loop and its feeder tasks.
    ///
    /// Triggers queued before the call are still handled.
    pub async fn shutdown(self) {
        if self.handle.send(Trigger::Shutdown).await.is_err() {
            debug!("Arbiter already stopped");
        }
        if let Err(e) = self.task.await {
            warn!(error = %e, "Arbiter task ended abnormally");
        }
    }
}

struct EventLoop {
    arbiter: PresentationArbiter,
    permissions: Arc<dyn PermissionStatusSource>,
    loopback: mpsc::WeakSender<Trigger>,
    rx: mpsc::Receiver<Trigger>,
    pending_queries: usize,
    waiters: Vec<oneshot::Sender<ArbiterStatus>>,
    feeders: Vec<JoinHandle<()>>,
}

impl EventLoop {
    async fn run(mut self) {
        info!(root = ?self.arbiter.root_content(), "Presentation arbiter started");

        while let Some(trigger) = self.rx.recv().await {
            if matches!(trigger, Trigger::Shutdown) {
                break;
            }
            self.handle(trigger);
        }

        for feeder in &self.feeders {
            feeder.abort();
        }
        info!("Presentation arbiter stopped");
    }

    fn handle(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::BecameActive => {
                let decision = self.arbiter.became_active();
                self.follow_up(decision);
            }
            Trigger::RadioPowerChanged(power) => {
                let decision = self.arbiter.radio_power_changed(power);
                self.follow_up(decision);
            }
            Trigger::OnboardingCompleted => {
                self.arbiter.onboarding_completed();
            }
            Trigger::Show { screen, reply } => {
                let shown = self.arbiter.show(screen);
                let _ = reply.send(shown);
            }
            Trigger::PermissionsResolved { token, snapshot } => {
                self.pending_queries = self.pending_queries.saturating_sub(1);
                self.arbiter.permissions_resolved(token, snapshot);
                self.release_waiters();
            }
            Trigger::Quiesce(reply) => {
                self.waiters.push(reply);
                self.release_waiters();
            }
            Trigger::Shutdown => {}
        }
    }

    /// Start the permission query a decision asked for.
    fn follow_up(&mut self, decision: Decision) {
        let Decision::AwaitingPermissions(token) = decision else {
            return;
        };
        let Some(loopback) = self.loopback.upgrade() else {
            return;
        };

        let query = self.permissions.query_permissions();
        self.pending_queries += 1;
        tokio::spawn(async move {
            let snapshot = query.await;
            if loopback
                .send(Trigger::PermissionsResolved { token, snapshot })
                .await
                .is_err()
            {
                debug!(%token, "Arbiter stopped before permissions resolved");
            }
        });
    }

    fn release_waiters(&mut self) {
        if self.pending_queries > 0 || self.waiters.is_empty() {
            return;
        }
        let status = ArbiterStatus {
            root: self.arbiter.root_content(),
            remediation: self.arbiter.remediation(),
            latest_token: self.arbiter.latest_token(),
        };
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(status);
        }
    }
}

async fn forward_lifecycle(
    mut events: broadcast::Receiver<LifecycleEvent>,
    tx: mpsc::Sender<Trigger>,
) {
    loop {
        let trigger = match events.recv().await {
            Ok(LifecycleEvent::BecameActive) => Trigger::BecameActive,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Every missed event asked for the same run; one covers them.
                warn!(skipped, "Lifecycle events lagged");
                Trigger::BecameActive
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        if tx.send(trigger).await.is_err() {
            break;
        }
    }
}

async fn forward_radio(mut power: watch::Receiver<RadioPower>, tx: mpsc::Sender<Trigger>) {
    while power.changed().await.is_ok() {
        let state = *power.borrow_and_update();
        if tx.send(Trigger::RadioPowerChanged(state)).await.is_err() {
            break;
        }
    }
}

async fn forward_onboarding(mut done: watch::Receiver<bool>, tx: mpsc::Sender<Trigger>) {
    let completed = done.wait_for(|done| *done).await.is_ok();
    if completed && tx.send(Trigger::OnboardingCompleted).await.is_err() {
        debug!("Arbiter stopped before onboarding completed");
    }
}
