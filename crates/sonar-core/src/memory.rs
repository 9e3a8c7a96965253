//! In-memory collaborators.
//!
//! These back the HTTP host and the test suites. State lives in tokio
//! `watch`/`broadcast` channels so changes can be observed without polling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use utoipa::ToSchema;

use crate::collaborators::{
    LifecycleEvent, LifecycleSignal, OnboardingGate, PermissionStatusSource, PresentationSink,
    RadioPowerObserver, RegistrationStore,
};
use crate::navigation::Screen;
use crate::types::{PermissionSnapshot, RadioPower, RemediationKind, RootContent};

const LIFECYCLE_CAPACITY: usize = 16;

// ============================================================================
// Permissions
// ============================================================================

/// Settable permission state with an optional pending OS prompt.
///
/// While a prompt is open, queries stay unresolved until
/// [`resolve_prompt`](Self::resolve_prompt) is called.
#[derive(Debug)]
pub struct MemoryPermissions {
    snapshot: watch::Sender<PermissionSnapshot>,
    prompt_open: watch::Sender<bool>,
}

impl MemoryPermissions {
    /// Start with `snapshot` and no open prompt.
    #[must_use]
    pub fn new(snapshot: PermissionSnapshot) -> Self {
        Self {
            snapshot: watch::Sender::new(snapshot),
            prompt_open: watch::Sender::new(false),
        }
    }

    /// Replace the current snapshot.
    pub fn set(&self, snapshot: PermissionSnapshot) {
        self.snapshot.send_replace(snapshot);
    }

    /// Current snapshot, ignoring any open prompt.
    #[must_use]
    pub fn snapshot(&self) -> PermissionSnapshot {
        *self.snapshot.borrow()
    }

    /// Hold new queries until the prompt is answered.
    pub fn open_prompt(&self) {
        self.prompt_open.send_replace(true);
    }

    /// Answer the open prompt with `snapshot`, releasing pending queries.
    pub fn resolve_prompt(&self, snapshot: PermissionSnapshot) {
        self.snapshot.send_replace(snapshot);
        self.prompt_open.send_replace(false);
    }

    /// Whether a prompt is holding queries.
    #[must_use]
    pub fn is_prompt_open(&self) -> bool {
        *self.prompt_open.borrow()
    }
}

impl Default for MemoryPermissions {
    fn default() -> Self {
        Self::new(PermissionSnapshot::default())
    }
}

impl PermissionStatusSource for MemoryPermissions {
    fn query_permissions(&self) -> BoxFuture<'static, PermissionSnapshot> {
        let mut prompt = self.prompt_open.subscribe();
        let snapshot = self.snapshot.subscribe();
        Box::pin(async move {
            // The sender lives as long as `self`; a closed channel just means
            // nothing will ever hold the query again.
            let _ = prompt.wait_for(|open| !*open).await;
            let current = *snapshot.borrow();
            current
        })
    }
}

// ============================================================================
// Radio
// ============================================================================

/// Settable radio power state.
#[derive(Debug)]
pub struct MemoryRadio {
    power: watch::Sender<RadioPower>,
}

impl MemoryRadio {
    /// Start in `initial`.
    #[must_use]
    pub fn new(initial: RadioPower) -> Self {
        Self {
            power: watch::Sender::new(initial),
        }
    }

    /// Report a new power state to subscribers.
    pub fn set(&self, power: RadioPower) {
        self.power.send_replace(power);
    }
}

impl Default for MemoryRadio {
    fn default() -> Self {
        Self::new(RadioPower::Unknown)
    }
}

impl RadioPowerObserver for MemoryRadio {
    fn current(&self) -> RadioPower {
        *self.power.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<RadioPower> {
        self.power.subscribe()
    }
}

// ============================================================================
// Registration
// ============================================================================

/// Settable registration flag.
#[derive(Debug, Default)]
pub struct MemoryRegistration {
    registered: AtomicBool,
}

impl MemoryRegistration {
    /// Start with the given registration state.
    #[must_use]
    pub const fn new(registered: bool) -> Self {
        Self {
            registered: AtomicBool::new(registered),
        }
    }

    /// Record or clear registration.
    pub fn set(&self, registered: bool) {
        self.registered.store(registered, Ordering::SeqCst);
    }
}

impl RegistrationStore for MemoryRegistration {
    fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Onboarding
// ============================================================================

/// Onboarding gate whose completion is fired by hand.
#[derive(Debug)]
pub struct MemoryOnboarding {
    required: bool,
    done: watch::Sender<bool>,
}

impl MemoryOnboarding {
    /// Gate that requires onboarding when `required` is set.
    #[must_use]
    pub fn new(required: bool) -> Self {
        Self {
            required,
            done: watch::Sender::new(false),
        }
    }

    /// Fire the completion signal. Returns `false` if it already fired.
    pub fn complete(&self) -> bool {
        self.done.send_if_modified(|done| {
            if *done {
                false
            } else {
                *done = true;
                true
            }
        })
    }
}

impl OnboardingGate for MemoryOnboarding {
    fn is_required(&self) -> bool {
        self.required
    }

    fn completion(&self) -> watch::Receiver<bool> {
        self.done.subscribe()
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Lifecycle signal driven by hand.
#[derive(Debug)]
pub struct MemoryLifecycle {
    events: broadcast::Sender<LifecycleEvent>,
}

impl MemoryLifecycle {
    /// New signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(LIFECYCLE_CAPACITY);
        Self { events }
    }

    /// Emit a became-active event. Returns the number of subscribers reached.
    pub fn emit_became_active(&self) -> usize {
        self.events.send(LifecycleEvent::BecameActive).unwrap_or(0)
    }
}

impl Default for MemoryLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleSignal for MemoryLifecycle {
    fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }
}

// ============================================================================
// Presentation
// ============================================================================

/// A command received by the sink, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PresentationCommand {
    /// `set_root_content`
    SetRootContent {
        /// Requested root.
        content: RootContent,
    },
    /// `present_overlay`
    PresentOverlay {
        /// Overlay presented.
        kind: RemediationKind,
    },
    /// `dismiss_overlay`
    DismissOverlay,
    /// `push_screen`
    PushScreen {
        /// Screen mounted.
        screen: Screen,
    },
}

/// What the sink is currently rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PresentationState {
    /// Mounted root, `None` before the arbiter issued one.
    pub root: Option<RootContent>,
    /// Overlay on screen.
    pub overlay: RemediationKind,
    /// Child of the main root.
    pub main_child: Option<Screen>,
    /// Overlays presented so far.
    pub overlays_presented: u32,
    /// Overlays dismissed so far.
    pub overlays_dismissed: u32,
    /// Times an overlay was presented while another was still up.
    pub stacked_overlays: u32,
}

/// Presentation sink that keeps its state in memory.
///
/// State changes are published on a `watch` channel, so callers can await a
/// dismissal with [`wait_for`](Self::wait_for) instead of re-checking on a
/// timer.
#[derive(Debug)]
pub struct MemorySink {
    state: watch::Sender<PresentationState>,
    commands: Mutex<Vec<PresentationCommand>>,
}

impl MemorySink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(PresentationState::default()),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the rendered state.
    #[must_use]
    pub fn state(&self) -> PresentationState {
        self.state.borrow().clone()
    }

    /// Every command received so far.
    #[must_use]
    pub fn commands(&self) -> Vec<PresentationCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receiver notified on every rendered change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PresentationState> {
        self.state.subscribe()
    }

    /// Wait until the rendered state satisfies `predicate`.
    pub async fn wait_for<F>(&self, predicate: F) -> PresentationState
    where
        F: FnMut(&PresentationState) -> bool,
    {
        let mut rx = self.state.subscribe();
        let matched = rx.wait_for(predicate).await.map(|state| state.clone());
        // The sender is owned by `self`, so the channel cannot close here.
        matched.unwrap_or_else(|_| self.state())
    }

    /// Wait until `kind` is the overlay on screen.
    pub async fn wait_for_overlay(&self, kind: RemediationKind) -> PresentationState {
        self.wait_for(|state| state.overlay == kind).await
    }

    fn record(&self, command: PresentationCommand) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationSink for MemorySink {
    fn set_root_content(&self, content: RootContent) {
        self.record(PresentationCommand::SetRootContent { content });
        self.state.send_if_modified(|state| {
            if state.root == Some(content) {
                return false;
            }
            state.root = Some(content);
            state.main_child = match content {
                RootContent::Main => Some(Screen::Status),
                RootContent::Onboarding => None,
            };
            true
        });
    }

    fn present_overlay(&self, kind: RemediationKind) {
        self.record(PresentationCommand::PresentOverlay { kind });
        self.state.send_if_modified(|state| {
            if state.overlay == kind {
                return false;
            }
            if state.overlay.is_showing() {
                state.stacked_overlays += 1;
            }
            state.overlay = kind;
            state.overlays_presented += 1;
            true
        });
    }

    fn dismiss_overlay(&self) {
        self.record(PresentationCommand::DismissOverlay);
        self.state.send_if_modified(|state| {
            if !state.overlay.is_showing() {
                return false;
            }
            state.overlay = RemediationKind::None;
            state.overlays_dismissed += 1;
            true
        });
    }

    fn push_screen(&self, screen: Screen) {
        self.record(PresentationCommand::PushScreen {
            screen: screen.clone(),
        });
        self.state.send_if_modified(|state| {
            if state.main_child.as_ref() == Some(&screen) {
                return false;
            }
            state.main_child = Some(screen);
            true
        });
    }
}
