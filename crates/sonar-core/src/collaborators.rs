//! Contracts for the collaborators the arbiter consumes and drives.
//!
//! All collaborators are constructed by the host and injected as
//! `Arc<dyn Trait>`, so tests and the HTTP host can swap in the in-memory
//! implementations from [`crate::memory`].

use futures::future::BoxFuture;
use tokio::sync::{broadcast, watch};

use crate::navigation::Screen;
use crate::types::{PermissionSnapshot, RadioPower, RemediationKind, RootContent};

/// Reads the OS permission state.
pub trait PermissionStatusSource: Send + Sync {
    /// Resolve the current permission snapshot.
    ///
    /// The future completes once any outstanding OS prompt has been answered.
    /// It resolves exactly once and is never cancelled by the arbiter.
    fn query_permissions(&self) -> BoxFuture<'static, PermissionSnapshot>;
}

/// Power state of the proximity radio.
pub trait RadioPowerObserver: Send + Sync {
    /// The most recent power state.
    fn current(&self) -> RadioPower;

    /// Receiver notified on every subsequent power-state change.
    fn subscribe(&self) -> watch::Receiver<RadioPower>;
}

/// Identity registration records.
pub trait RegistrationStore: Send + Sync {
    /// Whether the device has completed registration.
    fn is_registered(&self) -> bool;
}

/// The onboarding wizard, as seen from the root.
pub trait OnboardingGate: Send + Sync {
    /// Whether onboarding must run at launch.
    fn is_required(&self) -> bool;

    /// Flips to `true` once, when onboarding finishes.
    fn completion(&self) -> watch::Receiver<bool>;
}

/// Application lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The app returned to the foreground.
    BecameActive,
}

/// Source of [`LifecycleEvent`]s.
pub trait LifecycleSignal: Send + Sync {
    /// Subscribe to future lifecycle events.
    fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent>;
}

/// The view layer that renders the arbiter's decisions.
///
/// Commands are idempotent from the sink's side: setting the root it already
/// shows is a no-op.
pub trait PresentationSink: Send + Sync {
    /// Mount `content` at the root, replacing the current child.
    fn set_root_content(&self, content: RootContent);

    /// Present the overlay for `kind` on top of the main flow.
    fn present_overlay(&self, kind: RemediationKind);

    /// Dismiss the overlay currently presented.
    fn dismiss_overlay(&self);

    /// Replace the child of the main root with `screen`.
    fn push_screen(&self, screen: Screen);
}
