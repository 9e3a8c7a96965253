//! The root presentation arbiter.
//!
//! [`PresentationArbiter`] owns the root content and the single remediation
//! overlay. It is a synchronous state machine: every trigger is a method call,
//! and the only asynchronous step (resolving permissions) is handed back to the
//! caller as [`Decision::AwaitingPermissions`] together with a
//! [`DecisionToken`]. The result is fed back through
//! [`permissions_resolved`](PresentationArbiter::permissions_resolved), which
//! drops it unless the token is still the latest one issued.
//!
//! Decision order for a became-active run:
//!
//! 1. unregistered device: dismiss any overlay, stop
//! 2. radio not powered on: radio-off overlay
//! 3. radio permission denied: radio-permission overlay
//! 4. notification permission denied: notification-permission overlay
//! 5. otherwise: no overlay

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::collaborators::{PresentationSink, RadioPowerObserver, RegistrationStore};
use crate::config::RemediationPolicy;
use crate::navigation::Screen;
use crate::types::{DecisionToken, PermissionSnapshot, RadioPower, RemediationKind, RootContent};

/// Outcome of a synchronous decision step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The trigger does not apply in the current root and was dropped.
    Ignored,
    /// The run finished and applied this remediation.
    Settled(RemediationKind),
    /// The run needs a permission snapshot; deliver it with this token.
    AwaitingPermissions(DecisionToken),
    /// The radio is in a transient state; the overlay was left as it was.
    Held,
}

/// What a radio power state means for remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RadioVerdict {
    Ready,
    Off,
    Hold,
}

impl RemediationPolicy {
    const fn radio_verdict(self, power: RadioPower) -> RadioVerdict {
        match power {
            RadioPower::PoweredOn => RadioVerdict::Ready,
            RadioPower::Resetting if !self.resetting_is_off => RadioVerdict::Hold,
            RadioPower::PoweredOff
            | RadioPower::Unknown
            | RadioPower::Resetting
            | RadioPower::Unsupported => RadioVerdict::Off,
        }
    }
}

/// Decides the root content and the remediation overlay.
pub struct PresentationArbiter {
    root: RootContent,
    showing: RemediationKind,
    latest: DecisionToken,
    evaluated_power: Option<RadioPower>,
    policy: RemediationPolicy,
    registration: Arc<dyn RegistrationStore>,
    radio: Arc<dyn RadioPowerObserver>,
    sink: Arc<dyn PresentationSink>,
}

impl PresentationArbiter {
    /// Create the arbiter and mount the initial root.
    ///
    /// The root is onboarding when `onboarding_required`, main otherwise. No
    /// overlay is shown until the first became-active run.
    pub fn new(
        onboarding_required: bool,
        policy: RemediationPolicy,
        registration: Arc<dyn RegistrationStore>,
        radio: Arc<dyn RadioPowerObserver>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        let root = if onboarding_required {
            RootContent::Onboarding
        } else {
            RootContent::Main
        };
        info!(?root, "Mounting initial root");
        sink.set_root_content(root);

        Self {
            root,
            showing: RemediationKind::None,
            latest: DecisionToken(0),
            evaluated_power: None,
            policy,
            registration,
            radio,
            sink,
        }
    }

    /// Currently mounted root.
    #[must_use]
    pub const fn root_content(&self) -> RootContent {
        self.root
    }

    /// Overlay currently on screen.
    #[must_use]
    pub const fn remediation(&self) -> RemediationKind {
        self.showing
    }

    /// Token of the most recent decision run.
    #[must_use]
    pub const fn latest_token(&self) -> DecisionToken {
        self.latest
    }

    /// Onboarding finished: swap the root to the main flow.
    ///
    /// Remediation is not evaluated here; the next became-active run does it.
    /// Returns `false` when the root already was the main flow.
    pub fn onboarding_completed(&mut self) -> bool {
        if self.root == RootContent::Main {
            debug!("Onboarding completion after main flow mounted, ignoring");
            return false;
        }
        info!("Onboarding complete, mounting main flow");
        self.root = RootContent::Main;
        self.sink.set_root_content(RootContent::Main);
        true
    }

    /// Mount `screen` as the main child. Only valid in the main flow.
    pub fn show(&mut self, screen: Screen) -> bool {
        if self.root != RootContent::Main {
            warn!(screen = screen.name(), "Cannot show screen during onboarding");
            return false;
        }
        debug!(screen = screen.name(), "Showing screen");
        self.sink.push_screen(screen);
        true
    }

    /// The app returned to the foreground.
    pub fn became_active(&mut self) -> Decision {
        if self.root != RootContent::Main {
            debug!("Became active during onboarding, skipping remediation");
            return Decision::Ignored;
        }

        let token = self.next_token();

        if !self.registration.is_registered() {
            debug!(%token, "Device not registered, clearing remediation");
            self.evaluated_power = None;
            self.apply(RemediationKind::None);
            return Decision::Settled(RemediationKind::None);
        }

        let power = self.radio.current();
        self.evaluated_power = Some(power);
        match self.policy.radio_verdict(power) {
            RadioVerdict::Ready => {
                debug!(%token, "Radio powered on, querying permissions");
                Decision::AwaitingPermissions(token)
            }
            RadioVerdict::Off => {
                debug!(%token, ?power, "Radio unavailable");
                self.apply(RemediationKind::BluetoothOff);
                Decision::Settled(RemediationKind::BluetoothOff)
            }
            RadioVerdict::Hold => {
                debug!(%token, ?power, "Radio transient, keeping current overlay");
                Decision::Held
            }
        }
    }

    /// The radio reported a power state; re-run the full decision.
    ///
    /// A report is ignored when the observer's current state is the one the
    /// latest registered run already evaluated, so the same change delivered
    /// twice starts one run.
    pub fn radio_power_changed(&mut self, power: RadioPower) -> Decision {
        let current = self.radio.current();
        if self.evaluated_power == Some(current) {
            debug!(?power, ?current, "Radio power unchanged since last run, ignoring");
            return Decision::Ignored;
        }
        debug!(?power, ?current, "Radio power changed");
        self.became_active()
    }

    /// Deliver the permission snapshot for the run identified by `token`.
    ///
    /// Returns `true` if the snapshot was applied, `false` if a newer run has
    /// started since and the snapshot was discarded.
    pub fn permissions_resolved(
        &mut self,
        token: DecisionToken,
        snapshot: PermissionSnapshot,
    ) -> bool {
        if token != self.latest {
            debug!(%token, latest = %self.latest, "Discarding stale permission result");
            return false;
        }
        if self.root != RootContent::Main {
            return false;
        }
        self.apply(snapshot.remediation());
        true
    }

    fn next_token(&mut self) -> DecisionToken {
        self.latest = DecisionToken(self.latest.0 + 1);
        self.latest
    }

    /// Bring the on-screen overlay in line with `kind`, issuing nothing when
    /// it already matches.
    fn apply(&mut self, kind: RemediationKind) {
        if kind == self.showing {
            return;
        }
        if self.showing.is_showing() {
            self.sink.dismiss_overlay();
        }
        if kind.is_showing() {
            self.sink.present_overlay(kind);
        }
        info!(from = ?self.showing, to = ?kind, "Remediation changed");
        self.showing = kind;
    }
}

impl std::fmt::Debug for PresentationArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationArbiter")
            .field("root", &self.root)
            .field("showing", &self.showing)
            .field("latest", &self.latest)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryRadio, MemoryRegistration, MemorySink, PresentationCommand};
    use crate::types::PermissionState;

    struct Harness {
        registration: Arc<MemoryRegistration>,
        radio: Arc<MemoryRadio>,
        sink: Arc<MemorySink>,
        arbiter: PresentationArbiter,
    }

    fn harness(onboarding_required: bool) -> Harness {
        harness_with_policy(onboarding_required, RemediationPolicy::default())
    }

    fn harness_with_policy(onboarding_required: bool, policy: RemediationPolicy) -> Harness {
        let registration = Arc::new(MemoryRegistration::new(true));
        let radio = Arc::new(MemoryRadio::new(RadioPower::PoweredOn));
        let sink = Arc::new(MemorySink::new());
        let arbiter = PresentationArbiter::new(
            onboarding_required,
            policy,
            registration.clone(),
            radio.clone(),
            sink.clone(),
        );
        Harness {
            registration,
            radio,
            sink,
            arbiter,
        }
    }

    fn notification_denied() -> PermissionSnapshot {
        PermissionSnapshot {
            radio: PermissionState::Allowed,
            notification: PermissionState::Denied,
        }
    }

    fn radio_denied() -> PermissionSnapshot {
        PermissionSnapshot {
            radio: PermissionState::Denied,
            notification: PermissionState::Allowed,
        }
    }

    /// Run became-active and resolve its permission query with `snapshot`.
    fn activate(h: &mut Harness, snapshot: PermissionSnapshot) -> RemediationKind {
        match h.arbiter.became_active() {
            Decision::AwaitingPermissions(token) => {
                assert!(h.arbiter.permissions_resolved(token, snapshot));
                h.arbiter.remediation()
            }
            Decision::Settled(kind) => kind,
            other => panic!("unexpected decision {other:?}"),
        }
    }

    #[test]
    fn test_initial_root_onboarding_required() {
        let h = harness(true);
        assert_eq!(h.arbiter.root_content(), RootContent::Onboarding);
        assert_eq!(h.sink.state().root, Some(RootContent::Onboarding));
    }

    #[test]
    fn test_initial_root_onboarding_not_required() {
        let h = harness(false);
        assert_eq!(h.arbiter.root_content(), RootContent::Main);
        assert_eq!(h.sink.state().main_child, Some(Screen::Status));
        assert_eq!(h.arbiter.remediation(), RemediationKind::None);
    }

    #[test]
    fn test_onboarding_completion_is_one_way() {
        let mut h = harness(true);
        assert!(h.arbiter.onboarding_completed());
        assert_eq!(h.arbiter.root_content(), RootContent::Main);
        assert_eq!(h.sink.state().main_child, Some(Screen::Status));

        assert!(!h.arbiter.onboarding_completed());
        let root_commands = h
            .sink
            .commands()
            .into_iter()
            .filter(|c| matches!(c, PresentationCommand::SetRootContent { .. }))
            .count();
        assert_eq!(root_commands, 2);
    }

    #[test]
    fn test_onboarding_completion_does_not_evaluate_remediation() {
        let mut h = harness(true);
        h.radio.set(RadioPower::PoweredOff);
        h.arbiter.onboarding_completed();
        assert_eq!(h.sink.state().overlay, RemediationKind::None);
    }

    #[test]
    fn test_show_replaces_main_child() {
        let mut h = harness(false);
        assert!(h.arbiter.show(Screen::EnterDiagnosis));
        assert_eq!(h.sink.state().main_child, Some(Screen::EnterDiagnosis));
    }

    #[test]
    fn test_show_ignored_during_onboarding() {
        let mut h = harness(true);
        assert!(!h.arbiter.show(Screen::EnterDiagnosis));
        assert_eq!(h.sink.state().main_child, None);
    }

    #[test]
    fn test_show_leaves_overlay_alone() {
        let mut h = harness(false);
        h.radio.set(RadioPower::PoweredOff);
        h.arbiter.became_active();
        h.arbiter.show(Screen::SelfDiagnosis);
        assert_eq!(h.sink.state().overlay, RemediationKind::BluetoothOff);
    }

    #[test]
    fn test_became_active_ignored_during_onboarding() {
        let mut h = harness(true);
        h.radio.set(RadioPower::PoweredOff);
        assert_eq!(h.arbiter.became_active(), Decision::Ignored);
        assert_eq!(
            h.arbiter.radio_power_changed(RadioPower::PoweredOff),
            Decision::Ignored
        );
        assert_eq!(h.sink.state().overlay, RemediationKind::None);
        assert_eq!(h.sink.state().overlays_presented, 0);
    }

    #[test]
    fn test_unregistered_device_never_remediates() {
        let mut h = harness(false);
        h.registration.set(false);
        h.radio.set(RadioPower::PoweredOff);
        assert_eq!(
            h.arbiter.became_active(),
            Decision::Settled(RemediationKind::None)
        );
        assert_eq!(h.sink.state().overlays_presented, 0);
    }

    #[test]
    fn test_unregistering_dismisses_existing_overlay() {
        let mut h = harness(false);
        h.radio.set(RadioPower::PoweredOff);
        h.arbiter.became_active();
        assert_eq!(h.sink.state().overlay, RemediationKind::BluetoothOff);

        h.registration.set(false);
        h.arbiter.became_active();
        assert_eq!(h.sink.state().overlay, RemediationKind::None);
    }

    #[test]
    fn test_all_clear_shows_nothing() {
        let mut h = harness(false);
        let kind = activate(&mut h, PermissionSnapshot::allowed());
        assert_eq!(kind, RemediationKind::None);
        assert!(h.sink.commands().iter().all(|c| !matches!(
            c,
            PresentationCommand::PresentOverlay { .. } | PresentationCommand::DismissOverlay
        )));
    }

    #[test]
    fn test_radio_permission_denied() {
        let mut h = harness(false);
        let kind = activate(&mut h, radio_denied());
        assert_eq!(kind, RemediationKind::BluetoothPermissionDenied);
        assert_eq!(
            h.sink.state().overlay,
            RemediationKind::BluetoothPermissionDenied
        );
    }

    #[test]
    fn test_notification_permission_denied() {
        let mut h = harness(false);
        let kind = activate(&mut h, notification_denied());
        assert_eq!(kind, RemediationKind::NotificationPermissionDenied);
    }

    #[test]
    fn test_not_determined_is_not_remediated() {
        let mut h = harness(false);
        let kind = activate(&mut h, PermissionSnapshot::default());
        assert_eq!(kind, RemediationKind::None);
    }

    #[test]
    fn test_radio_off_beats_permission_denied() {
        let mut h = harness(false);
        h.radio.set(RadioPower::PoweredOff);
        assert_eq!(
            h.arbiter.became_active(),
            Decision::Settled(RemediationKind::BluetoothOff)
        );
        assert_eq!(h.sink.state().overlay, RemediationKind::BluetoothOff);
    }

    #[test]
    fn test_non_powered_states_count_as_off() {
        for power in [
            RadioPower::Unknown,
            RadioPower::Resetting,
            RadioPower::Unsupported,
        ] {
            let mut h = harness(false);
            h.radio.set(power);
            assert_eq!(
                h.arbiter.became_active(),
                Decision::Settled(RemediationKind::BluetoothOff),
                "{power:?}"
            );
        }
    }

    #[test]
    fn test_resetting_can_hold_last_known_good() {
        let policy = RemediationPolicy {
            resetting_is_off: false,
        };
        let mut h = harness_with_policy(false, policy);
        activate(&mut h, notification_denied());

        h.radio.set(RadioPower::Resetting);
        assert_eq!(
            h.arbiter.radio_power_changed(RadioPower::Resetting),
            Decision::Held
        );
        assert_eq!(
            h.sink.state().overlay,
            RemediationKind::NotificationPermissionDenied
        );
    }

    #[test]
    fn test_granting_permissions_dismisses_stale_overlay() {
        let mut h = harness(false);
        activate(&mut h, notification_denied());
        assert_eq!(
            h.sink.state().overlay,
            RemediationKind::NotificationPermissionDenied
        );

        activate(&mut h, PermissionSnapshot::allowed());
        let state = h.sink.state();
        assert_eq!(state.overlay, RemediationKind::None);
        assert_eq!(state.overlays_dismissed, 1);
    }

    #[test]
    fn test_switching_overlay_dismisses_first() {
        let mut h = harness(false);
        activate(&mut h, notification_denied());
        h.radio.set(RadioPower::PoweredOff);
        h.arbiter.radio_power_changed(RadioPower::PoweredOff);

        let commands = h.sink.commands();
        let tail = &commands[commands.len() - 2..];
        assert_eq!(
            tail,
            &[
                PresentationCommand::DismissOverlay,
                PresentationCommand::PresentOverlay {
                    kind: RemediationKind::BluetoothOff
                },
            ]
        );
        assert_eq!(h.sink.state().stacked_overlays, 0);
    }

    #[test]
    fn test_radio_power_on_clears_radio_off() {
        let mut h = harness(false);
        h.radio.set(RadioPower::PoweredOff);
        h.arbiter.radio_power_changed(RadioPower::PoweredOff);
        assert_eq!(h.arbiter.remediation(), RemediationKind::BluetoothOff);

        h.radio.set(RadioPower::PoweredOn);
        let Decision::AwaitingPermissions(token) =
            h.arbiter.radio_power_changed(RadioPower::PoweredOn)
        else {
            panic!("expected permission query");
        };
        h.arbiter
            .permissions_resolved(token, PermissionSnapshot::allowed());
        assert_eq!(h.sink.state().overlay, RemediationKind::None);
    }

    #[test]
    fn test_stale_permission_result_is_discarded() {
        let mut h = harness(false);
        let Decision::AwaitingPermissions(first) = h.arbiter.became_active() else {
            panic!("expected permission query");
        };
        let Decision::AwaitingPermissions(second) = h.arbiter.became_active() else {
            panic!("expected permission query");
        };

        assert!(h
            .arbiter
            .permissions_resolved(second, PermissionSnapshot::allowed()));
        assert!(!h.arbiter.permissions_resolved(first, notification_denied()));
        assert_eq!(h.sink.state().overlay, RemediationKind::None);
        assert_eq!(h.sink.state().overlays_presented, 0);
    }

    #[test]
    fn test_stale_result_after_synchronous_run() {
        let mut h = harness(false);
        let Decision::AwaitingPermissions(token) = h.arbiter.became_active() else {
            panic!("expected permission query");
        };

        h.radio.set(RadioPower::PoweredOff);
        h.arbiter.radio_power_changed(RadioPower::PoweredOff);

        assert!(!h.arbiter.permissions_resolved(token, radio_denied()));
        assert_eq!(h.sink.state().overlay, RemediationKind::BluetoothOff);
    }

    #[test]
    fn test_repeated_triggers_are_idempotent() {
        let mut h = harness(false);
        h.radio.set(RadioPower::PoweredOff);
        h.arbiter.radio_power_changed(RadioPower::PoweredOff);
        h.arbiter.radio_power_changed(RadioPower::PoweredOff);
        h.arbiter.became_active();

        h.radio.set(RadioPower::PoweredOn);
        activate(&mut h, PermissionSnapshot::allowed());
        activate(&mut h, PermissionSnapshot::allowed());

        assert_eq!(
            h.sink.commands(),
            vec![
                PresentationCommand::SetRootContent {
                    content: RootContent::Main
                },
                PresentationCommand::PresentOverlay {
                    kind: RemediationKind::BluetoothOff
                },
                PresentationCommand::DismissOverlay,
            ]
        );
    }

    #[test]
    fn test_tokens_increase_per_run() {
        let mut h = harness(false);
        assert_eq!(h.arbiter.latest_token().sequence(), 0);
        h.arbiter.became_active();
        h.radio.set(RadioPower::PoweredOff);
        h.arbiter.radio_power_changed(RadioPower::PoweredOff);
        assert_eq!(h.arbiter.latest_token().sequence(), 2);
    }

    #[test]
    fn test_duplicate_radio_report_starts_one_run() {
        let mut h = harness(false);
        h.radio.set(RadioPower::PoweredOff);

        let first = h.arbiter.radio_power_changed(RadioPower::PoweredOff);
        let second = h.arbiter.radio_power_changed(RadioPower::PoweredOff);

        assert_eq!(first, Decision::Settled(RemediationKind::BluetoothOff));
        assert_eq!(second, Decision::Ignored);
        assert_eq!(h.arbiter.latest_token().sequence(), 1);
    }

    #[test]
    fn test_radio_report_after_registration_runs_again() {
        let mut h = harness(false);
        h.registration.set(false);
        h.radio.set(RadioPower::PoweredOff);
        h.arbiter.radio_power_changed(RadioPower::PoweredOff);
        assert_eq!(h.arbiter.remediation(), RemediationKind::None);

        h.registration.set(true);
        let decision = h.arbiter.radio_power_changed(RadioPower::PoweredOff);

        assert_eq!(decision, Decision::Settled(RemediationKind::BluetoothOff));
    }

    #[test]
    fn test_radio_report_after_became_active_with_new_power_runs() {
        let mut h = harness(false);
        h.radio.set(RadioPower::PoweredOff);
        h.arbiter.radio_power_changed(RadioPower::PoweredOff);

        // Foreground run sees the radio back on before its report arrives.
        h.radio.set(RadioPower::PoweredOn);
        activate(&mut h, PermissionSnapshot::allowed());
        assert_eq!(
            h.arbiter.radio_power_changed(RadioPower::PoweredOn),
            Decision::Ignored
        );

        h.radio.set(RadioPower::PoweredOff);
        assert_eq!(
            h.arbiter.radio_power_changed(RadioPower::PoweredOff),
            Decision::Settled(RemediationKind::BluetoothOff)
        );
    }
    mod sequences {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Step {
            BecameActive,
            RadioReported(RadioPower),
            OnboardingCompleted,
            Registered(bool),
            Resolve(usize, PermissionSnapshot),
        }

        fn radio_power() -> impl Strategy<Value = RadioPower> {
            prop_oneof![
                Just(RadioPower::PoweredOn),
                Just(RadioPower::PoweredOff),
                Just(RadioPower::Unknown),
                Just(RadioPower::Resetting),
                Just(RadioPower::Unsupported),
            ]
        }

        fn permission_state() -> impl Strategy<Value = PermissionState> {
            prop_oneof![
                Just(PermissionState::Allowed),
                Just(PermissionState::Denied),
                Just(PermissionState::NotDetermined),
            ]
        }

        fn snapshot() -> impl Strategy<Value = PermissionSnapshot> {
            (permission_state(), permission_state())
                .prop_map(|(radio, notification)| PermissionSnapshot { radio, notification })
        }

        fn step() -> impl Strategy<Value = Step> {
            prop_oneof![
                3 => Just(Step::BecameActive),
                3 => radio_power().prop_map(Step::RadioReported),
                1 => Just(Step::OnboardingCompleted),
                1 => any::<bool>().prop_map(Step::Registered),
                4 => (any::<usize>(), snapshot()).prop_map(|(i, s)| Step::Resolve(i, s)),
            ]
        }

        proptest! {
            /// Arbitrary trigger orders, with permission results arriving in
            /// any order, never stack overlays, never remediate during
            /// onboarding, never leave the main flow, and never apply a
            /// result from a superseded run.
            #[test]
            fn test_trigger_sequences_keep_invariants(
                onboarding_required in any::<bool>(),
                resetting_is_off in any::<bool>(),
                steps in proptest::collection::vec(step(), 0..40),
            ) {
                let mut h = harness_with_policy(
                    onboarding_required,
                    RemediationPolicy { resetting_is_off },
                );
                let mut pending: Vec<DecisionToken> = Vec::new();
                let mut reached_main = !onboarding_required;

                for step in steps {
                    match step {
                        Step::BecameActive => {
                            if let Decision::AwaitingPermissions(token) = h.arbiter.became_active() {
                                pending.push(token);
                            }
                        }
                        Step::RadioReported(power) => {
                            h.radio.set(power);
                            let decision = h.arbiter.radio_power_changed(power);
                            if let Decision::AwaitingPermissions(token) = decision {
                                pending.push(token);
                            }
                            let off = matches!(
                                power,
                                RadioPower::PoweredOff | RadioPower::Unknown | RadioPower::Unsupported
                            );
                            if off
                                && h.arbiter.root_content() == RootContent::Main
                                && h.registration.is_registered()
                            {
                                prop_assert_eq!(h.arbiter.remediation(), RemediationKind::BluetoothOff);
                            }
                        }
                        Step::OnboardingCompleted => {
                            h.arbiter.onboarding_completed();
                        }
                        Step::Registered(registered) => h.registration.set(registered),
                        Step::Resolve(index, snapshot) => {
                            if pending.is_empty() {
                                continue;
                            }
                            let token = pending.remove(index % pending.len());
                            let before = h.arbiter.remediation();
                            let latest = h.arbiter.latest_token();
                            let applied = h.arbiter.permissions_resolved(token, snapshot);
                            if token == latest {
                                prop_assert!(applied);
                                prop_assert_eq!(h.arbiter.remediation(), snapshot.remediation());
                            } else {
                                prop_assert!(!applied);
                                prop_assert_eq!(h.arbiter.remediation(), before);
                            }
                        }
                    }

                    let state = h.sink.state();
                    prop_assert_eq!(state.stacked_overlays, 0);
                    prop_assert_eq!(state.overlay, h.arbiter.remediation());
                    prop_assert_eq!(
                        state.overlays_presented - state.overlays_dismissed,
                        u32::from(state.overlay.is_showing())
                    );
                    if state.root == Some(RootContent::Main) {
                        reached_main = true;
                    }
                    if reached_main {
                        prop_assert_eq!(state.root, Some(RootContent::Main));
                    } else {
                        prop_assert_eq!(state.overlays_presented, 0);
                        prop_assert_eq!(state.overlay, RemediationKind::None);
                    }
                }
            }
        }
    }
}
