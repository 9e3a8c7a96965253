//! Shared state types for the presentation arbiter.
//!
//! Everything here is a small `Copy` value: the arbiter never caches
//! collaborator state, it re-reads it on every decision run.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Which flow is mounted at the root of the presentation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RootContent {
    /// The onboarding wizard. No remediation overlay is ever shown on top of it.
    Onboarding,
    /// The main status flow.
    Main,
}

/// The blocking remediation overlay shown on top of the main flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RemediationKind {
    /// Nothing is blocking the main flow.
    #[default]
    None,
    /// The proximity radio is powered off, resetting, or unsupported.
    BluetoothOff,
    /// The user denied the radio permission.
    BluetoothPermissionDenied,
    /// The user denied the notification permission.
    NotificationPermissionDenied,
}

impl RemediationKind {
    /// Returns `true` when this kind corresponds to an on-screen overlay.
    #[inline]
    #[must_use]
    pub const fn is_showing(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// OS-level authorization state for a single permission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// The user granted the permission.
    Allowed,
    /// The user refused the permission.
    Denied,
    /// The OS has not asked yet, or the prompt is still pending.
    #[default]
    NotDetermined,
}

impl PermissionState {
    /// Only an explicit refusal counts; an unanswered prompt is not a denial.
    #[inline]
    #[must_use]
    pub const fn is_denied(self) -> bool {
        matches!(self, Self::Denied)
    }
}

/// Point-in-time view of both permissions the main flow depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PermissionSnapshot {
    /// Permission to use the proximity radio.
    pub radio: PermissionState,
    /// Permission to post local and push notifications.
    pub notification: PermissionState,
}

impl PermissionSnapshot {
    /// Both permissions granted.
    #[must_use]
    pub const fn allowed() -> Self {
        Self {
            radio: PermissionState::Allowed,
            notification: PermissionState::Allowed,
        }
    }

    /// Remediation required by this snapshot, radio permission first.
    #[must_use]
    pub const fn remediation(self) -> RemediationKind {
        if self.radio.is_denied() {
            RemediationKind::BluetoothPermissionDenied
        } else if self.notification.is_denied() {
            RemediationKind::NotificationPermissionDenied
        } else {
            RemediationKind::None
        }
    }
}

/// Power state reported by the proximity radio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RadioPower {
    /// Powered on and usable.
    PoweredOn,
    /// Switched off by the user.
    PoweredOff,
    /// The radio stack has not reported a state yet.
    #[default]
    Unknown,
    /// The radio stack is restarting.
    Resetting,
    /// The hardware has no usable radio.
    Unsupported,
}

/// Identifies one decision run of the arbiter.
///
/// Tokens increase monotonically; an asynchronous result may only be applied
/// while its token is still the latest issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DecisionToken(pub(crate) u64);

impl DecisionToken {
    /// Raw sequence number, for logging.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DecisionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remediation_is_showing() {
        assert!(!RemediationKind::None.is_showing());
        assert!(RemediationKind::BluetoothOff.is_showing());
        assert!(RemediationKind::NotificationPermissionDenied.is_showing());
    }

    #[test]
    fn test_snapshot_radio_permission_takes_priority() {
        let snapshot = PermissionSnapshot {
            radio: PermissionState::Denied,
            notification: PermissionState::Denied,
        };
        assert_eq!(
            snapshot.remediation(),
            RemediationKind::BluetoothPermissionDenied
        );
    }

    #[test]
    fn test_snapshot_not_determined_is_not_denied() {
        let snapshot = PermissionSnapshot::default();
        assert_eq!(snapshot.remediation(), RemediationKind::None);

        let snapshot = PermissionSnapshot {
            radio: PermissionState::NotDetermined,
            notification: PermissionState::Denied,
        };
        assert_eq!(
            snapshot.remediation(),
            RemediationKind::NotificationPermissionDenied
        );
    }

    #[test]
    fn test_wire_names_are_snake_case() {
        let json = serde_json::to_string(&RemediationKind::BluetoothPermissionDenied).unwrap();
        assert_eq!(json, "\"bluetooth_permission_denied\"");

        let power: RadioPower = serde_json::from_str("\"powered_off\"").unwrap();
        assert_eq!(power, RadioPower::PoweredOff);
    }

    #[test]
    fn test_token_display() {
        assert_eq!(DecisionToken(7).to_string(), "#7");
        assert!(DecisionToken(2) > DecisionToken(1));
    }
}
