//! Navigation targets of the main flow.
//!
//! Every destination is a variant of [`Screen`]; callers pick the variant,
//! nothing downstream inspects what kind of screen it was handed.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::FeatureFlags;

/// A screen that can be mounted as the child of the main root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    /// The "you're ok" status screen mounted when the main flow starts.
    Status,
    /// Legacy single-page symptom questionnaire.
    EnterDiagnosis,
    /// Multi-step self-diagnosis flow.
    SelfDiagnosis,
    /// Answers review at the end of self-diagnosis.
    SymptomsSummary {
        /// User reported a high temperature.
        high_temperature: bool,
        /// User reported a new continuous cough.
        new_cough: bool,
    },
    /// Shows the registration reference code for support calls.
    ReferenceCode {
        /// `None` when the code could not be fetched; the screen shows an error.
        code: Option<String>,
    },
}

impl Screen {
    /// Short stable name, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::EnterDiagnosis => "enter_diagnosis",
            Self::SelfDiagnosis => "self_diagnosis",
            Self::SymptomsSummary { .. } => "symptoms_summary",
            Self::ReferenceCode { .. } => "reference_code",
        }
    }
}

/// Destination of the "check symptoms" action on the status screen.
#[must_use]
pub const fn check_symptoms_target(flags: &FeatureFlags) -> Screen {
    if flags.new_self_diagnosis {
        Screen::SelfDiagnosis
    } else {
        Screen::EnterDiagnosis
    }
}
