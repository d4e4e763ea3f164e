// ABOUTME: Diagnostics accumulator for non-fatal warnings during a pipeline command.
// ABOUTME: Collects warnings that shouldn't fail a run but should be shown to users.

/// Collects non-fatal warnings during orchestration.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during orchestration.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create a warning for a function picked by list position instead of by name.
    pub fn implicit_selection(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ImplicitSelection,
            message: message.into(),
        }
    }

    /// Create a warning for credentials that are close to (or past) expiry.
    pub fn credential_expiry(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::CredentialExpiry,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// No function was named and the first configured one was used.
    ImplicitSelection,
    /// Exchanged credentials expire before the update call is likely to finish.
    CredentialExpiry,
}
