// ABOUTME: Credential exchange stage runner using the type state pattern.
// ABOUTME: Init -> CredentialsFetched -> Authorized -> Completed, each transition consuming self.

mod error;
mod state;
mod traits;

pub use error::{ExchangeError, ExchangeErrorKind};
pub use state::{Authorized, Completed, CredentialsFetched, Init};
pub use traits::{
    ArtifactError, ArtifactStore, CredentialSource, FunctionUpdater, UpdateCallError,
    UpdateReceipt, UpdateTarget,
};

use chrono::{DateTime, Utc};
use snafu::ResultExt;

use crate::credentials::Credentials;
use crate::diagnostics::{Diagnostics, Warning};
use crate::types::FunctionRef;
use error::{ArtifactSnafu, FetchSnafu, UpdateSnafu};

/// A credential exchange for one update target, parameterized by its state.
///
/// Credentials exist only inside `Authorized` and move into the single update
/// call. There is no way back to an earlier state: a retry starts from a new
/// `Exchange<Init>`.
#[derive(Debug)]
pub struct Exchange<S> {
    target: UpdateTarget,
    state: S,
}

impl<S> Exchange<S> {
    pub fn target(&self) -> &UpdateTarget {
        &self.target
    }
}

// =============================================================================
// Init -> CredentialsFetched
// =============================================================================

impl Exchange<Init> {
    pub fn new(target: UpdateTarget) -> Self {
        Exchange {
            target,
            state: Init,
        }
    }

    /// Check that the artifact exists before any credentials are requested.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeError::Artifact` when the object is missing or the store fails.
    pub async fn verify_artifact<A: ArtifactStore + ?Sized>(
        &self,
        store: &A,
    ) -> Result<(), ExchangeError> {
        let exists = store
            .object_exists(&self.target.bucket, &self.target.key)
            .await
            .context(ArtifactSnafu)?;

        if !exists {
            return Err(ArtifactError::Missing {
                bucket: self.target.bucket.to_string(),
                key: self.target.key.to_string(),
            })
            .context(ArtifactSnafu);
        }

        tracing::info!(bucket = %self.target.bucket, key = %self.target.key, "artifact present");
        Ok(())
    }

    /// Fetch a credentials document.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeError::Fetch` when the endpoint cannot be reached.
    #[must_use = "exchange state must be used"]
    pub async fn fetch<C: CredentialSource + ?Sized>(
        self,
        source: &C,
    ) -> Result<Exchange<CredentialsFetched>, ExchangeError> {
        let document = source.fetch().await.context(FetchSnafu)?;
        tracing::info!(function = %self.target.function, bytes = document.len(), "credentials fetched");

        Ok(Exchange {
            target: self.target,
            state: CredentialsFetched { document },
        })
    }
}

// =============================================================================
// CredentialsFetched -> Authorized
// =============================================================================

impl Exchange<CredentialsFetched> {
    /// Extract key material from the fetched document.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeError::Fetch` with a `Malformed` source when required
    /// fields are missing or the document is not JSON.
    pub fn authorize(self) -> Result<Exchange<Authorized>, ExchangeError> {
        let credentials = Credentials::from_document(&self.state.document).context(FetchSnafu)?;
        tracing::info!(
            function = %self.target.function,
            expiry = ?credentials.expiry(),
            has_session_token = credentials.session_token().is_some(),
            "credentials extracted"
        );

        Ok(Exchange {
            target: self.target,
            state: Authorized { credentials },
        })
    }
}

// =============================================================================
// Authorized -> Completed
// =============================================================================

impl Exchange<Authorized> {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.state.credentials.expiry()
    }

    /// Issue the update call, consuming the credentials.
    ///
    /// # Errors
    ///
    /// Returns `ExchangeError::Update` when the call is rejected. Credential
    /// values are scrubbed from the error text.
    #[must_use = "exchange state must be used"]
    pub async fn update<U: FunctionUpdater + ?Sized>(
        self,
        updater: &U,
    ) -> Result<Exchange<Completed>, ExchangeError> {
        let Exchange { target, state } = self;
        let redactor = state.credentials.redactor();

        let receipt = updater
            .update_function_code(state.credentials, &target)
            .await
            .map_err(|e| e.map_text(|text| redactor.redact(text)))
            .context(UpdateSnafu)?;

        tracing::info!(
            function = %receipt.function,
            code_sha256 = receipt.code_sha256.as_deref().unwrap_or("-"),
            "function code updated"
        );

        Ok(Exchange {
            target,
            state: Completed { receipt },
        })
    }
}

impl Exchange<Completed> {
    pub fn receipt(&self) -> &UpdateReceipt {
        &self.state.receipt
    }

    pub fn into_receipt(self) -> UpdateReceipt {
        self.state.receipt
    }
}

// =============================================================================
// Whole run
// =============================================================================

/// Credentials expiring sooner than this after authorization produce a warning.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// The collaborators of a full run. Fetch and authorize always happen; the
/// artifact check and the update call are opt-in.
pub struct ExchangeSteps<'a> {
    source: &'a dyn CredentialSource,
    store: Option<&'a dyn ArtifactStore>,
    updater: Option<&'a dyn FunctionUpdater>,
}

impl<'a> ExchangeSteps<'a> {
    pub fn new(source: &'a dyn CredentialSource) -> Self {
        Self {
            source,
            store: None,
            updater: None,
        }
    }

    /// Check the artifact in `store` before requesting credentials.
    pub fn verify_artifact(mut self, store: &'a dyn ArtifactStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Spend the credentials on `updater`. Without this the run stops once
    /// the credentials are authorized.
    pub fn update(mut self, updater: &'a dyn FunctionUpdater) -> Self {
        self.updater = Some(updater);
        self
    }
}

/// Terminal state of a full exchange.
#[derive(Debug)]
pub enum ExchangeOutcome {
    Completed(UpdateReceipt),
    /// Credentials were authorized and no update was requested.
    Verified(FunctionRef),
    Failed(ExchangeError),
}

impl ExchangeOutcome {
    /// The receipt of the update call, `None` for a run that only verified.
    pub fn into_result(self) -> Result<Option<UpdateReceipt>, ExchangeError> {
        match self {
            ExchangeOutcome::Completed(receipt) => Ok(Some(receipt)),
            ExchangeOutcome::Verified(_) => Ok(None),
            ExchangeOutcome::Failed(e) => Err(e),
        }
    }
}

/// Drive an exchange from `Init` through the update call. Never retries.
pub async fn run<C, U>(target: UpdateTarget, source: &C, updater: &U) -> ExchangeOutcome
where
    C: CredentialSource,
    U: FunctionUpdater,
{
    let steps = ExchangeSteps::new(source).update(updater);
    run_with(target, steps, &mut Diagnostics::default()).await
}

/// Drive an exchange through `steps` to a terminal state. Never retries.
///
/// Credentials close to expiry are recorded in `diag`; a failure is logged
/// once here, with credential values already scrubbed.
pub async fn run_with(
    target: UpdateTarget,
    steps: ExchangeSteps<'_>,
    diag: &mut Diagnostics,
) -> ExchangeOutcome {
    let function = target.function.clone();
    match drive(target, &steps, diag).await {
        Ok(Some(receipt)) => ExchangeOutcome::Completed(receipt),
        Ok(None) => ExchangeOutcome::Verified(function),
        Err(e) => {
            tracing::error!(function = %function, kind = ?e.kind(), "credential exchange failed: {}", e);
            ExchangeOutcome::Failed(e)
        }
    }
}

async fn drive(
    target: UpdateTarget,
    steps: &ExchangeSteps<'_>,
    diag: &mut Diagnostics,
) -> Result<Option<UpdateReceipt>, ExchangeError> {
    let exchange = Exchange::new(target);
    match steps.store {
        Some(store) => exchange.verify_artifact(store).await?,
        None => tracing::debug!("artifact check skipped"),
    }

    let authorized = exchange.fetch(steps.source).await?.authorize()?;
    warn_on_expiry(&authorized, diag);

    let Some(updater) = steps.updater else {
        return Ok(None);
    };
    Ok(Some(authorized.update(updater).await?.into_receipt()))
}

fn warn_on_expiry(exchange: &Exchange<Authorized>, diag: &mut Diagnostics) {
    let Some(expiry) = exchange.expires_at() else {
        return;
    };
    let remaining = expiry.signed_duration_since(Utc::now()).num_seconds();
    if remaining < EXPIRY_MARGIN_SECS {
        diag.warn(Warning::credential_expiry(format!(
            "credentials expire in {remaining}s, before {} may finish updating",
            exchange.target().function
        )));
    }
}
