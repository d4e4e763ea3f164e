// ABOUTME: Credential exchange state types for the type state pattern.
// ABOUTME: Later states carry the data produced by the transition into them.

use crate::credentials::{Credentials, MetadataDocument};

use super::traits::UpdateReceipt;

/// Nothing fetched yet.
/// Available actions: `verify_artifact()`, `fetch()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Init;

/// Raw document received from the metadata endpoint.
/// Available actions: `authorize()`
#[derive(Debug)]
pub struct CredentialsFetched {
    pub(crate) document: MetadataDocument,
}

/// Key material extracted and ready for the update call.
/// Available actions: `update()`
#[derive(Debug)]
pub struct Authorized {
    pub(crate) credentials: Credentials,
}

/// Update call accepted. Credentials are gone.
#[derive(Debug)]
pub struct Completed {
    pub(crate) receipt: UpdateReceipt,
}
