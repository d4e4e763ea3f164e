// ABOUTME: Type-safe handles and validated domain types.
// ABOUTME: Uses phantom types to prevent resource handle confusion at compile time.

mod env_name;
mod id;

pub use env_name::{EnvName, UnknownEnvironment};
pub use id::{ArtifactKey, BucketRef, FunctionRef, Id};
