// ABOUTME: AWS-backed implementations of the exchange collaborator traits.
// ABOUTME: Lambda code updates with static credentials and S3 artifact lookups.

mod lambda;
mod s3;

pub use lambda::LambdaUpdater;
pub use s3::S3ArtifactStore;
