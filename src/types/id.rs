// ABOUTME: Phantom-typed handles for pipeline resources.
// ABOUTME: Prevents accidental swapping of bucket names, function names, and artifact keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum BucketMarker {}
pub enum FunctionMarker {}
pub enum ArtifactKeyMarker {}

/// A type-safe handle that prevents accidental mixing of different resource kinds.
///
/// A `BucketRef` can't be passed where a `FunctionRef` is expected, which matters
/// here because every stage parameter is "just a string" on the wire.
#[must_use = "handles reference resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

// Manual trait implementations that don't require T to implement the trait.
// T is only used as a phantom type marker.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Id").field("value", &self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

/// Artifact store bucket, addressed by name.
pub type BucketRef = Id<BucketMarker>;
/// Deployed function, addressed by name.
pub type FunctionRef = Id<FunctionMarker>;
/// Object key of a packaged artifact inside a bucket.
pub type ArtifactKey = Id<ArtifactKeyMarker>;
