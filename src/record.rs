//! The record contract: what a type must expose to live in a store.
//!
//! Implement [`Record`] for your type and pick an id kind. Sequential ids
//! (`u64`, `u32`, `usize`) and [`Uuid`] get a fallback generator for free;
//! string keys need a caller-supplied [`IdGenerator`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use uuid::Uuid;

/// Field name both codecs use for the identity value.
pub const ID_FIELD: &str = "id";
/// Field name for the creation timestamp.
pub const CREATED_AT_FIELD: &str = "created_at";
/// Field name for the optional update timestamp.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Wall-clock timestamp stored on records. Serialized as RFC 3339 text.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identity value of a record.
pub trait RecordId: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// `true` when the value means "no id yet" (zero, nil, empty).
    fn is_unset(&self) -> bool;

    /// Fallback id used by `create` when no generator is configured.
    /// `None` means this id kind can't be invented by the store.
    fn generate<'a, I>(existing: I) -> Option<Self>
    where
        I: Iterator<Item = &'a Self>,
        Self: 'a;
}

macro_rules! sequential_id {
    ($($t:ty),* $(,)?) => {$(
        impl RecordId for $t {
            fn is_unset(&self) -> bool {
                *self == 0
            }

            // max + 1 rather than len + 1: stays fresh after deletes.
            fn generate<'a, I>(existing: I) -> Option<Self>
            where
                I: Iterator<Item = &'a Self>,
                Self: 'a,
            {
                existing.copied().max().unwrap_or(0).checked_add(1)
            }
        }
    )*};
}

sequential_id!(u64, u32, usize);

impl RecordId for Uuid {
    fn is_unset(&self) -> bool {
        self.is_nil()
    }

    fn generate<'a, I>(_existing: I) -> Option<Self>
    where
        I: Iterator<Item = &'a Self>,
        Self: 'a,
    {
        Some(Uuid::new_v4())
    }
}

impl RecordId for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn generate<'a, I>(_existing: I) -> Option<Self>
    where
        I: Iterator<Item = &'a Self>,
        Self: 'a,
    {
        None
    }
}

/// A type that can be stored in a [`Reader`](crate::Reader) /
/// [`Writer`](crate::Writer).
///
/// The update timestamp is an optional capability: leave the default no-op
/// methods in place if your type doesn't track it.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identity key type.
    type Id: RecordId;

    /// Current id. May be unset on records that were never stored.
    fn id(&self) -> &Self::Id;

    /// Overwrite the id.
    fn set_id(&mut self, id: Self::Id);

    /// Creation time, if stamped.
    fn created_at(&self) -> Option<Timestamp>;

    /// Stamp the creation time. Called once, by `create`.
    fn set_created_at(&mut self, at: Timestamp);

    /// Last update time, if the type tracks it.
    fn updated_at(&self) -> Option<Timestamp> {
        None
    }

    /// Stamp the update time. Called by every successful `update`.
    fn set_updated_at(&mut self, _at: Timestamp) {}
}

/// Caller-supplied id generator. Receives the current sequence and the
/// candidate record, and runs while the store's exclusive lock is held, so it
/// must not call back into the same store.
pub type IdGenerator<R> = Arc<dyn Fn(&[R], &R) -> <R as Record>::Id + Send + Sync>;
