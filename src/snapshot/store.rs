//! External collaborators referenced only by interface: the on-disk
//! IndexedDB-family decoder and the Yjs-like CRDT blob decoder. Both are out
//! of scope for this crate; it only consumes them through these traits.

use crate::model::attribute_map::AttributeMap;
use async_trait::async_trait;
use serde_json::Value;

/// A handle on the opened on-disk database. Implementations decode whatever
/// binary layout the host application uses; this crate only ever sees
/// attribute maps.
#[async_trait]
pub trait ObjectStoreDatabase: Send + Sync {
    /// Names of every object store present, in whatever order the backing
    /// format enumerates them.
    fn object_store_names(&self) -> Vec<String>;

    /// Up to `limit` records from the front of `store_name`, for sampling
    /// during detection. A store whose iterator fails should return `Err`;
    /// the detector treats that as "skip this store".
    async fn sample_records(&self, store_name: &str, limit: usize) -> anyhow::Result<Vec<AttributeMap>>;

    /// Every record in `store_name`, for materializing a detected entity
    /// store in full.
    async fn all_records(&self, store_name: &str) -> anyhow::Result<Vec<AttributeMap>>;
}

/// Decodes the CRDT-encoded long-form content blobs (`bodyData`,
/// `contentData`) into plain text.
pub trait CrdtDecoder: Send + Sync {
    fn decode(&self, blob: &Value) -> anyhow::Result<String>;
}
