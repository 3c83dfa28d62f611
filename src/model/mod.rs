//! Partially-populated node entities.
//!
//! Every field is optional because an entity is the accumulation of whatever
//! individual RPC responses happened to report. Links between entities are
//! arena handles into an [`EntityGraph`](crate::graph::EntityGraph).

pub mod block;
pub mod key_image;
pub mod output;
pub mod transaction;

pub use block::Block;
pub use key_image::KeyImage;
pub use output::{Output, OutputVariant, WalletOutputExt};
pub use transaction::{Transaction, TxVariant, WalletTxExt};

use std::fmt;

/// Handle of a transaction inside an entity graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(pub(crate) usize);

/// Handle of a block inside an entity graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) usize);

/// Handle of an output (or spent-output input) inside an entity graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(pub(crate) usize);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output#{}", self.0)
    }
}

/// Serde helpers for optional byte fields rendered as lowercase hex
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| hex::decode(s.trim()).map_err(<D::Error as serde::de::Error>::custom))
            .transpose()
    }
}
