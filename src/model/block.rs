use serde::{Deserialize, Serialize};

use super::TxId;
use crate::error::Result;
use crate::reconcile::{fold_field, Policy};

/// A block header plus the transactions it is known to contain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Block {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_term_weight: Option<u64>,
    /// Blocks on top of this one; grows as the chain does
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major_version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor_version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miner_tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hashes: Option<Vec<String>>,
    #[serde(skip)]
    pub txs: Vec<TxId>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_height(height: u64) -> Self {
        Self {
            height: Some(height),
            ..Self::default()
        }
    }

    /// Fold the header fields of `other`; the transaction list is merged by the graph.
    pub fn merge_header(&mut self, other: &Block) -> Result<()> {
        fold_field("block.height", &mut self.height, &other.height, Policy::Strict)?;
        fold_field("block.hash", &mut self.hash, &other.hash, Policy::Strict)?;
        fold_field("block.timestamp", &mut self.timestamp, &other.timestamp, Policy::Strict)?;
        fold_field("block.size", &mut self.size, &other.size, Policy::Strict)?;
        fold_field("block.weight", &mut self.weight, &other.weight, Policy::Strict)?;
        fold_field(
            "block.long_term_weight",
            &mut self.long_term_weight,
            &other.long_term_weight,
            Policy::Strict,
        )?;
        fold_field("block.depth", &mut self.depth, &other.depth, Policy::PreferHigher)?;
        fold_field(
            "block.major_version",
            &mut self.major_version,
            &other.major_version,
            Policy::Strict,
        )?;
        fold_field(
            "block.minor_version",
            &mut self.minor_version,
            &other.minor_version,
            Policy::Strict,
        )?;
        fold_field("block.nonce", &mut self.nonce, &other.nonce, Policy::Strict)?;
        fold_field("block.prev_hash", &mut self.prev_hash, &other.prev_hash, Policy::Strict)?;
        fold_field("block.reward", &mut self.reward, &other.reward, Policy::Strict)?;
        fold_field(
            "block.miner_tx_hash",
            &mut self.miner_tx_hash,
            &other.miner_tx_hash,
            Policy::Strict,
        )?;
        fold_field("block.tx_hashes", &mut self.tx_hashes, &other.tx_hashes, Policy::Strict)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_only_grows() {
        let mut acc = Block::at_height(10);
        acc.depth = Some(4);
        let mut frag = Block::at_height(10);
        frag.depth = Some(2);
        acc.merge_header(&frag).unwrap();
        assert_eq!(acc.depth, Some(4));
    }

    #[test]
    fn test_height_conflict() {
        let mut acc = Block::at_height(10);
        assert!(acc.merge_header(&Block::at_height(11)).is_err());
    }
}
