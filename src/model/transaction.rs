use serde::{Deserialize, Serialize};

use super::{BlockId, OutputId};
use crate::error::Result;
use crate::reconcile::{fold_field, Policy};

/// A transaction as observed through any number of RPC responses.
///
/// Scalar fields are merged by [`EntityGraph::merge_transaction`](crate::graph::EntityGraph::merge_transaction);
/// `inputs`, `outputs` and `block` are arena links and never serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_miner_tx: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ring_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_relayed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_confirmed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_tx_pool: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_confirmations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_relayed_timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_double_spend_seen: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pruned_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prunable_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prunable_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(with = "super::hex_bytes", skip_serializing_if = "Option::is_none")]
    pub extra: Option<Vec<u8>>,
    /// Opaque ringct payload, compared as text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rct_signatures: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rct_sig_prunable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_kept_by_block: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_failed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failed_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failed_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_used_block_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_used_block_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_indices: Option<Vec<u64>>,
    #[serde(skip)]
    pub inputs: Vec<OutputId>,
    #[serde(skip)]
    pub outputs: Vec<OutputId>,
    /// Containing block
    #[serde(skip)]
    pub block: Option<BlockId>,
    #[serde(skip_serializing_if = "TxVariant::is_base")]
    pub variant: TxVariant,
}

/// Wallet-specific fields layered over the base transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletTxExt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_incoming: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_outgoing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_dummy_outputs: Option<u32>,
}

/// Closed set of transaction flavours
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxVariant {
    #[default]
    Base,
    Wallet(WalletTxExt),
}

impl TxVariant {
    pub fn is_base(&self) -> bool {
        matches!(self, TxVariant::Base)
    }

    /// Merge the per-variant extension fields; a base fragment carries none.
    pub fn merge(&mut self, other: &TxVariant) -> Result<()> {
        let ext = match other {
            TxVariant::Base => return Ok(()),
            TxVariant::Wallet(ext) => ext,
        };
        match self {
            TxVariant::Base => *self = TxVariant::Wallet(ext.clone()),
            TxVariant::Wallet(acc) => {
                fold_field(
                    "is_incoming",
                    &mut acc.is_incoming,
                    &ext.is_incoming,
                    Policy::PreferTrue,
                )?;
                fold_field(
                    "is_outgoing",
                    &mut acc.is_outgoing,
                    &ext.is_outgoing,
                    Policy::PreferTrue,
                )?;
                fold_field("note", &mut acc.note, &ext.note, Policy::Strict)?;
                fold_field(
                    "change_amount",
                    &mut acc.change_amount,
                    &ext.change_amount,
                    Policy::Strict,
                )?;
                fold_field(
                    "change_address",
                    &mut acc.change_address,
                    &ext.change_address,
                    Policy::Strict,
                )?;
                fold_field(
                    "num_dummy_outputs",
                    &mut acc.num_dummy_outputs,
                    &ext.num_dummy_outputs,
                    Policy::Strict,
                )?;
            }
        }
        Ok(())
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Fold every non-lifecycle scalar of `other` into this transaction.
    ///
    /// Pool membership and the relay/received timestamps depend on the merged
    /// confirmation state and are handled by [`Transaction::settle_lifecycle`].
    pub fn merge_scalars(&mut self, other: &Transaction) -> Result<()> {
        fold_field("hash", &mut self.hash, &other.hash, Policy::Strict)?;
        fold_field("version", &mut self.version, &other.version, Policy::Strict)?;
        fold_field("is_miner_tx", &mut self.is_miner_tx, &other.is_miner_tx, Policy::Strict)?;
        fold_field("payment_id", &mut self.payment_id, &other.payment_id, Policy::Strict)?;
        fold_field("fee", &mut self.fee, &other.fee, Policy::Strict)?;
        fold_field("ring_size", &mut self.ring_size, &other.ring_size, Policy::Strict)?;
        fold_field("relay", &mut self.relay, &other.relay, Policy::PreferTrue)?;
        fold_field("is_relayed", &mut self.is_relayed, &other.is_relayed, Policy::PreferTrue)?;
        fold_field(
            "is_confirmed",
            &mut self.is_confirmed,
            &other.is_confirmed,
            Policy::PreferTrue,
        )?;
        fold_field(
            "num_confirmations",
            &mut self.num_confirmations,
            &other.num_confirmations,
            Policy::PreferHigher,
        )?;
        fold_field("unlock_time", &mut self.unlock_time, &other.unlock_time, Policy::Strict)?;
        fold_field(
            "is_double_spend_seen",
            &mut self.is_double_spend_seen,
            &other.is_double_spend_seen,
            Policy::PreferTrue,
        )?;
        fold_field("key", &mut self.key, &other.key, Policy::Strict)?;
        fold_field("full_hex", &mut self.full_hex, &other.full_hex, Policy::Strict)?;
        fold_field("pruned_hex", &mut self.pruned_hex, &other.pruned_hex, Policy::Strict)?;
        fold_field("prunable_hex", &mut self.prunable_hex, &other.prunable_hex, Policy::Strict)?;
        fold_field("prunable_hash", &mut self.prunable_hash, &other.prunable_hash, Policy::Strict)?;
        fold_field("size", &mut self.size, &other.size, Policy::Strict)?;
        fold_field("weight", &mut self.weight, &other.weight, Policy::Strict)?;
        fold_field("metadata", &mut self.metadata, &other.metadata, Policy::Strict)?;
        fold_field("extra", &mut self.extra, &other.extra, Policy::Strict)?;
        fold_field(
            "rct_signatures",
            &mut self.rct_signatures,
            &other.rct_signatures,
            Policy::Strict,
        )?;
        fold_field(
            "rct_sig_prunable",
            &mut self.rct_sig_prunable,
            &other.rct_sig_prunable,
            Policy::Strict,
        )?;
        fold_field(
            "is_kept_by_block",
            &mut self.is_kept_by_block,
            &other.is_kept_by_block,
            Policy::PreferTrue,
        )?;
        fold_field("is_failed", &mut self.is_failed, &other.is_failed, Policy::PreferTrue)?;
        fold_field(
            "last_failed_height",
            &mut self.last_failed_height,
            &other.last_failed_height,
            Policy::Strict,
        )?;
        fold_field(
            "last_failed_hash",
            &mut self.last_failed_hash,
            &other.last_failed_hash,
            Policy::Strict,
        )?;
        fold_field(
            "max_used_block_height",
            &mut self.max_used_block_height,
            &other.max_used_block_height,
            Policy::Strict,
        )?;
        fold_field(
            "max_used_block_hash",
            &mut self.max_used_block_hash,
            &other.max_used_block_hash,
            Policy::Strict,
        )?;
        Ok(())
    }

    /// Whole-sequence fields: observed at once, so they must match exactly.
    pub fn merge_sequences(&mut self, other: &Transaction) -> Result<()> {
        fold_field("signatures", &mut self.signatures, &other.signatures, Policy::Strict)?;
        fold_field(
            "output_indices",
            &mut self.output_indices,
            &other.output_indices,
            Policy::Strict,
        )?;
        Ok(())
    }

    /// Apply the lifecycle order not-relayed ≤ relayed ≤ confirmed. A
    /// confirmed transaction is out of the pool and its relay/received
    /// timestamps no longer apply.
    pub fn settle_lifecycle(&mut self, other: &Transaction) -> Result<()> {
        if self.is_confirmed == Some(true) {
            self.in_tx_pool = Some(false);
            self.received_timestamp = None;
            self.last_relayed_timestamp = None;
            return Ok(());
        }
        fold_field("in_tx_pool", &mut self.in_tx_pool, &other.in_tx_pool, Policy::PreferTrue)?;
        fold_field(
            "received_timestamp",
            &mut self.received_timestamp,
            &other.received_timestamp,
            Policy::PreferEarliest,
        )?;
        fold_field(
            "last_relayed_timestamp",
            &mut self.last_relayed_timestamp,
            &other.last_relayed_timestamp,
            Policy::PreferLatest,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;

    #[test]
    fn test_fee_conflict() {
        let mut acc = Transaction::new().with_hash("aa");
        acc.fee = Some(10);
        let mut frag = Transaction::new().with_hash("aa");
        frag.fee = Some(11);
        let err = acc.merge_scalars(&frag).unwrap_err();
        assert!(matches!(err, ReconcileError::ReconciliationConflict { field: "fee", .. }));
    }

    #[test]
    fn test_monotone_flags() {
        let mut acc = Transaction::new();
        acc.is_relayed = Some(true);
        acc.num_confirmations = Some(5);
        let mut frag = Transaction::new();
        frag.is_relayed = Some(false);
        frag.num_confirmations = Some(2);
        frag.is_failed = Some(true);
        acc.merge_scalars(&frag).unwrap();
        assert_eq!(acc.is_relayed, Some(true));
        assert_eq!(acc.num_confirmations, Some(5));
        assert_eq!(acc.is_failed, Some(true));
    }

    #[test]
    fn test_confirmed_clears_pool_state() {
        let mut acc = Transaction::new();
        acc.in_tx_pool = Some(true);
        acc.received_timestamp = Some(100);
        acc.last_relayed_timestamp = Some(120);
        let mut frag = Transaction::new();
        frag.is_confirmed = Some(true);
        acc.merge_scalars(&frag).unwrap();
        acc.settle_lifecycle(&frag).unwrap();
        assert_eq!(acc.in_tx_pool, Some(false));
        assert_eq!(acc.received_timestamp, None);
        assert_eq!(acc.last_relayed_timestamp, None);
    }

    #[test]
    fn test_unconfirmed_timestamps() {
        let mut acc = Transaction::new();
        acc.received_timestamp = Some(100);
        acc.last_relayed_timestamp = Some(100);
        let mut frag = Transaction::new();
        frag.received_timestamp = Some(50);
        frag.last_relayed_timestamp = Some(150);
        frag.in_tx_pool = Some(true);
        acc.settle_lifecycle(&frag).unwrap();
        assert_eq!(acc.received_timestamp, Some(50));
        assert_eq!(acc.last_relayed_timestamp, Some(150));
        assert_eq!(acc.in_tx_pool, Some(true));
    }

    #[test]
    fn test_signature_sequences_must_match() {
        let mut acc = Transaction::new();
        acc.signatures = Some(vec!["s1".into(), "s2".into()]);
        let mut frag = Transaction::new();
        frag.signatures = Some(vec!["s2".into(), "s1".into()]);
        assert!(acc.merge_sequences(&frag).is_err());
    }

    #[test]
    fn test_wallet_flags_prefer_true() {
        let mut acc = TxVariant::Wallet(WalletTxExt {
            is_incoming: Some(false),
            ..Default::default()
        });
        acc.merge(&TxVariant::Wallet(WalletTxExt {
            is_incoming: Some(true),
            note: Some("rent".into()),
            ..Default::default()
        }))
        .unwrap();
        match acc {
            TxVariant::Wallet(ext) => {
                assert_eq!(ext.is_incoming, Some(true));
                assert_eq!(ext.note.as_deref(), Some("rent"));
            }
            TxVariant::Base => panic!("wallet view lost"),
        }
    }
}
