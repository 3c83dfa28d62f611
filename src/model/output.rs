use serde::{Deserialize, Serialize};

use super::{KeyImage, TxId};
use crate::error::Result;
use crate::reconcile::{adopt_if_absent, fold_field, Policy};

/// An output, used both as a transaction input (a spent-output reference
/// identified by its key image) and as a transaction output (identified by
/// its key image or stealth public key).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_image: Option<KeyImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ring_output_indices: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stealth_public_key: Option<String>,
    /// Owning transaction
    #[serde(skip)]
    pub tx: Option<TxId>,
    #[serde(skip_serializing_if = "OutputVariant::is_base")]
    pub variant: OutputVariant,
}

/// Wallet-specific fields layered over the base output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletOutputExt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subaddress_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_spent: Option<bool>,
}

/// Closed set of output flavours
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputVariant {
    #[default]
    Base,
    Wallet(WalletOutputExt),
}

impl OutputVariant {
    pub fn is_base(&self) -> bool {
        matches!(self, OutputVariant::Base)
    }

    /// Merge the per-variant extension fields; a base fragment carries none.
    pub fn merge(&mut self, other: &OutputVariant) -> Result<()> {
        let ext = match other {
            OutputVariant::Base => return Ok(()),
            OutputVariant::Wallet(ext) => ext,
        };
        match self {
            OutputVariant::Base => *self = OutputVariant::Wallet(ext.clone()),
            OutputVariant::Wallet(acc) => {
                fold_field(
                    "account_index",
                    &mut acc.account_index,
                    &ext.account_index,
                    Policy::Strict,
                )?;
                fold_field(
                    "subaddress_index",
                    &mut acc.subaddress_index,
                    &ext.subaddress_index,
                    Policy::Strict,
                )?;
                fold_field("is_spent", &mut acc.is_spent, &ext.is_spent, Policy::PreferTrue)?;
            }
        }
        Ok(())
    }
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_image(mut self, hex: impl Into<String>) -> Self {
        self.key_image = Some(KeyImage::new(hex));
        self
    }

    pub fn with_stealth_public_key(mut self, key: impl Into<String>) -> Self {
        self.stealth_public_key = Some(key.into());
        self
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    /// Key image hex, if one is known
    pub fn key_image_hex(&self) -> Option<&str> {
        self.key_image.as_ref().and_then(|ki| ki.hex.as_deref())
    }

    /// Fold the fields of another view of this same output. Owner links are
    /// left alone; the graph layer decides ownership.
    pub fn merge_fields(&mut self, other: &Output) -> Result<()> {
        if let Some(acc) = self.key_image.as_mut() {
            if other.key_image.is_some() {
                acc.merge(other.key_image.as_ref())?;
            }
        } else {
            self.key_image.clone_from(&other.key_image);
        }
        fold_field("amount", &mut self.amount, &other.amount, Policy::Strict)?;
        fold_field("index", &mut self.index, &other.index, Policy::Strict)?;
        adopt_if_absent(&mut self.ring_output_indices, &other.ring_output_indices);
        adopt_if_absent(&mut self.stealth_public_key, &other.stealth_public_key);
        self.variant.merge(&other.variant)
    }
}
