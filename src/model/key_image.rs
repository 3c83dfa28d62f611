use serde::{Deserialize, Serialize};

use crate::error::{EntityKind, ReconcileError, Result};
use crate::reconcile::{fold_field, Policy};

/// A spent output's key image: hex identity plus an optional signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl KeyImage {
    pub fn new(hex: impl Into<String>) -> Self {
        Self {
            hex: Some(hex.into()),
            signature: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Two key images denote the same spend when their hex strings match
    pub fn same_identity(&self, other: &KeyImage) -> bool {
        matches!((&self.hex, &other.hex), (Some(a), Some(b)) if a == b)
    }

    /// Fold `other` into this key image.
    pub fn merge(&mut self, other: Option<&KeyImage>) -> Result<&mut Self> {
        let other = other.ok_or(ReconcileError::NullMerge {
            kind: EntityKind::KeyImage,
            id: None,
        })?;
        // `&mut self` cannot alias `other`, so there is no self-merge case here.
        fold_field("key_image.hex", &mut self.hex, &other.hex, Policy::Strict)?;
        fold_field("key_image.signature", &mut self.signature, &other.signature, Policy::Strict)?;
        Ok(self)
    }
}
