//! Deciding whether two partial records denote the same real-world entity.
//!
//! String identities (key image hex, stealth keys, hashes) are compared as
//! given; normalization is the decode layer's job.

use crate::error::{EntityKind, ReconcileError, Result};
use crate::model::{Block, BlockId, KeyImage, Output, Transaction, TxId};

/// Two inputs match when their key images match. Inputs are keyed by key
/// image, so an input without one is a data error.
pub fn same_input(a: &Output, b: &Output) -> Result<bool> {
    let a = input_key(a)?;
    let b = input_key(b)?;
    Ok(a.same_identity(b))
}

fn input_key(input: &Output) -> Result<&KeyImage> {
    input
        .key_image
        .as_ref()
        .filter(|key_image| key_image.hex.is_some())
        .ok_or_else(|| ReconcileError::MissingIdentity {
            kind: EntityKind::Output,
            detail: "transaction input has no key image".to_string(),
        })
}

/// Two outputs match on key image hex or on stealth public key. Outputs that
/// carry neither never match anything.
pub fn same_output(a: &Output, b: &Output) -> bool {
    let by_key_image = match (&a.key_image, &b.key_image) {
        (Some(x), Some(y)) => x.same_identity(y),
        _ => false,
    };
    let by_stealth_key = matches!(
        (&a.stealth_public_key, &b.stealth_public_key),
        (Some(x), Some(y)) if x == y
    );
    by_key_image || by_stealth_key
}

/// Transactions match on known, equal hashes; hashless records only match themselves.
pub fn same_transaction(a_id: TxId, a: &Transaction, b_id: TxId, b: &Transaction) -> bool {
    match (&a.hash, &b.hash) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a_id == b_id,
        _ => false,
    }
}

/// Blocks match on height when both heights are known, otherwise only themselves.
pub fn same_block(a_id: BlockId, a: &Block, b_id: BlockId, b: &Block) -> bool {
    match (a.height, b.height) {
        (Some(x), Some(y)) => x == y,
        _ => a_id == b_id,
    }
}
