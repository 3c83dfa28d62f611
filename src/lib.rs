//! Client-side model layer for a cryptocurrency node's RPC surface.
//!
//! Separate RPC calls each report a partial view of the same transaction,
//! output, block or key image. This crate folds those fragments into one
//! maximally complete view held in an [`EntityGraph`], keeping the
//! transaction ↔ block back-references canonical.
//!
//! # Example
//!
//! ```
//! use rpc_reconciler::{EntityGraph, Output, Transaction};
//!
//! let mut graph = EntityGraph::new();
//! let acc = graph.insert_transaction(Transaction::new().with_hash("ab12"));
//! let out = graph.insert_output(Output::new().with_key_image("abc"));
//! graph.attach_output(acc, out).unwrap();
//!
//! let mut seen = Transaction::new().with_hash("ab12");
//! seen.fee = Some(30_000);
//! let frag = graph.insert_transaction(seen);
//! let out = graph.insert_output(Output::new().with_key_image("abc").with_amount(100));
//! graph.attach_output(frag, out).unwrap();
//!
//! graph.merge_transaction(acc, frag).unwrap();
//! assert_eq!(graph.transaction(acc).unwrap().fee, Some(30_000));
//! assert_eq!(graph.tx_outputs(acc).unwrap()[0].amount, Some(100));
//! ```

pub mod collection;
pub mod error;
pub mod fold;
pub mod graph;
pub mod identity;
mod merge;
pub mod model;
pub mod reconcile;
pub mod snapshot;

#[cfg(feature = "wasm-bindgen")]
pub mod wasm;


pub use error::{EntityKind, ReconcileError, Result};
pub use fold::Reconciler;
pub use graph::EntityGraph;
pub use model::{
    Block, BlockId, KeyImage, Output, OutputId, OutputVariant, Transaction, TxId, TxVariant,
    WalletOutputExt, WalletTxExt,
};
pub use reconcile::{reconcile, Policy};
pub use snapshot::{BlockSnapshot, Fragment, TxSnapshot};
