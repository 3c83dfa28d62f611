//! Entity merge protocol.
//!
//! Every merge folds a fragment into an accumulator and returns the
//! accumulator's handle. Errors propagate as raised and nothing is rolled
//! back: after a failed merge the accumulator is only partially updated and
//! should be discarded by the caller.

mod block;
mod transaction;

use std::collections::HashSet;

use tracing::trace;

use crate::error::{ReconcileError, Result};
use crate::graph::EntityGraph;
use crate::model::{BlockId, OutputId, TxId};

/// Blocks currently being unified further up the call stack.
///
/// A transaction merge may unify two blocks, and a block merge merges the
/// transactions they contain; the guard stops the second level from
/// unifying the same blocks again.
#[derive(Debug, Default)]
pub(crate) struct MergeGuard {
    unifying: HashSet<BlockId>,
}

impl MergeGuard {
    fn is_unifying(&self, a: BlockId, b: BlockId) -> bool {
        self.unifying.contains(&a) || self.unifying.contains(&b)
    }

    fn enter(&mut self, a: BlockId, b: BlockId) {
        self.unifying.insert(a);
        self.unifying.insert(b);
    }

    fn leave(&mut self, a: BlockId, b: BlockId) {
        self.unifying.remove(&a);
        self.unifying.remove(&b);
    }
}

impl EntityGraph {
    /// Merge output `frag` into output `acc`.
    ///
    /// Outputs owned by two different transactions are unified by merging
    /// the owning transactions. Otherwise the two are views of one output and
    /// their fields are folded together.
    pub fn merge_output(&mut self, acc: OutputId, frag: OutputId) -> Result<OutputId> {
        let acc_owner = self.output(acc)?.tx.map(|tx| self.resolve_transaction(tx));
        if acc == frag {
            return Ok(acc);
        }
        let fragment = self.output(frag)?.clone();
        let frag_owner = fragment.tx.map(|tx| self.resolve_transaction(tx));

        match (acc_owner, frag_owner) {
            (Some(a), Some(b)) if a != b => {
                trace!(%acc, %frag, "output merge unifies owning transactions");
                self.merge_transaction(a, b)?;
            }
            (None, Some(_)) => return Err(ReconcileError::MissingOwner(acc.to_string())),
            _ => {
                self.output_mut(acc)?.merge_fields(&fragment)?;
                if let Some(owner) = acc_owner {
                    self.drop_duplicate_output(owner, acc, frag)?;
                }
            }
        }
        Ok(acc)
    }

    /// Remove `frag` from the owner's input and output lists that already hold `acc`.
    fn drop_duplicate_output(&mut self, owner: TxId, acc: OutputId, frag: OutputId) -> Result<()> {
        let tx = self.transaction_mut(owner)?;
        for list in [&mut tx.inputs, &mut tx.outputs] {
            if list.contains(&acc) {
                list.retain(|id| *id != frag);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Output, Transaction};

    #[test]
    fn test_merge_output_same_owner_folds_fields() {
        let mut graph = EntityGraph::new();
        let tx = graph.insert_transaction(Transaction::new().with_hash("aa"));
        let a = graph.insert_output(Output::new().with_key_image("ki"));
        let b = graph.insert_output(Output::new().with_key_image("ki").with_amount(7));
        graph.attach_output(tx, a).unwrap();
        graph.output_mut(b).unwrap().tx = Some(tx);

        assert_eq!(graph.merge_output(a, b).unwrap(), a);
        assert_eq!(graph.output(a).unwrap().amount, Some(7));
    }

    #[test]
    fn test_merge_output_same_owner_leaves_one_listing() {
        let mut graph = EntityGraph::new();
        let tx = graph.insert_transaction(Transaction::new().with_hash("aa"));
        let a = graph.insert_output(Output::new().with_key_image("abc"));
        let b = graph.insert_output(Output::new().with_key_image("abc").with_amount(7));
        let other = graph.insert_output(Output::new().with_key_image("def"));
        graph.attach_output(tx, a).unwrap();
        graph.attach_output(tx, b).unwrap();
        graph.attach_output(tx, other).unwrap();

        graph.merge_output(a, b).unwrap();

        assert_eq!(graph.output(a).unwrap().amount, Some(7));
        assert_eq!(graph.transaction(tx).unwrap().outputs, vec![a, other]);
        assert_eq!(graph.tx_outputs(tx).unwrap().len(), 2);
    }

    #[test]
    fn test_merge_output_with_itself() {
        let mut graph = EntityGraph::new();
        let a = graph.insert_output(Output::new().with_amount(1));
        assert_eq!(graph.merge_output(a, a).unwrap(), a);
        assert_eq!(graph.output(a).unwrap().amount, Some(1));
    }

    #[test]
    fn test_merge_output_missing_owner() {
        let mut graph = EntityGraph::new();
        let tx = graph.insert_transaction(Transaction::new().with_hash("aa"));
        let a = graph.insert_output(Output::new().with_key_image("ki"));
        let b = graph.insert_output(Output::new().with_key_image("ki"));
        graph.attach_output(tx, b).unwrap();

        let err = graph.merge_output(a, b).unwrap_err();
        assert!(matches!(err, ReconcileError::MissingOwner(_)));
    }

    #[test]
    fn test_merge_output_absent_fragment() {
        let mut graph = EntityGraph::new();
        let a = graph.insert_output(Output::new());
        let err = graph.merge_output(a, OutputId(9)).unwrap_err();
        assert!(matches!(err, ReconcileError::NullMerge { .. }));
    }

    #[test]
    fn test_merge_output_unifies_owners() {
        let mut graph = EntityGraph::new();
        let t1 = graph.insert_transaction(Transaction::new().with_hash("aa"));
        let mut seen = Transaction::new().with_hash("aa");
        seen.fee = Some(30);
        let t2 = graph.insert_transaction(seen);
        let a = graph.insert_output(Output::new().with_stealth_public_key("p"));
        let b = graph.insert_output(Output::new().with_stealth_public_key("p").with_amount(9));
        graph.attach_output(t1, a).unwrap();
        graph.attach_output(t2, b).unwrap();

        graph.merge_output(a, b).unwrap();

        assert_eq!(graph.transaction(t1).unwrap().fee, Some(30));
        assert_eq!(graph.transaction(t1).unwrap().outputs, vec![a]);
        assert_eq!(graph.output(a).unwrap().amount, Some(9));
        assert_eq!(graph.resolve_transaction(t2), t1);
    }
}
