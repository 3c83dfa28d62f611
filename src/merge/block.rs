use tracing::trace;

use super::MergeGuard;
use crate::collection::{merge_list, ListMerge};
use crate::error::Result;
use crate::graph::EntityGraph;
use crate::identity::same_transaction;
use crate::model::{Block, BlockId, TxId};

/// Transactions of one block, merged by transaction identity
struct BlockTransactions<'a> {
    graph: &'a mut EntityGraph,
    guard: &'a mut MergeGuard,
    block: BlockId,
}

impl ListMerge<TxId> for BlockTransactions<'_> {
    fn same(&self, existing: &TxId, incoming: &TxId) -> Result<bool> {
        let a = self.graph.transaction(*existing)?;
        let b = self.graph.transaction(*incoming)?;
        Ok(same_transaction(*existing, a, *incoming, b))
    }

    fn merge_into(&mut self, existing: &TxId, incoming: &TxId) -> Result<()> {
        self.graph.merge_transaction_guarded(*existing, *incoming, &mut *self.guard)?;
        Ok(())
    }

    fn adopt(&mut self, incoming: &TxId) -> Result<()> {
        self.graph.transaction_mut(*incoming)?.block = Some(self.block);
        Ok(())
    }
}

impl EntityGraph {
    /// Merge block `frag` into block `acc`.
    ///
    /// Header fields are reconciled, then every transaction of `frag` is
    /// merged into the matching transaction of `acc` or appended to it.
    pub fn merge_block(&mut self, acc: BlockId, frag: BlockId) -> Result<BlockId> {
        let mut guard = MergeGuard::default();
        self.merge_block_guarded(acc, frag, &mut guard)
    }

    pub(crate) fn merge_block_guarded(
        &mut self,
        acc: BlockId,
        frag: BlockId,
        guard: &mut MergeGuard,
    ) -> Result<BlockId> {
        let acc = self.resolve_block(acc);
        let frag = self.resolve_block(frag);
        self.block(acc)?;
        if acc == frag {
            return Ok(acc);
        }
        let fragment = self.block(frag)?.clone();

        guard.enter(acc, frag);
        let result = self.merge_block_contents(acc, frag, &fragment, guard);
        guard.leave(acc, frag);
        result?;

        trace!(%acc, %frag, height = ?fragment.height, "merged block");
        Ok(acc)
    }

    fn merge_block_contents(
        &mut self,
        acc: BlockId,
        frag: BlockId,
        fragment: &Block,
        guard: &mut MergeGuard,
    ) -> Result<()> {
        self.block_mut(acc)?.merge_header(fragment)?;

        let mut incoming: Vec<TxId> = Vec::with_capacity(fragment.txs.len());
        for tx in fragment.txs.iter().map(|tx| self.resolve_transaction(*tx)) {
            if !incoming.contains(&tx) {
                incoming.push(tx);
            }
        }

        let mut list = std::mem::take(&mut self.block_mut(acc)?.txs);
        let result = {
            let mut strategy = BlockTransactions {
                graph: &mut *self,
                guard,
                block: acc,
            };
            merge_list(&mut list, &incoming, &mut strategy)
        };

        // Keep anything a nested merge listed while the list was detached.
        let nested = std::mem::replace(&mut self.block_mut(acc)?.txs, list);
        let txs = &mut self.block_mut(acc)?.txs;
        for tx in nested {
            if !txs.contains(&tx) {
                txs.push(tx);
            }
        }
        result?;

        self.forward_block(frag, acc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ReconcileError;
    use crate::graph::EntityGraph;
    use crate::model::{Block, Transaction};

    #[test]
    fn test_merge_block_matches_by_hash_and_appends() {
        let mut graph = EntityGraph::new();
        let acc = graph.insert_block(Block::at_height(10));
        let frag = graph.insert_block(Block::at_height(10));
        let a = graph.insert_transaction(Transaction::new().with_hash("a"));
        let mut a_seen = Transaction::new().with_hash("a");
        a_seen.fee = Some(5);
        let a2 = graph.insert_transaction(a_seen);
        let b = graph.insert_transaction(Transaction::new().with_hash("b"));
        graph.attach_transaction(acc, a).unwrap();
        graph.attach_transaction(frag, a2).unwrap();
        graph.attach_transaction(frag, b).unwrap();

        assert_eq!(graph.merge_block(acc, frag).unwrap(), acc);

        assert_eq!(graph.block(acc).unwrap().txs, vec![a, b]);
        assert_eq!(graph.transaction(a).unwrap().fee, Some(5));
        assert_eq!(graph.transaction(b).unwrap().block, Some(acc));
        assert_eq!(graph.resolve_block(frag), acc);
    }

    #[test]
    fn test_merge_block_is_idempotent() {
        let mut graph = EntityGraph::new();
        let acc = graph.insert_block(Block::at_height(10));
        let frag = graph.insert_block(Block::at_height(10));
        let t = graph.insert_transaction(Transaction::new().with_hash("t"));
        graph.attach_transaction(frag, t).unwrap();

        graph.merge_block(acc, frag).unwrap();
        let once = graph.block(acc).unwrap().clone();
        graph.merge_block(acc, frag).unwrap();
        assert_eq!(graph.block(acc).unwrap(), &once);
    }

    #[test]
    fn test_hashless_transactions_are_appended() {
        let mut graph = EntityGraph::new();
        let acc = graph.insert_block(Block::at_height(1));
        let frag = graph.insert_block(Block::at_height(1));
        let t1 = graph.insert_transaction(Transaction::new());
        let t2 = graph.insert_transaction(Transaction::new());
        graph.attach_transaction(acc, t1).unwrap();
        graph.attach_transaction(frag, t2).unwrap();

        graph.merge_block(acc, frag).unwrap();
        assert_eq!(graph.block(acc).unwrap().txs, vec![t1, t2]);
    }

    #[test]
    fn test_header_conflict() {
        let mut graph = EntityGraph::new();
        let mut h1 = Block::at_height(1);
        h1.hash = Some("x".into());
        let mut h2 = Block::at_height(1);
        h2.hash = Some("y".into());
        let acc = graph.insert_block(h1);
        let frag = graph.insert_block(h2);
        let err = graph.merge_block(acc, frag).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::ReconciliationConflict { field: "block.hash", .. }
        ));
    }

    #[test]
    fn test_merge_block_with_itself() {
        let mut graph = EntityGraph::new();
        let b = graph.insert_block(Block::at_height(1));
        assert_eq!(graph.merge_block(b, b).unwrap(), b);
    }
}
