//! Arena holding every entity of one reconciliation session.
//!
//! Entities point at each other through typed handles instead of references,
//! so redirecting a block's transaction list to a surviving instance is an
//! index rewrite. Merged-away transactions and blocks stay allocated and are
//! recorded in a forwarding table that [`EntityGraph::resolve_transaction`]
//! and [`EntityGraph::resolve_block`] follow.

use std::collections::HashMap;

use tracing::trace;

use crate::error::{EntityKind, ReconcileError, Result};
use crate::model::{Block, BlockId, Output, OutputId, Transaction, TxId};

#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    pub(crate) txs: Vec<Transaction>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) outputs: Vec<Output>,
    tx_forward: HashMap<TxId, TxId>,
    block_forward: HashMap<BlockId, BlockId>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transaction. Its links are kept as given; use the `attach_*`
    /// helpers to wire fresh entities together.
    pub fn insert_transaction(&mut self, tx: Transaction) -> TxId {
        self.txs.push(tx);
        TxId(self.txs.len() - 1)
    }

    pub fn insert_block(&mut self, block: Block) -> BlockId {
        self.blocks.push(block);
        BlockId(self.blocks.len() - 1)
    }

    pub fn insert_output(&mut self, output: Output) -> OutputId {
        self.outputs.push(output);
        OutputId(self.outputs.len() - 1)
    }

    /// Append `input` to the transaction's inputs and point it back at `tx`
    pub fn attach_input(&mut self, tx: TxId, input: OutputId) -> Result<()> {
        self.output_mut(input)?.tx = Some(tx);
        self.transaction_mut(tx)?.inputs.push(input);
        Ok(())
    }

    /// Append `output` to the transaction's outputs and point it back at `tx`
    pub fn attach_output(&mut self, tx: TxId, output: OutputId) -> Result<()> {
        self.output_mut(output)?.tx = Some(tx);
        self.transaction_mut(tx)?.outputs.push(output);
        Ok(())
    }

    /// Put `tx` in the block's transaction list and point it back at `block`
    pub fn attach_transaction(&mut self, block: BlockId, tx: TxId) -> Result<()> {
        self.transaction_mut(tx)?.block = Some(block);
        let txs = &mut self.block_mut(block)?.txs;
        if !txs.contains(&tx) {
            txs.push(tx);
        }
        Ok(())
    }

    pub fn transaction(&self, id: TxId) -> Result<&Transaction> {
        self.txs
            .get(id.0)
            .ok_or_else(|| ReconcileError::null_merge(EntityKind::Transaction, id))
    }

    pub fn transaction_mut(&mut self, id: TxId) -> Result<&mut Transaction> {
        self.txs
            .get_mut(id.0)
            .ok_or_else(|| ReconcileError::null_merge(EntityKind::Transaction, id))
    }

    pub fn block(&self, id: BlockId) -> Result<&Block> {
        self.blocks
            .get(id.0)
            .ok_or_else(|| ReconcileError::null_merge(EntityKind::Block, id))
    }

    pub fn block_mut(&mut self, id: BlockId) -> Result<&mut Block> {
        self.blocks
            .get_mut(id.0)
            .ok_or_else(|| ReconcileError::null_merge(EntityKind::Block, id))
    }

    pub fn output(&self, id: OutputId) -> Result<&Output> {
        self.outputs
            .get(id.0)
            .ok_or_else(|| ReconcileError::null_merge(EntityKind::Output, id))
    }

    pub fn output_mut(&mut self, id: OutputId) -> Result<&mut Output> {
        self.outputs
            .get_mut(id.0)
            .ok_or_else(|| ReconcileError::null_merge(EntityKind::Output, id))
    }

    /// Inputs of a transaction, in order
    pub fn tx_inputs(&self, id: TxId) -> Result<Vec<&Output>> {
        self.transaction(id)?.inputs.iter().map(|o| self.output(*o)).collect()
    }

    /// Outputs of a transaction, in order
    pub fn tx_outputs(&self, id: TxId) -> Result<Vec<&Output>> {
        self.transaction(id)?.outputs.iter().map(|o| self.output(*o)).collect()
    }

    /// Follow the forwarding table to the surviving transaction
    pub fn resolve_transaction(&self, mut id: TxId) -> TxId {
        while let Some(next) = self.tx_forward.get(&id) {
            id = *next;
        }
        id
    }

    /// Follow the forwarding table to the surviving block
    pub fn resolve_block(&self, mut id: BlockId) -> BlockId {
        while let Some(next) = self.block_forward.get(&id) {
            id = *next;
        }
        id
    }

    /// Transactions that have not been merged into another one
    pub fn canonical_transactions(&self) -> impl Iterator<Item = TxId> + '_ {
        (0..self.txs.len())
            .map(TxId)
            .filter(move |id| !self.tx_forward.contains_key(id))
    }

    /// Blocks that have not been merged into another one
    pub fn canonical_blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        (0..self.blocks.len())
            .map(BlockId)
            .filter(move |id| !self.block_forward.contains_key(id))
    }

    /// Replace `from` with `to` in the block's transaction list, dropping
    /// `from` instead when `to` is already listed.
    pub(crate) fn canonicalize_block_list(
        &mut self,
        block: BlockId,
        from: TxId,
        to: TxId,
    ) -> Result<()> {
        let txs = &mut self.block_mut(block)?.txs;
        if !txs.contains(&from) {
            return Ok(());
        }
        if txs.contains(&to) {
            txs.retain(|id| *id != from);
        } else {
            for id in txs.iter_mut().filter(|id| **id == from) {
                *id = to;
            }
        }
        trace!(%block, %from, %to, "canonicalized block transaction list");
        Ok(())
    }

    /// Record that `from` was merged into `to` and rewrite the block lists
    /// that could still name `from`.
    pub(crate) fn redirect_transaction(&mut self, from: TxId, to: TxId) -> Result<()> {
        if from == to {
            return Ok(());
        }
        let blocks = [self.transaction(from)?.block, self.transaction(to)?.block];
        for block in blocks.into_iter().flatten() {
            let block = self.resolve_block(block);
            self.canonicalize_block_list(block, from, to)?;
        }
        self.tx_forward.insert(from, to);
        Ok(())
    }

    /// Record that block `from` was merged into `to` and repoint its transactions
    pub(crate) fn forward_block(&mut self, from: BlockId, to: BlockId) {
        if from == to {
            return;
        }
        for tx in self.txs.iter_mut().filter(|tx| tx.block == Some(from)) {
            tx.block = Some(to);
        }
        self.block_forward.insert(from, to);
        trace!(%from, %to, "forwarded merged block");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_sets_back_references() {
        let mut graph = EntityGraph::new();
        let block = graph.insert_block(Block::at_height(1));
        let tx = graph.insert_transaction(Transaction::new().with_hash("aa"));
        let out = graph.insert_output(Output::new().with_key_image("ki"));
        graph.attach_output(tx, out).unwrap();
        graph.attach_transaction(block, tx).unwrap();
        graph.attach_transaction(block, tx).unwrap();

        assert_eq!(graph.output(out).unwrap().tx, Some(tx));
        assert_eq!(graph.transaction(tx).unwrap().block, Some(block));
        assert_eq!(graph.block(block).unwrap().txs, vec![tx]);
        assert_eq!(graph.tx_outputs(tx).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_handle_is_null_merge() {
        let graph = EntityGraph::new();
        let err = graph.transaction(TxId(4)).unwrap_err();
        assert!(matches!(err, ReconcileError::NullMerge { kind: EntityKind::Transaction, .. }));
    }

    #[test]
    fn test_redirect_rewrites_and_forwards() {
        let mut graph = EntityGraph::new();
        let block = graph.insert_block(Block::at_height(1));
        let t1 = graph.insert_transaction(Transaction::new());
        let t2 = graph.insert_transaction(Transaction::new());
        graph.attach_transaction(block, t2).unwrap();

        graph.redirect_transaction(t2, t1).unwrap();
        assert_eq!(graph.block(block).unwrap().txs, vec![t1]);
        assert_eq!(graph.resolve_transaction(t2), t1);
        assert_eq!(graph.canonical_transactions().collect::<Vec<_>>(), vec![t1]);
    }

    #[test]
    fn test_redirect_drops_duplicate_alias() {
        let mut graph = EntityGraph::new();
        let block = graph.insert_block(Block::at_height(1));
        let t1 = graph.insert_transaction(Transaction::new());
        let t2 = graph.insert_transaction(Transaction::new());
        graph.attach_transaction(block, t1).unwrap();
        graph.attach_transaction(block, t2).unwrap();

        graph.redirect_transaction(t2, t1).unwrap();
        assert_eq!(graph.block(block).unwrap().txs, vec![t1]);
    }

    #[test]
    fn test_forward_block_repoints_transactions() {
        let mut graph = EntityGraph::new();
        let a = graph.insert_block(Block::at_height(1));
        let b = graph.insert_block(Block::at_height(1));
        let tx = graph.insert_transaction(Transaction::new());
        graph.attach_transaction(b, tx).unwrap();

        graph.forward_block(b, a);
        assert_eq!(graph.transaction(tx).unwrap().block, Some(a));
        assert_eq!(graph.resolve_block(b), a);
        assert_eq!(graph.canonical_blocks().collect::<Vec<_>>(), vec![a]);
    }
}
