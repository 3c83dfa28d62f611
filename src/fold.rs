//! Folding whole fragment documents into one accumulated view.
//!
//! The [`Reconciler`] plays the caller's part of the merge protocol: it
//! decides which accumulator a freshly imported entity belongs to (blocks by
//! height, transactions by hash) and asks the graph to merge them.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::Result;
use crate::graph::EntityGraph;
use crate::identity::same_block;
use crate::model::{BlockId, TxId};
use crate::snapshot::{BlockSnapshot, Fragment, TxSnapshot};

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    graph: EntityGraph,
    txs_by_hash: HashMap<String, TxId>,
    blocks_by_height: BTreeMap<u64, BlockId>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    /// Canonical transaction with the given hash, if one has been seen
    pub fn transaction_by_hash(&self, hash: &str) -> Option<TxId> {
        self.txs_by_hash
            .get(hash)
            .map(|id| self.graph.resolve_transaction(*id))
    }

    /// Canonical block at the given height, if one has been seen
    pub fn block_at_height(&self, height: u64) -> Option<BlockId> {
        self.blocks_by_height
            .get(&height)
            .map(|id| self.graph.resolve_block(*id))
    }

    /// Fold every block and transaction of `fragment` into the accumulated view.
    ///
    /// On error the accumulated view is left partially merged.
    pub fn absorb(&mut self, fragment: Fragment) -> Result<()> {
        debug!(
            blocks = fragment.blocks.len(),
            txs = fragment.txs.len(),
            "absorbing fragment"
        );
        for block in fragment.blocks {
            self.absorb_block(block)?;
        }
        for tx in fragment.txs {
            self.absorb_transaction(tx)?;
        }
        Ok(())
    }

    pub fn absorb_block(&mut self, snapshot: BlockSnapshot) -> Result<BlockId> {
        let id = self.graph.import_block(snapshot)?;
        let height = self.graph.block(id)?.height;
        let block = match height.and_then(|height| self.block_at_height(height)) {
            Some(existing) if self.is_same_block(existing, id)? => {
                debug!(?height, "folding block fragment");
                self.graph.merge_block(existing, id)?
            }
            _ => {
                if let Some(height) = height {
                    self.blocks_by_height.entry(height).or_insert(id);
                }
                id
            }
        };

        let txs = self.graph.block(block)?.txs.clone();
        for tx in txs {
            self.index_transaction(tx)?;
        }
        Ok(block)
    }

    pub fn absorb_transaction(&mut self, snapshot: TxSnapshot) -> Result<TxId> {
        let id = self.graph.import_transaction(snapshot)?;
        self.index_transaction(id)
    }

    /// The height index only narrows candidates; block identity decides.
    fn is_same_block(&self, a: BlockId, b: BlockId) -> Result<bool> {
        Ok(same_block(a, self.graph.block(a)?, b, self.graph.block(b)?))
    }

    fn index_transaction(&mut self, id: TxId) -> Result<TxId> {
        let id = self.graph.resolve_transaction(id);
        let Some(hash) = self.graph.transaction(id)?.hash.clone() else {
            return Ok(id);
        };
        match self.transaction_by_hash(&hash) {
            Some(existing) if existing != id => {
                debug!(%hash, "folding transaction fragment");
                self.graph.merge_transaction(existing, id)
            }
            Some(existing) => Ok(existing),
            None => {
                self.txs_by_hash.insert(hash, id);
                Ok(id)
            }
        }
    }

    /// The accumulated view: blocks by ascending height (blocks without a
    /// height last), then transactions not contained in any block.
    pub fn snapshot(&self) -> Result<Fragment> {
        let mut blocks: Vec<BlockId> = self.graph.canonical_blocks().collect();
        blocks.sort_by_key(|id| {
            let height = self.graph.block(*id).ok().and_then(|b| b.height);
            (height.is_none(), height, *id)
        });

        let mut fragment = Fragment::default();
        for block in blocks {
            fragment.blocks.push(self.graph.export_block(block)?);
        }
        for tx in self.graph.canonical_transactions() {
            if self.graph.transaction(tx)?.block.is_none() {
                fragment.txs.push(self.graph.export_transaction(tx)?);
            }
        }
        Ok(fragment)
    }
}
