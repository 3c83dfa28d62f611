//! Tree-shaped documents for loading fragments into an [`EntityGraph`] and
//! rendering merged entities back out.
//!
//! A document nests children instead of holding arena handles: a block lists
//! its transactions, a transaction lists its inputs and outputs.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::EntityGraph;
use crate::model::{Block, BlockId, Output, Transaction, TxId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxSnapshot {
    #[serde(flatten)]
    pub tx: Transaction,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Output>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Output>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    #[serde(flatten)]
    pub block: Block,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub txs: Vec<TxSnapshot>,
}

/// Everything decoded from one RPC response (or one file of them)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<BlockSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub txs: Vec<TxSnapshot>,
}

impl Fragment {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

impl From<Transaction> for TxSnapshot {
    fn from(tx: Transaction) -> Self {
        Self {
            tx,
            ..Self::default()
        }
    }
}

impl EntityGraph {
    /// Allocate a transaction and its inputs/outputs with back-references wired
    pub fn import_transaction(&mut self, snapshot: TxSnapshot) -> Result<TxId> {
        let TxSnapshot { mut tx, inputs, outputs } = snapshot;
        tx.inputs.clear();
        tx.outputs.clear();
        tx.block = None;
        let id = self.insert_transaction(tx);
        for input in inputs {
            let input = self.insert_output(input);
            self.attach_input(id, input)?;
        }
        for output in outputs {
            let output = self.insert_output(output);
            self.attach_output(id, output)?;
        }
        Ok(id)
    }

    /// Allocate a block and every transaction it lists
    pub fn import_block(&mut self, snapshot: BlockSnapshot) -> Result<BlockId> {
        let BlockSnapshot { mut block, txs } = snapshot;
        block.txs.clear();
        let id = self.insert_block(block);
        for tx in txs {
            let tx = self.import_transaction(tx)?;
            self.attach_transaction(id, tx)?;
        }
        Ok(id)
    }

    /// Render the canonical instance behind `id` without arena links
    pub fn export_transaction(&self, id: TxId) -> Result<TxSnapshot> {
        let id = self.resolve_transaction(id);
        let mut tx = self.transaction(id)?.clone();
        tx.inputs.clear();
        tx.outputs.clear();
        tx.block = None;
        Ok(TxSnapshot {
            tx,
            inputs: self.tx_inputs(id)?.into_iter().map(unlinked).collect(),
            outputs: self.tx_outputs(id)?.into_iter().map(unlinked).collect(),
        })
    }

    pub fn export_block(&self, id: BlockId) -> Result<BlockSnapshot> {
        let id = self.resolve_block(id);
        let mut block = self.block(id)?.clone();
        let txs = std::mem::take(&mut block.txs)
            .into_iter()
            .map(|tx| self.export_transaction(tx))
            .collect::<Result<Vec<_>>>()?;
        Ok(BlockSnapshot { block, txs })
    }
}

fn unlinked(output: &Output) -> Output {
    Output {
        tx: None,
        ..output.clone()
    }
}
