use tracing::trace;

use super::MergeGuard;
use crate::collection::{merge_list, ListMerge};
use crate::error::{EntityKind, ReconcileError, Result};
use crate::graph::EntityGraph;
use crate::identity::{same_input, same_output};
use crate::model::{Output, OutputId, Transaction, TxId};
use crate::reconcile::{fold_field, Policy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Input,
    Output,
}

/// Inputs or outputs of one transaction, merged by identity and adopted by `owner`
struct OwnedOutputs<'a> {
    outputs: &'a mut Vec<Output>,
    owner: TxId,
    role: Role,
}

impl OwnedOutputs<'_> {
    fn get(&self, id: OutputId) -> Result<&Output> {
        self.outputs
            .get(id.0)
            .ok_or_else(|| ReconcileError::null_merge(EntityKind::Output, id))
    }

    fn get_mut(&mut self, id: OutputId) -> Result<&mut Output> {
        self.outputs
            .get_mut(id.0)
            .ok_or_else(|| ReconcileError::null_merge(EntityKind::Output, id))
    }
}

impl ListMerge<OutputId> for OwnedOutputs<'_> {
    fn same(&self, existing: &OutputId, incoming: &OutputId) -> Result<bool> {
        if existing == incoming {
            return Ok(true);
        }
        let (a, b) = (self.get(*existing)?, self.get(*incoming)?);
        match self.role {
            Role::Input => same_input(a, b),
            Role::Output => Ok(same_output(a, b)),
        }
    }

    fn merge_into(&mut self, existing: &OutputId, incoming: &OutputId) -> Result<()> {
        if existing == incoming {
            return Ok(());
        }
        let owner = self.owner;
        let fragment = self.get(*incoming)?.clone();
        self.get_mut(*existing)?.merge_fields(&fragment)?;
        // The merged-away view follows its accumulator to the new owner.
        self.get_mut(*incoming)?.tx = Some(owner);
        Ok(())
    }

    fn adopt(&mut self, incoming: &OutputId) -> Result<()> {
        let owner = self.owner;
        let role = self.role;
        let output = self.get_mut(*incoming)?;
        if role == Role::Input && output.key_image_hex().is_none() {
            return Err(ReconcileError::MissingIdentity {
                kind: EntityKind::Output,
                detail: format!("input {} of {} has no key image", incoming, owner),
            });
        }
        output.tx = Some(owner);
        Ok(())
    }
}

impl EntityGraph {
    /// Merge transaction `frag` into transaction `acc`.
    ///
    /// Blocks are unified first, then scalars, inputs and outputs, whole
    /// sequences and finally the lifecycle fields. `frag` is left in the arena
    /// but forwarded to `acc` and no longer listed by any block.
    pub fn merge_transaction(&mut self, acc: TxId, frag: TxId) -> Result<TxId> {
        let mut guard = MergeGuard::default();
        self.merge_transaction_guarded(acc, frag, &mut guard)
    }

    pub(crate) fn merge_transaction_guarded(
        &mut self,
        acc: TxId,
        frag: TxId,
        guard: &mut MergeGuard,
    ) -> Result<TxId> {
        let acc = self.resolve_transaction(acc);
        let frag = self.resolve_transaction(frag);
        self.transaction(acc)?;
        if acc == frag {
            return Ok(acc);
        }
        let fragment = self.transaction(frag)?.clone();
        // Check identity before touching anything else.
        fold_field(
            "hash",
            &mut self.transaction_mut(acc)?.hash,
            &fragment.hash,
            Policy::Strict,
        )?;

        self.unify_blocks(acc, frag, &fragment, guard)?;
        if self.resolve_transaction(frag) == acc {
            // Block unification already folded `frag` into `acc`.
            return Ok(acc);
        }

        self.transaction_mut(acc)?.merge_scalars(&fragment)?;
        self.merge_owned_outputs(acc, &fragment.inputs, Role::Input)?;
        self.merge_owned_outputs(acc, &fragment.outputs, Role::Output)?;

        let tx = self.transaction_mut(acc)?;
        tx.merge_sequences(&fragment)?;
        tx.settle_lifecycle(&fragment)?;
        tx.variant.merge(&fragment.variant)?;

        self.redirect_transaction(frag, acc)?;
        trace!(%acc, %frag, hash = ?fragment.hash, "merged transaction");
        Ok(acc)
    }

    fn unify_blocks(
        &mut self,
        acc: TxId,
        frag: TxId,
        fragment: &Transaction,
        guard: &mut MergeGuard,
    ) -> Result<()> {
        let acc_block = self.transaction(acc)?.block.map(|b| self.resolve_block(b));
        let frag_block = fragment.block.map(|b| self.resolve_block(b));

        match (acc_block, frag_block) {
            (None, Some(block)) => {
                self.transaction_mut(acc)?.block = Some(block);
                self.canonicalize_block_list(block, frag, acc)?;
            }
            (Some(a), Some(b)) if a != b => {
                if guard.is_unifying(a, b) {
                    return Ok(());
                }
                trace!(%acc, %frag, "transaction merge unifies {} and {}", a, b);
                self.merge_block_guarded(a, b, guard)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn merge_owned_outputs(&mut self, acc: TxId, incoming: &[OutputId], role: Role) -> Result<()> {
        let tx = self.transaction(acc)?;
        let mut list = match role {
            Role::Input => tx.inputs.clone(),
            Role::Output => tx.outputs.clone(),
        };
        let mut strategy = OwnedOutputs {
            outputs: &mut self.outputs,
            owner: acc,
            role,
        };
        merge_list(&mut list, incoming, &mut strategy)?;

        let tx = self.transaction_mut(acc)?;
        match role {
            Role::Input => tx.inputs = list,
            Role::Output => tx.outputs = list,
        }
        Ok(())
    }
}
