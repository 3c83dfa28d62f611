//! Scalar reconciliation of two observations of the same logical field.
//!
//! Knowledge only grows: an unknown value always yields to a known one. Two
//! known values must agree unless the field is merged under a monotone
//! [`Policy`], in which case the order decides.

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::error::{ReconcileError, Result};

/// Directional bias applied when both observations are known and differ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Unequal known values are a conflict
    Strict,
    /// Higher-precedence state wins (`true` over `false`)
    PreferTrue,
    /// Later value wins (last-relayed timestamps)
    PreferLatest,
    /// Earlier value wins (received timestamps)
    PreferEarliest,
    /// Larger value wins (confirmation counts, depth)
    PreferHigher,
}

/// Reconcile two optional observations of `field` under `policy`.
pub fn reconcile<T>(
    field: &'static str,
    a: Option<&T>,
    b: Option<&T>,
    policy: Policy,
) -> Result<Option<T>>
where
    T: PartialEq + PartialOrd + Clone + Debug,
{
    let (a, b) = match (a, b) {
        (None, None) => return Ok(None),
        (Some(v), None) | (None, Some(v)) => return Ok(Some(v.clone())),
        (Some(a), Some(b)) => (a, b),
    };
    if a == b {
        return Ok(Some(a.clone()));
    }

    let ordering = a.partial_cmp(b);
    let winner = match (policy, ordering) {
        (Policy::Strict, _) | (_, None) => return Err(conflict(field, a, b)),
        (Policy::PreferEarliest, Some(Ordering::Greater)) => b,
        (Policy::PreferEarliest, Some(_)) => a,
        (_, Some(Ordering::Less)) => b,
        (_, Some(_)) => a,
    };
    Ok(Some(winner.clone()))
}

/// Reconcile `incoming` into the accumulator `slot`.
pub fn fold_field<T>(
    field: &'static str,
    slot: &mut Option<T>,
    incoming: &Option<T>,
    policy: Policy,
) -> Result<()>
where
    T: PartialEq + PartialOrd + Clone + Debug,
{
    *slot = reconcile(field, slot.as_ref(), incoming.as_ref(), policy)?;
    Ok(())
}

/// Copy `incoming` into `slot` only when the slot is still unknown.
pub fn adopt_if_absent<T: Clone>(slot: &mut Option<T>, incoming: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(incoming);
    }
}

fn conflict<T: Debug>(field: &'static str, left: &T, right: &T) -> ReconcileError {
    ReconcileError::ReconciliationConflict {
        field,
        left: format!("{:?}", left),
        right: format!("{:?}", right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_yields_to_known() {
        assert_eq!(reconcile::<u64>("fee", None, None, Policy::Strict).unwrap(), None);
        assert_eq!(reconcile("fee", Some(&7u64), None, Policy::Strict).unwrap(), Some(7));
        assert_eq!(reconcile("fee", None, Some(&7u64), Policy::Strict).unwrap(), Some(7));
        assert_eq!(reconcile("fee", Some(&7u64), Some(&7), Policy::Strict).unwrap(), Some(7));
    }

    #[test]
    fn test_strict_conflict() {
        let err = reconcile("fee", Some(&7u64), Some(&8), Policy::Strict).unwrap_err();
        match err {
            ReconcileError::ReconciliationConflict { field, left, right } => {
                assert_eq!(field, "fee");
                assert_eq!(left, "7");
                assert_eq!(right, "8");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prefer_true() {
        let relayed =
            |a: bool, b: bool| reconcile("is_relayed", Some(&a), Some(&b), Policy::PreferTrue);
        assert_eq!(relayed(false, true).unwrap(), Some(true));
        assert_eq!(relayed(true, false).unwrap(), Some(true));
    }

    #[test]
    fn test_timestamp_laws() {
        assert_eq!(
            reconcile("received_timestamp", Some(&100u64), Some(&50), Policy::PreferEarliest)
                .unwrap(),
            Some(50)
        );
        assert_eq!(
            reconcile("last_relayed_timestamp", Some(&100u64), Some(&150), Policy::PreferLatest)
                .unwrap(),
            Some(150)
        );
    }

    #[test]
    fn test_prefer_higher() {
        let confirmations = |a: u64, b: u64| {
            reconcile("num_confirmations", Some(&a), Some(&b), Policy::PreferHigher)
        };
        assert_eq!(confirmations(3, 1).unwrap(), Some(3));
        assert_eq!(confirmations(1, 3).unwrap(), Some(3));
    }

    #[test]
    fn test_byte_arrays_compare_element_wise() {
        let a = vec![1u8, 2, 3];
        let b = vec![1u8, 2, 3];
        let merged = reconcile("extra", Some(&a), Some(&b), Policy::Strict).unwrap();
        assert_eq!(merged, Some(a.clone()));

        let c = vec![1u8, 2, 4];
        assert!(reconcile("extra", Some(&a), Some(&c), Policy::Strict).is_err());
    }

    #[test]
    fn test_sequences_must_match_whole() {
        let sigs = vec!["a".to_string(), "b".to_string()];
        let shorter = vec!["a".to_string()];
        assert!(reconcile("signatures", Some(&sigs), Some(&shorter), Policy::Strict).is_err());
    }

    #[test]
    fn test_incomparable_values_conflict_under_monotone_policy() {
        assert!(reconcile("ratio", Some(&f64::NAN), Some(&1.0), Policy::PreferHigher).is_err());
    }

    #[test]
    fn test_fold_field_and_adopt() {
        let mut slot = None;
        fold_field("size", &mut slot, &Some(10u64), Policy::Strict).unwrap();
        assert_eq!(slot, Some(10));

        let mut key = Some("aa".to_string());
        adopt_if_absent(&mut key, &Some("bb".to_string()));
        assert_eq!(key.as_deref(), Some("aa"));
    }
}
