//! Merging ordered collections by identity.

use crate::error::Result;

/// How elements of a collection are matched, merged and adopted.
pub trait ListMerge<T> {
    /// Whether `existing` and `incoming` denote the same entity
    fn same(&self, existing: &T, incoming: &T) -> Result<bool>;

    /// Fold `incoming` into the matched `existing` element
    fn merge_into(&mut self, existing: &T, incoming: &T) -> Result<()>;

    /// Called before an unmatched element is appended
    fn adopt(&mut self, _incoming: &T) -> Result<()> {
        Ok(())
    }
}

/// Fold `incoming` into `target`.
///
/// Each incoming element merges into the first identity-equal element of
/// `target`, or is adopted and appended. Matched elements keep their position;
/// appended ones keep their incoming order. O(n·m) with no index.
pub fn merge_list<T, S>(target: &mut Vec<T>, incoming: &[T], strategy: &mut S) -> Result<()>
where
    T: Clone,
    S: ListMerge<T>,
{
    for element in incoming {
        let mut found = None;
        for existing in target.iter() {
            if strategy.same(existing, element)? {
                found = Some(existing.clone());
                break;
            }
        }
        match found {
            Some(existing) => strategy.merge_into(&existing, element)?,
            None => {
                strategy.adopt(element)?;
                target.push(element.clone());
            }
        }
    }
    Ok(())
}
