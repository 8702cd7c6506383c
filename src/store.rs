//! Storage for the artifacts returned by mapped functions.

use crate::data::Dimension;
use crate::error::{FacetError, Result};
use crate::labeled::LabeledArray;
use crate::selection::Selection;

/// Artifact arrays keyed by function label.
///
/// Each array is allocated empty when a `map` call starts and filled as the
/// selection iterator is driven. Entries never visited stay `None`.
#[derive(Debug, Clone)]
pub struct ArtifactStore<A> {
    arrays: Vec<(String, LabeledArray<Option<A>>)>,
}

impl<A> Default for ArtifactStore<A> {
    fn default() -> Self {
        Self { arrays: Vec::new() }
    }
}

impl<A> ArtifactStore<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an empty array for `label`, replacing any previous one.
    pub fn allocate(&mut self, label: &str, dims: Vec<Dimension>) {
        let array = LabeledArray::from_fn(dims, || None);
        match self.arrays.iter_mut().find(|(l, _)| l == label) {
            Some(entry) => entry.1 = array,
            None => self.arrays.push((label.to_string(), array)),
        }
    }

    fn array_mut(&mut self, label: &str) -> Result<&mut LabeledArray<Option<A>>> {
        self.arrays
            .iter_mut()
            .find(|(l, _)| l == label)
            .map(|(_, a)| a)
            .ok_or_else(|| {
                FacetError::Precondition(format!("no artifact array allocated for '{}'", label))
            })
    }

    /// Store `handle` at the position `selection` addresses in the `label` array.
    pub fn record(&mut self, label: &str, selection: &Selection, handle: A) -> Result<()> {
        if self.array_mut(label)?.set(selection, Some(handle)) {
            Ok(())
        } else {
            Err(FacetError::Validation(format!(
                "selection '{}' does not address an element of '{}'",
                selection, label
            )))
        }
    }

    pub fn get(&self, label: &str) -> Option<&LabeledArray<Option<A>>> {
        self.arrays.iter().find(|(l, _)| l == label).map(|(_, a)| a)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.arrays.iter().map(|(l, _)| l.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

impl<A: Clone> ArtifactStore<A> {
    /// Like [`record`](Self::record); dims the selection does not cover
    /// (caller-declared artist dims) receive a copy of `handle` at every index.
    pub fn record_partial(&mut self, label: &str, selection: &Selection, handle: A) -> Result<()> {
        if self.array_mut(label)?.set_partial(selection, Some(handle)) {
            Ok(())
        } else {
            Err(FacetError::Validation(format!(
                "selection '{}' does not address an element of '{}'",
                selection, label
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Label;
    use crate::selection::SelectionEntry;

    fn chain(i: usize) -> Selection {
        let mut sel = Selection::default();
        sel.push(SelectionEntry::new("chain", Label::from(i), i));
        sel
    }

    #[test]
    fn test_allocate_and_record() {
        let mut store = ArtifactStore::new();
        store.allocate("kde", vec![Dimension::range("chain", 3)]);
        store.record("kde", &chain(1), 42).unwrap();
        let arr = store.get("kde").unwrap();
        assert_eq!(arr.data(), &[None, Some(42), None]);
    }

    #[test]
    fn test_record_unallocated() {
        let mut store: ArtifactStore<u32> = ArtifactStore::new();
        let res = store.record("kde", &chain(0), 1);
        assert!(matches!(res, Err(FacetError::Precondition(_))));
    }

    #[test]
    fn test_reallocate_clears() {
        let mut store = ArtifactStore::new();
        store.allocate("kde", vec![Dimension::range("chain", 2)]);
        store.record("kde", &chain(0), 'a').unwrap();
        store.allocate("kde", vec![Dimension::range("chain", 2)]);
        assert!(store.get("kde").unwrap().iter().all(Option::is_none));
        assert_eq!(store.labels().count(), 1);
    }

    #[test]
    fn test_record_partial_extra_dims() {
        let mut store = ArtifactStore::new();
        store.allocate(
            "kde",
            vec![Dimension::range("chain", 2), Dimension::range("line", 2)],
        );
        assert!(store.record("kde", &chain(1), 7).is_err());
        store.record_partial("kde", &chain(1), 7).unwrap();
        assert_eq!(store.get("kde").unwrap().data(), &[None, None, Some(7), Some(7)]);
    }

    #[test]
    fn test_scalar_store() {
        let mut store = ArtifactStore::new();
        store.allocate("point", Vec::new());
        store.record("point", &chain(0), 1).unwrap();
        assert_eq!(store.get("point").unwrap().data(), &[Some(1)]);
    }
}
