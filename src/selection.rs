//! Selections and the iterator that enumerates them over loop dimensions.

use crate::data::{Dataset, Dimension, Label};
use crate::dims::DimSet;
use std::fmt;

/// One coordinate along one dimension: its label and its integer position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub dim: String,
    pub label: Label,
    pub index: usize,
}

impl SelectionEntry {
    pub fn new(dim: &str, label: Label, index: usize) -> Self {
        Self {
            dim: dim.to_string(),
            label,
            index,
        }
    }
}

/// A point along a set of dimensions.
///
/// Carries both the label-selection and the index-selection views.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    entries: Vec<SelectionEntry>,
}

impl Selection {
    pub fn push(&mut self, entry: SelectionEntry) {
        match self.entries.iter_mut().find(|e| e.dim == entry.dim) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn get(&self, dim: &str) -> Option<&SelectionEntry> {
        self.entries.iter().find(|e| e.dim == dim)
    }

    pub fn label(&self, dim: &str) -> Option<&Label> {
        self.get(dim).map(|e| &e.label)
    }

    pub fn index(&self, dim: &str) -> Option<usize> {
        self.get(dim).map(|e| e.index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dims(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.dim.as_str())
    }

    /// Label-selection view: `dim -> label`.
    pub fn labels(&self) -> Vec<(&str, &Label)> {
        self.entries.iter().map(|e| (e.dim.as_str(), &e.label)).collect()
    }

    /// Index-selection view: `dim -> position`.
    pub fn indices(&self) -> Vec<(&str, usize)> {
        self.entries.iter().map(|e| (e.dim.as_str(), e.index)).collect()
    }

    /// Keep only the entries whose dimension is in `dims`.
    pub fn subset<S: AsRef<str>>(&self, dims: &[S]) -> Selection {
        Selection {
            entries: self
                .entries
                .iter()
                .filter(|e| dims.iter().any(|d| d.as_ref() == e.dim))
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", entry.dim, entry.label)?;
        }
        Ok(())
    }
}

/// Enumerates `(variable name, selection)` over the loop dimensions of a dataset.
///
/// Variables are visited in dataset order. Within a variable, its own loop
/// dimensions are walked in declaration order with the last one fastest; loop
/// dimensions the variable lacks are simply left out of its selections, and
/// dimensions outside the loop set are never fixed. A variable with none of
/// the loop dimensions yields one empty selection.
///
/// The iterator borrows its inputs and holds no other state, so building a
/// new one from the same dataset and dims replays the same sequence.
pub struct SelectionIter<'d> {
    dataset: &'d Dataset,
    loop_dims: DimSet,
    var_idx: usize,
    axes: Vec<&'d Dimension>,
    cursor: Option<Vec<usize>>,
    entered: bool,
}

impl<'d> SelectionIter<'d> {
    pub fn new(dataset: &'d Dataset, loop_dims: &DimSet) -> Self {
        Self {
            dataset,
            loop_dims: loop_dims.clone(),
            var_idx: 0,
            axes: Vec::new(),
            cursor: None,
            entered: false,
        }
    }

    fn enter_variable(&mut self, dims: &'d [Dimension]) {
        self.axes = dims
            .iter()
            .filter(|d| self.loop_dims.contains(&d.name))
            .collect();
        self.cursor = if self.axes.iter().any(|d| d.size() == 0) {
            None
        } else {
            Some(vec![0; self.axes.len()])
        };
        self.entered = true;
    }
}

impl<'d> Iterator for SelectionIter<'d> {
    type Item = (&'d str, Selection);

    fn next(&mut self) -> Option<Self::Item> {
        let dataset = self.dataset;
        loop {
            let variable = dataset.variables().get(self.var_idx)?;
            if !self.entered {
                self.enter_variable(variable.dims());
            }

            match self.cursor.take() {
                Some(mut counter) => {
                    let mut selection = Selection::default();
                    for (dim, &idx) in self.axes.iter().zip(&counter) {
                        selection.push(SelectionEntry::new(&dim.name, dim.labels[idx].clone(), idx));
                    }
                    let shape: Vec<usize> = self.axes.iter().map(|d| d.size()).collect();
                    if crate::labeled::advance(&mut counter, &shape) {
                        self.cursor = Some(counter);
                    }
                    return Some((variable.name(), selection));
                }
                None => {
                    self.var_idx += 1;
                    self.entered = false;
                }
            }
        }
    }
}
