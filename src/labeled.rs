//! Named-dimension arrays used for facet cells, aesthetic values and artifacts.

use crate::data::{Dimension, Label};
use crate::error::{FacetError, Result};
use crate::selection::Selection;

/// Step a row-major counter forward; returns false once it wraps back to zero.
pub(crate) fn advance(counter: &mut [usize], shape: &[usize]) -> bool {
    for axis in (0..counter.len()).rev() {
        counter[axis] += 1;
        if counter[axis] < shape[axis] {
            return true;
        }
        counter[axis] = 0;
    }
    false
}

/// A dense array whose axes are named [`Dimension`]s.
///
/// A zero-dimensional array holds exactly one element.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray<T> {
    dims: Vec<Dimension>,
    data: Vec<T>,
}

impl<T> LabeledArray<T> {
    pub fn from_vec(dims: Vec<Dimension>, data: Vec<T>) -> Result<Self> {
        let expected: usize = dims.iter().map(Dimension::size).product();
        if data.len() != expected {
            return Err(FacetError::ShapeMismatch(format!(
                "{} elements cannot fill dimensions {:?}",
                data.len(),
                dims.iter().map(|d| d.name.as_str()).collect::<Vec<_>>()
            )));
        }
        Ok(Self { dims, data })
    }

    /// Array over `dims` with every element produced by `f`.
    pub fn from_fn(dims: Vec<Dimension>, f: impl FnMut() -> T) -> Self {
        let len = dims.iter().map(Dimension::size).product();
        Self {
            dims,
            data: std::iter::repeat_with(f).take(len).collect(),
        }
    }

    pub fn scalar(value: T) -> Self {
        Self {
            dims: Vec::new(),
            data: vec![value],
        }
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn dim_names(&self) -> Vec<&str> {
        self.dims.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dims.iter().map(Dimension::size).collect()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Elements in row-major order.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    fn offset_of(&self, dim: &Dimension, label: &Label, index: usize) -> Option<usize> {
        if dim.labels.get(index) == Some(label) {
            Some(index)
        } else {
            dim.position(label)
        }
    }

    /// Flat offset addressed by the selection entries for this array's dims.
    fn offset(&self, selection: &Selection) -> Option<usize> {
        let mut offset = 0;
        for dim in &self.dims {
            let entry = selection.get(&dim.name)?;
            let idx = self.offset_of(dim, &entry.label, entry.index)?;
            offset = offset * dim.size() + idx;
        }
        Some(offset)
    }

    pub fn get(&self, selection: &Selection) -> Option<&T> {
        self.offset(selection).and_then(|o| self.data.get(o))
    }

    pub fn get_mut(&mut self, selection: &Selection) -> Option<&mut T> {
        let offset = self.offset(selection)?;
        self.data.get_mut(offset)
    }

    /// Store `value` at `selection`; returns false when the selection does not address an element.
    pub fn set(&mut self, selection: &Selection, value: T) -> bool {
        match self.get_mut(selection) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl<T: Clone> LabeledArray<T> {
    pub fn filled(dims: Vec<Dimension>, value: T) -> Self {
        let len = dims.iter().map(Dimension::size).product();
        Self {
            dims,
            data: vec![value; len],
        }
    }

    /// Like [`set`](Self::set), but `value` is broadcast over every index of
    /// the dims the selection lacks.
    pub fn set_partial(&mut self, selection: &Selection, value: T) -> bool {
        let mut fixed = Vec::with_capacity(self.dims.len());
        for dim in &self.dims {
            match selection.get(&dim.name) {
                Some(entry) => match self.offset_of(dim, &entry.label, entry.index) {
                    Some(idx) => fixed.push(Some(idx)),
                    None => return false,
                },
                None => fixed.push(None),
            }
        }
        let free: Vec<usize> = self
            .dims
            .iter()
            .zip(&fixed)
            .filter(|(_, idx)| idx.is_none())
            .map(|(dim, _)| dim.size())
            .collect();
        if free.contains(&0) {
            return true;
        }

        let mut counter = vec![0; free.len()];
        loop {
            let mut offset = 0;
            let mut next_free = 0;
            for (dim, idx) in self.dims.iter().zip(&fixed) {
                let idx = match idx {
                    Some(i) => *i,
                    None => {
                        next_free += 1;
                        counter[next_free - 1]
                    }
                };
                offset = offset * dim.size() + idx;
            }
            match self.data.get_mut(offset) {
                Some(slot) => *slot = value.clone(),
                None => return false,
            }
            if !advance(&mut counter, &free) {
                return true;
            }
        }
    }
}
