//! Dimension-name bookkeeping: ordered name sets and dataset-level queries.

use crate::data::{Dataset, Dimension};
use crate::error::{FacetError, Result};

/// An insertion-ordered set of dimension names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimSet {
    names: Vec<String>,
}

impl DimSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name; returns false if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            false
        } else {
            self.names.push(name.to_string());
            true
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    /// Names of `self` followed by the names of `other` not already present.
    pub fn union(&self, other: &DimSet) -> DimSet {
        let mut out = self.clone();
        for name in other.iter() {
            out.insert(name);
        }
        out
    }

    /// Names of `self` that are also in `other`, in `self`'s order.
    pub fn intersection(&self, other: &DimSet) -> DimSet {
        self.iter().filter(|n| other.contains(n)).collect()
    }

    /// Names of `self` that are not in `other`.
    pub fn difference(&self, other: &DimSet) -> DimSet {
        self.iter().filter(|n| !other.contains(n)).collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for DimSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = DimSet::new();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

impl Dataset {
    /// Every dimension name in the dataset, in order of first declaration.
    pub fn dims(&self) -> DimSet {
        self.variables()
            .iter()
            .flat_map(|v| v.dims().iter().map(|d| d.name.as_str()))
            .collect()
    }

    /// First declaration of a dimension.
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.variables().iter().find_map(|v| v.dim(name))
    }

    pub fn size_of(&self, name: &str) -> Option<usize> {
        self.dimension(name).map(Dimension::size)
    }

    /// Fail with [`FacetError::DimensionNotFound`] for the first name no variable has.
    pub fn require_dims<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        let known = self.dims();
        match names.iter().find(|n| !known.contains(n.as_ref())) {
            Some(missing) => Err(FacetError::DimensionNotFound {
                dim: missing.as_ref().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Dataset dimensions that are not iterated over when looping on `loop_dims`.
    pub fn skip_dims(&self, loop_dims: &DimSet) -> DimSet {
        self.dims().difference(loop_dims)
    }

    /// Resolve names to their first declared [`Dimension`].
    pub fn resolve_dims<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Dimension>> {
        names
            .iter()
            .map(|n| {
                self.dimension(n.as_ref())
                    .cloned()
                    .ok_or_else(|| FacetError::DimensionNotFound {
                        dim: n.as_ref().to_string(),
                    })
            })
            .collect()
    }
}
