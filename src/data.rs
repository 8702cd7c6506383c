use crate::error::{FacetError, Result};
use crate::selection::Selection;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Read;

/// A coordinate label along one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Str(String),
}

impl Label {
    /// Parse a raw text cell: integers stay integers, anything else is a string label.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(i) => Label::Int(i),
            Err(_) => Label::Str(raw.to_string()),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(i) => write!(f, "{}", i),
            Label::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Str(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Str(s)
    }
}

impl From<i64> for Label {
    fn from(i: i64) -> Self {
        Label::Int(i)
    }
}

impl From<i32> for Label {
    fn from(i: i32) -> Self {
        Label::Int(i64::from(i))
    }
}

impl From<usize> for Label {
    fn from(i: usize) -> Self {
        Label::Int(i as i64)
    }
}

/// A named dimension with its ordered coordinate labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub labels: Vec<Label>,
}

impl Dimension {
    pub fn new<L: Into<Label>>(name: &str, labels: impl IntoIterator<Item = L>) -> Self {
        Self {
            name: name.to_string(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Dimension labelled `0..size`.
    pub fn range(name: &str, size: usize) -> Self {
        Self::new(name, 0..size)
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn position(&self, label: &Label) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

/// A labeled N-dimensional array of numbers, stored flat in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    dims: Vec<Dimension>,
    values: Vec<f64>,
}

impl Variable {
    pub fn new(name: &str, dims: Vec<Dimension>, values: Vec<f64>) -> Result<Self> {
        for (i, dim) in dims.iter().enumerate() {
            if dims[..i].iter().any(|d| d.name == dim.name) {
                return Err(FacetError::ShapeMismatch(format!(
                    "dimension '{}' repeated in variable '{}'",
                    dim.name, name
                )));
            }
        }
        let expected: usize = dims.iter().map(Dimension::size).product();
        if values.len() != expected {
            return Err(FacetError::ShapeMismatch(format!(
                "variable '{}' has {} values but its dimensions require {}",
                name,
                values.len(),
                expected
            )));
        }
        Ok(Self {
            name: name.to_string(),
            dims,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dims.iter().map(Dimension::size).collect()
    }

    pub fn has_dim(&self, name: &str) -> bool {
        self.dims.iter().any(|d| d.name == name)
    }

    pub fn dim(&self, name: &str) -> Option<&Dimension> {
        self.dims.iter().find(|d| d.name == name)
    }

    fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.dims.len()];
        for axis in (0..self.dims.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * self.dims[axis + 1].size();
        }
        strides
    }

    /// Select by label along every dimension the selection names.
    ///
    /// Dimensions the selection does not mention keep their full extent;
    /// selection entries for dimensions this variable lacks are ignored.
    pub fn sel(&self, selection: &Selection) -> Result<DataSlice> {
        let strides = self.strides();
        let mut base = 0;
        let mut free_axes = Vec::new();
        for (axis, dim) in self.dims.iter().enumerate() {
            match selection.get(&dim.name) {
                Some(entry) => {
                    let idx = dim.position(&entry.label).ok_or_else(|| {
                        FacetError::Validation(format!(
                            "label '{}' not found along dimension '{}' of '{}'",
                            entry.label, dim.name, self.name
                        ))
                    })?;
                    base += idx * strides[axis];
                }
                None => free_axes.push(axis),
            }
        }

        let free_shape: Vec<usize> = free_axes.iter().map(|&a| self.dims[a].size()).collect();
        let total: usize = free_shape.iter().product();
        let mut values = Vec::with_capacity(total);
        let mut counter = vec![0; free_axes.len()];
        for _ in 0..total {
            let offset: usize = base
                + counter
                    .iter()
                    .zip(&free_axes)
                    .map(|(&c, &axis)| c * strides[axis])
                    .sum::<usize>();
            values.push(self.values[offset]);
            crate::labeled::advance(&mut counter, &free_shape);
        }

        Ok(DataSlice {
            dims: free_axes.iter().map(|&a| self.dims[a].clone()).collect(),
            values,
        })
    }
}

/// The part of a variable left after selecting one point along some dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSlice {
    dims: Vec<Dimension>,
    values: Vec<f64>,
}

impl DataSlice {
    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn flat(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn is_scalar(&self) -> bool {
        self.values.len() == 1
    }

    pub fn scalar(&self) -> Option<f64> {
        if self.is_scalar() {
            self.values.first().copied()
        } else {
            None
        }
    }
}

/// Every variable of a dataset sliced at the same selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetSlice {
    entries: Vec<(String, DataSlice)>,
}

impl DatasetSlice {
    pub fn get(&self, name: &str) -> Option<&DataSlice> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Flat values of one variable, failing when the variable is absent.
    pub fn values(&self, name: &str) -> Result<&[f64]> {
        self.get(name).map(DataSlice::flat).ok_or_else(|| {
            FacetError::Validation(format!("preprocessed data has no variable '{}'", name))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

/// An ordered collection of named variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    variables: Vec<Variable>,
    heterogeneous: bool,
}

impl Dataset {
    /// Build a dataset whose shared dimensions carry identical labels in every variable.
    pub fn new(variables: Vec<Variable>) -> Result<Self> {
        check_unique_names(&variables)?;
        for (i, var) in variables.iter().enumerate() {
            for dim in var.dims() {
                let earlier = variables[..i].iter().find_map(|v| v.dim(&dim.name));
                if let Some(first) = earlier {
                    if first.labels != dim.labels {
                        return Err(FacetError::ShapeMismatch(format!(
                            "dimension '{}' of '{}' disagrees with its earlier declaration \
                             ({} labels vs {})",
                            dim.name,
                            var.name(),
                            dim.size(),
                            first.size()
                        )));
                    }
                }
            }
        }
        Ok(Self {
            variables,
            heterogeneous: false,
        })
    }

    /// Build a dataset whose variables declare their dimensions independently.
    pub fn heterogeneous(variables: Vec<Variable>) -> Result<Self> {
        check_unique_names(&variables)?;
        Ok(Self {
            variables,
            heterogeneous: true,
        })
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(Variable::name)
    }

    pub fn is_heterogeneous(&self) -> bool {
        self.heterogeneous
    }

    /// Slice every variable at the dimensions of `selection` it possesses.
    pub fn sel(&self, selection: &Selection) -> Result<DatasetSlice> {
        let entries = self
            .variables
            .iter()
            .map(|v| Ok((v.name().to_string(), v.sel(selection)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(DatasetSlice { entries })
    }

    /// Create a Dataset from JSON of the form
    /// `{"variables": [{"name": .., "dims": [{"name": .., "labels": [..]}], "values": [..]}]}`
    pub fn from_json(value: &serde_json::Value) -> anyhow::Result<Self> {
        let record: DatasetRecord = serde_json::from_value(value.clone())
            .context("Input data must be an object with a 'variables' array")?;

        if record.variables.is_empty() {
            return Err(anyhow!("Input dataset has no variables"));
        }

        let variables = record
            .variables
            .into_iter()
            .map(|v| Variable::new(&v.name, v.dims, v.values))
            .collect::<Result<Vec<_>>>()?;

        let dataset = if record.heterogeneous {
            Dataset::heterogeneous(variables)?
        } else {
            Dataset::new(variables)?
        };
        Ok(dataset)
    }

    /// Create a Dataset from a long-format CSV table.
    ///
    /// `value_col` holds the numbers; an optional `variable` column splits rows
    /// into variables; every other column is a dimension whose labels are taken
    /// in order of first appearance. Missing combinations become NaN.
    pub fn from_csv<R: Read>(reader: R, value_col: &str) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(String::from)
            .collect();

        let value_idx = headers
            .iter()
            .position(|h| h == value_col)
            .ok_or_else(|| anyhow!("Value column '{}' not found", value_col))?;
        let var_idx = headers.iter().position(|h| h == "variable");
        let dim_cols: Vec<usize> = (0..headers.len())
            .filter(|&i| i != value_idx && Some(i) != var_idx)
            .collect();

        let mut labels: Vec<Vec<Label>> = vec![Vec::new(); dim_cols.len()];
        let mut lookup: Vec<HashMap<Label, usize>> = vec![HashMap::new(); dim_cols.len()];
        let mut var_order: Vec<String> = Vec::new();
        let mut rows: Vec<(usize, Vec<usize>, f64)> = Vec::new();
        let mut seen: HashSet<(usize, Vec<usize>)> = HashSet::new();

        for (line, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV row {}", line + 1))?;
            let var_name = match var_idx {
                Some(i) => record.get(i).unwrap_or("").to_string(),
                None => value_col.to_string(),
            };
            let var_pos = match var_order.iter().position(|v| *v == var_name) {
                Some(p) => p,
                None => {
                    var_order.push(var_name);
                    var_order.len() - 1
                }
            };

            let mut coords = Vec::with_capacity(dim_cols.len());
            for (k, &col) in dim_cols.iter().enumerate() {
                let label = Label::parse(record.get(col).unwrap_or(""));
                let idx = match lookup[k].get(&label) {
                    Some(&idx) => idx,
                    None => {
                        labels[k].push(label.clone());
                        lookup[k].insert(label, labels[k].len() - 1);
                        labels[k].len() - 1
                    }
                };
                coords.push(idx);
            }

            let raw = record.get(value_idx).unwrap_or("");
            let value = raw
                .parse::<f64>()
                .with_context(|| format!("Failed to parse value '{}' on row {}", raw, line + 1))?;
            if !seen.insert((var_pos, coords.clone())) {
                return Err(FacetError::Validation(format!(
                    "CSV row {} repeats the coordinates of an earlier row for '{}'",
                    line + 1,
                    var_order[var_pos]
                ))
                .into());
            }
            rows.push((var_pos, coords, value));
        }

        if rows.is_empty() {
            return Err(anyhow!("CSV input must contain at least one data row"));
        }

        let dims: Vec<Dimension> = dim_cols
            .iter()
            .zip(labels)
            .map(|(&col, labels)| Dimension {
                name: headers[col].clone(),
                labels,
            })
            .collect();
        let shape: Vec<usize> = dims.iter().map(Dimension::size).collect();
        let total: usize = shape.iter().product();

        let mut buffers = vec![vec![f64::NAN; total]; var_order.len()];
        for (var_pos, coords, value) in rows {
            let offset = coords
                .iter()
                .zip(&shape)
                .fold(0, |acc, (&c, &size)| acc * size + c);
            buffers[var_pos][offset] = value;
        }

        let variables = var_order
            .iter()
            .zip(buffers)
            .map(|(name, values)| Variable::new(name, dims.clone(), values))
            .collect::<Result<Vec<_>>>()?;
        Ok(Dataset::new(variables)?)
    }
}

fn check_unique_names(variables: &[Variable]) -> Result<()> {
    for (i, var) in variables.iter().enumerate() {
        if variables[..i].iter().any(|v| v.name() == var.name()) {
            return Err(FacetError::Validation(format!(
                "variable '{}' declared twice",
                var.name()
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct DatasetRecord {
    variables: Vec<VariableRecord>,
    #[serde(default)]
    heterogeneous: bool,
}

#[derive(Debug, Deserialize)]
struct VariableRecord {
    name: String,
    dims: Vec<Dimension>,
    values: Vec<f64>,
}
