//! Grid layout for multi-dimensional arrays
//!
//! A newly created array of `Dim` dimensions is held as a flat, row-major
//! list of elements. Each element's multi-dimensional index is recovered by
//! mixed-radix decomposition of its linear position, the first dimension
//! varying slowest.

use serde_json::Value;

/// Size of one array dimension.
///
/// `length` is the current size, which loaded data may set to anything.
/// `declared` is the schema's `DimLength` entry; a declared dimension is
/// not editable and regridding restores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimExtent {
    pub length: usize,
    pub declared: Option<usize>,
}

impl DimExtent {
    #[must_use]
    pub fn fixed(length: usize) -> Self {
        Self {
            length,
            declared: Some(length),
        }
    }

    #[must_use]
    pub fn free(length: usize) -> Self {
        Self {
            length,
            declared: None,
        }
    }

    /// Whether the schema declares this dimension's length
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.declared.is_some()
    }

    /// Length the grid takes when regridded: the declared one if any
    #[must_use]
    pub fn grid_length(&self) -> usize {
        self.declared.unwrap_or(self.length)
    }
}

/// Extents for a new `dim`-dimensional array.
///
/// Declared lengths are fixed; missing trailing dimensions count as 1. With
/// nothing declared the array starts empty.
#[must_use]
pub fn extents(dim: usize, dim_length: Option<&[usize]>) -> Vec<DimExtent> {
    let dim = dim.max(1);
    match dim_length {
        Some(lengths) => (0..dim)
            .map(|d| match lengths.get(d) {
                Some(&length) => DimExtent::fixed(length),
                None => DimExtent::free(1),
            })
            .collect(),
        None => (0..dim)
            .map(|d| DimExtent::free(usize::from(d != 0)))
            .collect(),
    }
}

/// Lengths of each dimension
#[must_use]
pub fn lengths(extents: &[DimExtent]) -> Vec<usize> {
    extents.iter().map(|e| e.length).collect()
}

/// Number of elements in the grid: the product of every length
#[must_use]
pub fn total(lengths: &[usize]) -> usize {
    lengths.iter().product()
}

/// Zero-based index of the element at `linear`, most significant dimension first
#[must_use]
pub fn index_of(linear: usize, lengths: &[usize]) -> Vec<usize> {
    let mut index = vec![0; lengths.len()];
    let mut rest = linear;
    for (slot, &length) in index.iter_mut().zip(lengths).rev() {
        if length == 0 {
            continue;
        }
        *slot = rest % length;
        rest /= length;
    }
    index
}

/// Display label for an element: `Name(i,j)` with one-based indices
#[must_use]
pub fn label(name: &str, index: &[usize]) -> String {
    let parts: Vec<String> = index.iter().map(|i| (i + 1).to_string()).collect();
    format!("{name}({})", parts.join(","))
}

/// Fold a flat row-major list back into nested arrays
#[must_use]
pub fn fold(mut values: Vec<Value>, lengths: &[usize]) -> Value {
    if lengths.len() <= 1 {
        return Value::Array(values);
    }

    let stride = total(&lengths[1..]);
    if stride == 0 {
        return Value::Array(vec![Value::Array(Vec::new()); lengths[0]]);
    }

    let mut rows = Vec::with_capacity(lengths[0]);
    while !values.is_empty() {
        let tail = values.split_off(stride.min(values.len()));
        rows.push(fold(values, &lengths[1..]));
        values = tail;
    }
    Value::Array(rows)
}
