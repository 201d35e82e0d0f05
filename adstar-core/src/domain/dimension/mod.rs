// adstar-core/src/domain/dimension/mod.rs

//! Dimension builder.
//!
//! Surrogate keys are assigned 1..N over the sorted, deduplicated natural keys,
//! so the same staging input always yields the same key for the same value,
//! whatever the row order.

pub mod classifier;
pub mod date;
pub mod set;

use std::collections::{BTreeSet, HashMap};

use crate::domain::error::DomainError;
use crate::domain::table::{SurrogateKey, Table};
use crate::ports::reporter::WarningSink;

pub use classifier::{
    CreativeAttributes, PlacementAttributes, PlacementType, SiteAttributes, SiteCategory,
    SizeAttributes, SourceAttributes, SourceType,
};
pub use date::{DateDimension, DateDimensionRow};
pub use set::DimensionSet;

/// Derived columns of a dimension, rendered after the key and natural key.
pub trait Attributes: Clone + Send + Sync + 'static {
    const COLUMNS: &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl Attributes for () {
    const COLUMNS: &'static [&'static str] = &[];
    fn cells(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Naming of a dimension table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionSpec {
    pub table: &'static str,
    pub key_column: &'static str,
    pub natural_column: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionRow<A> {
    pub surrogate_key: SurrogateKey,
    pub natural_key: String,
    pub attributes: A,
}

#[derive(Debug, Clone)]
pub struct Dimension<A> {
    spec: DimensionSpec,
    rows: Vec<DimensionRow<A>>,
    index: HashMap<String, SurrogateKey>,
}

/// Builds a dimension from raw natural-key values.
///
/// Blank values are not keys: rows referencing them end up with a null
/// foreign key at fact time.
pub fn build_dimension<'a, I, A, F>(
    spec: DimensionSpec,
    natural_keys: I,
    classifier: F,
    warnings: &dyn WarningSink,
) -> Dimension<A>
where
    I: IntoIterator<Item = &'a str>,
    A: Attributes,
    F: Fn(&str, &dyn WarningSink) -> A,
{
    let distinct: BTreeSet<&str> = natural_keys
        .into_iter()
        .filter(|k| !k.trim().is_empty())
        .collect();

    let mut rows = Vec::with_capacity(distinct.len());
    let mut index = HashMap::with_capacity(distinct.len());

    for (position, natural_key) in distinct.into_iter().enumerate() {
        let surrogate_key = SurrogateKey::new(position as u32 + 1);
        index.insert(natural_key.to_string(), surrogate_key);
        rows.push(DimensionRow {
            surrogate_key,
            natural_key: natural_key.to_string(),
            attributes: classifier(natural_key, warnings),
        });
    }

    tracing::debug!(table = spec.table, rows = rows.len(), "Dimension built");

    Dimension { spec, rows, index }
}

impl<A: Attributes> Dimension<A> {
    pub fn spec(&self) -> &DimensionSpec {
        &self.spec
    }

    pub fn rows_slice(&self) -> &[DimensionRow<A>] {
        &self.rows
    }

    /// Exact natural-key lookup (the tolerant join probe).
    pub fn lookup(&self, natural_key: &str) -> Option<SurrogateKey> {
        self.index.get(natural_key).copied()
    }

    pub fn get(&self, key: SurrogateKey) -> Option<&DimensionRow<A>> {
        let position = (key.get() as usize).checked_sub(1)?;
        self.rows.get(position)
    }

    pub fn contains_key(&self, key: SurrogateKey) -> bool {
        self.get(key).is_some()
    }

    pub fn natural_keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.natural_key.as_str())
    }

    /// Checks that keys are exactly 1..N and map one-to-one to natural keys.
    pub fn verify_keys(&self) -> Result<(), DomainError> {
        for (position, row) in self.rows.iter().enumerate() {
            let expected = position as u32 + 1;
            if row.surrogate_key.get() != expected {
                return Err(DomainError::NonContiguousKeys {
                    dimension: self.spec.table.to_string(),
                    expected,
                    found: row.surrogate_key.get(),
                });
            }
            if self.index.get(&row.natural_key) != Some(&row.surrogate_key) {
                return Err(DomainError::DuplicateSurrogateKey {
                    dimension: self.spec.table.to_string(),
                    key: expected,
                });
            }
        }
        if self.index.len() != self.rows.len() {
            return Err(DomainError::DuplicateSurrogateKey {
                dimension: self.spec.table.to_string(),
                key: self.rows.len() as u32,
            });
        }
        Ok(())
    }
}

impl<A: Attributes> Table for Dimension<A> {
    fn name(&self) -> &str {
        self.spec.table
    }

    fn header(&self) -> Vec<&'static str> {
        let mut header = vec![self.spec.key_column, self.spec.natural_column];
        header.extend_from_slice(A::COLUMNS);
        header
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.surrogate_key.to_string(), row.natural_key.clone()];
                cells.extend(row.attributes.cells());
                cells
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}
