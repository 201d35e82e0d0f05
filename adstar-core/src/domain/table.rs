// adstar-core/src/domain/table.rs

use serde::Serialize;
use std::fmt;

/// Tabular view shared by dimensions, bridge, facts and KPI outputs.
/// Cells are already rendered to text so every writer sees the same bytes.
pub trait Table: Send + Sync {
    fn name(&self) -> &str;
    fn header(&self) -> Vec<&'static str>;
    fn rows(&self) -> Vec<Vec<String>>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// System-generated identifier of a dimension row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SurrogateKey(u32);

impl SurrogateKey {
    pub fn new(value: u32) -> Self {
        SurrogateKey(value)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SurrogateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Null foreign keys render as an empty cell.
pub fn key_cell(key: Option<SurrogateKey>) -> String {
    key.map(|k| k.to_string()).unwrap_or_default()
}

pub fn number_cell(value: f64) -> String {
    // -0.0 would otherwise print as "-0"
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

/// Fixed-precision rendering for derived ratios.
pub fn ratio_cell(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value);
    if rendered.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        return format!("{:.*}", decimals, 0.0);
    }
    rendered
}
