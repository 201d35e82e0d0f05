// adstar-core/src/domain/dimension/date.rs

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeSet, HashMap};

use crate::domain::error::DomainError;
use crate::domain::staging::STAGING_YEARS;
use crate::domain::table::{SurrogateKey, Table};

pub const DIM_DATE: &str = "dim_date";

/// The one dimension keyed by content: `date_key` is YYYYMMDD, so the same
/// date keeps its key across independent rebuilds.
#[derive(Debug, Clone, PartialEq)]
pub struct DateDimensionRow {
    pub date_key: SurrogateKey,
    pub date: NaiveDate,
    pub month: u32,
    pub month_name: String,
    pub quarter: String,
    pub year: i32,
}

impl DateDimensionRow {
    /// `None` for dates whose year has no 8-digit key.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Some(Self {
            date_key: date_key(date)?,
            date,
            month: date.month(),
            month_name: date.format("%B").to_string(),
            quarter: format!("Q{}", date.month0() / 3 + 1),
            year: date.year(),
        })
    }
}

pub fn date_key(date: NaiveDate) -> Option<SurrogateKey> {
    if !STAGING_YEARS.contains(&date.year()) {
        return None;
    }
    let year = u32::try_from(date.year()).ok()?;
    let value = year
        .checked_mul(10_000)?
        .checked_add(date.month() * 100 + date.day())?;
    Some(SurrogateKey::new(value))
}

#[derive(Debug, Clone, Default)]
pub struct DateDimension {
    rows: Vec<DateDimensionRow>,
    index: HashMap<NaiveDate, SurrogateKey>,
}

impl DateDimension {
    pub fn build<I>(dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let distinct: BTreeSet<NaiveDate> = dates.into_iter().collect();
        let rows: Vec<DateDimensionRow> =
            distinct.into_iter().filter_map(DateDimensionRow::from_date).collect();
        let index = rows.iter().map(|r| (r.date, r.date_key)).collect();

        tracing::debug!(table = DIM_DATE, rows = rows.len(), "Dimension built");
        Self { rows, index }
    }

    pub fn lookup(&self, date: NaiveDate) -> Option<SurrogateKey> {
        self.index.get(&date).copied()
    }

    pub fn rows_slice(&self) -> &[DateDimensionRow] {
        &self.rows
    }

    pub fn contains_key(&self, key: SurrogateKey) -> bool {
        self.rows
            .binary_search_by_key(&key, |r| r.date_key)
            .is_ok()
    }

    /// Content keys are unique and strictly increasing with the date.
    pub fn verify_keys(&self) -> Result<(), DomainError> {
        for pair in self.rows.windows(2) {
            if pair[0].date_key >= pair[1].date_key {
                return Err(DomainError::DuplicateSurrogateKey {
                    dimension: DIM_DATE.to_string(),
                    key: pair[1].date_key.get(),
                });
            }
        }
        Ok(())
    }
}

impl Table for DateDimension {
    fn name(&self) -> &str {
        DIM_DATE
    }

    fn header(&self) -> Vec<&'static str> {
        vec!["date_key", "date", "month", "month_name", "quarter", "year"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                vec![
                    r.date_key.to_string(),
                    r.date.format("%Y-%m-%d").to_string(),
                    r.month.to_string(),
                    r.month_name.clone(),
                    r.quarter.clone(),
                    r.year.to_string(),
                ]
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}
