// adstar-core/src/infrastructure/csv_table.rs

use crate::domain::table::Table;
use crate::infrastructure::error::InfrastructureError;

/// Serializes a table (header row first) to CSV bytes.
/// The same table always yields the same bytes.
pub fn encode_table(table: &dyn Table) -> Result<Vec<u8>, InfrastructureError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(table.header())?;
    for row in table.rows() {
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| InfrastructureError::Io(e.into_error()))
}

pub fn file_name(table: &dyn Table) -> String {
    format!("{}.csv", table.name())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::dimension::build_dimension;
    use crate::domain::dimension::classifier::classify_site;
    use crate::domain::dimension::set::DIM_SITE;
    use crate::domain::warning::WarningCollector;

    #[test]
    fn test_encode_dimension() {
        let sink = WarningCollector::new();
        let dim = build_dimension(DIM_SITE, ["sport.fr", "news, daily"], classify_site, &sink);

        let bytes = encode_table(&dim).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        insta::assert_snapshot!(text, @r#"
        site_key,site_name,site_category
        1,"news, daily",News
        2,sport.fr,Sports
        "#);
        assert_eq!(file_name(&dim), "dim_site.csv");
    }
}
