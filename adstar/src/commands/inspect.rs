// adstar/src/commands/inspect.rs
//
// USE CASE: Inspect a published warehouse table (schema + sample rows).

use duckdb::types::ValueRef;
use duckdb::{Connection, Row};
use std::path::Path;

pub fn execute(db_path: String, table: String, limit: usize) -> anyhow::Result<()> {
    if !Path::new(&db_path).exists() {
        anyhow::bail!(
            "❌ Warehouse not found at: {}\n👉 Enable 'warehouse' in adstar.yaml (or set ADSTAR_WAREHOUSE) and run 'adstar run'",
            db_path
        );
    }

    let conn = Connection::open(&db_path)?;
    let ident = format!("\"{}\"", table.replace('"', "\"\""));

    println!("\n🔍 Inspecting Table: '{}'", table);

    let mut stmt_cols = conn.prepare(&format!("PRAGMA table_info({})", ident))?;
    let column_names: Vec<String> = stmt_cols
        .query_map([], |row: &Row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;

    if column_names.is_empty() {
        anyhow::bail!("❌ Table '{}' does not exist in {}", table, db_path);
    }

    let total: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", ident), [], |row| {
        row.get(0)
    })?;

    println!("   Columns: [{}]", column_names.join(", "));
    println!("   --- Rows (Limit {} of {}) ---", limit, total);

    let mut stmt = conn.prepare(&format!("SELECT * FROM {} LIMIT {}", ident, limit))?;
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        let values: Vec<String> = (0..column_names.len())
            .map(|i| match row.get_ref(i) {
                Ok(ValueRef::Null) => "NULL".to_string(),
                Ok(ValueRef::Text(bytes)) => String::from_utf8_lossy(bytes).to_string(),
                Ok(val) => format!("{:?}", val),
                Err(_) => "ERROR".to_string(),
            })
            .collect();

        println!("   ➜ {}", values.join(" | "));
    }

    Ok(())
}
