use serde::Serialize;
use std::fs;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write pre-rendered rows under `header`. The header is written even when
/// there are no rows.
pub fn write_rows(path: &Path, header: &[String], rows: &[Vec<String>]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(header)?;
    for r in rows {
        wtr.write_record(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_table(rows, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemTotalRow;
    use anyhow::Result;
    use tempfile::tempdir;

    fn rows() -> Vec<ItemTotalRow> {
        vec![
            ItemTotalRow { item_type: "Fastfood".to_string(), total_amount: 12500.0 },
            ItemTotalRow { item_type: "Beverages".to_string(), total_amount: 800.0 },
        ]
    }

    #[test]
    fn test_write_csv_emits_header_and_rows() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("items.csv");
        write_csv(&path, &rows())?;

        let content = fs::read_to_string(&path)?;
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("item_type,total_amount"));
        assert_eq!(lines.next(), Some("Fastfood,12500.0"));
        assert_eq!(lines.next(), Some("Beverages,800.0"));
        Ok(())
    }

    #[test]
    fn test_write_csv_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("items.csv");
        assert!(write_csv(&path, &rows()).is_err());
    }

    #[test]
    fn test_write_rows_keeps_header_for_empty_tables() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("rows.csv");
        let header = vec!["order_id".to_string(), "item_type".to_string()];
        write_rows(&path, &header, &[])?;
        assert_eq!(fs::read_to_string(&path)?, "order_id,item_type\n");

        let rows = vec![vec!["7".to_string(), "Cold coffee, large".to_string()]];
        write_rows(&path, &header, &rows)?;
        assert_eq!(
            fs::read_to_string(&path)?,
            "order_id,item_type\n7,\"Cold coffee, large\"\n"
        );
        Ok(())
    }

    #[test]
    fn test_render_table_formats_amounts_and_limits_rows() {
        let table = render_table(&rows(), 1);
        assert!(table.contains("Item Type"));
        assert!(table.contains("12,500"));
        assert!(!table.contains("Beverages"));
        assert_eq!(render_table::<ItemTotalRow>(&[], 5), "(no rows)");
    }
}
