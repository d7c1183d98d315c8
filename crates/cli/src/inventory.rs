//! Inventory loading
//!
//! An inventory is a CSV export with one row per database instance, or a
//! JSON array of the same records when the file extension is `.json`.
//! Fields are kept as text; the library parses metrics per instance so a
//! bad value only affects its own row.

use anyhow::{Context, Result};
use csv::StringRecord;
use rightsizer_lib::InstanceRecord;
use std::fs;
use std::path::{Path, PathBuf};

/// Load every instance record from an inventory file
pub fn load_inventory(path: &Path) -> Result<Vec<InstanceRecord>> {
    if is_json(path) {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read inventory: {}", path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse inventory JSON: {}", path.display()));
    }

    let mut reader = csv_reader(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .clone();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        // header is line 1
        let line = index + 2;
        let mut row = row.with_context(|| format!("Malformed inventory row at line {}", line))?;
        row.truncate(headers.len());

        // a short row only names the columns it has, the rest take their defaults
        let row_headers: StringRecord = headers.iter().take(row.len()).collect();
        let record = row
            .deserialize(Some(&row_headers))
            .with_context(|| format!("Malformed inventory row at line {}", line))?;
        records.push(record);
    }

    Ok(records)
}

/// Raw header and rows of a CSV file, padded or cut to the header width
pub fn load_raw_rows(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv_reader(path)?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed CSV row")?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok((headers, rows))
}

/// Path of a file written next to the inventory, `<stem><suffix>`
pub fn sibling_path(inventory: &Path, suffix: &str) -> PathBuf {
    let stem = inventory
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "inventory".to_string());
    inventory.with_file_name(format!("{}{}", stem, suffix))
}

fn csv_reader(path: &Path) -> Result<csv::Reader<fs::File>> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open inventory: {}", path.display()))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "name,project_id,location,database_version,tier,availability_type,activation_policy,disk_size_gb,state,cpu_util,memory_util,disk_util,connections";

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_csv_inventory() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "inventory.csv",
            &format!(
                "{}\norders-db,acme,us-central1,MYSQL_8_0,db-custom-4-15360,ZONAL,ALWAYS,100,RUNNABLE,0.03,0.1,0.1,5\n",
                HEADER
            ),
        );

        let records = load_inventory(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "orders-db");
        assert_eq!(records[0].tier, "db-custom-4-15360");
        assert_eq!(records[0].cpu_util, "0.03");
    }

    #[test]
    fn test_missing_columns_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "inventory.csv", "name,tier\nlegacy-db,db-g1-small\n");

        let records = load_inventory(&path).unwrap();
        assert_eq!(records[0].cpu_util, "0");
        assert_eq!(records[0].availability_type, "ZONAL");
    }

    #[test]
    fn test_short_row_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "inventory.csv", "name,tier,cpu_util\nlegacy-db,db-g1-small\n");

        let records = load_inventory(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tier, "db-g1-small");
        assert_eq!(records[0].cpu_util, "0");
    }

    #[test]
    fn test_truncated_row_does_not_abort_batch() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "inventory.csv",
            &format!(
                "{}\norders-db,acme,us-central1\nbilling-db,acme,us-central1,MYSQL_8_0,db-n1-standard-2,REGIONAL,ALWAYS,50,RUNNABLE,0.5,0.5,0.5,100,extra\n",
                HEADER
            ),
        );

        let records = load_inventory(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "orders-db");
        assert_eq!(records[0].location, "us-central1");
        assert_eq!(records[0].tier, "");
        assert_eq!(records[0].availability_type, "ZONAL");
        assert_eq!(records[0].disk_size_gb, "0");
        assert_eq!(records[1].connections, "100");
        assert!(records[1].is_high_availability());
    }

    #[test]
    fn test_load_json_inventory() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "inventory.json",
            r#"[{"name": "orders-db", "tier": "db-n1-standard-2", "cpu_util": "0.5"}]"#,
        );

        let records = load_inventory(&path).unwrap();
        assert_eq!(records[0].tier, "db-n1-standard-2");
        assert_eq!(records[0].memory_util, "0");
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = load_inventory(Path::new("/nonexistent/inventory.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open inventory"));
    }

    #[test]
    fn test_raw_rows_are_padded() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data.csv", "a,b,c\n1,2\n3,4,5,6\n");

        let (headers, rows) = load_raw_rows(&path).unwrap();
        assert_eq!(headers, vec!["a", "b", "c"]);
        assert_eq!(rows[0], vec!["1", "2", ""]);
        assert_eq!(rows[1], vec!["3", "4", "5"]);
    }

    #[test]
    fn test_sibling_path() {
        let path = sibling_path(Path::new("/data/instances.csv"), "_optimization_report.txt");
        assert_eq!(path, PathBuf::from("/data/instances_optimization_report.txt"));
    }
}
