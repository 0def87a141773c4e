//! Result aggregation: normalizes heterogeneous [`ResultRecord`]s into
//! fixed-schema tables and persists them as CSV.
//!
//! Missing optional fields stay empty cells, never `0`; a zero would read
//! as "measured as zero". Column order is fixed per schema and row order is
//! call order; nothing is re-sorted.

use std::path::Path;

use crate::error::Result;
use crate::schema::{OpKind, ResultRecord};

/// An ordered sequence of rows under one column schema. `None` cells
/// serialize as empty CSV fields and read back as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at (row, column name); `None` for an absent column, an absent
    /// row, or an empty cell.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        self.write_delimited(std::fs::File::create(path)?)
    }

    pub fn write_delimited<W: std::io::Write>(&self, wtr: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(wtr);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Table> {
        let mut reader = csv::Reader::from_path(path)?;
        let columns = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                    .collect(),
            );
        }
        Ok(Table { columns, rows })
    }
}

fn fmt_secs(secs: f64) -> String {
    format!("{secs:.9}")
}

fn fmt_mb_s(rate: f64) -> String {
    format!("{rate:.2}")
}

fn fmt_kib(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / 1024.0)
}

/// Human label for a payload size ("1KB", "1MB", "100MB").
pub fn size_label(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * KIB;
    match bytes {
        b if b >= MIB && b % MIB == 0 => format!("{}MB", b / MIB),
        b if b >= KIB && b % KIB == 0 => format!("{}KB", b / KIB),
        b => format!("{b}B"),
    }
}

/// Flat normalization: one row per record, call order preserved. Optional
/// columns appear only when at least one record carries the field.
pub fn collect(records: &[ResultRecord]) -> Table {
    let any_security = records.iter().any(|r| r.security.is_some());
    let any_payload = records.iter().any(|r| r.payload_bytes.is_some());
    let any_throughput = records.iter().any(|r| r.throughput_mb_s.is_some());
    let any_peak = records.iter().any(|r| r.peak_bytes.is_some());

    let mut columns = vec!["Algorithm", "Variant", "Operation", "Iterations", "Avg (s)"];
    if any_security {
        columns.push("Security (approx)");
    }
    if any_payload {
        columns.push("Data Size (B)");
    }
    if any_throughput {
        columns.push("Throughput (MB/s)");
    }
    if any_peak {
        columns.push("Peak (KiB)");
    }

    let mut table = Table::new(columns);
    for rec in records {
        let mut row = vec![
            Some(rec.algorithm.clone()),
            Some(rec.variant.clone()),
            Some(rec.op.as_str().to_string()),
            Some(rec.iterations.to_string()),
            Some(fmt_secs(rec.avg_secs)),
        ];
        if any_security {
            row.push(rec.security.clone());
        }
        if any_payload {
            row.push(rec.payload_bytes.map(|b| b.to_string()));
        }
        if any_throughput {
            row.push(rec.throughput_mb_s.map(fmt_mb_s));
        }
        if any_peak {
            row.push(rec.peak_bytes.map(fmt_kib));
        }
        table.rows.push(row);
    }
    table
}

/// Canonical symmetric schema: one row per cipher × payload size, encrypt
/// and decrypt throughput side by side.
pub fn symmetric_table(records: &[ResultRecord]) -> Table {
    let mut table = Table::new(vec![
        "Algorithm",
        "Key Size",
        "Mode",
        "Data Size",
        "Encrypt (MB/s)",
        "Decrypt (MB/s)",
    ]);
    // First-seen group order; groups keyed by everything but the op.
    let mut groups: Vec<(String, usize)> = Vec::new();

    for rec in records {
        let col = match rec.op {
            OpKind::Encrypt => 4,
            OpKind::Decrypt => 5,
            _ => continue,
        };
        let key_size = rec
            .extra
            .get("key_bits")
            .and_then(|v| v.as_u64())
            .map(|v| v.to_string());
        let mode = rec
            .extra
            .get("mode")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let data_size = rec
            .extra
            .get("size_label")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| rec.payload_bytes.map(size_label));

        let group_key = format!(
            "{}|{}|{}|{}",
            rec.algorithm,
            key_size.as_deref().unwrap_or(""),
            mode.as_deref().unwrap_or(""),
            data_size.as_deref().unwrap_or("")
        );
        let row = match groups.iter().find(|(k, _)| *k == group_key) {
            Some((_, row)) => *row,
            None => {
                table.rows.push(vec![
                    Some(rec.algorithm.clone()),
                    key_size,
                    mode,
                    data_size,
                    None,
                    None,
                ]);
                groups.push((group_key, table.rows.len() - 1));
                table.rows.len() - 1
            }
        };
        table.rows[row][col] = rec.throughput_mb_s.map(fmt_mb_s);
    }
    table
}

/// Canonical asymmetric schema: one row per key variant with key-gen, sign
/// and verify averages; peak-memory columns only when any record was
/// memory-tracked.
pub fn asymmetric_table(records: &[ResultRecord]) -> Table {
    let with_peak = records.iter().any(|r| r.peak_bytes.is_some());

    let mut columns = vec![
        "Algorithm",
        "Key",
        "Security (approx)",
        "Key Gen (s)",
        "Sign (s)",
        "Verify (s)",
    ];
    if with_peak {
        columns.extend(["Key Gen Peak (KiB)", "Sign Peak (KiB)", "Verify Peak (KiB)"]);
    }
    let width = columns.len();
    let mut table = Table::new(columns);
    let mut groups: Vec<(String, usize)> = Vec::new();

    for rec in records {
        let (time_col, peak_col) = match rec.op {
            OpKind::KeyGen => (3, 6),
            OpKind::Sign => (4, 7),
            OpKind::Verify => (5, 8),
            _ => continue,
        };
        let group_key = format!("{}|{}", rec.algorithm, rec.variant);
        let row = match groups.iter().find(|(k, _)| *k == group_key) {
            Some((_, row)) => *row,
            None => {
                let mut cells = vec![None; width];
                cells[0] = Some(rec.algorithm.clone());
                cells[1] = Some(rec.variant.clone());
                cells[2] = rec.security.clone();
                table.rows.push(cells);
                groups.push((group_key, table.rows.len() - 1));
                table.rows.len() - 1
            }
        };
        table.rows[row][time_col] = Some(fmt_secs(rec.avg_secs));
        if with_peak {
            table.rows[row][peak_col] = rec.peak_bytes.map(fmt_kib);
        }
        // Security label can arrive with any of the three ops.
        if table.rows[row][2].is_none() {
            table.rows[row][2] = rec.security.clone();
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(algorithm: &str, variant: &str, op: OpKind) -> ResultRecord {
        ResultRecord {
            algorithm: algorithm.to_string(),
            variant: variant.to_string(),
            op,
            security: None,
            iterations: 10,
            avg_secs: 0.001,
            payload_bytes: None,
            throughput_mb_s: None,
            peak_bytes: None,
            extra: serde_json::Value::Null,
        }
    }

    #[test]
    fn collect_renders_missing_optionals_as_empty_not_zero() {
        let mut with_tp = record("AES", "128/GCM", OpKind::Encrypt);
        with_tp.payload_bytes = Some(1024);
        with_tp.throughput_mb_s = Some(812.5);
        let without_tp = record("RSA", "2048-bit", OpKind::Sign);

        let table = collect(&[with_tp, without_tp]);
        assert!(table.has_column("Throughput (MB/s)"));
        assert_eq!(table.cell(0, "Throughput (MB/s)"), Some("812.50"));
        // Null, not "0".
        assert_eq!(table.cell(1, "Throughput (MB/s)"), None);
        assert_eq!(table.cell(1, "Data Size (B)"), None);
    }

    #[test]
    fn collect_omits_columns_nobody_carries() {
        let table = collect(&[record("RSA", "2048-bit", OpKind::Sign)]);
        assert!(!table.has_column("Peak (KiB)"));
        assert!(!table.has_column("Security (approx)"));
        assert_eq!(
            table.columns,
            vec!["Algorithm", "Variant", "Operation", "Iterations", "Avg (s)"]
        );
    }

    #[test]
    fn collect_preserves_call_order() {
        let records = vec![
            record("B", "1", OpKind::Encrypt),
            record("A", "2", OpKind::Encrypt),
            record("C", "3", OpKind::Encrypt),
        ];
        let table = collect(&records);
        let order: Vec<_> = (0..3).map(|i| table.cell(i, "Algorithm").unwrap().to_string()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[test]
    fn symmetric_pivot_pairs_encrypt_and_decrypt() {
        let extra = json!({"key_bits": 128, "mode": "GCM", "size_label": "1KB"});
        let mut enc = record("AES", "128/GCM", OpKind::Encrypt);
        enc.extra = extra.clone();
        enc.payload_bytes = Some(1024);
        enc.throughput_mb_s = Some(1000.0);
        let mut dec = record("AES", "128/GCM", OpKind::Decrypt);
        dec.extra = extra;
        dec.payload_bytes = Some(1024);
        dec.throughput_mb_s = Some(1200.0);

        let table = symmetric_table(&[enc, dec]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, "Algorithm"), Some("AES"));
        assert_eq!(table.cell(0, "Key Size"), Some("128"));
        assert_eq!(table.cell(0, "Mode"), Some("GCM"));
        assert_eq!(table.cell(0, "Data Size"), Some("1KB"));
        assert_eq!(table.cell(0, "Encrypt (MB/s)"), Some("1000.00"));
        assert_eq!(table.cell(0, "Decrypt (MB/s)"), Some("1200.00"));
    }

    #[test]
    fn asymmetric_pivot_merges_ops_into_one_row() {
        let mut keygen = record("RSA", "2048-bit", OpKind::KeyGen);
        keygen.security = Some("~112-bit".to_string());
        keygen.avg_secs = 1.25;
        keygen.peak_bytes = Some(2048);
        let mut sign = record("RSA", "2048-bit", OpKind::Sign);
        sign.avg_secs = 0.002;
        sign.peak_bytes = Some(1024);
        let mut verify = record("RSA", "2048-bit", OpKind::Verify);
        verify.avg_secs = 0.0001;
        verify.peak_bytes = Some(512);

        let table = asymmetric_table(&[keygen, sign, verify]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, "Key"), Some("2048-bit"));
        assert_eq!(table.cell(0, "Security (approx)"), Some("~112-bit"));
        assert_eq!(table.cell(0, "Key Gen (s)"), Some("1.250000000"));
        assert_eq!(table.cell(0, "Key Gen Peak (KiB)"), Some("2.0"));
        assert_eq!(table.cell(0, "Sign Peak (KiB)"), Some("1.0"));
        assert_eq!(table.cell(0, "Verify Peak (KiB)"), Some("0.5"));
    }

    #[test]
    fn asymmetric_pivot_drops_peak_columns_when_untracked() {
        let keygen = record("ECC", "P-256", OpKind::KeyGen);
        let table = asymmetric_table(&[keygen]);
        assert!(!table.has_column("Key Gen Peak (KiB)"));
        assert_eq!(table.columns.len(), 6);
    }

    #[test]
    fn csv_round_trip_preserves_schema_and_nulls() {
        let mut table = Table::new(vec!["A", "B", "C"]);
        table.rows.push(vec![
            Some("x".to_string()),
            None,
            Some("1.50".to_string()),
        ]);
        table
            .rows
            .push(vec![None, Some("y, with comma".to_string()), None]);

        let dir = tempdir().unwrap();
        let path = dir.path().join("round_trip.csv");
        table.write_csv(&path).unwrap();
        let loaded = Table::read_csv(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn size_labels_match_the_result_files() {
        assert_eq!(size_label(1024), "1KB");
        assert_eq!(size_label(1024 * 1024), "1MB");
        assert_eq!(size_label(100 * 1024 * 1024), "100MB");
        assert_eq!(size_label(100), "100B");
    }
}
