//! Chart rendering for persisted benchmark tables.
//!
//! Pure consumer of the result CSVs: reads them back through
//! [`Table::read_csv`] and renders grouped bar charts. A missing file,
//! column or category degrades to a stderr warning so the remaining charts
//! still render; nothing here aborts a visualization pass.

use std::path::Path;

use plotters::coord::ranged1d::ValueFormatter;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{BenchError, Result};
use crate::report::Table;

pub const SYMMETRIC_CSV: &str = "symmetric_benchmark_results.csv";
pub const ASYMMETRIC_CSV: &str = "asymmetric_benchmark_results.csv";

const CHART_SIZE: (u32, u32) = (1200, 700);

fn chart_err<E: std::fmt::Display>(e: E) -> BenchError {
    BenchError::Chart(e.to_string())
}

/// Render every chart whose input CSV exists under `results_dir`. Individual
/// failures are reported and skipped.
pub fn render_all(results_dir: &Path) -> Result<()> {
    let symmetric = results_dir.join(SYMMETRIC_CSV);
    if symmetric.exists() {
        if let Err(e) = render_symmetric(&symmetric, results_dir) {
            eprintln!("Failed to plot symmetric results: {e}");
        }
    } else {
        eprintln!(
            "Skipping symmetric charts, file not found: {}",
            symmetric.display()
        );
    }

    let asymmetric = results_dir.join(ASYMMETRIC_CSV);
    if asymmetric.exists() {
        if let Err(e) = render_asymmetric(&asymmetric, results_dir) {
            eprintln!("Failed to plot asymmetric results: {e}");
        }
    } else {
        eprintln!(
            "Skipping asymmetric charts, file not found: {}",
            asymmetric.display()
        );
    }
    Ok(())
}

fn parse_f64(table: &Table, row: usize, column: &str) -> Option<f64> {
    table.cell(row, column)?.parse().ok()
}

/// Series label for a symmetric row ("AES-128 GCM"), from whatever identity
/// columns the row actually has.
fn cipher_label(table: &Table, row: usize) -> String {
    let algorithm = table.cell(row, "Algorithm").unwrap_or("?");
    match (table.cell(row, "Key Size"), table.cell(row, "Mode")) {
        (Some(bits), Some(mode)) => format!("{algorithm}-{bits} {mode}"),
        (None, Some(mode)) => format!("{algorithm} {mode}"),
        (Some(bits), None) => format!("{algorithm}-{bits}"),
        (None, None) => algorithm.to_string(),
    }
}

/// Encrypt throughput, grouped bars per data size on a log y-axis.
pub fn render_symmetric(csv_path: &Path, out_dir: &Path) -> Result<()> {
    eprintln!("Plotting symmetric results from {}...", csv_path.display());
    let table = Table::read_csv(csv_path)?;

    for required in ["Data Size", "Encrypt (MB/s)"] {
        if !table.has_column(required) {
            eprintln!("Skipping symmetric chart: column {required:?} missing");
            return Ok(());
        }
    }

    // Distinct data sizes and cipher labels in row order.
    let mut groups: Vec<String> = Vec::new();
    let mut series: Vec<String> = Vec::new();
    for row in 0..table.rows.len() {
        let Some(size) = table.cell(row, "Data Size") else {
            eprintln!("Skipping symmetric row {row}: no data size");
            continue;
        };
        if !groups.iter().any(|g| g.as_str() == size) {
            groups.push(size.to_string());
        }
        let label = cipher_label(&table, row);
        if !series.iter().any(|s| s == &label) {
            series.push(label);
        }
    }

    let mut values = vec![vec![None; series.len()]; groups.len()];
    for row in 0..table.rows.len() {
        let (Some(size), value) = (
            table.cell(row, "Data Size"),
            parse_f64(&table, row, "Encrypt (MB/s)"),
        ) else {
            continue;
        };
        let label = cipher_label(&table, row);
        let (Some(g), Some(s)) = (
            groups.iter().position(|x| x.as_str() == size),
            series.iter().position(|x| *x == label),
        ) else {
            continue;
        };
        if value.is_none() {
            eprintln!("No encrypt throughput for {label} at {size}; leaving a gap");
        }
        values[g][s] = value;
    }

    let path = out_dir.join("symmetric_encrypt_throughput.png");
    draw_grouped_bars_log(
        &path,
        "Symmetric Encrypt Throughput (Higher is Better)",
        "Throughput (MB/s) - Log Scale",
        &groups,
        &series,
        &values,
    )?;
    eprintln!("  -> Saved chart to: {}", path.display());
    Ok(())
}

/// Key-gen, sign/verify and (when present) peak-memory charts.
pub fn render_asymmetric(csv_path: &Path, out_dir: &Path) -> Result<()> {
    eprintln!("Plotting asymmetric results from {}...", csv_path.display());
    let table = Table::read_csv(csv_path)?;

    if !table.has_column("Key") {
        eprintln!("Skipping asymmetric charts: column \"Key\" missing");
        return Ok(());
    }
    let keys: Vec<String> = (0..table.rows.len())
        .map(|row| table.cell(row, "Key").unwrap_or("?").to_string())
        .collect();
    if keys.is_empty() {
        eprintln!("Skipping asymmetric charts: no rows");
        return Ok(());
    }

    let single_series = |column: &str| -> Vec<Vec<Option<f64>>> {
        (0..table.rows.len())
            .map(|row| vec![parse_f64(&table, row, column)])
            .collect()
    };

    if table.has_column("Key Gen (s)") {
        let path = out_dir.join("asymmetric_key_gen_time.png");
        draw_grouped_bars(
            &path,
            "Asymmetric Key Generation Time (Lower is Better)",
            "Time (seconds)",
            &keys,
            &["Key Gen (s)".to_string()],
            &single_series("Key Gen (s)"),
        )?;
        eprintln!("  -> Saved chart to: {}", path.display());
    } else {
        eprintln!("Skipping key-gen chart: column \"Key Gen (s)\" missing");
    }

    let sign_verify: Vec<String> = ["Sign (s)", "Verify (s)"]
        .iter()
        .filter(|c| table.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if sign_verify.is_empty() {
        eprintln!("Skipping sign/verify chart: no sign or verify columns");
    } else {
        if sign_verify.len() < 2 {
            eprintln!("Sign/verify chart degraded: only {:?} present", sign_verify);
        }
        let values: Vec<Vec<Option<f64>>> = (0..table.rows.len())
            .map(|row| {
                sign_verify
                    .iter()
                    .map(|c| parse_f64(&table, row, c))
                    .collect()
            })
            .collect();
        let path = out_dir.join("asymmetric_sign_verify_time.png");
        draw_grouped_bars(
            &path,
            "Asymmetric Sign & Verify Time (Lower is Better)",
            "Time (seconds)",
            &keys,
            &sign_verify,
            &values,
        )?;
        eprintln!("  -> Saved chart to: {}", path.display());
    }

    // Memory chart only exists in memory-tracked runs.
    if table.has_column("Key Gen Peak (KiB)") {
        let path = out_dir.join("asymmetric_key_gen_memory.png");
        draw_grouped_bars(
            &path,
            "Asymmetric Key Gen Peak Memory (Lower is Better)",
            "Peak Memory (KiB)",
            &keys,
            &["Key Gen Peak (KiB)".to_string()],
            &single_series("Key Gen Peak (KiB)"),
        )?;
        eprintln!("  -> Saved chart to: {}", path.display());
    }
    Ok(())
}

/// Bar slot within a group: `values` is indexed `[group][series]`.
fn bar_span(group: usize, series: usize, n_series: usize) -> (f64, f64) {
    let width = 0.8 / n_series as f64;
    let x0 = group as f64 + 0.1 + series as f64 * width;
    (x0, x0 + width * 0.92)
}

fn max_value(values: &[Vec<Option<f64>>]) -> Option<f64> {
    values
        .iter()
        .flatten()
        .flatten()
        .copied()
        .fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.max(v)))
        })
}

fn draw_grouped_bars(
    path: &Path,
    title: &str,
    y_desc: &str,
    groups: &[String],
    series: &[String],
    values: &[Vec<Option<f64>>],
) -> Result<()> {
    let Some(max) = max_value(values).filter(|m| *m > 0.0) else {
        eprintln!("Skipping {}: no plottable values", path.display());
        return Ok(());
    };

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..groups.len() as f64, 0f64..max * 1.15)
        .map_err(chart_err)?;

    configure_mesh(&mut chart, groups, y_desc)?;

    for (s, name) in series.iter().enumerate() {
        let color = Palette99::pick(s).mix(0.9);
        chart
            .draw_series(values.iter().enumerate().filter_map(|(g, row)| {
                row[s].map(|v| {
                    let (x0, x1) = bar_span(g, s, series.len());
                    Rectangle::new([(x0, 0.0), (x1, v)], color.filled())
                })
            }))
            .map_err(chart_err)?
            .label(name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    finish_chart(chart, root)
}

fn draw_grouped_bars_log(
    path: &Path,
    title: &str,
    y_desc: &str,
    groups: &[String],
    series: &[String],
    values: &[Vec<Option<f64>>],
) -> Result<()> {
    let Some(max) = max_value(values).filter(|m| *m > 0.0) else {
        eprintln!("Skipping {}: no plottable values", path.display());
        return Ok(());
    };
    let min = values
        .iter()
        .flatten()
        .flatten()
        .copied()
        .filter(|v| *v > 0.0)
        .fold(max, f64::min);
    let floor = min / 10.0;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..groups.len() as f64, (floor..max * 2.0).log_scale())
        .map_err(chart_err)?;

    configure_mesh(&mut chart, groups, y_desc)?;

    for (s, name) in series.iter().enumerate() {
        let color = Palette99::pick(s).mix(0.9);
        chart
            .draw_series(values.iter().enumerate().filter_map(|(g, row)| {
                row[s].filter(|v| *v > 0.0).map(|v| {
                    let (x0, x1) = bar_span(g, s, series.len());
                    Rectangle::new([(x0, floor), (x1, v)], color.filled())
                })
            }))
            .map_err(chart_err)?
            .label(name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    finish_chart(chart, root)
}

fn configure_mesh<'a, 'b, Y>(
    chart: &mut ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, Y>>,
    groups: &[String],
    y_desc: &str,
) -> Result<()>
where
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let labels: Vec<String> = groups.to_vec();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(groups.len().max(2))
        .x_label_formatter(&move |x: &f64| {
            let idx = x.floor() as usize;
            labels.get(idx).cloned().unwrap_or_default()
        })
        .y_desc(y_desc)
        .draw()
        .map_err(chart_err)
}

fn finish_chart<'a, 'b: 'a, Y>(
    mut chart: ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, Y>>,
    root: DrawingArea<BitMapBackend<'b>, Shift>,
) -> Result<()>
where
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .draw()
        .map_err(chart_err)?;
    root.present().map_err(chart_err)?;
    Ok(())
}
