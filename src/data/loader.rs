use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::model::{Dataset, HeatingRate, Series};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a measurement dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – two header rows (heating-rate labels, then Temperature/CTE),
///   one Temperature/CTE column pair per rate
/// * `.json` – `{ "1K/min": { "temperature": [...], "cte": [...] }, ... }`
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV file")?;
            read_csv(file)
        }
        "json" => {
            let file = std::fs::File::open(path).context("opening JSON file")?;
            read_json(file)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON shape
// ---------------------------------------------------------------------------

/// One heating rate's series as stored in JSON files (and in exports).
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SeriesRecord {
    pub temperature: Vec<f64>,
    pub cte: Vec<f64>,
}

pub(crate) fn read_json<R: io::Read>(reader: R) -> Result<Dataset> {
    let records: BTreeMap<String, SeriesRecord> =
        serde_json::from_reader(reader).context("parsing JSON")?;

    let mut series = BTreeMap::new();
    for (label, record) in records {
        let rate = HeatingRate::from_label(&label)
            .with_context(|| format!("unknown heating rate '{label}'"))?;
        if record.temperature.len() != record.cte.len() {
            bail!(
                "'{label}': temperature has {} values but cte has {}",
                record.temperature.len(),
                record.cte.len()
            );
        }
        if record.temperature.is_empty() {
            continue;
        }
        series.insert(
            rate,
            Series {
                x: record.temperature,
                y: record.cte,
            },
        );
    }

    if series.is_empty() {
        bail!("no heating-rate series found");
    }
    Ok(Dataset { series })
}

// ---------------------------------------------------------------------------
// CSV shape
// ---------------------------------------------------------------------------

/// CSV layout:  two header rows, then data.
///
/// ```text
/// 1K/min,1K/min,3K/min,3K/min
/// Temperature,CTE,Temperature,CTE
/// 25.0,1.18e-5,25.0,1.21e-5
/// ...
/// ```
///
/// Shorter series leave both cells of their pair empty on trailing rows.
pub(crate) fn read_csv<R: io::Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = rdr.records();

    let rate_row = records
        .next()
        .context("file is empty, expected a heating-rate header row")?
        .context("reading heating-rate header row")?;
    let field_row = records
        .next()
        .context("missing the Temperature/CTE header row")?
        .context("reading Temperature/CTE header row")?;

    let n_cols = rate_row.len();
    if n_cols == 0 || n_cols % 2 != 0 {
        bail!("expected Temperature/CTE column pairs, got {n_cols} columns");
    }
    if field_row.len() != n_cols {
        bail!(
            "header rows disagree: {n_cols} rate columns but {} field columns",
            field_row.len()
        );
    }

    // Pair up the columns and resolve their heating rates.
    let mut columns: Vec<(HeatingRate, usize)> = Vec::new();
    let mut seen = BTreeSet::new();
    for c in (0..n_cols).step_by(2) {
        let label = rate_row[c].trim();
        let rate = HeatingRate::from_label(label)
            .with_context(|| format!("column {c}: unknown heating rate '{label}'"))?;
        if !seen.insert(rate) {
            bail!("heating rate '{label}' appears twice");
        }
        let t = field_row[c].trim();
        let v = field_row[c + 1].trim();
        if !t.eq_ignore_ascii_case("temperature") || !v.eq_ignore_ascii_case("cte") {
            bail!(
                "columns {c}-{}: expected Temperature/CTE under '{label}', got '{t}'/'{v}'",
                c + 1
            );
        }
        columns.push((rate, c));
    }

    let mut series: BTreeMap<HeatingRate, Series> = columns
        .iter()
        .map(|&(rate, _)| (rate, Series::default()))
        .collect();

    for (row_no, result) in records.enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for &(rate, c) in &columns {
            let t_cell = record.get(c).unwrap_or("").trim();
            let y_cell = record.get(c + 1).unwrap_or("").trim();
            match (t_cell.is_empty(), y_cell.is_empty()) {
                (true, true) => continue,
                (false, false) => {
                    let t = t_cell.parse::<f64>().with_context(|| {
                        format!("row {row_no}, {rate} Temperature: '{t_cell}' is not a number")
                    })?;
                    let y = y_cell.parse::<f64>().with_context(|| {
                        format!("row {row_no}, {rate} CTE: '{y_cell}' is not a number")
                    })?;
                    let s = series.get_mut(&rate).expect("series exists for every column");
                    s.x.push(t);
                    s.y.push(y);
                }
                _ => bail!(
                    "row {row_no}: {rate} has a Temperature without a CTE (or vice versa)"
                ),
            }
        }
    }

    series.retain(|_, s| !s.is_empty());
    if series.is_empty() {
        bail!("no data rows found");
    }
    Ok(Dataset { series })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_two_rate_csv() {
        let text = "\
1K/min,1K/min,10K/min,10K/min
Temperature,CTE,Temperature,CTE
25.0,1.1e-5,25.0,1.2e-5
50.0,1.15e-5,50.0,1.25e-5
75.0,1.2e-5,,
";
        let dataset = read_csv(text.as_bytes()).unwrap();

        assert_eq!(dataset.rate_count(), 2);
        let one = &dataset.series[&HeatingRate::OneK];
        assert_eq!(one.x, vec![25.0, 50.0, 75.0]);
        assert_eq!(one.y, vec![1.1e-5, 1.15e-5, 1.2e-5]);

        // The 10K/min pair ends one row early.
        let ten = &dataset.series[&HeatingRate::TenK];
        assert_eq!(ten.len(), 2);
        assert_eq!(dataset.rows(), 3);
    }

    #[test]
    fn rejects_unknown_rate_label() {
        let text = "2K/min,2K/min\nTemperature,CTE\n25.0,1.0e-5\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown heating rate"));
    }

    #[test]
    fn rejects_odd_column_count() {
        let text = "1K/min,1K/min,3K/min\nTemperature,CTE,Temperature\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("column pairs"));
    }

    #[test]
    fn rejects_duplicate_rate() {
        let text = "1K/min,1K/min,1K/min,1K/min\nTemperature,CTE,Temperature,CTE\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("appears twice"));
    }

    #[test]
    fn rejects_wrong_field_names() {
        let text = "1K/min,1K/min\nTemp,Value\n25.0,1.0e-5\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("expected Temperature/CTE"));
    }

    #[test]
    fn rejects_half_empty_pair() {
        let text = "1K/min,1K/min\nTemperature,CTE\n25.0,\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("without a CTE"));
    }

    #[test]
    fn rejects_non_numeric_cell() {
        let text = "1K/min,1K/min\nTemperature,CTE\n25.0,oops\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("is not a number"));
    }

    #[test]
    fn rejects_csv_without_data_rows() {
        let text = "1K/min,1K/min\nTemperature,CTE\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("no data rows"));
    }

    #[test]
    fn reads_json_records() {
        let text = r#"{
            "3K/min": { "temperature": [25.0, 50.0], "cte": [1.0e-5, 1.1e-5] }
        }"#;
        let dataset = read_json(text.as_bytes()).unwrap();
        assert_eq!(dataset.rate_count(), 1);
        let three = &dataset.series[&HeatingRate::ThreeK];
        assert_eq!(three.x, vec![25.0, 50.0]);
        assert_eq!(three.y, vec![1.0e-5, 1.1e-5]);
    }

    #[test]
    fn rejects_json_length_mismatch() {
        let text = r#"{ "3K/min": { "temperature": [25.0, 50.0], "cte": [1.0e-5] } }"#;
        let err = read_json(text.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("temperature has 2 values but cte has 1"));
    }

    #[test]
    fn rejects_json_unknown_rate() {
        let text = r#"{ "fast": { "temperature": [25.0], "cte": [1.0e-5] } }"#;
        let err = read_json(text.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown heating rate 'fast'"));
    }
}
