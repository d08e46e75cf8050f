use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::loader::SeriesRecord;
use super::model::{Dataset, HeatingRate, SmoothingResult};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Write the despiked dataset to a file.  Dispatch by extension, mirroring
/// the loader's formats so an export can be re-uploaded as-is.
///
/// Rates present in `results` get their cleaned y-values; the rest keep the
/// raw values. Numbers are written with `f64`'s `Display`, the shortest
/// representation that parses back to the identical value.
pub fn export_file(
    path: &Path,
    dataset: &Dataset,
    results: &BTreeMap<HeatingRate, SmoothingResult>,
) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::create(path).context("creating CSV file")?;
            write_csv(file, dataset, results)
        }
        "json" => {
            let file = std::fs::File::create(path).context("creating JSON file")?;
            write_json(file, dataset, results)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Same two-level header layout the loader reads; shorter series pad their
/// column pair with empty cells.
pub(crate) fn write_csv<W: io::Write>(
    writer: W,
    dataset: &Dataset,
    results: &BTreeMap<HeatingRate, SmoothingResult>,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let rates: Vec<HeatingRate> = dataset.series.keys().copied().collect();

    let mut rate_header = Vec::with_capacity(rates.len() * 2);
    let mut field_header = Vec::with_capacity(rates.len() * 2);
    for rate in &rates {
        rate_header.push(rate.label());
        rate_header.push(rate.label());
        field_header.push("Temperature");
        field_header.push("CTE");
    }
    wtr.write_record(&rate_header).context("writing rate header")?;
    wtr.write_record(&field_header).context("writing field header")?;

    for row in 0..dataset.rows() {
        let mut record: Vec<String> = Vec::with_capacity(rates.len() * 2);
        for rate in &rates {
            let series = &dataset.series[rate];
            if row < series.len() {
                record.push(series.x[row].to_string());
                record.push(cleaned_value(series.y[row], rate, row, results).to_string());
            } else {
                record.push(String::new());
                record.push(String::new());
            }
        }
        wtr.write_record(&record)
            .with_context(|| format!("writing row {row}"))?;
    }

    wtr.flush().context("flushing CSV")?;
    Ok(())
}

pub(crate) fn write_json<W: io::Write>(
    writer: W,
    dataset: &Dataset,
    results: &BTreeMap<HeatingRate, SmoothingResult>,
) -> Result<()> {
    let records: BTreeMap<&'static str, SeriesRecord> = dataset
        .series
        .iter()
        .map(|(rate, series)| {
            let cte = (0..series.len())
                .map(|row| cleaned_value(series.y[row], rate, row, results))
                .collect();
            (
                rate.label(),
                SeriesRecord {
                    temperature: series.x.clone(),
                    cte,
                },
            )
        })
        .collect();

    serde_json::to_writer_pretty(writer, &records).context("writing JSON")?;
    Ok(())
}

fn cleaned_value(
    raw: f64,
    rate: &HeatingRate,
    row: usize,
    results: &BTreeMap<HeatingRate, SmoothingResult>,
) -> f64 {
    results.get(rate).map_or(raw, |r| r.cleaned_y[row])
}
