//! Wide CSV export of per-reach records.

use std::io::Write;

use tp_core::Pathway;

use crate::ResultsResult;
use crate::types::ReachScenarioRecord;

const FIXED_COLUMNS: [&str; 14] = [
    "reach_id",
    "scenario",
    "hydseq",
    "has_attributes",
    "gross_load",
    "available_load",
    "ag_filter_applied",
    "generated_load",
    "routed_load",
    "coverage_percent",
    "coverage_category",
    "ext_code",
    "applied_removal_fraction",
    "clay_override",
];

const REDUCTION_COLUMNS: [&str; 5] = [
    "reference",
    "generated_reduction",
    "generated_reduction_percent",
    "routed_reduction",
    "routed_reduction_percent",
];

fn header() -> Vec<String> {
    let mut h: Vec<String> = FIXED_COLUMNS.iter().map(|s| s.to_string()).collect();
    h.push("bank_erosion_load".to_string());
    for p in Pathway::ALL {
        for part in ["input", "removed", "remaining"] {
            h.push(format!("{}_{}", p.code(), part));
        }
    }
    h.extend(REDUCTION_COLUMNS.iter().map(|s| s.to_string()));
    h
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// Write records, optionally restricted to one scenario. Returns the
/// number of rows written.
pub fn write_records_csv<W: Write>(
    writer: W,
    records: &[ReachScenarioRecord],
    scenario: Option<&str>,
) -> ResultsResult<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header())?;

    let mut rows = 0;
    for r in records
        .iter()
        .filter(|r| scenario.is_none_or(|s| r.scenario == s))
    {
        let mut row = vec![
            r.reach_id.to_string(),
            r.scenario.clone(),
            r.hydseq.to_string(),
            r.has_attributes.to_string(),
            r.gross_load.to_string(),
            r.available_load.to_string(),
            r.ag_filter_applied.to_string(),
            r.generated_load.to_string(),
            r.routed_load.to_string(),
            opt(r.coverage_percent),
            opt(r.coverage_category),
            opt(r.ext_code()),
            r.applied_removal_fraction.to_string(),
            r.clay_override.to_string(),
            r.bank_erosion_load.to_string(),
        ];
        for p in Pathway::ALL {
            match r.pathways.iter().find(|pr| pr.pathway == p) {
                Some(pr) => {
                    row.push(pr.input.to_string());
                    row.push(pr.removed.to_string());
                    row.push(pr.remaining.to_string());
                }
                None => row.extend([String::new(), String::new(), String::new()]),
            }
        }
        match &r.reduction {
            Some(red) => row.extend([
                red.reference.clone(),
                red.generated_absolute.to_string(),
                red.generated_percent.to_string(),
                red.routed_absolute.to_string(),
                red.routed_percent.to_string(),
            ]),
            None => row.extend((0..REDUCTION_COLUMNS.len()).map(|_| String::new())),
        }
        wtr.write_record(&row)?;
        rows += 1;
    }
    wtr.flush()?;
    Ok(rows)
}
