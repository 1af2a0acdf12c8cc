//! CSV input tables.
//!
//! Header names are resolved to column positions once per file. Extra
//! columns are ignored; empty cells are missing values.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tp_core::{PathwaySplit, Pathway, PerPathway, ReachAttributes, ReachId};

use crate::schema::{CoverageVariantDef, RemovalFactorDef};
use crate::{ProjectError, ProjectResult};

/// One row of the network edge table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EdgeRow {
    pub reach_id: u64,
    pub hydseq: i64,
    pub from_node: u64,
    pub to_node: u64,
}

/// Header name -> column position for one table.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    table: String,
    columns: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn from_headers(table: &str, headers: &StringRecord) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self {
            table: table.to_string(),
            columns,
        }
    }

    pub fn optional(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    pub fn require(&self, name: &str) -> ProjectResult<usize> {
        self.optional(name).ok_or_else(|| ProjectError::MissingColumn {
            table: self.table.clone(),
            column: name.to_string(),
        })
    }
}

/// Column positions of the reach table, resolved once.
struct ReachColumns {
    reach_id: usize,
    gross_load: usize,
    pre_inundation_load: Option<usize>,
    ag_percent: Option<usize>,
    clay_percent: Option<usize>,
    attenuation: Option<usize>,
    pathways: Option<PerPathway<usize>>,
    coverage: Vec<(String, Option<usize>)>,
}

impl ReachColumns {
    fn resolve(map: &ColumnMap, variants: &[CoverageVariantDef]) -> ProjectResult<Self> {
        let present: Vec<Option<usize>> = Pathway::ALL
            .iter()
            .map(|p| map.optional(p.code()))
            .collect();
        let pathways = if present.iter().all(Option::is_none) {
            None
        } else {
            let mut cols = PerPathway([0; Pathway::COUNT]);
            for p in Pathway::ALL {
                cols[p] = map.require(p.code())?;
            }
            Some(cols)
        };

        Ok(Self {
            reach_id: map.require("reach_id")?,
            gross_load: map.require("gross_load")?,
            pre_inundation_load: map.optional("pre_inundation_load"),
            ag_percent: map.optional("ag_percent"),
            clay_percent: map.optional("clay_percent"),
            attenuation: map.optional("attenuation"),
            pathways,
            coverage: variants
                .iter()
                .map(|v| (v.id.clone(), map.optional(&v.column())))
                .collect(),
        })
    }
}

struct RowCursor<'a> {
    table: &'a str,
    line: u64,
    record: &'a StringRecord,
    headers: &'a StringRecord,
}

impl RowCursor<'_> {
    fn cell(&self, col: usize) -> Option<&str> {
        self.record
            .get(col)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn invalid(&self, col: usize, value: &str) -> ProjectError {
        ProjectError::InvalidCell {
            table: self.table.to_string(),
            line: self.line,
            column: self.headers.get(col).unwrap_or("?").to_string(),
            value: value.to_string(),
        }
    }

    fn real(&self, col: Option<usize>) -> ProjectResult<Option<f64>> {
        let Some(col) = col else {
            return Ok(None);
        };
        match self.cell(col) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| self.invalid(col, raw)),
        }
    }

    fn required_real(&self, col: usize) -> ProjectResult<f64> {
        self.real(Some(col))?.ok_or_else(|| self.invalid(col, ""))
    }

    fn reach_id(&self, col: usize) -> ProjectResult<ReachId> {
        let raw = self.cell(col).unwrap_or("");
        raw.parse::<u64>()
            .map(ReachId)
            .map_err(|_| self.invalid(col, raw))
    }
}

/// Read the reach attribute table. Coverage columns are `cw_<variant id>`.
pub fn read_reaches<R: Read>(
    reader: R,
    variants: &[CoverageVariantDef],
) -> ProjectResult<Vec<ReachAttributes>> {
    const TABLE: &str = "reaches";
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let cols = ReachColumns::resolve(&ColumnMap::from_headers(TABLE, &headers), variants)?;

    let mut out = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = RowCursor {
            table: TABLE,
            line: record.position().map(|p| p.line()).unwrap_or(0),
            record: &record,
            headers: &headers,
        };

        let mut reach = ReachAttributes::new(row.reach_id(cols.reach_id)?, row.required_real(cols.gross_load)?);
        reach.pre_inundation_load = row.real(cols.pre_inundation_load)?;
        reach.ag_percent = row.real(cols.ag_percent)?;
        reach.clay_percent = row.real(cols.clay_percent)?;
        reach.attenuation = row.real(cols.attenuation)?;

        if let Some(pcols) = cols.pathways {
            let mut values = PerPathway([None; Pathway::COUNT]);
            for p in Pathway::ALL {
                values[p] = row.real(Some(pcols[p]))?;
            }
            let given = values.values().iter().filter(|v| v.is_some()).count();
            if given == Pathway::COUNT {
                reach.pathway_split = Some(PathwaySplit::from_percentages(
                    values.map(|_, v| v.unwrap_or(0.0)),
                ));
            } else if given > 0 {
                let missing = Pathway::ALL
                    .into_iter()
                    .find(|&p| values[p].is_none())
                    .unwrap_or(Pathway::SurfaceRunoff);
                return Err(row.invalid(pcols[missing], ""));
            }
        }

        for (variant, col) in &cols.coverage {
            if let Some(v) = row.real(*col)? {
                reach.coverage.insert(variant.clone(), v);
            }
        }
        out.push(reach);
    }
    Ok(out)
}

pub fn read_edges<R: Read>(reader: R) -> ProjectResult<Vec<EdgeRow>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut out = Vec::new();
    for result in rdr.deserialize() {
        let record: EdgeRow = result?;
        out.push(record);
    }
    Ok(out)
}

/// Columns: `ext_code`, `pathway`, `PartP`, `DRP`, `DOP` (percent remaining).
pub fn read_removal_factors<R: Read>(reader: R) -> ProjectResult<Vec<RemovalFactorDef>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut out = Vec::new();
    for result in rdr.deserialize() {
        let record: RemovalFactorDef = result?;
        out.push(record);
    }
    Ok(out)
}

pub fn load_reaches(path: &Path, variants: &[CoverageVariantDef]) -> ProjectResult<Vec<ReachAttributes>> {
    read_reaches(std::fs::File::open(path)?, variants)
}

pub fn load_edges(path: &Path) -> ProjectResult<Vec<EdgeRow>> {
    read_edges(std::fs::File::open(path)?)
}

pub fn load_removal_factors(path: &Path) -> ProjectResult<Vec<RemovalFactorDef>> {
    read_removal_factors(std::fs::File::open(path)?)
}
