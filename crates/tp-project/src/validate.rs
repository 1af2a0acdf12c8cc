//! Study validation logic.

use std::collections::HashSet;

use crate::schema::{PolicyDef, RemovalFactorDef, StudyDef};

pub const LATEST_VERSION: u32 = 1;

/// Scenario ids used by the pipeline itself.
pub const RESERVED_SCENARIO_IDS: [&str; 2] = ["baseline", "pre_inundation"];

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_study(study: &StudyDef) -> Result<(), ValidationError> {
    if study.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: study.version,
        });
    }

    validate_policy(&study.policy)?;

    let s = study.fraction_splits;
    for (field, v) in [
        ("fraction_splits.PartP", s.part_p),
        ("fraction_splits.DRP", s.drp),
        ("fraction_splits.DOP", s.dop),
    ] {
        percent(field, v)?;
    }
    let total = s.part_p + s.drp + s.dop;
    if (total - 100.0).abs() > study.policy.tolerances.fraction_sum {
        return Err(invalid(
            "fraction_splits",
            total,
            "chemical fraction splits must sum to 100",
        ));
    }

    let mut variant_ids = HashSet::new();
    for variant in &study.coverage_variants {
        if variant.id.is_empty()
            || !variant
                .id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ValidationError::InvalidValue {
                field: "coverage_variants.id".to_string(),
                value: variant.id.clone(),
                reason: "ids must be non-empty and use only letters, digits, '_' or '-'".to_string(),
            });
        }
        if RESERVED_SCENARIO_IDS.contains(&variant.id.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "coverage_variants.id".to_string(),
                value: variant.id.clone(),
                reason: "id is reserved for a built-in scenario".to_string(),
            });
        }
        if !variant_ids.insert(variant.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: variant.id.clone(),
                context: "coverage_variants".to_string(),
            });
        }
    }

    validate_removal_factors(&study.removal_factors)?;

    if study.inputs.reaches.trim().is_empty() {
        return Err(invalid("inputs.reaches", "", "path must not be empty"));
    }
    if study.inputs.edges.trim().is_empty() {
        return Err(invalid("inputs.edges", "", "path must not be empty"));
    }

    Ok(())
}

fn validate_policy(policy: &PolicyDef) -> Result<(), ValidationError> {
    percent("policy.bank_erosion_percent", policy.bank_erosion_percent)?;
    percent("policy.ag_threshold_percent", policy.ag_threshold_percent)?;
    percent("policy.clay_threshold_percent", policy.clay_threshold_percent)?;

    let t = policy.coverage_thresholds;
    if !(t.low_upper > 0.0 && t.low_upper <= t.medium_upper && t.medium_upper.is_finite()) {
        return Err(invalid(
            "policy.coverage_thresholds",
            format!("{}/{}", t.low_upper, t.medium_upper),
            "expected 0 < low_upper <= medium_upper",
        ));
    }

    if !(0.0..=1.0).contains(&policy.default_attenuation) {
        return Err(invalid(
            "policy.default_attenuation",
            policy.default_attenuation,
            "must lie in [0, 1]",
        ));
    }

    let mut seen = HashSet::new();
    for b in &policy.bypass {
        if !seen.insert((b.pathway, b.fraction)) {
            return Err(ValidationError::DuplicateId {
                id: format!("{}/{}", b.pathway, b.fraction),
                context: "policy.bypass".to_string(),
            });
        }
    }

    let tol = policy.tolerances;
    if !(tol.fraction_sum >= 0.0 && tol.fraction_sum.is_finite()) {
        return Err(invalid(
            "policy.tolerances.fraction_sum",
            tol.fraction_sum,
            "must be non-negative",
        ));
    }
    if !(0.0..1.0).contains(&tol.pathway_sum) {
        return Err(invalid(
            "policy.tolerances.pathway_sum",
            tol.pathway_sum,
            "must lie in [0, 1)",
        ));
    }
    Ok(())
}

pub fn validate_removal_factors(rows: &[RemovalFactorDef]) -> Result<(), ValidationError> {
    let mut keys = HashSet::new();
    for row in rows {
        if !(1..=3).contains(&row.ext_code) {
            return Err(invalid(
                "removal_factors.ext_code",
                row.ext_code,
                "extent codes are 1 (low), 2 (medium) or 3 (high)",
            ));
        }
        if !keys.insert((row.ext_code, row.pathway)) {
            return Err(ValidationError::DuplicateId {
                id: format!("{}/{}", row.ext_code, row.pathway),
                context: "removal_factors".to_string(),
            });
        }
        for (field, v) in [
            ("removal_factors.PartP", row.part_p),
            ("removal_factors.DRP", row.drp),
            ("removal_factors.DOP", row.dop),
        ] {
            percent(field, v)?;
        }
    }
    Ok(())
}

fn percent(field: &str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, value, "must lie in 0..=100"))
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
