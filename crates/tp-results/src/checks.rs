//! Post-hoc checks of computed results.

use tp_core::{
    Diagnostics, LoadStage, NEGATIVE_ROUNDING_TOLERANCE, ReachId, Real, ValidationFlag, percent_of,
};

/// Flag logically impossible results of `scenario` against `baseline`:
/// negative loads, mitigated loads above the baseline (generated or
/// routed), and reductions above 100%. Deviations within the rounding
/// tolerance are ignored.
///
/// All series are aligned by position with `reaches`. Pass an empty
/// baseline to check only for negative loads.
pub fn check_against_baseline(
    scenario: &str,
    reaches: &[ReachId],
    baseline: (&[Real], &[Real]),
    mitigated: (&[Real], &[Real]),
) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let (base_generated, base_routed) = baseline;
    let (generated, routed) = mitigated;

    for (i, &reach) in reaches.iter().enumerate() {
        for (stage, series) in [(LoadStage::Generated, generated), (LoadStage::Routed, routed)] {
            if let Some(&value) = series.get(i) {
                if value < NEGATIVE_ROUNDING_TOLERANCE {
                    diags.flag(ValidationFlag::NegativeLoad {
                        reach,
                        scenario: scenario.to_string(),
                        stage,
                        value,
                    });
                }
            }
        }

        for (stage, base, mit) in [
            (LoadStage::Generated, base_generated, generated),
            (LoadStage::Routed, base_routed, routed),
        ] {
            let (Some(&b), Some(&m)) = (base.get(i), mit.get(i)) else {
                continue;
            };
            if b - m < NEGATIVE_ROUNDING_TOLERANCE {
                diags.flag(ValidationFlag::MitigatedExceedsBaseline {
                    reach,
                    scenario: scenario.to_string(),
                    stage,
                    baseline: b,
                    mitigated: m,
                });
            }
            if stage == LoadStage::Routed {
                let percent = percent_of(b - m, b);
                if percent > 100.0 - NEGATIVE_ROUNDING_TOLERANCE {
                    diags.flag(ValidationFlag::ReductionOverHundredPercent {
                        reach,
                        scenario: scenario.to_string(),
                        percent,
                    });
                }
            }
        }
    }
    diags
}
