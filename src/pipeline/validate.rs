use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::entity::{FieldValue, OrganizationRecord};
use crate::pipeline::rank::score_groups;

const FORMULA_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TieConflict {
    pub score: f64,
    pub ranks: Vec<u32>,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonotonicityViolation {
    pub higher_score: f64,
    pub higher_score_rank: u32,
    pub lower_score: f64,
    pub lower_score_rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileFinding {
    pub name: String,
    pub percentile: f64,
}

/// A rank or percentile that is present but not a usable number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaMismatch {
    pub name: String,
    pub rank: u32,
    pub percentile: f64,
    pub expected: f64,
}

/// Integrity findings over a stored population. Findings are data: a dirty
/// report is surfaced for inspection, never corrected in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditReport {
    pub population: usize,
    pub distinct_scores: usize,
    pub tie_groups: usize,
    pub tie_conflicts: Vec<TieConflict>,
    pub monotonicity_violations: Vec<MonotonicityViolation>,
    pub missing_rank: Vec<String>,
    pub missing_percentile: Vec<String>,
    pub malformed_rank: Vec<MalformedField>,
    pub malformed_percentile: Vec<MalformedField>,
    pub percentile_out_of_range: Vec<PercentileFinding>,
    pub formula_mismatches: Vec<FormulaMismatch>,
    pub unscored: Vec<String>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.defect_count() == 0
    }

    pub fn defect_count(&self) -> usize {
        self.tie_conflicts.len()
            + self.monotonicity_violations.len()
            + self.missing_rank.len()
            + self.missing_percentile.len()
            + self.malformed_rank.len()
            + self.malformed_percentile.len()
            + self.percentile_out_of_range.len()
            + self.formula_mismatches.len()
            + self.unscored.len()
    }
}

pub fn audit(records: &[OrganizationRecord]) -> AuditReport {
    let mut report = AuditReport {
        population: records.len(),
        ..AuditReport::default()
    };

    for record in records {
        let name = record.name();
        if record.finite_score().is_none() {
            report.unscored.push(name.to_string());
        }
        match record.rank() {
            FieldValue::Missing => report.missing_rank.push(name.to_string()),
            FieldValue::Malformed(value) => report.malformed_rank.push(MalformedField {
                name: name.to_string(),
                value,
            }),
            FieldValue::Valid(_) => {}
        }
        match record.percentile() {
            FieldValue::Missing => report.missing_percentile.push(name.to_string()),
            FieldValue::Malformed(value) => report.malformed_percentile.push(MalformedField {
                name: name.to_string(),
                value,
            }),
            FieldValue::Valid(p) if !(0.0..=100.0).contains(&p) => {
                report.percentile_out_of_range.push(PercentileFinding {
                    name: name.to_string(),
                    percentile: p,
                })
            }
            FieldValue::Valid(_) => {}
        }
    }

    check_formula(records, &mut report);
    check_score_groups(records, &mut report);
    report
}

fn check_formula(records: &[OrganizationRecord], report: &mut AuditReport) {
    let n = records.len() as f64;
    for record in records {
        let (Some(rank), Some(p)) = (record.rank().valid(), record.percentile().valid()) else {
            continue;
        };
        let expected = (n - rank as f64 + 1.0) / n * 100.0;
        if (p - expected).abs() > FORMULA_TOLERANCE {
            report.formula_mismatches.push(FormulaMismatch {
                name: record.name().to_string(),
                rank,
                percentile: p,
                expected,
            });
        }
    }
}

fn check_score_groups(records: &[OrganizationRecord], report: &mut AuditReport) {
    let groups = score_groups(records, OrganizationRecord::finite_score);
    report.distinct_scores = groups.len();
    report.tie_groups = groups.iter().filter(|g| g.members.len() > 1).count();

    // (score, min rank, max rank) per group that has any rank at all.
    let mut bounds: Vec<(f64, u32, u32)> = Vec::with_capacity(groups.len());
    for group in &groups {
        let ranks = group
            .members
            .iter()
            .filter_map(|r| r.rank().valid())
            .collect::<BTreeSet<_>>();
        if ranks.len() > 1 {
            report.tie_conflicts.push(TieConflict {
                score: group.score,
                ranks: ranks.iter().copied().collect(),
                names: group.members.iter().map(|r| r.name().to_string()).collect(),
            });
        }
        if let (Some(&lo), Some(&hi)) = (ranks.first(), ranks.last()) {
            bounds.push((group.score, lo, hi));
        }
    }

    // Adjacent groups suffice: min <= max inside a group chains the order.
    for pair in bounds.windows(2) {
        let (hi_score, _, hi_max) = pair[0];
        let (lo_score, lo_min, _) = pair[1];
        if hi_max >= lo_min {
            report.monotonicity_violations.push(MonotonicityViolation {
                higher_score: hi_score,
                higher_score_rank: hi_max,
                lower_score: lo_score,
                lower_score_rank: lo_min,
            });
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/validate.rs"]
mod tests;
