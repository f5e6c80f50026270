use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::input::Database;
use crate::model::entity::UNKNOWN;
use crate::model::profile::ReportProfile;
use crate::pipeline::rank::score_groups;

pub mod json;
pub mod text;
pub mod tsv;

/// One ranked organization as it appears in reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    pub rank: u32,
    pub name: String,
    pub country: String,
    pub region: String,
    pub hospital_type: String,
    pub score: f64,
    pub percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationStats {
    pub population: usize,
    pub distinct_scores: usize,
    pub tie_groups: usize,
    pub mean_score: f64,
    pub median_score: f64,
    pub max_score: f64,
    pub min_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeCount {
    pub grade: &'static str,
    pub min: f64,
    pub max: Option<f64>,
    pub count: usize,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreGroupRow {
    pub score: f64,
    pub count: usize,
    pub rank: u32,
    pub percentile: f64,
    pub sample: String,
}

/// Aggregates for the rows sharing one country or one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub organizations: usize,
    pub best_rank: u32,
    pub mean_rank: f64,
    pub mean_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    pub mean_percentile: f64,
    pub max_percentile: f64,
    pub min_percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryData {
    pub tool: ToolMeta,
    pub statistics: PopulationStats,
    pub grades: Vec<GradeCount>,
    pub score_groups: Vec<ScoreGroupRow>,
    pub countries: Vec<GroupSummary>,
    pub regions: Vec<GroupSummary>,
    pub top: Vec<RankedRow>,
}

/// Rows for every record carrying a finite score, rank and percentile,
/// ordered by rank then name.
pub fn ranked_rows(db: &Database) -> Vec<RankedRow> {
    let mut rows = db
        .organizations
        .iter()
        .filter_map(|record| {
            Some(RankedRow {
                rank: record.rank().valid()?,
                name: record.name().to_string(),
                country: record.country().unwrap_or(UNKNOWN).to_string(),
                region: record.region().unwrap_or(UNKNOWN).to_string(),
                hospital_type: record.hospital_type().unwrap_or(UNKNOWN).to_string(),
                score: record.finite_score()?,
                percentile: record.percentile().valid()?,
            })
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.name.cmp(&b.name)));
    rows
}

pub fn build_summary(rows: &[RankedRow], profile: &ReportProfile) -> SummaryData {
    SummaryData {
        tool: ToolMeta {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        statistics: population_stats(rows),
        grades: grade_distribution(rows, profile),
        score_groups: score_group_rows(rows),
        countries: country_summaries(rows),
        regions: region_summaries(rows),
        top: rows.iter().take(profile.top_n).cloned().collect(),
    }
}

pub fn population_stats(rows: &[RankedRow]) -> PopulationStats {
    let scores = rows.iter().map(|r| r.score).collect::<Vec<_>>();
    let groups = score_groups(rows, |r| Some(r.score));
    PopulationStats {
        population: rows.len(),
        distinct_scores: groups.len(),
        tie_groups: groups.iter().filter(|g| g.members.len() > 1).count(),
        mean_score: mean(&scores),
        median_score: median(&scores),
        max_score: scores.iter().copied().reduce(f64::max).unwrap_or(0.0),
        min_score: scores.iter().copied().reduce(f64::min).unwrap_or(0.0),
    }
}

pub fn grade_distribution(rows: &[RankedRow], profile: &ReportProfile) -> Vec<GradeCount> {
    let mut counts = vec![0usize; profile.grades.len()];
    for row in rows {
        if let Some(slot) = counts.get_mut(profile.grade_index(row.score)) {
            *slot += 1;
        }
    }
    profile
        .grades
        .iter()
        .enumerate()
        .map(|(idx, band)| GradeCount {
            grade: band.label,
            min: band.min,
            max: profile.grade_upper(idx),
            count: counts[idx],
            share: fraction(counts[idx], rows.len()) * 100.0,
        })
        .collect()
}

pub fn score_group_rows(rows: &[RankedRow]) -> Vec<ScoreGroupRow> {
    score_groups(rows, |r| Some(r.score))
        .into_iter()
        .filter_map(|group| {
            let first = group.members.first()?;
            Some(ScoreGroupRow {
                score: group.score,
                count: group.members.len(),
                rank: first.rank,
                percentile: first.percentile,
                sample: first.name.clone(),
            })
        })
        .collect()
}

pub fn country_summaries(rows: &[RankedRow]) -> Vec<GroupSummary> {
    group_summaries(rows, |r| r.country.as_str())
}

pub fn region_summaries(rows: &[RankedRow]) -> Vec<GroupSummary> {
    group_summaries(rows, |r| r.region.as_str())
}

/// Groups rows by `key`, ordered by best rank then group name.
fn group_summaries<'a, F>(rows: &'a [RankedRow], key: F) -> Vec<GroupSummary>
where
    F: Fn(&'a RankedRow) -> &'a str,
{
    let mut by_group: BTreeMap<&str, Vec<&RankedRow>> = BTreeMap::new();
    for row in rows {
        by_group.entry(key(row)).or_default().push(row);
    }

    let mut out = by_group
        .into_iter()
        .map(|(group, members)| {
            let ranks = members.iter().map(|r| r.rank as f64).collect::<Vec<_>>();
            let scores = members.iter().map(|r| r.score).collect::<Vec<_>>();
            let pcts = members.iter().map(|r| r.percentile).collect::<Vec<_>>();
            GroupSummary {
                group: group.to_string(),
                organizations: members.len(),
                best_rank: members.iter().map(|r| r.rank).min().unwrap_or(0),
                mean_rank: mean(&ranks),
                mean_score: mean(&scores),
                max_score: scores.iter().copied().reduce(f64::max).unwrap_or(0.0),
                min_score: scores.iter().copied().reduce(f64::min).unwrap_or(0.0),
                mean_percentile: mean(&pcts),
                max_percentile: pcts.iter().copied().reduce(f64::max).unwrap_or(0.0),
                min_percentile: pcts.iter().copied().reduce(f64::min).unwrap_or(0.0),
            }
        })
        .collect::<Vec<_>>();
    out.sort_by(|a, b| {
        a.best_rank
            .cmp(&b.best_rank)
            .then_with(|| a.group.cmp(&b.group))
    });
    out
}

/// Writes `rankings.tsv`, `summary.json` and `report.txt` into `out_dir`.
pub fn write_reports(
    rows: &[RankedRow],
    summary: &SummaryData,
    profile: &ReportProfile,
    out_dir: &Path,
) -> std::io::Result<()> {
    fs::create_dir_all(out_dir)?;

    tsv::write_rankings_tsv(rows, profile.decimals, &out_dir.join("rankings.tsv"))?;

    let json = json::render_summary_json(summary)?;
    write_text(&out_dir.join("summary.json"), &json)?;

    let report = text::render_report_text(summary, profile.decimals);
    write_text(&out_dir.join("report.txt"), &report)?;

    tracing::info!(out_dir = %out_dir.display(), rows = rows.len(), "reports written");
    Ok(())
}

fn write_text(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(contents.as_bytes())?;
    w.flush()
}

pub fn format_fixed(v: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, v)
}

/// Middle value, or the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
