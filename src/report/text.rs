use crate::pipeline::placement::{Peer, Placement};
use crate::pipeline::validate::AuditReport;
use crate::report::{GroupSummary, SummaryData, format_fixed};

pub fn render_report_text(data: &SummaryData, decimals: usize) -> String {
    let f = |v: f64| format_fixed(v, decimals);
    let mut out = String::new();

    out.push_str("Organization Quality Ranking Report\n");
    out.push_str("===================================\n\n");

    let stats = &data.statistics;
    out.push_str("1. Population\n");
    out.push_str(&format!("Organizations ranked: {}\n", stats.population));
    out.push_str(&format!("Distinct scores: {}\n", stats.distinct_scores));
    out.push_str(&format!("Score groups with ties: {}\n", stats.tie_groups));
    out.push_str(&format!(
        "Score mean/median: {} / {}\nScore range: {} to {}\n\n",
        f(stats.mean_score),
        f(stats.median_score),
        f(stats.min_score),
        f(stats.max_score)
    ));

    out.push_str("2. Grade distribution\n");
    for g in &data.grades {
        let range = match g.max {
            Some(max) => format!("[{}, {})", f(g.min), f(max)),
            None => format!("[{}, ...)", f(g.min)),
        };
        out.push_str(&format!(
            "{:<3} {:<18} {:>6}  {}%\n",
            g.grade,
            range,
            g.count,
            f(g.share)
        ));
    }
    out.push('\n');

    out.push_str("3. Score groups\n");
    out.push_str(&format!(
        "{:<10} {:<8} {:<8} {:<12} {}\n",
        "Score", "Count", "Rank", "Percentile", "Sample"
    ));
    for g in &data.score_groups {
        out.push_str(&format!(
            "{:<10} {:<8} {:<8} {:<12} {}\n",
            f(g.score),
            g.count,
            g.rank,
            f(g.percentile),
            truncate(&g.sample, 40)
        ));
    }
    out.push('\n');

    out.push_str("4. Countries\n");
    push_groups(&mut out, &data.countries, decimals);
    out.push('\n');

    out.push_str("5. Regions\n");
    push_groups(&mut out, &data.regions, decimals);
    out.push('\n');

    out.push_str(&format!("6. Top {}\n", data.top.len()));
    for row in &data.top {
        out.push_str(&format!(
            "{}. {} ({}, {}) - score {}, percentile {}\n",
            row.rank,
            row.name,
            row.country,
            row.region,
            f(row.score),
            f(row.percentile)
        ));
    }

    out
}

pub fn render_audit_text(report: &AuditReport) -> String {
    let mut out = String::new();
    out.push_str("Ranking Integrity Audit\n");
    out.push_str("=======================\n");
    out.push_str(&format!("Organizations: {}\n", report.population));
    out.push_str(&format!("Distinct scores: {}\n", report.distinct_scores));
    out.push_str(&format!("Score groups with ties: {}\n\n", report.tie_groups));

    for c in &report.tie_conflicts {
        out.push_str(&format!(
            "TIE_CONFLICT score {} has ranks {:?}: {}\n",
            c.score,
            c.ranks,
            c.names.join(", ")
        ));
    }
    for v in &report.monotonicity_violations {
        out.push_str(&format!(
            "ORDER score {} has rank {} but lower score {} has rank {}\n",
            v.higher_score, v.higher_score_rank, v.lower_score, v.lower_score_rank
        ));
    }
    push_names(&mut out, "UNSCORED", &report.unscored);
    push_names(&mut out, "MISSING_RANK", &report.missing_rank);
    push_names(&mut out, "MISSING_PERCENTILE", &report.missing_percentile);
    for m in &report.malformed_rank {
        out.push_str(&format!("MALFORMED_RANK {} has {}\n", m.name, m.value));
    }
    for m in &report.malformed_percentile {
        out.push_str(&format!("MALFORMED_PERCENTILE {} has {}\n", m.name, m.value));
    }
    for p in &report.percentile_out_of_range {
        out.push_str(&format!(
            "PERCENTILE_RANGE {} has percentile {}\n",
            p.name, p.percentile
        ));
    }
    for m in &report.formula_mismatches {
        out.push_str(&format!(
            "PERCENTILE_FORMULA {} at rank {} has {:.6}, expected {:.6}\n",
            m.name, m.rank, m.percentile, m.expected
        ));
    }

    if report.is_clean() {
        out.push_str("Result: clean\n");
    } else {
        out.push_str(&format!("Result: {} defects\n", report.defect_count()));
    }
    out
}

pub fn render_placement_text(p: &Placement, decimals: usize) -> String {
    let f = |v: f64| format_fixed(v, decimals);
    let mut out = String::new();
    out.push_str(&format!(
        "{}: rank {} of {}, percentile {}\n",
        p.name,
        p.rank,
        p.population,
        f(p.percentile)
    ));
    if p.replaced > 0 {
        out.push_str(&format!(
            "Stored entries with this name left out: {}\n",
            p.replaced
        ));
    }

    out.push_str(&format!("\nTop {} performers\n", p.top_performers.len()));
    push_peers(&mut out, &p.top_performers, decimals);

    out.push_str(&format!(
        "\nSimilar performers ({})\n",
        p.similar_performers.len()
    ));
    push_peers(&mut out, &p.similar_performers, decimals);

    if let Some(r) = &p.regional {
        out.push_str(&format!(
            "\nRegion {}: rank {} of {}, percentile {}\n",
            r.region,
            r.rank,
            r.population,
            f(r.percentile)
        ));
        push_peers(&mut out, &r.top_in_region, decimals);
    }
    out
}

fn push_peers(out: &mut String, peers: &[Peer], decimals: usize) {
    for peer in peers {
        out.push_str(&format!(
            "{}. {} ({}) - score {}\n",
            peer.rank,
            peer.name,
            peer.region,
            format_fixed(peer.score, decimals)
        ));
    }
}

fn push_groups(out: &mut String, groups: &[GroupSummary], decimals: usize) {
    for g in groups {
        out.push_str(&format!(
            "{}: {} organizations, best rank {}, mean score {}, mean percentile {}\n",
            g.group,
            g.organizations,
            g.best_rank,
            format_fixed(g.mean_score, decimals),
            format_fixed(g.mean_percentile, decimals)
        ));
    }
}

fn push_names(out: &mut String, label: &str, names: &[String]) {
    for name in names {
        out.push_str(&format!("{label} {name}\n"));
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
