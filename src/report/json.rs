use crate::pipeline::placement::Placement;
use crate::pipeline::validate::AuditReport;
use crate::report::SummaryData;

pub fn render_summary_json(data: &SummaryData) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(data)?;
    out.push('\n');
    Ok(out)
}

pub fn render_audit_json(report: &AuditReport) -> serde_json::Result<String> {
    #[derive(serde::Serialize)]
    struct Envelope<'a> {
        clean: bool,
        defects: usize,
        #[serde(flatten)]
        report: &'a AuditReport,
    }

    let mut out = serde_json::to_string_pretty(&Envelope {
        clean: report.is_clean(),
        defects: report.defect_count(),
        report,
    })?;
    out.push('\n');
    Ok(out)
}

pub fn render_placement_json(placement: &Placement) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(placement)?;
    out.push('\n');
    Ok(out)
}
