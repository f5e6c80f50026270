use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::report::{RankedRow, format_fixed};

const HEADER: [&str; 7] = [
    "rank",
    "name",
    "country",
    "region",
    "hospital_type",
    "total_score",
    "percentile",
];

pub fn write_rankings_tsv(rows: &[RankedRow], decimals: usize, path: &Path) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    render_rankings_tsv(rows, decimals, &mut w)?;
    w.flush()
}

pub fn render_rankings_tsv<W: Write>(rows: &[RankedRow], decimals: usize, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "{}", HEADER.join("\t"))?;
    for row in rows {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.rank,
            clean_field(&row.name),
            clean_field(&row.country),
            clean_field(&row.region),
            clean_field(&row.hospital_type),
            format_fixed(row.score, decimals),
            format_fixed(row.percentile, decimals)
        )?;
    }
    Ok(())
}

fn clean_field(s: &str) -> String {
    s.chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}
