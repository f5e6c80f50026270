use crate::pipeline::rank::RankError;

/// Share of the population an entity at `rank` matches or exceeds:
/// `(N - rank + 1) / N * 100`.
pub fn percentile(rank: u32, population: usize) -> Result<f64, RankError> {
    let r = rank as usize;
    if population == 0 || r == 0 || r > population {
        return Err(RankError::RankOutOfRange { rank, population });
    }
    Ok((population - r + 1) as f64 / population as f64 * 100.0)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/percentile.rs"]
mod tests;
