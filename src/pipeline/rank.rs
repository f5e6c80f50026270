use thiserror::Error;

use crate::model::entity::{RankedPosition, ScoredEntity};
use crate::pipeline::percentile::percentile;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RankError {
    #[error("entity {index} ({name:?}) has a non-finite score: {score}")]
    NonFiniteScore {
        index: usize,
        name: String,
        score: f64,
    },
    #[error("entity {index} ({name:?}) has no total_score")]
    MissingScore { index: usize, name: String },
    #[error("entity {index} ({name:?}) has a non-numeric total_score: {value}")]
    NonNumericScore {
        index: usize,
        name: String,
        value: String,
    },
    #[error("rank {rank} is outside 1..={population}")]
    RankOutOfRange { rank: u32, population: usize },
}

/// Competition ranks in input order: each rank is the number of scores
/// strictly greater than its own, plus one. Scores must be finite.
pub fn competition_ranks(scores: &[f64]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut ranks = vec![0u32; scores.len()];
    let mut strictly_greater = 0usize;
    let mut prev: Option<f64> = None;
    for (pos, &idx) in order.iter().enumerate() {
        let score = scores[idx];
        // -0.0 and 0.0 sort apart under total_cmp but compare equal here.
        if prev.is_some_and(|p| score < p) {
            strictly_greater = pos;
        }
        ranks[idx] = (strictly_greater + 1) as u32;
        prev = Some(score);
    }
    ranks
}

/// Rank and percentile for every entity, in input order. The batch is
/// rejected if any score is not finite.
pub fn rank_positions(entities: &[ScoredEntity]) -> Result<Vec<RankedPosition>, RankError> {
    if let Some((index, entity)) = entities
        .iter()
        .enumerate()
        .find(|(_, e)| !e.score.is_finite())
    {
        return Err(RankError::NonFiniteScore {
            index,
            name: entity.name.clone(),
            score: entity.score,
        });
    }

    let scores = entities.iter().map(|e| e.score).collect::<Vec<_>>();
    let n = scores.len();
    competition_ranks(&scores)
        .into_iter()
        .map(|rank| {
            Ok(RankedPosition {
                rank,
                percentile: percentile(rank, n)?,
            })
        })
        .collect()
}

pub fn rank_entities(entities: &mut [ScoredEntity]) -> Result<(), RankError> {
    let positions = rank_positions(entities)?;
    for (entity, pos) in entities.iter_mut().zip(positions) {
        entity.rank = Some(pos.rank);
        entity.percentile = Some(pos.percentile);
    }
    Ok(())
}

/// Position `candidate` would take inside `population`. The candidate joins
/// the population before anything is counted, so ties and neighbours resolve
/// exactly as a full re-rank would.
pub fn place_candidate(
    population: &[ScoredEntity],
    candidate: ScoredEntity,
) -> Result<RankedPosition, RankError> {
    let mut all = Vec::with_capacity(population.len() + 1);
    all.extend_from_slice(population);
    all.push(candidate);
    let positions = rank_positions(&all)?;
    Ok(positions[population.len()])
}

#[derive(Debug, Clone)]
pub struct ScoreGroup<'a, T> {
    pub score: f64,
    pub members: Vec<&'a T>,
}

/// Groups items with equal score, highest score first. Items for which
/// `score_of` returns `None` are skipped.
pub fn score_groups<'a, T, F>(items: &'a [T], score_of: F) -> Vec<ScoreGroup<'a, T>>
where
    F: Fn(&T) -> Option<f64>,
{
    let mut scored = items
        .iter()
        .filter_map(|item| score_of(item).map(|s| (s, item)))
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut groups: Vec<ScoreGroup<'a, T>> = Vec::new();
    for (score, item) in scored {
        match groups.last_mut() {
            Some(group) if group.score == score => group.members.push(item),
            _ => groups.push(ScoreGroup {
                score,
                members: vec![item],
            }),
        }
    }
    groups
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/rank.rs"]
mod tests;
