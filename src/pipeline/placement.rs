use serde::Serialize;

use crate::input::scored_entity;
use crate::model::entity::{OrganizationRecord, RankedPosition, ScoredEntity, UNKNOWN};
use crate::model::profile::PlacementProfile;
use crate::pipeline::rank::{RankError, place_candidate, rank_positions};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peer {
    pub rank: u32,
    pub name: String,
    pub score: f64,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalPlacement {
    pub region: String,
    pub rank: u32,
    pub percentile: f64,
    /// Peers in the region plus the candidate.
    pub population: usize,
    pub top_in_region: Vec<Peer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub name: String,
    pub score: f64,
    pub rank: u32,
    pub percentile: f64,
    /// Peers plus the candidate.
    pub population: usize,
    /// Stored records with the candidate's name, left out of the peers.
    pub replaced: usize,
    pub top_performers: Vec<Peer>,
    pub similar_performers: Vec<Peer>,
    pub regional: Option<RegionalPlacement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRequest {
    pub name: String,
    pub score: f64,
    /// Overrides the region of the stored record with the same name.
    pub region: Option<String>,
}

/// Places a candidate among the stored records. Records whose name matches
/// the candidate's (trimmed, case-insensitive) are the candidate's own earlier
/// entries and are dropped before ranking, so it never competes with itself.
pub fn place_organization(
    records: &[OrganizationRecord],
    request: &PlacementRequest,
    profile: &PlacementProfile,
) -> Result<Placement, RankError> {
    let key = name_key(&request.name);
    let mut peers: Vec<(ScoredEntity, &OrganizationRecord)> = Vec::with_capacity(records.len());
    let mut own: Vec<&OrganizationRecord> = Vec::new();
    for (index, record) in records.iter().enumerate() {
        if name_key(record.name()) == key {
            own.push(record);
        } else {
            peers.push((scored_entity(index, record)?, record));
        }
    }

    let candidate = ScoredEntity::new(request.name.clone(), request.score);
    let entities = peers.iter().map(|(e, _)| e.clone()).collect::<Vec<_>>();
    let position = place_candidate(&entities, candidate.clone())?;

    // Peer ranks inside the same joined population the candidate was placed in.
    let mut joined = entities.clone();
    joined.push(candidate.clone());
    let positions = rank_positions(&joined)?;
    let ranked = ranked_peers(&peers, &positions);

    let similar_performers = ranked
        .iter()
        .filter(|p| (p.score - request.score).abs() <= profile.similar_window)
        .take(profile.similar_limit)
        .cloned()
        .collect();

    let region = request
        .region
        .clone()
        .or_else(|| own.first().map(|r| r.region().unwrap_or(UNKNOWN).to_string()));
    let regional = match region {
        Some(region) => Some(regional_placement(&peers, region, candidate, profile)?),
        None => None,
    };

    tracing::debug!(
        name = %request.name,
        peers = peers.len(),
        replaced = own.len(),
        rank = position.rank,
        "candidate placed"
    );
    Ok(Placement {
        name: request.name.clone(),
        score: request.score,
        rank: position.rank,
        percentile: position.percentile,
        population: peers.len() + 1,
        replaced: own.len(),
        top_performers: ranked.iter().take(profile.top_performers).cloned().collect(),
        similar_performers,
        regional,
    })
}

fn regional_placement(
    peers: &[(ScoredEntity, &OrganizationRecord)],
    region: String,
    candidate: ScoredEntity,
    profile: &PlacementProfile,
) -> Result<RegionalPlacement, RankError> {
    let local = peers
        .iter()
        .filter(|(_, r)| r.region().unwrap_or(UNKNOWN) == region)
        .map(|(e, r)| (e.clone(), *r))
        .collect::<Vec<_>>();
    let entities = local.iter().map(|(e, _)| e.clone()).collect::<Vec<_>>();
    let RankedPosition { rank, percentile } = place_candidate(&entities, candidate.clone())?;

    let mut joined = entities;
    joined.push(candidate);
    let positions = rank_positions(&joined)?;
    let top_in_region = ranked_peers(&local, &positions)
        .into_iter()
        .take(profile.regional_top)
        .collect();

    Ok(RegionalPlacement {
        region,
        rank,
        percentile,
        population: local.len() + 1,
        top_in_region,
    })
}

/// Peers with their ranks, best first; ties ordered by name.
fn ranked_peers(
    peers: &[(ScoredEntity, &OrganizationRecord)],
    positions: &[RankedPosition],
) -> Vec<Peer> {
    let mut out = peers
        .iter()
        .zip(positions)
        .map(|((entity, record), pos)| Peer {
            rank: pos.rank,
            name: entity.name.clone(),
            score: entity.score,
            region: record.region().unwrap_or(UNKNOWN).to_string(),
        })
        .collect::<Vec<_>>();
    out.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.name.cmp(&b.name)));
    out
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/placement.rs"]
mod tests;
