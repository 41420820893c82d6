//! Turn-end and game-end scoring.
//!
//! Points go to the majority owner(s) of a zone: every player tied for the
//! highest meeple count in it receives the full value.

use crate::board::Board;
use crate::game::GameState;
use crate::merger::ZoneMerger;
use crate::player::{Meeple, MeepleKey, PlacedMeeples, PlayerColor, PlayerId};
use crate::tile::ZoneType;
use crate::zones::{MergedZone, ZoneId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Points for a completed monastery (itself plus its eight neighbors)
pub const MONASTERY_POINTS: u32 = 9;

/// Points per completed city adjacent to a field at game end
pub const FIELD_POINTS_PER_CITY: u32 = 3;

/// Points credited to one player for one zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAward {
    pub player: PlayerId,
    pub points: u32,
    pub zone_type: ZoneType,
    pub zone: ZoneId,
}

/// Outcome of scoring the zones closed during a turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedZoneScoring {
    pub awards: Vec<ScoreAward>,
    /// Meeples standing in scored zones, to go back to their owners
    pub meeples_to_return: Vec<MeepleKey>,
}

/// One leaderboard line at the end of the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScoreRow {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub cities: u32,
    pub roads: u32,
    pub monasteries: u32,
    pub fields: u32,
    pub total: u32,
}

/// Players tied for the most meeples, in seat order
pub fn majority_owners(meeples: &[(MeepleKey, Meeple)]) -> Vec<PlayerId> {
    let mut counts: BTreeMap<PlayerId, usize> = BTreeMap::new();
    for (_, meeple) in meeples {
        *counts.entry(meeple.player).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    counts
        .into_iter()
        .filter(|(_, count)| *count == max && max > 0)
        .map(|(player, _)| player)
        .collect()
}

/// Credit awards to the players' totals and breakdowns
pub fn apply_awards(state: &mut GameState, awards: &[ScoreAward]) {
    for award in awards {
        if let Some(player) = state.get_player_mut(award.player) {
            player.award(award.zone_type, award.points);
        }
    }
}

/// Read-only scoring view over the board and its zones
pub struct Scorer<'a> {
    board: &'a Board,
    merger: &'a ZoneMerger,
    play_fields: bool,
}

impl<'a> Scorer<'a> {
    pub fn new(board: &'a Board, merger: &'a ZoneMerger) -> Self {
        Self {
            board,
            merger,
            play_fields: true,
        }
    }

    /// Enable or disable farmer scoring at game end
    pub fn with_fields(mut self, play_fields: bool) -> Self {
        self.play_fields = play_fields;
        self
    }

    fn award_all(zone: &MergedZone, owners: &[PlayerId], points: u32) -> Vec<ScoreAward> {
        owners
            .iter()
            .map(|&player| ScoreAward {
                player,
                points,
                zone_type: zone.zone_type,
                zone: zone.id,
            })
            .collect()
    }

    /// Score every complete zone holding meeples.
    ///
    /// Fields never complete, so farmers stay on the board.
    pub fn score_closed_zones(&self, meeples: &PlacedMeeples) -> ClosedZoneScoring {
        let mut result = ClosedZoneScoring::default();

        for zone in self.merger.registry().zones().filter(|z| z.is_complete) {
            let present = self.merger.zone_meeples(self.board, zone, meeples);
            if present.is_empty() {
                continue;
            }

            let points = match zone.zone_type {
                ZoneType::City => 2 * zone.tile_count() as u32 + 2 * zone.shields,
                ZoneType::Road => zone.tile_count() as u32,
                ZoneType::Monastery => MONASTERY_POINTS,
                ZoneType::Field => continue,
            };
            let owners = majority_owners(&present);
            debug!(zone = %zone.id, ?owners, points, "closed zone scored");

            result.awards.extend(Self::award_all(zone, &owners, points));
            result
                .meeples_to_return
                .extend(present.into_iter().map(|(key, _)| key));
        }

        result
    }

    /// Points for every unfinished zone and every farmed field at game end
    pub fn calculate_final_scores(&self, meeples: &PlacedMeeples) -> Vec<ScoreAward> {
        let registry = self.merger.registry();
        let mut awards = Vec::new();

        for zone in registry.zones() {
            if zone.zone_type == ZoneType::Field && !self.play_fields {
                continue;
            }
            if zone.is_complete {
                continue;
            }
            let present = self.merger.zone_meeples(self.board, zone, meeples);
            if present.is_empty() {
                continue;
            }

            let points = match zone.zone_type {
                ZoneType::City => zone.tile_count() as u32 + zone.shields,
                ZoneType::Road => zone.tile_count() as u32,
                ZoneType::Monastery => zone
                    .members
                    .first()
                    .map_or(1, |m| 1 + self.board.occupied_neighbor_count(m.coord()) as u32),
                ZoneType::Field => {
                    let closed = zone
                        .adjacent_cities
                        .iter()
                        .filter(|city| registry.is_city_closed(**city))
                        .count() as u32;
                    FIELD_POINTS_PER_CITY * closed
                }
            };
            if points == 0 {
                continue;
            }
            awards.extend(Self::award_all(zone, &majority_owners(&present), points));
        }

        awards
    }

    /// Apply final scoring to the players and return the leaderboard,
    /// highest total first.
    pub fn apply_and_get_final_scores(
        &self,
        meeples: &PlacedMeeples,
        state: &mut GameState,
    ) -> Vec<FinalScoreRow> {
        let awards = self.calculate_final_scores(meeples);
        apply_awards(state, &awards);
        info!(awards = awards.len(), "final scores applied");
        final_rows(state)
    }
}

/// Leaderboard built from the players' current totals, highest first
pub fn final_rows(state: &GameState) -> Vec<FinalScoreRow> {
    let mut rows: Vec<FinalScoreRow> = state
        .players
        .iter()
        .map(|p| FinalScoreRow {
            id: p.id,
            name: p.name.clone(),
            color: p.color,
            cities: p.score_detail.cities,
            roads: p.score_detail.roads,
            monasteries: p.score_detail.monasteries,
            fields: p.score_detail.fields,
            total: p.score,
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}
