//! PUBG API payloads (JSON:API documents) and the match model built from them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type MatchId = String;

// ---------------------------------------------------------------------------
// JSON:API envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub data: T,
    #[serde(default)]
    pub included: Vec<Resource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub attributes: Value,
    #[serde(default)]
    pub relationships: HashMap<String, Relationship>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Linkage,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    Many(Vec<ResourceRef>),
    One(ResourceRef),
    #[default]
    Empty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl Resource {
    /// Ids linked under `relationship`, in document order.
    pub fn related_ids(&self, relationship: &str) -> Vec<String> {
        match self.relationships.get(relationship).map(|r| &r.data) {
            Some(Linkage::Many(refs)) => refs.iter().map(|r| r.id.clone()).collect(),
            Some(Linkage::One(r)) => vec![r.id.clone()],
            Some(Linkage::Empty) | None => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorDocument {
    pub errors: Vec<ErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorObject {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorObject {
    pub fn message(&self) -> String {
        self.detail
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

// ---------------------------------------------------------------------------
// Domain model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedPlayer {
    pub account_id: String,
    pub name: String,
}

/// Result of listing the roster's recent matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterMatches {
    pub players: Vec<TrackedPlayer>,
    /// De-duplicated, in the order the API listed them.
    pub match_ids: Vec<MatchId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchDetail {
    pub id: MatchId,
    pub map_id: String,
    pub game_mode_id: String,
    pub match_type_id: String,
    pub duration_seconds: u64,
    pub created_at: Option<DateTime<Utc>>,
    /// Sorted by ascending rank.
    pub rosters: Vec<Roster>,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roster {
    pub id: String,
    pub rank: u32,
    pub participant_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub id: String,
    pub player_id: String,
    pub name: String,
    pub shard_id: String,
    pub kills: u32,
    pub assists: u32,
    pub damage_dealt: f64,
}

impl MatchDetail {
    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("match {match_id}: malformed {kind} `{id}`: {reason}")]
    Malformed {
        match_id: MatchId,
        kind: &'static str,
        id: String,
        reason: String,
    },
    #[error("match {match_id}: roster `{roster_id}` references unknown participant `{participant_id}`")]
    UnknownParticipant {
        match_id: MatchId,
        roster_id: String,
        participant_id: String,
    },
    #[error("match {0}: no roster contains a tracked player")]
    NoTrackedRoster(MatchId),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchAttributes {
    map_name: String,
    game_mode: String,
    #[serde(default)]
    match_type: String,
    duration: u64,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RosterAttributes {
    stats: RosterStats,
}

#[derive(Debug, Deserialize)]
struct RosterStats {
    rank: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantAttributes {
    #[serde(default)]
    shard_id: String,
    stats: ParticipantStats,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantStats {
    name: String,
    player_id: String,
    #[serde(default)]
    kills: u32,
    #[serde(default)]
    assists: u32,
    #[serde(default)]
    damage_dealt: f64,
}

fn attributes<T: for<'de> Deserialize<'de>>(
    match_id: &str,
    resource: &Resource,
    kind: &'static str,
) -> Result<T, ValidationError> {
    serde_json::from_value(resource.attributes.clone()).map_err(|e| ValidationError::Malformed {
        match_id: match_id.to_string(),
        kind,
        id: resource.id.clone(),
        reason: e.to_string(),
    })
}

impl TryFrom<Document<Resource>> for MatchDetail {
    type Error = ValidationError;

    fn try_from(document: Document<Resource>) -> Result<Self, Self::Error> {
        let data = document.data;
        if data.kind != "match" {
            return Err(ValidationError::Malformed {
                match_id: data.id.clone(),
                kind: "document",
                id: data.id.clone(),
                reason: format!("expected a match resource, got `{}`", data.kind),
            });
        }

        let match_id = data.id.clone();
        let meta: MatchAttributes = attributes(&match_id, &data, "match")?;

        let mut rosters = Vec::new();
        let mut participants = Vec::new();
        for resource in &document.included {
            match resource.kind.as_str() {
                "roster" => {
                    let attrs: RosterAttributes = attributes(&match_id, resource, "roster")?;
                    rosters.push(Roster {
                        id: resource.id.clone(),
                        rank: attrs.stats.rank,
                        participant_ids: resource.related_ids("participants"),
                    });
                }
                "participant" => {
                    let attrs: ParticipantAttributes =
                        attributes(&match_id, resource, "participant")?;
                    participants.push(Participant {
                        id: resource.id.clone(),
                        player_id: attrs.stats.player_id,
                        name: attrs.stats.name,
                        shard_id: attrs.shard_id,
                        kills: attrs.stats.kills,
                        assists: attrs.stats.assists,
                        damage_dealt: attrs.stats.damage_dealt,
                    });
                }
                _ => {}
            }
        }

        for roster in &rosters {
            if let Some(missing) = roster
                .participant_ids
                .iter()
                .find(|id| !participants.iter().any(|p| &p.id == *id))
            {
                return Err(ValidationError::UnknownParticipant {
                    match_id,
                    roster_id: roster.id.clone(),
                    participant_id: missing.clone(),
                });
            }
        }

        rosters.sort_by_key(|r| r.rank);

        Ok(MatchDetail {
            id: match_id,
            map_id: meta.map_name,
            game_mode_id: meta.game_mode,
            match_type_id: meta.match_type,
            duration_seconds: meta.duration,
            created_at: meta.created_at,
            rosters,
            participants,
        })
    }
}
