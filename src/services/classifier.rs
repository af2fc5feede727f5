//! Maps a finished match to the notification tier of the tracked roster.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::pubg::{MatchDetail, Participant, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeTier {
    Win,
    Podium,
    Last,
    None,
}

impl OutcomeTier {
    pub fn is_notifiable(self) -> bool {
        !matches!(self, OutcomeTier::None)
    }
}

/// `Last` only applies past the podium so a three-team lobby is never both.
pub fn tier_for(rank: u32, team_count: usize) -> OutcomeTier {
    match rank {
        1 => OutcomeTier::Win,
        2 | 3 => OutcomeTier::Podium,
        r if r as usize == team_count => OutcomeTier::Last,
        _ => OutcomeTier::None,
    }
}

pub fn is_allowed_match_type(detail: &MatchDetail, allowed: &[String]) -> bool {
    allowed.iter().any(|t| t == &detail.match_type_id)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub tier: OutcomeTier,
    pub rank: u32,
    pub team_count: usize,
    /// Tracked players of the roster, most kills first.
    pub tracked: Vec<Participant>,
    /// Roster-mates outside the tracked roster. Counted, never named.
    pub untracked_mates: usize,
}

/// Finds the roster holding the tracked players and grades its placement.
///
/// Rosters partition the participants, so the first roster containing a
/// tracked account is the only one.
pub fn classify(
    detail: &MatchDetail,
    tracked_accounts: &HashSet<String>,
) -> Result<Classification, ValidationError> {
    let is_tracked = |p: &Participant| tracked_accounts.contains(&p.player_id);

    let roster = detail
        .rosters
        .iter()
        .find(|roster| {
            roster
                .participant_ids
                .iter()
                .filter_map(|id| detail.participant(id))
                .any(is_tracked)
        })
        .ok_or_else(|| ValidationError::NoTrackedRoster(detail.id.clone()))?;

    let members: Vec<&Participant> = roster
        .participant_ids
        .iter()
        .filter_map(|id| detail.participant(id))
        .collect();

    let mut tracked: Vec<Participant> = members
        .iter()
        .filter(|p| is_tracked(*p))
        .map(|p| (*p).clone())
        .collect();
    tracked.sort_by(|a, b| b.kills.cmp(&a.kills).then_with(|| a.name.cmp(&b.name)));

    let team_count = detail.rosters.len();

    Ok(Classification {
        tier: tier_for(roster.rank, team_count),
        rank: roster.rank,
        team_count,
        untracked_mates: members.len() - tracked.len(),
        tracked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pubg::Roster;

    fn participant(id: &str, account: &str, kills: u32) -> Participant {
        Participant {
            id: id.to_string(),
            player_id: account.to_string(),
            name: account.trim_start_matches("account.").to_string(),
            shard_id: "steam".to_string(),
            kills,
            assists: 0,
            damage_dealt: 100.0,
        }
    }

    /// `teams` rosters of one player each, the tracked squad (alice, bob and
    /// one stranger) finishing at `rank`.
    fn lobby(rank: u32, teams: u32) -> MatchDetail {
        let mut rosters = Vec::new();
        let mut participants = vec![
            participant("p-alice", "account.alice", 2),
            participant("p-bob", "account.bob", 5),
            participant("p-stranger", "account.stranger", 9),
        ];
        rosters.push(Roster {
            id: "r-tracked".into(),
            rank,
            participant_ids: vec!["p-alice".into(), "p-bob".into(), "p-stranger".into()],
        });
        for r in (1..=teams).filter(|r| *r != rank) {
            let id = format!("p-{r}");
            participants.push(participant(&id, &format!("account.other{r}"), 1));
            rosters.push(Roster {
                id: format!("r-{r}"),
                rank: r,
                participant_ids: vec![id],
            });
        }
        rosters.sort_by_key(|r| r.rank);

        MatchDetail {
            id: "m-1".into(),
            map_id: "Baltic_Main".into(),
            game_mode_id: "squad-fpp".into(),
            match_type_id: "official".into(),
            duration_seconds: 1800,
            created_at: None,
            rosters,
            participants,
        }
    }

    fn tracked() -> HashSet<String> {
        ["account.alice", "account.bob"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn tiers_by_rank_in_ten_team_lobby() {
        assert_eq!(tier_for(1, 10), OutcomeTier::Win);
        assert_eq!(tier_for(2, 10), OutcomeTier::Podium);
        assert_eq!(tier_for(3, 10), OutcomeTier::Podium);
        assert_eq!(tier_for(10, 10), OutcomeTier::Last);
        assert_eq!(tier_for(5, 10), OutcomeTier::None);
    }

    #[test]
    fn small_lobby_last_place_stays_podium() {
        assert_eq!(tier_for(3, 3), OutcomeTier::Podium);
        assert_eq!(tier_for(2, 2), OutcomeTier::Podium);
        assert_eq!(tier_for(4, 4), OutcomeTier::Last);
    }

    #[test]
    fn classifies_tracked_roster() {
        let detail = lobby(10, 10);

        let classification = classify(&detail, &tracked()).unwrap();

        assert_eq!(classification.tier, OutcomeTier::Last);
        assert_eq!(classification.rank, 10);
        assert_eq!(classification.team_count, 10);
        assert_eq!(classification.untracked_mates, 1);
        let names: Vec<_> = classification.tracked.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "alice"]);
    }

    #[test]
    fn win_and_middle_of_pack() {
        assert_eq!(classify(&lobby(1, 10), &tracked()).unwrap().tier, OutcomeTier::Win);
        assert_eq!(classify(&lobby(5, 10), &tracked()).unwrap().tier, OutcomeTier::None);
    }

    #[test]
    fn no_tracked_roster_is_a_validation_error() {
        let detail = lobby(1, 4);
        let nobody: HashSet<String> = ["account.carol".to_string()].into_iter().collect();

        assert_eq!(
            classify(&detail, &nobody),
            Err(ValidationError::NoTrackedRoster("m-1".into()))
        );
    }

    #[test]
    fn allow_list_filters_match_types() {
        let mut detail = lobby(1, 4);
        let allowed = vec!["official".to_string(), "competitive".to_string()];
        assert!(is_allowed_match_type(&detail, &allowed));

        detail.match_type_id = "custom".into();
        assert!(!is_allowed_match_type(&detail, &allowed));
    }
}
