use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::pubg::{MatchDetail, MatchId};
use crate::services::classifier::{Classification, OutcomeTier};

const EMBED_COLOR: u32 = 0xf56b3d;

const WIN_SENTENCES: &[&str] = &[
    "{players} just took the chicken dinner!",
    "Winner winner, chicken dinner for {players}.",
    "{players} outlasted everyone. Nobody left to shoot.",
];

const PODIUM_SENTENCES: &[&str] = &[
    "{players} made it to the podium.",
    "So close: {players} finished in the top three.",
    "{players} ran out of circle, not out of skill.",
];

const LAST_SENTENCES: &[&str] = &[
    "{players} left the plane and the match at the same time.",
    "Dead last. {players} will want to forget this one.",
    "{players} found the only loot they needed: a quick exit.",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Announcement {
    pub match_id: MatchId,
    pub tier: OutcomeTier,
    pub title: String,
    pub sentence: String,
    pub map_name: String,
    pub game_mode: String,
    pub match_type: String,
    pub duration_minutes: u64,
    pub rank: u32,
    pub team_count: usize,
    pub stat_lines: Vec<String>,
    pub untracked_mates: usize,
}

fn sentences(tier: OutcomeTier) -> &'static [&'static str] {
    match tier {
        OutcomeTier::Win => WIN_SENTENCES,
        OutcomeTier::Podium => PODIUM_SENTENCES,
        OutcomeTier::Last => LAST_SENTENCES,
        OutcomeTier::None => &[],
    }
}

fn title(tier: OutcomeTier, rank: u32, team_count: usize) -> String {
    match tier {
        OutcomeTier::Win => "🏆 Chicken dinner".to_string(),
        OutcomeTier::Podium => format!("🥈 Top {} of {}", rank, team_count),
        OutcomeTier::Last => format!("💀 Last of {}", team_count),
        OutcomeTier::None => format!("#{} of {}", rank, team_count),
    }
}

pub fn map_name(map_id: &str) -> String {
    match map_id {
        "Baltic_Main" => "Erangel",
        "Erangel_Main" => "Erangel (classic)",
        "Desert_Main" => "Miramar",
        "Savage_Main" => "Sanhok",
        "DihorOtok_Main" => "Vikendi",
        "Summerland_Main" => "Karakin",
        "Chimera_Main" => "Paramo",
        "Heaven_Main" => "Haven",
        "Tiger_Main" => "Taego",
        "Kiki_Main" => "Deston",
        "Neon_Main" => "Rondo",
        "Range_Main" => "Camp Jackal",
        other => other,
    }
    .to_string()
}

/// `squad-fpp` → `Squad FPP`.
pub fn game_mode_name(game_mode_id: &str) -> String {
    game_mode_id
        .split('-')
        .map(|part| match part {
            "fpp" | "tpp" => part.to_uppercase(),
            _ => {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn match_type_name(match_type_id: &str) -> String {
    match match_type_id {
        "official" => "Normal",
        "competitive" => "Ranked",
        "custom" => "Custom",
        "event" => "Event",
        "arcade" => "Arcade",
        "training" => "Training",
        other => other,
    }
    .to_string()
}

fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

pub fn build_announcement<R: Rng + ?Sized>(
    detail: &MatchDetail,
    classification: &Classification,
    rng: &mut R,
) -> Announcement {
    let names: Vec<&str> = classification
        .tracked
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    let players = join_names(&names);

    let sentence = sentences(classification.tier)
        .choose(rng)
        .map(|s| s.replace("{players}", &players))
        .unwrap_or_default();

    let stat_lines = classification
        .tracked
        .iter()
        .map(|p| {
            format!(
                "**{}**: {} kill(s), {} assist(s), {} damage",
                p.name,
                p.kills,
                p.assists,
                p.damage_dealt.round() as u64
            )
        })
        .collect();

    Announcement {
        match_id: detail.id.clone(),
        tier: classification.tier,
        title: title(classification.tier, classification.rank, classification.team_count),
        sentence,
        map_name: map_name(&detail.map_id),
        game_mode: game_mode_name(&detail.game_mode_id),
        match_type: match_type_name(&detail.match_type_id),
        duration_minutes: detail.duration_seconds / 60,
        rank: classification.rank,
        team_count: classification.team_count,
        stat_lines,
        untracked_mates: classification.untracked_mates,
    }
}

impl Announcement {
    pub fn to_discord_payload(&self) -> Value {
        let mut description = self.stat_lines.join("\n");
        if self.untracked_mates > 0 {
            description.push_str(&format!(
                "\n+{} teammate(s) from outside the roster",
                self.untracked_mates
            ));
        }

        json!({
            "content": self.sentence,
            "embeds": [{
                "title": self.title,
                "color": EMBED_COLOR,
                "description": description,
                "fields": [
                    { "name": "Map", "value": self.map_name, "inline": true },
                    { "name": "Mode", "value": self.game_mode, "inline": true },
                    { "name": "Type", "value": self.match_type, "inline": true },
                    { "name": "Duration", "value": format!("{} min", self.duration_minutes), "inline": true },
                    { "name": "Placement", "value": format!("#{} / {}", self.rank, self.team_count), "inline": true }
                ],
                "footer": { "text": self.match_id }
            }]
        })
    }
}
