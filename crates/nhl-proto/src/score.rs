//! Score derivation and per-team stat tallies computed from a game feed.

use crate::model::{LiveGameData, Side};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub away: u32,
    pub home: u32,
}

/// Decides the score shown for a feed. Supplied by the data source, since how
/// reliable the feed's own score fields are depends on the upstream schema.
pub trait ScoreStrategy {
    fn score(&self, feed: &LiveGameData) -> Score;
}

/// Trusts the team scores carried by the feed and falls back to counting
/// `goal` plays when either side is missing one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedScore;

impl ScoreStrategy for FeedScore {
    fn score(&self, feed: &LiveGameData) -> Score {
        match (feed.away_team.score, feed.home_team.score) {
            (Some(away), Some(home)) => Score { away, home },
            _ => GoalCount.score(feed),
        }
    }
}

/// Counts `goal` plays per owning team, ignoring any score fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalCount;

impl ScoreStrategy for GoalCount {
    fn score(&self, feed: &LiveGameData) -> Score {
        let mut score = Score::default();
        for play in feed.plays.iter().filter(|p| p.type_desc_key == "goal") {
            match play.owner_team().and_then(|id| feed.side_of(id)) {
                Some(Side::Away) => score.away += 1,
                Some(Side::Home) => score.home += 1,
                None => {}
            }
        }
        score
    }
}

/// Event counts for one team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamStats {
    pub shots: u32,
    pub hits: u32,
    pub penalties: u32,
    pub giveaways: u32,
    pub takeaways: u32,
    pub blocked: u32,
    pub faceoff_wins: u32,
}

impl TeamStats {
    fn record(&mut self, type_desc_key: &str) {
        match type_desc_key {
            "shot-on-goal" | "goal" => self.shots += 1,
            "hit" => self.hits += 1,
            "penalty" => self.penalties += 1,
            "giveaway" => self.giveaways += 1,
            "takeaway" => self.takeaways += 1,
            "blocked-shot" => self.blocked += 1,
            "faceoff" => self.faceoff_wins += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamTally {
    pub away: TeamStats,
    pub home: TeamStats,
}

impl TeamTally {
    /// Attribute every play to the side that owns it. Plays without an owner
    /// (stoppages, period markers) are skipped.
    pub fn from_feed(feed: &LiveGameData) -> Self {
        let mut tally = Self::default();
        for play in &feed.plays {
            match play.owner_team().and_then(|id| feed.side_of(id)) {
                Some(Side::Away) => tally.away.record(&play.type_desc_key),
                Some(Side::Home) => tally.home.record(&play.type_desc_key),
                None => {}
            }
        }
        tally
    }

    /// Faceoff win share of the away side, 0.0..=100.0.
    pub fn away_faceoff_pct(&self) -> Option<f64> {
        let total = self.away.faceoff_wins + self.home.faceoff_wins;
        if total == 0 {
            return None;
        }
        Some(self.away.faceoff_wins as f64 * 100.0 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameState, Localized, Play, PlayDetails, TeamRef};

    fn team(id: u64, abbrev: &str, score: Option<u32>) -> TeamRef {
        TeamRef {
            id,
            abbrev: abbrev.to_string(),
            score,
            place_name: None,
            common_name: None,
        }
    }

    fn play(kind: &str, owner: Option<u64>) -> Play {
        Play {
            event_id: 0,
            type_desc_key: kind.to_string(),
            period_descriptor: Default::default(),
            time_in_period: "00:00".to_string(),
            details: owner.map(|id| PlayDetails {
                event_owner_team_id: Some(id),
                ..PlayDetails::default()
            }),
        }
    }

    fn feed(away_score: Option<u32>, home_score: Option<u32>, plays: Vec<Play>) -> LiveGameData {
        LiveGameData {
            id: 1,
            game_state: GameState::Live,
            venue: Localized::new("Arena"),
            away_team: team(10, "TOR", away_score),
            home_team: team(8, "MTL", home_score),
            period_descriptor: None,
            clock: None,
            plays,
            roster_spots: Vec::new(),
        }
    }

    #[test]
    fn test_feed_score_prefers_team_scores() {
        let f = feed(Some(4), Some(2), vec![play("goal", Some(10))]);
        assert_eq!(FeedScore.score(&f), Score { away: 4, home: 2 });
    }

    #[test]
    fn test_feed_score_falls_back_to_goal_plays() {
        let f = feed(
            None,
            Some(9),
            vec![
                play("goal", Some(10)),
                play("goal", Some(8)),
                play("goal", Some(10)),
                play("shot-on-goal", Some(8)),
                play("goal", Some(99)),
            ],
        );
        assert_eq!(FeedScore.score(&f), Score { away: 2, home: 1 });
    }

    #[test]
    fn test_tally_counts_goals_as_shots() {
        let f = feed(
            None,
            None,
            vec![
                play("goal", Some(10)),
                play("shot-on-goal", Some(10)),
                play("hit", Some(8)),
                play("faceoff", Some(8)),
                play("faceoff", Some(10)),
                play("faceoff", Some(8)),
                play("stoppage", None),
            ],
        );
        let tally = TeamTally::from_feed(&f);
        assert_eq!(tally.away.shots, 2);
        assert_eq!(tally.home.hits, 1);
        assert_eq!(tally.home.faceoff_wins, 2);
        let pct = tally.away_faceoff_pct().unwrap();
        assert!((pct - 33.33).abs() < 0.01);
    }

    #[test]
    fn test_faceoff_pct_without_faceoffs() {
        assert_eq!(TeamTally::default().away_faceoff_pct(), None);
    }
}
