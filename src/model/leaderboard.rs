//! Participant state and leaderboard projections

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A participant in a live quiz session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: String,
    pub display_name: String,
    pub score: u64,
    /// Refreshed on join and on every answer; earlier wins ties
    pub last_updated: DateTime<Utc>,
}

impl Participant {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            score: 0,
            last_updated: now,
        }
    }

    /// Leaderboard ordering: score desc, then last update asc, then name asc,
    /// then user ID asc
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.last_updated.cmp(&other.last_updated))
            .then_with(|| self.display_name.cmp(&other.display_name))
            .then_with(|| self.user_id.cmp(&other.user_id))
    }
}

/// One row of a leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub score: u64,
}

impl From<&Participant> for LeaderboardEntry {
    fn from(p: &Participant) -> Self {
        Self {
            user_id: p.user_id.clone(),
            display_name: p.display_name.clone(),
            score: p.score,
        }
    }
}

/// Point-in-time ordered scoreboard for a quiz session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub quiz_id: String,
    pub entries: Vec<LeaderboardEntry>,
    pub updated_at: DateTime<Utc>,
}

impl Leaderboard {
    /// Build a snapshot from an unordered set of participants
    pub fn rank<'a, I>(quiz_id: &str, participants: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Participant>,
    {
        let mut ranked: Vec<&Participant> = participants.into_iter().collect();
        ranked.sort_by(|a, b| a.rank_cmp(b));

        Self {
            quiz_id: quiz_id.to_string(),
            entries: ranked.into_iter().map(LeaderboardEntry::from).collect(),
            updated_at: now,
        }
    }

    /// Look up a user's row
    pub fn entry(&self, user_id: &str) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.user_id == user_id)
    }
}

/// An answer submitted by a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_id: String,
    pub option_id: String,
}

impl AnswerSubmission {
    pub fn new(question_id: impl Into<String>, option_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            option_id: option_id.into(),
        }
    }
}

/// Outcome of a submission as reported back to its author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub question_id: String,
    pub correct: bool,
    pub awarded: u32,
    pub total_score: u64,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn participant(id: &str, name: &str, score: u64, secs: i64) -> Participant {
        let mut p = Participant::new(id, name, at(secs));
        p.score = score;
        p
    }

    #[test]
    fn test_rank_by_score() {
        let ps = [participant("u1", "Alice", 1, 0), participant("u2", "Bob", 3, 5)];
        let lb = Leaderboard::rank("quiz-1", &ps, at(10));

        assert_eq!(lb.entries[0].user_id, "u2");
        assert_eq!(lb.entries[1].user_id, "u1");
        assert_eq!(lb.updated_at, at(10));
    }

    #[test]
    fn test_rank_tie_earlier_update_first() {
        let ps = [participant("u1", "Alice", 2, 9), participant("u2", "Bob", 2, 3)];
        let lb = Leaderboard::rank("quiz-1", &ps, at(10));

        assert_eq!(lb.entries[0].display_name, "Bob");
        assert_eq!(lb.entries[1].display_name, "Alice");
    }

    #[test]
    fn test_rank_full_tie_by_name() {
        let ps = [
            participant("u1", "Zed", 2, 3),
            participant("u2", "Amy", 2, 3),
            participant("u3", "Max", 2, 3),
        ];
        let lb = Leaderboard::rank("quiz-1", &ps, at(10));
        let names: Vec<_> = lb.entries.iter().map(|e| e.display_name.as_str()).collect();

        assert_eq!(names, ["Amy", "Max", "Zed"]);
    }

    #[test]
    fn test_rank_same_name_ordered_by_user_id() {
        let forward = [
            participant("u3", "Sam", 2, 3),
            participant("u1", "Sam", 2, 3),
            participant("u2", "Sam", 2, 3),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        for ps in [&forward, &reversed] {
            let lb = Leaderboard::rank("quiz-1", ps, at(10));
            let ids: Vec<_> = lb.entries.iter().map(|e| e.user_id.as_str()).collect();
            assert_eq!(ids, ["u1", "u2", "u3"]);
        }
    }

    #[test]
    fn test_leaderboard_json_shape() {
        let ps = [participant("u1", "Alice", 1, 0)];
        let lb = Leaderboard::rank("quiz-1", &ps, at(0));
        let value = serde_json::to_value(&lb).unwrap();

        assert_eq!(value["quizId"], "quiz-1");
        assert_eq!(value["entries"][0]["userId"], "u1");
        assert_eq!(value["entries"][0]["displayName"], "Alice");
        assert!(value["updatedAt"].is_string());
    }
}
