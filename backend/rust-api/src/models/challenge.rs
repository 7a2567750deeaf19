use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ChallengeId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeFile {
    pub name: String,
    pub url: String,
}

/// Challenge record as held by the challenge store, secret flag included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    #[serde(rename = "_id")]
    pub id: ChallengeId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub points: u32,
    pub flag: String,
    /// Denormalized count of solve records for this challenge.
    #[serde(default)]
    pub solves: u32,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub files: Vec<ChallengeFile>,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    /// Exact, case-sensitive comparison after trimming surrounding whitespace.
    /// A byte order mark counts as whitespace.
    pub fn accepts_flag(&self, submitted: &str) -> bool {
        trim_flag(submitted) == trim_flag(&self.flag)
    }
}

fn trim_flag(flag: &str) -> &str {
    flag.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Player-facing view of a challenge. Never carries the flag.
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeView {
    pub id: ChallengeId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub points: u32,
    pub solves: u32,
    pub hints: Vec<String>,
    pub files: Vec<ChallengeFile>,
    pub solved: bool,
}

impl ChallengeView {
    pub fn from_challenge(challenge: Challenge, solved: bool) -> Self {
        Self {
            id: challenge.id,
            title: challenge.title,
            description: challenge.description,
            category: challenge.category,
            difficulty: challenge.difficulty,
            points: challenge.points,
            solves: challenge.solves,
            hints: challenge.hints,
            files: challenge.files,
            solved,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListChallengesQuery {
    pub category: Option<String>,
}
