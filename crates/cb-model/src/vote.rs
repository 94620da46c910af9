//! Per-post vote state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A single user's vote, stored as `-1`, `0` or `1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Vote {
    Down,
    #[default]
    Neutral,
    Up,
}

impl Vote {
    pub fn value(self) -> i8 {
        match self {
            Self::Down => -1,
            Self::Neutral => 0,
            Self::Up => 1,
        }
    }

    /// Parse a wire value.
    pub fn from_value(value: i64) -> Result<Self, ModelError> {
        match value {
            -1 => Ok(Self::Down),
            0 => Ok(Self::Neutral),
            1 => Ok(Self::Up),
            other => Err(ModelError::InvalidVote(other)),
        }
    }
}

impl TryFrom<i8> for Vote {
    type Error = ModelError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Self::from_value(value.into())
    }
}

impl From<Vote> for i8 {
    fn from(vote: Vote) -> Self {
        vote.value()
    }
}

/// Aggregate counters returned after every vote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub upvotes: u64,
    pub downvotes: u64,
    pub score: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLedger {
    #[serde(default)]
    upvotes: u64,
    #[serde(default)]
    downvotes: u64,
    #[serde(default)]
    voters: BTreeMap<String, Vote>,
}

impl From<StoredLedger> for VoteLedger {
    fn from(stored: StoredLedger) -> Self {
        let mut ledger = Self {
            upvotes: stored.upvotes,
            downvotes: stored.downvotes,
            score: 0,
            voters: stored.voters,
        };
        ledger.rescore();
        ledger
    }
}

/// Vote counters and the voter map for one post.
///
/// A stored `score` is ignored on load and recomputed from the counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredLedger")]
pub struct VoteLedger {
    upvotes: u64,
    downvotes: u64,
    score: i64,
    voters: BTreeMap<String, Vote>,
}

impl VoteLedger {
    /// Ledger for a new post: the author's upvote is already recorded.
    pub fn with_author_upvote(author: &str) -> Self {
        let mut ledger = Self::default();
        ledger.cast(author, Vote::Up);
        ledger
    }

    pub fn upvotes(&self) -> u64 {
        self.upvotes
    }

    pub fn downvotes(&self) -> u64 {
        self.downvotes
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn voters(&self) -> &BTreeMap<String, Vote> {
        &self.voters
    }

    pub fn vote_of(&self, username: &str) -> Vote {
        self.voters.get(username).copied().unwrap_or_default()
    }

    pub fn tally(&self) -> VoteTally {
        VoteTally {
            upvotes: self.upvotes,
            downvotes: self.downvotes,
            score: self.score,
        }
    }

    /// Record `vote` as `username`'s current vote.
    ///
    /// Casting the same value again changes nothing.
    pub fn cast(&mut self, username: &str, vote: Vote) -> VoteTally {
        match self.vote_of(username) {
            Vote::Up => self.upvotes = self.upvotes.saturating_sub(1),
            Vote::Down => self.downvotes = self.downvotes.saturating_sub(1),
            Vote::Neutral => {}
        }
        match vote {
            Vote::Up => self.upvotes += 1,
            Vote::Down => self.downvotes += 1,
            Vote::Neutral => {}
        }
        self.voters.insert(username.to_string(), vote);
        self.rescore();
        self.tally()
    }

    /// Client toggle: submitting the vote already held retracts it.
    ///
    /// A retraction returns the voter to their baseline, which is the
    /// self-upvote for the post's author and neutral for everyone else.
    pub fn toggle(&mut self, username: &str, submitted: Vote, author: &str) -> VoteTally {
        let target = if self.vote_of(username) == submitted {
            baseline(username, author)
        } else {
            submitted
        };
        self.cast(username, target)
    }

    fn rescore(&mut self) {
        self.score = self.upvotes as i64 - self.downvotes as i64;
    }
}

fn baseline(username: &str, author: &str) -> Vote {
    if username == author {
        Vote::Up
    } else {
        Vote::Neutral
    }
}
