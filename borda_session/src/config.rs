// ********* Input data structures ***********

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::Display;

/// The fixed universes for one voting session: who votes, and on what.
///
/// Both lists are ordered. The voter order determines the ballot-collection
/// sequence within each round; the candidate order is the display order and
/// the order in which tied candidates are presented to the tie-break source.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SessionConfig {
    pub voters: Vec<String>,
    pub candidates: Vec<String>,
}

impl SessionConfig {
    /// Checks that the universes can support an election: at least one
    /// voter, at least two candidates, no blank names, no duplicate
    /// candidate names.
    pub fn validate(&self) -> Result<(), VotingErrors> {
        if self.voters.is_empty() {
            return Err(VotingErrors::EmptyUniverse);
        }
        if self.candidates.len() < 2 {
            return Err(VotingErrors::TooFewCandidates);
        }
        if self.voters.iter().chain(self.candidates.iter()).any(|name| name.trim().is_empty()) {
            return Err(VotingErrors::BlankName);
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for name in self.candidates.iter() {
            if !seen.insert(name.as_str()) {
                return Err(VotingErrors::DuplicateCandidate(name.clone()));
            }
        }
        Ok(())
    }
}

/// One voter's full ranking of the currently active candidates,
/// first choice first. Immutable once accepted into a round.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ballot {
    pub ranking: Vec<String>,
}

// ******** Output data structures *********

/// The weighted score of every active candidate for one round.
/// Higher is worse: rank 1 contributes 1 point, rank 2 contributes 2, etc.
pub type ScoreMap = HashMap<String, u32>;

/// The current stage of a session, with the data that is only meaningful
/// in that stage carried inside the variant.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Stage {
    /// Waiting for the election to start.
    Setup,
    /// Collecting one ballot per voter, in voter order.
    Voting,
    /// All ballots are in; waiting for the result to be revealed.
    Announce,
    /// A reveal eliminated `loser`; more than one candidate remains.
    Eliminated { loser: String },
    /// Terminal: the final reveal left a single candidate standing.
    Winner { winner: String },
}

/// The closed set of events a session accepts.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Event {
    StartVoting,
    SubmitBallot(Ballot),
    RevealResult,
    NextRound,
    Reset,
}

/// A deep-comparable read-only view of a session.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SessionSnapshot {
    pub stage: Stage,
    pub active_candidates: Vec<String>,
    pub round: u32,
    pub ballots_this_round: Vec<Ballot>,
    pub current_voter_index: usize,
    pub elimination_history: Vec<String>,
    pub score_history: Vec<ScoreMap>,
}

/// Errors that the session or the scoring engine can report.
///
/// Ballot validation failures are returned as values from
/// [`crate::Session::dispatch`] and leave the session untouched.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    EmptyUniverse,
    TooFewCandidates,
    DuplicateCandidate(String),
    BlankName,
    BallotWrongLength { expected: usize, got: usize },
    BallotBlankEntry,
    BallotDuplicateEntry(String),
    BallotUnknownCandidate(String),
    TiebreakUnavailable,
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::EmptyUniverse => {
                write!(f, "the session needs at least one voter and one candidate")
            }
            VotingErrors::TooFewCandidates => {
                write!(f, "an elimination vote needs at least two candidates")
            }
            VotingErrors::DuplicateCandidate(name) => {
                write!(f, "duplicate candidate name in the universe: {}", name)
            }
            VotingErrors::BlankName => write!(f, "voter and candidate names may not be blank"),
            VotingErrors::BallotWrongLength { expected, got } => write!(
                f,
                "the ballot must rank all {} active candidates, got {} entries",
                expected, got
            ),
            VotingErrors::BallotBlankEntry => write!(f, "the ballot contains a blank entry"),
            VotingErrors::BallotDuplicateEntry(name) => {
                write!(f, "the ballot ranks {} more than once", name)
            }
            VotingErrors::BallotUnknownCandidate(name) => {
                write!(f, "the ballot ranks {}, who is not an active candidate", name)
            }
            VotingErrors::TiebreakUnavailable => {
                write!(f, "the tie-break source failed to pick among the tied candidates")
            }
        }
    }
}
