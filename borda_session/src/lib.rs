//! A session state machine for multi-round elimination votes.
//!
//! A fixed slate of voters repeatedly ranks the candidates that are still
//! in the race. Each round, every ballot position feeds a Borda-style
//! weighted score (first choice contributes the least) and the candidate
//! with the worst total is eliminated, until the terminal two-candidate
//! round decides the winner. The session is a deterministic reducer over a
//! closed set of events; the only randomness is the tie-break, injected
//! through the [`scoring::Tiebreak`] capability.

mod config;
pub mod manual;
pub mod scoring;

use log::{debug, info};

use std::collections::HashSet;

pub use crate::config::*;
pub use crate::scoring::{score_round, RandomTiebreak, RoundOutcome, SeededTiebreak, Tiebreak};

/// One voting session: the authoritative state plus the event handler.
///
/// The surrounding presentation layer reads snapshots and feeds events in;
/// it never mutates the state directly. One event is handled synchronously
/// to completion before the next is accepted.
///
/// ```
/// use borda_session::{Ballot, Event, Session, SessionConfig, VotingErrors};
///
/// let config = SessionConfig {
///     voters: vec!["ann".to_string()],
///     candidates: vec!["X".to_string(), "Y".to_string()],
/// };
/// let mut session = Session::new(config)?;
/// session.dispatch(Event::StartVoting)?;
/// session.dispatch(Event::SubmitBallot(Ballot {
///     ranking: vec!["X".to_string(), "Y".to_string()],
/// }))?;
/// session.dispatch(Event::RevealResult)?;
/// assert_eq!(session.winner(), Some("X"));
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Session {
    config: SessionConfig,
    stage: Stage,
    active_candidates: Vec<String>,
    round: u32,
    ballots: Vec<Ballot>,
    current_voter: usize,
    elimination_history: Vec<String>,
    score_history: Vec<ScoreMap>,
    tiebreak: Box<dyn Tiebreak>,
}

impl Session {
    /// Creates a session in the `Setup` stage, breaking ties with the
    /// thread-local random generator.
    pub fn new(config: SessionConfig) -> Result<Session, VotingErrors> {
        Session::with_tiebreak(config, Box::new(RandomTiebreak))
    }

    /// Creates a session with an explicit tie-break source, for
    /// reproducible elections and deterministic tests.
    pub fn with_tiebreak(
        config: SessionConfig,
        tiebreak: Box<dyn Tiebreak>,
    ) -> Result<Session, VotingErrors> {
        config.validate()?;
        let active = config.candidates.clone();
        Ok(Session {
            config,
            stage: Stage::Setup,
            active_candidates: active,
            round: 1,
            ballots: Vec::new(),
            current_voter: 0,
            elimination_history: Vec::new(),
            score_history: Vec::new(),
            tiebreak,
        })
    }

    /// Applies one event to the session.
    ///
    /// Ballot validation failures are reported as errors and leave the
    /// session untouched, so the caller can re-prompt the same voter.
    /// Events that are not meaningful in the current stage are no-ops,
    /// never failures.
    pub fn dispatch(&mut self, event: Event) -> Result<(), VotingErrors> {
        match event {
            Event::Reset => self.reset(),
            Event::StartVoting if matches!(self.stage, Stage::Setup) => self.start_voting(),
            Event::SubmitBallot(ballot) if matches!(self.stage, Stage::Voting) => {
                return self.submit_ballot(ballot);
            }
            Event::RevealResult if matches!(self.stage, Stage::Announce) => {
                return self.reveal();
            }
            Event::NextRound if matches!(self.stage, Stage::Eliminated { .. }) => {
                self.advance_round();
            }
            other => {
                debug!("dispatch: ignoring {:?} in stage {:?}", other, self.stage);
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        info!("reset: discarding all progress");
        self.stage = Stage::Setup;
        self.active_candidates = self.config.candidates.clone();
        self.round = 1;
        self.ballots.clear();
        self.current_voter = 0;
        self.elimination_history.clear();
        self.score_history.clear();
    }

    fn start_voting(&mut self) {
        info!(
            "start_voting: {} candidates, {} voters",
            self.config.candidates.len(),
            self.config.voters.len()
        );
        self.reset();
        self.stage = Stage::Voting;
    }

    fn submit_ballot(&mut self, ballot: Ballot) -> Result<(), VotingErrors> {
        self.validate_ballot(&ballot)?;
        debug!(
            "submit_ballot: round {} voter {:?}: {:?}",
            self.round,
            self.current_voter_name(),
            ballot.ranking
        );
        self.ballots.push(ballot);
        if self.current_voter + 1 < self.config.voters.len() {
            self.current_voter += 1;
        } else {
            // All voters have cast a ballot this round.
            self.stage = Stage::Announce;
        }
        Ok(())
    }

    /// A ballot must be a permutation of the active candidates: right
    /// length, no blanks, no duplicates, no unknown names.
    fn validate_ballot(&self, ballot: &Ballot) -> Result<(), VotingErrors> {
        if ballot.ranking.len() != self.active_candidates.len() {
            return Err(VotingErrors::BallotWrongLength {
                expected: self.active_candidates.len(),
                got: ballot.ranking.len(),
            });
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for name in ballot.ranking.iter() {
            if name.trim().is_empty() {
                return Err(VotingErrors::BallotBlankEntry);
            }
            if !self.active_candidates.contains(name) {
                return Err(VotingErrors::BallotUnknownCandidate(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(VotingErrors::BallotDuplicateEntry(name.clone()));
            }
        }
        Ok(())
    }

    fn reveal(&mut self) -> Result<(), VotingErrors> {
        let outcome = score_round(
            &self.ballots,
            &self.active_candidates,
            self.tiebreak.as_mut(),
        )?;
        info!(
            "reveal: round {} scores {:?}, eliminating {}",
            self.round, outcome.scores, outcome.eliminated
        );
        self.score_history.push(outcome.scores);
        self.elimination_history.push(outcome.eliminated.clone());
        if self.active_candidates.len() == 2 {
            // Terminal round: the survivor of the pair wins the election
            // and the race collapses to that single candidate.
            let winner = if self.active_candidates[0] == outcome.eliminated {
                self.active_candidates[1].clone()
            } else {
                self.active_candidates[0].clone()
            };
            info!("reveal: winner is {}", winner);
            self.active_candidates = vec![winner.clone()];
            self.stage = Stage::Winner { winner };
        } else {
            self.stage = Stage::Eliminated {
                loser: outcome.eliminated,
            };
        }
        Ok(())
    }

    fn advance_round(&mut self) {
        if let Stage::Eliminated { loser } = &self.stage {
            let loser = loser.clone();
            self.active_candidates.retain(|c| *c != loser);
            self.ballots.clear();
            self.current_voter = 0;
            self.round += 1;
            info!(
                "advance_round: round {}, remaining candidates {:?}",
                self.round, self.active_candidates
            );
            self.stage = Stage::Voting;
        }
    }

    // **** Read-only accessors for the presentation layer ****

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn active_candidates(&self) -> &[String] {
        &self.active_candidates
    }

    pub fn voters(&self) -> &[String] {
        &self.config.voters
    }

    pub fn ballots_this_round(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn current_voter_index(&self) -> usize {
        self.current_voter
    }

    /// The voter whose ballot is expected next. Only meaningful while the
    /// session is in the `Voting` stage.
    pub fn current_voter_name(&self) -> Option<&str> {
        self.config.voters.get(self.current_voter).map(String::as_str)
    }

    pub fn elimination_history(&self) -> &[String] {
        &self.elimination_history
    }

    pub fn score_history(&self) -> &[ScoreMap] {
        &self.score_history
    }

    /// The candidate eliminated by the last reveal, while the session sits
    /// in the `Eliminated` stage.
    pub fn loser(&self) -> Option<&str> {
        match &self.stage {
            Stage::Eliminated { loser } => Some(loser),
            _ => None,
        }
    }

    /// The winning candidate, once the session reached the `Winner` stage.
    pub fn winner(&self) -> Option<&str> {
        match &self.stage {
            Stage::Winner { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            stage: self.stage.clone(),
            active_candidates: self.active_candidates.clone(),
            round: self.round,
            ballots_this_round: self.ballots.clone(),
            current_voter_index: self.current_voter,
            elimination_history: self.elimination_history.clone(),
            score_history: self.score_history.clone(),
        }
    }
}
