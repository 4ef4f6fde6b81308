//! The scoring engine: Borda-style weighted scores over one round of
//! ballots, and the selection of the candidate to eliminate.

use log::debug;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Ballot, ScoreMap, VotingErrors};

/// The injectable random-choice capability used to break ties.
///
/// `choose(n)` picks one index in `0..n`. Returning `None` (or an index
/// out of range) makes the scoring engine report
/// [`VotingErrors::TiebreakUnavailable`] instead of silently favoring the
/// first tied candidate.
pub trait Tiebreak {
    fn choose(&mut self, n: usize) -> Option<usize>;
}

/// Breaks ties uniformly at random using the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTiebreak;

impl Tiebreak for RandomTiebreak {
    fn choose(&mut self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        Some(rand::thread_rng().gen_range(0..n))
    }
}

/// Breaks ties with a seeded generator, for reproducible elections.
#[derive(Debug, Clone)]
pub struct SeededTiebreak {
    rng: StdRng,
}

impl SeededTiebreak {
    pub fn new(seed: u64) -> SeededTiebreak {
        SeededTiebreak {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Tiebreak for SeededTiebreak {
    fn choose(&mut self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        Some(self.rng.gen_range(0..n))
    }
}

/// The outcome of scoring one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundOutcome {
    /// Weighted score per active candidate. Higher is worse.
    pub scores: ScoreMap,
    /// The candidate to remove from the race.
    pub eliminated: String,
}

/// Scores one round of ballots over the active candidates and picks the
/// candidate to eliminate.
///
/// Each ballot contributes `idx + 1` points to the candidate it ranks at
/// 0-based position `idx`, so the first choice gets the minimum increment.
/// The candidate with the highest total loses the round. Ballot entries
/// naming a candidate outside `candidates` contribute nothing; this keeps
/// ballots cast against a superset usable, even though the session clears
/// its ballots every round and never produces such input.
///
/// Ties for the highest total are resolved by `tiebreak`, uniformly at
/// random for the provided implementations. With no ballots at all, every
/// candidate sits at zero and the loser is drawn among all of them.
pub fn score_round(
    ballots: &[Ballot],
    candidates: &[String],
    tiebreak: &mut dyn Tiebreak,
) -> Result<RoundOutcome, VotingErrors> {
    if candidates.is_empty() {
        return Err(VotingErrors::EmptyUniverse);
    }

    let mut scores: ScoreMap = candidates.iter().map(|c| (c.clone(), 0u32)).collect();
    for ballot in ballots.iter() {
        for (idx, name) in ballot.ranking.iter().enumerate() {
            if let Some(score) = scores.get_mut(name) {
                *score += (idx + 1) as u32;
            }
        }
    }
    debug!("score_round: scores: {:?}", scores);

    let worst: u32 = match scores.values().max() {
        Some(max) => *max,
        None => return Err(VotingErrors::EmptyUniverse),
    };

    // The tied candidates, in candidate order so that the tie-break index
    // is well defined.
    let tied: Vec<&String> = candidates
        .iter()
        .filter(|c| scores.get(c.as_str()) == Some(&worst))
        .collect();
    debug!("score_round: worst score {}, tied: {:?}", worst, tied);

    let eliminated = if tied.len() == 1 {
        tied[0].clone()
    } else {
        let idx = tiebreak
            .choose(tied.len())
            .ok_or(VotingErrors::TiebreakUnavailable)?;
        tied.get(idx)
            .ok_or(VotingErrors::TiebreakUnavailable)?
            .to_string()
    };

    Ok(RoundOutcome { scores, eliminated })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(usize);

    impl Tiebreak for Fixed {
        fn choose(&mut self, n: usize) -> Option<usize> {
            assert!(self.0 < n, "fixed tie-break index out of range");
            Some(self.0)
        }
    }

    struct NoRandomness;

    impl Tiebreak for NoRandomness {
        fn choose(&mut self, _n: usize) -> Option<usize> {
            None
        }
    }

    fn ballot(names: &[&str]) -> Ballot {
        Ballot {
            ranking: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_ballot_is_linear_in_rank() {
        let candidates = names(&["A", "B", "C", "D"]);
        let ballots = vec![ballot(&["A", "B", "C", "D"])];
        let outcome = score_round(&ballots, &candidates, &mut RandomTiebreak).unwrap();
        assert_eq!(outcome.scores["A"], 1);
        assert_eq!(outcome.scores["B"], 2);
        assert_eq!(outcome.scores["C"], 3);
        assert_eq!(outcome.scores["D"], 4);
        assert_eq!(outcome.eliminated, "D");
    }

    #[test]
    fn inactive_candidates_are_ignored() {
        // X is no longer in the race: it gets no score entry and the
        // active candidates keep their own ballot positions.
        let candidates = names(&["A", "B"]);
        let ballots = vec![ballot(&["X", "A", "B"])];
        let outcome = score_round(&ballots, &candidates, &mut RandomTiebreak).unwrap();
        assert!(!outcome.scores.contains_key("X"));
        assert_eq!(outcome.scores["A"], 2);
        assert_eq!(outcome.scores["B"], 3);
        assert_eq!(outcome.eliminated, "B");
    }

    #[test]
    fn no_ballots_draws_among_all_candidates() {
        let candidates = names(&["A", "B", "C"]);
        let outcome = score_round(&[], &candidates, &mut Fixed(2)).unwrap();
        assert!(outcome.scores.values().all(|s| *s == 0));
        assert_eq!(outcome.eliminated, "C");
    }

    #[test]
    fn single_candidate_is_always_the_loser() {
        let candidates = names(&["A"]);
        let outcome = score_round(&[], &candidates, &mut NoRandomness).unwrap();
        assert_eq!(outcome.eliminated, "A");
    }

    #[test]
    fn empty_candidate_list_is_an_error() {
        let res = score_round(&[], &[], &mut RandomTiebreak);
        assert_eq!(res, Err(VotingErrors::EmptyUniverse));
    }

    #[test]
    fn tie_without_randomness_fails_loudly() {
        let candidates = names(&["A", "B"]);
        let ballots = vec![ballot(&["A", "B"]), ballot(&["B", "A"])];
        let res = score_round(&ballots, &candidates, &mut NoRandomness);
        assert_eq!(res, Err(VotingErrors::TiebreakUnavailable));
    }

    #[test]
    fn tie_break_picks_the_indexed_candidate() {
        let candidates = names(&["A", "B"]);
        let ballots = vec![ballot(&["A", "B"]), ballot(&["B", "A"])];
        let outcome = score_round(&ballots, &candidates, &mut Fixed(1)).unwrap();
        assert_eq!(outcome.eliminated, "B");
        let outcome = score_round(&ballots, &candidates, &mut Fixed(0)).unwrap();
        assert_eq!(outcome.eliminated, "A");
    }

    #[test]
    fn tie_break_is_roughly_uniform_over_seeds() {
        let candidates = names(&["A", "B"]);
        let ballots = vec![ballot(&["A", "B"]), ballot(&["B", "A"])];
        let mut eliminated_a = 0u32;
        let trials = 400u64;
        for seed in 0..trials {
            let mut tiebreak = SeededTiebreak::new(seed);
            let outcome = score_round(&ballots, &candidates, &mut tiebreak).unwrap();
            assert!(outcome.eliminated == "A" || outcome.eliminated == "B");
            if outcome.eliminated == "A" {
                eliminated_a += 1;
            }
        }
        // Loose bounds: both tied candidates must come up regularly.
        assert!(eliminated_a >= 120, "A eliminated only {} times", eliminated_a);
        assert!(eliminated_a <= 280, "A eliminated {} times", eliminated_a);
    }
}
