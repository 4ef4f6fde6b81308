use log::{info, warn};

use borda_session::{
    Ballot, Event, RandomTiebreak, SeededTiebreak, Session, SessionConfig, Stage, Tiebreak,
    VotingErrors,
};
use snafu::{ensure, prelude::*, Snafu};

use std::fs;
use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("The session rejected an event: {source}"))]
    Session { source: VotingErrors },
    #[snafu(display("Round {round} is incomplete: expected {expected} ballots, got {got}"))]
    IncompleteRound {
        round: u32,
        expected: usize,
        got: usize,
    },
    #[snafu(display("The ballot file ended before a winner was decided"))]
    NotEnoughRounds {},
    #[snafu(display("Error reading the console input"))]
    ReadingInput { source: std::io::Error },
    #[snafu(display("The console input ended before the election finished"))]
    EndOfInput {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type CliResult<T> = Result<T, CliError>;

pub mod config_reader {
    use super::*;

    /// The JSON description of one session, as supplied with `--config`.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ElectionConfig {
        pub name: Option<String>,
        pub voters: Vec<String>,
        pub candidates: Vec<String>,
        #[serde(rename = "randomSeed")]
        pub random_seed: Option<u64>,
    }

    /// The JSON description of the scripted ballots, as supplied with
    /// `--ballots`: one list of rankings per round, in voter order.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct BallotFile {
        pub rounds: Vec<Vec<Vec<String>>>,
    }

    pub fn read_config(path: &str) -> CliResult<ElectionConfig> {
        let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })
    }

    pub fn read_ballots(path: &str) -> CliResult<BallotFile> {
        let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })
    }

    /// The universe the original trip vote used, for running the tool
    /// without any configuration file.
    pub fn demo_config() -> ElectionConfig {
        ElectionConfig {
            name: Some("Trip vote".to_string()),
            voters: ["Bert", "Birger", "Dave", "Ewoud", "Tom"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            candidates: [
                "Taghazout",
                "Albanie",
                "Malta",
                "FuerteVentura",
                "Chartreuse",
                "Tunesie",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            random_seed: None,
        }
    }
}

use config_reader::*;

fn build_session(config: &ElectionConfig, seed_flag: Option<u64>) -> CliResult<Session> {
    let session_config = SessionConfig {
        voters: config.voters.clone(),
        candidates: config.candidates.clone(),
    };
    let tiebreak: Box<dyn Tiebreak> = match seed_flag.or(config.random_seed) {
        Some(seed) => {
            info!("breaking ties with seed {}", seed);
            Box::new(SeededTiebreak::new(seed))
        }
        None => Box::new(RandomTiebreak),
    };
    Session::with_tiebreak(session_config, tiebreak).context(SessionSnafu)
}

/// Feeds a scripted election through the session, round by round.
fn replay(session: &mut Session, rounds: &[Vec<Vec<String>>]) -> CliResult<()> {
    session.dispatch(Event::StartVoting).context(SessionSnafu)?;
    for (idx, round) in rounds.iter().enumerate() {
        if session.winner().is_some() {
            warn!(
                "ignoring {} extra rounds in the ballot file",
                rounds.len() - idx
            );
            break;
        }
        let expected = session.voters().len();
        ensure!(
            round.len() == expected,
            IncompleteRoundSnafu {
                round: (idx + 1) as u32,
                expected,
                got: round.len(),
            }
        );
        for ranking in round.iter() {
            session
                .dispatch(Event::SubmitBallot(Ballot {
                    ranking: ranking.clone(),
                }))
                .context(SessionSnafu)?;
        }
        session.dispatch(Event::RevealResult).context(SessionSnafu)?;
        if session.winner().is_none() {
            session.dispatch(Event::NextRound).context(SessionSnafu)?;
        }
    }
    ensure!(session.winner().is_some(), NotEnoughRoundsSnafu);
    Ok(())
}

fn report_to_json(session: &Session) -> JSValue {
    let mut rounds: Vec<JSValue> = Vec::new();
    for (idx, eliminated) in session.elimination_history().iter().enumerate() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, score) in session.score_history()[idx].iter() {
            tally.insert(name.clone(), json!(score));
        }
        rounds.push(json!({
            "round": idx + 1,
            "tally": tally,
            "eliminated": eliminated,
        }));
    }
    json!({ "rounds": rounds, "winner": session.winner() })
}

/// Collects the ballots from the console, one voter at a time, and prints
/// the outcome of every round. A rejected ballot re-prompts the same voter.
fn run_interactive(session: &mut Session) -> CliResult<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        match session.stage().clone() {
            Stage::Setup => {
                session.dispatch(Event::StartVoting).context(SessionSnafu)?;
            }
            Stage::Voting => {
                let voter = session.current_voter_name().unwrap_or("?").to_string();
                println!(
                    "Round {} — {}: rank all of [{}], best first, comma-separated",
                    session.round(),
                    voter,
                    session.active_candidates().join(", ")
                );
                print!("> ");
                io::stdout().flush().context(ReadingInputSnafu)?;
                let line = match lines.next() {
                    Some(line) => line.context(ReadingInputSnafu)?,
                    None => return EndOfInputSnafu.fail(),
                };
                let ranking: Vec<String> =
                    line.split(',').map(|s| s.trim().to_string()).collect();
                if let Err(err) = session.dispatch(Event::SubmitBallot(Ballot { ranking })) {
                    println!("Ballot rejected: {}. Please enter it again.", err);
                }
            }
            Stage::Announce => {
                session.dispatch(Event::RevealResult).context(SessionSnafu)?;
                if let Some(scores) = session.score_history().last() {
                    let mut tally: Vec<(&String, &u32)> = scores.iter().collect();
                    tally.sort_by_key(|(name, score)| (**score, (*name).clone()));
                    println!("Round {} totals (lower is better):", session.round());
                    for (name, score) in tally {
                        println!("  {:>4} {}", score, name);
                    }
                }
            }
            Stage::Eliminated { loser } => {
                println!("{} is out of the race.\n", loser);
                session.dispatch(Event::NextRound).context(SessionSnafu)?;
            }
            Stage::Winner { winner } => {
                println!("The winner is {}!", winner);
                break;
            }
        }
    }
    Ok(())
}

pub fn run(args: &Args) -> CliResult<()> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => {
            info!("no --config given, using the built-in demo universe");
            demo_config()
        }
    };
    info!("config: {:?}", config);
    let mut session = build_session(&config, args.seed)?;

    let ballots_path = match &args.ballots {
        Some(path) if !args.interactive => path,
        _ => return run_interactive(&mut session),
    };

    let ballot_file = read_ballots(ballots_path)?;
    info!(
        "replaying {} scripted rounds from {}",
        ballot_file.rounds.len(),
        ballots_path
    );
    replay(&mut session, &ballot_file.rounds)?;

    let report = report_to_json(&session);
    let pretty = serde_json::to_string_pretty(&report)
        .whatever_context("serializing the election report")?;
    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty),
        Some(path) => fs::write(path, &pretty).context(OpeningFileSnafu { path })?,
    }

    // The reference report, if provided for comparison.
    if let Some(reference) = &args.reference {
        let contents =
            fs::read_to_string(reference).context(OpeningFileSnafu { path: reference.clone() })?;
        let reference_js: JSValue =
            serde_json::from_str(&contents).context(ParsingJsonSnafu { path: reference.clone() })?;
        let reference_pretty = serde_json::to_string_pretty(&reference_js)
            .whatever_context("serializing the reference report")?;
        if reference_pretty != pretty {
            warn!("Found differences with the reference report");
            print_diff(reference_pretty.as_str(), pretty.as_str(), "\n");
        } else {
            info!("The report matches the reference");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ElectionConfig {
        ElectionConfig {
            name: None,
            voters: vec!["v1".to_string(), "v2".to_string()],
            candidates: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            random_seed: Some(1),
        }
    }

    fn round(ballots: &[&[&str]]) -> Vec<Vec<String>> {
        ballots
            .iter()
            .map(|b| b.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn config_json_round_trips() {
        let raw = r#"{"voters": ["v1", "v2"], "candidates": ["A", "B"], "randomSeed": 7}"#;
        let config: ElectionConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.voters.len(), 2);
        assert_eq!(config.random_seed, Some(7));
        assert_eq!(config.name, None);
    }

    #[test]
    fn replay_produces_a_full_report() {
        let mut session = build_session(&test_config(), None).unwrap();
        let rounds = vec![
            round(&[&["A", "B", "C"], &["A", "B", "C"]]),
            round(&[&["A", "B"], &["A", "B"]]),
        ];
        replay(&mut session, &rounds).unwrap();

        let report = report_to_json(&session);
        assert_eq!(report["winner"], "A");
        assert_eq!(report["rounds"][0]["eliminated"], "C");
        assert_eq!(report["rounds"][0]["tally"]["C"], 6);
        assert_eq!(report["rounds"][1]["eliminated"], "B");
        assert_eq!(report["rounds"][1]["tally"]["B"], 4);
    }

    #[test]
    fn replay_rejects_an_incomplete_round() {
        let mut session = build_session(&test_config(), None).unwrap();
        let rounds = vec![round(&[&["A", "B", "C"]])];
        let res = replay(&mut session, &rounds);
        assert!(matches!(res, Err(CliError::IncompleteRound { .. })));
    }

    #[test]
    fn replay_requires_enough_rounds_for_a_winner() {
        let mut session = build_session(&test_config(), None).unwrap();
        let rounds = vec![round(&[&["A", "B", "C"], &["A", "B", "C"]])];
        let res = replay(&mut session, &rounds);
        assert!(matches!(res, Err(CliError::NotEnoughRounds { .. })));
    }
}
