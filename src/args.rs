use clap::Parser;

/// This program runs a multi-round weighted elimination vote.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) JSON description of the session: the ordered list of voters,
    /// the ordered list of candidates and an optional "randomSeed". A built-in demo
    /// universe is used when omitted.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) JSON file with the scripted ballots: one list of rankings per
    /// round, in voter order. Without it the election runs interactively on the console.
    #[clap(short, long, value_parser)]
    pub ballots: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the report of the election will be
    /// written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the report of an election in JSON format.
    /// If provided, elimvote will check that the tabulated report matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// Seed for the tie-break source. Overrides the seed that may be specified with the
    /// --config option. Ties are broken with the thread-local generator when no seed is
    /// given anywhere.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    // Other arguments
    /// Run the election interactively on the console even if a ballot file is given.
    #[clap(long, takes_value = false)]
    pub interactive: bool,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
