use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "ts")]
/// Triple-store command line toolkit
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load an N-Triples file, run one query against it, and print the
    /// results
    Query {
        /// N-Triples file to load before running the query
        ///
        /// If no file is given, the query runs against an empty store.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        data: Option<PathBuf>,
        /// Query file holding a single triple pattern per line, e.g.
        /// `?s <http://ex/name> ?n`, combined as a basic graph pattern
        ///
        /// This is not SPARQL text - parsing SPARQL syntax is outside
        /// this toolkit's scope; see the library's `ts-algebra` crate for
        /// the algebra this command compiles the pattern file into.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        pattern: PathBuf,
        /// Stop the query after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Print the optimizer's explain report instead of running the
        /// query
        #[arg(long)]
        explain: bool,
        /// Skip the optimizer pipeline
        #[arg(long)]
        no_optimize: bool,
    },
    /// Load an N-Triples file and report how many triples were inserted
    Load {
        /// N-Triples file to load
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        data: PathBuf,
    },
}
