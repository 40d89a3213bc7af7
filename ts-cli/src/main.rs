use crate::cli::{Args, Command};
use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use ts_algebra::{Algebra, ParsedQuery, QueryType};
use ts_engine::{QueryOptions, QueryOutcome, Store};
use ts_executor::{QueryResults, UpdateOperation};
use ts_model::{Term, Variable};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;
mod pattern;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Args::parse().command {
        Command::Load { data } => load(&data),
        Command::Query { data, pattern, timeout_ms, explain, no_optimize } => {
            query(data.as_deref(), &pattern, timeout_ms, explain, no_optimize)
        }
    }
}

fn build_store_from_ntriples(data: &Path) -> anyhow::Result<(Store, u64)> {
    let store = Store::new();
    let file = File::open(data).with_context(|| format!("failed to open {}", data.display()))?;
    let mut inserted = 0u64;
    for triple in oxttl::NTriplesParser::new().for_reader(file) {
        let triple = triple.with_context(|| format!("invalid N-Triples in {}", data.display()))?;
        let ground = pattern::triple_to_ground(triple);
        inserted += store.update(&[UpdateOperation::InsertData(vec![ground])])?;
    }
    Ok((store, inserted))
}

fn load(data: &Path) -> anyhow::Result<()> {
    let (_store, inserted) = build_store_from_ntriples(data)?;
    println!("loaded {inserted} triples");
    Ok(())
}

fn query(
    data: Option<&Path>,
    pattern_file: &Path,
    timeout_ms: Option<u64>,
    explain: bool,
    no_optimize: bool,
) -> anyhow::Result<()> {
    let store = match data {
        Some(path) => build_store_from_ntriples(path)?.0,
        None => Store::new(),
    };

    let reader = BufReader::new(
        File::open(pattern_file).with_context(|| format!("failed to open {}", pattern_file.display()))?,
    );
    let mut patterns = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        patterns.push(pattern::parse_pattern_line(line)?);
    }

    let mut variables: Vec<Variable> = Vec::new();
    for p in &patterns {
        for v in [&p.subject, &p.predicate, &p.object] {
            if let ts_model::TermOrVariable::Variable(v) = v {
                if !variables.contains(v) {
                    variables.push(v.clone());
                }
            }
        }
    }

    let parsed = ParsedQuery {
        query_type: QueryType::Select,
        pattern: Algebra::project(Algebra::bgp(patterns), variables.clone()),
        dataset: vec![],
        base_iri: None,
        template: vec![],
    };

    let options = QueryOptions { timeout_ms, explain, optimize: !no_optimize };
    match store.query(parsed, options)? {
        QueryOutcome::Explain(explanation) => {
            println!("original:  {}", explanation.original);
            println!("folded:    {}", explanation.after_constant_folding.tree);
            println!("reordered: {}", explanation.after_reordering.tree);
            println!("final:     {}", explanation.final_tree);
        }
        QueryOutcome::Results(QueryResults::Select { variables, rows }) => {
            println!("{}", variables.iter().map(Variable::to_string).collect::<Vec<_>>().join("\t"));
            for row in rows {
                let cells: Vec<String> = variables
                    .iter()
                    .map(|v| row.get(v).map(format_term).unwrap_or_default())
                    .collect();
                println!("{}", cells.join("\t"));
            }
        }
        QueryOutcome::Results(_) => unreachable!("ts query only ever builds a SELECT"),
    }
    Ok(())
}

fn format_term(term: &Term) -> String {
    term.to_string()
}
