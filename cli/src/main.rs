use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fuzzy_core::tokenizer::normalize;
use fuzzy_core::{default_delta, IndexConfig, QGramIndex, SearchResult, DEFAULT_TOP_K};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "fuzzy")]
#[command(about = "Fuzzy prefix search over an entity catalogue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
    /// Catalogue file (TSV, first line is a header)
    #[arg(long)]
    catalogue: PathBuf,
    /// Length of the q-grams
    #[arg(long, default_value_t = 3)]
    q: usize,
    /// Also index and match entity synonyms
    #[arg(long, default_value_t = false)]
    with_synonyms: bool,
}

impl IndexArgs {
    fn build(&self) -> Result<(QGramIndex, Duration)> {
        let config = IndexConfig { q: self.q, with_synonyms: self.with_synonyms };
        let start = Instant::now();
        let index = QGramIndex::build_from_file(config, &self.catalogue)
            .with_context(|| format!("building index from {}", self.catalogue.display()))?;
        Ok((index, start.elapsed()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and print its statistics
    Stats {
        #[command(flatten)]
        index: IndexArgs,
    },
    /// Search the catalogue; reads queries from stdin when none is given
    Query {
        #[command(flatten)]
        index: IndexArgs,
        /// Error budget; defaults to a quarter of the normalized query length
        #[arg(long, allow_negative_numbers = true)]
        delta: Option<i64>,
        /// Number of results to print
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Print results as JSON lines instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
        query: Option<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { index } => {
            let (built, took) = index.build()?;
            let stats = built.stats();
            println!("Built index from '{}' in {}ms.", index.catalogue.display(), took.as_millis());
            println!("entities: {}", stats.entities);
            println!("q-grams:  {}", stats.qgrams);
            println!("postings: {}", stats.postings);
            Ok(())
        }
        Commands::Query { index, delta, top_k, json, query } => {
            let (built, took) = index.build()?;
            tracing::info!(took_ms = took.as_millis() as u64, "index ready");
            let opts = QueryOpts { delta, top_k, json };
            match query {
                Some(q) => run_query(&built, &q, &opts),
                None => interactive(&built, &opts),
            }
        }
    }
}

struct QueryOpts {
    delta: Option<i64>,
    top_k: usize,
    json: bool,
}

fn interactive(index: &QGramIndex, opts: &QueryOpts) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        println!("{}", "-".repeat(80));
        print!("Query: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            println!();
            return Ok(());
        };
        if let Err(e) = run_query(index, &line?, opts) {
            eprintln!("error: {e:#}");
        }
    }
}

fn run_query(index: &QGramIndex, query: &str, opts: &QueryOpts) -> Result<()> {
    let delta = opts.delta.unwrap_or_else(|| default_delta(&normalize(query)) as i64);
    let start = Instant::now();
    let result = index.search(query, delta)?;
    let took = start.elapsed();

    if opts.json {
        print_json(query, delta, &result, opts.top_k)?;
    } else {
        print_text(&result, opts.top_k, took);
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonLine<'a> {
    query: &'a str,
    delta: i64,
    total_hits: usize,
    ped_computations: usize,
    results: &'a [fuzzy_core::Match<'a>],
}

fn print_json(query: &str, delta: i64, result: &SearchResult<'_>, top_k: usize) -> Result<()> {
    let shown = &result.matches[..top_k.min(result.matches.len())];
    let line = JsonLine {
        query,
        delta,
        total_hits: result.matches.len(),
        ped_computations: result.ped_computations,
        results: shown,
    };
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

fn print_text(result: &SearchResult<'_>, top_k: usize, took: Duration) {
    println!();
    print!("Found {} matches. ", result.matches.len());
    let shown = top_k.min(result.matches.len());
    if shown > 0 {
        println!("The top-{shown} results are:");
        for (i, m) in result.matches.iter().take(shown).enumerate() {
            let e = m.entity;
            print!("\n\x1b[1m({}) {}\x1b[0m ", i + 1, e.name);
            match m.matched_synonym {
                Some(syn) => println!("(Matched Synonym: '{syn}')"),
                None => println!(),
            }
            println!("Description:   {}", e.description.as_deref().unwrap_or("-"));
            if let Some(url) = &e.wikipedia_url {
                println!("Wikipedia-URL: {url}");
            }
            if let Some(id) = &e.wikidata_id {
                println!("Wikidata-URL:  http://www.wikidata.org/wiki/{id}");
            }
            println!("PED:           {}", m.ped);
            println!("Score:         {}", e.score);
        }
    }
    println!();
    println!(
        "Time needed to find matches: {:.3}ms, #PED computations: {}.",
        took.as_secs_f64() * 1000.0,
        result.ped_computations
    );
}
