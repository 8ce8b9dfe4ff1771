//! Wordspace CLI
//!
//! Loads an embedding file and answers similarity queries interactively.

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wordspace::command::HELP;
use wordspace::persistence::{load_snapshot, save_snapshot};
use wordspace::vector::Neighbor;
use wordspace::{
    load_embeddings, EmbeddingStore, ExecutorConfig, LoadOptions, QueryCommand, SimilarityEngine,
};

/// Wordspace CLI - Embedding Similarity Shell
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// word2vec binary vector file
    #[arg(long, required_unless_present = "snapshot")]
    vectors: Option<PathBuf>,

    /// Vocabulary file with term counts
    #[arg(long)]
    vocab: Option<PathBuf>,

    /// Maximum number of words to load
    #[arg(long)]
    max_words: Option<usize>,

    /// Load only words counted at least this often (needs --vocab)
    #[arg(long)]
    min_frequency: Option<i64>,

    /// Number of worker threads
    #[arg(short, long, default_value_t = wordspace::parallel::DEFAULT_WORKERS)]
    threads: usize,

    /// Pin worker threads to CPU cores
    #[arg(long)]
    pin_cores: bool,

    /// Keep vectors as loaded instead of scaling to unit length
    #[arg(long)]
    no_normalize: bool,

    /// Default number of results per query
    #[arg(short = 'k', long, default_value_t = 10)]
    top: usize,

    /// Load a snapshot instead of a word2vec file
    #[arg(long, conflicts_with_all = ["vectors", "vocab", "max_words", "min_frequency"])]
    snapshot: Option<PathBuf>,

    /// Write the loaded store to a snapshot file
    #[arg(long)]
    save_snapshot: Option<PathBuf>,
}

fn load_store(args: &Args) -> anyhow::Result<EmbeddingStore> {
    if let Some(path) = &args.snapshot {
        return Ok(load_snapshot(path)?);
    }

    let Some(vectors) = &args.vectors else {
        anyhow::bail!("Either --vectors or --snapshot is required");
    };
    let mut options = LoadOptions::default();
    if let Some(max) = args.max_words {
        options = options.with_max_words(max);
    }
    if let Some(min) = args.min_frequency {
        options = options.with_min_frequency(min);
    }
    Ok(load_embeddings(vectors, args.vocab.as_deref(), &options)?)
}

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("wordspace=info".parse()?))
        .init();

    let args = Args::parse();

    let store = load_store(&args)?;
    if let Some(path) = &args.save_snapshot {
        save_snapshot(&store, path)?;
    }

    let config = ExecutorConfig::default()
        .with_workers(args.threads)
        .with_pinning(args.pin_cores);
    let mut engine = SimilarityEngine::with_config(store, config)?;

    if !args.no_normalize {
        engine.normalize_all()?;
    }

    info!(
        "Ready: {} terms, {} dimensions, {} workers",
        engine.store().len(),
        engine.store().dimension(),
        args.threads
    );
    println!("Type 'help' for available commands, 'quit' to exit.\n");

    loop {
        print!("wordspace> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match QueryCommand::parse(input) {
            Ok(QueryCommand::Quit) => {
                println!("Goodbye!");
                break;
            }
            Ok(command) => {
                if let Err(e) = run_command(&engine, command, args.top) {
                    eprintln!("Error: {}", e);
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

fn run_command(engine: &SimilarityEngine, command: QueryCommand, top: usize) -> anyhow::Result<()> {
    match command {
        QueryCommand::Similar { term, k } => match engine.similar_to_term(&term, k.unwrap_or(top))? {
            Some(neighbors) => print_neighbors(&neighbors),
            None => println!("(not found) {}", term),
        },

        QueryCommand::Best { term } => {
            let Some(vector) = engine.store().get(&term) else {
                println!("(not found) {}", term);
                return Ok(());
            };
            match engine.top_k(vector, 2)?.into_iter().find(|n| n.term != term) {
                Some(best) => print_neighbors(&[best]),
                None => println!("(no other terms)"),
            }
        }

        QueryCommand::Analogy { positive, negative } => {
            let neighbors = engine.solve_analogy(&positive, &negative, top)?;
            if neighbors.is_empty() {
                println!("(no known terms)");
            } else {
                print_neighbors(&neighbors);
            }
        }

        QueryCommand::Frequency { term } => {
            let store = engine.store();
            match (store.frequency(&term), store.rank(&term)) {
                (Some(count), Some(rank)) if count >= 0 => {
                    println!("{}: frequency {}, rank {}", term, count, rank)
                }
                (Some(_), Some(rank)) => println!("{}: frequency unknown, rank {}", term, rank),
                _ => println!("(not found) {}", term),
            }
        }

        QueryCommand::Stats => {
            println!(
                "{} terms, {} dimensions",
                engine.store().len(),
                engine.store().dimension()
            );
            println!("{}", engine.metrics().summary());
        }

        QueryCommand::Help => println!("{}", HELP),

        QueryCommand::Quit => {}
    }
    Ok(())
}

fn print_neighbors(neighbors: &[Neighbor]) {
    for (i, n) in neighbors.iter().enumerate() {
        println!("{:>3}. {:<30} {:.6}", i + 1, n.term, n.score);
    }
}
