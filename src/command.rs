//! Query Commands
//!
//! Parses lines typed at the interactive query shell.

use crate::error::{Result, SpaceError};

/// Help text listing every shell command
pub const HELP: &str = "\
Available commands:
  similar <term> [k]          Terms most similar to <term>
  best <term>                 Closest other term to <term>
  analogy <term> [+t|-t]...   Terms closest to the sum (+) / difference (-) of vectors
                              e.g. analogy king -man +woman
  freq <term>                 Corpus frequency and rank of <term>
  stats                       Store size and query latencies
  help                        Show this message
  quit                        Exit";

/// Parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryCommand {
    /// Top-K neighbours of a stored term
    Similar { term: String, k: Option<usize> },

    /// Single best neighbour of a stored term
    Best { term: String },

    /// Vector arithmetic over stored terms
    Analogy {
        positive: Vec<String>,
        negative: Vec<String>,
    },

    /// Frequency lookup
    Frequency { term: String },

    Stats,
    Help,
    Quit,
}

impl QueryCommand {
    /// Parse one input line
    pub fn parse(input: &str) -> Result<Self> {
        let mut parts = input.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| SpaceError::Command("Empty command".to_string()))?
            .to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        match name.as_str() {
            "similar" | "sim" => match args.as_slice() {
                [term] => Ok(QueryCommand::Similar {
                    term: term.to_string(),
                    k: None,
                }),
                [term, k] => {
                    let k = k.parse().map_err(|_| {
                        SpaceError::Command(format!("Invalid count: {}", k))
                    })?;
                    Ok(QueryCommand::Similar {
                        term: term.to_string(),
                        k: Some(k),
                    })
                }
                _ => Err(usage("similar <term> [k]")),
            },

            "best" => match args.as_slice() {
                [term] => Ok(QueryCommand::Best {
                    term: term.to_string(),
                }),
                _ => Err(usage("best <term>")),
            },

            "analogy" => Self::parse_analogy(&args),

            "freq" | "frequency" => match args.as_slice() {
                [term] => Ok(QueryCommand::Frequency {
                    term: term.to_string(),
                }),
                _ => Err(usage("freq <term>")),
            },

            "stats" => Ok(QueryCommand::Stats),
            "help" => Ok(QueryCommand::Help),
            "quit" | "exit" => Ok(QueryCommand::Quit),

            other => Err(SpaceError::Command(format!("Unknown command: {}", other))),
        }
    }

    fn parse_analogy(args: &[&str]) -> Result<Self> {
        if args.is_empty() {
            return Err(usage("analogy <term> [+term|-term]..."));
        }

        let mut positive = Vec::new();
        let mut negative = Vec::new();
        for &arg in args {
            let (target, term) = match arg.strip_prefix('-') {
                Some(rest) => (&mut negative, rest),
                None => (&mut positive, arg.strip_prefix('+').unwrap_or(arg)),
            };
            if term.is_empty() {
                return Err(SpaceError::Command(format!("Missing term after {:?}", arg)));
            }
            target.push(term.to_string());
        }

        Ok(QueryCommand::Analogy { positive, negative })
    }
}

fn usage(syntax: &str) -> SpaceError {
    SpaceError::Command(format!("Usage: {}", syntax))
}
