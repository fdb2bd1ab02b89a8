use anyhow::Result;
use boolrank_core::{
    build_index, has_existing_index, parse_boolean_query, IndexReader, SessionConfig,
    StemmerAlgorithm, TokenProcessor, Tokenizer, WeighingScheme,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use std::path::{Path, PathBuf};

mod corpus;

use corpus::DirectoryCorpus;

#[derive(Parser)]
#[command(name = "boolrank")]
#[command(about = "Build and query a positional inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from JSON/JSONL/text files or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Weighing scheme: default, tfidf, okapi or wacky
        #[arg(long, default_value_t = WeighingScheme::Default)]
        scheme: WeighingScheme,
        /// Stemmer applied to every token, or "none"
        #[arg(long, default_value_t = StemmerAlgorithm::English)]
        stemmer: StemmerAlgorithm,
    },
    /// Run a boolean query: `+` separates OR groups, quotes mark phrases
    Query {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        query: String,
    },
    /// Run a ranked bag-of-terms query
    Rank {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        /// Number of results
        #[arg(long, default_value_t = boolrank_core::config::DEFAULT_TOP_K)]
        k: usize,
        /// Expected weighing scheme; defaults to the one the index was built with
        #[arg(long)]
        scheme: Option<WeighingScheme>,
        query: String,
    },
    /// Print the first terms of the vocabulary
    Vocab {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long, default_value_t = 1000)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, scheme, stemmer } => {
            let corpus = DirectoryCorpus::load(&input)?;
            let session = SessionConfig { scheme, stemmer, ..SessionConfig::default() };
            let meta = build_index(&corpus, &TokenProcessor::new(stemmer), &session, &output)?;
            println!("indexed {} documents into {}", meta.num_docs, output.display());
            Ok(())
        }
        Commands::Query { index, query } => {
            let reader = open(&index, None)?;
            let tokenizer = TokenProcessor::new(reader.meta().stemmer);
            let Some(node) = parse_boolean_query(&query, &tokenizer) else {
                println!("no matches");
                return Ok(());
            };
            let postings = reader.boolean_query(&node)?;
            if postings.is_empty() {
                println!("no matches");
            }
            for p in &postings {
                let title = reader.document(p.doc_id).map(|d| d.title.as_str()).unwrap_or("");
                println!("{}\t{}", p.doc_id, title);
            }
            println!("{} documents", postings.len());
            Ok(())
        }
        Commands::Rank { index, k, scheme, query } => {
            let reader = open(&index, scheme)?;
            let tokenizer = TokenProcessor::new(reader.meta().stemmer);
            let terms: Vec<String> = query
                .split_whitespace()
                .flat_map(|raw| tokenizer.normalize(raw))
                .collect();
            let results = reader.ranked_query_k(&terms, k)?;
            if results.is_empty() {
                println!("no matches");
            }
            for (rank, hit) in results.iter().enumerate() {
                let title = reader.document(hit.doc_id).map(|d| d.title.as_str()).unwrap_or("");
                println!("{:>3}. {:.6}\t{}\t{}", rank + 1, hit.score, hit.doc_id, title);
            }
            Ok(())
        }
        Commands::Vocab { index, limit } => {
            let reader = open(&index, None)?;
            let vocab = boolrank_core::IndexSource::vocabulary(&reader)?;
            for term in vocab.iter().take(limit) {
                println!("{term}");
            }
            println!("{} terms", vocab.len());
            Ok(())
        }
    }
}

fn open(index: &Path, scheme: Option<WeighingScheme>) -> Result<IndexReader> {
    if !has_existing_index(index) {
        anyhow::bail!("no index found at {}", index.display());
    }
    let reader = match scheme {
        Some(scheme) => IndexReader::open(index, SessionConfig::with_scheme(scheme))?,
        None => IndexReader::open_stamped(index)?,
    };
    Ok(reader)
}
