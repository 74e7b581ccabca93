use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sqmap::config::{MappingConfig, RetryPolicy, ServiceConfig, DEFAULT_CONTEXT};
use sqmap::db::{self, seed};
use sqmap::export;
use sqmap::index::{CandidateIndex, Embedder, HttpEmbedder, TrigramEmbedder};
use sqmap::report::{render_markdown, MappingSummary};
use sqmap::resolve::{
    CustomRule, HttpReasoningService, Resolver, RuleResolver, RuleTable, VerificationResolver,
};
use sqmap::script::{self, ScriptOptions};
use sqmap::types::{SchemaMapping, SchemaSnapshot};
use sqmap::MappingEngine;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "sqmap")]
#[command(about = "Map a legacy SQLite schema onto a modern one and generate the migration script")]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the sample legacy and modern databases
    Seed {
        #[arg(long, default_value = "legacy.db")]
        legacy: PathBuf,

        #[arg(long, default_value = "modern.db")]
        modern: PathBuf,
    },

    /// Print the schema snapshot of a database
    Extract {
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Propose mappings for every legacy column and write the migration script
    Map(MapArgs),

    /// Regenerate a script from a saved mapping (JSON)
    Script {
        #[arg(value_name = "MAPPING")]
        mapping: PathBuf,

        /// Quote identifiers that need it
        #[arg(long)]
        quote: bool,

        /// Append row-count validation queries
        #[arg(long)]
        validation: bool,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct MapArgs {
    /// Legacy database file
    #[arg(long)]
    legacy: PathBuf,

    /// Modern database file (required for the verified strategy)
    #[arg(long)]
    modern: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "rules")]
    strategy: Strategy,

    /// CSV rule file with a `kind,legacy,modern` header
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Extra rule as PATTERN=REPLACEMENT; `*` wildcards rewrite existing rules
    #[arg(long = "rule", value_name = "PATTERN=REPLACEMENT")]
    custom_rules: Vec<String>,

    /// Ignore the built-in rule table
    #[arg(long)]
    no_builtin_rules: bool,

    /// Concurrent column resolutions
    #[arg(long, default_value = "1")]
    workers: usize,

    /// Migration script output file (stdout if omitted)
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Markdown report output file
    #[arg(long)]
    report: Option<PathBuf>,

    /// CSV export of the accepted mappings
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the full mapping as JSON instead of a script
    #[arg(long)]
    json: bool,

    /// Quote identifiers that need it in the generated script
    #[arg(long)]
    quote: bool,

    /// Use the built-in trigram embedder instead of an embedding service
    #[arg(long)]
    offline_embeddings: bool,

    /// Context note sent with every verification prompt
    #[arg(long, default_value = DEFAULT_CONTEXT)]
    context: String,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(clap::Args)]
struct ServiceArgs {
    /// Base URL of the OpenAI-compatible reasoning API
    #[arg(long, env = "SQMAP_LLM_URL")]
    llm_url: Option<String>,

    #[arg(long, env = "SQMAP_LLM_MODEL", default_value = "gpt-4o-mini")]
    llm_model: String,

    /// Base URL of the embedding API (defaults to the reasoning API)
    #[arg(long, env = "SQMAP_EMBED_URL")]
    embed_url: Option<String>,

    #[arg(long, env = "SQMAP_EMBED_MODEL", default_value = "text-embedding-3-small")]
    embed_model: String,

    #[arg(long, env = "SQMAP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Retries after a transient failure
    #[arg(long, default_value = "1")]
    retries: u32,
}

impl ServiceArgs {
    fn config(&self, base_url: &str, model: &str) -> ServiceConfig {
        ServiceConfig::new(base_url, model)
            .with_api_key(self.api_key.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry(RetryPolicy {
                max_retries: self.retries,
                ..RetryPolicy::default()
            })
    }
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// Deterministic rule table, no network
    Rules,
    /// Candidate retrieval plus verification by a reasoning service
    Verified,
}

fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Seed { legacy, modern } => run_seed(&legacy, &modern),
        Commands::Extract { database, json } => run_extract(&database, json),
        Commands::Map(args) => run_map(args),
        Commands::Script {
            mapping,
            quote,
            validation,
            out,
        } => run_script(&mapping, quote, validation, out.as_deref()),
    }
}

fn run_seed(legacy: &Path, modern: &Path) -> Result<()> {
    seed::seed_legacy(legacy)
        .with_context(|| format!("Failed to create {}", legacy.display()))?;
    seed::seed_modern(modern)
        .with_context(|| format!("Failed to create {}", modern.display()))?;
    println!("Created {} and {}", legacy.display(), modern.display());
    Ok(())
}

fn run_extract(database: &Path, json: bool) -> Result<()> {
    let snapshot = db::extract_path(database)
        .with_context(|| format!("Failed to read schema: {}", database.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        for table in &snapshot.tables {
            println!("{}\n", table.description());
        }
        println!(
            "{} tables, {} columns",
            snapshot.tables.len(),
            snapshot.column_count()
        );
    }
    Ok(())
}

fn build_rules(args: &MapArgs) -> Result<RuleTable> {
    let mut rules = if args.no_builtin_rules {
        RuleTable::new()
    } else {
        RuleTable::builtin()
    };
    if let Some(path) = &args.rules {
        let extra = RuleTable::from_csv_path(path)
            .with_context(|| format!("Failed to load rules: {}", path.display()))?;
        rules = rules.merged(&extra);
    }

    let custom = args
        .custom_rules
        .iter()
        .map(|raw| {
            CustomRule::parse(raw)
                .with_context(|| format!("Invalid rule '{}', expected PATTERN=REPLACEMENT", raw))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(rules.with_custom_rules(&custom))
}

fn run_map(args: MapArgs) -> Result<()> {
    let legacy = db::extract_path(&args.legacy)
        .with_context(|| format!("Failed to read legacy schema: {}", args.legacy.display()))?;
    let config = MappingConfig::default().with_workers(args.workers);

    let mapping = match args.strategy {
        Strategy::Rules => {
            let resolver = RuleResolver::new(build_rules(&args)?);
            MappingEngine::new(&resolver)
                .with_config(config)
                .map(&legacy)?
        }
        Strategy::Verified => {
            let Some(modern_path) = &args.modern else {
                bail!("--modern is required for the verified strategy");
            };
            let Some(llm_url) = &args.service.llm_url else {
                bail!("--llm-url (or SQMAP_LLM_URL) is required for the verified strategy");
            };

            let modern = db::extract_path(modern_path).with_context(|| {
                format!("Failed to read modern schema: {}", modern_path.display())
            })?;

            let embedder: Box<dyn Embedder> = if args.offline_embeddings {
                Box::new(TrigramEmbedder)
            } else {
                let url = args.service.embed_url.as_deref().unwrap_or(llm_url);
                Box::new(HttpEmbedder::new(
                    args.service.config(url, &args.service.embed_model),
                )?)
            };
            let mut index = CandidateIndex::new(embedder);
            index.index(&modern).context("Failed to index modern schema")?;

            let service =
                HttpReasoningService::new(args.service.config(llm_url, &args.service.llm_model))?;
            let resolver = VerificationResolver::new(service).with_context(args.context.clone());
            run_engine(&resolver, &index, config, &legacy)?
        }
    };

    let summary = MappingSummary::from_mapping(&mapping);
    info!(
        high = summary.high_confidence,
        medium = summary.medium_confidence,
        "confidence bands"
    );

    if let Some(path) = &args.report {
        std::fs::write(path, render_markdown(&mapping))
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
    }
    if let Some(path) = &args.csv {
        export::export_csv(path, &mapping.accepted)
            .with_context(|| format!("Failed to export CSV: {}", path.display()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&mapping)?);
    } else {
        let options = ScriptOptions {
            quote_identifiers: args.quote,
        };
        write_output(
            args.out.as_deref(),
            &script::generate_with(&mapping.accepted, options),
        )?;
        for item in &mapping.unmapped_items {
            eprintln!("unmapped: {}", item);
        }
    }

    eprintln!("{}", summary.headline());
    Ok(())
}

fn run_engine(
    resolver: &dyn Resolver,
    index: &CandidateIndex,
    config: MappingConfig,
    legacy: &SchemaSnapshot,
) -> Result<SchemaMapping> {
    Ok(MappingEngine::new(resolver)
        .with_index(index)
        .with_config(config)
        .map(legacy)?)
}

fn run_script(mapping: &Path, quote: bool, validation: bool, out: Option<&Path>) -> Result<()> {
    let raw = std::fs::read_to_string(mapping)
        .with_context(|| format!("Failed to read mapping: {}", mapping.display()))?;
    let mapping: SchemaMapping =
        serde_json::from_str(&raw).context("Mapping file is not a valid SchemaMapping")?;

    let options = ScriptOptions {
        quote_identifiers: quote,
    };
    let mut output = script::generate_with(&mapping.accepted, options);
    if validation {
        let checks = script::generate_validation(&mapping.accepted, options);
        if !checks.is_empty() {
            output.push('\n');
            output.push_str(&checks);
        }
    }
    write_output(out, &output)
}

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", contents),
    }
    Ok(())
}
