use anyhow::{anyhow, bail, Context};
use clap::Parser;
use seqscope::results::{FilterSpec, FilteredResultSet};
use seqscope::{loader, MatchConfig, SearchIndex, Snippet, SubSequence};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "seqscope", version, about = "Find recurring interaction sequences in event logs")]
struct Cli {
    /// Log files or directories (one JSON event per line)
    #[arg(required = true)]
    logs: Vec<PathBuf>,

    /// Query file in the same format as the logs
    #[arg(long = "query", conflicts_with = "query_log")]
    query: Option<PathBuf>,

    /// Cut the query out of an indexed log (use with --query-range)
    #[arg(long = "query-log", requires = "query_range")]
    query_log: Option<String>,
    /// Half-open event range `start..end` inside --query-log
    #[arg(long = "query-range")]
    query_range: Option<String>,

    /// JSON file with matching parameters
    #[arg(long = "config")]
    config: Option<PathBuf>,
    #[arg(long = "ngram")] ngram_length: Option<usize>,
    #[arg(long = "density")] density: Option<f64>,
    #[arg(long = "threshold")] threshold: Option<f64>,
    #[arg(long = "elongation")] elongation: Option<usize>,
    #[arg(long = "fraction")] fraction: Option<f64>,
    /// Match logs on the worker pool
    #[arg(long = "parallel", default_value_t = false)] parallel: bool,

    /// Output format: json | table
    #[arg(long = "format", default_value = "json")] format: String,
    /// Keep at most N results per category
    #[arg(long = "top")] top: Option<usize>,
    /// Tracing filter, e.g. `info` or `seqscope=debug`
    #[arg(long = "log-level", default_value = "warn")] log_level: String,
}

fn build_config(cli: &Cli) -> anyhow::Result<MatchConfig> {
    let mut cfg = match &cli.config {
        Some(p) => MatchConfig::from_json_file(p).with_context(|| format!("loading {}", p.display()))?,
        None => MatchConfig::default(),
    };
    if let Some(n) = cli.ngram_length { cfg.ngram_length = n; }
    if let Some(d) = cli.density { cfg.ngram_density = d; }
    if let Some(t) = cli.threshold { cfg.admittance_threshold = t; }
    if let Some(e) = cli.elongation { cfg.elongation_factor = e; }
    if let Some(f) = cli.fraction { cfg.fraction_to_match = f; }
    cfg.parallel_matching = cli.parallel;
    Ok(cfg)
}

fn parse_range(s: &str) -> anyhow::Result<(usize, usize)> {
    let (a, b) = s.split_once("..").ok_or_else(|| anyhow!("range must look like start..end, got {s:?}"))?;
    let start: usize = a.trim().parse().with_context(|| format!("bad range start {a:?}"))?;
    let end: usize = b.trim().parse().with_context(|| format!("bad range end {b:?}"))?;
    if start >= end {
        bail!("empty query range {start}..{end}");
    }
    Ok((start, end))
}

fn build_query(cli: &Cli, index: &SearchIndex) -> anyhow::Result<Snippet> {
    if let Some(p) = &cli.query {
        return Ok(loader::read_snippet_file(p)?);
    }
    let (Some(id), Some(range)) = (&cli.query_log, &cli.query_range) else {
        bail!("either --query or --query-log with --query-range is required");
    };
    let log = index.log_by_id(id).ok_or_else(|| anyhow!("no indexed log with id {id:?}"))?;
    let (start, end) = parse_range(range)?;
    if end > log.len() {
        bail!("range {start}..{end} exceeds log {id} of {} events", log.len());
    }
    Ok(SubSequence::new(start, end, log, 0.0).sub_snippet())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)))
        .with_writer(std::io::stderr)
        .init();

    let cfg = build_config(&cli)?;
    let mut index = SearchIndex::new(cfg)?;
    let logs = loader::read_paths(&cli.logs)?;
    tracing::info!(files = logs.len(), "loaded logs");
    index.index(logs.into_iter().map(Arc::new))?;

    let query = build_query(&cli, &index)?;
    let mut urs = index.find_matches(&query)?;

    let spec = FilterSpec { limit: cli.top, ..Default::default() };
    let sections: [(&str, FilteredResultSet); 4] = [
        ("strong_matches", urs.strong_matches.filter(&spec)),
        ("weak_matches", urs.weak_matches.filter(&spec)),
        ("elongated_matches", urs.elongated_matches.filter(&spec)),
        ("alt_ending_matches", urs.alt_ending_matches.filter(&spec)),
    ];

    if cli.format == "table" {
        print_table(&sections);
    } else {
        let mut out = serde_json::Map::new();
        out.insert("query".into(), serde_json::json!(query.id()));
        for (name, set) in &sections {
            out.insert((*name).into(), serde_json::to_value(set.results())?);
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
    }
    Ok(())
}

fn print_table(sections: &[(&str, FilteredResultSet)]) {
    for (name, set) in sections {
        println!("\n# {} ({})", name, set.len());
        if set.is_empty() {
            continue;
        }
        println!("{:<8} {:<8} {:<10} {}", "Start", "End", "Distance", "Log");
        for s in set.results() {
            println!("{:<8} {:<8} {:<10.4} {}", s.start(), s.end(), s.distance(), s.snippet().id());
        }
    }
}
