use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use renest_graph::load_facts;
use renest_nest::{
    auto_nest_all, nesting_status, rank, NestKind, NestingGraph, DEFAULT_MIN_SCORE,
};

#[derive(Parser)]
#[command(name = "renest", version, about = "Nesting inference for stripped class graphs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the ranked enclosing-subject candidates for one class
    Rank(RankArgs),
    /// Infer nesting for every eligible class and write a mapping file
    AutoNest(AutoNestArgs),
    /// Print a nesting status summary
    Status(StatusArgs),
}

#[derive(Args)]
struct RankArgs {
    /// Class facts captured from the compiled input (JSON)
    facts: PathBuf,
    /// Internal name of the class to rank, e.g. `com/example/Foo$1`
    class: String,
    /// Restrict method-level entries to this enclosing class
    #[arg(long)]
    select: Option<String>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AutoNestArgs {
    /// Class facts captured from the compiled input (JSON)
    facts: PathBuf,
    /// Mapping file to write (must not exist yet)
    #[arg(long)]
    out: PathBuf,
    /// Minimum candidate score needed to commit an assignment
    #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
    min_score: u8,
    /// Mapping file to apply before inference runs
    #[arg(long)]
    mappings: Option<PathBuf>,
}

#[derive(Args)]
struct StatusArgs {
    /// Class facts captured from the compiled input (JSON)
    facts: PathBuf,
    /// Mapping file to apply before counting
    #[arg(long)]
    mappings: Option<PathBuf>,
    /// Only count classes that came from the analyzed input
    #[arg(long)]
    inputs_only: bool,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Rank(args) => {
            let graph = open_graph(&args.facts, None)?;
            let Some(class) = graph.graph().class_by_name(&args.class) else {
                bail!("class `{}` is not in the facts file", args.class);
            };
            let selected = match &args.select {
                Some(name) => Some(
                    graph
                        .graph()
                        .class_by_name(name)
                        .with_context(|| format!("selected class `{name}` is not in the facts file"))?,
                ),
                None => None,
            };

            let rows: Vec<RankRow> = rank(&graph, class, selected)
                .iter()
                .map(|c| RankRow {
                    subject: graph.subject_display(c.subject),
                    kind: kind_name(c.kind),
                    score: c.score,
                })
                .collect();

            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("no candidates for {}", args.class);
            } else {
                for row in &rows {
                    println!("{:>3}  {:<9}  {}", row.score, row.kind, row.subject);
                }
            }
            Ok(0)
        }
        Command::AutoNest(args) => {
            let mut graph = open_graph(&args.facts, args.mappings.as_deref())?;

            let total = graph.graph().class_count();
            let assigned = auto_nest_all(&mut graph, args.min_score, |fraction| {
                info!(progress = %format_args!("{:.0}%", fraction * 100.0), "auto-nesting");
            });
            info!(assigned, total, "inference finished");

            if renest_mappings::write(&args.out, &graph)
                .with_context(|| format!("writing mappings to {}", args.out.display()))?
            {
                println!("wrote {} assignments to {}", count_nested(&graph), args.out.display());
            } else {
                println!("no classes nested, nothing written");
            }
            Ok(0)
        }
        Command::Status(args) => {
            let graph = open_graph(&args.facts, args.mappings.as_deref())?;
            let status = nesting_status(&graph, args.inputs_only);

            if args.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("classes:   {}", status.total_classes);
                println!("nested:    {}", status.nested_classes);
                println!("anonymous: {}", status.anonymous_classes);
                println!("inner:     {}", status.inner_classes);
            }
            Ok(0)
        }
    }
}

fn open_graph(facts: &std::path::Path, mappings: Option<&std::path::Path>) -> Result<NestingGraph> {
    let class_graph =
        load_facts(facts).with_context(|| format!("loading facts from {}", facts.display()))?;
    let mut graph = NestingGraph::new(class_graph);

    if let Some(path) = mappings {
        let summary = renest_mappings::read(path, &mut graph)
            .with_context(|| format!("reading mappings from {}", path.display()))?;
        info!(
            applied = summary.applied,
            skipped = summary.skipped,
            healed = summary.healed,
            "applied existing mappings"
        );
    }

    Ok(graph)
}

fn count_nested(graph: &NestingGraph) -> usize {
    graph.graph().class_ids().filter(|&c| graph.has_nest(c)).count()
}

fn kind_name(kind: NestKind) -> &'static str {
    match kind {
        NestKind::Anonymous => "anonymous",
        NestKind::Inner => "inner",
        NestKind::Dummy => "dummy",
    }
}

#[derive(Serialize)]
struct RankRow {
    subject: String,
    kind: &'static str,
    score: u8,
}
