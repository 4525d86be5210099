use anyhow::{bail, Context, Result};
use canopy::config::{load_from_path, CompiledQuery};
use canopy::grammar::{lookup, supported_names};
use canopy::{Node, Parser as SyntaxParser, Query, Tree};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Parse, walk, and query source files with tree-sitter grammars", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported grammar names
    Languages,

    /// Print the syntax tree of a file as an S-expression
    Parse {
        file: PathBuf,

        #[command(flatten)]
        lang: LangArg,

        /// Print node count and error flag instead of the tree
        #[arg(long)]
        stats: bool,
    },

    /// Walk a file's syntax tree depth-first with a cursor
    Walk {
        file: PathBuf,

        #[command(flatten)]
        lang: LangArg,
    },

    /// Run query patterns over a file
    Query {
        file: PathBuf,

        /// Grammar name (required with --pattern)
        #[arg(short, long, requires = "pattern")]
        language: Option<String>,

        /// Query pattern in S-expression syntax
        #[arg(short, long, requires = "language", conflicts_with = "config")]
        pattern: Option<String>,

        /// Query-set TOML file
        #[arg(short, long, required_unless_present = "pattern")]
        config: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Group captures by match
        #[arg(long)]
        matches: bool,
    },
}

#[derive(Args)]
struct LangArg {
    /// Grammar name, e.g. python or rust
    #[arg(short, long)]
    language: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Languages => cmd_languages(),
        Commands::Parse { file, lang, stats } => cmd_parse(&file, &lang.language, stats),
        Commands::Walk { file, lang } => cmd_walk(&file, &lang.language),
        Commands::Query {
            file,
            language,
            pattern,
            config,
            json,
            matches,
        } => {
            let queries = match (config, language, pattern) {
                (Some(config), _, _) => load_queries(&config)?,
                (None, Some(language), Some(pattern)) => vec![compile_inline(&language, &pattern)?],
                _ => bail!("either --config or both --language and --pattern are required"),
            };
            cmd_query(&file, &queries, json, matches)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "canopy=debug" } else { "canopy=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber installed earlier in the process wins; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn cmd_languages() -> Result<()> {
    for name in supported_names() {
        println!("{name}");
    }
    Ok(())
}

/// Read `file` and parse it with the grammar called `language`.
fn parse_file(file: &Path, language: &str) -> Result<Tree> {
    let lang = lookup(language)?;
    let source =
        fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut parser = SyntaxParser::with_grammar(&lang)?;
    let tree = parser
        .parse(source, None)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    debug!(file = %file.display(), language, "parsed");
    Ok(tree)
}

fn cmd_parse(file: &Path, language: &str, stats: bool) -> Result<()> {
    let tree = parse_file(file, language)?;
    let root = tree.root_node();

    if !stats {
        println!("{}", root.to_sexp());
        return Ok(());
    }

    let mut count = 0usize;
    let mut cursor = root.walk();
    loop {
        count += 1;
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                println!("{} {}", "nodes:".bold(), count);
                let errors = if root.has_error() {
                    "yes".red()
                } else {
                    "no".green()
                };
                println!("{} {}", "errors:".bold(), errors);
                return Ok(());
            }
        }
    }
}

fn cmd_walk(file: &Path, language: &str) -> Result<()> {
    let tree = parse_file(file, language)?;
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        let indent = "  ".repeat(cursor.depth() as usize);
        let kind = if node.is_named() {
            node.kind().normal()
        } else {
            format!("{:?}", node.kind()).dimmed()
        };
        let span = format!("[{} - {}]", node.start_point(), node.end_point()).dimmed();
        match cursor.current_field_name() {
            Some(field) => println!("{indent}{}: {kind} {span}", field.cyan()),
            None => println!("{indent}{kind} {span}"),
        }

        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return Ok(());
            }
        }
    }
}

fn load_queries(path: &Path) -> Result<Vec<(String, CompiledQuery)>> {
    let set = load_from_path(path)?;
    let compiled = set
        .compile()
        .with_context(|| format!("failed to compile queries in {}", path.display()))?;
    Ok(compiled
        .into_iter()
        .map(|query| (set.language.clone(), query))
        .collect())
}

fn compile_inline(language: &str, pattern: &str) -> Result<(String, CompiledQuery)> {
    let lang = lookup(language)?;
    let query = Query::new(&lang, pattern).context("failed to compile pattern")?;
    Ok((
        language.to_string(),
        CompiledQuery {
            name: "pattern".to_string(),
            query,
            range: None,
        },
    ))
}

fn cmd_query(
    file: &Path,
    queries: &[(String, CompiledQuery)],
    as_json: bool,
    by_match: bool,
) -> Result<()> {
    let Some((language, _)) = queries.first() else {
        return Ok(());
    };
    let tree = parse_file(file, language)?;
    let root = tree.root_node();

    let mut report = Vec::new();
    for (_, compiled) in queries {
        let query = &compiled.query;
        if by_match {
            let matches = query.matches(&root, compiled.range.clone())?;
            if as_json {
                let entries: Vec<_> = matches
                    .iter()
                    .map(|m| {
                        let captures: Vec<_> = m
                            .captures
                            .iter()
                            .map(|c| capture_json(c.name, &c.node))
                            .collect();
                        json!({ "pattern": m.pattern_index, "captures": captures })
                    })
                    .collect();
                report.push(json!({ "query": compiled.name, "matches": entries }));
            } else {
                println!("{}", compiled.name.bold());
                for (i, m) in matches.iter().enumerate() {
                    println!("  {} {} (pattern {})", "match".yellow(), i, m.pattern_index);
                    for capture in &m.captures {
                        println!("    {}", capture_line(capture.name, &capture.node));
                    }
                }
            }
        } else {
            let captures = query.captures(&root, compiled.range.clone())?;
            if as_json {
                let entries: Vec<_> = captures
                    .iter()
                    .map(|c| capture_json(c.name, &c.node))
                    .collect();
                report.push(json!({ "query": compiled.name, "captures": entries }));
            } else {
                println!("{}", compiled.name.bold());
                for capture in &captures {
                    println!("  {}", capture_line(capture.name, &capture.node));
                }
            }
        }
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn capture_line(name: &str, node: &Node) -> String {
    let start = node.start_point();
    format!(
        "{} {} {}:{} {}",
        format!("@{name}").green(),
        node.kind(),
        start.row,
        start.column,
        node_text(node)
    )
}

fn capture_json(name: &str, node: &Node) -> serde_json::Value {
    let start = node.start_point();
    let end = node.end_point();
    json!({
        "name": name,
        "kind": node.kind(),
        "start": [start.row, start.column],
        "end": [end.row, end.column],
        "text": node_text(node),
    })
}

fn node_text(node: &Node) -> String {
    node.text()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}
