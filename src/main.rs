use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process;
use structkit::ddl::{self, DdlOptions, Layout};
use structkit::merge::{self, MergeError};
use structkit::schema::{self, SchemaError};
use structkit::structure::{Path, PathParseError, Structure};
use tracing::debug;

#[derive(Parser)]
#[command(name = "structkit")]
#[command(
    version,
    about = "Structural merge, deep clone and schema-to-DDL tool",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render CREATE TABLE statements for a JSON schema description
    Ddl {
        /// Schema description file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Statement layout: multiline or compact (one statement per line)
        #[arg(long, default_value = "multiline", value_parser = parse_layout)]
        layout: Layout,

        /// Emit CREATE TABLE IF NOT EXISTS
        #[arg(long)]
        if_not_exists: bool,

        /// Line up column types
        #[arg(long)]
        align: bool,
    },

    /// Patch the node at a path of a JSON document
    Merge {
        /// Target document
        input: PathBuf,

        /// Dotted path, e.g. users.0.name (default: the document root)
        #[arg(short, long, default_value = "")]
        path: String,

        /// Delta as inline JSON, or @file to read it from a file
        #[arg(short, long)]
        delta: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Deep-copy a JSON document, pretty-printed
    Clone {
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid JSON in {what}: {source}")]
    Json {
        what: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Invalid path: {0}")]
    Path(#[from] PathParseError),
    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Ddl {
            input,
            output,
            layout,
            if_not_exists,
            align,
        } => {
            let options = DdlOptions {
                layout,
                if_not_exists,
                align_columns: align,
            };
            let tables = schema::from_json(&read(&input)?)?;
            let mut sql = ddl::to_sql_with(&tables, &options);
            sql.push('\n');
            emit(output, &sql)
        }
        Command::Merge {
            input,
            path,
            delta,
            output,
        } => {
            let target = parse_json(&read(&input)?, &input.display().to_string())?;
            let path = Path::parse(&path)?;
            let delta = match delta.strip_prefix('@') {
                Some(file) => {
                    let file = PathBuf::from(file);
                    parse_json(&read(&file)?, &file.display().to_string())?
                }
                None => parse_json(&delta, "--delta")?,
            };
            debug!(%path, "merging");
            let merged = merge::merge_owned(target, &path, &delta)?;
            emit(output, &format!("{}\n", merged.to_json_pretty()))
        }
        Command::Clone { input, output } => {
            let target = parse_json(&read(&input)?, &input.display().to_string())?;
            let copy = structkit::clone(&target);
            emit(output, &format!("{}\n", copy.to_json_pretty()))
        }
    }
}

fn parse_layout(s: &str) -> Result<Layout, String> {
    Layout::from_str(s)
        .ok_or_else(|| format!("unknown layout `{}` (expected multiline or compact)", s))
}

fn read(path: &PathBuf) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })
}

fn parse_json(input: &str, what: &str) -> Result<Structure, CliError> {
    Structure::from_json(input).map_err(|source| CliError::Json {
        what: what.to_string(),
        source,
    })
}

fn emit(output: Option<PathBuf>, text: &str) -> Result<(), CliError> {
    match output {
        Some(path) => {
            fs::write(&path, text).map_err(|source| CliError::Write { path, source })?;
        }
        None => print!("{}", text),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ddl_layout(args: &[&str]) -> Result<Layout, clap::Error> {
        let argv = ["structkit", "ddl", "schema.json"].iter().chain(args).copied();
        let cli = Cli::try_parse_from(argv)?;
        match cli.command {
            Command::Ddl { layout, .. } => Ok(layout),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_ddl_layout_flag() {
        assert_eq!(ddl_layout(&[]).unwrap(), Layout::Multiline);
        assert_eq!(ddl_layout(&["--layout", "compact"]).unwrap(), Layout::Compact);
        assert_eq!(ddl_layout(&["--layout=multiline"]).unwrap(), Layout::Multiline);
        assert!(ddl_layout(&["--layout", "wide"]).is_err());
    }

    #[test]
    fn test_parse_layout_names_the_choices() {
        let err = parse_layout("wide").unwrap_err();
        assert!(err.contains("multiline or compact"));
    }
}
