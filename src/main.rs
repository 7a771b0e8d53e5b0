use clap::{Parser, Subcommand};
use podgrep::index::InMemoryIndex;
use podgrep::query::{compile_with_mode, QueryMode, DEFAULT_SIZE};
use podgrep_segment::TEXT_FIELD;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Load bulk NDJSON files (file or directory) into an in-memory index; optional REPL to query
    Ingest {
        path: PathBuf,
        /// Start interactive REPL after loading
        #[arg(long)]
        repl: bool,
        #[arg(long, default_value_t = DEFAULT_SIZE)]
        size: usize,
        #[arg(long, default_value = "auto")]
        mode: QueryMode,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Ingest {
            path,
            repl,
            size,
            mode,
        } => run_ingest(path, repl, size, mode)?,
    }
    Ok(())
}

fn run_ingest(path: PathBuf, repl: bool, size: usize, mode: QueryMode) -> anyhow::Result<()> {
    let mut idx = InMemoryIndex::new();
    let n = idx.load_path(&path)?;
    eprintln!("loaded {n} records ({} documents)", idx.len());

    if repl {
        use std::io::{stdin, stdout, Write};
        let mut input = String::new();
        loop {
            input.clear();
            print!("query> ");
            stdout().flush().ok();
            match stdin().read_line(&mut input) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let s = input.trim();
            if s.is_empty() || s == ":q" || s == ":quit" {
                break;
            }

            let q = match compile_with_mode(s, TEXT_FIELD, mode) {
                Ok(q) => q,
                Err(e) => {
                    println!("parse error: {e}");
                    continue;
                }
            };
            println!("{}", q.to_dsl());
            let hits = idx.search(&q, size)?;
            for (rank, h) in hits.iter().enumerate() {
                println!(
                    "{}\t{}/{}\t[{:.2}-{:.2}]\t{}",
                    rank + 1,
                    h.show_id,
                    h.episode_id,
                    h.start_time,
                    h.end_time,
                    h.preview
                );
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).try_init();
}
