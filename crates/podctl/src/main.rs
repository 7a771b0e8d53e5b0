// Файл: crates/podctl/src/main.rs
use anyhow::Result;
use clap::{Parser, Subcommand};
use podgrep::query::{compile_with_mode, QueryMode, SearchBody, DEFAULT_SIZE};
use podgrep_segment::mapping::index_mapping;
use podgrep_segment::window::{DEFAULT_MERGE_THRESHOLD_SECS, DEFAULT_TARGET_SECS};
use podgrep_segment::{
    read_transcript_file, EpisodeKey, WindowConfig, WindowMode, WindowSegmenter, TEXT_FIELD,
};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(version, about = "podgrep control: segment transcripts, compile queries")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Нарезать один файл транскрипта, документы: JSON-строками в stdout
    Segment {
        /// .../show_<show_id>/<episode_id>.json
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = DEFAULT_TARGET_SECS)]
        window: f64,
        #[arg(long, default_value = "no-overlap")]
        mode: WindowMode,
        #[arg(long, default_value_t = DEFAULT_MERGE_THRESHOLD_SECS)]
        merge_threshold: f64,
    },
    /// Скомпилировать запрос и напечатать тело поиска
    Query {
        #[arg(long)]
        q: String,
        #[arg(long, default_value = TEXT_FIELD)]
        field: String,
        #[arg(long, default_value = "auto")]
        mode: QueryMode,
        #[arg(long, default_value_t = DEFAULT_SIZE)]
        size: usize,
    },
    /// Маппинг индекса
    Mapping,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Segment {
            input,
            window,
            mode,
            merge_threshold,
        } => {
            if window.is_nan() || window <= 0.0 {
                anyhow::bail!("--window must be positive, got {window}");
            }
            let key = EpisodeKey::from_path(&input)?;
            let transcript = read_transcript_file(&input)?;
            let cfg = WindowConfig {
                target_secs: window,
                mode,
                merge_threshold_secs: merge_threshold,
            };
            let docs = WindowSegmenter::new(cfg).segment(&key, &transcript.segments);

            let mut out = BufWriter::new(io::stdout().lock());
            for d in &docs {
                serde_json::to_writer(&mut out, d)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
            eprintln!(
                "segments={} skipped={} documents={}",
                transcript.segments.len(),
                transcript.skipped,
                docs.len()
            );
        }
        Cmd::Query {
            q,
            field,
            mode,
            size,
        } => {
            let compiled = compile_with_mode(&q, &field, mode)?;
            let body = SearchBody::new(compiled, size);
            println!("{}", serde_json::to_string_pretty(&body.to_json())?);
        }
        Cmd::Mapping => {
            println!("{}", serde_json::to_string_pretty(&index_mapping())?);
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).with_target(false).with_writer(io::stderr).try_init();
}
