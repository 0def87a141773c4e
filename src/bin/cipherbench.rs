use clap::{Parser, Subcommand, ValueEnum};

use cipherbench::benches;
use cipherbench::chart;
use cipherbench::error::Result;
use cipherbench::harness::{BenchConfig, Profile};
use cipherbench::report;
use cipherbench::schema::{BenchReport, ResultRecord, RunMeta};
use cipherbench::trackalloc::TrackingAllocator;
use cipherbench::CipherVariant;

use std::fs;
use std::path::{Path, PathBuf};

// Peak-memory columns are only meaningful with the counting allocator
// installed, so the CLI always runs under it.
#[global_allocator]
static ALLOC: TrackingAllocator = TrackingAllocator;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    Quick,
    Full,
}

impl From<ProfileArg> for Profile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Quick => Profile::Quick,
            ProfileArg::Full => Profile::Full,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Symmetric cipher throughput: AES-GCM, AES-CBC+HMAC, ChaCha20-Poly1305.
    Symmetric {
        /// Which symmetric cipher(s) to benchmark.
        #[arg(long, value_enum, default_value_t = CipherVariant::All)]
        variant: CipherVariant,
    },

    /// Asymmetric key-gen/sign/verify: RSA-PSS and ECDSA P-256/P-384.
    Asymmetric {
        /// Skip peak-memory sampling (drops the Peak (KiB) CSV columns).
        #[arg(long, default_value_t = false)]
        no_memory: bool,
    },

    /// Run both suites.
    Suite {
        #[arg(long, value_enum, default_value_t = CipherVariant::All)]
        variant: CipherVariant,

        #[arg(long, default_value_t = false)]
        no_memory: bool,
    },

    /// Render charts from previously written result CSVs.
    Visualize,
}

#[derive(Parser, Debug)]
#[command(name = "cipherbench")]
#[command(about = "Cryptographic primitive benchmark runner (CSV + chart output)")]
struct Args {
    #[arg(long, value_enum, default_value_t = ProfileArg::Quick, global = true)]
    profile: ProfileArg,

    #[arg(long, default_value_t = 0, global = true)]
    seed: u64,

    /// Directory for result CSVs and chart images. Re-runs overwrite.
    #[arg(long, value_name = "DIR", default_value = "results", global = true)]
    out_dir: PathBuf,

    /// Also write the raw records as a JSON report.
    #[arg(long, value_name = "FILE", global = true)]
    json: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

fn now_utc() -> String {
    // Avoid a chrono dependency; good enough for reports.
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("unix:{secs}")
}

fn git_sha_short() -> Option<String> {
    // Best-effort: read from environment set by CI/build scripts.
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

fn write_symmetric(out_dir: &Path, records: &[ResultRecord]) -> Result<()> {
    let path = out_dir.join(chart::SYMMETRIC_CSV);
    report::symmetric_table(records).write_csv(&path)?;
    eprintln!("Symmetric results saved to: {}", path.display());
    Ok(())
}

fn write_asymmetric(out_dir: &Path, records: &[ResultRecord]) -> Result<()> {
    let path = out_dir.join(chart::ASYMMETRIC_CSV);
    report::asymmetric_table(records).write_csv(&path)?;
    eprintln!("Asymmetric results saved to: {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = BenchConfig {
        profile: args.profile.into(),
        seed: args.seed,
    };

    fs::create_dir_all(&args.out_dir)?;

    let mut records = Vec::new();

    match &args.cmd {
        Command::Symmetric { variant } => {
            eprintln!("Starting symmetric benchmark ({})...", cfg.profile.as_str());
            records = benches::symmetric::run(&cfg, *variant)?;
            write_symmetric(&args.out_dir, &records)?;
        }
        Command::Asymmetric { no_memory } => {
            eprintln!("Starting asymmetric benchmark ({})...", cfg.profile.as_str());
            records = benches::asymmetric::run(&cfg, !no_memory)?;
            write_asymmetric(&args.out_dir, &records)?;
        }
        Command::Suite { variant, no_memory } => {
            // A failed sub-suite aborts only itself; the caller of the
            // harness decides whether the batch goes on, and here it does.
            eprintln!("Starting symmetric benchmark ({})...", cfg.profile.as_str());
            match benches::symmetric::run(&cfg, *variant) {
                Ok(recs) => {
                    write_symmetric(&args.out_dir, &recs)?;
                    records.extend(recs);
                }
                Err(e) => eprintln!("Symmetric suite failed, continuing: {e}"),
            }
            eprintln!("Starting asymmetric benchmark ({})...", cfg.profile.as_str());
            match benches::asymmetric::run(&cfg, !no_memory) {
                Ok(recs) => {
                    write_asymmetric(&args.out_dir, &recs)?;
                    records.extend(recs);
                }
                Err(e) => eprintln!("Asymmetric suite failed: {e}"),
            }
        }
        Command::Visualize => {
            chart::render_all(&args.out_dir)?;
            eprintln!("Visualization complete.");
            return Ok(());
        }
    }

    // Flat per-record view on stdout; the CSVs above are the pivoted files.
    if !records.is_empty() {
        report::collect(&records).write_delimited(std::io::stdout())?;
    }

    if let Some(json_path) = &args.json {
        let bench_report = BenchReport {
            run: RunMeta {
                schema_version: 1,
                bench_version: env!("CARGO_PKG_VERSION").to_string(),
                profile: cfg.profile.as_str().to_string(),
                seed: cfg.seed,
                timestamp_utc: now_utc(),
                git_sha: git_sha_short(),
            },
            records,
        };
        let json =
            serde_json::to_string_pretty(&bench_report).map_err(std::io::Error::other)?;
        fs::write(json_path, json)?;
        eprintln!("JSON report saved to: {}", json_path.display());
    }

    Ok(())
}
