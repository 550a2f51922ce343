// subrecon CLI - headless subsidy reconciliation driver

mod driver;
mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use subrecon_engine::EngineConfig;
use subrecon_io::{decode_schedule, ArtifactKind, ArtifactStore};

use driver::{reconcile_contract, ContractStatus, ContractSummary, FailureKind};
use exit_codes::{EXIT_ERROR, EXIT_EXTRACT, EXIT_IO, EXIT_MISMATCH, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "subrecon")]
#[command(about = "Loan-subsidy schedule reconciliation (headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile one contract against its bank schedule
    #[command(after_help = "\
Examples:
  subrecon reconcile --contract dog-001.toml --schedule dog-001.xlsx
  subrecon reconcile --contract c.toml --schedule c.xlsx --keep-going")]
    Reconcile {
        /// Contract input record (TOML)
        #[arg(long)]
        contract: PathBuf,

        /// Bank schedule workbook (xlsx/xls)
        #[arg(long)]
        schedule: PathBuf,

        /// Artifact store (SQLite); created when missing
        #[arg(long, default_value = "artifacts.db")]
        store: PathBuf,

        /// Engine config (TOML); documented defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Persist best-effort results instead of failing on residual
        /// mismatches
        #[arg(long)]
        keep_going: bool,
    },

    /// Reconcile every contract record in a directory (pairs of
    /// <name>.toml and <name>.xlsx)
    Batch {
        /// Directory with contract records and schedules
        #[arg(long)]
        dir: PathBuf,

        #[arg(long, default_value = "artifacts.db")]
        store: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        keep_going: bool,
    },

    /// Decode a contract's stored artifacts and print a summary
    Inspect {
        #[arg(long, default_value = "artifacts.db")]
        store: PathBuf,

        /// Contract id
        contract_id: String,
    },
}

/// Top-level failure: exit code plus the message printed to stderr.
type CliError = (u8, String);

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err((code, message)) => {
            eprintln!("error: {message}");
            ExitCode::from(code)
        }
    }
}

fn load_config(path: Option<&Path>, keep_going: bool) -> Result<EngineConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| (EXIT_USAGE, format!("cannot read config {}: {e}", path.display())))?;
            EngineConfig::from_toml(&text).map_err(|e| (EXIT_USAGE, e.to_string()))?
        }
        None => EngineConfig::default(),
    };
    if keep_going {
        config.raise_on_mismatch = false;
    }
    Ok(config)
}

fn open_store(path: &Path) -> Result<ArtifactStore, CliError> {
    ArtifactStore::open(path).map_err(|e| (EXIT_IO, e.to_string()))
}

fn run(cli: Cli) -> Result<u8, CliError> {
    match cli.command {
        Commands::Reconcile {
            contract,
            schedule,
            store,
            config,
            keep_going,
        } => {
            let config = load_config(config.as_deref(), keep_going)?;
            let mut store = open_store(&store)?;
            let summary = reconcile_contract(&contract, &schedule, &mut store, &config);
            print_json(&summary)?;
            Ok(summary_exit_code(std::slice::from_ref(&summary)))
        }

        Commands::Batch {
            dir,
            store,
            config,
            keep_going,
        } => {
            let config = load_config(config.as_deref(), keep_going)?;
            let mut store = open_store(&store)?;

            let mut summaries: Vec<ContractSummary> = Vec::new();
            for (record, schedule) in contract_pairs(&dir)? {
                summaries.push(reconcile_contract(&record, &schedule, &mut store, &config));
            }
            if summaries.is_empty() {
                return Err((
                    EXIT_USAGE,
                    format!("no contract records found in {}", dir.display()),
                ));
            }
            print_json(&summaries)?;
            Ok(summary_exit_code(&summaries))
        }

        Commands::Inspect { store, contract_id } => {
            let store = open_store(&store)?;
            inspect(&store, &contract_id)
        }
    }
}

/// Pair every `<name>.toml` in the directory with its `<name>.xlsx`/`.xls`
/// schedule, sorted for deterministic batch order.
fn contract_pairs(dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>, CliError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| (EXIT_IO, format!("cannot read {}: {e}", dir.display())))?;

    let mut records: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    records.sort();

    let mut pairs = Vec::with_capacity(records.len());
    for record in records {
        let schedule = ["xlsx", "xls"]
            .iter()
            .map(|ext| record.with_extension(ext))
            .find(|p| p.exists());
        match schedule {
            Some(schedule) => pairs.push((record, schedule)),
            None => log::warn!("{}: no matching schedule workbook, skipped", record.display()),
        }
    }
    Ok(pairs)
}

/// Batch verdict: extraction defects outrank mismatch records; a clean run
/// (including best-effort persists) is success.
fn summary_exit_code(summaries: &[ContractSummary]) -> u8 {
    let failed: Vec<&ContractSummary> = summaries
        .iter()
        .filter(|s| s.status == ContractStatus::Failed)
        .collect();
    if failed.is_empty() {
        EXIT_SUCCESS
    } else if failed
        .iter()
        .any(|s| s.failure_kind == Some(FailureKind::Extract))
    {
        EXIT_EXTRACT
    } else if failed
        .iter()
        .any(|s| s.failure_kind == Some(FailureKind::Reconcile))
    {
        EXIT_MISMATCH
    } else {
        EXIT_ERROR
    }
}

fn inspect(store: &ArtifactStore, contract_id: &str) -> Result<u8, CliError> {
    let storage = |e: subrecon_io::IoError| (EXIT_IO, e.to_string());

    let artifact = store
        .get_artifact(contract_id, ArtifactKind::CanonicalSchedule)
        .map_err(storage)?;

    let Some(bytes) = artifact else {
        if let Some((message, _)) = store.get_error(contract_id).map_err(storage)? {
            println!(
                "{}",
                serde_json::json!({ "contract_id": contract_id, "error": message })
            );
            return Ok(EXIT_MISMATCH);
        }
        return Err((
            EXIT_ERROR,
            format!("no artifacts stored for contract '{contract_id}'"),
        ));
    };

    let schedule = decode_schedule(&bytes).map_err(storage)?;
    let report = serde_json::json!({
        "contract_id": contract_id,
        "payment_rows": schedule.payment_rows().len(),
        "first_date": schedule.payment_rows().first().map(|r| r.debt_repayment_date.to_string()),
        "last_date": schedule.payment_rows().last().map(|r| r.debt_repayment_date.to_string()),
        "total_agency_fee": subrecon_core::format_minor(schedule.total_row().agency_fee_amount),
        "error": store.get_error(contract_id).map_err(storage)?.map(|(m, _)| m),
    });
    println!("{report}");
    Ok(EXIT_SUCCESS)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| (EXIT_ERROR, e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_match_records_to_workbooks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.toml"), "").unwrap();
        std::fs::write(dir.path().join("b.xlsx"), "").unwrap();
        std::fs::write(dir.path().join("a.toml"), "").unwrap();
        std::fs::write(dir.path().join("a.xls"), "").unwrap();
        std::fs::write(dir.path().join("orphan.toml"), "").unwrap();
        std::fs::write(dir.path().join("stray.xlsx"), "").unwrap();

        let pairs = contract_pairs(dir.path()).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].0.ends_with("a.toml"));
        assert!(pairs[0].1.ends_with("a.xls"));
        assert!(pairs[1].1.ends_with("b.xlsx"));
    }

    #[test]
    fn keep_going_overrides_raise() {
        let config = load_config(None, true).unwrap();
        assert!(!config.raise_on_mismatch);
    }
}
