//! Per-contract reconciliation driver shared by `reconcile` and `batch`.
//!
//! One contract's failure is recorded in the store and summarized; it never
//! aborts the rest of a batch.

use std::path::Path;

use serde::Serialize;
use subrecon_core::contract::ContractRecord;
use subrecon_engine::strategy::FormulaCatalog;
use subrecon_engine::{reconcile, EngineConfig, RateTimeline};
use subrecon_io::{encode_schedule, full_workbook, shifted_workbook, ArtifactStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Ok,
    /// Residual mismatches persisted best-effort (keep-going mode).
    OkWithErrors,
    Failed,
}

/// Which pipeline stage a contract failed in; drives the batch exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Unreadable/unparseable record, unknown bank.
    Input,
    /// Grid extraction or total-row validation.
    Extract,
    /// Variant search or post-hoc reconciliation errors.
    Reconcile,
    /// Store or workbook I/O.
    Storage,
}

#[derive(Debug, Serialize)]
pub struct ContractSummary {
    pub contract_id: String,
    pub status: ContractStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_rows: Option<usize>,
    pub unresolved_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContractSummary {
    fn failed(contract_id: String, kind: FailureKind, error: String) -> Self {
        Self {
            contract_id,
            status: ContractStatus::Failed,
            winning_variant: None,
            corrected_rows: None,
            unresolved_rows: 0,
            failure_kind: Some(kind),
            error: Some(error),
        }
    }
}

/// Run the full pipeline for one contract and persist the results. Every
/// failure path writes an error record (message + raw trace) to the store.
pub fn reconcile_contract(
    contract_path: &Path,
    schedule_path: &Path,
    store: &mut ArtifactStore,
    config: &EngineConfig,
) -> ContractSummary {
    let record_text = match std::fs::read_to_string(contract_path) {
        Ok(text) => text,
        Err(e) => {
            return ContractSummary::failed(
                contract_path.display().to_string(),
                FailureKind::Input,
                format!("cannot read contract record: {e}"),
            )
        }
    };
    let record: ContractRecord = match toml::from_str(&record_text) {
        Ok(record) => record,
        Err(e) => {
            return ContractSummary::failed(
                contract_path.display().to_string(),
                FailureKind::Input,
                format!("cannot parse contract record: {e}"),
            )
        }
    };
    let contract_id = record.id.clone();

    match run_pipeline(record, schedule_path, store, config) {
        Ok(summary) => summary,
        Err(error) => {
            if let Err(e) = store.put_error(&contract_id, &error.message, &error.trace) {
                log::error!("contract {contract_id}: cannot persist error record: {e}");
            }
            ContractSummary::failed(contract_id, error.kind, error.message)
        }
    }
}

struct PipelineError {
    kind: FailureKind,
    message: String,
    trace: String,
}

impl PipelineError {
    fn new(kind: FailureKind, err: &impl std::error::Error) -> Self {
        Self {
            kind,
            message: err.to_string(),
            trace: format!("{err:?}"),
        }
    }
}

fn run_pipeline(
    record: ContractRecord,
    schedule_path: &Path,
    store: &mut ArtifactStore,
    config: &EngineConfig,
) -> Result<ContractSummary, PipelineError> {
    use FailureKind::{Extract, Input, Reconcile, Storage};

    // Bank allow-list check runs before anything else touches the data.
    let (contract, bands) = record
        .into_contract()
        .map_err(|e| PipelineError::new(Input, &e))?;

    let grid = subrecon_io::read_grid(schedule_path).map_err(|e| PipelineError::new(Storage, &e))?;
    let schedule = subrecon_extract::extract(&grid).map_err(|e| PipelineError::new(Extract, &e))?;
    subrecon_extract::validate(&schedule, config.tolerance_minor)
        .map_err(|e| PipelineError::new(Extract, &e))?;

    let timeline = RateTimeline::build(contract.start_date, contract.end_date, &bands);
    let catalog = FormulaCatalog::standard();

    let outcome = reconcile(&contract, &schedule, &timeline, &catalog, config)
        .map_err(|e| PipelineError::new(Reconcile, &e))?;

    let full = full_workbook(&outcome.result).map_err(|e| PipelineError::new(Storage, &e))?;
    let shifted = shifted_workbook(&outcome.result).map_err(|e| PipelineError::new(Storage, &e))?;
    let canonical = encode_schedule(&schedule);
    store
        .put_artifacts(&contract.id, &full, &shifted, &canonical)
        .map_err(|e| PipelineError::new(Storage, &e))?;

    // Best-effort mode: artifacts are persisted, but residual mismatches
    // still leave an error record behind.
    let mismatch = outcome.mismatch_message();
    let status = match &mismatch {
        Some(message) => {
            store
                .put_error(&contract.id, message, "bank_excel_diff above tolerance")
                .map_err(|e| PipelineError::new(Storage, &e))?;
            ContractStatus::OkWithErrors
        }
        None => ContractStatus::Ok,
    };

    Ok(ContractSummary {
        contract_id: contract.id,
        status,
        winning_variant: Some(outcome.meta.winning_variant),
        corrected_rows: Some(outcome.corrected_rows),
        unresolved_rows: outcome.unresolved.len(),
        failure_kind: None,
        error: mismatch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_schedule_workbook(dir: &Path) -> PathBuf {
        let rows: [[&str; 7]; 5] = [
            ["№", "Дата платежа", "Остаток долга", "Погашение", "Вознаграждение", "Комиссия", "Итого"],
            ["1", "15.01.2023", "100 000,00", "-", "-", "-", "-"],
            ["2", "15.02.2023", "90 000,00", "10 000,00", "1 000,00", "200,00", "1 200,00"],
            ["3", "15.03.2023", "80 000,00", "10 000,00", "840,00", "200,00", "1 040,00"],
            ["", "Итого", "", "20 000,00", "1 840,00", "400,00", "2 240,00"],
        ];

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                sheet.write_string(r as u32, c as u16, *cell).unwrap();
            }
        }
        let path = dir.join("dog-2023-001.xlsx");
        workbook.save(&path).unwrap();
        path
    }

    fn write_contract_record(dir: &Path, bank: &str) -> PathBuf {
        let path = dir.join("dog-2023-001.toml");
        std::fs::write(
            &path,
            format!(
                r#"
id = "dog-2023-001"
bank = "{bank}"
start_date = "2023-01-15"
end_date = "2030-01-15"
loan_amount = "100000.00"

[rates]
years_1_3 = 1200
"#
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn full_pipeline_persists_three_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let schedule = write_schedule_workbook(dir.path());
        let contract = write_contract_record(dir.path(), "Halyk Bank");

        let mut store = ArtifactStore::open_in_memory().unwrap();
        let summary = reconcile_contract(&contract, &schedule, &mut store, &EngineConfig::default());

        assert_eq!(summary.status, ContractStatus::Ok, "{:?}", summary.error);
        assert_eq!(summary.corrected_rows, Some(1));
        assert_eq!(store.artifact_count("dog-2023-001").unwrap(), 3);
        assert_eq!(store.get_error("dog-2023-001").unwrap(), None);
    }

    #[test]
    fn unknown_bank_fails_with_error_record_and_no_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let schedule = write_schedule_workbook(dir.path());
        let contract = write_contract_record(dir.path(), "Неизвестный Банк");

        let mut store = ArtifactStore::open_in_memory().unwrap();
        let summary = reconcile_contract(&contract, &schedule, &mut store, &EngineConfig::default());

        assert_eq!(summary.status, ContractStatus::Failed);
        assert_eq!(summary.failure_kind, Some(FailureKind::Input));
        assert_eq!(store.artifact_count("dog-2023-001").unwrap(), 0);
        let (message, _) = store.get_error("dog-2023-001").unwrap().unwrap();
        assert!(message.contains("Неизвестный Банк"));
    }
}
