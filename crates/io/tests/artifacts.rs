use chrono::NaiveDate;
use subrecon_core::contract::RateBands;
use subrecon_core::{Bank, Contract};
use subrecon_engine::strategy::FormulaCatalog;
use subrecon_engine::{reconcile, EngineConfig, RateTimeline};
use subrecon_io::{
    decode_schedule, encode_schedule, full_workbook, shifted_workbook, ArtifactKind, ArtifactStore,
};

fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%d.%m.%Y").unwrap()
}

fn bank_grid() -> Vec<Vec<String>> {
    grid(&[
        &["№", "Дата платежа", "Остаток долга", "Погашение", "Вознаграждение", "Комиссия", "Итого"],
        &["1", "15.01.2023", "100 000,00", "-", "-", "-", "-"],
        &["2", "15.02.2023", "90 000,00", "10 000,00", "1 000,00", "200,00", "1 200,00"],
        &["", "Итого", "", "10 000,00", "1 000,00", "200,00", "1 200,00"],
    ])
}

fn contract() -> Contract {
    Contract {
        id: "dog-2023-042".into(),
        bank: Bank::CenterCredit,
        start_date: date("15.01.2023"),
        end_date: date("15.01.2030"),
        loan_amount: 10_000_000,
        year_count: 360,
    }
}

fn run_pipeline() -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let schedule = subrecon_extract::extract(&bank_grid()).unwrap();
    subrecon_extract::validate(&schedule, 2).unwrap();
    let contract = contract();
    let timeline = RateTimeline::build(
        contract.start_date,
        contract.end_date,
        &RateBands {
            years_1_3: 1200,
            ..Default::default()
        },
    );
    let outcome = reconcile(
        &contract,
        &schedule,
        &timeline,
        &FormulaCatalog::standard(),
        &EngineConfig::default(),
    )
    .unwrap();

    (
        full_workbook(&outcome.result).unwrap(),
        shifted_workbook(&outcome.result).unwrap(),
        encode_schedule(&schedule),
    )
}

#[test]
fn workbooks_are_zip_containers() {
    let (full, shifted, _) = run_pipeline();
    // xlsx is a zip archive; both buffers must start with the PK signature.
    assert_eq!(&full[..2], b"PK");
    assert_eq!(&shifted[..2], b"PK");
}

#[test]
fn pipeline_is_idempotent_to_the_byte() {
    let (full_a, shifted_a, canonical_a) = run_pipeline();
    let (full_b, shifted_b, canonical_b) = run_pipeline();
    // The canonical columnar artifact must be byte-identical across runs.
    assert_eq!(canonical_a, canonical_b);
    // Workbook buffers embed no timestamps we control, so compare sizes as
    // a weaker determinism signal.
    assert_eq!(full_a.len(), full_b.len());
    assert_eq!(shifted_a.len(), shifted_b.len());
}

#[test]
fn canonical_artifact_round_trips_through_the_store() {
    let (full, shifted, canonical) = run_pipeline();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("artifacts.db");
    let mut store = ArtifactStore::open(&path).unwrap();
    store
        .put_artifacts("dog-2023-042", &full, &shifted, &canonical)
        .unwrap();
    drop(store);

    // Reopen: artifacts survive the connection.
    let store = ArtifactStore::open(&path).unwrap();
    let stored = store
        .get_artifact("dog-2023-042", ArtifactKind::CanonicalSchedule)
        .unwrap()
        .unwrap();
    let schedule = decode_schedule(&stored).unwrap();
    assert_eq!(schedule.payment_rows().len(), 2);
    assert_eq!(schedule.payment_rows()[1].agency_fee_amount, 100_000);
}

#[test]
fn unsupported_bank_writes_no_artifacts() {
    use subrecon_core::contract::ContractRecord;

    let record = ContractRecord {
        id: "dog-2023-066".into(),
        bank: "Неизвестный Банк".into(),
        start_date: date("15.01.2023"),
        end_date: date("15.01.2030"),
        loan_amount: "100000.00".into(),
        year_count: None,
        rates: RateBands {
            years_1_3: 1200,
            ..Default::default()
        },
    };

    let mut store = ArtifactStore::open_in_memory().unwrap();
    match record.into_contract() {
        Ok(_) => panic!("bank must be rejected"),
        Err(err) => {
            store
                .put_error("dog-2023-066", &err.to_string(), &format!("{err:?}"))
                .unwrap();
        }
    }

    assert_eq!(store.artifact_count("dog-2023-066").unwrap(), 0);
    let (message, _) = store.get_error("dog-2023-066").unwrap().unwrap();
    assert!(message.contains("Неизвестный Банк"));
}
