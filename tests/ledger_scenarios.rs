// End-to-end ledger scenarios through the public API

use chrono::NaiveDate;
use std::collections::HashSet;
use transfer_ledger::{
    AccountType, Ledger, Recipient, SequentialIds, Session, SnapshotStore, SqliteStore,
    UNKNOWN_ACCOUNT,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ledger() -> Ledger {
    Ledger::with_id_generator(SequentialIds::new("acct"))
}

fn balance(ledger: &Ledger, id: &str) -> f64 {
    ledger.account(id).map(|a| a.balance()).unwrap_or(f64::NAN)
}

#[test]
fn test_single_transfer_month_scenario() {
    let mut ledger = ledger();
    let a = ledger.add_account("A", AccountType::Savings);
    let b = ledger.add_account("B", AccountType::Checking);

    ledger.apply_transfer(b.id(), date(2024, 3, 1), vec![Recipient::new(a.id(), 100.0)]);

    assert_eq!(balance(&ledger, a.id()), 100.0);
    assert_eq!(balance(&ledger, b.id()), -100.0);
    assert_eq!(ledger.transfers().len(), 1);

    let report = transfer_ledger::monthly_volume_by_recipient(
        ledger.transfers().as_slice(),
        ledger.accounts(),
    );
    assert_eq!(report.months, vec!["March".to_string()]);
    assert_eq!(report.series.len(), 1);
    assert_eq!(report.series[0].name, "A");
    assert_eq!(report.series[0].data, vec![100.0]);
}

#[test]
fn test_second_transfer_same_month_accumulates() {
    let mut ledger = ledger();
    let a = ledger.add_account("A", AccountType::Savings);
    let b = ledger.add_account("B", AccountType::Checking);

    ledger.apply_transfer(b.id(), date(2024, 3, 1), vec![Recipient::new(a.id(), 100.0)]);
    ledger.apply_transfer(b.id(), date(2024, 3, 15), vec![Recipient::new(a.id(), 50.0)]);

    let report = transfer_ledger::monthly_volume_by_recipient(
        ledger.transfers().as_slice(),
        ledger.accounts(),
    );
    assert_eq!(report.months, vec!["March".to_string()]);
    assert_eq!(report.volume(a.id(), "March"), 150.0);
    assert_eq!(balance(&ledger, b.id()), -150.0);
}

#[test]
fn test_deleted_recipient_keeps_series_under_fallback_name() {
    let mut ledger = ledger();
    let a = ledger.add_account("A", AccountType::Savings);
    let b = ledger.add_account("B", AccountType::Checking);
    ledger.apply_transfer(b.id(), date(2024, 3, 1), vec![Recipient::new(a.id(), 100.0)]);
    ledger.apply_transfer(b.id(), date(2024, 3, 15), vec![Recipient::new(a.id(), 50.0)]);

    assert!(ledger.delete_account(a.id()).is_some());

    let report = transfer_ledger::monthly_volume_by_recipient(
        ledger.transfers().as_slice(),
        ledger.accounts(),
    );
    let series = report.series_for(a.id()).unwrap();
    assert_eq!(series.name, UNKNOWN_ACCOUNT);
    assert_eq!(series.data, vec![150.0]);
    assert_eq!(ledger.transfers().len(), 2);
}

#[test]
fn test_new_accounts_have_unique_ids_and_zero_balance() {
    // Real uuid generator here, not the sequential one
    let mut ledger = Ledger::new();
    let mut seen = HashSet::new();

    for i in 0..50 {
        let account_type = AccountType::ALL[i % AccountType::ALL.len()];
        let account = ledger.add_account(format!("Account {}", i), account_type);
        assert_eq!(account.balance(), 0.0);
        assert!(seen.insert(account.id().to_string()), "duplicate id {}", account.id());
    }

    assert_eq!(ledger.accounts().len(), 50);
}

#[test]
fn test_update_never_touches_balance() {
    let mut ledger = ledger();
    let a = ledger.add_account("A", AccountType::Savings);
    let b = ledger.add_account("B", AccountType::Checking);
    ledger.apply_transfer(b.id(), date(2024, 1, 5), vec![Recipient::new(a.id(), 42.5)]);

    assert!(ledger.update_account(a.id(), "Renamed", AccountType::Investment));

    let updated = ledger.account(a.id()).unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.account_type, AccountType::Investment);
    assert_eq!(updated.balance(), 42.5);
}

#[test]
fn test_conservation_across_many_recipients() {
    let mut ledger = ledger();
    let src = ledger.add_account("Main", AccountType::Checking);
    let r1 = ledger.add_account("R1", AccountType::Savings);
    let r2 = ledger.add_account("R2", AccountType::Investment);
    let r3 = ledger.add_account("R3", AccountType::Savings);

    let before = ledger.total_balance();
    let transfer = ledger.apply_transfer(
        src.id(),
        date(2024, 5, 20),
        vec![
            Recipient::new(r1.id(), 10.25),
            Recipient::new(r2.id(), 200.0),
            Recipient::new(r3.id(), 0.75),
        ],
    );

    assert_eq!(transfer.total_amount(), 211.0);
    assert_eq!(balance(&ledger, src.id()), -211.0);
    assert_eq!(balance(&ledger, r1.id()), 10.25);
    assert_eq!(balance(&ledger, r2.id()), 200.0);
    assert_eq!(balance(&ledger, r3.id()), 0.75);
    assert!((ledger.total_balance() - before).abs() < 1e-9);
}

#[test]
fn test_unknown_recipient_breaks_conservation() {
    let mut ledger = ledger();
    let src = ledger.add_account("Main", AccountType::Checking);
    let known = ledger.add_account("Known", AccountType::Savings);

    ledger.apply_transfer(
        src.id(),
        date(2024, 6, 1),
        vec![
            Recipient::new(known.id(), 30.0),
            Recipient::new("ghost", 70.0),
        ],
    );

    // The full amount leaves the source, only the known line lands
    assert_eq!(balance(&ledger, src.id()), -100.0);
    assert_eq!(balance(&ledger, known.id()), 30.0);
    assert_eq!(ledger.total_balance(), -70.0);
    assert_eq!(ledger.transfers().len(), 1);
}

#[test]
fn test_log_is_append_only_in_call_order() {
    let mut ledger = ledger();
    let src = ledger.add_account("Main", AccountType::Checking);
    let dst = ledger.add_account("Goal", AccountType::Savings);

    let mut applied = Vec::new();
    for day in 1..=10 {
        let transfer = ledger.apply_transfer(
            src.id(),
            date(2024, 2, day),
            vec![Recipient::new(dst.id(), day as f64)],
        );
        let earlier: Vec<_> = ledger.transfers().as_slice()[..applied.len()].to_vec();
        assert_eq!(earlier, applied);
        applied.push(transfer);
    }

    assert_eq!(ledger.transfers().as_slice(), applied.as_slice());
    let ids: HashSet<_> = applied.iter().map(|t| t.id().to_string()).collect();
    assert_eq!(ids.len(), 10);
}

#[test]
fn test_report_is_idempotent() {
    let mut ledger = ledger();
    let src = ledger.add_account("Main", AccountType::Checking);
    let dst = ledger.add_account("Goal", AccountType::Savings);
    ledger.apply_transfer(src.id(), date(2024, 7, 3), vec![Recipient::new(dst.id(), 12.0)]);
    ledger.apply_transfer(src.id(), date(2024, 8, 3), vec![Recipient::new(dst.id(), 8.0)]);

    let first = transfer_ledger::monthly_volume_by_recipient(
        ledger.transfers().as_slice(),
        ledger.accounts(),
    );
    let second = transfer_ledger::monthly_volume_by_recipient(
        ledger.transfers().as_slice(),
        ledger.accounts(),
    );

    assert_eq!(first, second);
    assert_eq!(first.months, vec!["July".to_string(), "August".to_string()]);
}

#[test]
fn test_session_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let (a_id, b_id) = {
        let store = SqliteStore::open(&path).unwrap();
        let mut session = Session::open_with(store, SequentialIds::new("acct"));
        let a = session.add_account("A", AccountType::Savings);
        let b = session.add_account("B", AccountType::Checking);
        session.apply_transfer(b.id(), date(2024, 3, 1), vec![Recipient::new(a.id(), 100.0)]);
        assert_eq!(session.failed_saves(), 0);
        session.close();
        (a.id().to_string(), b.id().to_string())
    };

    let store = SqliteStore::open(&path).unwrap();
    let snapshot = store.load().unwrap().unwrap();
    assert_eq!(snapshot.accounts.len(), 2);
    assert_eq!(snapshot.transfers.len(), 1);

    let session = Session::open(store);
    assert_eq!(balance(session.ledger(), &a_id), 100.0);
    assert_eq!(balance(session.ledger(), &b_id), -100.0);
    assert!(session.audit().is_empty());
    assert_eq!(session.monthly_volume().volume(&a_id, "March"), 100.0);
}

#[test]
fn test_draft_drops_zero_lines_on_submit() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut session = Session::open_with(store, SequentialIds::new("acct"));
    let main = session.add_account("Main", AccountType::Checking);
    let rainy = session.add_account("Rainy Day", AccountType::Savings);
    session.add_account("Broker", AccountType::Investment);

    let mut draft = session.new_draft(main.id(), date(2024, 9, 1));
    assert_eq!(draft.lines().len(), 2);
    assert!(draft.set_amount(rainy.id(), 25.0));
    assert_eq!(draft.total(), 25.0);

    let transfer = session.submit_draft(&draft);
    assert_eq!(transfer.recipients().len(), 1);
    assert_eq!(balance(session.ledger(), rainy.id()), 25.0);
    assert_eq!(balance(session.ledger(), main.id()), -25.0);
}
