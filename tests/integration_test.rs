//! Integration tests for dealer-ledger
//!
//! These tests drive the public service API end to end: purchases feed
//! stock, invoices reserve and release it, and serials advance per branch.

use chrono::{DateTime, FixedOffset, NaiveDate};
#[cfg(feature = "file")]
use dealer_ledger::backend::FileBackend;
use dealer_ledger::backend::{InMemoryBackend, StoreBackend};
use dealer_ledger::models::{
    CommercialFields, Customer, CustomerForm, InvoiceForm, InvoiceItemForm, InvoiceSettings,
    PurchaseForm, PurchaseItemForm, StockItem,
};
use dealer_ledger::observability::LedgerMetrics;
use dealer_ledger::{DateRange, DealerService, Error, Result, ServiceConfig, WriteStrategy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn date(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn buyer_form(name: &str, gst_no: Option<&str>) -> CustomerForm {
    CustomerForm {
        customer_name: name.to_string(),
        mobile_no: "9876543210".to_string(),
        address: "12 Station Road".to_string(),
        state: "Uttar Pradesh".to_string(),
        district: "Lucknow".to_string(),
        gst_no: gst_no.map(str::to_string),
        ..Default::default()
    }
}

fn purchase_form(party: &Customer, chassis: &[&str]) -> PurchaseForm {
    PurchaseForm {
        serial_no: None,
        party_id: party.id.clone(),
        invoice_no: "HMC-2024-118".to_string(),
        invoice_date: date("2024-04-02T10:00:00+05:30"),
        items: chassis
            .iter()
            .map(|c| PurchaseItemForm {
                id: None,
                model_name: "Splendor+".to_string(),
                chassis_no: c.to_string(),
                engine_no: format!("ENG-{}", c),
                colour: "Black".to_string(),
                gst: 28.0,
                price: 65000.0,
            })
            .collect(),
    }
}

fn invoice_form<S: AsRef<str>>(customer: &Customer, stock_ids: &[S], at: &str) -> InvoiceForm {
    InvoiceForm {
        customer_id: customer.id.clone(),
        invoice_date: date(at),
        items: stock_ids
            .iter()
            .map(|id| InvoiceItemForm::new(id.as_ref()))
            .collect(),
        commercial: CommercialFields::default(),
    }
}

/// Supplier, one registered and one walk-in buyer, and stock for `chassis`.
async fn dealership<B: StoreBackend>(
    ledger: &DealerService<B>,
    chassis: &[&str],
) -> (Customer, Customer, Vec<StockItem>) {
    let supplier = ledger
        .create_customer(buyer_form("Hero MotoCorp", Some("09AAACH0812J1ZY")))
        .await
        .expect("Failed to create supplier");
    let registered = ledger
        .create_customer(buyer_form("Awadh Traders", Some("09AABCU9603R1ZM")))
        .await
        .expect("Failed to create registered buyer");
    let walk_in = ledger
        .create_customer(buyer_form("Ravi Kumar", None))
        .await
        .expect("Failed to create walk-in buyer");
    ledger
        .create_purchase(purchase_form(&supplier, chassis))
        .await
        .expect("Failed to create purchase");
    let stock = ledger
        .list_available_stock(None)
        .await
        .expect("Failed to list stock");
    (registered, walk_in, stock)
}

fn stock_by_chassis<'a>(stock: &'a [StockItem], chassis: &str) -> &'a StockItem {
    stock
        .iter()
        .find(|s| s.chassis_no == chassis)
        .expect("chassis not in stock")
}

/// Test 1: Serials per branch
///
/// Interleaved registered and walk-in sales draw from separate counters and
/// never repeat.
#[tokio::test]
async fn test_interleaved_serials_never_repeat() {
    init_logger();
    let ledger = DealerService::new(InMemoryBackend::new());
    let chassis = ["C1", "C2", "C3", "C4", "C5"];
    let (registered, walk_in, stock) = dealership(&ledger, &chassis).await;

    let mut serials = Vec::new();
    for (n, item) in stock.iter().enumerate() {
        let customer = if n % 2 == 0 { &registered } else { &walk_in };
        let invoice = ledger
            .create_invoice(invoice_form(customer, &[&item.id], "2024-05-01T11:00:00+05:30"))
            .await
            .expect("Failed to create invoice");
        serials.push(invoice.serial_no);
    }

    assert_eq!(
        serials,
        vec!["REG-INV-001", "NON-INV-001", "REG-INV-002", "NON-INV-002", "REG-INV-003"]
    );
    assert_eq!(
        ledger.peek_next_invoice_serial(true).await.expect("Failed to peek"),
        "REG-INV-004"
    );
    assert_eq!(
        ledger.peek_next_invoice_serial(false).await.expect("Failed to peek"),
        "NON-INV-003"
    );
}

/// Test 2: Delete releases stock
#[tokio::test]
async fn test_delete_invoice_returns_stock() {
    init_logger();
    let ledger = DealerService::new(InMemoryBackend::new());
    let (_, walk_in, stock) = dealership(&ledger, &["A", "B"]).await;
    let ids: Vec<&str> = stock.iter().map(|s| s.id.as_str()).collect();

    let invoice = ledger
        .create_invoice(invoice_form(&walk_in, &ids[..], "2024-05-01T11:00:00+05:30"))
        .await
        .expect("Failed to create invoice");
    assert!(ledger
        .list_available_stock(None)
        .await
        .expect("Failed to list")
        .is_empty());

    ledger
        .delete_invoice(&invoice.id)
        .await
        .expect("Failed to delete invoice");

    let stock = ledger.list_stock().await.expect("Failed to list stock");
    assert!(stock.iter().all(|s| !s.sold && s.invoice_id.is_none()));
    assert!(ledger
        .list_invoices(&DateRange::all())
        .await
        .expect("Failed to list")
        .is_empty());
}

/// Test 3: Update swaps stock
///
/// [A, B] edited to [A, C]: A stays sold, B is released, C is sold, and the
/// serial does not move.
#[tokio::test]
async fn test_update_invoice_swaps_stock() {
    init_logger();
    let ledger = DealerService::new(InMemoryBackend::new());
    let (_, walk_in, stock) = dealership(&ledger, &["A", "B", "C"]).await;
    let (a, b, c) = (
        stock_by_chassis(&stock, "A").id.clone(),
        stock_by_chassis(&stock, "B").id.clone(),
        stock_by_chassis(&stock, "C").id.clone(),
    );

    let invoice = ledger
        .create_invoice(invoice_form(&walk_in, &[&a, &b], "2024-05-01T11:00:00+05:30"))
        .await
        .expect("Failed to create invoice");

    let editable = ledger
        .list_available_stock(Some(&invoice.id))
        .await
        .expect("Failed to list");
    assert_eq!(editable.len(), 3);

    let updated = ledger
        .update_invoice(&invoice.id, invoice_form(&walk_in, &[&a, &c], "2024-05-02T11:00:00+05:30"))
        .await
        .expect("Failed to update invoice");
    assert_eq!(updated.serial_no, invoice.serial_no);
    assert_eq!(updated.id, invoice.id);

    let stock = ledger.list_stock().await.expect("Failed to list stock");
    let owner = |chassis: &str| stock_by_chassis(&stock, chassis).invoice_id.clone();
    assert_eq!(owner("A"), Some(invoice.id.clone()));
    assert_eq!(owner("B"), None);
    assert_eq!(owner("C"), Some(invoice.id.clone()));
    assert!(!stock_by_chassis(&stock, "B").sold);

    assert_eq!(
        ledger.peek_next_invoice_serial(false).await.expect("Failed to peek"),
        "NON-INV-002"
    );
}

/// Test 4: Custom counters
#[tokio::test]
async fn test_registered_sequence_from_settings() {
    init_logger();
    let ledger = DealerService::new(InMemoryBackend::new());
    let (registered, _, stock) = dealership(&ledger, &["A", "B"]).await;
    ledger
        .save_invoice_settings(&InvoiceSettings {
            registered_prefix: "REG-INV-".to_string(),
            next_registered_serial_no: Some(1),
            ..Default::default()
        })
        .await
        .expect("Failed to save settings");

    let first = ledger
        .create_invoice(invoice_form(&registered, &[&stock[0].id], "2024-05-01T11:00:00+05:30"))
        .await
        .expect("Failed to create invoice");
    let second = ledger
        .create_invoice(invoice_form(&registered, &[&stock[1].id], "2024-05-01T12:00:00+05:30"))
        .await
        .expect("Failed to create invoice");

    assert_eq!(first.serial_no, "REG-INV-001");
    assert_eq!(second.serial_no, "REG-INV-002");
}

/// Test 4b: Exhausted counter
///
/// A counter saved at its maximum is rejected at sale time, before the
/// invoice, its stock or the settings are written.
#[tokio::test]
async fn test_exhausted_counter_rejects_invoice() {
    init_logger();
    let ledger = DealerService::new(InMemoryBackend::new());
    let (registered, walk_in, stock) = dealership(&ledger, &["A", "B"]).await;
    let settings = InvoiceSettings {
        next_registered_serial_no: Some(u64::MAX),
        ..Default::default()
    };
    ledger
        .save_invoice_settings(&settings)
        .await
        .expect("Failed to save settings");

    let result = ledger
        .create_invoice(invoice_form(&registered, &[&stock[0].id], "2024-05-01T11:00:00+05:30"))
        .await;
    assert!(matches!(result, Err(Error::ValidationError(_))));

    assert!(ledger
        .list_invoices(&DateRange::all())
        .await
        .expect("Failed to list")
        .is_empty());
    assert!(ledger.list_stock().await.expect("Failed to list").iter().all(|s| !s.sold));
    assert_eq!(
        ledger.get_invoice_settings().await.expect("Failed to load"),
        settings
    );

    let walk_in_invoice = ledger
        .create_invoice(invoice_form(&walk_in, &[&stock[1].id], "2024-05-01T11:00:00+05:30"))
        .await
        .expect("Failed to create invoice");
    assert_eq!(walk_in_invoice.serial_no, "NON-INV-001");
}

/// Test 5: Purchase deletion
///
/// Every stock item of the entry goes, sold or not. The invoice that held a
/// sold item keeps its line.
#[tokio::test]
async fn test_delete_purchase_removes_sold_stock() {
    init_logger();
    let ledger = DealerService::new(InMemoryBackend::new());
    let (_, walk_in, stock) = dealership(&ledger, &["A", "B"]).await;
    let invoice = ledger
        .create_invoice(invoice_form(&walk_in, &[&stock[0].id], "2024-05-01T11:00:00+05:30"))
        .await
        .expect("Failed to create invoice");

    let purchases = ledger
        .list_purchases(&DateRange::all())
        .await
        .expect("Failed to list purchases");
    ledger
        .delete_purchase(&purchases[0].id)
        .await
        .expect("Failed to delete purchase");

    assert!(ledger.list_stock().await.expect("Failed to list").is_empty());
    let kept = ledger.get_invoice(&invoice.id).await.expect("Failed to get");
    assert_eq!(kept.items.len(), 1);
}

/// Test 6: Unknown references abort without writes
#[tokio::test]
async fn test_unknown_stock_aborts_invoice() {
    init_logger();
    let ledger = DealerService::new(InMemoryBackend::new());
    let (_, walk_in, stock) = dealership(&ledger, &["A"]).await;

    let result = ledger
        .create_invoice(invoice_form(&walk_in, &[stock[0].id.as_str(), "ghost"], "2024-05-01T11:00:00+05:30"))
        .await;
    assert!(matches!(result, Err(Error::NotFound { .. })));

    let stock = ledger.list_stock().await.expect("Failed to list");
    assert!(!stock[0].sold);
    assert_eq!(
        ledger.peek_next_invoice_serial(false).await.expect("Failed to peek"),
        "NON-INV-001"
    );
}

/// Test 7: Non-registered defaults
#[tokio::test]
async fn test_walk_in_invoice_gets_defaults() {
    init_logger();
    let ledger = DealerService::new(InMemoryBackend::new());
    let (registered, walk_in, stock) = dealership(&ledger, &["A", "B"]).await;

    let walk_in_invoice = ledger
        .create_invoice(invoice_form(&walk_in, &[&stock[0].id], "2024-05-01T11:00:00+05:30"))
        .await
        .expect("Failed to create invoice");
    let extras = &walk_in_invoice.commercial;
    assert_eq!(extras.rto.as_deref(), Some("N/A"));
    assert_eq!(extras.cash_or_hypothecation.as_deref(), Some("N/A"));
    assert_eq!(extras.aadhar_no.as_deref(), Some(""));
    assert_eq!(
        extras.scheme.map(|s| s.to_string()).as_deref(),
        Some("Without Scheme")
    );

    let registered_invoice = ledger
        .create_invoice(invoice_form(&registered, &[&stock[1].id], "2024-05-01T11:00:00+05:30"))
        .await
        .expect("Failed to create invoice");
    assert_eq!(registered_invoice.commercial.rto, None);
}

/// Test 8: Listing by date
#[tokio::test]
async fn test_list_invoices_by_date_newest_first() {
    init_logger();
    let ledger = DealerService::new(InMemoryBackend::new());
    let (_, walk_in, stock) = dealership(&ledger, &["A", "B", "C"]).await;
    for (item, at) in stock.iter().zip([
        "2024-04-28T10:00:00+05:30",
        "2024-05-03T10:00:00+05:30",
        "2024-05-20T10:00:00+05:30",
    ]) {
        ledger
            .create_invoice(invoice_form(&walk_in, &[&item.id], at))
            .await
            .expect("Failed to create invoice");
    }

    let may = DateRange::between(
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
    );
    let listed = ledger.list_invoices(&may).await.expect("Failed to list");
    let serials: Vec<&str> = listed.iter().map(|i| i.serial_no.as_str()).collect();
    assert_eq!(serials, vec!["NON-INV-003", "NON-INV-002"]);
}

// ============================================================================
// Storage failures
// ============================================================================

/// Backend that rejects writes to one key.
#[derive(Clone)]
struct FailingBackend {
    inner: InMemoryBackend,
    reject_suffix: &'static str,
    armed: Arc<AtomicUsize>,
}

impl FailingBackend {
    fn new(reject_suffix: &'static str) -> Self {
        FailingBackend {
            inner: InMemoryBackend::new(),
            reject_suffix,
            armed: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn arm(&self) {
        self.armed.store(1, Ordering::SeqCst);
    }
}

impl StoreBackend for FailingBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        if self.armed.load(Ordering::SeqCst) == 1 && key.ends_with(self.reject_suffix) {
            return Err(Error::StorageError("quota exceeded".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.subscribe()
    }
}

#[derive(Default)]
struct CountingMetrics {
    rollbacks: AtomicUsize,
}

impl LedgerMetrics for CountingMetrics {
    fn record_rollback(&self, _keys: &[String]) {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
    }
}

/// Test 9: Rollback restores earlier keys
///
/// The settings write fails after invoices and stock were written; under
/// `Rollback` both are put back, so the store looks untouched.
#[tokio::test]
async fn test_rollback_on_failed_settings_write() {
    init_logger();
    let backend = FailingBackend::new("_settings");
    let metrics = Arc::new(CountingMetrics::default());
    let config = ServiceConfig::default()
        .with_write_strategy(WriteStrategy::Rollback)
        .with_metrics(metrics.clone());
    let ledger = DealerService::with_config(backend.clone(), config);
    let (_, walk_in, stock) = dealership(&ledger, &["A"]).await;

    backend.arm();
    let result = ledger
        .create_invoice(invoice_form(&walk_in, &[&stock[0].id], "2024-05-01T11:00:00+05:30"))
        .await;
    assert!(matches!(result, Err(Error::StorageError(_))));
    assert_eq!(metrics.rollbacks.load(Ordering::SeqCst), 1);

    assert!(ledger
        .list_invoices(&DateRange::all())
        .await
        .expect("Failed to list")
        .is_empty());
    let stock = ledger.list_stock().await.expect("Failed to list");
    assert!(!stock[0].sold);
}

/// Test 10: Best effort leaves earlier keys written
#[tokio::test]
async fn test_best_effort_surfaces_storage_error() {
    init_logger();
    let backend = FailingBackend::new("_settings");
    let ledger = DealerService::new(backend.clone());
    let (_, walk_in, stock) = dealership(&ledger, &["A"]).await;

    backend.arm();
    let result = ledger
        .create_invoice(invoice_form(&walk_in, &[&stock[0].id], "2024-05-01T11:00:00+05:30"))
        .await;
    assert!(matches!(result, Err(Error::StorageError(_))));

    let stock = ledger.list_stock().await.expect("Failed to list");
    assert!(stock[0].sold);
}

// ============================================================================
// Backup and durable storage
// ============================================================================

/// Test 11: Restore without stock aborts
#[tokio::test]
async fn test_restore_missing_stock_leaves_store_untouched() {
    init_logger();
    let ledger = DealerService::new(InMemoryBackend::new());
    let (_, walk_in, stock) = dealership(&ledger, &["A", "B"]).await;
    ledger
        .create_invoice(invoice_form(&walk_in, &[&stock[0].id], "2024-05-01T11:00:00+05:30"))
        .await
        .expect("Failed to create invoice");
    let before = ledger.backup().await.expect("Failed to back up");

    let mut bundle: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&before).unwrap();
    bundle.remove("autoSalesManager_stock");
    bundle.insert(
        "autoSalesManager_invoices".to_string(),
        serde_json::Value::Array(vec![]),
    );

    let result = ledger.restore(&serde_json::to_string(&bundle).unwrap()).await;
    assert!(matches!(result, Err(Error::RestoreError(_))));
    assert_eq!(ledger.backup().await.expect("Failed to back up"), before);
}

/// Test 11b: Restore rolls back a rejected write
///
/// The service runs best-effort, but a restore that fails partway still
/// leaves every key as it was.
#[tokio::test]
async fn test_restore_rolls_back_on_storage_error() {
    init_logger();
    let backend = FailingBackend::new("_settings");
    let ledger = DealerService::new(backend.clone());
    let (_, walk_in, stock) = dealership(&ledger, &["A", "B"]).await;
    let snapshot = ledger.backup().await.expect("Failed to back up");
    ledger
        .create_invoice(invoice_form(&walk_in, &[&stock[0].id], "2024-05-01T11:00:00+05:30"))
        .await
        .expect("Failed to create invoice");
    let current = ledger.backup().await.expect("Failed to back up");

    backend.arm();
    let result = ledger.restore(&snapshot).await;
    assert!(matches!(result, Err(Error::StorageError(_))));
    assert_eq!(ledger.backup().await.expect("Failed to back up"), current);
}

/// Test 12: File backend survives reopen
#[cfg(feature = "file")]
#[tokio::test]
async fn test_file_backend_persists_across_instances() {
    init_logger();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let first = DealerService::new(FileBackend::open(dir.path()).await.expect("Failed to open"));
    let (_, walk_in, stock) = dealership(&first, &["A"]).await;
    let invoice = first
        .create_invoice(invoice_form(&walk_in, &[&stock[0].id], "2024-05-01T11:00:00+05:30"))
        .await
        .expect("Failed to create invoice");
    drop(first);

    let reopened =
        DealerService::new(FileBackend::open(dir.path()).await.expect("Failed to reopen"));
    let loaded = reopened.get_invoice(&invoice.id).await.expect("Failed to get");
    assert_eq!(loaded, invoice);
    assert_eq!(
        reopened.peek_next_invoice_serial(false).await.expect("Failed to peek"),
        "NON-INV-002"
    );
    assert!(dir.path().join("autoSalesManager_invoices.json").exists());
}

/// Test 13: Change notifications
#[tokio::test]
async fn test_subscription_reports_invoice_keys() {
    init_logger();
    let ledger = DealerService::new(InMemoryBackend::new());
    let (_, walk_in, stock) = dealership(&ledger, &["A"]).await;
    let mut changes = ledger.subscribe();

    ledger
        .create_invoice(invoice_form(&walk_in, &[&stock[0].id], "2024-05-01T11:00:00+05:30"))
        .await
        .expect("Failed to create invoice");

    let mut seen = Vec::new();
    while let Some(key) = changes.try_recv() {
        seen.push(key);
    }
    assert_eq!(
        seen,
        vec![
            dealer_ledger::StoreKey::Invoices,
            dealer_ledger::StoreKey::Stock,
            dealer_ledger::StoreKey::InvoiceSettings,
        ]
    );
}
