//! Test harness for isolated fax service execution.
//!
//! The `TestHarness` struct wires a complete service against an
//! in-memory database and a temp document root, with resolution delays
//! set to zero so transmissions settle as soon as the runtime yields.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use faxo::analysis::KeywordAnalyzer;
use faxo::config::DeliveryConfig;
use faxo::db::Database;
use faxo::identity::StaticIdentityProvider;
use faxo::lifecycle::{FixedOutcome, Outcome, OutcomeStrategy, ScriptedOutcome};
use faxo::service::FaxService;
use faxo::storage::FileDocumentStore;
use faxo::{FaxStatus, UserAccount};

/// Owner id used across integration tests.
pub const OWNER: &str = "owner-1";

/// Isolated environment for exercising the full service.
pub struct TestHarness {
    temp_dir: TempDir,
    pub service: FaxService,
}

impl TestHarness {
    /// Harness whose faxes always deliver.
    pub fn new() -> Self {
        Self::with_outcome(Arc::new(FixedOutcome::delivered()))
    }

    /// Harness replaying the given outcomes in submission order.
    pub fn with_script(outcomes: Vec<Outcome>) -> Self {
        Self::with_outcome(Arc::new(ScriptedOutcome::new(outcomes)))
    }

    /// Harness with a custom outcome strategy and instant resolution.
    pub fn with_outcome(outcome: Arc<dyn OutcomeStrategy>) -> Self {
        Self::build(instant_config(), outcome)
    }

    /// Harness with full control over config and strategy.
    pub fn build(config: DeliveryConfig, outcome: Arc<dyn OutcomeStrategy>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_in_memory().expect("Failed to open database");
        let service = FaxService::with_strategy(
            db,
            config,
            outcome,
            Arc::new(FileDocumentStore::new(temp_dir.path())),
            Arc::new(KeywordAnalyzer::new()),
            Arc::new(StaticIdentityProvider::single(sample_account())),
        )
        .expect("Failed to build service");

        Self { temp_dir, service }
    }

    /// Base path of the temp document root.
    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Polls until the fax reaches a terminal status.
    pub async fn wait_for_terminal(&self, fax_id: &str) -> FaxStatus {
        for _ in 0..200 {
            if let Some(fax) = self.service.fax(fax_id).expect("Failed to load fax") {
                if fax.status.is_terminal() {
                    return fax.status;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Fax {} did not reach a terminal status in time", fax_id);
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Delivery config with zero delays so resolutions run immediately.
pub fn instant_config() -> DeliveryConfig {
    DeliveryConfig {
        initial_delay_secs: 0,
        retry_delay_secs: 0,
        ..DeliveryConfig::default()
    }
}

pub fn sample_account() -> UserAccount {
    UserAccount {
        id: OWNER.to_string(),
        email: "owner@example.com".to_string(),
        display_name: Some("Owner One".to_string()),
    }
}
