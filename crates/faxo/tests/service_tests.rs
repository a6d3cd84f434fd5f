//! Service-level tests covering document handling, number assignment
//! and background document analysis.

mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::{TestHarness, OWNER};
use faxo::analysis::{Confidentiality, Sentiment};
use faxo::broadcast::{FaxEvent, FaxEventKind};
use faxo::FaxStatus;

async fn next_analysis_event(
    rx: &mut tokio::sync::broadcast::Receiver<FaxEvent>,
) -> FaxEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.expect("event stream closed");
            if event.kind == FaxEventKind::AnalysisReady {
                return event;
            }
        }
    })
    .await
    .expect("no analysis event arrived")
}

#[tokio::test]
async fn test_send_document_stores_file_and_delivers() {
    let harness = TestHarness::new();

    let fax = harness
        .service
        .send_document(OWNER, "5551234567", "US", "report_q3.pdf", b"%PDF-1.4 body")
        .await
        .unwrap();
    assert_eq!(fax.status, FaxStatus::Pending);

    let stored_path = PathBuf::from(fax.document_ref.clone().unwrap());
    assert!(stored_path.starts_with(harness.temp_path().join(OWNER)));
    assert_eq!(std::fs::read(&stored_path).unwrap(), b"%PDF-1.4 body");

    assert_eq!(
        harness.wait_for_terminal(&fax.id).await,
        FaxStatus::Delivered
    );

    let url = harness.service.document_url(&fax.id).await.unwrap().unwrap();
    assert!(url.starts_with("file://"));
}

#[tokio::test]
async fn test_analysis_event_carries_insights() {
    let harness = TestHarness::new();
    let mut rx = harness.service.subscribe();

    let fax = harness
        .service
        .send_document(
            OWNER,
            "5551234567",
            "US",
            "contract_renewal.pdf",
            b"This contract covers the renewal terms and conditions.",
        )
        .await
        .unwrap();

    let event = next_analysis_event(&mut rx).await;
    assert_eq!(event.fax_id, fax.id);

    let insights = event.insights.expect("analysis event without insights");
    assert!(insights.topics.contains(&"contract".to_string()));
    assert_eq!(insights.confidentiality, Confidentiality::Confidential);
    assert!(insights
        .suggested_recipients
        .contains(&"legal".to_string()));
}

#[tokio::test]
async fn test_analysis_flags_urgent_complaints() {
    let harness = TestHarness::new();
    let mut rx = harness.service.subscribe();

    harness
        .service
        .send_document(
            OWNER,
            "5551234567",
            "US",
            "scan_0042.pdf",
            b"Formal complaint about repeated delivery failures.",
        )
        .await
        .unwrap();

    let event = next_analysis_event(&mut rx).await;
    let insights = event.insights.expect("analysis event without insights");
    assert_eq!(insights.sentiment, Sentiment::Urgent);
}

#[tokio::test]
async fn test_assigned_number_appears_in_overview() {
    let harness = TestHarness::new();

    let assigned = harness.service.assign_fax_number(OWNER, "GB").unwrap();
    assert!(assigned.number.starts_with("+44 "));

    let overview = harness.service.overview(OWNER).await.unwrap();
    let number = overview.fax_number.expect("no number in overview");
    assert_eq!(number.number, assigned.number);
    assert_eq!(number.country_code, "GB");

    let account = overview.account.expect("no account in overview");
    assert_eq!(account.email, "owner@example.com");
}

#[tokio::test]
async fn test_document_url_for_inbound_fax_is_none() {
    let harness = TestHarness::new();

    harness.service.assign_fax_number(OWNER, "US").unwrap();
    let inbound = harness.service.receive_demo_fax(OWNER).unwrap();

    // Inbound demo faxes carry no document.
    assert!(harness
        .service
        .document_url(&inbound.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_demo_fax_uses_owner_country() {
    let harness = TestHarness::new();

    harness.service.assign_fax_number(OWNER, "DE").unwrap();
    let inbound = harness.service.receive_demo_fax(OWNER).unwrap();

    assert_eq!(inbound.counterparty_country, "DE");
    assert!(inbound.counterparty_number.starts_with("+49 "));
    assert!((1..=4).contains(&inbound.pages));
}
