// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

mod common;

use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::*;
use insurance_client::auth::ProviderKind;
use insurance_client::gateway::{GatewayError, RemoteMethod};
use insurance_client::models::{DocType, PremiumTransaction, UnderwritingStatus};
use insurance_client::ClientError;

#[tokio::test]
async fn last_staged_document_wins() {
    let service = FakeService::new();
    let client = signed_in(&service, "business-owner").await;
    let owner = client.session().identity().unwrap().principal().clone();

    client.stage_document(DocType::FinancialAudit, b"draft audit".to_vec());
    client.stage_document(DocType::FinancialAudit, b"final audit".to_vec());
    assert_eq!(service.calls_to(RemoteMethod::SubmitDocument), 0);

    client.upload_staged(&DocType::FinancialAudit).await.unwrap();

    let uploaded = service.documents_of(&owner);
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0].content, b"final audit");
    assert_eq!(uploaded[0].doc_type, DocType::FinancialAudit);
}

#[tokio::test]
async fn same_kind_by_name_replaces_staged_document() {
    let service = FakeService::new();
    let client = signed_in(&service, "business-owner").await;
    let owner = client.session().identity().unwrap().principal().clone();

    client.stage_document(DocType::from("FinancialAudit"), b"bytes-a".to_vec());
    client.stage_document(DocType::FinancialAudit, b"bytes-b".to_vec());
    assert_eq!(
        client.underwriting().staged_types(),
        vec![DocType::FinancialAudit]
    );

    client.upload_staged(&DocType::FinancialAudit).await.unwrap();
    assert!(matches!(
        client.upload_staged(&DocType::from("FinancialAudit")).await,
        Err(ClientError::MissingDocument(_))
    ));

    let uploaded = service.documents_of(&owner);
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0].content, b"bytes-b");
    assert_eq!(service.calls_to(RemoteMethod::SubmitDocument), 1);
}

#[tokio::test]
async fn successful_upload_clears_staged_entry() {
    let service = FakeService::new();
    let client = signed_in(&service, "business-owner").await;

    client.stage_document(DocType::OperationLicense, vec![0x25, 0x50, 0x44, 0x46]);
    let id = client.upload_staged(&DocType::OperationLicense).await.unwrap();

    assert!(client.underwriting().staged(&DocType::OperationLicense).is_none());
    assert_eq!(client.underwriting().documents()[0].id, id);

    let err = client.upload_staged(&DocType::OperationLicense).await.unwrap_err();
    assert!(matches!(err, ClientError::MissingDocument(DocType::OperationLicense)));
    assert_eq!(service.calls_to(RemoteMethod::SubmitDocument), 1);
}

#[tokio::test]
async fn failed_upload_keeps_document_for_retry() {
    let service = FakeService::new();
    let client = signed_in(&service, "business-owner").await;
    client.stage_document(DocType::ScannedForm, b"scan".to_vec());

    service.fail(
        RemoteMethod::SubmitDocument,
        GatewayError::Network("offline".to_string()),
    );
    assert!(matches!(
        client.upload_staged(&DocType::ScannedForm).await,
        Err(ClientError::Network(_))
    ));
    assert_eq!(
        client.underwriting().staged(&DocType::ScannedForm).unwrap().content,
        b"scan"
    );

    service.clear_failure(RemoteMethod::SubmitDocument);
    client.upload_staged(&DocType::ScannedForm).await.unwrap();
    assert!(client.underwriting().staged(&DocType::ScannedForm).is_none());
}

#[tokio::test]
async fn restaging_during_upload_is_kept() {
    let service = FakeService::new();
    let client = signed_in(&service, "business-owner").await;
    client.stage_document(DocType::FinancialAudit, b"v1".to_vec());

    let gate = service.gate(RemoteMethod::SubmitDocument);
    let upload = tokio::spawn({
        let client = client.clone();
        async move { client.upload_staged(&DocType::FinancialAudit).await }
    });
    gate.reached.notified().await;
    client.stage_document(DocType::FinancialAudit, b"v2".to_vec());
    gate.release.notify_one();

    upload.await.unwrap().unwrap();
    assert_eq!(
        client.underwriting().staged(&DocType::FinancialAudit).unwrap().content,
        b"v2"
    );
}

#[tokio::test]
async fn custom_document_types_round_trip() {
    let service = FakeService::new();
    let client = signed_in(&service, "business-owner").await;
    let fire_cert = DocType::from("FireSafetyCertificate");

    client.stage_document(fire_cert.clone(), b"cert".to_vec());
    client.upload_staged(&fire_cert).await.unwrap();

    let documents = client.list_uploaded().await.unwrap();
    assert_eq!(documents[0].doc_type, fire_cert);
}

#[tokio::test]
async fn listing_replaces_document_cache() {
    let service = FakeService::new();
    let client = signed_in(&service, "business-owner").await;
    client.stage_document(DocType::ScannedForm, b"a".to_vec());
    client.upload_staged(&DocType::ScannedForm).await.unwrap();

    // Another device of the same user uploads meanwhile.
    let other_device = signed_in(&service, "business-owner").await;
    other_device.stage_document(DocType::FinancialAudit, b"b".to_vec());
    other_device
        .upload_staged(&DocType::FinancialAudit)
        .await
        .unwrap();

    assert_eq!(client.underwriting().documents().len(), 1);
    assert_eq!(client.list_uploaded().await.unwrap().len(), 2);
    assert_eq!(client.underwriting().documents().len(), 2);
}

#[tokio::test]
async fn processing_uses_refetched_result() {
    let service = FakeService::new();
    let client = signed_in(&service, "business-owner").await;
    service.set_evaluation(approved_result(1_250_005));

    let result = client.process_underwriting().await.unwrap();

    assert_eq!(result.status, UnderwritingStatus::Approved);
    assert_eq!(result.quotation.as_ref().unwrap().formatted(), "KES 12500.05");
    assert_eq!(client.underwriting().result(), Some(result));
    assert_eq!(service.calls_to(RemoteMethod::GetUnderwritingResult), 1);
}

#[tokio::test]
async fn processing_timeout_leaves_result_unchanged() {
    let service = FakeService::new();
    let mut config = test_config();
    config.call_timeout = Duration::from_millis(50);
    let client = client_with(
        &service,
        insurance_client::auth::ProviderRegistry::new().with(std::sync::Arc::new(
            ScriptedProvider::new(ProviderKind::BrowserWallet, Ok(wallet_identity("slow"))),
        )),
        config,
    );
    client.begin_login(ProviderKind::BrowserWallet).await.unwrap();
    let owner = client.session().identity().unwrap().principal().clone();
    service.set_underwriting(&owner, pending_result());
    client.refresh_underwriting_result().await.unwrap();
    let before = client.underwriting().result();

    service.hang(RemoteMethod::ProcessUnderwriting);
    let err = client.process_underwriting().await.unwrap_err();

    assert!(matches!(err, ClientError::Timeout));
    assert_eq!(client.underwriting().result(), before);
    assert_eq!(service.calls_to(RemoteMethod::GetUnderwritingResult), 1);
}

#[tokio::test]
async fn missing_result_after_processing_is_reported() {
    let service = FakeService::new();
    let client = signed_in(&service, "business-owner").await;

    assert_eq!(client.refresh_underwriting_result().await.unwrap(), None);

    let err = client.process_underwriting().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::RemoteRejected { ref code, .. } if code == "not_found"
    ));
    assert!(client.underwriting().result().is_none());
}

#[tokio::test]
async fn poller_refreshes_pending_underwriting() {
    let service = FakeService::new();
    let client = signed_in(&service, "business-owner").await;
    let owner = client.session().identity().unwrap().principal().clone();
    service.set_underwriting(&owner, pending_result());
    client.refresh_underwriting_result().await.unwrap();

    service.set_underwriting(&owner, approved_result(90_000));
    let report = client.status_poller().poll_once().await;

    assert!(report.result_refreshed);
    assert_eq!(
        client.underwriting().result().unwrap().status,
        UnderwritingStatus::Approved
    );

    // Decided results are not polled again.
    assert!(!client.status_poller().poll_once().await.result_refreshed);
}

#[tokio::test]
async fn profile_and_premiums_load() {
    let service = FakeService::new();
    let client = signed_in(&service, "business-owner").await;
    for (id, day) in [("pt-1", 1), ("pt-2", 15)] {
        service.add_premium(PremiumTransaction {
            id: id.to_string(),
            policy_id: "pol-7".to_string(),
            amount: quotation(450_000),
            paid_at: Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap(),
        });
    }
    client.submit_claim("Stock spoilage").await.unwrap();

    let profile = client.load_profile().await.unwrap();
    assert_eq!(profile.total_claims, 1);

    let premiums = client.list_premium_transactions().await.unwrap();
    assert_eq!(premiums[0].id, "pt-2");
    assert_eq!(premiums[1].id, "pt-1");
}
