//! Integration tests for docket-cv API endpoints
//!
//! Covers cluster listing/actions/merge, document browsing and validation,
//! uncertain-document review, ingestion, and the error taxonomy mapping.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method
use uuid::Uuid;

use docket_cv::db::documents::NewDocument;
use docket_cv::db::{clusters, documents, sessions};
use docket_cv::models::TriageStatus;
use docket_cv::recluster::KeywordGroupingEngine;
use docket_cv::{build_router, AppState, ReclusterConfig, ReclusterCoordinator};

struct TestApp {
    app: Router,
    pool: SqlitePool,
    _dir: tempfile::TempDir,
}

/// Test helper: fresh database + router
async fn setup() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = docket_common::db::init_database(&dir.path().join("docket.db"))
        .await
        .expect("init_database");

    let coordinator = ReclusterCoordinator::new(
        pool.clone(),
        Arc::new(KeywordGroupingEngine),
        ReclusterConfig::default(),
    );
    let state = AppState::new(pool.clone(), Arc::new(coordinator));

    TestApp {
        app: build_router(state),
        pool,
        _dir: dir,
    }
}

fn new_doc(name: &str, triage: Option<TriageStatus>) -> NewDocument {
    NewDocument {
        file_name: name.to_string(),
        file_extension: name.rsplit_once('.').map(|(_, ext)| ext.to_string()),
        text_preview: None,
        email_subject: None,
        email_sender: None,
        email_date: None,
        triage_status: triage,
        triage_confidence: triage.map(|_| 0.9),
        triage_reason: None,
    }
}

/// Test helper: session with `file_names` documents all assigned to one cluster
async fn seed_cluster(pool: &SqlitePool, session_id: Uuid, file_names: &[&str]) -> Uuid {
    let docs: Vec<NewDocument> = file_names
        .iter()
        .map(|name| new_doc(name, Some(TriageStatus::FirmDrafted)))
        .collect();
    documents::ingest_documents(pool, session_id, &docs)
        .await
        .expect("ingest");

    let mut tx = pool.begin().await.expect("begin");
    let cluster_id = clusters::insert_cluster(
        &mut *tx,
        session_id,
        1,
        "Seed cluster",
        None,
        None,
        Utc::now(),
    )
    .await
    .expect("insert_cluster");

    let mut document_ids = Vec::new();
    for name in file_names {
        let guid: String = sqlx::query_scalar(
            "SELECT guid FROM documents WHERE session_id = ? AND file_name = ? AND cluster_id IS NULL",
        )
        .bind(session_id.to_string())
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .expect("document guid");
        document_ids.push(Uuid::parse_str(&guid).unwrap());
    }
    clusters::assign_documents(&mut *tx, cluster_id, &document_ids)
        .await
        .expect("assign");
    clusters::recompute_counts(&mut *tx, cluster_id)
        .await
        .expect("recompute");
    tx.commit().await.expect("commit");

    cluster_id
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = extract_json(response.into_body()).await;
    (status, body)
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let test = setup().await;

    let (status, body) = send(&test.app, get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "docket-cv");
    assert!(body["version"].is_string());
}

// =============================================================================
// Sessions and ingestion
// =============================================================================

#[tokio::test]
async fn test_create_session_and_summary() {
    let test = setup().await;

    let (status, body) = send(
        &test.app,
        json_request("POST", "/sessions", json!({"name": "Legacy import"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Legacy import");
    assert_eq!(body["clusteringPass"], 0);
    let session_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            &format!("/sessions/{}/documents", session_id),
            json!({"documents": [
                {"fileName": "contract.docx", "triageStatus": "FirmDrafted", "triageConfidence": 0.92},
                {"fileName": "mystery.pdf", "triageStatus": "Uncertain", "triageConfidence": 0.31},
            ]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ingested"], 2);

    let (status, body) = send(&test.app, get_request(&format!("/sessions/{}", session_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documentCount"], 2);
    assert_eq!(body["reclusterEligible"], 2);
}

#[tokio::test]
async fn test_ingest_rejects_bad_confidence_and_unknown_session() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            &format!("/sessions/{}/documents", session.id),
            json!({"documents": [{"fileName": "a.pdf", "triageConfidence": 1.5}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            &format!("/sessions/{}/documents", Uuid::new_v4()),
            json!({"documents": [{"fileName": "a.pdf"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// Cluster listing and review actions
// =============================================================================

#[tokio::test]
async fn test_list_clusters_stats_and_include_deleted() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    let c1 = seed_cluster(&test.pool, session.id, &["a.pdf", "b.pdf"]).await;
    let c2 = seed_cluster(&test.pool, session.id, &["c.pdf"]).await;

    // Delete c2
    let (status, _) = send(
        &test.app,
        json_request(
            "POST",
            "/clusters",
            json!({"clusterId": c2, "action": "delete"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Deleted clusters excluded by default from list and stats
    let (status, body) = send(
        &test.app,
        get_request(&format!("/clusters?sessionId={}", session.id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clusters"].as_array().unwrap().len(), 1);
    assert_eq!(body["clusters"][0]["id"], c1.to_string());
    assert_eq!(body["stats"]["total"], 1);
    assert_eq!(body["stats"]["pending"], 1);
    assert_eq!(body["stats"]["totalDocuments"], 2);

    // includeDeleted=true brings c2 back
    let (_, body) = send(
        &test.app,
        get_request(&format!(
            "/clusters?sessionId={}&includeDeleted=true",
            session.id
        )),
    )
    .await;
    assert_eq!(body["clusters"].as_array().unwrap().len(), 2);
    assert_eq!(body["stats"]["total"], 2);
    assert_eq!(body["stats"]["totalDocuments"], 3);

    // Unknown session is a 404
    let (status, body) = send(
        &test.app,
        get_request(&format!("/clusters?sessionId={}", Uuid::new_v4())),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_approve_falls_back_to_suggested_name() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    let cluster_id = seed_cluster(&test.pool, session.id, &["a.pdf"]).await;

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/clusters",
            json!({"clusterId": cluster_id, "action": "approve", "validatedBy": "reviewer-7"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Approved");
    assert_eq!(body["approvedName"], body["suggestedName"]);
    assert_eq!(body["validatedBy"], "reviewer-7");
    assert!(body["validatedAt"].is_string());
}

#[tokio::test]
async fn test_second_action_on_terminal_cluster_fails() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    let cluster_id = seed_cluster(&test.pool, session.id, &["a.pdf"]).await;

    let (status, _) = send(
        &test.app,
        json_request(
            "POST",
            "/clusters",
            json!({"clusterId": cluster_id, "action": "reject"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/clusters",
            json!({"clusterId": cluster_id, "action": "approve"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    // State unchanged
    let cluster = clusters::require_cluster(&test.pool, cluster_id).await.unwrap();
    assert_eq!(cluster.status.as_str(), "Rejected");
}

#[tokio::test]
async fn test_action_on_unknown_cluster_is_404() {
    let test = setup().await;
    sessions::create_session(&test.pool, None).await.unwrap();

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/clusters",
            json!({"clusterId": Uuid::new_v4(), "action": "approve"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// Merge
// =============================================================================

#[tokio::test]
async fn test_merge_requires_two_ids_and_a_name() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    let c1 = seed_cluster(&test.pool, session.id, &["a.pdf"]).await;

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/clusters/merge",
            json!({"sessionId": session.id, "clusterIds": [], "newName": "X"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &test.app,
        json_request(
            "POST",
            "/clusters/merge",
            json!({"sessionId": session.id, "clusterIds": [c1], "newName": "X"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let c2 = seed_cluster(&test.pool, session.id, &["b.pdf"]).await;
    let (status, _) = send(
        &test.app,
        json_request(
            "POST",
            "/clusters/merge",
            json!({"sessionId": session.id, "clusterIds": [c1, c2], "newName": "   "}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_merge_conserves_documents_and_retires_sources() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    let c1 = seed_cluster(&test.pool, session.id, &["a.pdf", "b.pdf"]).await;
    let c2 = seed_cluster(&test.pool, session.id, &["c.pdf", "d.pdf", "e.pdf"]).await;

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/clusters/merge",
            json!({"sessionId": session.id, "clusterIds": [c1, c2], "newName": "Correspondence"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestedName"], "Correspondence");
    assert_eq!(body["status"], "Pending");
    assert_eq!(body["documentCount"], 5);
    let counts = &body["validationCounts"];
    assert_eq!(
        counts["accepted"].as_i64().unwrap()
            + counts["deleted"].as_i64().unwrap()
            + counts["reclassified"].as_i64().unwrap()
            + counts["pending"].as_i64().unwrap(),
        5
    );

    // Sources no longer listed as Pending
    let (_, body) = send(
        &test.app,
        get_request(&format!("/clusters?sessionId={}&status=Pending", session.id)),
    )
    .await;
    let listed: Vec<&str> = body["clusters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert!(!listed.contains(&c1.to_string().as_str()));
    assert!(!listed.contains(&c2.to_string().as_str()));
    assert_eq!(listed.len(), 1);

    // Retired sources are immutable
    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/clusters",
            json!({"clusterId": c1, "action": "approve"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_merge_with_unknown_source_is_atomic() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    let c1 = seed_cluster(&test.pool, session.id, &["a.pdf"]).await;

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/clusters/merge",
            json!({"sessionId": session.id, "clusterIds": [c1, Uuid::new_v4()], "newName": "X"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    // c1 untouched
    let cluster = clusters::require_cluster(&test.pool, c1).await.unwrap();
    assert!(cluster.superseded_at.is_none());
    assert_eq!(cluster.document_count, 1);
}

// =============================================================================
// Cluster documents: browsing and validation
// =============================================================================

#[tokio::test]
async fn test_accept_updates_cluster_counters() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    let cluster_id = seed_cluster(&test.pool, session.id, &["a.pdf", "b.pdf", "c.pdf"]).await;

    let (_, body) = send(
        &test.app,
        get_request(&format!("/clusters/{}/documents", cluster_id)),
    )
    .await;
    assert_eq!(body["cluster"]["validationCounts"]["pending"], 3);
    let d1 = body["documents"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            &format!("/clusters/{}/documents", cluster_id),
            json!({"documentId": d1, "action": "accept"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["validationStatus"], "Accepted");

    let cluster = clusters::require_cluster(&test.pool, cluster_id).await.unwrap();
    assert_eq!(cluster.validation_counts.accepted, 1);
    assert_eq!(cluster.validation_counts.pending, 2);
    assert_eq!(cluster.validation_counts.deleted, 0);
    assert_eq!(cluster.validation_counts.reclassified, 0);
    assert_eq!(cluster.validation_counts.sum(), cluster.document_count);
}

#[tokio::test]
async fn test_reclassify_requires_note() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    let cluster_id = seed_cluster(&test.pool, session.id, &["a.pdf"]).await;

    let (_, body) = send(
        &test.app,
        get_request(&format!("/clusters/{}/documents", cluster_id)),
    )
    .await;
    let d1 = body["documents"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            &format!("/clusters/{}/documents", cluster_id),
            json!({"documentId": d1, "action": "reclassify", "reclassificationNote": "  "}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            &format!("/clusters/{}/documents", cluster_id),
            json!({"documentId": d1, "action": "reclassify", "reclassificationNote": "court order, not firm work"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["validationStatus"], "Reclassified");
    assert_eq!(body["reclassificationNote"], "court order, not firm work");

    let cluster = clusters::require_cluster(&test.pool, cluster_id).await.unwrap();
    assert_eq!(cluster.validation_counts.reclassified, 1);
    assert_eq!(cluster.validation_counts.sum(), cluster.document_count);
}

#[tokio::test]
async fn test_document_page_filter_and_search() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    let cluster_id = seed_cluster(
        &test.pool,
        session.id,
        &["brief_draft.docx", "brief_final.docx", "invoice.pdf"],
    )
    .await;

    let (_, body) = send(
        &test.app,
        get_request(&format!("/clusters/{}/documents?search=brief", cluster_id)),
    )
    .await;
    assert_eq!(body["documents"].as_array().unwrap().len(), 2);
    // Stats cover the whole cluster, not the filtered page
    assert_eq!(body["stats"]["total"], 3);

    let (_, body) = send(
        &test.app,
        get_request(&format!(
            "/clusters/{}/documents?status=Accepted",
            cluster_id
        )),
    )
    .await;
    assert_eq!(body["documents"].as_array().unwrap().len(), 0);

    let (status, body) = send(
        &test.app,
        get_request(&format!("/clusters/{}/documents?status=Bogus", cluster_id)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_bulk_action_is_all_or_nothing() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    let cluster_id = seed_cluster(&test.pool, session.id, &["a.pdf", "b.pdf"]).await;

    let (_, body) = send(
        &test.app,
        get_request(&format!("/clusters/{}/documents", cluster_id)),
    )
    .await;
    let ids: Vec<String> = body["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap().to_string())
        .collect();

    // One unknown id fails the whole batch
    let (status, body) = send(
        &test.app,
        json_request(
            "PUT",
            &format!("/clusters/{}/documents", cluster_id),
            json!({"documentIds": [ids[0], Uuid::new_v4().to_string()], "action": "delete"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let cluster = clusters::require_cluster(&test.pool, cluster_id).await.unwrap();
    assert_eq!(cluster.validation_counts.deleted, 0);
    assert_eq!(cluster.validation_counts.pending, 2);

    // Valid batch applies to all
    let (status, body) = send(
        &test.app,
        json_request(
            "PUT",
            &format!("/clusters/{}/documents", cluster_id),
            json!({"documentIds": ids, "action": "accept"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);

    let cluster = clusters::require_cluster(&test.pool, cluster_id).await.unwrap();
    assert_eq!(cluster.validation_counts.accepted, 2);
    assert_eq!(cluster.validation_counts.sum(), cluster.document_count);
}

#[tokio::test]
async fn test_bulk_action_rejects_empty_list_and_reclassify() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    let cluster_id = seed_cluster(&test.pool, session.id, &["a.pdf"]).await;

    let (status, body) = send(
        &test.app,
        json_request(
            "PUT",
            &format!("/clusters/{}/documents", cluster_id),
            json!({"documentIds": [], "action": "accept"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, body) = send(
        &test.app,
        get_request(&format!("/clusters/{}/documents", cluster_id)),
    )
    .await;
    let d1 = body["documents"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &test.app,
        json_request(
            "PUT",
            &format!("/clusters/{}/documents", cluster_id),
            json!({"documentIds": [d1], "action": "reclassify"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Uncertain documents
// =============================================================================

#[tokio::test]
async fn test_uncertain_docs_pagination() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();

    let docs: Vec<NewDocument> = (0..25)
        .map(|i| new_doc(&format!("doc_{:02}.pdf", i), Some(TriageStatus::Uncertain)))
        .collect();
    documents::ingest_documents(&test.pool, session.id, &docs)
        .await
        .unwrap();
    // One non-uncertain document must not show up
    documents::ingest_documents(
        &test.pool,
        session.id,
        &[new_doc("clear.pdf", Some(TriageStatus::FirmDrafted))],
    )
    .await
    .unwrap();

    let (status, body) = send(
        &test.app,
        get_request(&format!("/uncertain-docs?sessionId={}", session.id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"].as_array().unwrap().len(), 20);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["pageSize"], 20);
    assert_eq!(body["pagination"]["total"], 25);
    assert_eq!(body["pagination"]["totalPages"], 2);

    let (_, body) = send(
        &test.app,
        get_request(&format!(
            "/uncertain-docs?sessionId={}&page=2&pageSize=10",
            session.id
        )),
    )
    .await;
    assert_eq!(body["documents"].as_array().unwrap().len(), 10);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["totalPages"], 3);
}

#[tokio::test]
async fn test_uncertain_doc_validation_mirrors_cluster_contract() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    documents::ingest_documents(
        &test.pool,
        session.id,
        &[new_doc("mystery.eml", Some(TriageStatus::Uncertain))],
    )
    .await
    .unwrap();

    let (_, body) = send(
        &test.app,
        get_request(&format!("/uncertain-docs?sessionId={}", session.id)),
    )
    .await;
    let d1 = body["documents"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &test.app,
        json_request(
            "POST",
            "/uncertain-docs",
            json!({"documentId": d1, "action": "reclassify", "reclassificationNote": "third-party expert report"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["validationStatus"], "Reclassified");

    let (status, body) = send(
        &test.app,
        json_request(
            "PUT",
            "/uncertain-docs",
            json!({"documentIds": [d1], "action": "accept"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);
}

// =============================================================================
// Re-cluster endpoints (full lifecycle lives in recluster_tests.rs)
// =============================================================================

#[tokio::test]
async fn test_recluster_trigger_and_poll_over_http() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();
    documents::ingest_documents(
        &test.pool,
        session.id,
        &[
            new_doc("contract_v1.docx", Some(TriageStatus::FirmDrafted)),
            new_doc("contract_v2.docx", Some(TriageStatus::FirmDrafted)),
        ],
    )
    .await
    .unwrap();

    let (status, body) = send(
        &test.app,
        get_request(&format!("/recluster?sessionId={}", session.id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "idle");
    assert_eq!(body["canTrigger"], true);

    let (status, body) = send(
        &test.app,
        json_request("POST", "/recluster", json!({"sessionId": session.id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], true);
    assert_eq!(body["status"], "processing");

    // Poll until the pass settles
    let mut settled = None;
    for _ in 0..500 {
        let (_, body) = send(
            &test.app,
            get_request(&format!("/recluster?sessionId={}", session.id)),
        )
        .await;
        if body["status"] != "processing" {
            settled = Some(body);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    let settled = settled.expect("job should settle");
    assert_eq!(settled["status"], "completed");
    assert_eq!(settled["canTrigger"], false);

    // The pass produced clusters owning the documents
    let (_, body) = send(
        &test.app,
        get_request(&format!("/clusters?sessionId={}", session.id)),
    )
    .await;
    assert_eq!(body["stats"]["totalDocuments"], 2);
    assert!(body["stats"]["total"].as_i64().unwrap() >= 1);
}

#[tokio::test]
async fn test_recluster_trigger_without_eligibility_is_rejected() {
    let test = setup().await;
    let session = sessions::create_session(&test.pool, None).await.unwrap();

    let (status, body) = send(
        &test.app,
        json_request("POST", "/recluster", json!({"sessionId": session.id})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    let (_, body) = send(
        &test.app,
        get_request(&format!("/recluster?sessionId={}", session.id)),
    )
    .await;
    assert_eq!(body["status"], "idle");
}
