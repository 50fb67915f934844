//! Router-level tests for the dispute flow, including the admin surface.

use axum::{body::Body, http::Request, http::StatusCode};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::*;

fn post_json(uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn admin_auth() -> String {
    format!("Bearer {}", TEST_ADMIN_TOKEN)
}

#[tokio::test]
async fn test_create_dispute_via_api() {
    let state = create_test_app_state();
    let (merchant, tx) = {
        let conn = state.db.get().unwrap();
        let merchant = create_test_merchant(&conn, "Acme");
        let tx = create_success_transaction(&conn, &merchant, 500);
        (merchant, tx)
    };

    let response = test_app(state.clone())
        .oneshot(post_json(
            "/disputes",
            Some(&bearer(&merchant.secret_key)),
            json!({
                "transactionId": tx.id,
                "reason": "product_not_received",
                "customerMessage": "Never arrived"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "open");
    assert_eq!(body["data"]["orderId"], tx.order_id.as_str());
    assert_eq!(body["data"]["amount"], 500);

    // Duplicate dispute on the same transaction conflicts
    let response = test_app(state)
        .oneshot(post_json(
            "/disputes",
            Some(&bearer(&merchant.secret_key)),
            json!({
                "transactionId": tx.id,
                "reason": "duplicate",
                "customerMessage": "Charged twice"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_dispute_listing_filters_by_status() {
    let state = create_test_app_state();
    let merchant = {
        let conn = state.db.get().unwrap();
        let merchant = create_test_merchant(&conn, "Acme");
        let tx1 = create_success_transaction(&conn, &merchant, 100);
        let tx2 = create_success_transaction(&conn, &merchant, 200);
        open_test_dispute(&conn, &merchant.id, &tx1, DisputeReason::Fraudulent);
        let d2 = open_test_dispute(&conn, &merchant.id, &tx2, DisputeReason::Other);
        let response = DisputeResponse {
            merchant_response: "Evidence".to_string(),
            evidence: None,
        };
        disputes::respond_to_dispute(&conn, &merchant.id, &d2.id, &response).unwrap();
        merchant
    };

    let response = test_app(state.clone())
        .oneshot(
            Request::builder()
                .uri("/disputes?status=open")
                .header("Authorization", bearer(&merchant.secret_key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["status"], "open");

    let response = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/disputes?status=all")
                .header("Authorization", bearer(&merchant.secret_key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_respond_endpoint_moves_to_under_review() {
    let state = create_test_app_state();
    let (merchant, dispute) = {
        let conn = state.db.get().unwrap();
        let merchant = create_test_merchant(&conn, "Acme");
        let tx = create_success_transaction(&conn, &merchant, 500);
        let dispute = open_test_dispute(&conn, &merchant.id, &tx, DisputeReason::Unrecognized);
        (merchant, dispute)
    };

    let response = test_app(state.clone())
        .oneshot(post_json(
            &format!("/disputes/{}/respond", dispute.id),
            Some(&bearer(&merchant.secret_key)),
            json!({
                "merchantResponse": "Customer did authorize this",
                "evidence": { "description": "Signed receipt", "documents": [] }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "under_review");
    assert_eq!(body["data"]["merchantResponse"], "Customer did authorize this");

    // Second response is rejected
    let response = test_app(state)
        .oneshot(post_json(
            &format!("/disputes/{}/respond", dispute.id),
            Some(&bearer(&merchant.secret_key)),
            json!({ "merchantResponse": "Again" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resolve_requires_admin_token() {
    let state = create_test_app_state();
    let (merchant, dispute) = {
        let conn = state.db.get().unwrap();
        let merchant = create_test_merchant(&conn, "Acme");
        let tx = create_success_transaction(&conn, &merchant, 500);
        let dispute = open_test_dispute(&conn, &merchant.id, &tx, DisputeReason::Fraudulent);
        (merchant, dispute)
    };

    let body = json!({ "decision": "merchant" });
    let uri = format!("/disputes/{}/resolve", dispute.id);

    // No token
    let response = test_app(state.clone())
        .oneshot(post_json(&uri, None, body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Merchant key is not an admin token
    let response = test_app(state.clone())
        .oneshot(post_json(&uri, Some(&bearer(&merchant.secret_key)), body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong token
    let response = test_app(state)
        .oneshot(post_json(&uri, Some("Bearer admin_wrong_token"), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_resolve_for_customer_refunds_transaction() {
    let (state, mut rx) = create_test_app_state_with_webhooks();
    let (tx, dispute) = {
        let conn = state.db.get().unwrap();
        let merchant = create_test_merchant(&conn, "Acme");
        create_test_webhook(
            &conn,
            &merchant.id,
            "https://hooks.example.com/refunds",
            vec![WebhookEventType::PaymentRefunded],
        );
        let tx = create_success_transaction(&conn, &merchant, 500);
        let dispute = open_test_dispute(&conn, &merchant.id, &tx, DisputeReason::ProductNotReceived);
        (tx, dispute)
    };

    let response = test_app(state.clone())
        .oneshot(post_json(
            &format!("/disputes/{}/resolve", dispute.id),
            Some(&admin_auth()),
            json!({ "decision": "customer", "notes": "No delivery proof" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "lost");
    assert_eq!(body["data"]["resolution"]["decision"], "customer");
    assert_eq!(body["data"]["resolution"]["resolvedBy"], TEST_ADMIN_EMAIL);

    // The underlying transaction was refunded for the dispute amount
    let conn = state.db.get().unwrap();
    let loaded = queries::get_transaction_by_id(&conn, &tx.id).unwrap().unwrap();
    assert_eq!(loaded.status, PaymentStatus::Refunded);
    assert_eq!(loaded.refunded_amount, Some(500));

    // And the refund fanned out
    let job = rx.try_recv().expect("refund webhook queued");
    assert_eq!(job.event, WebhookEventType::PaymentRefunded);

    // Resolving again conflicts
    let response = test_app(state)
        .oneshot(post_json(
            &format!("/disputes/{}/resolve", dispute.id),
            Some(&admin_auth()),
            json!({ "decision": "merchant" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_resolve_for_merchant_keeps_transaction() {
    let state = create_test_app_state();
    let (tx, dispute) = {
        let conn = state.db.get().unwrap();
        let merchant = create_test_merchant(&conn, "Acme");
        let tx = create_success_transaction(&conn, &merchant, 500);
        let dispute = open_test_dispute(&conn, &merchant.id, &tx, DisputeReason::Fraudulent);
        (tx, dispute)
    };

    let response = test_app(state.clone())
        .oneshot(post_json(
            &format!("/disputes/{}/resolve", dispute.id),
            Some(&admin_auth()),
            json!({ "decision": "merchant", "notes": "Chargeback rejected" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "won");

    let conn = state.db.get().unwrap();
    let loaded = queries::get_transaction_by_id(&conn, &tx.id).unwrap().unwrap();
    assert_eq!(loaded.status, PaymentStatus::Success);
    assert!(loaded.refunded_amount.is_none());
}

#[tokio::test]
async fn test_resolve_already_refunded_is_still_ok() {
    // The dispute refund is a silent no-op when the merchant refunded first;
    // the admin's call succeeds either way.
    let state = create_test_app_state();
    let (merchant, tx, dispute) = {
        let conn = state.db.get().unwrap();
        let merchant = create_test_merchant(&conn, "Acme");
        let tx = create_success_transaction(&conn, &merchant, 500);
        let dispute = open_test_dispute(&conn, &merchant.id, &tx, DisputeReason::Other);
        (merchant, tx, dispute)
    };

    let response = test_app(state.clone())
        .oneshot(post_json(
            "/payment/refund",
            Some(&bearer(&merchant.secret_key)),
            json!({ "orderId": tx.order_id, "amount": 500, "reason": "Goodwill" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test_app(state.clone())
        .oneshot(post_json(
            &format!("/disputes/{}/resolve", dispute.id),
            Some(&admin_auth()),
            json!({ "decision": "customer" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let conn = state.db.get().unwrap();
    let loaded = queries::get_transaction_by_id(&conn, &tx.id).unwrap().unwrap();
    assert_eq!(loaded.refund_reason.as_deref(), Some("Goodwill"));
}

#[tokio::test]
async fn test_resolve_invalid_decision_is_validation_error() {
    let state = create_test_app_state();
    let dispute = {
        let conn = state.db.get().unwrap();
        let merchant = create_test_merchant(&conn, "Acme");
        let tx = create_success_transaction(&conn, &merchant, 500);
        open_test_dispute(&conn, &merchant.id, &tx, DisputeReason::Other)
    };

    let response = test_app(state)
        .oneshot(post_json(
            &format!("/disputes/{}/resolve", dispute.id),
            Some(&admin_auth()),
            json!({ "decision": "split-the-difference" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_listings() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        let m1 = create_test_merchant(&conn, "First");
        let m2 = create_test_merchant(&conn, "Second");
        let tx = create_success_transaction(&conn, &m1, 100);
        create_success_transaction(&conn, &m2, 200);
        open_test_dispute(&conn, &m1.id, &tx, DisputeReason::Other);
    }

    let response = test_app(state.clone())
        .oneshot(
            Request::builder()
                .uri("/admin/transactions")
                .header("Authorization", admin_auth())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);

    let response = test_app(state.clone())
        .oneshot(
            Request::builder()
                .uri("/admin/disputes?status=open")
                .header("Authorization", admin_auth())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = test_app(state.clone())
        .oneshot(
            Request::builder()
                .uri("/admin/merchants")
                .header("Authorization", admin_auth())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);
    // Secret keys are never serialized
    assert!(body["items"][0].get("secretKey").is_none());

    // Admin listings are closed without the token
    let response = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/admin/transactions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
