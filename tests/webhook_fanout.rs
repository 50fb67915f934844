//! Webhook fan-out contract tests.
//!
//! Jobs are captured on the notifier's channel instead of delivered, so
//! these tests observe exactly what would go over the wire without any
//! network involvement.

mod common;
use common::*;

#[tokio::test]
async fn test_fan_out_targets_only_subscribed_registrations() {
    let (state, mut rx) = create_test_app_state_with_webhooks();
    let conn = state.db.get().unwrap();
    let merchant = create_test_merchant(&conn, "Acme");

    create_test_webhook(
        &conn,
        &merchant.id,
        "https://hooks.example.com/success-only",
        vec![WebhookEventType::PaymentSuccess],
    );
    create_test_webhook(
        &conn,
        &merchant.id,
        "https://hooks.example.com/failed-only",
        vec![WebhookEventType::PaymentFailed],
    );

    let tx = create_success_transaction(&conn, &merchant, 1000);
    let queued = state.webhooks.fan_out(&conn, &tx).unwrap();
    assert_eq!(queued, 1);

    let job = rx.try_recv().expect("one job queued");
    assert_eq!(job.url, "https://hooks.example.com/success-only");
    assert_eq!(job.event, WebhookEventType::PaymentSuccess);
    assert!(rx.try_recv().is_err(), "no further jobs");
}

#[tokio::test]
async fn test_fan_out_reaches_every_subscriber() {
    let (state, mut rx) = create_test_app_state_with_webhooks();
    let conn = state.db.get().unwrap();
    let merchant = create_test_merchant(&conn, "Acme");

    for i in 0..3 {
        create_test_webhook(
            &conn,
            &merchant.id,
            &format!("https://hooks.example.com/{}", i),
            vec![
                WebhookEventType::PaymentSuccess,
                WebhookEventType::PaymentRefunded,
            ],
        );
    }

    let tx = create_success_transaction(&conn, &merchant, 1000);
    assert_eq!(state.webhooks.fan_out(&conn, &tx).unwrap(), 3);
    for _ in 0..3 {
        rx.try_recv().expect("job queued");
    }
}

#[tokio::test]
async fn test_fan_out_is_scoped_to_the_transactions_merchant() {
    let (state, mut rx) = create_test_app_state_with_webhooks();
    let conn = state.db.get().unwrap();
    let merchant = create_test_merchant(&conn, "Acme");
    let bystander = create_test_merchant(&conn, "Bystander");

    create_test_webhook(
        &conn,
        &bystander.id,
        "https://hooks.example.com/bystander",
        vec![WebhookEventType::PaymentSuccess],
    );

    let tx = create_success_transaction(&conn, &merchant, 1000);
    assert_eq!(state.webhooks.fan_out(&conn, &tx).unwrap(), 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_payload_shape_and_signature() {
    let (state, mut rx) = create_test_app_state_with_webhooks();
    let conn = state.db.get().unwrap();
    let merchant = create_test_merchant(&conn, "Acme");

    let hook = create_test_webhook(
        &conn,
        &merchant.id,
        "https://hooks.example.com/all",
        vec![WebhookEventType::PaymentSuccess],
    );

    let tx = create_success_transaction(&conn, &merchant, 1234);
    state.webhooks.fan_out(&conn, &tx).unwrap();
    let job = rx.try_recv().unwrap();

    let payload: serde_json::Value = serde_json::from_str(&job.body).unwrap();
    assert_eq!(payload["event"], "payment.success");
    let data = &payload["data"];
    assert_eq!(data["orderId"], tx.order_id.as_str());
    assert_eq!(data["amount"], 1234);
    assert_eq!(data["currency"], "INR");
    assert_eq!(data["status"], "success");
    assert_eq!(data["method"], "card");
    assert_eq!(data["customerEmail"], tx.customer_email.as_str());
    assert!(data["createdAt"].is_i64());

    // The signature over the exact body bytes verifies under the
    // registration's secret
    assert_eq!(job.secret, hook.secret);
    let expected = sign_payload(&hook.secret, job.body.as_bytes());
    assert_eq!(expected.len(), 64);
    assert_eq!(expected, sign_payload(&job.secret, job.body.as_bytes()));
}

#[tokio::test]
async fn test_refund_fans_out_refunded_event() {
    let (state, mut rx) = create_test_app_state_with_webhooks();
    let conn = state.db.get().unwrap();
    let merchant = create_test_merchant(&conn, "Acme");

    create_test_webhook(
        &conn,
        &merchant.id,
        "https://hooks.example.com/refunds",
        vec![WebhookEventType::PaymentRefunded],
    );

    let tx = create_success_transaction(&conn, &merchant, 1000);
    // Not subscribed to success: nothing queued at settle time
    assert_eq!(state.webhooks.fan_out(&conn, &tx).unwrap(), 0);

    let refunded = payment::refund_payment(
        &conn,
        &merchant.id,
        RefundRequest {
            order_id: &tx.order_id,
            amount: 1000,
            reason: None,
        },
    )
    .unwrap();
    assert_eq!(state.webhooks.fan_out(&conn, &refunded).unwrap(), 1);

    let job = rx.try_recv().unwrap();
    assert_eq!(job.event, WebhookEventType::PaymentRefunded);
    let payload: serde_json::Value = serde_json::from_str(&job.body).unwrap();
    assert_eq!(payload["data"]["status"], "refunded");
}

#[tokio::test]
async fn test_pending_transaction_fans_out_nothing() {
    let (state, mut rx) = create_test_app_state_with_webhooks();
    let conn = state.db.get().unwrap();
    let merchant = create_test_merchant(&conn, "Acme");

    create_test_webhook(
        &conn,
        &merchant.id,
        "https://hooks.example.com/all",
        vec![
            WebhookEventType::PaymentSuccess,
            WebhookEventType::PaymentFailed,
            WebhookEventType::PaymentRefunded,
        ],
    );

    let tx = create_pending_transaction(&conn, &merchant, 1000, PaymentMethod::Card);
    assert_eq!(state.webhooks.fan_out(&conn, &tx).unwrap(), 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_enqueue_never_fails_the_caller() {
    let (state, rx) = create_test_app_state_with_webhooks();
    let conn = state.db.get().unwrap();
    let merchant = create_test_merchant(&conn, "Acme");

    create_test_webhook(
        &conn,
        &merchant.id,
        "https://hooks.example.com/all",
        vec![WebhookEventType::PaymentSuccess],
    );

    // Worker gone: fan-out still succeeds from the caller's perspective
    drop(rx);
    let tx = create_success_transaction(&conn, &merchant, 1000);
    let queued = state.webhooks.fan_out(&conn, &tx).unwrap();
    assert_eq!(queued, 1);
}
