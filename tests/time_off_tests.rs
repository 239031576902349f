use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use serial_test::serial;

use timeclock::handlers::shared::ApiResponse;

mod common;

use common::{TEST_PIN, TestContext};

#[actix_web::test]
#[serial]
async fn test_create_time_off_request_unauthorized() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let app = test_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/worker/time-off")
        .set_json(json!({
            "startDate": "2025-07-01",
            "endDate": "2025-07-05",
            "requestType": "vacation"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[serial]
async fn test_create_and_list_own_requests() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx.create_employee("EMP-800", TEST_PIN).await;
    let other = ctx.create_employee("EMP-801", TEST_PIN).await;
    ctx.create_time_off_request(other.id).await;
    let app = test_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/worker/time-off")
        .cookie(ctx.worker_cookie(&employee))
        .set_json(json!({
            "startDate": "2025-07-01",
            "endDate": "2025-07-05",
            "requestType": "vacation",
            "reason": "  Beach week  "
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: ApiResponse<Value> = test::read_body_json(resp).await;
    let request = body.data.unwrap();
    assert_eq!(request["status"], "pending");
    assert_eq!(request["reason"], "Beach week");
    assert_eq!(request["userId"], employee.id);

    let req = test::TestRequest::get()
        .uri("/api/worker/time-off")
        .cookie(ctx.worker_cookie(&employee))
        .to_request();
    let body: ApiResponse<Vec<Value>> =
        test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body.data.unwrap().len(), 1);
}

#[actix_web::test]
#[serial]
async fn test_create_request_rejects_inverted_dates() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx.create_employee("EMP-802", TEST_PIN).await;
    let app = test_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/worker/time-off")
        .cookie(ctx.worker_cookie(&employee))
        .set_json(json!({
            "startDate": "2025-07-05",
            "endDate": "2025-07-01",
            "requestType": "sick"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/worker/time-off")
        .cookie(ctx.worker_cookie(&employee))
        .set_json(json!({
            "startDate": "2025-07-01",
            "endDate": "2025-07-02",
            "requestType": "sabbatical"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[serial]
async fn test_approval_notifies_the_employee() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx.create_employee("EMP-803", TEST_PIN).await;
    let request = ctx.create_time_off_request(employee.id).await;
    let app = test_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/admin/time-off?status=pending")
        .cookie(ctx.admin_cookie())
        .to_request();
    let body: ApiResponse<Vec<Value>> =
        test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body.data.unwrap().len(), 1);

    let req = test::TestRequest::post()
        .uri(&format!("/api/admin/time-off/{}/approve", request.id))
        .cookie(ctx.admin_cookie())
        .set_json(json!({ "notes": "Enjoy" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ApiResponse<Value> = test::read_body_json(resp).await;
    let approved = body.data.unwrap();
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["reviewedBy"], "admin");
    assert_eq!(approved["reviewNotes"], "Enjoy");

    // Worker sees one unread notification
    let req = test::TestRequest::get()
        .uri("/api/worker/notifications?unreadOnly=true")
        .cookie(ctx.worker_cookie(&employee))
        .to_request();
    let body: ApiResponse<Vec<Value>> =
        test::read_body_json(test::call_service(&app, req).await).await;
    let notifications = body.data.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["title"], "Time off approved");
    assert!(
        notifications[0]["message"]
            .as_str()
            .unwrap()
            .ends_with("was approved: Enjoy")
    );
    let notification_id = notifications[0]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/worker/notifications/{notification_id}/read"))
        .cookie(ctx.worker_cookie(&employee))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/worker/notifications?unreadOnly=true")
        .cookie(ctx.worker_cookie(&employee))
        .to_request();
    let body: ApiResponse<Vec<Value>> =
        test::read_body_json(test::call_service(&app, req).await).await;
    assert!(body.data.unwrap().is_empty());
}

#[actix_web::test]
#[serial]
async fn test_decided_requests_cannot_be_decided_again() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx.create_employee("EMP-804", TEST_PIN).await;
    let request = ctx.create_time_off_request(employee.id).await;
    let app = test_app!(ctx);

    // Deny without a body
    let req = test::TestRequest::post()
        .uri(&format!("/api/admin/time-off/{}/deny", request.id))
        .cookie(ctx.admin_cookie())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ApiResponse<Value> = test::read_body_json(resp).await;
    assert_eq!(body.data.unwrap()["status"], "denied");

    let req = test::TestRequest::post()
        .uri(&format!("/api/admin/time-off/{}/approve", request.id))
        .cookie(ctx.admin_cookie())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri(&format!("/api/worker/time-off/{}/cancel", request.id))
        .cookie(ctx.worker_cookie(&employee))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/admin/time-off/9999/approve")
        .cookie(ctx.admin_cookie())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[serial]
async fn test_workers_cancel_only_their_own_pending_requests() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_employee("EMP-805", TEST_PIN).await;
    let stranger = ctx.create_employee("EMP-806", TEST_PIN).await;
    let request = ctx.create_time_off_request(owner.id).await;
    let app = test_app!(ctx);

    let req = test::TestRequest::post()
        .uri(&format!("/api/worker/time-off/{}/cancel", request.id))
        .cookie(ctx.worker_cookie(&stranger))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/worker/time-off/{}/cancel", request.id))
        .cookie(ctx.worker_cookie(&owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ApiResponse<Value> = test::read_body_json(resp).await;
    assert_eq!(body.data.unwrap()["status"], "cancelled");

    // Cancelled requests produce no notification
    assert_eq!(ctx.count("notifications").await, 0);
}
