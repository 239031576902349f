use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::Value;
use serial_test::serial;

use timeclock::handlers::shared::ApiResponse;

mod common;

use common::{TEST_PIN, TestContext, clock_body};

#[actix_web::test]
#[serial]
async fn test_worker_sees_own_open_shift_and_history() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx.create_employee("EMP-900", TEST_PIN).await;
    ctx.create_employee("EMP-901", TEST_PIN).await;
    let app = test_app!(ctx);

    // One closed shift, one open, plus a colleague's shift
    for (code, punches) in [("EMP-900", 3), ("EMP-901", 1)] {
        for _ in 0..punches {
            let req = test::TestRequest::post()
                .uri("/api/clock")
                .set_json(clock_body(code, TEST_PIN, 5.0, 5.0))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }
    }

    let req = test::TestRequest::get()
        .uri("/api/worker/me")
        .cookie(ctx.worker_cookie(&employee))
        .to_request();
    let body: ApiResponse<Value> =
        test::read_body_json(test::call_service(&app, req).await).await;
    let status = body.data.unwrap();
    assert_eq!(status["clockedIn"], true);
    assert_eq!(status["openShift"]["userId"], employee.id);
    assert_eq!(status["user"]["employeeCode"], "EMP-900");

    let req = test::TestRequest::get()
        .uri("/api/worker/shifts")
        .cookie(ctx.worker_cookie(&employee))
        .to_request();
    let body: ApiResponse<Vec<Value>> =
        test::read_body_json(test::call_service(&app, req).await).await;
    let shifts = body.data.unwrap();
    assert_eq!(shifts.len(), 2);
    assert!(shifts.iter().all(|s| s["userId"] == employee.id));

    let req = test::TestRequest::get()
        .uri("/api/worker/shifts?limit=1")
        .cookie(ctx.worker_cookie(&employee))
        .to_request();
    let body: ApiResponse<Vec<Value>> =
        test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body.data.unwrap().len(), 1);
}

#[actix_web::test]
#[serial]
async fn test_worker_cannot_read_someone_elses_notification() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.create_employee("EMP-902", TEST_PIN).await;
    let other = ctx.create_employee("EMP-903", TEST_PIN).await;
    let notification = ctx
        .state
        .notification_repository
        .create(owner.id, "Schedule", "New site opens Monday")
        .await
        .unwrap();
    let app = test_app!(ctx);

    let req = test::TestRequest::post()
        .uri(&format!("/api/worker/notifications/{}/read", notification.id))
        .cookie(ctx.worker_cookie(&other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/worker/notifications")
        .cookie(ctx.worker_cookie(&owner))
        .to_request();
    let body: ApiResponse<Vec<Value>> =
        test::read_body_json(test::call_service(&app, req).await).await;
    let notifications = body.data.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["readAt"], Value::Null);
}
