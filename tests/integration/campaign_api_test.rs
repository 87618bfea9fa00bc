// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::TestContext;
use axum::http::StatusCode;
use axum_test::TestServer;
use crmrs::domain::models::campaign::{CampaignStatus, Recurrence, ScheduleType};
use crmrs::domain::models::campaign_log::{CampaignLog, DeliveryStatus};
use crmrs::domain::repositories::campaign_log_repository::CampaignLogRepository;
use crmrs::presentation::extractors::tenant::{ORGANIZATION_ID_HEADER, USER_ID_HEADER};
use crmrs::presentation::routes;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

fn server(ctx: &TestContext) -> TestServer {
    let app = routes::app(ctx.db.clone(), ctx.executor.clone());
    TestServer::new(app).unwrap()
}

/// 等待后台作业结束并返回其 JSON
async fn wait_for_job(server: &TestServer, ctx: &TestContext, job_id: &str) -> Value {
    for _ in 0..100 {
        let response = server
            .get(&format!("/v1/jobs/{}", job_id))
            .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let job: Value = response.json();
        if job["status"] == "success" || job["status"] == "failed" {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", job_id);
}

#[tokio::test]
async fn test_health_and_version() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");

    let response = server.get("/v1/version").await;
    assert_eq!(response.text(), env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_create_campaign_returns_created() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Rita", "r@x.com").await;

    let response = server
        .post("/v1/campaigns")
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .add_header(USER_ID_HEADER, ctx.user.to_string())
        .json(&json!({
            "name": "  Open house  ",
            "template_id": template.id,
            "contact_id": contact.id,
            "schedule_type": "recurring",
            "recurrence": "weekly",
            "recurrence_day_of_week": 3,
            "recurrence_time": "09:30",
            "scheduled_at": "2024-05-01T09:30:00Z"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Campaign created successfully");
    let campaign = &body["campaign"];
    assert_eq!(campaign["name"], "Open house");
    assert_eq!(campaign["status"], "scheduled");
    assert_eq!(campaign["schedule_type"], "recurring");
    assert_eq!(campaign["recurrence"], "weekly");
    assert_eq!(campaign["organization_id"], ctx.org.to_string());
    assert_eq!(campaign["created_by"], ctx.user.to_string());

    let id: Uuid = campaign["id"].as_str().unwrap().parse().unwrap();
    let stored = ctx.reload(id).await;
    assert_eq!(stored.schedule_type, ScheduleType::Recurring);
    assert_eq!(stored.recurrence, Some(Recurrence::Weekly));
    assert_eq!(stored.recurrence_day_of_week, Some(3));
}

#[tokio::test]
async fn test_create_campaign_rejects_invalid_input() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Sam", "s@x.com").await;
    let audience = ctx.seed_audience(&[&contact]).await;

    let cases = [
        (
            json!({ "name": "x", "schedule_type": "once", "contact_id": contact.id }),
            StatusCode::BAD_REQUEST,
            "Name, template_id, and schedule_type are required".to_string(),
        ),
        (
            json!({
                "name": "x", "template_id": template.id, "schedule_type": "once",
                "contact_id": contact.id, "audience_ids": [audience.id]
            }),
            StatusCode::BAD_REQUEST,
            "Must provide either audience_ids or contact_id, not both".to_string(),
        ),
        (
            json!({
                "name": "x", "template_id": template.id, "schedule_type": "once"
            }),
            StatusCode::BAD_REQUEST,
            "Must provide either audience_ids or contact_id, not both".to_string(),
        ),
        (
            json!({
                "name": "x", "template_id": Uuid::new_v4(), "schedule_type": "once",
                "contact_id": contact.id
            }),
            StatusCode::NOT_FOUND,
            "Email template not found".to_string(),
        ),
        (
            json!({
                "name": "x", "template_id": template.id, "schedule_type": "once",
                "contact_id": Uuid::new_v4()
            }),
            StatusCode::NOT_FOUND,
            "Contact not found".to_string(),
        ),
        (
            json!({
                "name": "x", "template_id": template.id, "schedule_type": "recurring",
                "contact_id": contact.id, "recurrence": "monthly"
            }),
            StatusCode::BAD_REQUEST,
            "recurrence_day_of_month is required for monthly campaigns".to_string(),
        ),
        (
            json!({
                "name": "x", "template_id": template.id, "schedule_type": "recurring",
                "contact_id": contact.id, "recurrence": "daily", "recurrence_time": "9am"
            }),
            StatusCode::BAD_REQUEST,
            "Invalid recurrence_time format. Use HH:MM".to_string(),
        ),
    ];

    for (payload, status, message) in cases {
        let response = server
            .post("/v1/campaigns")
            .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
            .add_header(USER_ID_HEADER, ctx.user.to_string())
            .json(&payload)
            .await;
        assert_eq!(response.status_code(), status, "payload: {}", payload);
        let body: Value = response.json();
        assert_eq!(body["error"], message);
    }

    let missing_audience = Uuid::new_v4();
    let response = server
        .post("/v1/campaigns")
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .add_header(USER_ID_HEADER, ctx.user.to_string())
        .json(&json!({
            "name": "x", "template_id": template.id, "schedule_type": "once",
            "audience_ids": [audience.id, missing_audience]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        format!("Audience not found: {}", missing_audience)
    );
}

#[tokio::test]
async fn test_tenant_headers_are_required() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);

    let response = server.get("/v1/campaigns").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        format!("Missing or invalid {} header", ORGANIZATION_ID_HEADER)
    );

    let response = server
        .get("/v1/campaigns")
        .add_header(ORGANIZATION_ID_HEADER, "not-a-uuid")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/v1/campaigns")
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        format!("Missing or invalid {} header", USER_ID_HEADER)
    );
}

#[tokio::test]
async fn test_list_and_get_are_tenant_scoped() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);
    let template = ctx.seed_template().await;

    let campaign = ctx.save(ctx.once_campaign(&template)).await;
    let mut draft = ctx.once_campaign(&template);
    draft.status = CampaignStatus::Draft;
    ctx.save(draft).await;

    let response = server
        .get("/v1/campaigns")
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 20);

    let response = server
        .get("/v1/campaigns")
        .add_query_param("status", "draft")
        .add_query_param("limit", 5)
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["campaigns"][0]["status"], "draft");

    let response = server
        .get("/v1/campaigns")
        .add_query_param("status", "archived")
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .get(&format!("/v1/campaigns/{}", campaign.id))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["id"], campaign.id.to_string());

    let response = server
        .get(&format!("/v1/campaigns/{}", campaign.id))
        .add_header(ORGANIZATION_ID_HEADER, Uuid::new_v4().to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Campaign not found");

    let response = server
        .get("/v1/campaigns")
        .add_header(ORGANIZATION_ID_HEADER, Uuid::new_v4().to_string())
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_update_campaign() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);
    let template = ctx.seed_template().await;
    let campaign = ctx.save(ctx.once_campaign(&template)).await;

    let response = server
        .put(&format!("/v1/campaigns/{}", campaign.id))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .json(&json!({ "name": "Renamed", "scheduled_at": "2030-01-01T00:00:00Z" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["message"], "Campaign updated successfully");
    assert_eq!(body["campaign"]["name"], "Renamed");

    let stored = ctx.reload(campaign.id).await;
    assert_eq!(stored.name, "Renamed");
    assert_eq!(stored.scheduled_at.to_rfc3339(), "2030-01-01T00:00:00+00:00");

    let response = server
        .put(&format!("/v1/campaigns/{}", campaign.id))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .json(&json!({ "name": "   " }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Name cannot be empty");

    let mut completed = ctx.once_campaign(&template);
    completed.status = CampaignStatus::Completed;
    let completed = ctx.save(completed).await;
    let response = server
        .put(&format!("/v1/campaigns/{}", completed.id))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .json(&json!({ "name": "Too late" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_pause_and_resume() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);
    let template = ctx.seed_template().await;
    let campaign = ctx.save(ctx.once_campaign(&template)).await;
    let path = format!("/v1/campaigns/{}", campaign.id);

    let response = server
        .post(&format!("{}/resume", path))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "Can only resume paused or draft campaigns");

    let response = server
        .post(&format!("{}/pause", path))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["message"], "Campaign paused successfully");
    assert_eq!(ctx.reload(campaign.id).await.status, CampaignStatus::Paused);

    let response = server
        .post(&format!("{}/pause", path))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let response = server
        .post(&format!("{}/resume", path))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        ctx.reload(campaign.id).await.status,
        CampaignStatus::Scheduled
    );

    let mut draft = ctx.once_campaign(&template);
    draft.status = CampaignStatus::Draft;
    let draft = ctx.save(draft).await;
    let response = server
        .post(&format!("/v1/campaigns/{}/resume", draft.id))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(ctx.reload(draft.id).await.status, CampaignStatus::Scheduled);
}

/// 手动执行返回 202，作业可通过作业接口查询
#[tokio::test]
async fn test_run_campaign_dispatches_job() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Tess", "t@x.com").await;

    let mut campaign = ctx.once_campaign(&template);
    campaign.contact_id = Some(contact.id);
    let campaign = ctx.save(campaign).await;
    let run_path = format!("/v1/campaigns/{}/run", campaign.id);

    let response = server
        .post(&run_path)
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Campaign run dispatched");
    assert_eq!(body["campaign_id"], campaign.id.to_string());
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let job = wait_for_job(&server, &ctx, &job_id).await;
    assert_eq!(job["status"], "success");
    assert_eq!(job["job_type"], "campaign_run");
    assert_eq!(job["reference_id"], campaign.id.to_string());
    assert_eq!(job["processed_records"], 1);
    assert_eq!(ctx.sender.sent_to(), vec!["t@x.com".to_string()]);

    let response = server
        .post(&run_path)
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "One-time campaign already executed");

    let response = server
        .get(&format!("/v1/jobs/{}", job_id))
        .add_header(ORGANIZATION_ID_HEADER, Uuid::new_v4().to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .get("/v1/jobs")
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["jobs"][0]["id"], job_id);
}

#[tokio::test]
async fn test_run_requires_scheduled_campaign() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);
    let template = ctx.seed_template().await;

    let mut paused = ctx.once_campaign(&template);
    paused.status = CampaignStatus::Paused;
    let paused = ctx.save(paused).await;

    let response = server
        .post(&format!("/v1/campaigns/{}/run", paused.id))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        "Can only run scheduled campaigns, campaign is paused"
    );

    let response = server
        .post(&format!("/v1/campaigns/{}/run", Uuid::new_v4()))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_campaign_logs_with_stats() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);
    let template = ctx.seed_template().await;
    let contact = ctx.seed_contact("Uma", "u@x.com").await;
    let campaign = ctx.save(ctx.once_campaign(&template)).await;

    for outcome in [DeliveryStatus::Sent, DeliveryStatus::Sent, DeliveryStatus::Failed] {
        let log = ctx
            .logs
            .create(&CampaignLog::queued(
                campaign.id,
                contact.id,
                contact.email.clone(),
                "Hi Uma".to_string(),
            ))
            .await
            .unwrap();
        ctx.logs.update_status(log.id, outcome, None).await.unwrap();
    }

    let response = server
        .get(&format!("/v1/campaigns/{}/logs", campaign.id))
        .add_query_param("limit", 2)
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total"], 3);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["logs"].as_array().unwrap().len(), 2);
    assert_eq!(body["stats"]["sent"], 2);
    assert_eq!(body["stats"]["failed"], 1);
    assert_eq!(body["stats"]["queued"], 0);

    let response = server
        .get(&format!("/v1/campaigns/{}/logs", campaign.id))
        .add_header(ORGANIZATION_ID_HEADER, Uuid::new_v4().to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_campaign() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);
    let template = ctx.seed_template().await;

    let mut running = ctx.once_campaign(&template);
    running.status = CampaignStatus::Running;
    let running = ctx.save(running).await;
    let response = server
        .delete(&format!("/v1/campaigns/{}", running.id))
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        "Cannot delete a running campaign. Pause it first."
    );

    let campaign = ctx.save(ctx.once_campaign(&template)).await;
    let path = format!("/v1/campaigns/{}", campaign.id);
    let response = server
        .delete(&path)
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["message"], "Campaign deleted successfully");

    let response = server
        .get(&path)
        .add_header(ORGANIZATION_ID_HEADER, ctx.org.to_string())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
