//! Error classification, cancellation and the administrative resources

use chrono::{TimeZone, Utc};
use egnyte_client::{
    AuditStreamOptions, CancellationToken, ClientError, Config, EgnyteClient, LinkFilter, LinkType,
    MemberOp, NewTask, PermissionLevel, ScimListOptions, SetPermissions,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, EgnyteClient) {
    let server = MockServer::start().await;
    let client = EgnyteClient::new(Config::new(server.uri()).with_token("test-token")).unwrap();
    (server, client)
}

// ==================== Error Classification ====================

#[tokio::test]
async fn test_qps_limit_exceeded() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/fs/Shared"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("X-Mashery-Error-Code", "ERR_403_DEVELOPER_OVER_QPS")
                .insert_header("Retry-After", "20")
                .insert_header("X-Accesstoken-Qps-Allotted", "100")
                .insert_header("X-Accesstoken-Qps-Current", "101")
                .set_body_string("<h1>Developer Over Qps</h1>"),
        )
        .mount(&server)
        .await;

    let err = client.files().get_metadata("/Shared", None).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(20)));
    match err {
        ClientError::QpsLimitExceeded {
            retry_after,
            allotted,
            current,
            ..
        } => {
            assert_eq!(retry_after, "20");
            assert_eq!(allotted, "100");
            assert_eq!(current, "101");
        }
        other => panic!("Expected QpsLimitExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_quota_exceeded() {
    let (server, client) = setup().await;

    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("X-Mashery-Error-Code", "ERR_403_DEVELOPER_OVER_RATE")
                .insert_header("Retry-After", "3600")
                .insert_header("X-Accesstoken-Quota-Allotted", "1000")
                .insert_header("X-Accesstoken-Quota-Current", "1001"),
        )
        .mount(&server)
        .await;

    match client.users().get(1).await.unwrap_err() {
        ClientError::RateLimitExceeded {
            allotted, current, ..
        } => {
            assert_eq!(allotted, "1000");
            assert_eq!(current, "1001");
        }
        other => panic!("Expected RateLimitExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_not_found_keeps_status_and_body() {
    let (server, client) = setup().await;

    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("X-Request-Id", "req-1")
                .set_body_string(r#"{"errorMessage":"Not found"}"#),
        )
        .mount(&server)
        .await;

    let err = client.links().get("nope").await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        ClientError::Api {
            status,
            headers,
            message,
            ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(headers.get("x-request-id"), Some("req-1"));
            assert!(message.contains("Not found"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v2/users/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    match client.users().get(5).await.unwrap_err() {
        ClientError::MalformedResponse { body, source, .. } => {
            assert_eq!(body, "<html>gateway</html>");
            assert!(source.is_some());
        }
        other => panic!("Expected MalformedResponse, got {:?}", other),
    }
}

#[tokio::test]
async fn test_audit_stream_rate_limit() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v2/audit/stream"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("X-RateLimit-Limit-Minute", "10")
                .insert_header("X-RateLimit-Remaining-Minute", "0")
                .insert_header("X-RateLimit-Limit-Hour", "300")
                .insert_header("X-RateLimit-Remaining-Hour", "120")
                .insert_header("Retry-After", "42"),
        )
        .mount(&server)
        .await;

    let err = client
        .audit()
        .stream(AuditStreamOptions::after("cursor-1"))
        .await
        .unwrap_err();
    assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
    match err {
        ClientError::AuditRateLimitExceeded {
            minute_limit,
            minute_remaining,
            hour_limit,
            hour_remaining,
            retry_after,
            ..
        } => {
            assert_eq!(minute_limit, "10");
            assert_eq!(minute_remaining, "0");
            assert_eq!(hour_limit, "300");
            assert_eq!(hour_remaining, "120");
            assert_eq!(retry_after, "42");
        }
        other => panic!("Expected AuditRateLimitExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_429_outside_audit_stream_is_generic() {
    let (server, client) = setup().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(429).insert_header("X-RateLimit-Limit-Minute", "10"))
        .mount(&server)
        .await;

    let err = client.groups().get("g-1").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 429, .. }));
}

// ==================== Cancellation ====================

#[tokio::test]
async fn test_cancellation_aborts_pending_request() {
    let (server, client) = setup().await;

    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"folder_id": "late"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let client = client.with_cancellation(token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = client.files().create_folder("/Shared/slow").await.unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
}

// ==================== Users and Groups ====================

#[tokio::test]
async fn test_list_users_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v2/users"))
        .and(query_param("startIndex", "1"))
        .and(query_param("count", "2"))
        .and(query_param("filter", r#"email eq "jdoe@example.com""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startIndex": 1,
            "totalResults": 1,
            "itemsPerPage": 1,
            "resources": [{
                "id": 42,
                "userName": "jdoe",
                "email": "jdoe@example.com",
                "name": {"givenName": "John", "familyName": "Doe"},
                "active": true
            }]
        })))
        .mount(&server)
        .await;

    let page = client
        .users()
        .list(Some(ScimListOptions {
            start_index: Some(1),
            count: Some(2),
            filter: Some(r#"email eq "jdoe@example.com""#.to_string()),
        }))
        .await
        .unwrap();

    assert_eq!(page.total_results, 1);
    assert_eq!(page.resources[0].user_name, "jdoe");
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_delete_user() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/pubapi/v2/users/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.users().delete(42).await.unwrap();
}

#[tokio::test]
async fn test_patch_group_members() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/pubapi/v2/groups/g-1"))
        .and(body_json(json!({
            "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
            "Operations": [{"op": "add", "path": "members", "value": [{"value": 42}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "g-1",
            "displayName": "Finance",
            "members": [{"value": 42, "username": "jdoe"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let group = client
        .groups()
        .patch_members("g-1", MemberOp::Add, &[42])
        .await
        .unwrap();
    assert_eq!(group.members.len(), 1);
}

#[tokio::test]
async fn test_create_group_requires_name() {
    let (server, client) = setup().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.groups().create(" ", &[1]).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidParameter { name: "displayName", .. }));
}

// ==================== Links, Permissions, Tasks ====================

#[tokio::test]
async fn test_list_links_with_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/links"))
        .and(query_param("path", "/Shared/a.txt"))
        .and(query_param("type", "file"))
        .and(query_param("count", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ids": ["l-1", "l-2"],
            "offset": 0,
            "count": 2,
            "total_count": 2
        })))
        .mount(&server)
        .await;

    let ids = client
        .links()
        .list(Some(LinkFilter {
            path: Some("/Shared/a.txt".to_string()),
            link_type: Some(LinkType::File),
            count: Some(10),
            ..Default::default()
        }))
        .await
        .unwrap();

    assert_eq!(ids.ids, vec!["l-1", "l-2"]);
    assert_eq!(ids.total_count, 2);
}

#[tokio::test]
async fn test_get_and_set_permissions() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v2/perms/Shared/Finance"))
        .and(query_param("users", "jdoe,asmith"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userPerms": {"jdoe": "Owner", "asmith": "Viewer"},
            "groupPerms": {},
            "inheritsPermissions": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/pubapi/v2/perms/Shared/Finance"))
        .and(body_json(json!({"groupPerms": {"Finance": "Editor"}})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let perms = client
        .permissions()
        .get("/Shared/Finance", &["jdoe", "asmith"], &[])
        .await
        .unwrap();
    assert_eq!(perms.user_perms["asmith"], PermissionLevel::Viewer);
    assert!(!perms.inherits_permissions);

    let mut request = SetPermissions::default();
    request
        .group_perms
        .insert("Finance".to_string(), PermissionLevel::Editor);
    client
        .permissions()
        .set("/Shared/Finance", &request)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_task() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/pubapi/v1/tasks"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"groupId": "g-1", "task": "Review", "assigneeId": 42})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "t-1",
            "groupId": "g-1",
            "task": "Review",
            "assigneeId": 42,
            "status": "open"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let task = client
        .tasks()
        .create(&NewTask {
            group_id: "g-1".to_string(),
            task: "Review".to_string(),
            assignee_id: 42,
            due_date: None,
            comment: None,
        })
        .await
        .unwrap();
    assert_eq!(task.id, "t-1");
}

// ==================== Audit and Project Folders ====================

#[tokio::test]
async fn test_audit_stream_from_start_date() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v2/audit/stream"))
        .and(query_param("startDate", "2024-01-01T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{"eventType": "FILE_AUDIT"}],
            "nextCursor": "c-2",
            "moreEvents": true
        })))
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let page = client
        .audit()
        .stream(AuditStreamOptions::since(start))
        .await
        .unwrap();
    assert_eq!(page.next_cursor.as_deref(), Some("c-2"));
    assert!(page.more_events);
}

#[tokio::test]
async fn test_audit_stream_needs_one_position() {
    let (_server, client) = setup().await;

    let err = client
        .audit()
        .stream(AuditStreamOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_audit_report_job() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/audit/jobs/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "completed"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pubapi/v1/audit/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("user,action\njdoe,login\n"))
        .mount(&server)
        .await;

    let status = client.audit().report_status("job-1").await.unwrap();
    assert!(status.is_completed());

    let report = client.audit().report("job-1").await.unwrap();
    assert_eq!(report, "user,action\njdoe,login\n");
}

#[tokio::test]
async fn test_find_project_by_root_folder() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/pubapi/v1/project-folders/search"))
        .and(body_json(json!({"rootFolderId": "f-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let found = client
        .project_folders()
        .find_by_root_folder("f-1")
        .await
        .unwrap();
    assert!(found.is_none());
}
