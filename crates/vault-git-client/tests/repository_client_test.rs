//! Contract tests for RepositoryClient against the Azure DevOps Git API.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/{project}/_apis/git/repositories/{name}` | `get_repository_*` |
//! | POST   | `/{project}/_apis/git/repositories` | `create_repository_*` |

use vault_git_client::{CreateRepositoryRequest, DevOpsConfig, GitApiError, GitClient};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(mock_server: &MockServer) -> GitClient {
    let config = DevOpsConfig::local_mock(&mock_server.uri(), "test-token").unwrap();
    GitClient::new(config).unwrap()
}

fn repository_json(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "url": format!("https://dev.azure.com/contoso/_apis/git/repositories/{id}"),
        "project": {
            "id": "eb6e4656-77fc-42a1-9181-4c6d8e9da5d1",
            "name": "Fabrikam",
            "state": "wellFormed"
        },
        "remoteUrl": format!("https://dev.azure.com/contoso/Fabrikam/_git/{name}"),
        "size": 0
    })
}

// ── GET /repositories/{name} ─────────────────────────────────────────

#[tokio::test]
async fn get_repository_returns_repository_when_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Fabrikam/_apis/git/repositories/DevOps_Vault_Reports_Extension"))
        .and(query_param("api-version", "7.1"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository_json(
            "5febef5a-833d-4e14-b9c0-14cb638f91e6",
            "DevOps_Vault_Reports_Extension",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let repo = client
        .repositories()
        .get_by_name("Fabrikam", "DevOps_Vault_Reports_Extension")
        .await
        .unwrap()
        .expect("repository should be found");

    assert_eq!(repo.id.as_str(), "5febef5a-833d-4e14-b9c0-14cb638f91e6");
    assert_eq!(repo.name, "DevOps_Vault_Reports_Extension");
    assert_eq!(repo.project.unwrap().name, "Fabrikam");
    assert!(repo.default_branch.is_none());
}

#[tokio::test]
async fn get_repository_returns_none_when_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Fabrikam/_apis/git/repositories/Missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "TF401019: The Git repository with name or identifier Missing does not exist"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let repo = client
        .repositories()
        .get_by_name("Fabrikam", "Missing")
        .await
        .unwrap();
    assert!(repo.is_none());
}

#[tokio::test]
async fn get_repository_propagates_auth_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Fabrikam/_apis/git/repositories/Reports"))
        .respond_with(ResponseTemplate::new(401).set_body_string("TF400813: not authorized"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .repositories()
        .get_by_name("Fabrikam", "Reports")
        .await
        .unwrap_err();

    match err {
        GitApiError::ApiError { status, body, .. } => {
            assert_eq!(status, 401);
            assert!(body.contains("TF400813"));
        }
        other => panic!("expected ApiError, got: {other:?}"),
    }
}

#[tokio::test]
async fn get_repository_reports_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Fabrikam/_apis/git/repositories/Reports"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>sign in</html>"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .repositories()
        .get_by_name("Fabrikam", "Reports")
        .await
        .unwrap_err();
    assert!(matches!(err, GitApiError::Deserialization { .. }));
}

#[tokio::test]
async fn get_repository_retries_throttled_read() {
    let mock_server = MockServer::start().await;
    let repo_path = "/Fabrikam/_apis/git/repositories/Reports";

    Mock::given(method("GET"))
        .and(path(repo_path))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "0")
                .set_body_string("TF400733: request was throttled"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(repo_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository_json(
            "5febef5a-833d-4e14-b9c0-14cb638f91e6",
            "Reports",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let repo = client
        .repositories()
        .get_by_name("Fabrikam", "Reports")
        .await
        .unwrap()
        .expect("repository after throttled attempt");
    assert_eq!(repo.name, "Reports");
}

#[tokio::test]
async fn get_repository_gives_up_after_repeated_unavailability() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Fabrikam/_apis/git/repositories/Reports"))
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("Retry-After", "0")
                .set_body_string("Service Unavailable"),
        )
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .repositories()
        .get_by_name("Fabrikam", "Reports")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn get_repository_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Fabrikam/_apis/git/repositories/Reports"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .repositories()
        .get_by_name("Fabrikam", "Reports")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

// ── POST /repositories ───────────────────────────────────────────────

#[tokio::test]
async fn create_repository_sends_name_and_returns_repository() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Fabrikam/_apis/git/repositories"))
        .and(query_param("api-version", "7.1"))
        .and(body_json(serde_json::json!({"name": "DevOps_Vault_Reports_Extension"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(repository_json(
            "0a1b2c3d-0000-4000-8000-000000000001",
            "DevOps_Vault_Reports_Extension",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let repo = client
        .repositories()
        .create(
            "Fabrikam",
            &CreateRepositoryRequest::new("DevOps_Vault_Reports_Extension"),
        )
        .await
        .unwrap();

    assert_eq!(repo.id.as_str(), "0a1b2c3d-0000-4000-8000-000000000001");
    assert_eq!(repo.name, "DevOps_Vault_Reports_Extension");
}

#[tokio::test]
async fn create_repository_duplicate_name_is_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Fabrikam/_apis/git/repositories"))
        .respond_with(ResponseTemplate::new(409).set_body_string(
            "TF400948: A Git repository with the name Reports already exists.",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .repositories()
        .create("Fabrikam", &CreateRepositoryRequest::new("Reports"))
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(err.to_string().contains("TF400948"));
}

#[tokio::test]
async fn create_repository_is_not_retried_on_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Fabrikam/_apis/git/repositories"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .repositories()
        .create("Fabrikam", &CreateRepositoryRequest::new("Reports"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
}
