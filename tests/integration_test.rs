use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use tempfile::tempdir;

const TOKEN: &str = "integration-admin-token";

fn cloudadmin(api_url: &str) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("cloudadmin"));
    cmd.env("CLOUD_API_URL", api_url)
        .env("CLOUD_API_ADMIN_TOKEN", TOKEN)
        .env_remove("CLOUD_API_TIMEOUT")
        .env_remove("CLOUD_API_MAX_RETRIES")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_clients_list() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/admin/clients")
        .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"code":"CLI001","name":"Acme"}]"#)
        .create();

    cloudadmin(&server.url())
        .args(["clients", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CLI001"))
        .stdout(predicate::str::contains("Acme"));

    mock.assert();
}

#[test]
fn test_clients_create_conflict() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/admin/clients")
        .match_body(Matcher::Json(serde_json::json!({"code": "CLI001", "name": "Acme"})))
        .with_status(409)
        .with_body(r#"{"detail":"Client already exists"}"#)
        .expect(1)
        .create();

    cloudadmin(&server.url())
        .args(["clients", "create", "--data", r#"{"code":"CLI001","name":"Acme"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Conflicting state"))
        .stderr(predicate::str::contains("Client already exists"));

    mock.assert();
}

#[test]
fn test_clients_delete_not_found_is_not_retried() {
    let mut server = Server::new();
    let mock = server
        .mock("DELETE", "/admin/clients/CLI001")
        .with_status(404)
        .expect(1)
        .create();

    cloudadmin(&server.url())
        .args(["clients", "delete", "CLI001"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));

    mock.assert();
}

#[test]
fn test_fields_list_server_error_is_not_retried() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/admin/fields")
        .with_status(503)
        .expect(1)
        .create();

    cloudadmin(&server.url())
        .args(["fields", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cloud API server error"));

    mock.assert();
}

#[test]
fn test_fields_list_envelope_is_normalized() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/admin/fields")
        .with_status(200)
        .with_body(r#"{"fields":[{"code":"F1","name":"North"}],"clients":[{"code":"CLI001"}]}"#)
        .create();

    let output = cloudadmin(&server.url())
        .args(["fields", "list"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed, serde_json::json!([{"code": "F1", "name": "North"}]));
}

#[test]
fn test_unreachable_api_reports_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    cloudadmin(&format!("http://{}", addr))
        .args(["whatsapp-users", "list", "--max-retries", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cloud API unavailable"));
}

#[test]
fn test_agent_config_written_to_file() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/admin/fields/CLI001/F1/agent-config")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body("CLIENT_CODE=CLI001\nFIELD_CODE=F1\n")
        .create();

    let dir = tempdir().unwrap();
    let path = dir.path().join("agent.env");

    cloudadmin(&server.url())
        .args(["fields", "agent-config", "CLI001", "F1", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved agent config"));

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "CLIENT_CODE=CLI001\nFIELD_CODE=F1\n"
    );
}

#[test]
fn test_whatsapp_users_create_sends_field_ids() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/admin/whatsapp-users")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(serde_json::json!({
            "phone_number": "+56912345678",
            "display_name": "Test User",
            "field_ids": [1, 2, 3]
        })))
        .with_status(201)
        .with_body(r#"{"id":"uuid-123","phone_number":"+56912345678"}"#)
        .create();

    cloudadmin(&server.url())
        .args([
            "whatsapp-users",
            "create",
            "--phone",
            "+56912345678",
            "--display-name",
            "Test User",
            "--field-ids",
            "1,2,3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("uuid-123"));

    mock.assert();
}

#[test]
fn test_json_output() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/admin/whatsapp-users/uuid-123")
        .with_status(401)
        .create();

    let output = cloudadmin(&server.url())
        .args(["whatsapp-users", "get", "uuid-123", "--json"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let printed: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(printed["ok"], false);
    assert_eq!(printed["error_type"], "unauthorized");
    assert_eq!(printed["status"], 401);
}

#[test]
fn test_missing_token_fails() {
    Command::new(cargo::cargo_bin!("cloudadmin"))
        .env("CLOUD_API_URL", "http://127.0.0.1:1")
        .env_remove("CLOUD_API_ADMIN_TOKEN")
        .args(["clients", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CLOUD_API_ADMIN_TOKEN"));
}

#[test]
fn test_check_reports_missing_keys_and_failed_reads() {
    let mut server = Server::new();
    let _clients = server
        .mock("GET", "/admin/clients")
        .with_status(200)
        .with_body(r#"[{"code":"CLI001"}]"#)
        .create();
    let _client = server
        .mock("GET", "/admin/clients/CLI001")
        .with_status(200)
        .with_body(r#"{"code":"CLI001","name":"Acme"}"#)
        .create();
    let _fields = server
        .mock("GET", "/admin/fields")
        .with_status(500)
        .create();
    let _users = server
        .mock("GET", "/admin/whatsapp-users")
        .with_status(200)
        .with_body("[]")
        .create();

    cloudadmin(&server.url())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing key: clients[0].name"))
        .stderr(predicate::str::contains("missing key: client CLI001.terminology"))
        .stderr(predicate::str::contains("GET /admin/fields: Cloud API server error (HTTP 500)"));
}
