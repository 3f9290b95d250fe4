use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEPLOYMENT_VARS: [&str; 7] = [
    "CA_API_BASE_URL",
    "CA_KEYCLOAK_URL",
    "CA_KEYCLOAK_REALM",
    "CA_KEYCLOAK_CLIENT_ID",
    "CA_USERNAME",
    "CA_PASSWORD",
    "RUST_LOG",
];

/// `ca-admin` with config and session files inside `home`
fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ca-admin").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("NO_COLOR", "1");
    for var in DEPLOYMENT_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("intermediate"))
        .stdout(contains("signing-request"))
        .stdout(contains("prefs"));
}

#[test]
fn config_set_and_show() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["config", "set", "realm", "pki"])
        .assert()
        .success();

    cmd(&home)
        .args(["--output", "json", "config", "show"])
        .assert()
        .success()
        .stdout(contains(r#""realm": "pki""#));
}

#[test]
fn config_rejects_unknown_key() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["config", "set", "api_key", "secret"])
        .assert()
        .failure()
        .stderr(contains("Unknown config key"));
}

#[test]
fn prefs_round_trip() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["prefs", "set", "includeInactive", "true"])
        .assert()
        .success();

    cmd(&home)
        .args(["-o", "json", "prefs", "show"])
        .assert()
        .success()
        .stdout(contains(r#""includeInactive": true"#))
        .stdout(contains(r#""sideDrawerOpen": false"#));
}

#[test]
fn health_requires_backend_url() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("health")
        .assert()
        .failure()
        .stderr(contains("Backend URL required"));
}

#[test]
fn health_against_backend() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "2.1.0",
                "ok": true,
                "isInitialized": false
            })))
            .mount(&server)
            .await;
        server
    });

    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["--api-url", &server.uri(), "health"])
        .assert()
        .success()
        .stdout(contains("2.1.0"))
        .stdout(contains("root generate"));
}

#[test]
fn whoami_without_session() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .env("CA_API_BASE_URL", "http://127.0.0.1:9")
        .env("CA_KEYCLOAK_URL", "http://127.0.0.1:9")
        .env("CA_KEYCLOAK_REALM", "pki")
        .env("CA_KEYCLOAK_CLIENT_ID", "ca-frontend")
        .arg("whoami")
        .assert()
        .success()
        .stdout(contains("Not logged in."));
}

#[test]
fn protected_command_without_credentials() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .env("CA_API_BASE_URL", "http://127.0.0.1:9")
        .env("CA_KEYCLOAK_URL", "http://127.0.0.1:9")
        .env("CA_KEYCLOAK_REALM", "pki")
        .env("CA_KEYCLOAK_CLIENT_ID", "ca-frontend")
        .args(["client", "list"])
        .assert()
        .failure()
        .stderr(contains("Login required"));
}

#[test]
fn root_generate_requires_out_file() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["root", "generate"])
        .assert()
        .failure()
        .stderr(contains("--out"));
}

#[test]
fn intermediate_generate_requires_root_bundle() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["intermediate", "generate"])
        .assert()
        .failure()
        .stderr(contains("--root-certificate"));

    cmd(&home)
        .args(["intermediate", "generate", "--root-certificate"])
        .arg(home.path().join("missing.pem"))
        .assert()
        .failure()
        .stderr(contains("Could not read"));
}

#[test]
fn client_create_rejects_out_of_range_days() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["client", "create", "web01", "--days", "100000000"])
        .assert()
        .failure()
        .stderr(contains("1..=36500"));

    cmd(&home)
        .args(["client", "regenerate", "c1", "--days", "0"])
        .assert()
        .failure()
        .stderr(contains("1..=36500"));
}
