use serde_json::{Value, json};

use crate::agent::Agent;
use crate::bench::{self, DocumentInsertFirst, EndpointProbe, Probe};
use crate::endpoint;
use crate::error::{ContractError, ErrorKind};
use crate::request_log::RequestLog;
use crate::resource::{db, document, organization};
use crate::response::ResponseKind;
use crate::test_support::{Canned, FakeServer};
use crate::util::unreachable_url;

fn envelope(status: &str, type_tag: &str) -> Value {
    json!({"api:status": status, "@type": type_tag})
}

#[test]
fn organization_add_sends_basic_auth_and_verifies_envelope() {
    let server = FakeServer::always(Canned::json(
        200,
        &envelope("api:success", "api:AddOrganizationResponse"),
    ));
    let agent = Agent::new(&server.config()).expect("agent").auth();

    let response = organization::add(
        &agent,
        json!({"organization_name": "acme", "user_name": "bob"}),
    )
    .expect("request")
    .send()
    .expect("send")
    .verify(organization::verify_add_success)
    .expect("verify");
    assert_eq!(response.kind(), ResponseKind::Success);

    let request = server.only_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "/api/organization");
    assert_eq!(request.header("Authorization"), Some("Basic YWRtaW46cm9vdA=="));
    assert_eq!(
        request.json(),
        json!({"organization_name": "acme", "user_name": "bob"})
    );
}

#[test]
fn delete_of_unknown_organization_is_a_not_found_response() {
    let server = FakeServer::always(Canned::json(
        404,
        &envelope("api:not_found", "api:DeleteOrganizationErrorResponse"),
    ));
    let agent = Agent::new(&server.config()).expect("agent").auth();

    let response = organization::del(&agent, json!({"organization_name": "nonexistent-xyz"}))
        .expect("request")
        .send()
        .expect("non-2xx is still a response");
    assert_eq!(response.status(), 404);
    response
        .verify(organization::verify_del_not_found)
        .expect("not found");
    assert_eq!(server.only_request().method, "DELETE");
}

#[test]
fn verification_failure_names_target_field_and_values() {
    let server = FakeServer::always(Canned::json(
        400,
        &envelope("api:failure", "api:AddOrganizationErrorResponse"),
    ));
    let agent = Agent::new(&server.config()).expect("agent").auth();

    let err = organization::add(&agent, json!({"organization_name": "acme"}))
        .expect("request")
        .send()
        .expect("send")
        .verify(organization::verify_add_success)
        .expect_err("mismatch");
    assert_eq!(err.kind(), ErrorKind::Verification);
    match err {
        ContractError::Verification(failure) => {
            assert_eq!(failure.target, "POST /api/organization");
            assert_eq!(failure.field, "status");
            assert_eq!(failure.expected, "200");
            assert!(failure.actual.starts_with("400"));
        }
        other => panic!("expected verification failure, got {other:?}"),
    }
}

#[test]
fn parameter_errors_never_reach_the_server() {
    let server = FakeServer::always(Canned::empty(200));
    let agent = Agent::new(&server.config()).expect("agent").auth();

    let err = organization::add(&agent, json!({"organisation_name": "acme"})).expect_err("typo");
    assert_eq!(err.kind(), ErrorKind::Parameter);
    let err = organization::del(&agent, Value::Null).expect_err("missing");
    assert_eq!(err.kind(), ErrorKind::Assertion);
    assert!(server.requests().is_empty());
}

#[test]
fn raw_body_string_is_sent_verbatim() {
    let server = FakeServer::always(Canned::json(
        400,
        &envelope("api:failure", "api:AddOrganizationErrorResponse"),
    ));
    let agent = Agent::new(&server.config()).expect("agent").auth();

    organization::add(&agent, json!({"bodyString": "{\"organization_name\":"}))
        .expect("request")
        .send()
        .expect("send")
        .verify(organization::verify_add_failure)
        .expect("malformed body is rejected");
    let request = server.only_request();
    assert_eq!(request.body, "{\"organization_name\":");
    assert_eq!(request.header("Content-Type"), Some("application/json"));
}

#[test]
fn document_insert_carries_query_options() {
    let server = FakeServer::always(Canned::json(200, &json!(["terminusdb:///schema#Person"])));
    let agent = Agent::new(&server.config()).expect("agent").auth();
    let target = endpoint::document(&agent.defaults());

    let response = document::insert(
        &agent,
        &target,
        json!({"schema": {"@type": "Class", "@id": "Person"}, "message": "add person"}),
    )
    .expect("request")
    .send()
    .expect("send")
    .verify(document::verify_insert_success)
    .expect("verify");
    assert_eq!(document::written_ids(&response), vec!["terminusdb:///schema#Person"]);

    let request = server.only_request();
    assert_eq!(
        request.path(),
        format!("/api/document/{}/{}", agent.org_name(), agent.db_name())
    );
    assert!(
        request
            .url
            .ends_with("?graph_type=schema&author=admin&message=add+person")
    );
}

#[test]
fn head_request_checks_database_existence() {
    let server = FakeServer::always(Canned::empty(404));
    let agent = Agent::new(&server.config()).expect("agent").auth();
    db::exists(&agent, &endpoint::db(&agent.defaults()))
        .send()
        .expect("send")
        .verify(db::verify_not_exists)
        .expect("absent");
    assert_eq!(server.only_request().method, "HEAD");
}

#[test]
fn request_log_records_dispatched_requests() {
    let temp = tempfile::tempdir().expect("tempdir");
    let log = RequestLog::new(temp.path().join("requests.jsonl"));
    let server = FakeServer::always(Canned::json(
        200,
        &envelope("api:success", "api:AddOrganizationResponse"),
    ));
    let agent = Agent::new(&server.config())
        .expect("agent")
        .auth()
        .with_request_log(log.clone());

    organization::add(&agent, Value::Null)
        .expect("request")
        .send()
        .expect("send");

    let entries = log.read_entries().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].operation, "POST /api/organization");
    assert_eq!(entries[0].status, "ok");
    assert_eq!(entries[0].http_status, Some(200));
}

#[test]
fn refused_connection_is_a_transport_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let log = RequestLog::new(temp.path().join("requests.jsonl"));
    let base_url = unreachable_url().trim_end_matches("/admin/db").to_string();
    let config = crate::config::HarnessConfig {
        base_url,
        timeout_ms: 2_000,
        ..crate::config::HarnessConfig::default()
    };
    let agent = Agent::new(&config).expect("agent").with_request_log(log.clone());

    let err = agent.get(&endpoint::ok()).send().expect_err("refused");
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.code(), "HTTP_ERROR");

    let entries = log.read_entries().expect("entries");
    assert_eq!(entries[0].status, "error");
    assert_eq!(entries[0].error_code.as_deref(), Some("HTTP_ERROR"));
}

fn database_server() -> FakeServer {
    FakeServer::start(|request| match (request.method.as_str(), request.path()) {
        ("POST", path) if path.starts_with("/api/db/") => {
            Canned::json(200, &envelope("api:success", "api:DbCreateResponse"))
        }
        ("DELETE", path) if path.starts_with("/api/db/") => {
            Canned::json(200, &envelope("api:success", "api:DbDeleteResponse"))
        }
        ("POST", path) if path.starts_with("/api/document/") => {
            Canned::json(200, &json!(["terminusdb:///data/Person/1"]))
        }
        ("GET", "/api/ok") => Canned::empty(200),
        _ => Canned::json(400, &envelope("api:failure", "api:UnexpectedRequest")),
    })
}

#[test]
fn document_insert_first_scenario_sets_up_measures_and_tears_down() {
    let server = database_server();
    let agent = Agent::new(&server.config()).expect("agent").auth();
    let mut scenario = DocumentInsertFirst::new(
        agent,
        "person",
        json!({"@type": "Class", "@id": "Person", "name": "xsd:string"}),
        json!({"@type": "Person", "name": "Ada"}),
    );

    let sample = bench::measure(&mut scenario, 2).expect("sample");
    assert_eq!(sample.name, "/api/document:person:POST:http_req_duration:p(90)");
    assert_eq!(sample.unit, "ms");

    let calls: Vec<String> = server
        .requests()
        .iter()
        .map(|r| format!("{} {}", r.method, r.path().split('/').take(3).collect::<Vec<_>>().join("/")))
        .collect();
    let iteration = [
        "POST /api/db",
        "POST /api/document",
        "POST /api/document",
        "DELETE /api/db",
    ];
    assert_eq!(calls, [iteration, iteration].concat());
    assert!(server.requests()[1].url.contains("graph_type=schema"));
    assert!(server.requests()[2].url.contains("graph_type=instance"));
}

#[test]
fn scenario_teardown_runs_when_setup_verification_fails() {
    let server = FakeServer::start(|request| match request.method.as_str() {
        "POST" if request.path().starts_with("/api/db/") => {
            Canned::json(200, &envelope("api:success", "api:DbCreateResponse"))
        }
        "DELETE" => Canned::json(200, &envelope("api:success", "api:DbDeleteResponse")),
        _ => Canned::json(400, &envelope("api:failure", "api:InsertDocumentErrorResponse")),
    });
    let agent = Agent::new(&server.config()).expect("agent").auth();
    let mut scenario = DocumentInsertFirst::new(agent, "one", json!({}), json!({}));

    let err = bench::run_once(&mut scenario).expect_err("schema insert rejected");
    assert_eq!(err.kind(), ErrorKind::Verification);
    let methods: Vec<String> = server.requests().iter().map(|r| r.method.clone()).collect();
    assert_eq!(methods, vec!["POST", "POST", "DELETE"]);
}

#[test]
fn endpoint_probe_hits_ok() {
    let server = database_server();
    let agent = Agent::new(&server.config()).expect("agent");
    let mut probe = EndpointProbe::new(agent, Probe::Ok);
    let sample = bench::measure(&mut probe, 3).expect("sample");
    assert_eq!(sample.name, "/api/ok::GET:http_req_duration:p(90)");
    assert_eq!(server.requests().len(), 3);
}

#[test]
fn db_guard_deletes_database_when_a_later_step_fails() {
    let server = FakeServer::start(|request| match request.method.as_str() {
        "POST" if request.path().starts_with("/api/db/") => {
            Canned::json(200, &envelope("api:success", "api:DbCreateResponse"))
        }
        "DELETE" => Canned::json(200, &envelope("api:success", "api:DbDeleteResponse")),
        _ => Canned::json(400, &envelope("api:failure", "api:InsertDocumentErrorResponse")),
    });
    let agent = Agent::new(&server.config()).expect("agent").auth();
    let db_path = endpoint::db(&agent.defaults());
    let doc_path = endpoint::document(&agent.defaults());

    let step = || -> crate::error::Result<()> {
        let _guard = db::DbGuard::new(&agent, &db_path);
        db::create(&agent, &db_path, Value::Null)?
            .send()?
            .verify(db::verify_create_success)?;
        document::insert(&agent, &doc_path, json!({"schema": {"@type": "Class"}}))?
            .send()?
            .verify(document::verify_insert_success)?;
        Ok(())
    };
    let err = step().expect_err("schema insert rejected");
    assert_eq!(err.kind(), ErrorKind::Verification);

    let requests = server.requests();
    let last = requests.last().expect("cleanup request");
    assert_eq!(last.method, "DELETE");
    assert_eq!(last.path(), db_path.path());
    assert!(last.url.ends_with("?force=true"));
}

#[test]
fn disarmed_db_guard_sends_nothing() {
    let server = FakeServer::always(Canned::empty(200));
    let agent = Agent::new(&server.config()).expect("agent").auth();
    let mut guard = db::DbGuard::new(&agent, &endpoint::db(&agent.defaults()));
    guard.disarm();
    drop(guard);
    assert!(server.requests().is_empty());
}
