use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use serde_json::Value;
use tiny_http::{Header, Response, Server};

use crate::config::HarnessConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is json")
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Canned {
    pub status: u16,
    pub body: String,
}

impl Canned {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

type Responder = dyn Fn(&RecordedRequest) -> Canned + Send + Sync;

/// In-process HTTP server that records every request and answers from a responder.
pub(crate) struct FakeServer {
    server: Arc<Server>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    base_url: String,
    worker: Option<JoinHandle<()>>,
}

impl FakeServer {
    pub fn start(responder: impl Fn(&RecordedRequest) -> Canned + Send + Sync + 'static) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind fake server"));
        let addr = server
            .server_addr()
            .to_ip()
            .expect("fake server listens on tcp");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder: Arc<Responder> = Arc::new(responder);

        let worker = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            std::thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);
                    let recorded = RecordedRequest {
                        method: request.method().to_string(),
                        url: request.url().to_string(),
                        headers: request
                            .headers()
                            .iter()
                            .map(|h| (h.field.to_string(), h.value.to_string()))
                            .collect(),
                        body,
                    };
                    let canned = responder(&recorded);
                    requests.lock().expect("requests lock").push(recorded);
                    let content_type =
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .expect("content type header");
                    let response = Response::from_string(canned.body)
                        .with_status_code(canned.status)
                        .with_header(content_type);
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            server,
            requests,
            base_url: format!("http://{addr}"),
            worker: Some(worker),
        }
    }

    /// Answers every request with the same response.
    pub fn always(canned: Canned) -> Self {
        Self::start(move |_| canned.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            base_url: self.base_url.clone(),
            timeout_ms: 5_000,
            ..HarnessConfig::default()
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn only_request(&self) -> RecordedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request: {requests:?}");
        requests.into_iter().next().expect("one request")
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
