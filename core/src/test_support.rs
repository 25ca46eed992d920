use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

enum Outcome {
    Reply(HttpResponse),
    Fail(String),
}

/// Records every request and answers from a queue of canned outcomes.
/// An empty queue answers `{"status_code":200,"status_message":"OK"}`.
#[derive(Default)]
pub(crate) struct StubTransport {
    requests: RefCell<Vec<HttpRequest>>,
    outcomes: RefCell<VecDeque<Outcome>>,
}

impl StubTransport {
    pub(crate) fn reply(&self, status: u16, body: &str) {
        self.outcomes.borrow_mut().push_back(Outcome::Reply(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }));
    }

    pub(crate) fn fail(&self, message: &str) {
        self.outcomes
            .borrow_mut()
            .push_back(Outcome::Fail(message.to_string()));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    /// Body of the most recent request, parsed as JSON.
    pub(crate) fn last_body(&self) -> serde_json::Value {
        let requests = self.requests.borrow();
        let body = requests
            .last()
            .and_then(|r| r.body.as_deref())
            .expect("no request body recorded");
        serde_json::from_str(body).expect("request body is not JSON")
    }
}

impl Transport for StubTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.borrow_mut().push(request.clone());
        match self.outcomes.borrow_mut().pop_front() {
            Some(Outcome::Reply(response)) => Ok(response),
            Some(Outcome::Fail(message)) => Err(ApiError::Transport(message.into())),
            None => Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: r#"{"status_code":200,"status_message":"OK"}"#.to_string(),
            }),
        }
    }
}
