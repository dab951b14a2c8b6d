//! Mock request router.
//!
//! The router owns a stack of [`MockMiddleware`]s that is swapped wholesale on
//! every scenario reload, plus the active scenario selection, which survives
//! reloads as long as the key still exists.
//!
//! Control endpoints:
//!
//! | Request                      | Effect                                   |
//! |------------------------------|------------------------------------------|
//! | `GET /parrot/scenarios`      | all scenario keys                        |
//! | `GET /parrot/scenario`       | active key                               |
//! | `PUT|POST /parrot/scenario`  | `{"scenario": key}` selects a scenario   |

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use regex::Regex;
use serde::Deserialize;

use super::{MockDefinition, ScenarioSet};
use crate::utils::mime::types;

const SCENARIOS_ENDPOINT: &str = "/parrot/scenarios";
const SCENARIO_ENDPOINT: &str = "/parrot/scenario";

/// Incoming request as seen by mock middleware.
#[derive(Debug, Clone, Copy)]
pub struct MockRequest<'a> {
    pub method: &'a str,
    /// Request path without query string.
    pub path: &'a str,
    /// Selected scenario, if any.
    pub scenario: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl MockResponse {
    fn json(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: types::JSON,
            body: value.to_string().into_bytes(),
        }
    }

    fn text(status: u16, text: &str) -> Self {
        Self {
            status,
            content_type: types::PLAIN,
            body: text.as_bytes().to_vec(),
        }
    }
}

/// Answers requests it recognizes; `None` passes the request on.
pub trait MockMiddleware: Send + Sync {
    fn handle(&self, request: &MockRequest<'_>) -> Option<MockResponse>;
}

// ============================================================================
// Parrot middleware
// ============================================================================

/// Serves the mocks of the selected scenario.
pub struct ParrotMiddleware {
    scenarios: Vec<(String, Vec<CompiledMock>)>,
}

struct CompiledMock {
    pattern: Regex,
    method: Option<String>,
    response: MockResponse,
}

impl ParrotMiddleware {
    pub fn new(scenarios: &ScenarioSet) -> Self {
        let scenarios = scenarios
            .iter()
            .map(|(key, mocks)| (key.clone(), mocks.iter().filter_map(compile_mock).collect()))
            .collect();
        Self { scenarios }
    }
}

impl MockMiddleware for ParrotMiddleware {
    fn handle(&self, request: &MockRequest<'_>) -> Option<MockResponse> {
        let key = request.scenario?;
        let (_, mocks) = self.scenarios.iter().find(|(k, _)| k == key)?;

        mocks
            .iter()
            .find(|mock| {
                mock.method
                    .as_deref()
                    .is_none_or(|m| m.eq_ignore_ascii_case(request.method))
                    && mock.pattern.is_match(request.path)
            })
            .map(|mock| mock.response.clone())
    }
}

fn compile_mock(mock: &MockDefinition) -> Option<CompiledMock> {
    let pattern = path_pattern(mock.request.path())?;
    let response = match &mock.response.body {
        serde_json::Value::String(text) => MockResponse::text(mock.response.status, text),
        serde_json::Value::Null => MockResponse::text(mock.response.status, ""),
        body => MockResponse::json(mock.response.status, body),
    };

    Some(CompiledMock {
        pattern,
        method: mock.request.method().map(str::to_string),
        response,
    })
}

/// Anchored regex for an express-style path: `/users/:id` matches `/users/42`.
fn path_pattern(path: &str) -> Option<Regex> {
    let body = path
        .trim_end_matches('/')
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(_) => "[^/]+".to_string(),
            None => regex::escape(segment),
        })
        .collect::<Vec<_>>()
        .join("/");
    Regex::new(&format!("^{body}/?$")).ok()
}

// ============================================================================
// Router
// ============================================================================

#[derive(Deserialize)]
struct SelectScenario {
    scenario: String,
}

/// Mountable sub-router whose middleware stack is replaced on every reload.
pub struct ScenarioRouter {
    stack: ArcSwap<Vec<Arc<dyn MockMiddleware>>>,
    keys: ArcSwap<Vec<String>>,
    active: RwLock<Option<String>>,
}

impl Default for ScenarioRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioRouter {
    pub fn new() -> Self {
        Self {
            stack: ArcSwap::from_pointee(Vec::new()),
            keys: ArcSwap::from_pointee(Vec::new()),
            active: RwLock::new(None),
        }
    }

    /// Replace the stack with a fresh [`ParrotMiddleware`] for `scenarios`.
    pub fn reset(&self, scenarios: &ScenarioSet) {
        let keys: Vec<String> = scenarios.keys().cloned().collect();

        let mut active = self.active.write();
        if active.as_ref().is_some_and(|key| !keys.contains(key)) {
            *active = None;
        }

        let parrot: Arc<dyn MockMiddleware> = Arc::new(ParrotMiddleware::new(scenarios));
        self.stack.store(Arc::new(vec![parrot]));
        self.keys.store(Arc::new(keys));
    }

    pub fn scenario_keys(&self) -> Vec<String> {
        self.keys.load().as_ref().clone()
    }

    /// Explicit selection, else the first scenario.
    pub fn active_scenario(&self) -> Option<String> {
        self.active
            .read()
            .clone()
            .or_else(|| self.keys.load().first().cloned())
    }

    /// Select `key`; false if no such scenario is loaded.
    pub fn select(&self, key: &str) -> bool {
        if !self.keys.load().iter().any(|k| k == key) {
            return false;
        }
        *self.active.write() = Some(key.to_string());
        true
    }

    /// Answer a request, or `None` to let the server continue.
    pub fn handle(&self, method: &str, path: &str, body: &[u8]) -> Option<MockResponse> {
        let path = path.split('?').next().unwrap_or(path);

        match (method, path) {
            ("GET", SCENARIOS_ENDPOINT) => {
                return Some(MockResponse::json(200, &serde_json::json!(self.scenario_keys())));
            }
            ("GET", SCENARIO_ENDPOINT) => {
                return Some(MockResponse::json(200, &serde_json::json!(self.active_scenario())));
            }
            ("PUT" | "POST", SCENARIO_ENDPOINT) => {
                return Some(self.handle_select(body));
            }
            _ => {}
        }

        let active = self.active_scenario();
        let request = MockRequest {
            method,
            path,
            scenario: active.as_deref(),
        };
        self.stack
            .load()
            .iter()
            .find_map(|middleware| middleware.handle(&request))
    }

    fn handle_select(&self, body: &[u8]) -> MockResponse {
        match serde_json::from_slice::<SelectScenario>(body) {
            Ok(SelectScenario { scenario }) if self.select(&scenario) => MockResponse::text(200, "OK"),
            Ok(SelectScenario { scenario }) => {
                MockResponse::text(404, &format!("scenario \"{scenario}\" not found"))
            }
            Err(e) => MockResponse::text(400, &format!("invalid scenario selection: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenarios(json: &str) -> ScenarioSet {
        super::super::parse_scenarios(json.as_bytes()).unwrap()
    }

    fn router() -> ScenarioRouter {
        let router = ScenarioRouter::new();
        router.reset(&scenarios(
            r#"{
                "happy": [
                    { "request": "/users/:id", "response": { "body": { "name": "Ada" } } },
                    { "request": { "path": "/users", "method": "POST" }, "response": { "status": 201, "body": "created" } }
                ],
                "broken": { "request": "/users/:id", "response": { "status": 500 } }
            }"#,
        ));
        router
    }

    #[test]
    fn test_path_pattern() {
        let pattern = path_pattern("/users/:id").unwrap();
        assert!(pattern.is_match("/users/42"));
        assert!(pattern.is_match("/users/42/"));
        assert!(!pattern.is_match("/users"));
        assert!(!pattern.is_match("/users/42/posts"));

        let literal = path_pattern("/a.b").unwrap();
        assert!(!literal.is_match("/aXb"));
    }

    #[test]
    fn test_first_scenario_is_default() {
        let router = router();
        assert_eq!(router.active_scenario().as_deref(), Some("happy"));

        let response = router.handle("GET", "/users/7?full=1", b"").unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, types::JSON);
        assert_eq!(response.body, br#"{"name":"Ada"}"#);
    }

    #[test]
    fn test_method_filter() {
        let router = router();
        assert!(router.handle("GET", "/users", b"").is_none());

        let response = router.handle("POST", "/users", b"").unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.content_type, types::PLAIN);
        assert_eq!(response.body, b"created");
    }

    #[test]
    fn test_select_scenario() {
        let router = router();
        let response = router
            .handle("PUT", SCENARIO_ENDPOINT, br#"{"scenario":"broken"}"#)
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(router.handle("GET", "/users/1", b"").unwrap().status, 500);

        let unknown = router
            .handle("POST", SCENARIO_ENDPOINT, br#"{"scenario":"nope"}"#)
            .unwrap();
        assert_eq!(unknown.status, 404);

        let invalid = router.handle("PUT", SCENARIO_ENDPOINT, b"nope").unwrap();
        assert_eq!(invalid.status, 400);
    }

    #[test]
    fn test_control_endpoints() {
        let router = router();
        let keys = router.handle("GET", SCENARIOS_ENDPOINT, b"").unwrap();
        assert_eq!(keys.body, br#"["happy","broken"]"#);

        let active = router.handle("GET", SCENARIO_ENDPOINT, b"").unwrap();
        assert_eq!(active.body, br#""happy""#);
    }

    #[test]
    fn test_reset_drops_stale_selection() {
        let router = router();
        assert!(router.select("broken"));

        router.reset(&scenarios(r#"{ "other": { "request": "/x", "response": {} } }"#));
        assert_eq!(router.active_scenario().as_deref(), Some("other"));
        assert!(router.handle("GET", "/users/1", b"").is_none());
    }

    #[test]
    fn test_empty_router() {
        let router = ScenarioRouter::new();
        assert!(router.handle("GET", "/users/1", b"").is_none());
        assert_eq!(router.active_scenario(), None);

        router.reset(&ScenarioSet::default());
        assert!(router.scenario_keys().is_empty());
    }
}
