use std::net::SocketAddr;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::matchers::method as http_method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::logger::{LogKind, MemorySink};
use crate::module_map::{
    BrowserEntry, ModuleEntry, ModuleMap, ModuleMaps, create_local_module_map,
    create_unified_module_map,
};
use crate::render::DEFAULT_LANG;
use crate::scenario::parse_scenarios;

struct Harness {
    _dir: TempDir,
    addr: SocketAddr,
    runtime: Runtime,
    paths: Paths,
    store: Arc<MemoryStore>,
    sink: Arc<MemorySink>,
}

impl Harness {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn get(&self, path: &str) -> (u16, String) {
        let url = self.url(path);
        self.runtime.block_on(async {
            let response = reqwest::get(&url).await.unwrap();
            let status = response.status().as_u16();
            (status, response.text().await.unwrap())
        })
    }

    fn send(&self, method: reqwest::Method, path: &str, body: &str) -> (u16, String) {
        let url = self.url(path);
        let body = body.to_string();
        self.runtime.block_on(async {
            let response = reqwest::Client::new()
                .request(method, &url)
                .body(body)
                .send()
                .await
                .unwrap();
            let status = response.status().as_u16();
            (status, response.text().await.unwrap())
        })
    }
}

fn local_maps() -> ModuleMaps {
    let local = create_local_module_map(["root"], None);
    let remote = ModuleMap::default();
    let unified = create_unified_module_map(&local, &remote);
    ModuleMaps {
        remote,
        local,
        unified,
    }
}

/// Serve `handle_request` on an ephemeral port.
fn start(maps: ModuleMaps, scenarios: Option<Arc<ScenarioRouter>>, runtime: Runtime) -> Harness {
    let dir = TempDir::new().unwrap();
    let paths = Paths::new(dir.path());
    let store = Arc::new(MemoryStore::new());
    let (logger, sink) = MemorySink::logger();

    let relay = ProxyRelay::new(
        &maps,
        reqwest::Client::new(),
        store.clone(),
        paths.clone(),
        logger.clone(),
    );
    let renderer = DocumentRenderer {
        root_module_name: "root".into(),
        module_map: Arc::new(maps.unified.clone()),
        local_modules: vec!["root".into()],
        externals: Vec::new(),
        lang: DEFAULT_LANG.into(),
        store: store.clone(),
        paths: paths.clone(),
        logger: logger.clone(),
    };
    let ctx = Arc::new(ServeContext {
        paths: paths.clone(),
        store: store.clone(),
        relay,
        renderer,
        scenarios,
        static_dir: dir.path().join("static"),
        ws_port: 35729,
        runtime: runtime.handle().clone(),
        logger,
    });

    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let _ = handle_request(request, &ctx);
        }
    });

    Harness {
        _dir: dir,
        addr,
        runtime,
        paths,
        store,
        sink,
    }
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

#[test]
fn test_hotreload_js_has_actual_port() {
    let h = start(local_maps(), None, runtime());

    let (status, body) = h.get(HOTRELOAD_PATH);
    assert_eq!(status, 200);
    assert!(body.contains("35729"));
}

#[test]
fn test_static_from_store_then_disk() {
    let h = start(local_maps(), None, runtime());
    h.store
        .write(
            &h.paths.modules_path(&["root", "root.js"]),
            b"console.log('root')".to_vec(),
        )
        .unwrap();
    let vendors = h.paths.vendors_path(&[]);
    std::fs::create_dir_all(&vendors).unwrap();
    std::fs::write(vendors.join("react.js"), "react").unwrap();

    assert_eq!(
        h.get("/static/modules/root/root.js"),
        (200, "console.log('root')".to_string())
    );
    assert_eq!(h.get("/static/vendors/react.js"), (200, "react".to_string()));
    assert_eq!(h.get("/static/vendors/missing.js").0, 404);
}

#[test]
fn test_document_for_any_other_get() {
    let h = start(local_maps(), None, runtime());

    let (status, html) = h.get("/checkout/cart?step=2");
    assert_eq!(status, 200);
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains(r#"<script src="/__sandbox/hotreload.js"></script></body>"#));
}

#[test]
fn test_error_reports_accepted() {
    let h = start(local_maps(), None, runtime());

    let (status, _) = h.send(reqwest::Method::POST, ERROR_REPORTING_URL, "boom");
    assert_eq!(status, 202);
    assert_eq!(
        h.sink.matching(LogKind::Warn, "client reported an error: boom"),
        1
    );

    assert_eq!(h.send(reqwest::Method::PUT, "/nothing-here", "").0, 404);
}

#[test]
fn test_scenario_routes_before_document() {
    let router = Arc::new(ScenarioRouter::new());
    router.reset(
        &parse_scenarios(
            br#"{ "orders": { "request": { "path": "/orders/:id", "method": "GET" }, "response": { "body": { "id": 7 } } } }"#,
        )
        .unwrap(),
    );
    let h = start(local_maps(), Some(router), runtime());

    assert_eq!(h.get("/orders/7"), (200, r#"{"id":7}"#.to_string()));
    assert_eq!(h.get("/parrot/scenarios"), (200, r#"["orders"]"#.to_string()));
    assert!(h.get("/orders").1.starts_with("<!DOCTYPE html>"));
}

#[test]
fn test_relay_failure_is_bad_gateway() {
    let runtime = runtime();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        server
    });

    let local = create_local_module_map(["root"], None);
    let mut remote = ModuleMap::default();
    remote.modules.insert(
        "remote".into(),
        ModuleEntry {
            base_url: Some(format!("{}/remote/1.0.0/", server.uri())),
            browser: BrowserEntry {
                url: format!("{}/remote/1.0.0/remote.browser.js", server.uri()),
            },
        },
    );
    let unified = create_unified_module_map(&local, &remote);
    let maps = ModuleMaps {
        remote,
        local,
        unified,
    };

    let h = start(maps, None, runtime);
    let (status, body) = h.get("/static/modules/remote/remote.browser.js");

    assert_eq!(status, 502);
    assert!(body.contains("responded with 500"));
    assert_eq!(h.sink.count(LogKind::Error), 1);
    drop(server);
}
