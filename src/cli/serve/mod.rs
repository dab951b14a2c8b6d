//! Development server with live reload support.
//!
//! Startup, in order: module map, build output mirror (which owns the
//! store), proxy relay, live reload server, language packs, scenarios, HTTP
//! listener. Requests are then answered by [`handle_request`]:
//!
//! | Request                          | Answer                                   |
//! |----------------------------------|------------------------------------------|
//! | `GET /__sandbox/hotreload.js`    | live reload client                       |
//! | `GET /static/**`                 | relay, then store, then static directory |
//! | mock route / `/parrot/*`         | scenario router                          |
//! | `POST /error`                    | 202, logged                              |
//! | any other `GET`                  | development document                     |

mod lifecycle;
mod request;
mod response;

use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel;
use tiny_http::{Method, Request, Server};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc;

use crate::actor::ws::WsActor;
use crate::build::{BuildService, OutputMirror};
use crate::config::SandboxConfig;
use crate::core::{Paths, is_shutdown, register_server};
use crate::locale::{LocaleDeps, load_language_packs};
use crate::logger::Logger;
use crate::module_map::{create_module_map, http_client};
use crate::relay::ProxyRelay;
use crate::reload::Publisher;
use crate::reload::server::start_ws_server_with_channel;
use crate::render::{DocumentRenderer, ERROR_REPORTING_URL};
use crate::scenario::{JsonScenarioLoader, ScenarioDeps, ScenarioRouter, load_parrot_middleware};
use crate::store::{BuildOutputStore, MemoryStore};
use lifecycle::{
    Readiness, announce_when_ready, bind_with_retry, forward_shutdown, reload_on_rebuild,
};
use request::{is_static_request, request_path, resolve_static_file};

/// Where the document loads the live reload client from.
pub const HOTRELOAD_PATH: &str = "/__sandbox/hotreload.js";

/// Request handler threads
const REQUEST_THREADS: usize = 4;

/// Everything a request handler needs.
pub struct ServeContext {
    pub paths: Paths,
    pub store: Arc<dyn BuildOutputStore>,
    pub relay: ProxyRelay,
    pub renderer: DocumentRenderer,
    pub scenarios: Option<Arc<ScenarioRouter>>,
    /// Disk fallback for `/static/**`.
    pub static_dir: PathBuf,
    /// Actual live reload port (may differ from the configured one after retry).
    pub ws_port: u16,
    pub runtime: Handle,
    pub logger: Logger,
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

/// Bind the HTTP server without starting the request loop
pub fn bind_server(config: &SandboxConfig, logger: &Logger) -> Result<BoundServer> {
    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port, logger)?;
    crate::info!(
        logger, "serve";
        "Server is listening to http://{}:{}",
        config.serve.display_host(),
        addr.port()
    );

    Ok(BoundServer {
        server: Arc::new(server),
        addr,
    })
}

impl BoundServer {
    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the request loop (blocking until shutdown).
    pub fn run(self, ctx: Arc<ServeContext>) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(REQUEST_THREADS)
            .build()
            .context("failed to create request thread pool")?;

        for request in self.server.incoming_requests() {
            let ctx = Arc::clone(&ctx);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &ctx) {
                    crate::log!(ctx.logger, "serve"; "request error: {e}");
                }
            });
        }
        Ok(())
    }
}

/// Start every service and serve until Ctrl+C.
pub fn serve(config: &SandboxConfig, logger: Logger, runtime: &Runtime) -> Result<()> {
    let _guard = runtime.enter();

    let paths = config.paths();
    let client = http_client(config.sandbox.proxy.as_deref())?;
    let modules = config.module_descriptors();

    let maps = runtime.block_on(logger.time(
        "map",
        "module map - loading",
        create_module_map(
            &client,
            &modules,
            config.sandbox.remote_module_map.as_deref(),
            &logger,
        ),
    ));

    // The build service owns the store; everything else goes through `output()`
    let build: Arc<dyn BuildService> = OutputMirror::start(
        &modules,
        Arc::new(MemoryStore::new()),
        &paths,
        logger.clone(),
    )?;
    let store = build.output();
    let relay = ProxyRelay::new(
        &maps,
        client,
        Arc::clone(&store),
        paths.clone(),
        logger.clone(),
    );

    let (ws_tx, ws_rx) = mpsc::unbounded_channel();
    let publisher = Publisher::new(ws_tx.clone());

    let ws_port = start_ws_server_with_channel(
        &config.serve.interface.to_string(),
        config.serve.ws_port,
        ws_tx.clone(),
        logger.clone(),
    )?;
    runtime.spawn(WsActor::new(ws_rx, logger.clone()).run());
    crate::debug!(logger, "serve"; "live reload on ws://{}:{}", config.serve.display_host(), ws_port);

    let locale = runtime.block_on(load_language_packs(
        &config.locale_options(),
        LocaleDeps {
            store: Arc::clone(&store),
            paths: paths.clone(),
            publisher: publisher.clone(),
            logger: logger.clone(),
        },
    ))?;

    let scenarios = runtime.block_on(load_parrot_middleware(
        &config.scenario_options(),
        ScenarioDeps {
            loader: Arc::new(JsonScenarioLoader::new()),
            publisher: publisher.clone(),
            logger: logger.clone(),
            server_address: config.server_address(),
        },
    ))?;

    let renderer = DocumentRenderer {
        root_module_name: config.sandbox.root_module.clone(),
        module_map: Arc::new(maps.unified),
        local_modules: modules.iter().map(|m| m.name.clone()).collect(),
        externals: config.sandbox.externals.clone(),
        lang: config.sandbox.lang.clone(),
        store: Arc::clone(&store),
        paths: paths.clone(),
        logger: logger.clone(),
    };

    let bound = bind_server(config, &logger)?;
    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    register_server(Arc::clone(&bound.server), shutdown_tx);
    forward_shutdown(shutdown_rx, ws_tx);

    let ctx = Arc::new(ServeContext {
        paths,
        store,
        relay,
        renderer,
        scenarios: scenarios.as_ref().map(|w| Arc::clone(&w.router)),
        static_dir: config.sandbox.static_path.clone(),
        ws_port,
        runtime: runtime.handle().clone(),
        logger: logger.clone(),
    });

    let address = format!(
        "http://{}:{}",
        config.serve.display_host(),
        bound.addr().port()
    );
    runtime.spawn(reload_on_rebuild(Arc::clone(&build), publisher, logger.clone()));
    let readiness = Readiness {
        build,
        locale,
        scenarios,
    };
    runtime.spawn(announce_when_ready(readiness, address, logger));

    bound.run(ctx)
}

/// Handle a single HTTP request
fn handle_request(mut request: Request, ctx: &ServeContext) -> Result<()> {
    // Early exit if shutdown requested
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    let path = request_path(request.url());
    let method = request.method().clone();

    // Serve hotreload.js from memory
    if path == HOTRELOAD_PATH {
        return response::respond_hotreload_js(request, ctx.ws_port);
    }

    let is_read = matches!(method, Method::Get | Method::Head);
    if is_read && is_static_request(&path) {
        return respond_static(request, &path, ctx);
    }

    let mut body = Vec::new();
    if !is_read {
        request
            .as_reader()
            .read_to_end(&mut body)
            .context("failed to read request body")?;
    }

    if let Some(router) = &ctx.scenarios
        && let Some(mock) = router.handle(method.as_str(), &path, &body)
    {
        return response::respond_mock(request, mock);
    }

    if method == Method::Post && path == ERROR_REPORTING_URL {
        crate::warn!(
            ctx.logger, "serve";
            "client reported an error: {}",
            String::from_utf8_lossy(&body)
        );
        return response::respond_accepted(request);
    }

    if is_read {
        return response::respond_document(request, ctx.renderer.render());
    }

    response::respond_not_found(request)
}

/// `/static/**`: relay remote-only module files, then the store, then disk.
fn respond_static(request: Request, path: &str, ctx: &ServeContext) -> Result<()> {
    if let Err(e) = ctx.runtime.block_on(ctx.relay.relay(path)) {
        let error = anyhow::Error::from(e);
        crate::error!(ctx.logger, "relay"; "{:#}", error);
        return response::respond_bad_gateway(request, &error);
    }

    let stored = ctx.paths.context_path(path);
    if let Some(body) = ctx.store.read(&stored) {
        return response::respond_bytes(request, crate::utils::mime::from_path(&stored), body.to_vec());
    }

    if let Some(file) = resolve_static_file(path, &ctx.static_dir) {
        return response::respond_file(request, &file);
    }

    response::respond_not_found(request)
}

#[cfg(test)]
mod tests;
