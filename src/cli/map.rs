//! `map` command: print the unified module map the sandbox would serve.

use anyhow::Result;
use tokio::runtime::Runtime;

use crate::config::SandboxConfig;
use crate::logger::Logger;
use crate::module_map::{ModuleMap, create_module_map, http_client};

/// Resolve the module map and print it to stdout as JSON.
pub fn print_module_map(
    config: &SandboxConfig,
    logger: &Logger,
    runtime: &Runtime,
    pretty: bool,
) -> Result<()> {
    let client = http_client(config.sandbox.proxy.as_deref())?;
    let maps = runtime.block_on(create_module_map(
        &client,
        &config.module_descriptors(),
        config.sandbox.remote_module_map.as_deref(),
        logger,
    ));

    println!("{}", format_module_map(&maps.unified, pretty)?);
    Ok(())
}

fn format_module_map(map: &ModuleMap, pretty: bool) -> Result<String> {
    let formatted = if pretty {
        serde_json::to_string_pretty(map)?
    } else {
        serde_json::to_string(map)?
    };
    Ok(formatted)
}
