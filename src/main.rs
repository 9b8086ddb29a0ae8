// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cellweave-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cellweave and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cellweave CLI entrypoint.
//!
//! By default this serves MCP over streamable HTTP at `http://127.0.0.1:<port>/mcp`.
//!
//! Use `--mcp` to run the MCP server over stdio instead (intended for tool integrations).

use std::error::Error;
use std::sync::Arc;

use axum::Router;
use cellweave::engine::{DiagramEngine, EngineConfig};
use cellweave::mcp::{CellweaveMcp, DEFAULT_SESSION_ID};
use cellweave::model::SessionId;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tracing::{info, warn};

const DEFAULT_MCP_HTTP_PORT: u16 = 27436;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--seed <file>] [--continuation-context <chars>] [--mcp-http-port <port>] [--verbose]\n  {program} [--seed <file>] [--continuation-context <chars>] [--verbose] --mcp\n\nBy default MCP is served over streamable HTTP at `http://127.0.0.1:<port>/mcp`.\n--mcp-http-port selects the port (0 = ephemeral; default {DEFAULT_MCP_HTTP_PORT}).\n--mcp serves over stdio instead and cannot be combined with --mcp-http-port.\n\n--seed loads a draw.io file (plain or compressed) into the `{DEFAULT_SESSION_ID}` session.\n--continuation-context sets how many trailing characters a continuation request quotes.\n\nLogs go to stderr; --verbose enables debug output."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    mcp_http_port: Option<u16>,
    seed: Option<String>,
    continuation_context_chars: Option<usize>,
    verbose: bool,
}

impl CliOptions {
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(chars) = self.continuation_context_chars {
            config.continuation_context_chars = chars;
        }
        config
    }
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => {
                if options.mcp {
                    return Err(());
                }
                options.mcp = true;
            }
            "--mcp-http-port" => {
                if options.mcp_http_port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.mcp_http_port = Some(port);
            }
            "--seed" => {
                if options.seed.is_some() {
                    return Err(());
                }
                options.seed = Some(args.next().ok_or(())?);
            }
            "--continuation-context" => {
                if options.continuation_context_chars.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let chars: usize = raw.parse().map_err(|_| ())?;
                if chars == 0 {
                    return Err(());
                }
                options.continuation_context_chars = Some(chars);
            }
            "--verbose" | "-v" => {
                if options.verbose {
                    return Err(());
                }
                options.verbose = true;
            }
            _ => return Err(()),
        }
    }

    if options.mcp && options.mcp_http_port.is_some() {
        return Err(());
    }

    Ok(options)
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn Error>> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_engine(options: &CliOptions) -> Result<DiagramEngine, Box<dyn Error>> {
    let mut engine = DiagramEngine::new(options.engine_config());
    if let Some(path) = options.seed.as_deref() {
        let xml = std::fs::read_to_string(path)?;
        let session_id = SessionId::new(DEFAULT_SESSION_ID)?;
        let reply = engine.load_document(&session_id, &xml)?;
        if reply.is_failure() {
            warn!(path, "seed document rejected");
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("seed {path}: {}", reply.text),
            )));
        }
        info!(path, rev = ?reply.rev, "seed document loaded");
    }
    Ok(engine)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "cellweave".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_tracing(options.verbose)?;
        let mcp = CellweaveMcp::new(build_engine(&options)?);
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        if options.mcp {
            info!("serving MCP over stdio");
            runtime.block_on(mcp.serve_stdio())?;
            return Ok(());
        }

        let mcp_http_port = options.mcp_http_port.unwrap_or(DEFAULT_MCP_HTTP_PORT);
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", mcp_http_port)).await?;
            info!(addr = %listener.local_addr()?, "serving MCP over streamable HTTP at /mcp");

            let config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..StreamableHttpServerConfig::default()
            };
            let shutdown_token = config.cancellation_token.clone();

            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp_service =
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config);

            let router = Router::new().nest_service("/mcp", mcp_service);
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = tokio::signal::ctrl_c().await;
                    shutdown_token.cancel();
                })
                .await?;
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("cellweave: {err}");
        std::process::exit(1);
    }
}
