//! Domain services.
//!
//! # Data Flow
//! ```text
//! GatewayConfig.services
//!     → for each Domain in registration order (domain.rs)
//!     → ServiceRoutes with one raw RPC per configured name
//!     → UpstreamService::forward (upstream.rs)
//!     → concatenated into one RouteTable
//! ```
//!
//! # Design Decisions
//! - Route order follows `Domain::ALL`, not the order of the config file
//! - All domains share one pooled client
//! - Unconfigured domains contribute no routes (requests get 404)

pub mod domain;
pub mod upstream;

use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::routing::{PatternError, RouteTable};
use crate::rpc::{ServerOptions, ServiceRoutes};

pub use domain::Domain;
pub use upstream::{upstream_client, UpstreamClient, UpstreamService};

/// Build the gateway's route table from the configured services.
pub fn build_route_table(
    config: &GatewayConfig,
    options: &ServerOptions,
) -> Result<RouteTable, PatternError> {
    let client = upstream_client();
    let timeout = Duration::from_secs(config.timeouts.upstream_secs);
    let mut table = RouteTable::new();

    for domain in Domain::ALL {
        let Some(service) = config.services.iter().find(|s| s.domain == domain) else {
            continue;
        };

        let rpcs: Vec<String> = if service.rpcs.is_empty() {
            domain.known_rpcs().iter().map(|rpc| rpc.to_string()).collect()
        } else {
            service.rpcs.clone()
        };
        if rpcs.is_empty() {
            tracing::warn!(domain = %domain, "Service has no RPCs; skipping");
            continue;
        }

        let upstream = Arc::new(UpstreamService::new(
            domain,
            &service.upstream,
            client.clone(),
            timeout,
            options.max_body_bytes,
        ));

        let mut routes = ServiceRoutes::new(domain.as_str(), options.clone());
        for rpc in &rpcs {
            let upstream = upstream.clone();
            let name = rpc.clone();
            routes = routes.raw_rpc(rpc, move |req| {
                let upstream = upstream.clone();
                let rpc = name.clone();
                async move { upstream.forward(&rpc, req).await }
            })?;
        }

        tracing::info!(
            domain = %domain,
            upstream = %service.upstream,
            rpcs = ?rpcs,
            "Domain service registered"
        );
        table.extend(routes);
    }

    Ok(table)
}
