use anyhow::{Context, Result};
use nodeflow::{EngineConfig, GraphEngine, NodeTypeRegistry, PassthroughCapability};
use nodeflow_exec::NoopCapability;
use nodeflow_monitoring::{init_logging, LogExt, MonitoringConfig};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Serialize)]
struct Summary {
    nodes: usize,
    edges: usize,
    resolved_edges: usize,
    unresolved_edges: Vec<String>,
    executed: usize,
    failed: Vec<String>,
    cyclic: Vec<String>,
    total_executions: u64,
    cache_hits: u64,
    total_duration_ms: u128,
}

#[tokio::main]
async fn main() -> Result<()> {
    let monitoring_config = MonitoringConfig::from_env();
    init_logging(&monitoring_config).context("Failed to initialize logging")?;

    let path = std::env::args()
        .nth(1)
        .context("Usage: nodeflow <graph.json|graph.yaml|graph.yml>")?;

    let engine = GraphEngine::new(
        Arc::new(NodeTypeRegistry::with_builtin_types()),
        Arc::new(NoopCapability),
        EngineConfig::load(),
    );

    let load = engine
        .load_file(&path)
        .await
        .log_err("Failed to load graph")
        .with_context(|| format!("Failed to load {}", path))?;
    for unresolved in &load.unresolved {
        warn!(edge_id = %unresolved.edge, reason = %unresolved.reason, "Edge left unresolved");
    }

    let capability = engine.with_store(PassthroughCapability::from_store).await?;
    engine.set_capability(Arc::new(capability)).await?;

    let report = engine.execute_all().await.context("Execution failed")?;
    let stats = engine.execution_stats().await?;
    let graph = engine.graph_stats().await?;
    info!(executed = report.executed.len(), failed = report.failed.len(), "Graph executed");

    let summary = Summary {
        nodes: graph.node_count,
        edges: graph.edge_count,
        resolved_edges: graph.resolved_edge_count,
        unresolved_edges: load.unresolved.iter().map(|u| u.edge.to_string()).collect(),
        executed: report.executed.len(),
        failed: report.failed.iter().map(ToString::to_string).collect(),
        cyclic: report.cyclic.iter().map(ToString::to_string).collect(),
        total_executions: stats.total_executions,
        cache_hits: stats.cache_hits,
        total_duration_ms: stats.total_duration.as_millis(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
