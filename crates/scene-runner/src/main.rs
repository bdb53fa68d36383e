//! Scene runner
//!
//! Loads a box configuration, executes its algorithm on the execution worker
//! and prints what every node resolved to.
//!
//! ```text
//! scene-runner <box.json> [engine-config.json] [--steps N]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;

use scene_components::builtin_catalog;
use scene_engine::{
    render_visualizers, resolve, validate_box, BoxConfig, ClientOutcome, CompositionGraph,
    ConfigError, EngineConfig, EventSink, ExecutionClient, ExecutionWorker, LogEventSink,
    Resolution, SceneEvent, SolverInputs, WorkerError,
};

#[derive(Debug, Error)]
enum RunnerError {
    #[error("Usage: scene-runner <box.json> [engine-config.json] [--steps N]")]
    Usage,

    #[error("Invalid step count '{0}'")]
    InvalidSteps(String),

    #[error("Failed to read box file {path}: {source}")]
    ReadBox {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid box file: {0}")]
    ParseBox(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Box configuration has {0} error(s)")]
    Invalid(usize),

    #[error(transparent)]
    Engine(#[from] scene_engine::SceneEngineError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("The algorithm receives no input; see diagnostics")]
    NoAlgorithmInput,
}

#[derive(Debug, PartialEq)]
struct Args {
    box_path: PathBuf,
    config_path: Option<PathBuf>,
    steps: Option<usize>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, RunnerError> {
    let mut positional = Vec::new();
    let mut steps = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--steps" {
            let value = args.next().ok_or(RunnerError::Usage)?;
            steps = Some(value.parse().map_err(|_| RunnerError::InvalidSteps(value))?);
        } else {
            positional.push(PathBuf::from(arg));
        }
    }

    let mut positional = positional.into_iter();
    let box_path = positional.next().ok_or(RunnerError::Usage)?;
    let config_path = positional.next();
    if positional.next().is_some() {
        return Err(RunnerError::Usage);
    }

    Ok(Args {
        box_path,
        config_path,
        steps,
    })
}

async fn load_box(path: &Path) -> Result<BoxConfig, RunnerError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RunnerError::ReadBox {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Resolve the graph and publish how it went
fn resolve_and_publish(
    graph: &CompositionGraph,
    inputs: &SolverInputs,
    sink: &dyn EventSink,
) -> Resolution {
    let resolution = resolve(graph, inputs);
    let event = SceneEvent::GraphResolved {
        node_count: graph.nodes.len(),
        error_count: resolution.error_count(),
    };
    if let Err(e) = sink.send(event) {
        log::debug!("Failed to send scene event: {}", e);
    }
    resolution
}

fn report(graph: &CompositionGraph, resolution: &Resolution) -> Value {
    let renders: serde_json::Map<String, Value> = render_visualizers(graph, resolution)
        .into_iter()
        .map(|(alias, render)| {
            let value = match render {
                Ok(text) => json!(text),
                Err(e) => json!({ "error": e.to_string() }),
            };
            (alias, value)
        })
        .collect();

    let mut diagnostics = Vec::new();
    for error in &resolution.graph_errors {
        diagnostics.push(error.to_string());
    }
    for (alias, slots) in &resolution.input_errors {
        for (slot, error) in slots {
            diagnostics.push(format!("{} [{}]: {}", alias, slot, error));
        }
    }
    for (alias, error) in &resolution.node_errors {
        diagnostics.push(format!("{}: {}", alias, error));
    }

    json!({
        "visualizers": renders,
        "diagnostics": diagnostics,
    })
}

async fn run(args: Args) -> Result<(), RunnerError> {
    let config = match &args.config_path {
        Some(path) => EngineConfig::load(path).await?,
        None => EngineConfig::default(),
    };
    let catalog = Arc::new(builtin_catalog());
    log::info!("Catalog loaded with {} components", catalog.len());

    let box_config = load_box(&args.box_path).await?;
    let errors = validate_box(&box_config, &catalog);
    if !errors.is_empty() {
        for error in &errors {
            log::error!("{}", error);
        }
        return Err(RunnerError::Invalid(errors.len()));
    }
    let graph = box_config
        .resolve(&catalog)
        .map_err(scene_engine::SceneEngineError::from)?;

    let sink: Arc<dyn EventSink> = Arc::new(LogEventSink);
    let initial = resolve_and_publish(&graph, &SolverInputs::initial(&graph), sink.as_ref());
    let algorithm_input = initial
        .input(scene_engine::constants::aliases::ALGORITHM)
        .cloned()
        .ok_or(RunnerError::NoAlgorithmInput)?;

    let worker = ExecutionWorker::spawn(catalog.clone(), &config);
    let client = ExecutionClient::new(Arc::new(worker), sink.clone());

    let outcome = client
        .request(
            box_config.algorithm.clone(),
            algorithm_input,
            args.steps,
            &config.execution,
        )
        .await?;

    let mut inputs = SolverInputs::initial(&graph);
    let mut output = json!({});
    match outcome {
        ClientOutcome::Response(response) => {
            output["steps"] = json!(response.trace.len());
            output["isFullyExecuted"] = json!(response.is_fully_executed);
            output["didHitLimit"] = json!(response.did_hit_limit);
            if let Some(step) = response.trace.last() {
                output["finalState"] = step.state.clone();
                inputs = inputs.with_algorithm_state(step.state.clone());
            }
        }
        ClientOutcome::Failure(failure) => {
            log::warn!("Execution faulted: {}", failure.cause);
            output["fault"] = json!(failure.cause);
        }
        ClientOutcome::Stale { .. } => {}
    }

    let resolution = resolve_and_publish(&graph, &inputs, sink.as_ref());
    let summary = report(&graph, &resolution);
    output["visualizers"] = summary["visualizers"].clone();
    output["diagnostics"] = summary["diagnostics"].clone();

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let result = match parse_args(std::env::args().skip(1)) {
        Ok(args) => run(args).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(
            parse_args(args(&["box.json", "--steps", "5", "engine.json"])).unwrap(),
            Args {
                box_path: "box.json".into(),
                config_path: Some("engine.json".into()),
                steps: Some(5),
            }
        );
        assert!(matches!(parse_args(args(&[])), Err(RunnerError::Usage)));
        assert!(matches!(
            parse_args(args(&["box.json", "--steps", "many"])),
            Err(RunnerError::InvalidSteps(_))
        ));
    }

    #[test]
    fn test_resolution_is_published() {
        let catalog = builtin_catalog();
        let graph = BoxConfig::direct(
            scene_engine::ComponentRef::new(scene_components::keys::COUNTER),
            scene_engine::ComponentRef::new(scene_components::keys::COUNTDOWN),
        )
        .resolve(&catalog)
        .unwrap();
        let sink = scene_engine::VecEventSink::new();

        let resolution = resolve_and_publish(&graph, &SolverInputs::initial(&graph), &sink);
        assert_eq!(
            sink.events(),
            vec![SceneEvent::GraphResolved {
                node_count: 2,
                error_count: resolution.error_count(),
            }]
        );
        // No algorithm state was supplied yet
        assert_eq!(resolution.error_count(), 1);
    }

    #[tokio::test]
    async fn test_runs_demo_box() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box.json");
        tokio::fs::write(
            &path,
            r#"{
                "problem": {"key": "counter"},
                "algorithm": {"key": "countdown"},
                "visualizers": {"view": {"key": "counter-summary"}},
                "connections": [
                    {"fromNode": "problem", "fromSlot": ".", "toNode": "algorithm", "toSlot": "."},
                    {"fromNode": "algorithm", "fromSlot": ".", "toNode": "view", "toSlot": "."}
                ]
            }"#,
        )
        .await
        .unwrap();

        run(Args {
            box_path: path,
            config_path: None,
            steps: None,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_missing_box_file() {
        let result = run(Args {
            box_path: "/nonexistent/box.json".into(),
            config_path: None,
            steps: None,
        })
        .await;
        assert!(matches!(result, Err(RunnerError::ReadBox { .. })));
    }
}
