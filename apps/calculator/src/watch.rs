//! Watch mode: newline-delimited snapshots in, one JSON line per settled
//! result out.
//!
//! Input line:  `{"request": <QuoteRequest>, "dragging": true}`
//! Output line: the `CalculationResult`, `null` when nothing is selected, or
//! `{"error": "..."}` when the engine rejects the input.
//!
//! Lines that fail to parse or reference unknown services are logged and
//! skipped.

use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use salon_core::QuoteRequest;

use crate::quote::Stores;
use crate::recalc::{RecalcOutcome, RecalcWorker};

#[derive(Debug, Deserialize)]
struct Snapshot {
    request: QuoteRequest,
    #[serde(default)]
    dragging: bool,
}

/// Runs until `input` is exhausted, then flushes and returns the writer.
pub async fn run<R, W>(stores: &Stores, debounce: Duration, input: R, output: W) -> anyhow::Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (handle, outcomes) = RecalcWorker::start(debounce);
    let printer = tokio::spawn(print_outcomes(outcomes, output));

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let snapshot: Snapshot = match serde_json::from_str(&line) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Skipping malformed snapshot");
                continue;
            }
        };

        match stores.pricing_request(&snapshot.request) {
            Ok(request) => handle.submit(request, snapshot.dragging).await?,
            Err(e) => warn!(error = %e, "Skipping snapshot"),
        }
    }

    debug!("Input closed");
    handle.shutdown().await?;
    printer.await?
}

async fn print_outcomes<W>(mut outcomes: mpsc::Receiver<RecalcOutcome>, mut output: W) -> anyhow::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(outcome) = outcomes.recv().await {
        let line = match outcome {
            Ok(result) => serde_json::to_string(&result)?,
            Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
        };
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use salon_core::types::{CalculatorSettings, PackageConfigs};
    use salon_core::{Money, ServiceCatalog};

    fn stores() -> Stores {
        Stores {
            package_configs: PackageConfigs::new(),
            settings: CalculatorSettings::default(),
            catalog: [("laser-legs".to_string(), Money::from_major(3_000))]
                .into_iter()
                .collect::<ServiceCatalog>(),
        }
    }

    fn snapshot(service: &str, procedure_count: u32, dragging: bool) -> String {
        serde_json::json!({
            "request": {
                "services": [{ "serviceId": service }],
                "procedureCount": procedure_count
            },
            "dragging": dragging
        })
        .to_string()
    }

    fn output_lines(buffer: Vec<u8>) -> Vec<serde_json::Value> {
        String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_then_release_prints_once() {
        let input = [
            snapshot("laser-legs", 5, true),
            snapshot("laser-legs", 6, true),
            "not json".to_string(),
            snapshot("massage", 6, false),
            snapshot("laser-legs", 7, false),
        ]
        .join("\n");

        let buffer = run(&stores(), Duration::from_millis(100), input.as_bytes(), Vec::new())
            .await
            .unwrap();

        let lines = output_lines(buffer);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["baseCost"], serde_json::json!(2_100_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trailing_drag_is_flushed_on_close() {
        let input = snapshot("laser-legs", 4, true);

        let buffer = run(&stores(), Duration::from_millis(100), input.as_bytes(), Vec::new())
            .await
            .unwrap();

        let lines = output_lines(buffer);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["baseCost"], serde_json::json!(1_200_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_errors_are_printed() {
        let input = snapshot("laser-legs", 0, false);

        let buffer = run(&stores(), Duration::from_millis(100), input.as_bytes(), Vec::new())
            .await
            .unwrap();

        let lines = output_lines(buffer);
        assert!(lines[0]["error"].is_string());
    }
}
