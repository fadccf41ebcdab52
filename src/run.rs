//! Wires generation threads to the worker pool and reports the outcome.

use crate::config::{RunMode, SinkConfig, WorkloadConfig};
use anyhow::Context;
use payload_dispatch::sink::ensure_topic;
use payload_dispatch::{
    dispatch_queue, quotas, DispatchSummary, DispatchTask, FileSinkFactory, KafkaSinkFactory,
    QueueProducer, SinkFactory, WorkerPool,
};
use payload_generator::{GenerationReport, PayloadGenerator};
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Generation side of a [`RunReport`].
#[derive(Debug, Clone, Serialize)]
pub struct GenerationStats {
    pub rendered: u64,
    pub failed: u64,
    pub stopped_early: bool,
    pub duration_ms: u64,
}

impl From<&GenerationReport> for GenerationStats {
    fn from(report: &GenerationReport) -> Self {
        Self {
            rendered: report.rendered,
            failed: report.failed,
            stopped_early: report.stopped_early,
            duration_ms: report.duration.as_millis() as u64,
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub target_records: u64,
    pub generation: GenerationStats,
    pub dispatch: DispatchSummary,
}

/// Run a workload to completion or until `cancel` fires.
pub async fn run_workload(
    config: WorkloadConfig,
    cancel: CancellationToken,
) -> anyhow::Result<RunReport> {
    info!(
        "Generating {} records in {:?} mode with {} generator threads",
        config.total_records, config.mode, config.generator_threads
    );

    let sinks = open_sinks(&config).await?;
    let (producer, queue) = dispatch_queue(config.queue_capacity);
    let pool = WorkerPool::start(&config.pool, queue, sinks, cancel.clone())
        .context("Failed to start producer workers")?;

    let generators = spawn_generators(&config, producer, &cancel);
    let dispatch = pool.join().await;

    info!(
        "Sent {} records in total across {} producers",
        dispatch.total_sent,
        dispatch.worker_count()
    );

    let mut generation = GenerationReport::default();
    for handle in generators {
        match handle.await {
            Ok(report) => generation.merge(&report),
            Err(e) => error!("Generator thread failed: {}", e),
        }
    }
    if generation.failed > 0 {
        info!("{} records failed to render and were skipped", generation.failed);
    }

    let report = RunReport {
        mode: config.mode,
        target_records: config.total_records,
        generation: GenerationStats::from(&generation),
        dispatch,
    };

    if let Some(path) = &config.metrics_output {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write run report to {path:?}"))?;
        info!("Run report written to {:?}", path);
    }

    Ok(report)
}

async fn open_sinks(config: &WorkloadConfig) -> anyhow::Result<Arc<dyn SinkFactory>> {
    match &config.sink {
        SinkConfig::Kafka {
            client,
            create_topic,
        } => {
            if let Some(partitions) = create_topic {
                ensure_topic(client, &config.topic, *partitions)
                    .await
                    .with_context(|| format!("Failed to create topic '{}'", config.topic))?;
            }
            Ok(Arc::new(KafkaSinkFactory::new(client.clone())))
        }
        SinkConfig::File(path) => {
            let factory = FileSinkFactory::create(path)
                .await
                .with_context(|| format!("Failed to open output {path:?}"))?;
            Ok(Arc::new(factory))
        }
    }
}

/// Start one blocking generation thread per configured slot, splitting the
/// record count across them. Each thread stops early when cancelled or when
/// no worker is left to consume.
fn spawn_generators(
    config: &WorkloadConfig,
    producer: QueueProducer,
    cancel: &CancellationToken,
) -> Vec<JoinHandle<GenerationReport>> {
    let generator = PayloadGenerator::new(config.renderer.clone());

    quotas(config.total_records, config.generator_threads.get())
        .into_iter()
        .map(|count| {
            let generator = generator.clone();
            let producer = producer.clone();
            let topic = config.topic.clone();
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || {
                generator.generate(count, |payload| {
                    if cancel.is_cancelled() {
                        return ControlFlow::Break(());
                    }
                    match producer.blocking_push(DispatchTask::new(topic.clone(), payload)) {
                        Ok(()) => ControlFlow::Continue(()),
                        Err(_) => ControlFlow::Break(()),
                    }
                })
            })
        })
        .collect()
}
