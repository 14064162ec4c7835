//! End-to-end readiness handshake.
//!
//! A producer publishes a value after a delay while consumers start waiting
//! at different points: the first immediately, the middle ones before the
//! publish, and the last one only after the producer has finished. Every
//! consumer must observe the same value, and since nobody polls, the whole
//! run takes roughly the producer's delay.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, ensure, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::gate::{AsyncReadyGate, ReadyGate};

/// Parameters for a handshake run
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    pub value: String,
    pub producer_delay: Duration,
    pub consumers: usize,
    pub wait_timeout: Option<Duration>,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            value: crate::config::DEFAULT_ENVIRONMENT_NAME.to_string(),
            producer_delay: crate::config::DEFAULT_LOAD_DELAY,
            consumers: 3,
            wait_timeout: None,
        }
    }
}

impl HandshakeConfig {
    /// When consumer `index` starts waiting, or `None` for the consumer that
    /// waits after the producer has published.
    fn start_offset(&self, index: usize) -> Option<Duration> {
        let last = self.consumers - 1;
        if index == last {
            return None;
        }
        // Spread the early consumers over [0, delay).
        let fraction = index as u32;
        Some(self.producer_delay * fraction / last as u32)
    }
}

/// What one consumer saw.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub consumer: usize,
    pub started_after_ms: u64,
    pub published_when_started: bool,
    pub value: String,
}

/// Outcome of a handshake run
#[derive(Debug, Clone, Serialize)]
pub struct HandshakeReport {
    pub value: String,
    pub producer_delay_ms: u64,
    pub observations: Vec<Observation>,
    pub elapsed_ms: u64,
}

impl HandshakeReport {
    /// True when every consumer observed the published value.
    pub fn consistent(&self) -> bool {
        self.observations.iter().all(|o| o.value == self.value)
    }
}

fn validate(config: &HandshakeConfig) -> Result<()> {
    ensure!(
        config.consumers >= 2,
        "Handshake needs at least 2 consumers, got {}",
        config.consumers
    );
    Ok(())
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

/// Run the handshake on OS threads with the blocking gate.
pub fn run_blocking(config: &HandshakeConfig) -> Result<HandshakeReport> {
    validate(config)?;
    let gate: ReadyGate<String> = ReadyGate::new();
    let started = Instant::now();

    let consume = |index: usize| -> Result<Observation> {
        let published_when_started = gate.is_published();
        let started_after_ms = millis(started.elapsed());
        debug!("Consumer {} waiting at {}ms", index, started_after_ms);
        let value = gate
            .wait_for(config.wait_timeout)
            .with_context(|| format!("Consumer {} gave up", index))?;
        Ok(Observation {
            consumer: index,
            started_after_ms,
            published_when_started,
            value,
        })
    };

    let observations = thread::scope(|scope| -> Result<Vec<Observation>> {
        let producer = scope.spawn(|| {
            thread::sleep(config.producer_delay);
            gate.publish(config.value.clone())
        });

        let early: Vec<_> = (0..config.consumers)
            .filter_map(|index| config.start_offset(index).map(|offset| (index, offset)))
            .map(|(index, offset)| {
                let consume = &consume;
                scope.spawn(move || {
                    thread::sleep(offset);
                    consume(index)
                })
            })
            .collect();

        producer
            .join()
            .map_err(|_| anyhow!("Producer thread panicked"))?
            .context("Producer failed to publish")?;
        info!("Producer published {:?}", config.value);

        let mut observations = Vec::with_capacity(config.consumers);
        for handle in early {
            let observation = handle
                .join()
                .map_err(|_| anyhow!("Consumer thread panicked"))??;
            observations.push(observation);
        }
        observations.push(consume(config.consumers - 1)?);
        Ok(observations)
    })?;

    Ok(HandshakeReport {
        value: config.value.clone(),
        producer_delay_ms: millis(config.producer_delay),
        observations,
        elapsed_ms: millis(started.elapsed()),
    })
}

/// Run the handshake as tokio tasks with the async gate.
pub async fn run_async(config: &HandshakeConfig) -> Result<HandshakeReport> {
    validate(config)?;
    let gate = Arc::new(AsyncReadyGate::new());
    let started = Instant::now();

    let producer = {
        let gate = Arc::clone(&gate);
        let value = config.value.clone();
        let delay = config.producer_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            gate.publish(value)
        })
    };

    let mut early = Vec::new();
    for index in 0..config.consumers {
        let Some(offset) = config.start_offset(index) else {
            continue;
        };
        let gate = Arc::clone(&gate);
        let timeout = config.wait_timeout;
        early.push(tokio::spawn(async move {
            tokio::time::sleep(offset).await;
            consume_async(index, &gate, started, timeout).await
        }));
    }

    producer
        .await
        .context("Producer task failed")?
        .context("Producer failed to publish")?;
    info!("Producer published {:?}", config.value);

    let mut observations = Vec::with_capacity(config.consumers);
    for handle in early {
        observations.push(handle.await.context("Consumer task failed")??);
    }
    observations.push(
        consume_async(config.consumers - 1, &gate, started, config.wait_timeout).await?,
    );

    Ok(HandshakeReport {
        value: config.value.clone(),
        producer_delay_ms: millis(config.producer_delay),
        observations,
        elapsed_ms: millis(started.elapsed()),
    })
}

async fn consume_async(
    index: usize,
    gate: &AsyncReadyGate<String>,
    started: Instant,
    timeout: Option<Duration>,
) -> Result<Observation> {
    let published_when_started = gate.is_published();
    let started_after_ms = millis(started.elapsed());
    debug!("Consumer {} waiting at {}ms", index, started_after_ms);
    let value = gate
        .wait_for(timeout)
        .await
        .with_context(|| format!("Consumer {} gave up", index))?;
    Ok(Observation {
        consumer: index,
        started_after_ms,
        published_when_started,
        value,
    })
}
