use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetforge::errors::{AssetforgeError, Result};
use assetforge::graph::{RunnerOutcome, TaskRunner};

/// Shared record of what fake runners did, in observed order.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    inner: Arc<Mutex<LogInner>>,
}

#[derive(Debug, Default)]
struct LogInner {
    started: Vec<String>,
    finished: Vec<String>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> Vec<String> {
        self.inner.lock().unwrap().started.clone()
    }

    pub fn finished(&self) -> Vec<String> {
        self.inner.lock().unwrap().finished.clone()
    }

    /// Number of completed runs for one task.
    pub fn run_count(&self, task: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .finished
            .iter()
            .filter(|t| t.as_str() == task)
            .count()
    }

    fn record_start(&self, task: &str) {
        self.inner.lock().unwrap().started.push(task.to_string());
    }

    fn record_finish(&self, task: &str) {
        self.inner.lock().unwrap().finished.push(task.to_string());
    }
}

/// What a [`FakeRunner`] should report.
#[derive(Debug, Clone)]
pub enum FakeBehaviour {
    Succeed,
    Findings,
    Fail(String),
}

/// A task runner that records its execution instead of doing work.
///
/// An optional delay keeps the "task" in flight long enough for tests to
/// observe concurrency or queue follow-up triggers.
pub struct FakeRunner {
    name: String,
    log: ExecutionLog,
    behaviour: FakeBehaviour,
    delay: Option<Duration>,
}

impl FakeRunner {
    pub fn new(name: &str, log: ExecutionLog) -> Self {
        Self {
            name: name.to_string(),
            log,
            behaviour: FakeBehaviour::Succeed,
            delay: None,
        }
    }

    pub fn behaviour(mut self, behaviour: FakeBehaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(name: &str, log: ExecutionLog, message: &str) -> Self {
        Self::new(name, log).behaviour(FakeBehaviour::Fail(message.to_string()))
    }
}

impl TaskRunner for FakeRunner {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<RunnerOutcome>> + Send + '_>> {
        Box::pin(async move {
            self.log.record_start(&self.name);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.log.record_finish(&self.name);

            match &self.behaviour {
                FakeBehaviour::Succeed => Ok(RunnerOutcome::Clean),
                FakeBehaviour::Findings => Ok(RunnerOutcome::Findings),
                FakeBehaviour::Fail(msg) => {
                    Err(AssetforgeError::transform(self.name.clone(), msg.clone()))
                }
            }
        })
    }
}
