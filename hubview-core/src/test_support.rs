// SPDX-License-Identifier: GPL-3.0-only

//! Fakes shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hubview_contracts::{CollectionProvider, FetchMode};
use hubview_types::{DeviceInfo, HubError};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

pub fn device(hub: &str, id: &str) -> DeviceInfo {
    DeviceInfo::new(hub, id)
}

/// One scripted provider answer: wait `delay`, then succeed or fail.
#[derive(Debug, Clone)]
pub struct Reply {
    delay: Duration,
    devices: Option<Vec<&'static str>>,
}

impl Reply {
    pub fn ok(delay_ms: u64, devices: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            devices: Some(devices.into_iter().collect()),
        }
    }

    pub fn err(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            devices: None,
        }
    }
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, VecDeque<Reply>>,
    calls: HashMap<String, Vec<FetchMode>>,
    completed: HashMap<String, usize>,
}

/// Device provider answering from per-hub reply queues.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, hub: &str, replies: impl IntoIterator<Item = Reply>) {
        let mut script = self.script.lock().unwrap();
        script
            .replies
            .entry(hub.to_string())
            .or_default()
            .extend(replies);
    }

    pub fn calls(&self, hub: &str) -> usize {
        self.modes(hub).len()
    }

    pub fn modes(&self, hub: &str) -> Vec<FetchMode> {
        let script = self.script.lock().unwrap();
        script.calls.get(hub).cloned().unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        let script = self.script.lock().unwrap();
        script.calls.values().map(Vec::len).sum()
    }

    pub fn completed(&self, hub: &str) -> usize {
        let script = self.script.lock().unwrap();
        script.completed.get(hub).copied().unwrap_or(0)
    }
}

#[async_trait]
impl CollectionProvider<String, DeviceInfo> for ScriptedProvider {
    async fn fetch(&self, hub: &String, mode: FetchMode) -> Result<Vec<DeviceInfo>, HubError> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            script.calls.entry(hub.clone()).or_default().push(mode);
            script.replies.get_mut(hub).and_then(VecDeque::pop_front)
        };
        let Some(reply) = reply else {
            return Err(HubError::not_found(format!("no reply scripted for {hub}")));
        };

        tokio::time::sleep(reply.delay).await;

        *self
            .script
            .lock()
            .unwrap()
            .completed
            .entry(hub.clone())
            .or_default() += 1;

        match reply.devices {
            Some(ids) => Ok(ids.into_iter().map(|id| device(hub, id)).collect()),
            None => Err(HubError::unavailable(format!("{hub} unreachable"))),
        }
    }
}

/// Counts warning and error events emitted on the current thread.
pub struct LogCapture {
    warnings: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
    _guard: tracing::subscriber::DefaultGuard,
}

impl LogCapture {
    pub fn install() -> Self {
        let warnings = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(CountingLayer {
            warnings: Arc::clone(&warnings),
            errors: Arc::clone(&errors),
        });
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            warnings,
            errors,
            _guard: guard,
        }
    }

    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

struct CountingLayer {
    warnings: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for CountingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        match *event.metadata().level() {
            Level::WARN => {
                self.warnings.fetch_add(1, Ordering::SeqCst);
            }
            Level::ERROR => {
                self.errors.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
    }
}
