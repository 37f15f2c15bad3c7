// Scripted player used by the integration tests
//
// Every call is recorded so tests can assert on what the core asked the
// engine to do, and in which order.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use transcriber::{MediaSource, PlaybackEvent, PlayerError, PlayerHandle, PlayerState};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load { uri: String, cache: bool },
    Play,
    Pause(bool),
    Stop,
    CurrentTime,
    SetTime(i64),
    TotalLength,
    Position,
    State,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// What the scripted player answers. Queued values are consumed one per
/// call; the last one keeps being returned.
pub struct Script {
    pub states: VecDeque<PlayerState>,
    pub lengths: VecDeque<i64>,
    pub position: f64,
    pub current_time: Result<i64, PlayerError>,
    pub fail_load: bool,
    pub fail_play: bool,
    pub fail_state: bool,
    pub fail_position: bool,
    pub fail_seek: bool,
    /// Added latency on every state query
    pub state_delay: Option<Duration>,
    /// When set, every state query must take a permit first
    pub state_gate: Option<Arc<Semaphore>>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            states: VecDeque::from([PlayerState::Playing]),
            lengths: VecDeque::from([10_000]),
            position: 0.5,
            current_time: Ok(0),
            fail_load: false,
            fail_play: false,
            fail_state: false,
            fail_position: false,
            fail_seek: false,
            state_delay: None,
            state_gate: None,
        }
    }
}

pub struct ScriptedPlayer {
    script: Script,
    log: CallLog,
}

impl ScriptedPlayer {
    pub fn new(script: Script) -> (Self, CallLog) {
        let log = CallLog::default();
        let player = Self {
            script,
            log: Arc::clone(&log),
        };
        (player, log)
    }

    fn record(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }
}

fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait::async_trait]
impl PlayerHandle for ScriptedPlayer {
    async fn load_media(&mut self, source: &MediaSource) -> Result<(), PlayerError> {
        self.record(Call::Load {
            uri: source.uri.clone(),
            cache: source.cache_hint(),
        });
        if self.script.fail_load {
            return Err(PlayerError::Open {
                uri: source.uri.clone(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(())
    }

    async fn play(&mut self) -> Result<(), PlayerError> {
        self.record(Call::Play);
        if self.script.fail_play {
            return Err(PlayerError::Engine("scripted failure".to_string()));
        }
        Ok(())
    }

    async fn pause(&mut self, pause: bool) -> Result<(), PlayerError> {
        self.record(Call::Pause(pause));
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), PlayerError> {
        self.record(Call::Stop);
        Ok(())
    }

    async fn current_time(&mut self) -> Result<i64, PlayerError> {
        self.record(Call::CurrentTime);
        self.script.current_time.clone()
    }

    async fn set_time(&mut self, ms: i64) -> Result<(), PlayerError> {
        self.record(Call::SetTime(ms));
        if self.script.fail_seek {
            return Err(PlayerError::Engine("seek rejected".to_string()));
        }
        Ok(())
    }

    async fn total_length(&mut self) -> Result<i64, PlayerError> {
        self.record(Call::TotalLength);
        Ok(next(&mut self.script.lengths).unwrap_or(0))
    }

    async fn position(&mut self) -> Result<f64, PlayerError> {
        self.record(Call::Position);
        if self.script.fail_position {
            return Err(PlayerError::Engine("position unreadable".to_string()));
        }
        Ok(self.script.position)
    }

    async fn state(&mut self) -> Result<PlayerState, PlayerError> {
        self.record(Call::State);
        if let Some(gate) = &self.script.state_gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        if let Some(delay) = self.script.state_delay {
            tokio::time::sleep(delay).await;
        }
        if self.script.fail_state {
            return Err(PlayerError::Engine("state unreadable".to_string()));
        }
        Ok(next(&mut self.script.states).unwrap_or(PlayerState::Idle))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Everything currently queued on the event channel
pub fn drain(rx: &mut mpsc::UnboundedReceiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn calls(log: &CallLog) -> Vec<Call> {
    log.lock().unwrap().clone()
}

/// Poll `cond` until it holds or a second has passed
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
