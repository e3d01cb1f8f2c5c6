//! Shared fixtures for the execution tests.

#![cfg(test)]
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use novaflow::exec::{OutputMode, Runner, RunnerConfig};
use novaflow::feedback::{Feedback, FeedbackHandle};
use novaflow::platform::Shell;

/// What: Quiet runner using `/bin/sh`, independent of `$SHELL`.
pub fn sh_runner() -> Runner {
    Runner::new(RunnerConfig {
        shell: Some(Shell::posix("/bin/sh")),
        ..RunnerConfig::quiet()
    })
}

/// What: Runner whose feedback is recorded into the returned log.
pub fn recording_runner() -> (Runner, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let runner = Runner::new(RunnerConfig {
        shell: Some(Shell::posix("/bin/sh")),
        feedback: recorder.clone(),
        ..RunnerConfig::quiet()
    });
    (runner, recorder)
}

/// Feedback event as recorded by [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `begin(description, mode)`.
    Begin(String, OutputMode),
    /// `succeed` message.
    Succeed(String),
    /// `fail` message.
    Fail(String),
    /// `notice` message.
    Notice(String),
}

/// Feedback sink that stores every call.
#[derive(Debug, Default)]
pub struct Recorder {
    /// Calls in order.
    pub events: Mutex<Vec<Event>>,
}

impl Recorder {
    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("recorder lock").clone()
    }

    /// Recorded notices only.
    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Append one event.
    fn push(&self, event: Event) {
        self.events.lock().expect("recorder lock").push(event);
    }
}

impl Feedback for Recorder {
    fn begin(&self, description: &str, mode: OutputMode) -> FeedbackHandle {
        self.push(Event::Begin(description.to_string(), mode));
        FeedbackHandle::detached(description)
    }

    fn succeed(&self, _handle: FeedbackHandle, message: &str) {
        self.push(Event::Succeed(message.to_string()));
    }

    fn fail(&self, _handle: FeedbackHandle, message: &str) {
        self.push(Event::Fail(message.to_string()));
    }

    fn notice(&self, message: &str) {
        self.push(Event::Notice(message.to_string()));
    }
}
