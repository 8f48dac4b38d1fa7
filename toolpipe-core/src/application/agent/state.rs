//! Per-run lifecycle: `idle -> running | streaming -> completed | failed`.
//!
//! Each phase is its own type and transitions consume the previous phase, so
//! a finished run cannot be restarted and an idle run cannot complete.

use std::fmt;
use std::time::Instant;

use toolpipe_log::ExecutionLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Running,
    Streaming,
    Completed,
    Failed,
}

impl ExecutionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionState::Idle => "idle",
            ExecutionState::Running => "running",
            ExecutionState::Streaming => "streaming",
            ExecutionState::Completed => "completed",
            ExecutionState::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Blocking,
    Streaming,
}

#[derive(Debug)]
pub struct PendingRun {
    log: ExecutionLog,
}

impl PendingRun {
    pub fn new() -> Self {
        Self {
            log: ExecutionLog::new(),
        }
    }

    pub fn state(&self) -> ExecutionState {
        ExecutionState::Idle
    }

    pub fn start(mut self, mode: RunMode) -> ActiveRun {
        let state = match mode {
            RunMode::Blocking => ExecutionState::Running,
            RunMode::Streaming => ExecutionState::Streaming,
        };
        transition(&mut self.log, ExecutionState::Idle, state);
        ActiveRun {
            log: self.log,
            state,
            started: Instant::now(),
            steps: 0,
        }
    }
}

impl Default for PendingRun {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ActiveRun {
    log: ExecutionLog,
    state: ExecutionState,
    started: Instant,
    steps: u32,
}

impl ActiveRun {
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn log(&mut self) -> &mut ExecutionLog {
        &mut self.log
    }

    /// Counts one model call.
    pub fn record_step(&mut self) -> u32 {
        self.steps += 1;
        self.steps
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub fn complete(self) -> FinishedRun {
        self.finish(ExecutionState::Completed, None)
    }

    pub fn fail(self, reason: &str) -> FinishedRun {
        self.finish(ExecutionState::Failed, Some(reason))
    }

    fn finish(mut self, state: ExecutionState, reason: Option<&str>) -> FinishedRun {
        let execution_time_ms = self.elapsed_ms();
        if let Some(reason) = reason {
            self.log.error(reason);
        }
        transition(&mut self.log, self.state, state);
        FinishedRun {
            log: self.log,
            state,
            steps: self.steps,
            execution_time_ms,
        }
    }
}

#[derive(Debug)]
pub struct FinishedRun {
    log: ExecutionLog,
    state: ExecutionState,
    steps: u32,
    execution_time_ms: u64,
}

impl FinishedRun {
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn execution_time_ms(&self) -> u64 {
        self.execution_time_ms
    }

    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    pub fn into_log(self) -> ExecutionLog {
        self.log
    }
}

fn transition(log: &mut ExecutionLog, from: ExecutionState, to: ExecutionState) {
    log.debug(format!("state: {from} -> {to}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_transition() {
        let pending = PendingRun::new();
        assert_eq!(pending.state(), ExecutionState::Idle);

        let mut active = pending.start(RunMode::Streaming);
        assert_eq!(active.state(), ExecutionState::Streaming);
        assert_eq!(active.record_step(), 1);

        let finished = active.complete();
        assert_eq!(finished.state(), ExecutionState::Completed);
        assert_eq!(finished.steps(), 1);
        let messages: Vec<_> = finished
            .log()
            .entries()
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(
            messages,
            ["state: idle -> streaming", "state: streaming -> completed"]
        );
    }

    #[test]
    fn failure_logs_reason_before_transition() {
        let finished = PendingRun::new().start(RunMode::Blocking).fail("boom");
        assert_eq!(finished.state(), ExecutionState::Failed);
        let log = finished.into_log();
        assert_eq!(log.entries()[1].message, "boom");
        assert_eq!(log.entries()[2].message, "state: running -> failed");
    }
}
