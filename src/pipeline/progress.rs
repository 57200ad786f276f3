use crate::models::{SourceName, StepStatus, TraceStep};

/// Receives a full copy of the step log after every change.
pub trait ProgressObserver: Send {
    fn on_progress(&mut self, steps: Vec<TraceStep>);
}

impl<F> ProgressObserver for F
where
    F: FnMut(Vec<TraceStep>) + Send,
{
    fn on_progress(&mut self, steps: Vec<TraceStep>) {
        self(steps)
    }
}

/// Observer that discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _steps: Vec<TraceStep>) {}
}

/// Append-only log of one run's steps. Only the last entry is ever
/// rewritten, and only by replacing it with an updated copy.
#[derive(Debug, Default, Clone)]
pub struct StepLog {
    steps: Vec<TraceStep>,
}

impl StepLog {
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn append(&mut self, source: SourceName, status: StepStatus, message: String) {
        let sequence = self.steps.len() as u32 + 1;
        let step = TraceStep::new(sequence, source, message);
        let step = if status == StepStatus::Pending {
            step
        } else {
            step.with_status(status, None)
        };
        self.steps.push(step);
    }

    /// Returns false when the log is empty.
    pub fn finish_last(&mut self, status: StepStatus, payload: Option<serde_json::Value>) -> bool {
        match self.steps.last_mut() {
            Some(last) => {
                *last = last.with_status(status, payload);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<TraceStep> {
        self.steps.clone()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
