/// Events emitted by workflows while they run.
///
/// A workflow is a sequence of phases; a phase may contain one counted task whose
/// steps are the items of the batch.
#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// An item was dropped under [`FailurePolicy::SkipAndReport`](super::config::FailurePolicy).
    ItemSkipped { id: String, reason: String },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Starts a counted task over `items` batch entries.
    pub fn start_task(&self, items: usize) {
        self.report(Progress::TaskStart {
            total_steps: items as u64,
        });
    }

    pub fn skip(&self, id: &str, reason: impl ToString) {
        self.report(Progress::ItemSkipped {
            id: id.to_owned(),
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn helpers_emit_task_and_skip_events() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            seen.lock().unwrap().push(event);
        }));
        reporter.start_task(3);
        reporter.skip("MoS2_7", "empty structure");
        drop(reporter);

        let events = seen.into_inner().unwrap();
        assert!(matches!(events[0], Progress::TaskStart { total_steps: 3 }));
        match &events[1] {
            Progress::ItemSkipped { id, reason } => {
                assert_eq!(id, "MoS2_7");
                assert_eq!(reason, "empty structure");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn silent_reporter_ignores_events() {
        ProgressReporter::new().report(Progress::TaskIncrement);
    }

    #[test]
    fn callback_receives_events_in_order() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            seen.lock().unwrap().push(format!("{event:?}"));
        }));
        reporter.report(Progress::PhaseStart { name: "Extraction" });
        reporter.report(Progress::PhaseFinish);
        drop(reporter);
        assert_eq!(
            seen.into_inner().unwrap(),
            vec!["PhaseStart { name: \"Extraction\" }", "PhaseFinish"]
        );
    }
}
