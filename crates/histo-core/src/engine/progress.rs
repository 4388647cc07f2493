#[derive(Debug, Clone)]
pub enum Progress {
    StepStart { pdb_code: String, step: &'static str },
    StepFinish { pdb_code: String, step: &'static str, success: bool },

    BatchStart { total_items: u64 },
    ItemDone { pdb_code: String, success: bool },
    BatchFinish,

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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_forwards_events_to_callback() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::ItemDone { pdb_code, .. } = event {
                seen.lock().unwrap().push(pdb_code);
            }
        }));
        reporter.report(Progress::ItemDone {
            pdb_code: "1abc".to_string(),
            success: true,
        });
        reporter.report(Progress::BatchFinish);
        drop(reporter);
        assert_eq!(seen.into_inner().unwrap(), vec!["1abc".to_string()]);
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().report(Progress::Message("ignored".to_string()));
    }
}
