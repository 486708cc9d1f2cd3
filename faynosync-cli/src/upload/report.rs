/// Terminal result of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Completed {
        files: usize,
        app: String,
        version: String,
        uploaded_id: String,
    },
    Rejected {
        status: u16,
        body: String,
    },
}

/// Destination for upload outcome records.
pub trait ReportSink: Send + Sync {
    fn report(&self, outcome: &UploadOutcome);
}

/// Writes outcomes as structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn report(&self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Completed {
                files,
                app,
                version,
                uploaded_id,
            } => tracing::info!(
                files = *files,
                app = %app,
                version = %version,
                uploaded_id = %uploaded_id,
                "Upload completed"
            ),
            UploadOutcome::Rejected { status, body } => {
                tracing::error!(status = *status, body = %body, "upload failed")
            }
        }
    }
}
