//! The upload pipeline.
//!
//! Flags are parsed into an [`UploadIntent`], the changelog is resolved, and
//! the files are streamed to the server together with a JSON `data` field.

pub mod changelog;
pub mod client;
pub mod flags;
pub mod multipart;
pub mod report;
pub mod response;

pub use changelog::{normalize_changelog, resolve_changelog, ChangelogSource};
pub use client::{upload_endpoint, RawResponse, UploadClient};
pub use flags::{parse_upload_flags, ParsedUpload, UploadIntent, UploadMetadata};
pub use multipart::{build_upload_body, BodyProducer, Delivery, FilePart, UploadBody};
pub use report::{ReportSink, TracingSink, UploadOutcome};
pub use response::extract_uploaded_id;

use tokio::io::AsyncRead;

use crate::config::RuntimeConfig;
use crate::error::Result;

/// Run one upload and hand its outcome to `sink`.
///
/// Local, configuration and transport failures are returned as errors. A
/// non-2xx answer from the server is an outcome, not an error.
pub async fn run_upload<R>(
    intent: &UploadIntent,
    runtime: &RuntimeConfig,
    stdin: &mut R,
    sink: &dyn ReportSink,
) -> Result<UploadOutcome>
where
    R: AsyncRead + Unpin,
{
    intent.require_files()?;

    let changelog = resolve_changelog(intent, stdin).await?;
    let metadata = serde_json::to_string(&intent.metadata(&changelog))?;
    let client = UploadClient::new(&runtime.server, &runtime.token)?;

    tracing::info!(
        "Uploading {} file(s) to {}",
        intent.files.len(),
        client.endpoint()
    );

    let (form, producer) = build_upload_body(intent.files.clone(), metadata).into_form()?;

    let response = match client.submit(form).await {
        Ok(response) => {
            if producer.finish().await? == Delivery::Truncated {
                tracing::warn!("Server answered before the request body was fully sent");
            }
            response
        }
        Err(err) => {
            // A failed body read surfaces as a transport error; report its cause.
            producer.finish().await?;
            return Err(err);
        }
    };

    let outcome = interpret(intent, &response);
    sink.report(&outcome);
    Ok(outcome)
}

fn interpret(intent: &UploadIntent, response: &RawResponse) -> UploadOutcome {
    if !response.is_success() {
        return UploadOutcome::Rejected {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).trim().to_string(),
        };
    }

    UploadOutcome::Completed {
        files: intent.files.len(),
        app: intent.app_name.clone(),
        version: intent.version.clone(),
        uploaded_id: extract_uploaded_id(&response.body),
    }
}
