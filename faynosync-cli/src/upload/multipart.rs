//! Streaming `multipart/form-data` body.
//!
//! Each file becomes one streamed form part backed by its own bounded
//! channel. A single producer task fills those channels strictly in order,
//! opening a file only when the previous one is done, so files are never held
//! in memory whole.

use std::io;
use std::path::Path;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{FaynoError, Result};

pub const FILE_FIELD: &str = "file";
pub const DATA_FIELD: &str = "data";

const FILE_MIME: &str = "application/octet-stream";
const CHUNK_SIZE: usize = 64 * 1024;
const CHANNEL_CAPACITY: usize = 8;

type Chunk = io::Result<Bytes>;

/// How much of the body the producer managed to hand over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Complete,
    /// The transport stopped reading before every file was sent.
    Truncated,
}

/// Handle on the task reading the files.
pub struct BodyProducer {
    handle: JoinHandle<Result<Delivery>>,
}

impl BodyProducer {
    /// Wait for the producer and return the error that aborted it, if any.
    pub async fn finish(self) -> Result<Delivery> {
        self.handle
            .await
            .map_err(|e| FaynoError::Stream(format!("body producer task failed: {e}")))?
    }
}

/// One file part; its chunks arrive once the producer reaches the file.
pub struct FilePart {
    pub file_name: String,
    pub chunks: ReceiverStream<Chunk>,
}

/// Upload body under construction: file parts in command-line order, then
/// the metadata.
pub struct UploadBody {
    files: Vec<FilePart>,
    data: String,
    producer: BodyProducer,
}

impl UploadBody {
    /// Assemble the form with every file part first and `data` last.
    pub fn into_form(self) -> Result<(Form, BodyProducer)> {
        let mut form = Form::new().percent_encode_noop();
        for file in self.files {
            let part = Part::stream(Body::wrap_stream(file.chunks))
                .file_name(file.file_name)
                .mime_str(FILE_MIME)?;
            form = form.part(FILE_FIELD, part);
        }

        Ok((form.text(DATA_FIELD, self.data), self.producer))
    }

    pub fn into_parts(self) -> (Vec<FilePart>, String, BodyProducer) {
        (self.files, self.data, self.producer)
    }
}

/// Start streaming the given files.
///
/// Must be called from within a tokio runtime.
pub fn build_upload_body(files: Vec<String>, data: String) -> UploadBody {
    let mut parts = Vec::with_capacity(files.len());
    let mut senders = Vec::with_capacity(files.len());

    for path in files {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        parts.push(FilePart {
            file_name: base_name(path.trim()),
            chunks: ReceiverStream::new(receiver),
        });
        senders.push((path, sender));
    }

    let handle = tokio::spawn(produce(senders));

    UploadBody {
        files: parts,
        data,
        producer: BodyProducer { handle },
    }
}

async fn produce(files: Vec<(String, mpsc::Sender<Chunk>)>) -> Result<Delivery> {
    // Each sender is dropped at the end of its iteration, which ends that part.
    for (path, sender) in files {
        match write_file(&path, &sender).await {
            Ok(()) => {}
            Err(WriteError::Closed) => {
                tracing::debug!("Request body receiver closed before the body was complete");
                return Ok(Delivery::Truncated);
            }
            Err(WriteError::Failed(err)) => {
                tracing::debug!("Aborting upload body: {}", err);
                let _ = sender.send(Err(io::Error::other(err.to_string()))).await;
                return Err(err);
            }
        }
    }

    Ok(Delivery::Complete)
}

enum WriteError {
    Closed,
    Failed(FaynoError),
}

impl From<FaynoError> for WriteError {
    fn from(err: FaynoError) -> Self {
        WriteError::Failed(err)
    }
}

impl From<io::Error> for WriteError {
    fn from(err: io::Error) -> Self {
        WriteError::Failed(FaynoError::Io(err))
    }
}

async fn write_file(path: &str, sender: &mpsc::Sender<Chunk>) -> std::result::Result<(), WriteError> {
    let clean = path.trim();
    if clean.is_empty() {
        return Err(FaynoError::EmptyFilePath.into());
    }

    let mut file = tokio::fs::File::open(clean)
        .await
        .map_err(|source| FaynoError::OpenFile {
            path: clean.to_string(),
            source,
        })?;
    tracing::debug!("Streaming {}", clean);

    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            return Ok(());
        }
        sender
            .send(Ok(Bytes::copy_from_slice(&buf[..read])))
            .await
            .map_err(|_| WriteError::Closed)?;
    }
}

/// Last component of `path`, or the path itself when it has none.
pub fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
