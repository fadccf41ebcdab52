//! Batch-mode sink: one payload per line into a file or stdout.

use super::{Deliveries, RecordSink, SinkFactory};
use crate::error::DispatchError;
use crate::task::DispatchTask;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

/// Path that selects standard output instead of a file.
pub const STDOUT_PATH: &str = "-";

type SharedWriter = Arc<Mutex<BufWriter<Box<dyn AsyncWrite + Send + Unpin>>>>;

/// All workers append to the same writer; each line is written under the
/// lock so payloads never interleave.
pub struct FileSinkFactory {
    target: PathBuf,
    writer: SharedWriter,
}

impl FileSinkFactory {
    /// Create (or truncate) the output file, or use stdout for `-`.
    pub async fn create(target: impl AsRef<Path>) -> Result<Self, DispatchError> {
        let target = target.as_ref().to_path_buf();
        let inner: Box<dyn AsyncWrite + Send + Unpin> = if target.as_os_str() == STDOUT_PATH {
            Box::new(tokio::io::stdout())
        } else {
            Box::new(tokio::fs::File::create(&target).await?)
        };
        Ok(Self {
            target,
            writer: Arc::new(Mutex::new(BufWriter::new(inner))),
        })
    }
}

#[async_trait]
impl SinkFactory for FileSinkFactory {
    async fn open(&self, _worker_id: usize) -> Result<Box<dyn RecordSink>, DispatchError> {
        Ok(Box::new(FileSink {
            writer: self.writer.clone(),
            written: 0,
        }))
    }

    fn describe(&self) -> String {
        if self.target.as_os_str() == STDOUT_PATH {
            "stdout".to_string()
        } else {
            format!("file://{}", self.target.display())
        }
    }
}

/// A line counts as sent once it is in the shared writer.
struct FileSink {
    writer: SharedWriter,
    written: u64,
}

#[async_trait]
impl RecordSink for FileSink {
    async fn send(&mut self, task: &DispatchTask) -> Result<(), DispatchError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(task.payload.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        self.written += 1;
        Ok(())
    }

    fn completed(&mut self) -> Deliveries {
        Deliveries {
            sent: std::mem::take(&mut self.written),
            failed: 0,
        }
    }

    async fn flush(&mut self) -> Result<Deliveries, DispatchError> {
        self.writer.lock().await.flush().await?;
        Ok(self.completed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_workers_append_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let factory = FileSinkFactory::create(&path).await.unwrap();
        let topic: Arc<str> = Arc::from("ignored");

        let mut a = factory.open(0).await.unwrap();
        let mut b = factory.open(1).await.unwrap();
        a.send(&DispatchTask::new(topic.clone(), "{\"n\":1}".into())).await.unwrap();
        b.send(&DispatchTask::new(topic.clone(), "{\"n\":2}".into())).await.unwrap();
        assert_eq!(a.completed(), Deliveries { sent: 1, failed: 0 });
        assert!(a.completed().is_empty());
        assert!(a.flush().await.unwrap().is_empty());
        assert_eq!(b.flush().await.unwrap(), Deliveries { sent: 1, failed: 0 });

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\"n\":1}\n{\"n\":2}\n");
        assert_eq!(factory.describe(), format!("file://{}", path.display()));
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let result = FileSinkFactory::create("/nonexistent-dir/out.txt").await;
        assert!(matches!(result, Err(DispatchError::Io(_))));
    }
}
