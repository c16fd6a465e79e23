//! Sequential, resumable download of selected catalog entries
//!
//! For each [`FileRecord`] the executor either skips it (a local file of the
//! exact declared size already exists) or streams it to disk, reporting
//! progress per written chunk. A failed transfer removes whatever was written
//! and the batch moves on to the next file.

use std::future::Future;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::app::models::{format_megabytes, FileRecord};
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// An opened streaming retrieval
pub struct RemoteContent {
    /// Declared body length, if the host sent one
    pub content_length: Option<u64>,
    /// Body chunks as they arrive
    pub body: BoxStream<'static, DownloadResult<Bytes>>,
}

impl std::fmt::Debug for RemoteContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteContent")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Source of archive content
///
/// `fetch` resolves once the response head is in; a non-success status is an
/// error at this point, before any body is read.
pub trait ContentSource {
    fn fetch(&self, url: &Url) -> impl Future<Output = DownloadResult<RemoteContent>> + Send;
}

impl<S: ContentSource + Sync> ContentSource for &S {
    fn fetch(&self, url: &Url) -> impl Future<Output = DownloadResult<RemoteContent>> + Send {
        (**self).fetch(url)
    }
}

/// Progress notifications emitted by the executor
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent<'a> {
    /// Local copy already complete
    Skipped { filename: &'a str },
    /// Response received; `total` is 0 when no length was declared
    Started { filename: &'a str, total: u64 },
    /// One chunk written
    Advanced {
        filename: &'a str,
        transferred: u64,
        total: u64,
    },
    /// Transfer completed
    Finished { filename: &'a str, bytes: u64 },
    /// Transfer aborted and partial file removed
    Failed { filename: &'a str, error: String },
}

/// Receiver of [`TransferEvent`]s
pub trait ProgressObserver {
    fn on_event(&self, event: TransferEvent<'_>);
}

impl<O: ProgressObserver + ?Sized> ProgressObserver for &O {
    fn on_event(&self, event: TransferEvent<'_>) {
        (**self).on_event(event)
    }
}

/// Observer that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_event(&self, _event: TransferEvent<'_>) {}
}

/// What happened to a single file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Local file already matched the declared size
    Skipped,
    /// Transferred this run
    Downloaded { bytes: u64 },
    /// Transfer failed; no partial file left behind
    Failed { error: String },
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, FileOutcome::Failed { .. })
    }
}

/// Per-file entry in a [`DownloadSummary`]
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub filename: String,
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Result of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadSummary {
    pub reports: Vec<FileReport>,
}

impl DownloadSummary {
    /// Files attempted
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Files skipped or downloaded
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped))
    }

    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Downloaded { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    /// Bytes transferred over the network this run
    pub fn bytes_transferred(&self) -> u64 {
        self.reports
            .iter()
            .map(|r| match r.outcome {
                FileOutcome::Downloaded { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

/// Downloads records one at a time into a flat target directory
#[derive(Debug)]
pub struct DownloadExecutor<S, O = NoProgress> {
    source: S,
    observer: O,
    chunk_size: usize,
}

impl<S: ContentSource> DownloadExecutor<S, NoProgress> {
    /// Create an executor that reports no progress
    pub fn new(source: S) -> Self {
        Self::with_observer(source, NoProgress)
    }
}

impl<S: ContentSource, O: ProgressObserver> DownloadExecutor<S, O> {
    /// Create an executor reporting to `observer`
    pub fn with_observer(source: S, observer: O) -> Self {
        Self {
            source,
            observer,
            chunk_size: files::DOWNLOAD_CHUNK_SIZE,
        }
    }

    /// Override the write/progress granularity
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Download every record in order
    ///
    /// Never fails as a whole: per-file failures are recorded in the summary.
    pub async fn download_all(&self, records: &[FileRecord], target_dir: &Path) -> DownloadSummary {
        let mut summary = DownloadSummary::default();
        for record in records {
            let path = target_dir.join(&record.filename);
            let outcome = self.download_one(record, &path).await;
            summary.reports.push(FileReport {
                filename: record.filename.clone(),
                path,
                outcome,
            });
        }
        summary
    }

    /// Ensure `path` holds the content of `record`
    pub async fn download_one(&self, record: &FileRecord, path: &Path) -> FileOutcome {
        if local_copy_complete(path, record.size_bytes).await {
            info!("Skipping {} (already downloaded)", record.filename);
            self.observer.on_event(TransferEvent::Skipped {
                filename: &record.filename,
            });
            return FileOutcome::Skipped;
        }

        info!(
            "Downloading {} ({} MB)",
            record.filename,
            format_megabytes(record.size_megabytes())
        );

        match self.transfer(record, path).await {
            Ok(bytes) => {
                self.observer.on_event(TransferEvent::Finished {
                    filename: &record.filename,
                    bytes,
                });
                FileOutcome::Downloaded { bytes }
            }
            Err(e) => {
                error!("Error downloading {}: {}", record.url, e);
                remove_partial(path).await;
                let error = e.to_string();
                self.observer.on_event(TransferEvent::Failed {
                    filename: &record.filename,
                    error: error.clone(),
                });
                FileOutcome::Failed { error }
            }
        }
    }

    /// Stream the body to `path`, returning the number of bytes written
    async fn transfer(&self, record: &FileRecord, path: &Path) -> DownloadResult<u64> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let RemoteContent {
            content_length,
            mut body,
        } = self.source.fetch(&record.url).await?;
        let total = content_length.unwrap_or(0);
        self.observer.on_event(TransferEvent::Started {
            filename: &record.filename,
            total,
        });

        let mut file = File::create(path).await?;
        let written = self
            .write_body(&mut file, &mut body, &record.filename, total)
            .await;
        // Settle pending writes and close the handle before any cleanup
        let transferred = match written {
            Ok(transferred) => file.flush().await.map(|()| transferred)?,
            Err(e) => {
                let _ = file.flush().await;
                drop(file);
                return Err(e);
            }
        };
        drop(file);

        if let Some(expected) = content_length {
            if transferred != expected {
                return Err(DownloadError::IncompleteDownload {
                    received: transferred,
                    expected,
                });
            }
        }

        debug!("Wrote {} bytes to {}", transferred, path.display());
        Ok(transferred)
    }

    /// Copy body chunks into `file` in slices of at most `chunk_size` bytes
    async fn write_body(
        &self,
        file: &mut File,
        body: &mut BoxStream<'static, DownloadResult<Bytes>>,
        filename: &str,
        total: u64,
    ) -> DownloadResult<u64> {
        let mut transferred = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for slice in chunk.chunks(self.chunk_size) {
                file.write_all(slice).await?;
                transferred += slice.len() as u64;
                self.observer.on_event(TransferEvent::Advanced {
                    filename,
                    transferred,
                    total,
                });
            }
        }
        Ok(transferred)
    }
}

/// Skip rule: a regular file whose length equals the declared size
///
/// A declared size of 0 (unreported) only matches an empty local file, so a
/// complete archive whose size the host never reported is fetched again.
async fn local_copy_complete(path: &Path, expected: u64) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.is_file() && metadata.len() == expected,
        Err(_) => false,
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::archive_filename;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    enum Scripted {
        Body(Vec<u8>),
        /// Sends the bytes, then errors mid-stream
        BreakAfter(Vec<u8>),
        Status(u16),
        /// Declares a length larger than the body actually sent
        ShortBody { declared: u64, body: Vec<u8> },
    }

    #[derive(Default)]
    struct FakeSource {
        responses: HashMap<String, Scripted>,
        fetches: AtomicUsize,
    }

    impl FakeSource {
        fn with(mut self, filename: &str, response: Scripted) -> Self {
            self.responses.insert(filename.to_string(), response);
            self
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl ContentSource for FakeSource {
        async fn fetch(&self, url: &Url) -> DownloadResult<RemoteContent> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let name = url.path_segments().unwrap().last().unwrap();

            let (content_length, chunks): (Option<u64>, Vec<DownloadResult<Bytes>>) =
                match self.responses.get(name) {
                    Some(Scripted::Body(body)) => (
                        Some(body.len() as u64),
                        vec![Ok(Bytes::copy_from_slice(body))],
                    ),
                    Some(Scripted::BreakAfter(body)) => (
                        Some(body.len() as u64 * 2),
                        vec![
                            Ok(Bytes::copy_from_slice(body)),
                            Err(DownloadError::Other("connection reset".to_string())),
                        ],
                    ),
                    Some(Scripted::Status(status)) => {
                        return Err(DownloadError::ServerError { status: *status })
                    }
                    Some(Scripted::ShortBody { declared, body }) => {
                        (Some(*declared), vec![Ok(Bytes::copy_from_slice(body))])
                    }
                    None => return Err(DownloadError::ServerError { status: 404 }),
                };

            Ok(RemoteContent {
                content_length,
                body: futures::stream::iter(chunks).boxed(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl ProgressObserver for RecordingObserver {
        fn on_event(&self, event: TransferEvent<'_>) {
            let line = match event {
                TransferEvent::Skipped { filename } => format!("skip {filename}"),
                TransferEvent::Started { filename, total } => format!("start {filename} {total}"),
                TransferEvent::Advanced {
                    transferred, total, ..
                } => format!("advance {transferred}/{total}"),
                TransferEvent::Finished { filename, bytes } => format!("done {filename} {bytes}"),
                TransferEvent::Failed { filename, .. } => format!("fail {filename}"),
            };
            self.events.lock().unwrap().push(line);
        }
    }

    fn record(year: i32, month: u32, size: u64) -> FileRecord {
        let filename = archive_filename("divvy", year, month);
        let url = Url::parse("https://example.com/")
            .unwrap()
            .join(&filename)
            .unwrap();
        FileRecord::new(filename, url, size, year, month)
    }

    #[tokio::test]
    async fn test_skip_rule_makes_no_network_call() {
        let dir = tempdir().unwrap();
        let record = record(2021, 3, 64);
        std::fs::write(dir.path().join(&record.filename), vec![7u8; 64]).unwrap();

        let source = FakeSource::default();
        let executor = DownloadExecutor::new(&source);
        let summary = executor
            .download_all(std::slice::from_ref(&record), dir.path())
            .await;

        assert_eq!(source.fetch_count(), 0);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.reports[0].outcome, FileOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_size_mismatch_triggers_download() {
        let dir = tempdir().unwrap();
        let record = record(2021, 3, 32);
        let path = dir.path().join(&record.filename);
        std::fs::write(&path, vec![0u8; 10]).unwrap();

        let source = FakeSource::default().with(&record.filename, Scripted::Body(vec![1u8; 32]));
        let executor = DownloadExecutor::new(&source);
        let outcome = executor.download_one(&record, &path).await;

        assert_eq!(source.fetch_count(), 1);
        assert_eq!(outcome, FileOutcome::Downloaded { bytes: 32 });
        assert_eq!(std::fs::read(&path).unwrap(), vec![1u8; 32]);
    }

    #[tokio::test]
    async fn test_unreported_size_never_matches_existing_file() {
        let dir = tempdir().unwrap();
        let record = record(2021, 3, 0);
        let path = dir.path().join(&record.filename);
        std::fs::write(&path, vec![1u8; 16]).unwrap();

        let source = FakeSource::default().with(&record.filename, Scripted::Body(vec![1u8; 16]));
        let executor = DownloadExecutor::new(&source);
        executor.download_one(&record, &path).await;

        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_mid_transfer_removes_partial_file() {
        let dir = tempdir().unwrap();
        let record = record(2021, 4, 200);
        let path = dir.path().join(&record.filename);

        let source =
            FakeSource::default().with(&record.filename, Scripted::BreakAfter(vec![9u8; 100]));
        let executor = DownloadExecutor::new(&source);
        let outcome = executor.download_one(&record, &path).await;

        assert!(matches!(outcome, FileOutcome::Failed { ref error } if error.contains("connection reset")));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_large_partial_write_is_closed_and_removed() {
        // Larger than tokio's per-write buffer, so writes are still in flight when the stream breaks
        const PARTIAL: usize = 3 * 1024 * 1024;
        let dir = tempdir().unwrap();
        let record = record(2021, 4, (PARTIAL * 2) as u64);
        let path = dir.path().join(&record.filename);

        let broken =
            FakeSource::default().with(&record.filename, Scripted::BreakAfter(vec![9u8; PARTIAL]));
        let outcome = DownloadExecutor::new(&broken)
            .download_one(&record, &path)
            .await;
        assert!(!outcome.is_success());
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        // The same path can be written again straight away
        let body = vec![4u8; PARTIAL * 2];
        let healthy = FakeSource::default().with(&record.filename, Scripted::Body(body.clone()));
        let outcome = DownloadExecutor::new(&healthy)
            .download_one(&record, &path)
            .await;
        assert_eq!(outcome, FileOutcome::Downloaded { bytes: body.len() as u64 });
        assert_eq!(std::fs::metadata(&path).unwrap().len(), body.len() as u64);
    }

    #[tokio::test]
    async fn test_bad_status_removes_stale_file() {
        let dir = tempdir().unwrap();
        let record = record(2021, 5, 100);
        let path = dir.path().join(&record.filename);
        std::fs::write(&path, b"stale partial").unwrap();

        let source = FakeSource::default().with(&record.filename, Scripted::Status(403));
        let executor = DownloadExecutor::new(&source);
        let outcome = executor.download_one(&record, &path).await;

        assert_eq!(
            outcome,
            FileOutcome::Failed {
                error: "Server error: HTTP 403".to_string()
            }
        );
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_short_body_is_incomplete() {
        let dir = tempdir().unwrap();
        let record = record(2021, 6, 50);
        let path = dir.path().join(&record.filename);

        let source = FakeSource::default().with(
            &record.filename,
            Scripted::ShortBody {
                declared: 50,
                body: vec![1u8; 20],
            },
        );
        let executor = DownloadExecutor::new(&source);
        let outcome = executor.download_one(&record, &path).await;

        assert!(!outcome.is_success());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let dir = tempdir().unwrap();
        let records = vec![record(2020, 1, 8), record(2020, 2, 8), record(2020, 3, 8)];

        let source = FakeSource::default()
            .with(&records[0].filename, Scripted::Status(500))
            .with(&records[2].filename, Scripted::Body(vec![3u8; 8]));
        let executor = DownloadExecutor::new(&source);
        let summary = executor.download_all(&records, dir.path()).await;

        assert_eq!(source.fetch_count(), 3);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 2);
        assert!(dir.path().join(&records[2].filename).exists());
    }

    #[tokio::test]
    async fn test_creates_missing_target_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested").join("data");
        let record = record(2022, 7, 4);

        let source = FakeSource::default().with(&record.filename, Scripted::Body(vec![1u8; 4]));
        let executor = DownloadExecutor::new(&source);
        let summary = executor
            .download_all(std::slice::from_ref(&record), &target)
            .await;

        assert_eq!(summary.succeeded(), 1);
        assert!(target.join(&record.filename).is_file());
    }

    #[tokio::test]
    async fn test_progress_reported_per_chunk() {
        let dir = tempdir().unwrap();
        let record = record(2022, 8, 20);

        let source = FakeSource::default().with(&record.filename, Scripted::Body(vec![1u8; 20]));
        let observer = RecordingObserver::default();
        let executor = DownloadExecutor::with_observer(&source, &observer).chunk_size(8);
        executor
            .download_all(std::slice::from_ref(&record), dir.path())
            .await;

        let events = observer.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start 202208-divvy-tripdata.zip 20".to_string(),
                "advance 8/20".to_string(),
                "advance 16/20".to_string(),
                "advance 20/20".to_string(),
                "done 202208-divvy-tripdata.zip 20".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_mixed_batch_with_one_preexisting_file() {
        const MB: u64 = 1024 * 1024;
        let dir = tempdir().unwrap();
        let records = vec![
            record(2020, 1, 10 * MB),
            record(2020, 2, 0),
            record(2020, 3, 5 * MB),
        ];
        std::fs::write(
            dir.path().join(&records[0].filename),
            vec![0u8; (10 * MB) as usize],
        )
        .unwrap();

        let source = FakeSource::default()
            .with(&records[1].filename, Scripted::Body(vec![2u8; 1024]))
            .with(
                &records[2].filename,
                Scripted::Body(vec![3u8; (5 * MB) as usize]),
            );
        let executor = DownloadExecutor::new(&source);
        let summary = executor.download_all(&records, dir.path()).await;

        assert_eq!(summary.succeeded(), 3);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.downloaded(), 2);
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(summary.bytes_transferred(), 1024 + 5 * MB);
    }
}
