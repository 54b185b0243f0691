// src/processing/parallel.rs
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, JoinHandle},
};

use flume::Receiver;
use itertools::Itertools;
use tracing::{error, info, info_span};

use super::directory::{process_single_directory, DirectoryReport};
use crate::config::IndexerConfig;
use crate::error::{NdviError, Result};

/// FIFO of subdirectory names, filled once and then only drained. Each name
/// is handed to exactly one caller of [`DirectoryQueue::pop`].
#[derive(Clone)]
pub struct DirectoryQueue {
    rx: Receiver<String>,
}

impl DirectoryQueue {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (tx, rx) = flume::unbounded();
        for name in names {
            // the receiver is alive, so send cannot fail
            let _ = tx.send(name.into());
        }
        Self { rx }
    }

    /// Queues every immediate subdirectory of `root`. No re-scan afterwards.
    pub fn discover(root: &Path) -> Result<Self> {
        let names: Vec<String> = fs::read_dir(root)
            .map_err(|e| NdviError::io(root, e))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .sorted()
            .collect();

        for name in &names {
            info!(dir = %name, "queued directory");
        }
        Ok(Self::from_names(names))
    }

    pub fn pop(&self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub directories: Vec<DirectoryReport>,
}

impl BatchReport {
    pub fn produced(&self) -> usize {
        self.directories.iter().map(|d| d.produced).sum()
    }

    pub fn skipped_existing(&self) -> usize {
        self.directories.iter().map(|d| d.skipped_existing).sum()
    }

    pub fn failed(&self) -> usize {
        self.directories.iter().map(|d| d.failed + d.missing_nir).sum()
    }

    pub fn aborted_directories(&self) -> usize {
        self.directories.iter().filter(|d| d.error.is_some()).count()
    }

    pub fn directory(&self, name: &str) -> Option<&DirectoryReport> {
        self.directories.iter().find(|d| d.name == name)
    }
}

/// Converts every date subdirectory of an input tree into NDVI rasters plus
/// an index, using a fixed pool of worker threads.
pub struct BatchIndexer {
    config: Arc<IndexerConfig>,
    workers: usize,
}

impl BatchIndexer {
    pub fn new(config: IndexerConfig) -> Self {
        let workers = config.worker_count();
        Self {
            config: Arc::new(config),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Blocks until every queued directory has been handled. A directory
    /// that fails is recorded in the report and never stops the others.
    pub fn run(&self, input_root: &Path, output_root: &Path) -> Result<BatchReport> {
        self.config.validate()?;
        let queue = DirectoryQueue::discover(input_root)?;
        info!(
            directories = queue.len(),
            workers = self.workers,
            "starting batch"
        );

        let (workers, spawn_error) = start_workers(self.workers, |worker_id| {
            let queue = queue.clone();
            let config = Arc::clone(&self.config);
            let input_root: PathBuf = input_root.to_path_buf();
            let output_root: PathBuf = output_root.to_path_buf();

            thread::Builder::new()
                .name(format!("ndvi-worker-{worker_id}"))
                .spawn(move || drain_queue(&queue, &input_root, &output_root, &config))
        });
        if workers.is_empty() {
            if let Some(e) = spawn_error {
                return Err(e.into());
            }
        }

        let report = collect_reports(workers);

        info!(
            produced = report.produced(),
            skipped = report.skipped_existing(),
            failed = report.failed(),
            "batch complete"
        );
        Ok(report)
    }
}

type WorkerHandle = JoinHandle<Vec<DirectoryReport>>;

/// Spawns up to `count` workers. Stops at the first spawn failure and hands
/// back the workers already running together with that error.
fn start_workers<F>(count: usize, mut spawn: F) -> (Vec<WorkerHandle>, Option<io::Error>)
where
    F: FnMut(usize) -> io::Result<WorkerHandle>,
{
    let mut handles = Vec::with_capacity(count);
    for worker_id in 0..count {
        match spawn(worker_id) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                error!(
                    worker = worker_id,
                    running = handles.len(),
                    error = %e,
                    "could not start worker, continuing with fewer"
                );
                return (handles, Some(e));
            }
        }
    }
    (handles, None)
}

/// Joins every worker and merges their reports, sorted by directory name.
fn collect_reports(workers: Vec<WorkerHandle>) -> BatchReport {
    let mut report = BatchReport::default();
    for worker in workers {
        match worker.join() {
            Ok(reports) => report.directories.extend(reports),
            Err(_) => error!("worker thread panicked"),
        }
    }
    report.directories.sort_by(|a, b| a.name.cmp(&b.name));
    report
}

fn drain_queue(
    queue: &DirectoryQueue,
    input_root: &Path,
    output_root: &Path,
    config: &IndexerConfig,
) -> Vec<DirectoryReport> {
    let mut reports = Vec::new();
    while let Some(dir) = queue.pop() {
        let span = info_span!("directory", dir = %dir);
        let _guard = span.enter();

        match process_single_directory(input_root, output_root, &dir, config) {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!(error = %e, "error processing directory");
                reports.push(DirectoryReport::aborted(dir, &e));
            }
        }
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn queue_hands_out_each_name_once() {
        let names: Vec<String> = (0..200).map(|i| format!("2020-01-{i:03}")).collect();
        let queue = DirectoryQueue::from_names(names.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                let seen = Arc::clone(&seen);
                thread::spawn(move || {
                    while let Some(name) = queue.pop() {
                        seen.lock().unwrap().push(name);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), names.len());
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert!(queue.is_empty());
    }

    #[test]
    fn fifo_order_for_single_consumer() {
        let queue = DirectoryQueue::from_names(["a", "b", "c"]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().as_deref(), Some("a"));
        assert_eq!(queue.pop().as_deref(), Some("b"));
        assert_eq!(queue.pop().as_deref(), Some("c"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn spawn_failure_keeps_running_workers() {
        let queue = DirectoryQueue::from_names(["2020-01-01", "2020-01-02", "2020-01-03"]);

        let (handles, err) = start_workers(4, |worker_id| {
            if worker_id == 1 {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "thread limit"));
            }
            let queue = queue.clone();
            Ok(thread::spawn(move || {
                let mut reports = Vec::new();
                while let Some(dir) = queue.pop() {
                    reports.push(DirectoryReport::new(dir));
                }
                reports
            }))
        });
        assert_eq!(handles.len(), 1);
        assert!(err.is_some());

        let report = collect_reports(handles);
        let names: Vec<&str> = report.directories.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["2020-01-01", "2020-01-02", "2020-01-03"]);
        assert!(queue.is_empty());
    }
}
