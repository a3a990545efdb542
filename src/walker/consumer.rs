//! File consumer
//!
//! Scans each directory the producer hands over and delivers the matching
//! files to the sink. Delivery blocks while the result queue is full; a stop
//! closes the queue, which wakes the consumer and ends the scan.

use crate::error::{EnumerationError, ListOperation, WalkOutcome};
use crate::fs::{DirectoryItem, FileItem, WalkItem};
use crate::walker::shared::Shared;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Consumer thread body
pub(crate) fn run_consumer(shared: &Shared) {
    debug!("Consumer starting");

    while let Some(dir) = shared.directories.dequeue() {
        if shared.is_stopped() {
            break;
        }

        let outcome = scan_directory(shared, &dir);
        log_outcome(&outcome);

        if let Err(violation) = shared.state.record_directory_processed() {
            shared.fail(violation);
            break;
        }

        if shared.is_stopped() {
            break;
        }
    }

    shared.finish_file_search();

    debug!(
        directories = shared.state.directories_processed(),
        files = shared.state.files_seen(),
        stopped = shared.is_stopped(),
        "Consumer finished"
    );
}

/// Deliver the directory itself (if reported) and its matching files
pub(crate) fn scan_directory(shared: &Shared, dir: &DirectoryItem) -> WalkOutcome {
    let config = &shared.config;

    if config.report.includes_directories()
        && !dir.is_root()
        && !shared.deliver(WalkItem::Directory(dir.clone()))
    {
        return stopped(dir);
    }

    if !config.report.includes_files() {
        return WalkOutcome::Success {
            path: dir.full_path().to_path_buf(),
            files: 0,
        };
    }

    let paths = match shared
        .enumerator
        .list_files(dir.full_path(), &config.file_mask)
    {
        Ok(paths) => paths,
        Err(e) => {
            let error = EnumerationError::new(dir.full_path(), ListOperation::Files, &e);
            shared.report_error(error.clone());
            return WalkOutcome::Failed {
                path: dir.full_path().to_path_buf(),
                error,
            };
        }
    };

    let mut delivered = 0;
    for path in paths {
        if shared.is_stopped() {
            return stopped(dir);
        }

        let file = match FileItem::from_full(Arc::clone(&shared.base), &path) {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Listed file outside root, skipping");
                continue;
            }
        };

        if !config.accepts_file(&file) {
            continue;
        }

        shared.state.record_file_seen();
        if !shared.deliver(WalkItem::File(file)) {
            return stopped(dir);
        }
        delivered += 1;
    }

    WalkOutcome::Success {
        path: dir.full_path().to_path_buf(),
        files: delivered,
    }
}

fn stopped(dir: &DirectoryItem) -> WalkOutcome {
    WalkOutcome::Skipped {
        path: dir.full_path().to_path_buf(),
        reason: "walk stopped".into(),
    }
}

pub(crate) fn log_outcome(outcome: &WalkOutcome) {
    match outcome {
        WalkOutcome::Success { path, files } => {
            trace!(path = %path.display(), files = files, "Directory scanned");
        }
        WalkOutcome::Skipped { path, reason } => {
            debug!(path = %path.display(), reason = %reason, "Directory skipped");
        }
        WalkOutcome::Failed { path, error } => {
            warn!(path = %path.display(), error = %error, "Directory scan failed");
        }
    }
}
