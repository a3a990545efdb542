//! Task-window scheduling
//!
//! The driver spawns one short-lived thread per directory and keeps at most
//! `width` of them in flight. When the window is full it joins the oldest
//! task, whose subdirectories then join the frontier.

use crate::error::WorkerError;
use crate::fs::DirectoryItem;
use crate::walker::consumer::{log_outcome, scan_directory};
use crate::walker::producer::{discover_children, root_directory};
use crate::walker::shared::{enter_walker_thread, Shared};
use crate::walker::state::TaskGuard;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

type Pending = (DirectoryItem, usize);

struct Task {
    id: usize,
    handle: JoinHandle<Vec<Pending>>,
}

/// Driver thread body
pub(crate) fn run_task_window(shared: &Arc<Shared>, width: usize) {
    debug!(width = width, "Task window starting");

    let mut frontier: VecDeque<Pending> = VecDeque::new();
    frontier.push_back((root_directory(shared), 0));

    let mut in_flight: VecDeque<Task> = VecDeque::with_capacity(width);
    let mut next_id = 0;

    loop {
        if shared.is_stopped() {
            break;
        }

        let Some((dir, depth)) = frontier.pop_front() else {
            if in_flight.is_empty() {
                break;
            }
            join_oldest(shared, &mut in_flight, &mut frontier);
            continue;
        };

        if in_flight.len() >= width {
            join_oldest(shared, &mut in_flight, &mut frontier);
        }

        let id = next_id;
        next_id += 1;

        let task_shared = Arc::clone(shared);
        let task_dir = dir.clone();
        let spawned = thread::Builder::new()
            .name(format!("walk-task-{}", id))
            .spawn(move || {
                enter_walker_thread();
                run_task(&task_shared, &task_dir, depth)
            });

        match spawned {
            Ok(handle) => in_flight.push_back(Task { id, handle }),
            Err(e) => {
                warn!(task = id, error = %e, "Failed to spawn task, scanning inline");
                frontier.extend(run_task(shared, &dir, depth));
            }
        }
    }

    shared.state.finish_directory_search();

    // Only reached with tasks still running after a stop
    while !in_flight.is_empty() {
        join_oldest(shared, &mut in_flight, &mut frontier);
    }

    shared.finish_file_search();

    debug!(
        tasks = next_id,
        directories = shared.state.directories_processed(),
        stopped = shared.is_stopped(),
        "Task window finished"
    );
}

fn join_oldest(shared: &Shared, in_flight: &mut VecDeque<Task>, frontier: &mut VecDeque<Pending>) {
    let Some(task) = in_flight.pop_front() else {
        return;
    };

    match task.handle.join() {
        Ok(children) => frontier.extend(children),
        Err(_) => {
            error!(task = task.id, "Task thread panicked");
            shared.fail_worker(WorkerError::Panicked {
                name: format!("walk-task-{}", task.id),
            });
        }
    }
}

/// Scan one directory, then list its children for the frontier
fn run_task(shared: &Shared, dir: &DirectoryItem, depth: usize) -> Vec<Pending> {
    let _guard = TaskGuard::new(&shared.state);

    let outcome = scan_directory(shared, dir);
    log_outcome(&outcome);

    if let Err(violation) = shared.state.record_directory_processed() {
        shared.fail(violation);
        return Vec::new();
    }
    if shared.is_stopped() {
        return Vec::new();
    }

    discover_children(shared, dir, depth)
        .into_iter()
        .map(|child| (child, depth + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Traversal, WalkConfig};
    use crate::fs::OsEnumerator;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_window_walks_everything() {
        let dir = tempdir().unwrap();
        for i in 0..6 {
            let sub = dir.path().join(format!("d{}", i));
            fs::create_dir_all(sub.join("inner")).unwrap();
            fs::write(sub.join("inner/f.txt"), b"x").unwrap();
        }

        let config = WalkConfig::new(dir.path())
            .unwrap()
            .with_max_queued(0)
            .with_traversal(Traversal::TaskWindow { width: 2 });
        let shared = Arc::new(Shared::new(config, Arc::new(OsEnumerator)));
        shared.mark_started();

        run_task_window(&shared, 2);

        assert_eq!(shared.state.directories_seen(), 13);
        assert_eq!(shared.state.directories_processed(), 13);
        assert_eq!(shared.state.files_seen(), 6);
        assert_eq!(shared.state.active_tasks(), 0);
        assert_eq!(shared.sink.queue().unwrap().dequeue_all().len(), 6);
        assert!(shared.is_completed());
    }
}
