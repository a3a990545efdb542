//! Directory producer
//!
//! Discovers the tree under the root and feeds directories to the consumer
//! through the work queue. Breadth-first queues a directory before listing
//! its children; depth-first walks an explicit stack so deep trees cannot
//! overflow the thread stack.

use crate::config::Traversal;
use crate::error::{EnumerationError, ListOperation};
use crate::fs::DirectoryItem;
use crate::walker::shared::Shared;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace};

enum Step {
    /// List the directory's children (pre-order emits here)
    Enter(DirectoryItem, usize),
    /// Subtree exhausted (post-order emits here)
    Exit(DirectoryItem),
}

/// The walk root, counted as the first directory seen
pub(crate) fn root_directory(shared: &Shared) -> DirectoryItem {
    shared.state.record_directory_seen();
    DirectoryItem::root(Arc::clone(&shared.base))
}

/// Producer thread body
pub(crate) fn run_producer(shared: &Shared, traversal: Traversal) {
    debug!(traversal = %traversal, "Producer starting");

    let root = root_directory(shared);
    match traversal {
        Traversal::DepthFirst { deepest_first } => depth_first(shared, root, deepest_first),
        // The task window has its own driver; fall back to the pipeline order
        Traversal::BreadthFirst | Traversal::TaskWindow { .. } => breadth_first(shared, root),
    }

    shared.state.finish_directory_search();
    shared.directories.finish();

    debug!(
        directories = shared.state.directories_seen(),
        stopped = shared.is_stopped(),
        "Producer finished"
    );
}

fn breadth_first(shared: &Shared, root: DirectoryItem) {
    let mut frontier = VecDeque::new();
    frontier.push_back((root, 0));

    while let Some((dir, depth)) = frontier.pop_front() {
        if shared.is_stopped() {
            return;
        }

        // Hand the directory over before listing its children so scanning
        // overlaps with discovery
        if !shared.directories.enqueue(dir.clone()) {
            return;
        }

        for child in discover_children(shared, &dir, depth) {
            frontier.push_back((child, depth + 1));
        }
    }
}

fn depth_first(shared: &Shared, root: DirectoryItem, deepest_first: bool) {
    let mut stack = vec![Step::Enter(root, 0)];

    while let Some(step) = stack.pop() {
        if shared.is_stopped() {
            return;
        }

        match step {
            Step::Enter(dir, depth) => {
                let children = discover_children(shared, &dir, depth);

                if deepest_first {
                    stack.push(Step::Exit(dir));
                } else if !shared.directories.enqueue(dir) {
                    return;
                }

                // Reversed so the first listed child is visited first
                stack.extend(
                    children
                        .into_iter()
                        .rev()
                        .map(|child| Step::Enter(child, depth + 1)),
                );
            }
            Step::Exit(dir) => {
                if !shared.directories.enqueue(dir) {
                    return;
                }
            }
        }
    }
}

/// List the accepted subdirectories of `dir`, which sits at `depth`
///
/// A listing failure is reported and yields no children; the walk goes on
/// with the siblings.
pub(crate) fn discover_children(
    shared: &Shared,
    dir: &DirectoryItem,
    depth: usize,
) -> Vec<DirectoryItem> {
    let config = &shared.config;
    if !config.may_descend(depth) {
        return Vec::new();
    }

    let paths = match shared
        .enumerator
        .list_directories(dir.full_path(), &config.directory_mask)
    {
        Ok(paths) => paths,
        Err(e) => {
            shared.report_error(EnumerationError::new(
                dir.full_path(),
                ListOperation::Directories,
                &e,
            ));
            return Vec::new();
        }
    };

    let mut children = Vec::with_capacity(paths.len());
    for path in paths {
        let child = match DirectoryItem::from_full(Arc::clone(&shared.base), &path) {
            Ok(child) => child,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Listed directory outside root, skipping");
                continue;
            }
        };

        if !config.accepts_directory(&child) {
            trace!(path = %child, "Directory rejected");
            continue;
        }

        shared.state.record_directory_seen();
        children.push(child);
    }

    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalkConfig;
    use crate::fs::OsEnumerator;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    /// root/{a/{a1}, b}
    fn tree() -> TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/a1")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        dir
    }

    fn produce(config: WalkConfig, traversal: Traversal) -> (Shared, Vec<PathBuf>) {
        let shared = Shared::new(config, Arc::new(OsEnumerator));
        shared.mark_started();
        run_producer(&shared, traversal);

        let order = shared
            .directories
            .dequeue_all()
            .into_iter()
            .map(|d| d.relative().to_path_buf())
            .collect();
        (shared, order)
    }

    fn position(order: &[PathBuf], rel: &str) -> usize {
        order
            .iter()
            .position(|p| p == &PathBuf::from(rel))
            .unwrap()
    }

    #[test]
    fn test_breadth_first_levels() {
        let dir = tree();
        let config = WalkConfig::new(dir.path()).unwrap();
        let (shared, order) = produce(config, Traversal::BreadthFirst);

        assert_eq!(order.len(), 4);
        assert_eq!(order[0], PathBuf::new());
        assert!(position(&order, "a/a1") > position(&order, "b"));
        assert_eq!(shared.state.directories_seen(), 4);
        assert!(shared.directories.is_drained());
        assert!(!shared.state.directory_search_running());
    }

    #[test]
    fn test_depth_first_orders() {
        let dir = tree();

        let config = WalkConfig::new(dir.path()).unwrap();
        let (_, pre) = produce(
            config,
            Traversal::DepthFirst {
                deepest_first: false,
            },
        );
        assert!(position(&pre, "a") < position(&pre, "a/a1"));
        assert_eq!(pre[0], PathBuf::new());

        let config = WalkConfig::new(dir.path()).unwrap();
        let (_, post) = produce(
            config,
            Traversal::DepthFirst {
                deepest_first: true,
            },
        );
        assert!(position(&post, "a/a1") < position(&post, "a"));
        assert_eq!(post.last(), Some(&PathBuf::new()));
    }

    #[test]
    fn test_max_depth_and_mask_prune() {
        let dir = tree();
        let config = WalkConfig::new(dir.path()).unwrap().with_max_depth(1);
        let (_, order) = produce(config, Traversal::BreadthFirst);
        assert_eq!(order.len(), 3);

        let config = WalkConfig::new(dir.path())
            .unwrap()
            .with_directory_mask("a*")
            .unwrap();
        let (shared, order) = produce(config, Traversal::BreadthFirst);
        assert_eq!(order.len(), 3);
        assert!(!order.contains(&PathBuf::from("b")));
        assert_eq!(shared.state.directories_seen(), 3);
    }

    #[test]
    fn test_stop_ends_production() {
        let dir = tree();
        let config = WalkConfig::new(dir.path()).unwrap();
        let shared = Shared::new(config, Arc::new(OsEnumerator));
        shared.mark_started();
        shared.stop("test");

        run_producer(&shared, Traversal::BreadthFirst);
        assert!(shared.directories.dequeue().is_none());
    }
}
