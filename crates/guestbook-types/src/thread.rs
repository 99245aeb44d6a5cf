use std::collections::HashMap;

use crate::models::{Entry, Thread};

/// Group a flat, newest-first listing into root entries and their direct
/// replies. Order within each group follows the input order.
///
/// Replies whose root is not part of the listing (private, pending or
/// deleted) are left out of the threaded view.
pub fn assemble_threads(entries: Vec<Entry>) -> Vec<Thread> {
    let mut threads: Vec<Thread> = Vec::new();
    let mut replies: HashMap<i64, Vec<Entry>> = HashMap::new();

    for entry in entries {
        match entry.parent_id {
            None => threads.push(Thread {
                root: entry,
                replies: Vec::new(),
            }),
            Some(parent_id) => replies.entry(parent_id).or_default().push(entry),
        }
    }

    for thread in &mut threads {
        if let Some(children) = replies.remove(&thread.root.id) {
            thread.replies = children;
        }
    }

    threads
}
