//! Candidate config paths along the ancestor directories of changed files.

use std::collections::HashSet;

/// Ordered, request-wide unique candidate paths.
///
/// Every candidate is absolute (`/dir/.../config`). Within one file's walk the
/// order is innermost directory first, root last.
#[derive(Debug, Default)]
pub struct CandidateSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks from the directory containing `file` up to `/`, adding one
    /// candidate per level that has not been added before.
    pub fn add_file(&mut self, file: &str, config_name: &str) {
        let mut dirs = components(file);
        // Drop the file name itself.
        dirs.pop();

        let config = components(config_name);
        loop {
            self.push(render(&dirs, &config));
            if dirs.pop().is_none() {
                break;
            }
        }
    }

    /// Adds only the repository-root candidate.
    pub fn add_root(&mut self, config_name: &str) {
        self.push(render(&[], &components(config_name)));
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.ordered
    }

    fn push(&mut self, candidate: String) {
        if self.seen.insert(candidate.clone()) {
            self.ordered.push(candidate);
        }
    }
}

/// Enumerates candidates for every changed file, deduplicated across files.
pub fn enumerate<I, P>(changed_files: I, config_name: &str) -> Vec<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<str>,
{
    let mut set = CandidateSet::new();
    for file in changed_files {
        set.add_file(file.as_ref(), config_name);
    }
    set.into_vec()
}

/// The single root candidate, used for full scans.
pub fn enumerate_root(config_name: &str) -> Vec<String> {
    let mut set = CandidateSet::new();
    set.add_root(config_name);
    set.into_vec()
}

/// Splits a repo path into canonical components.
///
/// Empty and `.` segments vanish; `..` pops, never above the root.
fn components(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out
}

fn render(dirs: &[&str], config: &[&str]) -> String {
    let mut path = String::new();
    for segment in dirs.iter().chain(config) {
        path.push('/');
        path.push_str(segment);
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}
