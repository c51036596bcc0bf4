//! In-memory SCM source for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::errors::ScmProviderError;
use crate::scm_clients::{ScmResult, ScmSource};

#[derive(Debug, Default)]
pub struct FakeScm {
    diffs: HashMap<(String, String), Vec<String>>,
    pull_requests: HashMap<u64, Vec<String>>,
    files: HashMap<String, String>,
    failing: HashSet<String>,
    fork_compare: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeScm {
    pub fn with_diff(mut self, base: &str, head: &str, files: &[&str]) -> Self {
        self.diffs.insert(
            (base.to_string(), head.to_string()),
            files.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    pub fn with_pull_request(mut self, id: u64, files: &[&str]) -> Self {
        self.pull_requests
            .insert(id, files.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    /// Makes `path` answer with a 502 instead of content.
    pub fn with_failing_file(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn with_fork_compare(mut self) -> Self {
        self.fork_compare = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ScmSource for FakeScm {
    async fn changed_files_in_diff(&self, base: &str, head: &str) -> ScmResult<Vec<String>> {
        self.record(format!("diff:{base}...{head}"));
        self.diffs
            .get(&(base.to_string(), head.to_string()))
            .cloned()
            .ok_or(ScmProviderError::NotFound)
    }

    async fn changed_files_in_pull_request(&self, id: u64) -> ScmResult<Vec<String>> {
        self.record(format!("pr:{id}"));
        self.pull_requests
            .get(&id)
            .cloned()
            .ok_or(ScmProviderError::Server(502))
    }

    async fn file_contents(&self, path: &str, git_ref: &str) -> ScmResult<String> {
        self.record(format!("get:{path}@{git_ref}"));
        if self.failing.contains(path) {
            return Err(ScmProviderError::Server(502));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or(ScmProviderError::NotFound)
    }

    fn supports_fork_compare(&self) -> bool {
        self.fork_compare
    }
}
