//! In-memory collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use cadence_git::{GitError, GitResult, VersionControl, compare_version_refnames};

use crate::{FileSystem, Prompt, ReleaseHost, ReleaseRequest, RemoteError, TextGenerator};

#[derive(Default)]
pub struct MockVcs {
    workdir: PathBuf,
    changed: Vec<String>,
    tags: RefCell<Vec<String>>,
    remote_tags: RefCell<BTreeSet<String>>,
    head_message: RefCell<Option<String>>,
    reject_tag_push: Cell<bool>,
    pub commits: RefCell<Vec<String>>,
    pub created_tags: RefCell<Vec<String>>,
    pub pushes: RefCell<Vec<String>>,
}

impl MockVcs {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            ..Self::default()
        }
    }

    pub fn with_tags(self, tags: &[&str]) -> Self {
        self.tags
            .borrow_mut()
            .extend(tags.iter().map(ToString::to_string));
        self
    }

    pub fn with_changed(mut self, files: &[&str]) -> Self {
        self.changed = files.iter().map(ToString::to_string).collect();
        self
    }

    pub fn with_remote_tag(self, tag: &str) -> Self {
        self.remote_tags.borrow_mut().insert(tag.to_string());
        self
    }

    pub fn with_head_message(self, message: &str) -> Self {
        *self.head_message.borrow_mut() = Some(message.to_string());
        self
    }

    pub fn rejecting_tag_push(self) -> Self {
        self.reject_tag_push.set(true);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.borrow().iter().any(|t| t == tag)
    }

    pub fn mutations(&self) -> usize {
        self.commits.borrow().len() + self.created_tags.borrow().len() + self.pushes.borrow().len()
    }
}

impl VersionControl for MockVcs {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn changed_files(&self) -> GitResult<Vec<String>> {
        Ok(self.changed.clone())
    }

    fn tags_matching(&self, pattern: &str) -> GitResult<Vec<String>> {
        let prefix = pattern.trim_end_matches('*');
        let mut tags: Vec<String> = self
            .tags
            .borrow()
            .iter()
            .filter(|t| t.starts_with(prefix))
            .cloned()
            .collect();
        tags.sort_by(|a, b| compare_version_refnames(b, a));
        Ok(tags)
    }

    fn tag_exists(&self, tag: &str) -> GitResult<bool> {
        Ok(self.has_tag(tag))
    }

    fn remote_tag_exists(&self, tag: &str) -> GitResult<bool> {
        Ok(self.remote_tags.borrow().contains(tag))
    }

    fn create_tag(&self, tag: &str, _message: &str) -> GitResult<()> {
        if self.has_tag(tag) {
            return Err(GitError::TagExists(tag.to_string()));
        }
        self.tags.borrow_mut().push(tag.to_string());
        self.created_tags.borrow_mut().push(tag.to_string());
        Ok(())
    }

    fn head_message(&self) -> GitResult<Option<String>> {
        Ok(self.head_message.borrow().clone())
    }

    fn commit_paths(&self, _paths: &[&Path], message: &str) -> GitResult<()> {
        self.commits.borrow_mut().push(message.to_string());
        *self.head_message.borrow_mut() = Some(message.to_string());
        Ok(())
    }

    fn push_head(&self) -> GitResult<()> {
        self.pushes.borrow_mut().push("HEAD".to_string());
        Ok(())
    }

    fn push_tag(&self, tag: &str) -> GitResult<()> {
        if self.reject_tag_push.get() {
            return Err(GitError::PushRejected {
                refspec: format!("refs/tags/{tag}"),
                reason: "already exists".to_string(),
            });
        }
        self.pushes.borrow_mut().push(tag.to_string());
        self.remote_tags.borrow_mut().insert(tag.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryFs {
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(PathBuf::from(path), content.to_string());
        self
    }
}

impl FileSystem for MemoryFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRelease {
    pub tag: String,
    pub title: String,
    pub body: String,
    pub target: String,
}

#[derive(Default)]
pub struct MockHost {
    existing: RefCell<BTreeSet<String>>,
    lose_race: Cell<bool>,
    fail_create: Cell<bool>,
    pub created: RefCell<Vec<CreatedRelease>>,
    pub remote_calls: Cell<usize>,
}

impl MockHost {
    pub fn with_existing(self, tag: &str) -> Self {
        self.existing.borrow_mut().insert(tag.to_string());
        self
    }

    /// Creation fails because another run created the release first.
    pub fn losing_race(self) -> Self {
        self.lose_race.set(true);
        self
    }

    pub fn failing_create(self) -> Self {
        self.fail_create.set(true);
        self
    }
}

impl ReleaseHost for MockHost {
    async fn release_exists(&self, tag: &str) -> Result<bool, RemoteError> {
        self.remote_calls.set(self.remote_calls.get() + 1);
        Ok(self.existing.borrow().contains(tag))
    }

    async fn create_release(&self, request: &ReleaseRequest<'_>) -> Result<(), RemoteError> {
        self.remote_calls.set(self.remote_calls.get() + 1);
        if self.lose_race.get() {
            self.existing.borrow_mut().insert(request.tag.to_string());
            return Err(RemoteError::Status {
                status: 422,
                body: "already_exists".to_string(),
            });
        }
        if self.fail_create.get() {
            return Err(RemoteError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        self.existing.borrow_mut().insert(request.tag.to_string());
        self.created.borrow_mut().push(CreatedRelease {
            tag: request.tag.to_string(),
            title: request.title.to_string(),
            body: request.body.to_string(),
            target: request.target.to_string(),
        });
        Ok(())
    }

    fn release_url(&self, tag: &str) -> String {
        format!("https://github.com/acme/site/releases/tag/{tag}")
    }
}

pub enum MockResponse {
    Text(String),
    RateLimited,
    Status(u16),
}

pub struct MockGenerator {
    response: MockResponse,
    prompts: RefCell<Vec<Prompt>>,
}

impl MockGenerator {
    pub fn new(response: MockResponse) -> Self {
        Self {
            response,
            prompts: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }

    pub fn last_prompt(&self) -> Option<Prompt> {
        self.prompts.borrow().last().cloned()
    }
}

impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String, RemoteError> {
        self.prompts.borrow_mut().push(prompt.clone());
        match &self.response {
            MockResponse::Text(text) => Ok(text.clone()),
            MockResponse::RateLimited => Err(RemoteError::RateLimited),
            MockResponse::Status(status) => Err(RemoteError::Status {
                status: *status,
                body: String::new(),
            }),
        }
    }
}
