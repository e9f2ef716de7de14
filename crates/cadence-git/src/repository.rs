//! Git repository wrapper.

use std::path::Path;

use git2::{
    Cred, CredentialType, Direction, ErrorCode, PushOptions, RemoteCallbacks,
    Repository as Git2Repo, Signature,
};
use tracing::debug;

use crate::{GitError, GitResult, VersionControl, compare_version_refnames};

/// Username paired with a token for HTTPS authentication against GitHub.
const TOKEN_USERNAME: &str = "x-access-token";

/// Credential callbacks give up after this many attempts.
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// A Git repository wrapper.
pub struct Repository {
    inner: Git2Repo,
    remote: String,
    token: Option<String>,
    identity: Option<(String, String)>,
}

impl Repository {
    /// Opens a repository at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a valid Git repository.
    pub fn open(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let inner = Git2Repo::open(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Ok(Self::wrap(inner))
    }

    /// Discovers the repository from the given directory or its parents.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is found.
    pub fn discover(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let inner =
            Git2Repo::discover(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Ok(Self::wrap(inner))
    }

    fn wrap(inner: Git2Repo) -> Self {
        Self {
            inner,
            remote: "origin".to_string(),
            token: None,
            identity: None,
        }
    }

    /// Sets the remote used for pushes and remote tag lookups.
    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Sets the token used to authenticate against HTTPS remotes.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Sets the identity used for commits and tags.
    ///
    /// Without one, the repository's `user.name` / `user.email` are used.
    #[must_use]
    pub fn with_identity(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.identity = Some((name.into(), email.into()));
        self
    }

    /// Returns the configured remote name.
    #[must_use]
    pub fn remote(&self) -> &str {
        &self.remote
    }

    fn signature(&self) -> GitResult<Signature<'static>> {
        match &self.identity {
            Some((name, email)) => Ok(Signature::now(name, email)?),
            None => Ok(self.inner.signature()?.to_owned()),
        }
    }

    fn callbacks(&self) -> RemoteCallbacks<'static> {
        let mut callbacks = RemoteCallbacks::new();
        let token = self.token.clone();
        let config = self.inner.config().ok();
        let mut attempts = 0;

        callbacks.credentials(move |url, username, allowed| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }

            if let Some(token) = &token
                && allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
            {
                return Cred::userpass_plaintext(TOKEN_USERNAME, token);
            }

            if allowed.contains(CredentialType::SSH_KEY)
                && let Some(user) = username
            {
                return Cred::ssh_key_from_agent(user);
            }

            if let Some(config) = &config
                && let Ok(cred) = Cred::credential_helper(config, url, username)
            {
                return Ok(cred);
            }

            Cred::default()
        });

        callbacks
    }

    fn push_refspec(&self, refspec: &str) -> GitResult<()> {
        let mut remote = self
            .inner
            .find_remote(&self.remote)
            .map_err(|_| GitError::RemoteNotFound(self.remote.clone()))?;

        let mut rejected = None;
        {
            let mut callbacks = self.callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(reason) = status {
                    rejected = Some(format!("{refname}: {reason}"));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote.push(&[refspec], Some(&mut options))?;
        }

        match rejected {
            Some(reason) => Err(GitError::PushRejected {
                refspec: refspec.to_string(),
                reason,
            }),
            None => {
                debug!(remote = %self.remote, %refspec, "pushed");
                Ok(())
            }
        }
    }
}

impl VersionControl for Repository {
    fn workdir(&self) -> &Path {
        self.inner.workdir().unwrap_or_else(|| self.inner.path())
    }

    fn changed_files(&self) -> GitResult<Vec<String>> {
        let head = self.inner.head()?.peel_to_commit()?;

        let Ok(parent) = head.parent(0) else {
            debug!("HEAD has no reachable parent; treating as no changes");
            return Ok(Vec::new());
        };

        let diff =
            self.inner
                .diff_tree_to_tree(Some(&parent.tree()?), Some(&head.tree()?), None)?;

        let files = diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(|path| path.to_string_lossy().into_owned())
            .collect();

        Ok(files)
    }

    fn tags_matching(&self, pattern: &str) -> GitResult<Vec<String>> {
        let names = self.inner.tag_names(Some(pattern))?;
        let mut tags: Vec<String> = names.iter().flatten().map(String::from).collect();
        tags.sort_by(|a, b| compare_version_refnames(b, a));
        Ok(tags)
    }

    fn tag_exists(&self, tag: &str) -> GitResult<bool> {
        match self.inner.find_reference(&format!("refs/tags/{tag}")) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn remote_tag_exists(&self, tag: &str) -> GitResult<bool> {
        let mut remote = self
            .inner
            .find_remote(&self.remote)
            .map_err(|_| GitError::RemoteNotFound(self.remote.clone()))?;

        let connection = remote.connect_auth(Direction::Fetch, Some(self.callbacks()), None)?;
        let wanted = format!("refs/tags/{tag}");
        let found = connection.list()?.iter().any(|head| head.name() == wanted);

        Ok(found)
    }

    fn create_tag(&self, tag: &str, message: &str) -> GitResult<()> {
        let head = self.inner.head()?;
        let commit = head.peel_to_commit()?;
        let sig = self.signature()?;

        match self.inner.tag(tag, commit.as_object(), &sig, message, false) {
            Ok(_) => Ok(()),
            Err(e) if e.code() == ErrorCode::Exists => Err(GitError::TagExists(tag.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn head_message(&self) -> GitResult<Option<String>> {
        let head = match self.inner.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let commit = head.peel_to_commit()?;
        Ok(commit.message().map(String::from))
    }

    fn commit_paths(&self, paths: &[&Path], message: &str) -> GitResult<()> {
        let mut index = self.inner.index()?;
        for path in paths {
            index.add_path(path)?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;
        let sig = self.signature()?;

        let parent = self.inner.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        self.inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;

        Ok(())
    }

    fn push_head(&self) -> GitResult<()> {
        let head = self.inner.head()?;
        if !head.is_branch() {
            return Err(GitError::DetachedHead);
        }
        let name = head.name().ok_or(GitError::DetachedHead)?;
        self.push_refspec(&format!("{name}:{name}"))
    }

    fn push_tag(&self, tag: &str) -> GitResult<()> {
        self.push_refspec(&format!("refs/tags/{tag}:refs/tags/{tag}"))
    }
}
