//! Release pipeline orchestration.
//!
//! Steps run in a fixed order: detect, aggregate, bump, tag, push, release,
//! summarize. Each step is idempotent. Expected conditions surface as
//! [`StepError::Recoverable`] and are recorded as skips; only
//! [`StepError::Fatal`] stops the pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use cadence_config::Config;
use cadence_git::{GitError, VersionControl};
use tracing::{debug, info, warn};

use crate::ci::ReleaseOutcome;
use crate::{
    BumpType, ChangelogLocator, CoreResult, FileSystem, HandoffDir, PackageNotes, PackageRelease,
    Recovery, ReleaseHost, ReleaseRequest, SemanticVersion, StepError, StepResult, Summary,
    SummaryGenerator, TextGenerator, aggregate_from_history, aggregate_intents, detect_published,
    manifest,
};

/// A pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Find published packages.
    Detect,
    /// Compute the monorepo bump.
    Aggregate,
    /// Write and commit the new monorepo version.
    Bump,
    /// Create the monorepo tag.
    Tag,
    /// Push the commit and tag.
    Push,
    /// Create per-package releases.
    Release,
    /// Produce the combined summary.
    Summarize,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Detect => "detect",
            Self::Aggregate => "aggregate",
            Self::Bump => "bump",
            Self::Tag => "tag",
            Self::Push => "push",
            Self::Release => "release",
            Self::Summarize => "summarize",
        };
        f.write_str(name)
    }
}

/// How a step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// The step did its work.
    Completed,
    /// The work was already done or not needed.
    Skipped(Recovery),
    /// No published packages; the pipeline stops successfully.
    NothingToDo,
}

/// Record of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// The step.
    pub step: Step,
    /// Its outcome.
    pub status: StepStatus,
}

/// State threaded between steps of one run.
#[derive(Debug, Default)]
pub struct PipelineContext {
    /// Published packages.
    pub packages: Vec<PackageRelease>,
    /// Monorepo bump.
    pub bump: Option<BumpType>,
    /// New monorepo version.
    pub new_version: Option<SemanticVersion>,
    /// Monorepo tag.
    pub tag: Option<String>,
    /// Per-package release outcomes.
    pub releases: Vec<ReleaseOutcome>,
    /// Generated summary.
    pub summary: Option<Summary>,
    /// Step outcomes, in order.
    pub reports: Vec<StepReport>,
}

impl PipelineContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded status of a step.
    #[must_use]
    pub fn status(&self, step: Step) -> Option<&StepStatus> {
        self.reports
            .iter()
            .rev()
            .find(|r| r.step == step)
            .map(|r| &r.status)
    }

    fn record(&mut self, step: Step, status: StepStatus) {
        match &status {
            StepStatus::Completed => info!(%step, "step completed"),
            StepStatus::Skipped(reason) => info!(%step, %reason, "step skipped"),
            StepStatus::NothingToDo => info!(%step, "nothing to release"),
        }
        self.reports.push(StepReport { step, status });
    }
}

/// Commit message of the monorepo bump.
#[must_use]
pub fn bump_commit_message(version: SemanticVersion) -> String {
    format!("chore: bump monorepo to v{version}")
}

/// Monorepo tag for a version.
#[must_use]
pub fn monorepo_tag(version: SemanticVersion) -> String {
    format!("v{version}")
}

/// Drives the release steps against the repository and remote collaborators.
pub struct Pipeline<'a, V: VersionControl, F: FileSystem> {
    vcs: &'a V,
    fs: &'a F,
    config: &'a Config,
    handoff: Option<&'a HandoffDir>,
}

impl<'a, V: VersionControl, F: FileSystem> Pipeline<'a, V, F> {
    /// Creates a pipeline.
    #[must_use]
    pub fn new(vcs: &'a V, fs: &'a F, config: &'a Config) -> Self {
        Self {
            vcs,
            fs,
            config,
            handoff: None,
        }
    }

    /// Persists step outputs to a handoff directory as they are produced.
    #[must_use]
    pub fn with_handoff(mut self, handoff: &'a HandoffDir) -> Self {
        self.handoff = Some(handoff);
        self
    }

    fn manifest_path(&self) -> PathBuf {
        self.vcs.workdir().join(&self.config.manifest.path)
    }

    fn locator(&self) -> ChangelogLocator<'_, F> {
        ChangelogLocator::new(self.fs, &self.config.changelog)
    }

    /// Detect step. Uses `supplied` when given, otherwise inspects the files
    /// changed by `HEAD`.
    ///
    /// Returns `false` when there is nothing to release.
    ///
    /// # Errors
    ///
    /// Returns an error if a manifest is malformed or the handoff cannot be written.
    pub fn detect(
        &self,
        ctx: &mut PipelineContext,
        supplied: Option<Vec<PackageRelease>>,
    ) -> CoreResult<bool> {
        let packages = match supplied {
            Some(packages) => {
                debug!(count = packages.len(), "using supplied package list");
                packages
            }
            None => {
                let changed = self.vcs.changed_files()?;
                debug!(count = changed.len(), "changed files");
                detect_published(changed.as_slice(), self.fs)?
            }
        };

        if let Some(handoff) = self.handoff {
            handoff.write_packages(&packages)?;
        }

        ctx.packages = packages;
        if ctx.packages.is_empty() {
            ctx.record(Step::Detect, StepStatus::NothingToDo);
            return Ok(false);
        }

        ctx.record(Step::Detect, StepStatus::Completed);
        Ok(true)
    }

    /// Aggregate step. Declared intents win over tag history when present.
    ///
    /// # Errors
    ///
    /// Returns an error if a version or previous tag is invalid.
    pub fn aggregate(
        &self,
        ctx: &mut PipelineContext,
        intents: Option<&BTreeMap<String, BumpType>>,
    ) -> CoreResult<BumpType> {
        let bump = match intents {
            Some(intents) if !intents.is_empty() => {
                debug!(count = intents.len(), "aggregating declared intents");
                aggregate_intents(intents.values().copied())
            }
            _ => aggregate_from_history(self.vcs, &ctx.packages)?,
        };

        info!(%bump, packages = ctx.packages.len(), "aggregated monorepo bump");
        ctx.bump = Some(bump);
        ctx.record(Step::Aggregate, StepStatus::Completed);
        Ok(bump)
    }

    /// Bump step. Skipped when `HEAD` is already the bump commit for the
    /// manifest version, unless a recorded handoff version contradicts it.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be updated or committed.
    pub fn bump(&self, ctx: &mut PipelineContext, bump: BumpType) -> CoreResult<SemanticVersion> {
        let version = match self.apply_bump(bump) {
            Ok(version) => {
                ctx.record(Step::Bump, StepStatus::Completed);
                version
            }
            Err(StepError::Recoverable(recovery)) => {
                let version = manifest::read_version(&self.manifest_path())?;
                ctx.record(Step::Bump, StepStatus::Skipped(recovery));
                version
            }
            Err(StepError::Fatal(e)) => return Err(e),
        };

        if let Some(handoff) = self.handoff {
            handoff.write_bump_outputs(&ctx.packages, bump, version)?;
        }

        ctx.new_version = Some(version);
        Ok(version)
    }

    fn apply_bump(&self, bump: BumpType) -> StepResult<SemanticVersion> {
        let path = self.manifest_path();
        let current = manifest::read_version(&path)?;

        // HEAD being the bump commit for the manifest version is the proof; a
        // recorded handoff version, when present, must agree with it.
        let expected = bump_commit_message(current);
        let head = self.vcs.head_message()?;
        if head.is_some_and(|message| message.trim() == expected) {
            let recorded = match self.handoff {
                Some(handoff) => handoff.read_new_version()?,
                None => None,
            };
            if recorded.is_none_or(|version| version == current) {
                return Err(StepError::Recoverable(Recovery::AlreadyBumped(
                    current.to_string(),
                )));
            }
            debug!(%current, ?recorded, "handoff disagrees with bump commit");
        }

        let next = current.bump(bump);
        manifest::write_version(&path, next)?;
        self.vcs
            .commit_paths(&[self.config.manifest.path.as_path()], &bump_commit_message(next))?;

        info!(previous = %current, next = %next, "bumped monorepo version");
        Ok(next)
    }

    /// Tag step. An existing local tag is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be created.
    pub fn tag(&self, ctx: &mut PipelineContext, version: SemanticVersion) -> CoreResult<String> {
        let tag = monorepo_tag(version);

        match self.create_tag(&tag) {
            Ok(()) => ctx.record(Step::Tag, StepStatus::Completed),
            Err(StepError::Recoverable(recovery)) => {
                ctx.record(Step::Tag, StepStatus::Skipped(recovery));
            }
            Err(StepError::Fatal(e)) => return Err(e),
        }

        ctx.tag = Some(tag.clone());
        Ok(tag)
    }

    fn create_tag(&self, tag: &str) -> StepResult<()> {
        if self.vcs.tag_exists(tag)? {
            return Err(StepError::Recoverable(Recovery::TagExists(tag.to_string())));
        }

        match self.vcs.create_tag(tag, &format!("Release {tag}")) {
            Ok(()) => {
                info!(%tag, "created tag");
                Ok(())
            }
            Err(GitError::TagExists(tag)) => Err(StepError::Recoverable(Recovery::TagExists(tag))),
            Err(e) => Err(e.into()),
        }
    }

    /// Push step. A rejected tag push that the remote already has counts as
    /// success.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit push fails, or the tag push fails and the
    /// tag is not on the remote.
    pub fn push(&self, ctx: &mut PipelineContext, tag: &str) -> CoreResult<()> {
        self.vcs.push_head()?;
        info!(remote = %self.config.git.remote, "pushed commit");

        match self.push_tag(tag) {
            Ok(()) => ctx.record(Step::Push, StepStatus::Completed),
            Err(StepError::Recoverable(recovery)) => {
                warn!(%recovery, "tag push raced with another run");
                ctx.record(Step::Push, StepStatus::Skipped(recovery));
            }
            Err(StepError::Fatal(e)) => return Err(e),
        }
        Ok(())
    }

    fn push_tag(&self, tag: &str) -> StepResult<()> {
        let Err(err) = self.vcs.push_tag(tag) else {
            info!(%tag, "pushed tag");
            return Ok(());
        };

        match self.vcs.remote_tag_exists(tag) {
            Ok(true) => Err(StepError::Recoverable(Recovery::RemoteTagExists(
                tag.to_string(),
            ))),
            Ok(false) => Err(err.into()),
            Err(check) => {
                debug!(%check, "could not list remote tags");
                Err(err.into())
            }
        }
    }

    /// Release step. Every package is validated before the first remote call.
    ///
    /// # Errors
    ///
    /// Returns an error on an invalid package, or a host failure that is not
    /// explained by a concurrent run.
    pub async fn release<H: ReleaseHost>(
        &self,
        ctx: &mut PipelineContext,
        host: &H,
    ) -> CoreResult<()> {
        for package in &ctx.packages {
            package.validate()?;
        }

        let mut outcomes = Vec::with_capacity(ctx.packages.len());
        for package in &ctx.packages {
            let tag = package.tag();
            let created = match self.release_package(host, package, &tag).await {
                Ok(()) => {
                    info!(%tag, "created release");
                    true
                }
                Err(StepError::Recoverable(recovery)) => {
                    info!(%recovery, "skipping release");
                    false
                }
                Err(StepError::Fatal(e)) => return Err(e),
            };

            outcomes.push(ReleaseOutcome {
                name: package.name.clone(),
                version: package.version.clone(),
                url: host.release_url(&tag),
                tag,
                created,
            });
        }

        ctx.releases = outcomes;
        ctx.record(Step::Release, StepStatus::Completed);
        Ok(())
    }

    async fn release_package<H: ReleaseHost>(
        &self,
        host: &H,
        package: &PackageRelease,
        tag: &str,
    ) -> StepResult<()> {
        if host.release_exists(tag).await? {
            return Err(StepError::Recoverable(Recovery::ReleaseExists(
                tag.to_string(),
            )));
        }

        let notes = PackageNotes::new(package.clone(), self.locator().section(package)?);
        let body = notes.body();
        let request = ReleaseRequest {
            tag,
            title: tag,
            body: &body,
            target: &self.config.release.target,
        };

        match host.create_release(&request).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if host.release_exists(tag).await.unwrap_or(false) {
                    warn!(%tag, %err, "release created concurrently");
                    Err(StepError::Recoverable(Recovery::ReleaseExists(
                        tag.to_string(),
                    )))
                } else {
                    Err(err.into())
                }
            }
        }
    }

    /// Summarize step. Never fails the pipeline.
    pub async fn summarize<G: TextGenerator>(
        &self,
        ctx: &mut PipelineContext,
        bump: BumpType,
        generator: Option<&G>,
    ) -> Summary {
        let locator = self.locator();
        let notes: Vec<PackageNotes> = ctx
            .packages
            .iter()
            .map(|package| {
                let section = locator.section(package).unwrap_or_else(|e| {
                    warn!(package = %package.name, error = %e, "could not read changelog");
                    None
                });
                PackageNotes::new(package.clone(), section)
            })
            .collect();

        let summary = SummaryGenerator::new(
            self.config.summary.strategy,
            generator,
            self.config.summary.max_tokens,
        )
        .generate(&notes, bump)
        .await;

        if let Some(handoff) = self.handoff
            && let Err(e) = handoff.write_summary(&summary.text, summary.used_enrichment)
        {
            warn!(error = %e, "could not write summary handoff");
        }

        ctx.record(Step::Summarize, StepStatus::Completed);
        ctx.summary = Some(summary.clone());
        summary
    }

    /// Runs every step in order.
    ///
    /// # Errors
    ///
    /// Returns the first fatal step error. Summary problems never fail the run.
    pub async fn run<H: ReleaseHost, G: TextGenerator>(
        &self,
        ctx: &mut PipelineContext,
        supplied: Option<Vec<PackageRelease>>,
        intents: Option<&BTreeMap<String, BumpType>>,
        host: &H,
        generator: Option<&G>,
    ) -> CoreResult<()> {
        if !self.detect(ctx, supplied)? {
            return Ok(());
        }

        let bump = self.aggregate(ctx, intents)?;
        let version = self.bump(ctx, bump)?;
        let tag = self.tag(ctx, version)?;
        self.push(ctx, &tag)?;
        self.release(ctx, host).await?;
        self.summarize(ctx, bump, generator).await;

        info!(version = %version, %tag, "release pipeline finished");
        Ok(())
    }
}
