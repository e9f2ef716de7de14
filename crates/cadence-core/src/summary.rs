//! Release summary generation.

use std::fmt;
use std::ops::RangeInclusive;

use cadence_config::SummaryStrategy;
use tracing::{info, warn};

use crate::{BumpType, PackageRelease, Prompt, Recovery, RemoteError, TextGenerator};

/// Accepted length of generated text, in characters.
pub const GENERATED_LENGTH: RangeInclusive<usize> = 10..=5000;

/// Changelog excerpts sent as prompt context are cut at this many characters.
const EXCERPT_LIMIT: usize = 1200;

/// Level of detail of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryDepth {
    /// One sentence and the package list.
    Brief,
    /// Summary, per-package updates and highlights.
    Detailed,
    /// Major milestone write-up.
    Comprehensive,
}

impl fmt::Display for SummaryDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brief => write!(f, "brief"),
            Self::Detailed => write!(f, "detailed"),
            Self::Comprehensive => write!(f, "comprehensive"),
        }
    }
}

/// Picks the summary depth; the first matching rule wins.
pub fn determine_depth(bump: BumpType, package_count: usize) -> SummaryDepth {
    match (bump, package_count) {
        (BumpType::Major, count) if count >= 2 => SummaryDepth::Comprehensive,
        (BumpType::Major, _) => SummaryDepth::Detailed,
        (_, count) if count >= 3 => SummaryDepth::Detailed,
        _ => SummaryDepth::Brief,
    }
}

/// A published package with its changelog section, if one was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNotes {
    /// The published package.
    pub package: PackageRelease,
    /// Changelog section for the published version.
    pub section: Option<String>,
}

impl PackageNotes {
    /// Creates package notes.
    #[must_use]
    pub fn new(package: PackageRelease, section: Option<String>) -> Self {
        Self { package, section }
    }

    /// Returns the section, or `Release <version>` when it is missing or empty.
    #[must_use]
    pub fn body(&self) -> String {
        match self.section.as_deref() {
            Some(section) if !section.trim().is_empty() => section.to_string(),
            _ => format!("Release {}", self.package.version),
        }
    }
}

/// A generated summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Markdown text.
    pub text: String,
    /// Whether the text came from the text generation service.
    pub used_enrichment: bool,
}

fn package_list(notes: &[PackageNotes]) -> String {
    notes
        .iter()
        .map(|n| format!("* {}", n.package.tag()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the deterministic changelog summary.
pub fn changelog_summary(notes: &[PackageNotes]) -> String {
    let mut blocks = vec![package_list(notes)];
    blocks.extend(
        notes
            .iter()
            .map(|n| format!("### {}\n\n{}", n.package.name, n.body())),
    );
    blocks.join("\n\n")
}

/// Builds the template used when enrichment is unavailable.
pub fn fallback_summary(packages: &[PackageRelease]) -> String {
    let mut text = String::from("## Workspace Updates\n\n");
    for package in packages {
        text.push_str(&format!("* {}\n", package.tag()));
    }
    text.push_str(
        "\n_Automated summary unavailable - see individual package changelogs for detailed changes._",
    );
    text
}

/// Checks generated text before it is accepted.
///
/// # Errors
///
/// Returns a description of why the text was rejected.
pub fn validate_generated(text: &str) -> Result<&str, String> {
    if text.trim().is_empty() {
        return Err("empty response".to_string());
    }
    let length = text.chars().count();
    if !GENERATED_LENGTH.contains(&length) {
        return Err(format!(
            "response length {length} outside {}..={}",
            GENERATED_LENGTH.start(),
            GENERATED_LENGTH.end()
        ));
    }
    Ok(text)
}

fn excerpt(section: &str) -> &str {
    match section.char_indices().nth(EXCERPT_LIMIT) {
        Some((cut, _)) => &section[..cut],
        None => section,
    }
}

/// Builds the depth-specific prompt.
pub fn build_prompt(
    depth: SummaryDepth,
    bump: BumpType,
    notes: &[PackageNotes],
    max_tokens: u32,
) -> Prompt {
    let system = format!(
        "You write release notes for a monorepo of independently versioned packages.\n\n\
         Audience: developers and collaborators.\n\
         Tone: professional and approachable.\n\
         Focus on impact rather than implementation detail.\n\n\
         Write a {depth} summary in markdown."
    );

    let packages = notes
        .iter()
        .map(|n| n.package.tag())
        .collect::<Vec<_>>()
        .join("\n");

    let context = notes
        .iter()
        .filter_map(|n| {
            n.section
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|s| format!("### {}\n{}", n.package.name, excerpt(s)))
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let instructions = match depth {
        SummaryDepth::Brief => {
            "Format:\nOne sentence describing the update, then the list of packages.".to_string()
        }
        SummaryDepth::Detailed => format!(
            "Bump type: {bump}\n\n\
             Format:\n\
             ## Summary\nOne paragraph of two or three sentences on the impact.\n\n\
             ## Workspace Updates\nEach package with a short description.\n\n\
             ## Highlights\nThree to five bullet points on user-facing value."
        ),
        SummaryDepth::Comprehensive => format!(
            "Bump type: {bump}\n\n\
             This is a major milestone. Format:\n\
             ## Summary\nTwo paragraphs on significance and impact.\n\n\
             ## Workspace Updates\nEvery package, marked NEW or UPDATED where relevant.\n\n\
             ## Highlights\nFive to seven bullet points showing how the pieces fit together.\n\n\
             ## What's Next\nAn optional short forward-looking statement."
        ),
    };

    let mut user = format!("Create a {depth} release summary.\n\nPackages published:\n{packages}\n\n");
    if !context.is_empty() {
        user.push_str(&format!("Changelog excerpts:\n{context}\n\n"));
    }
    user.push_str(&instructions);

    Prompt {
        system,
        user,
        max_tokens,
    }
}

/// Produces the combined release summary.
pub struct SummaryGenerator<'a, G: TextGenerator> {
    strategy: SummaryStrategy,
    generator: Option<&'a G>,
    max_tokens: u32,
}

impl<'a, G: TextGenerator> SummaryGenerator<'a, G> {
    /// Creates a generator. Without a text generator, enrichment falls back.
    #[must_use]
    pub fn new(strategy: SummaryStrategy, generator: Option<&'a G>, max_tokens: u32) -> Self {
        Self {
            strategy,
            generator,
            max_tokens,
        }
    }

    /// Generates the summary. Never fails; enrichment problems degrade to the
    /// template.
    pub async fn generate(&self, notes: &[PackageNotes], bump: BumpType) -> Summary {
        let depth = determine_depth(bump, notes.len());
        info!(%depth, %bump, packages = notes.len(), "generating summary");

        match self.strategy {
            SummaryStrategy::Changelog => Summary {
                text: changelog_summary(notes),
                used_enrichment: false,
            },
            SummaryStrategy::Enrichment => match self.enrich(notes, bump, depth).await {
                Ok(text) => Summary {
                    text,
                    used_enrichment: true,
                },
                Err(recovery) => {
                    warn!(%recovery, "falling back to template summary");
                    let packages: Vec<_> = notes.iter().map(|n| n.package.clone()).collect();
                    Summary {
                        text: fallback_summary(&packages),
                        used_enrichment: false,
                    }
                }
            },
        }
    }

    async fn enrich(
        &self,
        notes: &[PackageNotes],
        bump: BumpType,
        depth: SummaryDepth,
    ) -> Result<String, Recovery> {
        let generator = self.generator.ok_or_else(|| {
            Recovery::EnrichmentUnavailable("no text generation credentials".to_string())
        })?;

        let prompt = build_prompt(depth, bump, notes, self.max_tokens);
        let text = generator.generate(&prompt).await.map_err(|e| match e {
            RemoteError::RateLimited => {
                Recovery::EnrichmentUnavailable("rate limited, not retrying".to_string())
            }
            other => Recovery::EnrichmentUnavailable(other.to_string()),
        })?;

        validate_generated(&text).map_err(Recovery::EnrichmentUnavailable)?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockGenerator, MockResponse};

    fn notes(specs: &[(&str, &str, Option<&str>)]) -> Vec<PackageNotes> {
        specs
            .iter()
            .map(|(name, version, section)| {
                PackageNotes::new(
                    PackageRelease::new(*name, *version),
                    section.map(str::to_string),
                )
            })
            .collect()
    }

    #[test]
    fn test_determine_depth() {
        assert_eq!(determine_depth(BumpType::Major, 2), SummaryDepth::Comprehensive);
        assert_eq!(determine_depth(BumpType::Major, 5), SummaryDepth::Comprehensive);
        assert_eq!(determine_depth(BumpType::Major, 1), SummaryDepth::Detailed);
        assert_eq!(determine_depth(BumpType::Major, 0), SummaryDepth::Detailed);
        assert_eq!(determine_depth(BumpType::Minor, 3), SummaryDepth::Detailed);
        assert_eq!(determine_depth(BumpType::Patch, 4), SummaryDepth::Detailed);
        assert_eq!(determine_depth(BumpType::Minor, 2), SummaryDepth::Brief);
        assert_eq!(determine_depth(BumpType::Patch, 1), SummaryDepth::Brief);
    }

    #[test]
    fn test_depth_display() {
        assert_eq!(SummaryDepth::Comprehensive.to_string(), "comprehensive");
    }

    #[test]
    fn test_body_placeholder() {
        let n = notes(&[("@acme/ui", "1.0.0", None), ("@acme/web", "2.0.0", Some("\n"))]);
        assert_eq!(n[0].body(), "Release 1.0.0");
        assert_eq!(n[1].body(), "Release 2.0.0");
    }

    #[test]
    fn test_changelog_summary() {
        let n = notes(&[
            ("@acme/ui", "1.1.0", Some("- Add Button")),
            ("@acme/web", "0.2.1", None),
        ]);
        insta::assert_snapshot!(changelog_summary(&n), @r"
        * @acme/ui@1.1.0
        * @acme/web@0.2.1

        ### @acme/ui

        - Add Button

        ### @acme/web

        Release 0.2.1
        ");
    }

    #[test]
    fn test_fallback_summary() {
        let packages = vec![
            PackageRelease::new("@acme/ui", "1.1.0"),
            PackageRelease::new("@acme/web", "0.2.1"),
        ];
        insta::assert_snapshot!(fallback_summary(&packages), @r"
        ## Workspace Updates

        * @acme/ui@1.1.0
        * @acme/web@0.2.1

        _Automated summary unavailable - see individual package changelogs for detailed changes._
        ");
    }

    #[test]
    fn test_validate_generated() {
        assert!(validate_generated("").is_err());
        assert!(validate_generated("   \n").is_err());
        assert!(validate_generated("too short").is_err());
        assert_eq!(validate_generated("ten chars!"), Ok("ten chars!"));
        assert!(validate_generated(&"a".repeat(5000)).is_ok());
        assert!(validate_generated(&"a".repeat(5001)).is_err());
    }

    #[test]
    fn test_validate_counts_chars() {
        // 10 chars, 20 bytes
        assert!(validate_generated("éééééééééé").is_ok());
    }

    #[test]
    fn test_build_prompt_by_depth() {
        let n = notes(&[("@acme/ui", "2.0.0", Some("- Breaking: new API"))]);

        let brief = build_prompt(SummaryDepth::Brief, BumpType::Patch, &n, 1000);
        assert!(brief.system.contains("brief summary"));
        assert!(brief.user.contains("@acme/ui@2.0.0"));
        assert!(brief.user.contains("- Breaking: new API"));
        assert!(!brief.user.contains("Bump type"));
        assert_eq!(brief.max_tokens, 1000);

        let detailed = build_prompt(SummaryDepth::Detailed, BumpType::Major, &n, 500);
        assert!(detailed.user.contains("Bump type: major"));
        assert!(detailed.user.contains("## Highlights"));
        assert!(!detailed.user.contains("What's Next"));

        let comprehensive = build_prompt(SummaryDepth::Comprehensive, BumpType::Major, &n, 500);
        assert!(comprehensive.system.contains("comprehensive summary"));
        assert!(comprehensive.user.contains("What's Next"));
    }

    #[test]
    fn test_build_prompt_without_sections() {
        let n = notes(&[("@acme/ui", "1.0.1", None)]);
        let prompt = build_prompt(SummaryDepth::Brief, BumpType::Patch, &n, 1000);
        assert!(!prompt.user.contains("Changelog excerpts"));
    }

    #[test]
    fn test_excerpt_cuts_on_char_boundary() {
        let long = "é".repeat(EXCERPT_LIMIT + 10);
        assert_eq!(excerpt(&long).chars().count(), EXCERPT_LIMIT);
        assert_eq!(excerpt("short"), "short");
    }

    #[tokio::test]
    async fn test_generate_changelog_strategy_skips_generator() {
        let generator = MockGenerator::new(MockResponse::Text("unused response".into()));
        let summary = SummaryGenerator::new(SummaryStrategy::Changelog, Some(&generator), 1000)
            .generate(&notes(&[("@acme/ui", "1.0.0", Some("- A"))]), BumpType::Minor)
            .await;

        assert!(!summary.used_enrichment);
        assert!(summary.text.contains("### @acme/ui"));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_enrichment_success() {
        let generator =
            MockGenerator::new(MockResponse::Text("## Summary\n\nA big release.".into()));
        let summary = SummaryGenerator::new(SummaryStrategy::Enrichment, Some(&generator), 1000)
            .generate(&notes(&[("@acme/ui", "2.0.0", None)]), BumpType::Major)
            .await;

        assert!(summary.used_enrichment);
        assert_eq!(summary.text, "## Summary\n\nA big release.");
        assert_eq!(generator.calls(), 1);
        assert!(generator.last_prompt().unwrap().system.contains("detailed"));
    }

    #[tokio::test]
    async fn test_generate_rate_limited_falls_back_without_retry() {
        let generator = MockGenerator::new(MockResponse::RateLimited);
        let summary = SummaryGenerator::new(SummaryStrategy::Enrichment, Some(&generator), 1000)
            .generate(&notes(&[("@acme/ui", "1.0.1", None)]), BumpType::Patch)
            .await;

        assert!(!summary.used_enrichment);
        assert!(summary.text.starts_with("## Workspace Updates"));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_invalid_response_falls_back() {
        let generator = MockGenerator::new(MockResponse::Text("short".into()));
        let summary = SummaryGenerator::new(SummaryStrategy::Enrichment, Some(&generator), 1000)
            .generate(&notes(&[("@acme/ui", "1.0.1", None)]), BumpType::Patch)
            .await;

        assert!(!summary.used_enrichment);
        assert!(summary.text.contains("* @acme/ui@1.0.1"));
    }

    #[tokio::test]
    async fn test_generate_server_error_falls_back() {
        let generator = MockGenerator::new(MockResponse::Status(500));
        let summary = SummaryGenerator::new(SummaryStrategy::Enrichment, Some(&generator), 1000)
            .generate(&notes(&[("@acme/ui", "1.0.1", None)]), BumpType::Patch)
            .await;

        assert!(!summary.used_enrichment);
    }

    #[tokio::test]
    async fn test_generate_without_generator_falls_back() {
        let summary = SummaryGenerator::<MockGenerator>::new(SummaryStrategy::Enrichment, None, 1000)
            .generate(&notes(&[("@acme/ui", "1.0.1", None)]), BumpType::Patch)
            .await;

        assert!(!summary.used_enrichment);
        assert!(summary.text.starts_with("## Workspace Updates"));
    }
}
