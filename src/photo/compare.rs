// Compare engine module
// Reconciles a baseline name set against the names found on disk

use std::path::PathBuf;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::info;

use super::error::PhotoError;
use super::names::NameSet;

/// Image extensions recognized by the legacy allowlist
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Options for the reconciler
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Only report unlisted disk files that carry an image extension
    pub image_extensions_only: bool,
    /// Extensions considered images, without the leading dot
    pub image_extensions: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            image_extensions_only: false,
            image_extensions: DEFAULT_IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Case-insensitive extension matcher
#[derive(Debug, Clone)]
pub struct ImageFilter {
    glob_set: GlobSet,
    extensions: Vec<String>,
}

impl ImageFilter {
    /// Build a matcher for `*.ext` over each extension
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();

        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.');
            if ext.is_empty() {
                continue;
            }
            let glob = GlobBuilder::new(&format!("*.{}", ext))
                .case_insensitive(true)
                .literal_separator(true)
                .build()?;
            builder.add(glob);
            kept.push(ext.to_lowercase());
        }

        Ok(Self {
            glob_set: builder.build()?,
            extensions: kept,
        })
    }

    pub fn is_image(&self, name: &str) -> bool {
        self.glob_set.is_match(name)
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

/// Asymmetric differences between a baseline and the disk snapshot
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiffReport {
    pub baseline_total: usize,
    pub target_total: usize,
    /// Names present in both sets
    pub matched: usize,
    /// In the baseline, not on disk
    pub missing_in_target: Vec<String>,
    /// On disk, not in the baseline
    pub missing_in_baseline: Vec<String>,
    /// Whether `missing_in_baseline` was restricted to image extensions
    pub images_only: bool,
}

impl DiffReport {
    pub fn is_clean(&self) -> bool {
        self.missing_in_target.is_empty() && self.missing_in_baseline.is_empty()
    }

    /// Format the report as a plain text summary followed by both lists
    pub fn to_plain_text(&self) -> String {
        let mut output = String::new();

        output.push_str("\n=== Manifest Comparison Report ===\n\n");

        output.push_str("Summary:\n");
        output.push_str(&format!("  Baseline:            {} names\n", self.baseline_total));
        output.push_str(&format!("  On disk:             {} names\n", self.target_total));
        output.push_str(&format!("  Matched:             {} names\n", self.matched));
        output.push_str(&format!("  Missing on disk:     {} names\n", self.missing_in_target.len()));
        output.push_str(&format!("  Missing in baseline: {} names\n", self.missing_in_baseline.len()));
        if self.images_only {
            output.push_str("  (unlisted files restricted to image extensions)\n");
        }

        if !self.missing_in_target.is_empty() {
            output.push_str("\nMissing on disk (in baseline but not found):\n");
            for name in &self.missing_in_target {
                output.push_str(&format!("  {}\n", name));
            }
        }

        if !self.missing_in_baseline.is_empty() {
            output.push_str("\nMissing in baseline (found on disk but not listed):\n");
            for name in &self.missing_in_baseline {
                output.push_str(&format!("  {}\n", name));
            }
        }

        output.push('\n');
        output
    }

    /// Format the report as a JSON document
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(serde::Serialize)]
        struct JsonOutput<'a> {
            metadata: Metadata,
            summary: Summary,
            missing_in_target: &'a [String],
            missing_in_baseline: &'a [String],
        }

        #[derive(serde::Serialize)]
        struct Metadata {
            timestamp: String,
            images_only: bool,
        }

        #[derive(serde::Serialize)]
        struct Summary {
            baseline_total: usize,
            target_total: usize,
            matched: usize,
            missing_in_target_count: usize,
            missing_in_baseline_count: usize,
        }

        let output = JsonOutput {
            metadata: Metadata {
                timestamp: chrono::Utc::now().to_rfc3339(),
                images_only: self.images_only,
            },
            summary: Summary {
                baseline_total: self.baseline_total,
                target_total: self.target_total,
                matched: self.matched,
                missing_in_target_count: self.missing_in_target.len(),
                missing_in_baseline_count: self.missing_in_baseline.len(),
            },
            missing_in_target: &self.missing_in_target,
            missing_in_baseline: &self.missing_in_baseline,
        };

        serde_json::to_string_pretty(&output)
    }
}

/// Engine for reconciling name sets
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    image_filter: Option<ImageFilter>,
}

impl DiffEngine {
    /// Create an engine with exact name matching and no extension filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine from options
    ///
    /// # Errors
    /// Returns a `Config` error if an extension does not form a valid pattern
    pub fn with_options(options: &DiffOptions) -> Result<Self, PhotoError> {
        if !options.image_extensions_only {
            return Ok(Self::new());
        }
        let filter = ImageFilter::new(&options.image_extensions).map_err(|e| PhotoError::Config {
            path: PathBuf::from("image_extensions"),
            reason: e.to_string(),
        })?;
        Ok(Self {
            image_filter: Some(filter),
        })
    }

    /// Compute `(baseline - target, target - baseline)`
    ///
    /// Each list keeps the iteration order of its source set. Membership is
    /// hashed, so the cost is linear in the size of both sets.
    pub fn diff(&self, baseline: &NameSet, target: &NameSet) -> DiffReport {
        let missing_in_target: Vec<String> = baseline
            .iter()
            .filter(|name| !target.contains(name))
            .map(str::to_string)
            .collect();

        let matched = baseline.len() - missing_in_target.len();

        let missing_in_baseline: Vec<String> = target
            .iter()
            .filter(|name| !baseline.contains(name))
            .filter(|name| {
                self.image_filter
                    .as_ref()
                    .map_or(true, |filter| filter.is_image(name))
            })
            .map(str::to_string)
            .collect();

        info!(
            baseline = baseline.len(),
            target = target.len(),
            missing_in_target = missing_in_target.len(),
            missing_in_baseline = missing_in_baseline.len(),
            "sets reconciled"
        );

        DiffReport {
            baseline_total: baseline.len(),
            target_total: target.len(),
            matched,
            missing_in_target,
            missing_in_baseline,
            images_only: self.image_filter.is_some(),
        }
    }
}
