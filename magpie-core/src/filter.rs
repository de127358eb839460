//! Noise and ignore filtering
//!
//! User-supplied ignore globs are applied first and always win; ignored
//! files never reach the plan file budget. A second, conditional heuristic
//! then trims documentation and test files from the AI review set when the
//! PR touches real logic: model tokens are the scarce resource, static
//! rules are not, so the static set keeps everything the globs let through.

use glob::Pattern;
use tracing::{debug, warn};

use crate::score::{is_doc, is_test, ScoredFile};

/// Result of filtering: the static set and the (possibly smaller) AI set
#[derive(Debug, Clone)]
pub struct FilteredFiles {
    /// Files eligible for static rules (everything not explicitly ignored)
    pub static_set: Vec<ScoredFile>,
    /// Files eligible for AI review (docs/tests may be suppressed)
    pub ai_set: Vec<ScoredFile>,
}

/// Drop files matching the user's ignore globs
///
/// Runs before the plan file budget so that ignored files cannot consume
/// budget slots. Invalid patterns are skipped, not fatal.
pub fn apply_ignore_globs(files: Vec<ScoredFile>, ignore_globs: &[String]) -> Vec<ScoredFile> {
    let patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|g| match Pattern::new(g) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(glob = %g, error = %e, "skipping invalid ignore pattern");
                None
            }
        })
        .collect();

    files
        .into_iter()
        .filter(|f| {
            let ignored = patterns.iter().any(|p| p.matches(&f.file.path));
            if ignored {
                debug!(path = %f.file.path, "file excluded by ignore pattern");
            }
            !ignored
        })
        .collect()
}

/// Split the surviving files into the static and AI review sets
pub fn filter_files(files: Vec<ScoredFile>) -> FilteredFiles {
    let static_set = files;

    // If any surviving file carries real logic weight, docs and tests are not
    // worth model tokens on this PR.
    let has_logic = static_set.iter().any(|f| f.score >= 3);
    let ai_set: Vec<ScoredFile> = static_set
        .iter()
        .filter(|f| {
            if !has_logic {
                return true;
            }
            let path = f.file.path.to_ascii_lowercase();
            let name = path.rsplit('/').next().unwrap_or(&path);
            !(is_doc(&path, name) || is_test(&path))
        })
        .cloned()
        .collect();

    FilteredFiles { static_set, ai_set }
}
