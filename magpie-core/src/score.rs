//! File risk scoring and the plan file budget
//!
//! Scoring is the second line of cost control after the noise filter: when a
//! PR touches more files than the plan allows, the highest-risk files are
//! kept and the rest are dropped before any model call.

use crate::diff::ParsedFile;

/// Risk weight assigned to a changed file
///
/// 5 = security-sensitive, 4 = infra/config, 3 = application logic,
/// 1 = docs/tests, 0 = generated or lock files.
pub fn score_file(path: &str) -> u8 {
    let lower = path.to_ascii_lowercase();
    let name = lower.rsplit('/').next().unwrap_or(&lower);

    if is_generated(&lower, name) {
        return 0;
    }
    if is_doc(&lower, name) || is_test(&lower) {
        return 1;
    }
    if is_security_sensitive(&lower) {
        return 5;
    }
    if is_infra(&lower, name) {
        return 4;
    }
    if is_source_code(&lower) {
        return 3;
    }
    // Unknown file kinds sit between docs and logic.
    2
}

/// Security/auth/crypto paths carry the highest review priority
fn is_security_sensitive(path: &str) -> bool {
    const MARKERS: &[&str] = &[
        "auth", "security", "crypto", "secret", "token", "password", "session", "permission",
        "acl", "oauth",
    ];
    MARKERS.iter().any(|m| path.contains(m))
}

fn is_infra(path: &str, name: &str) -> bool {
    const NAMES: &[&str] = &[
        "dockerfile",
        "docker-compose.yml",
        "docker-compose.yaml",
        "makefile",
        ".env.example",
    ];
    const EXTS: &[&str] = &[".tf", ".yml", ".yaml", ".toml", ".ini", ".conf", ".sql"];
    NAMES.contains(&name)
        || EXTS.iter().any(|e| name.ends_with(e))
        || path.contains("migrations/")
        || path.contains(".github/workflows/")
        || path.contains("terraform/")
}

fn is_source_code(path: &str) -> bool {
    const EXTS: &[&str] = &[
        ".rs", ".ts", ".tsx", ".js", ".jsx", ".py", ".go", ".java", ".kt", ".rb", ".c", ".cc",
        ".cpp", ".h", ".hpp", ".cs", ".php", ".swift", ".scala", ".sh",
    ];
    EXTS.iter().any(|e| path.ends_with(e))
}

/// Documentation files
pub fn is_doc(path: &str, name: &str) -> bool {
    name.ends_with(".md")
        || name.ends_with(".rst")
        || name.ends_with(".txt")
        || name.ends_with(".adoc")
        || path.starts_with("docs/")
        || path.contains("/docs/")
        || name == "license"
        || name == "changelog"
}

/// Test files, by directory or naming convention
pub fn is_test(path: &str) -> bool {
    path.starts_with("tests/")
        || path.contains("/tests/")
        || path.contains("/test/")
        || path.contains("__tests__/")
        || path.contains(".test.")
        || path.contains(".spec.")
        || path
            .rsplit('/')
            .next()
            .is_some_and(|n| n.starts_with("test_") || n.ends_with("_test.rs") || n.ends_with("_test.go"))
}

fn is_generated(path: &str, name: &str) -> bool {
    const LOCKS: &[&str] = &[
        "cargo.lock",
        "package-lock.json",
        "yarn.lock",
        "pnpm-lock.yaml",
        "composer.lock",
        "gemfile.lock",
        "poetry.lock",
        "go.sum",
    ];
    LOCKS.contains(&name)
        || name.ends_with(".min.js")
        || name.ends_with(".min.css")
        || name.ends_with(".map")
        || path.contains("/generated/")
        || path.contains("/dist/")
        || path.contains("/vendor/")
        || name.ends_with(".pb.go")
        || name.ends_with("_pb2.py")
}

/// A parsed file with its computed risk score
#[derive(Debug, Clone)]
pub struct ScoredFile {
    pub file: ParsedFile,
    pub score: u8,
}

impl ScoredFile {
    pub fn new(file: ParsedFile) -> Self {
        let score = score_file(&file.path);
        Self { file, score }
    }
}

/// Rank files by risk and truncate to the plan's file budget
///
/// The sort is stable and descending by score, so ties keep their original
/// diff order and the top `max_files` by score always survive.
pub fn sort_and_limit_files(files: Vec<ScoredFile>, max_files: usize) -> Vec<ScoredFile> {
    let mut files = files;
    files.sort_by(|a, b| b.score.cmp(&a.score));
    files.truncate(max_files);
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ParsedFile;

    fn file(path: &str) -> ParsedFile {
        ParsedFile {
            path: path.to_string(),
            old_path: None,
            hunks: Vec::new(),
            additions: Vec::new(),
            deletions: Vec::new(),
            is_new: false,
            is_deleted: false,
        }
    }

    #[test]
    fn test_scores_by_category() {
        assert_eq!(score_file("src/auth/login.rs"), 5);
        assert_eq!(score_file("deploy/terraform/main.tf"), 4);
        assert_eq!(score_file(".github/workflows/ci.yml"), 4);
        assert_eq!(score_file("src/parser.rs"), 3);
        assert_eq!(score_file("tests/parser_test.rs"), 1);
        assert_eq!(score_file("README.md"), 1);
        assert_eq!(score_file("Cargo.lock"), 0);
        assert_eq!(score_file("web/dist/bundle.min.js"), 0);
    }

    #[test]
    fn test_generated_beats_security_keywords() {
        // A lock file under an auth directory is still generated.
        assert_eq!(score_file("auth/vendor/Cargo.lock"), 0);
    }

    #[test]
    fn test_sort_and_limit_keeps_top_scores() {
        let files = vec![
            ScoredFile::new(file("README.md")),
            ScoredFile::new(file("src/auth/token.rs")),
            ScoredFile::new(file("src/lib.rs")),
            ScoredFile::new(file("Cargo.lock")),
        ];

        let kept = sort_and_limit_files(files, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].file.path, "src/auth/token.rs");
        assert_eq!(kept[1].file.path, "src/lib.rs");
    }

    #[test]
    fn test_sort_is_stable_under_ties() {
        let files = vec![
            ScoredFile::new(file("src/a.rs")),
            ScoredFile::new(file("src/b.rs")),
            ScoredFile::new(file("src/c.rs")),
        ];

        let kept = sort_and_limit_files(files, 2);
        assert_eq!(kept[0].file.path, "src/a.rs");
        assert_eq!(kept[1].file.path, "src/b.rs");
    }

    #[test]
    fn test_limit_larger_than_input() {
        let files = vec![ScoredFile::new(file("src/a.rs"))];
        let kept = sort_and_limit_files(files, 30);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_exact_budget_property() {
        // M > F files in: exactly F files out.
        let files: Vec<ScoredFile> = (0..50)
            .map(|i| ScoredFile::new(file(&format!("src/mod_{:02}.rs", i))))
            .collect();
        assert_eq!(sort_and_limit_files(files, 30).len(), 30);
    }
}
