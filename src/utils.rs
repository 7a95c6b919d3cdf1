//! Utility functions for filename derivation and collision handling

use crate::config::FileCollisionAction;
use crate::error::JobError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

fn non_word_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // \W is unicode-aware, so accented letters survive
    RE.get_or_init(|| Regex::new(r"\W+").unwrap_or_else(|_| unreachable!()))
}

/// Sanitize a source-reported title into a filesystem-safe base name.
///
/// Every run of non-word characters collapses to a single space and the
/// result is trimmed, so `"A/B: C?"` becomes `"A B C"`. Titles made up
/// entirely of non-word characters sanitize to the empty string; callers
/// must substitute a fallback name in that case.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    non_word_runs().replace_all(title, " ").trim().to_string()
}

/// Resolve an output path against the configured collision action.
///
/// For `Overwrite` the path comes back unchanged. For `Skip` an existing
/// file is a [`JobError::Collision`]. For `Rename` a ` (n)` suffix is added
/// before the extension until an unused name is found.
pub fn get_unique_path(
    path: &Path,
    action: FileCollisionAction,
) -> std::result::Result<PathBuf, JobError> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(JobError::Collision {
                    path: path.to_path_buf(),
                    reason: "file already exists and collision action is skip".to_string(),
                });
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
                JobError::Collision {
                    path: path.to_path_buf(),
                    reason: "cannot extract file stem".to_string(),
                }
            })?;
            let extension = path.extension().and_then(|e| e.to_str());
            let parent = path.parent().ok_or_else(|| JobError::Collision {
                path: path.to_path_buf(),
                reason: "cannot extract parent directory".to_string(),
            })?;

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_name = match extension {
                    Some(ext) => format!("{stem} ({i}).{ext}"),
                    None => format!("{stem} ({i})"),
                };
                let new_path = parent.join(new_name);
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(JobError::Collision {
                path: path.to_path_buf(),
                reason: format!("no unique filename after {MAX_RENAME_ATTEMPTS} attempts"),
            })
        }
    }
}
