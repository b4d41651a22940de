use crate::sbom_generation::domain::Ecosystem;
use crate::shared::security::sanitize_member_path;
use std::collections::VecDeque;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Directories never descended into.
const NOISE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "vendor",
    "target",
    "build",
    "dist",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".gradle",
];

/// Child directory names that usually sit next to a manifest.
const SOURCE_DIRS: &[&str] = &["src", "lib", "cmd", "app", "pkg"];

const OWN_MANIFEST_WEIGHT: u32 = 3;
const OTHER_MANIFEST_WEIGHT: u32 = 1;
const SOURCE_DIR_BONUS: u32 = 1;

/// ProjectRootLocator finds the manifest root inside an extracted tree.
///
/// Never fails: when nothing looks like a project the extraction root is
/// returned as the best guess.
#[derive(Debug, Clone, Copy)]
pub struct ProjectRootLocator {
    max_depth: usize,
    max_dirs: usize,
}

impl Default for ProjectRootLocator {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_dirs: 2_000,
        }
    }
}

impl ProjectRootLocator {
    pub fn new(max_depth: usize, max_dirs: usize) -> Self {
        Self {
            max_depth,
            max_dirs: max_dirs.max(1),
        }
    }

    pub fn locate(&self, dest: &Path, hint: Option<&str>, ecosystem: Ecosystem) -> PathBuf {
        if let Some(dir) = hint.and_then(|h| hinted_dir(dest, h)) {
            debug!(root = %dir.display(), "project root taken from archive name");
            return dir;
        }

        let mut best: Option<(u32, PathBuf)> = None;
        let mut queue = VecDeque::from([(dest.to_path_buf(), 0usize)]);
        let mut visited = 0usize;

        while let Some((dir, depth)) = queue.pop_front() {
            visited += 1;
            if visited > self.max_dirs {
                break;
            }

            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };

            let mut children = Vec::new();
            for entry in entries.flatten() {
                // file_type() does not follow symlinks.
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };
                if file_type.is_dir() {
                    children.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
            children.sort();

            let score = score_dir(&dir, &children, ecosystem);
            if score > 0 && best.as_ref().map_or(true, |(top, _)| score > *top) {
                best = Some((score, dir.clone()));
            }

            if depth < self.max_depth {
                for name in children {
                    if NOISE_DIRS.contains(&name.as_str()) {
                        continue;
                    }
                    queue.push_back((dir.join(name), depth + 1));
                }
            }
        }

        match best {
            Some((score, dir)) => {
                debug!(root = %dir.display(), score, "project root located by scan");
                dir
            }
            None => {
                debug!(root = %dest.display(), "no manifest found, using extraction root");
                dest.to_path_buf()
            }
        }
    }
}

/// `dest/hint`, if the hint is a single plain name naming a real directory.
fn hinted_dir(dest: &Path, hint: &str) -> Option<PathBuf> {
    let relative = sanitize_member_path(hint).ok()?;
    let mut components = relative.components();
    let (Some(Component::Normal(_)), None) = (components.next(), components.next()) else {
        return None;
    };

    let candidate = dest.join(relative);
    let metadata = fs::symlink_metadata(&candidate).ok()?;
    metadata.is_dir().then_some(candidate)
}

fn score_dir(dir: &Path, children: &[String], ecosystem: Ecosystem) -> u32 {
    let mut score = 0;
    for candidate in Ecosystem::ALL {
        let weight = if candidate == ecosystem {
            OWN_MANIFEST_WEIGHT
        } else {
            OTHER_MANIFEST_WEIGHT
        };
        for manifest in candidate.manifest_files() {
            if dir.join(manifest).is_file() {
                score += weight;
            }
        }
    }

    if score > 0 && children.iter().any(|c| SOURCE_DIRS.contains(&c.as_str())) {
        score += SOURCE_DIR_BONUS;
    }
    score
}
