//! Resource-only classpath existence probe (spec §4.8).
//!
//! Security invariant: the formatter never loads or executes target
//! language code. Every question this probe answers is resolved by
//! checking for a compiled class *resource* on disk
//! (`qualified.Name` -> `qualified/Name.class`), never by classloading.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

/// A read-only, resource-based scanner over one or more classpath roots.
///
/// Constructed once per batch and closed at the end; `close` is
/// idempotent under concurrent callers via a CAS-guarded flag.
pub struct ClasspathProbe {
    roots: Vec<PathBuf>,
    closed: AtomicBool,
}

impl ClasspathProbe {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            closed: AtomicBool::new(false),
        }
    }

    /// A probe with no classpath roots configured; every query is a fast
    /// `false`/`None`/empty without touching the filesystem.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    fn resource_path(&self, qualified_name: &str) -> PathBuf {
        PathBuf::from(format!("{}.class", qualified_name.replace('.', "/")))
    }

    pub fn class_exists(&self, qualified_name: &str) -> bool {
        if self.is_closed() || self.roots.is_empty() {
            return false;
        }
        let resource = self.resource_path(qualified_name);
        self.roots.iter().any(|root| root.join(&resource).is_file())
    }

    pub fn class_last_modified(&self, qualified_name: &str) -> Option<SystemTime> {
        if self.is_closed() {
            return None;
        }
        let resource = self.resource_path(qualified_name);
        self.roots
            .iter()
            .map(|root| root.join(&resource))
            .find_map(|path| std::fs::metadata(&path).ok()?.modified().ok())
    }

    pub fn list_package_classes(&self, package_name: &str) -> HashSet<String> {
        let mut classes = HashSet::new();
        if self.is_closed() {
            return classes;
        }
        let package_dir = PathBuf::from(package_name.replace('.', "/"));
        for root in &self.roots {
            let dir = root.join(&package_dir);
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                if let Some(name) = class_file_name(&entry.path()) {
                    classes.insert(format!("{package_name}.{name}"));
                }
            }
        }
        classes
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Idempotent: a second call observes the flag already set and is a
    /// no-op, even under concurrent callers.
    pub fn close(&self) {
        self.closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok();
    }
}

fn class_file_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    name.strip_suffix(".class").map(String::from)
}

/// A cache of package listings, to avoid re-scanning the same package
/// directory for every import-organization wildcard expansion within one
/// batch. Keyed by package name; not shared across batches.
#[derive(Default)]
pub struct PackageListingCache {
    cache: std::sync::Mutex<HashMap<String, HashSet<String>>>,
}

impl PackageListingCache {
    pub fn get_or_scan(&self, probe: &ClasspathProbe, package_name: &str) -> HashSet<String> {
        let mut cache = self.cache.lock().expect("cache mutex is never poisoned by panics here");
        cache
            .entry(package_name.to_string())
            .or_insert_with(|| probe.list_package_classes(package_name))
            .clone()
    }
}
