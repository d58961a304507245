use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use scaffold_core::types::Recipe;
use scaffold_core::{parse_recipe_str, DocumentFormat, ParseError};
use tracing::debug;
use url::Url;

use crate::composition::identifier::{classify, RecipeSource};
use crate::composition::{FetchError, RecipeFetcher};

pub const PACKAGE_PATH_ENV: &str = "SCAFFOLD_PACKAGE_PATH";

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub cache_ttl: Duration,
    /// Searched in order for package references.
    pub package_dirs: Vec<PathBuf>,
    /// File names that mark a directory as a recipe.
    pub recipe_file_names: Vec<String>,
    pub github_raw_base: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            package_dirs: package_dirs_from_env(),
            recipe_file_names: vec![
                "recipe.yml".to_string(),
                "recipe.yaml".to_string(),
                "recipe.json".to_string(),
            ],
            github_raw_base: "https://raw.githubusercontent.com".to_string(),
        }
    }
}

/// Directories listed in `SCAFFOLD_PACKAGE_PATH`, `:`-separated.
pub fn package_dirs_from_env() -> Vec<PathBuf> {
    std::env::var_os(PACKAGE_PATH_ENV)
        .map(|v| std::env::split_paths(&v).filter(|p| !p.as_os_str().is_empty()).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionKind {
    Local,
    Package,
    Url,
    Repository,
}

#[derive(Debug, Clone)]
pub struct RecipeResolution {
    pub recipe: Recipe,
    pub kind: ResolutionKind,
    /// Canonical file path or URL; identifies the recipe on the call stack.
    pub location: String,
    /// Directory of the recipe file; `None` for remote recipes.
    pub base_dir: Option<PathBuf>,
    pub modified: Option<SystemTime>,
    pub cache_hit: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid recipe identifier '{identifier}': {message}")]
    InvalidIdentifier { identifier: String, message: String },
    #[error("recipe '{identifier}' not found (tried: {})", tried.join(", "))]
    NotFound {
        identifier: String,
        tried: Vec<String>,
    },
    #[error("failed to read recipe {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse recipe {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: ParseError,
    },
    #[error("failed to fetch recipe {location}: {source}")]
    Fetch {
        location: String,
        #[source]
        source: FetchError,
    },
}

struct CachedResolution {
    resolution: RecipeResolution,
    cached_at: Instant,
}

/// Turns recipe identifiers into parsed recipes. One resolver per top-level run.
pub struct RecipeResolver {
    config: ResolverConfig,
    fetcher: Arc<dyn RecipeFetcher>,
    cache: Mutex<HashMap<(String, PathBuf, PathBuf), CachedResolution>>,
}

impl RecipeResolver {
    pub fn new(config: ResolverConfig, fetcher: Arc<dyn RecipeFetcher>) -> Self {
        Self {
            config,
            fetcher,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `identifier` as seen from a recipe in `base_dir`.
    pub async fn resolve(
        &self,
        identifier: &str,
        base_dir: &Path,
        project_root: &Path,
    ) -> Result<RecipeResolution, ResolveError> {
        let key = (
            identifier.to_string(),
            project_root.to_path_buf(),
            base_dir.to_path_buf(),
        );
        if let Some(hit) = self.cached(&key) {
            debug!(%identifier, location = %hit.location, "recipe cache hit");
            return Ok(hit);
        }

        let resolution = match classify(identifier)? {
            RecipeSource::Url(url) => self.fetch(&url, ResolutionKind::Url).await?,
            src @ RecipeSource::Repository { .. } => {
                let url = src
                    .repository_url(&self.config.github_raw_base)
                    .ok_or_else(|| ResolveError::InvalidIdentifier {
                        identifier: identifier.to_string(),
                        message: "not a repository reference".to_string(),
                    })?
                    .map_err(|e| ResolveError::InvalidIdentifier {
                        identifier: identifier.to_string(),
                        message: e.to_string(),
                    })?;
                self.fetch(&url, ResolutionKind::Repository).await?
            }
            RecipeSource::Local(path) => {
                let candidates = local_candidates(&path, base_dir, project_root);
                self.load_first(identifier, &candidates, ResolutionKind::Local)?
            }
            RecipeSource::Package { name, sub } => {
                let candidates = self.package_candidates(&name, sub.as_deref(), project_root);
                self.load_first(identifier, &candidates, ResolutionKind::Package)?
            }
            RecipeSource::Bare(name) => {
                let mut candidates = Vec::new();
                for dir in [base_dir, project_root] {
                    for ext in ["yml", "yaml", "json"] {
                        candidates.push(dir.join(format!("{name}.{ext}")));
                    }
                    for file in &self.config.recipe_file_names {
                        candidates.push(dir.join(&name).join(file));
                    }
                }
                match self.load_first(identifier, &candidates, ResolutionKind::Local) {
                    Err(ResolveError::NotFound { mut tried, .. }) => {
                        let pkg = self.package_candidates(&name, None, project_root);
                        match self.load_first(identifier, &pkg, ResolutionKind::Package) {
                            Err(ResolveError::NotFound { tried: more, .. }) => {
                                tried.extend(more);
                                return Err(ResolveError::NotFound {
                                    identifier: identifier.to_string(),
                                    tried,
                                });
                            }
                            other => other?,
                        }
                    }
                    other => other?,
                }
            }
        };

        debug!(%identifier, location = %resolution.location, kind = ?resolution.kind, "resolved recipe");
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                key,
                CachedResolution {
                    resolution: resolution.clone(),
                    cached_at: Instant::now(),
                },
            );
        Ok(resolution)
    }

    pub fn clear(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn cached(&self, key: &(String, PathBuf, PathBuf)) -> Option<RecipeResolution> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let entry = cache.get(key)?;
        let fresh = entry.cached_at.elapsed() < self.config.cache_ttl
            && match entry.resolution.kind {
                ResolutionKind::Local | ResolutionKind::Package => {
                    modified_time(Path::new(&entry.resolution.location)) == entry.resolution.modified
                }
                ResolutionKind::Url | ResolutionKind::Repository => true,
            };
        if !fresh {
            cache.remove(key);
            return None;
        }
        let mut hit = entry.resolution.clone();
        hit.cache_hit = true;
        Some(hit)
    }

    fn package_candidates(&self, name: &str, sub: Option<&str>, project_root: &Path) -> Vec<PathBuf> {
        let mut dirs = self.config.package_dirs.clone();
        dirs.push(project_root.join("node_modules"));
        let mut out = Vec::new();
        for dir in dirs {
            let pkg = dir.join(name);
            match sub {
                Some(sub) => {
                    for ext in ["yml", "yaml", "json"] {
                        out.push(pkg.join("recipes").join(format!("{sub}.{ext}")));
                    }
                }
                None => {
                    for file in &self.config.recipe_file_names {
                        out.push(pkg.join(file));
                    }
                }
            }
        }
        out
    }

    fn load_first(
        &self,
        identifier: &str,
        candidates: &[PathBuf],
        kind: ResolutionKind,
    ) -> Result<RecipeResolution, ResolveError> {
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            return Err(ResolveError::NotFound {
                identifier: identifier.to_string(),
                tried: candidates.iter().map(|p| p.display().to_string()).collect(),
            });
        };
        let path = path.canonicalize().unwrap_or_else(|_| path.clone());
        let location = path.display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|source| ResolveError::Io {
            location: location.clone(),
            source,
        })?;
        let parsed = parse_recipe_str(&content, DocumentFormat::from_path(&path)).map_err(|source| {
            ResolveError::Parse {
                location: location.clone(),
                source,
            }
        })?;
        Ok(RecipeResolution {
            recipe: parsed.recipe,
            kind,
            base_dir: path.parent().map(Path::to_path_buf),
            modified: modified_time(&path),
            location,
            cache_hit: false,
        })
    }

    async fn fetch(&self, url: &Url, kind: ResolutionKind) -> Result<RecipeResolution, ResolveError> {
        let location = url.to_string();
        let content = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|source| ResolveError::Fetch {
                location: location.clone(),
                source,
            })?;
        let parsed = parse_recipe_str(&content, DocumentFormat::from_path(Path::new(url.path())))
            .map_err(|source| ResolveError::Parse {
                location: location.clone(),
                source,
            })?;
        Ok(RecipeResolution {
            recipe: parsed.recipe,
            kind,
            location,
            base_dir: None,
            modified: None,
            cache_hit: false,
        })
    }
}

fn local_candidates(path: &str, base_dir: &Path, project_root: &Path) -> Vec<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        return dirs::home_dir().map(|h| vec![h.join(rest)]).unwrap_or_default();
    }
    let p = Path::new(path);
    if p.is_absolute() {
        return vec![p.to_path_buf()];
    }
    let mut out = vec![base_dir.join(p)];
    if base_dir != project_root {
        out.push(project_root.join(p));
    }
    out
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
