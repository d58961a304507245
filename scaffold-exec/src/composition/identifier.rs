use url::Url;

use crate::composition::ResolveError;

/// Where a recipe identifier points, before anything is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeSource {
    Url(Url),
    /// Explicit path: `./`, `../`, `/`, `~/` or a recipe file extension.
    Local(String),
    /// `pkg:name[/sub]` or `@scope/name[/sub]`.
    Package { name: String, sub: Option<String> },
    /// `github:owner/repo[/path][@ref]`.
    Repository {
        owner: String,
        repo: String,
        path: Option<String>,
        reference: Option<String>,
    },
    /// Anything else: tried as a local name, then as a package.
    Bare(String),
}

const RECIPE_EXTENSIONS: [&str; 3] = [".yml", ".yaml", ".json"];

pub fn has_recipe_extension(s: &str) -> bool {
    RECIPE_EXTENSIONS.iter().any(|ext| s.ends_with(ext))
}

pub fn classify(identifier: &str) -> Result<RecipeSource, ResolveError> {
    let id = identifier.trim();
    if id.is_empty() {
        return Err(ResolveError::InvalidIdentifier {
            identifier: identifier.to_string(),
            message: "empty identifier".to_string(),
        });
    }

    if id.starts_with("http://") || id.starts_with("https://") {
        let url = Url::parse(id).map_err(|e| ResolveError::InvalidIdentifier {
            identifier: identifier.to_string(),
            message: e.to_string(),
        })?;
        return Ok(RecipeSource::Url(url));
    }

    if let Some(rest) = id.strip_prefix("github:") {
        return parse_repository(identifier, rest);
    }

    if let Some(rest) = id.strip_prefix("pkg:") {
        return parse_package(identifier, rest);
    }
    if id.starts_with('@') {
        return parse_package(identifier, id);
    }

    if id.starts_with("./")
        || id.starts_with("../")
        || id.starts_with('/')
        || id.starts_with("~/")
        || has_recipe_extension(id)
    {
        return Ok(RecipeSource::Local(id.to_string()));
    }

    Ok(RecipeSource::Bare(id.to_string()))
}

fn parse_package(identifier: &str, rest: &str) -> Result<RecipeSource, ResolveError> {
    let mut parts = rest.split('/').filter(|p| !p.is_empty());
    let name = match parts.next() {
        Some(scope) if scope.starts_with('@') => match parts.next() {
            Some(n) => format!("{scope}/{n}"),
            None => {
                return Err(ResolveError::InvalidIdentifier {
                    identifier: identifier.to_string(),
                    message: "scoped package needs a name after the scope".to_string(),
                })
            }
        },
        Some(n) => n.to_string(),
        None => {
            return Err(ResolveError::InvalidIdentifier {
                identifier: identifier.to_string(),
                message: "missing package name".to_string(),
            })
        }
    };
    let sub: Vec<&str> = parts.collect();
    Ok(RecipeSource::Package {
        name,
        sub: (!sub.is_empty()).then(|| sub.join("/")),
    })
}

fn parse_repository(identifier: &str, rest: &str) -> Result<RecipeSource, ResolveError> {
    let (spec, reference) = match rest.rsplit_once('@') {
        Some((s, r)) if !r.is_empty() => (s, Some(r.to_string())),
        _ => (rest, None),
    };
    let mut parts = spec.split('/').filter(|p| !p.is_empty());
    let (Some(owner), Some(repo)) = (parts.next(), parts.next()) else {
        return Err(ResolveError::InvalidIdentifier {
            identifier: identifier.to_string(),
            message: "expected github:owner/repo[/path][@ref]".to_string(),
        });
    };
    let path: Vec<&str> = parts.collect();
    Ok(RecipeSource::Repository {
        owner: owner.to_string(),
        repo: repo.to_string(),
        path: (!path.is_empty()).then(|| path.join("/")),
        reference,
    })
}

impl RecipeSource {
    /// Raw-content URL for a repository reference.
    pub fn repository_url(&self, raw_base: &str) -> Option<Result<Url, url::ParseError>> {
        let RecipeSource::Repository {
            owner,
            repo,
            path,
            reference,
        } = self
        else {
            return None;
        };
        let file = match path {
            Some(p) if has_recipe_extension(p) => p.clone(),
            Some(p) => format!("{p}/recipe.yml"),
            None => "recipe.yml".to_string(),
        };
        let reference = reference.as_deref().unwrap_or("main");
        Some(Url::parse(&format!(
            "{}/{owner}/{repo}/{reference}/{file}",
            raw_base.trim_end_matches('/')
        )))
    }
}
