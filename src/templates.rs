//! Precompiled template cache.
//!
//! Every `*.page.html` file in the template directory is compiled at startup
//! together with all `*.layout.html` and `*.partial.html` files into its own
//! [`Tera`] set, keyed by the page's file name. Nothing is parsed per request
//! and a broken template stops the process before it serves anything.
//!
//! # Example
//!
//! ```rust,no_run
//! use courtside::templates::{Helpers, TemplateCache};
//!
//! let cache = TemplateCache::build("./ui/html", &Helpers::standard())?;
//! assert!(cache.contains("home.page.html"));
//! # Ok::<(), courtside::templates::TemplateError>(())
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::forms::Form;
use crate::models::{TennisSession, User};

const PAGE_SUFFIX: &str = ".page.html";
const LAYOUT_SUFFIX: &str = ".layout.html";
const PARTIAL_SUFFIX: &str = ".partial.html";

/// Error type for template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("the template {0} does not exist")]
    NotFound(String),

    #[error("failed to compile template {name}: {source}")]
    Compile {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("failed to render template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("failed to read template directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Signature shared by every template filter.
pub type FilterFn = fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>;

/// The table of helper filters registered into every template set.
///
/// Assembled once before [`TemplateCache::build`] and only read afterwards.
#[derive(Debug, Clone)]
pub struct Helpers {
    filters: Vec<(&'static str, FilterFn)>,
}

impl Helpers {
    /// The filters every page can use: `human_date`.
    pub fn standard() -> Self {
        Self {
            filters: vec![("human_date", human_date_filter as FilterFn)],
        }
    }

    pub fn with_filter(mut self, name: &'static str, filter: FilterFn) -> Self {
        self.filters.push((name, filter));
        self
    }

    fn register(&self, tera: &mut Tera) {
        for (name, filter) in &self.filters {
            tera.register_filter(name, *filter);
        }
    }
}

impl Default for Helpers {
    fn default() -> Self {
        Self::standard()
    }
}

/// Formats a timestamp as `10 Mar 2020 at 09:00`, in UTC.
pub fn human_date(t: DateTime<Utc>) -> String {
    t.format("%d %b %Y at %H:%M").to_string()
}

fn human_date_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::Null => Ok(Value::String(String::new())),
        Value::String(s) => {
            let parsed = DateTime::parse_from_rfc3339(s)
                .map_err(|e| tera::Error::msg(format!("human_date: {s:?} is not a timestamp: {e}")))?;
            Ok(Value::String(human_date(parsed.with_timezone(&Utc))))
        }
        other => Err(tera::Error::msg(format!(
            "human_date: expected a timestamp string, got {other}"
        ))),
    }
}

/// Page-specific data handed to a template.
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    pub tennis_session: Option<TennisSession>,
    pub tennis_sessions: Vec<TennisSession>,
    pub form: Option<Form>,
}

/// Values every page receives in addition to its [`TemplateData`].
#[derive(Debug, Serialize)]
pub struct DefaultData {
    pub current_year: i32,
    pub csrf_token: String,
    pub authenticated_user: Option<User>,
    pub flash: Option<String>,
}

/// Compiled template sets, keyed by page name.
///
/// Immutable after [`TemplateCache::build`]; share it behind an `Arc`.
#[derive(Debug)]
pub struct TemplateCache {
    sets: HashMap<String, Tera>,
}

impl TemplateCache {
    /// Compiles every page in `dir` with all layouts and partials.
    pub fn build(dir: impl AsRef<Path>, helpers: &Helpers) -> Result<Self, TemplateError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| TemplateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut pages = Vec::new();
        let mut shared = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| TemplateError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
                continue;
            };
            if name.ends_with(PAGE_SUFFIX) {
                pages.push((path, name));
            } else if name.ends_with(LAYOUT_SUFFIX) || name.ends_with(PARTIAL_SUFFIX) {
                shared.push((path, name));
            }
        }
        pages.sort_by(|a, b| a.1.cmp(&b.1));
        shared.sort_by(|a, b| a.1.cmp(&b.1));

        let mut sets = HashMap::with_capacity(pages.len());
        for (path, name) in pages {
            let mut tera = Tera::default();
            helpers.register(&mut tera);

            let mut files: Vec<(PathBuf, Option<String>)> = Vec::with_capacity(shared.len() + 1);
            files.push((path, Some(name.clone())));
            files.extend(shared.iter().map(|(p, n)| (p.clone(), Some(n.clone()))));

            tera.add_template_files(files)
                .map_err(|source| TemplateError::Compile {
                    name: name.clone(),
                    source,
                })?;

            debug!(template = %name, "compiled template set");
            sets.insert(name, tera);
        }

        info!(pages = sets.len(), dir = %dir.display(), "template cache built");
        Ok(Self { sets })
    }

    /// Page names in the cache, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    /// Renders `name` into a fresh buffer.
    ///
    /// Output is only returned when rendering finished; a failure part-way
    /// through yields an error and nothing else.
    pub fn render(&self, name: &str, context: &Context) -> Result<String, TemplateError> {
        let tera = self
            .sets
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_owned()))?;
        tera.render(name, context)
            .map_err(|source| TemplateError::Render {
                name: name.to_owned(),
                source,
            })
    }

    /// Renders a page with its data merged over the per-request defaults.
    pub fn render_page(
        &self,
        name: &str,
        data: &TemplateData,
        defaults: &DefaultData,
    ) -> Result<String, TemplateError> {
        let mut context = Context::from_serialize(data).map_err(|source| TemplateError::Render {
            name: name.to_owned(),
            source,
        })?;
        context.insert("current_year", &defaults.current_year);
        context.insert("csrf_token", &defaults.csrf_token);
        context.insert("authenticated_user", &defaults.authenticated_user);
        context.insert("flash", &defaults.flash);
        self.render(name, &context)
    }
}
