//! Read-only catalog of packages and the tools they export.
//!
//! The catalog is assembled once at startup from the built-in tool packages
//! and an optional TOML file:
//!
//! ```toml
//! [[packages]]
//! name = "@acme/pdf-tools"
//! version = "1.2.0"
//!
//! [[packages.tools]]
//! export_name = "extractText"
//! description = "Extract the text layer of a PDF"
//! parameters = [{ name = "url", type = "string", description = "PDF URL", required = true }]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use toolpipe_tools::{ToolPackage, ToolRegistry};
use tracing::{debug, info};

use super::definition::tool_key;
use crate::domain::tool::{NpmMetadata, Package, Parameter, Returns, Tool, ToolHealth};

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("package '{0}' is registered more than once")]
    DuplicatePackage(String),
    #[error("package '{0}' declares no tools")]
    NoTools(String),
}

impl CatalogError {
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Io { path, .. } => {
                format!("Catalog file {} could not be read.", path.display())
            }
            CatalogError::Parse { path, source } => {
                format!("Catalog file {} is invalid: {source}", path.display())
            }
            CatalogError::DuplicatePackage(name) => {
                format!("Package '{name}' appears more than once in the catalog.")
            }
            CatalogError::NoTools(name) => format!("Package '{name}' has no tools."),
        }
    }
}

/// One page of a listing. `page` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.limit)
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}

/// Slices `items` to the requested page; out-of-range pages are empty.
pub fn paginate<T: Clone>(items: &[T], page: Option<usize>, limit: Option<usize>) -> Page<T> {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let start = (page - 1).saturating_mul(limit);
    let slice = items.iter().skip(start).take(limit).cloned().collect();
    Page {
        items: slice,
        page,
        limit,
        total: items.len(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    packages: Vec<Package>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate names and packages without tools.
    pub fn new(packages: Vec<Package>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(packages.len());
        for (position, package) in packages.iter().enumerate() {
            if package.tools.is_empty() {
                return Err(CatalogError::NoTools(package.name.clone()));
            }
            if index.insert(package.name.clone(), position).is_some() {
                return Err(CatalogError::DuplicatePackage(package.name.clone()));
            }
        }
        Ok(Self { packages, index })
    }

    /// Built-in packages followed by the entries of `file`, if any.
    pub fn load(registry: &ToolRegistry, file: Option<&Path>) -> Result<Self, CatalogError> {
        let mut packages: Vec<Package> = registry.iter().map(|p| describe(p.as_ref())).collect();
        if let Some(path) = file {
            let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let extra = parse_catalog(&content, path)?;
            info!(
                path = %path.display(),
                packages = extra.len(),
                "Loaded catalog file"
            );
            packages.extend(extra);
        }
        let catalog = Self::new(packages)?;
        debug!(
            packages = catalog.packages.len(),
            tools = catalog.tool_count(),
            "Catalog ready"
        );
        Ok(catalog)
    }

    pub fn from_registry(registry: &ToolRegistry) -> Result<Self, CatalogError> {
        Self::load(registry, None)
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.index.get(name).map(|&i| &self.packages[i])
    }

    /// Resolves a tool. Without an export, the `default` export wins, then
    /// the package's first tool.
    pub fn find(&self, package: &str, export: Option<&str>) -> Option<(&Package, &Tool)> {
        let package = self.package(package)?;
        let tool = match export {
            Some(export) => package.tools.iter().find(|t| t.export_name == export),
            None => package
                .tools
                .iter()
                .find(|t| t.export_name == "default")
                .or_else(|| package.tools.first()),
        }?;
        Some((package, tool))
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Every tool with its owning package, in catalog order.
    pub fn tools(&self) -> Vec<(&Package, &Tool)> {
        self.packages
            .iter()
            .flat_map(|p| p.tools.iter().map(move |t| (p, t)))
            .collect()
    }

    pub fn tool_count(&self) -> usize {
        self.packages.iter().map(|p| p.tools.len()).sum()
    }

    pub fn page(&self, page: Option<usize>, limit: Option<usize>) -> Page<Package> {
        paginate(&self.packages, page, limit)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Catalog record of a built-in package.
pub fn describe(package: &dyn ToolPackage) -> Package {
    let tool = Tool {
        id: tool_key(package.name(), package.export_name()),
        export_name: package.export_name().to_string(),
        description: package.description().to_string(),
        parameters: package.parameters().into_iter().map(Parameter::from).collect(),
        returns: package.returns().map(Returns::from),
        input_schema: package.input_schema(),
        health: ToolHealth::default(),
        quality_score: None,
    };
    Package {
        name: package.name().to_string(),
        version: package.version().to_string(),
        description: Some(package.description().to_string()),
        npm: NpmMetadata::default(),
        tools: vec![tool],
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    packages: Vec<RawPackage>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    version: String,
    description: Option<String>,
    #[serde(default)]
    downloads: u64,
    #[serde(default)]
    stars: u64,
    license: Option<String>,
    readme: Option<String>,
    #[serde(default)]
    tools: Vec<RawTool>,
}

#[derive(Debug, Deserialize)]
struct RawTool {
    id: Option<String>,
    export_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    parameters: Vec<Parameter>,
    returns: Option<Returns>,
    input_schema: Option<Value>,
    #[serde(default)]
    health: ToolHealth,
    quality_score: Option<f64>,
}

/// Parses catalog TOML; `origin` is only used in error messages.
pub fn parse_catalog(content: &str, origin: &Path) -> Result<Vec<Package>, CatalogError> {
    let raw: RawCatalog = toml::from_str(content).map_err(|source| CatalogError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;
    Ok(raw.packages.into_iter().map(Package::from).collect())
}

impl From<RawPackage> for Package {
    fn from(raw: RawPackage) -> Self {
        let tools = raw
            .tools
            .into_iter()
            .map(|tool| Tool {
                id: tool
                    .id
                    .unwrap_or_else(|| tool_key(&raw.name, &tool.export_name)),
                export_name: tool.export_name,
                description: tool.description,
                parameters: tool.parameters,
                returns: tool.returns,
                input_schema: tool.input_schema,
                health: tool.health,
                quality_score: tool.quality_score,
            })
            .collect();
        Package {
            name: raw.name,
            version: raw.version,
            description: raw.description,
            npm: NpmMetadata {
                downloads: raw.downloads,
                stars: raw.stars,
                readme: raw.readme,
                license: raw.license,
            },
            tools,
        }
    }
}
