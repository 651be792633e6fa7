//! External template inclusion: whole files, narrowed sections/lines/
//! paragraphs, variable substitution, and library lookups.

use crate::error::ResolveError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How to narrow a template file before returning its content.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateDirective {
    None,
    Section(String),
    Line(usize),
    Paragraph(usize),
    /// `VARS(k=v,...)` pairs; values may themselves be placeholders and
    /// are resolved by the caller before inclusion.
    Vars(Vec<(String, String)>),
}

/// A parsed `TEMPLATE!` argument.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateReference {
    File {
        path: PathBuf,
        directive: TemplateDirective,
    },
    Library {
        name: String,
        version: String,
    },
}

impl TemplateReference {
    /// Parse the argument string after `TEMPLATE`, split on the grammar
    /// separator. Unknown directives are ignored and the whole file is
    /// returned, matching older documents that carried stray arguments.
    pub fn parse(args: &str, separator: char) -> Result<Self, ResolveError> {
        let parts: Vec<&str> = args.split(separator).collect();
        let first = parts
            .first()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ResolveError::Malformed("TEMPLATE reference".to_string()))?;

        if first.eq_ignore_ascii_case("LIBRARY") {
            let name = parts
                .get(1)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| ResolveError::Malformed("library template reference".to_string()))?;
            let version = parts.get(2).map(|s| s.trim()).unwrap_or("DEFAULT");
            return Ok(TemplateReference::Library {
                name: name.to_string(),
                version: version.to_string(),
            });
        }

        let rest = parts[1..].join(&separator.to_string());
        Ok(TemplateReference::File {
            path: PathBuf::from(first),
            directive: Self::parse_directive(&rest)?,
        })
    }

    fn parse_directive(rest: &str) -> Result<TemplateDirective, ResolveError> {
        let rest = rest.trim();
        if rest.is_empty() {
            return Ok(TemplateDirective::None);
        }

        if let Some(name) = rest.strip_prefix("section=") {
            let name = name.split(',').next().unwrap_or(name).trim();
            return Ok(TemplateDirective::Section(name.to_string()));
        }
        if let Some(n) = rest.strip_prefix("line=") {
            let n: usize = n
                .split(',')
                .next()
                .unwrap_or(n)
                .trim()
                .parse()
                .map_err(|_| ResolveError::Malformed(format!("line number in {rest}")))?;
            return Ok(TemplateDirective::Line(n));
        }
        if let Some(n) = rest.strip_prefix("paragraph=") {
            let n: usize = n
                .split(',')
                .next()
                .unwrap_or(n)
                .trim()
                .parse()
                .map_err(|_| ResolveError::Malformed(format!("paragraph number in {rest}")))?;
            return Ok(TemplateDirective::Paragraph(n));
        }
        if let Some(inner) = rest.strip_prefix("VARS(") {
            let inner = inner
                .split(')')
                .next()
                .ok_or_else(|| ResolveError::Malformed(format!("VARS in {rest}")))?;
            let pairs = inner
                .split(',')
                .filter_map(|pair| {
                    pair.split_once('=')
                        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                })
                .collect();
            return Ok(TemplateDirective::Vars(pairs));
        }

        debug!(directive = rest, "ignoring unknown template directive");
        Ok(TemplateDirective::None)
    }
}

/// Predefined template catalog: resolves `LIBRARY` references by name and
/// version. External collaborator; [`MemoryCatalog`] is the shipped
/// implementation.
pub trait TemplateCatalog {
    fn lookup(&self, name: &str, version: &str) -> Option<String>;
}

/// Document-format collaborator that knows how to extract a named section
/// from a template file.
pub trait SectionLocator {
    fn section(&self, path: &Path, name: &str) -> Option<String>;
}

/// In-memory template catalog.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    templates: HashMap<(String, String), String>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, version: &str, content: &str) {
        self.templates
            .insert((name.to_string(), version.to_string()), content.to_string());
    }
}

impl TemplateCatalog for MemoryCatalog {
    fn lookup(&self, name: &str, version: &str) -> Option<String> {
        self.templates
            .get(&(name.to_string(), version.to_string()))
            .cloned()
    }
}

/// Loads external text resources for `TEMPLATE!` placeholders.
#[derive(Default)]
pub struct TemplateIncluder<'a> {
    catalog: Option<&'a dyn TemplateCatalog>,
    sections: Option<&'a dyn SectionLocator>,
}

impl<'a> TemplateIncluder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog: &'a dyn TemplateCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_sections(mut self, sections: &'a dyn SectionLocator) -> Self {
        self.sections = Some(sections);
        self
    }

    /// Resolve a template reference to its text. Failures are
    /// diagnostics, never panics or aborts.
    pub fn include(&self, reference: &TemplateReference) -> Result<String, ResolveError> {
        match reference {
            TemplateReference::Library { name, version } => self
                .catalog
                .and_then(|c| c.lookup(name, version))
                .ok_or_else(|| ResolveError::UnknownTemplate {
                    name: name.clone(),
                    version: version.clone(),
                }),
            TemplateReference::File { path, directive } => {
                let content = std::fs::read_to_string(path)
                    .map_err(|_| ResolveError::MissingFile(path.display().to_string()))?;
                debug!(path = %path.display(), ?directive, "included template");
                self.apply_directive(path, &content, directive)
            }
        }
    }

    fn apply_directive(
        &self,
        path: &Path,
        content: &str,
        directive: &TemplateDirective,
    ) -> Result<String, ResolveError> {
        match directive {
            TemplateDirective::None => Ok(content.to_string()),
            TemplateDirective::Section(name) => self
                .sections
                .and_then(|s| s.section(path, name))
                .ok_or_else(|| ResolveError::SectionNotFound {
                    section: name.clone(),
                    file: path.display().to_string(),
                }),
            TemplateDirective::Line(n) => content
                .lines()
                .nth(n.saturating_sub(1))
                .filter(|_| *n >= 1)
                .map(str::to_string)
                .ok_or_else(|| {
                    ResolveError::NoData(format!("line {} of {}", n, path.display()))
                }),
            TemplateDirective::Paragraph(n) => content
                .split("\n\n")
                .nth(n.saturating_sub(1))
                .filter(|_| *n >= 1)
                .map(str::to_string)
                .ok_or_else(|| {
                    ResolveError::NoData(format!("paragraph {} of {}", n, path.display()))
                }),
            TemplateDirective::Vars(pairs) => {
                let mut result = content.to_string();
                for (key, value) in pairs {
                    result = result.replace(&format!("{{{key}}}"), value);
                }
                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_reference() {
        let r = TemplateReference::parse("notes.txt", '!').unwrap();
        assert_eq!(
            r,
            TemplateReference::File {
                path: PathBuf::from("notes.txt"),
                directive: TemplateDirective::None,
            }
        );
    }

    #[test]
    fn test_parse_directives() {
        let r = TemplateReference::parse("notes.txt!line=5", '!').unwrap();
        assert!(matches!(
            r,
            TemplateReference::File { directive: TemplateDirective::Line(5), .. }
        ));

        let r = TemplateReference::parse("notes.txt!VARS(name=Ada, year=1842)", '!').unwrap();
        let TemplateReference::File { directive: TemplateDirective::Vars(pairs), .. } = r else {
            panic!("expected VARS directive");
        };
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "Ada".to_string()),
                ("year".to_string(), "1842".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_library_reference() {
        let r = TemplateReference::parse("LIBRARY!greeting!v2", '!').unwrap();
        assert_eq!(
            r,
            TemplateReference::Library {
                name: "greeting".to_string(),
                version: "v2".to_string(),
            }
        );
        // Version defaults.
        let r = TemplateReference::parse("library!greeting", '!').unwrap();
        assert_eq!(
            r,
            TemplateReference::Library {
                name: "greeting".to_string(),
                version: "DEFAULT".to_string(),
            }
        );
    }

    #[test]
    fn test_library_lookup_miss_is_diagnostic() {
        let catalog = MemoryCatalog::new();
        let includer = TemplateIncluder::new().with_catalog(&catalog);
        let r = TemplateReference::Library {
            name: "missing".to_string(),
            version: "DEFAULT".to_string(),
        };
        assert_eq!(
            includer.include(&r).unwrap_err().to_string(),
            "[Template not found in library: missing (version: DEFAULT)]"
        );
    }
}
