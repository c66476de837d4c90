//! Marker scan: decides which declarations are of interest
//!
//! A declaration is interesting when it carries
//! `__attribute__((annotate("generate_cinspect")))`, or the marker macro
//! while analysis mode is on. In an ordinary build the macro expands to
//! nothing, so with analysis mode off it is ignored and only explicit
//! annotations count.

use crate::config::Config;
use crate::parser::ast::{Attribute, DeclId, TranslationUnit};
use log::{debug, trace};
use rustc_hash::FxHashSet;

/// The subset of [`Config`] the scan looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerConfig {
    pub analysis_mode: bool,
    pub annotation: String,
    pub macro_name: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        MarkerConfig::from(&Config::default())
    }
}

impl From<&Config> for MarkerConfig {
    fn from(config: &Config) -> Self {
        Self {
            analysis_mode: config.analysis_mode,
            annotation: config.marker_annotation.clone(),
            macro_name: config.marker_macro.clone(),
        }
    }
}

impl MarkerConfig {
    pub fn is_marker(&self, attribute: &Attribute) -> bool {
        match attribute {
            Attribute::Annotate(value) => *value == self.annotation,
            Attribute::MarkerMacro(name) => self.analysis_mode && *name == self.macro_name,
            Attribute::Other(_) => false,
        }
    }
}

/// Explicit set of declarations the extractor should reflect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestSet {
    decls: FxHashSet<DeclId>,
}

impl InterestSet {
    pub fn contains(&self, id: DeclId) -> bool {
        self.decls.contains(&id)
    }

    pub fn insert(&mut self, id: DeclId) -> bool {
        self.decls.insert(id)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl FromIterator<DeclId> for InterestSet {
    fn from_iter<I: IntoIterator<Item = DeclId>>(iter: I) -> Self {
        Self {
            decls: iter.into_iter().collect(),
        }
    }
}

/// Collect every declaration in `unit` that carries a marker
pub fn scan(unit: &TranslationUnit, config: &MarkerConfig) -> InterestSet {
    let interest: InterestSet = unit
        .cursors()
        .filter(|cursor| cursor.attributes().iter().any(|a| config.is_marker(a)))
        .inspect(|cursor| {
            trace!(
                "marked declaration '{}' at {}",
                cursor.spelling().unwrap_or("<anonymous>"),
                cursor.location()
            )
        })
        .map(|cursor| cursor.id())
        .collect();

    debug!(
        "{}: {} marked declaration(s) (analysis mode {})",
        unit.path().display(),
        interest.len(),
        if config.analysis_mode { "on" } else { "off" }
    );
    interest
}
