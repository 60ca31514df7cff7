//! Singleton registry: three name-keyed scopes of cached units.

use std::collections::HashMap;

use stocklab_shared::{Result, StocklabError, UnitKind};

use crate::logging::Logger;
use crate::unit::{Crawler, CrawlerRef, MetaModule, Module, ModuleRef, Shared, Unit, share};

struct Entry<T: ?Sized> {
    unit: Shared<T>,
    logger: Logger,
}

/// Insertion-ordered name → unit mapping.
struct Scope<T: ?Sized> {
    order: Vec<String>,
    entries: HashMap<String, Entry<T>>,
}

impl<T: ?Sized> Scope<T> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&Entry<T>> {
        self.entries.get(name)
    }

    fn insert(&mut self, name: &str, unit: Box<T>, logger: Logger) {
        self.order.push(name.to_string());
        self.entries.insert(
            name.to_string(),
            Entry {
                unit: share(unit),
                logger,
            },
        );
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    fn loggers(&self) -> impl Iterator<Item = &Logger> {
        self.entries.values().map(|entry| &entry.logger)
    }
}

/// Cached units, split by capability family.
///
/// A name lives in at most one scope and at most once within it.
pub struct Registry {
    meta_modules: Scope<dyn MetaModule>,
    modules: Scope<dyn Module>,
    crawlers: Scope<dyn Crawler>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            meta_modules: Scope::new(),
            modules: Scope::new(),
            crawlers: Scope::new(),
        }
    }

    /// Scope `name` is registered in, meta-modules first.
    pub fn kind_of(&self, name: &str) -> Option<UnitKind> {
        if self.meta_modules.contains(name) {
            Some(UnitKind::MetaModule)
        } else if self.modules.contains(name) {
            Some(UnitKind::Module)
        } else if self.crawlers.contains(name) {
            Some(UnitKind::Crawler)
        } else {
            None
        }
    }

    /// Register a classified unit. Fails if `name` is taken in any scope.
    pub fn insert(&mut self, name: &str, unit: Unit, logger: Logger) -> Result<UnitKind> {
        if let Some(kind) = self.kind_of(name) {
            return Err(StocklabError::DuplicateDeclaration {
                name: name.to_string(),
                kind,
            });
        }

        let kind = unit.kind();
        match unit {
            Unit::MetaModule(unit) => self.meta_modules.insert(name, unit, logger),
            Unit::Module(unit) => self.modules.insert(name, unit, logger),
            Unit::Crawler(unit) => self.crawlers.insert(name, unit, logger),
        }
        Ok(kind)
    }

    /// Cached module for `name`; a meta-module always wins over a plain one.
    pub fn module(&self, name: &str) -> Option<ModuleRef> {
        if let Some(entry) = self.meta_modules.get(name) {
            return Some(ModuleRef::meta(name, entry.unit.clone()));
        }
        self.modules
            .get(name)
            .map(|entry| ModuleRef::plain(name, entry.unit.clone()))
    }

    pub fn crawler(&self, name: &str) -> Option<CrawlerRef> {
        self.crawlers
            .get(name)
            .map(|entry| CrawlerRef::new(name, entry.unit.clone()))
    }

    /// Meta-module names in registration order.
    pub fn meta_module_names(&self) -> Vec<String> {
        self.meta_modules.names().map(str::to_string).collect()
    }

    /// Every cached unit as `(name, kind)`: meta-modules, modules, then crawlers,
    /// each in registration order.
    pub fn units(&self) -> Vec<(String, UnitKind)> {
        let meta = self
            .meta_modules
            .names()
            .map(|n| (n.to_string(), UnitKind::MetaModule));
        let modules = self.modules.names().map(|n| (n.to_string(), UnitKind::Module));
        let crawlers = self.crawlers.names().map(|n| (n.to_string(), UnitKind::Crawler));
        meta.chain(modules).chain(crawlers).collect()
    }

    /// Loggers of every cached unit, across all scopes.
    pub fn loggers(&self) -> impl Iterator<Item = &Logger> {
        self.meta_modules
            .loggers()
            .chain(self.modules.loggers())
            .chain(self.crawlers.loggers())
    }

    pub fn len(&self) -> usize {
        self.meta_modules.entries.len() + self.modules.entries.len() + self.crawlers.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::logging::LoggerFacility;
    use crate::path::UnitPath;
    use stocklab_shared::Value;

    struct Plain;

    impl Module for Plain {
        fn eval(&mut self, _ctx: &mut Context, _path: &UnitPath, _peek: bool) -> Result<Value> {
            Ok(Value::from("plain"))
        }
    }

    struct Meta;

    impl Module for Meta {
        fn eval(&mut self, _ctx: &mut Context, _path: &UnitPath, _peek: bool) -> Result<Value> {
            Ok(Value::from("meta"))
        }
    }

    impl MetaModule for Meta {
        fn refresh(&mut self, _ctx: &mut Context) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    struct Fetch;

    impl Crawler for Fetch {
        fn crawl(&mut self, _ctx: &mut Context, request: &Value) -> Result<Value> {
            Ok(request.clone())
        }
    }

    fn logger(name: &str) -> Logger {
        LoggerFacility::default().logger(name)
    }

    #[test]
    fn insert_routes_by_kind() {
        let mut registry = Registry::new();
        registry
            .insert("A", Unit::Module(Box::new(Plain)), logger("A"))
            .expect("module");
        registry
            .insert("B", Unit::MetaModule(Box::new(Meta)), logger("B"))
            .expect("meta");
        registry
            .insert("C", Unit::Crawler(Box::new(Fetch)), logger("C"))
            .expect("crawler");

        assert_eq!(registry.kind_of("A"), Some(UnitKind::Module));
        assert_eq!(registry.kind_of("B"), Some(UnitKind::MetaModule));
        assert_eq!(registry.kind_of("C"), Some(UnitKind::Crawler));
        assert_eq!(registry.kind_of("D"), None);
        assert_eq!(registry.len(), 3);
        assert!(registry.module("C").is_none());
        assert!(registry.crawler("A").is_none());
    }

    #[test]
    fn names_are_unique_across_scopes() {
        let mut registry = Registry::new();
        registry
            .insert("X", Unit::Module(Box::new(Plain)), logger("X"))
            .expect("first");
        let err = registry
            .insert("X", Unit::Crawler(Box::new(Fetch)), logger("X"))
            .unwrap_err();
        assert!(matches!(
            err,
            StocklabError::DuplicateDeclaration { kind: UnitKind::Module, .. }
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn cached_handles_are_identical() {
        let mut registry = Registry::new();
        registry
            .insert("A", Unit::Module(Box::new(Plain)), logger("A"))
            .expect("insert");
        let first = registry.module("A").expect("first");
        let second = registry.module("A").expect("second");
        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn units_lists_meta_modules_first() {
        let mut registry = Registry::new();
        registry
            .insert("Z", Unit::Module(Box::new(Plain)), logger("Z"))
            .expect("module");
        registry
            .insert("M2", Unit::MetaModule(Box::new(Meta)), logger("M2"))
            .expect("meta");
        registry
            .insert("M1", Unit::MetaModule(Box::new(Meta)), logger("M1"))
            .expect("meta");

        assert_eq!(registry.meta_module_names(), vec!["M2", "M1"]);
        let units = registry.units();
        assert_eq!(units[0], ("M2".to_string(), UnitKind::MetaModule));
        assert_eq!(units[2], ("Z".to_string(), UnitKind::Module));
        assert_eq!(registry.loggers().count(), 3);
    }
}
