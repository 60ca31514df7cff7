//! Unit capability traits and the shared handles the registry hands out.
//!
//! A plugin instance is classified exactly once, when [`Plugin::into_unit`]
//! turns it into a [`Unit`]. From then on the variant decides which registry
//! scope it lives in and which operations it supports.

use std::cell::{RefCell, RefMut};
use std::path::PathBuf;
use std::rc::Rc;

use stocklab_shared::{Result, StocklabError, UnitKind, Value};

use crate::context::Context;
use crate::logging::Logger;
use crate::path::UnitPath;

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Computes values on demand for path expressions addressed to it.
pub trait Module {
    /// Evaluate `path` (the full expression, unit name included).
    ///
    /// With `peek` set the unit must not mutate any cached computed state.
    fn eval(&mut self, ctx: &mut Context, path: &UnitPath, peek: bool) -> Result<Value>;

    /// Primitive modules compute their whole dataset in one call.
    fn as_primitive(&mut self) -> Option<&mut dyn Primitive> {
        None
    }
}

/// One-shot compute capability used by [`Context::update`].
pub trait Primitive {
    fn update(&mut self, ctx: &mut Context) -> Result<Value>;
}

/// A module that derives its state from other units and must be refreshed.
pub trait MetaModule: Module {
    fn refresh(&mut self, ctx: &mut Context) -> Result<Value>;
}

/// Raw-data acquisition. Not addressable by path expressions.
pub trait Crawler {
    fn crawl(&mut self, ctx: &mut Context, request: &Value) -> Result<Value>;
}

/// Entry point every plugin factory returns.
///
/// Implementations report their capability family, typically
/// `Some(Unit::Module(self))`. `None` means the type exposes no family and
/// is rejected.
pub trait Plugin {
    fn into_unit(self: Box<Self>) -> Option<Unit>;
}

/// A classified plugin instance.
pub enum Unit {
    MetaModule(Box<dyn MetaModule>),
    Module(Box<dyn Module>),
    Crawler(Box<dyn Crawler>),
}

impl Unit {
    pub fn kind(&self) -> UnitKind {
        match self {
            Self::MetaModule(_) => UnitKind::MetaModule,
            Self::Module(_) => UnitKind::Module,
            Self::Crawler(_) => UnitKind::Crawler,
        }
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Unit").field(&self.kind()).finish()
    }
}

/// Everything a factory gets to build one unit.
#[derive(Debug, Clone)]
pub struct UnitSpec {
    /// Registered unit name.
    pub name: String,
    /// `description` from the unit's artifact, if any.
    pub description: Option<String>,
    /// `[params]` table from the unit's artifact.
    pub params: toml::Table,
    /// Directory reserved for unit data.
    pub data_dir: PathBuf,
    /// Private logger keyed by the unit name.
    pub logger: Logger,
}

// ---------------------------------------------------------------------------
// Shared handles
// ---------------------------------------------------------------------------

pub(crate) type Shared<T> = Rc<RefCell<Box<T>>>;

pub(crate) fn share<T: ?Sized>(unit: Box<T>) -> Shared<T> {
    Rc::new(RefCell::new(unit))
}

/// Borrow a unit for a call; a unit that is already running reports `Reentrant`.
fn lock<'a, T: ?Sized>(name: &str, unit: &'a RefCell<Box<T>>) -> Result<RefMut<'a, Box<T>>> {
    unit.try_borrow_mut()
        .map_err(|_| StocklabError::Reentrant { name: name.into() })
}

#[derive(Clone)]
enum ModuleSlot {
    Meta(Shared<dyn MetaModule>),
    Plain(Shared<dyn Module>),
}

/// Cached module or meta-module. Clones point at the same instance.
#[derive(Clone)]
pub struct ModuleRef {
    name: Rc<str>,
    slot: ModuleSlot,
}

impl ModuleRef {
    pub(crate) fn meta(name: &str, unit: Shared<dyn MetaModule>) -> Self {
        Self {
            name: Rc::from(name),
            slot: ModuleSlot::Meta(unit),
        }
    }

    pub(crate) fn plain(name: &str, unit: Shared<dyn Module>) -> Self {
        Self {
            name: Rc::from(name),
            slot: ModuleSlot::Plain(unit),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> UnitKind {
        match self.slot {
            ModuleSlot::Meta(_) => UnitKind::MetaModule,
            ModuleSlot::Plain(_) => UnitKind::Module,
        }
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.slot, ModuleSlot::Meta(_))
    }

    /// Whether both handles refer to the identical cached instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.slot, &other.slot) {
            (ModuleSlot::Meta(a), ModuleSlot::Meta(b)) => Rc::ptr_eq(a, b),
            (ModuleSlot::Plain(a), ModuleSlot::Plain(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn eval(&self, ctx: &mut Context, path: &UnitPath, peek: bool) -> Result<Value> {
        match &self.slot {
            ModuleSlot::Meta(unit) => lock(&self.name, unit)?.eval(ctx, path, peek),
            ModuleSlot::Plain(unit) => lock(&self.name, unit)?.eval(ctx, path, peek),
        }
    }

    pub fn refresh(&self, ctx: &mut Context) -> Result<Value> {
        match &self.slot {
            ModuleSlot::Meta(unit) => lock(&self.name, unit)?.refresh(ctx),
            ModuleSlot::Plain(_) => Err(StocklabError::UnknownCapability {
                name: self.name.to_string(),
                capability: "refresh",
            }),
        }
    }

    /// Refresh a meta-module, or run a primitive module's compute.
    pub fn update(&self, ctx: &mut Context) -> Result<Value> {
        match &self.slot {
            ModuleSlot::Meta(unit) => lock(&self.name, unit)?.refresh(ctx),
            ModuleSlot::Plain(unit) => {
                let mut module = lock(&self.name, unit)?;
                match module.as_primitive() {
                    Some(primitive) => primitive.update(ctx),
                    None => Err(StocklabError::UnknownCapability {
                        name: self.name.to_string(),
                        capability: "refresh or primitive compute",
                    }),
                }
            }
        }
    }
}

impl std::fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRef")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Cached crawler. Clones point at the same instance.
#[derive(Clone)]
pub struct CrawlerRef {
    name: Rc<str>,
    unit: Shared<dyn Crawler>,
}

impl CrawlerRef {
    pub(crate) fn new(name: &str, unit: Shared<dyn Crawler>) -> Self {
        Self {
            name: Rc::from(name),
            unit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.unit, &other.unit)
    }

    pub fn crawl(&self, ctx: &mut Context, request: &Value) -> Result<Value> {
        lock(&self.name, &self.unit)?.crawl(ctx, request)
    }
}

impl std::fmt::Debug for CrawlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlerRef").field("name", &self.name).finish()
    }
}
