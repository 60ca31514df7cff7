//! Path evaluation: `evaluate`, `peek`, `metaevaluate` and `update`.

use stocklab_shared::{Result, UnitKind, Value};

use crate::context::{Context, mismatch};
use crate::path::UnitPath;

impl Context {
    /// Evaluate a path expression.
    ///
    /// With `meta` set the unit must be a meta-module and is refreshed before
    /// the read, every time. Without it the unit must not be a meta-module.
    /// `peek` is handed to the unit untouched.
    pub fn evaluate(&mut self, path: &str, peek: bool, meta: bool) -> Result<Value> {
        let path = UnitPath::parse(path)?;
        self.evaluate_path(&path, peek, meta)
    }

    /// [`evaluate`](Self::evaluate) for an already parsed path.
    pub fn evaluate_path(&mut self, path: &UnitPath, peek: bool, meta: bool) -> Result<Value> {
        self.logger().debug(format!("evaluating: {path}"));

        let name = path.unit();
        let expected = if meta {
            UnitKind::MetaModule
        } else {
            UnitKind::Module
        };
        let unit = match self.kind_of(name) {
            Some(found) if found != expected => return Err(mismatch(name, expected, found)),
            _ => self.get_module(name)?,
        };
        // Units loaded on demand are only classified once instantiated.
        if unit.kind() != expected {
            return Err(mismatch(name, expected, unit.kind()));
        }

        if meta {
            unit.refresh(self)?;
        }
        unit.eval(self, path, peek)
    }

    /// Read-only evaluation.
    pub fn peek(&mut self, path: &str) -> Result<Value> {
        self.evaluate(path, true, false)
    }

    /// Meta-addressed evaluation: refresh the meta-module, then read.
    pub fn metaevaluate(&mut self, path: &str, peek: bool) -> Result<Value> {
        self.evaluate(path, peek, true)
    }

    /// Refresh a meta-module or run a primitive module's compute.
    pub fn update(&mut self, name: &str) -> Result<Value> {
        let unit = self.get_module(name)?;
        self.logger().debug(format!("updating: {name}"));
        unit.update(self)
    }
}
