//! Traversal shapes and depth bound
//!
//! A pass starts at the target and may descend twice:
//!
//! ```text
//! Module ──class-like member──▶ Class ──own prototype──▶ Members
//! ```
//!
//! A function target starts directly at `Class`. Nothing found below a
//! `Module` visit is searched for further classes.

use promisify_runtime::{ObjectId, PropertyDescriptor, Realm, RuntimeResult, Value};

use crate::error::PromisifyResult;

/// How a visited object is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Plain object: wrap members, descend into class-like members
    Module,
    /// Constructor: wrap statics, descend into its prototype
    Class,
    /// A prototype: wrap members only
    Members,
}

/// One object scheduled for promisification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    /// Object whose members are wrapped
    pub object: ObjectId,
    /// Treatment
    pub shape: Shape,
    /// Levels below the root
    pub depth: usize,
}

/// Decides what a pass visits
#[derive(Debug, Clone, Copy)]
pub struct RecursionController {
    max_depth: usize,
}

impl RecursionController {
    /// Deepest level reachable from a root (`Module → Class → Members`)
    pub const MAX_DEPTH: usize = 2;

    /// Create a controller with the standard depth bound
    pub fn new() -> Self {
        Self {
            max_depth: Self::MAX_DEPTH,
        }
    }

    /// First visit for `target`
    pub fn root(&self, realm: &Realm, target: ObjectId) -> Visit {
        let shape = if realm.is_callable(&Value::Object(target)) {
            Shape::Class
        } else {
            Shape::Module
        };
        Visit {
            object: target,
            shape,
            depth: 0,
        }
    }

    /// Check if members of `visit` are searched for classes
    pub fn discovers_classes(&self, visit: &Visit) -> bool {
        visit.shape == Shape::Module
    }

    /// Visit for a class found among the members of `parent`
    pub fn class_visit(&self, parent: &Visit, class: ObjectId) -> Option<Visit> {
        if !self.discovers_classes(parent) || parent.depth + 1 > self.max_depth {
            return None;
        }
        Some(Visit {
            object: class,
            shape: Shape::Class,
            depth: parent.depth + 1,
        })
    }

    /// Visits that follow from `visit` itself (a class's prototype)
    pub fn expand(&self, realm: &Realm, visit: &Visit) -> PromisifyResult<Option<Visit>> {
        if visit.shape != Shape::Class || visit.depth + 1 > self.max_depth {
            return Ok(None);
        }
        Ok(own_prototype(realm, visit.object)?.map(|prototype| Visit {
            object: prototype,
            shape: Shape::Members,
            depth: visit.depth + 1,
        }))
    }

    /// Check if `function` looks like a class.
    ///
    /// It must be constructible and own a `prototype` object, and either that
    /// prototype has an own method besides `constructor`, or the function
    /// has an enumerable static method.
    pub fn is_class_like(&self, realm: &Realm, function: ObjectId) -> PromisifyResult<bool> {
        if !realm.is_constructor(&Value::Object(function)) {
            return Ok(false);
        }
        let Some(prototype) = own_prototype(realm, function)? else {
            return Ok(false);
        };

        let holds_function = |desc: &PropertyDescriptor| {
            desc.value().is_some_and(|value| realm.is_callable(value))
        };

        let has_methods = realm
            .own_properties(prototype)?
            .iter()
            .any(|(name, desc)| name != "constructor" && holds_function(desc));
        if has_methods {
            return Ok(true);
        }

        Ok(realm
            .own_properties(function)?
            .iter()
            .any(|(name, desc)| name != "prototype" && desc.is_enumerable() && holds_function(desc)))
    }
}

impl Default for RecursionController {
    fn default() -> Self {
        Self::new()
    }
}

/// The object held by `function`'s own `prototype` data property
pub fn own_prototype(realm: &Realm, function: ObjectId) -> RuntimeResult<Option<ObjectId>> {
    Ok(realm
        .get_own_property(function, "prototype")?
        .and_then(|desc| desc.value())
        .and_then(Value::as_object))
}
