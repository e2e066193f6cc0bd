//! Promisification passes
//!
//! A pass walks the target breadth-first (see [`crate::recursion`]) and runs
//! every enumerable member through the same pipeline:
//!
//! 1. accessors and non-function values are skipped;
//! 2. functions that are themselves generated wrappers are skipped;
//! 3. on module visits, class-like members are queued instead of wrapped;
//! 4. the filter decides eligibility;
//! 5. the wrapper name is resolved (conflicts abort the pass);
//! 6. the guard decides between install, regenerate and skip.
//!
//! Passes are all-or-nothing. Every property written is journaled and a
//! failed pass restores the previous descriptors before returning the error.

use std::collections::VecDeque;

use promisify_runtime::{ObjectId, PropertyDescriptor, Realm, Value};
use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};

use crate::error::PromisifyResult;
use crate::guard::{self, Decision};
use crate::marker::WrapperMarker;
use crate::naming::NameResolver;
use crate::options::PromisifyOptions;
use crate::recursion::{RecursionController, Visit};
use crate::reflector::{self, MemberKind};
use crate::wrapper::WrapperFactory;

/// Outcome of a successful pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PromisifyReport {
    /// Objects whose members were processed
    pub visited: usize,
    /// Wrappers added
    pub installed: usize,
    /// Stale wrappers replaced
    pub regenerated: usize,
    /// Eligible-looking functions left alone (filtered out or already wrapped)
    pub skipped: usize,
    /// Class-like members queued for their own visit
    pub classes: usize,
}

impl PromisifyReport {
    /// Check if the pass changed anything
    pub fn is_unchanged(&self) -> bool {
        self.installed == 0 && self.regenerated == 0
    }
}

/// Promisify `target` with default options. Returns `target`.
pub fn promisify_all(realm: &mut Realm, target: ObjectId) -> PromisifyResult<ObjectId> {
    promisify_all_with(realm, target, &PromisifyOptions::default())
}

/// Promisify `target` with `options`. Returns `target`.
pub fn promisify_all_with(realm: &mut Realm, target: ObjectId, options: &PromisifyOptions) -> PromisifyResult<ObjectId> {
    promisify_all_report(realm, target, options).map(|_| target)
}

/// Promisify `target` and report what changed
pub fn promisify_all_report(
    realm: &mut Realm,
    target: ObjectId,
    options: &PromisifyOptions,
) -> PromisifyResult<PromisifyReport> {
    options.validate()?;

    let mut pass = Pass::new(realm, options);
    match pass.run(target) {
        Ok(()) => {
            debug!(
                target = %target,
                visited = pass.report.visited,
                installed = pass.report.installed,
                regenerated = pass.report.regenerated,
                skipped = pass.report.skipped,
                "promisification complete"
            );
            Ok(pass.report)
        }
        Err(err) => {
            warn!(target = %target, error = %err, undone = pass.journal.len(), "promisification aborted; rolling back");
            pass.rollback();
            Err(err)
        }
    }
}

// ============================================================================
// Pass
// ============================================================================

struct Pass<'r, 'o> {
    realm: &'r mut Realm,
    options: &'o PromisifyOptions,
    names: NameResolver<'o>,
    factory: WrapperFactory,
    recursion: RecursionController,
    journal: Journal,
    report: PromisifyReport,
}

impl<'r, 'o> Pass<'r, 'o> {
    fn new(realm: &'r mut Realm, options: &'o PromisifyOptions) -> Self {
        Self {
            realm,
            options,
            names: NameResolver::new(options.suffix()),
            factory: WrapperFactory::new(options.promise_constructor().clone()),
            recursion: RecursionController::new(),
            journal: Journal::default(),
            report: PromisifyReport::default(),
        }
    }

    fn run(&mut self, target: ObjectId) -> PromisifyResult<()> {
        self.realm.object(target)?;

        let mut queue = VecDeque::from([self.recursion.root(self.realm, target)]);
        let mut visited = FxHashSet::default();

        while let Some(visit) = queue.pop_front() {
            if !visited.insert(visit.object) {
                continue;
            }
            self.report.visited += 1;
            debug!(object = %visit.object, shape = ?visit.shape, depth = visit.depth, "visiting");

            for member in reflector::candidate_members(self.realm, visit.object)? {
                let MemberKind::Method(function) = member.kind else {
                    trace!(member = %member.name, kind = ?member.kind, "not a method");
                    continue;
                };
                if WrapperMarker::is_wrapper(self.realm, function) {
                    trace!(member = %member.name, "generated wrapper");
                    continue;
                }
                if self.recursion.discovers_classes(&visit) && self.recursion.is_class_like(self.realm, function)? {
                    if let Some(class) = self.recursion.class_visit(&visit, function) {
                        self.report.classes += 1;
                        queue.push_back(class);
                    }
                    continue;
                }
                if !self.options.accepts(&member.name, &Value::Object(function)) {
                    trace!(member = %member.name, "filtered out");
                    self.report.skipped += 1;
                    continue;
                }
                self.promisify_member(&visit, &member.name, function)?;
            }

            queue.extend(self.recursion.expand(self.realm, &visit)?);
        }

        Ok(())
    }

    fn promisify_member(&mut self, visit: &Visit, origin: &str, source: ObjectId) -> PromisifyResult<()> {
        let owner = visit.object;
        let resolved = self.names.resolve(self.realm, owner, origin)?;

        match guard::decide(&resolved.slot, source) {
            Decision::Skip(reason) => {
                trace!(owner = %owner, origin, ?reason, "wrapper up to date");
                self.report.skipped += 1;
            }
            Decision::Install => {
                let wrapper = self.install(owner, origin, &resolved.wrapper_name, source)?;
                debug!(owner = %owner, origin, wrapper = %wrapper, "installed {}", resolved.wrapper_name);
                self.report.installed += 1;
            }
            Decision::Regenerate { stale } => {
                let wrapper = self.install(owner, origin, &resolved.wrapper_name, source)?;
                debug!(owner = %owner, origin, %stale, wrapper = %wrapper, "regenerated {}", resolved.wrapper_name);
                self.report.regenerated += 1;
            }
        }
        Ok(())
    }

    fn install(&mut self, owner: ObjectId, origin: &str, name: &str, source: ObjectId) -> PromisifyResult<ObjectId> {
        let wrapper = self.factory.create(self.realm, origin, name, source);
        let previous = self.realm.get_own_property(owner, name)?.cloned();

        if let Err(err) = self
            .realm
            .define_property(owner, name, PropertyDescriptor::data(wrapper))
        {
            self.realm.release(wrapper);
            return Err(err.into());
        }

        self.journal.record(JournalEntry {
            owner,
            key: name.to_string(),
            previous,
            wrapper,
        });
        Ok(wrapper)
    }

    fn rollback(&mut self) {
        let journal = std::mem::take(&mut self.journal);
        journal.undo(self.realm);
    }
}

// ============================================================================
// Undo journal
// ============================================================================

#[derive(Debug)]
struct JournalEntry {
    owner: ObjectId,
    key: String,
    previous: Option<PropertyDescriptor>,
    wrapper: ObjectId,
}

#[derive(Debug, Default)]
struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Restore every journaled property, newest first, and release the
    /// wrappers they held
    fn undo(self, realm: &mut Realm) {
        for entry in self.entries.into_iter().rev() {
            let restored = match entry.previous {
                Some(desc) => realm.define_property(entry.owner, &entry.key, desc),
                None => realm.delete_property(entry.owner, &entry.key).map(|_| ()),
            };
            match restored {
                Ok(()) => {
                    realm.release(entry.wrapper);
                }
                Err(err) => {
                    warn!(owner = %entry.owner, key = %entry.key, error = %err, "failed to restore property");
                    WrapperMarker::clear(realm, entry.wrapper);
                }
            }
        }
    }
}
