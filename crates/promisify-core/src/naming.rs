//! Wrapper naming
//!
//! Derives the wrapper name for an origin member and inspects what currently
//! occupies that name on the owner.

use promisify_runtime::{ObjectId, PropertyDescriptor, Realm};

use crate::error::{ConflictReason, ConflictRecord, PromisifyError, PromisifyResult};
use crate::marker::WrapperMarker;

/// What currently sits at a wrapper name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapperSlot {
    /// Nothing relevant: the name is free on the owner and no wrapper for
    /// the same origin is inherited
    Free,
    /// The owner already holds a wrapper generated for this origin
    Own {
        /// Existing wrapper function
        wrapper: ObjectId,
        /// Its marker
        marker: WrapperMarker,
    },
    /// A prototype of the owner holds a wrapper generated for this origin
    Inherited {
        /// Prototype holding the wrapper
        holder: ObjectId,
        /// Existing wrapper function
        wrapper: ObjectId,
        /// Its marker
        marker: WrapperMarker,
    },
}

/// A validated wrapper name and its current occupant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// `origin + suffix`
    pub wrapper_name: String,
    /// Current occupant
    pub slot: WrapperSlot,
}

/// Applies the naming rules for one suffix
#[derive(Debug, Clone, Copy)]
pub struct NameResolver<'a> {
    suffix: &'a str,
}

impl<'a> NameResolver<'a> {
    /// Create a resolver for `suffix`
    pub fn new(suffix: &'a str) -> Self {
        Self { suffix }
    }

    /// `origin + suffix`
    pub fn wrapper_name(&self, origin: &str) -> String {
        format!("{}{}", origin, self.suffix)
    }

    /// Check if `name` already ends with the suffix
    pub fn is_suffixed(&self, name: &str) -> bool {
        name.ends_with(self.suffix)
    }

    /// Resolve the wrapper name for `origin` on `owner`.
    ///
    /// Fails when the origin is itself suffixed, or when the owner has an own
    /// property at the wrapper name that is not a wrapper for this origin.
    pub fn resolve(&self, realm: &Realm, owner: ObjectId, origin: &str) -> PromisifyResult<ResolvedName> {
        let wrapper_name = self.wrapper_name(origin);
        let conflict = |reason| {
            PromisifyError::NamingConflict(ConflictRecord {
                origin: origin.to_string(),
                wrapper: wrapper_name.clone(),
                owner,
                reason,
            })
        };

        if self.is_suffixed(origin) {
            return Err(conflict(ConflictReason::SuffixedOrigin));
        }

        if let Some(desc) = realm.get_own_property(owner, &wrapper_name)? {
            return match wrapper_for(realm, desc, origin) {
                Some((wrapper, marker)) => Ok(ResolvedName {
                    slot: WrapperSlot::Own { wrapper, marker },
                    wrapper_name,
                }),
                None => Err(conflict(ConflictReason::Occupied)),
            };
        }

        let mut current = realm.get_prototype_of(owner)?;
        while let Some(holder) = current {
            if realm.is_intrinsic(holder) {
                break;
            }
            if let Some(desc) = realm.get_own_property(holder, &wrapper_name)? {
                // The closest definition decides; anything unrelated is shadowed by the new wrapper
                let slot = match wrapper_for(realm, desc, origin) {
                    Some((wrapper, marker)) => WrapperSlot::Inherited {
                        holder,
                        wrapper,
                        marker,
                    },
                    None => WrapperSlot::Free,
                };
                return Ok(ResolvedName { wrapper_name, slot });
            }
            current = realm.get_prototype_of(holder)?;
        }

        Ok(ResolvedName {
            wrapper_name,
            slot: WrapperSlot::Free,
        })
    }
}

fn wrapper_for(realm: &Realm, desc: &PropertyDescriptor, origin: &str) -> Option<(ObjectId, WrapperMarker)> {
    let wrapper = desc.value()?.as_object()?;
    let marker = WrapperMarker::read(realm, wrapper)?;
    marker.serves(origin).then_some((wrapper, marker))
}
