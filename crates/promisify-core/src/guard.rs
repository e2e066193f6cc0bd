//! Idempotency decisions

use promisify_runtime::ObjectId;

use crate::naming::WrapperSlot;

/// Why an existing wrapper is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The owner's wrapper was generated from the current origin
    Current,
    /// A prototype's wrapper already serves the owner
    Inherited,
}

/// What to do for one (owner, origin) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Create and install a new wrapper
    Install,
    /// Replace an own wrapper whose origin binding changed
    Regenerate {
        /// Wrapper being replaced
        stale: ObjectId,
    },
    /// Leave things as they are
    Skip(SkipReason),
}

/// Decide given the occupant of the wrapper name and the origin function
/// currently resolved from the owner
pub fn decide(slot: &WrapperSlot, source: ObjectId) -> Decision {
    match slot {
        WrapperSlot::Free => Decision::Install,
        WrapperSlot::Own { marker, .. } if marker.source == source => Decision::Skip(SkipReason::Current),
        WrapperSlot::Own { wrapper, .. } => Decision::Regenerate { stale: *wrapper },
        WrapperSlot::Inherited { marker, .. } if marker.source == source => Decision::Skip(SkipReason::Inherited),
        WrapperSlot::Inherited { .. } => Decision::Install,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::WrapperMarker;
    use promisify_runtime::{Realm, Value};

    fn handles() -> (ObjectId, ObjectId, ObjectId, ObjectId) {
        let mut realm = Realm::new();
        let mut f = |name: &str| realm.create_function(name, |_, _, _| Ok(Value::Undefined));
        (f("a"), f("b"), f("wrapper"), f("holder"))
    }

    #[test]
    fn test_free_installs() {
        let (a, ..) = handles();
        assert_eq!(decide(&WrapperSlot::Free, a), Decision::Install);
    }

    #[test]
    fn test_own_wrapper() {
        let (a, b, wrapper, _) = handles();
        let slot = WrapperSlot::Own {
            wrapper,
            marker: WrapperMarker::new("get", a),
        };
        assert_eq!(decide(&slot, a), Decision::Skip(SkipReason::Current));
        assert_eq!(decide(&slot, b), Decision::Regenerate { stale: wrapper });
    }

    #[test]
    fn test_inherited_wrapper() {
        let (a, b, wrapper, holder) = handles();
        let slot = WrapperSlot::Inherited {
            holder,
            wrapper,
            marker: WrapperMarker::new("get", a),
        };
        assert_eq!(decide(&slot, a), Decision::Skip(SkipReason::Inherited));
        assert_eq!(decide(&slot, b), Decision::Install);
    }
}
