//! Member enumeration
//!
//! Reads property descriptors only. Accessors are reported as such and their
//! getters never run.

use promisify_runtime::{ObjectId, PropertyDescriptor, Realm, Value};
use rustc_hash::FxHashSet;

use crate::error::PromisifyResult;

/// Classification of a member descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Data property holding a callable
    Method(ObjectId),
    /// Data property holding anything else
    Value,
    /// Getter/setter pair
    Accessor,
}

/// An enumerable member and the object that holds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Property key
    pub name: String,
    /// Object owning the descriptor (the target or one of its prototypes)
    pub holder: ObjectId,
    /// Descriptor classification
    pub kind: MemberKind,
}

impl Member {
    /// The function held by this member, if it is a method
    pub fn method(&self) -> Option<ObjectId> {
        match self.kind {
            MemberKind::Method(function) => Some(function),
            _ => None,
        }
    }
}

/// Classify a descriptor without invoking accessors
pub fn classify(realm: &Realm, desc: &PropertyDescriptor) -> MemberKind {
    match desc {
        PropertyDescriptor::Accessor { .. } => MemberKind::Accessor,
        PropertyDescriptor::Data { value, .. } => match value {
            Value::Object(id) if realm.is_callable(value) => MemberKind::Method(*id),
            _ => MemberKind::Value,
        },
    }
}

/// Own enumerable members of `object`, in key order
pub fn own_members(realm: &Realm, object: ObjectId) -> PromisifyResult<Vec<Member>> {
    Ok(realm
        .own_properties(object)?
        .into_iter()
        .filter(|(_, desc)| desc.is_enumerable())
        .map(|(name, desc)| Member {
            kind: classify(realm, &desc),
            name,
            holder: object,
        })
        .collect())
}

/// Enumerable members visible from `target`: its own, then those of each
/// non-intrinsic prototype, closest first.
///
/// A name is reported once, from the closest object that owns it. A
/// non-enumerable own key still hides the same name further up the chain.
pub fn candidate_members(realm: &Realm, target: ObjectId) -> PromisifyResult<Vec<Member>> {
    let mut seen = FxHashSet::default();
    let mut members = Vec::new();
    let mut current = Some(target);

    while let Some(holder) = current {
        if realm.is_intrinsic(holder) {
            break;
        }
        members.extend(
            own_members(realm, holder)?
                .into_iter()
                .filter(|member| !seen.contains(&member.name)),
        );
        // Every own key shadows, enumerable or not
        seen.extend(realm.own_keys(holder)?);
        current = realm.get_prototype_of(holder)?;
    }

    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn noop(realm: &mut Realm, name: &str) -> ObjectId {
        realm.create_function(name, |_, _, _| Ok(Value::Undefined))
    }

    #[test]
    fn test_own_members_classification() {
        let mut realm = Realm::new();
        let obj = realm.create_object();
        let f = noop(&mut realm, "f");
        let getter = noop(&mut realm, "get g");
        realm.set(obj, "f", Value::Object(f)).unwrap();
        realm.set(obj, "n", Value::from(1)).unwrap();
        realm
            .define_property(obj, "g", PropertyDescriptor::accessor(Some(getter), None))
            .unwrap();
        realm.define_property(obj, "h", PropertyDescriptor::hidden(f)).unwrap();

        let members = own_members(&realm, obj).unwrap();
        let kinds: Vec<_> = members.iter().map(|m| (m.name.as_str(), m.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("f", MemberKind::Method(f)),
                ("n", MemberKind::Value),
                ("g", MemberKind::Accessor)
            ]
        );
        assert_eq!(members[0].method(), Some(f));
        assert_eq!(members[1].method(), None);
    }

    #[test]
    fn test_accessors_are_not_invoked() {
        let mut realm = Realm::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let getter = realm.create_function("get thrower", move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Undefined)
        });
        let obj = realm.create_object();
        realm
            .define_property(obj, "thrower", PropertyDescriptor::accessor(Some(getter), None))
            .unwrap();

        let members = candidate_members(&realm, obj).unwrap();
        assert_eq!(members[0].kind, MemberKind::Accessor);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_candidates_walk_the_chain_closest_first() {
        let mut realm = Realm::new();
        let proto = realm.create_object();
        let base_get = noop(&mut realm, "get");
        let base_put = noop(&mut realm, "put");
        realm.set(proto, "get", Value::Object(base_get)).unwrap();
        realm.set(proto, "put", Value::Object(base_put)).unwrap();

        let instance = realm.create_object_with_proto(Some(proto));
        let own_get = noop(&mut realm, "get");
        realm.set(instance, "get", Value::Object(own_get)).unwrap();

        let members = candidate_members(&realm, instance).unwrap();
        let seen: Vec<_> = members.iter().map(|m| (m.name.as_str(), m.holder, m.method())).collect();
        assert_eq!(
            seen,
            vec![("get", instance, Some(own_get)), ("put", proto, Some(base_put))]
        );
    }

    #[test]
    fn test_hidden_own_key_shadows_inherited() {
        let mut realm = Realm::new();
        let proto = realm.create_object();
        let f = noop(&mut realm, "save");
        realm.set(proto, "save", Value::Object(f)).unwrap();
        let instance = realm.create_object_with_proto(Some(proto));
        realm
            .define_property(instance, "save", PropertyDescriptor::hidden(Value::Null))
            .unwrap();

        assert!(candidate_members(&realm, instance).unwrap().is_empty());
    }

    #[test]
    fn test_intrinsics_are_not_enumerated() {
        let mut realm = Realm::new();
        let obj = realm.create_object();
        assert!(candidate_members(&realm, obj).unwrap().is_empty());

        let object_prototype = realm.object_prototype();
        assert!(candidate_members(&realm, object_prototype).unwrap().is_empty());
    }
}
