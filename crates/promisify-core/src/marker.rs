//! Wrapper markers
//!
//! Every generated wrapper is tagged in the realm's metadata store with the
//! origin name it serves and the origin function it was generated from.
//! Property tables are never touched, so markers are invisible to key
//! enumeration.

use promisify_runtime::{ObjectId, Realm, Value};

const ORIGIN_KEY: &str = "promisify:origin";
const SOURCE_KEY: &str = "promisify:source";

/// Tag carried by a generated wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperMarker {
    /// Origin member name
    pub origin: String,
    /// Origin function resolved when the wrapper was generated
    pub source: ObjectId,
}

impl WrapperMarker {
    /// Create a marker
    pub fn new(origin: impl Into<String>, source: ObjectId) -> Self {
        Self {
            origin: origin.into(),
            source,
        }
    }

    /// Tag `wrapper` with this marker
    pub fn mark(&self, realm: &mut Realm, wrapper: ObjectId) {
        let metadata = realm.metadata_mut();
        metadata.define_metadata(ORIGIN_KEY, Value::string(&self.origin), wrapper);
        metadata.define_metadata(SOURCE_KEY, Value::Object(self.source), wrapper);
    }

    /// Read the marker of `function`, if it is a generated wrapper
    pub fn read(realm: &Realm, function: ObjectId) -> Option<Self> {
        let metadata = realm.metadata();
        let origin = metadata.get_metadata(ORIGIN_KEY, function)?.as_str()?;
        let source = metadata.get_metadata(SOURCE_KEY, function)?.as_object()?;
        Some(Self::new(origin, source))
    }

    /// Check if `function` is a generated wrapper
    pub fn is_wrapper(realm: &Realm, function: ObjectId) -> bool {
        realm.metadata().has_metadata(ORIGIN_KEY, function)
    }

    /// Remove the marker of a discarded wrapper
    pub fn clear(realm: &mut Realm, wrapper: ObjectId) {
        let metadata = realm.metadata_mut();
        metadata.delete_metadata(ORIGIN_KEY, wrapper);
        metadata.delete_metadata(SOURCE_KEY, wrapper);
    }

    /// Check if this wrapper serves `origin`
    pub fn serves(&self, origin: &str) -> bool {
        self.origin == origin
    }
}
