// src/data_loader/shared.rs
//
// Shared-attribute store for dataset handles that are cloned into worker
// tasks.  One logical dataset owns one store; every cloned handle keeps an
// `Arc` to the same backing map, so a write through any handle is visible
// through all of them.  Per-key get/set atomicity is the whole consistency
// contract: no iteration, no deletion, no multi-key transactions, and
// concurrent writers to the same key race with last-write-wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::data_loader::dataset::DatasetError;
use crate::data_loader::transform::Transform;

/// Shared key names.  This is a closed set: the synchronized configuration
/// of a dataset is exactly {duration, transform, sample_rate}.
pub const KEY_DURATION: &str = "duration";
pub const KEY_TRANSFORM: &str = "transform";
pub const KEY_SAMPLE_RATE: &str = "sample_rate";

/// A string-keyed map shared by every clone of the handle.
///
/// The store must be created before handles are cloned out to workers;
/// clones made from the same store observe each other's writes, while two
/// independently created stores never do.
pub struct SharedStore<V> {
    inner: Arc<RwLock<HashMap<String, V>>>,
}

impl<V> Clone for SharedStore<V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<V> Default for SharedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SharedStore<V> {
    /// Create a fresh, empty store.
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl<V: Clone> SharedStore<V> {
    /// Read `key`.  Fails with `KeyNotFound` if it was never written.
    pub fn get(&self, key: &str) -> Result<V, DatasetError> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(key)
            .cloned()
            .ok_or_else(|| DatasetError::KeyNotFound(key.to_string()))
    }

    /// Insert or overwrite `key`.  Visible to all clones of this store.
    pub fn set(&self, key: &str, value: V) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value);
    }

    /// True once `key` has been written at least once.
    pub fn contains(&self, key: &str) -> bool {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.contains_key(key)
    }
}

impl<V> fmt::Debug for SharedStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("SharedStore").field("keys", &map.len()).finish()
    }
}

/// Value type for the synchronized configuration keys.
#[derive(Clone)]
pub enum ConfigValue {
    /// Excerpt duration in seconds.
    Duration(f64),
    /// Target sample rate.
    SampleRate(u32),
    /// Item transform applied by the dataset.
    Transform(Arc<dyn Transform>),
}

impl fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Duration(v) => write!(f, "Duration({v})"),
            ConfigValue::SampleRate(v) => write!(f, "SampleRate({v})"),
            ConfigValue::Transform(t) => write!(f, "Transform({})", t.name()),
        }
    }
}

/// Typed accessors over the shared store for the closed shared-key set.
///
/// The shared-vs-local split is structural: values behind `SharedConfig`
/// live only in the store and are seen identically by every worker handle,
/// while [`LocalState`] attributes are plain per-handle data.
#[derive(Clone, Debug, Default)]
pub struct SharedConfig {
    store: SharedStore<ConfigValue>,
}

impl SharedConfig {
    /// Create a config backed by a fresh store.
    pub fn new() -> Self {
        Self { store: SharedStore::new() }
    }

    /// Raw keyed access, for callers that work over the key set generically.
    pub fn store(&self) -> &SharedStore<ConfigValue> {
        &self.store
    }

    pub fn duration(&self) -> Result<f64, DatasetError> {
        match self.store.get(KEY_DURATION)? {
            ConfigValue::Duration(v) => Ok(v),
            _ => Err("shared key 'duration' holds a non-duration value".into()),
        }
    }

    pub fn set_duration(&self, secs: f64) {
        self.store.set(KEY_DURATION, ConfigValue::Duration(secs));
    }

    pub fn sample_rate(&self) -> Result<u32, DatasetError> {
        match self.store.get(KEY_SAMPLE_RATE)? {
            ConfigValue::SampleRate(v) => Ok(v),
            _ => Err("shared key 'sample_rate' holds a non-rate value".into()),
        }
    }

    pub fn set_sample_rate(&self, rate: u32) {
        self.store.set(KEY_SAMPLE_RATE, ConfigValue::SampleRate(rate));
    }

    pub fn transform(&self) -> Result<Arc<dyn Transform>, DatasetError> {
        match self.store.get(KEY_TRANSFORM)? {
            ConfigValue::Transform(t) => Ok(t),
            _ => Err("shared key 'transform' holds a non-transform value".into()),
        }
    }

    pub fn set_transform(&self, transform: Arc<dyn Transform>) {
        self.store.set(KEY_TRANSFORM, ConfigValue::Transform(transform));
    }
}

/// A process-local attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Plain per-handle attributes.  Cloning a dataset handle deep-copies this
/// map, so writes on one handle are never observed through another.
#[derive(Debug, Clone, Default)]
pub struct LocalState {
    attrs: HashMap<String, AttrValue>,
}

impl LocalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read attribute `name`.  Fails with `AttributeNotFound` if unset.
    pub fn get(&self, name: &str) -> Result<AttrValue, DatasetError> {
        self.attrs
            .get(name)
            .cloned()
            .ok_or_else(|| DatasetError::AttributeNotFound(name.to_string()))
    }

    /// Set attribute `name` on this handle only.
    pub fn set(&mut self, name: &str, value: AttrValue) {
        self.attrs.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_visible_through_all_clones() {
        let a: SharedStore<u32> = SharedStore::new();
        let b = a.clone();
        a.set("k", 7);
        assert_eq!(b.get("k").unwrap(), 7);
        b.set("k", 8);
        assert_eq!(a.get("k").unwrap(), 8);
    }

    #[test]
    fn unset_key_is_key_not_found() {
        let store: SharedStore<u32> = SharedStore::new();
        match store.get("missing") {
            Err(DatasetError::KeyNotFound(k)) => assert_eq!(k, "missing"),
            other => panic!("expected KeyNotFound, got {other:?}"),
        }
    }

    #[test]
    fn independent_stores_do_not_leak() {
        let a: SharedStore<u32> = SharedStore::new();
        let b: SharedStore<u32> = SharedStore::new();
        a.set("k", 1);
        assert!(b.get("k").is_err());
    }

    #[test]
    fn concurrent_writers_settle_on_some_written_value() {
        let store: SharedStore<usize> = SharedStore::new();
        let mut handles = Vec::new();
        for i in 0..8 {
            let s = store.clone();
            handles.push(std::thread::spawn(move || s.set("k", i)));
        }
        for h in handles {
            h.join().unwrap();
        }
        let v = store.get("k").unwrap();
        assert!(v < 8);
    }

    #[test]
    fn typed_config_round_trips() {
        let cfg = SharedConfig::new();
        let copy = cfg.clone();
        cfg.set_duration(0.5);
        cfg.set_sample_rate(44_100);
        assert_eq!(copy.duration().unwrap(), 0.5);
        assert_eq!(copy.sample_rate().unwrap(), 44_100);
        assert!(matches!(copy.transform(), Err(DatasetError::KeyNotFound(_))));
    }

    #[test]
    fn local_state_is_per_clone() {
        let mut a = LocalState::new();
        a.set("mono", AttrValue::Bool(true));
        let mut b = a.clone();
        b.set("mono", AttrValue::Bool(false));
        assert_eq!(a.get("mono").unwrap(), AttrValue::Bool(true));
        assert_eq!(b.get("mono").unwrap(), AttrValue::Bool(false));
        assert!(matches!(
            a.get("unset"),
            Err(DatasetError::AttributeNotFound(_))
        ));
    }
}
