//! Process-wide output cache.
//!
//! Memoizes final Lua output keyed by fingerprints of the source text and
//! the options that affect emission. Entries are opaque strings holding no
//! node references, so compilation units never outlive their call. Reads
//! run concurrently; insertion takes the single write lock.

use crate::Options;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

type Key = (u64, u64);

static CACHE: OnceLock<RwLock<FxHashMap<Key, String>>> = OnceLock::new();

fn cache() -> &'static RwLock<FxHashMap<Key, String>> {
    CACHE.get_or_init(|| RwLock::new(FxHashMap::default()))
}

fn fingerprint(source: &str, options: &Options) -> Key {
    let mut source_hash = FxHasher::default();
    source.hash(&mut source_hash);

    let mut options_hash = FxHasher::default();
    options.strict.hash(&mut options_hash);
    options.emit_debug_info.hash(&mut options_hash);
    options.target.hash(&mut options_hash);
    options.max_nodes.hash(&mut options_hash);
    options.max_depth.hash(&mut options_hash);

    (source_hash.finish(), options_hash.finish())
}

pub(crate) fn lookup(source: &str, options: &Options) -> Option<String> {
    let key = fingerprint(source, options);
    cache().read().get(&key).cloned()
}

pub(crate) fn store(source: &str, options: &Options, output: &str) {
    let key = fingerprint(source, options);
    cache().write().insert(key, output.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_output_is_found_by_identical_inputs() {
        let options = Options::default();
        store("cache-test-source-a", &options, "out");
        assert_eq!(
            lookup("cache-test-source-a", &options),
            Some("out".to_string())
        );
    }

    #[test]
    fn different_options_miss() {
        let options = Options::default();
        store("cache-test-source-b", &options, "out");
        let strict = Options {
            strict: true,
            ..Options::default()
        };
        assert_eq!(lookup("cache-test-source-b", &strict), None);
    }
}
