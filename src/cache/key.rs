//! C1 — Cache-Key Deriver.
//!
//! Produces the hex-encoded MD5 digests that key the two-level cache,
//! grounded in the same "hash the sorted, lowercased, deduplicated
//! parameter set" approach the rest of this codebase uses for request
//! fingerprinting, but pinned to MD5 per the wire format in spec §6.

/// Namespace prefixes. Keeping them as constants (rather than inlining the
/// literals at each call site) is what guarantees §8 invariant 8: the two
/// namespaces can never collide because they're never spelled differently.
const TG_NAMESPACE: &str = "tg";
const PLUGIN_NAMESPACE: &str = "plugin";

pub fn tg_key(keyword: &str, channels: &[String]) -> String {
    digest(TG_NAMESPACE, keyword, channels)
}

pub fn plugin_key(keyword: &str, plugins: Option<&[String]>) -> String {
    digest(PLUGIN_NAMESPACE, keyword, plugins.unwrap_or(&[]))
}

fn digest(namespace: &str, keyword: &str, list: &[String]) -> String {
    let canonical_keyword = keyword.trim().to_lowercase();
    let canonical_list = hash_list(list);
    let payload = format!("{namespace}:{canonical_keyword}:{canonical_list}");
    format!("{:x}", md5::compute(payload.as_bytes()))
}

/// Order-independent, stable fingerprint of a string list: lowercase,
/// dedup, sort, then join. Two lists that differ only in order or casing
/// produce the same fingerprint, and therefore the same cache key.
fn hash_list(list: &[String]) -> String {
    let mut canonical: Vec<String> = list
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    canonical.sort();
    canonical.dedup();
    let joined = canonical.join(",");
    format!("{:x}", md5::compute(joined.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tg_key_is_permutation_invariant() {
        let a = tg_key("foo", &list(&["c1", "c2"]));
        let b = tg_key("foo", &list(&["c2", "c1"]));
        assert_eq!(a, b);
    }

    #[test]
    fn tg_key_is_case_insensitive_in_keyword() {
        let a = tg_key("Foo", &list(&["c1"]));
        let b = tg_key("  foo ", &list(&["c1"]));
        assert_eq!(a, b);
    }

    #[test]
    fn plugin_key_none_and_empty_list_match() {
        let a = plugin_key("foo", None);
        let b = plugin_key("foo", Some(&[]));
        assert_eq!(a, b);
    }

    #[test]
    fn namespaces_are_disjoint() {
        let tg = tg_key("foo", &list(&["a"]));
        let plugin = plugin_key("foo", Some(&list(&["a"])));
        assert_ne!(tg, plugin);
    }

    #[test]
    fn digest_is_deterministic_across_calls() {
        let a = tg_key("same", &list(&["x", "y"]));
        let b = tg_key("same", &list(&["x", "y"]));
        assert_eq!(a, b);
        assert_eq!(a.len(), 32); // hex-encoded 128-bit digest
    }
}
