//! Index selection.
//!
//! Resolves the indices a request asks for against the configured allow-list
//! and alias table. The selector is built once at startup and shared
//! read-only between requests.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use serp_types::{ClusterSettings, IndexAlias};

/// Allow-list, defaults and alias table for backend indices.
#[derive(Debug, Clone)]
pub struct IndexSelector {
    allowed: Vec<String>,
    /// Allowed names plus every name linked to one through the alias table
    permitted: HashSet<String>,
    defaults: Vec<String>,
    aliases: Vec<IndexAlias>,
    /// alias -> first configured index
    by_alias: HashMap<String, String>,
}

impl IndexSelector {
    pub fn new(allowed: Vec<String>, defaults: Vec<String>, aliases: Vec<IndexAlias>) -> Self {
        let mut seen = HashSet::new();
        let allowed: Vec<String> = allowed
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .collect();

        let mut by_alias = HashMap::new();
        let permitted = {
            let mut links: HashMap<&str, Vec<&str>> = HashMap::new();
            for entry in &aliases {
                if entry.alias.is_empty() {
                    continue;
                }
                by_alias
                    .entry(entry.alias.clone())
                    .or_insert_with(|| entry.index.clone());
                links.entry(&entry.alias).or_default().push(&entry.index);
                links.entry(&entry.index).or_default().push(&entry.alias);
            }
            linked_names(&allowed, &links)
        };

        let mut selector = Self {
            allowed,
            permitted,
            defaults: Vec::new(),
            aliases,
            by_alias,
        };

        let defaults: Vec<String> = defaults
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| selector.is_allowed(name))
            .collect();
        selector.defaults = if defaults.is_empty() {
            selector.allowed.clone()
        } else {
            defaults
        };

        selector
    }

    /// Build from the `cluster` configuration section.
    pub fn from_settings(settings: &ClusterSettings) -> Self {
        Self::new(
            settings.indices.clone(),
            settings.default_indices.clone(),
            settings.index_aliases.clone(),
        )
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    pub fn aliases(&self) -> &[IndexAlias] {
        &self.aliases
    }

    /// Check whether a name may be searched, directly or through any alias
    /// entry linking it to an allowed name.
    pub fn is_allowed(&self, name: &str) -> bool {
        self.permitted.contains(name)
    }

    /// Resolve the indices for one request.
    ///
    /// Returns the allowed candidates in input order, or the defaults when no
    /// candidate is usable.
    pub fn resolve_active(&self, candidates: Option<&[String]>) -> Vec<String> {
        let mut seen = HashSet::new();
        let active: Vec<String> = candidates
            .unwrap_or_default()
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty() && self.is_allowed(name))
            .filter(|name| seen.insert(name.to_string()))
            .map(str::to_string)
            .collect();

        if active.is_empty() {
            debug!(candidates = ?candidates, "No usable index requested, using defaults");
            return self.defaults.clone();
        }
        active
    }

    /// Map an alias to its backend index name; other names are returned as-is.
    pub fn canonical_index<'a>(&'a self, name: &'a str) -> &'a str {
        self.by_alias.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Display name for a raw backend index.
    ///
    /// Falls back to the raw name when the alias entry has no display name.
    pub fn display_name(&self, index: &str) -> String {
        self.aliases
            .iter()
            .find(|entry| entry.index == index || (!entry.alias.is_empty() && entry.alias == index))
            .and_then(|entry| entry.display_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| index.to_string())
    }
}

/// All names reachable from `allowed` over alias links, `allowed` included.
fn linked_names(allowed: &[String], links: &HashMap<&str, Vec<&str>>) -> HashSet<String> {
    let mut permitted: HashSet<String> = allowed.iter().cloned().collect();
    let mut queue: VecDeque<&str> = allowed.iter().map(String::as_str).collect();
    while let Some(name) = queue.pop_front() {
        for &next in links.get(name).into_iter().flatten() {
            if permitted.insert(next.to_string()) {
                queue.push_back(next);
            }
        }
    }
    permitted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias(index: &str, alias: &str, display: Option<&str>) -> IndexAlias {
        IndexAlias {
            index: index.to_string(),
            alias: alias.to_string(),
            display_name: display.map(str::to_string),
        }
    }

    fn selector() -> IndexSelector {
        IndexSelector::new(
            vec!["cw09".to_string(), "webis_warc_clueweb12_011".to_string(), "cc1511".to_string()],
            vec!["cw12".to_string()],
            vec![
                alias("webis_warc_clueweb09_003", "cw09", Some("ClueWeb09")),
                alias("webis_warc_clueweb12_011", "cw12", Some("ClueWeb12")),
                alias("webis_warc_commoncrawl15_002", "cc1511", None),
            ],
        )
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_alias_pairs_allowed_symmetrically() {
        let selector = selector();
        for entry in selector.aliases() {
            assert_eq!(
                selector.is_allowed(&entry.alias),
                selector.is_allowed(&entry.index),
                "alias {} and index {} disagree",
                entry.alias,
                entry.index
            );
        }
        assert!(selector.is_allowed("cw12"));
        assert!(selector.is_allowed("webis_warc_clueweb09_003"));
        assert!(!selector.is_allowed("totally_invalid"));
    }

    #[test]
    fn test_index_with_several_aliases() {
        let selector = IndexSelector::new(
            names(&["cw12"]),
            Vec::new(),
            vec![
                alias("webis_cw12", "cw12", None),
                alias("webis_cw12", "clueweb12", None),
                alias("webis_cw12_raw", "clueweb12", None),
            ],
        );
        for entry in selector.aliases() {
            assert_eq!(
                selector.is_allowed(&entry.alias),
                selector.is_allowed(&entry.index),
                "alias {} and index {} disagree",
                entry.alias,
                entry.index
            );
        }
        assert!(selector.is_allowed("webis_cw12"));
        assert!(selector.is_allowed("clueweb12"));
        assert!(selector.is_allowed("webis_cw12_raw"));
        assert_eq!(selector.canonical_index("clueweb12"), "webis_cw12");
    }

    #[test]
    fn test_unrelated_aliases_stay_blocked() {
        let selector = IndexSelector::new(
            names(&["a"]),
            Vec::new(),
            vec![alias("b_index", "b", None), alias("a_index", "a", None)],
        );
        assert!(selector.is_allowed("a_index"));
        assert!(!selector.is_allowed("b"));
        assert!(!selector.is_allowed("b_index"));
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let selector = selector();
        let defaults = selector.defaults().to_vec();
        assert_eq!(defaults, names(&["cw12"]));
        assert_eq!(selector.resolve_active(None), defaults);
        assert_eq!(selector.resolve_active(Some(Vec::new().as_slice())), defaults);
        assert_eq!(
            selector.resolve_active(Some(names(&["totally_invalid"]).as_slice())),
            defaults
        );
    }

    #[test]
    fn test_resolve_keeps_order_and_trims() {
        let selector = selector();
        let active = selector.resolve_active(Some(
            names(&[" cc1511", "bogus", "cw09 ", "cc1511"]).as_slice(),
        ));
        assert_eq!(active, names(&["cc1511", "cw09"]));
    }

    #[test]
    fn test_defaults_fall_back_to_allowed() {
        let selector = IndexSelector::new(names(&["a", "b"]), Vec::new(), Vec::new());
        assert_eq!(selector.defaults(), &names(&["a", "b"])[..]);
        assert_eq!(selector.resolve_active(None), names(&["a", "b"]));
    }

    #[test]
    fn test_invalid_defaults_are_dropped() {
        let selector = IndexSelector::new(names(&["a"]), names(&["zzz"]), Vec::new());
        assert_eq!(selector.defaults(), &names(&["a"])[..]);
    }

    #[test]
    fn test_display_name_resolution() {
        let selector = selector();
        assert_eq!(selector.display_name("webis_warc_clueweb12_011"), "ClueWeb12");
        assert_eq!(selector.display_name("cw09"), "ClueWeb09");
        assert_eq!(
            selector.display_name("webis_warc_commoncrawl15_002"),
            "webis_warc_commoncrawl15_002"
        );
        assert_eq!(selector.display_name("unknown_index"), "unknown_index");
    }

    #[test]
    fn test_canonical_index() {
        let selector = selector();
        assert_eq!(selector.canonical_index("cw12"), "webis_warc_clueweb12_011");
        assert_eq!(selector.canonical_index("cc1511_raw"), "cc1511_raw");
    }
}
