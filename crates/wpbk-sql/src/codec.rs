//! # Identifier Rewrite Codec
//!
//! Translates table identifiers between the live, prefix-bound form
//! (`wp_posts`) and a portable form carrying an intermediate prefix
//! (`LIVE_posts`), so a dump exported from one installation replays under
//! another installation's prefix.
//!
//! ## Map construction
//!
//! 1. Live tables under the base prefix, as the catalog reports them.
//! 2. Every table of the four fixed catalogs, base prefix prepended, even
//!    when absent from this installation.
//! 3. Duplicates dropped, first occurrence kept.
//! 4. Key per table: the name itself in identity mode, otherwise the
//!    intermediate prefix plus the name with the base prefix removed. A name
//!    that does not start with the base prefix is keyed by its bare name.
//! 5. Portable mode adds the catch-all `intermediate → base` pair.
//!
//! ## Statement matching
//!
//! Closed-world text substitution over the four statement shapes the
//! export pipeline writes, one per line:
//!
//! - `DROP TABLE IF EXISTS`
//! - `CREATE TABLE IF NOT EXISTS`
//! - `INSERT INTO`
//! - `CREATE [OR REPLACE] ... VIEW`
//!
//! This is not a SQL parser and must not be pointed at hand-written SQL.

use std::cell::OnceCell;
use std::collections::HashSet;

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use wpbk_core::{TablePrefix, ValidationError};

use crate::catalog::TableCatalog;
use crate::error::CodecError;
use crate::map::IdentifierMap;

/// Statement openers, case-insensitive. Group 1 of every matcher.
const STATEMENT_OPENERS: &str = r"(?i:DROP\s+TABLE\s+IF\s+EXISTS|CREATE\s+TABLE\s+IF\s+NOT\s+EXISTS|INSERT\s+INTO|CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?-u:.)*?\s+)?VIEW)";

/// First byte after an identifier: anything that cannot continue an
/// unquoted name (ASCII letters, digits, `_`, `$`, bytes of non-ASCII
/// characters) and is not a backtick.
const IDENTIFIER_END: &str = r"(?-u:[^A-Za-z0-9_$`\x80-\xFF])";

/// Which way a dump is being rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Live names → portable names, while writing a dump.
    Export,
    /// Portable names → live names, while replaying a dump.
    Import,
}

/// Build the line matcher for statements naming `replacement`.
///
/// Captures the statement opener (group 1), the identifier (group 2), and
/// everything after the identifier and its closing backtick (group 3).
/// The identifier must be followed by a backtick, a byte that cannot
/// continue an unquoted identifier, or the end of the line, so a bare
/// prefix never matches a longer table name, whatever its last character.
/// `original` is the identifier the line will carry after rewriting and
/// only labels the matcher in logs.
///
/// Matches raw bytes: dump rows may carry binary data that is not UTF-8.
pub fn build_matcher(original: &str, replacement: &str) -> Result<Regex, CodecError> {
    let pattern = format!(
        r"^({STATEMENT_OPENERS})\s+`?({})`?((?:{IDENTIFIER_END}(?-u:.)*)?)$",
        regex::escape(replacement)
    );
    tracing::trace!(original, replacement, "building statement matcher");
    Regex::new(&pattern).map_err(|source| CodecError::Pattern {
        identifier: replacement.to_string(),
        source,
    })
}

/// Build the replacement template for a matcher: opener, then `value` in
/// backticks, then the untouched remainder. `name` is the identifier being
/// replaced and only labels the template in logs.
pub fn build_replacement(name: &str, value: &str) -> String {
    tracing::trace!(name, value, "building statement replacement");
    format!("${{1}} `{}`${{3}}", value.replace('$', "$$"))
}

// ---------------------------------------------------------------------------
// RewriteRule
// ---------------------------------------------------------------------------

/// One compiled identifier substitution.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    from: String,
    to: String,
    matcher: Regex,
    template: String,
}

impl RewriteRule {
    /// Compile a rule rewriting statements on `from` into statements on `to`.
    pub fn new(from: &str, to: &str) -> Result<Self, CodecError> {
        Ok(Self {
            from: from.to_string(),
            to: to.to_string(),
            matcher: build_matcher(to, from)?,
            template: build_replacement(from, to),
        })
    }

    /// Identifier this rule looks for.
    pub fn from_identifier(&self) -> &str {
        &self.from
    }

    /// Identifier this rule writes.
    pub fn to_identifier(&self) -> &str {
        &self.to
    }

    /// Rewrite `line` (without its line terminator) if it matches.
    pub fn apply(&self, line: &[u8]) -> Option<Vec<u8>> {
        if !self.matcher.is_match(line) {
            return None;
        }
        Some(
            self.matcher
                .replace(line, self.template.as_bytes())
                .into_owned(),
        )
    }
}

// ---------------------------------------------------------------------------
// IdentifierCodec
// ---------------------------------------------------------------------------

/// Builds and caches the identifier map for one export or import.
///
/// The map is computed on first use and never changes afterwards. The
/// cache is not shareable across threads; create one codec per operation.
#[derive(Debug)]
pub struct IdentifierCodec<C> {
    catalog: C,
    base_prefix: TablePrefix,
    intermediate_prefix: TablePrefix,
    map: OnceCell<IdentifierMap>,
}

impl<C: TableCatalog> IdentifierCodec<C> {
    /// Create a codec. An empty `intermediate_prefix` selects identity mode.
    pub fn new(
        catalog: C,
        base_prefix: TablePrefix,
        intermediate_prefix: TablePrefix,
    ) -> Result<Self, CodecError> {
        if base_prefix.is_empty() {
            return Err(ValidationError::EmptyBasePrefix.into());
        }
        Ok(Self {
            catalog,
            base_prefix,
            intermediate_prefix,
            map: OnceCell::new(),
        })
    }

    /// Identity-mode codec: every key is the live table name.
    pub fn identity(catalog: C, base_prefix: TablePrefix) -> Result<Self, CodecError> {
        Self::new(catalog, base_prefix, TablePrefix::default())
    }

    /// Installation base prefix.
    pub fn base_prefix(&self) -> &TablePrefix {
        &self.base_prefix
    }

    /// Portable placeholder prefix; empty in identity mode.
    pub fn intermediate_prefix(&self) -> &TablePrefix {
        &self.intermediate_prefix
    }

    /// The identifier map, computed on the first call and cached.
    pub fn get_replacements(&self) -> Result<&IdentifierMap, CodecError> {
        if let Some(map) = self.map.get() {
            return Ok(map);
        }
        let map = self.compute_map()?;
        Ok(self.map.get_or_init(|| map))
    }

    /// Compiled rules for `direction`, in map order. Pairs whose key equals
    /// their target need no rewrite and produce no rule.
    pub fn rules(&self, direction: Direction) -> Result<Vec<RewriteRule>, CodecError> {
        let map = self.get_replacements()?;
        map.iter()
            .filter(|(key, target)| key != target)
            .map(|(key, target)| match direction {
                Direction::Export => RewriteRule::new(target, key),
                Direction::Import => RewriteRule::new(key, target),
            })
            .collect()
    }

    fn compute_map(&self) -> Result<IdentifierMap, CodecError> {
        let base = &self.base_prefix;
        let live = self.catalog.list_tables_with_prefix(base)?;

        let defaults = self
            .catalog
            .core_tables()
            .iter()
            .chain(self.catalog.old_tables())
            .chain(self.catalog.global_tables())
            .chain(self.catalog.ms_global_tables())
            .map(|t| format!("{base}{t}"));

        let mut seen = HashSet::new();
        let tables: Vec<String> = live
            .into_iter()
            .chain(defaults)
            .filter(|t| seen.insert(t.clone()))
            .collect();

        let mut map = IdentifierMap::new();
        for table in tables {
            let key = if self.intermediate_prefix.is_empty() {
                table.clone()
            } else {
                match base.strip(&table) {
                    Some(rest) => format!("{}{rest}", self.intermediate_prefix),
                    None => {
                        tracing::warn!(
                            table = %table,
                            base_prefix = %base,
                            "table does not start with the base prefix; keyed by its bare name"
                        );
                        table.clone()
                    }
                }
            };
            map.insert(key, table);
        }
        if !self.intermediate_prefix.is_empty() {
            map.insert(self.intermediate_prefix.as_str(), base.as_str());
        }

        tracing::debug!(
            pairs = map.len(),
            identity = self.intermediate_prefix.is_empty(),
            "computed identifier map"
        );
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{StaticCatalog, CORE_TABLES, GLOBAL_TABLES, MS_GLOBAL_TABLES, OLD_TABLES};

    fn prefix(s: &str) -> TablePrefix {
        TablePrefix::new(s).unwrap()
    }

    fn rewrite(matcher: &Regex, template: &str, line: &str) -> String {
        String::from_utf8(matcher.replace(line.as_bytes(), template.as_bytes()).into_owned())
            .unwrap()
    }

    #[test]
    fn identity_mode_maps_every_table_to_itself() {
        let catalog = StaticCatalog::new(["wp_posts", "wp_custom_log"]);
        let codec = IdentifierCodec::identity(catalog, prefix("wp_")).unwrap();
        let map = codec.get_replacements().unwrap();
        assert!(!map.is_empty());
        for (key, target) in map.iter() {
            assert_eq!(key, target);
        }
        assert_eq!(map.get("wp_custom_log"), Some("wp_custom_log"));
        assert_eq!(map.get("wp_"), None, "identity mode has no catch-all");
    }

    #[test]
    fn portable_mode_strips_base_prefix() {
        let catalog = StaticCatalog::new(["wp_posts"]);
        let codec = IdentifierCodec::new(catalog, prefix("wp_"), prefix("LIVE_")).unwrap();
        let map = codec.get_replacements().unwrap();
        assert_eq!(map.get("LIVE_posts"), Some("wp_posts"));
        assert_eq!(map.get("LIVE_"), Some("wp_"));
        assert_eq!(map.pairs().last().unwrap(), &("LIVE_".to_string(), "wp_".to_string()));
    }

    #[test]
    fn discovery_order_is_live_then_defaults_then_catch_all() {
        let catalog = StaticCatalog::new(["wp_zz_plugin", "wp_posts"]);
        let codec = IdentifierCodec::new(catalog, prefix("wp_"), prefix("LIVE_")).unwrap();
        let map = codec.get_replacements().unwrap();
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys[0], "LIVE_zz_plugin");
        assert_eq!(keys[1], "LIVE_posts");
        // wp_posts was live, so the default catalog does not add it again.
        assert_eq!(keys.iter().filter(|k| **k == "LIVE_posts").count(), 1);
        let defaults = CORE_TABLES.len() + OLD_TABLES.len() + GLOBAL_TABLES.len()
            + MS_GLOBAL_TABLES.len();
        // One live-only table, defaults (wp_posts among them), catch-all.
        assert_eq!(map.len(), 1 + defaults + 1);
        assert_eq!(keys.last(), Some(&"LIVE_"));
    }

    #[test]
    fn default_catalogs_are_included_when_absent() {
        let codec =
            IdentifierCodec::new(StaticCatalog::default(), prefix("wp_"), prefix("LIVE_")).unwrap();
        let map = codec.get_replacements().unwrap();
        assert_eq!(map.get("LIVE_sitemeta"), Some("wp_sitemeta"));
        assert_eq!(map.get("LIVE_post2cat"), Some("wp_post2cat"));
        assert_eq!(map.get("LIVE_usermeta"), Some("wp_usermeta"));
    }

    #[test]
    fn prefix_mismatch_is_keyed_by_bare_name() {
        // The catalog matches case-insensitively, so WP_legacy is listed
        // even though it does not start with "wp_". It must not inherit
        // the key of a previously processed table.
        let catalog = StaticCatalog::new(["wp_first", "WP_legacy"]);
        let codec = IdentifierCodec::new(catalog, prefix("wp_"), prefix("LIVE_")).unwrap();
        let map = codec.get_replacements().unwrap();
        assert_eq!(map.get("LIVE_first"), Some("wp_first"));
        assert_eq!(map.get("WP_legacy"), Some("WP_legacy"));
        assert_eq!(map.get("LIVE_legacy"), None);
    }

    #[test]
    fn map_is_cached_per_instance() {
        let codec = IdentifierCodec::new(
            StaticCatalog::new(["wp_posts"]),
            prefix("wp_"),
            prefix("LIVE_"),
        )
        .unwrap();
        let first = codec.get_replacements().unwrap() as *const IdentifierMap;
        let second = codec.get_replacements().unwrap() as *const IdentifierMap;
        assert_eq!(first, second);
    }

    #[test]
    fn empty_base_prefix_is_rejected() {
        let err = IdentifierCodec::identity(StaticCatalog::default(), TablePrefix::default())
            .unwrap_err();
        assert!(matches!(err, CodecError::Validation(ValidationError::EmptyBasePrefix)));
    }

    #[test]
    fn create_table_rewrite_preserves_trailing_clause() {
        let line = "CREATE TABLE IF NOT EXISTS `wp_posts` (id INT);";
        let matcher = build_matcher("LIVE_posts", "wp_posts").unwrap();
        assert!(matcher.is_match(line.as_bytes()));
        let template = build_replacement("wp_posts", "LIVE_posts");
        assert_eq!(
            rewrite(&matcher, &template, line),
            "CREATE TABLE IF NOT EXISTS `LIVE_posts` (id INT);"
        );
    }

    #[test]
    fn matcher_captures_three_groups() {
        let matcher = build_matcher("LIVE_posts", "wp_posts").unwrap();
        let caps = matcher
            .captures(b"INSERT INTO `wp_posts` VALUES (1,'a');")
            .unwrap();
        assert_eq!(&caps[1], b"INSERT INTO");
        assert_eq!(&caps[2], b"wp_posts");
        assert_eq!(&caps[3], b" VALUES (1,'a');");
    }

    #[test]
    fn all_statement_openers_are_recognized() {
        let matcher = build_matcher("LIVE_posts", "wp_posts").unwrap();
        for line in [
            "DROP TABLE IF EXISTS `wp_posts`;",
            "drop table if exists wp_posts;",
            "CREATE TABLE IF NOT EXISTS `wp_posts` (",
            "INSERT INTO `wp_posts` VALUES (1);",
            "CREATE VIEW `wp_posts` AS SELECT 1;",
            "CREATE OR REPLACE VIEW `wp_posts` AS SELECT 1;",
            "CREATE ALGORITHM=UNDEFINED DEFINER=`root`@`localhost` SQL SECURITY DEFINER VIEW `wp_posts` AS select 1;",
        ] {
            assert!(matcher.is_match(line.as_bytes()), "should match: {line}");
        }
    }

    #[test]
    fn other_statements_are_left_alone() {
        let matcher = build_matcher("LIVE_posts", "wp_posts").unwrap();
        for line in [
            "SELECT * FROM `wp_posts`;",
            "UPDATE `wp_posts` SET x = 1;",
            "CREATE TABLE `wp_posts` (",
            "-- INSERT INTO `wp_posts`",
            "INSERT INTO `wp_postmeta` VALUES (1);",
            "INSERT INTO `wp_posts_archive` VALUES (1);",
        ] {
            assert!(!matcher.is_match(line.as_bytes()), "should not match: {line}");
        }
    }

    #[test]
    fn identifier_match_is_case_sensitive() {
        let matcher = build_matcher("LIVE_posts", "wp_posts").unwrap();
        assert!(!matcher.is_match(b"INSERT INTO `WP_POSTS` VALUES (1);"));
    }

    #[test]
    fn bare_prefix_only_matches_whole_token() {
        let matcher = build_matcher("LIVE_", "wp_").unwrap();
        assert!(matcher.is_match(b"INSERT INTO `wp_` VALUES (1);"));
        assert!(matcher.is_match(b"DROP TABLE IF EXISTS wp_;"));
        assert!(!matcher.is_match(b"INSERT INTO `wp_posts` VALUES (1);"));
    }

    #[test]
    fn prefix_ending_in_dollar_only_matches_whole_token() {
        let matcher = build_matcher("LIVE_", "wp$").unwrap();
        assert!(matcher.is_match(b"INSERT INTO `wp$` VALUES (1);"));
        assert!(matcher.is_match(b"DROP TABLE IF EXISTS wp$;"));
        assert!(matcher.is_match(b"DROP TABLE IF EXISTS wp$"));
        assert!(!matcher.is_match(b"INSERT INTO `wp$plugin_log` VALUES (1);"));
        assert!(!matcher.is_match(b"INSERT INTO wp$plugin_log VALUES (1);"));
    }

    #[test]
    fn identifier_does_not_match_longer_dollar_or_non_ascii_names() {
        let matcher = build_matcher("LIVE_posts", "wp_posts").unwrap();
        assert!(!matcher.is_match(b"INSERT INTO `wp_posts$old` VALUES (1);"));
        assert!(!matcher.is_match("INSERT INTO wp_postsé VALUES (1);".as_bytes()));
        assert!(matcher.is_match(b"INSERT INTO wp_posts(ID) VALUES (1);"));
    }

    #[test]
    fn dollar_base_prefix_export_keeps_unknown_tables_intact() {
        let codec = IdentifierCodec::new(
            StaticCatalog::new(["wp$posts"]),
            TablePrefix::base("wp$").unwrap(),
            prefix("LIVE_"),
        )
        .unwrap();
        let rules = codec.rules(Direction::Export).unwrap();
        let apply = |line: &str| -> String {
            let bytes = line.as_bytes();
            let out = rules
                .iter()
                .find_map(|r| r.apply(bytes))
                .unwrap_or_else(|| bytes.to_vec());
            String::from_utf8(out).unwrap()
        };
        assert_eq!(
            apply("INSERT INTO `wp$plugin_log` VALUES (1);"),
            "INSERT INTO `wp$plugin_log` VALUES (1);"
        );
        assert_eq!(
            apply("INSERT INTO `wp$posts` VALUES (1);"),
            "INSERT INTO `LIVE_posts` VALUES (1);"
        );
        assert_eq!(
            apply("DROP TABLE IF EXISTS `wp$`;"),
            "DROP TABLE IF EXISTS `LIVE_`;"
        );
    }

    #[test]
    fn replacement_escapes_dollar_signs() {
        let matcher = build_matcher("wp$x", "wp_x").unwrap();
        let template = build_replacement("wp_x", "site$1_x");
        assert_eq!(
            rewrite(&matcher, &template, "DROP TABLE IF EXISTS `wp_x`;"),
            "DROP TABLE IF EXISTS `site$1_x`;"
        );
    }

    #[test]
    fn unquoted_identifier_is_quoted_on_rewrite() {
        let matcher = build_matcher("LIVE_posts", "wp_posts").unwrap();
        let template = build_replacement("wp_posts", "LIVE_posts");
        assert_eq!(
            rewrite(&matcher, &template, "INSERT INTO wp_posts VALUES (1);"),
            "INSERT INTO `LIVE_posts` VALUES (1);"
        );
    }

    #[test]
    fn export_and_import_rules_are_mirrored() {
        let codec = IdentifierCodec::new(
            StaticCatalog::new(["wp_posts"]),
            prefix("wp_"),
            prefix("LIVE_"),
        )
        .unwrap();
        let export = codec.rules(Direction::Export).unwrap();
        let import = codec.rules(Direction::Import).unwrap();
        assert_eq!(export.len(), import.len());
        assert_eq!(
            (export[0].from_identifier(), export[0].to_identifier()),
            ("wp_posts", "LIVE_posts")
        );
        assert_eq!(
            (import[0].from_identifier(), import[0].to_identifier()),
            ("LIVE_posts", "wp_posts")
        );
    }

    #[test]
    fn identity_mode_produces_no_rules() {
        let codec =
            IdentifierCodec::identity(StaticCatalog::new(["wp_posts"]), prefix("wp_")).unwrap();
        assert!(codec.rules(Direction::Export).unwrap().is_empty());
        assert!(codec.rules(Direction::Import).unwrap().is_empty());
    }

    #[test]
    fn catalog_failure_surfaces() {
        struct Offline;
        impl TableCatalog for Offline {
            fn list_tables_with_prefix(
                &self,
                _prefix: &TablePrefix,
            ) -> Result<Vec<String>, crate::CatalogError> {
                Err(crate::CatalogError::Query("server has gone away".into()))
            }
        }
        let codec = IdentifierCodec::identity(Offline, prefix("wp_")).unwrap();
        assert!(matches!(
            codec.get_replacements(),
            Err(CodecError::Catalog(_))
        ));
    }
}
