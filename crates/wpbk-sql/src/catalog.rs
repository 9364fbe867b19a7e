//! # Table Catalogs
//!
//! The codec needs two things from the database: the tables that currently
//! exist under the base prefix, and the fixed lists of tables the host
//! application may create. Both come through [`TableCatalog`], injected
//! into the codec rather than reached through a global handle.
//!
//! The fixed lists are unprefixed names; the codec prepends the base prefix.

use std::io::BufRead;
use std::path::Path;

use wpbk_core::TablePrefix;

use crate::error::CatalogError;

/// Per-site tables.
pub const CORE_TABLES: &[&str] = &[
    "posts",
    "comments",
    "links",
    "options",
    "postmeta",
    "terms",
    "term_taxonomy",
    "term_relationships",
    "termmeta",
    "commentmeta",
];

/// Tables dropped by the host long ago but still found in old installs.
pub const OLD_TABLES: &[&str] = &["categories", "post2cat", "link2cat"];

/// Tables shared by every site of an installation.
pub const GLOBAL_TABLES: &[&str] = &["users", "usermeta"];

/// Tables that only exist in multi-site installations.
pub const MS_GLOBAL_TABLES: &[&str] = &[
    "blogs",
    "blogmeta",
    "signups",
    "site",
    "sitemeta",
    "registration_log",
];

/// Source of table names for building an identifier map.
pub trait TableCatalog {
    /// Live tables whose names start with `prefix`, in the order the store
    /// reports them.
    fn list_tables_with_prefix(&self, prefix: &TablePrefix) -> Result<Vec<String>, CatalogError>;

    /// Unprefixed per-site table names.
    fn core_tables(&self) -> &'static [&'static str] {
        CORE_TABLES
    }

    /// Unprefixed legacy table names.
    fn old_tables(&self) -> &'static [&'static str] {
        OLD_TABLES
    }

    /// Unprefixed installation-wide table names.
    fn global_tables(&self) -> &'static [&'static str] {
        GLOBAL_TABLES
    }

    /// Unprefixed multi-site table names.
    fn ms_global_tables(&self) -> &'static [&'static str] {
        MS_GLOBAL_TABLES
    }
}

impl<T: TableCatalog + ?Sized> TableCatalog for &T {
    fn list_tables_with_prefix(&self, prefix: &TablePrefix) -> Result<Vec<String>, CatalogError> {
        (**self).list_tables_with_prefix(prefix)
    }

    fn core_tables(&self) -> &'static [&'static str] {
        (**self).core_tables()
    }

    fn old_tables(&self) -> &'static [&'static str] {
        (**self).old_tables()
    }

    fn global_tables(&self) -> &'static [&'static str] {
        (**self).global_tables()
    }

    fn ms_global_tables(&self) -> &'static [&'static str] {
        (**self).ms_global_tables()
    }
}

// ---------------------------------------------------------------------------
// ListTablesQuery
// ---------------------------------------------------------------------------

/// The one statement the codec needs a database to run:
/// `SHOW TABLES LIKE ?` bound to the escaped prefix followed by `%`.
///
/// The prefix never becomes part of the SQL text. `_` and `%` are `LIKE`
/// wildcards and `\` is its escape character, so all three are escaped in
/// the bound pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTablesQuery {
    prefix: String,
    pattern: String,
}

impl ListTablesQuery {
    /// Parameterized statement text.
    pub const SQL: &'static str = "SHOW TABLES LIKE ?";

    /// Build the query for `prefix`.
    pub fn new(prefix: &TablePrefix) -> Self {
        let mut pattern = String::with_capacity(prefix.as_str().len() * 2 + 1);
        for c in prefix.as_str().chars() {
            if matches!(c, '_' | '%' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Self {
            prefix: prefix.as_str().to_string(),
            pattern,
        }
    }

    /// Statement text with a single positional placeholder.
    pub fn sql(&self) -> &'static str {
        Self::SQL
    }

    /// Bound parameters, in placeholder order.
    pub fn params(&self) -> [&str; 1] {
        [self.pattern.as_str()]
    }

    /// Whether `table` satisfies the pattern under the server's default
    /// case-insensitive collation.
    pub fn matches(&self, table: &str) -> bool {
        table.len() >= self.prefix.len()
            && table.is_char_boundary(self.prefix.len())
            && table[..self.prefix.len()].eq_ignore_ascii_case(&self.prefix)
    }
}

// ---------------------------------------------------------------------------
// StaticCatalog
// ---------------------------------------------------------------------------

/// A catalog over a fixed list of table names, such as a `SHOW TABLES`
/// capture saved next to a dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCatalog {
    tables: Vec<String>,
}

impl StaticCatalog {
    /// Build from table names.
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse one table name per line. Blank lines and `#` comments are
    /// ignored; surrounding whitespace is trimmed.
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut tables = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let name = line.trim();
            if name.is_empty() || name.starts_with('#') {
                continue;
            }
            tables.push(name.to_string());
        }
        Ok(Self { tables })
    }

    /// Read a table list file.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file)).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// All table names, in list order.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }
}

impl TableCatalog for StaticCatalog {
    fn list_tables_with_prefix(&self, prefix: &TablePrefix) -> Result<Vec<String>, CatalogError> {
        let query = ListTablesQuery::new(prefix);
        Ok(self
            .tables
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }
}
