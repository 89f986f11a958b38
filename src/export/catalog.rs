//! Category registry: which export keys map to which API resource paths

use serde::Serialize;

/// One exportable category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Key used on the command line and as the output subdirectory name
    pub key: String,
    /// Resource path under `/santaba/rest`
    pub resource_path: String,
}

/// LogicModule categories exported by default.
const LOGIC_MODULES: [(&str, &str); 9] = [
    ("datasources", "/setting/datasources"),
    ("eventsources", "/setting/eventsources"),
    ("logsources", "/setting/logsources"),
    ("configsources", "/setting/configsources"),
    ("propertysources", "/setting/propertyrules"),
    ("topologysources", "/setting/topologysources"),
    ("jobmonitors", "/setting/batchjobs"),
    ("appliestofunctions", "/setting/functions"),
    ("oids", "/setting/oids"),
];

/// Immutable, ordered key → resource path table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::logic_modules()
    }
}

impl CategoryRegistry {
    /// The built-in LogicModule catalog.
    pub fn logic_modules() -> Self {
        Self::from_pairs(LOGIC_MODULES)
    }

    /// Build a registry from `(key, resource_path)` pairs, keeping their order.
    pub fn from_pairs<I, K, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<String>,
    {
        Self {
            categories: pairs
                .into_iter()
                .map(|(key, path)| Category {
                    key: key.into(),
                    resource_path: path.into(),
                })
                .collect(),
        }
    }

    /// Look up a category by exact key.
    pub fn get(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// All keys in catalog order.
    pub fn keys(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.key.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Expand requested keys into the list of keys to export.
    ///
    /// Keys are lowercased. If any of them is `all`, the whole catalog is used
    /// in catalog order; otherwise keys pass through unchanged (unknown keys
    /// included, so they can be reported per category).
    pub fn expand(&self, requested: &[String]) -> Vec<String> {
        let requested: Vec<String> = requested.iter().map(|k| k.trim().to_lowercase()).collect();

        if requested.is_empty() || requested.iter().any(|k| k == "all") {
            return self.keys();
        }
        requested
    }
}
