//! Category display model

use serde::Serialize;
use tabled::Tabled;

use crate::export::Category;

/// Category display model for table/JSON output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct CategoryDisplay {
    /// Key accepted by `export --types`
    #[tabled(rename = "KEY")]
    pub key: String,

    /// REST resource path
    #[tabled(rename = "RESOURCE PATH")]
    pub resource_path: String,
}

impl From<&Category> for CategoryDisplay {
    fn from(category: &Category) -> Self {
        Self {
            key: category.key.clone(),
            resource_path: category.resource_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display_from_category() {
        let category = Category {
            key: "jobmonitors".to_string(),
            resource_path: "/setting/batchjobs".to_string(),
        };

        let display = CategoryDisplay::from(&category);

        assert_eq!(display.key, "jobmonitors");
        assert_eq!(display.resource_path, "/setting/batchjobs");
    }
}
