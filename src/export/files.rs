//! File naming and JSON materialization for exported items

use std::path::{Path, PathBuf};

use log::warn;
use serde::Serialize;
use serde_json::Value;

use crate::client::pagination::Item;
use crate::error::Result;

/// Maximum length of a sanitized filename fragment, in characters.
pub const MAX_NAME_LEN: usize = 160;

/// Maximum length of a sanitized filename fragment, in bytes.
pub const MAX_NAME_BYTES: usize = 200;

/// Maximum length of the id segment of an item filename, in bytes.
///
/// With [`MAX_NAME_BYTES`], `__` and `.json` this keeps filenames within 255 bytes.
pub const MAX_ID_BYTES: usize = 48;

/// Name used when an item carries no usable display name.
pub const UNNAMED: &str = "unnamed";

/// Aggregate file holding every item of a category.
pub const INDEX_FILE: &str = "index.json";

/// Marker written when a category fails.
pub const ERROR_FILE: &str = "_error.txt";

/// Suffix of the hidden directory a category is staged in.
const STAGING_SUFFIX: &str = ".partial";

fn is_safe(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '(' | ')' | '@' | '[' | ']' | ' ')
}

/// Cut `s` to at most `max_chars` characters and `max_bytes` bytes, on a char
/// boundary, then drop trailing whitespace.
fn clip(s: &str, max_chars: usize, max_bytes: usize) -> &str {
    let mut end = 0;
    for (count, (idx, c)) in s.char_indices().enumerate() {
        if count == max_chars || idx + c.len_utf8() > max_bytes {
            break;
        }
        end = idx + c.len_utf8();
    }
    s[..end].trim_end()
}

/// Make a filesystem-safe filename fragment.
///
/// Trims, collapses whitespace runs to one space, replaces each run of other
/// unsafe characters with `_`, and truncates to [`MAX_NAME_LEN`] characters
/// and [`MAX_NAME_BYTES`] bytes.
pub fn safe_filename(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut out = String::with_capacity(collapsed.len());
    let mut in_unsafe_run = false;
    for c in collapsed.chars() {
        if is_safe(c) {
            out.push(c);
            in_unsafe_run = false;
        } else if !in_unsafe_run {
            out.push('_');
            in_unsafe_run = true;
        }
    }

    let out = clip(&out, MAX_NAME_LEN, MAX_NAME_BYTES);
    if out.is_empty() {
        return UNNAMED.to_string();
    }
    out.to_string()
}

/// Render a JSON scalar as plain text (strings without quotes).
fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a value counts as present for naming (non-empty, non-zero, non-null).
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Display name of an item: `name`, else `displayName`, else `unnamed`.
pub fn display_name(item: &Item) -> String {
    ["name", "displayName"]
        .iter()
        .filter_map(|key| item.get(*key))
        .find(|v| is_present(v))
        .map(plain_text)
        .unwrap_or_else(|| UNNAMED.to_string())
}

/// Filename for one item: `<id>__<name>.json`, or `<name>.json` without an id.
pub fn item_filename(item: &Item) -> String {
    let name = safe_filename(&display_name(item));
    match item.get("id").filter(|id| !id.is_null()) {
        Some(id) => {
            let id = safe_filename(&plain_text(id));
            format!("{}__{}.json", clip(&id, MAX_NAME_LEN, MAX_ID_BYTES), name)
        }
        None => format!("{}.json", name),
    }
}

/// Write a value as two-space indented JSON, keeping non-ASCII text as-is.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Hidden sibling of `dir` used while its new contents are written.
pub fn staging_dir(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dir.with_file_name(format!(".{}{}", name, STAGING_SUFFIX))
}

/// Build the new contents of `dir` in a staging directory, then swap them in.
///
/// `fill` gets an empty staging directory. If it fails, the staging directory
/// is removed and `dir` is left exactly as it was.
pub fn replace_dir_with<F>(dir: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let staging = staging_dir(dir);
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;

    if let Err(err) = fill(&staging) {
        if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
            warn!("Could not remove {}: {}", staging.display(), cleanup);
        }
        return Err(err);
    }

    if dir.exists() {
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::rename(&staging, dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn item(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            _ => panic!("test item must be an object"),
        }
    }

    #[test]
    fn test_safe_filename_replaces_separators() {
        let name = safe_filename("CPU% / Usage (Total)");
        assert_eq!(name, "CPU_ _ Usage (Total)");
        assert!(!name.contains('/'));
        assert!(!name.contains('\\'));
        assert!(name.contains("(Total)"));
    }

    #[test]
    fn test_safe_filename_collapses_whitespace() {
        assert_eq!(safe_filename("  Disk \t\n  Usage   "), "Disk Usage");
    }

    #[test]
    fn test_safe_filename_keeps_allowed_punctuation() {
        assert_eq!(
            safe_filename("snmp@host [v2]-a.b_c"),
            "snmp@host [v2]-a.b_c"
        );
    }

    #[test]
    fn test_safe_filename_collapses_unsafe_runs() {
        assert_eq!(safe_filename("a:*?\"<>|b"), "a_b");
        assert_eq!(safe_filename("..\\..\\etc"), ".._.._etc");
    }

    #[test]
    fn test_safe_filename_keeps_unicode_word_chars() {
        assert_eq!(safe_filename("Température CPU"), "Température CPU");
    }

    #[test]
    fn test_safe_filename_truncates() {
        let long = "x".repeat(300);
        assert_eq!(safe_filename(&long).chars().count(), MAX_NAME_LEN);

        // Truncation never leaves trailing whitespace
        let spaced = format!("{} tail", "y".repeat(MAX_NAME_LEN - 1));
        let result = safe_filename(&spaced);
        assert_eq!(result, "y".repeat(MAX_NAME_LEN - 1));
    }

    #[test]
    fn test_safe_filename_caps_bytes_of_multibyte_names() {
        let result = safe_filename(&"字".repeat(150));
        assert!(result.len() <= MAX_NAME_BYTES);
        assert_eq!(result, "字".repeat(MAX_NAME_BYTES / 3));
    }

    #[test]
    fn test_safe_filename_empty_falls_back() {
        assert_eq!(safe_filename(""), UNNAMED);
        assert_eq!(safe_filename("   "), UNNAMED);
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name(&item(json!({"name": "CPU"}))), "CPU");
        assert_eq!(
            display_name(&item(json!({"name": "", "displayName": "Shown"}))),
            "Shown"
        );
        assert_eq!(display_name(&item(json!({"name": null}))), UNNAMED);
        assert_eq!(display_name(&item(json!({}))), UNNAMED);
        assert_eq!(display_name(&item(json!({"name": 42}))), "42");
    }

    #[test]
    fn test_item_filename_with_id() {
        let file = item_filename(&item(json!({"id": 123, "name": "CPU% / Usage (Total)"})));
        assert_eq!(file, "123__CPU_ _ Usage (Total).json");
    }

    #[test]
    fn test_item_filename_string_id_is_sanitized() {
        let file = item_filename(&item(json!({"id": "a/b", "name": "x"})));
        assert_eq!(file, "a_b__x.json");
    }

    #[test]
    fn test_item_filename_without_id() {
        assert_eq!(item_filename(&item(json!({"name": "Ping"}))), "Ping.json");
        assert_eq!(
            item_filename(&item(json!({"id": null, "name": "Ping"}))),
            "Ping.json"
        );
        assert_eq!(item_filename(&item(json!({}))), "unnamed.json");
    }

    #[test]
    fn test_item_filename_fits_name_max() {
        let file = item_filename(&item(json!({
            "id": "9".repeat(300),
            "name": "é".repeat(159),
        })));
        assert!(file.len() <= 255, "{} bytes", file.len());
        assert!(file.starts_with(&"9".repeat(MAX_ID_BYTES)));
        assert!(file.ends_with(".json"));
    }

    #[test]
    fn test_item_filename_zero_id_is_kept() {
        assert_eq!(
            item_filename(&item(json!({"id": 0, "name": "Root"}))),
            "0__Root.json"
        );
    }

    #[test]
    fn test_write_json_pretty_and_ordered() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("item.json");
        let value = item(json!({"zeta": 1, "alpha": "é"}));

        write_json(&path, &value).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "{\n  \"zeta\": 1,\n  \"alpha\": \"é\"\n}");
    }

    #[test]
    fn test_staging_dir_is_hidden_sibling() {
        assert_eq!(
            staging_dir(Path::new("out/oids")),
            PathBuf::from("out/.oids.partial")
        );
    }

    #[test]
    fn test_replace_dir_with_swaps_contents() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("oids");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("_error.txt"), "old\n").unwrap();
        std::fs::write(dir.join("7__gone.json"), "{}").unwrap();

        replace_dir_with(&dir, |staging| write_json(&staging.join(INDEX_FILE), &json!([])))
            .unwrap();

        let mut names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec![INDEX_FILE]);
        assert!(!staging_dir(&dir).exists());
    }

    #[test]
    fn test_replace_dir_with_failed_item_write_leaves_dir_untouched() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("oids");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("1__kept.json"), "{}").unwrap();

        let result = replace_dir_with(&dir, |staging| {
            write_json(&staging.join(INDEX_FILE), &json!([{"id": 1}, {"id": 2}]))?;
            write_json(&staging.join("1__a.json"), &json!({"id": 1}))?;
            // The second item lands in a directory that does not exist
            write_json(&staging.join("missing").join("2__b.json"), &json!({"id": 2}))
        });

        assert!(result.is_err());
        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["1__kept.json"]);
        assert!(!staging_dir(&dir).exists());
    }
}
