//! Theme manifest management.
//!
//! Themes are directories under a themes root, each described by a JSON
//! manifest (`config/theme.json` or `webroot/theme.json`) optionally
//! augmented by a `composer.json`. Manifest data is merged over a table of
//! built-in defaults: string-templating snippets, CSS class names, icon
//! mappings, and per-routing-prefix overrides.

use crate::{
    cache::CacheService,
    error::{Error, Result},
};
use dashmap::DashMap;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings key naming the active theme.
pub const SITE_THEME_SETTING: &str = "Site.theme";

/// Cache namespace holding framework-level entries such as the file map.
pub const CORE_NAMESPACE: &str = "core";

/// Cache key for the template file map, dropped on theme activation.
pub const FILE_MAP_KEY: &str = "file_map";

/// Store for site settings (the host application's settings table).
pub trait SettingsStore: Send + Sync {
    /// Write a setting.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Read a setting.
    fn read(&self, key: &str) -> Option<String>;
}

/// In-memory settings store using DashMap for thread safety.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: DashMap<String, String>,
}

impl MemorySettings {
    /// Create an empty settings store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.clone())
    }
}

/// Parsed theme manifest, merged over the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeManifest {
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub regions: Vec<String>,
    pub screenshot: Option<String>,
    pub settings: ThemeSettings,
}

impl Default for ThemeManifest {
    fn default() -> Self {
        Self::defaults(None)
    }
}

/// Presentation settings carried by a theme.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeSettings {
    pub templates: BTreeMap<String, String>,
    pub css: BTreeMap<String, String>,
    pub icon_defaults: BTreeMap<String, String>,
    pub icons: BTreeMap<String, String>,
    pub prefixes: BTreeMap<String, PrefixSettings>,
}

/// Overrides applied when rendering under a specific routing prefix.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefixSettings {
    pub css: BTreeMap<String, String>,
    pub helpers: BTreeMap<String, Value>,
}

impl ThemeManifest {
    /// The default manifest every theme starts from before its own files
    /// are merged in.
    pub fn defaults(name: Option<&str>) -> Self {
        let string_map = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };

        let templates = string_map(&[
            ("input", "<input type=\"{{type}}\" name=\"{{name}}\"{{attrs}}/>"),
            ("select", "<select name=\"{{name}}\"{{attrs}}>{{content}}</select>"),
            (
                "selectMultiple",
                "<select name=\"{{name}}[]\" multiple=\"multiple\"{{attrs}}>{{content}}</select>",
            ),
            ("radio", "<input type=\"radio\" name=\"{{name}}\" value=\"{{value}}\"{{attrs}}>"),
            ("textarea", "<textarea name=\"{{name}}\"{{attrs}}>{{value}}</textarea>"),
        ]);

        let css = string_map(&[
            ("columnFull", "col-12"),
            ("columnLeft", "col-md-8"),
            ("columnRight", "col-md-4"),
            ("container", "container"),
            ("containerFluid", "container-fluid"),
            ("dashboardFull", "col-12"),
            ("dashboardLeft", "col-sm-6"),
            ("dashboardRight", "col-sm-6"),
            ("dashboardClass", "sortable-column"),
            ("formInput", "input-block-level"),
            ("imageClass", ""),
            ("row", "row"),
            ("tableClass", "table table-striped"),
            ("thumbnailClass", "img-thumbnail"),
        ]);

        let icon_defaults = string_map(&[
            ("iconSet", "fa"),
            ("largeIconClass", "fa-xl"),
            ("smallIconClass", "fa-sm"),
        ]);

        let icons = string_map(&[
            ("attach", "paperclip"),
            ("check-mark", "check"),
            ("comment", "comment-alt"),
            ("copy", "copy"),
            ("create", "plus"),
            ("delete", "trash"),
            ("error-sign", "exclamation-sign"),
            ("home", "home"),
            ("info-sign", "info-circle"),
            ("inspect", "zoom-in"),
            ("link", "link"),
            ("move-down", "chevron-down"),
            ("move-up", "chevron-up"),
            ("power-off", "power-off"),
            ("power-on", "bolt"),
            ("question-sign", "question-sign"),
            ("read", "eye"),
            ("refresh", "refresh"),
            ("resize", "arrows-alt"),
            ("search", "search"),
            ("success-sign", "ok-sign"),
            ("translate", "flag"),
            ("update", "pencil"),
            ("upload", "upload"),
            ("warning-sign", "warning-sign"),
            ("x-mark", "remove"),
            ("user", "user"),
            ("key", "key"),
            ("view", "eye"),
        ]);

        let default_helpers = |paginator: bool| -> BTreeMap<String, Value> {
            let mut helpers = BTreeMap::new();
            helpers.insert("Html".to_string(), json!({ "className": "ThemedHtml" }));
            helpers.insert("Form".to_string(), json!({ "className": "ThemedForm" }));
            if paginator {
                helpers.insert(
                    "Paginator".to_string(),
                    json!({ "className": "ThemedPaginator" }),
                );
                helpers.insert("Breadcrumbs".to_string(), Value::Null);
            }
            helpers
        };

        let mut prefixes = BTreeMap::new();
        prefixes.insert(
            String::new(),
            PrefixSettings {
                css: BTreeMap::new(),
                helpers: default_helpers(false),
            },
        );
        prefixes.insert(
            "admin".to_string(),
            PrefixSettings {
                css: BTreeMap::new(),
                helpers: default_helpers(true),
            },
        );

        Self {
            name: name.map(str::to_string),
            vendor: None,
            description: None,
            regions: Vec::new(),
            screenshot: None,
            settings: ThemeSettings {
                templates,
                css,
                icon_defaults,
                icons,
                prefixes,
            },
        }
    }
}

/// Deep-merge `overlay` into `base`: objects merge key-by-key, everything
/// else is replaced by the overlay value.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => merge_values(base_value, overlay_value),
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Locates, parses, activates, and deletes themes under a themes root.
pub struct ThemeManager<S = MemorySettings>
where
    S: SettingsStore,
{
    themes_dir: PathBuf,
    settings: S,
    cache: Option<Arc<dyn CacheService>>,
}

impl ThemeManager<MemorySettings> {
    /// Create a manager with an in-memory settings store.
    pub fn new(themes_dir: impl AsRef<Path>) -> Self {
        Self::with_settings(themes_dir, MemorySettings::new())
    }
}

impl<S> ThemeManager<S>
where
    S: SettingsStore,
{
    /// Create a manager backed by a custom settings store.
    pub fn with_settings(themes_dir: impl AsRef<Path>, settings: S) -> Self {
        Self {
            themes_dir: themes_dir.as_ref().to_path_buf(),
            settings,
            cache: None,
        }
    }

    /// Attach a cache so activation can drop the cached template file map.
    pub fn with_cache(mut self, cache: Arc<dyn CacheService>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Theme aliases: the directory names under the themes root.
    pub fn themes(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.themes_dir)
            .map_err(|e| Error::Storage(format!("Failed to read themes directory: {e}")))?;

        let mut aliases = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| Error::Storage(format!("Failed to read themes directory: {e}")))?;
            let path = entry.path();
            if path.is_dir() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    aliases.push(name.to_string());
                }
            }
        }
        aliases.sort();
        Ok(aliases)
    }

    /// The merged manifest for a theme, or `None` when the theme directory
    /// carries neither a manifest nor a composer file.
    ///
    /// Manifest candidates are `config/theme.json` and `webroot/theme.json`;
    /// when both exist the webroot copy wins. A `composer.json` is merged on
    /// top, with its `name` remapped to `vendor` and its `description`
    /// dropped when the manifest already supplied one.
    pub fn data(&self, theme: &str) -> Result<Option<ThemeManifest>> {
        let path = self.themes_dir.join(theme);
        if !path.is_dir() {
            return Err(Error::ThemeNotFound(theme.to_string()));
        }

        let manifest_candidates = [
            path.join("config").join("theme.json"),
            path.join("webroot").join("theme.json"),
        ];
        let mut manifest_file = None;
        for candidate in &manifest_candidates {
            if candidate.exists() {
                manifest_file = Some(candidate.clone());
            }
        }

        let composer_file = path.join("composer.json");
        let composer_file = composer_file.exists().then_some(composer_file);

        if manifest_file.is_none() && composer_file.is_none() {
            return Ok(None);
        }

        let mut data = serde_json::to_value(ThemeManifest::defaults(Some(theme)))?;
        let mut manifest_had_description = false;

        if let Some(manifest_file) = manifest_file {
            let manifest = read_json(&manifest_file)?;
            manifest_had_description = manifest.get("description").is_some();
            merge_values(&mut data, manifest);
        }

        if let Some(composer_file) = composer_file {
            let mut composer = read_json(&composer_file)?;
            if let Value::Object(map) = &mut composer {
                if let Some(name) = map.remove("name") {
                    map.insert("vendor".to_string(), name);
                }
                if manifest_had_description {
                    map.remove("description");
                }
            }
            merge_values(&mut data, composer);
        }

        Ok(Some(serde_json::from_value(data)?))
    }

    /// Theme configuration with prefix-specific CSS overrides applied.
    ///
    /// CSS classes declared for the prefix are merged beneath the theme's
    /// base CSS map (base entries win on conflict).
    pub fn config(&self, theme: &str, prefix: Option<&str>) -> Result<Option<ThemeManifest>> {
        let Some(mut manifest) = self.data(theme)? else {
            return Ok(None);
        };

        if let Some(prefix) = prefix {
            if let Some(prefix_settings) = manifest.settings.prefixes.get(prefix) {
                let mut css = prefix_settings.css.clone();
                css.extend(manifest.settings.css.clone());
                manifest.settings.css = css;
            }
        }

        Ok(Some(manifest))
    }

    /// Activate a theme: write the `Site.theme` setting and drop the cached
    /// template file map.
    pub fn activate(&self, theme: &str) -> Result<()> {
        if self.data(theme)?.is_none() {
            return Err(Error::ThemeNotFound(theme.to_string()));
        }

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.delete(FILE_MAP_KEY, CORE_NAMESPACE) {
                warn!("Failed to drop cached file map while activating '{theme}': {e}");
            }
        }

        self.settings.write(SITE_THEME_SETTING, theme)
    }

    /// The currently active theme, if any.
    pub fn active_theme(&self) -> Option<String> {
        self.settings.read(SITE_THEME_SETTING)
    }

    /// Delete a theme directory (or unlink a symlinked theme).
    pub fn delete(&self, alias: &str) -> Result<()> {
        if alias.trim().is_empty() {
            return Err(Error::InvalidTheme("alias is empty".to_string()));
        }

        let path = self.themes_dir.join(alias);
        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(_) => return Err(Error::ThemeNotFound(alias.to_string())),
        };

        if metadata.file_type().is_symlink() {
            fs::remove_file(&path)
                .map_err(|e| Error::Storage(format!("Failed to unlink theme '{alias}': {e}")))
        } else if metadata.is_dir() {
            fs::remove_dir_all(&path)
                .map_err(|e| Error::Storage(format!("Failed to delete theme '{alias}': {e}")))
        } else {
            Err(Error::ThemeNotFound(alias.to_string()))
        }
    }

    /// The settings store.
    pub fn settings(&self) -> &S {
        &self.settings
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::Storage(format!("Failed to read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    struct TempThemes {
        root: PathBuf,
    }

    impl TempThemes {
        fn new(tag: &str) -> Self {
            let root = env::temp_dir().join(format!("acl_system_themes_{tag}_{}", std::process::id()));
            let _ = fs::remove_dir_all(&root);
            fs::create_dir_all(&root).unwrap();
            Self { root }
        }

        fn add_theme(&self, alias: &str, manifest: Option<&str>, composer: Option<&str>) {
            let dir = self.root.join(alias);
            fs::create_dir_all(dir.join("config")).unwrap();
            if let Some(manifest) = manifest {
                fs::write(dir.join("config").join("theme.json"), manifest).unwrap();
            }
            if let Some(composer) = composer {
                fs::write(dir.join("composer.json"), composer).unwrap();
            }
        }
    }

    impl Drop for TempThemes {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    #[test]
    fn test_defaults_tables() {
        let defaults = ThemeManifest::defaults(Some("default"));

        assert_eq!(defaults.name.as_deref(), Some("default"));
        assert_eq!(defaults.settings.css.get("row").map(String::as_str), Some("row"));
        assert_eq!(
            defaults.settings.icons.get("delete").map(String::as_str),
            Some("trash")
        );
        assert_eq!(
            defaults.settings.icon_defaults.get("iconSet").map(String::as_str),
            Some("fa")
        );
        assert!(defaults.settings.templates.contains_key("selectMultiple"));
        assert!(defaults.settings.prefixes.contains_key("admin"));
    }

    #[test]
    fn test_data_merges_manifest_over_defaults() {
        let themes = TempThemes::new("merge");
        themes.add_theme(
            "minimal",
            Some(
                r#"{
                    "description": "A minimal theme",
                    "regions": ["sidebar", "footer"],
                    "settings": { "css": { "row": "grid-row" } }
                }"#,
            ),
            None,
        );

        let manager = ThemeManager::new(&themes.root);
        let manifest = manager.data("minimal").unwrap().unwrap();

        assert_eq!(manifest.name.as_deref(), Some("minimal"));
        assert_eq!(manifest.description.as_deref(), Some("A minimal theme"));
        assert_eq!(manifest.regions, vec!["sidebar", "footer"]);
        // Overridden by the manifest.
        assert_eq!(manifest.settings.css.get("row").map(String::as_str), Some("grid-row"));
        // Default survives where the manifest is silent.
        assert_eq!(
            manifest.settings.css.get("container").map(String::as_str),
            Some("container")
        );
    }

    #[test]
    fn test_composer_name_becomes_vendor() {
        let themes = TempThemes::new("composer");
        themes.add_theme(
            "shiny",
            Some(r#"{ "description": "Shiny theme" }"#),
            Some(r#"{ "name": "vendor/shiny", "description": "composer description" }"#),
        );

        let manager = ThemeManager::new(&themes.root);
        let manifest = manager.data("shiny").unwrap().unwrap();

        assert_eq!(manifest.vendor.as_deref(), Some("vendor/shiny"));
        // Theme name is untouched by the composer name.
        assert_eq!(manifest.name.as_deref(), Some("shiny"));
        // The manifest description wins over composer's.
        assert_eq!(manifest.description.as_deref(), Some("Shiny theme"));
    }

    #[test]
    fn test_composer_only_theme() {
        let themes = TempThemes::new("composer_only");
        themes.add_theme(
            "bare",
            None,
            Some(r#"{ "name": "vendor/bare", "description": "from composer" }"#),
        );

        let manager = ThemeManager::new(&themes.root);
        let manifest = manager.data("bare").unwrap().unwrap();

        assert_eq!(manifest.vendor.as_deref(), Some("vendor/bare"));
        assert_eq!(manifest.description.as_deref(), Some("from composer"));
    }

    #[test]
    fn test_theme_without_manifest_yields_no_data() {
        let themes = TempThemes::new("empty");
        themes.add_theme("plain", None, None);

        let manager = ThemeManager::new(&themes.root);
        assert!(manager.data("plain").unwrap().is_none());
    }

    #[test]
    fn test_missing_theme_directory() {
        let themes = TempThemes::new("missing");
        let manager = ThemeManager::new(&themes.root);

        assert!(matches!(
            manager.data("nonexistent"),
            Err(Error::ThemeNotFound(_))
        ));
    }

    #[test]
    fn test_themes_lists_directories() {
        let themes = TempThemes::new("list");
        themes.add_theme("alpha", None, None);
        themes.add_theme("beta", None, None);

        let manager = ThemeManager::new(&themes.root);
        assert_eq!(manager.themes().unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_prefix_css_merged_beneath_base() {
        let themes = TempThemes::new("prefix");
        themes.add_theme(
            "admin_theme",
            Some(
                r#"{
                    "settings": {
                        "css": { "row": "base-row" },
                        "prefixes": {
                            "admin": {
                                "css": { "row": "admin-row", "adminOnly": "admin-only" }
                            }
                        }
                    }
                }"#,
            ),
            None,
        );

        let manager = ThemeManager::new(&themes.root);
        let manifest = manager.config("admin_theme", Some("admin")).unwrap().unwrap();

        // Base css wins on conflict; prefix-only keys are added.
        assert_eq!(manifest.settings.css.get("row").map(String::as_str), Some("base-row"));
        assert_eq!(
            manifest.settings.css.get("adminOnly").map(String::as_str),
            Some("admin-only")
        );
    }

    #[test]
    fn test_activate_writes_setting_and_drops_file_map() {
        let themes = TempThemes::new("activate");
        themes.add_theme("active", Some(r#"{ "description": "activatable" }"#), None);

        let cache = Arc::new(crate::cache::MemoryCache::new(300));
        cache.write(FILE_MAP_KEY, serde_json::json!("stale"), CORE_NAMESPACE).unwrap();

        let manager = ThemeManager::new(&themes.root).with_cache(cache.clone());
        manager.activate("active").unwrap();

        assert_eq!(manager.active_theme().as_deref(), Some("active"));
        assert_eq!(cache.read(FILE_MAP_KEY, CORE_NAMESPACE).unwrap(), None);
    }

    #[test]
    fn test_activate_requires_theme_data() {
        let themes = TempThemes::new("activate_bare");
        themes.add_theme("bare", None, None);

        let manager = ThemeManager::new(&themes.root);
        assert!(matches!(manager.activate("bare"), Err(Error::ThemeNotFound(_))));
        assert!(manager.active_theme().is_none());
    }

    #[test]
    fn test_delete_theme() {
        let themes = TempThemes::new("delete");
        themes.add_theme("doomed", None, None);

        let manager = ThemeManager::new(&themes.root);
        manager.delete("doomed").unwrap();
        assert!(!themes.root.join("doomed").exists());

        assert!(matches!(manager.delete("doomed"), Err(Error::ThemeNotFound(_))));
        assert!(matches!(manager.delete(""), Err(Error::InvalidTheme(_))));
    }
}
