use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

use crate::store::DEFAULT_CONTACTS_FILE;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "contactbook";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone)]
pub struct Config {
    /// Where the config was read from; `None` when built-in defaults are in use.
    pub config_path: Option<PathBuf>,
    pub contacts_file: PathBuf,
    pub log: LogConfig,
    pub keys: Keys,
    pub top_bar: TopBarConfig,
    pub ui: UiConfig,
    /// Problems found while reading the file that did not stop loading.
    /// Reported once logging is up.
    pub warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(ConfigFile::default(), None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

// =============================================================================
// Top Bar Configuration
// =============================================================================

/// Actions available as top bar buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopBarAction {
    Add,
    View,
    Edit,
    Delete,
}

impl TopBarAction {
    /// Display title for the button
    pub fn title(&self) -> &'static str {
        match self {
            TopBarAction::Add => "ADD",
            TopBarAction::View => "VIEW",
            TopBarAction::Edit => "EDIT",
            TopBarAction::Delete => "DELETE",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Some(TopBarAction::Add),
            "view" => Some(TopBarAction::View),
            "edit" => Some(TopBarAction::Edit),
            "delete" => Some(TopBarAction::Delete),
            _ => None,
        }
    }
}

/// A single top bar button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopBarButton {
    pub key: String,
    pub action: TopBarAction,
}

impl TopBarButton {
    /// Get the function key number (1-12) or None if invalid
    pub fn function_key_number(&self) -> Option<u8> {
        let upper = self.key.trim().to_ascii_uppercase();
        upper
            .strip_prefix('F')
            .and_then(|digits| digits.parse::<u8>().ok())
            .filter(|n| (1..=12).contains(n))
    }
}

#[derive(Debug, Clone)]
pub struct TopBarConfig {
    pub buttons: Vec<TopBarButton>,
}

impl Default for TopBarConfig {
    fn default() -> Self {
        Self {
            buttons: vec![
                TopBarButton { key: "F2".into(), action: TopBarAction::Add },
                TopBarButton { key: "F3".into(), action: TopBarAction::View },
                TopBarButton { key: "F4".into(), action: TopBarAction::Edit },
                TopBarButton { key: "F5".into(), action: TopBarAction::Delete },
            ],
        }
    }
}

// =============================================================================
// UI Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub separator: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// =============================================================================
// Key Bindings - Context-aware with multiple bindings per action
// =============================================================================

/// All key bindings organized by context
#[derive(Debug, Clone, Default)]
pub struct Keys {
    /// Keys that work regardless of focus
    pub global: GlobalKeys,
    /// Keys while a form field has focus
    pub form: FormKeys,
    /// Keys while the contact list has focus
    pub list: ListKeys,
    /// Keys while a pop-up is shown
    pub modal: ModalKeys,
}

#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub next_focus: Vec<String>,
    pub prev_focus: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FormKeys {
    pub submit: Vec<String>,
    pub cancel_edit: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ListKeys {
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub view: Vec<String>,
    pub edit: Vec<String>,
    pub delete: Vec<String>,
    pub clear: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModalKeys {
    pub dismiss: Vec<String>,
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: vec![],
            next_focus: vec!["Tab".into()],
            prev_focus: vec!["Backtab".into()],
        }
    }
}

impl Default for FormKeys {
    fn default() -> Self {
        Self {
            submit: vec!["Enter".into()],
            cancel_edit: vec!["Escape".into()],
        }
    }
}

impl Default for ListKeys {
    fn default() -> Self {
        Self {
            next: vec!["j".into(), "Down".into()],
            prev: vec!["k".into(), "Up".into()],
            view: vec!["Enter".into(), "v".into()],
            edit: vec!["e".into()],
            delete: vec!["x".into()],
            clear: vec!["Escape".into()],
            quit: vec!["q".into()],
        }
    }
}

impl Default for ModalKeys {
    fn default() -> Self {
        Self {
            dismiss: vec!["Escape".into(), "Enter".into(), "q".into()],
        }
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

impl Default for KeyBinding {
    fn default() -> Self {
        KeyBinding::Multiple(vec![])
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: GlobalKeysFile,
    form: FormKeysFile,
    list: ListKeysFile,
    modal: ModalKeysFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GlobalKeysFile {
    quit: KeyBinding,
    next_focus: KeyBinding,
    prev_focus: KeyBinding,
}

impl Default for GlobalKeysFile {
    fn default() -> Self {
        let defaults = GlobalKeys::default();
        Self {
            quit: KeyBinding::Multiple(defaults.quit),
            next_focus: KeyBinding::Multiple(defaults.next_focus),
            prev_focus: KeyBinding::Multiple(defaults.prev_focus),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FormKeysFile {
    submit: KeyBinding,
    cancel_edit: KeyBinding,
}

impl Default for FormKeysFile {
    fn default() -> Self {
        let defaults = FormKeys::default();
        Self {
            submit: KeyBinding::Multiple(defaults.submit),
            cancel_edit: KeyBinding::Multiple(defaults.cancel_edit),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ListKeysFile {
    next: KeyBinding,
    prev: KeyBinding,
    view: KeyBinding,
    edit: KeyBinding,
    delete: KeyBinding,
    clear: KeyBinding,
    quit: KeyBinding,
}

impl Default for ListKeysFile {
    fn default() -> Self {
        let defaults = ListKeys::default();
        Self {
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
            view: KeyBinding::Multiple(defaults.view),
            edit: KeyBinding::Multiple(defaults.edit),
            delete: KeyBinding::Multiple(defaults.delete),
            clear: KeyBinding::Multiple(defaults.clear),
            quit: KeyBinding::Multiple(defaults.quit),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ModalKeysFile {
    dismiss: KeyBinding,
}

impl Default for ModalKeysFile {
    fn default() -> Self {
        Self {
            dismiss: KeyBinding::Multiple(ModalKeys::default().dismiss),
        }
    }
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            global: GlobalKeys {
                quit: file.global.quit.into_vec(),
                next_focus: file.global.next_focus.into_vec(),
                prev_focus: file.global.prev_focus.into_vec(),
            },
            form: FormKeys {
                submit: file.form.submit.into_vec(),
                cancel_edit: file.form.cancel_edit.into_vec(),
            },
            list: ListKeys {
                next: file.list.next.into_vec(),
                prev: file.list.prev.into_vec(),
                view: file.list.view.into_vec(),
                edit: file.list.edit.into_vec(),
                delete: file.list.delete.into_vec(),
                clear: file.list.clear.into_vec(),
                quit: file.list.quit.into_vec(),
            },
            modal: ModalKeys {
                dismiss: file.modal.dismiss.into_vec(),
            },
        }
    }
}

/// Normalize a key binding string to a canonical form for collision detection.
/// Single characters preserve case (since 'M' means Shift+m, different from 'm').
/// Multi-character key names are case-insensitive (Enter, ENTER, enter are the same).
fn normalize_binding(binding: &str) -> String {
    let trimmed = binding.trim();
    if trimmed.chars().count() == 1 {
        trimmed.to_string()
    } else {
        match trimmed.to_ascii_lowercase().as_str() {
            "esc" => "escape".to_string(),
            "shift+tab" => "backtab".to_string(),
            "page_up" => "pageup".to_string(),
            "page_down" => "pagedown".to_string(),
            other => other.to_string(),
        }
    }
}

/// Check for collisions within a single context
fn check_context_collisions(bindings: &[(&str, &[String])], context_name: &str) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (action_name, keys) in bindings {
        for key in *keys {
            let normalized = normalize_binding(key);
            if normalized.is_empty() {
                continue;
            }
            if let Some(existing_action) = seen.get(&normalized) {
                bail!(
                    "key binding collision in [keys.{}]: '{}' is bound to both '{}' and '{}'",
                    context_name,
                    key,
                    existing_action,
                    action_name
                );
            }
            seen.insert(normalized, action_name);
        }
    }

    Ok(())
}

/// Validate all key bindings for collisions. Global keys are active in both
/// the form and the list, so they are checked against each.
fn validate_key_bindings(keys: &Keys) -> Result<()> {
    let global: [(&str, &[String]); 3] = [
        ("global.quit", keys.global.quit.as_slice()),
        ("global.next_focus", keys.global.next_focus.as_slice()),
        ("global.prev_focus", keys.global.prev_focus.as_slice()),
    ];

    let mut form = global.to_vec();
    form.extend([
        ("submit", keys.form.submit.as_slice()),
        ("cancel_edit", keys.form.cancel_edit.as_slice()),
    ]);
    check_context_collisions(&form, "form")?;

    let mut list = global.to_vec();
    list.extend([
        ("next", keys.list.next.as_slice()),
        ("prev", keys.list.prev.as_slice()),
        ("view", keys.list.view.as_slice()),
        ("edit", keys.list.edit.as_slice()),
        ("delete", keys.list.delete.as_slice()),
        ("clear", keys.list.clear.as_slice()),
        ("quit", keys.list.quit.as_slice()),
    ]);
    check_context_collisions(&list, "list")?;

    Ok(())
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    contacts_file: Option<PathBuf>,
    log: LogFile,
    keys: KeysFile,
    top_bar: TopBarFile,
    ui: UiFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LogFile {
    level: Option<String>,
    file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TopBarFile {
    buttons: Option<Vec<TopBarButtonFile>>,
}

#[derive(Debug, Deserialize)]
struct TopBarButtonFile {
    key: String,
    action: String,
}

impl TopBarConfig {
    fn from_file(file: TopBarFile, warnings: &mut Vec<String>) -> Self {
        let Some(buttons) = file.buttons else {
            return Self::default();
        };

        let mut parsed = Vec::new();
        for button in buttons {
            let Some(action) = TopBarAction::from_str(&button.action) else {
                warnings.push(format!("unknown top bar action `{}`", button.action));
                continue;
            };
            let candidate = TopBarButton { key: button.key, action };
            if candidate.function_key_number().is_none() {
                warnings.push(format!(
                    "top bar key `{}` is not a function key (F1-F12)",
                    candidate.key
                ));
                continue;
            }
            parsed.push(candidate);
        }
        Self { buttons: parsed }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    separator: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(255, 165, 0),
            selection_bg: RgbColor::new(255, 165, 0),
            selection_fg: RgbColor::new(0, 0, 0),
            separator: RgbColor::new(255, 165, 0),
            status_fg: RgbColor::new(255, 165, 0),
            status_bg: RgbColor::new(0, 0, 0),
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        Self {
            colors: UiColors {
                border: file.colors.border,
                selection_bg: file.colors.selection_bg,
                selection_fg: file.colors.selection_fg,
                separator: file.colors.separator,
                status_fg: file.colors.status_fg,
                status_bg: file.colors.status_bg,
            },
        }
    }
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

impl Config {
    fn from_file(file: ConfigFile, config_path: Option<PathBuf>) -> Self {
        let mut warnings = Vec::new();

        let contacts_file = file
            .contacts_file
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTACTS_FILE));

        let level = file
            .log
            .level
            .as_ref()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| value.to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let top_bar = TopBarConfig::from_file(file.top_bar, &mut warnings);

        Self {
            config_path,
            contacts_file,
            log: LogConfig {
                level,
                file: file.log.file.as_deref().map(expand_tilde),
            },
            keys: file.keys.into(),
            top_bar,
            ui: file.ui.into(),
            warnings,
        }
    }
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration. An explicit path must exist; the default path may be
/// absent, in which case built-in defaults apply.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    parse(&raw, path)
}

/// Parse TOML configuration text read from `path`.
pub fn parse(raw: &str, path: PathBuf) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    let mut unknown = Vec::new();
    collect_unknown_keys(&value, &mut unknown);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    let mut config = Config::from_file(cfg_file, Some(path));

    validate_key_bindings(&config.keys)?;

    unknown.append(&mut config.warnings);
    config.warnings = unknown;
    Ok(config)
}

// =============================================================================
// Unknown key warnings
// =============================================================================

const KNOWN_TOP_LEVEL: &[&str] = &["contacts_file", "log", "keys", "top_bar", "ui"];
const KNOWN_LOG: &[&str] = &["level", "file"];
const KNOWN_KEYS: &[&str] = &["global", "form", "list", "modal"];
const KNOWN_GLOBAL_KEYS: &[&str] = &["quit", "next_focus", "prev_focus"];
const KNOWN_FORM_KEYS: &[&str] = &["submit", "cancel_edit"];
const KNOWN_LIST_KEYS: &[&str] = &["next", "prev", "view", "edit", "delete", "clear", "quit"];
const KNOWN_MODAL_KEYS: &[&str] = &["dismiss"];
const KNOWN_TOP_BAR: &[&str] = &["buttons"];
const KNOWN_UI: &[&str] = &["colors"];
const KNOWN_UI_COLORS: &[&str] = &[
    "border",
    "selection_bg",
    "selection_fg",
    "separator",
    "status_fg",
    "status_bg",
];

fn collect_unknown_keys(value: &toml::Value, warnings: &mut Vec<String>) {
    warn_unknown_in_context(value, "", KNOWN_TOP_LEVEL, warnings);

    let Some(table) = value.as_table() else {
        return;
    };

    if let Some(log) = table.get("log") {
        warn_unknown_in_context(log, "log", KNOWN_LOG, warnings);
    }

    if let Some(keys) = table.get("keys") {
        warn_unknown_in_context(keys, "keys", KNOWN_KEYS, warnings);
        if let Some(keys_table) = keys.as_table() {
            let contexts = [
                ("global", KNOWN_GLOBAL_KEYS),
                ("form", KNOWN_FORM_KEYS),
                ("list", KNOWN_LIST_KEYS),
                ("modal", KNOWN_MODAL_KEYS),
            ];
            for (name, known) in contexts {
                if let Some(section) = keys_table.get(name) {
                    warn_unknown_in_context(section, &format!("keys.{name}"), known, warnings);
                }
            }
        }
    }

    if let Some(top_bar) = table.get("top_bar") {
        warn_unknown_in_context(top_bar, "top_bar", KNOWN_TOP_BAR, warnings);
    }

    if let Some(ui) = table.get("ui") {
        warn_unknown_in_context(ui, "ui", KNOWN_UI, warnings);
        if let Some(colors) = ui.as_table().and_then(|t| t.get("colors")) {
            warn_unknown_in_context(colors, "ui.colors", KNOWN_UI_COLORS, warnings);
        }
    }
}

fn warn_unknown_in_context(
    value: &toml::Value,
    context: &str,
    known: &[&str],
    warnings: &mut Vec<String>,
) {
    let Some(table) = value.as_table() else {
        return;
    };
    let known: HashSet<&str> = known.iter().copied().collect();
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            if context.is_empty() {
                warnings.push(format!("unknown configuration key `{}`", key));
            } else {
                warnings.push(format!("unknown configuration key `{}.{}`", context, key));
            }
        }
    }
}
