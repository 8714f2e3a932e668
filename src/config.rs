use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Read and parse `config.toml` from this manager's directory.
    /// A missing file yields the defaults.
    pub fn load_config(&self) -> Result<AppConfig> {
        let config_path = self.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub file_loading: FileLoadingConfig,
    pub display: DisplayConfig,
    pub clean: CleanConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoadingConfig {
    pub delimiter: Option<u8>,
    pub has_header: Option<bool>,
    pub skip_rows: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show the vertical header (row labels) left of the table
    pub row_labels: bool,
    pub cell_padding: u16,
    pub alternate_rows: bool,
    /// Show the toolbar on the right edge
    pub toolbar: bool,
}

/// Initial values for the clean-data dialog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    pub fill_method: String,
    pub drop_how: String,
    pub limit_gaps: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub error: String,
    pub dimmed: String,
    pub background: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub table_header: String,
    pub table_header_bg: String,
    pub row_labels: String,
    pub alternate_row: String,
    pub selection: String,
    pub modal_border: String,
    pub modal_border_active: String,
    pub modal_border_error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            file_loading: FileLoadingConfig::default(),
            display: DisplayConfig::default(),
            clean: CleanConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            row_labels: true,
            cell_padding: 1,
            alternate_rows: true,
            toolbar: true,
        }
    }
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            fill_method: String::new(),
            drop_how: "any".to_string(),
            limit_gaps: true,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: "auto".to_string(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            secondary: "yellow".to_string(),
            error: "red".to_string(),
            dimmed: "dark_gray".to_string(),
            background: "reset".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            table_header: "white".to_string(),
            table_header_bg: "indexed(236)".to_string(),
            row_labels: "dark_gray".to_string(),
            alternate_row: "indexed(234)".to_string(),
            selection: "indexed(24)".to_string(),
            modal_border: "cyan".to_string(),
            modal_border_active: "yellow".to_string(),
            modal_border_error: "red".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let config_manager = ConfigManager::new(app_name)?;
        Self::load_from(&config_manager)
    }

    /// Load configuration using an explicit config directory
    pub fn load_from(config_manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(config_manager.load_config()?);
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.file_loading.merge(other.file_loading);
        self.display.merge(other.display);
        self.clean.merge(other.clean);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        match self.clean.fill_method.as_str() {
            "" | "fill scalar" | "ffill" | "bfill" | "interpolate" => {}
            other => {
                return Err(eyre!(
                    "Invalid clean.fill_method: '{}'. Must be '', 'fill scalar', 'ffill', 'bfill' or 'interpolate'",
                    other
                ))
            }
        }

        match self.clean.drop_how.as_str() {
            "any" | "all" => {}
            other => {
                return Err(eyre!(
                    "Invalid clean.drop_how: '{}'. Must be 'any' or 'all'",
                    other
                ))
            }
        }

        match self.theme.color_mode.as_str() {
            "light" | "dark" | "auto" => {}
            _ => {
                return Err(eyre!(
                    "Invalid color_mode: {}. Must be 'light', 'dark', or 'auto'",
                    self.theme.color_mode
                ))
            }
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }
}

impl FileLoadingConfig {
    pub fn merge(&mut self, other: Self) {
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.has_header.is_some() {
            self.has_header = other.has_header;
        }
        if other.skip_rows.is_some() {
            self.skip_rows = other.skip_rows;
        }
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.row_labels != default.row_labels {
            self.row_labels = other.row_labels;
        }
        if other.cell_padding != default.cell_padding {
            self.cell_padding = other.cell_padding;
        }
        if other.alternate_rows != default.alternate_rows {
            self.alternate_rows = other.alternate_rows;
        }
        if other.toolbar != default.toolbar {
            self.toolbar = other.toolbar;
        }
    }
}

impl CleanConfig {
    pub fn merge(&mut self, other: Self) {
        let default = CleanConfig::default();
        if other.fill_method != default.fill_method {
            self.fill_method = other.fill_method;
        }
        if other.drop_how != default.drop_how {
            self.drop_how = other.drop_how;
        }
        if other.limit_gaps != default.limit_gaps {
            self.limit_gaps = other.limit_gaps;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.color_mode != default.color_mode {
            self.color_mode = other.color_mode;
        }
        self.colors.merge(other.colors);
    }
}

macro_rules! color_fields {
    ($mac:ident) => {
        $mac!(primary);
        $mac!(secondary);
        $mac!(error);
        $mac!(dimmed);
        $mac!(background);
        $mac!(controls_bg);
        $mac!(text_primary);
        $mac!(table_header);
        $mac!(table_header_bg);
        $mac!(row_labels);
        $mac!(alternate_row);
        $mac!(selection);
        $mac!(modal_border);
        $mac!(modal_border_active);
        $mac!(modal_border_error);
    };
}

impl ColorConfig {
    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        macro_rules! validate_color {
            ($field:ident) => {
                parser.parse(&self.$field).map_err(|e| {
                    eyre!("Invalid color value for '{}': {}", stringify!($field), e)
                })?;
            };
        }
        color_fields!(validate_color);
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        macro_rules! merge_color {
            ($field:ident) => {
                if other.$field != default.$field {
                    self.$field = other.$field.clone();
                }
            };
        }
        color_fields!(merge_color);
    }

    fn entries(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        macro_rules! push_color {
            ($field:ident) => {
                out.push((stringify!($field), self.$field.as_str()));
            };
        }
        color_fields!(push_color);
        out
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        if other.enabled {
            self.enabled = true;
        }
    }
}

/// Named colors accepted in the config. Lookup ignores case, and treats
/// spaces as underscores and "grey" as "gray".
const NAMED_COLORS: [(&str, Color); 21] = [
    ("black", Color::Black),
    ("red", Color::Red),
    ("green", Color::Green),
    ("yellow", Color::Yellow),
    ("blue", Color::Blue),
    ("magenta", Color::Magenta),
    ("cyan", Color::Cyan),
    ("white", Color::White),
    ("bright_black", Color::Indexed(8)),
    ("bright_red", Color::Indexed(9)),
    ("bright_green", Color::Indexed(10)),
    ("bright_yellow", Color::Indexed(11)),
    ("bright_blue", Color::Indexed(12)),
    ("bright_magenta", Color::Indexed(13)),
    ("bright_cyan", Color::Indexed(14)),
    ("bright_white", Color::Indexed(15)),
    ("gray", Color::Indexed(8)),
    ("dark_gray", Color::Indexed(8)),
    ("light_gray", Color::Indexed(7)),
    ("reset", Color::Reset),
    ("default", Color::Reset),
];

/// Parses theme color strings, downgrading to what the terminal supports.
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Detect terminal color support on stdout; `NO_COLOR` turns every color into `Reset`.
    pub fn new() -> Self {
        let support = supports_color::on(Stream::Stdout);
        Self {
            supports_true_color: support.as_ref().is_some_and(|s| s.has_16m),
            supports_256: support.as_ref().is_some_and(|s| s.has_256),
            no_color: std::env::var_os("NO_COLOR").is_some(),
        }
    }

    /// Parse `#rrggbb`, `indexed(n)` or a color name.
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }
        let value = s.trim();
        let lower = value.to_lowercase();

        if value.starts_with('#') {
            let (r, g, b) = parse_hex(value)?;
            return Ok(self.downgrade_rgb(r, g, b));
        }

        if let Some(inner) = lower
            .strip_prefix("indexed(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return inner.trim().parse::<u8>().map(Color::Indexed).map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected indexed(0-255)",
                    value
                )
            });
        }

        let key = lower.replace(' ', "_").replace("grey", "gray");
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, color)| *color)
            .ok_or_else(|| {
                eyre!(
                    "Unknown color name: '{}'. Use a name (red, bright_blue, dark_gray), \
                     indexed(n) or #rrggbb",
                    value
                )
            })
    }

    fn downgrade_rgb(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    let digits = s
        .strip_prefix('#')
        .filter(|d| d.len() == 6 && d.is_ascii())
        .ok_or_else(|| eyre!("Invalid hex color: '{}'. Expected #rrggbb", s))?;
    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| eyre!("Invalid hex color: '{}'. Expected #rrggbb", s))
    };
    Ok((component(0..2)?, component(2..4)?, component(4..6)?))
}

fn spread(r: u8, g: u8, b: u8) -> u8 {
    r.max(g).max(b) - r.min(g).min(b)
}

fn average(r: u8, g: u8, b: u8) -> u16 {
    (r as u16 + g as u16 + b as u16) / 3
}

/// Nearest xterm 256-color index: the gray ramp for near-grays, else the 6x6x6 cube.
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    if spread(r, g, b) < 10 {
        return match average(r, g, b) {
            v if v < 8 => 16,
            v if v > 247 => 231,
            v => 232 + ((v - 8) * 24 / 240) as u8,
        };
    }
    let level = |c: u8| (c as u16 * 5 / 255) as u8;
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

/// Nearest of the 8 basic ANSI colors.
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    if spread(r, g, b) < 30 {
        return if average(r, g, b) < 64 {
            Color::Black
        } else {
            Color::White
        };
    }
    const BY_CHANNELS: [Color; 8] = [
        Color::Black,
        Color::Blue,
        Color::Green,
        Color::Cyan,
        Color::Red,
        Color::Magenta,
        Color::Yellow,
        Color::White,
    ];
    let bit = |c: u8, shift: u8| ((c > 128) as usize) << shift;
    BY_CHANNELS[bit(r, 2) | bit(g, 1) | bit(b, 0)]
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let mut colors = HashMap::new();
        for (name, value) in config.colors.entries() {
            colors.insert(name.to_string(), parser.parse(value)?);
        }
        Ok(Self { colors })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    /// Get a color by name, returns None if not found
    pub fn get_optional(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
