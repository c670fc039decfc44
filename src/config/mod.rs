//! Configuration file management
//!
//! Loads TOML configuration files and provides CLI settings.
//! Default config path: ~/.config/ftglyph/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::face::Encoding;
use crate::font::FontKind;
use crate::gpu::RenderMode;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font settings
    pub font: FontConfig,
    /// Render settings
    pub render: RenderConfig,
}

/// Font settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font family name or file path (searches system fonts if empty)
    pub family: String,
    /// Face size in points
    pub size: u32,
    /// Device resolution in dpi
    pub resolution: u32,
    /// "bitmap" | "pixmap" | "outline" | "polygon" | "extrude" | "texture"
    pub kind: String,
    /// Character map: "unicode", "symbol", "latin1", "apple-roman", ...
    pub encoding: String,
    /// Extrusion depth (extrude fonts)
    pub depth: f32,
    /// Front face outset (outline, polygon and extrude fonts)
    pub front_outset: f32,
    /// Back face outset (extrude fonts)
    pub back_outset: f32,
    /// Keep GPU copies of glyph geometry
    pub display_list: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: String::new(),
            size: 24,
            resolution: crate::constants::DEFAULT_RESOLUTION,
            kind: "pixmap".to_string(),
            encoding: "unicode".to_string(),
            depth: 0.0,
            front_outset: 0.0,
            back_outset: 0.0,
            display_list: true,
        }
    }
}

impl FontConfig {
    /// Configured font kind (pixmap when unrecognised)
    pub fn font_kind(&self) -> FontKind {
        FontKind::from_str(&self.kind).unwrap_or_else(|| {
            warn!("Unknown font kind \"{}\", using pixmap", self.kind);
            FontKind::Pixmap
        })
    }

    /// Configured encoding, None when unrecognised
    pub fn encoding(&self) -> Option<Encoding> {
        let encoding = Encoding::from_str(&self.encoding);
        if encoding.is_none() {
            warn!("Unknown encoding \"{}\"", self.encoding);
        }
        encoding
    }
}

/// Render settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Parts of extruded glyphs to draw: any of "front", "back", "side", or "all"
    pub parts: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            parts: vec!["all".to_string()],
        }
    }
}

impl RenderConfig {
    pub fn render_mode(&self) -> RenderMode {
        let mut mode = RenderMode::empty();
        for part in &self.parts {
            match part.to_ascii_lowercase().as_str() {
                "front" => mode |= RenderMode::FRONT,
                "back" => mode |= RenderMode::BACK,
                "side" => mode |= RenderMode::SIDE,
                "all" => mode |= RenderMode::ALL,
                other => warn!("Unknown render part \"{}\"", other),
            }
        }
        if mode.is_empty() {
            RenderMode::ALL
        } else {
            mode
        }
    }
}

impl Config {
    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. FTGLYPH_CONFIG environment variable
        if let Ok(path) = std::env::var("FTGLYPH_CONFIG") {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/ftglyph/config.toml
        let user_config = default_config_path()?;
        if user_config.exists() {
            return Some(user_config);
        }

        None
    }

    /// Load configuration with priority:
    /// 1. FTGLYPH_CONFIG environment variable
    /// 2. ~/.config/ftglyph/config.toml
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Write a commented template to the user config path
    pub fn write_default_config() -> Result<PathBuf> {
        let config_path =
            default_config_path().ok_or_else(|| anyhow::anyhow!("Config directory not found"))?;
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let template = format!(
            r#"# ftglyph configuration file
# Config path: {}
#
# Fonts can be given by family name (resolved via fontconfig) or file path:
#   family = "DejaVu Sans"
#   family = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"

[font]
# family = ""
size = 24
resolution = 72
kind = "pixmap"           # bitmap | pixmap | outline | polygon | extrude | texture
encoding = "unicode"      # unicode | symbol | latin1 | apple-roman | sjis | big5 | ...
# depth = 10.0            # extrude fonts
# front_outset = 0.0      # outline / polygon / extrude fonts
# back_outset = 0.0       # extrude fonts
display_list = true

[render]
parts = ["all"]           # front | back | side | all (extrude fonts)
"#,
            config_path.display()
        );

        std::fs::write(&config_path, template)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        Ok(config_path)
    }
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ftglyph").join("config.toml"))
}
