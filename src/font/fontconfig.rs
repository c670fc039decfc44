//! fontconfig integration
//!
//! Resolve font specifiers (file paths or family names) to font files

use anyhow::{anyhow, Result};
use fontconfig::Fontconfig;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Font search result
#[derive(Debug, Clone)]
pub struct FontMatch {
    /// Font file path
    pub path: PathBuf,
    /// Font name
    pub family: String,
}

/// Search fonts using fontconfig
pub struct FontFinder {
    fc: Fontconfig,
}

impl FontFinder {
    pub fn new() -> Result<Self> {
        let fc = Fontconfig::new().ok_or_else(|| anyhow!("fontconfig initialization failed"))?;
        info!("fontconfig initialized");
        Ok(Self { fc })
    }

    /// Search by family name
    ///
    /// fontconfig always returns its closest match, even an unrelated one, so
    /// the returned name must overlap the request.
    pub fn find_font(&self, family: &str) -> Option<FontMatch> {
        let font = self.fc.find(family, None)?;
        if family_matches(family, &font.name) {
            return Some(FontMatch {
                path: font.path,
                family: font.name,
            });
        }
        warn!(
            "fontconfig: rejected false match for \"{}\": got \"{}\"",
            family, font.name
        );
        None
    }

    /// First available general-purpose font
    pub fn find_default(&self) -> Option<FontMatch> {
        let fallbacks = [
            "DejaVu Sans",
            "Liberation Sans",
            "Noto Sans",
            "FreeSans",
            "sans-serif",
        ];

        for name in fallbacks {
            if let Some(m) = self.find_font(name) {
                return Some(m);
            }
        }

        warn!("No default font found");
        None
    }
}

fn family_matches(requested: &str, found: &str) -> bool {
    let req = requested.to_ascii_lowercase();
    let got = found.to_ascii_lowercase();
    got.contains(&req) || req.contains(&got)
}

/// Resolve a font specifier: an existing absolute path is used as is,
/// anything else is looked up as a family name and finally tried as a
/// relative path. An empty specifier picks the default font.
pub fn resolve_font(specifier: &str) -> Result<PathBuf> {
    let path = Path::new(specifier);
    if path.is_absolute() && path.exists() {
        info!("Font loaded from path: {}", specifier);
        return Ok(path.to_path_buf());
    }

    let finder = FontFinder::new()?;
    let found = if specifier.is_empty() {
        finder.find_default()
    } else {
        finder.find_font(specifier)
    };
    if let Some(font_match) = found {
        info!(
            "Font resolved by name: \"{}\" → {} ({})",
            specifier,
            font_match.family,
            font_match.path.display()
        );
        return Ok(font_match.path);
    }

    if !specifier.is_empty() && path.exists() {
        info!("Font loaded from relative path: {}", specifier);
        return Ok(path.to_path_buf());
    }

    Err(anyhow!(
        "Font not found: \"{}\" (not a valid path or font name)",
        specifier
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_match_is_case_insensitive() {
        assert!(family_matches("dejavu sans", "DejaVu Sans"));
        assert!(family_matches("DejaVu Sans Mono", "DejaVu Sans"));
        assert!(!family_matches("Inconsolata", "DejaVu Sans"));
    }
}
