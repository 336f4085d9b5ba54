//! Configuration and color scheme management for termdock.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.termdock/config.toml`
//! - Built-in color schemes (default, solarized-dark, dracula, nord)
//! - The [`Theme`] palette pushed to the VT engine renderer
//!
//! # Configuration File
//!
//! The configuration file is located at `~/.termdock/config.toml`:
//!
//! ```toml
//! # Default shell (optional; falls back to $SHELL)
//! shell = "/bin/zsh"
//!
//! # Color scheme: default, solarized-dark, dracula, nord
//! color_scheme = "default"
//!
//! # Scrollback lines kept by the VT engine
//! scrollback = 1000
//!
//! # Vertical pixels reserved for host chrome when sizing the grid
//! vertical_chrome_px = 12
//! ```

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default shell command
    pub shell: Option<String>,
    /// Color scheme name
    pub color_scheme: String,
    /// Scrollback lines for the VT engine
    pub scrollback: usize,
    /// Vertical pixels reserved for host chrome (header, padding)
    pub vertical_chrome_px: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: None,
            color_scheme: "default".to_string(),
            scrollback: 1000,
            vertical_chrome_px: 12.0,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults on any error
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(config) = toml::from_str(&content) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }

    /// Save configuration to file
    #[allow(dead_code)]
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine config path"))?;
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        if let Some(home) = home_dir() {
            let dir = home.join(".termdock");
            if !dir.exists() {
                let _ = fs::create_dir_all(&dir);
            }
            return Some(dir.join("config.toml"));
        }
        None
    }

    /// Resolve the configured color scheme to a theme
    pub fn theme(&self) -> Theme {
        Theme::by_name(&self.color_scheme)
    }
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Terminal palette consumed by the VT engine renderer.
///
/// Sixteen ANSI colors plus background, foreground and cursor. The bridge
/// does not own palette extraction; hosts may construct their own theme and
/// push it via `sync_theme`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub background: Color,
    pub foreground: Color,
    pub cursor: Color,
    /// ANSI colors 0-15 (normal 0-7, bright 8-15)
    pub ansi: [Color; 16],
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_scheme()
    }
}

impl Theme {
    /// Default scheme (One Dark derived)
    pub fn default_scheme() -> Self {
        Self {
            name: "default".to_string(),
            background: Color::new(0x1e, 0x1e, 0x1e),
            foreground: Color::new(0xd4, 0xd4, 0xd4),
            cursor: Color::new(0x52, 0x8b, 0xff),
            ansi: [
                Color::new(0x00, 0x00, 0x00), // black
                Color::new(0xe0, 0x6c, 0x75), // red
                Color::new(0x98, 0xc3, 0x79), // green
                Color::new(0xe5, 0xc0, 0x7b), // yellow
                Color::new(0x61, 0xaf, 0xef), // blue
                Color::new(0xc6, 0x78, 0xdd), // magenta
                Color::new(0x56, 0xb6, 0xc2), // cyan
                Color::new(0xab, 0xb2, 0xbf), // white
                Color::new(0x5c, 0x63, 0x70), // bright black
                Color::new(0xe0, 0x6c, 0x75),
                Color::new(0x98, 0xc3, 0x79),
                Color::new(0xe5, 0xc0, 0x7b),
                Color::new(0x61, 0xaf, 0xef),
                Color::new(0xc6, 0x78, 0xdd),
                Color::new(0x56, 0xb6, 0xc2),
                Color::new(0xff, 0xff, 0xff), // bright white
            ],
        }
    }

    /// Solarized Dark scheme
    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark".to_string(),
            background: Color::new(0x00, 0x2b, 0x36),
            foreground: Color::new(0x83, 0x94, 0x96),
            cursor: Color::new(0x93, 0xa1, 0xa1),
            ansi: [
                Color::new(0x07, 0x36, 0x42),
                Color::new(0xdc, 0x32, 0x2f),
                Color::new(0x85, 0x99, 0x00),
                Color::new(0xb5, 0x89, 0x00),
                Color::new(0x26, 0x8b, 0xd2),
                Color::new(0xd3, 0x36, 0x82),
                Color::new(0x2a, 0xa1, 0x98),
                Color::new(0xee, 0xe8, 0xd5),
                Color::new(0x00, 0x2b, 0x36),
                Color::new(0xcb, 0x4b, 0x16),
                Color::new(0x58, 0x6e, 0x75),
                Color::new(0x65, 0x7b, 0x83),
                Color::new(0x83, 0x94, 0x96),
                Color::new(0x6c, 0x71, 0xc4),
                Color::new(0x93, 0xa1, 0xa1),
                Color::new(0xfd, 0xf6, 0xe3),
            ],
        }
    }

    /// Dracula scheme
    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            background: Color::new(0x28, 0x2a, 0x36),
            foreground: Color::new(0xf8, 0xf8, 0xf2),
            cursor: Color::new(0xf8, 0xf8, 0xf2),
            ansi: [
                Color::new(0x21, 0x22, 0x2c),
                Color::new(0xff, 0x55, 0x55),
                Color::new(0x50, 0xfa, 0x7b),
                Color::new(0xf1, 0xfa, 0x8c),
                Color::new(0xbd, 0x93, 0xf9),
                Color::new(0xff, 0x79, 0xc6),
                Color::new(0x8b, 0xe9, 0xfd),
                Color::new(0xf8, 0xf8, 0xf2),
                Color::new(0x62, 0x72, 0xa4),
                Color::new(0xff, 0x6e, 0x6e),
                Color::new(0x69, 0xff, 0x94),
                Color::new(0xff, 0xff, 0xa5),
                Color::new(0xd6, 0xac, 0xff),
                Color::new(0xff, 0x92, 0xdf),
                Color::new(0xa4, 0xff, 0xff),
                Color::new(0xff, 0xff, 0xff),
            ],
        }
    }

    /// Nord scheme
    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            background: Color::new(0x2e, 0x34, 0x40),
            foreground: Color::new(0xd8, 0xde, 0xe9),
            cursor: Color::new(0xd8, 0xde, 0xe9),
            ansi: [
                Color::new(0x3b, 0x42, 0x52),
                Color::new(0xbf, 0x61, 0x6a),
                Color::new(0xa3, 0xbe, 0x8c),
                Color::new(0xeb, 0xcb, 0x8b),
                Color::new(0x81, 0xa1, 0xc1),
                Color::new(0xb4, 0x8e, 0xad),
                Color::new(0x88, 0xc0, 0xd0),
                Color::new(0xe5, 0xe9, 0xf0),
                Color::new(0x4c, 0x56, 0x6a),
                Color::new(0xbf, 0x61, 0x6a),
                Color::new(0xa3, 0xbe, 0x8c),
                Color::new(0xeb, 0xcb, 0x8b),
                Color::new(0x81, 0xa1, 0xc1),
                Color::new(0xb4, 0x8e, 0xad),
                Color::new(0x8f, 0xbc, 0xbb),
                Color::new(0xec, 0xef, 0xf4),
            ],
        }
    }

    /// Look up a scheme by name, falling back to the default
    pub fn by_name(name: &str) -> Self {
        match name {
            "solarized-dark" => Self::solarized_dark(),
            "dracula" => Self::dracula(),
            "nord" => Self::nord(),
            _ => Self::default_scheme(),
        }
    }

    /// Names of all built-in schemes
    pub fn scheme_names() -> &'static [&'static str] {
        &["default", "solarized-dark", "dracula", "nord"]
    }
}

/// Get the user's home directory
fn home_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
