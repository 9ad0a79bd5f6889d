//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Puyo colours (index 0..=5): red, blue, yellow, green, magenta, cyan.
    pub puyo: [Color; 6],
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, chain).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text and the landing shadow.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// Hardcoded One Dark defaults: exact values from onedark.theme.
    pub fn onedark_default() -> Self {
        Self {
            puyo: [
                Color::Rgb(0xE0, 0x6C, 0x75), // cpu_end / red
                Color::Rgb(0x61, 0xAF, 0xEF), // cpu_box / blue
                Color::Rgb(0xE5, 0xC0, 0x7B), // title / yellow
                Color::Rgb(0x98, 0xC3, 0x79), // mem_box / green
                Color::Rgb(0xC6, 0x78, 0xDD), // net_box / magenta
                Color::Rgb(0x56, 0xB6, 0xC2), // hi_fg / cyan
            ],
            bg: Color::Rgb(0x31, 0x35, 0x3F),          // meter_bg
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),    // div_line
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),     // main_fg
            title: Color::Rgb(0xE5, 0xC0, 0x7B),       // title
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70), // inactive_fg
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or file is missing/invalid.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Default theme for a palette when no file is loaded.
    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override puyo colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.puyo = [
                    Color::Rgb(0xFF, 0x00, 0x00), // red
                    Color::Rgb(0x00, 0x88, 0xFF), // blue
                    Color::Rgb(0xFF, 0xFF, 0x00), // yellow
                    Color::Rgb(0x00, 0xFF, 0x00), // green
                    Color::Rgb(0xFF, 0x00, 0xFF), // magenta
                    Color::Rgb(0x00, 0xFF, 0xFF), // cyan
                ];
            }
            crate::Palette::Colorblind => {
                // Avoid red/green as the only difference between the first four.
                self.puyo = [
                    Color::Rgb(0xCC, 0x33, 0x11), // red
                    Color::Rgb(0x00, 0x77, 0xBB), // blue
                    Color::Rgb(0xBB, 0xBB, 0x00), // yellow
                    Color::Rgb(0x00, 0x99, 0x88), // teal
                    Color::Rgb(0xEE, 0x33, 0x77), // magenta
                    Color::Rgb(0xEE, 0x77, 0x33), // orange
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        // Keys match onedark.theme; anything missing keeps the One Dark value.
        let d = Self::onedark_default();
        Self {
            puyo: [
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.puyo[0]),
                get("cpu_box").unwrap_or(d.puyo[1]),
                get("title").or_else(|| get("cpu_mid")).unwrap_or(d.puyo[2]),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.puyo[3]),
                get("net_box").unwrap_or(d.puyo[4]),
                get("hi_fg").or_else(|| get("proc_misc")).unwrap_or(d.puyo[5]),
            ],
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    /// Colour for puyo index (0..6).
    #[inline]
    pub fn puyo_color(&self, index: u8) -> Color {
        self.puyo[(index as usize) % 6]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let (r, g, b) = if s.len() == 6 {
        let r =
            u8::from_str_radix(&s[0..2], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        let g =
            u8::from_str_radix(&s[2..4], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        let b =
            u8::from_str_radix(&s[4..6], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))?;
        (r, g, b)
    } else if s.len() == 3 {
        let r = u8::from_str_radix(&s[0..1], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        let g = u8::from_str_radix(&s[1..2], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        let b = u8::from_str_radix(&s[2..3], 16)
            .map_err(|_| ThemeError::InvalidHex(s.to_string()))?
            * 17;
        (r, g, b)
    } else {
        return Err(ThemeError::InvalidHex(s.to_string()));
    };
    Ok(Color::Rgb(r, g, b))
}
