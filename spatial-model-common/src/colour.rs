use anyhow::Result;
use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};

// Named colours accepted in config files (RGBA format)
const COLOUR_MAP: &[(&str, [u8; 4])] = &[
    ("black", [0, 0, 0, 255]),
    ("white", [255, 255, 255, 255]),
    ("red", [255, 0, 0, 255]),
    ("green", [0, 255, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("cyan", [0, 255, 255, 255]),
    ("magenta", [255, 0, 255, 255]),
];

/// Default display colours, one per species, in species order.
pub const DEFAULT_SPECIES_COLOURS: [[u8; 3]; 20] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
    [210, 245, 60],
    [250, 190, 190],
    [0, 128, 128],
    [230, 190, 255],
    [170, 110, 40],
    [255, 250, 200],
    [128, 0, 0],
    [170, 255, 195],
    [128, 128, 0],
    [255, 215, 180],
    [0, 0, 128],
    [128, 128, 128],
];

/// Parses a colour given either by name (`"red"`) or as `#rrggbb` / `#rrggbbaa` hex.
/// Hex colours without an alpha component are fully opaque.
pub fn parse_colour(colour: &str) -> Result<[u8; 4]> {
    let colour = colour.trim();
    for &(name, rgba) in COLOUR_MAP {
        if name.eq_ignore_ascii_case(colour) {
            return Ok(rgba);
        }
    }

    let hex = match colour.strip_prefix('#') {
        Some(hex) => hex,
        None => anyhow::bail!("Colour '{}' is neither a known name nor a '#rrggbb' hex value.", colour),
    };
    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("Hex colour '{}' must have exactly 6 or 8 hex digits.", colour);
    }

    let mut rgba = [0, 0, 0, 255];
    for (i, channel) in rgba.iter_mut().enumerate().take(hex.len() / 2) {
        let digits = &hex[2 * i..2 * i + 2];
        *channel = u8::from_str_radix(digits, 16)
            .map_err(|e| anyhow::anyhow!("Invalid hex digits '{}' in colour '{}': {}", digits, colour, e))?;
    }
    Ok(rgba)
}

/// Ordered display colours for species, indexed by species index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesPalette {
    colours: Vec<[u8; 3]>,
}

impl Default for SpeciesPalette {
    fn default() -> Self {
        Self { colours: DEFAULT_SPECIES_COLOURS.to_vec() }
    }
}

impl SpeciesPalette {
    /// Creates a palette from caller-supplied colours.
    pub fn new(colours: Vec<[u8; 3]>) -> Self {
        Self { colours }
    }

    /// Returns the default palette, extended with evenly spaced HSV hues
    /// until it holds at least `count` colours.
    pub fn with_len(count: usize) -> Self {
        let mut colours = DEFAULT_SPECIES_COLOURS.to_vec();
        let extra = count.saturating_sub(colours.len());
        for i in 0..extra {
            // Offset the hues by half a step so they don't land exactly on pure red/green/blue
            let hue = (i as f32 + 0.5) / (extra as f32);
            let hsv: Hsv = Hsv::new(hue * 360.0, 0.7, 0.8);
            let rgb: Srgb = Srgb::from_color(hsv);
            colours.push([
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            ]);
        }
        Self { colours }
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }

    /// Colour of the given species. Panics if the palette has no entry for it.
    pub fn colour(&self, species_index: usize) -> [u8; 3] {
        self.colours[species_index]
    }

    /// Replaces the colour of one species.
    pub fn set_colour(&mut self, species_index: usize, colour: [u8; 3]) {
        self.colours[species_index] = colour;
    }

    pub fn colours(&self) -> &[[u8; 3]] {
        &self.colours
    }
}
