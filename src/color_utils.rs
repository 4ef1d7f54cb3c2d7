// Maps event colors to terminal RGB values.
// Palette entries use fixed swatches; custom strings are parsed as hex, and
// anything else gets a deterministic hash-derived pastel.

use crate::model::{EventColor, Palette};
use std::hash::{Hash, Hasher};

/// Swatch of each palette entry, (r, g, b).
pub fn palette_rgb(palette: Palette) -> (u8, u8, u8) {
    match palette {
        Palette::Pink => (0xf9, 0xa8, 0xd4),
        Palette::Indigo => (0xa5, 0xb4, 0xfc),
        Palette::Green => (0x86, 0xef, 0xac),
        Palette::Yellow => (0xfd, 0xe0, 0x47),
        Palette::Red => (0xfc, 0xa5, 0xa5),
    }
}

/// Chip background for an event. No color renders as pink.
pub fn event_rgb(color: Option<&EventColor>) -> (u8, u8, u8) {
    match color {
        None => palette_rgb(Palette::Pink),
        Some(EventColor::Palette(p)) => palette_rgb(*p),
        Some(EventColor::Custom(raw)) => {
            parse_hex_to_u8(raw).unwrap_or_else(|| to_u8(generate_color(raw)))
        }
    }
}

fn to_u8((r, g, b): (f32, f32, f32)) -> (u8, u8, u8) {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    (c(r), c(g), c(b))
}

/// Generates a deterministic color tuple (r, g, b) in [0.0, 1.0] range based on the input string.
pub fn generate_color(tag: &str) -> (f32, f32, f32) {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    tag.hash(&mut hasher);
    let hash = hasher.finish();

    let h = (hash % 360) as f32;

    let hash_s = hash >> 16;
    let hash_l = hash >> 32;

    // Saturation 40-90%, lightness 65-90%: chips stay readable with black text.
    let s = 0.40 + ((hash_s % 51) as f32 / 100.0);
    let l = 0.65 + ((hash_l % 26) as f32 / 100.0);

    hsl_to_rgb(h, s, l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r1, g1, b1) = if (0.0..60.0).contains(&h) {
        (c, x, 0.0)
    } else if (60.0..120.0).contains(&h) {
        (x, c, 0.0)
    } else if (120.0..180.0).contains(&h) {
        (0.0, c, x)
    } else if (180.0..240.0).contains(&h) {
        (0.0, x, c)
    } else if (240.0..300.0).contains(&h) {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r1 + m, g1 + m, b1 + m)
}

/// Whether text on top of this background should be white rather than black.
pub fn is_dark((r, g, b): (u8, u8, u8)) -> bool {
    let brightness = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    brightness < 128.0
}

/// Parse a hex color string like "#RRGGBB" or "RRGGBB" into u8 tuple.
pub fn parse_hex_to_u8(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_pink() {
        assert_eq!(event_rgb(None), palette_rgb(Palette::Pink));
    }

    #[test]
    fn test_custom_hex() {
        let c = EventColor::Custom("#ff8800".into());
        assert_eq!(event_rgb(Some(&c)), (0xff, 0x88, 0x00));
        assert_eq!(parse_hex_to_u8("#ff88"), None);
        assert_eq!(parse_hex_to_u8("zz8800"), None);
    }

    #[test]
    fn test_named_custom_is_stable() {
        let c = EventColor::Custom("bg-teal-300".into());
        assert_eq!(event_rgb(Some(&c)), event_rgb(Some(&c)));
    }

    #[test]
    fn test_palette_swatches_are_light() {
        use strum::IntoEnumIterator;
        for p in Palette::iter() {
            assert!(!is_dark(palette_rgb(p)), "{:?}", p);
        }
        assert!(is_dark((0, 0, 0)));
    }
}
