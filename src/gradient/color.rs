use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha.
    pub a: f64,
}

impl Rgba {
    /// Create a color from raw components.
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB components.
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Opaque white, the documented fallback for unparsable color strings.
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (case-insensitive, `#` optional).
    pub fn from_hex(s: &str) -> Result<Self, String> {
        parse_hex(s)
    }

    /// Like [`Rgba::from_hex`] but never fails: a malformed string yields opaque white.
    pub fn from_hex_lossy(s: &str) -> Self {
        parse_hex(s).unwrap_or(Self::WHITE)
    }

    /// Format as `#RRGGBB`, or `#RRGGBBAA` when `include_alpha` is set.
    pub fn to_hex_string(self, include_alpha: bool) -> String {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        if include_alpha {
            format!(
                "#{:02X}{:02X}{:02X}{:02X}",
                to_u8(self.r),
                to_u8(self.g),
                to_u8(self.b),
                to_u8(self.a)
            )
        } else {
            format!(
                "#{:02X}{:02X}{:02X}",
                to_u8(self.r),
                to_u8(self.g),
                to_u8(self.b)
            )
        }
    }

    /// Convert to premultiplied RGBA8 bytes `[r, g, b, a]`.
    pub fn to_rgba8_premul(self) -> [u8; 4] {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        let a = self.a.clamp(0.0, 1.0);
        [
            to_u8(self.r.clamp(0.0, 1.0) * a),
            to_u8(self.g.clamp(0.0, 1.0) * a),
            to_u8(self.b.clamp(0.0, 1.0) * a),
            to_u8(a),
        ]
    }

    /// Convert to opaque RGB8 bytes, ignoring alpha.
    pub fn to_rgb8(self) -> [u8; 3] {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [to_u8(self.r), to_u8(self.g), to_u8(self.b)]
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            RgbaObj {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "one")]
                a: f64,
            },
            Arr(Vec<f64>),
        }

        fn one() -> f64 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Self::rgba(r, g, b, a)),
            Repr::Arr(v) => {
                if v.len() == 3 {
                    Ok(Self::rgba(v[0], v[1], v[2], 1.0))
                } else if v.len() == 4 {
                    Ok(Self::rgba(v[0], v[1], v[2], v[3]))
                } else {
                    Err(serde::de::Error::custom(
                        "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                    ))
                }
            }
        }
    }
}

fn parse_hex(s: &str) -> Result<Rgba, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    // byte-range slicing below requires single-byte chars
    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    fn hex_nibble(ch: &str) -> Result<u8, String> {
        // 4-bit channel expanded to 8 bits (0xF -> 0xFF).
        let v = u8::from_str_radix(ch, 16).map_err(|_| format!("invalid hex digit \"{ch}\""))?;
        Ok(v * 17)
    }

    let (r, g, b, a) = match s.len() {
        3 => {
            let r = hex_nibble(&s[0..1])?;
            let g = hex_nibble(&s[1..2])?;
            let b = hex_nibble(&s[2..3])?;
            (r, g, b, 255)
        }
        6 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            (r, g, b, 255)
        }
        8 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            let a = hex_byte(&s[6..8])?;
            (r, g, b, a)
        }
        _ => {
            return Err("hex color must be #RGB, #RRGGBB or #RRGGBBAA".to_owned());
        }
    };

    Ok(Rgba::rgba(
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
        f64::from(a) / 255.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgba::from_hex("#ff0000").unwrap(), Rgba::rgb(1.0, 0.0, 0.0));
        assert_eq!(Rgba::from_hex("F00").unwrap(), Rgba::rgb(1.0, 0.0, 0.0));

        let c = Rgba::from_hex("#0000ff80").unwrap();
        assert!((c.b - 1.0).abs() < 1e-9);
        assert!((c.a - (128.0 / 255.0)).abs() < 1e-9);
    }

    #[test]
    fn lossy_parse_falls_back_to_white() {
        assert_eq!(Rgba::from_hex_lossy("#12345"), Rgba::WHITE);
        assert_eq!(Rgba::from_hex_lossy("not a color"), Rgba::WHITE);
        assert_eq!(Rgba::from_hex_lossy("#€€"), Rgba::WHITE);
        assert_eq!(Rgba::from_hex_lossy("#4B0082"), Rgba::from_hex("#4B0082").unwrap());
    }

    #[test]
    fn hex_round_trip() {
        let c = Rgba::from_hex("#4B0082").unwrap();
        assert_eq!(c.to_hex_string(false), "#4B0082");
        assert_eq!(c.to_hex_string(true), "#4B0082FF");
    }

    #[test]
    fn premul_conversion() {
        let c = Rgba::rgba(1.0, 0.0, 0.0, 0.5);
        assert_eq!(c.to_rgba8_premul(), [128, 0, 0, 128]);
        assert_eq!(Rgba::WHITE.to_rgba8_premul(), [255, 255, 255, 255]);
    }

    #[test]
    fn deserializes_hex_object_and_array() {
        let c: Rgba = serde_json::from_value(json!("#ff0000")).unwrap();
        assert_eq!(c, Rgba::rgb(1.0, 0.0, 0.0));

        let c: Rgba = serde_json::from_value(json!({"r": 0.25, "g": 0.5, "b": 0.75})).unwrap();
        assert_eq!(c, Rgba::rgba(0.25, 0.5, 0.75, 1.0));

        let c: Rgba = serde_json::from_value(json!([0.25, 0.5, 0.75, 0.9])).unwrap();
        assert_eq!(c, Rgba::rgba(0.25, 0.5, 0.75, 0.9));
    }
}
