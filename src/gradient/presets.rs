//! Predefined gradient templates.
//!
//! Pure data: named control-point layouts and palettes, grouped by grid size. Every preset
//! resolves to a [`GradientTemplate`] via [`Preset::template`].

use crate::foundation::core::Point;
use crate::gradient::color::Rgba;
use crate::gradient::template::GradientTemplate;

/// Predefined templates with a 2×2 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetSize2 {
    /// Deep indigo and violet blend.
    MysticTwilight,
    /// Bright spring green into coral.
    TropicalParadise,
    /// Pale icy blues.
    ArcticFrost,
    /// Dark blue-violet night tones.
    MidnightGalaxy,
}

/// Predefined templates with a 3×3 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetSize3 {
    /// Blue through magenta into amber.
    Intelligence,
    /// Polar blues over teal greens.
    AuroraBorealis,
    /// Warm oranges sinking into plum.
    SunsetGlow,
}

/// Predefined templates with a 4×4 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetSize4 {
    /// Polar blues over teal greens, 16-point variant.
    AuroraBorealis,
    /// Orange into crimson dusk bands.
    SunsetHorizon,
    /// Slate blues into magenta haze.
    CosmicNebula,
}

/// Any predefined template, tagged by grid size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// 2×2 presets.
    Size2(PresetSize2),
    /// 3×3 presets.
    Size3(PresetSize3),
    /// 4×4 presets.
    Size4(PresetSize4),
}

impl Preset {
    /// Resolve the preset into a concrete template.
    pub fn template(self) -> GradientTemplate {
        match self {
            Self::Size2(p) => p.template(),
            Self::Size3(p) => p.template(),
            Self::Size4(p) => p.template(),
        }
    }
}

fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
    raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

fn colors(hex: &[&str]) -> Vec<Rgba> {
    hex.iter().map(|h| Rgba::from_hex_lossy(h)).collect()
}

fn template(
    name: &str,
    grid_size: usize,
    points: Vec<Point>,
    palette: &[&str],
    background: &str,
) -> GradientTemplate {
    GradientTemplate {
        name: name.to_owned(),
        grid_size,
        points,
        colors: colors(palette),
        background: Rgba::from_hex_lossy(background),
    }
}

impl PresetSize2 {
    /// Corner points shared by every 2×2 preset.
    fn corner_points() -> Vec<Point> {
        pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)])
    }

    /// Resolve into a concrete template.
    pub fn template(self) -> GradientTemplate {
        let (name, palette, background) = match self {
            Self::MysticTwilight => (
                "Mystic Twilight",
                ["#4B0082", "#8A2BE2", "#9400D3", "#4169E1"],
                "#1A0033",
            ),
            Self::TropicalParadise => (
                "Tropical Paradise",
                ["#00FA9A", "#1E90FF", "#FFD700", "#FF6347"],
                "#006644",
            ),
            Self::ArcticFrost => (
                "Arctic Frost",
                ["#E0FFFF", "#B0E0E6", "#87CEEB", "#4682B4"],
                "#F0FFFF",
            ),
            Self::MidnightGalaxy => (
                "Midnight Galaxy",
                ["#191970", "#483D8B", "#6A5ACD", "#9370DB"],
                "#000033",
            ),
        };
        template(name, 2, Self::corner_points(), &palette, background)
    }
}

impl PresetSize3 {
    /// Resolve into a concrete template.
    pub fn template(self) -> GradientTemplate {
        match self {
            Self::Intelligence => template(
                "Intelligence",
                3,
                pts(&[
                    (0.000, 0.000),
                    (0.400, 0.000),
                    (1.000, 0.000),
                    (0.000, 0.450),
                    (0.653, 0.670),
                    (1.000, 0.200),
                    (0.000, 1.000),
                    (0.550, 1.000),
                    (1.000, 1.000),
                ]),
                &[
                    "#1BB1F9", "#648EF2", "#AE6FEE", "#9B79F1", "#ED50EB", "#F65490", "#F74A6B",
                    "#F47F3E", "#ED8D02",
                ],
                "#1BB1F9",
            ),
            Self::AuroraBorealis => template(
                "Aurora Borealis",
                3,
                pts(&[
                    (0.000, 0.000),
                    (0.400, 0.000),
                    (1.000, 0.000),
                    (0.000, 0.450),
                    (0.900, 0.700),
                    (1.000, 0.200),
                    (0.000, 1.000),
                    (0.550, 1.000),
                    (1.000, 1.000),
                ]),
                &[
                    "#0073e6", "#4da6ff", "#b3d9ff", "#00ff80", "#66ffb3", "#99ffcc", "#004d40",
                    "#008577", "#00a693",
                ],
                "#001a33",
            ),
            Self::SunsetGlow => template(
                "Sunset Glow",
                3,
                pts(&[
                    (0.000, 0.000),
                    (0.100, 0.000),
                    (1.000, 0.000),
                    (0.000, 0.537),
                    (0.182, 0.794),
                    (1.000, 0.148),
                    (0.000, 1.000),
                    (0.900, 1.000),
                    (1.000, 1.000),
                ]),
                &[
                    "#F29933", "#E66666", "#B3337F", "#CC4D80", "#99194D", "#660D33", "#4D0D26",
                    "#330D1A", "#1A0D0D",
                ],
                "#1A0D26",
            ),
        }
    }
}

impl PresetSize4 {
    /// Resolve into a concrete template.
    pub fn template(self) -> GradientTemplate {
        match self {
            Self::AuroraBorealis => template(
                "Aurora Borealis",
                4,
                pts(&[
                    (0.000, 0.000),
                    (0.263, 0.000),
                    (0.680, 0.000),
                    (1.000, 0.000),
                    (0.000, 0.244),
                    (0.565, 0.340),
                    (0.815, 0.689),
                    (1.000, 0.147),
                    (0.000, 0.715),
                    (0.289, 0.418),
                    (0.594, 0.766),
                    (1.000, 0.650),
                    (0.000, 1.000),
                    (0.244, 1.000),
                    (0.672, 1.000),
                    (1.000, 1.000),
                ]),
                &[
                    "#00264d", "#004080", "#0059b3", "#0073e6", "#1a8cff", "#4da6ff", "#80bfff",
                    "#b3d9ff", "#00ff80", "#33ff99", "#66ffb3", "#99ffcc", "#004d40", "#00665c",
                    "#008577", "#00a693",
                ],
                "#001a33",
            ),
            Self::SunsetHorizon => template(
                "Sunset Horizon",
                4,
                pts(&[
                    (0.000, 0.000),
                    (0.300, 0.000),
                    (0.700, 0.000),
                    (1.000, 0.000),
                    (0.000, 0.250),
                    (0.352, 0.641),
                    (0.609, 0.131),
                    (1.000, 0.200),
                    (0.000, 0.700),
                    (0.584, 0.764),
                    (0.790, 0.210),
                    (1.000, 0.750),
                    (0.000, 1.000),
                    (0.300, 1.000),
                    (0.700, 1.000),
                    (1.000, 1.000),
                ]),
                &[
                    "#ff6600", "#ff8533", "#ffa366", "#ffc199", "#ffb3ba", "#ff99a7", "#ff8093",
                    "#ff6680", "#ff4d6a", "#ff3357", "#ff1a44", "#ff0030", "#cc0026", "#990026",
                    "#660026", "#330026",
                ],
                "#660000",
            ),
            Self::CosmicNebula => template(
                "Cosmic Nebula",
                4,
                pts(&[
                    (0.000, 0.000),
                    (0.200, 0.000),
                    (0.800, 0.000),
                    (1.000, 0.000),
                    (0.000, 0.447),
                    (0.253, 0.317),
                    (0.300, 0.175),
                    (1.000, 0.404),
                    (0.000, 0.520),
                    (0.459, 0.666),
                    (0.741, 0.429),
                    (1.000, 0.784),
                    (0.000, 1.000),
                    (0.465, 1.000),
                    (0.616, 1.000),
                    (1.000, 1.000),
                ]),
                &[
                    "#1a1a33", "#33334d", "#4d4d66", "#666680", "#8080b3", "#9999cc", "#b3b3e6",
                    "#ccccff", "#ff99ff", "#ff66ff", "#ff33ff", "#ff00ff", "#cc00cc", "#990099",
                    "#660066", "#330033",
                ],
                "#0d0d1a",
            ),
        }
    }
}
