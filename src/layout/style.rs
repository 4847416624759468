//! The style table: one immutable [`StyleRule`] per [`Tier`].
//!
//! The table is a plain value returned by [`StyleTable::standard`]. Each
//! render call builds (or is handed) its own table, so nothing a caller does
//! to one table can leak into another render.

use crate::layout::Tier;
use serde::{Deserialize, Serialize};

/// Which of the two standard fonts a tier is set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFace {
    /// Helvetica.
    Regular,
    /// Helvetica-Bold.
    Bold,
}

impl FontFace {
    /// Resource name used inside page content streams.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
        }
    }

    /// PDF standard Type1 font name.
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
        }
    }
}

/// Horizontal placement of the wrapped lines of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    /// Both edges aligned; the last line of a block is set flush left.
    Justify,
}

/// An RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);

    /// Relative luminance (sRGB weights, no gamma correction).
    ///
    /// Lower is darker, i.e. higher contrast on a white page.
    pub fn luminance(self) -> f32 {
        0.2126 * self.0 + 0.7152 * self.1 + 0.0722 * self.2
    }
}

/// Formatting parameters for one tier. All lengths are in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    pub tier: Tier,
    pub font: FontFace,
    pub font_size: f32,
    pub color: Rgb,
    pub space_before: f32,
    pub space_after: f32,
    /// Indent of the first line from the left margin.
    pub left_indent: f32,
    /// Extra indent of continuation lines, so wrapped bullet text lines up
    /// after the bullet.
    pub hanging_indent: f32,
    pub alignment: Alignment,
    /// Baseline-to-baseline distance.
    pub leading: f32,
}

/// The complete tier → rule mapping.
///
/// Lookup is total: there is a field per tier and [`StyleTable::rule`] is an
/// exhaustive match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleTable {
    pub title: StyleRule,
    pub h1: StyleRule,
    pub h2: StyleRule,
    pub h3: StyleRule,
    pub body: StyleRule,
    pub list_item: StyleRule,
}

impl StyleTable {
    /// The house style for circular analyses.
    pub fn standard() -> Self {
        let body_size = 10.5;
        Self {
            title: StyleRule {
                tier: Tier::Title,
                font: FontFace::Bold,
                font_size: 20.0,
                color: Rgb(0.09, 0.21, 0.37),
                space_before: 0.0,
                space_after: 24.0,
                left_indent: 0.0,
                hanging_indent: 0.0,
                alignment: Alignment::Center,
                leading: 24.0,
            },
            h1: StyleRule {
                tier: Tier::H1,
                font: FontFace::Bold,
                font_size: 16.0,
                color: Rgb(0.05, 0.16, 0.34),
                space_before: 18.0,
                space_after: 8.0,
                left_indent: 0.0,
                hanging_indent: 0.0,
                alignment: Alignment::Left,
                leading: 19.2,
            },
            h2: StyleRule {
                tier: Tier::H2,
                font: FontFace::Bold,
                font_size: 13.5,
                color: Rgb(0.16, 0.42, 0.62),
                space_before: 12.0,
                space_after: 6.0,
                left_indent: 10.0,
                hanging_indent: 0.0,
                alignment: Alignment::Left,
                leading: 16.2,
            },
            h3: StyleRule {
                tier: Tier::H3,
                font: FontFace::Bold,
                font_size: 11.5,
                color: Rgb(0.33, 0.33, 0.33),
                space_before: 10.0,
                space_after: 4.0,
                left_indent: 20.0,
                hanging_indent: 0.0,
                alignment: Alignment::Left,
                leading: 13.8,
            },
            body: StyleRule {
                tier: Tier::Body,
                font: FontFace::Regular,
                font_size: body_size,
                color: Rgb::BLACK,
                space_before: 0.0,
                space_after: 6.0,
                left_indent: 0.0,
                hanging_indent: 0.0,
                alignment: Alignment::Justify,
                leading: 13.5,
            },
            list_item: StyleRule {
                tier: Tier::ListItem,
                font: FontFace::Regular,
                font_size: body_size,
                color: Rgb::BLACK,
                space_before: 0.0,
                space_after: 3.0,
                left_indent: 20.0,
                hanging_indent: 10.0,
                alignment: Alignment::Left,
                leading: 13.5,
            },
        }
    }

    /// The rule for `tier`.
    pub fn rule(&self, tier: Tier) -> &StyleRule {
        match tier {
            Tier::Title => &self.title,
            Tier::H1 => &self.h1,
            Tier::H2 => &self.h2,
            Tier::H3 => &self.h3,
            Tier::Body => &self.body,
            Tier::ListItem => &self.list_item,
        }
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TIERS: [Tier; 6] = [
        Tier::Title,
        Tier::H1,
        Tier::H2,
        Tier::H3,
        Tier::Body,
        Tier::ListItem,
    ];

    #[test]
    fn lookup_is_total_and_tagged() {
        let table = StyleTable::standard();
        for tier in ALL_TIERS {
            assert_eq!(table.rule(tier).tier, tier);
        }
    }

    #[test]
    fn sizes_are_ordered() {
        let t = StyleTable::standard();
        assert!(t.title.font_size > t.h1.font_size);
        assert!(t.h1.font_size > t.h2.font_size);
        assert!(t.h2.font_size > t.h3.font_size);
        assert!(t.h3.font_size >= t.body.font_size);
        assert_eq!(t.list_item.font_size, t.body.font_size);
    }

    #[test]
    fn indents_are_ordered() {
        let t = StyleTable::standard();
        assert_eq!(t.title.left_indent, 0.0);
        assert_eq!(t.h1.left_indent, 0.0);
        assert!(t.h2.left_indent > t.h1.left_indent);
        assert!(t.h3.left_indent > t.h2.left_indent);
        assert_eq!(t.body.left_indent, 0.0);
        assert!(t.list_item.left_indent > 0.0);
        assert!(t.list_item.hanging_indent > 0.0);
    }

    #[test]
    fn heading_colours() {
        let t = StyleTable::standard();
        assert_ne!(t.h1.color, t.h2.color);
        assert!(t.h1.color.luminance() < t.h2.color.luminance());
        assert!(t.h1.color.luminance() < t.h3.color.luminance());
        // H3 is a grey.
        let Rgb(r, g, b) = t.h3.color;
        assert!((r - g).abs() < f32::EPSILON && (g - b).abs() < f32::EPSILON);
    }

    #[test]
    fn alignments() {
        let t = StyleTable::standard();
        assert_eq!(t.title.alignment, Alignment::Center);
        assert_eq!(t.body.alignment, Alignment::Justify);
    }

    #[test]
    fn tables_are_independent_values() {
        let mut a = StyleTable::standard();
        a.body.font_size = 30.0;
        let b = StyleTable::standard();
        assert_eq!(b.body.font_size, 10.5);
    }
}
