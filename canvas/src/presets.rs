//! One-click style presets. Each preset is a single text patch that
//! overrides stroke and badge styling of the selected element.

use crate::doc::TextPatch;

/// Named style presets offered by the property panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylePreset {
    /// White text, no outline, no badge.
    Plain,
    /// White bold text with a thick black outline.
    Outlined,
    /// Black bold text on a rounded white badge.
    WhiteBadge,
    /// White bold text on a rounded black badge.
    BlackBadge,
}

impl StylePreset {
    #[must_use]
    pub fn patch(self) -> TextPatch {
        let bold = Some(Some("bold".to_owned()));
        match self {
            Self::Plain => TextPatch {
                fill: Some("#ffffff".to_owned()),
                stroke: Some(None),
                stroke_width: Some(Some(0.0)),
                background_fill: Some(None),
                background_padding: Some(Some(0.0)),
                background_corner_radius: Some(Some(0.0)),
                ..Default::default()
            },
            Self::Outlined => TextPatch {
                fill: Some("#ffffff".to_owned()),
                stroke: Some(Some("#000000".to_owned())),
                stroke_width: Some(Some(12.0)),
                background_fill: Some(None),
                background_padding: Some(Some(0.0)),
                background_corner_radius: Some(Some(0.0)),
                font_style: bold,
                ..Default::default()
            },
            Self::WhiteBadge => badge("#000000", "#ffffff"),
            Self::BlackBadge => badge("#ffffff", "#000000"),
        }
    }
}

fn badge(fill: &str, background: &str) -> TextPatch {
    TextPatch {
        fill: Some(fill.to_owned()),
        stroke: Some(None),
        stroke_width: Some(Some(0.0)),
        background_fill: Some(Some(background.to_owned())),
        background_padding: Some(Some(18.0)),
        background_corner_radius: Some(Some(22.0)),
        font_style: Some(Some("bold".to_owned())),
        ..Default::default()
    }
}
