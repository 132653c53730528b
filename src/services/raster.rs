//! Native rasterizer for a projected scene.
//!
//! DESIGN
//! ======
//! The browser paints scenes with `Canvas2D`; export has no browser, so this
//! module paints the same scene into an RGBA buffer at a pixel ratio. The
//! background is cropped to the visible cover region and resampled once.
//! Text is rasterized with one `ab_glyph` font for every family: glyph
//! coverage is accumulated per text node, the outline is that coverage
//! dilated by half the stroke width, and passes are composited in the
//! scene's order so fill lands on top of stroke.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use ab_glyph::{Font, FontArc, PxScale, PxScaleFont, ScaleFont};
use canvas::geometry::Rect;
use canvas::layout::PaintPass;
use canvas::scene::{BadgeNode, Scene, SceneNode, TextNode};
use canvas::surface::{FontSpec, TextMeasure};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::warn;

/// Fallback when a color string cannot be parsed.
const FALLBACK_COLOR: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("a font is required to rasterize text")]
    MissingFont,
    #[error("background image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Measures text with the font export paints with, so wrapped lines and
/// alignment offsets agree with the painted glyphs.
#[derive(Clone)]
pub struct FontMeasure {
    font: FontArc,
}

impl FontMeasure {
    #[must_use]
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }
}

impl TextMeasure for FontMeasure {
    fn line_width(&self, line: &str, font: &FontSpec) -> f64 {
        #[allow(clippy::cast_possible_truncation)]
        let scaled = self.font.as_scaled(PxScale::from(font.size as f32));
        f64::from(advance_width(&scaled, line))
    }
}

fn advance_width(scaled: &PxScaleFont<&FontArc>, line: &str) -> f32 {
    let mut width = 0.0;
    let mut prev = None;
    for ch in line.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, or a handful of CSS names.
#[must_use]
pub fn parse_color(raw: &str) -> Option<[u8; 4]> {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "black" => return Some([0, 0, 0, 255]),
        "white" => return Some([255, 255, 255, 255]),
        "red" => return Some([255, 0, 0, 255]),
        "transparent" => return Some([0, 0, 0, 0]),
        _ => {}
    }
    let hex = trimmed.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let r = hex_byte(&hex[0..1].repeat(2))?;
            let g = hex_byte(&hex[1..2].repeat(2))?;
            let b = hex_byte(&hex[2..3].repeat(2))?;
            Some([r, g, b, 255])
        }
        6 | 8 => {
            let r = hex_byte(&hex[0..2])?;
            let g = hex_byte(&hex[2..4])?;
            let b = hex_byte(&hex[4..6])?;
            let a = if hex.len() == 8 { hex_byte(&hex[6..8])? } else { 255 };
            Some([r, g, b, a])
        }
        _ => None,
    }
}

fn hex_byte(digits: &str) -> Option<u8> {
    match u8::from_str_radix(digits, 16) {
        Ok(v) => Some(v),
        Err(_) => None,
    }
}

fn color_or_fallback(raw: &str) -> [u8; 4] {
    parse_color(raw).unwrap_or_else(|| {
        warn!(color = raw, "unparseable color, using black");
        FALLBACK_COLOR
    })
}

/// Whether painting `scene` needs a font.
#[must_use]
pub fn needs_font(scene: &Scene) -> bool {
    scene.nodes.iter().any(|node| match node {
        SceneNode::Text(text) => text.lines.iter().any(|line| !line.text.is_empty()),
        _ => false,
    })
}

/// Paint `scene` at `pixel_ratio`. `background` holds the encoded image
/// bytes behind any image node.
///
/// # Errors
///
/// Returns [`RasterError::MissingFont`] if the scene has text and no font was
/// given, or a decode error for the background bytes.
pub fn render_scene(
    scene: &Scene,
    background: Option<&[u8]>,
    font: Option<&FontArc>,
    pixel_ratio: f64,
) -> Result<RgbaImage, RasterError> {
    if font.is_none() && needs_font(scene) {
        return Err(RasterError::MissingFont);
    }
    let width = device_len(scene.width, pixel_ratio);
    let height = device_len(scene.height, pixel_ratio);
    let mut img = RgbaImage::new(width, height);

    for node in &scene.nodes {
        match node {
            SceneNode::Backdrop { rect, fill } => {
                fill_rect(&mut img, scaled_rect(*rect, pixel_ratio), color_or_fallback(fill));
            }
            SceneNode::Image { rect, .. } => {
                if let Some(bytes) = background {
                    let decoded = image::load_from_memory(bytes)?;
                    draw_cover(&mut img, &decoded, *rect, scene, pixel_ratio);
                }
            }
            SceneNode::Text(text) => draw_text(&mut img, text, font, pixel_ratio),
            SceneNode::Guide { from, to, stroke, width } => {
                let half = width / 2.0;
                let rect = Rect::new(from.x.min(to.x) - half, from.y.min(to.y) - half, (to.x - from.x).abs() + width, (to.y - from.y).abs() + width);
                fill_rect(&mut img, scaled_rect(rect, pixel_ratio), color_or_fallback(stroke));
            }
            // Selection chrome is drawn by the browser surface only.
            SceneNode::Selection { .. } => {}
        }
    }
    Ok(img)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn device_len(len: f64, pixel_ratio: f64) -> u32 {
    (len * pixel_ratio).round().max(1.0) as u32
}

fn scaled_rect(rect: Rect, pixel_ratio: f64) -> Rect {
    Rect::new(rect.x * pixel_ratio, rect.y * pixel_ratio, rect.width * pixel_ratio, rect.height * pixel_ratio)
}

// =============================================================
// Compositing
// =============================================================

fn blend(img: &mut RgbaImage, x: u32, y: u32, color: [u8; 4], coverage: f32) {
    let alpha = (f32::from(color[3]) / 255.0) * coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let dst = img.get_pixel_mut(x, y);
    let Rgba(d) = *dst;
    let mix = |s: u8, d: u8| -> u8 {
        let v = f32::from(s) * alpha + f32::from(d) * (1.0 - alpha);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let out = v.round().clamp(0.0, 255.0) as u8;
        out
    };
    let out_alpha = alpha + (f32::from(d[3]) / 255.0) * (1.0 - alpha);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let a = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    *dst = Rgba([mix(color[0], d[0]), mix(color[1], d[1]), mix(color[2], d[2]), a]);
}

/// Pixel span `[start, end)` of `[lo, hi)` clipped to `[0, max)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn span(lo: f64, hi: f64, max: u32) -> (u32, u32) {
    let start = lo.floor().clamp(0.0, f64::from(max)) as u32;
    let end = hi.ceil().clamp(0.0, f64::from(max)) as u32;
    (start, end.max(start))
}

fn fill_rect(img: &mut RgbaImage, rect: Rect, color: [u8; 4]) {
    let (x0, x1) = span(rect.x, rect.right(), img.width());
    let (y0, y1) = span(rect.y, rect.bottom(), img.height());
    for y in y0..y1 {
        for x in x0..x1 {
            blend(img, x, y, color, 1.0);
        }
    }
}

/// Crop the visible part of the cover-fit image and resample it onto the
/// canvas in one pass.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_cover(img: &mut RgbaImage, source: &DynamicImage, rect: Rect, scene: &Scene, pixel_ratio: f64) {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return;
    }
    let scale = rect.width / f64::from(source.width());
    let crop_x = (-rect.x / scale).max(0.0);
    let crop_y = (-rect.y / scale).max(0.0);
    let crop_w = (scene.width / scale).min(f64::from(source.width()) - crop_x).max(1.0);
    let crop_h = (scene.height / scale).min(f64::from(source.height()) - crop_y).max(1.0);
    let cropped = source.crop_imm(crop_x.round() as u32, crop_y.round() as u32, crop_w.round() as u32, crop_h.round() as u32);

    let resized = cropped.resize_exact(img.width(), img.height(), FilterType::Triangle).to_rgba8();
    let dest_x = (rect.x.max(0.0) * pixel_ratio).round() as i64;
    let dest_y = (rect.y.max(0.0) * pixel_ratio).round() as i64;
    image::imageops::overlay(img, &resized, dest_x, dest_y);
}

// =============================================================
// Text
// =============================================================

/// Per-node coverage over a clipped pixel window.
struct Coverage {
    x0: u32,
    y0: u32,
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Coverage {
    fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        let width = x1.saturating_sub(x0);
        let height = y1.saturating_sub(y0);
        Self { x0, y0, width, height, data: vec![0.0; (width as usize) * (height as usize)] }
    }

    fn add(&mut self, x: i64, y: i64, value: f32) {
        let lx = x - i64::from(self.x0);
        let ly = y - i64::from(self.y0);
        if lx < 0 || ly < 0 || lx >= i64::from(self.width) || ly >= i64::from(self.height) {
            return;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = ly as usize * self.width as usize + lx as usize;
        self.data[idx] = (self.data[idx] + value).min(1.0);
    }

    /// Separable square max-filter of `radius` pixels.
    fn dilate(&self, radius: usize) -> Self {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut horizontal = vec![0.0f32; self.data.len()];
        for y in 0..h {
            for x in 0..w {
                let lo = x.saturating_sub(radius);
                let hi = (x + radius + 1).min(w);
                horizontal[y * w + x] = self.data[y * w + lo..y * w + hi].iter().copied().fold(0.0, f32::max);
            }
        }
        let mut data = vec![0.0f32; self.data.len()];
        for y in 0..h {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius + 1).min(h);
            for x in 0..w {
                data[y * w + x] = (lo..hi).map(|yy| horizontal[yy * w + x]).fold(0.0, f32::max);
            }
        }
        Self { x0: self.x0, y0: self.y0, width: self.width, height: self.height, data }
    }

    fn paint(&self, img: &mut RgbaImage, color: [u8; 4]) {
        for ly in 0..self.height {
            for lx in 0..self.width {
                let value = self.data[(ly as usize) * (self.width as usize) + lx as usize];
                if value > 0.0 {
                    blend(img, self.x0 + lx, self.y0 + ly, color, value);
                }
            }
        }
    }
}

fn draw_text(img: &mut RgbaImage, node: &TextNode, font: Option<&FontArc>, pixel_ratio: f64) {
    let t = node.transform;
    let device_scale = t.scale_x * pixel_ratio;

    if let Some(badge) = &node.badge {
        draw_badge(img, badge, node, pixel_ratio);
    }
    let Some(font) = font else {
        return;
    };

    let stroke_half = node.stroke.as_ref().map_or(0.0, |s| s.width / 2.0 * device_scale);
    let window = scaled_rect(node.client_rect(), pixel_ratio).expand(stroke_half + 2.0);
    let (x0, x1) = span(window.x, window.right(), img.width());
    let (y0, y1) = span(window.y, window.bottom(), img.height());
    let mut coverage = Coverage::new(x0, y0, x1, y1);

    #[allow(clippy::cast_possible_truncation)]
    let px_size = (node.font.size * device_scale) as f32;
    let scaled = font.as_scaled(PxScale::from(px_size));
    for line in &node.lines {
        #[allow(clippy::cast_possible_truncation)]
        let mut caret = ((t.x + line.x * t.scale_x) * pixel_ratio) as f32;
        #[allow(clippy::cast_possible_truncation)]
        let baseline = ((t.y + line.y * t.scale_y) * pixel_ratio) as f32 + scaled.ascent();
        let mut prev = None;
        for ch in line.text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(px_size, ab_glyph::point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, c| {
                    #[allow(clippy::cast_possible_truncation)]
                    let (x, y) = (bounds.min.x as i64 + i64::from(gx), bounds.min.y as i64 + i64::from(gy));
                    coverage.add(x, y, c);
                });
            }
        }
    }

    for pass in node.passes {
        match pass {
            PaintPass::Stroke => {
                if let Some(stroke) = &node.stroke {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let radius = stroke_half.ceil() as usize;
                    coverage.dilate(radius).paint(img, color_or_fallback(&stroke.color));
                }
            }
            PaintPass::Fill => coverage.paint(img, color_or_fallback(&node.fill)),
        }
    }
}

/// Rounded rectangle with a one-pixel anti-aliased edge.
fn draw_badge(img: &mut RgbaImage, badge: &BadgeNode, node: &TextNode, pixel_ratio: f64) {
    let rect = scaled_rect(node.transform.client_rect(badge.rect), pixel_ratio);
    let radius = (badge.corner_radius * node.transform.scale_x * pixel_ratio).clamp(0.0, rect.width.min(rect.height) / 2.0);
    let color = color_or_fallback(&badge.fill);
    let center = rect.center();
    let (half_w, half_h) = (rect.width / 2.0, rect.height / 2.0);

    let (x0, x1) = span(rect.x - 1.0, rect.right() + 1.0, img.width());
    let (y0, y1) = span(rect.y - 1.0, rect.bottom() + 1.0, img.height());
    for y in y0..y1 {
        for x in x0..x1 {
            let px = (f64::from(x) + 0.5 - center.x).abs() - (half_w - radius);
            let py = (f64::from(y) + 0.5 - center.y).abs() - (half_h - radius);
            let outside = px.max(0.0).hypot(py.max(0.0));
            let distance = outside + px.max(py).min(0.0) - radius;
            #[allow(clippy::cast_possible_truncation)]
            let coverage = (0.5 - distance).clamp(0.0, 1.0) as f32;
            if coverage > 0.0 {
                blend(img, x, y, color, coverage);
            }
        }
    }
}
