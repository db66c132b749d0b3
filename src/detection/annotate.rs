use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::models::{BoundingBox, Contour, Peak};

const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const PEAK_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const ROI_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const LABEL_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

/// Draw contour outlines, bounding rectangles, and sequential labels on a
/// copy of the image. The input is never mutated.
pub fn annotate_contours(image: &DynamicImage, contours: &[Contour]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    for (i, contour) in contours.iter().enumerate() {
        draw_contour_outline(&mut canvas, contour, CONTOUR_COLOR);
        let bbox = contour.bounding_box();
        if bbox.width > 0 && bbox.height > 0 {
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width, bbox.height),
                BOX_COLOR,
            );
        }
        draw_label(&mut canvas, bbox.x as i32 + 3, bbox.y as i32 + 3, (i + 1) as u32);
    }
    canvas
}

/// Draw a horizontal line and a sequential label at each peak's row on a
/// copy of the image.
pub fn annotate_peaks(image: &DynamicImage, peaks: &[Peak]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let right = canvas.width().saturating_sub(1) as f32;
    for (i, peak) in peaks.iter().enumerate() {
        let y = peak.index as f32;
        draw_line_segment_mut(&mut canvas, (0.0, y), (right, y), PEAK_COLOR);
        draw_label(&mut canvas, 3, peak.index as i32 + 3, (i + 1) as u32);
    }
    canvas
}

/// Draw the clamped search rectangle on a copy of the full frame, showing
/// the operator where the detector looked.
pub fn annotate_roi(image: &DynamicImage, region: &BoundingBox) -> RgbImage {
    let mut canvas = image.to_rgb8();
    if region.width > 0 && region.height > 0 {
        draw_hollow_rect_mut(
            &mut canvas,
            Rect::at(region.x as i32, region.y as i32).of_size(region.width, region.height),
            ROI_COLOR,
        );
    }
    canvas
}

fn draw_contour_outline(canvas: &mut RgbImage, contour: &Contour, color: Rgb<u8>) {
    let points = &contour.points;
    if points.len() < 2 {
        return;
    }
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        draw_line_segment_mut(
            canvas,
            (p.x as f32, p.y as f32),
            (q.x as f32, q.y as f32),
            color,
        );
    }
}

// 3x5 digit glyphs, three bits per row, top row first.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];
const GLYPH_SCALE: i32 = 2;

/// Stamp a decimal label with the built-in digit glyphs. Pixels falling
/// outside the canvas are skipped.
fn draw_label(canvas: &mut RgbImage, x: i32, y: i32, value: u32) {
    let mut cx = x;
    for byte in value.to_string().bytes() {
        let glyph = &DIGITS[(byte - b'0') as usize];
        draw_glyph(canvas, cx, y, glyph);
        cx += 4 * GLYPH_SCALE;
    }
}

fn draw_glyph(canvas: &mut RgbImage, x: i32, y: i32, glyph: &[u8; 5]) {
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..3i32 {
            if bits & (0b100 >> col) == 0 {
                continue;
            }
            for dy in 0..GLYPH_SCALE {
                for dx in 0..GLYPH_SCALE {
                    let px = x + col * GLYPH_SCALE + dx;
                    let py = y + row as i32 * GLYPH_SCALE + dy;
                    if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height()
                    {
                        canvas.put_pixel(px as u32, py as u32, LABEL_COLOR);
                    }
                }
            }
        }
    }
}
