use image::{RgbaImage, imageops};
use super::ie_state::{FilterKind, Filters};

type Matrix3 = [[f32; 3]; 3];

// Luminance weights shared by the saturate/hue-rotate matrices.
const LR: f32 = 0.213;
const LG: f32 = 0.715;
const LB: f32 = 0.072;

fn saturate_matrix(s: f32) -> Matrix3 {
    [
        [LR + (1.0 - LR) * s, LG - LG * s, LB - LB * s],
        [LR - LR * s, LG + (1.0 - LG) * s, LB - LB * s],
        [LR - LR * s, LG - LG * s, LB + (1.0 - LB) * s],
    ]
}

fn grayscale_matrix(amount: f32) -> Matrix3 {
    let s: f32 = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.2126 + 0.7874 * s, 0.7152 - 0.7152 * s, 0.0722 - 0.0722 * s],
        [0.2126 - 0.2126 * s, 0.7152 + 0.2848 * s, 0.0722 - 0.0722 * s],
        [0.2126 - 0.2126 * s, 0.7152 - 0.7152 * s, 0.0722 + 0.9278 * s],
    ]
}

fn sepia_matrix(amount: f32) -> Matrix3 {
    let s: f32 = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
        [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
        [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> Matrix3 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [LR + cos * (1.0 - LR) - sin * LR, LG - cos * LG - sin * LG, LB - cos * LB + sin * (1.0 - LB)],
        [LR - cos * LR + sin * 0.143, LG + cos * (1.0 - LG) + sin * 0.140, LB - cos * LB - sin * 0.283],
        [LR - cos * LR - sin * (1.0 - LR), LG - cos * LG + sin * LG, LB + cos * (1.0 - LB) + sin * LB],
    ]
}

fn apply_matrix(m: &Matrix3, c: [f32; 3]) -> [f32; 3] {
    let mut out: [f32; 3] = [0.0; 3];
    for (row, o) in m.iter().zip(out.iter_mut()) {
        *o = (row[0] * c[0] + row[1] * c[1] + row[2] * c[2]).clamp(0.0, 1.0);
    }
    out
}

/// One colour step of the filter chain. Channels are 0–1, clamped after each step.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColorStep {
    Linear { slope: f32, intercept: f32 },
    Matrix(Matrix3),
}

impl ColorStep {
    fn apply(&self, c: [f32; 3]) -> [f32; 3] {
        match self {
            ColorStep::Linear { slope, intercept } => c.map(|v| (v * slope + intercept).clamp(0.0, 1.0)),
            ColorStep::Matrix(m) => apply_matrix(m, c),
        }
    }
}

/// The colour steps for `filters` in application order. Adjustments sitting at
/// their identity value contribute nothing and are left out.
fn color_steps(filters: &Filters) -> Vec<ColorStep> {
    let mut steps: Vec<ColorStep> = Vec::with_capacity(7);
    for kind in FilterKind::ORDER {
        let value: f32 = filters.get(kind);
        if value == kind.identity() { continue; }
        let amount: f32 = value / 100.0;
        let step: ColorStep = match kind {
            FilterKind::Brightness => ColorStep::Linear { slope: amount, intercept: 0.0 },
            FilterKind::Contrast => ColorStep::Linear { slope: amount, intercept: 0.5 - 0.5 * amount },
            FilterKind::Saturate => ColorStep::Matrix(saturate_matrix(amount)),
            FilterKind::Grayscale => ColorStep::Matrix(grayscale_matrix(amount)),
            FilterKind::Sepia => ColorStep::Matrix(sepia_matrix(amount)),
            FilterKind::Invert => ColorStep::Linear { slope: 1.0 - 2.0 * amount, intercept: amount },
            FilterKind::HueRotate => ColorStep::Matrix(hue_rotate_matrix(value)),
            FilterKind::Blur => continue,
        };
        steps.push(step);
    }
    steps
}

/// Applies the composed tonal filter in place: the colour steps in their fixed
/// order on straight (unpremultiplied) RGB, then the gaussian blur.
pub(super) fn apply_filters(buf: &mut RgbaImage, filters: &Filters) {
    let steps: Vec<ColorStep> = color_steps(filters);
    if !steps.is_empty() {
        for pixel in buf.pixels_mut() {
            let [r, g, b, a] = pixel.0;
            let mut c: [f32; 3] = [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0];
            for step in &steps { c = step.apply(c); }
            pixel.0 = [to_u8(c[0]), to_u8(c[1]), to_u8(c[2]), a];
        }
    }

    if filters.blur > 0.0 {
        *buf = imageops::blur(&*buf, filters.blur);
    }
}

fn to_u8(v: f32) -> u8 { (v * 255.0).round().clamp(0.0, 255.0) as u8 }

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    fn single(rgba: [u8; 4]) -> RgbaImage { RgbaImage::from_pixel(1, 1, Rgba(rgba)) }

    fn filtered(rgba: [u8; 4], filters: Filters) -> [u8; 4] {
        let mut buf = single(rgba);
        apply_filters(&mut buf, &filters);
        buf.get_pixel(0, 0).0
    }

    #[test]
    fn test_identity_filters_leave_pixels_alone() {
        let mut buf = RgbaImage::from_fn(5, 5, |x, y| Rgba([(x * 50) as u8, (y * 50) as u8, 7, 200]));
        let original = buf.clone();
        apply_filters(&mut buf, &Filters::default());
        assert_eq!(buf, original);
    }

    #[test]
    fn test_brightness_and_contrast() {
        let f = Filters::default().with(FilterKind::Brightness, 50.0);
        assert_eq!(filtered([200, 100, 0, 255], f), [100, 50, 0, 255]);
        let f = Filters::default().with(FilterKind::Contrast, 0.0);
        assert_eq!(filtered([10, 240, 77, 255], f), [128, 128, 128, 255]);
    }

    #[test]
    fn test_full_invert_and_grayscale() {
        let f = Filters::default().with(FilterKind::Invert, 100.0);
        assert_eq!(filtered([0, 255, 55, 9], f), [255, 0, 200, 9]);
        let f = Filters::default().with(FilterKind::Grayscale, 100.0);
        let [r, g, b, _] = filtered([255, 0, 0, 255], f);
        assert_eq!((r, g), (g, b));
        assert_eq!(r, 54);
    }

    #[test]
    fn test_full_hue_rotation_is_near_identity() {
        let f = Filters::default().with(FilterKind::HueRotate, 360.0);
        let [r, g, b, a] = filtered([200, 120, 40, 255], f);
        assert!((r as i32 - 200).abs() <= 1);
        assert!((g as i32 - 120).abs() <= 1);
        assert!((b as i32 - 40).abs() <= 1);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_order_is_sequential_not_commutative() {
        // brightness then invert: 1 - 0.5*c ; invert then brightness would be 0.5*(1 - c)
        let f = Filters::default().with(FilterKind::Brightness, 50.0).with(FilterKind::Invert, 100.0);
        assert_eq!(filtered([0, 0, 0, 255], f), [255, 255, 255, 255]);
    }

    #[test]
    fn test_saturate_zero_matches_luma() {
        let f = Filters::default().with(FilterKind::Saturate, 0.0);
        let [r, g, b, _] = filtered([0, 255, 0, 255], f);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_blur_spreads_a_dot() {
        let mut buf = RgbaImage::from_pixel(9, 9, Rgba([0, 0, 0, 255]));
        buf.put_pixel(4, 4, Rgba([255, 255, 255, 255]));
        apply_filters(&mut buf, &Filters::default().with(FilterKind::Blur, 2.0));
        assert_eq!(buf.dimensions(), (9, 9));
        assert!(buf.get_pixel(4, 4).0[0] < 255);
        assert!(buf.get_pixel(5, 4).0[0] > 0);
    }
}
