//! Coordinate mapping between the on-screen canvas and the pixel buffer.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point { pub x: f32, pub y: f32 }

impl Point {
    pub const fn new(x: f32, y: f32) -> Self { Self { x, y } }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point { Point::new(self.x - rhs.x, self.y - rhs.y) }
}

/// Where the rendered bitmap sits on screen, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayRect { pub left: f32, pub top: f32, pub width: f32, pub height: f32 }

impl DisplayRect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn is_empty(&self) -> bool { self.width <= 0.0 || self.height <= 0.0 }
}

/// Maps a pointer position measured against the displayed element into
/// pixel-buffer coordinates. X and Y scale independently, so the display
/// aspect ratio does not have to match the buffer's.
pub fn to_buffer_space(pointer: Point, display: DisplayRect, buffer_width: u32, buffer_height: u32) -> Point {
    if display.is_empty() { return Point::default(); }
    let scale_x: f32 = buffer_width as f32 / display.width;
    let scale_y: f32 = buffer_height as f32 / display.height;
    Point::new((pointer.x - display.left) * scale_x, (pointer.y - display.top) * scale_y)
}

/// Inverse of [`to_buffer_space`]; used to draw buffer-space overlays on screen.
pub fn to_display_space(point: Point, display: DisplayRect, buffer_width: u32, buffer_height: u32) -> Point {
    if buffer_width == 0 || buffer_height == 0 { return Point::new(display.left, display.top); }
    let scale_x: f32 = display.width / buffer_width as f32;
    let scale_y: f32 = display.height / buffer_height as f32;
    Point::new(display.left + point.x * scale_x, display.top + point.y * scale_y)
}

/// Size of the axis-aligned box that holds a `width × height` rectangle rotated
/// by `rotation_degrees`. Quarter turns are exact swaps.
pub fn rotated_bounding_box(width: f32, height: f32, rotation_degrees: f32) -> (f32, f32) {
    let deg: f32 = rotation_degrees.rem_euclid(360.0);
    if deg == 0.0 || deg == 180.0 { return (width, height); }
    if deg == 90.0 || deg == 270.0 { return (height, width); }

    let rad: f64 = (deg as f64).to_radians();
    let (cos, sin) = (rad.cos().abs(), rad.sin().abs());
    let (w, h) = (width as f64, height as f64);
    ((w * cos + h * sin) as f32, (w * sin + h * cos) as f32)
}

/// Integer output buffer size for a source of `width × height` under `rotation_degrees`.
pub fn output_size(width: u32, height: u32, rotation_degrees: i32) -> (u32, u32) {
    let (w, h) = rotated_bounding_box(width as f32, height as f32, rotation_degrees as f32);
    (w.round() as u32, h.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_buffer_space_uniform_scale() {
        let display = DisplayRect::new(10.0, 20.0, 200.0, 100.0);
        let p = to_buffer_space(Point::new(110.0, 70.0), display, 400, 200);
        assert_eq!(p, Point::new(200.0, 100.0));
    }

    #[test]
    fn test_buffer_space_non_uniform_scale() {
        let display = DisplayRect::new(0.0, 0.0, 100.0, 100.0);
        let p = to_buffer_space(Point::new(50.0, 50.0), display, 50, 200);
        assert_eq!(p, Point::new(25.0, 100.0));
    }

    #[test]
    fn test_buffer_space_zero_display() {
        let display = DisplayRect::new(5.0, 5.0, 0.0, 40.0);
        assert_eq!(to_buffer_space(Point::new(7.0, 9.0), display, 100, 100), Point::default());
    }

    #[test]
    fn test_display_space_round_trip() {
        let display = DisplayRect::new(30.0, 40.0, 120.0, 60.0);
        let buf = to_buffer_space(Point::new(90.0, 55.0), display, 480, 360);
        let back = to_display_space(buf, display, 480, 360);
        assert!((back.x - 90.0).abs() < 1e-3);
        assert!((back.y - 55.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotation_bounding_box_quarter_turns() {
        assert_eq!(rotated_bounding_box(100.0, 50.0, 0.0), (100.0, 50.0));
        assert_eq!(rotated_bounding_box(100.0, 50.0, 90.0), (50.0, 100.0));
        assert_eq!(rotated_bounding_box(100.0, 50.0, 360.0), rotated_bounding_box(100.0, 50.0, 0.0));
        assert_eq!(rotated_bounding_box(100.0, 50.0, -90.0), (50.0, 100.0));
        assert_eq!(rotated_bounding_box(100.0, 50.0, 540.0), (100.0, 50.0));
    }

    #[test]
    fn test_rotation_bounding_box_diagonal() {
        let (w, h) = rotated_bounding_box(100.0, 100.0, 45.0);
        let expected = 100.0 * std::f32::consts::SQRT_2;
        assert!((w - expected).abs() < 1e-3);
        assert!((h - expected).abs() < 1e-3);
    }

    #[test]
    fn test_output_size() {
        assert_eq!(output_size(100, 50, 90), (50, 100));
        assert_eq!(output_size(100, 50, -180), (100, 50));
        assert_eq!(output_size(100, 50, 630), (50, 100));
    }
}
