use super::ie_crop::CropRect;
use super::ie_geometry::{DisplayRect, Point, to_buffer_space};
use super::ie_state::TextOverlay;
use super::ie_text::TextMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Adjust,
    Crop,
}

/// What the pointer is doing right now. Positions are in buffer space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Cropping { anchor: Point },
    DraggingText { grab_offset: Point },
}

/// Pointer input in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionOutcome {
    Nothing,
    /// The live crop rectangle changed. Not recorded.
    CropChanged(CropRect),
    /// The overlay should move to this centre. Not recorded.
    TextMoved(Point),
    /// A text drag ended; the caller commits the position once.
    TextReleased,
}

/// Where the rendered buffer sits on screen and how big it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub display: DisplayRect,
    pub buffer_width: u32,
    pub buffer_height: u32,
}

impl Viewport {
    fn to_buffer(&self, p: Point) -> Point {
        to_buffer_space(p, self.display, self.buffer_width, self.buffer_height)
    }
}

/// Box of `measured_width × font_size` centred on the text anchor, edges inclusive.
pub fn text_hit_test(text: &TextOverlay, measured_width: f32, pos: Point) -> bool {
    let half_w: f32 = measured_width / 2.0;
    let half_h: f32 = text.font_size / 2.0;
    pos.x >= text.x - half_w && pos.x <= text.x + half_w && pos.y >= text.y - half_h && pos.y <= text.y + half_h
}

/// Turns pointer events into crop-rectangle or text-drag updates.
#[derive(Debug, Default)]
pub struct InteractionController {
    tool: Tool,
    mode: Interaction,
    crop: Option<CropRect>,
}

impl InteractionController {
    pub fn new() -> Self { Self::default() }

    pub fn tool(&self) -> Tool { self.tool }
    pub fn mode(&self) -> Interaction { self.mode }
    pub fn crop(&self) -> Option<CropRect> { self.crop }

    /// Any tool change goes back to idle and drops the in-progress rectangle.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.mode = Interaction::Idle;
        self.crop = None;
    }

    /// Hands the pending rectangle to the caller for applying.
    pub fn take_crop(&mut self) -> Option<CropRect> {
        self.mode = Interaction::Idle;
        self.crop.take()
    }

    /// Discards the rectangle and returns to the adjustment tool.
    pub fn cancel_crop(&mut self) {
        self.set_tool(Tool::Adjust);
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        viewport: &Viewport,
        text: &TextOverlay,
        metrics: &dyn TextMetrics,
    ) -> InteractionOutcome {
        match (self.mode, event) {
            (Interaction::Idle, PointerEvent::Down(p)) => {
                let pos: Point = viewport.to_buffer(p);
                match self.tool {
                    Tool::Crop => {
                        self.mode = Interaction::Cropping { anchor: pos };
                        let rect: CropRect = CropRect::from_corners(pos, pos);
                        self.crop = Some(rect);
                        InteractionOutcome::CropChanged(rect)
                    }
                    Tool::Adjust => {
                        if text.visible && text_hit_test(text, metrics.text_width(text), pos) {
                            self.mode = Interaction::DraggingText { grab_offset: pos - Point::new(text.x, text.y) };
                        }
                        InteractionOutcome::Nothing
                    }
                }
            }
            (Interaction::Cropping { anchor }, PointerEvent::Move(p)) => {
                let rect: CropRect = CropRect::from_corners(anchor, viewport.to_buffer(p));
                self.crop = Some(rect);
                InteractionOutcome::CropChanged(rect)
            }
            (Interaction::DraggingText { grab_offset }, PointerEvent::Move(p)) => {
                InteractionOutcome::TextMoved(viewport.to_buffer(p) - grab_offset)
            }
            (Interaction::Cropping { .. }, PointerEvent::Up | PointerEvent::Leave) => {
                self.mode = Interaction::Idle;
                InteractionOutcome::Nothing
            }
            (Interaction::DraggingText { .. }, PointerEvent::Up | PointerEvent::Leave) => {
                self.mode = Interaction::Idle;
                InteractionOutcome::TextReleased
            }
            _ => InteractionOutcome::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FixedWidth(f32);

    impl TextMetrics for FixedWidth {
        fn text_width(&self, _text: &TextOverlay) -> f32 { self.0 }
    }

    fn hi_text() -> TextOverlay {
        TextOverlay { content: "Hi".into(), x: 100.0, y: 100.0, font_size: 40.0, visible: true, ..TextOverlay::default() }
    }

    /// Display and buffer are the same size.
    fn one_to_one() -> Viewport {
        Viewport { display: DisplayRect::new(0.0, 0.0, 400.0, 400.0), buffer_width: 400, buffer_height: 400 }
    }

    #[test]
    fn test_hit_test_box() {
        let text = hi_text();
        assert!(text_hit_test(&text, 40.0, Point::new(95.0, 100.0)));
        assert!(text_hit_test(&text, 40.0, Point::new(80.0, 120.0)));
        assert!(!text_hit_test(&text, 40.0, Point::new(200.0, 100.0)));
        assert!(!text_hit_test(&text, 40.0, Point::new(100.0, 121.0)));
    }

    #[test]
    fn test_crop_drag_builds_rect_in_buffer_space() {
        let mut ctl = InteractionController::new();
        ctl.set_tool(Tool::Crop);
        // display is half the buffer size, so every display pixel is two buffer pixels
        let vp = Viewport { display: DisplayRect::new(10.0, 10.0, 100.0, 50.0), buffer_width: 200, buffer_height: 100 };
        let text = TextOverlay::default();
        ctl.handle(PointerEvent::Down(Point::new(60.0, 35.0)), &vp, &text, &FixedWidth(0.0));
        let out = ctl.handle(PointerEvent::Move(Point::new(20.0, 15.0)), &vp, &text, &FixedWidth(0.0));
        let expected = CropRect { x: 20.0, y: 10.0, width: 80.0, height: 40.0 };
        assert_eq!(out, InteractionOutcome::CropChanged(expected));
        ctl.handle(PointerEvent::Up, &vp, &text, &FixedWidth(0.0));
        assert_eq!(ctl.mode(), Interaction::Idle);
        assert_eq!(ctl.crop(), Some(expected));
    }

    #[test]
    fn test_text_drag_keeps_grab_offset() {
        let mut ctl = InteractionController::new();
        let text = hi_text();
        let m = FixedWidth(40.0);
        let vp = one_to_one();
        ctl.handle(PointerEvent::Down(Point::new(95.0, 105.0)), &vp, &text, &m);
        assert!(matches!(ctl.mode(), Interaction::DraggingText { .. }));
        let out = ctl.handle(PointerEvent::Move(Point::new(195.0, 205.0)), &vp, &text, &m);
        assert_eq!(out, InteractionOutcome::TextMoved(Point::new(200.0, 200.0)));
        assert_eq!(ctl.handle(PointerEvent::Leave, &vp, &text, &m), InteractionOutcome::TextReleased);
        assert_eq!(ctl.mode(), Interaction::Idle);
    }

    #[test]
    fn test_hidden_text_is_not_draggable() {
        let mut ctl = InteractionController::new();
        let text = TextOverlay { visible: false, ..hi_text() };
        ctl.handle(PointerEvent::Down(Point::new(100.0, 100.0)), &one_to_one(), &text, &FixedWidth(40.0));
        assert_eq!(ctl.mode(), Interaction::Idle);
    }

    #[test]
    fn test_crop_tool_never_drags_text() {
        let mut ctl = InteractionController::new();
        ctl.set_tool(Tool::Crop);
        ctl.handle(PointerEvent::Down(Point::new(100.0, 100.0)), &one_to_one(), &hi_text(), &FixedWidth(40.0));
        assert!(matches!(ctl.mode(), Interaction::Cropping { .. }));
    }

    #[test]
    fn test_tool_switch_discards_crop() {
        let mut ctl = InteractionController::new();
        ctl.set_tool(Tool::Crop);
        let vp = one_to_one();
        let text = TextOverlay::default();
        ctl.handle(PointerEvent::Down(Point::new(1.0, 1.0)), &vp, &text, &FixedWidth(0.0));
        ctl.handle(PointerEvent::Move(Point::new(9.0, 9.0)), &vp, &text, &FixedWidth(0.0));
        ctl.set_tool(Tool::Adjust);
        assert_eq!(ctl.mode(), Interaction::Idle);
        assert_eq!(ctl.crop(), None);
    }
}
