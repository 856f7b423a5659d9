/// A view event delivered by the host between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    /// Page scroll offset: the body's bounding-rect top, negative when
    /// scrolled down.
    Scroll(f32),
    /// New viewport size in pixels.
    Resize { width: u32, height: u32 },
}
