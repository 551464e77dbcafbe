//! Comparison split boundary
//!
//! The position is a percentage of the video content rectangle's width, the same box
//! each canvas is sized to, so the `inset()` clip, the handle and the drag track share
//! one reference. Programmatic updates clamp to
//! `[0, 100]`; interactive drags clamp to `[DRAG_MIN, DRAG_MAX]` so both sides always
//! stay partially visible. A drag is bound to the pointer that started it, mirroring
//! pointer capture: moves from other pointers are ignored, moves outside the handle
//! are not.

use std::fmt;

use crate::layout::BoxSize;

pub const DRAG_MIN: f64 = 5.0;
pub const DRAG_MAX: f64 = 95.0;

/// CSS `inset()` clip rectangle, all values in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipInset {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl fmt::Display for ClipInset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn part(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
            if value == 0.0 { f.write_str("0") } else { write!(f, "{value}%") }
        }
        f.write_str("inset(")?;
        part(f, self.top)?;
        f.write_str(" ")?;
        part(f, self.right)?;
        f.write_str(" ")?;
        part(f, self.bottom)?;
        f.write_str(" ")?;
        part(f, self.left)?;
        f.write_str(")")
    }
}

/// Horizontal extent of the video content in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Track {
    pub left: f64,
    pub width: f64,
}

impl Track {
    /// Track over `content`, whose coordinates are relative to a box starting at
    /// client x `origin_x`
    pub fn over(content: BoxSize, origin_x: f64) -> Self {
        Self {
            left: origin_x + content.x,
            width: content.width,
        }
    }
}

/// X of the split line in the coordinates of `content`
pub fn split_x(content: BoxSize, position: f64) -> f64 {
    content.x + content.width * position / 100.0
}

#[derive(Debug, Clone)]
pub struct Divider {
    position: f64,
    captured: Option<(i32, Track)>,
}

impl Divider {
    pub fn new(position: f64) -> Self {
        let mut divider = Self { position: 50.0, captured: None };
        divider.set_position(position);
        divider
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Sets the position programmatically, clamped to `[0, 100]`
    pub fn set_position(&mut self, position: f64) -> f64 {
        if !position.is_nan() {
            self.position = position.clamp(0.0, 100.0);
        }
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.captured.is_some()
    }

    /// Captures `pointer_id` and moves the divider under it
    pub fn begin_drag(&mut self, pointer_id: i32, client_x: f64, track: Track) -> f64 {
        self.captured = Some((pointer_id, track));
        self.drag_to(client_x, track);
        self.position
    }

    /// Returns the new position, or `None` when `pointer_id` holds no capture
    pub fn drag(&mut self, pointer_id: i32, client_x: f64) -> Option<f64> {
        let (captured_id, track) = self.captured?;
        if captured_id != pointer_id {
            return None;
        }
        self.drag_to(client_x, track);
        Some(self.position)
    }

    /// Releases the capture; returns `false` if `pointer_id` did not hold it
    pub fn end_drag(&mut self, pointer_id: i32) -> bool {
        match self.captured {
            Some((captured_id, _)) if captured_id == pointer_id => {
                self.captured = None;
                true
            }
            _ => false,
        }
    }

    fn drag_to(&mut self, client_x: f64, track: Track) {
        if track.width <= 0.0 || client_x.is_nan() {
            return;
        }
        let percent = (client_x - track.left) / track.width * 100.0;
        self.position = percent.clamp(DRAG_MIN, DRAG_MAX);
    }

    /// Clip rectangles for the left and right canvases
    pub fn clip_insets(&self) -> (ClipInset, ClipInset) {
        let left = ClipInset {
            top: 0.0,
            right: 100.0 - self.position,
            bottom: 0.0,
            left: 0.0,
        };
        let right = ClipInset {
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
            left: self.position,
        };
        (left, right)
    }
}

impl Default for Divider {
    fn default() -> Self {
        Self::new(50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: Track = Track { left: 100.0, width: 1000.0 };

    #[test]
    fn programmatic_clamp() {
        let mut divider = Divider::default();
        assert_eq!(divider.set_position(-10.0), 0.0);
        assert_eq!(divider.set_position(150.0), 100.0);
        assert_eq!(divider.set_position(f64::NAN), 100.0);
        assert_eq!(Divider::new(250.0).position(), 100.0);
    }

    #[test]
    fn drag_clamps_to_visible_range() {
        let mut divider = Divider::default();
        assert_eq!(divider.begin_drag(1, 0.0, TRACK), DRAG_MIN);
        for x in [-500.0, 100.0, 350.0, 600.0, 1100.0, 5000.0] {
            let position = divider.drag(1, x).unwrap();
            assert!((DRAG_MIN..=DRAG_MAX).contains(&position), "{position}");
        }
        assert_eq!(divider.drag(1, 350.0), Some(25.0));
        assert!(divider.end_drag(1));
        assert!(!divider.is_dragging());
    }

    #[test]
    fn capture_belongs_to_one_pointer() {
        let mut divider = Divider::default();
        divider.begin_drag(7, 600.0, TRACK);
        assert_eq!(divider.drag(8, 200.0), None);
        assert!(!divider.end_drag(8));
        assert_eq!(divider.position(), 50.0);
        assert!(divider.end_drag(7));
        assert_eq!(divider.drag(7, 200.0), None);
    }

    #[test]
    fn clip_insets_split_at_position() {
        let mut divider = Divider::default();
        divider.set_position(30.0);
        let (left, right) = divider.clip_insets();
        assert_eq!(left.to_string(), "inset(0 70% 0 0)");
        assert_eq!(right.to_string(), "inset(0 0 0 30%)");
    }

    #[test]
    fn handle_and_drag_follow_the_letterboxed_content() {
        use crate::layout::{ObjectFit, content_rect};

        // 4:3 video pillarboxed in a 1600x900 box placed at client x 40
        let content = content_rect(BoxSize::new(0.0, 0.0, 1600.0, 900.0), 1200, 900, ObjectFit::Contain);
        assert_eq!(content, BoxSize::new(200.0, 0.0, 1200.0, 900.0));

        let x = split_x(content, 25.0);
        assert_eq!(x, 500.0);

        let mut divider = Divider::default();
        assert_eq!(divider.begin_drag(1, 40.0 + x, Track::over(content, 40.0)), 25.0);
        let (left, _) = divider.clip_insets();
        assert_eq!(content.x + content.width * (100.0 - left.right) / 100.0, x);
    }
}
