//! Displayed video content rectangle
//!
//! Browsers do not expose where inside its box a video actually paints, so the
//! rectangle is computed analytically from the container box, the decoded resolution
//! and the CSS `object-fit` policy. Canvases are sized and positioned to this rectangle.

/// CSS `object-fit` values that affect geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectFit {
    Contain,
    Cover,
    /// Stretch to the container; also used for any unrecognised value
    #[default]
    Fill,
}

impl ObjectFit {
    /// Parses a computed-style value, falling back to stretching
    pub fn from_css(value: &str) -> Self {
        match value.trim() {
            "contain" => ObjectFit::Contain,
            "cover" => ObjectFit::Cover,
            _ => ObjectFit::Fill,
        }
    }
}

/// A rectangle in CSS pixels, relative to the video's offset parent
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxSize {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxSize {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// A box with no area is not yet laid out
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Geometry inputs sampled from the video element
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VideoLayout {
    pub container: BoxSize,
    pub natural_width: u32,
    pub natural_height: u32,
    pub object_fit: ObjectFit,
}

impl VideoLayout {
    pub fn content_rect(&self) -> BoxSize {
        content_rect(self.container, self.natural_width, self.natural_height, self.object_fit)
    }
}

/// Computes the rectangle the video content occupies inside `container`
///
/// `contain` letterboxes (positive offsets), `cover` crops (negative offsets) and
/// anything else stretches to the container. Without a decoded resolution the
/// container itself is returned.
pub fn content_rect(container: BoxSize, natural_width: u32, natural_height: u32, object_fit: ObjectFit) -> BoxSize {
    if natural_width == 0 || natural_height == 0 || container.is_empty() {
        return container;
    }

    let video_ratio = natural_width as f64 / natural_height as f64;
    let container_ratio = container.width / container.height;
    // Wider video than container means width is the constraining axis for contain
    let video_is_wider = video_ratio > container_ratio;

    let (width, height) = match object_fit {
        ObjectFit::Fill => return container,
        ObjectFit::Contain if video_is_wider => (container.width, container.width / video_ratio),
        ObjectFit::Contain => (container.height * video_ratio, container.height),
        ObjectFit::Cover if video_is_wider => (container.height * video_ratio, container.height),
        ObjectFit::Cover => (container.width, container.width / video_ratio),
    };

    BoxSize {
        x: container.x + (container.width - width) / 2.0,
        y: container.y + (container.height - height) / 2.0,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: BoxSize = BoxSize {
        x: 0.0,
        y: 0.0,
        width: 1000.0,
        height: 1000.0,
    };

    #[test]
    fn contain_letterboxes_wide_video() {
        let rect = content_rect(CONTAINER, 1920, 1080, ObjectFit::Contain);
        assert_eq!(rect.width, 1000.0);
        assert!((rect.height - 562.5).abs() < 1e-9);
        assert_eq!(rect.x, 0.0);
        assert!((rect.y - 218.75).abs() < 1e-9);
    }

    #[test]
    fn contain_pillarboxes_tall_video() {
        let rect = content_rect(BoxSize::new(10.0, 20.0, 1600.0, 900.0), 1080, 1920, ObjectFit::Contain);
        assert_eq!(rect.height, 900.0);
        assert_eq!(rect.width, 506.25);
        assert_eq!(rect.x, 10.0 + (1600.0 - 506.25) / 2.0);
        assert_eq!(rect.y, 20.0);
    }

    #[test]
    fn cover_crops_with_negative_offsets() {
        let rect = content_rect(CONTAINER, 1920, 1080, ObjectFit::Cover);
        assert_eq!(rect.height, 1000.0);
        assert!((rect.width - 1777.777).abs() < 1e-2);
        assert!(rect.x < 0.0);
        assert_eq!(rect.y, 0.0);
    }

    #[test]
    fn fill_and_unknown_stretch() {
        assert_eq!(content_rect(CONTAINER, 1920, 1080, ObjectFit::Fill), CONTAINER);
        assert_eq!(ObjectFit::from_css("scale-down"), ObjectFit::Fill);
        assert_eq!(ObjectFit::from_css(" cover "), ObjectFit::Cover);
    }

    #[test]
    fn no_natural_size_returns_container() {
        assert_eq!(content_rect(CONTAINER, 0, 1080, ObjectFit::Contain), CONTAINER);
        assert!(BoxSize::default().is_empty());
    }
}
