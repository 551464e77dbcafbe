/// Pixel dimensions handed to the GPU pipelines
///
/// Always a multiple of 4 on both axes and never smaller than 4x4; the kernels rely on
/// this divisibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn floored(width: u32, height: u32) -> Self {
        Self {
            width: floor_to_4(width),
            height: floor_to_4(height),
        }
    }

    pub fn as_tuple(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn floor_to_4(value: u32) -> u32 {
    (value / 4 * 4).max(4)
}
