//! Executable pipeline definitions
//!
//! An [`ExecutablePipeline`] is a static description of a compute shader chain:
//! which textures it allocates (and how they are sized), which samplers it needs,
//! and which passes run in which order with which bindings. Descriptions are plain
//! `const` data so that the whole kernel catalogue is embedded in the binary.

/// Physical texture id reserved for the pipeline input
pub const SOURCE_TEXTURE_ID: u32 = u32::MAX;

/// Represents a rational scale factor as a fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactor {
    /// The numerator of the scale factor fraction
    pub numerator: u32,
    /// The denominator of the scale factor fraction
    pub denominator: u32,
}

impl ScaleFactor {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self { numerator, denominator }
    }

    /// Applies the factor to a pixel length, rounding down
    pub fn apply(&self, length: u32) -> u32 {
        (length as u64 * self.numerator as u64 / self.denominator as u64) as u32
    }
}

/// How a physical texture is sized when the pipeline is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSize {
    /// Width and height scaled relative to the pipeline input
    Scaled(ScaleFactor, ScaleFactor),
    /// Exactly the target dimensions passed at bind time
    Target,
}

/// Texture sampling filter modes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SamplerFilterMode {
    /// Nearest neighbor sampling - sharp, pixelated
    #[allow(unused)]
    Nearest,
    /// Linear interpolation sampling - smooth, blurred
    Linear,
}

/// A complete pipeline description ready for binding
#[derive(Debug, Clone)]
pub struct ExecutablePipeline {
    /// Human-readable name for debugging
    pub(crate) name: &'static str,
    /// Physical textures used by this pipeline, including the source
    pub(crate) textures: &'static [PhysicalTexture],
    /// Sampler filter modes required by this pipeline
    pub(crate) samplers: &'static [SamplerFilterMode],
    /// Shader passes to execute in sequence
    pub(crate) passes: &'static [ExecutablePass],
}

impl ExecutablePipeline {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn passes(&self) -> &'static [ExecutablePass] {
        self.passes
    }

    /// Output size relative to the input, or `None` when the output is target-sized
    pub fn output_scale(&self) -> Option<(ScaleFactor, ScaleFactor)> {
        let output_id = self.passes.last()?.output_textures.first()?.physical_texture_id;
        match self.textures.iter().find(|t| t.id == output_id)?.size {
            TextureSize::Scaled(x, y) => Some((x, y)),
            TextureSize::Target => None,
        }
    }
}

/// Represents a physical texture resource in the GPU
#[derive(Debug, Clone)]
pub struct PhysicalTexture {
    /// Unique identifier for this texture
    pub id: u32,
    /// Sizing rule
    pub size: TextureSize,
    /// Whether this texture represents the source input
    pub is_source: bool,
}

/// A single shader pass within a pipeline
#[derive(Debug, Clone)]
pub struct ExecutablePass {
    /// Human-readable name for debugging
    pub name: &'static str,
    /// WGSL shader source code
    pub shader: &'static str,
    /// Named `f32` constants prepended to the shader source
    pub defines: &'static [(&'static str, f32)],
    /// Input texture bindings for this pass
    pub input_textures: &'static [InputTextureBinding],
    /// Output texture bindings for this pass
    pub output_textures: &'static [OutputTextureBinding],
    /// Sampler bindings for this pass
    pub samplers: &'static [SamplerBinding],
}

impl ExecutablePass {
    /// Returns the shader source with the pass defines prepended
    pub fn shader_source(&self) -> String {
        let mut source = String::new();
        for (name, value) in self.defines {
            source.push_str(&format!("const {name}: f32 = {value:?};\n"));
        }
        source.push_str(self.shader);
        source
    }
}

/// Binding information for an input texture
#[derive(Debug, Clone)]
pub struct InputTextureBinding {
    /// Shader binding point index
    pub binding: u32,
    /// ID of the physical texture to bind
    pub physical_texture_id: u32,
}

/// Binding information for an output texture
#[derive(Debug, Clone)]
pub struct OutputTextureBinding {
    /// Shader binding point index
    pub binding: u32,
    /// ID of the physical texture to bind
    pub physical_texture_id: u32,
}

/// Binding information for a texture sampler
#[derive(Debug, Clone)]
pub struct SamplerBinding {
    /// Shader binding point index
    pub binding: u32,
    /// Filter mode for this sampler
    pub filter_mode: SamplerFilterMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_factor_rounds_down() {
        assert_eq!(ScaleFactor::new(2, 1).apply(640), 1280);
        assert_eq!(ScaleFactor::new(3, 1).apply(333), 999);
        assert_eq!(ScaleFactor::new(1, 2).apply(5), 2);
    }

    #[test]
    fn defines_are_prepended_as_float_constants() {
        let pass = ExecutablePass {
            name: "test",
            shader: "fn f() -> f32 { return STRENGTH; }",
            defines: &[("STRENGTH", 1.0), ("SIGMA", 0.25)],
            input_textures: &[],
            output_textures: &[],
            samplers: &[],
        };

        let source = pass.shader_source();
        assert!(source.starts_with("const STRENGTH: f32 = 1.0;\nconst SIGMA: f32 = 0.25;\n"));
        assert!(source.ends_with(pass.shader));
    }
}
