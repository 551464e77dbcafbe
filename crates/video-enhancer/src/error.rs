pub type EnhancerResult<T> = Result<T, EnhancerError>;

#[derive(thiserror::Error, Debug)]
pub enum EnhancerError {
    #[error("gpu unsupported: {0}")]
    Unsupported(String),

    #[error("device request failed: {0}")]
    DeviceRequest(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("surface lost")]
    SurfaceLost,

    #[error("device lost: {0}")]
    DeviceLost(String),

    #[error("texture destroyed")]
    TextureDestroyed,

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("canvas error: {0}")]
    Canvas(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] upscale_kernels::KernelError),

    #[error("gpu rejected {0}")]
    ResourceCreation(String),
}

impl EnhancerError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn device_request(msg: impl Into<String>) -> Self {
        Self::DeviceRequest(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn canvas(msg: impl Into<String>) -> Self {
        Self::Canvas(msg.into())
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform(msg.into())
    }

    /// Whether this error is an expected race with teardown
    ///
    /// Such errors are absorbed by the render tick without notifying anyone.
    pub fn is_teardown_race(&self) -> bool {
        match self {
            Self::DeviceLost(_) | Self::SurfaceLost | Self::TextureDestroyed => true,
            Self::Unsupported(_) | Self::UnknownOption(_) | Self::Config(_) | Self::Pipeline(_) | Self::ResourceCreation(_) => false,
            Self::DeviceRequest(msg) | Self::Surface(msg) | Self::Canvas(msg) | Self::Platform(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("destroyed") || msg.contains("lost")
            }
        }
    }

    /// Whether the selected option can never render with the current device
    ///
    /// The render tick turns enhancement off on such errors.
    pub fn disables_option(&self) -> bool {
        matches!(self, Self::Pipeline(_) | Self::ResourceCreation(_))
    }
}

impl From<serde_json::Error> for EnhancerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
