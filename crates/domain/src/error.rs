use thiserror::Error;

/// Remote Content Service 的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("failed to list comments: {0}")]
    Fetch(String),

    #[error("mutation failed: {0}")]
    Mutation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response format: {0}")]
    MalformedResponse(String),

    #[error("backend returned no usable text")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("render failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("render failed: no text generator configured for the generate strategy")]
    NoGenerator,

    #[error("render failed: generated text contains the ignore flag '{0}'")]
    GeneratedIgnoreFlag(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("delete_after ({delete_after}m) must not be shorter than expire_after ({expire_after}m)")]
    DeleteBeforeExpire { expire_after: i64, delete_after: i64 },

    #[error("{0} must not be negative")]
    NegativeDuration(&'static str),

    #[error("{0} is too large")]
    DurationOutOfRange(&'static str),

    #[error("comment_limit must be a positive integer")]
    ZeroLimit,

    #[error("watermark must not be empty")]
    EmptyWatermark,

    #[error("watermark '{watermark}' contains the ignore flag '{ignore_flag}'; obfuscated comments would never be deleted")]
    WatermarkContainsIgnoreFlag {
        watermark: String,
        ignore_flag: String,
    },

    #[error("replacement text contains the ignore flag '{0}'; obfuscated comments would never be deleted")]
    ReplacementContainsIgnoreFlag(String),

    #[error("prompt template must contain the {{comment}} placeholder")]
    MissingPromptPlaceholder,

    #[error("invalid strategy '{0}'. Must be 'delete', 'update', 'emoji' or 'generate'")]
    UnknownStrategy(String),
}
