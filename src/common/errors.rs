use thiserror::Error;

/// Construction-time failures. No partial resampler is ever produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("conversion ratio must be a positive finite number, got {0}")]
    InvalidRatio(f64),

    #[error("unknown quality selector '{0}' (expected b, l, m or custom)")]
    UnknownQuality(String),

    #[error("custom quality selected but no filter table was supplied")]
    MissingCustomTable,

    #[error("invalid filter table: {0}")]
    InvalidTable(String),

    #[error("filter wing reaches {reach} frames but the overlap only covers {xoff}")]
    WingReach { reach: usize, xoff: usize },
}

/// Per-call failures of `Resampler::process`. State is left untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("input block of {frames} frames is shorter than the {required} frames required")]
    BlockTooShort { frames: usize, required: usize },

    #[error("input holds {samples} samples, which is not a whole number of stereo frames")]
    PartialFrame { samples: usize },
}

/// Unified resampler errors.
#[derive(Error, Debug)]
pub enum ResampleError {
    #[error("Config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to allocate an overlap buffer of {samples} samples")]
    Allocation { samples: usize },
}

/// WAV container errors.
#[derive(Error, Debug)]
pub enum WavError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing RIFF/WAVE signature")]
    NotRiff,
}

/// Failures while streaming a file through the resampler.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("WAV: {0}")]
    Wav(#[from] WavError),

    #[error("Precondition: {0}")]
    Precondition(#[from] PreconditionError),
}

/// Filter-file loading errors.
#[derive(Error, Debug)]
pub enum FilterFileError {
    #[error("failed to read filter file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse filter file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("filter file {0} needs either an `imp` table or a [design] section")]
    Incomplete(String),

    #[error(transparent)]
    Table(#[from] ConfigError),
}

/// Errors surfaced by the command-line front end. All map to exit code 1.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Resample: {0}")]
    Resample(#[from] ResampleError),

    #[error("Config: {0}")]
    Config(#[from] ConfigError),

    #[error("WAV: {0}")]
    Wav(#[from] WavError),

    #[error("Filter: {0}")]
    Filter(#[from] FilterFileError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Settings: {0}")]
    Settings(String),

    #[error("Rate: {0}")]
    Rate(String),

    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
