use std::io;

#[derive(Debug)]
pub enum Error {
    DuplicateSnapshot {
        file: String,
        first: String,
        second: String,
    },
    EmptyFrames {
        case: String,
    },
    EmptySuite,
    FramesNotIncreasing {
        case: String,
        index: usize,
        previous: u32,
        current: u32,
    },
    Io(io::Error),
    Json(serde_json::Error),
    ZeroStep {
        case: String,
    },
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSnapshot {
                file,
                first,
                second,
            } => write!(
                f,
                "cases '{first}' and '{second}' would both write snapshot {file}"
            ),
            Self::EmptyFrames { case } => write!(f, "case '{case}' requests no screenshots"),
            Self::EmptySuite => write!(f, "test suite has no cases"),
            Self::FramesNotIncreasing {
                case,
                index,
                previous,
                current,
            } => write!(
                f,
                "case '{case}': frame {current} at position {index} does not follow {previous}, \
                 frames must be strictly increasing"
            ),
            Self::Io(err) => write!(f, "os error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::ZeroStep { case } => write!(f, "case '{case}': frame range step must not be 0"),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
