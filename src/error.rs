#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Matrix is not invertible (determinant is zero or not finite)")]
    SingularMatrix,
    #[error("Curve needs {expected} values, got {actual}")]
    CurveArity { expected: usize, actual: usize },
    #[error("Malformed path: {0}")]
    MalformedPath(String),
    #[error("Unknown path component tag: {0}")]
    UnknownComponent(u8),
    #[error("Invalid dash pattern: {0}")]
    InvalidDash(String),
    #[error("SVG parse error: {0}")]
    SvgParse(String),
    #[error("SVG path parse error: {0}")]
    PathParse(String),
}
