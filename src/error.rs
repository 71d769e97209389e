use thiserror::Error;

/// Errors raised by the imperative widget API.
///
/// Only configuration and usage mistakes surface as errors. Malformed date
/// input never does: an empty selection is a valid state, so bad ISO strings
/// degrade to "no selection" instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    /// A selector matched no element, or the passed target is not a DOM element.
    #[error("target not found: {0}")]
    TargetNotFound(String),
    /// A control call was made for a host element without a mounted instance.
    #[error("target is not mounted")]
    NotMounted,
    /// There is no browser document to render into.
    #[error("browser document is not available")]
    DocumentUnavailable,
}
