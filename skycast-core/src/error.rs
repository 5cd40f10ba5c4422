use thiserror::Error;

/// Everything that can go wrong between building a client and printing a report.
///
/// Only [`WeatherError::InvalidConfiguration`], [`WeatherError::InvalidInput`] and
/// [`WeatherError::Io`] ever reach callers. The network-side variants are logged
/// and turned into `None` by [`crate::WeatherClient`].
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("resource not found: {url}")]
    NotFound { url: String },

    #[error("upstream still failing with status {status} after {attempts} attempts")]
    TransientUpstreamFailure { status: u16, attempts: u32 },

    #[error("request failed: {0}")]
    RequestFailure(#[from] reqwest_middleware::Error),

    #[error("request failed with status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::RequestFailure(reqwest_middleware::Error::Reqwest(err))
    }
}

impl WeatherError {
    /// True for outcomes the client reports as absence instead of raising.
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            WeatherError::NotFound { .. }
                | WeatherError::TransientUpstreamFailure { .. }
                | WeatherError::RequestFailure(_)
                | WeatherError::UnexpectedStatus { .. }
                | WeatherError::Decode(_)
        )
    }
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_variants_are_absence() {
        let not_found = WeatherError::NotFound { url: "http://x/weather".into() };
        let transient = WeatherError::TransientUpstreamFailure { status: 503, attempts: 5 };
        let status = WeatherError::UnexpectedStatus { status: 401, body: "nope".into() };

        assert!(not_found.is_absence());
        assert!(transient.is_absence());
        assert!(status.is_absence());
    }

    #[test]
    fn configuration_and_input_errors_propagate() {
        assert!(!WeatherError::InvalidConfiguration("x".into()).is_absence());
        assert!(!WeatherError::InvalidInput("x".into()).is_absence());
    }

    #[test]
    fn transient_failure_message_mentions_attempts() {
        let err = WeatherError::TransientUpstreamFailure { status: 500, attempts: 5 };
        assert_eq!(err.to_string(), "upstream still failing with status 500 after 5 attempts");
    }
}
