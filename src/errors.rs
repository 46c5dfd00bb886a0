/// Failure modes of a chat call.
///
/// The `Display` output is the human-readable text placed in the `error` field of
/// the response. Boundary errors are rejected before the relay runs and are
/// answered with 400; everything else is reported in-band with a 200.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Invalid request format")]
    MalformedRequest(String),

    #[error("Message is required")]
    EmptyMessage,

    #[error("The upstream API credential is not configured")]
    MissingCredential,

    #[error("Failed to prepare the upstream request")]
    Encoding(String),

    #[error("Unable to reach the AI service")]
    UpstreamUnreachable(String),

    #[error("AI service error (status: {status})")]
    UpstreamError { status: u16, body: String },

    #[error("Failed to process the AI service response")]
    ResponseDecode(String),
}

impl ChatError {
    /// Whether this error is surfaced through the HTTP status rather than in-band.
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::MalformedRequest(_) | Self::EmptyMessage)
    }

    /// Stable name of the error kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "malformed_request",
            Self::EmptyMessage => "empty_message",
            Self::MissingCredential => "missing_credential",
            Self::Encoding(_) => "encoding_error",
            Self::UpstreamUnreachable(_) => "upstream_unreachable",
            Self::UpstreamError { .. } => "upstream_error",
            Self::ResponseDecode(_) => "response_decode_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_request_shape_errors_are_boundary_errors() {
        assert!(ChatError::MalformedRequest("eof".into()).is_boundary());
        assert!(ChatError::EmptyMessage.is_boundary());

        assert!(!ChatError::MissingCredential.is_boundary());
        assert!(!ChatError::Encoding("bad header".into()).is_boundary());
        assert!(!ChatError::UpstreamUnreachable("refused".into()).is_boundary());
        assert!(
            !ChatError::UpstreamError {
                status: 503,
                body: String::new()
            }
            .is_boundary()
        );
        assert!(!ChatError::ResponseDecode("eof".into()).is_boundary());
    }

    #[test]
    fn upstream_error_message_embeds_status() {
        let err = ChatError::UpstreamError {
            status: 429,
            body: "slow down".into(),
        };
        assert_eq!(err.to_string(), "AI service error (status: 429)");
        assert_eq!(err.kind(), "upstream_error");
    }
}
