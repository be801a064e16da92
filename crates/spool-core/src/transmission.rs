//! The unit of telemetry held by the spool.

/// One batch of telemetry as it would go over the wire.
///
/// Immutable once built. The payload is opaque to the spool; the content type
/// and encoding are the HTTP headers it will be sent with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transmission {
    content: Vec<u8>,
    content_type: String,
    content_encoding: String,
}

impl Transmission {
    pub fn new(
        content: Vec<u8>,
        content_type: impl Into<String>,
        content_encoding: impl Into<String>,
    ) -> Self {
        Transmission {
            content,
            content_type: content_type.into(),
            content_encoding: content_encoding.into(),
        }
    }

    /// A transmission with no content metadata.
    pub fn from_bytes(content: Vec<u8>) -> Self {
        Transmission {
            content,
            ..Default::default()
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content_encoding(&self) -> &str {
        &self.content_encoding
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}
