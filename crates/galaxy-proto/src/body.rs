//! Message body convention.
//!
//! The server stores every message body as a plain string. Attachments are
//! marked with a textual prefix followed by the attachment URI:
//!
//! ```text
//! [IMAGE]:https://cdn.example/a.png
//! [FILE]:https://cdn.example/report.pdf
//! ```
//!
//! [`MessageBody`] lifts that convention into a tagged variant so consumers
//! never test prefixes themselves.

use std::fmt;

/// Prefix marking an image attachment.
pub const IMAGE_PREFIX: &str = "[IMAGE]:";

/// Prefix marking a file attachment.
pub const FILE_PREFIX: &str = "[FILE]:";

/// A decoded message body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageBody {
    /// Plain text
    Text(String),
    /// Image attachment
    Image {
        /// Location of the image
        uri: String,
    },
    /// Generic file attachment
    File {
        /// Location of the file
        uri: String,
    },
}

impl MessageBody {
    /// Classify a raw wire body.
    ///
    /// Prefix matching is exact and case-sensitive. A prefix with nothing
    /// after it still classifies as an attachment with an empty URI.
    pub fn decode(raw: &str) -> Self {
        if let Some(uri) = raw.strip_prefix(IMAGE_PREFIX) {
            return Self::Image { uri: uri.to_string() };
        }
        if let Some(uri) = raw.strip_prefix(FILE_PREFIX) {
            return Self::File { uri: uri.to_string() };
        }
        Self::Text(raw.to_string())
    }

    /// Wire form of the body.
    pub fn encode(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Image { uri } => format!("{IMAGE_PREFIX}{uri}"),
            Self::File { uri } => format!("{FILE_PREFIX}{uri}"),
        }
    }

    /// True for image or file bodies.
    pub fn is_attachment(&self) -> bool {
        !matches!(self, Self::Text(_))
    }

    /// Short text for list previews. Attachments render as a label.
    pub fn preview(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Image { .. } => "Photo",
            Self::File { .. } => "File",
        }
    }
}

impl Default for MessageBody {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_prefix_decodes_to_image() {
        assert_eq!(MessageBody::decode("[IMAGE]:http://x/y.png"), MessageBody::Image {
            uri: "http://x/y.png".to_string()
        });
    }

    #[test]
    fn file_prefix_decodes_to_file() {
        assert_eq!(MessageBody::decode("[FILE]:http://x/doc.pdf"), MessageBody::File {
            uri: "http://x/doc.pdf".to_string()
        });
    }

    #[test]
    fn prefix_must_lead_and_match_case() {
        assert_eq!(
            MessageBody::decode("see [IMAGE]:http://x"),
            MessageBody::Text("see [IMAGE]:http://x".to_string())
        );
        assert_eq!(
            MessageBody::decode("[image]:http://x"),
            MessageBody::Text("[image]:http://x".to_string())
        );
    }

    #[test]
    fn bare_prefix_is_an_empty_attachment() {
        assert_eq!(MessageBody::decode("[FILE]:"), MessageBody::File { uri: String::new() });
    }

    #[test]
    fn preview_labels_attachments() {
        assert_eq!(MessageBody::decode("hello").preview(), "hello");
        assert_eq!(MessageBody::decode("[IMAGE]:u").preview(), "Photo");
        assert_eq!(MessageBody::decode("[FILE]:u").preview(), "File");
    }
}
