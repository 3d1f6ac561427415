//! Cross-context messages.

use serde::{Deserialize, Serialize};

/// Wire format shared by producer and consumer contexts:
/// `{"type":"CROPPED_IMAGE","dataUrl":"data:image/png;base64,..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayMessage {
    CroppedImage {
        #[serde(rename = "dataUrl")]
        data_url: String,
    },
    /// Ask the producer to (re)bind images on the current page.
    EnableCrop,
}

impl RelayMessage {
    pub fn cropped_image(data_url: impl Into<String>) -> Self {
        Self::CroppedImage {
            data_url: data_url.into(),
        }
    }
}
