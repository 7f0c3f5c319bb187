pub mod imf_view;
pub mod mime_view;
pub mod sanitize;
pub mod view;

pub use imf_view::Envelope;
pub use mime_view::{Attachment, AttachmentInfo, Body, MimeView};
pub use sanitize::sanitize_html;
pub use view::{MessageView, ThreadView};

#[cfg(test)]
pub(crate) mod fixtures;
