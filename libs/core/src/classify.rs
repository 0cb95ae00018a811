use crate::types::AttachmentKind;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "gif", "png", "bmp", "tiff"];
const AUDIO_EXTENSIONS: &[&str] = &["wav", "ogg", "mp3", "wma", "aiff", "3gp"];
const VIDEO_EXTENSIONS: &[&str] = &[
    "webm", "flv", "ogv", "gifv", "avi", "mov", "qt", "wmv", "mpg", "mpeg", "mp4",
];

/// Infers the attachment kind from the file extension of a URL.
///
/// Total and case-insensitive: anything without a recognized extension falls
/// back to [`AttachmentKind::File`].
///
/// ```
/// use chatwire_core::{classify, AttachmentKind};
///
/// assert_eq!(classify("http://cdn.example.com/a.JPG"), AttachmentKind::Image);
/// assert_eq!(classify("clip.mp4"), AttachmentKind::Video);
/// assert_eq!(classify("notes"), AttachmentKind::File);
/// ```
pub fn classify(url: &str) -> AttachmentKind {
    let extension = url
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let extension = extension.as_str();
    if IMAGE_EXTENSIONS.contains(&extension) {
        AttachmentKind::Image
    } else if AUDIO_EXTENSIONS.contains(&extension) {
        AttachmentKind::Audio
    } else if VIDEO_EXTENSIONS.contains(&extension) {
        AttachmentKind::Video
    } else {
        AttachmentKind::File
    }
}
