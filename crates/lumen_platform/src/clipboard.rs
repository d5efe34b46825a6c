//! Clipboard access

use std::sync::Mutex;

use rustc_hash::FxHashMap;

pub const TEXT_MIME: &str = "text/plain";

/// System clipboard holding text and typed blobs keyed by MIME type
pub trait Clipboard: Send + Sync {
    fn read(&self, mime: &str) -> Option<Vec<u8>>;

    /// Replace the clipboard contents with one typed blob
    fn write(&self, mime: &str, data: Vec<u8>);

    fn clear(&self);

    fn read_text(&self) -> Option<String> {
        self.read(TEXT_MIME)
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }

    fn write_text(&self, text: &str) {
        self.write(TEXT_MIME, text.as_bytes().to_vec());
    }
}

/// In-process clipboard
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    entries: Mutex<FxHashMap<String, Vec<u8>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for MemoryClipboard {
    fn read(&self, mime: &str) -> Option<Vec<u8>> {
        let entries = self.entries.lock().ok()?;
        entries.get(mime).cloned()
    }

    fn write(&self, mime: &str, data: Vec<u8>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
            entries.insert(mime.to_string(), data);
        }
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_blobs() {
        let clip = MemoryClipboard::new();
        assert_eq!(clip.read_text(), None);
        clip.write_text("hello");
        assert_eq!(clip.read_text().as_deref(), Some("hello"));
        clip.write("image/png", vec![1, 2, 3]);
        assert_eq!(clip.read("image/png"), Some(vec![1, 2, 3]));
        // A new write replaces every type
        assert_eq!(clip.read_text(), None);
    }
}
