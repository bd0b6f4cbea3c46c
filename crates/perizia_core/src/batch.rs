use bytes::Bytes;
use engine_logging::engine_debug;

pub const PDF_MIME: &str = "application/pdf";

/// One file offered for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub byte_size: u64,
    pub mime_type: String,
    pub content: Bytes,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Bytes) -> Self {
        Self {
            name: name.into(),
            byte_size: content.len() as u64,
            mime_type: mime_type.into(),
            content,
        }
    }

    pub fn pdf(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self::new(name, PDF_MIME, content.into())
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME
    }

    /// Size rounded to the nearest kilobyte, as shown in file lists.
    pub fn size_kb(&self) -> u64 {
        (self.byte_size + 512) / 1024
    }
}

/// Ordered set of PDFs waiting to be submitted.
///
/// Only PDF descriptors ever enter the batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadBatch {
    files: Vec<FileDescriptor>,
}

impl UploadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the PDF files among `offered` and returns how many were rejected.
    pub fn add(&mut self, offered: impl IntoIterator<Item = FileDescriptor>) -> usize {
        let mut rejected = 0;
        for file in offered {
            if file.is_pdf() {
                self.files.push(file);
            } else {
                engine_debug!(
                    "Rejected non-PDF file name={} mime={}",
                    file.name,
                    file.mime_type
                );
                rejected += 1;
            }
        }
        rejected
    }

    pub fn remove(&mut self, index: usize) -> Option<FileDescriptor> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.byte_size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{FileDescriptor, UploadBatch};
    use bytes::Bytes;

    #[test]
    fn non_pdf_files_never_enter_the_batch() {
        let mut batch = UploadBatch::new();
        let rejected = batch.add(vec![
            FileDescriptor::pdf("avviso.pdf", Bytes::from_static(b"%PDF-1.7")),
            FileDescriptor::new("foto.jpg", "image/jpeg", Bytes::from_static(b"\xff\xd8")),
            FileDescriptor::pdf("perizia.pdf", Bytes::from_static(b"%PDF-1.4")),
        ]);

        assert_eq!(rejected, 1);
        let names: Vec<_> = batch.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["avviso.pdf", "perizia.pdf"]);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut batch = UploadBatch::new();
        batch.add(vec![FileDescriptor::pdf("a.pdf", Bytes::from_static(b"x"))]);

        assert!(batch.remove(3).is_none());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.remove(0).map(|f| f.name), Some("a.pdf".to_string()));
        assert!(batch.is_empty());
    }

    #[test]
    fn size_is_rounded_to_kilobytes() {
        let file = FileDescriptor::pdf("a.pdf", vec![0u8; 1536]);
        assert_eq!(file.size_kb(), 2);
        let small = FileDescriptor::pdf("b.pdf", vec![0u8; 100]);
        assert_eq!(small.size_kb(), 0);
    }
}
