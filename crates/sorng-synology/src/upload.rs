//! Upload form builder for `SYNO.FileStation.Upload`.
//!
//! The form is plain data until it reaches the transport, where
//! [`UploadForm::to_multipart`] turns it into a `reqwest` multipart body.

use crate::error::{SynologyError, SynologyResult};
use crate::types::*;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};

/// Name of the multipart part holding the file content.
pub const FILE_FIELD: &str = "file";

/// The file part of an upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub content: Bytes,
}

/// Text fields in dispatch order followed by exactly one file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    fields: Vec<(String, String)>,
    file: FilePart,
}

impl UploadForm {
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Value of a text field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn file(&self) -> &FilePart {
        &self.file
    }

    /// Destination folder, for logging.
    pub fn path(&self) -> &str {
        self.field("path").unwrap_or_default()
    }

    /// Build the `reqwest` multipart body. Cheap to call again for a retry:
    /// the payload is reference-counted.
    pub fn to_multipart(&self) -> SynologyResult<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        let length = self.file.content.len() as u64;
        let part = Part::stream_with_length(self.file.content.clone(), length)
            .file_name(self.file.filename.clone())
            .mime_str("application/octet-stream")
            .map_err(|e| SynologyError::invalid_request(format!("Invalid MIME type: {}", e)))?;
        Ok(form.part(self.file.field.clone(), part))
    }
}

/// Assemble the upload form: `api`, `version`, `method`, `path`,
/// `create_parents`, `overwrite`, then the `file` part.
pub fn build_upload_form(request: UploadRequest) -> SynologyResult<UploadForm> {
    if request.filename.trim().is_empty() {
        return Err(SynologyError::invalid_request("File name must not be empty"));
    }
    if request.path.trim().is_empty() {
        return Err(SynologyError::invalid_request(
            "Destination path must not be empty",
        ));
    }

    let fields = vec![
        ("api".to_string(), UPLOAD_API.to_string()),
        ("version".to_string(), UPLOAD_VERSION.to_string()),
        ("method".to_string(), "upload".to_string()),
        ("path".to_string(), request.path),
        ("create_parents".to_string(), request.create_parents.to_string()),
        ("overwrite".to_string(), request.overwrite.to_string()),
    ];

    Ok(UploadForm {
        fields,
        file: FilePart {
            field: FILE_FIELD.to_string(),
            filename: request.filename,
            content: Bytes::from(request.payload.into_bytes()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynologyErrorKind;

    #[test]
    fn empty_text_file_round_trip() {
        let request = UploadRequest::new("/home/docs", "a.txt", "")
            .with_create_parents(true)
            .with_overwrite(false);
        let form = build_upload_form(request).unwrap();

        assert_eq!(form.field("api"), Some("SYNO.FileStation.Upload"));
        assert_eq!(form.field("version"), Some("2"));
        assert_eq!(form.field("method"), Some("upload"));
        assert_eq!(form.field("path"), Some("/home/docs"));
        assert_eq!(form.field("create_parents"), Some("true"));
        assert_eq!(form.field("overwrite"), Some("false"));
        assert_eq!(form.file().field, "file");
        assert_eq!(form.file().filename, "a.txt");
        assert!(form.file().content.is_empty());
    }

    #[test]
    fn field_order_is_stable() {
        let form = build_upload_form(UploadRequest::new("/x", "f.bin", vec![1u8, 2, 3])).unwrap();
        let names: Vec<&str> = form.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            ["api", "version", "method", "path", "create_parents", "overwrite"]
        );
    }

    #[test]
    fn binary_payload_is_untouched() {
        let bytes = vec![0u8, 159, 146, 150, 255];
        let form = build_upload_form(UploadRequest::new("/x", "blob.bin", bytes.clone())).unwrap();
        assert_eq!(form.file().content.as_ref(), bytes.as_slice());
    }

    #[test]
    fn text_payload_is_utf8_encoded() {
        let form = build_upload_form(UploadRequest::new("/x", "note.txt", "Grüße")).unwrap();
        assert_eq!(form.file().content.as_ref(), "Grüße".as_bytes());
    }

    #[test]
    fn empty_filename_rejected() {
        let err = build_upload_form(UploadRequest::new("/x", "", "data")).unwrap_err();
        assert_eq!(err.kind, SynologyErrorKind::InvalidRequest);
        let err = build_upload_form(UploadRequest::new("/x", "   ", "data")).unwrap_err();
        assert_eq!(err.kind, SynologyErrorKind::InvalidRequest);
    }

    #[test]
    fn empty_path_rejected() {
        let err = build_upload_form(UploadRequest::new("", "a.txt", "data")).unwrap_err();
        assert_eq!(err.kind, SynologyErrorKind::InvalidRequest);
    }

    #[test]
    fn multipart_conversion_succeeds_for_empty_payload() {
        let form = build_upload_form(UploadRequest::new("/x", "a.txt", "")).unwrap();
        let multipart = form.to_multipart().unwrap();
        assert!(!multipart.boundary().is_empty());
    }
}
