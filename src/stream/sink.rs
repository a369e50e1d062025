//! HTTP-response style output sinks

use indexmap::IndexMap;
use std::io::{self, Write};

/// Content type set on response sinks
pub const CONTENT_TYPE: &str = "application/octet-stream;charset=utf-8";

/// Header carrying the download file name
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";

/// A response-like destination: headers plus a byte body
///
/// Implement this for the response type of whatever HTTP stack serves the
/// download.
pub trait ResponseSink {
    /// Discard headers and body buffered so far
    fn reset(&mut self);

    /// Set the content type
    fn set_content_type(&mut self, content_type: &str);

    /// Set a header, replacing any previous value
    fn set_header(&mut self, name: &str, value: &str);

    /// Body stream
    fn body(&mut self) -> &mut dyn Write;
}

/// `Content-Disposition` value for a download named `file_name`
///
/// # Examples
///
/// ```
/// use record_export::stream::content_disposition;
///
/// assert_eq!(
///     content_disposition("Q3 report.xlsx"),
///     "attachment; filename=Q3%20report.xlsx"
/// );
/// ```
pub fn content_disposition(file_name: &str) -> String {
    format!("attachment; filename={}", urlencoding::encode(file_name))
}

/// In-memory [`ResponseSink`]
#[derive(Debug, Clone, Default)]
pub struct BufferedResponse {
    content_type: Option<String>,
    headers: IndexMap<String, String>,
    body: Vec<u8>,
}

impl BufferedResponse {
    /// Create an empty response
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type, if set
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Headers in the order they were set
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Body bytes
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Consume into the body bytes
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

impl ResponseSink for BufferedResponse {
    fn reset(&mut self) {
        self.content_type = None;
        self.headers.clear();
        self.body.clear();
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = Some(content_type.to_string());
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    fn body(&mut self) -> &mut dyn Write {
        &mut self.body
    }
}

impl Write for BufferedResponse {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
