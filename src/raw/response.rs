use crate::types::response_code::ResponseCode;

/// The first line of an NNTP response
///
/// Multi-line payloads are not read here; the caller decides, based on the
/// code, whether a data block follows and drains it separately. The stored
/// text has the CRLF terminator stripped.
#[derive(Clone, Debug)]
pub struct StatusLine {
    pub(crate) code: ResponseCode,
    pub(crate) line: String,
}

impl StatusLine {
    /// The response code
    pub fn code(&self) -> ResponseCode {
        self.code
    }

    /// The full first line, including the code
    pub fn line(&self) -> &str {
        &self.line
    }

    /// The first line without the three-digit code
    pub fn text(&self) -> &str {
        self.line.get(4..).unwrap_or("")
    }

    /// True for a 2xx code
    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line)
    }
}
