use std::convert::TryFrom;
use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Response codes with a known meaning in the ingest command subset
///
/// Sourced from [RFC 3977](https://tools.ietf.org/html/rfc3977),
/// [RFC 4642](https://tools.ietf.org/html/rfc4642) (STARTTLS), and
/// [RFC 4643](https://tools.ietf.org/html/rfc4643) (AUTHINFO).
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum Kind {
    PostingAllowed = 200,
    PostingNotPermitted = 201,
    ConnectionClosing = 205,
    GroupSelected = 211,
    HeadFollows = 221,
    OverviewFollows = 224,
    AuthenticationAccepted = 281,
    PasswordRequired = 381,
    ContinueWithTls = 382,
    NoSuchNewsgroup = 411,
    NoArticleWithNumber = 423,
    NoArticleWithId = 430,
    AuthenticationRequired = 480,
    AuthenticationRejected = 481,
    CommandNotRecognized = 500,
    CommandUnavailable = 502,
}

/// A three-digit NNTP response code
///
/// Codes the library does not model are preserved as [`Unknown`](Self::Unknown);
/// classification only depends on the leading digit, so unknown codes are
/// still routed correctly.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResponseCode {
    Known(Kind),
    Unknown(u16),
}

impl ResponseCode {
    /// The numeric code
    pub fn as_u16(self) -> u16 {
        match self {
            ResponseCode::Known(kind) => kind.into(),
            ResponseCode::Unknown(code) => code,
        }
    }

    /// 2xx: the command succeeded
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    /// 3xx: the command so far is correct, send the rest
    ///
    /// In the ingest subset this only occurs between `AUTHINFO USER` and
    /// `AUTHINFO PASS`.
    pub fn is_continuation(self) -> bool {
        (300..400).contains(&self.as_u16())
    }

    /// 4xx/5xx: the command failed or was rejected
    pub fn is_failure(self) -> bool {
        self.as_u16() >= 400
    }
}

impl From<u16> for ResponseCode {
    fn from(code: u16) -> Self {
        Kind::try_from(code)
            .map(ResponseCode::Known)
            .unwrap_or(ResponseCode::Unknown(code))
    }
}

impl From<Kind> for ResponseCode {
    fn from(kind: Kind) -> Self {
        ResponseCode::Known(kind)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_round_trip() {
        assert_eq!(ResponseCode::from(211), ResponseCode::Known(Kind::GroupSelected));
        assert_eq!(ResponseCode::from(211).as_u16(), 211);
        assert_eq!(ResponseCode::from(382), ResponseCode::Known(Kind::ContinueWithTls));
    }

    #[test]
    fn unknown_codes_are_preserved() {
        assert_eq!(ResponseCode::from(299), ResponseCode::Unknown(299));
        assert_eq!(ResponseCode::from(299).as_u16(), 299);
    }

    #[test]
    fn classification() {
        assert!(ResponseCode::from(224).is_success());
        assert!(ResponseCode::from(381).is_continuation());
        assert!(ResponseCode::from(430).is_failure());
        assert!(ResponseCode::from(502).is_failure());
        assert!(!ResponseCode::from(211).is_failure());
    }
}
