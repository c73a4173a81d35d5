use std::fmt;

use super::NntpCommand;

/// Authenticate via `AUTHINFO` as specified in [RFC 4643](https://tools.ietf.org/html/rfc4643)
///
/// # Limitations
///
/// * SASL is not implemented
#[derive(Clone)]
pub enum AuthInfo {
    User(String),
    Pass(String),
}

impl fmt::Display for AuthInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthInfo::User(username) => write!(f, "AUTHINFO USER {}", username),
            AuthInfo::Pass(password) => write!(f, "AUTHINFO PASS {}", password),
        }
    }
}

// the password must not leak into debug logs
impl fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthInfo::User(username) => f.debug_tuple("User").field(username).finish(),
            AuthInfo::Pass(_) => f.debug_tuple("Pass").field(&"********").finish(),
        }
    }
}

impl NntpCommand for AuthInfo {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        assert_eq!(
            AuthInfo::User("reader".to_string()).to_string(),
            "AUTHINFO USER reader"
        );
        assert_eq!(
            AuthInfo::Pass("hunter2".to_string()).to_string(),
            "AUTHINFO PASS hunter2"
        );
    }

    #[test]
    fn debug_masks_password() {
        let debugged = format!("{:?}", AuthInfo::Pass("hunter2".to_string()));
        assert!(!debugged.contains("hunter2"));
    }
}
