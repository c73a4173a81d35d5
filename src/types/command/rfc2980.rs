use std::fmt;

use crate::types::prelude::{ArticleNumber, NntpCommand};

/// Get overview data for one or more articles
///
/// Servers predating RFC 3977's `OVER` near-universally support this
/// extension, which is why the ingester speaks it rather than `OVER`.
#[derive(Copy, Clone, Debug)]
pub enum XOver {
    /// A range of messages
    Range {
        /// The low number of the article range
        low: ArticleNumber,
        /// The high number of the article range
        high: ArticleNumber,
    },
    /// The current message
    Current,
}

impl fmt::Display for XOver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XOver::Range { low, high } => write!(f, "XOVER {}-{}", low, high),
            XOver::Current => write!(f, "XOVER"),
        }
    }
}

impl NntpCommand for XOver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        assert_eq!(XOver::Range { low: 1, high: 3 }.to_string(), "XOVER 1-3");
        assert_eq!(XOver::Current.to_string(), "XOVER");
    }
}
