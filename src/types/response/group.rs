use std::convert::TryFrom;

use crate::error::{Error, Result};
use crate::raw::response::StatusLine;
use crate::types::response::util::parse_field;
use crate::types::ArticleNumber;

/// Newsgroup metadata returned by [`GROUP`](https://tools.ietf.org/html/rfc3977#section-6.1.1)
///
/// The reply line reads `211 <count> <low> <high> <name>`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Group {
    /// The _estimated_ number of articles in the group
    pub count: ArticleNumber,
    /// The lowest reported article number
    pub low: ArticleNumber,
    /// The highest reported article number
    pub high: ArticleNumber,
    /// The name of the group
    pub name: String,
}

impl TryFrom<&StatusLine> for Group {
    type Error = Error;

    fn try_from(resp: &StatusLine) -> Result<Self> {
        let mut iter = resp.line().split_whitespace();

        // pop the response code
        iter.next()
            .ok_or_else(|| Error::missing_field("response code"))?;

        let count = parse_field(&mut iter, "count")?;
        let low = parse_field(&mut iter, "low")?;
        let high = parse_field(&mut iter, "high")?;
        let name = parse_field(&mut iter, "name")?;
        Ok(Self {
            count,
            low,
            high,
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::response_code::ResponseCode;

    fn status(line: &str) -> StatusLine {
        StatusLine {
            code: ResponseCode::from(211),
            line: line.to_string(),
        }
    }

    #[test]
    fn happy_path() {
        let group = Group::try_from(&status("211 1234 3000234 3002322 misc.test")).unwrap();
        assert_eq!(
            group,
            Group {
                count: 1234,
                low: 3000234,
                high: 3002322,
                name: "misc.test".to_string(),
            }
        );
    }

    #[test]
    fn empty_group() {
        let group = Group::try_from(&status("211 0 0 0 misc.test")).unwrap();
        assert_eq!(group.count, 0);
        assert_eq!(group.low, 0);
        assert_eq!(group.high, 0);
    }

    #[test]
    fn malformed_line_is_rejected() {
        assert!(Group::try_from(&status("211 not-a-number 1 2 misc.test")).is_err());
        assert!(Group::try_from(&status("211 12")).is_err());
    }
}
