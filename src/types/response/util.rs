use std::str::FromStr;

use crate::error::{Error, Result};

/// Parse a whitespace-delimited field from the first line of a response
///
/// 1. The provided field name is used in the error message if parsing fails
/// 2. This advances the provided iterator
pub(crate) fn parse_field<'a, T: FromStr>(
    iter: &mut impl Iterator<Item = &'a str>,
    name: impl AsRef<str>,
) -> Result<T> {
    let name = name.as_ref();
    iter.next()
        .ok_or_else(|| Error::missing_field(name))
        .and_then(|s| s.parse().map_err(|_| Error::parse_error(name)))
}
