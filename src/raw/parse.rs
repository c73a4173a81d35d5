use nom::character::complete::one_of;
use nom::combinator::opt;
use nom::sequence::tuple;
use nom::IResult;

/// Return true if the first character is a digit
fn one_of_digit(b: &[u8]) -> IResult<&[u8], char> {
    one_of("0123456789")(b)
}

/// Takes a response code from the buffer
///
/// A valid response code is three ASCII digits where the first digit is
/// between 1 and 5.
fn take_response_code(b: &[u8]) -> IResult<&[u8], u16> {
    let res: IResult<_, (char, char, char)> =
        tuple((one_of("12345"), one_of_digit, one_of_digit))(b);
    let (rest, (hundreds, tens, ones)) = res?;

    let code = (hundreds as u16 - '0' as u16) * 100
        + (tens as u16 - '0' as u16) * 10
        + (ones as u16 - '0' as u16);

    Ok((rest, code))
}

/// Split a status line into its numeric code and trailing text
///
/// Per [RFC 3977](https://tools.ietf.org/html/rfc3977#section-3.2) the first
/// line of a response is a three-digit code, a single space, and some text.
/// The terminator is expected to have been stripped already by the line
/// reader. Returns `None` when the line does not start with a code.
pub(crate) fn parse_status_line(line: &str) -> Option<u16> {
    let res: IResult<&[u8], (u16, Option<char>)> =
        tuple((take_response_code, opt(one_of(" "))))(line.as_bytes());
    res.ok().map(|(_rest, (code, _sp))| code)
}

/// Returns true if the line terminates a multi-line data block
pub(crate) fn is_end_of_datablock(line: &str) -> bool {
    line == "."
}

/// Reverse the transparency encoding of a data block line
///
/// Lines beginning with `.` are transmitted with the dot doubled
/// ([RFC 3977 3.1.1](https://tools.ietf.org/html/rfc3977#section-3.1.1));
/// exactly one leading dot is removed here.
pub(crate) fn unstuff(line: &str) -> &str {
    if line.starts_with('.') {
        &line[1..]
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod test_parse_status_line {
        use super::*;

        #[test]
        fn happy_path() {
            let motd = "200 news.example.com InterNetNews server INN 2.5.5 ready (transit mode)";
            assert_eq!(parse_status_line(motd), Some(200));
        }

        #[test]
        fn bare_code() {
            assert_eq!(parse_status_line("205"), Some(205));
        }

        #[test]
        fn not_a_code() {
            assert_eq!(parse_status_line("news.example.com ready"), None);
            assert_eq!(parse_status_line(""), None);
            assert_eq!(parse_status_line("9xx nope"), None);
        }

        #[test]
        fn too_short() {
            assert_eq!(parse_status_line("5"), None);
            assert_eq!(parse_status_line("51"), None);
        }
    }

    mod test_unstuff {
        use super::*;

        #[test]
        fn single_leading_dot_removed() {
            assert_eq!(unstuff("..hidden"), ".hidden");
            assert_eq!(unstuff("."), "");
        }

        #[test]
        fn undotted_lines_untouched() {
            assert_eq!(unstuff("Subject: hello"), "Subject: hello");
            assert_eq!(unstuff(""), "");
        }
    }

    #[test]
    fn end_of_datablock() {
        assert!(is_end_of_datablock("."));
        assert!(!is_end_of_datablock(".."));
        assert!(!is_end_of_datablock(""));
    }
}
