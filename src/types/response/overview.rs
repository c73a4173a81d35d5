use crate::types::ArticleNumber;

/// One parsed line of `XOVER` output
///
/// The wire format is tab-separated with a fixed field order:
/// `artnum subject author date message-id references bytes lines [xref...]`.
/// Anything past the eighth field is ignored.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OverviewEntry {
    pub artnum: ArticleNumber,
    pub subject: String,
    pub author: String,
    pub date: String,
    pub message_id: String,
    pub references: String,
    pub bytes: u32,
    pub lines: u32,
}

impl OverviewEntry {
    /// Parse a single overview line
    ///
    /// Parsing never fails: missing string fields come back empty and
    /// missing or malformed integers come back as 0, which keeps one bad
    /// line from sinking a whole overview block.
    pub fn parse(line: &str) -> OverviewEntry {
        let mut fields = line.split('\t');

        OverviewEntry {
            artnum: int_field(fields.next()),
            subject: text_field(fields.next()),
            author: text_field(fields.next()),
            date: text_field(fields.next()),
            message_id: text_field(fields.next()),
            references: text_field(fields.next()),
            bytes: int_field(fields.next()),
            lines: int_field(fields.next()),
        }
    }
}

fn text_field(field: Option<&str>) -> String {
    field.unwrap_or("").to_string()
}

fn int_field(field: Option<&str>) -> u32 {
    field
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let line = "3000234\tI am just a test article\t\"Demo User\" <nobody@example.com>\t\
                    6 Oct 1998 04:38:40 -0500\t<45223423@example.com>\t<45454@example.net>\t1234\t17";
        let entry = OverviewEntry::parse(line);
        assert_eq!(entry.artnum, 3000234);
        assert_eq!(entry.subject, "I am just a test article");
        assert_eq!(entry.author, "\"Demo User\" <nobody@example.com>");
        assert_eq!(entry.date, "6 Oct 1998 04:38:40 -0500");
        assert_eq!(entry.message_id, "<45223423@example.com>");
        assert_eq!(entry.references, "<45454@example.net>");
        assert_eq!(entry.bytes, 1234);
        assert_eq!(entry.lines, 17);
    }

    #[test]
    fn trailing_xref_fields_are_ignored() {
        let entry = OverviewEntry::parse("1\ta\tb\tc\td\te\t10\t2\tXref: news misc.test:1\textra");
        assert_eq!(entry.artnum, 1);
        assert_eq!(entry.lines, 2);
    }

    #[test]
    fn missing_fields_default() {
        let entry = OverviewEntry::parse("42\tonly a subject");
        assert_eq!(entry.artnum, 42);
        assert_eq!(entry.subject, "only a subject");
        assert_eq!(entry.author, "");
        assert_eq!(entry.message_id, "");
        assert_eq!(entry.bytes, 0);
        assert_eq!(entry.lines, 0);

        let empty = OverviewEntry::parse("");
        assert_eq!(empty, OverviewEntry::default());
    }

    #[test]
    fn integers_tolerate_whitespace_and_garbage() {
        let entry = OverviewEntry::parse(" 7 \ts\ta\td\tm\tr\t 100 \tnope");
        assert_eq!(entry.artnum, 7);
        assert_eq!(entry.bytes, 100);
        assert_eq!(entry.lines, 0);
    }

    /// parse is a left-inverse of tab-joining the eight fields
    #[test]
    fn parse_inverts_join() {
        let entry = OverviewEntry {
            artnum: 9,
            subject: "Re: lunch?".to_string(),
            author: "a@b.c".to_string(),
            date: "1 Jan 2020 00:00:00 GMT".to_string(),
            message_id: "<x@y>".to_string(),
            references: "<w@z>".to_string(),
            bytes: 512,
            lines: 12,
        };
        let joined = format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            entry.artnum,
            entry.subject,
            entry.author,
            entry.date,
            entry.message_id,
            entry.references,
            entry.bytes,
            entry.lines
        );
        assert_eq!(OverviewEntry::parse(&joined), entry);
    }
}
