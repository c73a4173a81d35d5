/// The header fields the archiver extracts from a `HEAD` response
///
/// Everything outside the known set is ignored. Note that per
/// [RFC 5536](https://tools.ietf.org/html/rfc5536) header values may be
/// folded over several lines; folded continuations are unfolded here with a
/// single joining space.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HeaderFields {
    pub subject: String,
    pub from: String,
    pub date: String,
    pub message_id: String,
    pub references: String,
    pub bytes: u32,
    pub lines: u32,
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum Field {
    Subject,
    From,
    Date,
    MessageId,
    References,
    Bytes,
    Lines,
}

impl Field {
    fn for_name(name: &str) -> Option<Field> {
        // header names are case-insensitive per RFC 3977
        if name.eq_ignore_ascii_case("subject") {
            Some(Field::Subject)
        } else if name.eq_ignore_ascii_case("from") {
            Some(Field::From)
        } else if name.eq_ignore_ascii_case("date") {
            Some(Field::Date)
        } else if name.eq_ignore_ascii_case("message-id") {
            Some(Field::MessageId)
        } else if name.eq_ignore_ascii_case("references") {
            Some(Field::References)
        } else if name.eq_ignore_ascii_case("bytes") {
            Some(Field::Bytes)
        } else if name.eq_ignore_ascii_case("lines") {
            Some(Field::Lines)
        } else {
            None
        }
    }
}

/// Staged values; Bytes/Lines stay textual until the end so that folded
/// numeric headers degrade to 0 instead of panicking or truncating
#[derive(Default)]
struct Staged {
    subject: String,
    from: String,
    date: String,
    message_id: String,
    references: String,
    bytes: String,
    lines: String,
}

impl Staged {
    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Subject => &mut self.subject,
            Field::From => &mut self.from,
            Field::Date => &mut self.date,
            Field::MessageId => &mut self.message_id,
            Field::References => &mut self.references,
            Field::Bytes => &mut self.bytes,
            Field::Lines => &mut self.lines,
        }
    }
}

impl HeaderFields {
    /// Extract the known fields from the logical lines of a header block
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> HeaderFields {
        let mut staged = Staged::default();
        // the field the previous line assigned to, for unfolding
        let mut current: Option<Field> = None;

        for line in lines {
            let raw = line.as_ref();

            if raw.starts_with(' ') || raw.starts_with('\t') {
                // folded continuation of the previous header (ignored when
                // the previous header was not one we track)
                if let Some(field) = current {
                    let slot = staged.slot(field);
                    if !slot.is_empty() {
                        slot.push(' ');
                    }
                    slot.push_str(raw.trim());
                }
                continue;
            }

            let trimmed = raw.trim_start();
            current = match trimmed.find(':') {
                Some(colon) => {
                    let (name, rest) = trimmed.split_at(colon);
                    match Field::for_name(name) {
                        Some(field) => {
                            let value = &rest[1..];
                            let value = value.strip_prefix(' ').unwrap_or(value);
                            *staged.slot(field) = value.to_string();
                            Some(field)
                        }
                        None => None,
                    }
                }
                None => None,
            };
        }

        HeaderFields {
            subject: staged.subject,
            from: staged.from,
            date: staged.date,
            message_id: staged.message_id,
            references: staged.references,
            bytes: staged.bytes.trim().parse().unwrap_or(0),
            lines: staged.lines.trim().parse().unwrap_or(0),
        }
    }
}
