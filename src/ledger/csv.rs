//! Minimal CSV handling for single-column ledgers.
//!
//! Quoting follows RFC 4180: a field containing a comma, quote, CR or LF is
//! wrapped in quotes with inner quotes doubled.

/// Encode one single-field row, including the trailing newline.
pub fn encode_row(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"\n", field.replace('"', "\"\""))
    } else {
        format!("{}\n", field)
    }
}

/// First field of every row in `content`. Empty rows yield empty strings.
pub fn first_fields(content: &str) -> Vec<String> {
    let mut rows = Vec::new();
    let mut chars = content.chars().peekable();

    while chars.peek().is_some() {
        let mut field = String::new();
        let mut in_first = true;

        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        break;
                    }
                } else {
                    field.push(c);
                }
            }
        }

        // Rest of the row: unquoted text of the first field, then other fields.
        for c in chars.by_ref() {
            match c {
                '\n' => break,
                '\r' => {}
                ',' => in_first = false,
                _ if in_first => field.push(c),
                _ => {}
            }
        }

        rows.push(field);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain_and_quoted() {
        assert_eq!(encode_row("clip.mp4"), "clip.mp4\n");
        assert_eq!(encode_row("a,b.mp4"), "\"a,b.mp4\"\n");
        assert_eq!(encode_row("say \"hi\".mp4"), "\"say \"\"hi\"\".mp4\"\n");
    }

    #[test]
    fn test_first_fields() {
        let content = "plain.mp4\n\"a,b.mp4\"\n\"say \"\"hi\"\".mp4\"\r\nextra.mp4,2024-01-01\n\nlast.mp4";
        assert_eq!(
            first_fields(content),
            vec![
                "plain.mp4",
                "a,b.mp4",
                "say \"hi\".mp4",
                "extra.mp4",
                "",
                "last.mp4"
            ]
        );
    }

    #[test]
    fn test_quoted_newline_stays_in_field() {
        let encoded = encode_row("two\nlines.mp4");
        assert_eq!(first_fields(&encoded), vec!["two\nlines.mp4"]);
    }
}
