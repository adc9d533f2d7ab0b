//! Built-in last-resort PDF writer.
//!
//! Renders plain text as a valid single-font PDF with no external converter:
//! US Letter pages, Helvetica 10pt, 14pt leading, greedy word wrap. Glyphs
//! outside printable ASCII become `?` since the standard font encoding stops
//! there. The output is not pretty, but every PDF reader opens it, which is
//! the whole job of a fallback.

const MAX_LINE_CHARS: usize = 95;
const LINES_PER_PAGE: usize = 48;

/// Renders `text` into complete PDF file bytes.
pub(crate) fn render(text: &str) -> Vec<u8> {
    let lines = wrap(text);
    let chunks: Vec<Vec<String>> = if lines.is_empty() {
        vec![Vec::new()]
    } else {
        lines
            .chunks(LINES_PER_PAGE)
            .map(|chunk| chunk.to_vec())
            .collect()
    };
    let page_count = chunks.len();
    let total_objects = 3 + page_count * 2;

    let mut buf: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = vec![0; total_objects + 1];
    buf.extend_from_slice(b"%PDF-1.4\n");

    let kids: Vec<String> = (0..page_count)
        .map(|k| format!("{} 0 R", 4 + 2 * k))
        .collect();

    offsets[1] = buf.len();
    buf.extend("1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".bytes());
    offsets[2] = buf.len();
    buf.extend(
        format!(
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            page_count
        )
        .bytes(),
    );
    offsets[3] = buf.len();
    buf.extend("3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n".bytes());

    for (k, chunk) in chunks.iter().enumerate() {
        let page_id = 4 + 2 * k;
        let content_id = page_id + 1;

        offsets[page_id] = buf.len();
        buf.extend(
            format!(
                "{page_id} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>\nendobj\n"
            )
            .bytes(),
        );

        let mut stream = String::from("BT\n/F1 10 Tf\n14 TL\n54 728 Td\n");
        for (i, line) in chunk.iter().enumerate() {
            if i > 0 {
                stream.push_str("T*\n");
            }
            stream.push('(');
            stream.push_str(&escape(line));
            stream.push_str(") Tj\n");
        }
        stream.push_str("ET");

        offsets[content_id] = buf.len();
        buf.extend(
            format!(
                "{content_id} 0 obj\n<< /Length {} >>\nstream\n{stream}\nendstream\nendobj\n",
                stream.len()
            )
            .bytes(),
        );
    }

    let xref_offset = buf.len();
    buf.extend(format!("xref\n0 {}\n", total_objects + 1).bytes());
    buf.extend_from_slice(b"0000000000 65535 f \n");
    for id in 1..=total_objects {
        buf.extend(format!("{:010} 00000 n \n", offsets[id]).bytes());
    }
    buf.extend(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            total_objects + 1
        )
        .bytes(),
    );
    buf
}

/// Escapes PDF string delimiters and maps non-ASCII to `?`.
fn escape(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 4);
    for c in line.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\t' => out.push(' '),
            c if c == ' ' || c.is_ascii_graphic() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap at [`MAX_LINE_CHARS`], preserving blank lines. Words
/// longer than a full line are split mid-word.
fn wrap(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let raw = raw.trim_end();
        if raw.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in raw.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > MAX_LINE_CHARS {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if word_len > MAX_LINE_CHARS {
                for c in word.chars() {
                    if current_len == MAX_LINE_CHARS {
                        lines.push(std::mem::take(&mut current));
                        current_len = 0;
                    }
                    current.push(c);
                    current_len += 1;
                }
            } else {
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current.push_str(word);
                current_len += word_len;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).to_string()
    }

    #[test]
    fn test_render_produces_wellformed_skeleton() {
        let bytes = render("Hello resume world");
        let text = as_text(&bytes);
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.contains("/Type /Catalog"));
        assert!(text.contains("(Hello resume world) Tj"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_startxref_points_at_xref_table() {
        let bytes = render("one line");
        let text = as_text(&bytes);
        let startxref: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .expect("startxref offset present");
        assert!(text[startxref..].starts_with("xref"));
    }

    #[test]
    fn test_delimiters_escaped() {
        let bytes = render(r"Acme (Contract) C:\Users\jane");
        let text = as_text(&bytes);
        assert!(text.contains(r"(Acme \(Contract\) C:\\Users\\jane) Tj"));
    }

    #[test]
    fn test_long_text_spans_pages() {
        let many_lines = "A line of resume content\n".repeat(LINES_PER_PAGE + 5);
        let text = as_text(&render(&many_lines));
        assert!(text.contains("/Count 2"));
        assert!(text.contains("6 0 R"));
    }

    #[test]
    fn test_wrap_splits_long_lines_and_words() {
        let wrapped = wrap(&format!("{} end", "word ".repeat(40)));
        assert!(wrapped.len() > 1);
        assert!(wrapped.iter().all(|l| l.chars().count() <= MAX_LINE_CHARS));

        let giant = "x".repeat(MAX_LINE_CHARS * 2 + 10);
        let wrapped = wrap(&giant);
        assert_eq!(wrapped.len(), 3);
    }

    #[test]
    fn test_non_ascii_replaced() {
        let text = as_text(&render("café • résumé"));
        assert!(text.contains("(caf? ? r?sum?) Tj"));
    }
}
