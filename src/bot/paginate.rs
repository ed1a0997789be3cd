//! Numbered, size bounded text blocks.

/// Split a numbered listing into blocks of at most `limit` characters.
///
/// The header opens the first block. Numbering starts at 1 and runs across
/// blocks. A line is never split: when it would overflow the running block,
/// that block is flushed first. A single line longer than `limit` is cut and
/// ends in `…` so no block can exceed the limit.
///
/// An empty `lines` yields just the header (or nothing for an empty header).
pub fn paginate(header: &str, lines: &[String], limit: usize) -> Vec<String> {
    let limit = limit.max(2);
    let header = truncate_chars(header, limit - 1);
    if lines.is_empty() {
        return if header.is_empty() { Vec::new() } else { vec![header] };
    }

    let mut blocks = Vec::new();
    let mut current = if header.is_empty() { String::new() } else { format!("{header}\n") };
    let mut current_len = current.chars().count();

    for (idx, line) in lines.iter().enumerate() {
        let numbered = format!("{}\n", truncate_chars(&format!("{}. {}", idx + 1, line), limit - 1));
        let numbered_len = numbered.chars().count();
        if current_len + numbered_len > limit && current_len > 0 {
            blocks.push(current.trim_end().to_string());
            current = String::new();
            current_len = 0;
        }
        current.push_str(&numbered);
        current_len += numbered_len;
    }

    if !current.trim().is_empty() {
        blocks.push(current.trim_end().to_string());
    }
    blocks
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("🖼️ picture_{i:03}.jpg")).collect()
    }

    #[test]
    fn empty_listing_is_header_only() {
        assert_eq!(paginate("📂 Pictures/", &[], 100), vec!["📂 Pictures/".to_string()]);
        assert!(paginate("", &[], 100).is_empty());
    }

    #[test]
    fn small_listing_fits_one_block() {
        let blocks = paginate("hdr", &["a".into(), "b".into()], 100);
        assert_eq!(blocks, vec!["hdr\n1. a\n2. b".to_string()]);
    }

    #[test]
    fn blocks_respect_limit_and_keep_global_numbering() {
        let input = lines(200);
        for limit in [40, 64, 333, 3500] {
            let blocks = paginate("🔍 header", &input, limit);
            assert!(blocks.iter().all(|b| b.chars().count() <= limit), "limit {limit}");

            let numbered: Vec<&str> = blocks
                .iter()
                .flat_map(|b| b.lines())
                .filter(|l| l.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false))
                .collect();
            assert_eq!(numbered.len(), input.len());
            for (i, (got, want)) in numbered.iter().zip(&input).enumerate() {
                assert_eq!(*got, format!("{}. {}", i + 1, want));
            }
        }
    }

    #[test]
    fn oversize_line_is_cut_not_split() {
        let long = vec!["x".repeat(50), "short".to_string()];
        let blocks = paginate("h", &long, 20);
        assert!(blocks.iter().all(|b| b.chars().count() <= 20));
        assert_eq!(blocks[0], "h");
        assert!(blocks[1].starts_with("1. xxx") && blocks[1].ends_with('…'));
        assert_eq!(blocks.last().map(String::as_str), Some("2. short"));
    }
}
