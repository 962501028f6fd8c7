// src/matching/json_block.rs
//! Locate the first balanced `{...}` block in free text (models like to wrap JSON in prose).

/// Returns the first balanced object block, honoring string literals and escapes.
/// Braces inside strings do not count toward nesting.
///
/// Single pass: open-brace offsets are kept on a stack, and the block with the
/// earliest start that closes wins. Linear in the input length.
pub fn first_json_object(text: &str) -> Option<&str> {
    let mut opens: Vec<usize> = Vec::new();
    let mut best: Option<(usize, usize)> = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in text.as_bytes().iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            // quotes before the first `{` are prose
            b'"' if !opens.is_empty() => in_string = true,
            b'{' => opens.push(i),
            b'}' => {
                let Some(start) = opens.pop() else { continue };
                if opens.is_empty() {
                    // outermost block: nothing still open can start earlier
                    return Some(&text[start..=i]);
                }
                if best.map_or(true, |(s, _)| start < s) {
                    best = Some((start, i));
                }
            }
            _ => {}
        }
    }
    best.map(|(start, end)| &text[start..=end])
}
