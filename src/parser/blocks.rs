use serde::Serialize;

pub const INPUT_LABEL: &str = "Input:";
pub const ARTICLE_LABEL: &str = "Артикул:";
pub const AMOUNT_LABEL: &str = "Сумма:";

/// One application extracted from a block, before it gets a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedApplication {
    pub input: String,
    pub article: String,
    pub amount: u64,
}

/// Split a message into blocks and extract every complete application.
///
/// Blocks missing any of the three fields are skipped without error.
pub fn parse_blocks(text: &str) -> Vec<ParsedApplication> {
    split_blocks(text.trim())
        .into_iter()
        .filter_map(parse_block)
        .collect()
}

/// Break before every line that starts with `Input:`. The newline itself is dropped.
fn split_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices('\n') {
        if text[idx + 1..].starts_with(INPUT_LABEL) {
            blocks.push(&text[start..idx]);
            start = idx + 1;
        }
    }
    blocks.push(&text[start..]);
    blocks
}

fn parse_block(block: &str) -> Option<ParsedApplication> {
    let input = find_field(block, INPUT_LABEL, rest_of_line)?;
    let article = find_field(block, ARTICLE_LABEL, non_space_run)?;
    let amount = find_field(block, AMOUNT_LABEL, digit_run)?;
    // A run of digits can still overflow u64; such a block is dropped.
    let amount = amount.parse::<u64>().ok()?;
    Some(ParsedApplication {
        input: input.trim().to_string(),
        article: article.trim().to_string(),
        amount,
    })
}

/// Try every occurrence of `label` in order, returning the first value `value` accepts.
fn find_field<'a>(
    block: &'a str,
    label: &str,
    value: fn(&'a str) -> Option<&'a str>,
) -> Option<&'a str> {
    block
        .match_indices(label)
        .find_map(|(idx, _)| value(&block[idx + label.len()..]))
}

/// Leading whitespace (newlines included) is skipped, then the rest of that line is taken.
fn rest_of_line(rest: &str) -> Option<&str> {
    let value = rest.trim_start();
    let line = value.split('\n').next().unwrap_or_default();
    if !line.is_empty() {
        return Some(line);
    }
    // Only whitespace until the end of the block: a blank value still counts,
    // unless everything skipped was newlines.
    let skipped = &rest[..rest.len() - value.len()];
    skipped.chars().any(|c| c != '\n').then_some("")
}

fn non_space_run(rest: &str) -> Option<&str> {
    let value = rest.trim_start();
    let end = value.find(char::is_whitespace).unwrap_or(value.len());
    (end > 0).then(|| &value[..end])
}

/// ASCII `0-9` only; fullwidth or other script digits end the run.
fn digit_run(rest: &str) -> Option<&str> {
    let value = rest.trim_start();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    (end > 0).then(|| &value[..end])
}

// ── Tests ──
