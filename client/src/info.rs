//! Backslash-delimited info strings (`\key\value\key\value`).

/// Iterator over the `(key, value)` pairs of an info string.
#[derive(Debug, Clone)]
pub struct InfoPairs<'a> {
    parts: std::str::Split<'a, char>,
}

impl<'a> Iterator for InfoPairs<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.parts.next()?;
        if key.is_empty() {
            return None;
        }
        let value = self.parts.next().unwrap_or("");
        Some((key, value))
    }
}

/// Returns the pairs of `info` in order.
#[must_use]
pub fn info_pairs(info: &str) -> InfoPairs<'_> {
    let body = info.strip_prefix('\\').unwrap_or(info);
    InfoPairs {
        parts: body.split('\\'),
    }
}

/// Returns the value stored under `key` (case-insensitive), or `""`.
#[must_use]
pub fn info_value<'a>(info: &'a str, key: &str) -> &'a str {
    info_pairs(info)
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
        .map_or("", |(_, value)| value)
}

/// Parses a leading decimal integer the way the server writes them; junk reads as zero.
#[must_use]
pub fn info_int(info: &str, key: &str) -> i32 {
    let value = info_value(info, key).trim();
    let digits = value
        .char_indices()
        .take_while(|(index, c)| c.is_ascii_digit() || (*index == 0 && (*c == '-' || *c == '+')))
        .map(|(index, c)| index + c.len_utf8())
        .last()
        .unwrap_or(0);
    value[..digits].parse().unwrap_or(0)
}
