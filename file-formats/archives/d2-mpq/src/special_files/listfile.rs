//! (listfile) parsing

/// Split the contents of a `(listfile)` into archive paths
///
/// Diablo II listfiles are CRLF-separated and often padded with trailing NUL
/// bytes. Blank lines and lines starting with `;` or `#` are skipped, and any
/// `;metadata` suffix after a name is dropped. Invalid UTF-8 is replaced
/// rather than rejected.
pub fn parse_listfile(data: &[u8]) -> Vec<String> {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let data = &data[..end];

    let text = String::from_utf8_lossy(data);
    if let std::borrow::Cow::Owned(_) = text {
        log::warn!("(listfile) is not valid UTF-8, replacing invalid sequences");
    }

    let names: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with([';', '#']))
        .filter_map(|line| {
            let name = line.split(';').next().unwrap_or(line).trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect();

    log::debug!("Parsed {} names from (listfile)", names.len());
    names
}
