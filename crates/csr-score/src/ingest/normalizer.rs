/// Strip byte-order marks and collapse inner whitespace in a header cell.
pub(crate) fn clean_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
pub(crate) fn clean_for_tests(value: &str) -> String {
    clean_header(value)
}
