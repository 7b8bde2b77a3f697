/// Quotes a value for a CSV-format `COPY`, doubling embedded quotes.
pub fn escape_csv_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');

    for ch in s.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }

    out.push('"');
    out
}
