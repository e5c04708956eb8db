/// Restores characters escaped by XML name encoding.
///
/// XML element names cannot contain characters such as `[` or ` `, so the
/// server writes them as `_xHHHH_` (or `_xHHHHHHHH_` outside the BMP). A
/// property element named `_x005B_Store_x005D_` decodes to `[Store]`.
/// Sequences that are not well-formed escapes are kept as-is.
pub fn decode_name(name: &str) -> String {
    if !name.contains("_x") {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match decode_escape(candidate) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &candidate[consumed..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_escape(s: &str) -> Option<(char, usize)> {
    for digits in [4, 8] {
        let end = 2 + digits;
        if s.len() > end && s.as_bytes()[end] == b'_' {
            let hex = &s[2..end];
            if hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                let code = u32::from_str_radix(hex, 16).ok()?;
                return char::from_u32(code).map(|ch| (ch, end + 1));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("Caption", "Caption")]
    #[case::brackets(
        "_x005B_Store_x005D_._x005B_Store_x005D_._x005B_Code_x005D_",
        "[Store].[Store].[Code]"
    )]
    #[case::space("Store_x0020_Name", "Store Name")]
    #[case::astral("_x0001F600_", "\u{1F600}")]
    #[case::not_hex("_xZZZZ_", "_xZZZZ_")]
    #[case::unterminated("_x005B", "_x005B")]
    #[case::trailing_marker("abc_x", "abc_x")]
    fn test_decode_name(#[case] encoded: &str, #[case] expected: &str) {
        assert_eq!(decode_name(encoded), expected);
    }
}
