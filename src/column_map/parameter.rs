use log::debug;

pub const PARAMETER_MARKER: char = '@';

/// A literal text-substitution parameter for the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    /// The token searched for in the query text, always marker-prefixed.
    ///
    /// Parameter binders differ on whether they keep the leading `@`, so both
    /// `@year` and `year` produce the token `@year`.
    pub fn token(&self) -> String {
        let bare = self
            .name
            .strip_prefix(PARAMETER_MARKER)
            .unwrap_or(&self.name);
        format!("{}{}", PARAMETER_MARKER, bare)
    }
}

/// Replaces every parameter token in `query` with the parameter's value.
///
/// Every literal occurrence is replaced, ignoring ASCII case, so `@Year`
/// also rewrites the start of `&[@Year0101]`.
pub fn substitute(query: &str, parameters: &[Parameter]) -> String {
    parameters.iter().fold(query.to_string(), |text, parameter| {
        let token = parameter.token();
        if token.len() == PARAMETER_MARKER.len_utf8() {
            return text;
        }
        let replaced = replace_token(&text, &token, &parameter.value);
        if replaced != text {
            debug!("Substituted parameter {} in query", token);
        }
        replaced
    })
}

fn replace_token(text: &str, token: &str, value: &str) -> String {
    let haystack = text.to_ascii_lowercase();
    let needle = token.to_ascii_lowercase();

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    while let Some(found) = haystack[last..].find(&needle) {
        let start = last + found;
        out.push_str(&text[last..start]);
        out.push_str(value);
        last = start + needle.len();
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn param(name: &str, value: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[rstest]
    #[case::with_marker(
        "SELECT [Measures].[X] ON 0 FROM [Cube] WHERE @Year",
        "@Year",
        "[Date].[Year].&[2012]",
        "SELECT [Measures].[X] ON 0 FROM [Cube] WHERE [Date].[Year].&[2012]"
    )]
    #[case::without_marker(
        "SELECT @measure ON 0 FROM [Cube]",
        "measure",
        "[Measures].[X]",
        "SELECT [Measures].[X] ON 0 FROM [Cube]"
    )]
    #[case::case_insensitive(
        "WHERE @YEAR AND @year",
        "@Year",
        "2012",
        "WHERE 2012 AND 2012"
    )]
    #[case::inside_longer_token(
        "WHERE [Date].[Date].&[@Year0101] AND @YearEnd",
        "@Year",
        "2012",
        "WHERE [Date].[Date].&[20120101] AND 2012End"
    )]
    #[case::absent("SELECT 1", "@Year", "2012", "SELECT 1")]
    fn test_substitute(
        #[case] query: &str,
        #[case] name: &str,
        #[case] value: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(substitute(query, &[param(name, value)]), expected);
    }

    #[test]
    fn test_substitute_multiple_parameters() {
        let query = "WHERE (@From : @To)";
        let result = substitute(query, &[param("From", "1"), param("@to", "9")]);
        assert_eq!(result, "WHERE (1 : 9)");
    }

    #[test]
    fn test_empty_parameter_name_is_ignored() {
        assert_eq!(substitute("a @ b", &[param("@", "x")]), "a @ b");
    }
}
