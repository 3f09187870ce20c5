use crate::utils::error::ArgumentError;
use std::ffi::OsString;

/// Joins command-line tokens into the location to look up.
///
/// Single and double quotes are removed from every token and never group
/// tokens: `"Alcazar" 'del' Rey` and `'Alcazar del Rey'` both become
/// `Alcazar del Rey`. A `None` token stands for an entry that could not be read.
pub fn location_from_tokens<S: AsRef<str>>(
    tokens: Option<&[Option<S>]>,
) -> Result<String, ArgumentError> {
    let tokens = tokens.ok_or(ArgumentError::MissingInput)?;
    if tokens.is_empty() {
        return Err(ArgumentError::EmptyInput);
    }

    let stripped = tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            token
                .as_ref()
                .map(|t| strip_quotes(t.as_ref()))
                .ok_or(ArgumentError::MissingEntry { index })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(stripped.join(" "))
}

/// Raw process arguments; any token that is not valid unicode is a missing entry.
pub fn location_from_os_args(args: &[OsString]) -> Result<String, ArgumentError> {
    let tokens: Vec<Option<&str>> = args.iter().map(|arg| arg.to_str()).collect();
    location_from_tokens(Some(tokens.as_slice()))
}

fn strip_quotes(token: &str) -> String {
    token.chars().filter(|c| !matches!(c, '\'' | '"')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(tokens: &[&str]) -> Result<String, ArgumentError> {
        let tokens: Vec<Option<&str>> = tokens.iter().copied().map(Some).collect();
        location_from_tokens(Some(tokens.as_slice()))
    }

    #[test]
    fn test_missing_input() {
        assert_eq!(
            location_from_tokens::<&str>(None),
            Err(ArgumentError::MissingInput)
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(location(&[]), Err(ArgumentError::EmptyInput));
    }

    #[test]
    fn test_missing_entry() {
        let tokens = [Some("not missing"), None];
        assert_eq!(
            location_from_tokens(Some(tokens.as_slice())),
            Err(ArgumentError::MissingEntry { index: 1 })
        );
    }

    #[test]
    fn test_single_word() {
        assert_eq!(location(&["Berlin"]).unwrap(), "Berlin");
        assert_eq!(location(&["'Berlin'"]).unwrap(), "Berlin");
        assert_eq!(location(&["\"Berlin\""]).unwrap(), "Berlin");
    }

    #[test]
    fn test_multi_word_in_quotes() {
        assert_eq!(location(&["'Alcazar del Rey'"]).unwrap(), "Alcazar del Rey");
        assert_eq!(location(&["\"Alcazar del Rey\""]).unwrap(), "Alcazar del Rey");
    }

    #[test]
    fn test_multi_word_partially_quoted() {
        assert_eq!(
            location(&["\"Alcazar\"", "'del'", "Rey"]).unwrap(),
            "Alcazar del Rey"
        );
        assert_eq!(location(&["Alcazar", "del", "Rey"]).unwrap(), "Alcazar del Rey");
    }

    #[test]
    fn test_empty_token_is_kept() {
        assert_eq!(location(&["''"]).unwrap(), "");
        assert_eq!(location(&["a", "", "b"]).unwrap(), "a  b");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_os_arg_is_missing_entry() {
        use std::os::unix::ffi::OsStringExt;

        let args = vec![OsString::from("Berlin"), OsString::from_vec(vec![0xff, 0xfe])];
        assert_eq!(
            location_from_os_args(&args),
            Err(ArgumentError::MissingEntry { index: 1 })
        );
    }
}
