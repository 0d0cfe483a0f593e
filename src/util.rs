/// The SDKs signal the last page with an absent token; an empty one means the same.
pub fn continuation_token(token: Option<String>) -> Option<String> {
    token.filter(|token| !token.is_empty())
}

pub fn format_ids<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = ids.into_iter().collect::<Vec<_>>().join(", ");
    format!("[{}]", joined)
}

#[cfg(test)]
pub use self::test_utils::*;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuation_token() {
        assert_eq!(continuation_token(None), None);
        assert_eq!(continuation_token(Some(String::new())), None);
        assert_eq!(
            continuation_token(Some("abc".to_string())),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_format_ids() {
        assert_eq!(format_ids(Vec::<&str>::new()), "[]");
        assert_eq!(format_ids(vec!["i-1", "i-2"]), "[i-1, i-2]");
    }
}
