//! `${VAR}` and `${VAR:-default}` expansion for raw config text.

/// Expand placeholders from the process environment.
///
/// Unset variables without a default are left as written, so a missing
/// `GITHUB_TOKEN` shows up verbatim instead of as an empty string.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Expand placeholders using `lookup` instead of the process environment.
pub fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // Unterminated: keep the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let body = &after[..end];
        let (name, default) = match body.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (body, None),
        };

        match (name.is_empty(), lookup(name), default) {
            (false, Some(value), _) => out.push_str(&value),
            (false, None, Some(default)) => out.push_str(default),
            _ => {
                out.push_str("${");
                out.push_str(body);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "GITHUB_TOKEN" => Some("ghp_123".to_string()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn expands_known_variables() {
        assert_eq!(
            substitute_env_with("token = \"${GITHUB_TOKEN}\"", lookup),
            "token = \"ghp_123\""
        );
        assert_eq!(substitute_env_with("[${EMPTY}]", lookup), "[]");
    }

    #[test]
    fn default_used_only_when_unset() {
        assert_eq!(substitute_env_with("${PORT:-9999}", lookup), "9999");
        assert_eq!(substitute_env_with("${GITHUB_TOKEN:-x}", lookup), "ghp_123");
    }

    #[test]
    fn unknown_and_malformed_are_kept() {
        assert_eq!(substitute_env_with("${NOPE}", lookup), "${NOPE}");
        assert_eq!(substitute_env_with("${}", lookup), "${}");
        assert_eq!(substitute_env_with("a ${OPEN", lookup), "a ${OPEN");
        assert_eq!(substitute_env_with("$HOME {x}", lookup), "$HOME {x}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
