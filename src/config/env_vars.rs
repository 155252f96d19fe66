/// Expand Unix-style environment variables (`$VAR` and `${VAR}`) in a path.
///
/// Unset `${VAR}` references expand to nothing; unset `$VAR` references are
/// left as written so a literal `$` in a filename survives.
pub fn expand_env_vars(path: &str) -> String {
    expand_with(path, |name| std::env::var(name).ok())
}

/// Same as [`expand_env_vars`] with a caller-supplied lookup.
pub fn expand_with<F>(path: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        // ${VAR}
        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                let var_name = &braced[..end];
                result.push_str(&lookup(var_name).unwrap_or_default());
                rest = &braced[end + 1..];
                continue;
            }
            // No closing brace, keep the `$` literally
            result.push('$');
            rest = after;
            continue;
        }

        // $VAR: name runs until the first non-alphanumeric, non-underscore char
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if name_len == 0 {
            result.push('$');
            rest = after;
            continue;
        }

        let var_name = &after[..name_len];
        match lookup(var_name) {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                result.push_str(var_name);
            }
        }
        rest = &after[name_len..];
    }

    result.push_str(rest);
    result
}
