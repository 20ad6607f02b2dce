//! Placeholder substitution for target templates.
//!
//! `{key}` and `$key` are replaced by the value captured under `key`.
//! Substitution is a single left-to-right pass, so inserted values are never
//! scanned again. Unknown placeholders are left verbatim.

use crate::rules::ParamSet;

/// Substitute captured values into `template`.
pub fn resolve_placeholders(template: &str, params: &ParamSet) -> String {
    if params.is_empty() || !template.contains(['{', '$']) {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '$']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        let replaced = if tail.starts_with('{') {
            braced(tail, params)
        } else {
            dollar(tail, params)
        };

        match replaced {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push_str(&tail[..1]);
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// `{key}` at the start of `tail`.
fn braced<'p>(tail: &str, params: &'p ParamSet) -> Option<(&'p str, usize)> {
    let end = tail.find('}')?;
    let value = params.get(&tail[1..end])?;
    Some((value, end + 1))
}

/// `$key` at the start of `tail`, longest key first.
fn dollar<'p>(tail: &str, params: &'p ParamSet) -> Option<(&'p str, usize)> {
    let after = &tail[1..];
    params
        .iter()
        .filter(|(key, _)| !key.is_empty() && after.starts_with(key))
        .max_by_key(|(key, _)| key.len())
        .map(|(key, value)| (value, key.len() + 1))
}
