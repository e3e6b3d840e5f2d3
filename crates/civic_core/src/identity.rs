use crate::error::AssemblyError;
use crate::fragment::RawFragment;
use url::Url;

/// Builds `"{namespace}/{local_key}"`.
pub fn assign_id(namespace: &str, local_key: &str) -> String {
    format!("{namespace}/{local_key}")
}

/// `meeting_id`, then `id`, then the `Id` query parameter of the source URL
/// (`MeetingInformation.aspx?Org=Cal&Id=1234`).
pub fn extract_local_key(fragment: &RawFragment, origin: &Url) -> Result<String, AssemblyError> {
    if let Some(key) = [&fragment.meeting_id, &fragment.id]
        .into_iter()
        .find_map(|raw| raw.as_deref().and_then(clean_key))
    {
        return Ok(key);
    }
    fragment
        .source
        .as_deref()
        .and_then(|source| origin.join(source.trim()).ok())
        .and_then(|url| {
            url.query_pairs()
                .find(|(name, _)| name.eq_ignore_ascii_case("id"))
                .and_then(|(_, value)| clean_key(&value))
        })
        .ok_or(AssemblyError::MissingKey)
}

fn clean_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    if key.is_empty() || key.contains('/') || key.chars().any(char::is_whitespace) {
        return None;
    }
    Some(key.to_string())
}
