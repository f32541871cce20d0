//! User-Agent string sent with transfer requests.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/media-transfer";

/// Default User-Agent for transfer requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_transfer_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("media-transfer/{version} (+{PROJECT_UA_URL})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_identifies_tool_and_version() {
        let ua = default_transfer_user_agent();
        assert!(ua.starts_with("media-transfer/"), "got: {ua}");
        assert!(ua.contains(env!("CARGO_PKG_VERSION")));
        assert!(ua.contains(PROJECT_UA_URL));
    }
}
