//! Backend reply normalization
//!
//! Firewall utilities answer in the console's native code page and in the
//! system language. Everything that depends on either lives here: replies are
//! decoded and lowercased once, and callers only ask questions of the
//! resulting [`NormalizedReply`].

use encoding_rs::GBK;
use std::path::Path;

use super::backend::RawReply;

/// "No rule matches" in English and Simplified Chinese netsh output.
pub const NO_MATCH_PHRASES: [&str; 2] = ["no rules match", "没有与指定标准相匹配的规则"];

pub trait OutputNormalizer {
    fn normalize(&self, reply: &RawReply) -> NormalizedReply;
}

/// Decodes UTF-8, falling back to GBK for legacy Chinese consoles.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNormalizer;

impl ConsoleNormalizer {
    fn decode(bytes: &[u8]) -> String {
        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => GBK.decode(bytes).0.into_owned(),
        }
    }
}

impl OutputNormalizer for ConsoleNormalizer {
    fn normalize(&self, reply: &RawReply) -> NormalizedReply {
        NormalizedReply::new(reply.success, &Self::decode(&reply.output))
    }
}

/// A backend reply with its text decoded and lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedReply {
    pub success: bool,
    no_match: bool,
    text: String,
}

impl NormalizedReply {
    /// Build a reply from already-decoded text.
    pub fn new(success: bool, text: &str) -> Self {
        let text = text.to_lowercase();
        let no_match = NO_MATCH_PHRASES.iter().any(|p| text.contains(p));
        Self {
            success,
            no_match,
            text,
        }
    }

    /// The backend said no rule matched the query.
    pub fn no_rule_matches(&self) -> bool {
        self.no_match
    }

    /// The reply text mentions `path`, ignoring case.
    pub fn mentions(&self, path: &Path) -> bool {
        self.text.contains(&path.to_string_lossy().to_lowercase())
    }

    pub fn text(&self) -> &str {
        self.text.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(success: bool, output: &[u8]) -> RawReply {
        RawReply {
            success,
            output: output.to_vec(),
        }
    }

    #[test]
    fn test_english_no_match() {
        let reply = ConsoleNormalizer
            .normalize(&raw(false, b"\r\nNo rules match the specified criteria.\r\n"));
        assert!(reply.no_rule_matches());
        assert!(!reply.success);
        assert_eq!(reply.text(), "no rules match the specified criteria.");
    }

    #[test]
    fn test_gbk_chinese_no_match() {
        let (encoded, _, _) = GBK.encode("\r\n没有与指定标准相匹配的规则。\r\n");
        assert!(std::str::from_utf8(&encoded).is_err());

        let reply = ConsoleNormalizer.normalize(&raw(false, &encoded));
        assert!(reply.no_rule_matches());
    }

    #[test]
    fn test_utf8_chinese_no_match() {
        let reply = ConsoleNormalizer
            .normalize(&raw(true, "没有与指定标准相匹配的规则。".as_bytes()));
        assert!(reply.no_rule_matches());
        assert!(reply.success);
    }

    #[test]
    fn test_mentions_path_ignores_case() {
        let reply = NormalizedReply::new(
            true,
            "Rule Name: BlockProgram_app_1234abcd\nProgram: C:\\Program Files\\App\\APP.exe\n",
        );
        assert!(!reply.no_rule_matches());
        assert!(reply.mentions(Path::new("c:\\program files\\app\\app.EXE")));
        assert!(!reply.mentions(Path::new("c:\\other\\app.exe")));
    }

    #[test]
    fn test_unrelated_failure_is_not_no_match() {
        let reply = NormalizedReply::new(false, "The requested operation requires elevation.");
        assert!(!reply.no_rule_matches());
        assert!(!reply.success);
    }
}
