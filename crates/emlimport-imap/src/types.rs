//! Server capabilities, response status and response codes.

/// Response status from a tagged or untagged status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Parses a status keyword (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OK" => Some(Self::Ok),
            "NO" => Some(Self::No),
            "BAD" => Some(Self::Bad),
            "PREAUTH" => Some(Self::PreAuth),
            "BYE" => Some(Self::Bye),
            _ => None,
        }
    }
}

/// Server capability.
///
/// Only the capabilities the importer reacts to get their own variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051)
    Imap4Rev2,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// APPENDLIMIT (RFC 7889).
    ///
    /// `Some(n)` when the server announces one global limit, `None` when the
    /// limit is per mailbox and has to be asked for with STATUS.
    AppendLimit(Option<u32>),
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses a capability string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "LOGINDISABLED" => Self::LoginDisabled,
            "APPENDLIMIT" => Self::AppendLimit(None),
            _ if upper.starts_with("APPENDLIMIT=") => match s[12..].parse() {
                Ok(limit) => Self::AppendLimit(Some(limit)),
                Err(_) => Self::Unknown(s.to_string()),
            },
            _ if upper.starts_with("AUTH=") => Self::Auth(s[5..].to_string()),
            _ => Self::Unknown(s.to_string()),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Imap4Rev2 => write!(f, "IMAP4rev2"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::AppendLimit(None) => write!(f, "APPENDLIMIT"),
            Self::AppendLimit(Some(limit)) => write!(f, "APPENDLIMIT={limit}"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// Bracketed response code, e.g. `[CAPABILITY ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// Capability list sent along with a greeting or LOGIN completion.
    Capability(Vec<Capability>),
    /// Any other code, kept verbatim.
    Other(String),
}

impl ResponseCode {
    /// Parses the text between the brackets.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut parts = s.split_ascii_whitespace();
        let Some(keyword) = parts.next() else {
            return Self::Other(String::new());
        };
        match keyword.to_ascii_uppercase().as_str() {
            "CAPABILITY" => Self::Capability(parts.map(Capability::parse).collect()),
            _ => Self::Other(s.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unreadable_literal)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(Status::parse("ok"), Some(Status::Ok));
        assert_eq!(Status::parse("NO"), Some(Status::No));
        assert_eq!(Status::parse("PreAuth"), Some(Status::PreAuth));
        assert_eq!(Status::parse("FETCH"), None);
    }

    #[test]
    fn test_capability_parse() {
        assert_eq!(Capability::parse("imap4rev1"), Capability::Imap4Rev1);
        assert_eq!(
            Capability::parse("AUTH=PLAIN"),
            Capability::Auth("PLAIN".to_string())
        );
        assert_eq!(
            Capability::parse("APPENDLIMIT=35882577"),
            Capability::AppendLimit(Some(35882577))
        );
        assert_eq!(
            Capability::parse("APPENDLIMIT"),
            Capability::AppendLimit(None)
        );
        assert_eq!(
            Capability::parse("APPENDLIMIT=lots"),
            Capability::Unknown("APPENDLIMIT=lots".to_string())
        );
    }

    #[test]
    fn test_capability_display_round_trips_appendlimit() {
        let cap = Capability::AppendLimit(Some(1024));
        assert_eq!(cap.to_string(), "APPENDLIMIT=1024");
        assert_eq!(Capability::parse(&cap.to_string()), cap);
    }

    #[test]
    fn test_response_code_parse() {
        assert_eq!(
            ResponseCode::parse("TOOBIG"),
            ResponseCode::Other("TOOBIG".to_string())
        );
        assert_eq!(
            ResponseCode::parse("CAPABILITY IMAP4rev1 APPENDLIMIT"),
            ResponseCode::Capability(vec![Capability::Imap4Rev1, Capability::AppendLimit(None)])
        );
        assert_eq!(
            ResponseCode::parse("UIDNEXT 42"),
            ResponseCode::Other("UIDNEXT 42".to_string())
        );
    }
}
