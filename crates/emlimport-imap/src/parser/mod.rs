//! IMAP response parser.
//!
//! Sans-I/O: takes one complete response as read by
//! [`FramedStream::read_response`](crate::FramedStream::read_response),
//! literals included, and turns it into a [`Response`].

#![allow(clippy::missing_errors_doc)]

mod cursor;

use cursor::Cursor;

use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

/// A parsed IMAP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: String,
        /// Response status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
    /// Continuation request.
    Continuation {
        /// Optional text/data.
        text: Option<String>,
    },
}

/// Untagged server data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK`, `* NO`, `* BAD`, `* PREAUTH` or `* BYE` with optional code.
    Condition {
        /// Condition status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* CAPABILITY ...`
    Capability(Vec<Capability>),
    /// `* STATUS mailbox (...)`
    Status {
        /// Mailbox name.
        mailbox: String,
        /// Status items.
        items: Vec<StatusItem>,
    },
    /// Anything the importer does not interpret (EXISTS, FLAGS, ...).
    Other(String),
}

/// One attribute/value pair of a STATUS response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusItem {
    /// APPENDLIMIT value; `None` when the server answered `NIL`.
    AppendLimit(Option<u32>),
    /// Any other attribute, kept verbatim.
    Other {
        /// Attribute name.
        name: String,
        /// Raw value.
        value: String,
    },
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a complete response.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut cursor = Cursor::new(input);

        match cursor.peek() {
            Some(b'*') => {
                cursor.advance(1);
                cursor.expect_space()?;
                Self::parse_untagged(&mut cursor).map(Response::Untagged)
            }
            Some(b'+') => {
                cursor.advance(1);
                cursor.skip_spaces();
                let text = cursor.rest_text();
                Ok(Response::Continuation {
                    text: (!text.is_empty()).then_some(text),
                })
            }
            Some(_) => Self::parse_tagged(&mut cursor),
            None => Err(Error::Parse("empty response".to_string())),
        }
    }

    fn parse_tagged(cursor: &mut Cursor<'_>) -> Result<Response> {
        let tag = cursor.atom()?.to_string();
        cursor.expect_space()?;
        let keyword = cursor.atom()?;
        let status = Status::parse(keyword).ok_or_else(|| {
            Error::Parse(format!("expected status after tag {tag}, got {keyword:?}"))
        })?;
        let (code, text) = Self::parse_resp_text(cursor)?;

        Ok(Response::Tagged {
            tag,
            status,
            code,
            text,
        })
    }

    fn parse_untagged(cursor: &mut Cursor<'_>) -> Result<UntaggedResponse> {
        let keyword = cursor.atom()?;

        if let Some(status) = Status::parse(keyword) {
            let (code, text) = Self::parse_resp_text(cursor)?;
            return Ok(UntaggedResponse::Condition { status, code, text });
        }

        match keyword.to_ascii_uppercase().as_str() {
            "CAPABILITY" => Ok(UntaggedResponse::Capability(
                cursor
                    .rest_text()
                    .split_ascii_whitespace()
                    .map(Capability::parse)
                    .collect(),
            )),
            "STATUS" => Self::parse_status(cursor),
            _ => {
                let keyword = keyword.to_string();
                cursor.skip_spaces();
                let rest = cursor.rest_text();
                Ok(UntaggedResponse::Other(if rest.is_empty() {
                    keyword
                } else {
                    format!("{keyword} {rest}")
                }))
            }
        }
    }

    /// Parses `mailbox SP "(" [att SP value *(SP att SP value)] ")"`.
    fn parse_status(cursor: &mut Cursor<'_>) -> Result<UntaggedResponse> {
        cursor.expect_space()?;
        let mailbox = cursor.astring()?;
        cursor.skip_spaces();
        cursor.expect(b'(')?;

        let mut items = Vec::new();
        loop {
            cursor.skip_spaces();
            if cursor.peek() == Some(b')') {
                cursor.advance(1);
                break;
            }
            let name = cursor.atom()?.to_ascii_uppercase();
            cursor.expect_space()?;
            let value = cursor.atom()?;
            items.push(Self::status_item(&name, value)?);
        }

        Ok(UntaggedResponse::Status { mailbox, items })
    }

    fn status_item(name: &str, value: &str) -> Result<StatusItem> {
        let number = |value: &str| {
            value
                .parse::<u32>()
                .map_err(|_| Error::Parse(format!("invalid {name} value {value:?}")))
        };

        match name {
            "APPENDLIMIT" if value.eq_ignore_ascii_case("NIL") => Ok(StatusItem::AppendLimit(None)),
            "APPENDLIMIT" => number(value).map(|n| StatusItem::AppendLimit(Some(n))),
            _ => Ok(StatusItem::Other {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Parses `[SP] ["[" code "]" SP] text`.
    fn parse_resp_text(cursor: &mut Cursor<'_>) -> Result<(Option<ResponseCode>, String)> {
        cursor.skip_spaces();
        let code = if cursor.peek() == Some(b'[') {
            cursor.advance(1);
            let raw = cursor.until(b']')?;
            cursor.skip_spaces();
            Some(ResponseCode::parse(&raw))
        } else {
            None
        };
        Ok((code, cursor.rest_text()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unreadable_literal)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_ok() {
        let parsed = ResponseParser::parse(b"A0001 OK LOGIN completed\r\n").unwrap();
        assert_eq!(
            parsed,
            Response::Tagged {
                tag: "A0001".to_string(),
                status: Status::Ok,
                code: None,
                text: "LOGIN completed".to_string(),
            }
        );
    }

    #[test]
    fn test_tagged_no_with_code() {
        let parsed =
            ResponseParser::parse(b"A0003 NO [TOOBIG] Message too large\r\n").unwrap();
        assert_eq!(
            parsed,
            Response::Tagged {
                tag: "A0003".to_string(),
                status: Status::No,
                code: Some(ResponseCode::Other("TOOBIG".to_string())),
                text: "Message too large".to_string(),
            }
        );
    }

    #[test]
    fn test_greeting_with_capabilities() {
        let parsed =
            ResponseParser::parse(b"* OK [CAPABILITY IMAP4rev1 APPENDLIMIT=1000] ready\r\n")
                .unwrap();
        let Response::Untagged(UntaggedResponse::Condition { status, code, text }) = parsed else {
            panic!("expected untagged condition");
        };
        assert_eq!(status, Status::Ok);
        assert_eq!(
            code,
            Some(ResponseCode::Capability(vec![
                Capability::Imap4Rev1,
                Capability::AppendLimit(Some(1000)),
            ]))
        );
        assert_eq!(text, "ready");
    }

    #[test]
    fn test_capability_response() {
        let parsed = ResponseParser::parse(b"* CAPABILITY IMAP4rev2 AUTH=PLAIN\r\n").unwrap();
        assert_eq!(
            parsed,
            Response::Untagged(UntaggedResponse::Capability(vec![
                Capability::Imap4Rev2,
                Capability::Auth("PLAIN".to_string()),
            ]))
        );
    }

    #[test]
    fn test_status_appendlimit_number() {
        let parsed =
            ResponseParser::parse(b"* STATUS INBOX (MESSAGES 12 APPENDLIMIT 35882577)\r\n")
                .unwrap();
        assert_eq!(
            parsed,
            Response::Untagged(UntaggedResponse::Status {
                mailbox: "INBOX".to_string(),
                items: vec![
                    StatusItem::Other {
                        name: "MESSAGES".to_string(),
                        value: "12".to_string(),
                    },
                    StatusItem::AppendLimit(Some(35882577)),
                ],
            })
        );
    }

    #[test]
    fn test_status_appendlimit_nil_quoted_mailbox() {
        let parsed =
            ResponseParser::parse(b"* STATUS \"Sent Items\" (APPENDLIMIT NIL)\r\n").unwrap();
        assert_eq!(
            parsed,
            Response::Untagged(UntaggedResponse::Status {
                mailbox: "Sent Items".to_string(),
                items: vec![StatusItem::AppendLimit(None)],
            })
        );
    }

    #[test]
    fn test_status_literal_mailbox() {
        let parsed = ResponseParser::parse(b"* STATUS {5}\r\nINBOX (UIDNEXT 4)\r\n").unwrap();
        assert_eq!(
            parsed,
            Response::Untagged(UntaggedResponse::Status {
                mailbox: "INBOX".to_string(),
                items: vec![StatusItem::Other {
                    name: "UIDNEXT".to_string(),
                    value: "4".to_string(),
                }],
            })
        );
    }

    #[test]
    fn test_status_rejects_garbage_value() {
        assert!(ResponseParser::parse(b"* STATUS INBOX (APPENDLIMIT huge)\r\n").is_err());
    }

    #[test]
    fn test_continuation() {
        assert_eq!(
            ResponseParser::parse(b"+ Ready for literal data\r\n").unwrap(),
            Response::Continuation {
                text: Some("Ready for literal data".to_string())
            }
        );
        assert_eq!(
            ResponseParser::parse(b"+\r\n").unwrap(),
            Response::Continuation { text: None }
        );
    }

    #[test]
    fn test_other_untagged() {
        assert_eq!(
            ResponseParser::parse(b"* 3 EXISTS\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Other("3 EXISTS".to_string()))
        );
    }

    #[test]
    fn test_bad_status_keyword() {
        assert!(ResponseParser::parse(b"A0001 MAYBE\r\n").is_err());
        assert!(ResponseParser::parse(b"").is_err());
    }
}
