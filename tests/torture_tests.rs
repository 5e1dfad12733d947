use sipmsg::*;

/// Malformed-input and edge-case corpus run through the full message
/// aggregation loop. The messages here are deliberately broken in one
/// place each; every test also checks what survives the failure.

fn crlf(text: &str) -> String {
    text.replace('\n', "\r\n")
}

#[test]
fn missing_colon_is_fatal_but_earlier_headers_survive() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         Call-ID: a84b4c76e66710\n\
         Subject this line has no colon\n\
         CSeq: 1 INVITE\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    let result = msg.parse(HeaderFlags::ALL);
    assert!(matches!(
        result,
        Err(ParseError::MalformedHeaderName { .. })
    ));

    // no rollback: the first header stays queryable
    assert_eq!(msg.headers().len(), 1);
    assert_eq!(msg.call_id(), Some("a84b4c76e66710"));
    assert!(msg.cseq().is_none());
}

#[test]
fn unterminated_quoted_display_name() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         To: \"Bob <sip:bob@biloxi.com>\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    assert!(matches!(
        msg.parse(HeaderFlags::ALL),
        Err(ParseError::UnterminatedQuotedString { .. })
    ));
}

#[test]
fn unbalanced_via_comment() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         Via: SIP/2.0/UDP host.com (never closed\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    assert!(matches!(
        msg.parse(HeaderFlags::ALL),
        Err(ParseError::UnbalancedDelimiter { open: '(', .. })
    ));
}

#[test]
fn unbalanced_ipv6_bracket() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         Via: SIP/2.0/UDP [2001:db8::1:5060\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    assert!(matches!(
        msg.parse(HeaderFlags::ALL),
        Err(ParseError::UnbalancedDelimiter { open: '[', .. })
    ));
}

#[test]
fn via_port_overflow_is_the_only_soft_failure() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         Via: SIP/2.0/UDP host.com:99999;branch=z9hG4bKx\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    msg.parse(HeaderFlags::ALL).expect("overflowed port is not fatal");

    let via = msg.via1().expect("via");
    assert_eq!(via.port, None);
    assert!(via.port_overflowed());
    assert_eq!(msg.get_opt_str(via.port_span), Some("99999"));
    assert_eq!(msg.get_opt_str(via.branch), Some("z9hG4bKx"));
}

#[test]
fn via_empty_port_is_fatal() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         Via: SIP/2.0/UDP host.com:;branch=z9hG4bKx\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    assert!(matches!(
        msg.parse(HeaderFlags::ALL),
        Err(ParseError::MalformedBody {
            kind: HeaderKind::Via,
            ..
        })
    ));
}

#[test]
fn via_hidden_param_rejects_value() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         Via: SIP/2.0/UDP host.com;hidden=yes\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    assert!(matches!(
        msg.parse(HeaderFlags::ALL),
        Err(ParseError::MalformedBody {
            kind: HeaderKind::Via,
            ..
        })
    ));
}

#[test]
fn via_ttl_must_be_numeric() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         Via: SIP/2.0/UDP host.com;ttl=infinite\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    assert!(matches!(
        msg.parse(HeaderFlags::ALL),
        Err(ParseError::MalformedBody {
            kind: HeaderKind::Via,
            ..
        })
    ));
}

#[test]
fn cseq_trailing_garbage() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         CSeq: 314159 INVITE extra\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    assert!(matches!(
        msg.parse(HeaderFlags::ALL),
        Err(ParseError::MalformedBody {
            kind: HeaderKind::CSeq,
            ..
        })
    ));
}

#[test]
fn truncated_message_without_terminator() {
    // last header line is cut off mid-value, no line break at all
    let text = "INVITE sip:bob@biloxi.com SIP/2.0\r\nCall-ID: a84b4c76";
    let mut msg = SipMessage::new_from_str(text);
    assert!(matches!(
        msg.parse(HeaderFlags::ALL),
        Err(ParseError::PrematureEnd { .. })
    ));
}

#[test]
fn oversized_message_rejected_before_any_work() {
    let mut text = String::from("INVITE sip:bob@biloxi.com SIP/2.0\r\nSubject: ");
    text.push_str(&"x".repeat(MAX_MESSAGE_SIZE));
    text.push_str("\r\n\r\n");
    let mut msg = SipMessage::new_from_str(&text);
    assert!(matches!(
        msg.parse(HeaderFlags::ALL),
        Err(ParseError::MessageTooLarge { .. })
    ));
    assert_eq!(msg.headers().len(), 0);
}

#[test]
fn header_count_limit() {
    let mut text = String::from("INVITE sip:bob@biloxi.com SIP/2.0\r\n");
    for i in 0..10 {
        text.push_str(&format!("X-Pad-{}: value\r\n", i));
    }
    text.push_str("\r\n");

    let limits = ParserLimits {
        max_headers: 4,
        ..ParserLimits::default()
    };
    let mut msg = SipMessage::with_limits(text, limits);
    assert!(matches!(
        msg.parse(HeaderFlags::ALL),
        Err(ParseError::TooManyHeaders { limit: 4 })
    ));
    assert_eq!(msg.headers().len(), 4);
}

#[test]
fn via_chain_entry_limit() {
    let mut body = String::from("SIP/2.0/UDP h0.com");
    for i in 1..8 {
        body.push_str(&format!(",SIP/2.0/UDP h{}.com", i));
    }
    let text = format!(
        "INVITE sip:bob@biloxi.com SIP/2.0\r\nVia: {}\r\n\r\n",
        body
    );

    let limits = ParserLimits {
        max_via_entries: 5,
        ..ParserLimits::default()
    };
    let mut msg = SipMessage::with_limits(text, limits);
    assert!(matches!(
        msg.parse(HeaderFlags::ALL),
        Err(ParseError::MalformedBody {
            kind: HeaderKind::Via,
            ..
        })
    ));
}

#[test]
fn incremental_parse_resumes_where_it_stopped() {
    let text = crlf(
        "SIP/2.0 200 OK\n\
         Via: SIP/2.0/UDP p1.example.com;branch=z9hG4bK1\n\
         Via: SIP/2.0/UDP p2.example.com;branch=z9hG4bK2\n\
         From: <sip:alice@atlanta.com>;tag=88sja8x\n\
         To: <sip:bob@biloxi.com>;tag=a6c85cf\n\
         CSeq: 1 OPTIONS\n\
         Content-Length: 0\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);

    // default reply coverage stops after the second Via
    msg.parse_default().expect("reply vias");
    assert_eq!(msg.headers().len(), 2);
    assert!(msg.via1().is_some());
    assert!(msg.via2().is_some());
    assert!(msg.to().is_none());

    // widening the target resumes from the cursor, not from the top
    msg.extend_coverage(HeaderFlags::TO | HeaderFlags::CSEQ)
        .expect("resume");
    assert_eq!(msg.get_opt_str(msg.to().and_then(|t| t.tag_value)), Some("a6c85cf"));
    let cseq = msg.cseq().expect("cseq");
    assert_eq!(msg.get_str(cseq.method), "OPTIONS");
    // the two Via fields were not re-parsed into duplicates
    assert_eq!(
        msg.headers()
            .iter()
            .filter(|h| h.kind == HeaderKind::Via)
            .count(),
        2
    );
}

#[test]
fn bare_lf_line_endings_accepted() {
    let text = "INVITE sip:bob@biloxi.com SIP/2.0\n\
                Via: SIP/2.0/UDP host.com:5060;branch=z9hG4bKx\n\
                CSeq: 7 INVITE\n\
                \n";
    let mut msg = SipMessage::new_from_str(text);
    msg.parse(HeaderFlags::ALL).expect("lf-only message");

    assert_eq!(msg.method(), Some(Method::INVITE));
    let via = msg.via1().expect("via");
    assert_eq!(msg.get_str(via.host), "host.com");
    assert_eq!(msg.cseq().map(|c| msg.get_str(c.number)), Some("7"));
}

#[test]
fn body_after_blank_line_is_spanned_not_parsed() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         Content-Type: application/sdp\n\
         \n\
         v=0\n\
         o=alice 2890844526 2890844526 IN IP4 atlanta.com\n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    msg.parse(HeaderFlags::ALL).expect("message with body");

    let body = msg.body().expect("body text");
    assert!(body.starts_with("v=0"));
    // nothing past the blank line was treated as a header
    assert_eq!(msg.headers().len(), 1);
}

#[test]
fn unknown_headers_keep_insertion_order() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         X-Custom-One: 1\n\
         Call-ID: abc\n\
         X-Custom-Two: 2\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    msg.parse(HeaderFlags::ALL).expect("unknown headers");

    let kinds: Vec<HeaderKind> = msg.headers().iter().map(|h| h.kind).collect();
    assert_eq!(
        kinds,
        vec![HeaderKind::Other, HeaderKind::CallId, HeaderKind::Other]
    );
    assert_eq!(msg.get_str(msg.headers()[0].name), "X-Custom-One");
    assert_eq!(msg.get_str(msg.headers()[2].name), "X-Custom-Two");
}

#[test]
fn duplicate_headers_keep_first_occurrence_pointer() {
    let text = crlf(
        "INVITE sip:bob@biloxi.com SIP/2.0\n\
         Call-ID: first\n\
         Call-ID: second\n\
         \n",
    );
    let mut msg = SipMessage::new_from_str(&text);
    msg.parse(HeaderFlags::ALL).expect("duplicates");

    assert_eq!(msg.call_id(), Some("first"));
    // both occurrences still land in the ordered list
    assert_eq!(
        msg.headers()
            .iter()
            .filter(|h| h.kind == HeaderKind::CallId)
            .count(),
        2
    );
}
