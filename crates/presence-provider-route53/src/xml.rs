//! Route 53 XML bodies
//!
//! The API speaks a small, fixed XML vocabulary. Requests are rendered from
//! a template and responses are read by element name.

use presence_core::ChangeRequest;

pub(crate) const XMLNS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

/// Render a `ChangeResourceRecordSetsRequest` holding one change
pub(crate) fn change_batch(change: &ChangeRequest) -> String {
    let record = &change.record;
    let values: String = change
        .values()
        .into_iter()
        .map(|value| {
            format!(
                "<ResourceRecord><Value>{}</Value></ResourceRecord>",
                escape(value)
            )
        })
        .collect();

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<ChangeResourceRecordSetsRequest xmlns="{xmlns}">"#,
            "<ChangeBatch><Changes><Change>",
            "<Action>{action}</Action>",
            "<ResourceRecordSet>",
            "<Name>{name}</Name>",
            "<Type>{record_type}</Type>",
            "<TTL>{ttl}</TTL>",
            "<ResourceRecords>{values}</ResourceRecords>",
            "</ResourceRecordSet>",
            "</Change></Changes></ChangeBatch>",
            "</ChangeResourceRecordSetsRequest>"
        ),
        xmlns = XMLNS,
        action = change.action.as_str(),
        name = escape(record.name()),
        record_type = escape(record.record_type()),
        ttl = record.ttl(),
        values = values,
    )
}

/// Text of the first `<tag>` element, unescaped
pub(crate) fn element_text(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);

    let start = body.find(&open)? + open.len();
    let len = body[start..].find(&close)?;
    Some(unescape(body[start..start + len].trim()))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
