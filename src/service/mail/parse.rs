use mailparse::{DispositionType, MailAddr, MailHeaderMap, ParsedMail};

use crate::base::types::Res;

use super::InboxMessage;

/// Parse a raw RFC 822 message into an [`InboxMessage`].
pub fn parse_message(uid: u32, seen: bool, raw: &[u8]) -> Res<InboxMessage> {
    let mail = mailparse::parse_mail(raw)?;

    let subject = mail.headers.get_first_value("Subject").unwrap_or_default();
    let date = mail.headers.get_first_value("Date").unwrap_or_default();
    let from = mail.headers.get_first_value("From").unwrap_or_default();

    Ok(InboxMessage {
        uid,
        sender: sender_address(&from),
        subject,
        date,
        seen,
        body: extract_body(&mail),
    })
}

/// Pull the bare address out of a `From` header value.
pub fn sender_address(from: &str) -> String {
    let parsed = mailparse::addrparse(from).ok().and_then(|list| {
        list.iter().find_map(|addr| match addr {
            MailAddr::Single(info) => Some(info.addr.clone()),
            MailAddr::Group(group) => group.addrs.first().map(|info| info.addr.clone()),
        })
    });

    parsed.unwrap_or_else(|| from.trim().to_string())
}

/// Body text of a message.
///
/// Multipart messages yield their first `text/plain` part that is not an attachment;
/// single-part messages yield their whole decoded body.
pub fn extract_body(mail: &ParsedMail) -> String {
    if mail.subparts.is_empty() {
        return mail.get_body().unwrap_or_default();
    }

    find_plain_text(mail).unwrap_or_default()
}

fn find_plain_text(part: &ParsedMail) -> Option<String> {
    let is_attachment = matches!(part.get_content_disposition().disposition, DispositionType::Attachment);

    if part.subparts.is_empty() && part.ctype.mimetype == "text/plain" && !is_attachment {
        if let Ok(body) = part.get_body() {
            return Some(body);
        }
    }

    part.subparts.iter().find_map(find_plain_text)
}
