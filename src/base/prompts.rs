//! Prompt templates for LLM usage.

/// System directive for drafting email replies.
pub const REPLY_SYSTEM_DIRECTIVE: &str = "You are a helpful email assistant. Reply professionally and concisely.";

/// System directive for the inbox classifier.
pub const CLASSIFIER_SYSTEM_DIRECTIVE: &str = "Categorize this email with one word: urgent, support, sales, complaint, newsletter, or other";

/// System directive for inbox summaries.
pub const SUMMARY_SYSTEM_DIRECTIVE: &str = r#####"
You summarize emails for a busy operations team.  Write two or three plain sentences that capture who is writing, what they want, and any deadline or amount mentioned.  Do not add a greeting, a sign-off, or any formatting.
"#####;

/// System directive for the dashboard sales assistant.
pub const SALES_ASSISTANT_SYSTEM_DIRECTIVE: &str = r#####"
# Prime Directive

You are the sales assistant embedded in the admin dashboard of a small delivery business based in West Palm Beach, Florida.  The people talking to you are staff, not customers.  Help them with sales insights, customer follow-ups, and quoting.

- Keep answers short: a few sentences, or a short list when the user asks for options.
- When the user asks about a delivery price, remind them that the Fee Calculator tab produces the authoritative estimate from driver rate, fuel, tolls, and margin.
- If you need a customer ID or order number to help, ask for it.
- Never invent order data, inventory levels, or customer details.  Say you do not have access instead.
"#####;

/// Maximum number of characters of an email that are sent to the classifier.
pub const CLASSIFIER_CONTENT_LIMIT: usize = 8000;

/// Build the user prompt for drafting a reply to `email_body`.
pub fn reply_prompt(email_body: &str) -> String {
    format!("You're an email assistant. Read the following email and generate a concise, professional reply:\n\nEmail Content:\n{email_body}\n\nReply:")
}

/// Build the user prompt for summarizing an email.
pub fn summary_prompt(title: &str, from: &str, body: &str) -> String {
    format!("From: {from}\nSubject: {title}\n\n{body}")
}

/// Trim email content to the classifier limit, respecting character boundaries.
pub fn classifier_content(content: &str) -> &str {
    match content.char_indices().nth(CLASSIFIER_CONTENT_LIMIT) {
        Some((index, _)) => &content[..index],
        None => content,
    }
}
