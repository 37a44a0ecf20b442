//! Verification email rendering.

use mfa_core::domain::value_objects::CodeNotice;
use mfa_shared::config::MfaConfig;

/// Subject and bodies of one verification email
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl std::fmt::Debug for RenderedEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Bodies carry the plaintext code.
        f.debug_struct("RenderedEmail")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

/// Email template parameterised by subject line and signing application name
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    subject: String,
    app_name: String,
}

const SECURITY_TIPS: [&str; 3] = [
    "Never share this code with anyone",
    "Our team will never ask you for this code",
    "This code is only valid for one use",
];

impl EmailTemplate {
    pub fn new(subject: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            app_name: app_name.into(),
        }
    }

    pub fn from_config(config: &MfaConfig) -> Self {
        Self::new(config.email_subject.clone(), config.app_name.clone())
    }

    pub fn render(&self, notice: &CodeNotice) -> RenderedEmail {
        RenderedEmail {
            subject: self.subject.clone(),
            text_body: self.render_text(notice),
            html_body: self.render_html(notice),
        }
    }

    fn render_text(&self, notice: &CodeNotice) -> String {
        let tips: String = SECURITY_TIPS.iter().map(|tip| format!("- {}\n", tip)).collect();

        format!(
            "Hello {name},\n\n\
             You are receiving this email because a verification code was requested for your account.\n\n\
             Your verification code: {code}\n\n\
             This code will expire in {ttl} {unit}.\n\n\
             If you did not request this verification code, no further action is required. \
             However, if you suspect unauthorized access to your account, please contact support immediately.\n\n\
             Security Tips:\n{tips}\n\
             Thanks,\n{app}\n\n\
             This is an automated message. Please do not reply to this email.\n",
            name = notice.greeting_name(),
            code = notice.plain_code,
            ttl = notice.ttl_minutes,
            unit = minutes_unit(notice.ttl_minutes),
            tips = tips,
            app = self.app_name,
        )
    }

    fn render_html(&self, notice: &CodeNotice) -> String {
        let tips: String = SECURITY_TIPS
            .iter()
            .map(|tip| format!("<li>{}</li>", tip))
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333;">
<h1>Your Verification Code</h1>
<p>Hello {name},</p>
<p>You are receiving this email because a verification code was requested for your account.</p>
<p style="font-size: 28px; letter-spacing: 6px; font-weight: bold; background: #f4f4f4; padding: 16px; text-align: center;">{code}</p>
<p>This code will expire in <strong>{ttl} {unit}</strong>.</p>
<p>If you did not request this verification code, no further action is required. However, if you suspect unauthorized access to your account, please contact support immediately.</p>
<p><strong>Security Tips:</strong></p>
<ul>{tips}</ul>
<p>Thanks,<br>{app}</p>
<p style="font-size: 12px; color: #888;">This is an automated message. Please do not reply to this email.</p>
</body>
</html>
"#,
            name = escape_html(notice.greeting_name()),
            code = escape_html(&notice.plain_code),
            ttl = notice.ttl_minutes,
            unit = minutes_unit(notice.ttl_minutes),
            tips = tips,
            app = escape_html(&self.app_name),
        )
    }
}

fn minutes_unit(minutes: i64) -> &'static str {
    if minutes == 1 {
        "minute"
    } else {
        "minutes"
    }
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
