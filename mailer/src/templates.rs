//! Rendered message bodies for the two code-bearing emails.

use crate::MailMessage;

const BRAND: &str = "Wellspring Water Solutions";

/// The email carrying a registration verification code.
pub fn verification_email(code: &str) -> MailMessage {
    MailMessage {
        subject: format!("Verify Your Email Address - {BRAND}"),
        html: code_email_html(
            "Email Verification",
            &format!("Thank you for registering with {BRAND}!"),
            "Your verification code is:",
            code,
            "Enter this code in the verification form to complete your registration.",
            "If you didn't request this code, please ignore this email.",
        ),
        text: format!(
            "Your {BRAND} verification code is {code}. \
             Enter it in the verification form to complete your registration. \
             If you didn't request this code, please ignore this email."
        ),
    }
}

/// The email carrying a password reset code.
pub fn password_reset_email(code: &str) -> MailMessage {
    MailMessage {
        subject: format!("Password Reset Request - {BRAND}"),
        html: code_email_html(
            "Password Reset Request",
            &format!("We received a request to reset the password for your {BRAND} account."),
            "Your password reset code is:",
            code,
            "Enter this code in the password reset form to create a new password.",
            "If you didn't request a password reset, please ignore this email.",
        ),
        text: format!(
            "Your {BRAND} password reset code is {code}. \
             Enter it in the password reset form to create a new password. \
             If you didn't request a password reset, please ignore this email."
        ),
    }
}

fn code_email_html(
    heading: &str,
    greeting: &str,
    lead_in: &str,
    code: &str,
    instruction: &str,
    disclaimer: &str,
) -> String {
    format!(
        r#"<div style="font-family:Arial,sans-serif;max-width:600px;margin:auto;padding:20px">
  <h2 style="text-align:center">{BRAND}</h2>
  <h3>{heading}</h3>
  <p>{greeting}</p>
  <p>{lead_in}</p>
  <div style="text-align:center;margin:20px 0">
    <span style="display:inline-block;background:#0e7490;color:#fff;padding:15px 30px;border-radius:8px;font-size:28px;font-weight:bold;letter-spacing:3px">{code}</span>
  </div>
  <p>{instruction}</p>
  <p style="font-size:12px;color:#666">{disclaimer}</p>
</div>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_templates_carry_the_code() {
        let v = verification_email("482913");
        assert!(v.html.contains("482913"));
        assert!(v.text.contains("482913"));
        assert!(v.subject.contains("Verify"));

        let r = password_reset_email("117700");
        assert!(r.html.contains("117700"));
        assert!(r.text.contains("117700"));
        assert!(r.subject.contains("Password Reset"));
    }

    #[test]
    fn templates_differ_in_content() {
        assert_ne!(
            verification_email("000000").subject,
            password_reset_email("000000").subject
        );
    }
}
