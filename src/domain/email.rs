//! Corporate-email validation and company derivation.
//!
//! Employees identify themselves by corporate email; free-mail providers
//! are rejected so that every respondent maps to a tenant company.

const FREE_EMAIL_DOMAINS: [&str; 8] = [
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "icloud.com",
    "mail.com",
    "aol.com",
    "protonmail.com",
];

/// Validates and normalizes (trim + lowercase) a corporate email address.
pub fn validate_corporate_email(raw: &str) -> Result<String, String> {
    let email = raw.trim().to_lowercase();

    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format".to_string());
    };
    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.contains(char::is_whitespace)
        || email.matches('@').count() != 1
    {
        return Err("Invalid email format".to_string());
    }

    if FREE_EMAIL_DOMAINS.contains(&domain) {
        return Err("Please use your corporate email address".to_string());
    }

    Ok(email)
}

/// The tenant key: everything after the '@', lowercased.
pub fn company_domain(email: &str) -> String {
    email
        .to_lowercase()
        .split_once('@')
        .map(|(_, domain)| domain.to_string())
        .unwrap_or_default()
}

/// Display name derived from the domain's first label ("acme.co.uk" ->
/// "acme").
pub fn company_name(domain: &str) -> String {
    domain.split('.').next().unwrap_or(domain).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_normalizes_corporate_emails() {
        assert_eq!(
            validate_corporate_email("  Jane.Doe@Acme.COM ").unwrap(),
            "jane.doe@acme.com"
        );
    }

    #[test]
    fn rejects_free_mail_providers() {
        for domain in FREE_EMAIL_DOMAINS {
            let email = format!("someone@{domain}");
            assert!(validate_corporate_email(&email).is_err(), "{email}");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "no-at-sign", "@acme.com", "jane@", "jane@acme", "a@b@c.com", "jane doe@acme.com"] {
            assert!(validate_corporate_email(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn derives_company_domain_and_name() {
        assert_eq!(company_domain("jane@acme.co.uk"), "acme.co.uk");
        assert_eq!(company_name("acme.co.uk"), "acme");
        assert_eq!(company_name("initech.io"), "initech");
    }
}
