use validator::validate_email;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEmail(String);

impl UserEmail {
    /// Trims and lowercases the input before validating it, so lookups by
    /// e-mail are case-insensitive.
    pub fn parse(s: String) -> Result<UserEmail, String> {
        let normalized = s.trim().to_lowercase();
        if validate_email(normalized.as_str()) {
            Ok(Self(normalized))
        } else {
            Err(format!("{} não é um email válido.", s))
        }
    }
}

impl AsRef<str> for UserEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
