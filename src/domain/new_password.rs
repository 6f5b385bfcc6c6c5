use secrecy::Secret;
use unicode_segmentation::UnicodeSegmentation;

/// A password supplied at registration, checked against the length policy.
#[derive(Debug)]
pub struct NewPassword(Secret<String>);

impl NewPassword {
    pub const MIN_LENGTH: usize = 6;

    pub fn parse(s: String) -> Result<NewPassword, String> {
        if s.graphemes(true).count() < Self::MIN_LENGTH {
            return Err(format!(
                "A senha deve ter pelo menos {} caracteres",
                Self::MIN_LENGTH
            ));
        }
        Ok(Self(Secret::new(s)))
    }
}

impl AsRef<Secret<String>> for NewPassword {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}
