use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstablishmentName(String);

impl EstablishmentName {
    pub fn parse(s: String) -> Result<EstablishmentName, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Nome é obrigatório".to_string());
        }
        if trimmed.graphemes(true).count() > 256 {
            return Err("Nome muito longo".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for EstablishmentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
