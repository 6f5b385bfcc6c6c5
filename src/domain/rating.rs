use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Bad,
    Okay,
    Great,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Bad => "bad",
            Rating::Okay => "okay",
            Rating::Great => "great",
        }
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bad" => Ok(Rating::Bad),
            "okay" => Ok(Rating::Okay),
            "great" => Ok(Rating::Great),
            _ => Err("Avaliação inválida".to_string()),
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
