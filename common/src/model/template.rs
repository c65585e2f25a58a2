use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical template documents used by the renderer.
///
/// There is exactly one stored template per kind. Re-uploading a template
/// overwrites it and no history is kept, so every render fetches it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    Certificate,
    RecommendationLetter,
    AcceptanceLetter,
    PromotionLetter,
    PromotionCpnsLetter,
    AssessmentTeamLetter,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 6] = [
        TemplateKind::Certificate,
        TemplateKind::RecommendationLetter,
        TemplateKind::AcceptanceLetter,
        TemplateKind::PromotionLetter,
        TemplateKind::PromotionCpnsLetter,
        TemplateKind::AssessmentTeamLetter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKind::Certificate => "certificate",
            TemplateKind::RecommendationLetter => "recommendation-letter",
            TemplateKind::AcceptanceLetter => "acceptance-letter",
            TemplateKind::PromotionLetter => "promotion-letter",
            TemplateKind::PromotionCpnsLetter => "promotion-cpns-letter",
            TemplateKind::AssessmentTeamLetter => "assessment-team-letter",
        }
    }

    /// Key of the template object inside the permanent storage area.
    pub fn storage_key(self) -> String {
        format!("templates/{}.docx", self.as_str())
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown template kind '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_kind_from_its_name() {
        for kind in TemplateKind::ALL {
            assert_eq!(kind.as_str().parse::<TemplateKind>().unwrap(), kind);
        }
        assert!("cover-letter".parse::<TemplateKind>().is_err());
    }

    #[test]
    fn storage_key_lives_under_templates_prefix() {
        assert_eq!(
            TemplateKind::RecommendationLetter.storage_key(),
            "templates/recommendation-letter.docx"
        );
    }
}
