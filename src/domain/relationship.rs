//! Cross-content relationships
//!
//! Manifests declare `related_content` references between items
//! (project <-> idea <-> blog <-> episode). References are resolved into
//! validated links only after the full item set for a pass is known.

use serde::{Deserialize, Serialize};

use super::item::ContentType;

/// Kind of directed relationship between two items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// A project implementing an idea
    ImplementationOf,
    /// A vlog/episode series walking through another item
    TutorialSeries,
    /// A blog post studying a project
    CaseStudyOf,
    /// Research material behind an idea or project
    BackgroundResearch,
    /// A later item continuing an earlier one
    FollowUp,
    /// Untyped association
    #[default]
    Related,
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RelationshipKind::ImplementationOf => "implementation_of",
            RelationshipKind::TutorialSeries => "tutorial_series",
            RelationshipKind::CaseStudyOf => "case_study_of",
            RelationshipKind::BackgroundResearch => "background_research",
            RelationshipKind::FollowUp => "follow_up",
            RelationshipKind::Related => "related",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for RelationshipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "implementation_of" => Ok(RelationshipKind::ImplementationOf),
            "tutorial_series" => Ok(RelationshipKind::TutorialSeries),
            "case_study_of" => Ok(RelationshipKind::CaseStudyOf),
            "background_research" => Ok(RelationshipKind::BackgroundResearch),
            "follow_up" => Ok(RelationshipKind::FollowUp),
            "related" => Ok(RelationshipKind::Related),
            _ => Err(format!("Unknown relationship kind: {}", s)),
        }
    }
}

/// A reference declared in a manifest, not yet validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedContentRef {
    pub target_type: ContentType,
    pub target_id: String,
    #[serde(default)]
    pub kind: RelationshipKind,
}

/// A validated directed edge between two existing items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipLink {
    pub from_type: ContentType,
    pub from_id: String,
    pub to_type: ContentType,
    pub to_id: String,
    pub kind: RelationshipKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in [
            RelationshipKind::ImplementationOf,
            RelationshipKind::TutorialSeries,
            RelationshipKind::CaseStudyOf,
            RelationshipKind::BackgroundResearch,
            RelationshipKind::FollowUp,
            RelationshipKind::Related,
        ] {
            let parsed: RelationshipKind = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn kind_rejects_unknown() {
        assert!("friend_of".parse::<RelationshipKind>().is_err());
    }

    #[test]
    fn related_ref_deserializes_from_yaml() {
        let yaml = "target_type: project\ntarget_id: silan-site\nkind: case_study_of\n";
        let r: RelatedContentRef = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(r.target_type, ContentType::Project);
        assert_eq!(r.target_id, "silan-site");
        assert_eq!(r.kind, RelationshipKind::CaseStudyOf);
    }

    #[test]
    fn related_ref_kind_defaults_to_related() {
        let yaml = "target_type: blog\ntarget_id: hello\n";
        let r: RelatedContentRef = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(r.kind, RelationshipKind::Related);
    }
}
