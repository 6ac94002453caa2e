use serde::{Deserialize, Serialize};

/// Entry of the participant -> implementing class registry kept on a dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticipantClassBinding {
    pub participant_name: String,
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassOrigin {
    /// Authored in content scripts. Preferred when auto-binding.
    #[default]
    Script,
    Native,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassValueType {
    #[default]
    Bool,
    Int,
    Float,
    Name,
    Text,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassProperty {
    pub name: String,
    pub value_type: ClassValueType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticipantClass {
    pub name: String,
    pub participant_name: String,
    pub origin: ClassOrigin,
    pub properties: Vec<ClassProperty>,
    pub functions: Vec<String>,
}

impl ParticipantClass {
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|property| property.name == name)
    }
}

/// Every class known to implement the participant contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticipantClassCatalog {
    pub classes: Vec<ParticipantClass>,
}

impl ParticipantClassCatalog {
    pub fn new(classes: Vec<ParticipantClass>) -> Self {
        Self { classes }
    }

    pub fn class(&self, name: &str) -> Option<&ParticipantClass> {
        self.classes.iter().find(|class| class.name == name)
    }

    /// Classes borrow from the catalog, not from `participant_name`.
    pub fn candidates<'a, 'b>(
        &'a self,
        participant_name: &'b str,
        origin: ClassOrigin,
    ) -> impl Iterator<Item = &'a ParticipantClass> + 'b
    where
        'a: 'b,
    {
        self.classes.iter().filter(move |class| {
            class.origin == origin && class.participant_name == participant_name
        })
    }

    /// Script classes first, native as last resort. Ambiguity at a level leaves it unresolved.
    pub fn unique_candidate(&self, participant_name: &str) -> Option<&ParticipantClass> {
        for origin in [ClassOrigin::Script, ClassOrigin::Native] {
            let mut candidates = self.candidates(participant_name, origin);
            if let (Some(first), None) = (candidates.next(), candidates.next()) {
                return Some(first);
            }
        }
        None
    }
}

#[cfg(test)]
mod participants_tests {
    use super::*;

    fn class(name: &str, participant: &str, origin: ClassOrigin) -> ParticipantClass {
        ParticipantClass {
            name: name.to_string(),
            participant_name: participant.to_string(),
            origin,
            ..ParticipantClass::default()
        }
    }

    #[test]
    fn unique_candidate_prefers_script_then_native() {
        let catalog = ParticipantClassCatalog::new(vec![
            class("GuardNative", "Guard", ClassOrigin::Native),
            class("GuardScript", "Guard", ClassOrigin::Script),
            class("MerchantNative", "Merchant", ClassOrigin::Native),
        ]);
        assert_eq!(
            catalog.unique_candidate("Guard").map(|c| c.name.as_str()),
            Some("GuardScript")
        );
        assert_eq!(
            catalog.unique_candidate("Merchant").map(|c| c.name.as_str()),
            Some("MerchantNative")
        );
        assert!(catalog.unique_candidate("Player").is_none());
    }

    #[test]
    fn resolved_class_outlives_the_queried_name() {
        let catalog = ParticipantClassCatalog::new(vec![
            class("GuardScript", "Guard", ClassOrigin::Script),
            class("GuardNative", "Guard", ClassOrigin::Native),
        ]);
        let resolved = {
            let name = format!("{}{}", "Gua", "rd");
            catalog.unique_candidate(&name)
        };
        assert_eq!(resolved.map(|c| c.name.as_str()), Some("GuardScript"));

        let natives: Vec<&ParticipantClass> = {
            let name = String::from("Guard");
            catalog.candidates(&name, ClassOrigin::Native).collect()
        };
        assert_eq!(natives.len(), 1);
        assert_eq!(natives[0].name, "GuardNative");
    }

    #[test]
    fn ambiguous_script_candidates_fall_through_to_native() {
        let catalog = ParticipantClassCatalog::new(vec![
            class("A", "Guard", ClassOrigin::Script),
            class("B", "Guard", ClassOrigin::Script),
        ]);
        assert!(catalog.unique_candidate("Guard").is_none());

        let catalog = ParticipantClassCatalog::new(vec![
            class("A", "Guard", ClassOrigin::Script),
            class("B", "Guard", ClassOrigin::Script),
            class("C", "Guard", ClassOrigin::Native),
        ]);
        assert_eq!(
            catalog.unique_candidate("Guard").map(|c| c.name.as_str()),
            Some("C")
        );
    }
}
