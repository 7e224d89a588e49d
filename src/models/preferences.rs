use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::fmt;

/// Answer to a single questionnaire question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multiple(Vec<String>),
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Single(value) => write!(f, "{}", value),
            Answer::Multiple(values) => write!(f, "{}", values.join(", ")),
        }
    }
}

/// Ordered mapping from question title to answer
///
/// The set of keys comes from the questionnaire and is opaque here: entries are
/// stored, replaced and rendered but never interpreted. Serializes as a JSON
/// object in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    entries: Vec<(String, Answer)>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the answer for a title, keeping the title's original position
    pub fn insert(&mut self, title: impl Into<String>, answer: Answer) {
        let title = title.into();
        if let Some(existing) = self.entries.iter_mut().find(|(t, _)| *t == title) {
            existing.1 = answer;
        } else {
            self.entries.push((title, answer));
        }
    }

    pub fn get(&self, title: &str) -> Option<&Answer> {
        self.entries
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, answer)| answer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.entries.iter().map(|(t, a)| (t.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Renders as `Title: answer; Title: a, b` for prompt construction
impl fmt::Display for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (title, answer)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", title, answer)?;
        }
        Ok(())
    }
}

impl Serialize for Preferences {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (title, answer) in &self.entries {
            map.serialize_entry(title, answer)?;
        }
        map.end()
    }
}

struct PreferencesVisitor;

impl<'de> Visitor<'de> for PreferencesVisitor {
    type Value = Preferences;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of question titles to answers")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut preferences = Preferences::new();
        while let Some((title, answer)) = access.next_entry::<String, Answer>()? {
            preferences.insert(title, answer);
        }
        Ok(preferences)
    }
}

impl<'de> Deserialize<'de> for Preferences {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PreferencesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Preferences {
        let mut prefs = Preferences::new();
        prefs.insert("Travel Duration", Answer::Single("4-7 days".to_string()));
        prefs.insert(
            "Interests",
            Answer::Multiple(vec!["Party".to_string(), "Adventure".to_string()]),
        );
        prefs
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut prefs = sample();
        prefs.insert("Travel Duration", Answer::Single("1-3 days".to_string()));

        assert_eq!(prefs.len(), 2);
        let titles: Vec<&str> = prefs.iter().map(|(t, _)| t).collect();
        assert_eq!(titles, vec!["Travel Duration", "Interests"]);
        assert_eq!(
            prefs.get("Travel Duration"),
            Some(&Answer::Single("1-3 days".to_string()))
        );
    }

    #[test]
    fn test_display_for_prompt() {
        assert_eq!(
            sample().to_string(),
            "Travel Duration: 4-7 days; Interests: Party, Adventure"
        );
    }

    #[test]
    fn test_json_preserves_order() {
        let json = r#"{"Zeta":"a","Alpha":["b","c"],"Mid":"d"}"#;
        let prefs: Preferences = serde_json::from_str(json).unwrap();

        let titles: Vec<&str> = prefs.iter().map(|(t, _)| t).collect();
        assert_eq!(titles, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(serde_json::to_string(&prefs).unwrap(), json);
    }

    #[test]
    fn test_rejects_non_string_answers() {
        assert!(serde_json::from_str::<Preferences>(r#"{"Budget": 500}"#).is_err());
        assert!(serde_json::from_str::<Preferences>(r#"["Budget"]"#).is_err());
    }
}
