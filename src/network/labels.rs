use serde::{Deserialize, Serialize};

/// Ordered class names; index `i` names the class of logit `i`.
///
/// Kept apart from the numeric engine: a caller that only needs class
/// indices never touches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> LabelSet {
        LabelSet { labels: labels.into_iter().map(Into::into).collect() }
    }

    /// The ten monkey species the bundled parameter files were trained on.
    pub fn monkeys() -> LabelSet {
        LabelSet::new([
            "Emperor Tamarin",
            "Gray Langur",
            "Hamadryas Baboon",
            "Proboscis Monkey",
            "Vervet Monkey",
            "Golden Monkey",
            "Mandril",
            "Bald Uakari",
            "White Faced Saki",
            "Red Howler",
        ])
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Reads a JSON array of strings.
    pub fn load_json(path: &str) -> std::io::Result<LabelSet> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::LabelSet;

    #[test]
    fn monkeys_are_ordered() {
        let labels = LabelSet::monkeys();
        assert_eq!(labels.len(), 10);
        assert_eq!(labels.get(0), Some("Emperor Tamarin"));
        assert_eq!(labels.get(9), Some("Red Howler"));
        assert_eq!(labels.get(10), None);
        assert_eq!(labels.get(6), Some("Mandril"));
    }

    #[test]
    fn serializes_as_plain_array() {
        let labels = LabelSet::new(["a", "b"]);
        assert_eq!(serde_json::to_string(&labels).unwrap(), r#"["a","b"]"#);
    }
}
