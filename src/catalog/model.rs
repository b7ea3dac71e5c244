use serde::{Deserialize, Serialize};

/// One hit of a dataset search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl DatasetSummary {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }
}

/// Full dataset detail, immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Dataset {
    /// Description cut to `max_chars` characters, with `...` when cut.
    pub fn summary(&self, max_chars: usize) -> String {
        let notes = self.notes.as_deref().unwrap_or("");
        if notes.chars().count() > max_chars {
            let cut: String = notes.chars().take(max_chars).collect();
            format!("{cut}...")
        } else {
            notes.to_string()
        }
    }
}

/// One tabular artifact of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    /// The catalog sometimes sends `null` here.
    #[serde(default)]
    pub datastore_active: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Resource {
    pub fn is_datastore_active(&self) -> bool {
        self.datastore_active.unwrap_or(false)
    }

    /// Declared format, upper-cased; empty when missing.
    pub fn format_upper(&self) -> String {
        self.format.as_deref().unwrap_or("").to_ascii_uppercase()
    }

    /// Direct URL, ignoring blank strings.
    pub fn download_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// `name | FORMAT | DataStore yes/no`, falling back to the id for the name.
    pub fn label(&self) -> String {
        let name = self
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id);
        let store = if self.is_datastore_active() { "yes" } else { "no" };
        format!("{name} | {} | DataStore {store}", self.format_upper())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_tolerates_null_and_missing_fields() {
        let res: Resource = serde_json::from_value(json!({
            "id": "r1",
            "name": null,
            "format": "csv",
            "datastore_active": null
        }))
        .unwrap();

        assert!(!res.is_datastore_active());
        assert_eq!(res.format_upper(), "CSV");
        assert_eq!(res.download_url(), None);
        assert_eq!(res.label(), "r1 | CSV | DataStore no");
    }

    #[test]
    fn summary_truncates_on_char_boundaries() {
        let ds = Dataset {
            id: "d".into(),
            title: None,
            notes: Some("producción".repeat(100)),
            resources: vec![],
        };
        let s = ds.summary(900);
        assert!(s.ends_with("..."));
        assert_eq!(s.chars().count(), 903);

        let short = Dataset { notes: Some("egresos".into()), ..ds };
        assert_eq!(short.summary(900), "egresos");
    }
}
