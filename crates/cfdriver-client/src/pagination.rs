//! List envelopes and filter parameters.

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// A v3 list page.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Page<T> {
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub resources: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub next: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

/// A v2 list page; `next_url` is relative to the API root.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct V2Page<T> {
    #[serde(default)]
    pub next_url: Option<String>,
    #[serde(default)]
    pub resources: Vec<T>,
}

/// Query string for list endpoints.
///
/// v3 filters take comma-separated values (`names=a,b`); v2 filters are
/// repeated `q=field:value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(&'static str, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter<I, S>(mut self, key: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((key, joined));
        self
    }

    pub fn names(self, name: &str) -> Self {
        self.filter("names", [name])
    }

    pub fn guids(self, guid: &str) -> Self {
        self.filter("guids", [guid])
    }

    pub fn space_guids(self, guid: &str) -> Self {
        self.filter("space_guids", [guid])
    }

    pub fn organization_guids(self, guid: &str) -> Self {
        self.filter("organization_guids", [guid])
    }

    pub fn service_offering_guids(self, guid: &str) -> Self {
        self.filter("service_offering_guids", [guid])
    }

    pub fn service_broker_guids(self, guid: &str) -> Self {
        self.filter("service_broker_guids", [guid])
    }

    pub fn service_instance_guids(self, guid: &str) -> Self {
        self.filter("service_instance_guids", [guid])
    }

    pub fn route_guids(self, guid: &str) -> Self {
        self.filter("route_guids", [guid])
    }

    pub fn types(self, kind: &str) -> Self {
        self.filter("type", [kind])
    }

    /// v2 `q=field:value` filter.
    pub fn q(mut self, field: &str, value: &str) -> Self {
        self.params.push(("q", format!("{field}:{value}")));
        self
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v3_filters() {
        let q = Query::new()
            .names("my-app")
            .filter("space_guids", ["s1", "s2"]);
        assert_eq!(
            q.pairs(),
            &[
                ("names", "my-app".to_string()),
                ("space_guids", "s1,s2".to_string())
            ]
        );
    }

    #[test]
    fn test_v2_filters_repeat() {
        let q = Query::new().q("name", "db").q("space_guid", "s1");
        assert_eq!(
            q.pairs(),
            &[
                ("q", "name:db".to_string()),
                ("q", "space_guid:s1".to_string())
            ]
        );
    }

    // No `Default` impl: the page envelope must not require one.
    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_pages_of_non_default_items() {
        let page: Page<Named> = serde_json::from_str(
            r#"{"pagination":{"total_results":1,"next":{"href":"https://api/v3/apps?page=2"}},"resources":[{"name":"web"}]}"#,
        )
        .unwrap();
        assert_eq!(page.resources[0].name, "web");
        assert_eq!(page.pagination.next.unwrap().href, "https://api/v3/apps?page=2");

        let empty: Page<Named> = serde_json::from_str(r#"{"pagination":{}}"#).unwrap();
        assert!(empty.resources.is_empty());

        let v2: V2Page<Named> =
            serde_json::from_str(r#"{"next_url":null,"resources":[{"name":"db"}]}"#).unwrap();
        assert_eq!(v2.resources[0].name, "db");
        assert!(v2.next_url.is_none());
    }

    #[test]
    fn test_page_defaults() {
        let page: Page<serde_json::Value> = serde_json::from_str("{}").unwrap();
        assert!(page.resources.is_empty());
        assert!(page.pagination.next.is_none());
    }
}
