//! # Chart Metadata
//!
//! The descriptive record read from a chart's `Chart.yaml`. Provenance treats
//! it as pass-through data: it is embedded in the message block at signing
//! time and parsed back out at verification time, never validated.
//!
//! Deserialization is lenient. Every field defaults when absent and unknown
//! fields are ignored, so attestations written by newer tools still parse.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Chart manifest metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    /// Chart name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Project home page URL.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub home: String,
    /// Source code URLs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    /// SemVer chart version.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    /// One-line description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Search keywords.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Chart maintainers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<Maintainer>,
    /// Template engine name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub engine: String,
    /// Icon URL.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon: String,
    /// Chart API version.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    /// Version of the packaged application.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app_version: String,
    /// Whether the chart is deprecated.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Free-form annotations.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// A chart maintainer entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Maintainer {
    /// Maintainer name.
    pub name: String,
    /// Contact email.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// Personal or organization URL.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl Metadata {
    /// Parse a `Chart.yaml` document.
    pub fn from_yaml(data: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chart_yaml_with_camel_case_fields() {
        let yaml = "\
name: hello
version: 0.1.0
description: A Helm chart
appVersion: \"1.0\"
apiVersion: v1
keywords:
  - web
maintainers:
  - name: Jane
    email: jane@example.com
";
        let md = Metadata::from_yaml(yaml).unwrap();
        assert_eq!(md.name, "hello");
        assert_eq!(md.version, "0.1.0");
        assert_eq!(md.app_version, "1.0");
        assert_eq!(md.api_version, "v1");
        assert_eq!(md.keywords, vec!["web"]);
        assert_eq!(md.maintainers[0].email, "jane@example.com");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let md = Metadata::from_yaml("name: x\ntillerVersion: \">2.0\"\nkubeVersion: \">=1.10\"\n")
            .unwrap();
        assert_eq!(md.name, "x");
    }

    #[test]
    fn empty_fields_are_not_serialized() {
        let md = Metadata {
            name: "hello".to_string(),
            version: "0.1.0".to_string(),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&md).unwrap();
        assert_eq!(yaml, "name: hello\nversion: 0.1.0\n");
    }
}
