//! Core data model shared by every component in the pipeline: the shape a
//! channel scraper or plugin hands back, the shape the orchestrator hands to
//! a caller.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single hit returned by a channel scraper or plugin.
///
/// `datetime` stands in for the distilled spec's "timestamp; may be
/// zero/absent": `None` is the zero value, `Some(_)` is a real timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub unique_id: String,
    pub title: String,
    #[serde(default)]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub links: Vec<Link>,
    pub source_tag: String,
    /// Opaque fields carried verbatim; never interpreted by this crate.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    pub fn has_nonzero_datetime(&self) -> bool {
        self.datetime.is_some()
    }
}

/// Closed enumeration of storage providers a [`Link`] may point at. Unknown
/// wire values bucket as [`StorageType::Others`] rather than failing to
/// deserialize — the grouper treats the tag as opaque either way.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StorageType {
    Baidu,
    Aliyun,
    Quark,
    Xunlei,
    Tianyi,
    Uc,
    Mobile,
    Pan115,
    Pan123,
    Magnet,
    Ed2k,
    Others(String),
}

impl StorageType {
    /// The wire tag, matching the value this crate serializes and groups by.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Baidu => "baidu",
            Self::Aliyun => "aliyun",
            Self::Quark => "quark",
            Self::Xunlei => "xunlei",
            Self::Tianyi => "tianyi",
            Self::Uc => "uc",
            Self::Mobile => "mobile",
            Self::Pan115 => "115",
            Self::Pan123 => "123",
            Self::Magnet => "magnet",
            Self::Ed2k => "ed2k",
            Self::Others(tag) => tag,
        }
    }
}

impl From<&str> for StorageType {
    fn from(tag: &str) -> Self {
        match tag {
            "baidu" => Self::Baidu,
            "aliyun" => Self::Aliyun,
            "quark" => Self::Quark,
            "xunlei" => Self::Xunlei,
            "tianyi" => Self::Tianyi,
            "uc" => Self::Uc,
            "mobile" => Self::Mobile,
            "115" => Self::Pan115,
            "123" => Self::Pan123,
            "magnet" => Self::Magnet,
            "ed2k" => Self::Ed2k,
            other => Self::Others(other.to_string()),
        }
    }
}

impl Serialize for StorageType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StorageType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(StorageType::from(tag.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub url: String,
    pub storage_type: StorageType,
    #[serde(default)]
    pub password: Option<String>,
}

/// Which of `results` / `merged_by_type` a [`SearchResponse`] should
/// populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    All,
    Results,
    MergedByType,
}

impl ViewMode {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "results" => Self::Results,
            "merged_by_type" => Self::MergedByType,
            _ => Self::All,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SearchResponse {
    pub total: usize,
    pub results: Vec<SearchResult>,
    pub merged_by_type: BTreeMap<String, Vec<Link>>,
}
