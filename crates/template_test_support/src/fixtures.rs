//! TOML golden fixtures for the parser.
//!
//! ```toml
//! format = "template-parse-v1"
//!
//! [[case]]
//! name = "attribute holes"
//! segments = ["<a href=", ">x</a>"]
//! expect = ["#root slots=1", "  <a href=${0}>", "    \"x\""]
//!
//! [[case]]
//! name = "unclosed"
//! segments = ["<div>"]
//! error = "unclosed element <div>"
//! ```
//!
//! A case carries exactly one of `expect` (AST snapshot lines) or `error`
//! (a substring of the error's `Display`).

use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const PARSE_FIXTURES_FORMAT_V1: &str = "template-parse-v1";

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    #[default]
    Active,
    Skip,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ParseCase {
    pub name: String,
    pub segments: Vec<String>,
    #[serde(default)]
    pub expect: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status: FixtureStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct ParseManifest {
    format: String,
    #[serde(rename = "case", default)]
    cases: Vec<ParseCase>,
}

pub fn load_parse_cases(path: &Path) -> Vec<ParseCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read parse fixtures {path:?}: {err}"));
    let manifest: ParseManifest = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse fixture TOML {path:?}: {err}"));
    assert_eq!(
        manifest.format, PARSE_FIXTURES_FORMAT_V1,
        "unsupported parse fixture format in {path:?}"
    );
    validate(&manifest.cases, path);
    manifest.cases
}

fn validate(cases: &[ParseCase], path: &Path) {
    let mut names = std::collections::BTreeSet::new();
    for case in cases {
        if !names.insert(case.name.as_str()) {
            panic!("duplicate case name '{}' in {path:?}", case.name);
        }
        if case.expect.is_some() == case.error.is_some() {
            panic!(
                "case '{}' must set exactly one of expect/error in {path:?}",
                case.name
            );
        }
        match case.status {
            FixtureStatus::Active if case.reason.is_some() => {
                panic!("case '{}' has reason but is not skipped in {path:?}", case.name);
            }
            FixtureStatus::Skip if case.reason.as_deref().unwrap_or("").is_empty() => {
                panic!("skipped case '{}' is missing a reason in {path:?}", case.name);
            }
            _ => {}
        }
    }
}
