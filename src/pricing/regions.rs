use crate::config::RegionOverride;
use std::collections::HashMap;

/// Location labels used by the pricing catalog and the region codes they stand for
const BUILTIN_REGIONS: &[(&str, &str)] = &[
    ("Africa (Cape Town)", "af-south-1"),
    ("Asia Pacific (Hong Kong)", "ap-east-1"),
    ("Asia Pacific (Tokyo)", "ap-northeast-1"),
    ("Asia Pacific (Seoul)", "ap-northeast-2"),
    ("Asia Pacific (Osaka)", "ap-northeast-3"),
    ("Asia Pacific (Mumbai)", "ap-south-1"),
    ("Asia Pacific (Hyderabad)", "ap-south-2"),
    ("Asia Pacific (Singapore)", "ap-southeast-1"),
    ("Asia Pacific (Sydney)", "ap-southeast-2"),
    ("Asia Pacific (Jakarta)", "ap-southeast-3"),
    ("Asia Pacific (Melbourne)", "ap-southeast-4"),
    ("Canada (Central)", "ca-central-1"),
    ("Canada West (Calgary)", "ca-west-1"),
    ("EU (Frankfurt)", "eu-central-1"),
    ("EU (Zurich)", "eu-central-2"),
    ("EU (Stockholm)", "eu-north-1"),
    ("EU (Milan)", "eu-south-1"),
    ("EU (Spain)", "eu-south-2"),
    ("EU (Ireland)", "eu-west-1"),
    ("EU (London)", "eu-west-2"),
    ("EU (Paris)", "eu-west-3"),
    ("Israel (Tel Aviv)", "il-central-1"),
    ("Middle East (UAE)", "me-central-1"),
    ("Middle East (Bahrain)", "me-south-1"),
    ("South America (Sao Paulo)", "sa-east-1"),
    ("US East (N. Virginia)", "us-east-1"),
    ("US East (Ohio)", "us-east-2"),
    ("US West (N. California)", "us-west-1"),
    ("US West (Oregon)", "us-west-2"),
    ("AWS GovCloud (US-East)", "us-gov-east-1"),
    ("AWS GovCloud (US)", "us-gov-west-1"),
    ("AWS GovCloud (US-West)", "us-gov-west-1"),
];

/// Read-only lookup from catalog location label to region code.
///
/// Built once at startup and shared by every fetch cycle.
#[derive(Debug, Clone)]
pub struct RegionNameIndex {
    by_label: HashMap<String, String>,
}

impl RegionNameIndex {
    /// Index with the built-in labels, overlaid by `extra` (label -> code)
    pub fn with_overrides(extra: &[RegionOverride]) -> Self {
        let mut by_label: HashMap<String, String> = BUILTIN_REGIONS
            .iter()
            .map(|(label, code)| (label.to_string(), code.to_string()))
            .collect();
        by_label.extend(
            extra
                .iter()
                .map(|entry| (entry.label.clone(), entry.code.clone())),
        );
        Self { by_label }
    }

    pub fn resolve(&self, label: &str) -> Option<&str> {
        self.by_label.get(label).map(String::as_str)
    }

}

impl Default for RegionNameIndex {
    fn default() -> Self {
        Self::with_overrides(&[])
    }
}
