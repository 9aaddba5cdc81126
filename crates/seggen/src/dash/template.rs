use std::sync::LazyLock;

use regex::{Captures, Regex};

// `$Name$` or `$Name%0<width>d$`, the only format tag DASH-IF IOP allows.
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(RepresentationID|Number|Time|Bandwidth)(?:%0(\d+)d)?\$")
        .expect("identifier regex is valid")
});

/// Values of the `SegmentTemplate` identifiers of one representation.
///
/// Identifiers without a value are left in the output untouched.
#[derive(Debug, Clone, Default)]
pub struct TemplateParams {
    pub representation_id: Option<String>,
    pub bandwidth: Option<u64>,
    pub number: Option<u64>,
    pub time: Option<u64>,
}

impl TemplateParams {
    pub fn fill(&self, template: &str) -> String {
        IDENTIFIER
            .replace_all(template, |caps: &Captures<'_>| {
                let value = match &caps[1] {
                    "RepresentationID" => self.representation_id.clone(),
                    "Bandwidth" => self.bandwidth.map(|v| v.to_string()),
                    "Number" => self.number.map(|v| v.to_string()),
                    "Time" => self.time.map(|v| v.to_string()),
                    _ => None,
                };
                match (value, caps.get(2)) {
                    (None, _) => caps[0].to_string(),
                    (Some(value), None) => value,
                    (Some(value), Some(width)) => {
                        let width = width.as_str().parse::<usize>().unwrap_or(0);
                        format!("{value:0>width$}")
                    }
                }
            })
            .into_owned()
    }
}
