//! Metric name synthesis
//!
//! Names are built from sanitized segments joined by `_`. The segment right
//! after the namespace always starts with a lowercase letter, so every name
//! is a valid Prometheus metric name without a separate validation step.

use crate::catalog::ServiceType;

/// Prefix of every device metric
pub const METRIC_NAMESPACE: &str = "tr64";

/// Marker TR-064 puts in front of output parameter names
const OUTPUT_PARAMETER_MARKER: &str = "New";

/// How parameter names are turned into metric names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameScheme {
    /// `tr64_<parameter>`; collides across services sharing a parameter name
    Plain,
    /// `tr64_<service>_<version>_<parameter>`
    #[default]
    ServiceQualified,
}

impl std::str::FromStr for NameScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(NameScheme::Plain),
            "qualified" | "service_qualified" => Ok(NameScheme::ServiceQualified),
            other => Err(format!("unknown naming scheme: {other}")),
        }
    }
}

/// Name for one output parameter of an action
pub fn parameter_metric_name(service: &ServiceType, parameter: &str, scheme: NameScheme) -> String {
    let stripped = parameter
        .strip_prefix(OUTPUT_PARAMETER_MARKER)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(parameter);
    build_name(service, stripped, scheme)
}

/// Name for an action that yields a single scalar
pub fn action_metric_name(service: &ServiceType, action: &str, scheme: NameScheme) -> String {
    build_name(service, action, scheme)
}

fn build_name(service: &ServiceType, leaf: &str, scheme: NameScheme) -> String {
    let mut segments = Vec::with_capacity(3);
    if scheme == NameScheme::ServiceQualified {
        segments.push(sanitize_segment(service.short_name()));
        if let Some(version) = service.version() {
            segments.push(sanitize_segment(version));
        }
    }
    segments.push(sanitize_segment(leaf));

    // Only the first segment after the namespace has to start with a letter;
    // versions stay as plain digits.
    if segments[0].starts_with(|c: char| c.is_ascii_digit()) {
        segments[0].insert(0, 'v');
    }

    format!("{METRIC_NAMESPACE}_{}", segments.join("_"))
}

/// Lowercase ASCII alphanumerics, `_` for everything else
fn sanitize_segment(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = replaced.trim_matches('_');

    if trimmed.is_empty() {
        "value".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid_body(name: &str) -> bool {
        let body = match name.strip_prefix("tr64_") {
            Some(body) => body,
            None => return false,
        };
        let mut chars = body.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    #[test]
    fn test_plain_name_strips_marker() {
        let service = ServiceType::new("Svc:1");
        assert_eq!(
            parameter_metric_name(&service, "NewUpTime", NameScheme::Plain),
            "tr64_uptime"
        );
    }

    #[test]
    fn test_qualified_name_includes_service_and_version() {
        let service = ServiceType::new("urn:dslforum-org:service:WANCommonInterfaceConfig:1");
        assert_eq!(
            parameter_metric_name(&service, "NewTotalBytesSent", NameScheme::ServiceQualified),
            "tr64_wancommoninterfaceconfig_1_totalbytessent"
        );
    }

    #[test]
    fn test_non_word_characters_replaced() {
        let service = ServiceType::new("urn:dslforum-org:service:X_AVM-DE_Dect:1");
        assert_eq!(
            parameter_metric_name(&service, "NewX_AVM-DE_NumberOfEntries", NameScheme::ServiceQualified),
            "tr64_x_avm_de_dect_1_x_avm_de_numberofentries"
        );
    }

    #[test]
    fn test_parameter_without_marker_kept_whole() {
        let service = ServiceType::new("Svc:1");
        assert_eq!(
            parameter_metric_name(&service, "Uptime", NameScheme::Plain),
            "tr64_uptime"
        );
        assert_eq!(
            parameter_metric_name(&service, "New", NameScheme::Plain),
            "tr64_new"
        );
    }

    #[test]
    fn test_names_always_valid() {
        let services = ["Svc:1", "A:1:svcone:1", "urn:x:9fancy:2", "", "::", "Ünïcode:1"];
        let params = ["NewUpTime", "New-1stPort", "New__", "NewÄrger", "x", "NewBytes.Sent"];

        for service in services {
            for param in params {
                for scheme in [NameScheme::Plain, NameScheme::ServiceQualified] {
                    let name = parameter_metric_name(&ServiceType::new(service), param, scheme);
                    assert!(is_valid_body(&name), "{name} from {service}/{param}");
                }
            }
        }
    }

    #[test]
    fn test_leading_digit_only_prefixed_after_namespace() {
        let service = ServiceType::new("urn:x:9fancy:2");
        assert_eq!(
            parameter_metric_name(&service, "NewUpTime", NameScheme::ServiceQualified),
            "tr64_v9fancy_2_uptime"
        );

        let service = ServiceType::new("Svc:1");
        assert_eq!(
            parameter_metric_name(&service, "New1stPort", NameScheme::ServiceQualified),
            "tr64_svc_1_1stport"
        );
        assert_eq!(
            parameter_metric_name(&service, "New1stPort", NameScheme::Plain),
            "tr64_v1stport"
        );
    }

    #[test]
    fn test_deterministic() {
        let service = ServiceType::new("urn:dslforum-org:service:DeviceInfo:1");
        let first = parameter_metric_name(&service, "NewUpTime", NameScheme::ServiceQualified);
        let second = parameter_metric_name(&service, "NewUpTime", NameScheme::ServiceQualified);
        assert_eq!(first, second);
    }

    #[test]
    fn test_plain_scheme_collides_across_services() {
        let one = ServiceType::new("A:1:svcone:1");
        let two = ServiceType::new("B:1:svctwo:1");

        assert_eq!(
            parameter_metric_name(&one, "NewBytesSent", NameScheme::Plain),
            parameter_metric_name(&two, "NewBytesSent", NameScheme::Plain)
        );

        let qualified_one = parameter_metric_name(&one, "NewBytesSent", NameScheme::ServiceQualified);
        let qualified_two = parameter_metric_name(&two, "NewBytesSent", NameScheme::ServiceQualified);
        assert_eq!(qualified_one, "tr64_svcone_1_bytessent");
        assert_eq!(qualified_two, "tr64_svctwo_1_bytessent");
    }

    #[test]
    fn test_action_name() {
        let service = ServiceType::new("urn:dslforum-org:service:WANCommonInterfaceConfig:1");
        assert_eq!(
            action_metric_name(&service, "GetTotalBytesSent", NameScheme::ServiceQualified),
            "tr64_wancommoninterfaceconfig_1_gettotalbytessent"
        );
    }

    #[test]
    fn test_name_scheme_from_str() {
        assert_eq!("plain".parse::<NameScheme>(), Ok(NameScheme::Plain));
        assert_eq!("qualified".parse::<NameScheme>(), Ok(NameScheme::ServiceQualified));
        assert!("fancy".parse::<NameScheme>().is_err());
    }
}
