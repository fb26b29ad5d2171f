//! API inbound policy document (`apiPolicyHeaders.xml`).
//!
//! The generated policy routes the API to a named backend and overrides a
//! list of request headers. The `backend`, `outbound` and `on-error` sections
//! only inherit the parent scope.

use regex::Regex;

use super::HeaderSetting;

/// Inbound policy bound to one backend id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundPolicy {
    /// Value of `set-backend-service/@backend-id`
    pub backend_id: String,
    /// `set-header` entries, rendered with `exists-action="override"`
    pub headers: Vec<HeaderSetting>,
}

impl InboundPolicy {
    /// Create a policy routing to `backend_id` with the given header overrides.
    pub fn new(backend_id: impl Into<String>, headers: Vec<HeaderSetting>) -> Self {
        Self {
            backend_id: backend_id.into(),
            headers,
        }
    }

    /// Render the policy as tab-indented XML.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<policies>\n");
        xml.push_str("\t<inbound>\n");
        xml.push_str("\t\t<base />\n");
        xml.push_str(&format!(
            "\t\t<set-backend-service backend-id=\"{}\" />\n",
            escape_xml(&self.backend_id)
        ));
        for header in &self.headers {
            xml.push_str(&format!(
                "\t\t<set-header name=\"{}\" exists-action=\"override\">\n",
                escape_xml(&header.name)
            ));
            xml.push_str(&format!("\t\t\t<value>{}</value>\n", escape_xml(&header.value)));
            xml.push_str("\t\t</set-header>\n");
        }
        xml.push_str("\t</inbound>\n");
        for section in ["backend", "outbound", "on-error"] {
            xml.push_str(&format!("\t<{section}>\n\t\t<base />\n\t</{section}>\n"));
        }
        xml.push_str("</policies>\n");
        xml
    }
}

/// Extract the `backend-id` of the first `set-backend-service` element.
///
/// Returns `None` when the policy does not route to a named backend.
pub fn extract_backend_id(policy_xml: &str) -> Option<String> {
    let re = Regex::new(r#"<set-backend-service\b[^>]*?\bbackend-id\s*=\s*["']([^"']*)["']"#)
        .ok()?;
    let id = re.captures(policy_xml)?.get(1)?.as_str();
    if id.is_empty() { None } else { Some(unescape_xml(id)) }
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_xml_layout() {
        let policy = InboundPolicy::new(
            "svc-a",
            vec![HeaderSetting {
                name: "X-Env".to_string(),
                value: "dev".to_string(),
            }],
        );
        let xml = policy.to_xml();
        assert!(xml.starts_with("<policies>\n\t<inbound>\n\t\t<base />\n"));
        assert!(xml.contains("<set-backend-service backend-id=\"svc-a\" />"));
        assert!(xml.contains("<set-header name=\"X-Env\" exists-action=\"override\">"));
        assert!(xml.contains("<value>dev</value>"));
        assert!(xml.contains("\t<on-error>\n\t\t<base />\n\t</on-error>\n"));
        assert!(xml.ends_with("</policies>\n"));
    }

    #[test]
    fn test_to_xml_escapes_values() {
        let policy = InboundPolicy::new(
            "a&b",
            vec![HeaderSetting {
                name: "X-Q".to_string(),
                value: "<\"x\">".to_string(),
            }],
        );
        let xml = policy.to_xml();
        assert!(xml.contains("backend-id=\"a&amp;b\""));
        assert!(xml.contains("<value>&lt;&quot;x&quot;&gt;</value>"));
    }

    #[test]
    fn test_extract_backend_id_from_remote_policy() {
        let remote = r#"<policies>
  <inbound>
    <base />
    <set-backend-service id="apim-generated-policy" backend-id="svc-a" />
  </inbound>
</policies>"#;
        assert_eq!(extract_backend_id(remote), Some("svc-a".to_string()));
    }

    #[test]
    fn test_extract_backend_id_round_trips_rendered_policy() {
        let xml = InboundPolicy::new("orders&co", Vec::new()).to_xml();
        assert_eq!(extract_backend_id(&xml), Some("orders&co".to_string()));
    }

    #[test]
    fn test_extract_backend_id_absent() {
        let remote = "<policies><inbound><base /><set-backend-service base-url=\"https://x\" /></inbound></policies>";
        assert_eq!(extract_backend_id(remote), None);
        assert_eq!(extract_backend_id(""), None);
    }
}
