use facet::Facet;

use crate::error::MprovError;

/// Provisioning request read from stdin.
///
/// Sizing values are opaque strings passed through to `multipass launch`
/// verbatim (`mem` and `disk` accept multipass size syntax like `"2G"`).
#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct ProvisionRequest {
    pub name: String,
    pub mem: String,
    pub disk: String,
    pub cpu: String,
    /// Cloud-init user-data document, written verbatim to the launch's
    /// `--cloud-init` file.
    pub init: String,
    #[facet(default)]
    pub image: Option<String>,
}

impl ProvisionRequest {
    /// Parse and validate a request document.
    pub fn from_json(input: &str) -> Result<Self, MprovError> {
        let request: ProvisionRequest =
            facet_json::from_str(input).map_err(|e| MprovError::InvalidRequest {
                message: e.to_string(),
            })?;
        request.validate()?;
        Ok(request)
    }

    /// The image to launch: the request's, or the configured default.
    pub fn image_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.image.as_deref().unwrap_or(default)
    }

    fn validate(&self) -> Result<(), MprovError> {
        for (field, value) in [
            ("name", &self.name),
            ("mem", &self.mem),
            ("disk", &self.disk),
            ("cpu", &self.cpu),
            ("init", &self.init),
        ] {
            if value.is_empty() {
                return Err(MprovError::InvalidRequest {
                    message: format!("field '{field}' is required and must not be empty"),
                });
            }
        }
        Ok(())
    }
}

/// The descriptor printed to stdout: the VM as the hypervisor reports it.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct VmDescriptor {
    pub name: String,
    /// First IPv4 address reported for the VM, or empty when the record
    /// carries no address yet (e.g. a stopped VM).
    pub ip: String,
    pub release: String,
    pub state: String,
}

impl VmDescriptor {
    pub fn to_json(&self) -> String {
        facet_json::to_string(self).expect("JSON serialization")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_request() {
        let request = ProvisionRequest::from_json(
            r##"{"name":"dev1","mem":"2G","disk":"10G","cpu":"2","init":"#cloud-config\n","image":"24.04"}"##,
        )
        .unwrap();
        assert_eq!(request.name, "dev1");
        assert_eq!(request.mem, "2G");
        assert_eq!(request.disk, "10G");
        assert_eq!(request.cpu, "2");
        assert_eq!(request.init, "#cloud-config\n");
        assert_eq!(request.image.as_deref(), Some("24.04"));
    }

    #[test]
    fn omitted_image_defaults() {
        let request = ProvisionRequest::from_json(
            r##"{"name":"dev1","mem":"2G","disk":"10G","cpu":"2","init":"#cloud-config\n"}"##,
        )
        .unwrap();
        assert!(request.image.is_none());
        assert_eq!(request.image_or("22.04"), "22.04");
    }

    #[test]
    fn explicit_image_wins_over_default() {
        let request = ProvisionRequest::from_json(
            r#"{"name":"dev1","mem":"2G","disk":"10G","cpu":"2","init":"x","image":"24.04"}"#,
        )
        .unwrap();
        assert_eq!(request.image_or("22.04"), "24.04");
    }

    #[test]
    fn malformed_json_is_invalid_request() {
        let err = ProvisionRequest::from_json("{not json").unwrap_err();
        assert!(matches!(err, MprovError::InvalidRequest { .. }));
    }

    #[test]
    fn missing_required_field_rejected() {
        // No "init" field
        let err = ProvisionRequest::from_json(r#"{"name":"dev1","mem":"2G","disk":"10G","cpu":"2"}"#)
            .unwrap_err();
        assert!(matches!(err, MprovError::InvalidRequest { .. }));
    }

    #[test]
    fn empty_name_rejected() {
        let err = ProvisionRequest::from_json(
            r#"{"name":"","mem":"2G","disk":"10G","cpu":"2","init":"x"}"#,
        )
        .unwrap_err();
        let MprovError::InvalidRequest { message } = err else {
            panic!("expected InvalidRequest");
        };
        assert!(message.contains("name"));
    }

    #[test]
    fn descriptor_serializes_all_fields() {
        let descriptor = VmDescriptor {
            name: "dev1".into(),
            ip: "10.0.0.5".into(),
            release: "22.04".into(),
            state: "Running".into(),
        };
        let json = descriptor.to_json();
        assert!(json.contains("\"name\""));
        assert!(json.contains("\"10.0.0.5\""));
        assert!(json.contains("\"release\""));
        assert!(json.contains("\"Running\""));
    }
}
