//! Elastic IP addresses.
use std::collections::BTreeMap;

use crate::{
    self as pangea,
    cost,
    schema::enumerated,
    validators::{ipv4_address, Consistency},
    Attributes, Outputs, Resource, Result,
};

enumerated! {
    pub enum Domain {
        Vpc => "vpc",
        Standard => "standard",
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Eip {
    pub domain: Domain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associate_with_private_ip: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl Default for Eip {
    fn default() -> Self {
        Eip {
            domain: Domain::Vpc,
            instance: None,
            network_interface: None,
            associate_with_private_ip: None,
            tags: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct EipOutputs {
    pub id: String,
    pub allocation_id: String,
    pub association_id: String,
    pub public_ip: String,
    pub public_dns: String,
    pub private_ip: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EipComputed {
    pub is_attached: bool,
    pub estimated_monthly_cost: f64,
}

impl Resource for Eip {
    const TYPE: &'static str = "aws_eip";

    type Outputs = EipOutputs;
    type Computed = EipComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(Eip {
            domain: attrs.or_default("domain", Domain::Vpc)?,
            instance: attrs.optional("instance")?,
            network_interface: attrs.optional("network_interface")?,
            associate_with_private_ip: attrs
                .optional_with("associate_with_private_ip", ipv4_address())?,
            tags: attrs.tags()?,
        })
    }

    fn validate(&self) -> Result<()> {
        let check = Consistency::of(Self::TYPE, self)?;
        check.at_most_one_of(&[
            ("instance", self.instance.is_some()),
            ("network_interface", self.network_interface.is_some()),
        ])?;
        check.requires(
            (
                "associate_with_private_ip",
                self.associate_with_private_ip.is_some(),
            ),
            ("network_interface", self.network_interface.is_some()),
        )
    }

    fn computed(&self) -> EipComputed {
        EipComputed {
            is_attached: self.instance.is_some() || self.network_interface.is_some(),
            estimated_monthly_cost: cost::monthly(cost::PUBLIC_IPV4_HOURLY, 1),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn unattached_address() {
        let eip = Eip::from_input(&json!({})).unwrap();
        assert_eq!(Eip::default(), eip);
        assert_eq!(
            EipComputed {
                is_attached: false,
                estimated_monthly_cost: 3.65,
            },
            eip.computed()
        );
    }

    #[test]
    fn instance_or_interface() {
        let err = Eip::from_input(&json!({
            "instance": "i-1",
            "network_interface": "eni-1",
        }))
        .unwrap_err();
        assert!(err.is_consistency_violation());
        assert_eq!(vec!["instance", "network_interface"], err.fields());
    }

    #[test]
    fn private_ip_needs_an_interface() {
        let err = Eip::from_input(&json!({ "associate_with_private_ip": "10.0.0.12" }))
            .unwrap_err();
        assert!(err.is_consistency_violation());

        let eip = Eip::from_input(&json!({
            "network_interface": "eni-1",
            "associate_with_private_ip": "10.0.0.12",
        }))
        .unwrap();
        assert!(eip.computed().is_attached);
    }
}
