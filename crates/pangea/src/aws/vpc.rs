//! VPC infrastructure.
use std::collections::BTreeMap;

use crate::{
    self as pangea,
    schema::enumerated,
    validators::{cidr_block_sized, Consistency, Ipv4Cidr},
    Attributes, Outputs, Resource, Result,
};

enumerated! {
    pub enum Tenancy {
        Default => "default",
        Dedicated => "dedicated",
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Vpc {
    pub cidr_block: String,
    pub instance_tenancy: Tenancy,
    pub enable_dns_support: bool,
    pub enable_dns_hostnames: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct VpcOutputs {
    pub id: String,
    pub arn: String,
    pub cidr_block: String,
    pub default_security_group_id: String,
    pub default_route_table_id: String,
    pub main_route_table_id: String,
    pub owner_id: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VpcComputed {
    /// Whether the block lies in an RFC 1918 range.
    pub is_private_cidr: bool,
    pub total_ip_addresses: u64,
}

impl Resource for Vpc {
    const TYPE: &'static str = "aws_vpc";

    type Outputs = VpcOutputs;
    type Computed = VpcComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(Vpc {
            cidr_block: attrs.required_with("cidr_block", cidr_block_sized(16, 28))?,
            instance_tenancy: attrs.or_default("instance_tenancy", Tenancy::Default)?,
            enable_dns_support: attrs.or_default("enable_dns_support", true)?,
            enable_dns_hostnames: attrs.or_default("enable_dns_hostnames", true)?,
            tags: attrs.tags()?,
        })
    }

    fn validate(&self) -> Result<()> {
        Consistency::of(Self::TYPE, self)?.requires(
            ("enable_dns_hostnames", self.enable_dns_hostnames),
            ("enable_dns_support", self.enable_dns_support),
        )
    }

    fn computed(&self) -> VpcComputed {
        let cidr = Ipv4Cidr::parse(&self.cidr_block);
        VpcComputed {
            is_private_cidr: cidr.is_some_and(|c| c.is_private()),
            total_ip_addresses: cidr.map_or(0, |c| c.address_count()),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults() {
        let vpc = Vpc::from_input(&json!({ "cidr_block": "10.0.0.0/16" })).unwrap();
        assert_eq!(Tenancy::Default, vpc.instance_tenancy);
        assert!(vpc.enable_dns_support && vpc.enable_dns_hostnames);
        assert_eq!(
            VpcComputed {
                is_private_cidr: true,
                total_ip_addresses: 65536,
            },
            vpc.computed()
        );
    }

    #[test]
    fn rejects_oversized_blocks() {
        let err = Vpc::from_input(&json!({ "cidr_block": "10.0.0.0/8" })).unwrap_err();
        assert_eq!(vec!["cidr_block"], err.fields());
    }

    #[test]
    fn hostnames_need_dns_support() {
        let err = Vpc::from_input(&json!({
            "cidr_block": "10.0.0.0/16",
            "enable_dns_support": false,
        }))
        .unwrap_err();
        assert!(err.is_consistency_violation());
        assert_eq!(vec!["enable_dns_hostnames", "enable_dns_support"], err.fields());
    }
}
