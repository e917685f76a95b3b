//! Subnet infrastructure.
use std::collections::BTreeMap;

use crate::{
    self as pangea,
    validators::{availability_zone, cidr_block_sized, ipv6_cidr_block, non_empty, Consistency, Ipv4Cidr},
    Attributes, Outputs, Resource, Result,
};

/// Addresses AWS reserves in every subnet.
pub const RESERVED_ADDRESSES: u64 = 5;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Subnet {
    pub vpc_id: String,
    pub cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    pub map_public_ip_on_launch: bool,
    pub assign_ipv6_address_on_creation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_cidr_block: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct SubnetOutputs {
    pub id: String,
    pub arn: String,
    pub availability_zone_id: String,
    pub cidr_block: String,
    pub owner_id: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SubnetComputed {
    /// `public` when instances get a public address on launch.
    pub subnet_type: &'static str,
    pub available_ip_addresses: u64,
}

impl Resource for Subnet {
    const TYPE: &'static str = "aws_subnet";

    type Outputs = SubnetOutputs;
    type Computed = SubnetComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(Subnet {
            vpc_id: attrs.required_with("vpc_id", non_empty())?,
            cidr_block: attrs.required_with("cidr_block", cidr_block_sized(16, 28))?,
            availability_zone: attrs.optional_with("availability_zone", availability_zone())?,
            map_public_ip_on_launch: attrs.or_default("map_public_ip_on_launch", false)?,
            assign_ipv6_address_on_creation: attrs
                .or_default("assign_ipv6_address_on_creation", false)?,
            ipv6_cidr_block: attrs.optional_with("ipv6_cidr_block", ipv6_cidr_block())?,
            tags: attrs.tags()?,
        })
    }

    fn validate(&self) -> Result<()> {
        Consistency::of(Self::TYPE, self)?.requires(
            (
                "assign_ipv6_address_on_creation",
                self.assign_ipv6_address_on_creation,
            ),
            ("ipv6_cidr_block", self.ipv6_cidr_block.is_some()),
        )
    }

    fn computed(&self) -> SubnetComputed {
        let size = Ipv4Cidr::parse(&self.cidr_block).map_or(0, |c| c.address_count());
        SubnetComputed {
            subnet_type: if self.map_public_ip_on_launch {
                "public"
            } else {
                "private"
            },
            available_ip_addresses: size.saturating_sub(RESERVED_ADDRESSES),
        }
    }
}
