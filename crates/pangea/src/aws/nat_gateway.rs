//! NAT gateways.
use std::collections::BTreeMap;

use crate::{
    self as pangea,
    cost,
    schema::enumerated,
    validators::{ipv4_address, non_empty, Consistency},
    Attributes, Outputs, Resource, Result,
};

enumerated! {
    pub enum ConnectivityType {
        Public => "public",
        Private => "private",
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NatGateway {
    pub subnet_id: String,
    pub connectivity_type: ConnectivityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct NatGatewayOutputs {
    pub id: String,
    pub allocation_id: String,
    pub network_interface_id: String,
    pub private_ip: String,
    pub public_ip: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NatGatewayComputed {
    pub is_public: bool,
    /// Gateway hours, plus the public address for public gateways.
    pub estimated_monthly_cost: f64,
}

impl Resource for NatGateway {
    const TYPE: &'static str = "aws_nat_gateway";

    type Outputs = NatGatewayOutputs;
    type Computed = NatGatewayComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(NatGateway {
            subnet_id: attrs.required_with("subnet_id", non_empty())?,
            connectivity_type: attrs.or_default("connectivity_type", ConnectivityType::Public)?,
            allocation_id: attrs.optional_with("allocation_id", non_empty())?,
            private_ip: attrs.optional_with("private_ip", ipv4_address())?,
            tags: attrs.tags()?,
        })
    }

    fn validate(&self) -> Result<()> {
        let check = Consistency::of(Self::TYPE, self)?;
        let has_allocation = self.allocation_id.is_some();
        match self.connectivity_type {
            ConnectivityType::Public => check.ensure(
                has_allocation,
                &["connectivity_type", "allocation_id"],
                "public NAT gateways require allocation_id",
            ),
            ConnectivityType::Private => check.ensure(
                !has_allocation,
                &["connectivity_type", "allocation_id"],
                "private NAT gateways must not set allocation_id",
            ),
        }
    }

    fn computed(&self) -> NatGatewayComputed {
        let is_public = self.connectivity_type == ConnectivityType::Public;
        let mut hourly = cost::NAT_GATEWAY_HOURLY;
        if is_public {
            hourly += cost::PUBLIC_IPV4_HOURLY;
        }
        NatGatewayComputed {
            is_public,
            estimated_monthly_cost: cost::monthly(hourly, 1),
        }
    }
}
