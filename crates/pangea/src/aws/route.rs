//! Route table entries.
use std::sync::LazyLock;

use regex::Regex;

use crate::{
    self as pangea,
    validators::{any_arn, cidr_block, ipv6_cidr_block, matches, non_empty, Consistency},
    Attributes, Outputs, Resource, Result,
};

static PREFIX_LIST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pl-[0-9a-f]+$").unwrap());

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct Route {
    pub route_table_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_ipv6_cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_prefix_list_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateway_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_interface_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transit_gateway_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_peering_connection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_endpoint_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egress_only_gateway_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_gateway_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_gateway_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_network_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct RouteOutputs {
    pub id: String,
    pub instance_id: String,
    pub instance_owner_id: String,
    pub origin: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RouteComputed {
    /// Name of the destination field in use.
    pub destination_kind: &'static str,
    /// Name of the target field in use.
    pub target_kind: &'static str,
    /// Whether the route matches all IPv4 or all IPv6 traffic.
    pub is_default_route: bool,
}

impl Route {
    fn destinations(&self) -> [(&'static str, bool); 3] {
        [
            ("destination_cidr_block", self.destination_cidr_block.is_some()),
            (
                "destination_ipv6_cidr_block",
                self.destination_ipv6_cidr_block.is_some(),
            ),
            (
                "destination_prefix_list_id",
                self.destination_prefix_list_id.is_some(),
            ),
        ]
    }

    fn targets(&self) -> [(&'static str, bool); 10] {
        [
            ("gateway_id", self.gateway_id.is_some()),
            ("nat_gateway_id", self.nat_gateway_id.is_some()),
            ("network_interface_id", self.network_interface_id.is_some()),
            ("transit_gateway_id", self.transit_gateway_id.is_some()),
            (
                "vpc_peering_connection_id",
                self.vpc_peering_connection_id.is_some(),
            ),
            ("vpc_endpoint_id", self.vpc_endpoint_id.is_some()),
            ("egress_only_gateway_id", self.egress_only_gateway_id.is_some()),
            ("carrier_gateway_id", self.carrier_gateway_id.is_some()),
            ("local_gateway_id", self.local_gateway_id.is_some()),
            ("core_network_arn", self.core_network_arn.is_some()),
        ]
    }
}

fn first_set(fields: &[(&'static str, bool)]) -> &'static str {
    fields
        .iter()
        .find(|(_, is_set)| *is_set)
        .map_or("unknown", |(name, _)| *name)
}

impl Resource for Route {
    const TYPE: &'static str = "aws_route";

    type Outputs = RouteOutputs;
    type Computed = RouteComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(Route {
            route_table_id: attrs.required_with("route_table_id", non_empty())?,
            destination_cidr_block: attrs.optional_with("destination_cidr_block", cidr_block())?,
            destination_ipv6_cidr_block: attrs
                .optional_with("destination_ipv6_cidr_block", ipv6_cidr_block())?,
            destination_prefix_list_id: attrs.optional_with(
                "destination_prefix_list_id",
                matches("a prefix list id such as pl-1a2b3c4d", &PREFIX_LIST_ID),
            )?,
            gateway_id: attrs.optional("gateway_id")?,
            nat_gateway_id: attrs.optional("nat_gateway_id")?,
            network_interface_id: attrs.optional("network_interface_id")?,
            transit_gateway_id: attrs.optional("transit_gateway_id")?,
            vpc_peering_connection_id: attrs.optional("vpc_peering_connection_id")?,
            vpc_endpoint_id: attrs.optional("vpc_endpoint_id")?,
            egress_only_gateway_id: attrs.optional("egress_only_gateway_id")?,
            carrier_gateway_id: attrs.optional("carrier_gateway_id")?,
            local_gateway_id: attrs.optional("local_gateway_id")?,
            core_network_arn: attrs.optional_with("core_network_arn", any_arn())?,
        })
    }

    fn validate(&self) -> Result<()> {
        let check = Consistency::of(Self::TYPE, self)?;
        check.exactly_one_of(&self.destinations())?;
        check.exactly_one_of(&self.targets())?;
        check.requires(
            ("egress_only_gateway_id", self.egress_only_gateway_id.is_some()),
            (
                "destination_ipv6_cidr_block",
                self.destination_ipv6_cidr_block.is_some(),
            ),
        )
    }

    fn computed(&self) -> RouteComputed {
        RouteComputed {
            destination_kind: first_set(&self.destinations()),
            target_kind: first_set(&self.targets()),
            is_default_route: self.destination_cidr_block.as_deref() == Some("0.0.0.0/0")
                || self.destination_ipv6_cidr_block.as_deref() == Some("::/0"),
        }
    }
}
