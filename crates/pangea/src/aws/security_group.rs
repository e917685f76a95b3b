//! Security groups and their inline rules.
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    self as pangea,
    schema::enumerated,
    validators::{cidr_block, each, ipv6_cidr_block, max_length, Consistency},
    Attributes, Outputs, Resource, Result,
};

enumerated! {
    pub enum Protocol {
        Tcp => "tcp",
        Udp => "udp",
        Icmp => "icmp",
        Icmpv6 => "icmpv6",
        All => "-1",
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SecurityGroupRule {
    pub from_port: u16,
    pub to_port: u16,
    pub protocol: Protocol,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cidr_blocks: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ipv6_cidr_blocks: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<String>,
    #[serde(rename = "self")]
    pub self_: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecurityGroupRule {
    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(SecurityGroupRule {
            from_port: attrs.required("from_port")?,
            to_port: attrs.required("to_port")?,
            protocol: attrs.required("protocol")?,
            cidr_blocks: attrs.or_default_with("cidr_blocks", vec![], each(cidr_block()))?,
            ipv6_cidr_blocks: attrs.or_default_with(
                "ipv6_cidr_blocks",
                vec![],
                each(ipv6_cidr_block()),
            )?,
            security_groups: attrs.or_default("security_groups", vec![])?,
            self_: attrs.or_default("self", false)?,
            description: attrs.optional_with("description", max_length(255))?,
        })
    }

    fn has_source(&self) -> bool {
        !self.cidr_blocks.is_empty()
            || !self.ipv6_cidr_blocks.is_empty()
            || !self.security_groups.is_empty()
            || self.self_
    }

    fn is_public(&self) -> bool {
        self.cidr_blocks.iter().any(|c| c == "0.0.0.0/0")
            || self.ipv6_cidr_blocks.iter().any(|c| c == "::/0")
    }

    fn validate(&self, check: &Consistency, path: &str) -> Result<()> {
        let from = format!("{path}.from_port");
        let to = format!("{path}.to_port");
        let protocol = format!("{path}.protocol");
        check.ordered((from.as_str(), self.from_port), (to.as_str(), self.to_port))?;
        if self.protocol == Protocol::All {
            check.ensure(
                self.from_port == 0 && self.to_port == 0,
                &[protocol.as_str(), from.as_str(), to.as_str()],
                "protocol -1 covers all ports, from_port and to_port must be 0",
            )?;
        }
        check.ensure(
            self.has_source(),
            &[
                format!("{path}.cidr_blocks").as_str(),
                format!("{path}.security_groups").as_str(),
            ],
            "a rule needs at least one source: cidr_blocks, ipv6_cidr_blocks, security_groups or self",
        )
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SecurityGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<SecurityGroupRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub egress: Vec<SecurityGroupRule>,
    pub revoke_rules_on_delete: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct SecurityGroupOutputs {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub owner_id: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SecurityGroupComputed {
    pub ingress_rule_count: usize,
    pub egress_rule_count: usize,
    /// Whether any ingress rule is open to the whole internet.
    pub allows_public_ingress: bool,
    /// Ports reachable from the whole internet, as `from-to/protocol`.
    pub publicly_exposed_ports: Vec<String>,
}

impl Resource for SecurityGroup {
    const TYPE: &'static str = "aws_security_group";

    type Outputs = SecurityGroupOutputs;
    type Computed = SecurityGroupComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(SecurityGroup {
            name: attrs.optional_with("name", max_length(255))?,
            name_prefix: attrs.optional_with("name_prefix", max_length(100))?,
            description: attrs.or_default_with(
                "description",
                "Managed by Terraform".to_owned(),
                max_length(255),
            )?,
            vpc_id: attrs.optional("vpc_id")?,
            ingress: attrs.list_with("ingress", SecurityGroupRule::parse)?,
            egress: attrs.list_with("egress", SecurityGroupRule::parse)?,
            revoke_rules_on_delete: attrs.or_default("revoke_rules_on_delete", false)?,
            tags: attrs.tags()?,
        })
    }

    fn validate(&self) -> Result<()> {
        let check = Consistency::of(Self::TYPE, self)?;
        check.at_most_one_of(&[
            ("name", self.name.is_some()),
            ("name_prefix", self.name_prefix.is_some()),
        ])?;
        for (index, rule) in self.ingress.iter().enumerate() {
            rule.validate(&check, &format!("ingress[{index}]"))?;
        }
        for (index, rule) in self.egress.iter().enumerate() {
            rule.validate(&check, &format!("egress[{index}]"))?;
        }
        Ok(())
    }

    fn computed(&self) -> SecurityGroupComputed {
        let publicly_exposed_ports: BTreeSet<String> = self
            .ingress
            .iter()
            .filter(|rule| rule.is_public())
            .map(|rule| format!("{}-{}/{}", rule.from_port, rule.to_port, rule.protocol))
            .collect();
        SecurityGroupComputed {
            ingress_rule_count: self.ingress.len(),
            egress_rule_count: self.egress.len(),
            allows_public_ingress: !publicly_exposed_ports.is_empty(),
            publicly_exposed_ports: publicly_exposed_ports.into_iter().collect(),
        }
    }
}
