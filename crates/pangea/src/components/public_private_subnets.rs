//! A tier of public subnets and a tier of private subnets spread across
//! availability zones, with optional NAT gateways for private egress.
use std::collections::BTreeMap;

use crate::{
    aws::{eip::Eip, nat_gateway::NatGateway, subnet::Subnet},
    cost,
    schema::enumerated,
    validators::{
        availability_zone, both, cidr_block, cidr_block_sized, each, non_empty, Consistency,
        Ipv4Cidr,
    },
    Attributes, ReferenceSummary, ResourceReference, Result, Synthesizer,
};

use super::Component;

enumerated! {
    pub enum NatStrategy {
        None => "none",
        Single => "single",
        PerAz => "per_az",
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PublicPrivateSubnets {
    pub vpc_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_cidr: Option<String>,
    pub availability_zones: Vec<String>,
    pub public_cidrs: Vec<String>,
    pub private_cidrs: Vec<String>,
    pub nat_gateway: NatStrategy,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PublicPrivateSubnetsComputed {
    /// `hybrid`, `public-only` or `private-only`.
    pub networking_pattern: &'static str,
    pub nat_gateway_count: u32,
    pub estimated_monthly_cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublicPrivateSubnetsReference {
    pub name: String,
    pub public_subnets: Vec<ResourceReference<Subnet>>,
    pub private_subnets: Vec<ResourceReference<Subnet>>,
    pub nat_eips: Vec<ResourceReference<Eip>>,
    pub nat_gateways: Vec<ResourceReference<NatGateway>>,
    pub computed: PublicPrivateSubnetsComputed,
}

impl PublicPrivateSubnetsReference {
    /// Summaries of every declared resource, in declaration order.
    pub fn summaries(&self) -> Result<Vec<ReferenceSummary>> {
        let mut summaries = vec![];
        for subnet in self.public_subnets.iter().chain(&self.private_subnets) {
            summaries.push(subnet.summary()?);
        }
        for (eip, nat) in self.nat_eips.iter().zip(&self.nat_gateways) {
            summaries.push(eip.summary()?);
            summaries.push(nat.summary()?);
        }
        Ok(summaries)
    }
}

impl PublicPrivateSubnets {
    pub fn nat_gateway_count(&self) -> u32 {
        if self.public_cidrs.is_empty() || self.private_cidrs.is_empty() {
            return 0;
        }
        match self.nat_gateway {
            NatStrategy::None => 0,
            NatStrategy::Single => 1,
            NatStrategy::PerAz => {
                let count = self.availability_zones.len().min(self.public_cidrs.len());
                u32::try_from(count).unwrap_or(u32::MAX)
            }
        }
    }

    pub fn computed(&self) -> PublicPrivateSubnetsComputed {
        let nat_gateway_count = self.nat_gateway_count();
        PublicPrivateSubnetsComputed {
            networking_pattern: match (self.public_cidrs.is_empty(), self.private_cidrs.is_empty())
            {
                (false, false) => "hybrid",
                (false, true) => "public-only",
                _ => "private-only",
            },
            nat_gateway_count,
            estimated_monthly_cost: cost::monthly(
                cost::NAT_GATEWAY_HOURLY + cost::PUBLIC_IPV4_HOURLY,
                nat_gateway_count,
            ),
        }
    }

    fn subnet(&self, index: usize, cidr: &str, public: bool) -> Subnet {
        let mut tags = self.tags.clone();
        tags.insert(
            "Tier".to_owned(),
            if public { "public" } else { "private" }.to_owned(),
        );
        Subnet {
            vpc_id: self.vpc_id.clone(),
            cidr_block: cidr.to_owned(),
            availability_zone: self
                .availability_zones
                .get(index % self.availability_zones.len().max(1))
                .cloned(),
            map_public_ip_on_launch: public,
            assign_ipv6_address_on_creation: false,
            ipv6_cidr_block: None,
            tags,
        }
    }
}

impl Component for PublicPrivateSubnets {
    const KIND: &'static str = "public_private_subnets";

    type Reference = PublicPrivateSubnetsReference;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(PublicPrivateSubnets {
            vpc_id: attrs.required_with("vpc_id", non_empty())?,
            vpc_cidr: attrs.optional_with("vpc_cidr", cidr_block())?,
            availability_zones: attrs.required_with(
                "availability_zones",
                both(non_empty(), each(availability_zone())),
            )?,
            public_cidrs: attrs.or_default_with(
                "public_cidrs",
                vec![],
                each(cidr_block_sized(16, 28)),
            )?,
            private_cidrs: attrs.or_default_with(
                "private_cidrs",
                vec![],
                each(cidr_block_sized(16, 28)),
            )?,
            nat_gateway: attrs.or_default("nat_gateway", NatStrategy::Single)?,
            tags: attrs.tags()?,
        })
    }

    fn validate(&self) -> Result<()> {
        let check = Consistency::of(Self::KIND, self)?;
        let tiers = ["public_cidrs", "private_cidrs"];
        check.ensure(
            !self.public_cidrs.is_empty() || !self.private_cidrs.is_empty(),
            &tiers,
            "at least one of public_cidrs or private_cidrs must be set",
        )?;

        let all: Vec<&str> = self
            .public_cidrs
            .iter()
            .chain(&self.private_cidrs)
            .map(String::as_str)
            .collect();
        check.no_duplicates(&tiers, "CIDR blocks", all.iter().copied())?;

        let blocks: Vec<Ipv4Cidr> = all.iter().filter_map(|c| Ipv4Cidr::parse(c)).collect();
        for (i, a) in blocks.iter().enumerate() {
            for b in &blocks[i + 1..] {
                check.ensure(
                    !a.overlaps(b),
                    &tiers,
                    format!("overlapping CIDR blocks: {a} and {b}"),
                )?;
            }
        }

        if let Some(vpc) = self.vpc_cidr.as_deref().and_then(Ipv4Cidr::parse) {
            if let Some(outside) = blocks.iter().find(|block| !vpc.contains(block)) {
                return Err(check.violation(
                    &["vpc_cidr", "public_cidrs", "private_cidrs"],
                    format!("CIDR block {outside} is outside of vpc_cidr {vpc}"),
                ));
            }
        }

        if self.nat_gateway != NatStrategy::None {
            check.ensure(
                !self.public_cidrs.is_empty(),
                &["nat_gateway", "public_cidrs"],
                "NAT gateways need a public subnet to live in",
            )?;
            check.ensure(
                !self.private_cidrs.is_empty(),
                &["nat_gateway", "private_cidrs"],
                "NAT gateways need a private subnet to serve",
            )?;
        }
        Ok(())
    }

    fn build<S: Synthesizer + ?Sized>(
        &self,
        synth: &mut S,
        name: &str,
    ) -> Result<PublicPrivateSubnetsReference> {
        log::debug!("building {} '{name}'", Self::KIND);
        let mut public_subnets = vec![];
        for (index, cidr) in self.public_cidrs.iter().enumerate() {
            let subnet = self.subnet(index, cidr, true);
            public_subnets.push(crate::declare(synth, &format!("{name}_public_{index}"), subnet)?);
        }
        let mut private_subnets = vec![];
        for (index, cidr) in self.private_cidrs.iter().enumerate() {
            let subnet = self.subnet(index, cidr, false);
            private_subnets.push(crate::declare(
                synth,
                &format!("{name}_private_{index}"),
                subnet,
            )?);
        }

        let nat_count = usize::try_from(self.nat_gateway_count()).unwrap_or(usize::MAX);
        let mut nat_eips = vec![];
        let mut nat_gateways = vec![];
        for (index, subnet) in public_subnets.iter().take(nat_count).enumerate()
        {
            let nat_name = format!("{name}_nat_{index}");
            let eip = crate::declare(
                synth,
                &nat_name,
                Eip {
                    tags: self.tags.clone(),
                    ..Eip::default()
                },
            )?;
            let nat = crate::declare(
                synth,
                &nat_name,
                NatGateway {
                    subnet_id: subnet.outputs().id.clone(),
                    connectivity_type: crate::aws::nat_gateway::ConnectivityType::Public,
                    allocation_id: Some(eip.outputs().id.clone()),
                    private_ip: None,
                    tags: self.tags.clone(),
                },
            )?;
            nat_eips.push(eip);
            nat_gateways.push(nat);
        }

        Ok(PublicPrivateSubnetsReference {
            name: name.to_owned(),
            public_subnets,
            private_subnets,
            nat_eips,
            nat_gateways,
            computed: self.computed(),
        })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{components, TerraformSynthesizer};

    fn network() -> serde_json::Value {
        json!({
            "vpc_id": "${aws_vpc.main.id}",
            "vpc_cidr": "10.0.0.0/16",
            "availability_zones": ["us-east-1a", "us-east-1b"],
            "public_cidrs": ["10.0.1.0/24", "10.0.2.0/24"],
            "private_cidrs": ["10.0.11.0/24", "10.0.12.0/24"],
            "nat_gateway": "per_az",
        })
    }

    #[test]
    fn duplicate_cidrs_across_tiers() {
        let input = json!({
            "vpc_id": "vpc-1",
            "availability_zones": ["us-east-1a"],
            "public_cidrs": ["10.0.1.0/24", "10.0.2.0/24"],
            "private_cidrs": ["10.0.1.0/24"],
        });
        let err = PublicPrivateSubnets::from_input(&input).unwrap_err();
        assert!(err.is_consistency_violation());
        assert_eq!(vec!["public_cidrs", "private_cidrs"], err.fields());
        assert!(err.rule().unwrap().contains("duplicate CIDR blocks"));
    }

    #[test]
    fn overlapping_cidrs() {
        let mut input = network();
        input["private_cidrs"] = json!(["10.0.0.0/20"]);
        let err = PublicPrivateSubnets::from_input(&input).unwrap_err();
        assert_eq!(
            Some("overlapping CIDR blocks: 10.0.1.0/24 and 10.0.0.0/20".to_owned()),
            err.rule()
        );
    }

    #[test]
    fn cidrs_inside_the_vpc() {
        let mut input = network();
        input["public_cidrs"] = json!(["10.1.1.0/24"]);
        let err = PublicPrivateSubnets::from_input(&input).unwrap_err();
        assert!(err.fields().contains(&"vpc_cidr"));
    }

    #[test]
    fn nat_needs_a_public_subnet() {
        let mut input = network();
        input["public_cidrs"] = json!([]);
        let err = PublicPrivateSubnets::from_input(&input).unwrap_err();
        assert_eq!(vec!["nat_gateway", "public_cidrs"], err.fields());

        input["nat_gateway"] = json!("none");
        let component = PublicPrivateSubnets::from_input(&input).unwrap();
        assert_eq!("private-only", component.computed().networking_pattern);
    }

    #[test]
    fn builds_every_resource() {
        let mut synth = TerraformSynthesizer::default();
        let network = components::declare::<PublicPrivateSubnets, _>(&mut synth, "app", &network())
            .unwrap();
        assert_eq!(
            PublicPrivateSubnetsComputed {
                networking_pattern: "hybrid",
                nat_gateway_count: 2,
                estimated_monthly_cost: 73.0,
            },
            network.computed
        );
        // 4 subnets, 2 addresses and 2 gateways
        assert_eq!(8, synth.len());
        assert_eq!(
            "${aws_subnet.app_private_1.id}",
            network.private_subnets[1].outputs().id
        );
        assert_eq!(
            Some(&json!("us-east-1b")),
            synth
                .get("aws_subnet", "app_public_1")
                .and_then(|block| block.get("availability_zone"))
        );
        let nat = synth.get("aws_nat_gateway", "app_nat_0").unwrap();
        assert_eq!(json!("${aws_subnet.app_public_0.id}"), nat["subnet_id"]);
        assert_eq!(json!("${aws_eip.app_nat_0.id}"), nat["allocation_id"]);
        assert!(synth.unresolved().contains("aws_vpc.main"));
        assert_eq!(8, network.summaries().unwrap().len());
    }

    #[test]
    fn cost_grows_with_gateways() {
        let mut input = network();
        let mut previous = 0.0;
        for strategy in ["none", "single", "per_az"] {
            input["nat_gateway"] = json!(strategy);
            let cost = PublicPrivateSubnets::from_input(&input)
                .unwrap()
                .computed()
                .estimated_monthly_cost;
            assert!(cost >= previous, "{strategy}: {cost} < {previous}");
            previous = cost;
        }
    }
}
