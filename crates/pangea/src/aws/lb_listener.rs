//! Load balancer listeners.
use std::collections::BTreeMap;

use crate::{
    self as pangea,
    schema::enumerated,
    validators::{arn, arn_of, in_range, max_length, non_empty, parse_arn, Consistency},
    Attributes, Outputs, Resource, Result,
};

enumerated! {
    pub enum Protocol {
        Http => "HTTP",
        Https => "HTTPS",
        Tcp => "TCP",
        Tls => "TLS",
        Udp => "UDP",
        TcpUdp => "TCP_UDP",
        Geneve => "GENEVE",
    }
}

impl Protocol {
    /// Whether the listener terminates TLS and so needs a certificate.
    pub fn is_secure(&self) -> bool {
        matches!(self, Protocol::Https | Protocol::Tls)
    }
}

enumerated! {
    pub enum ActionType {
        Forward => "forward",
        Redirect => "redirect",
        FixedResponse => "fixed-response",
    }
}

enumerated! {
    pub enum RedirectStatus {
        Permanent => "HTTP_301",
        Found => "HTTP_302",
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Redirect {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub status_code: RedirectStatus,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FixedResponse {
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DefaultAction {
    #[serde(rename = "type")]
    pub type_is: ActionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_group_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_response: Option<FixedResponse>,
}

impl DefaultAction {
    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(DefaultAction {
            type_is: attrs.required("type")?,
            target_group_arn: attrs
                .optional_with("target_group_arn", arn("elasticloadbalancing"))?,
            redirect: attrs.nested_with("redirect", |redirect| {
                Ok(Redirect {
                    protocol: redirect.optional("protocol")?,
                    port: redirect.optional("port")?,
                    host: redirect.optional("host")?,
                    path: redirect.optional("path")?,
                    status_code: redirect.required("status_code")?,
                })
            })?,
            fixed_response: attrs.nested_with("fixed_response", |fixed| {
                Ok(FixedResponse {
                    content_type: fixed.required_with("content_type", non_empty())?,
                    message_body: fixed.optional_with("message_body", max_length(1024))?,
                    status_code: fixed.optional("status_code")?,
                })
            })?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LbListener {
    pub load_balancer_arn: String,
    pub port: u16,
    pub protocol: Protocol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpn_policy: Option<String>,
    pub default_action: DefaultAction,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct LbListenerOutputs {
    pub id: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LbListenerComputed {
    pub is_secure: bool,
    /// `application`, `network` or `gateway`, read off the load balancer ARN.
    pub load_balancer_kind: &'static str,
}

impl Resource for LbListener {
    const TYPE: &'static str = "aws_lb_listener";

    type Outputs = LbListenerOutputs;
    type Computed = LbListenerComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(LbListener {
            load_balancer_arn: attrs
                .required_with("load_balancer_arn", arn("elasticloadbalancing"))?,
            port: attrs.required_with("port", in_range(1, 65535))?,
            protocol: attrs.required("protocol")?,
            certificate_arn: attrs.optional_with("certificate_arn", arn_of(&["acm", "iam"]))?,
            ssl_policy: attrs.optional_with("ssl_policy", non_empty())?,
            alpn_policy: attrs.optional_with("alpn_policy", non_empty())?,
            default_action: attrs.required_nested_with("default_action", DefaultAction::parse)?,
            tags: attrs.tags()?,
        })
    }

    fn validate(&self) -> Result<()> {
        let check = Consistency::of(Self::TYPE, self)?;
        let has_certificate = self.certificate_arn.is_some();
        if self.protocol.is_secure() {
            check.ensure(
                has_certificate,
                &["protocol", "certificate_arn"],
                format!("{} listeners require certificate_arn", self.protocol),
            )?;
        } else {
            check.ensure(
                !has_certificate,
                &["protocol", "certificate_arn"],
                format!("{} listeners do not take certificate_arn", self.protocol),
            )?;
            check.ensure(
                self.ssl_policy.is_none(),
                &["protocol", "ssl_policy"],
                format!("{} listeners do not take ssl_policy", self.protocol),
            )?;
        }
        check.ensure(
            self.alpn_policy.is_none() || self.protocol == Protocol::Tls,
            &["alpn_policy", "protocol"],
            "alpn_policy is only supported by TLS listeners",
        )?;

        let action = &self.default_action;
        let (field, is_set) = match action.type_is {
            ActionType::Forward => ("target_group_arn", action.target_group_arn.is_some()),
            ActionType::Redirect => ("redirect", action.redirect.is_some()),
            ActionType::FixedResponse => ("fixed_response", action.fixed_response.is_some()),
        };
        let path = format!("default_action.{field}");
        check.ensure(
            is_set,
            &["default_action.type", path.as_str()],
            format!("{} actions require {path}", action.type_is),
        )
    }

    fn computed(&self) -> LbListenerComputed {
        let resource = parse_arn(&self.load_balancer_arn).map_or("", |arn| arn.resource);
        LbListenerComputed {
            is_secure: self.protocol.is_secure(),
            load_balancer_kind: if resource.starts_with("loadbalancer/net/") {
                "network"
            } else if resource.starts_with("loadbalancer/gwy/") {
                "gateway"
            } else {
                "application"
            },
        }
    }
}
