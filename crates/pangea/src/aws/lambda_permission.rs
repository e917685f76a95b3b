//! Lambda resource-based permissions.
use std::sync::LazyLock;

use regex::Regex;

use crate::{
    self as pangea,
    validators::{account_id, any_arn, matches, max_length, non_empty, parse_arn, Consistency},
    Attributes, Outputs, Resource, Result,
};

static ACTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^lambda:[A-Za-z*]+$").unwrap());
static PRINCIPAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*|\d{12}|[a-z0-9-]+(\.[a-z0-9-]+)*\.amazonaws\.com|arn:aws[a-z-]*:iam::\d{12}:[A-Za-z0-9/_+=,.@-]+)$")
        .unwrap()
});
static STATEMENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LambdaPermission {
    pub action: String,
    pub function_name: String,
    pub principal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement_id_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct LambdaPermissionOutputs {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LambdaPermissionComputed {
    /// `service`, `account` or `any`.
    pub principal_kind: &'static str,
    /// The service name of a service principal, eg `s3`.
    pub principal_service: Option<String>,
}

impl Resource for LambdaPermission {
    const TYPE: &'static str = "aws_lambda_permission";

    type Outputs = LambdaPermissionOutputs;
    type Computed = LambdaPermissionComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(LambdaPermission {
            action: attrs.or_default_with(
                "action",
                "lambda:InvokeFunction".to_owned(),
                matches("a Lambda action such as lambda:InvokeFunction", &ACTION),
            )?,
            function_name: attrs.required_with("function_name", non_empty())?,
            principal: attrs.required_with(
                "principal",
                matches(
                    "a service principal, a 12 digit account id, an IAM ARN or '*'",
                    &PRINCIPAL,
                ),
            )?,
            source_arn: attrs.optional_with("source_arn", any_arn())?,
            source_account: attrs.optional_with("source_account", account_id())?,
            statement_id: attrs.optional_with(
                "statement_id",
                matches("letters, digits, '_' or '-'", &STATEMENT_ID),
            )?,
            statement_id_prefix: attrs.optional_with("statement_id_prefix", max_length(74))?,
            qualifier: attrs.optional_with("qualifier", non_empty())?,
        })
    }

    fn validate(&self) -> Result<()> {
        let check = Consistency::of(Self::TYPE, self)?;
        check.at_most_one_of(&[
            ("statement_id", self.statement_id.is_some()),
            ("statement_id_prefix", self.statement_id_prefix.is_some()),
        ])?;
        let arn_account = self
            .source_arn
            .as_deref()
            .and_then(parse_arn)
            .map(|arn| arn.account)
            .filter(|account| !account.is_empty());
        if let (Some(arn_account), Some(source_account)) = (arn_account, &self.source_account) {
            check.ensure(
                arn_account == source_account.as_str(),
                &["source_arn", "source_account"],
                format!(
                    "source_arn belongs to account {arn_account} but source_account is {source_account}"
                ),
            )?;
        }
        Ok(())
    }

    fn computed(&self) -> LambdaPermissionComputed {
        let (principal_kind, principal_service) = if self.principal == "*" {
            ("any", None)
        } else if let Some(service) = self.principal.strip_suffix(".amazonaws.com") {
            ("service", Some(service.to_owned()))
        } else {
            ("account", None)
        };
        LambdaPermissionComputed {
            principal_kind,
            principal_service,
        }
    }
}
