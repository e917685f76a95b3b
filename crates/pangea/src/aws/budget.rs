//! AWS Budgets.
//!
//! Budgets accept unknown top-level keys and pass them through to the
//! Terraform block unchanged, so newer provider arguments need no schema
//! change.
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::{
    self as pangea,
    cost,
    schema::enumerated,
    validators::{arn, at_least, email, matches, max_length, non_empty, Consistency, Constraint},
    Attributes, Outputs, Resource, Result, Rule, UnknownKeys,
};

/// Format of budget timestamps, eg `2024-01-01_00:00`.
pub const TIME_FORMAT: &str = "%Y-%m-%d_%H:%M";

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").unwrap());

fn decimal() -> impl Constraint<String> {
    matches("a decimal amount such as 100.0", &DECIMAL)
}

fn timestamp() -> impl Constraint<String> {
    |value: &String| {
        parse_time(value).map(|_| ()).ok_or_else(|| Rule::Pattern {
            description: "a timestamp such as 2024-01-01_00:00".to_owned(),
        })
    }
}

pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT).ok()
}

enumerated! {
    pub enum BudgetType {
        Cost => "COST",
        Usage => "USAGE",
        RiUtilization => "RI_UTILIZATION",
        RiCoverage => "RI_COVERAGE",
        SavingsPlansUtilization => "SAVINGS_PLANS_UTILIZATION",
        SavingsPlansCoverage => "SAVINGS_PLANS_COVERAGE",
    }
}

enumerated! {
    pub enum TimeUnit {
        Daily => "DAILY",
        Monthly => "MONTHLY",
        Quarterly => "QUARTERLY",
        Annually => "ANNUALLY",
    }
}

impl TimeUnit {
    /// How many of this period fit in a month.
    pub fn per_month(&self) -> f64 {
        match self {
            TimeUnit::Daily => cost::HOURS_PER_MONTH / 24.0,
            TimeUnit::Monthly => 1.0,
            TimeUnit::Quarterly => 1.0 / 3.0,
            TimeUnit::Annually => 1.0 / 12.0,
        }
    }
}

enumerated! {
    pub enum ComparisonOperator {
        GreaterThan => "GREATER_THAN",
        LessThan => "LESS_THAN",
        EqualTo => "EQUAL_TO",
    }
}

enumerated! {
    pub enum ThresholdType {
        Percentage => "PERCENTAGE",
        AbsoluteValue => "ABSOLUTE_VALUE",
    }
}

enumerated! {
    pub enum NotificationType {
        Actual => "ACTUAL",
        Forecasted => "FORECASTED",
    }
}

enumerated! {
    pub enum SubscriberProtocol {
        Email => "EMAIL",
        Sns => "SNS",
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Subscriber {
    pub protocol: SubscriberProtocol,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Notification {
    pub comparison_operator: ComparisonOperator,
    pub threshold: f64,
    pub threshold_type: ThresholdType,
    pub notification_type: NotificationType,
    pub subscribers: Vec<Subscriber>,
}

impl Notification {
    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(Notification {
            comparison_operator: attrs.required("comparison_operator")?,
            threshold: attrs.required_with("threshold", at_least(0.0))?,
            threshold_type: attrs.or_default("threshold_type", ThresholdType::Percentage)?,
            notification_type: attrs.required("notification_type")?,
            subscribers: attrs.list_with("subscribers", |subscriber| {
                Ok(Subscriber {
                    protocol: subscriber.required("protocol")?,
                    address: subscriber.required_with("address", non_empty())?,
                })
            })?,
        })
    }

    /// The Terraform form, with subscribers split by protocol.
    fn block(&self) -> Value {
        let addresses = |protocol: SubscriberProtocol| {
            self.subscribers
                .iter()
                .filter(|s| s.protocol == protocol)
                .map(|s| s.address.clone())
                .collect::<Vec<_>>()
        };
        let mut block = Map::new();
        block.insert("comparison_operator".to_owned(), json!(self.comparison_operator));
        block.insert("threshold".to_owned(), json!(self.threshold));
        block.insert("threshold_type".to_owned(), json!(self.threshold_type));
        block.insert("notification_type".to_owned(), json!(self.notification_type));
        let emails = addresses(SubscriberProtocol::Email);
        if !emails.is_empty() {
            block.insert("subscriber_email_addresses".to_owned(), json!(emails));
        }
        let topics = addresses(SubscriberProtocol::Sns);
        if !topics.is_empty() {
            block.insert("subscriber_sns_topic_arns".to_owned(), json!(topics));
        }
        Value::Object(block)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlannedLimit {
    pub start_time: String,
    pub amount: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Budget {
    pub name: String,
    pub budget_type: BudgetType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_amount: Option<String>,
    pub limit_unit: String,
    pub time_unit: TimeUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_period_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_period_end: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planned_limit: Vec<PlannedLimit>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notification: Vec<Notification>,
    /// Arguments without a schema, rendered as given.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct BudgetOutputs {
    pub id: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BudgetComputed {
    pub notification_count: usize,
    pub has_email_notifications: bool,
    pub has_sns_notifications: bool,
    /// `limit_amount` scaled to one month, absent for planned limits.
    pub monthly_limit: Option<f64>,
}

impl Budget {
    fn has_subscriber(&self, protocol: SubscriberProtocol) -> bool {
        self.notification
            .iter()
            .flat_map(|n| n.subscribers.iter())
            .any(|s| s.protocol == protocol)
    }
}

impl Resource for Budget {
    const TYPE: &'static str = "aws_budgets_budget";
    const UNKNOWN_KEYS: UnknownKeys = UnknownKeys::Lax;

    type Outputs = BudgetOutputs;
    type Computed = BudgetComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(Budget {
            name: attrs.required_with("name", max_length(100))?,
            budget_type: attrs.required("budget_type")?,
            limit_amount: attrs.optional_with("limit_amount", decimal())?,
            limit_unit: attrs.or_default_with("limit_unit", "USD".to_owned(), non_empty())?,
            time_unit: attrs.required("time_unit")?,
            time_period_start: attrs.optional_with("time_period_start", timestamp())?,
            time_period_end: attrs.optional_with("time_period_end", timestamp())?,
            planned_limit: attrs.list_with("planned_limit", |limit| {
                Ok(PlannedLimit {
                    start_time: limit.required_with("start_time", timestamp())?,
                    amount: limit.required_with("amount", decimal())?,
                    unit: limit.or_default_with("unit", "USD".to_owned(), non_empty())?,
                })
            })?,
            notification: attrs.list_with("notification", Notification::parse)?,
            extra: attrs.remaining(),
        })
    }

    fn validate(&self) -> Result<()> {
        let check = Consistency::of(Self::TYPE, self)?;
        check.exactly_one_of(&[
            ("limit_amount", self.limit_amount.is_some()),
            ("planned_limit", !self.planned_limit.is_empty()),
        ])?;

        let start = self.time_period_start.as_deref().and_then(parse_time);
        let end = self.time_period_end.as_deref().and_then(parse_time);
        if let (Some(start), Some(end)) = (start, end) {
            check.ensure(
                start < end,
                &["time_period_start", "time_period_end"],
                "time_period_start must be before time_period_end",
            )?;
        }

        let starts: Vec<NaiveDateTime> = self
            .planned_limit
            .iter()
            .filter_map(|limit| parse_time(&limit.start_time))
            .collect();
        check.strictly_increasing("planned_limit", &starts)?;

        for (index, notification) in self.notification.iter().enumerate() {
            let path = format!("notification[{index}]");
            check.ensure(
                !notification.subscribers.is_empty(),
                &[format!("{path}.subscribers").as_str()],
                "each notification needs at least one subscriber",
            )?;
            if notification.threshold_type == ThresholdType::Percentage {
                check.ensure(
                    notification.threshold <= 1000.0,
                    &[
                        format!("{path}.threshold").as_str(),
                        format!("{path}.threshold_type").as_str(),
                    ],
                    "PERCENTAGE thresholds must be at most 1000",
                )?;
            }
            for (i, subscriber) in notification.subscribers.iter().enumerate() {
                let address = format!("{path}.subscribers[{i}].address");
                let protocol = format!("{path}.subscribers[{i}].protocol");
                let valid = match subscriber.protocol {
                    SubscriberProtocol::Email => email().check(&subscriber.address).is_ok(),
                    SubscriberProtocol::Sns => arn("sns").check(&subscriber.address).is_ok(),
                };
                check.ensure(
                    valid,
                    &[protocol.as_str(), address.as_str()],
                    format!(
                        "{} subscribers need {}",
                        subscriber.protocol,
                        match subscriber.protocol {
                            SubscriberProtocol::Email => "an email address",
                            SubscriberProtocol::Sns => "an SNS topic ARN",
                        }
                    ),
                )?;
            }
        }
        Ok(())
    }

    fn computed(&self) -> BudgetComputed {
        BudgetComputed {
            notification_count: self.notification.len(),
            has_email_notifications: self.has_subscriber(SubscriberProtocol::Email),
            has_sns_notifications: self.has_subscriber(SubscriberProtocol::Sns),
            monthly_limit: self
                .limit_amount
                .as_deref()
                .and_then(|amount| amount.parse::<f64>().ok())
                .map(|amount| cost::round_cents(amount * self.time_unit.per_month())),
        }
    }

    fn block(&self) -> Result<Value> {
        let mut block = Map::new();
        block.insert("name".to_owned(), json!(self.name));
        block.insert("budget_type".to_owned(), json!(self.budget_type));
        if let Some(amount) = &self.limit_amount {
            block.insert("limit_amount".to_owned(), json!(amount));
            block.insert("limit_unit".to_owned(), json!(self.limit_unit));
        }
        block.insert("time_unit".to_owned(), json!(self.time_unit));
        if let Some(start) = &self.time_period_start {
            block.insert("time_period_start".to_owned(), json!(start));
        }
        if let Some(end) = &self.time_period_end {
            block.insert("time_period_end".to_owned(), json!(end));
        }
        if !self.planned_limit.is_empty() {
            block.insert("planned_limit".to_owned(), json!(self.planned_limit));
        }
        if !self.notification.is_empty() {
            let notifications: Vec<Value> =
                self.notification.iter().map(Notification::block).collect();
            block.insert("notification".to_owned(), Value::Array(notifications));
        }
        for (key, value) in self.extra.iter() {
            block
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        Ok(Value::Object(block))
    }
}
