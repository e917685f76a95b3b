//! Named, reusable validators.
//!
//! Field constraints implement [`Constraint`] and are handed to the
//! `*_with` readers of [`Attributes`](crate::Attributes). Checks that span
//! several fields of a parsed record go through [`Consistency`].
//!
//! Format constraints on strings accept values that interpolate another
//! resource's outputs, since those are only known once applied.
use std::{
    collections::{BTreeMap, BTreeSet},
    net::{Ipv4Addr, Ipv6Addr},
    sync::LazyLock,
};

use regex::Regex;
use serde_json::{Map, Value};

use snafu::prelude::*;

use crate::{
    reference::is_interpolated, schema::Rule, Error, Result, SchemaViolationSnafu, SerializeSnafu,
};

/// A constraint on a single field value.
pub trait Constraint<T: ?Sized> {
    fn check(&self, value: &T) -> Result<(), Rule>;
}

impl<T: ?Sized, F: Fn(&T) -> Result<(), Rule>> Constraint<T> for F {
    fn check(&self, value: &T) -> Result<(), Rule> {
        self(value)
    }
}

pub struct EnumOf(&'static [&'static str]);

/// The value must be one of `allowed`.
pub fn enum_of(allowed: &'static [&'static str]) -> EnumOf {
    EnumOf(allowed)
}

impl Constraint<String> for EnumOf {
    fn check(&self, value: &String) -> Result<(), Rule> {
        if self.0.contains(&value.as_str()) {
            Ok(())
        } else {
            Err(Rule::NotInSet {
                allowed: self.0.iter().map(|s| s.to_string()).collect(),
            })
        }
    }
}

pub struct Matches {
    description: &'static str,
    regex: &'static LazyLock<Regex>,
}

/// The value must match `regex`, described to users as `description`.
pub fn matches(description: &'static str, regex: &'static LazyLock<Regex>) -> Matches {
    Matches { description, regex }
}

impl Constraint<String> for Matches {
    fn check(&self, value: &String) -> Result<(), Rule> {
        if is_interpolated(value) || self.regex.is_match(value) {
            Ok(())
        } else {
            Err(Rule::Pattern {
                description: self.description.to_owned(),
            })
        }
    }
}

static RESOURCE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").unwrap());
static ACCOUNT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{12}$").unwrap());
static AVAILABILITY_ZONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-gov)?-[a-z]+-\d[a-z]$").unwrap());
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

/// A 12 digit AWS account id.
pub fn account_id() -> Matches {
    matches("12 digits", &ACCOUNT_ID)
}

/// An availability zone name such as `us-east-1a`.
pub fn availability_zone() -> Matches {
    matches("an availability zone such as us-east-1a", &AVAILABILITY_ZONE)
}

pub fn email() -> Matches {
    matches("an email address", &EMAIL)
}

/// Checks an instance name for the resource emitter.
pub(crate) fn check_resource_name(resource_type: &'static str, name: &str) -> Result<()> {
    // Instance names are never interpolated.
    ensure!(
        RESOURCE_NAME.is_match(name),
        SchemaViolationSnafu {
            resource_type,
            field: "name",
            rule: Rule::Pattern {
                description: "a letter or underscore followed by letters, digits, '_' or '-'"
                    .to_owned(),
            },
            received: Value::String(name.to_owned()),
        }
    );
    Ok(())
}

pub struct InRange<T> {
    min: Option<T>,
    max: Option<T>,
}

/// The value must be within `min..=max`.
pub fn in_range<T>(min: T, max: T) -> InRange<T> {
    InRange {
        min: Some(min),
        max: Some(max),
    }
}

pub fn at_least<T>(min: T) -> InRange<T> {
    InRange {
        min: Some(min),
        max: None,
    }
}

impl<T: PartialOrd + core::fmt::Display> Constraint<T> for InRange<T> {
    fn check(&self, value: &T) -> Result<(), Rule> {
        let too_small = self.min.as_ref().is_some_and(|min| value < min);
        let too_large = self.max.as_ref().is_some_and(|max| value > max);
        if too_small || too_large {
            Err(Rule::OutOfRange {
                min: self.min.as_ref().map(|m| m.to_string()),
                max: self.max.as_ref().map(|m| m.to_string()),
            })
        } else {
            Ok(())
        }
    }
}

pub struct Length {
    min: Option<usize>,
    max: Option<usize>,
}

/// Character count of a string, or item count of a list, within `min..=max`.
pub fn length(min: usize, max: usize) -> Length {
    Length {
        min: Some(min),
        max: Some(max),
    }
}

pub fn non_empty() -> Length {
    Length {
        min: Some(1),
        max: None,
    }
}

pub fn max_length(max: usize) -> Length {
    Length {
        min: None,
        max: Some(max),
    }
}

impl Length {
    fn check_len(&self, len: usize) -> Result<(), Rule> {
        let too_short = self.min.is_some_and(|min| len < min);
        let too_long = self.max.is_some_and(|max| len > max);
        if too_short || too_long {
            Err(Rule::Length {
                min: self.min,
                max: self.max,
            })
        } else {
            Ok(())
        }
    }
}

impl Constraint<String> for Length {
    fn check(&self, value: &String) -> Result<(), Rule> {
        self.check_len(value.chars().count())
    }
}

impl<T> Constraint<Vec<T>> for Length {
    fn check(&self, value: &Vec<T>) -> Result<(), Rule> {
        self.check_len(value.len())
    }
}

pub struct Each<C>(C);

/// Applies `constraint` to every item of a list.
pub fn each<C>(constraint: C) -> Each<C> {
    Each(constraint)
}

impl<T, C: Constraint<T>> Constraint<Vec<T>> for Each<C> {
    fn check(&self, value: &Vec<T>) -> Result<(), Rule> {
        for (index, item) in value.iter().enumerate() {
            self.0.check(item).map_err(|rule| Rule::Item {
                index,
                rule: Box::new(rule),
            })?;
        }
        Ok(())
    }
}

/// Both constraints must hold.
pub struct Both<A, B>(A, B);

pub fn both<A, B>(a: A, b: B) -> Both<A, B> {
    Both(a, b)
}

impl<T, A: Constraint<T>, B: Constraint<T>> Constraint<T> for Both<A, B> {
    fn check(&self, value: &T) -> Result<(), Rule> {
        self.0.check(value)?;
        self.1.check(value)
    }
}

/// An IPv4 CIDR block whose address is the network address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ipv4Cidr {
    network: u32,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn parse(s: &str) -> Option<Self> {
        let (addr, prefix) = s.split_once('/')?;
        let addr: Ipv4Addr = addr.parse().ok()?;
        // Reject "+8", "08" and friends that u8 parsing would accept.
        if prefix.is_empty()
            || !prefix.chars().all(|c| c.is_ascii_digit())
            || (prefix.len() > 1 && prefix.starts_with('0'))
        {
            return None;
        }
        let prefix: u8 = prefix.parse().ok()?;
        if prefix > 32 {
            return None;
        }
        let network = u32::from(addr);
        let cidr = Ipv4Cidr { network, prefix };
        (network & cidr.mask() == network).then_some(cidr)
    }

    fn mask(&self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix))
        }
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn address_count(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }

    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        self.prefix <= other.prefix && other.network & self.mask() == self.network
    }

    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Whether the block lies inside one of the RFC 1918 private ranges.
    pub fn is_private(&self) -> bool {
        ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16"]
            .iter()
            .filter_map(|range| Ipv4Cidr::parse(range))
            .any(|range| range.contains(self))
    }
}

impl core::fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", Ipv4Addr::from(self.network), self.prefix)
    }
}

pub struct CidrBlock {
    min_prefix: u8,
    max_prefix: u8,
}

/// An IPv4 CIDR block in network form, eg `10.0.0.0/16`.
pub fn cidr_block() -> CidrBlock {
    CidrBlock {
        min_prefix: 0,
        max_prefix: 32,
    }
}

/// An IPv4 CIDR block with a prefix length within `min..=max`.
pub fn cidr_block_sized(min_prefix: u8, max_prefix: u8) -> CidrBlock {
    CidrBlock {
        min_prefix,
        max_prefix,
    }
}

impl Constraint<String> for CidrBlock {
    fn check(&self, value: &String) -> Result<(), Rule> {
        if is_interpolated(value) {
            return Ok(());
        }
        let cidr = Ipv4Cidr::parse(value).ok_or_else(|| Rule::Pattern {
            description: "an IPv4 CIDR block in network form such as 10.0.0.0/16".to_owned(),
        })?;
        if cidr.prefix < self.min_prefix || cidr.prefix > self.max_prefix {
            return Err(Rule::Invalid {
                reason: format!(
                    "must have a prefix length between /{} and /{}",
                    self.min_prefix, self.max_prefix
                ),
            });
        }
        Ok(())
    }
}

/// An IPv6 CIDR block such as `2600:1f18::/56`.
pub fn ipv6_cidr_block() -> impl Constraint<String> {
    |value: &String| {
        let valid = is_interpolated(value)
            || value.split_once('/').is_some_and(|(addr, prefix)| {
                addr.parse::<Ipv6Addr>().is_ok() && prefix.parse::<u8>().is_ok_and(|p| p <= 128)
            });
        if valid {
            Ok(())
        } else {
            Err(Rule::Pattern {
                description: "an IPv6 CIDR block such as 2600:1f18::/56".to_owned(),
            })
        }
    }
}

/// A dotted IPv4 address.
pub fn ipv4_address() -> impl Constraint<String> {
    |value: &String| {
        if is_interpolated(value) || value.parse::<Ipv4Addr>().is_ok() {
            Ok(())
        } else {
            Err(Rule::Pattern {
                description: "an IPv4 address".to_owned(),
            })
        }
    }
}

/// The parts of an Amazon Resource Name.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedArn<'a> {
    pub partition: &'a str,
    pub service: &'a str,
    pub region: &'a str,
    pub account: &'a str,
    pub resource: &'a str,
}

pub fn parse_arn(s: &str) -> Option<ParsedArn<'_>> {
    let mut parts = s.splitn(6, ':');
    if parts.next()? != "arn" {
        return None;
    }
    let arn = ParsedArn {
        partition: parts.next()?,
        service: parts.next()?,
        region: parts.next()?,
        account: parts.next()?,
        resource: parts.next()?,
    };
    let valid = ["aws", "aws-cn", "aws-us-gov"].contains(&arn.partition)
        && !arn.service.is_empty()
        && !arn.resource.is_empty()
        && (arn.account.is_empty() || ACCOUNT_ID.is_match(arn.account));
    valid.then_some(arn)
}

pub struct Arn {
    services: Vec<&'static str>,
}

/// An ARN of the given AWS service, eg `arn("sns")`.
pub fn arn(service: &'static str) -> Arn {
    Arn {
        services: vec![service],
    }
}

/// An ARN of any of the given services.
pub fn arn_of(services: &[&'static str]) -> Arn {
    Arn {
        services: services.to_vec(),
    }
}

/// An ARN of any service.
pub fn any_arn() -> Arn {
    Arn { services: vec![] }
}

impl Constraint<String> for Arn {
    fn check(&self, value: &String) -> Result<(), Rule> {
        if is_interpolated(value) {
            return Ok(());
        }
        let description = if self.services.is_empty() {
            "an ARN such as arn:aws:<service>:<region>:<account>:<resource>".to_owned()
        } else {
            format!(
                "an ARN of service {}",
                self.services.join(" or ")
            )
        };
        match parse_arn(value) {
            Some(arn) if self.services.is_empty() || self.services.contains(&arn.service) => {
                Ok(())
            }
            _ => Err(Rule::Pattern { description }),
        }
    }
}

pub struct Tags;

/// AWS tag restrictions: keys of 1..=128 characters not starting with
/// `aws:`, values of at most 256 characters, at most 50 tags.
pub fn tags() -> Tags {
    Tags
}

impl Constraint<BTreeMap<String, String>> for Tags {
    fn check(&self, value: &BTreeMap<String, String>) -> Result<(), Rule> {
        if value.len() > 50 {
            return Err(Rule::Invalid {
                reason: "must have at most 50 tags".to_owned(),
            });
        }
        for (key, tag_value) in value {
            let key_len = key.chars().count();
            if key_len == 0 || key_len > 128 {
                return Err(Rule::Invalid {
                    reason: format!("tag key '{key}' must have a length of 1..=128"),
                });
            }
            if key.starts_with("aws:") {
                return Err(Rule::Invalid {
                    reason: format!("tag key '{key}' uses the reserved 'aws:' prefix"),
                });
            }
            if tag_value.chars().count() > 256 {
                return Err(Rule::Invalid {
                    reason: format!("tag value of '{key}' must have a length of at most 256"),
                });
            }
        }
        Ok(())
    }
}

/// Cross-field checks over one parsed record.
///
/// Failures become [`Error::ConsistencyViolation`], carrying the values of
/// the involved fields as found in the serialized record.
#[derive(Debug)]
pub struct Consistency {
    resource_type: &'static str,
    record: Value,
}

/// Looks up `a.b[1].c` style paths.
fn lookup<'v>(record: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = record;
    for segment in path.split('.') {
        let (key, index) = match segment.split_once('[') {
            Some((key, rest)) => (key, rest.strip_suffix(']')?.parse::<usize>().ok()),
            None => (segment, None),
        };
        current = current.get(key)?;
        if let Some(index) = index {
            current = current.get(index)?;
        }
    }
    Some(current)
}

impl Consistency {
    pub fn of<R: serde::Serialize>(resource_type: &'static str, record: &R) -> Result<Self> {
        let record = serde_json::to_value(record).context(SerializeSnafu {
            name: resource_type,
        })?;
        Ok(Consistency {
            resource_type,
            record,
        })
    }

    pub fn violation(&self, fields: &[&str], rule: impl Into<String>) -> Error {
        let mut received = Map::new();
        for field in fields {
            if let Some(value) = lookup(&self.record, field) {
                received.insert(field.to_string(), value.clone());
            }
        }
        Error::ConsistencyViolation {
            resource_type: self.resource_type.to_owned(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            rule: rule.into(),
            received: Value::Object(received),
        }
    }

    pub fn ensure(&self, condition: bool, fields: &[&str], rule: impl Into<String>) -> Result<()> {
        if condition {
            Ok(())
        } else {
            Err(self.violation(fields, rule))
        }
    }

    /// Exactly one of the `(field, is_set)` pairs may be set.
    pub fn exactly_one_of(&self, fields: &[(&str, bool)]) -> Result<()> {
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let set: Vec<&str> = fields
            .iter()
            .filter(|(_, is_set)| *is_set)
            .map(|(name, _)| *name)
            .collect();
        match set.len() {
            1 => Ok(()),
            0 => Err(self.violation(
                &names,
                format!("exactly one of {} must be set", names.join(", ")),
            )),
            _ => Err(self.violation(
                &set,
                format!(
                    "{} are mutually exclusive, only one of {} may be set",
                    set.join(" and "),
                    names.join(", ")
                ),
            )),
        }
    }

    /// At most one of the `(field, is_set)` pairs may be set.
    pub fn at_most_one_of(&self, fields: &[(&str, bool)]) -> Result<()> {
        if fields.iter().filter(|(_, is_set)| *is_set).count() <= 1 {
            Ok(())
        } else {
            self.exactly_one_of(fields)
        }
    }

    /// When `field` is set, `required` must be set too.
    pub fn requires(&self, field: (&str, bool), required: (&str, bool)) -> Result<()> {
        self.ensure(
            !field.1 || required.1,
            &[field.0, required.0],
            format!("{} requires {} to be set", field.0, required.0),
        )
    }

    /// When `field` is set, `forbidden` must not be.
    pub fn forbids(&self, field: (&str, bool), forbidden: (&str, bool)) -> Result<()> {
        self.ensure(
            !(field.1 && forbidden.1),
            &[field.0, forbidden.0],
            format!("{} must not be set together with {}", forbidden.0, field.0),
        )
    }

    /// `lo` must not exceed `hi`.
    pub fn ordered<T: PartialOrd + core::fmt::Display>(
        &self,
        lo: (&str, T),
        hi: (&str, T),
    ) -> Result<()> {
        self.ensure(
            lo.1 <= hi.1,
            &[lo.0, hi.0],
            format!(
                "invalid range: {} ({}) must not exceed {} ({})",
                lo.0, lo.1, hi.0, hi.1
            ),
        )
    }

    /// Items of `field` must be in strictly increasing order.
    pub fn strictly_increasing<T: PartialOrd + core::fmt::Display>(
        &self,
        field: &str,
        values: &[T],
    ) -> Result<()> {
        for (index, pair) in values.windows(2).enumerate() {
            if pair[0] >= pair[1] {
                return Err(self.violation(
                    &[field],
                    format!(
                        "{field} must be in chronological order, item {} ({}) does not follow item {index} ({})",
                        index + 1,
                        pair[1],
                        pair[0]
                    ),
                ));
            }
        }
        Ok(())
    }

    /// No value may appear twice across `fields`; `what` names the values in
    /// the message, eg "CIDR blocks".
    pub fn no_duplicates<'v>(
        &self,
        fields: &[&str],
        what: &str,
        values: impl IntoIterator<Item = &'v str>,
    ) -> Result<()> {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for value in values {
            if !seen.insert(value) {
                duplicates.insert(value);
            }
        }
        self.ensure(
            duplicates.is_empty(),
            fields,
            format!(
                "duplicate {what}: {}",
                duplicates.into_iter().collect::<Vec<_>>().join(", ")
            ),
        )
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn ok<C: Constraint<String>>(c: &C, value: &str) -> bool {
        c.check(&value.to_owned()).is_ok()
    }

    #[test]
    fn cidr_blocks() {
        assert!(ok(&cidr_block(), "10.0.0.0/16"));
        assert!(ok(&cidr_block(), "0.0.0.0/0"));
        assert!(!ok(&cidr_block(), "10.0.1.5/24"));
        assert!(!ok(&cidr_block(), "10.0.0.0/33"));
        assert!(!ok(&cidr_block(), "10.0.0.0"));
        assert!(!ok(&cidr_block(), "10.0.0.0/+8"));
        assert!(!ok(&cidr_block_sized(16, 28), "10.0.0.0/8"));
        assert!(ok(&ipv6_cidr_block(), "2600:1f18::/56"));
        assert!(!ok(&ipv6_cidr_block(), "10.0.0.0/16"));
    }

    #[test]
    fn interpolated_values_skip_format_checks() {
        assert!(ok(&arn("elasticloadbalancing"), "${aws_lb.web.arn}"));
        assert!(ok(&cidr_block_sized(16, 28), "${aws_vpc.main.cidr_block}"));
        assert!(ok(&ipv6_cidr_block(), "${aws_vpc.main.ipv6_cidr_block}"));
        assert!(ok(&ipv4_address(), "${aws_instance.web.private_ip}"));
        assert!(ok(&account_id(), "${aws_s3_bucket.uploads.bucket_owner}"));
        assert!(!ok(&arn("sns"), "${not a reference}"));
        assert!(check_resource_name("aws_vpc", "${aws_vpc.main.id}").is_err());
    }

    #[test]
    fn cidr_arithmetic() {
        let vpc = Ipv4Cidr::parse("10.0.0.0/16").unwrap();
        let subnet = Ipv4Cidr::parse("10.0.1.0/24").unwrap();
        let other = Ipv4Cidr::parse("10.1.0.0/24").unwrap();
        assert!(vpc.contains(&subnet));
        assert!(!subnet.contains(&vpc));
        assert!(vpc.overlaps(&subnet));
        assert!(!vpc.overlaps(&other));
        assert_eq!(65536, vpc.address_count());
        assert!(vpc.is_private());
        assert!(!Ipv4Cidr::parse("8.8.8.0/24").unwrap().is_private());
        assert_eq!("10.0.1.0/24", subnet.to_string());
    }

    #[test]
    fn arns() {
        let parsed = parse_arn("arn:aws:sns:us-east-1:123456789012:alerts").unwrap();
        assert_eq!("sns", parsed.service);
        assert_eq!("123456789012", parsed.account);
        assert_eq!("alerts", parsed.resource);

        assert!(ok(&arn("sns"), "arn:aws:sns:us-east-1:123456789012:alerts"));
        assert!(!ok(&arn("sqs"), "arn:aws:sns:us-east-1:123456789012:alerts"));
        assert!(ok(&arn_of(&["acm", "iam"]), "arn:aws:iam::123456789012:server-certificate/x"));
        assert!(ok(&any_arn(), "arn:aws:s3:::my-bucket"));
        assert!(!ok(&any_arn(), "arn:aws:s3:::"));
        assert!(!ok(&any_arn(), "arn:aws:s3::1234:bucket"));
        assert!(!ok(&any_arn(), "not-an-arn"));
    }

    #[test]
    fn tag_rules() {
        let mut tags = BTreeMap::new();
        tags.insert("Name".to_owned(), "web".to_owned());
        assert!(super::tags().check(&tags).is_ok());
        tags.insert("aws:reserved".to_owned(), "x".to_owned());
        assert!(super::tags().check(&tags).is_err());
    }

    #[test]
    fn each_reports_the_item() {
        let values = vec!["10.0.0.0/16".to_owned(), "nope".to_owned()];
        let rule = each(cidr_block()).check(&values).unwrap_err();
        assert!(matches!(rule, Rule::Item { index: 1, .. }));
    }

    #[test]
    fn exactly_one_of_names_the_conflicting_fields() {
        let record = json!({ "a": "x", "b": "y" });
        let check = Consistency::of("test_thing", &record).unwrap();
        let err = check
            .exactly_one_of(&[("a", true), ("b", true), ("c", false)])
            .unwrap_err();
        assert!(err.is_consistency_violation());
        assert_eq!(vec!["a", "b"], err.fields());
        assert_eq!(Some(&json!({ "a": "x", "b": "y" })), err.received());

        let err = check
            .exactly_one_of(&[("a", false), ("b", false)])
            .unwrap_err();
        assert_eq!(
            Some("exactly one of a, b must be set".to_owned()),
            err.rule()
        );
    }

    #[test]
    fn unserializable_records_are_errors() {
        let mut record = BTreeMap::new();
        record.insert((1, 2), "pair keys have no JSON form");
        let err = Consistency::of("test_thing", &record).unwrap_err();
        assert!(matches!(&err, Error::Serialize { name, .. } if name == "test_thing"));
    }

    #[test]
    fn ordered_and_increasing() {
        let record = json!({ "scaling": { "min": 5, "max": 2 } });
        let check = Consistency::of("test_thing", &record).unwrap();
        let err = check
            .ordered(("scaling.min", 5), ("scaling.max", 2))
            .unwrap_err();
        assert_eq!(Some(&json!({ "scaling.min": 5, "scaling.max": 2 })), err.received());
        assert!(check.ordered(("scaling.min", 2), ("scaling.max", 2)).is_ok());

        assert!(check.strictly_increasing("dates", &[1, 2, 3]).is_ok());
        assert!(check.strictly_increasing("dates", &[1, 3, 3]).is_err());
    }

    #[test]
    fn duplicates() {
        let check = Consistency::of("test_thing", &json!({})).unwrap();
        let err = check
            .no_duplicates(&["left", "right"], "CIDR blocks", ["a", "b", "a"])
            .unwrap_err();
        assert_eq!(Some("duplicate CIDR blocks: a".to_owned()), err.rule());
    }

    #[test]
    fn lookup_paths() {
        let record = json!({ "items": [{ "name": "zero" }, { "name": "one" }] });
        assert_eq!(Some(&json!("one")), lookup(&record, "items[1].name"));
        assert_eq!(None, lookup(&record, "items[2].name"));
    }
}
