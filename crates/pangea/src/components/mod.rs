//! Components compose several resources behind one validated input.
use serde_json::Value;

use crate::{validators, Attributes, Result, Synthesizer, UnknownKeys};

pub mod public_private_subnets;

/// A validated group of resources declared together.
pub trait Component:
    core::fmt::Debug + Clone + PartialEq + serde::Serialize + Sized + 'static
{
    /// Name of the component kind, eg `public_private_subnets`.
    const KIND: &'static str;

    /// What declaring the component returns.
    type Reference;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self>;

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn from_input(input: &Value) -> Result<Self> {
        log::debug!("parsing component {}", Self::KIND);
        let mut attrs = Attributes::new(Self::KIND, UnknownKeys::Strict, input)?;
        let component = Self::parse(&mut attrs)?;
        attrs.finish()?;
        component.validate()?;
        Ok(component)
    }

    /// Declares every resource of the component, prefixing their names with
    /// `name`.
    fn build<S: Synthesizer + ?Sized>(&self, synth: &mut S, name: &str) -> Result<Self::Reference>;
}

/// Parses, validates and declares a component from a raw input mapping.
pub fn declare<C, S>(synth: &mut S, name: &str, input: &Value) -> Result<C::Reference>
where
    C: Component,
    S: Synthesizer + ?Sized,
{
    validators::check_resource_name(C::KIND, name)?;
    let component = C::from_input(input)?;
    component.build(synth, name)
}
