//! Provides derive macros for `pangea::Outputs`.
use quote::quote;
use syn::{ext::IdentExt, Data, DataStruct, DeriveInput, Fields, FieldsNamed};

struct OutputField {
    ident: syn::Ident,
    attribute: String,
}

fn get_output_fields(input: &DeriveInput) -> syn::Result<Vec<OutputField>> {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(FieldsNamed { named, .. }),
            ..
        }) => named,
        _ => {
            return Err(syn::Error::new(
                name.span(),
                "deriving Outputs only supports structs with named fields".to_string(),
            ));
        }
    };

    let mut outputs = vec![];
    for field in fields.iter() {
        // UNWRAP: safe because we only support structs (which all have named fields)
        let ident = field.ident.clone().unwrap();
        let mut attribute = ident.unraw().to_string();
        for att in field.attrs.iter() {
            if att.path().is_ident("output") {
                att.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        let value = meta.value()?;
                        let renamed: syn::LitStr = value.parse()?;
                        attribute = renamed.value();
                        Ok(())
                    } else {
                        Err(meta.error(format!(
                            "unsupported field attribute {:?} - must be 'rename'",
                            meta.path
                                .get_ident()
                                .map(|id| id.to_string())
                                .unwrap_or("unknown".to_string())
                        )))
                    }
                })?;
            }
        }
        outputs.push(OutputField { ident, attribute });
    }

    if outputs.is_empty() {
        return Err(syn::Error::new(
            name.span(),
            "deriving Outputs requires at least one output field".to_string(),
        ));
    }
    Ok(outputs)
}

/// Derives `pangea::Outputs` for a struct of `String` fields.
///
/// Each field holds the placeholder `${<type>.<name>.<field>}` of the Terraform
/// attribute with the same name. Use `#[output(rename = "...")]` when the
/// attribute name is not a valid Rust identifier.
#[proc_macro_derive(Outputs, attributes(output))]
pub fn derive_outputs(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input: DeriveInput = syn::parse_macro_input!(input);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match get_output_fields(&input) {
        Ok(fields) => fields,
        Err(e) => return e.into_compile_error().into(),
    };
    let idents: Vec<_> = fields.iter().map(|f| &f.ident).collect();
    let attributes: Vec<_> = fields.iter().map(|f| f.attribute.as_str()).collect();

    let output = quote! {
        impl #impl_generics pangea::Outputs for #name #ty_generics #where_clause {
            const FIELDS: &'static [&'static str] = &[#(#attributes),*];

            fn for_resource(resource_type: &str, name: &str) -> Self {
                #name {
                    #(#idents: pangea::placeholder(resource_type, name, #attributes),)*
                }
            }

            fn to_map(&self) -> ::std::collections::BTreeMap<&'static str, String> {
                let mut map = ::std::collections::BTreeMap::new();
                #(map.insert(#attributes, self.#idents.clone());)*
                map
            }
        }
    };
    output.into()
}
