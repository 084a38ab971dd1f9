use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, ExprUnary, Fields, Lit, Meta, Token, UnOp,
    Visibility, ext::IdentExt, parse_macro_input,
};

/// Helper enum for parsed attribute values
enum MetaValue {
    Str(String),
    Expr(Expr),
    Flag,
}

/// Derives `multiload::Config` for a struct with named fields.
///
/// Only `pub` fields are visited by loaders. Field options go in
/// `#[config(...)]`:
///
/// - `default = <literal>`: applied by the tag loader when the field is zero
/// - `required`: a zero value fails validation
/// - `flag_usage = "..."`: help text of the generated flag
/// - `flatten`: children of this field are named without it
/// - `skip`: never visited
/// - `name = "..."`: name used to build keys instead of the field name
/// - `apply_defaults`: run the field type's `ApplyDefaults` hook
///
/// On the struct, `name = "..."` overrides the type name used as the default
/// environment prefix, and `apply_defaults` runs the struct's own hook.
#[proc_macro_derive(Config, attributes(config))]
pub fn derive_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_config(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_config(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let record = parse_record_config(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "#[derive(Config)] only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "#[derive(Config)] only supports structs",
            ));
        }
    };

    let mut field_refs = Vec::new();
    let mut field_hooks = Vec::new();

    for field in fields {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let config = parse_field_config(&field.attrs)?;

        if !matches!(field.vis, Visibility::Public(_)) {
            // Loaders never see private fields.
            if config.has_options() && !config.skip {
                return Err(syn::Error::new_spanned(
                    field_ident,
                    "#[config(...)] has no effect on a non-pub field; make it pub or use #[config(skip)]",
                ));
            }
            continue;
        }
        if config.skip {
            continue;
        }

        let name = config
            .name
            .clone()
            .unwrap_or_else(|| field_ident.unraw().to_string());
        let default = match &config.default {
            Some(value) => quote! { ::core::option::Option::Some(#value) },
            None => quote! { ::core::option::Option::None },
        };
        let flag_usage = match &config.flag_usage {
            Some(usage) => quote! { ::core::option::Option::Some(#usage) },
            None => quote! { ::core::option::Option::None },
        };
        let required = config.required;
        let flatten = config.flatten;

        field_refs.push(quote! {
            ::multiload::FieldRef::new(
                {
                    const INFO: ::multiload::FieldInfo = ::multiload::FieldInfo {
                        name: #name,
                        default: #default,
                        required: #required,
                        flag_usage: #flag_usage,
                        flatten: #flatten,
                    };
                    &INFO
                },
                &mut self.#field_ident,
            )
        });

        if config.apply_defaults {
            field_hooks.push(quote! {
                ::multiload::ApplyDefaults::apply_defaults(&mut self.#field_ident);
            });
        }
    }

    let type_name = record
        .name
        .unwrap_or_else(|| struct_name.unraw().to_string());

    let apply_defaults = if field_hooks.is_empty() && !record.apply_defaults {
        quote! {}
    } else {
        let own_hook = record.apply_defaults.then(|| {
            quote! { ::multiload::ApplyDefaults::apply_defaults(self); }
        });
        quote! {
            fn apply_defaults(&mut self) -> bool {
                #(#field_hooks)*
                #own_hook
                true
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::multiload::Config for #struct_name #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn fields(&mut self) -> ::std::vec::Vec<::multiload::FieldRef<'_>> {
                ::std::vec![#(#field_refs),*]
            }

            #apply_defaults
        }

        impl #impl_generics ::multiload::Field for #struct_name #ty_generics #where_clause {
            fn node(&mut self) -> ::multiload::Node<'_> {
                ::multiload::Node::Record(self)
            }
        }
    })
}

#[derive(Debug, Default)]
struct RecordConfig {
    name: Option<String>,
    apply_defaults: bool,
}

#[derive(Debug, Default)]
struct FieldConfig {
    name: Option<String>,
    default: Option<String>,
    required: bool,
    flag_usage: Option<String>,
    flatten: bool,
    skip: bool,
    apply_defaults: bool,
}

impl FieldConfig {
    fn has_options(&self) -> bool {
        self.name.is_some()
            || self.default.is_some()
            || self.required
            || self.flag_usage.is_some()
            || self.flatten
            || self.apply_defaults
    }
}

/// Parse #[config(name = "x", default = 10, required)] syntax
fn parse_config_list(meta_list: &syn::MetaList) -> syn::Result<HashMap<String, MetaValue>> {
    let mut values = HashMap::new();

    meta_list.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("expected identifier"))?
            .to_string();

        if meta.input.peek(Token![=]) {
            meta.input.parse::<Token![=]>()?;

            if key == "name" || key == "flag_usage" {
                let value: syn::LitStr = meta.input.parse()?;
                values.insert(key, MetaValue::Str(value.value()));
            } else {
                let expr: Expr = meta.input.parse()?;
                values.insert(key, MetaValue::Expr(expr));
            }
        } else {
            values.insert(key, MetaValue::Flag);
        }

        Ok(())
    })?;

    Ok(values)
}

/// Parses every #[config(...)] attribute on an item
fn collect_config(
    attrs: &[Attribute],
) -> syn::Result<Vec<(&Attribute, HashMap<String, MetaValue>)>> {
    let mut parsed = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("config")) {
        match &attr.meta {
            Meta::List(list) => parsed.push((attr, parse_config_list(list)?)),
            _ => {
                return Err(syn::Error::new_spanned(
                    attr,
                    "config attribute must be a list: #[config(...)]",
                ));
            }
        }
    }
    Ok(parsed)
}

fn parse_record_config(attrs: &[Attribute]) -> syn::Result<RecordConfig> {
    let mut config = RecordConfig::default();

    for (attr, values) in collect_config(attrs)? {
        for (key, value) in values {
            match (key.as_str(), value) {
                ("name", MetaValue::Str(name)) => config.name = Some(name),
                ("apply_defaults", value) => config.apply_defaults = flag_value(attr, &key, value)?,
                _ => {
                    return Err(syn::Error::new_spanned(
                        attr,
                        format!("unknown struct option `{key}`, expected name or apply_defaults"),
                    ));
                }
            }
        }
    }

    Ok(config)
}

fn parse_field_config(attrs: &[Attribute]) -> syn::Result<FieldConfig> {
    let mut config = FieldConfig::default();

    for (attr, values) in collect_config(attrs)? {
        for (key, value) in values {
            match (key.as_str(), value) {
                ("name", MetaValue::Str(name)) => config.name = Some(name),
                ("flag_usage", MetaValue::Str(usage)) => config.flag_usage = Some(usage),
                ("default", MetaValue::Expr(expr)) => {
                    config.default = Some(default_literal(&expr)?)
                }
                ("required", value) => config.required = flag_value(attr, &key, value)?,
                ("flatten", value) => config.flatten = flag_value(attr, &key, value)?,
                ("skip", value) => config.skip = flag_value(attr, &key, value)?,
                ("apply_defaults", value) => {
                    config.apply_defaults = flag_value(attr, &key, value)?
                }
                ("default", _) => {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "default needs a value: default = 10",
                    ));
                }
                _ => {
                    return Err(syn::Error::new_spanned(
                        attr,
                        format!(
                            "unknown field option `{key}`, expected one of: default, required, flag_usage, flatten, skip, name, apply_defaults"
                        ),
                    ));
                }
            }
        }
    }

    Ok(config)
}

/// `required` and `required = true` both switch an option on
fn flag_value(attr: &Attribute, key: &str, value: MetaValue) -> syn::Result<bool> {
    match value {
        MetaValue::Flag => Ok(true),
        MetaValue::Expr(Expr::Lit(ExprLit {
            lit: Lit::Bool(b), ..
        })) => Ok(b.value),
        _ => Err(syn::Error::new_spanned(
            attr,
            format!("{key} takes no value, or a boolean: {key} = true"),
        )),
    }
}

/// Turns a default literal into the text the tag loader parses
fn default_literal(expr: &Expr) -> syn::Result<String> {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => match lit {
            Lit::Str(s) => Ok(s.value()),
            Lit::Int(i) => Ok(i.base10_digits().to_string()),
            Lit::Float(f) => Ok(f.base10_digits().to_string()),
            Lit::Bool(b) => Ok(b.value.to_string()),
            Lit::Char(c) => Ok(c.value().to_string()),
            _ => Err(syn::Error::new_spanned(
                expr,
                "default must be a string, number, boolean or char literal",
            )),
        },
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr: inner,
            ..
        }) => match inner.as_ref() {
            Expr::Lit(ExprLit {
                lit: Lit::Int(i), ..
            }) => Ok(format!("-{}", i.base10_digits())),
            Expr::Lit(ExprLit {
                lit: Lit::Float(f), ..
            }) => Ok(format!("-{}", f.base10_digits())),
            _ => Err(syn::Error::new_spanned(expr, "only numbers can be negated in a default")),
        },
        _ => Err(syn::Error::new_spanned(
            expr,
            "default must be a literal, e.g. default = 8080 or default = \"localhost\"",
        )),
    }
}
