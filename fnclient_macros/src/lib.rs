//! Procedural macros for **fnclient**
#![forbid(unsafe_code)]

use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro_error::{abort, proc_macro_error};
use quote::quote;
use syn::{
    Attribute, Data, DataEnum, DeriveInput, Expr, ExprLit, ExprUnary, Fields, FnArg, ItemFn, Lit,
    LitStr, Meta, Pat, PatIdent, PatType, Type, UnOp, parse_macro_input,
};

// ============================================================================
// CRATE PATH
// ============================================================================

/// Generated code goes through the `fnclient` facade when the caller depends
/// on it, and through `fnclient_core` otherwise.
fn get_crate_path() -> TokenStream2 {
    match crate_name("fnclient") {
        Ok(FoundCrate::Itself) => quote!(::fnclient),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(_) => match crate_name("fnclient_core") {
            Ok(FoundCrate::Itself) => quote!(crate),
            Ok(FoundCrate::Name(name)) => {
                let ident = Ident::new(&name, Span::call_site());
                quote!(::#ident)
            }
            Err(_) => quote!(::fnclient),
        },
    }
}

// ============================================================================
// TOOL ENUM DERIVE
// ============================================================================

#[derive(Debug, PartialEq)]
enum EnumValues {
    Strings(Vec<(Ident, String)>),
    Integers(Vec<(Ident, i64)>),
}

/// `Some(value)` from `#[param(rename = "value")]`.
fn rename_attr(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut renamed = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("param")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                renamed = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported `param` attribute, expected `rename`"))
            }
        })?;
    }
    Ok(renamed)
}

fn integer_discriminant(expr: &Expr) -> syn::Result<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(int), ..
        }) => int.base10_parse::<i64>(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => integer_discriminant(expr).map(|v| -v),
        Expr::Group(group) => integer_discriminant(&group.expr),
        other => Err(syn::Error::new_spanned(
            other,
            "`ToolEnum` discriminants must be integer literals",
        )),
    }
}

/// Fieldless enums without discriminants are string-backed; enums where every
/// variant has an integer literal discriminant are integer-backed.
fn enum_values(data: &DataEnum, name: &Ident) -> syn::Result<EnumValues> {
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "`ToolEnum` needs at least one variant",
        ));
    }

    let mut strings = Vec::new();
    let mut integers = Vec::new();

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "`ToolEnum` variants cannot carry data",
            ));
        }
        match &variant.discriminant {
            None => {
                let value =
                    rename_attr(&variant.attrs)?.unwrap_or_else(|| variant.ident.to_string());
                strings.push((variant.ident.clone(), value));
            }
            Some((_, expr)) => {
                integers.push((variant.ident.clone(), integer_discriminant(expr)?));
            }
        }
    }

    match (strings.is_empty(), integers.is_empty()) {
        (false, true) => Ok(EnumValues::Strings(strings)),
        (true, false) => Ok(EnumValues::Integers(integers)),
        _ => Err(syn::Error::new_spanned(
            name,
            "`ToolEnum` variants must either all have integer discriminants or none",
        )),
    }
}

#[proc_macro_error]
#[proc_macro_derive(ToolEnum, attributes(param))]
pub fn derive_tool_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data) = &input.data else {
        abort!(name, "`ToolEnum` can only be derived for enums");
    };

    let values = match enum_values(data, name) {
        Ok(values) => values,
        Err(err) => abort!(err.span(), "{}", err),
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let crate_path = get_crate_path();

    let (declared, decode) = match values {
        EnumValues::Strings(pairs) => {
            let (idents, names): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
            let expected = format!("{names:?}");
            (
                quote! {
                    #crate_path::DeclaredType::StringEnum(::std::vec![
                        #(::std::string::String::from(#names)),*
                    ])
                },
                quote! {
                    match value.as_str() {
                        #(::std::option::Option::Some(#names) => {
                            ::std::result::Result::Ok(Self::#idents)
                        })*
                        _ => ::std::result::Result::Err(::std::format!(
                            "expected one of {}, got {}", #expected, value
                        )),
                    }
                },
            )
        }
        EnumValues::Integers(pairs) => {
            let (idents, numbers): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
            let expected = format!("{numbers:?}");
            (
                quote! {
                    #crate_path::DeclaredType::IntegerEnum(::std::vec![#(#numbers),*])
                },
                quote! {
                    match value.as_i64() {
                        #(::std::option::Option::Some(__v) if __v == #numbers => {
                            ::std::result::Result::Ok(Self::#idents)
                        })*
                        _ => ::std::result::Result::Err(::std::format!(
                            "expected one of {}, got {}", #expected, value
                        )),
                    }
                },
            )
        }
    };

    TokenStream::from(quote! {
        impl #impl_generics #crate_path::ToolParam for #name #ty_generics #where_clause {
            fn declared_type() -> #crate_path::DeclaredType {
                #declared
            }

            fn from_value(
                value: #crate_path::__private::Value,
            ) -> ::std::result::Result<Self, ::std::string::String> {
                #decode
            }
        }
    })
}

// ============================================================================
// TOOL ATTRIBUTE MACRO
// ============================================================================

/// Gather `///` doc-comments into a single string, trimming the leading space after `///`.
fn docs(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|a| match &a.meta {
            Meta::NameValue(nv) if a.path().is_ident("doc") => {
                if let Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) = &nv.value
                {
                    Some(s.value().trim_start().to_owned())
                } else {
                    None
                }
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct Param {
    ident: Ident,
    ty: Type,
    default: Option<Expr>,
}

/// Reads `#[default(expr)]` and removes it so the function compiles as written.
fn take_default(attrs: &mut Vec<Attribute>) -> syn::Result<Option<Expr>> {
    let mut default = None;
    let mut error = None;
    attrs.retain(|attr| {
        if !attr.path().is_ident("default") {
            return true;
        }
        match attr.parse_args::<Expr>() {
            Ok(expr) => default = Some(expr),
            Err(err) => error = Some(err),
        }
        false
    });
    match error {
        Some(err) => Err(err),
        None => Ok(default),
    }
}

fn parse_params(func: &mut ItemFn) -> syn::Result<Vec<Param>> {
    let mut params = Vec::new();
    for arg in func.sig.inputs.iter_mut() {
        match arg {
            FnArg::Typed(PatType { attrs, pat, ty, .. }) => {
                let Pat::Ident(PatIdent { ident, .. }) = &**pat else {
                    return Err(syn::Error::new_spanned(
                        pat,
                        "`#[tool]` supports only identifier patterns",
                    ));
                };
                params.push(Param {
                    ident: ident.clone(),
                    ty: (**ty).clone(),
                    default: take_default(attrs)?,
                });
            }
            FnArg::Receiver(_) => {
                return Err(syn::Error::new_spanned(
                    arg,
                    "`#[tool]` may not be used on `self` methods",
                ));
            }
        }
    }
    Ok(params)
}

/// Registers a function as a tool the model can call.
///
/// The first doc line becomes the tool description; `name: text` lines
/// describe parameters. Parameters without `#[default(expr)]` (and not
/// `Option<T>`) are required.
///
/// ```ignore
/// #[tool]
/// /// Gets the weather
/// /// location: where to get the forecast for
/// async fn get_weather(location: String, #[default(Unit::Celsius)] unit: Unit) -> String {
///     format!("The weather in {location} is 24 degrees {unit:?}")
/// }
/// ```
#[proc_macro_error]
#[proc_macro_attribute]
pub fn tool(_attr: TokenStream, item: TokenStream) -> TokenStream {
    // ───────── Parse the user function ─────────
    let mut func: ItemFn = parse_macro_input!(item);

    if !func.sig.generics.params.is_empty() {
        abort!(func.sig.generics, "`#[tool]` functions cannot be generic");
    }

    let params = match parse_params(&mut func) {
        Ok(params) => params,
        Err(err) => abort!(err.span(), "{}", err),
    };

    let fn_name = &func.sig.ident;
    let fn_name_str = fn_name.to_string();
    let doc = docs(&func.attrs);
    let crate_path = get_crate_path();

    // ───────── Spec: one `.param(...)` per input ─────────
    let doc_call = if doc.trim().is_empty() {
        quote! {}
    } else {
        let doc_lit = LitStr::new(&doc, Span::call_site());
        quote! { .with_doc(#doc_lit) }
    };

    let param_specs = params.iter().map(|Param { ident, ty, default }| {
        let name = ident.to_string();
        let with_default = default.as_ref().map(|_| quote! { .with_default() });
        quote! { .param(#crate_path::ParamSpec::of::<#ty>(#name) #with_default) }
    });

    // ───────── Call: bind arguments by name ─────────
    let bindings = params.iter().map(|Param { ident, ty, default }| {
        let name = ident.to_string();
        match default {
            Some(expr) => quote! {
                let #ident: #ty = __args.take_or_else::<#ty, _>(#name, || #expr)?;
            },
            None => quote! {
                let #ident: #ty = __args.take::<#ty>(#name)?;
            },
        }
    });
    let idents = params.iter().map(|p| &p.ident);
    let await_call = func.sig.asyncness.map(|_| quote! { .await });

    // ───────── Generated helper idents ─────────
    let spec_fn = Ident::new(&format!("__fnclient_spec_{fn_name}"), Span::call_site());
    let call_fn = Ident::new(&format!("__fnclient_call_{fn_name}"), Span::call_site());

    // ───────── Macro expansion ─────────
    TokenStream::from(quote! {
        #func

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #spec_fn() -> #crate_path::FunctionSpec {
            #crate_path::FunctionSpec::new(#fn_name_str)
                #doc_call
                #(#param_specs)*
        }

        #[doc(hidden)]
        #[allow(non_snake_case, unused_mut)]
        fn #call_fn(
            mut __args: #crate_path::Arguments,
        ) -> #crate_path::__private::BoxFuture<
            'static,
            ::std::result::Result<::std::string::String, #crate_path::ToolError>,
        > {
            // Taken before binding so a parameter named like the function
            // cannot shadow it.
            let __fnclient_fn = #fn_name;
            ::std::boxed::Box::pin(async move {
                #(#bindings)*
                __args.finish()?;
                #crate_path::IntoToolOutput::into_tool_output(
                    __fnclient_fn(#(#idents),*) #await_call
                )
            })
        }

        #crate_path::__private::inventory::submit! {
            #crate_path::ToolRegistration::new(#fn_name_str, #spec_fn, #call_fn)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn enum_data(input: &DeriveInput) -> &DataEnum {
        match &input.data {
            Data::Enum(data) => data,
            _ => panic!("Expected enum"),
        }
    }

    #[test]
    fn test_string_enum_values() {
        let input: DeriveInput = parse_quote! {
            enum Unit {
                Celsius,
                #[param(rename = "F")]
                Fahrenheit,
            }
        };
        let values = enum_values(enum_data(&input), &input.ident).unwrap();
        let EnumValues::Strings(pairs) = values else {
            panic!("expected string enum");
        };
        let names: Vec<_> = pairs.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(names, vec!["Celsius", "F"]);
    }

    #[test]
    fn test_integer_enum_values() {
        let input: DeriveInput = parse_quote! {
            enum Priority {
                Low = 1,
                High = 10,
                Lowest = -5,
            }
        };
        let values = enum_values(enum_data(&input), &input.ident).unwrap();
        let EnumValues::Integers(pairs) = values else {
            panic!("expected integer enum");
        };
        let numbers: Vec<_> = pairs.iter().map(|(_, v)| *v).collect();
        assert_eq!(numbers, vec![1, 10, -5]);
    }

    #[test]
    fn test_rejected_enums() {
        let mixed: DeriveInput = parse_quote! { enum Mixed { A = 1, B } };
        assert!(enum_values(enum_data(&mixed), &mixed.ident).is_err());

        let data: DeriveInput = parse_quote! { enum Data { A(i32), B } };
        assert!(enum_values(enum_data(&data), &data.ident).is_err());

        let empty: DeriveInput = parse_quote! { enum Empty {} };
        assert!(enum_values(enum_data(&empty), &empty.ident).is_err());

        let computed: DeriveInput = parse_quote! { enum Computed { A = 1 + 1 } };
        assert!(enum_values(enum_data(&computed), &computed.ident).is_err());
    }

    #[test]
    fn test_docs_are_joined_by_line() {
        let func: ItemFn = parse_quote! {
            /// Gets the weather
            /// location: where to get the forecast for
            fn get_weather(location: String) -> String { location }
        };
        assert_eq!(
            docs(&func.attrs),
            "Gets the weather\nlocation: where to get the forecast for"
        );
    }

    #[test]
    fn test_default_attributes_are_parsed_and_stripped() {
        let mut func: ItemFn = parse_quote! {
            fn search(query: String, #[default(10)] limit: u32, page: Option<u32>) -> String {
                query
            }
        };
        let params = parse_params(&mut func).unwrap();
        assert_eq!(params.len(), 3);
        assert!(params[0].default.is_none());
        assert!(params[1].default.is_some());
        assert!(params[2].default.is_none());

        let FnArg::Typed(limit) = &func.sig.inputs[1] else {
            panic!("expected typed argument");
        };
        assert!(limit.attrs.is_empty());
    }

    #[test]
    fn test_self_and_pattern_arguments_are_rejected() {
        let mut method: ItemFn = parse_quote! { fn m(&self) {} };
        assert!(parse_params(&mut method).is_err());

        let mut tuple: ItemFn = parse_quote! { fn t((a, b): (i32, i32)) {} };
        assert!(parse_params(&mut tuple).is_err());
    }
}
