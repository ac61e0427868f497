//! `#[tool]`: derive a tool spec and registry entry from a typed function

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Expr, ExprLit, FnArg, ItemFn, Lit, LitStr, Meta, Signature, Token, Type};

/// Turn a function taking one deserializable argument into a tool
///
/// ```ignore
/// #[tool(description = "Perform basic arithmetic operations")]
/// async fn calculator(args: CalculatorArgs) -> Result<CalculatorResult, String> {
///     // ...
/// }
/// ```
///
/// Next to the function this emits a module `calculator_tool` with:
/// - `NAME`, the tool name
/// - `spec()`, a raw tool spec whose `input_schema` is the argument's JSON schema
/// - `execute`, the function itself
/// - `registration()`, a `ToolRegistration` for `FunctionRegistry::register`
///
/// The argument type must implement `Deserialize` and `JsonSchema`, and the
/// success type `Serialize`. Sync and async functions are both accepted.
///
/// Attributes, both string literals:
/// - `description` (required)
/// - `name` (defaults to the function name)
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Parsed `#[tool(...)]` arguments
struct ToolAttrs {
    name: Option<LitStr>,
    description: LitStr,
}

impl Parse for ToolAttrs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let metas = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;

        let mut name = None;
        let mut description = None;

        for meta in metas {
            let pair = match meta {
                Meta::NameValue(pair) => pair,
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "expected `key = \"value\"` in tool attribute",
                    ));
                }
            };

            let slot = if pair.path.is_ident("name") {
                &mut name
            } else if pair.path.is_ident("description") {
                &mut description
            } else {
                return Err(syn::Error::new_spanned(
                    &pair.path,
                    "unknown tool attribute, expected `name` or `description`",
                ));
            };

            let key = pair
                .path
                .get_ident()
                .map(ToString::to_string)
                .unwrap_or_default();

            if slot.is_some() {
                return Err(syn::Error::new_spanned(
                    &pair.path,
                    format!("`{}` given more than once", key),
                ));
            }

            let Expr::Lit(ExprLit { lit: Lit::Str(value), .. }) = &pair.value else {
                return Err(syn::Error::new_spanned(
                    &pair.value,
                    format!("`{}` must be a string literal", key),
                ));
            };

            if value.value().trim().is_empty() {
                return Err(syn::Error::new_spanned(
                    value,
                    format!("`{}` must not be empty", key),
                ));
            }

            *slot = Some(value.clone());
        }

        let description = description.ok_or_else(|| {
            syn::Error::new(Span::call_site(), "tool attribute needs `description = \"...\"`")
        })?;

        Ok(Self { name, description })
    }
}

/// The single owned argument type a tool function deserializes its input into
fn argument_type(sig: &Signature) -> syn::Result<&Type> {
    if sig.inputs.len() != 1 {
        let message = "tool functions take exactly one argument";
        return Err(if sig.inputs.is_empty() {
            syn::Error::new_spanned(sig, message)
        } else {
            syn::Error::new_spanned(&sig.inputs, message)
        });
    }

    match &sig.inputs[0] {
        FnArg::Receiver(receiver) => Err(syn::Error::new_spanned(
            receiver,
            "tool functions cannot take `self`",
        )),
        FnArg::Typed(arg) => match arg.ty.as_ref() {
            Type::Reference(_) => Err(syn::Error::new_spanned(
                &arg.ty,
                "tool arguments are deserialized, so they must be owned",
            )),
            ty => Ok(ty),
        },
    }
}

fn expand(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let attrs: ToolAttrs = syn::parse2(attr)?;
    let mut func: ItemFn = syn::parse2(item)?;
    let arg_type = argument_type(&func.sig)?.clone();

    let fn_name = func.sig.ident.clone();
    let module = format_ident!("{}_tool", fn_name);
    let tool_name = attrs
        .name
        .unwrap_or_else(|| LitStr::new(&fn_name.to_string(), fn_name.span()));
    let description = attrs.description;

    let function = if func.sig.asyncness.is_some() {
        quote! { tool_orchestrator::tools::wrap_async::<_, #arg_type, _, _>(execute) }
    } else {
        quote! { tool_orchestrator::tools::wrap_sync::<_, #arg_type, _>(execute) }
    };

    // Re-exported from the generated module
    func.vis = syn::parse_quote!(pub);

    Ok(quote! {
        #func

        #[allow(dead_code)]
        pub mod #module {
            use super::*;

            /// Tool name, also the registry dispatch key
            pub const NAME: &str = #tool_name;

            /// Raw tool spec with the argument type's schema as `input_schema`
            pub fn spec() -> tool_orchestrator::Result<tool_orchestrator::serde_json::Value> {
                tool_orchestrator::tools::tool_spec::<#arg_type>(NAME, #description)
            }

            pub use super::#fn_name as execute;

            /// Everything `FunctionRegistry::register` needs
            pub fn registration() -> tool_orchestrator::Result<tool_orchestrator::tools::ToolRegistration> {
                Ok(tool_orchestrator::tools::ToolRegistration {
                    name: NAME.to_string(),
                    spec: spec()?,
                    function: #function,
                })
            }
        }
    })
}
