//! Procedural macros for nsdash-dispatch

use darling::util::PathList;
use darling::{FromDeriveInput, FromField, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::Ident;
use quote::{format_ident, quote};
use std::collections::BTreeMap;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(Action)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(enum_any))]
struct ActionOpts {
    ident: syn::Ident,
    data: darling::ast::Data<ActionVariant, ()>,

    /// Enable automatic category inference from variant name prefixes
    #[darling(default)]
    infer_categories: bool,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Explicit category override
    #[darling(default)]
    category: Option<String>,

    /// Exclude from category inference
    #[darling(default)]
    skip_category: bool,
}

/// Split a PascalCase string into parts
fn split_pascal_case(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for ch in s.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            parts.push(current);
            current = String::new();
        }
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Convert PascalCase to snake_case
fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Infer the slice category from a variant name.
///
/// The leading word names the slice: `StatsFetch` and `StatsDidLoad` both
/// map to `stats`, `LocusFastaDidError` to `locus`. Single-word variants are
/// global and get no category.
fn infer_category(name: &str) -> Option<String> {
    let parts = split_pascal_case(name);
    if parts.len() < 2 || parts[0] == "Did" {
        return None;
    }
    Some(to_snake_case(&parts[0]))
}

/// Derive macro for the Action trait
///
/// Generates a `name()` method that returns the variant name as a static string.
///
/// With `#[action(infer_categories)]`, also generates:
/// - `category() -> Option<&'static str>` (inherent and via `ActionCategory`)
/// - `is_{category}()` predicates for each category
///
/// Variants may override inference with `#[action(category = "...")]` or opt
/// out with `#[action(skip_category)]`.
///
/// # Example
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// #[action(infer_categories)]
/// enum MyAction {
///     StatsFetch,
///     StatsDidLoad(Vec<Row>),
///     #[action(category = "auth")]
///     SessionExpired,
///     Quit,  // uncategorized
/// }
///
/// let action = MyAction::StatsFetch;
/// assert_eq!(action.name(), "StatsFetch");
/// assert_eq!(action.category(), Some("stats"));
/// assert!(action.is_stats());
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "Action can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let name_arms = variants.iter().map(|v| {
        let variant_name = &v.ident;
        let variant_str = variant_name.to_string();

        match &v.fields.style {
            darling::ast::Style::Unit => quote! {
                #name::#variant_name => #variant_str
            },
            darling::ast::Style::Tuple => quote! {
                #name::#variant_name(..) => #variant_str
            },
            darling::ast::Style::Struct => quote! {
                #name::#variant_name { .. } => #variant_str
            },
        }
    });

    let mut expanded = quote! {
        impl ::nsdash_dispatch::Action for #name {
            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }
        }
    };

    if opts.infer_categories {
        // BTreeMap keeps predicate output deterministic
        let mut categories: BTreeMap<String, Vec<&Ident>> = BTreeMap::new();
        let mut variant_categories: Vec<(&Ident, Option<String>)> = Vec::new();

        for v in variants.iter() {
            let cat = if v.skip_category {
                None
            } else if let Some(ref explicit_cat) = v.category {
                Some(explicit_cat.clone())
            } else {
                infer_category(&v.ident.to_string())
            };

            if let Some(ref category) = cat {
                categories
                    .entry(category.clone())
                    .or_default()
                    .push(&v.ident);
            }
            variant_categories.push((&v.ident, cat));
        }

        let category_arms: Vec<_> = variant_categories
            .iter()
            .map(|(variant, cat)| {
                let cat_expr = match cat {
                    Some(c) => quote! { ::core::option::Option::Some(#c) },
                    None => quote! { ::core::option::Option::None },
                };
                quote! { #name::#variant { .. } => #cat_expr }
            })
            .collect();

        let predicates: Vec<_> = categories
            .iter()
            .map(|(cat, cat_variants)| {
                let predicate_name = format_ident!("is_{}", cat);
                let patterns = cat_variants.iter().map(|v| quote! { #name::#v { .. } });
                let doc = format!(
                    "Returns true if this action belongs to the `{}` category.",
                    cat
                );

                quote! {
                    #[doc = #doc]
                    pub fn #predicate_name(&self) -> bool {
                        matches!(self, #(#patterns)|*)
                    }
                }
            })
            .collect();

        expanded = quote! {
            #expanded

            impl #name {
                /// Get the action's category (if categorized)
                pub fn category(&self) -> ::core::option::Option<&'static str> {
                    match self {
                        #(#category_arms,)*
                    }
                }

                #(#predicates)*
            }

            impl ::nsdash_dispatch::ActionCategory for #name {
                fn category(&self) -> ::core::option::Option<&'static str> {
                    #name::category(self)
                }
            }
        };
    }

    TokenStream::from(expanded)
}

/// Container-level attributes for #[derive(Patch)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(patch), supports(struct_named))]
struct PatchOpts {
    ident: syn::Ident,
    vis: syn::Visibility,
    generics: syn::Generics,
    data: darling::ast::Data<(), PatchField>,

    /// Extra derives for the generated patch struct
    #[darling(default)]
    derive: PathList,
}

#[derive(Debug, FromField)]
struct PatchField {
    ident: Option<syn::Ident>,
    vis: syn::Visibility,
    ty: syn::Type,
}

fn derives_named(paths: &PathList, name: &str) -> bool {
    paths
        .iter()
        .any(|p| p.segments.last().is_some_and(|s| s.ident == name))
}

/// Derive macro for the Merge trait
///
/// Generates a `{Name}Patch` struct with every field wrapped in `Option`
/// and a `Merge` impl where present patch fields replace the original
/// field and absent ones are cloned from it.
///
/// `#[patch(derive(serde::Serialize))]` adds derives to the patch struct;
/// absent fields are then skipped when serializing.
///
/// # Example
/// ```ignore
/// #[derive(Clone, Patch)]
/// #[patch(derive(serde::Serialize))]
/// struct Profile {
///     username: String,
///     email: String,
/// }
///
/// let updated = profile.merge(ProfilePatch {
///     email: Some("new@example.org".into()),
///     ..Default::default()
/// });
/// ```
#[proc_macro_derive(Patch, attributes(patch))]
pub fn derive_patch(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match PatchOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let vis = &opts.vis;
    let patch_name = format_ident!("{}Patch", name);

    let fields = match &opts.data {
        darling::ast::Data::Struct(fields) => &fields.fields,
        _ => {
            return syn::Error::new_spanned(&input, "Patch can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let extra_derives = opts.derive.iter();
    let skip_absent = if derives_named(&opts.derive, "Serialize") {
        quote! { #[serde(skip_serializing_if = "Option::is_none")] }
    } else {
        quote! {}
    };
    let container_default = if derives_named(&opts.derive, "Deserialize") {
        quote! { #[serde(default)] }
    } else {
        quote! {}
    };

    let idents: Vec<_> = fields.iter().filter_map(|f| f.ident.as_ref()).collect();

    let patch_fields = fields.iter().map(|f| {
        let ident = &f.ident;
        let field_vis = &f.vis;
        let ty = &f.ty;
        quote! {
            #skip_absent
            #field_vis #ident: ::core::option::Option<#ty>
        }
    });

    let mut merge_generics = opts.generics.clone();
    for param in merge_generics.type_params_mut() {
        param.bounds.push(syn::parse_quote!(::core::clone::Clone));
    }
    let (impl_generics, ty_generics, where_clause) = merge_generics.split_for_impl();
    let (patch_impl_generics, patch_ty_generics, patch_where) = opts.generics.split_for_impl();
    let struct_generics = &opts.generics;

    let doc = format!(
        "Partial update for [`{}`]; `None` fields are left unchanged.",
        name
    );

    let expanded = quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, #(#extra_derives),*)]
        #container_default
        #vis struct #patch_name #struct_generics #patch_where {
            #(#patch_fields,)*
        }

        impl #patch_impl_generics ::core::default::Default
            for #patch_name #patch_ty_generics #patch_where
        {
            fn default() -> Self {
                Self {
                    #(#idents: ::core::option::Option::None,)*
                }
            }
        }

        impl #impl_generics ::nsdash_dispatch::Merge for #name #ty_generics #where_clause {
            type Patch = #patch_name #ty_generics;

            fn merge(&self, patch: Self::Patch) -> Self {
                Self {
                    #(#idents: patch
                        .#idents
                        .unwrap_or_else(|| ::core::clone::Clone::clone(&self.#idents)),)*
                }
            }
        }
    };

    TokenStream::from(expanded)
}
