use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Expr, Fields, Item, parse_macro_input, spanned::Spanned};

/// Marks a preferences declaration and derives `Default` from the
/// `#[pref(default = ...)]` expression of every field.
///
/// The implementation type itself is written by `kvprefs_codegen` from a
/// build script; this derive makes the helper attributes legal and reports
/// declaration problems at the declaration site.
#[proc_macro_derive(Preferences, attributes(preferences, pref))]
pub fn derive_preferences(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_preferences(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[proc_macro_derive(PrefEnum)]
pub fn derive_pref_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_pref_enum(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[proc_macro_derive(Marshal)]
pub fn derive_marshal(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    quote! {
        impl #impl_generics ::kvprefs::Marshal for #name #ty_generics #where_clause {}
    }
    .into()
}

/// Registers the public single-argument functions of an impl block or module
/// as type converters. The item is emitted unchanged.
#[proc_macro_attribute]
pub fn type_converters(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[type_converters] does not accept arguments",
        )
        .to_compile_error()
        .into();
    }

    let item = parse_macro_input!(item as Item);
    match &item {
        Item::Impl(item_impl) if item_impl.trait_.is_none() => quote!(#item).into(),
        Item::Mod(item_mod) if item_mod.content.is_some() => quote!(#item).into(),
        _ => syn::Error::new(
            item.span(),
            "#[type_converters] can only be used on inherent impl blocks or inline modules",
        )
        .to_compile_error()
        .into(),
    }
}

fn expand_preferences(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "Preferences does not support generic structs",
        ));
    }

    validate_preferences_options(&input.attrs)?;

    let Data::Struct(data_struct) = input.data else {
        return Err(syn::Error::new(
            struct_name.span(),
            "Preferences can only be derived for structs",
        ));
    };

    let Fields::Named(named_fields) = data_struct.fields else {
        return Err(syn::Error::new(
            struct_name.span(),
            "Preferences requires named fields",
        ));
    };

    let mut initializers = Vec::<TokenStream2>::new();
    for field in named_fields.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "Preferences requires named fields"))?;
        let default = parse_field_default(&field.attrs)?.ok_or_else(|| {
            syn::Error::new(
                ident.span(),
                format!(
                    "[{struct_name}] Property '{ident}' must have a default value, \
                     consider adding #[pref(default = ...)] to it."
                ),
            )
        })?;
        initializers.push(quote!(#ident: #default));
    }

    Ok(quote! {
        impl ::core::default::Default for #struct_name {
            fn default() -> Self {
                Self {
                    #(#initializers),*
                }
            }
        }
    })
}

fn expand_pref_enum(input: DeriveInput) -> syn::Result<TokenStream2> {
    let enum_name = input.ident;

    let Data::Enum(data_enum) = input.data else {
        return Err(syn::Error::new(
            enum_name.span(),
            "PrefEnum can only be derived for enums",
        ));
    };

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "PrefEnum does not support generic enums",
        ));
    }

    let mut variants = Vec::new();
    for variant in data_enum.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.span(),
                "PrefEnum variants cannot carry data",
            ));
        }
        variants.push(variant.ident);
    }

    let ordinal_arms = variants.iter().enumerate().map(|(index, variant)| {
        let ordinal = index as i32;
        quote!(Self::#variant => #ordinal)
    });
    let from_ordinal_arms = variants.iter().enumerate().map(|(index, variant)| {
        let ordinal = index as i32;
        quote!(#ordinal => ::core::option::Option::Some(Self::#variant))
    });

    Ok(quote! {
        impl ::kvprefs::PrefEnum for #enum_name {
            const ENTRIES: &'static [Self] = &[#(Self::#variants),*];

            fn ordinal(&self) -> i32 {
                match self {
                    #(#ordinal_arms,)*
                }
            }

            fn from_ordinal(ordinal: i32) -> ::core::option::Option<Self> {
                match ordinal {
                    #(#from_ordinal_arms,)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

fn validate_preferences_options(attrs: &[syn::Attribute]) -> syn::Result<()> {
    for attr in attrs {
        if !attr.path().is_ident("preferences") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                let value = meta.value()?;
                let lit: syn::LitStr = value.parse()?;
                if lit.value().is_empty() {
                    return Err(syn::Error::new(lit.span(), "Preferences id must not be empty"));
                }
                return Ok(());
            }

            Err(meta.error("Unsupported #[preferences(...)] option. Supported: id = \"...\""))
        })?;
    }

    Ok(())
}

fn parse_field_default(attrs: &[syn::Attribute]) -> syn::Result<Option<Expr>> {
    let mut default = None;

    for attr in attrs {
        if !attr.path().is_ident("pref") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                let value = meta.value()?;
                if default.is_some() {
                    return Err(meta.error("Duplicate default value for property"));
                }
                default = Some(value.parse::<Expr>()?);
                return Ok(());
            }

            if meta.path.is_ident("persist_default") {
                return Ok(());
            }

            Err(meta.error(
                "Unsupported #[pref(...)] option. Supported: default = <expr>, persist_default",
            ))
        })?;
    }

    Ok(default)
}
