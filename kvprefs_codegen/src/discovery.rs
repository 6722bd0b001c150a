//! Source scanning: finds declarations, ordinal enums, structured types and
//! converter sources in parsed Rust files.

use crate::config::{SourceFile, split_module_path};
use crate::converter::{ConverterFn, ConverterSource};
use crate::error::{GenError, Result};
use crate::model::{Field, PreferencesDeclaration, TypeRef};
use quote::ToTokens;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Fields, FnArg, ImplItem, Item, ItemImpl, ItemMod, ItemStruct, ReturnType, Signature,
    Token, Type, Visibility,
};
use tracing::debug;

/// Everything the generator needs from the scanned sources.
#[derive(Debug, Default)]
pub struct Discovery {
    pub declarations: Vec<PreferencesDeclaration>,
    /// Names of `#[derive(PrefEnum)]` enums.
    pub enums: BTreeSet<String>,
    /// Names of `#[derive(Marshal)]` types.
    pub structured: BTreeSet<String>,
    pub converters: Vec<ConverterSource>,
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan_file(&mut self, source: &SourceFile) -> Result<()> {
        let text = std::fs::read_to_string(&source.path).map_err(|err| GenError::Io {
            path: source.path.clone(),
            source: err,
        })?;
        self.scan_source(&text, &source.path, source.module.clone())
    }

    /// Scans in-memory source compiled as `module`.
    pub fn scan_str(&mut self, text: &str, module: &str) -> Result<()> {
        self.scan_source(text, Path::new("<memory>"), split_module_path(module))
    }

    fn scan_source(&mut self, text: &str, path: &Path, module: Vec<String>) -> Result<()> {
        let file = syn::parse_file(text).map_err(|err| GenError::Parse {
            path: path.to_path_buf(),
            source: err,
        })?;
        let mut scan = Scan {
            path: path.to_path_buf(),
            module,
            discovery: self,
        };
        scan.items(&file.items)
    }
}

struct Scan<'a> {
    path: PathBuf,
    module: Vec<String>,
    discovery: &'a mut Discovery,
}

impl Scan<'_> {
    fn parse_error(&self, source: syn::Error) -> GenError {
        GenError::Parse {
            path: self.path.clone(),
            source,
        }
    }

    fn items(&mut self, items: &[Item]) -> Result<()> {
        for item in items {
            match item {
                Item::Struct(item_struct) => {
                    let derives = self.derives(&item_struct.attrs)?;
                    if derives.contains("Marshal") {
                        self.discovery.structured.insert(item_struct.ident.to_string());
                    }
                    if derives.contains("Preferences") {
                        let declaration = self.declaration(item_struct)?;
                        debug!(
                            declaration = %declaration.ident,
                            fields = declaration.fields.len(),
                            "found preferences declaration"
                        );
                        self.discovery.declarations.push(declaration);
                    }
                }
                Item::Enum(item_enum) => {
                    let derives = self.derives(&item_enum.attrs)?;
                    if derives.contains("PrefEnum") {
                        self.discovery.enums.insert(item_enum.ident.to_string());
                    }
                    if derives.contains("Marshal") {
                        self.discovery.structured.insert(item_enum.ident.to_string());
                    }
                }
                Item::Impl(item_impl) if has_attr(&item_impl.attrs, "type_converters") => {
                    if let Some(source) = self.impl_converters(item_impl) {
                        self.discovery.converters.push(source);
                    }
                }
                Item::Mod(item_mod) => self.module(item_mod)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn module(&mut self, item_mod: &ItemMod) -> Result<()> {
        let Some((_, items)) = &item_mod.content else {
            return Ok(());
        };
        self.module.push(item_mod.ident.to_string());
        if has_attr(&item_mod.attrs, "type_converters") {
            let source = self.module_converters(&item_mod.ident, items);
            self.discovery.converters.push(source);
        }
        let result = self.items(items);
        self.module.pop();
        result
    }

    /// Last path segment of every derive on the item.
    fn derives(&self, attrs: &[Attribute]) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
            let paths = attr
                .parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
                .map_err(|err| self.parse_error(err))?;
            for path in paths {
                if let Some(segment) = path.segments.last() {
                    names.insert(segment.ident.to_string());
                }
            }
        }
        Ok(names)
    }

    fn declaration(&self, item: &ItemStruct) -> Result<PreferencesDeclaration> {
        let name = item.ident.to_string();
        let invalid = |message: &str| GenError::InvalidDeclaration {
            declaration: name.clone(),
            message: message.to_string(),
        };

        if !item.generics.params.is_empty() {
            return Err(invalid("Generic preferences declarations are not supported"));
        }
        let Fields::Named(named) = &item.fields else {
            return Err(invalid("Preferences declarations require named fields"));
        };

        let id = self.preferences_id(&item.attrs)?.unwrap_or_else(|| name.clone());

        let mut fields = Vec::with_capacity(named.named.len());
        for field in &named.named {
            let Some(ident) = field.ident.clone() else {
                return Err(invalid("Preferences declarations require named fields"));
            };
            let (default, persist_default) = self.field_options(&field.attrs)?;
            fields.push(Field {
                ident,
                ty: TypeRef::from_type(&field.ty),
                default,
                persist_default,
            });
        }

        Ok(PreferencesDeclaration {
            ident: item.ident.clone(),
            id,
            module: self.module.clone(),
            fields,
        })
    }

    fn preferences_id(&self, attrs: &[Attribute]) -> Result<Option<String>> {
        let mut id = None;
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("preferences")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    id = Some(lit.value());
                    return Ok(());
                }
                Err(meta.error("Unsupported #[preferences(...)] option"))
            })
            .map_err(|err| self.parse_error(err))?;
        }
        Ok(id)
    }

    fn field_options(&self, attrs: &[Attribute]) -> Result<(Option<syn::Expr>, bool)> {
        let mut default = None;
        let mut persist_default = false;
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("pref")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    default = Some(meta.value()?.parse::<syn::Expr>()?);
                    return Ok(());
                }
                if meta.path.is_ident("persist_default") {
                    persist_default = true;
                    return Ok(());
                }
                Err(meta.error("Unsupported #[pref(...)] option"))
            })
            .map_err(|err| self.parse_error(err))?;
        }
        Ok((default, persist_default))
    }

    fn crate_path(&self, tail: &[String]) -> Option<syn::Path> {
        let segments: Vec<&str> = std::iter::once("crate")
            .chain(self.module.iter().map(String::as_str))
            .chain(tail.iter().map(String::as_str))
            .collect();
        syn::parse_str(&segments.join("::")).ok()
    }

    fn impl_converters(&self, item: &ItemImpl) -> Option<ConverterSource> {
        if item.trait_.is_some() || !item.generics.params.is_empty() {
            return None;
        }
        let Type::Path(self_ty) = item.self_ty.as_ref() else {
            return None;
        };
        let owner = self_ty.path.segments.last()?.ident.to_string();

        let functions = item
            .items
            .iter()
            .filter_map(|item| match item {
                ImplItem::Fn(method) if matches!(method.vis, Visibility::Public(_)) => {
                    self.converter_fn(&owner, &method.sig)
                }
                _ => None,
            })
            .collect();

        Some(ConverterSource {
            name: owner,
            functions,
        })
    }

    /// `self.module` already ends with the converter module's own name.
    fn module_converters(&self, ident: &syn::Ident, items: &[Item]) -> ConverterSource {
        let owner = ident.to_string();
        let functions = items
            .iter()
            .filter_map(|item| match item {
                Item::Fn(function) if matches!(function.vis, Visibility::Public(_)) => {
                    let path = self.crate_path(&[function.sig.ident.to_string()])?;
                    signature_converter(&owner, path, &function.sig)
                }
                _ => None,
            })
            .collect();

        ConverterSource {
            name: owner,
            functions,
        }
    }

    fn converter_fn(&self, owner: &str, sig: &Signature) -> Option<ConverterFn> {
        let path = self.crate_path(&[owner.to_string(), sig.ident.to_string()])?;
        signature_converter(owner, path, sig)
    }
}

/// A public function qualifies when it is non-generic, takes exactly one
/// non-`self` argument and returns an owned value.
fn signature_converter(owner: &str, path: syn::Path, sig: &Signature) -> Option<ConverterFn> {
    if !sig.generics.params.is_empty() || sig.inputs.len() != 1 {
        return None;
    }
    let FnArg::Typed(argument) = sig.inputs.first()? else {
        return None;
    };
    let ReturnType::Type(_, output) = &sig.output else {
        return None;
    };
    if matches!(output.as_ref(), Type::Reference(_)) {
        return None;
    }

    debug!(
        converter = %format!("{owner}::{}", sig.ident),
        receiver = %argument.ty.to_token_stream(),
        output = %output.to_token_stream(),
        "found converter candidate"
    );

    Some(ConverterFn {
        path,
        display_name: format!("{owner}::{}", sig.ident),
        receiver: TypeRef::from_type(&argument.ty),
        output: TypeRef::from_type(output),
    })
}

fn has_attr(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| {
        attr.path()
            .segments
            .last()
            .is_some_and(|segment| segment.ident == name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    fn scan(module: &str, text: &str) -> Discovery {
        let mut discovery = Discovery::new();
        discovery.scan_str(text, module).unwrap();
        discovery
    }

    #[test]
    fn finds_declaration_with_options() {
        let discovery = scan(
            "settings",
            r#"
            #[derive(Debug, Clone, kvprefs::Preferences)]
            #[preferences(id = "app")]
            pub struct AppSettings {
                #[pref(default = 3, persist_default)]
                pub retries: i32,
                #[pref(default = None)]
                pub nickname: Option<String>,
                pub missing: bool,
            }
            "#,
        );

        let declaration = &discovery.declarations[0];
        assert_eq!(declaration.id, "app");
        assert_eq!(declaration.module, vec!["settings"]);
        assert_eq!(declaration.fields.len(), 3);
        assert!(declaration.fields[0].persist_default);
        assert!(declaration.fields[1].ty.nullable);
        assert!(declaration.fields[2].default.is_none());
    }

    #[test]
    fn id_defaults_to_struct_name() {
        let discovery = scan(
            "",
            "#[derive(Preferences)] struct Ui { #[pref(default = 1.0)] scale: f32 }",
        );
        assert_eq!(discovery.declarations[0].id, "Ui");
    }

    #[test]
    fn records_enums_and_structured_types() {
        let discovery = scan(
            "",
            r#"
            #[derive(Clone, Copy, PrefEnum)]
            enum Theme { Light, Dark }

            #[derive(Clone, Serialize, Deserialize, Marshal)]
            struct Window { width: u32 }

            #[derive(Clone)]
            enum Plain { A }
            "#,
        );
        assert!(discovery.enums.contains("Theme"));
        assert!(!discovery.enums.contains("Plain"));
        assert!(discovery.structured.contains("Window"));
    }

    #[test]
    fn impl_block_converters_use_associated_paths() {
        let discovery = scan(
            "model::custom",
            r#"
            pub struct DateConverters;

            #[type_converters]
            impl DateConverters {
                pub fn to_days(date: &NaiveDate) -> i64 { 0 }
                pub fn from_days(days: i64) -> NaiveDate { todo!() }
                fn hidden(days: i64) -> NaiveDate { todo!() }
                pub fn generic<T>(value: T) -> i64 { 0 }
                pub fn two(a: i64, b: i64) -> NaiveDate { todo!() }
                pub fn method(&self) -> i64 { 0 }
            }
            "#,
        );

        let source = &discovery.converters[0];
        assert_eq!(source.name, "DateConverters");
        let names: Vec<&str> = source.functions.iter().map(|f| f.display_name.as_str()).collect();
        assert_eq!(names, ["DateConverters::to_days", "DateConverters::from_days"]);

        let path = &source.functions[0].path;
        assert_eq!(
            quote!(#path).to_string(),
            quote!(crate::model::custom::DateConverters::to_days).to_string()
        );
        assert!(source.functions[0].receiver.by_ref);
    }

    #[test]
    fn module_converters_use_module_paths() {
        let discovery = scan(
            "",
            r#"
            #[type_converters]
            pub mod list_converters {
                pub fn join(values: &Vec<i32>) -> String { String::new() }
                pub fn split(text: &str) -> Vec<i32> { Vec::new() }
            }
            "#,
        );

        let source = &discovery.converters[0];
        let path = &source.functions[1].path;
        assert_eq!(
            quote!(#path).to_string(),
            quote!(crate::list_converters::split).to_string()
        );
        assert_eq!(source.functions[1].receiver.key(), "String");
    }

    #[test]
    fn nested_modules_extend_the_path() {
        let discovery = scan(
            "outer",
            r#"
            mod inner {
                #[derive(Preferences)]
                struct Nested { #[pref(default = false)] flag: bool }
            }
            "#,
        );
        assert_eq!(discovery.declarations[0].module, vec!["outer", "inner"]);
    }

    #[test]
    fn generic_declaration_is_rejected() {
        let mut discovery = Discovery::new();
        let err = discovery
            .scan_str("#[derive(Preferences)] struct Bag<T> { value: T }", "")
            .unwrap_err();
        assert!(matches!(err, GenError::InvalidDeclaration { .. }));
        assert!(err.to_string().starts_with("[Bag]"));
    }

    #[test]
    fn syntax_errors_are_reported_with_path() {
        let mut discovery = Discovery::new();
        let err = discovery.scan_str("struct {", "").unwrap_err();
        assert!(matches!(err, GenError::Parse { .. }));
        assert!(err.to_string().contains("<memory>"));
    }
}
