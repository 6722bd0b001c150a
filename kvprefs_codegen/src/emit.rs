//! Turns field plans into the `FooPreferences` / `FooEditor` source.

use crate::model::{Field, PreferencesDeclaration};
use crate::plan::{
    AbsenceCheck, AbsentStep, DecodePlan, DecodeStep, EncodePlan, EncodeStep, FieldPlan,
    PersistGuard, Produce, RawRead, Write,
};
use crate::resolver::StoragePrimitive;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub struct Emitter<'a> {
    runtime: &'a syn::Path,
}

impl<'a> Emitter<'a> {
    pub fn new(runtime: &'a syn::Path) -> Self {
        Self { runtime }
    }

    pub fn declaration(&self, declaration: &PreferencesDeclaration, plans: &[FieldPlan]) -> TokenStream {
        let rt = self.runtime;
        let snapshot = &declaration.ident;
        let wrapper = format_ident!("{}Preferences", declaration.ident);
        let editor = format_ident!("{}Editor", declaration.ident);
        let id = &declaration.id;

        let idents: Vec<_> = plans.iter().map(|plan| &plan.field.ident).collect();
        let types: Vec<_> = plans.iter().map(|plan| &plan.field.ty.written).collect();
        let decode_fns: Vec<_> = plans.iter().map(|plan| decode_fn_ident(&plan.field)).collect();
        let encode_fns: Vec<_> = plans.iter().map(|plan| encode_fn_ident(&plan.field)).collect();
        let setters: Vec<_> = plans
            .iter()
            .map(|plan| format_ident!("set_{}", plan.field.ident))
            .collect();

        let setter_docs: Vec<_> = plans.iter().map(|plan| setter_doc(&plan.field)).collect();

        let decoders = plans.iter().map(|plan| self.decode_fn(&plan.field, &plan.decode));
        let encoders = plans.iter().map(|plan| self.encode_fn(&plan.field, &plan.encode));

        let wrapper_doc = format!(
            "Preferences backed by the `{id}` namespace, with snapshots of [`{snapshot}`]."
        );
        let editor_doc = format!("Write-through editor for [`{wrapper}`].");

        quote! {
            #[doc = #wrapper_doc]
            pub struct #wrapper {
                store: #rt::__private::Arc<dyn #rt::KvStore>,
                default: #snapshot,
                lock: #rt::__private::Mutex<()>,
                instance: #rt::Published<#snapshot>,
                state: #rt::Published<#rt::StateFlow<#rt::__private::Arc<#snapshot>>>,
            }

            #[allow(clippy::clone_on_copy)]
            impl #wrapper {
                pub const ID: &'static str = #id;

                pub fn new(store: #rt::__private::Arc<dyn #rt::KvStore>) -> Self {
                    Self {
                        store,
                        default: <#snapshot as ::core::default::Default>::default(),
                        lock: #rt::__private::Mutex::new(()),
                        instance: #rt::Published::new(),
                        state: #rt::Published::new(),
                    }
                }

                pub fn open(engine: &dyn #rt::KvEngine) -> Self {
                    Self::new(engine.open(Self::ID))
                }

                /// Caller holds `self.lock`.
                fn snapshot_locked(&self) -> #rt::__private::Arc<#snapshot> {
                    if let ::core::option::Option::Some(instance) = self.instance.load() {
                        return instance;
                    }
                    let instance = #rt::__private::Arc::new(#snapshot {
                        #(#idents: self.#decode_fns(),)*
                    });
                    self.instance.store(#rt::__private::Arc::clone(&instance));
                    instance
                }

                #(#decoders)*

                #(#encoders)*
            }

            impl #rt::Preferences for #wrapper {
                type Snapshot = #snapshot;
                type Editor = #editor;

                fn id(&self) -> &str {
                    Self::ID
                }

                fn get(&self) -> #rt::__private::Arc<#snapshot> {
                    if let ::core::option::Option::Some(instance) = self.instance.load() {
                        return instance;
                    }
                    let _guard = self.lock.lock();
                    self.snapshot_locked()
                }

                fn mutable(&self) -> #editor {
                    let snapshot = #rt::Preferences::get(self);
                    #editor {
                        store: #rt::__private::Arc::clone(&self.store),
                        values: #snapshot::clone(&snapshot),
                    }
                }

                fn update(&self, editor: &#editor) {
                    let instance = #rt::__private::Arc::new(#rt::PreferencesEditor::to_immutable(editor));
                    let _guard = self.lock.lock();
                    self.instance.store(#rt::__private::Arc::clone(&instance));
                    if let ::core::option::Option::Some(state) = self.state.load() {
                        state.set_value(instance);
                    }
                }

                fn as_state_flow(&self) -> #rt::StateFlow<#rt::__private::Arc<#snapshot>> {
                    if let ::core::option::Option::Some(state) = self.state.load() {
                        return #rt::StateFlow::clone(&state);
                    }
                    let _guard = self.lock.lock();
                    if let ::core::option::Option::Some(state) = self.state.load() {
                        return #rt::StateFlow::clone(&state);
                    }
                    let state = #rt::StateFlow::new(self.snapshot_locked());
                    self.state.store(#rt::__private::Arc::new(state.clone()));
                    state
                }
            }

            #[doc = #editor_doc]
            pub struct #editor {
                store: #rt::__private::Arc<dyn #rt::KvStore>,
                values: #snapshot,
            }

            impl #editor {
                #(
                    pub fn #idents(&self) -> &#types {
                        &self.values.#idents
                    }

                    #[doc = #setter_docs]
                    pub fn #setters(&mut self, value: #types) {
                        #wrapper::#encode_fns(self.store.as_ref(), &value);
                        self.values.#idents = value;
                    }
                )*
            }

            impl #rt::PreferencesEditor for #editor {
                type Snapshot = #snapshot;

                fn to_immutable(&self) -> #snapshot {
                    #snapshot::clone(&self.values)
                }
            }
        }
    }

    fn decode_fn(&self, field: &Field, plan: &DecodePlan) -> TokenStream {
        let ident = decode_fn_ident(field);
        let ty = &field.ty.written;
        let body = self.decode_steps(field, &plan.steps);
        quote! {
            fn #ident(&self) -> #ty {
                let store = self.store.as_ref();
                #body
            }
        }
    }

    fn decode_steps(&self, field: &Field, steps: &[DecodeStep]) -> TokenStream {
        let rt = self.runtime;
        let statements = steps.iter().map(|step| match step {
            DecodeStep::Read(read) => {
                let read = self.raw_read(field, *read);
                quote!(let value = #read;)
            }
            DecodeStep::OnAbsent { check, branch } => {
                let branch = self.absent_branch(field, branch);
                let key = field.name();
                match check {
                    AbsenceCheck::Sentinel => quote! {
                        if #rt::sentinel::is_sentinel(value) {
                            #branch
                        }
                    },
                    AbsenceCheck::KeyMissing => quote! {
                        if !store.contains_key(#key) {
                            #branch
                        }
                    },
                    AbsenceCheck::NoneValue => quote! {
                        let ::core::option::Option::Some(value) = value else {
                            #branch
                        };
                    },
                }
            }
            DecodeStep::Produce { value, wrap_some } => {
                let expr = produce(value);
                if *wrap_some {
                    quote!(::core::option::Option::Some(#expr))
                } else {
                    expr
                }
            }
        });
        quote!(#(#statements)*)
    }

    fn raw_read(&self, field: &Field, read: RawRead) -> TokenStream {
        let rt = self.runtime;
        let key = field.name();
        let inner = &field.ty.inner;
        match read {
            RawRead::Scalar(StoragePrimitive::Boolean) => quote!(store.decode_bool(#key, false)),
            RawRead::Scalar(primitive) if primitive.uses_sentinel() => {
                let method = format_ident!("decode_{}", primitive.method_suffix());
                quote!(store.#method(#key, #rt::sentinel::sentinel()))
            }
            RawRead::Scalar(primitive) | RawRead::Existence(primitive) => {
                let method = format_ident!("decode_{}", primitive.method_suffix());
                quote!(store.#method(#key))
            }
            RawRead::Ordinal => {
                quote!(<#inner as #rt::PrefEnum>::from_ordinal(store.decode_int(#key, -1)))
            }
            RawRead::Marshal => quote!(#rt::marshal::decode::<#inner>(store, #key)),
            RawRead::NullableScalar(primitive) => match primitive {
                StoragePrimitive::Boolean => quote! {
                    #rt::nullable::decode_bool(store.decode_int(#key, #rt::nullable::NULL_BOOL))
                },
                StoragePrimitive::Integer => quote! {
                    #rt::nullable::decode_int(store.decode_long(#key, #rt::nullable::NULL_INT))
                },
                StoragePrimitive::Long | StoragePrimitive::Float | StoragePrimitive::Double => {
                    let codec = format_ident!("decode_{}", primitive.method_suffix());
                    quote!(#rt::nullable::#codec(store.decode_bytes(#key).as_deref()))
                }
                existence => {
                    let method = format_ident!("decode_{}", existence.method_suffix());
                    quote!(store.#method(#key))
                }
            },
        }
    }

    fn absent_branch(&self, field: &Field, branch: &[AbsentStep]) -> TokenStream {
        let rt = self.runtime;
        let ident = &field.ident;
        let encode = encode_fn_ident(field);
        let steps = branch.iter().map(|step| match step {
            AbsentStep::PersistDefault(guard) => {
                let write = quote!(Self::#encode(store, &self.default.#ident););
                match guard {
                    PersistGuard::Always => write,
                    PersistGuard::DefaultPresent => quote! {
                        if self.default.#ident.is_some() {
                            #write
                        }
                    },
                    PersistGuard::DefaultNotSentinel => quote! {
                        if !#rt::sentinel::is_sentinel(self.default.#ident) {
                            #write
                        }
                    },
                }
            }
            AbsentStep::ReturnDefault => quote!(return self.default.#ident.clone();),
        });
        quote!(#(#steps)*)
    }

    fn encode_fn(&self, field: &Field, plan: &EncodePlan) -> TokenStream {
        let rt = self.runtime;
        let ident = encode_fn_ident(field);
        let ty = &field.ty.written;
        let key = field.name();

        // `value` starts as `&T` and is rebound to the owned encoder output.
        let mut borrowed = true;
        let mut statements = Vec::with_capacity(plan.steps.len());
        for step in &plan.steps {
            match step {
                EncodeStep::Convert(call) => {
                    let path = &call.path;
                    let arg = match (call.receiver_by_ref, call.wrap_some) {
                        (true, false) => quote!(value),
                        (false, false) => quote!(value.clone()),
                        (true, true) => quote!(&::core::option::Option::Some(value.clone())),
                        (false, true) => quote!(::core::option::Option::Some(value.clone())),
                    };
                    statements.push(quote!(let value = #path(#arg);));
                    borrowed = false;
                }
                EncodeStep::Write(write) => {
                    statements.push(self.write(&key, *write, borrowed));
                }
            }
        }

        quote! {
            fn #ident(store: &dyn #rt::KvStore, value: &#ty) {
                #(#statements)*
            }
        }
    }

    fn write(&self, key: &str, write: Write, borrowed: bool) -> TokenStream {
        let rt = self.runtime;
        let set = quote!(#rt::__private::BTreeSet<::std::string::String>);
        match write {
            Write::Scalar(primitive) => {
                let method = format_ident!("encode_{}", primitive.method_suffix());
                let value = if borrowed { quote!(*value) } else { quote!(value) };
                quote!(store.#method(#key, #value);)
            }
            Write::Existence { primitive, nullable } => {
                let method = format_ident!("encode_{}", primitive.method_suffix());
                let value = match (primitive, nullable) {
                    (StoragePrimitive::TextSet, false) => quote! {
                        ::core::option::Option::Some(&value.iter().cloned().collect::<#set>())
                    },
                    (StoragePrimitive::TextSet, true) => quote! {
                        value.as_ref().map(|set| set.iter().cloned().collect::<#set>()).as_ref()
                    },
                    (StoragePrimitive::ByteSequence, false) => {
                        quote!(::core::option::Option::Some(value.as_slice()))
                    }
                    (_, false) => quote!(::core::option::Option::Some(value.as_str())),
                    (_, true) => quote!(value.as_deref()),
                };
                quote!(store.#method(#key, #value);)
            }
            Write::Ordinal { nullable: false } => {
                quote!(store.encode_int(#key, #rt::PrefEnum::ordinal(value));)
            }
            Write::Ordinal { nullable: true } => quote! {
                store.encode_int(#key, value.as_ref().map_or(-1, #rt::PrefEnum::ordinal));
            },
            Write::Marshal { nullable: false } => {
                quote!(#rt::marshal::encode(store, #key, ::core::option::Option::Some(value));)
            }
            Write::Marshal { nullable: true } => {
                quote!(#rt::marshal::encode(store, #key, value.as_ref());)
            }
            Write::NullableScalar(primitive) => match primitive {
                StoragePrimitive::Boolean => {
                    quote!(store.encode_int(#key, #rt::nullable::encode_bool(*value));)
                }
                StoragePrimitive::Integer => {
                    quote!(store.encode_long(#key, #rt::nullable::encode_int(*value));)
                }
                other => {
                    let codec = format_ident!("encode_{}", other.method_suffix());
                    quote!(store.encode_bytes(#key, #rt::nullable::#codec(*value).as_deref());)
                }
            },
        }
    }
}

fn decode_fn_ident(field: &Field) -> syn::Ident {
    format_ident!("decode_{}", field.ident)
}

fn encode_fn_ident(field: &Field) -> syn::Ident {
    format_ident!("encode_{}", field.ident)
}

fn produce(value: &Produce) -> TokenStream {
    match value {
        Produce::Value => quote!(value),
        Produce::CollectSet => quote!(value.into_iter().collect()),
        Produce::Decode(call) => {
            // The receiver type is inferred from the decoder's signature.
            let mut arg = if call.collect_set {
                quote!(value.into_iter().collect())
            } else {
                quote!(value)
            };
            if call.receiver_nullable {
                arg = quote!(::core::option::Option::Some(#arg));
            }
            if call.receiver_by_ref {
                arg = quote!(&#arg);
            }
            let path = &call.path;
            quote!(#path(#arg))
        }
    }
}

/// Doc line for a generated setter.
fn setter_doc(field: &Field) -> String {
    let mut doc = String::from(" Writes through to storage immediately.");
    if field.ty.nullable {
        doc.push_str(
            " Setting `None` clears the stored value: the editor and its snapshot keep \
             `None`, but the next decode from storage reads the declared default",
        );
        if field.persist_default {
            doc.push_str(", and that default is written back");
        }
        doc.push('.');
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NullableMatch;
    use crate::converter::ConverterRegistry;
    use crate::discovery::Discovery;
    use crate::plan::PlanBuilder;

    fn emit(source: &str) -> String {
        let mut discovery = Discovery::new();
        discovery.scan_str(source, "").unwrap();
        let mut registry = ConverterRegistry::new(NullableMatch::Lenient);
        for converter in discovery.converters.clone() {
            registry.register(converter);
        }
        let declaration = &discovery.declarations[0];
        let plans = PlanBuilder::new(declaration, &discovery.enums, &discovery.structured, &registry)
            .plan_declaration()
            .unwrap();
        let runtime: syn::Path = syn::parse_str("::kvprefs").unwrap();
        let tokens = Emitter::new(&runtime).declaration(declaration, &plans);
        let file: syn::File = syn::parse2(tokens).unwrap();
        prettyplease::unparse(&file)
    }

    #[test]
    fn generated_source_parses_and_names_types() {
        let code = emit(
            r#"
            #[derive(Clone, Preferences)]
            #[preferences(id = "ui")]
            struct Ui {
                #[pref(default = 12, persist_default)]
                font_size: i32,
                #[pref(default = true)]
                animations: bool,
            }
            "#,
        );

        assert!(code.contains("pub struct UiPreferences"));
        assert!(code.contains("pub struct UiEditor"));
        assert!(code.contains("pub const ID: &'static str = \"ui\""));
        assert!(code.contains("pub fn set_font_size(&mut self, value: i32)"));
        assert!(code.contains("fn decode_animations(&self) -> bool"));
        assert!(code.contains("store.contains_key(\"animations\")"));
        assert!(code.contains("::kvprefs::sentinel::is_sentinel(self.default.font_size)"));
    }

    #[test]
    fn persist_default_is_emitted_only_when_flagged() {
        let code = emit(
            r#"
            #[derive(Clone, Preferences)]
            struct Ui {
                #[pref(default = 12, persist_default)]
                font_size: i32,
                #[pref(default = 1.5)]
                scale: f64,
            }
            "#,
        );

        assert!(code.contains("Self::encode_font_size(store, &self.default.font_size)"));
        assert!(!code.contains("Self::encode_scale(store"));
    }

    #[test]
    fn enum_structured_and_nullable_fields() {
        let code = emit(
            r#"
            #[derive(Clone, Copy, PrefEnum)]
            enum Theme { Light, Dark }

            #[derive(Clone, Marshal)]
            struct Window { width: u32 }

            #[derive(Clone, Preferences)]
            struct Ui {
                #[pref(default = None, persist_default)]
                theme: Option<Theme>,
                #[pref(default = Window { width: 640 })]
                window: Window,
                #[pref(default = None)]
                zoom: Option<f32>,
            }
            "#,
        );

        assert!(code.contains("<Theme as ::kvprefs::PrefEnum>::from_ordinal("));
        assert!(code.contains("store.decode_int(\"theme\", -1)"));
        assert!(code.contains("if self.default.theme.is_some()"));
        assert!(code.contains("::kvprefs::marshal::decode::<Window>(store, \"window\")"));
        assert!(code.contains("::kvprefs::nullable::decode_float"));
        assert!(code.contains("::kvprefs::nullable::encode_float(*value)"));

        assert!(code.contains("Setting `None` clears the stored value"));
        assert!(code.contains("and that default is written back"));
        assert_eq!(code.matches("and that default is written back").count(), 1);
    }

    #[test]
    fn converter_calls_go_through_crate_paths() {
        let code = emit(
            r#"
            pub struct ListConverters;

            #[type_converters]
            impl ListConverters {
                pub fn join(values: &Vec<i32>) -> String { String::new() }
                pub fn split(text: &str) -> Vec<i32> { Vec::new() }
            }

            #[derive(Clone, Preferences)]
            struct Ui {
                #[pref(default = vec![1, 2])]
                pinned: Vec<i32>,
            }
            "#,
        );

        assert!(code.contains("let value = crate::ListConverters::join(value);"));
        assert!(code.contains("Option::Some(value.as_str())"));
        assert!(code.contains("crate::ListConverters::split(&value)"));
    }
}
