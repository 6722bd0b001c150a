//! Type converter discovery and validation.
//!
//! A converter source is a `#[type_converters]` impl block or module. Each
//! of its public, non-generic functions taking exactly one argument is a
//! candidate; the argument plays the role of an extension receiver. For a
//! target type the registry picks the first encoder whose receiver accepts
//! the target and the first decoder that returns the target from the
//! encoder's output.

use crate::config::NullableMatch;
use crate::error::{GenError, Result};
use crate::model::TypeRef;
use crate::resolver::{StoragePrimitive, resolve};

/// A candidate conversion function.
#[derive(Debug, Clone)]
pub struct ConverterFn {
    /// Crate-relative path used to call the function.
    pub path: syn::Path,
    /// `Source::function`, used in diagnostics.
    pub display_name: String,
    pub receiver: TypeRef,
    pub output: TypeRef,
}

#[derive(Debug, Clone)]
pub struct ConverterSource {
    pub name: String,
    pub functions: Vec<ConverterFn>,
}

/// A validated encoder/decoder pair for one target type.
#[derive(Debug, Clone)]
pub struct ConverterDescriptor {
    pub encoder: ConverterFn,
    pub decoder: ConverterFn,
    /// Encoding of the intermediate value.
    pub primitive: StoragePrimitive,
    /// The encoder may return `None`.
    pub nullable_intermediate: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    sources: Vec<ConverterSource>,
    rule: NullableMatch,
}

impl ConverterRegistry {
    pub fn new(rule: NullableMatch) -> Self {
        Self {
            sources: Vec::new(),
            rule,
        }
    }

    pub fn register(&mut self, source: ConverterSource) {
        self.sources.push(source);
    }

    fn candidates(&self) -> impl Iterator<Item = &ConverterFn> {
        self.sources.iter().flat_map(|source| source.functions.iter())
    }

    /// `value` may be passed where `slot` is expected.
    fn flows_into(&self, value: &TypeRef, slot: &TypeRef) -> bool {
        value.same_base(slot) && self.rule.accepts(slot.nullable, value.nullable)
    }

    /// Finds the converter pair for `target`, the type of `field`.
    ///
    /// `Ok(None)` when no encoder or no decoder fits; an error when the pair
    /// exists but its intermediate type cannot be stored.
    pub fn find(
        &self,
        target: &TypeRef,
        declaration: &str,
        field: &str,
    ) -> Result<Option<ConverterDescriptor>> {
        let Some(encoder) = self
            .candidates()
            .find(|candidate| self.flows_into(target, &candidate.receiver))
        else {
            return Ok(None);
        };

        let Some(decoder) = self.candidates().find(|candidate| {
            self.flows_into(&candidate.output, target)
                && self.flows_into(&encoder.output, &candidate.receiver)
        }) else {
            return Ok(None);
        };

        let primitive = resolve(&encoder.output).ok_or_else(|| GenError::UnsupportedConverterType {
            declaration: declaration.to_string(),
            field: field.to_string(),
            converter: encoder.display_name.clone(),
            ty: encoder.output.display(),
        })?;

        if encoder.output.nullable && !primitive.is_existence_checked() {
            return Err(GenError::NullableConverterType {
                declaration: declaration.to_string(),
                field: field.to_string(),
                converter: encoder.display_name.clone(),
                ty: encoder.output.display(),
            });
        }

        Ok(Some(ConverterDescriptor {
            encoder: encoder.clone(),
            decoder: decoder.clone(),
            primitive,
            nullable_intermediate: encoder.output.nullable,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(text: &str) -> TypeRef {
        TypeRef::from_type(&syn::parse_str(text).unwrap())
    }

    fn function(name: &str, receiver: &str, output: &str) -> ConverterFn {
        ConverterFn {
            path: syn::parse_str(&format!("crate::Conv::{name}")).unwrap(),
            display_name: format!("Conv::{name}"),
            receiver: ty(receiver),
            output: ty(output),
        }
    }

    fn registry(rule: NullableMatch, functions: Vec<ConverterFn>) -> ConverterRegistry {
        let mut registry = ConverterRegistry::new(rule);
        registry.register(ConverterSource {
            name: "Conv".to_string(),
            functions,
        });
        registry
    }

    #[test]
    fn pairs_encoder_with_matching_decoder() {
        let registry = registry(
            NullableMatch::Lenient,
            vec![
                function("unrelated", "&u64", "String"),
                function("encode_date", "&Date", "i64"),
                function("decode_date", "i64", "Date"),
            ],
        );

        let found = registry.find(&ty("Date"), "Settings", "since").unwrap().unwrap();
        assert_eq!(found.encoder.display_name, "Conv::encode_date");
        assert_eq!(found.decoder.display_name, "Conv::decode_date");
        assert_eq!(found.primitive, StoragePrimitive::Long);
        assert!(!found.nullable_intermediate);
    }

    #[test]
    fn missing_decoder_yields_none() {
        let registry = registry(
            NullableMatch::Lenient,
            vec![function("encode_date", "&Date", "i64")],
        );
        assert!(registry.find(&ty("Date"), "Settings", "since").unwrap().is_none());
    }

    #[test]
    fn decoder_must_accept_encoder_output() {
        let registry = registry(
            NullableMatch::Lenient,
            vec![
                function("encode_date", "&Date", "i64"),
                function("parse_date", "&str", "Date"),
            ],
        );
        assert!(registry.find(&ty("Date"), "Settings", "since").unwrap().is_none());
    }

    #[test]
    fn lenient_rule_binds_nullable_slots_to_plain_values() {
        let functions = vec![
            function("encode_date", "&Option<Date>", "Option<String>"),
            function("decode_date", "Option<String>", "Date"),
        ];

        let lenient = registry(NullableMatch::Lenient, functions.clone());
        let found = lenient.find(&ty("Option<Date>"), "Settings", "since").unwrap().unwrap();
        assert_eq!(found.primitive, StoragePrimitive::Text);
        assert!(found.nullable_intermediate);

        // A plain `Date` target also flows into the nullable receiver.
        assert!(lenient.find(&ty("Date"), "Settings", "since").unwrap().is_some());

        let exact = registry(NullableMatch::Exact, functions);
        assert!(exact.find(&ty("Option<Date>"), "Settings", "since").unwrap().is_none());
        assert!(exact.find(&ty("Date"), "Settings", "since").unwrap().is_none());
    }

    #[test]
    fn nullable_target_never_binds_to_plain_receiver() {
        let registry = registry(
            NullableMatch::Lenient,
            vec![
                function("encode_date", "&Date", "i64"),
                function("decode_date", "i64", "Date"),
            ],
        );
        assert!(registry.find(&ty("Option<Date>"), "Settings", "since").unwrap().is_none());
    }

    #[test]
    fn unsupported_intermediate_is_fatal() {
        let registry = registry(
            NullableMatch::Lenient,
            vec![
                function("encode_date", "&Date", "u64"),
                function("decode_date", "u64", "Date"),
            ],
        );
        let err = registry.find(&ty("Date"), "Settings", "since").unwrap_err();
        assert!(matches!(err, GenError::UnsupportedConverterType { .. }));
        let message = err.to_string();
        assert!(message.contains("Conv::encode_date"));
        assert!(message.contains("[Settings]"));
        assert!(message.contains("'since'"));
        assert!(message.contains("'u64'"));
    }

    #[test]
    fn nullable_scalar_intermediate_is_fatal() {
        let registry = registry(
            NullableMatch::Lenient,
            vec![
                function("encode_date", "&Date", "Option<i64>"),
                function("decode_date", "Option<i64>", "Date"),
            ],
        );
        let err = registry.find(&ty("Date"), "Settings", "since").unwrap_err();
        assert!(matches!(err, GenError::NullableConverterType { .. }));
        let message = err.to_string();
        assert!(message.contains("'since'"));
        assert!(message.contains("'Option<i64>'"));
    }
}
