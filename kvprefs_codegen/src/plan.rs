//! Per-field decode and encode plans.
//!
//! Every field is classified once into a [`FieldKind`]. The kind decides the
//! decode plan (read raw, detect absence, optionally persist the default,
//! fall back to the default, otherwise produce the decoded value) and the
//! encode plan (optionally convert, then write one primitive).

use crate::converter::{ConverterDescriptor, ConverterRegistry};
use crate::error::{GenError, Result};
use crate::model::{Field, PreferencesDeclaration, TypeShape};
use crate::resolver::{StoragePrimitive, resolve};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

#[derive(Debug, Clone)]
pub enum FieldKind {
    Enum,
    Structured,
    Primitive(StoragePrimitive),
    Converted(ConverterDescriptor),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawRead {
    /// `decode_*(key, fallback)`: the sentinel for numeric kinds, `false`
    /// for booleans.
    Scalar(StoragePrimitive),
    /// `decode_*(key)` returning `Option`.
    Existence(StoragePrimitive),
    /// Ordinal through `decode_int(key, -1)`, mapped to an entry.
    Ordinal,
    /// Structured value through the marshal mechanism.
    Marshal,
    /// Nullable scalar carried by a wider kind, see `kvprefs::nullable`.
    NullableScalar(StoragePrimitive),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsenceCheck {
    /// The decoded value is the universal sentinel.
    Sentinel,
    /// The engine has no entry for the key.
    KeyMissing,
    /// The decoded `Option` is `None`.
    NoneValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistGuard {
    Always,
    /// Only when the nullable default is `Some`.
    DefaultPresent,
    /// Only when the default is not the sentinel placeholder.
    DefaultNotSentinel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsentStep {
    PersistDefault(PersistGuard),
    ReturnDefault,
}

#[derive(Debug, Clone)]
pub struct DecodeCall {
    pub path: syn::Path,
    pub receiver_by_ref: bool,
    /// The decoder takes `Option<_>` and receives `Some(value)`.
    pub receiver_nullable: bool,
    /// Text sets are collected into the receiver's set type first.
    pub collect_set: bool,
}

#[derive(Debug, Clone)]
pub enum Produce {
    Value,
    CollectSet,
    Decode(DecodeCall),
}

#[derive(Debug, Clone)]
pub enum DecodeStep {
    Read(RawRead),
    OnAbsent {
        check: AbsenceCheck,
        branch: Vec<AbsentStep>,
    },
    Produce { value: Produce, wrap_some: bool },
}

#[derive(Debug, Clone)]
pub struct DecodePlan {
    pub steps: Vec<DecodeStep>,
}

#[derive(Debug, Clone)]
pub struct EncodeCall {
    pub path: syn::Path,
    pub receiver_by_ref: bool,
    /// A plain value passed to a nullable receiver.
    pub wrap_some: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
    Scalar(StoragePrimitive),
    Existence {
        primitive: StoragePrimitive,
        nullable: bool,
    },
    Ordinal {
        nullable: bool,
    },
    Marshal {
        nullable: bool,
    },
    NullableScalar(StoragePrimitive),
}

#[derive(Debug, Clone)]
pub enum EncodeStep {
    /// Rebinds `value` to the encoder's output.
    Convert(EncodeCall),
    Write(Write),
}

#[derive(Debug, Clone)]
pub struct EncodePlan {
    pub steps: Vec<EncodeStep>,
}

#[derive(Debug, Clone)]
pub struct FieldPlan {
    pub field: Field,
    pub kind: FieldKind,
    pub decode: DecodePlan,
    pub encode: EncodePlan,
}

/// Builds plans for the fields of one declaration.
pub struct PlanBuilder<'a> {
    declaration: &'a PreferencesDeclaration,
    enums: &'a BTreeSet<String>,
    structured: &'a BTreeSet<String>,
    converters: &'a ConverterRegistry,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(
        declaration: &'a PreferencesDeclaration,
        enums: &'a BTreeSet<String>,
        structured: &'a BTreeSet<String>,
        converters: &'a ConverterRegistry,
    ) -> Self {
        Self {
            declaration,
            enums,
            structured,
            converters,
        }
    }

    /// Plans every field in declaration order, stopping at the first error.
    pub fn plan_declaration(&self) -> Result<Vec<FieldPlan>> {
        let mut seen = HashSet::new();
        let mut plans = Vec::with_capacity(self.declaration.fields.len());
        for field in &self.declaration.fields {
            if !seen.insert(field.name()) {
                return Err(GenError::DuplicateField {
                    declaration: self.declaration.name(),
                    field: field.name(),
                });
            }
            plans.push(self.plan_field(field)?);
        }
        Ok(plans)
    }

    pub fn plan_field(&self, field: &Field) -> Result<FieldPlan> {
        let kind = self.resolve_kind(field)?;
        let decode = build_decode_plan(field, &kind);
        let encode = build_encode_plan(field, &kind);
        debug!(
            declaration = %self.declaration.ident,
            field = %field.ident,
            kind = %kind_label(&kind),
            persist_default = field.persist_default,
            "planned field"
        );
        Ok(FieldPlan {
            field: field.clone(),
            kind,
            decode,
            encode,
        })
    }

    pub fn resolve_kind(&self, field: &Field) -> Result<FieldKind> {
        let declaration = self.declaration.name();

        if field.is_variadic() {
            return Err(GenError::VarargField {
                declaration,
                field: field.name(),
            });
        }
        if field.default.is_none() {
            return Err(GenError::MissingDefault {
                declaration,
                field: field.name(),
            });
        }
        if field.ty.by_ref {
            return Err(GenError::BorrowedField {
                declaration,
                field: field.name(),
                ty: field.ty.display(),
            });
        }
        if matches!(field.ty.shape, TypeShape::Unresolved) {
            return Err(GenError::UnresolvedType {
                declaration,
                field: field.name(),
                ty: field.ty.display(),
            });
        }

        if let Some(primitive) = resolve(&field.ty) {
            return Ok(FieldKind::Primitive(primitive));
        }

        let plain_name = field.ty.args().is_empty().then(|| field.ty.name()).flatten();
        if let Some(name) = plain_name {
            if self.enums.contains(name) {
                return Ok(FieldKind::Enum);
            }
            if self.structured.contains(name) {
                return Ok(FieldKind::Structured);
            }
        }

        match self.converters.find(&field.ty, &declaration, &field.name())? {
            Some(converter) => Ok(FieldKind::Converted(converter)),
            None => Err(GenError::UnsupportedType {
                declaration,
                field: field.name(),
                ty: field.ty.display(),
            }),
        }
    }
}

fn kind_label(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Enum => "enum".to_string(),
        FieldKind::Structured => "structured".to_string(),
        FieldKind::Primitive(primitive) => primitive.to_string(),
        FieldKind::Converted(converter) => format!("converted via {}", converter.primitive),
    }
}

fn absent_branch(persist: bool, guard: PersistGuard) -> Vec<AbsentStep> {
    let mut branch = Vec::with_capacity(2);
    if persist {
        branch.push(AbsentStep::PersistDefault(guard));
    }
    branch.push(AbsentStep::ReturnDefault);
    branch
}

/// Read and absence check for a primitive whose stored value is never
/// nullable at the engine level.
fn read_present(primitive: StoragePrimitive, branch: Vec<AbsentStep>) -> Vec<DecodeStep> {
    if primitive.is_existence_checked() {
        vec![
            DecodeStep::Read(RawRead::Existence(primitive)),
            DecodeStep::OnAbsent {
                check: AbsenceCheck::NoneValue,
                branch,
            },
        ]
    } else if primitive.uses_sentinel() {
        vec![
            DecodeStep::Read(RawRead::Scalar(primitive)),
            DecodeStep::OnAbsent {
                check: AbsenceCheck::Sentinel,
                branch,
            },
        ]
    } else {
        // Booleans have no spare value to act as a sentinel.
        vec![
            DecodeStep::OnAbsent {
                check: AbsenceCheck::KeyMissing,
                branch,
            },
            DecodeStep::Read(RawRead::Scalar(primitive)),
        ]
    }
}

pub fn build_decode_plan(field: &Field, kind: &FieldKind) -> DecodePlan {
    let nullable = field.ty.nullable;
    let persist = field.persist_default;
    let nullable_guard = if nullable {
        PersistGuard::DefaultPresent
    } else {
        PersistGuard::Always
    };

    let steps = match kind {
        FieldKind::Enum => vec![
            DecodeStep::Read(RawRead::Ordinal),
            DecodeStep::OnAbsent {
                check: AbsenceCheck::NoneValue,
                branch: absent_branch(persist, nullable_guard),
            },
            DecodeStep::Produce {
                value: Produce::Value,
                wrap_some: nullable,
            },
        ],
        FieldKind::Structured => vec![
            DecodeStep::Read(RawRead::Marshal),
            DecodeStep::OnAbsent {
                check: AbsenceCheck::NoneValue,
                branch: absent_branch(persist, nullable_guard),
            },
            DecodeStep::Produce {
                value: Produce::Value,
                wrap_some: nullable,
            },
        ],
        FieldKind::Primitive(primitive) => {
            let produce = if *primitive == StoragePrimitive::TextSet {
                Produce::CollectSet
            } else {
                Produce::Value
            };

            let mut steps = if primitive.is_existence_checked() || !nullable {
                let guard = if primitive.uses_sentinel() {
                    PersistGuard::DefaultNotSentinel
                } else {
                    PersistGuard::Always
                };
                read_present(*primitive, absent_branch(persist, guard))
            } else {
                vec![
                    DecodeStep::Read(RawRead::NullableScalar(*primitive)),
                    DecodeStep::OnAbsent {
                        check: AbsenceCheck::NoneValue,
                        branch: absent_branch(persist, PersistGuard::Always),
                    },
                ]
            };
            steps.push(DecodeStep::Produce {
                value: produce,
                wrap_some: nullable,
            });
            steps
        }
        FieldKind::Converted(converter) => {
            let mut steps = read_present(
                converter.primitive,
                absent_branch(persist, PersistGuard::Always),
            );
            let decoder = &converter.decoder;
            steps.push(DecodeStep::Produce {
                value: Produce::Decode(DecodeCall {
                    path: decoder.path.clone(),
                    receiver_by_ref: decoder.receiver.by_ref,
                    receiver_nullable: decoder.receiver.nullable,
                    collect_set: converter.primitive == StoragePrimitive::TextSet,
                }),
                wrap_some: nullable && !decoder.output.nullable,
            });
            steps
        }
    };

    DecodePlan { steps }
}

pub fn build_encode_plan(field: &Field, kind: &FieldKind) -> EncodePlan {
    let nullable = field.ty.nullable;

    let steps = match kind {
        FieldKind::Enum => vec![EncodeStep::Write(Write::Ordinal { nullable })],
        FieldKind::Structured => vec![EncodeStep::Write(Write::Marshal { nullable })],
        FieldKind::Primitive(primitive) => {
            let write = if primitive.is_existence_checked() {
                Write::Existence {
                    primitive: *primitive,
                    nullable,
                }
            } else if nullable {
                Write::NullableScalar(*primitive)
            } else {
                Write::Scalar(*primitive)
            };
            vec![EncodeStep::Write(write)]
        }
        FieldKind::Converted(converter) => {
            let encoder = &converter.encoder;
            let write = if converter.primitive.is_existence_checked() {
                Write::Existence {
                    primitive: converter.primitive,
                    nullable: converter.nullable_intermediate,
                }
            } else {
                Write::Scalar(converter.primitive)
            };
            vec![
                EncodeStep::Convert(EncodeCall {
                    path: encoder.path.clone(),
                    receiver_by_ref: encoder.receiver.by_ref,
                    wrap_some: encoder.receiver.nullable && !nullable,
                }),
                EncodeStep::Write(write),
            ]
        }
    };

    EncodePlan { steps }
}
