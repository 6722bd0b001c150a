//! Declarations as discovered from source, before any planning.

use quote::ToTokens;
use syn::{Expr, GenericArgument, Ident, PathArguments, Type};

/// Structural identity of a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// A named type: last path segment plus its type arguments.
    Named { name: String, args: Vec<TypeRef> },
    /// Slice-shaped types, the closest thing to a variadic property.
    Variadic,
    /// No concrete declaration can be found (`impl Trait`, `dyn`, `_`,
    /// tuples, function pointers, macros, nested `Option`).
    Unresolved,
}

/// A type as written, split into its non-nullable base and modifiers.
#[derive(Debug, Clone)]
pub struct TypeRef {
    /// The full type as written.
    pub written: Type,
    /// The type with `Option` and the outer reference stripped.
    pub inner: Type,
    pub shape: TypeShape,
    pub nullable: bool,
    pub by_ref: bool,
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.nullable == other.nullable
    }
}

impl Eq for TypeRef {}

impl TypeRef {
    pub fn from_type(ty: &Type) -> Self {
        let written = ty.clone();
        let (by_ref, unref) = match ty {
            Type::Reference(reference) => (true, reference.elem.as_ref().clone()),
            other => (false, other.clone()),
        };
        let unref = strip_groups(unref);

        let (nullable, inner) = match option_inner(&unref) {
            Some(inner) => (true, strip_groups(inner)),
            None => (false, unref),
        };

        let shape = if nullable && option_inner(&inner).is_some() {
            TypeShape::Unresolved
        } else {
            shape_of(&inner, by_ref)
        };

        Self {
            written,
            inner,
            shape,
            nullable,
            by_ref,
        }
    }

    /// Non-nullable identity used when comparing signatures, e.g. `Vec<i32>`.
    pub fn key(&self) -> String {
        match &self.shape {
            TypeShape::Named { name, args } if args.is_empty() => name.clone(),
            TypeShape::Named { name, args } => {
                let args: Vec<String> = args.iter().map(TypeRef::display_key).collect();
                format!("{name}<{}>", args.join(", "))
            }
            TypeShape::Variadic => "[..]".to_string(),
            TypeShape::Unresolved => self.display(),
        }
    }

    /// Key including nullability, used for nested arguments.
    fn display_key(&self) -> String {
        if self.nullable {
            format!("Option<{}>", self.key())
        } else {
            self.key()
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.shape {
            TypeShape::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match &self.shape {
            TypeShape::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// Same base type, regardless of nullability.
    pub fn same_base(&self, other: &TypeRef) -> bool {
        self.shape == other.shape && !matches!(self.shape, TypeShape::Unresolved)
    }

    pub fn display(&self) -> String {
        normalize_tokens(&self.written.to_token_stream().to_string())
    }
}

fn strip_groups(ty: Type) -> Type {
    match ty {
        Type::Paren(paren) => strip_groups(*paren.elem),
        Type::Group(group) => strip_groups(*group.elem),
        other => other,
    }
}

fn option_inner(ty: &Type) -> Option<Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    single_type_argument(&segment.arguments)
}

fn single_type_argument(arguments: &PathArguments) -> Option<Type> {
    let PathArguments::AngleBracketed(arguments) = arguments else {
        return None;
    };
    let mut types = arguments.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty.clone()),
        _ => None,
    });
    let first = types.next()?;
    types.next().is_none().then_some(first)
}

fn shape_of(ty: &Type, by_ref: bool) -> TypeShape {
    match ty {
        Type::Path(path) if path.qself.is_none() => {
            let Some(segment) = path.path.segments.last() else {
                return TypeShape::Unresolved;
            };
            let name = segment.ident.to_string();
            if name == "Self" {
                return TypeShape::Unresolved;
            }
            // `&str` reads as a borrowed `String`.
            if by_ref && name == "str" {
                return named("String", Vec::new());
            }
            let args = match &segment.arguments {
                PathArguments::None => Vec::new(),
                PathArguments::AngleBracketed(arguments) => arguments
                    .args
                    .iter()
                    .filter_map(|arg| match arg {
                        GenericArgument::Type(ty) => Some(TypeRef::from_type(ty)),
                        _ => None,
                    })
                    .collect(),
                PathArguments::Parenthesized(_) => return TypeShape::Unresolved,
            };
            named(&name, args)
        }
        // `&[u8]` reads as a borrowed `Vec<u8>`; other slices are variadic.
        Type::Slice(slice) => {
            let elem = TypeRef::from_type(&slice.elem);
            if by_ref && elem.key() == "u8" && !elem.nullable {
                named("Vec", vec![elem])
            } else {
                TypeShape::Variadic
            }
        }
        Type::Array(array) => {
            let elem = TypeRef::from_type(&array.elem);
            let len = normalize_tokens(&array.len.to_token_stream().to_string());
            named(&format!("[{}; {len}]", elem.key()), Vec::new())
        }
        _ => TypeShape::Unresolved,
    }
}

fn named(name: &str, args: Vec<TypeRef>) -> TypeShape {
    TypeShape::Named {
        name: name.to_string(),
        args,
    }
}

fn normalize_tokens(text: &str) -> String {
    text.replace(" < ", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace(" :: ", "::")
        .replace("& ", "&")
}

/// One property of a preferences declaration.
#[derive(Debug, Clone)]
pub struct Field {
    pub ident: Ident,
    pub ty: TypeRef,
    pub default: Option<Expr>,
    pub persist_default: bool,
}

impl Field {
    pub fn name(&self) -> String {
        self.ident.to_string()
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self.ty.shape, TypeShape::Variadic)
    }
}

/// A struct marked `#[derive(Preferences)]`.
#[derive(Debug, Clone)]
pub struct PreferencesDeclaration {
    pub ident: Ident,
    /// Storage namespace, `#[preferences(id = "...")]` or the struct name.
    pub id: String,
    pub module: Vec<String>,
    pub fields: Vec<Field>,
}

impl PreferencesDeclaration {
    pub fn name(&self) -> String {
        self.ident.to_string()
    }

    /// File stem of the generated source, e.g. `app_settings_preferences`.
    pub fn file_stem(&self) -> String {
        format!("{}_preferences", to_snake_case(&self.name()))
    }
}

pub(crate) fn to_snake_case(value: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = value.chars().collect();
    for (index, ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev_lower = index > 0 && !chars[index - 1].is_uppercase() && chars[index - 1] != '_';
            let next_lower = chars.get(index + 1).is_some_and(|next| next.is_lowercase());
            let after_upper = index > 0 && chars[index - 1].is_uppercase();
            if prev_lower || (after_upper && next_lower) {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(*ch);
        }
    }
    out
}
