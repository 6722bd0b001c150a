use std::path::PathBuf;
use thiserror::Error;

/// Fatal generation failure. Every variant names the declaration it stopped.
#[derive(Error, Debug)]
pub enum GenError {
    #[error(
        "[{declaration}] Vararg is not supported for property '{field}', \
         consider replacing it with a supported one."
    )]
    VarargField { declaration: String, field: String },

    #[error(
        "[{declaration}] Property '{field}' must have a default value, \
         consider adding #[pref(default = ...)] to it."
    )]
    MissingDefault { declaration: String, field: String },

    #[error(
        "[{declaration}] Cannot find actual declaration of the type '{ty}' for property '{field}', \
         this may be due to the type is not supported, consider replacing it with a supported one."
    )]
    UnresolvedType {
        declaration: String,
        field: String,
        ty: String,
    },

    #[error(
        "[{declaration}] Unsupported type '{ty}' for property '{field}', \
         consider replacing it with a supported one or creating a type converter."
    )]
    UnsupportedType {
        declaration: String,
        field: String,
        ty: String,
    },

    #[error(
        "[{declaration}] Property '{field}' is a borrowed type '{ty}', \
         consider replacing it with an owned one."
    )]
    BorrowedField {
        declaration: String,
        field: String,
        ty: String,
    },

    #[error(
        "[{declaration}] Unsupported type '{ty}' for type converter '{converter}' used by property '{field}', \
         consider replacing it with a supported one."
    )]
    UnsupportedConverterType {
        declaration: String,
        field: String,
        converter: String,
        ty: String,
    },

    #[error(
        "[{declaration}] The return type '{ty}' of the type converter '{converter}' used by property '{field}' \
         must not be nullable, only bytes, text and text sets may be; consider replacing it with a supported one."
    )]
    NullableConverterType {
        declaration: String,
        field: String,
        converter: String,
        ty: String,
    },

    #[error("[{declaration}] Property '{field}' is declared more than once")]
    DuplicateField { declaration: String, field: String },

    #[error("[{declaration}] {message}")]
    InvalidDeclaration { declaration: String, message: String },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    #[error("Failed to format generated code for '{declaration}': {source}")]
    Format {
        declaration: String,
        #[source]
        source: syn::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GenError>;
